//! Grouping engine for grouperserve
//!
//! This crate owns everything between the HTTP layer and the kernel:
//! - the [`SystemRegistry`] of configured systems and their catalogues
//! - the bounded [`EngineCache`] of loaded groupers
//! - the [`GroupingService`] request pipeline

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStats, EngineCache, EngineEntry};
pub use config::GrouperConfig;
pub use error::{RegistryError, ServiceError, ServiceResult};
pub use registry::{SystemDescriptor, SystemKind, SystemRegistry};
pub use service::{GroupManyRequest, GroupOptions, GroupRequest, GroupingService, RequestResult};
