//! Grouper kernel for grouperserve
//!
//! This crate defines the seams the service talks to and one file-backed
//! implementation of each:
//! - [`CaseParser`] turns a serialized case into a [`PatientCase`] ([`UrlCaseParser`])
//! - [`SpecificationLoader`] builds a [`Grouper`] and optional
//!   [`SupplementGrouper`] from a workspace directory ([`JsonSpecificationLoader`])
//! - [`CatalogueLoader`] reads weighting catalogues ([`CsvCatalogueLoader`])
//! - weighting relations compute an [`EffectiveCostWeight`]

pub mod case;
pub mod catalogue;
pub mod cost_weight;
pub mod error;
pub mod grouper;
pub mod parser;
pub mod specification;
pub mod supplement;

pub use case::{GrouperResult, GroupingStatus, PatientCase, Procedure, Sex};
pub use catalogue::{
    Catalogue, CatalogueLoader, CsvCatalogueLoader, RehabWeightingRelation, WeightingRelation,
    catalogue_file_name,
};
pub use cost_weight::{CostWeightAdjustment, EffectiveCostWeight};
pub use error::{KernelError, KernelResult};
pub use grouper::{Grouper, RuleGrouper};
pub use parser::{CaseParser, UrlCaseParser};
pub use specification::{JsonSpecificationLoader, Specification, SpecificationLoader, Tariff};
pub use supplement::{SupplementCase, SupplementGroupResult, SupplementGrouper};
