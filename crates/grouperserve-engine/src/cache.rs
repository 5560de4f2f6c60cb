//! Engine cache
//!
//! Building a grouper from a specification workspace is expensive, so built
//! engines are kept per version. The cache is bounded and evicts the oldest
//! loaded version first; hits do not change the eviction order.
//!
//! Concurrent misses for the same version wait on a per-version load gate:
//! the first caller loads, the others re-check the cache once the gate is
//! released and share the inserted entry. Misses for different versions load
//! in parallel.

use crate::error::{ServiceError, ServiceResult};
use crate::registry::{SystemDescriptor, SystemKind, SystemRegistry};
use dashmap::DashMap;
use grouperserve_kernel::{Catalogue, Grouper, SpecificationLoader, SupplementGrouper};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Engines and catalogue of one loaded version.
pub struct EngineEntry {
    pub version: String,
    pub kind: SystemKind,
    pub grouper: Arc<dyn Grouper>,
    pub supplement_grouper: Option<Arc<dyn SupplementGrouper>>,
    pub catalogue: Arc<Catalogue>,
}

impl std::fmt::Debug for EngineEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineEntry")
            .field("version", &self.version)
            .field("kind", &self.kind)
            .field("supplement_grouper", &self.supplement_grouper.is_some())
            .field("catalogue_entries", &self.catalogue.len())
            .finish_non_exhaustive()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    /// Cached versions, oldest first
    pub versions: Vec<String>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Arc<EngineEntry>>,
    order: VecDeque<String>,
}

impl CacheState {
    /// Insert a freshly loaded entry and evict down to `capacity`.
    fn insert(&mut self, entry: Arc<EngineEntry>, capacity: usize) -> Vec<String> {
        let version = entry.version.clone();
        if self.entries.insert(version.clone(), entry).is_none() {
            self.order.push_back(version);
        }

        let mut evicted = Vec::new();
        while self.entries.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            evicted.push(oldest);
        }
        evicted
    }
}

pub struct EngineCache {
    registry: Arc<SystemRegistry>,
    loader: Arc<dyn SpecificationLoader>,
    state: Mutex<CacheState>,
    /// One gate per version ever requested; gates are never removed
    load_gates: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    capacity: usize,
}

impl EngineCache {
    /// Create a cache holding at most `capacity` (at least one) engine sets.
    pub fn new(
        registry: Arc<SystemRegistry>,
        loader: Arc<dyn SpecificationLoader>,
        capacity: usize,
    ) -> Self {
        Self {
            registry,
            loader,
            state: Mutex::new(CacheState::default()),
            load_gates: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Engines for `version`, loading them on a miss.
    pub async fn get(&self, version: &str) -> ServiceResult<Arc<EngineEntry>> {
        let descriptor = self
            .registry
            .describe(version)
            .ok_or_else(|| ServiceError::UnknownSystem(version.to_string()))?;

        if let Some(entry) = self.lookup(version) {
            tracing::debug!(version = version, "Engines found in cache");
            return Ok(entry);
        }

        let gate = self
            .load_gates
            .entry(version.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .value()
            .clone();
        let _guard = gate.lock().await;

        if let Some(entry) = self.lookup(version) {
            tracing::debug!(version = version, "Engines loaded by a concurrent request");
            return Ok(entry);
        }

        let entry = Arc::new(self.load(descriptor).await?);
        let evicted = self.state.lock().insert(entry.clone(), self.capacity);
        for old in evicted {
            tracing::info!(version = %old, "Evicted engines from cache");
        }
        Ok(entry)
    }

    fn lookup(&self, version: &str) -> Option<Arc<EngineEntry>> {
        self.state.lock().entries.get(version).cloned()
    }

    async fn load(&self, descriptor: &SystemDescriptor) -> ServiceResult<EngineEntry> {
        let version = descriptor.version.clone();
        let catalogue = self
            .registry
            .catalogue(&version)
            .ok_or_else(|| ServiceError::UnknownSystem(version.clone()))?;
        let workspace = self.registry.workspace(descriptor);
        let tariff = descriptor.kind.tariff();
        let loader = self.loader.clone();

        tracing::info!(
            version = %version,
            workspace = %workspace.display(),
            "Loading grouper specification"
        );
        let specification = tokio::task::spawn_blocking(move || loader.load(&workspace, tariff))
            .await
            .map_err(|e| ServiceError::Internal(format!("specification loader task failed: {e}")))?
            .map_err(|source| {
                tracing::error!(version = %version, error = %source, "Failed to load grouper");
                ServiceError::EngineUnavailable {
                    version: version.clone(),
                    source,
                }
            })?;

        if specification.supplement_grouper.is_some() {
            tracing::info!(version = %version, "Loaded grouper with supplement grouper");
        } else {
            tracing::info!(version = %version, "Loaded grouper without supplement grouper");
        }

        Ok(EngineEntry {
            version,
            kind: descriptor.kind,
            grouper: specification.grouper,
            supplement_grouper: specification.supplement_grouper,
            catalogue,
        })
    }

    pub fn contains(&self, version: &str) -> bool {
        self.state.lock().entries.contains_key(version)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            size: state.entries.len(),
            capacity: self.capacity,
            versions: state.order.iter().cloned().collect(),
        }
    }

    /// Drop all cached engines. Requests holding an entry keep using it.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }
}
