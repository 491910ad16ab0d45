//! Priority-ordered fan-out over several sources. Index 0 wins.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{AdapterFuture, DataAdapter};
use crate::artifact::{ArtifactBundle, ArtifactMeta, ArtifactType};
use crate::error::{ForgeError, Result};

pub struct CompositeAdapter {
    name: String,
    adapters: Vec<Box<dyn DataAdapter>>,
    writable: usize,
}

impl CompositeAdapter {
    /// `adapters` are in priority order; `writable` indexes the one that
    /// receives every `write`.
    pub fn new(adapters: Vec<Box<dyn DataAdapter>>, writable: usize) -> Result<Self> {
        if adapters.is_empty() {
            return Err(ForgeError::config("composite source needs at least one adapter"));
        }
        if writable >= adapters.len() {
            return Err(ForgeError::config(format!(
                "writable index {writable} is out of range for {} sources",
                adapters.len()
            )));
        }
        let name = format!(
            "composite({})",
            adapters.iter().map(|a| a.name()).collect::<Vec<_>>().join(",")
        );
        Ok(Self {
            name,
            adapters,
            writable,
        })
    }

    pub fn adapter_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn writable_name(&self) -> &str {
        self.adapters[self.writable].name()
    }

    async fn merged_list(&self, kind: ArtifactType) -> Vec<ArtifactMeta> {
        let mut merged: BTreeMap<String, ArtifactMeta> = BTreeMap::new();
        for adapter in &self.adapters {
            match adapter.list(kind).await {
                Ok(metas) => {
                    for meta in metas {
                        merged.entry(meta.id().to_string()).or_insert(meta);
                    }
                }
                Err(e) => {
                    warn!(adapter = adapter.name(), %kind, error = %e, "source failed to list, skipping");
                }
            }
        }
        merged.into_values().collect()
    }

    async fn first_read(&self, kind: ArtifactType, id: &str) -> Result<ArtifactBundle> {
        let mut attempted = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            match adapter.read(kind, id).await {
                Ok(bundle) => return Ok(bundle),
                Err(ForgeError::NotFound { .. }) => {
                    debug!(adapter = adapter.name(), %kind, id, "not in this source");
                }
                Err(e) => {
                    warn!(adapter = adapter.name(), %kind, id, error = %e, "source failed to read, trying next");
                }
            }
            attempted.push(adapter.name().to_string());
        }
        Err(ForgeError::AllAdaptersFailed {
            kind,
            id: id.to_string(),
            attempted,
        })
    }

    async fn any_exists(&self, kind: ArtifactType, id: &str) -> bool {
        for adapter in &self.adapters {
            match adapter.exists(kind, id).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    warn!(adapter = adapter.name(), %kind, id, error = %e, "source failed existence check");
                }
            }
        }
        false
    }
}

impl DataAdapter for CompositeAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self, kind: ArtifactType) -> AdapterFuture<'_, Vec<ArtifactMeta>> {
        Box::pin(async move { Ok(self.merged_list(kind).await) })
    }

    fn read<'a>(&'a self, kind: ArtifactType, id: &'a str) -> AdapterFuture<'a, ArtifactBundle> {
        Box::pin(self.first_read(kind, id))
    }

    fn exists<'a>(&'a self, kind: ArtifactType, id: &'a str) -> AdapterFuture<'a, bool> {
        Box::pin(async move { Ok(self.any_exists(kind, id).await) })
    }

    fn write<'a>(
        &'a self,
        kind: ArtifactType,
        id: &'a str,
        bundle: &'a ArtifactBundle,
    ) -> AdapterFuture<'a, ()> {
        self.adapters[self.writable].write(kind, id, bundle)
    }
}
