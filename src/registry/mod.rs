//! Search / lookup / publish layer over one [`DataAdapter`].

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::adapters::DataAdapter;
use crate::artifact::{ArtifactBundle, ArtifactMeta, ArtifactRef, ArtifactSummary, ArtifactType};
use crate::error::{ForgeError, Result};

const SCORE_ID_EXACT: u32 = 100;
const SCORE_ID_PARTIAL: u32 = 80;
const SCORE_NAME_EXACT: u32 = 75;
const SCORE_NAME_PARTIAL: u32 = 50;
const SCORE_DESCRIPTION: u32 = 25;
const SCORE_TAG: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchField {
    Id,
    Name,
    Description,
    Tags,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub summary: ArtifactSummary,
    pub score: u32,
    pub matched_on: BTreeSet<MatchField>,
}

pub struct Registry {
    adapter: Box<dyn DataAdapter>,
}

impl Registry {
    pub fn new(adapter: Box<dyn DataAdapter>) -> Self {
        Self { adapter }
    }

    pub fn source_name(&self) -> &str {
        self.adapter.name()
    }

    /// Scores every listed artifact of the requested type (all types when
    /// `None`) and returns matches, best first. An empty query matches
    /// everything with score 0.
    pub async fn search(&self, query: &str, kind: Option<ArtifactType>) -> Vec<SearchResult> {
        let query = query.trim().to_lowercase();
        let mut results = Vec::new();

        for kind in kinds(kind) {
            for meta in self.list_metas(kind).await {
                let hit = if query.is_empty() {
                    Some((0, BTreeSet::new()))
                } else {
                    score(&meta, &query)
                };
                if let Some((score, matched_on)) = hit {
                    results.push(SearchResult {
                        summary: ArtifactSummary::from(&meta),
                        score,
                        matched_on,
                    });
                }
            }
        }

        results.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.summary.reference.key().cmp(&b.summary.reference.key()))
        });
        debug!(query = %query, hits = results.len(), "search finished");
        results
    }

    /// Fetches the bundle for `reference`; version constraints are the
    /// resolver's concern.
    pub async fn get(&self, reference: &ArtifactRef) -> Result<ArtifactBundle> {
        if !self.adapter.exists(reference.kind, &reference.id).await? {
            return Err(ForgeError::NotFound {
                kind: reference.kind,
                id: reference.id.clone(),
            });
        }
        self.adapter.read(reference.kind, &reference.id).await
    }

    pub async fn list(&self, kind: Option<ArtifactType>) -> Vec<ArtifactSummary> {
        let mut summaries = Vec::new();
        for kind in kinds(kind) {
            summaries.extend(self.list_metas(kind).await.iter().map(ArtifactSummary::from));
        }
        summaries
    }

    pub async fn publish(&self, kind: ArtifactType, id: &str, bundle: &ArtifactBundle) -> Result<()> {
        self.adapter.write(kind, id, bundle).await
    }

    async fn list_metas(&self, kind: ArtifactType) -> Vec<ArtifactMeta> {
        match self.adapter.list(kind).await {
            Ok(metas) => metas,
            Err(e) => {
                warn!(adapter = self.adapter.name(), %kind, error = %e, "listing failed, treating as empty");
                Vec::new()
            }
        }
    }
}

fn kinds(kind: Option<ArtifactType>) -> Vec<ArtifactType> {
    kind.map_or_else(|| ArtifactType::ALL.to_vec(), |k| vec![k])
}

/// Additive, case-insensitive relevance score. `query` must be lowercase.
pub fn score(meta: &ArtifactMeta, query: &str) -> Option<(u32, BTreeSet<MatchField>)> {
    let base = meta.base();
    let mut total = 0;
    let mut matched_on = BTreeSet::new();

    let id = base.id.to_lowercase();
    if id == query {
        total += SCORE_ID_EXACT;
        matched_on.insert(MatchField::Id);
    } else if id.contains(query) {
        total += SCORE_ID_PARTIAL;
        matched_on.insert(MatchField::Id);
    }

    let name = base.name.to_lowercase();
    if name == query {
        total += SCORE_NAME_EXACT;
        matched_on.insert(MatchField::Name);
    } else if name.contains(query) {
        total += SCORE_NAME_PARTIAL;
        matched_on.insert(MatchField::Name);
    }

    if base.description.to_lowercase().contains(query) {
        total += SCORE_DESCRIPTION;
        matched_on.insert(MatchField::Description);
    }

    if base.tags.iter().any(|t| t.to_lowercase().contains(query)) {
        total += SCORE_TAG;
        matched_on.insert(MatchField::Tags);
    }

    (total > 0).then_some((total, matched_on))
}
