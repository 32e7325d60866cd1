//! Repository selection for CLI subcommands: a JSON fixture file when
//! `--fixture` is given, otherwise the HTTP client configured from the
//! environment.

use std::path::Path;

use anyhow::Context;

use scope_client::{
    HttpTaxonomyClient, InMemoryRepository, RepositoryError, TaxonomyApiConfig, TaxonomyRepository,
};
use scope_core::{HierarchyNode, Level, NodeId, TaxonomyKind};
use scope_selector::SelectorConfig;

/// The repository a subcommand runs against.
#[derive(Debug)]
pub enum CliRepository {
    Fixture(InMemoryRepository),
    Http(HttpTaxonomyClient),
}

impl CliRepository {
    /// Open the fixture at `fixture`, or connect over HTTP when `None`.
    ///
    /// The HTTP client plans its retries inside the selector's fetch
    /// timeout.
    pub fn open(fixture: Option<&Path>, selector: &SelectorConfig) -> anyhow::Result<Self> {
        match fixture {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read fixture: {}", path.display()))?;
                let repo = InMemoryRepository::from_json(&json)
                    .with_context(|| format!("failed to parse fixture: {}", path.display()))?;
                tracing::debug!(fixture = %path.display(), "using fixture repository");
                Ok(Self::Fixture(repo))
            }
            None => {
                let config = TaxonomyApiConfig::from_env()
                    .context("taxonomy service not configured (set SCOPE_API_TOKEN or pass --fixture)")?
                    .within(selector.fetch_timeout);
                tracing::debug!(?config, "using taxonomy service");
                Ok(Self::Http(HttpTaxonomyClient::new(config)?))
            }
        }
    }
}

impl TaxonomyRepository for CliRepository {
    async fn list_roots(
        &self,
        taxonomy: TaxonomyKind,
        level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        match self {
            Self::Fixture(repo) => repo.list_roots(taxonomy, level).await,
            Self::Http(client) => client.list_roots(taxonomy, level).await,
        }
    }

    async fn list_children(
        &self,
        taxonomy: TaxonomyKind,
        parent_id: &NodeId,
        child_level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        match self {
            Self::Fixture(repo) => repo.list_children(taxonomy, parent_id, child_level).await,
            Self::Http(client) => client.list_children(taxonomy, parent_id, child_level).await,
        }
    }

    async fn fetch_full_tree(
        &self,
        taxonomy: TaxonomyKind,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        match self {
            Self::Fixture(repo) => repo.fetch_full_tree(taxonomy).await,
            Self::Http(client) => client.fetch_full_tree(taxonomy).await,
        }
    }
}
