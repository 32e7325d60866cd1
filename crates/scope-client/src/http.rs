//! Typed client for the taxonomy REST service.
//!
//! ## Paths (relative to the base URL)
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/taxonomy/api/v1/{taxonomy}/levels/{level}/roots` | List roots at a level |
//! | GET | `/taxonomy/api/v1/{taxonomy}/levels/{level}/nodes?parentId={id}` | List children |
//! | GET | `/taxonomy/api/v1/{taxonomy}/tree` | Full pre-nested tree |
//!
//! A 404 on a listing means the taxonomy or parent has no entries and is
//! returned as an empty list. A 404 on the tree means the service has no
//! tree route and is reported as `Unsupported`, so callers fall back to the
//! listings. Other non-2xx responses are errors.

use std::time::Duration;

use scope_core::{HierarchyNode, Level, NodeId, TaxonomyKind};

use crate::config::{ConfigError, TaxonomyApiConfig};
use crate::error::RepositoryError;
use crate::repository::TaxonomyRepository;
use crate::retry::{retry_send, RetryPolicy};

/// API version path segment for the taxonomy service.
const API_PREFIX: &str = "taxonomy/api/v1";

/// HTTP implementation of [`TaxonomyRepository`].
#[derive(Debug, Clone)]
pub struct HttpTaxonomyClient {
    http: reqwest::Client,
    base_url: url::Url,
    retry: RetryPolicy,
}

impl HttpTaxonomyClient {
    /// Create a new client from configuration.
    pub fn new(config: TaxonomyApiConfig) -> Result<Self, RepositoryError> {
        let http = reqwest::Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&format!(
                        "Bearer {}",
                        config.api_token.as_str()
                    ))
                    .map_err(|_| RepositoryError::Config(ConfigError::InvalidToken))?,
                );
                headers
            })
            .build()
            .map_err(|e| RepositoryError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
            retry: RetryPolicy::within(config.request_budget),
        })
    }

    fn taxonomy_url(&self, taxonomy: TaxonomyKind, rest: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.base_url,
            API_PREFIX,
            taxonomy.path_segment(),
            rest
        )
    }

    /// The per-attempt timeout each request is sent with.
    pub fn attempt_timeout(&self) -> Duration {
        self.retry.attempt_timeout
    }

    /// GET a node list. A 404 is answered with `on_missing`.
    async fn get_nodes(
        &self,
        endpoint: String,
        url: String,
        query: &[(&str, &str)],
        on_missing: fn() -> Result<Vec<HierarchyNode>, RepositoryError>,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        let resp = retry_send(self.retry, |timeout| {
            self.http.get(&url).query(query).timeout(timeout).send()
        })
        .await
        .map_err(|e| RepositoryError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return on_missing();
        }

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RepositoryError::ApiError {
                endpoint,
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| RepositoryError::Deserialization {
            endpoint,
            source: e,
        })
    }
}

impl TaxonomyRepository for HttpTaxonomyClient {
    /// Calls `GET {base_url}/taxonomy/api/v1/{taxonomy}/levels/{level}/roots`.
    async fn list_roots(
        &self,
        taxonomy: TaxonomyKind,
        level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        if !taxonomy.has_levels() {
            return Ok(Vec::new());
        }
        let endpoint = format!("GET /{}/levels/{level}/roots", taxonomy.path_segment());
        let url = self.taxonomy_url(taxonomy, &format!("levels/{level}/roots"));
        self.get_nodes(endpoint, url, &[], no_entries).await
    }

    /// Calls `GET {base_url}/taxonomy/api/v1/{taxonomy}/levels/{level}/nodes?parentId={id}`.
    async fn list_children(
        &self,
        taxonomy: TaxonomyKind,
        parent_id: &NodeId,
        child_level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        if !taxonomy.has_levels() {
            return Ok(Vec::new());
        }
        let endpoint = format!(
            "GET /{}/levels/{child_level}/nodes?parentId={parent_id}",
            taxonomy.path_segment()
        );
        let url = self.taxonomy_url(taxonomy, &format!("levels/{child_level}/nodes"));
        self.get_nodes(endpoint, url, &[("parentId", parent_id.as_str())], no_entries)
            .await
    }

    /// Calls `GET {base_url}/taxonomy/api/v1/{taxonomy}/tree`.
    async fn fetch_full_tree(
        &self,
        taxonomy: TaxonomyKind,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        if !taxonomy.supports_tree() {
            return Err(RepositoryError::Unsupported {
                operation: "fetch_full_tree",
            });
        }
        let endpoint = format!("GET /{}/tree", taxonomy.path_segment());
        let url = self.taxonomy_url(taxonomy, "tree");
        self.get_nodes(endpoint, url, &[], no_tree_route).await
    }
}

fn no_entries() -> Result<Vec<HierarchyNode>, RepositoryError> {
    Ok(Vec::new())
}

fn no_tree_route() -> Result<Vec<HierarchyNode>, RepositoryError> {
    Err(RepositoryError::Unsupported {
        operation: "fetch_full_tree",
    })
}
