//! # scope-client -- Taxonomy repository access
//!
//! The targeting selector needs exactly three things from the backend that
//! owns the taxonomies:
//!
//! - list the roots of a taxonomy at a level,
//! - list the children of a node at the next level,
//! - optionally, fetch a taxonomy's whole tree pre-nested.
//!
//! [`TaxonomyRepository`] is that seam. Two implementations ship here:
//! [`HttpTaxonomyClient`] talks to the taxonomy REST service, and
//! [`InMemoryRepository`] serves fixtures for tests and offline use.
//!
//! ## API Path Convention
//!
//! `{base_url}/taxonomy/api/v1/{taxonomy}/...`, where `{taxonomy}` is the
//! lowercase taxonomy name (`original`, `expatriate`, `sector`). `GLOBAL`
//! has no entities and never reaches the network.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod repository;
pub(crate) mod retry;

pub use config::{ConfigError, TaxonomyApiConfig};
pub use error::RepositoryError;
pub use http::HttpTaxonomyClient;
pub use memory::InMemoryRepository;
pub use repository::TaxonomyRepository;
