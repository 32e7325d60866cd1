//! # scope-cli -- Targeting selector from the command line
//!
//! Provides the `scope` command-line interface over the targeting selector.
//!
//! ## Subcommands
//!
//! - `scope tree`: load a taxonomy and print it as an indented tree.
//! - `scope resolve`: replay a pick sequence and print the confirmed
//!   targeting descriptor as JSON.
//!
//! ```bash
//! scope tree --taxonomy original --fixture fixtures/taxonomies.json --depth 2
//! scope resolve --taxonomy original --fixture fixtures/taxonomies.json \
//!     --pick nationalLevel=N1 --pick region=R1 --confirm-at region
//! ```
//!
//! Without `--fixture` both subcommands talk to the taxonomy service
//! configured through `SCOPE_TAXONOMY_URL` and `SCOPE_API_TOKEN`.

pub mod repository;
pub mod resolve;
pub mod tree;

/// Build the single-threaded runtime the subcommands run on.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
