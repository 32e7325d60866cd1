//! # Tree Subcommand
//!
//! Loads a taxonomy level by level, the same way the selector does, and
//! prints the result as an indented tree. Levels that fail to load are
//! shown empty; the loader has already logged why.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use scope_client::TaxonomyRepository;
use scope_core::{HierarchyNode, NodeId, TaxonomyKind};
use scope_selector::{load, FetchTarget, HierarchyCache, SelectorConfig};

use crate::repository::CliRepository;

/// Arguments for the `scope tree` subcommand.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Taxonomy to print (original, expatriate, sector, global).
    #[arg(long)]
    pub taxonomy: TaxonomyKind,

    /// JSON fixture to read instead of the taxonomy service.
    #[arg(long, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Number of levels to show, roots included.
    #[arg(long, default_value_t = 5)]
    pub depth: usize,
}

/// Execute the tree subcommand.
pub fn run_tree(args: &TreeArgs) -> Result<u8> {
    let config = SelectorConfig::from_env();
    let repo = CliRepository::open(args.fixture.as_deref(), &config)?;
    let roots = crate::runtime()?.block_on(load_tree(&repo, args.taxonomy, args.depth, &config));

    let mut out = std::io::stdout().lock();
    if !args.taxonomy.has_levels() {
        writeln!(out, "{}: applies to everyone", args.taxonomy)?;
        return Ok(0);
    }
    write_tree(&mut out, &roots, args.depth)?;
    Ok(0)
}

/// Load `depth` levels of `taxonomy`, starting at its configured root level.
pub async fn load_tree<R: TaxonomyRepository>(
    repo: &R,
    taxonomy: TaxonomyKind,
    depth: usize,
    config: &SelectorConfig,
) -> Vec<HierarchyNode> {
    let Some(root_level) = config.root_level(taxonomy) else {
        return Vec::new();
    };
    if depth == 0 {
        return Vec::new();
    }
    let mut cache = HierarchyCache::new();
    let request = cache.request(taxonomy, FetchTarget::Roots { level: root_level });
    let outcome = load(repo, &request, config).await;
    cache.store_roots(taxonomy, root_level, outcome.nodes);

    let mut level = root_level;
    for relative in 0..depth - 1 {
        let Some(child_level) = level.child_in(taxonomy) else {
            break;
        };
        let mut pending = Vec::new();
        unloaded_at(cache.roots(taxonomy), relative, &mut pending);
        for parent in pending {
            let request = cache.request(
                taxonomy,
                FetchTarget::Children {
                    parent: parent.clone(),
                    parent_level: level,
                    child_level,
                },
            );
            let outcome = load(repo, &request, config).await;
            if outcome.is_success() {
                cache.attach_children(taxonomy, level, &parent, outcome.nodes);
            }
        }
        level = child_level;
    }
    cache.roots(taxonomy).to_vec()
}

/// Ids of nodes `depth` levels down whose children are not loaded yet.
fn unloaded_at(nodes: &[HierarchyNode], depth: usize, out: &mut Vec<NodeId>) {
    for node in nodes {
        if depth == 0 {
            if !node.children_loaded() {
                out.push(node.id.clone());
            }
        } else {
            unloaded_at(node.children(), depth - 1, out);
        }
    }
}

/// Print `nodes` two spaces per level, at most `depth` levels deep.
pub fn write_tree<W: Write>(out: &mut W, nodes: &[HierarchyNode], depth: usize) -> std::io::Result<()> {
    if nodes.is_empty() {
        return writeln!(out, "(no entries)");
    }
    write_level(out, nodes, 0, depth)
}

fn write_level<W: Write>(
    out: &mut W,
    nodes: &[HierarchyNode],
    indent: usize,
    remaining: usize,
) -> std::io::Result<()> {
    if remaining == 0 {
        return Ok(());
    }
    for node in nodes {
        let pad = "  ".repeat(indent);
        match &node.code {
            Some(code) => writeln!(out, "{pad}{} [{code}] ({})", node.name, node.id)?,
            None => writeln!(out, "{pad}{} ({})", node.name, node.id)?,
        }
        write_level(out, node.children(), indent + 1, remaining - 1)?;
    }
    Ok(())
}
