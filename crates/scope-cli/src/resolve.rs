//! # Resolve Subcommand
//!
//! Drives a [`TargetSelector`] through a sequence of picks and prints the
//! confirmed targeting descriptor as JSON on stdout.
//!
//! Picks are applied in order, each one loading the next level before the
//! following pick is resolved, so `--pick` values must walk down from a
//! root: `--pick nationalLevel=N1 --pick region=R1`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use scope_client::TaxonomyRepository;
use scope_core::{Level, NodeId, TaxonomyKind};
use scope_selector::{DescriptorSink, SelectorConfig, TargetSelector, TargetingDescriptor};

use crate::repository::CliRepository;

/// Arguments for the `scope resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Taxonomy to select in (original, expatriate, sector, global).
    #[arg(long)]
    pub taxonomy: TaxonomyKind,

    /// JSON fixture to read instead of the taxonomy service.
    #[arg(long, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Node to pick, as LEVEL=ID. Repeat to walk down the hierarchy.
    #[arg(long = "pick", value_name = "LEVEL=ID", value_parser = parse_pick)]
    pub picks: Vec<(Level, NodeId)>,

    /// Level to confirm at. Defaults to the deepest pick.
    #[arg(long, value_name = "LEVEL")]
    pub confirm_at: Option<Level>,
}

/// Parse a `LEVEL=ID` pick.
fn parse_pick(s: &str) -> Result<(Level, NodeId), String> {
    let (level, id) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LEVEL=ID, got '{s}'"))?;
    let level = level.trim().parse::<Level>().map_err(|e| e.to_string())?;
    let id = NodeId::new(id.trim()).map_err(|e| e.to_string())?;
    Ok((level, id))
}

/// Writes each confirmed descriptor to `out` as pretty JSON.
pub struct JsonSink<W> {
    out: W,
    error: Option<std::io::Error>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// The write error from the last emit, if any.
    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.error.take()
    }
}

impl<W: Write> DescriptorSink for JsonSink<W> {
    fn emit(&mut self, descriptor: &TargetingDescriptor) {
        let written = serde_json::to_writer_pretty(&mut self.out, descriptor)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.out));
        if let Err(e) = written {
            tracing::error!(error = %e, "failed to write descriptor");
            self.error = Some(e);
        }
    }
}

/// Execute the resolve subcommand.
pub fn run_resolve(args: &ResolveArgs) -> Result<u8> {
    let config = SelectorConfig::from_env();
    let repo = CliRepository::open(args.fixture.as_deref(), &config)?;
    crate::runtime()?.block_on(resolve(repo, args, config, std::io::stdout()))?;
    Ok(0)
}

/// Apply `args` to a fresh selector over `repo` and confirm, writing the
/// descriptor to `out`.
pub async fn resolve<R, W>(
    repo: R,
    args: &ResolveArgs,
    config: SelectorConfig,
    out: W,
) -> Result<TargetingDescriptor>
where
    R: TaxonomyRepository,
    W: Write,
{
    let mut selector = TargetSelector::new(repo, JsonSink::new(out), config);
    selector.select_taxonomy_and_load(args.taxonomy).await;
    report_failure(&selector);

    for (level, id) in &args.picks {
        selector
            .pick_and_load(*level, id)
            .await
            .with_context(|| format!("cannot pick {level}={id}"))?;
        report_failure(&selector);
    }

    if let Some(level) = args.confirm_at {
        selector
            .change_level_target(level)
            .with_context(|| format!("cannot confirm at {level}"))?;
    }

    let label = selector.label();
    tracing::info!(selection = %label.breadcrumb, "confirming");
    let descriptor = selector.confirm()?;
    if let Some(e) = selector.sink_mut().take_error() {
        bail!("failed to write descriptor: {e}");
    }
    Ok(descriptor)
}

fn report_failure<R: TaxonomyRepository, S: DescriptorSink>(selector: &TargetSelector<R, S>) {
    if let Some(failure) = selector.failure() {
        tracing::warn!("{failure}");
    }
}
