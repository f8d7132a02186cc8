//! # Archive creation
//!
//! Merges one or more source directories into a single newc archive.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use initrift_archive::{ArchiveOptions, ArchiveSummary, CpioSession};
use initrift_config::{log_cli_debug, log_cli_info, log_cli_warn, Compression, Config};

use crate::output::ArchiveOutput;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Source directories, merged in order
    #[arg(value_name = "SRC", required = true)]
    sources: Vec<PathBuf>,

    /// Output archive path
    #[arg(short, long, value_name = "OUT")]
    output: PathBuf,

    /// Compression codec (overrides config)
    #[arg(long)]
    compression: Option<Compression>,

    /// Compression level (overrides config)
    #[arg(long)]
    level: Option<u32>,

    /// Record a fixed mtime instead of host timestamps
    #[arg(long)]
    no_mtime: bool,

    /// Record root ownership instead of host uid/gid
    #[arg(long)]
    no_owner: bool,
}

/// Settings after layering flags over config
#[derive(Debug, Clone, PartialEq, Eq)]
struct Plan {
    compression: Compression,
    level: u32,
    options: ArchiveOptions,
}

impl Plan {
    fn resolve(args: &CreateArgs, config: &Config) -> Self {
        Self {
            compression: args.compression.unwrap_or(config.output.compression),
            level: args.level.unwrap_or(config.output.level),
            options: ArchiveOptions {
                preserve_mtime: config.archive.preserve_mtime && !args.no_mtime,
                preserve_owner: config.archive.preserve_owner && !args.no_owner,
            },
        }
    }
}

pub fn run(args: CreateArgs, config: &Config) -> Result<()> {
    let plan = Plan::resolve(&args, config);
    log_cli_debug!(
        "Creating archive",
        output = %args.output.display(),
        compression = %plan.compression,
        sources = args.sources.len()
    );

    let summary = write_archive(&args.sources, &args.output, &plan)?;

    log_cli_info!(
        "Archive complete",
        records = summary.records,
        bytes = summary.bytes
    );
    println!(
        "Wrote {} ({} records, {} inodes, {} bytes uncompressed, {})",
        args.output.display(),
        summary.records,
        summary.inodes,
        summary.bytes,
        plan.compression
    );
    for deficit in &summary.deficits {
        println!(
            "  note: {} has {} of {} links inside the archive",
            deficit.source.display(),
            deficit.observed,
            deficit.declared
        );
    }
    Ok(())
}

/// Build the archive. Once `output` has been created, any failure removes it.
fn write_archive(sources: &[PathBuf], output: &Path, plan: &Plan) -> Result<ArchiveSummary> {
    ensure_outside_sources(sources, output)?;
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let result = fill_archive(file, sources, output, plan);
    if result.is_err() {
        if let Err(e) = std::fs::remove_file(output) {
            log_cli_warn!("Failed to remove partial output", error = %e);
        }
    }
    result
}

/// Refuse an output path inside any source tree; the walk would archive
/// the partially written output itself.
fn ensure_outside_sources(sources: &[PathBuf], output: &Path) -> Result<()> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let Some(file_name) = output.file_name() else {
        bail!("{} does not name a file", output.display());
    };
    let target = parent
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", parent.display()))?
        .join(file_name);

    for source in sources {
        // unresolvable sources are reported by the walk
        let Ok(source_root) = source.canonicalize() else {
            continue;
        };
        if target.starts_with(&source_root) {
            bail!(
                "output {} lies inside source {}",
                output.display(),
                source.display()
            );
        }
    }
    Ok(())
}

fn fill_archive(
    file: File,
    sources: &[PathBuf],
    output: &Path,
    plan: &Plan,
) -> Result<ArchiveSummary> {
    let sink = ArchiveOutput::new(file, plan.compression, plan.level)
        .context("Failed to initialize compressor")?;

    let mut session = CpioSession::with_options(sink, plan.options);
    for source in sources {
        let count = session
            .inject_tree(source)
            .with_context(|| format!("Failed to archive {}", source.display()))?;
        log_cli_debug!("Source injected", source = %source.display(), paths = count);
    }

    let summary = session.finalize().context("Failed to finalize archive")?;
    session
        .into_inner()
        .context("Failed to release archive output")?
        .finish()
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(summary)
}
