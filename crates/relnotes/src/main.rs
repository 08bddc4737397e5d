//! Relnotes CLI
//!
//! Compares two checkouts of a deployment repository and prints a release
//! notes template.

use anyhow::{Context, Result};
use clap::Parser;
use relnotes_core::{
    Canonicalizer, DocumentLoader, HttpProbe, NotesBuilder, OpsFileFinder, ReleaseNotes, Renderer,
};
use tracing::{debug, info};

mod cli;
mod config;
mod logging;

use cli::{Cli, Format};
use config::Config;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(cli);
    debug!(?config, "resolved configuration");

    let loader = DocumentLoader::new(&config.before_dir, &config.after_dir);
    let finder = OpsFileFinder::new()
        .with_operations_dir(&config.operations_dir)
        .with_exclude(config.exclude_patterns()?);

    let notes = build_notes(&config, &loader, &finder)?;

    let rendered = match cli.format {
        Format::Markdown => Renderer::new().render(&notes),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&notes)?;
            json.push('\n');
            json
        }
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote release notes");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn build_notes(
    config: &Config,
    loader: &DocumentLoader,
    finder: &OpsFileFinder,
) -> Result<ReleaseNotes> {
    let builder = NotesBuilder::new(loader, finder).with_manifest(&config.manifest);

    if config.offline {
        return Ok(builder.build(|_| None)?);
    }

    let probe = HttpProbe::new(config.timeout()).context("Failed to create HTTP client")?;
    let canonicalizer = Canonicalizer::new(probe)
        .with_index_host(&config.package_index_host)
        .with_max_redirects(config.max_redirects);
    Ok(builder.build(|url| canonicalizer.canonicalize(url))?)
}
