//! Command-line arguments

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Markdown,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "relnotes")]
#[command(about = "Release notes template from two manifest revisions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Checkout of the previous release (default: cf-deployment-master)
    #[arg(long, value_name = "DIR")]
    pub before: Option<PathBuf>,

    /// Checkout of the release candidate (default: cf-deployment-release-candidate)
    #[arg(long, value_name = "DIR")]
    pub after: Option<PathBuf>,

    /// Manifest path inside each checkout
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<String>,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Markdown)]
    pub format: Format,

    /// Do not look up release tag pages
    #[arg(long)]
    pub offline: bool,

    /// Config file (default: <config dir>/relnotes/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// JSON log lines on stderr
    #[arg(long)]
    pub log_json: bool,
}
