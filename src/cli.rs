use anyhow::{Context, Result};
use clap::Parser;
use history_drill::config::{Config, WalkStrategy};
use history_drill::extractor::Capability;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

/// Mine a git repository's history into Parquet datasets
#[derive(Parser, Debug)]
#[command(name = "history-drill", author, version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Args {
    /// Remote URL of the repository to analyze
    pub url: Option<String>,

    /// TOML configuration file (defaults to the platform config path when present)
    #[arg(short, long, value_name = "FILE", env = "HISTORY_DRILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory receiving the Parquet datasets
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Copy every file blob into this content-addressed directory
    #[arg(long, value_name = "DIR")]
    pub content_dir: Option<PathBuf>,

    /// Clone into a memory-backed directory
    #[arg(long)]
    pub in_memory: bool,

    /// Log clone progress and extraction steps
    #[arg(long)]
    pub print_logs: bool,

    /// Analyze a local repository instead of cloning (not supported)
    #[arg(long)]
    pub local: bool,

    /// Length of the stored hash prefixes (7 to 40)
    #[arg(long, value_name = "N")]
    pub hash_length: Option<usize>,

    /// How the history is walked when several extractors run
    #[arg(long, value_enum)]
    pub walk: Option<WalkArg>,

    /// Extractor to run; repeat to run several (default: all)
    #[arg(short, long = "extractor", value_name = "NAME", value_parser = parse_capability)]
    pub extractors: Vec<Capability>,

    /// Do not write catalog.json
    #[arg(long)]
    pub no_catalog: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum WalkArg {
    /// Walk once and hand every commit to all extractors
    SharedPass,
    /// Walk once per extractor
    PerExtractor,
}

impl From<WalkArg> for WalkStrategy {
    fn from(value: WalkArg) -> Self {
        match value {
            WalkArg::SharedPass => WalkStrategy::SharedPass,
            WalkArg::PerExtractor => WalkStrategy::PerExtractor,
        }
    }
}

fn parse_capability(name: &str) -> Result<Capability, String> {
    Capability::from_name(name).ok_or_else(|| {
        format!(
            "unknown extractor '{}', expected one of: {}",
            name,
            Capability::ALL.map(|c| c.as_str()).join(", ")
        )
    })
}

/// Default tracing directive when `RUST_LOG` is unset
pub fn log_directive(config: &Config) -> &'static str {
    if config.repository.print_logs {
        "history_drill=info"
    } else {
        "warn"
    }
}

impl Args {
    /// Resolve the effective configuration: CLI args > environment > config file > defaults
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::load_or_default().context("Failed to load default config")?,
        };

        config.apply_env_overrides();
        self.apply(&mut config);
        config.validate()?;
        config.require_url()?;
        Ok(config)
    }

    /// Overlay the options given on the command line
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.repository.url = url.clone();
        }
        if let Some(output) = &self.output {
            config.export.output_dir = output.clone();
        }
        if let Some(content_dir) = &self.content_dir {
            config.export.content_dir = Some(content_dir.clone());
        }
        if self.in_memory {
            config.repository.use_in_memory_temp_repository = true;
        }
        if self.print_logs {
            config.repository.print_logs = true;
        }
        if self.local {
            config.repository.is_local = true;
        }
        if let Some(hash_length) = self.hash_length {
            config.extraction.hash_length = hash_length;
        }
        if let Some(walk) = self.walk {
            config.extraction.walk_strategy = walk.into();
        }
        if !self.extractors.is_empty() {
            config.extraction.extractors = self
                .extractors
                .iter()
                .map(|capability| capability.as_str().to_string())
                .collect();
        }
        if self.no_catalog {
            config.export.write_catalog = false;
        }
    }
}
