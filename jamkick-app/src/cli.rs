use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use jamkick_config::{DisplayMode, JamkickConfig, JamkickConfigLoader, default_config_paths};
use std::path::PathBuf;

/// Look up upcoming shows for a user's jams, page by page.
#[derive(Debug, Parser)]
#[command(name = "jamkick", version)]
pub struct Cli {
    /// Username to search for.
    #[arg(short, long)]
    pub username: String,

    /// Location to search in.
    #[arg(short, long)]
    pub location: String,

    /// Config file (YAML/TOML/JSON). Without it, `./jamkick.yaml` and the user
    /// config directory are tried.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override `results.base_url`.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Override `results.max_pages`.
    #[arg(long, conflicts_with = "unbounded")]
    pub max_pages: Option<u32>,

    /// Keep requesting pages until the server says stop.
    #[arg(long)]
    pub unbounded: bool,

    /// Override `display.mode`.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Print the final markup instead of its text.
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Append,
    Replace,
}

impl From<ModeArg> for DisplayMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Append => DisplayMode::Append,
            ModeArg::Replace => DisplayMode::Replace,
        }
    }
}

impl Cli {
    /// Load configuration (file, then env) and apply command-line overrides on top.
    pub fn load_config(&self) -> Result<JamkickConfig> {
        let mut loader = JamkickConfigLoader::new();
        match &self.config {
            Some(path) => loader = loader.with_file(path),
            None => {
                for path in default_config_paths().into_iter().rev() {
                    loader = loader.with_optional_file(path);
                }
            }
        }
        let mut cfg = loader.load().context("failed to load configuration")?;
        self.apply_overrides(&mut cfg);
        Ok(cfg)
    }

    fn apply_overrides(&self, cfg: &mut JamkickConfig) {
        if let Some(url) = &self.base_url {
            cfg.results.base_url = url.clone();
        }
        if self.unbounded {
            cfg.results.max_pages = None;
        } else if let Some(n) = self.max_pages {
            cfg.results.max_pages = Some(n);
        }
        if let Some(mode) = self.mode {
            cfg.display.mode = mode.into();
        }
    }
}
