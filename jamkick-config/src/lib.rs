//! Loader for jamkick configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are attached, with `JAMKICK_`-prefixed
//! environment variables always winning (`JAMKICK_RESULTS__MAX_PAGES=5` sets
//! `results.max_pages`). After merging, `${VAR}` placeholders inside string
//! values are expanded. Every field has a default, so an empty configuration
//! is valid.
use config::{Config, ConfigError, Environment, File, FileFormat};
use jamkick_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "JAMKICK";
const CONFIG_FILE_NAME: &str = "jamkick.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JamkickConfig {
    pub results: ResultsConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Where result pages come from and when to stop asking for more.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    pub base_url: String,
    pub path: String,
    /// `id` attribute of the element that marks the last page.
    pub sentinel_id: String,
    /// Upper bound on pages per search; `None` trusts the server entirely.
    pub max_pages: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub retries: usize,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            path: "/results".into(),
            sentinel_id: "loading-complete".into(),
            max_pages: Some(100),
            request_timeout_secs: None,
            retries: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Append,
    Replace,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub mode: DisplayMode,
    pub loading_markup: String,
    pub failure_message: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Append,
            loading_markup: r#"<p id="loading">Loading, please wait!</p>"#.into(),
            failure_message: "Something went wrong!".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub dir: Option<PathBuf>,
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
            dir: None,
            stderr: false,
        }
    }
}

/// Candidate locations for an implicit config file: the working directory
/// first, then the user's config directory.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("jamkick").join(CONFIG_FILE_NAME));
    }
    paths
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct JamkickConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for JamkickConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl JamkickConfigLoader {
    /// Start from built-in defaults; attach files or snippets before [`load`](Self::load).
    ///
    /// ```
    /// use jamkick_config::{DisplayMode, JamkickConfigLoader};
    ///
    /// let config = JamkickConfigLoader::new().load().expect("defaults load");
    ///
    /// assert_eq!(config.results.path, "/results");
    /// assert_eq!(config.results.sentinel_id, "loading-complete");
    /// assert_eq!(config.results.retries, 0);
    /// assert_eq!(config.display.mode, DisplayMode::Append);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use jamkick_config::{DisplayMode, JamkickConfigLoader};
    ///
    /// let cfg = JamkickConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// results:
    ///   base_url: "http://jams.example"
    ///   max_pages: 3
    /// display:
    ///   mode: replace
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.results.base_url, "http://jams.example");
    /// assert_eq!(cfg.results.max_pages, Some(3));
    /// assert_eq!(cfg.results.path, "/results");
    /// assert_eq!(cfg.display.mode, DisplayMode::Replace);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into [`JamkickConfig`].
    pub fn load(self) -> Result<JamkickConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
