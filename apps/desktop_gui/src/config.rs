//! Startup configuration: defaults, then `directory.toml`, then environment, then flags.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use client_core::{
    directory::DEFAULT_SPINNER_DELAY,
    remote::{DEFAULT_ENDPOINT, DEFAULT_RESULTS, DEFAULT_TIMEOUT},
    DirectoryOptions,
};
use serde::Deserialize;
use url::Url;

pub const CONFIG_FILE_NAME: &str = "directory.toml";
const DATABASE_FILE_NAME: &str = "users.sqlite3";
const APP_DIR_NAME: &str = "user_directory";

#[derive(Parser, Debug, Default)]
#[command(name = "desktop_gui", about = "Browse a directory of randomly generated users")]
pub struct CliArgs {
    /// Profile endpoint queried when the local store is empty.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Number of profiles requested per refresh.
    #[arg(long)]
    pub results: Option<usize>,
    /// Minimum time the loading spinner stays up, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,
    #[arg(long)]
    pub database_url: Option<String>,
    /// Directory holding the local database when no database url is given.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Config file to read instead of ./directory.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub results: usize,
    pub spinner_delay_ms: u64,
    pub http_timeout_secs: u64,
    pub database_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            results: DEFAULT_RESULTS,
            spinner_delay_ms: u64::try_from(DEFAULT_SPINNER_DELAY.as_millis()).unwrap_or(1000),
            http_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            database_url: None,
            data_dir: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    endpoint: Option<String>,
    results: Option<usize>,
    delay_ms: Option<u64>,
    http_timeout_secs: Option<u64>,
    database_url: Option<String>,
    data_dir: Option<PathBuf>,
}

/// Values the backend worker needs, validated.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub database_url: String,
    pub endpoint: Url,
    pub http_timeout: Duration,
    pub options: DirectoryOptions,
}

impl Settings {
    pub fn backend_config(&self) -> anyhow::Result<BackendConfig> {
        let endpoint = Url::parse(self.endpoint.trim())
            .with_context(|| format!("invalid profile endpoint '{}'", self.endpoint))?;
        let database_url = match &self.database_url {
            Some(raw) => prepare_database_url(raw)?,
            None => {
                let data_dir = match &self.data_dir {
                    Some(dir) => dir.clone(),
                    None => default_data_dir()?,
                };
                prepare_database_url(&data_dir.join(DATABASE_FILE_NAME).to_string_lossy())?
            }
        };

        Ok(BackendConfig {
            database_url,
            endpoint,
            http_timeout: Duration::from_secs(self.http_timeout_secs),
            options: DirectoryOptions {
                results: self.results,
                spinner_delay: Duration::from_millis(self.spinner_delay_ms),
            },
        })
    }

    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.endpoint {
            self.endpoint = v;
        }
        if let Some(v) = file_cfg.results {
            self.results = v;
        }
        if let Some(v) = file_cfg.delay_ms {
            self.spinner_delay_ms = v;
        }
        if let Some(v) = file_cfg.http_timeout_secs {
            self.http_timeout_secs = v;
        }
        if let Some(v) = file_cfg.database_url {
            self.database_url = Some(v);
        }
        if let Some(v) = file_cfg.data_dir {
            self.data_dir = Some(v);
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let first = |names: &[&str]| names.iter().find_map(|name| var(name));

        if let Some(v) = first(&["APP__ENDPOINT", "DIRECTORY_ENDPOINT"]) {
            self.endpoint = v;
        }
        if let Some(v) = first(&["APP__RESULTS", "DIRECTORY_RESULTS"]) {
            match v.parse::<usize>() {
                Ok(parsed) => self.results = parsed,
                Err(err) => tracing::warn!("ignoring DIRECTORY_RESULTS='{v}': {err}"),
            }
        }
        if let Some(v) = first(&["APP__DELAY_MS", "DIRECTORY_DELAY_MS"]) {
            match v.parse::<u64>() {
                Ok(parsed) => self.spinner_delay_ms = parsed,
                Err(err) => tracing::warn!("ignoring DIRECTORY_DELAY_MS='{v}': {err}"),
            }
        }
        if let Some(v) = first(&["APP__DATABASE_URL", "DATABASE_URL"]) {
            self.database_url = Some(v);
        }
        if let Some(v) = first(&["APP__DATA_DIR", "DIRECTORY_DATA_DIR"]) {
            self.data_dir = Some(PathBuf::from(v));
        }
    }

    fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(v) = &args.endpoint {
            self.endpoint = v.clone();
        }
        if let Some(v) = args.results {
            self.results = v;
        }
        if let Some(v) = args.delay_ms {
            self.spinner_delay_ms = v;
        }
        if let Some(v) = &args.database_url {
            self.database_url = Some(v.clone());
        }
        if let Some(v) = &args.data_dir {
            self.data_dir = Some(v.clone());
        }
    }
}

pub fn load_settings(args: &CliArgs) -> anyhow::Result<Settings> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let file_cfg = read_config_file(&config_path, args.config.is_some())?;
    Ok(layer_settings(file_cfg, |name| {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }, args))
}

fn read_config_file(path: &Path, required: bool) -> anyhow::Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    let parsed = toml::from_str::<FileSettings>(&raw)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(Some(parsed))
}

fn layer_settings(
    file_cfg: Option<FileSettings>,
    env: impl Fn(&str) -> Option<String>,
    args: &CliArgs,
) -> Settings {
    let mut settings = Settings::default();
    if let Some(file_cfg) = file_cfg {
        settings.apply_file(file_cfg);
    }
    settings.apply_env(env);
    settings.apply_cli(args);
    settings
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("unable to resolve local app data dir"))?;
    Ok(base.join(APP_DIR_NAME))
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url)
        .ok_or_else(|| anyhow::anyhow!("database url is empty"))?;
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> Option<String> {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return None;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return Some(raw_database_url.to_string());
    }

    Some(format!("sqlite://{}", raw_database_url.replace('\\', "/")))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
