use anyhow::Context;
use bridge_protocol::limits::{DEFAULT_TIMEOUT_MS, MAX_BODY_BYTES, MAX_TIMEOUT_MS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::cli::Args;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_COMMAND: &str = "claude";
const DEFAULT_WORKDIR: &str = "/workspace";

pub(crate) const PORT_ENV: &str = "PORT";
pub(crate) const MODEL_ENV: &str = "CLAUDE_MODEL";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    command: Option<String>,
    workdir: Option<PathBuf>,
    model: Option<String>,
    default_timeout_ms: Option<u64>,
    max_timeout_ms: Option<u64>,
    kill_grace: Option<String>,
    max_concurrent: Option<usize>,
    body_limit_bytes: Option<usize>,
    detailed_exit_status: Option<bool>,
}

/// Fully resolved settings handed to the server and runner at startup.
#[derive(Debug, Clone)]
pub(crate) struct BridgeConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
    /// Program followed by any fixed leading arguments.
    pub(crate) command: Vec<String>,
    pub(crate) workdir: PathBuf,
    pub(crate) model: Option<String>,
    pub(crate) default_timeout_ms: u64,
    pub(crate) max_timeout_ms: u64,
    pub(crate) kill_grace: Option<Duration>,
    pub(crate) max_concurrent: Option<usize>,
    pub(crate) body_limit_bytes: usize,
    pub(crate) detailed_exit_status: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            command: vec![DEFAULT_COMMAND.to_string()],
            workdir: PathBuf::from(DEFAULT_WORKDIR),
            model: None,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_timeout_ms: MAX_TIMEOUT_MS,
            kill_grace: None,
            max_concurrent: None,
            body_limit_bytes: MAX_BODY_BYTES,
            detailed_exit_status: false,
        }
    }
}

impl BridgeConfig {
    /// Layers defaults, the optional file, the environment and CLI flags, in that order.
    pub(crate) fn resolve<F>(args: &Args, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match args.config.as_deref() {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };

        let mut config = Self::default();
        config.apply_file(file)?;
        config.apply_env(env)?;
        config.apply_args(args)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) -> anyhow::Result<()> {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(command) = file.command.as_deref() {
            self.command = split_command(command)?;
        }
        if let Some(workdir) = file.workdir {
            self.workdir = workdir;
        }
        if let Some(model) = non_empty(file.model) {
            self.model = Some(model);
        }
        if let Some(value) = file.default_timeout_ms {
            self.default_timeout_ms = value;
        }
        if let Some(value) = file.max_timeout_ms {
            self.max_timeout_ms = value;
        }
        if let Some(raw) = file.kill_grace.as_deref() {
            let grace = humantime::parse_duration(raw)
                .with_context(|| format!("invalid kill_grace {raw:?}"))?;
            self.kill_grace = Some(grace);
        }
        if let Some(value) = file.max_concurrent {
            self.max_concurrent = Some(value);
        }
        if let Some(value) = file.body_limit_bytes {
            self.body_limit_bytes = value;
        }
        if let Some(value) = file.detailed_exit_status {
            self.detailed_exit_status = value;
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, env: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = non_empty(env(PORT_ENV)) {
            self.port = raw
                .trim()
                .parse()
                .with_context(|| format!("{PORT_ENV} must be a port number, got {raw:?}"))?;
        }
        if let Some(model) = non_empty(env(MODEL_ENV)) {
            self.model = Some(model);
        }
        Ok(())
    }

    fn apply_args(&mut self, args: &Args) -> anyhow::Result<()> {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(command) = args.command.as_deref() {
            self.command = split_command(command)?;
        }
        if let Some(workdir) = &args.workdir {
            self.workdir = workdir.clone();
        }
        if let Some(model) = non_empty(args.model.clone()) {
            self.model = Some(model);
        }
        if let Some(grace) = args.kill_grace {
            self.kill_grace = Some(grace);
        }
        if let Some(value) = args.max_concurrent {
            self.max_concurrent = Some(value);
        }
        if args.detailed_exit_status {
            self.detailed_exit_status = true;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_timeout_ms == 0 {
            anyhow::bail!("default_timeout_ms must be greater than zero");
        }
        if self.max_timeout_ms == 0 {
            anyhow::bail!("max_timeout_ms must be greater than zero");
        }
        if let Some(limit) = self.max_concurrent {
            if limit == 0 {
                anyhow::bail!("max_concurrent must be greater than zero when set");
            }
            if limit > Semaphore::MAX_PERMITS {
                anyhow::bail!(
                    "max_concurrent must be at most {}, got {limit}",
                    Semaphore::MAX_PERMITS
                );
            }
        }
        if self.body_limit_bytes == 0 {
            anyhow::bail!("body_limit_bytes must be greater than zero");
        }
        Ok(())
    }
}

fn load_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: FileConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

fn split_command(raw: &str) -> anyhow::Result<Vec<String>> {
    let parts =
        shell_words::split(raw).with_context(|| format!("invalid tool command {raw:?}"))?;
    if parts.is_empty() {
        anyhow::bail!("tool command must not be empty");
    }
    Ok(parts)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
