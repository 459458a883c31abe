use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Default)]
#[command(
    name = "ask-bridge",
    version,
    about = "HTTP bridge that runs prompts through the claude CLI"
)]
pub(crate) struct Args {
    /// Optional TOML file with bridge settings.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Overrides both the file and the PORT environment variable.
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Command line used to launch the tool, e.g. "claude".
    #[arg(long)]
    pub(crate) command: Option<String>,
    #[arg(long)]
    pub(crate) workdir: Option<PathBuf>,
    #[arg(long)]
    pub(crate) model: Option<String>,
    /// Wait this long after SIGTERM before sending SIGKILL, e.g. "5s".
    #[arg(long, value_parser = humantime::parse_duration)]
    pub(crate) kill_grace: Option<Duration>,
    #[arg(long)]
    pub(crate) max_concurrent: Option<usize>,
    #[arg(long, default_value_t = false)]
    pub(crate) detailed_exit_status: bool,
    #[arg(long)]
    pub(crate) log_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub(crate) log_to_stderr: bool,
}
