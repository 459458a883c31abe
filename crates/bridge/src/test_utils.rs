use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::BridgeConfig;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.push(format!("{prefix}-{nanos}-{seq}"));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Writes a fake tool script. It is run through `sh` rather than executed
/// directly, so it needs no exec bit.
pub(crate) fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-tool.sh");
    fs::write(&path, body).expect("write script");
    path
}

/// Config that launches `sh <script>` with `dir` as the working directory.
pub(crate) fn script_config(dir: &Path, script: &Path) -> BridgeConfig {
    BridgeConfig {
        command: vec!["sh".to_string(), script.display().to_string()],
        workdir: dir.to_path_buf(),
        ..BridgeConfig::default()
    }
}
