//! Configuration resolution shared by the binary and tests.
//!
//! Explicit CLI values win; otherwise the `PLUGIN_DEPS_*` environment
//! variables are consulted. Empty variables count as unset.

use anyhow::{Result, bail};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const MANIFEST_ENV: &str = "PLUGIN_DEPS_MANIFEST";
pub const STATE_ENV: &str = "PLUGIN_DEPS_STATE";
pub const LOG_ENV: &str = "PLUGIN_DEPS_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Value of `name` when set to something other than whitespace.
pub fn env_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Component manifest path from `--manifest` or `PLUGIN_DEPS_MANIFEST`.
pub fn resolve_manifest_path(cli_value: Option<&Path>) -> Result<PathBuf> {
    resolve_path(cli_value, MANIFEST_ENV, "--manifest")
}

/// Activation state path from `--state` or `PLUGIN_DEPS_STATE`.
pub fn resolve_state_path(cli_value: Option<&Path>) -> Result<PathBuf> {
    resolve_path(cli_value, STATE_ENV, "--state")
}

fn resolve_path(cli_value: Option<&Path>, env_name: &str, flag: &str) -> Result<PathBuf> {
    if let Some(path) = cli_value {
        return Ok(path.to_path_buf());
    }
    match env_non_empty(env_name) {
        Some(raw) => Ok(PathBuf::from(raw)),
        None => bail!("No path configured; pass {flag} or set {env_name}"),
    }
}

/// Log filter: `PLUGIN_DEPS_LOG`, then `RUST_LOG`, then `warn`.
pub fn log_filter() -> EnvFilter {
    env_non_empty(LOG_ENV)
        .or_else(|| env_non_empty("RUST_LOG"))
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install a stderr fmt subscriber; repeated calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_value_wins_over_environment() {
        let path = resolve_manifest_path(Some(Path::new("/tmp/manifest.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/manifest.json"));
    }

    #[test]
    fn missing_configuration_names_flag_and_variable() {
        let err = resolve_path(None, "PLUGIN_DEPS_TEST_UNSET_VARIABLE", "--thing")
            .expect_err("nothing configured");
        let message = err.to_string();
        assert!(message.contains("--thing"));
        assert!(message.contains("PLUGIN_DEPS_TEST_UNSET_VARIABLE"));
    }
}
