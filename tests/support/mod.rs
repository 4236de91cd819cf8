use anyhow::{Context, Result, bail};
use plugin_deps::{ComponentHeaders, ComponentKey, ComponentMap, DependencyGraph};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn keys(raw: &[&str]) -> Vec<ComponentKey> {
    raw.iter().map(|k| ComponentKey::from(*k)).collect()
}

/// Component map from `(key, name, provides, depends)` tuples.
pub fn component_map(entries: &[(&str, &str, &str, &str)]) -> ComponentMap {
    entries
        .iter()
        .map(|(key, name, provides, depends)| {
            (
                ComponentKey::from(*key),
                ComponentHeaders::new(name, provides, depends),
            )
        })
        .collect()
}

pub fn graph(entries: &[(&str, &str, &str, &str)]) -> DependencyGraph {
    DependencyGraph::build(&component_map(entries))
}

/// Temp workspace holding a manifest and activation state for CLI runs.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new(manifest: &Value, state: &Value) -> Result<Self> {
        let dir = TempDir::new().context("allocating temp workspace")?;
        std::fs::write(dir.path().join("manifest.json"), manifest.to_string())?;
        std::fs::write(dir.path().join("state.json"), state.to_string())?;
        Ok(Self { dir })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("manifest.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    pub fn write(&self, name: &str, value: &Value) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, value.to_string())?;
        Ok(path)
    }

    pub fn state(&self) -> Result<Value> {
        read_json(&self.state_path())
    }

    /// Command for the CLI with manifest/state flags already set.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_plugin-deps"));
        cmd.arg("--manifest")
            .arg(self.manifest_path())
            .arg("--state")
            .arg(self.state_path())
            .env_remove("PLUGIN_DEPS_MANIFEST")
            .env_remove("PLUGIN_DEPS_STATE");
        cmd
    }
}

pub fn read_json(path: &Path) -> Result<Value> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&data)?)
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

pub fn stdout_json(output: &Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).context("stdout is not a JSON object")
}
