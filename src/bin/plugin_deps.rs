//! Command-line front end for the dependency graph.
//!
//! Loads the component manifest and the activation state, runs one command,
//! and prints a single JSON object on stdout. Activation refuses components
//! with unsatisfied dependencies; activation and deactivation both update the
//! state file, including every conflicting or cascaded component.

use anyhow::{Result, anyhow, bail};
use plugin_deps::config::{init_tracing, resolve_manifest_path, resolve_state_path};
use plugin_deps::{
    ActionKind, ActionOutcome, ActivationStore, ActiveSnapshot, CapabilityName, ComponentKey,
    DependencyGraph, JsonStateStore, Resolver, all_reports, dependency_report,
    load_component_map_from_path, merge_components, parse_key_list,
};
use serde_json::{Value, json};
use std::env;
use std::path::PathBuf;
use tracing::warn;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    let output = match &cli.command {
        Command::Merge(files) => merge_files(files)?,
        Command::Providers(capability) => {
            let graph = load_graph(&cli)?;
            providers(&graph, capability)
        }
        Command::Status(keys) => {
            let graph = load_graph(&cli)?;
            let store = open_store(&cli)?;
            status(&graph, &store, keys)?
        }
        Command::Activate(keys) => {
            let graph = load_graph(&cli)?;
            let mut store = open_store(&cli)?;
            activate(&graph, &mut store, keys)?
        }
        Command::Deactivate(keys) => {
            let graph = load_graph(&cli)?;
            let mut store = open_store(&cli)?;
            deactivate(&graph, &mut store, keys)?
        }
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn load_graph(cli: &Cli) -> Result<DependencyGraph> {
    let path = resolve_manifest_path(cli.manifest_path.as_deref())?;
    DependencyGraph::load(&path)
}

fn open_store(cli: &Cli) -> Result<JsonStateStore> {
    let path = resolve_state_path(cli.state_path.as_deref())?;
    JsonStateStore::open(&path)
}

fn merge_files(files: &[PathBuf]) -> Result<Value> {
    let mut maps = files
        .iter()
        .map(|path| load_component_map_from_path(path))
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    let first = maps.next().unwrap_or_default();
    Ok(serde_json::to_value(merge_components(first, maps))?)
}

fn providers(graph: &DependencyGraph, capability: &CapabilityName) -> Value {
    let resolver = Resolver::new(graph);
    json!({
        "capability": capability,
        "providers": resolver.providers(capability),
    })
}

fn status(
    graph: &DependencyGraph,
    store: &JsonStateStore,
    keys: &[ComponentKey],
) -> Result<Value> {
    let snapshot = ActiveSnapshot::capture(store);
    let reports = if keys.is_empty() {
        all_reports(graph, &snapshot)
    } else {
        ensure_known(graph, keys)?;
        keys.iter()
            .filter_map(|key| dependency_report(graph, key, &snapshot))
            .collect()
    };
    Ok(json!({ "reports": reports }))
}

fn activate(
    graph: &DependencyGraph,
    store: &mut JsonStateStore,
    keys: &[ComponentKey],
) -> Result<Value> {
    ensure_known(graph, keys)?;

    // Components activated together may satisfy each other.
    let mut snapshot = ActiveSnapshot::capture(store);
    for key in keys {
        if !snapshot.local.contains(key) {
            snapshot.local.push(key.clone());
        }
    }
    let blocked: Vec<String> = keys
        .iter()
        .filter_map(|key| dependency_report(graph, key, &snapshot))
        .filter(|report| !report.can_activate)
        .map(|report| {
            let missing: Vec<&str> = report.unsatisfied().map(CapabilityName::as_str).collect();
            format!("{} requires {}", report.component, missing.join(", "))
        })
        .collect();
    if !blocked.is_empty() {
        bail!("Unsatisfied dependencies:\n{}", blocked.join("\n"));
    }

    let resolver = Resolver::new(graph);
    let deactivated = ActionKind::Conflicting.run(&resolver, store, keys);
    store.activate(keys)?;
    Ok(serde_json::to_value(ActionOutcome::new(
        ActionKind::Conflicting,
        keys.to_vec(),
        deactivated,
    ))?)
}

fn deactivate(
    graph: &DependencyGraph,
    store: &mut JsonStateStore,
    keys: &[ComponentKey],
) -> Result<Value> {
    for key in keys.iter().filter(|key| !graph.contains(key.as_str())) {
        warn!(key = %key, "deactivating unknown component");
    }
    let resolver = Resolver::new(graph);
    let deactivated = ActionKind::Cascade.run(&resolver, store, keys);
    store.deactivate(keys);
    Ok(serde_json::to_value(ActionOutcome::new(
        ActionKind::Cascade,
        keys.to_vec(),
        deactivated,
    ))?)
}

fn ensure_known(graph: &DependencyGraph, keys: &[ComponentKey]) -> Result<()> {
    if let Some(unknown) = keys.iter().find(|key| !graph.contains(key.as_str())) {
        bail!("Unknown component: {unknown}");
    }
    Ok(())
}

enum Command {
    Providers(CapabilityName),
    Status(Vec<ComponentKey>),
    Activate(Vec<ComponentKey>),
    Deactivate(Vec<ComponentKey>),
    Merge(Vec<PathBuf>),
}

struct Cli {
    manifest_path: Option<PathBuf>,
    state_path: Option<PathBuf>,
    command: Command,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args_os();
        let _program = args.next();
        let mut manifest_path = None;
        let mut state_path = None;
        let mut positional: Vec<String> = Vec::new();

        while let Some(arg) = args.next() {
            let arg_str = arg
                .to_str()
                .ok_or_else(|| anyhow!("invalid UTF-8 in argument"))?;
            match arg_str {
                "--manifest" => manifest_path = Some(next_path("--manifest", &mut args)?),
                "--state" => state_path = Some(next_path("--state", &mut args)?),
                "--help" | "-h" => usage(0),
                other if other.starts_with("--") => bail!("unknown argument: {other}"),
                other => positional.push(other.to_string()),
            }
        }

        let Some((name, rest)) = positional.split_first() else {
            usage(1);
        };
        let command = match name.as_str() {
            "providers" => match rest {
                [capability] => Command::Providers(CapabilityName(capability.trim().to_string())),
                _ => bail!("providers expects exactly one capability"),
            },
            "status" => Command::Status(parse_key_list(rest)),
            "activate" | "deactivate" => {
                let keys = parse_key_list(rest);
                if keys.is_empty() {
                    bail!("{name} expects at least one component key");
                }
                match ActionKind::try_from(name.as_str())? {
                    ActionKind::Conflicting => Command::Activate(keys),
                    ActionKind::Cascade => Command::Deactivate(keys),
                }
            }
            "merge" => {
                if rest.is_empty() {
                    bail!("merge expects at least one component map file");
                }
                Command::Merge(rest.iter().map(PathBuf::from).collect())
            }
            other => bail!("unknown command: {other}"),
        };

        Ok(Self {
            manifest_path,
            state_path,
            command,
        })
    }
}

fn next_path(flag: &str, args: &mut env::ArgsOs) -> Result<PathBuf> {
    let value = args
        .next()
        .ok_or_else(|| anyhow!("{flag} requires a value"))?;
    let path = PathBuf::from(
        value
            .into_string()
            .map_err(|_| anyhow!("{flag} must be valid UTF-8"))?,
    );
    if path.as_os_str().is_empty() {
        bail!("{flag} must not be empty");
    }
    Ok(path)
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: plugin-deps [--manifest PATH] [--state PATH] <command> [args]\n\nCommands:\n  providers CAP        List components that provide CAP.\n  status [KEY...]      Report dependency status (all components when no keys).\n  activate KEY...      Activate KEYs, deactivating conflicting components.\n  deactivate KEY...    Deactivate KEYs and every component depending on them.\n  merge FILE...        Merge component map files and print the result.\n\nOptions:\n  --manifest PATH      Component manifest (or set PLUGIN_DEPS_MANIFEST).\n  --state PATH         Activation state file (or set PLUGIN_DEPS_STATE).\n  --help               Show this help text."
    );
    std::process::exit(code);
}
