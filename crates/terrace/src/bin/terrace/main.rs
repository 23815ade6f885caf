mod cli;

use anyhow::Context;
use serde::Serialize;
use terrace::addrs::{self, UniqueKeyer};
use terrace::diagnostics::{Diagnostics, SourceRange};
use terrace::instances::{config_tree::ConfigTree, Expander};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TERRACE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Ref(ref_cli) => reference(ref_cli, &cli.output),
        cli::Command::Provider(provider_cli) => provider(provider_cli, &cli.output),
        cli::Command::ModuleSource(source_cli) => module_source(source_cli, &cli.output),
        cli::Command::Expand(expand_cli) => expand(expand_cli, &cli.output),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

fn output(output: &cli::OutputArgs, value: &impl Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}

fn diagnostics_error(diags: Diagnostics) -> anyhow::Error {
    match diags.err() {
        Some(err) => err.into(),
        None => anyhow::anyhow!("failed without reporting an error"),
    }
}

#[derive(Serialize)]
struct RefReport {
    kind: &'static str,
    subject: String,
    unique_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    remaining: String,
    source_range: SourceRange,
}

pub fn reference(cli: cli::RefCommand, out: &cli::OutputArgs) -> anyhow::Result<()> {
    let parsed = if cli.testing {
        addrs::parse_ref_str_from_testing_scope(&cli.traversal)
    } else {
        addrs::parse_ref_str(&cli.traversal)
    };
    let reference = parsed
        .map_err(diagnostics_error)
        .with_context(|| format!("Invalid reference {:?}", cli.traversal))?;

    output(
        out,
        &RefReport {
            kind: reference.subject.kind(),
            subject: reference.subject.to_string(),
            unique_key: reference.subject.unique_key().to_string(),
            remaining: reference.remaining.to_string(),
            source_range: reference.source_range,
        },
    )
}

#[derive(Serialize)]
struct ProviderReport {
    address: String,
    module: String,
    hostname: String,
    namespace: String,
    type_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    legacy_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inherits_from: Option<String>,
}

pub fn provider(cli: cli::ProviderCommand, out: &cli::OutputArgs) -> anyhow::Result<()> {
    let parsed = if cli.legacy {
        addrs::parse_legacy_abs_provider_instance_str(&cli.address).map(|p| (p, None))
    } else if cli.keyed {
        terrace::traversal::parse_traversal_abs(&cli.address, "")
            .and_then(|traversal| addrs::parse_keyed_abs_provider_instance(&traversal))
            .map(|(p, key)| (p, Some(key)))
    } else {
        addrs::parse_abs_provider_instance_str(&cli.address).map(|p| (p, None))
    };
    let (config, key) = parsed
        .map_err(diagnostics_error)
        .with_context(|| format!("Invalid provider address {:?}", cli.address))?;

    let legacy_address = (config.provider.is_legacy() || config.provider.is_builtin())
        .then(|| config.legacy_string());

    output(
        out,
        &ProviderReport {
            address: config.to_string(),
            module: config.module.to_string(),
            hostname: config.provider.hostname.clone(),
            namespace: config.provider.namespace.clone(),
            type_name: config.provider.type_name.clone(),
            alias: config.alias.clone(),
            instance: key.map(|key| config.instance_string(&key)),
            legacy_address,
            inherits_from: config.inherited().map(|parent| parent.to_string()),
        },
    )
}

#[derive(Serialize)]
struct ModuleSourceReport {
    resolved: String,
    display: String,
    local: bool,
}

pub fn module_source(cli: cli::ModuleSourceCommand, out: &cli::OutputArgs) -> anyhow::Result<()> {
    let base = addrs::parse_module_source(&cli.base).context("Invalid base module source")?;
    let relative =
        addrs::parse_module_source(&cli.relative).context("Invalid relative module source")?;
    let resolved = addrs::resolve_relative_module_source(&base, &relative)?;

    output(
        out,
        &ModuleSourceReport {
            resolved: resolved.to_string(),
            display: resolved.for_display(),
            local: resolved.is_local(),
        },
    )
}

#[derive(Serialize)]
struct ExpandReport {
    modules: Vec<String>,
    resources: Vec<String>,
    #[serde(skip_serializing_if = "Diagnostics::is_empty")]
    diagnostics: Diagnostics,
}

pub fn expand(cli: cli::ExpandCommand, out: &cli::OutputArgs) -> anyhow::Result<()> {
    let tree = ConfigTree::load_file(&cli.file)
        .with_context(|| format!("Failed to load {}", cli.file.display()))?;

    let expander = Expander::new();
    let diagnostics = tree.register(&expander);
    if diagnostics.has_errors() {
        tracing::warn!(count = diagnostics.len(), "some objects could not be expanded");
    }

    let instances = tree.instances(&expander);
    output(
        out,
        &ExpandReport {
            modules: instances.modules.iter().map(ToString::to_string).collect(),
            resources: instances.resources.iter().map(ToString::to_string).collect(),
            diagnostics,
        },
    )
}
