//! terrace cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; terrace ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[clap(flatten)]
    pub output: OutputArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a reference such as `aws_instance.web[0].id`
    Ref(RefCommand),

    /// Parse an absolute provider configuration address
    Provider(ProviderCommand),

    /// Resolve a module source relative to the source of the calling module
    ModuleSource(ModuleSourceCommand),

    /// List every module and resource instance declared in a file
    Expand(ExpandCommand),
}

#[derive(Parser, Debug)]
pub struct RefCommand {
    /// The traversal to parse
    pub traversal: String,

    /// Also accept references that are only valid in test files
    #[clap(long)]
    pub testing: bool,
}

#[derive(Parser, Debug)]
pub struct ProviderCommand {
    /// e.g. `module.a.provider["registry.opentofu.org/hashicorp/aws"].east`
    pub address: String,

    /// Parse the `provider.<type>[.<alias>]` form of old state files
    #[clap(long, conflicts_with("keyed"))]
    pub legacy: bool,

    /// Accept a trailing instance key
    #[clap(long)]
    pub keyed: bool,
}

#[derive(Parser, Debug)]
pub struct ModuleSourceCommand {
    /// Source of the calling module
    pub base: String,

    /// Source given in the module block
    pub relative: String,
}

#[derive(Parser, Debug)]
pub struct ExpandCommand {
    /// HCL file with `module` and `resource` blocks
    #[clap(short = 'f', long = "file")]
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t, global(true))]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
