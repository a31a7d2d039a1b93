mod bundler;
mod env;
mod error;
mod groups;
mod lock;
mod output;
mod pip;
mod platform_tags;
mod prelude;
mod project;
#[cfg(test)]
mod test_util;
mod util;
mod vocab;

use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};

use crate::bundler::{BundleOptions, BundlerManager, ConsoleReporter, VenvBundler};
use crate::env::Backend;
use crate::groups::GroupArgs;
use crate::output::OutputArgs;
use crate::pip::PipBackend;
use crate::prelude::*;
use crate::project::Project;

/// Bundle a poetry project and its locked dependencies into a self-contained
/// environment.
#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    output_args: OutputArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bundle the project into a virtual environment
    Venv(VenvArgs),
    /// Print the compatibility tags a bundle for some platform accepts, most
    /// preferred first
    Tags(TagsArgs),
}

#[derive(Args)]
struct VenvArgs {
    /// The path to the virtual environment to bundle into
    path: PathBuf,
    /// The project directory
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    directory: PathBuf,
    /// The Python executable to use to create the virtual environment
    #[arg(short, long, value_name = "PYTHON")]
    python: Option<PathBuf>,
    /// Clear the existing virtual environment if it exists
    #[arg(long)]
    clear: bool,
    /// Compile Python source files to bytecode
    #[arg(long)]
    compile: bool,
    /// Only use wheels compatible with this platform tag, e.g. manylinux_2_28_x86_64
    #[arg(long, value_name = "TAG")]
    platform: Option<String>,
    #[command(flatten)]
    groups: GroupArgs,
}

#[derive(Args)]
struct TagsArgs {
    /// A platform tag like manylinux2014_x86_64 or macosx_11_0_arm64
    #[arg(long, value_name = "TAG")]
    platform: String,
    /// The target interpreter's version, e.g. 3.12
    #[arg(long, value_name = "X.Y", default_value = "3.12", value_parser = parse_python_version)]
    python_version: (u32, u32, u32),
    /// The target interpreter's implementation, e.g. cpython or pypy
    #[arg(long, value_name = "NAME", default_value = "cpython")]
    implementation: String,
}

fn parse_python_version(s: &str) -> Result<(u32, u32, u32), String> {
    let parts = s
        .split('.')
        .map(|part| part.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid version {s:?}: {err}"))?;
    match parts.as_slice() {
        [major, minor] => Ok((*major, *minor, 0)),
        [major, minor, patch] => Ok((*major, *minor, *patch)),
        _ => Err(format!("expected a version like 3.12, not {s:?}")),
    }
}

fn bundle_venv(output_args: &OutputArgs, args: VenvArgs) -> Result<bool> {
    let project = Project::load(&args.directory)?;
    let activated_groups = args.groups.activated_groups(&project)?;

    let backend: Rc<dyn Backend> = Rc::new(PipBackend::new(output_args.is_verbose()));
    let manager = BundlerManager::with_defaults(backend)?;
    let mut bundler = manager.bundler(VenvBundler::NAME)?;
    debug!("bundling with the {} bundler", bundler.name());
    bundler.configure(&BundleOptions {
        path: args.path,
        executable: args.python,
        clear: args.clear,
        activated_groups: Some(activated_groups),
        compile: args.compile,
        platform: args.platform,
    })?;

    let reporter = ConsoleReporter::new(output_args.is_verbose());
    bundler.bundle(&project, &reporter)
}

fn print_tags(args: TagsArgs) -> Result<bool> {
    let interpreter = Interpreter::new(&args.implementation, args.python_version);
    let tags = platform_tags::supported_tags(&args.platform, &interpreter)?;
    for tag in tags.tags() {
        println!("{tag}");
    }
    Ok(true)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    output::init(&cli.output_args)?;

    let succeeded = match cli.command {
        Command::Venv(args) => bundle_venv(&cli.output_args, args)?,
        Command::Tags(args) => print_tags(args)?,
    };
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
