use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tailwind-build")]
#[command(about = "Provision the Tailwind CSS standalone CLI and run it as a build step")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project directory; relative paths resolve against it (default: current directory)
    #[arg(short = 'C', long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Make sure the Tailwind CLI is installed and print its path
    #[command(after_help = concat!(
        "Examples:\n",
        "  tailwind-build ensure\n",
        "  tailwind-build ensure --tag v4.1.18 --install-path .tailwind"
    ))]
    Ensure(InstallArgs),

    /// Build the output stylesheet, or start a watcher with --watch
    Build(BuildArgs),

    /// Inspect the resolved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show the current version
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Tailwind release tag ('latest' for the newest; '3.4.1' is fetched as 'v3.4.1')
    #[arg(long)]
    pub tag: Option<String>,

    /// Root directory for installed CLI binaries
    #[arg(long)]
    pub install_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub install: InstallArgs,

    /// Use this Tailwind CLI executable instead of installing one
    #[arg(long)]
    pub cli: Option<PathBuf>,

    /// Directory the CLI runs in and the input file lives in
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Input stylesheet name, relative to the config directory
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output stylesheet path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Minify the generated CSS
    #[arg(short, long)]
    pub minify: bool,

    /// Start the CLI in watch mode in the background
    #[arg(short, long)]
    pub watch: bool,

    /// Lock file used to avoid duplicate watchers
    #[arg(long, conflicts_with = "no_lock")]
    pub lock_file: Option<PathBuf>,

    /// Do not coordinate watchers through a lock file
    #[arg(long)]
    pub no_lock: bool,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show full configuration
    Show {
        /// Output format (json, yaml)
        #[arg(long, default_value = "json")]
        format: String,
    },
}
