mod cli;
mod config;

use anyhow::{anyhow, Result};
use clap::Parser;
use cli::{BuildArgs, Cli, Commands, ConfigAction, InstallArgs};
use config::{anchor, Settings};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tailwind_build::log::{TaskLog, TracingLog};
use tailwind_build::tasks::{BuildTailwindCss, EnsureTailwindCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir()?,
    };
    let settings = Settings::load(&project_dir)?;

    match cli.command {
        Commands::Version => {
            println!("tailwind-build v{}", env!("CARGO_PKG_VERSION"));
        }

        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                let settings = settings.resolve_paths(&project_dir);
                let output = match format.as_str() {
                    "json" => serde_json::to_string_pretty(&settings)?,
                    "yaml" => serde_yaml::to_string(&settings)?,
                    other => {
                        return Err(anyhow!("Unsupported format '{}'. Use json or yaml.", other))
                    }
                };
                println!("{}", output);
            }
        },

        Commands::Ensure(install) => {
            let settings = apply_install_args(settings, &install).resolve_paths(&project_dir);
            let log = TracingLog::new();
            match ensure_cli(&settings, &log).await {
                Some(path) => println!("{}", path.display()),
                None => std::process::exit(1),
            }
        }

        Commands::Build(args) => {
            let settings = apply_build_args(settings, &args).resolve_paths(&project_dir);
            let log = TracingLog::new();

            let cli_path = match &args.cli {
                Some(path) => anchor(&project_dir, path),
                None => match ensure_cli(&settings, &log).await {
                    Some(path) => path,
                    None => std::process::exit(1),
                },
            };

            let mut task = BuildTailwindCss::new(cli_path, &project_dir, &settings.output_file);
            task.config_dir = settings.config_dir.clone();
            task.input_file = settings.input_file.clone();
            task.minify = settings.minify;
            task.watch = args.watch;
            task.lock_file = settings.lock_file.clone();
            task.process_timeout = settings.process_timeout_secs.map(Duration::from_secs);

            if !task.execute(&log).await {
                tracing::error!("TailwindCSS build failed.");
                std::process::exit(1);
            }
            if let Some(css) = &task.generated_css_file {
                println!("{}", css.display());
            }
        }
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

async fn ensure_cli(settings: &Settings, log: &dyn TaskLog) -> Option<PathBuf> {
    let mut task = EnsureTailwindCli::new(&settings.version, &settings.install_path);
    task.api_base = settings.api_base.clone();
    task.http_timeout = Duration::from_secs(settings.http_timeout_secs);

    if task.execute(log).await {
        task.standalone_cli_path
    } else {
        None
    }
}

fn apply_install_args(mut settings: Settings, args: &InstallArgs) -> Settings {
    if let Some(tag) = &args.tag {
        settings.version = tag.clone();
    }
    if let Some(path) = &args.install_path {
        settings.install_path = path.clone();
    }
    settings
}

fn apply_build_args(settings: Settings, args: &BuildArgs) -> Settings {
    let mut settings = apply_install_args(settings, &args.install);
    if let Some(dir) = &args.config_dir {
        settings.config_dir = dir.clone();
    }
    if let Some(input) = &args.input {
        settings.input_file = input.clone();
    }
    if let Some(output) = &args.output {
        settings.output_file = output.clone();
    }
    if args.minify {
        settings.minify = true;
    }
    if args.no_lock {
        settings.lock_file = None;
    } else if let Some(lock_file) = &args.lock_file {
        settings.lock_file = Some(lock_file.clone());
    }
    settings
}
