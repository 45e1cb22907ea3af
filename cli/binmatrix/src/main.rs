//! binmatrix CLI: build, package and resolve prebuilt native libraries.

mod commands;
mod manifest;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use manifest::{load_project, BinmatrixManifest, Project};

#[derive(Parser)]
#[command(name = "binmatrix", version, about = "Cross-platform prebuilt library pipeline")]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a binmatrix.toml for an app in the current directory
    Init {
        /// App name used in artifact file names
        name: String,
    },
    /// Build and package one triple, or the whole matrix
    Build {
        /// Target triple (all matrix triples if omitted)
        #[arg(long)]
        target: Option<String>,
        /// Build with the release profile
        #[arg(long)]
        release: bool,
        /// Print the plan without running anything
        #[arg(long)]
        dry_run: bool,
        /// Print the plan or report as JSON
        #[arg(long)]
        json: bool,
        /// Extra flags passed to the compiler driver
        #[arg(last = true)]
        flags: Vec<String>,
    },
    /// Package an already built artifact
    Package {
        /// Target triple the artifact was built for
        #[arg(long)]
        target: String,
        /// Artifact kind (dynamic_lib, static_lib, header, executable)
        #[arg(long)]
        kind: String,
        /// Raw artifact path (defaults to the build output path)
        #[arg(long)]
        raw: Option<PathBuf>,
        #[arg(long)]
        release: bool,
    },
    /// Print the artifact path for a host
    Resolve {
        /// Host descriptor (defaults to the running host)
        #[arg(long)]
        descriptor: Option<String>,
        /// Artifact kind
        #[arg(long, default_value = "dynamic_lib")]
        kind: String,
        #[arg(long)]
        release: bool,
        /// Fail unless the resolved file exists
        #[arg(long)]
        check: bool,
    },
    /// Verify and unpack a packaged artifact into the resolver layout
    Install {
        #[arg(long)]
        target: String,
        #[arg(long)]
        kind: String,
        #[arg(long)]
        release: bool,
    },
    /// Inspect the target matrix
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },
    /// Check toolchains and project status
    Doctor,
    /// Remove build output
    Clean {
        /// Also remove packaged artifacts
        #[arg(long)]
        artifacts: bool,
    },
}

#[derive(Subcommand)]
enum TargetAction {
    /// List matrix triples with their platform names
    List,
    /// Show the build configuration of one triple
    Describe {
        /// Triple or canonical platform name
        name: String,
        #[arg(long)]
        release: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&cwd, &name),

        Commands::Build {
            target,
            release,
            dry_run,
            json,
            flags,
        } => {
            let project = load_project(&cwd)?;
            let options = commands::build::BuildOptions {
                target,
                release,
                dry_run,
                json,
                extra_flags: flags,
            };
            commands::build::run(&project, &options)
        }

        Commands::Package {
            target,
            kind,
            raw,
            release,
        } => {
            let project = load_project(&cwd)?;
            commands::package::run(&project, &target, &kind, raw.as_deref(), release)
        }

        Commands::Resolve {
            descriptor,
            kind,
            release,
            check,
        } => {
            let project = load_project(&cwd)?;
            commands::resolve::run(&project, descriptor.as_deref(), &kind, release, check)
        }

        Commands::Install {
            target,
            kind,
            release,
        } => {
            let project = load_project(&cwd)?;
            commands::install::run(&project, &target, &kind, release)
        }

        Commands::Target { action } => {
            let project = optional_project(&cwd)?;
            let matrix = commands::target::matrix_for(project.as_ref())?;
            match action {
                TargetAction::List => commands::target::list(&matrix),
                TargetAction::Describe { name, release } => {
                    commands::target::describe(&matrix, &name, release)
                }
            }
        }

        Commands::Doctor => commands::doctor::run(&cwd),

        Commands::Clean { artifacts } => {
            let project = load_project(&cwd)?;
            commands::clean::run(&project, artifacts)
        }
    }
}

fn optional_project(cwd: &std::path::Path) -> anyhow::Result<Option<Project>> {
    Ok(BinmatrixManifest::find_and_load(cwd)?.map(|(manifest, dir)| Project::new(manifest, dir)))
}
