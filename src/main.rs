//! portalctl — manage a group of containerized services behind one nginx
//! reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                    portalctl                      │
//!                    │                                                   │
//!   CLI invocation   │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!   ─────────────────┼─▶│ clap    │───▶│ commands │───▶│  services   │  │
//!                    │  │ parsing │    │ handlers │    │  registry   │  │
//!                    │  └─────────┘    └────┬─────┘    └──────┬──────┘  │
//!                    │                      │                 │         │
//!                    │                      ▼                 ▼         │
//!                    │  ┌──────────────────────┐    ┌──────────────┐    │
//!                    │  │ process (git/docker) │    │   routing    │    │
//!                    │  │ scaffold, build      │    │    table     │    │
//!                    │  └──────────────────────┘    └──────┬───────┘    │
//!                    │                                     │            │
//!                    │              ┌──────────┐     ┌─────▼──────┐     │
//!   docker-compose   │              │ document │◀────│   nginx    │     │
//!   ◀────────────────┼──────────────│  codec   │     │ generator  │     │
//!                    │              └──────────┘     └────────────┘     │
//!                    └──────────────────────────────────────────────────┘
//! ```
//!
//! The document is read once at startup (except for `create`) and written
//! once after a successful mutation; a failing command persists nothing.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portalctl::commands::add::{AddOptions, ServerType};
use portalctl::commands::create::CreateOptions;
use portalctl::commands::reload::ReloadOptions;
use portalctl::commands::update::UpdateOptions;
use portalctl::commands::{self, group_name, load_overlay, GlobalOpts};
use portalctl::document::{self, DOCUMENT_NAME};
use portalctl::process::docker;
use portalctl::services::ServiceRegistry;

#[derive(Parser)]
#[command(name = "portalctl")]
#[command(about = "Modify docker container definitions", long_about = None)]
struct Cli {
    /// Project/network group directory
    directory: PathBuf,

    /// Name of the reverse proxy docker
    #[arg(long)]
    reverse_proxy: Option<String>,

    /// Only update the document and files, do not update running dockers
    #[arg(long)]
    no_launch: bool,

    /// Less user interaction
    #[arg(short, long)]
    quiet: bool,

    /// Force overwriting existing docker directories
    #[arg(short, long)]
    overwrite: bool,

    /// Force continuation on existing docker directories
    #[arg(long)]
    no_overwrite: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a container
    Add {
        /// New docker name
        docker: String,
        /// Git repository
        git: String,
        /// Branch or tag from where to clone
        #[arg(long, default_value = "production")]
        branch: String,
        /// Path to connect to the server (repeatable)
        #[arg(long = "url-path")]
        url_path: Vec<String>,
        /// Port the docker uses internally
        #[arg(long, default_value_t = 1337)]
        port: u16,
        /// Yaml settings file for the service
        #[arg(long)]
        yaml: Option<PathBuf>,
        /// Server type to use
        #[arg(long, value_enum, default_value = "node")]
        server_type: ServerType,
        /// Node version to use
        #[arg(long = "node-version", default_value = "18")]
        node_version: String,
        /// Volume for the new docker container (repeatable)
        #[arg(short = 'v')]
        volumes: Vec<String>,
        /// Environment variable for the new docker container (repeatable)
        #[arg(short = 'e')]
        environment: Vec<String>,
        /// Environment variable during build (repeatable)
        #[arg(long = "build-env")]
        build_env: Vec<String>,
    },
    /// Create a network group
    Create {
        /// Git repository of the frontend
        git: String,
        /// New network name (subdirectory of the group directory)
        #[arg(long)]
        network: Option<String>,
        /// Port the proxy publishes on the host
        #[arg(short, long, default_value_t = 80)]
        port: u16,
        /// Branch or tag from where to clone
        #[arg(long)]
        branch: Option<String>,
        /// Yaml settings file for the proxy service
        #[arg(long)]
        yaml: Option<PathBuf>,
        /// Overwrite existing dockers
        #[arg(long)]
        overwrite: bool,
        /// Environment variable for the proxy container (repeatable)
        #[arg(short = 'e')]
        environment: Vec<String>,
        /// Environment variable during build (repeatable)
        #[arg(long = "build-env")]
        build_env: Vec<String>,
    },
    /// Remove a container
    Remove {
        /// Docker name
        docker: String,
        /// Also clean the reverse proxy routes
        #[arg(short, long)]
        clean: bool,
    },
    /// Update container code
    Update {
        /// Docker container names
        docker: Vec<String>,
        /// Git repository
        #[arg(long)]
        git: Option<String>,
        /// Branch or tag from where to clone; defaults to the checkout's
        /// current branch
        #[arg(long)]
        branch: Option<String>,
    },
    /// Reload settings
    Reload {
        /// Docker container name
        docker: String,
        /// Yaml settings file for the service
        #[arg(long)]
        yaml: Option<PathBuf>,
        /// Volume for the docker container (repeatable)
        #[arg(short = 'v')]
        volumes: Vec<String>,
        /// Environment variable for the docker container (repeatable)
        #[arg(short = 'e')]
        environment: Vec<String>,
        /// Force rebuilding of all dockers
        #[arg(short, long)]
        forced: bool,
    },
    /// Rebuild the nginx reverse proxy config
    RebuildPortal,
    /// Purge the full system
    Purge {
        /// Forcibly remove managed networks
        #[arg(short, long)]
        force: bool,
    },
    /// List all containers
    Ls,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portalctl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> portalctl::Result<()> {
    // `create --network` targets a subdirectory of the given directory
    let directory = match &cli.command {
        Commands::Create {
            network: Some(network),
            ..
        } => {
            let dir = cli.directory.join(network);
            std::fs::create_dir_all(&dir)?;
            dir
        }
        Commands::Create { .. } => {
            std::fs::create_dir_all(&cli.directory)?;
            cli.directory.clone()
        }
        _ => cli.directory.clone(),
    };

    let group = group_name(&directory)?;
    tracing::info!(group = %group, "Working on group");

    let proxy_name = cli
        .reverse_proxy
        .clone()
        .unwrap_or_else(|| format!("{group}.nginx"));
    let opts = GlobalOpts {
        directory: directory.clone(),
        proxy_name: proxy_name.clone(),
        quiet: cli.quiet,
        overwrite: cli.overwrite,
        no_overwrite: cli.no_overwrite,
    };
    let document_path = directory.join(DOCUMENT_NAME);

    // `affected` is the service list for the final compose-up; None skips the
    // launch entirely, an empty list rebuilds everything.
    let affected: Option<Vec<String>> = match cli.command {
        Commands::Create {
            git,
            port,
            branch,
            yaml,
            overwrite,
            environment,
            build_env,
            ..
        } => {
            let create = CreateOptions {
                git_url: git,
                branch,
                port,
                overlay: load_overlay(yaml.as_deref())?,
                overwrite,
                environment,
                build_environment: build_env,
            };
            let (registry, affected) = commands::create::run(&opts, &create)?;
            document::save(&document_path, &registry.to_document())?;
            Some(affected)
        }
        Commands::Add {
            docker,
            git,
            branch,
            url_path,
            port,
            yaml,
            server_type,
            node_version,
            volumes,
            environment,
            build_env,
        } => {
            let mut registry = load_registry(&document_path, &proxy_name)?;
            let url_paths = if url_path.is_empty() {
                vec![format!("/api/{docker}")]
            } else {
                url_path
            };
            let add = AddOptions {
                name: docker,
                git_url: git,
                branch: Some(branch),
                url_paths,
                port,
                overlay: load_overlay(yaml.as_deref())?,
                server_type,
                node_version,
                volumes,
                environment,
                build_environment: build_env,
            };
            let affected = commands::add::run(&mut registry, &opts, &add)?;
            document::save(&document_path, &registry.to_document())?;
            Some(affected)
        }
        Commands::Remove { docker, clean } => {
            let mut registry = load_registry(&document_path, &proxy_name)?;
            let affected = commands::remove::run(&mut registry, &opts, &docker, clean)?;
            document::save(&document_path, &registry.to_document())?;
            Some(affected)
        }
        Commands::Update {
            docker,
            git,
            branch,
        } => {
            let registry = load_registry(&document_path, &proxy_name)?;
            let update = UpdateOptions {
                names: docker,
                git_url: git,
                branch,
            };
            let affected = commands::update::run(&registry, &opts, &update)?;
            if affected.is_empty() {
                None
            } else {
                document::save(&document_path, &registry.to_document())?;
                Some(affected)
            }
        }
        Commands::Reload {
            docker,
            yaml,
            volumes,
            environment,
            forced,
        } => {
            let mut registry = load_registry(&document_path, &proxy_name)?;
            let reload = ReloadOptions {
                name: docker,
                overlay: load_overlay(yaml.as_deref())?,
                volumes,
                environment,
                forced,
            };
            let affected = commands::reload::run(&mut registry, &opts, &reload)?;
            document::save(&document_path, &registry.to_document())?;
            Some(affected)
        }
        Commands::RebuildPortal => {
            let registry = load_registry(&document_path, &proxy_name)?;
            Some(commands::rebuild::run(&registry, &opts)?)
        }
        Commands::Purge { force } => {
            let registry = load_registry(&document_path, &proxy_name)?;
            commands::purge::run(&registry, &opts, force)?;
            None
        }
        Commands::Ls => {
            let registry = load_registry(&document_path, &proxy_name)?;
            commands::list::run(&registry, &opts)?;
            None
        }
    };

    if let Some(services) = affected {
        if cli.no_launch {
            tracing::info!("Skipping container launch (--no-launch)");
        } else {
            tracing::info!("Docker containers updating");
            docker::compose_up(&services, &directory)?;
        }
    }
    Ok(())
}

fn load_registry(
    document_path: &std::path::Path,
    proxy_name: &str,
) -> portalctl::Result<ServiceRegistry> {
    let doc = document::load(document_path)?;
    ServiceRegistry::from_document(doc, Some(proxy_name))
}
