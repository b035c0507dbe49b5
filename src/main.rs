use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use extensions_catalog::config::{Config, Overrides, RegistryConfig};
use extensions_catalog::{ExtensionsCatalog, FilesystemRegistry};

/// Browse the Podman Desktop extensions catalog
#[derive(Parser, Debug)]
#[command(name = "extensions-catalog")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Catalog URL (overrides extensions.registry_url)
    #[arg(long, value_name = "URL", global = true)]
    registry_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog extensions
    List {
        /// Include unlisted extensions
        #[arg(long)]
        all: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List installable extensions and their OCI references
    Fetchable {
        /// Only link versions compatible with this Podman Desktop version
        #[arg(long, value_name = "VERSION")]
        host_version: Option<semver::Version>,

        /// Print JSON instead of plain lines
        #[arg(long)]
        json: bool,
    },

    /// Serve a catalog file over HTTP
    Serve {
        /// Catalog JSON file
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,

        /// Bind address
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Port number
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut overrides = Overrides {
        registry_url: args.registry_url,
        timeout_ms: args.timeout_ms,
        ..Default::default()
    };
    if let Command::Serve { catalog, bind, port } = &args.command {
        overrides.catalog_path = catalog.clone();
        overrides.bind = bind.clone();
        overrides.port = *port;
    }

    let config = Config::load(args.config.as_ref(), &overrides)?;

    match args.command {
        Command::List { all, json } => {
            let catalog = ExtensionsCatalog::from_config(&config);
            let extensions: Vec<_> = catalog
                .fetch_extensions()
                .await?
                .into_iter()
                .filter(|e| all || !e.unlisted)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&extensions)?);
            } else {
                for ext in &extensions {
                    let latest = ext
                        .latest_version()
                        .map(|v| v.version.as_str())
                        .unwrap_or("-");
                    let marker = if ext.unlisted { " (unlisted)" } else { "" };
                    println!("{:<40} {:<12} {}{}", ext.id, latest, ext.display_name, marker);
                }
            }
        }

        Command::Fetchable { host_version, json } => {
            let catalog = ExtensionsCatalog::from_config(&config);
            let fetchable = catalog
                .fetch_fetchable_extensions(host_version.as_ref())
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&fetchable)?);
            } else {
                for ext in &fetchable {
                    println!("{} {}", ext.extension_id, ext.link);
                }
            }
        }

        Command::Serve { .. } => {
            let registry: Arc<dyn extensions_catalog::Registry> = match &config.registry {
                RegistryConfig::Filesystem { path } => {
                    info!("Serving catalog file: {}", path.display());
                    Arc::new(FilesystemRegistry::new(path.clone()))
                }
            };
            extensions_catalog::api::run(config, registry).await?;
        }
    }

    Ok(())
}
