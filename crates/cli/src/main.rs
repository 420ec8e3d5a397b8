use std::sync::Arc;

use anyhow::Context;
use bookshelf_app::{modules, store::MemoryBookStore};
use bookshelf_kernel::{settings::Settings, ModuleRegistry};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf-cli", version, about = "Bookshelf command-line entrypoint")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Override `server.host`
        #[arg(long)]
        host: Option<String>,
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the merged OpenAPI document to stdout
    Openapi,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port } => {
            let mut settings =
                Settings::load().with_context(|| "failed to load bookshelf settings")?;
            bookshelf_telemetry::init(&settings.telemetry)?;

            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }

            tracing::info!(env = ?settings.environment, "bookshelf-cli serve");
            bookshelf_app::run(settings).await
        }
        Command::Openapi => {
            // Documentation only; the store is never queried
            let mut registry = ModuleRegistry::new();
            modules::register_all(&mut registry, Arc::new(MemoryBookStore::new()));

            let document = bookshelf_http::router::openapi_document(&registry);
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
    }
}
