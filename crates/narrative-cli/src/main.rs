use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use narrative_core::config::NarrativeConfig;
use narrative_core::model::share::ShareRequestParams;
use narrative_core::sharing::NarrativeEngine;
use narrative_core::storage::memory::InMemoryShareRequestStore;

#[derive(Parser)]
#[command(name = "narrative", about = "Request access to narratives shared through workspaces")]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ServiceArgs {
    /// Token used to post notifications to the feeds service
    #[arg(long, env = "NARRATIVE_SERVICE_TOKEN", hide_env_values = true)]
    service_token: Option<String>,

    /// Token used to read workspace permissions
    #[arg(long, env = "NARRATIVE_WS_ADMIN_TOKEN", hide_env_values = true)]
    ws_admin_token: Option<String>,

    /// Workspace service JSON-RPC endpoint
    #[arg(long, env = "NARRATIVE_WORKSPACE_URL")]
    workspace_url: Option<String>,

    /// Feeds service base URL
    #[arg(long, env = "NARRATIVE_FEEDS_URL")]
    feeds_url: Option<String>,

    /// Timeout for each call to the workspace or feeds service
    #[arg(
        long,
        default_value = "30",
        env = "NARRATIVE_TIMEOUT",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_seconds: u64,

    /// Reject repeats of a request already made by this process
    #[arg(long, env = "NARRATIVE_DEDUP")]
    dedup: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API
    Serve {
        #[arg(long, default_value = "8080", env = "NARRATIVE_REST_PORT")]
        port: u16,

        /// Browser origin allowed to call the API (repeatable, `*` for any)
        #[arg(long = "cors-origin", env = "NARRATIVE_CORS_ORIGINS", value_delimiter = ',')]
        cors_origins: Vec<String>,
    },
    /// Send a single share request and print the result
    Request {
        #[arg(long)]
        ws_id: i64,

        /// User asking for access
        #[arg(long)]
        user: String,

        /// a (administer), w (write) or r (read)
        #[arg(long)]
        share_level: String,
    },
}

impl ServiceArgs {
    fn into_config(self) -> NarrativeConfig {
        NarrativeConfig {
            service_token: self.service_token,
            ws_admin_token: self.ws_admin_token,
            workspace_url: self.workspace_url,
            feeds_url: self.feeds_url,
            request_timeout: Duration::from_secs(self.timeout_seconds),
            ..NarrativeConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("narrative=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let dedup = cli.service.dedup;
    let config = cli.service.into_config();
    tracing::debug!(?config, "configuration loaded");

    let mut engine = NarrativeEngine::from_config(config);
    if dedup {
        engine = engine.with_share_store(Arc::new(InMemoryShareRequestStore::new(10_000)));
        tracing::info!("Duplicate share request detection enabled");
    }
    let engine = Arc::new(engine);

    match cli.command {
        Command::Serve { port, cors_origins } => serve(engine, port, &cors_origins).await?,
        Command::Request {
            ws_id,
            user,
            share_level,
        } => {
            let result = engine
                .request_share(ShareRequestParams::new(ws_id, user, share_level))
                .await?;
            println!("{}", serde_json::to_string(&result)?);
            if !result.is_ok() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn serve(
    engine: Arc<NarrativeEngine>,
    port: u16,
    cors_origins: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let app = narrative_rest::router(engine, cors_origins);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("REST API listening on 0.0.0.0:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {e}");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    Ok(())
}
