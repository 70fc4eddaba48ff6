use anyhow::Result;
use clap::Parser;
use plantguard::app::App;
use plantguard::models::Config;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "plantguard")]
#[command(about = "Identify plants from photos and report their safety")]
struct CliArgs {
    /// Address to listen on (overrides BIND_ADDR).
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Maximum accepted request body in bytes (overrides MAX_BODY_BYTES).
    #[arg(long, value_name = "BYTES")]
    max_body_bytes: Option<usize>,

    /// Gemini model ID (overrides GEMINI_MODEL).
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plantguard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting plantguard");

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(max_body_bytes) = args.max_body_bytes {
        config.max_body_bytes = max_body_bytes;
    }
    if let Some(model) = args.model {
        config.gemini_model = model;
    }

    if let Err(e) = App::new(config).run().await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
