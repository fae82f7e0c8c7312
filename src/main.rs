// src/main.rs

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use onboard::config::CONFIG;
use onboard::identity::HmacTokenVerifier;
use onboard::llm::OpenAiBackend;

#[derive(Parser, Debug)]
#[command(name = "onboard", about = "Employee onboarding chat assistant backend")]
struct Cli {
    /// Override the configured bind port
    #[arg(long)]
    port: Option<u16>,

    /// Override the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(CONFIG.log_level.clone())),
        )
        .init();

    info!("Starting onboarding assistant backend");
    info!("Model: {} via {}", CONFIG.llm_model, CONFIG.llm_base_url);

    let database_url = cli
        .database_url
        .as_deref()
        .unwrap_or(&CONFIG.database_url);
    let pool = onboard::db::create_pool(database_url, CONFIG.sqlite_max_connections).await?;
    onboard::db::init_schema(&pool).await?;

    let backend = Arc::new(OpenAiBackend::new(
        &CONFIG.llm_base_url,
        &CONFIG.llm_api_key,
        &CONFIG.llm_model,
        CONFIG.llm_max_tokens,
    ));
    let verifier = Arc::new(HmacTokenVerifier::new(&CONFIG.token_secret));
    let state = Arc::new(onboard::state::build_app_state(
        pool, backend, verifier, &CONFIG,
    ));

    let app = onboard::api::http::api_router(state);

    let port = cli.port.unwrap_or(CONFIG.port);
    let bind_address = format!("{}:{}", CONFIG.host, port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
