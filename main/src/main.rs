use api_router::{api_routes, api_state::ApiState};
use axum::Router;
use common::{context::RagContext, utils::config::get_config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let ctx = RagContext::from_config(&config).await?;
    let api_state = ApiState::new(&config, ctx)?;
    let app = build_app(api_state);

    let serve_address = format!("0.0.0.0:{}", config.http_port);
    info!(address = %serve_address, "Starting server");
    let listener = tokio::net::TcpListener::bind(&serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_app(api_state: ApiState) -> Router {
    Router::new()
        .merge(api_routes(&api_state))
        .with_state(api_state)
}
