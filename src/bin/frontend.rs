use chess_insight::{
    app, clients::api::ApiClient, config::ApiConfig, hooks::health::use_health,
    pages::home::render_home,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ApiConfig::from_env();
    tracing::info!(base_url = %config.base_url, "Using backend");

    let api = ApiClient::new(config)?;
    let queries = app::query_client();

    let mut health = use_health(&queries, &api);
    let mut state = health.state();
    print!("{}", render_home(&state));
    while state.is_loading() {
        state = health.changed().await;
        print!("{}", render_home(&state));
    }

    if std::env::args().nth(1).as_deref() == Some("stockfish") {
        let response = api.test_stockfish().await?;
        println!("Stockfish: {}", response.result);
    }

    Ok(())
}
