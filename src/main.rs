use shortener::config;
use shortener::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;
    server::init_tracing(&config.log_level, &config.log_format);
    config.print_summary();

    server::run(config).await
}
