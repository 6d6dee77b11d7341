// server/src/main.rs

use anyhow::Result;
use carebridge_server::cli::start_cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    start_cli().await
}
