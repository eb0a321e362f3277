//!
//! schooladmin mock data store binary
//! ----------------------------------
//! Starts the json-server style REST API with the demo data set. The port
//! comes from `--port`, then `SCHOOLADMIN_MOCK_PORT`, then 3000.

use anyhow::Result;
use std::env;

use schooladmin::config::{has_flag, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    println!(r"          __                __          __          _     
   ______/ /_  ____  ____  / /___ _____/ /___ ___  (_)___ 
  / ___/ __ \/ __ \/ __ \/ / __ `/ __  / __ `__ \/ / __ \
 (__  ) / / / /_/ / /_/ / / /_/ / /_/ / / / / / / / / / /
/____/_/ /_/\____/\____/_/\__,_/\__,_/_/ /_/ /_/_/_/ /_/ ");

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("schooladmin mock data store\n\nUSAGE:\n  schooladmin_server [--port N]\n\nOPTIONS:\n  --port N    HTTP port (env: SCHOOLADMIN_MOCK_PORT, default 3000)\n\nCollections: users, students, teachers, classes, attendance, fees, profiles\n");
        return Ok(());
    }

    let cfg = AppConfig::from_env_and_args(&args);
    println!("schooladmin mock data store starting on port {}", cfg.mock_port);
    tracing::info!("Using port: http={}", cfg.mock_port);
    schooladmin::server::run_with_port(cfg.mock_port).await
}
