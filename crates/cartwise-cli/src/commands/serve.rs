//! Server command implementation

use std::time::Duration;

use anyhow::Result;
use cartwise_core::SubstitutionEngine;
use cartwise_server::ServerConfig;

pub async fn cmd_serve(
    engine: SubstitutionEngine,
    host: &str,
    port: u16,
    timeout_secs: u64,
) -> Result<()> {
    println!("🚀 Starting Cartwise web server...");
    println!("   Catalog: {} products", engine.catalog().len());
    println!("   Listening: http://{}:{}", host, port);
    println!("   Request timeout: {}s", timeout_secs);

    // Parse allowed CORS origins from environment (comma-separated)
    let allowed_origins = parse_origins(&std::env::var("CARTWISE_ALLOWED_ORIGINS").unwrap_or_default());
    if allowed_origins.is_empty() {
        println!("   CORS: any origin");
    } else {
        println!("   CORS: {}", allowed_origins.join(", "));
    }
    println!();

    let config = ServerConfig {
        allowed_origins,
        request_timeout: Duration::from_secs(timeout_secs),
    };

    cartwise_server::serve(engine, host, port, config).await
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
