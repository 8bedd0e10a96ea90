//! Paid Tools Service - standalone binary that prices each purchase step and
//! answers 402 until a valid x402 payment is attached.
//!
//! Default: http://127.0.0.1:9102/

use paid_tools_service::{ServiceConfig, build_state, router};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(build_state(&config));
    log::info!(
        "[PaidTools] {} tools, paying to {:?} on {}",
        state.catalog.len(),
        config.pay_to,
        state.verifier.network()
    );

    let app = router(state);

    let addr = format!("127.0.0.1:{}", config.port);
    log::info!("Paid Tools Service listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("Server error: {}", e);
    }
}
