//! Shop agent - runs the priced purchase chain once and prints the trace.
//!
//! Default tools server: http://127.0.0.1:9102/

use dotenv::dotenv;
use paid_tools_types::ToolRequest;
use std::sync::Arc;

use shop_agent::chain::EvmRpc;
use shop_agent::config::Config;
use shop_agent::orchestrator::{ChainRunner, StepDecision, ToolsEndpoint, default_steps};
use shop_agent::spend_registry::{EvmSpendLedger, SpendLogger};
use shop_agent::wallet::{EnvWalletProvider, WalletProvider, format_address};
use shop_agent::x402::{X402Client, X402Signer};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = Config::from_env()?;

    let wallet_provider = EnvWalletProvider::from_env(config.chain.chain_id)?;
    let address = wallet_provider.get_address();
    log::info!(
        "Agent wallet {} ({} mode)",
        format_address(address),
        wallet_provider.mode_name()
    );

    let rpc = Arc::new(EvmRpc::new(config.chain.clone())?);
    match rpc.get_balance(address).await {
        Ok(balance) => log::info!("[Chain] Balance: {} wei", balance),
        Err(e) => log::warn!("[Chain] Could not read balance: {}", e),
    }

    let wallet = wallet_provider.get_wallet().await?;
    let mut client = X402Client::new(X402Signer::from_wallet(wallet.clone()), config.chain.network_id());

    match &config.spend_registry {
        Some(registry) => {
            log::info!(
                "[SpendRegistry] Logging spends to {:?} on {}",
                registry.contract_address,
                config.chain.name
            );
            let ledger = Arc::new(EvmSpendLedger::new(
                rpc.clone(),
                wallet,
                registry.contract_address,
                registry.gas_limit,
            ));
            client = client.with_spend_logger(Arc::new(SpendLogger::new(ledger)));
        }
        None => log::info!("[SpendRegistry] Contract not configured, spend logging disabled"),
    }

    let endpoint = ToolsEndpoint::new(
        Arc::new(client),
        config.tools_base_url.clone(),
        ToolRequest {
            item_count: config.cart_item_count,
            cart_subtotal: config.cart_subtotal,
        },
    );
    let runner = ChainRunner::new(default_steps(), config.budget, config.eligibility_policy());

    let run = runner.run(&endpoint).await;

    for step in &run.steps {
        if let Some(tx) = step.receipt.as_ref().and_then(|r| r.spend_tx) {
            log::info!("[SpendRegistry] {}: {}", step.step_id, config.chain.tx_url(&format!("{:?}", tx)));
        }
    }

    let trace = serde_json::to_string_pretty(&run).map_err(|e| format!("Failed to serialize trace: {}", e))?;
    println!("{}", trace);

    log::info!(
        "Order {:?}: {} paid, {} skipped, {} failed",
        run.outcome(),
        run.count(StepDecision::Paid),
        run.count(StepDecision::Skipped),
        run.count(StepDecision::Error)
    );

    Ok(())
}
