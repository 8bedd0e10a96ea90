use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Global shared HTTP client singleton.
///
/// Every paid tool call goes through this pool. `Client::clone()` is just an
/// `Arc` increment.
static SHARED_CLIENT: Lazy<Client> = Lazy::new(|| {
    build_client(Duration::from_secs(120)).unwrap_or_else(|e| {
        log::warn!("Falling back to default HTTP client: {}", e);
        Client::new()
    })
});

/// Returns a reference to the global shared HTTP client.
pub fn shared_client() -> &'static Client {
    &SHARED_CLIENT
}

/// Build a client with the shared pool settings and a custom timeout.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .pool_max_idle_per_host(5)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(timeout)
        .build()
}
