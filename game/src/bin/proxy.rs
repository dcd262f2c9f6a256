use std::env;

use darkside::proxy::{AppState, ProxyConfig, router};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ProxyConfig::from_env_with(|k| env::var(k).ok());
    if config.api_key.is_none() {
        log::warn!("LEONARDO_API_KEY is not set; generation requests will fail with 500");
    }
    let addr = config.addr;
    let upstream = config.api_base.clone();
    let state = AppState::new(config).expect("build upstream client");
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind generation proxy");
    log::info!("generation proxy listening on http://{addr} (upstream {upstream})");

    axum::serve(listener, app)
        .await
        .expect("serve generation proxy");
}
