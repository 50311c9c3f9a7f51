use std::sync::Arc;

mod config;
mod error;
mod frames;
mod handler;
mod http;
mod logger;
mod middleware;
mod routing;
mod search;
mod server;

use server::{create_reusable_listener, shutdown_signal, start_server_loop};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path without extension
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Create the Tokio runtime, sized by `server.workers` when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_debug(&format!("Using {workers} worker threads"));
    } else {
        logger::log_debug("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    let search = search::from_config(&cfg.search)?;
    let state = Arc::new(config::AppState::new(cfg, search)?);

    logger::log_server_start(&addr, &state.config, state.search.name());

    start_server_loop(listener, state, shutdown_signal()).await;
    Ok(())
}
