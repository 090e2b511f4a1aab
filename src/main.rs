use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use dircast::device::RootDevice;
use dircast::http::state::AppState;
use dircast::ssdp::service::SsdpConfig;
use dircast::{cli, config, device, http, ssdp};

/// Set to true once the first Ctrl+C is received. Second Ctrl+C force-exits.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Wait for the first Ctrl+C (graceful shutdown).
/// On second Ctrl+C (during shutdown wait), force-exit immediately.
async fn wait_for_shutdown() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    if SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
        eprintln!("\ndircast: forced exit");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref()).and_then(|path| {
        match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    });
    let config = config::Config::resolve(file_config, &args);

    // Object ids are absolute paths, so the root must resolve to one.
    let root = match std::fs::canonicalize(&config.path) {
        Ok(p) if p.is_dir() => p,
        Ok(p) => {
            eprintln!("error: not a directory: {}", p.display());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: cannot resolve {}: {}", config.path.display(), e);
            std::process::exit(1);
        }
    };

    let dev = Arc::new(RootDevice::new(config.name.clone(), config.port));
    tracing::info!(
        "dircast \"{}\" ({}) on port {}",
        dev.friendly_name,
        dev.uuid,
        dev.http_port
    );
    tracing::info!("Sharing {}", root.display());

    let state = AppState {
        device: Arc::clone(&dev),
        root: Arc::new(root),
        started: chrono::Utc::now(),
    };
    let app = http::build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("error: failed to bind {}: {}", addr, e);
            std::process::exit(1);
        });
    tracing::info!(
        "HTTP server on {}{}",
        addr,
        device::ROOT_DESC_PATH
    );

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(4);

    // One SSDP engine per interface, supervised until the last one exits.
    let ssdp_config = SsdpConfig {
        device: Arc::clone(&dev),
        notify_interval: config.notify_interval,
    };
    let ssdp_task = tokio::spawn(ssdp::service::run(ssdp_config, shutdown_tx.clone()));

    let mut http_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = http_rx.recv().await;
            })
            .await
            .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));
    });

    wait_for_shutdown().await;
    tracing::info!("Shutting down — sending SSDP byebye...");

    let _ = shutdown_tx.send(());

    // Give the engines up to a second to get their byebye out.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), ssdp_task).await;

    tracing::info!("Goodbye.");
}
