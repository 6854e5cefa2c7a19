use crate::config::Config;
use crate::server::{HttpServer, Predictors};

use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> anyhow::Result<()> {
    let predictors = Predictors::from_config(&config.predictor);
    tracing::info!(
        program = %config.predictor.program,
        script_dir = ?config.predictor.script_dir,
        timeout_ms = ?config.predictor.timeout_ms,
        "Predictor scripts configured"
    );

    let server = match HttpServer::new(predictors, &config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to initialize http server: {:?}", e);
            return Err(e);
        }
    };

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    server_handle.await??;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
