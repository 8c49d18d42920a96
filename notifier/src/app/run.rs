//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::NotifierError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::slack::client::NotificationChannel;
use crate::workers::broadcaster;

/// Run the deploy notifier until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    channel: Arc<dyn NotificationChannel>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), NotifierError> {
    info!("Initializing deploy notifier...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, channel, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start deploy notifier: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    channel: Arc<dyn NotificationChannel>,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, NotifierError> {
    let app_state = Arc::new(AppState::init(channel, options.message_header.clone()));

    init_periodic_broadcaster(
        options.broadcaster.clone(),
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_socket_server(
        options,
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )
    .await?;

    Ok(app_state)
}

fn init_periodic_broadcaster(
    options: broadcaster::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), NotifierError> {
    info!("Initializing periodic broadcaster...");

    let status_broadcaster = app_state.broadcaster.clone();

    let handle = tokio::spawn(async move {
        broadcaster::run(
            &options,
            status_broadcaster.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_broadcaster_handle(handle)
}

async fn init_socket_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), NotifierError> {
    info!("Initializing HTTP server...");

    let server_state = ServerState::new(app_state.tracker.clone(), app_state.broadcaster.clone());

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_socket_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    broadcaster_handle: Option<JoinHandle<()>>,
    socket_server_handle: Option<JoinHandle<Result<(), NotifierError>>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            broadcaster_handle: None,
            socket_server_handle: None,
        }
    }

    fn with_broadcaster_handle(&mut self, handle: JoinHandle<()>) -> Result<(), NotifierError> {
        if self.broadcaster_handle.is_some() {
            return Err(NotifierError::ShutdownError("broadcaster_handle already set".to_string()));
        }
        self.broadcaster_handle = Some(handle);
        Ok(())
    }

    fn with_socket_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), NotifierError>>,
    ) -> Result<(), NotifierError> {
        if self.socket_server_handle.is_some() {
            return Err(NotifierError::ShutdownError("server_handle already set".to_string()));
        }
        self.socket_server_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), NotifierError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), NotifierError> {
        info!("Shutting down deploy notifier...");

        // 1. Periodic broadcaster (may already have stopped on done)
        if let Some(handle) = self.broadcaster_handle.take() {
            handle.await.map_err(|e| NotifierError::ShutdownError(e.to_string()))?;
        }

        // 2. Socket server
        if let Some(handle) = self.socket_server_handle.take() {
            handle.await.map_err(|e| NotifierError::ShutdownError(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
