//! Application orchestration.
//!
//! Wires the feed client, the update poller and the notifier together and
//! owns the process lifecycle.

use crate::commands::CommandHandler;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::poller::UpdatePoller;
use hlwatch_core::LabeledFill;
use hlwatch_telegram::{DynNotifier, TelegramClient, TelegramNotifier};
use hlwatch_ws::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Capacity of the fill channel between feed client and notifier.
const FILL_CHANNEL_CAPACITY: usize = 1000;

/// Main application.
pub struct Application {
    feed: Arc<ConnectionManager>,
    client: Arc<TelegramClient>,
    fill_rx: mpsc::Receiver<LabeledFill>,
    notifier: DynNotifier,
    poller: UpdatePoller,
    poll_token: CancellationToken,
}

impl Application {
    /// Create a new application delivering to the configured chat.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let client = Arc::new(TelegramClient::new(
            &config.telegram_api_url,
            config.credentials.token(),
            Duration::from_secs(config.telegram.request_timeout_secs),
        )?);
        let notifier: DynNotifier = Arc::new(TelegramNotifier::new(
            client.clone(),
            config.credentials.chat_id(),
        ));

        Ok(Self::with_notifier(&config, client, notifier))
    }

    /// Create an application with a custom notifier.
    pub fn with_notifier(
        config: &AppConfig,
        client: Arc<TelegramClient>,
        notifier: DynNotifier,
    ) -> Self {
        let (fill_tx, fill_rx) = mpsc::channel(FILL_CHANNEL_CAPACITY);
        let feed = Arc::new(ConnectionManager::new(config.connection_config(), fill_tx));

        let poll_token = CancellationToken::new();
        let poller = UpdatePoller::new(
            client.clone(),
            CommandHandler::new(feed.clone()),
            config.telegram.poll_timeout_secs,
            poll_token.clone(),
        );

        Self {
            feed,
            client,
            fill_rx,
            notifier,
            poller,
            poll_token,
        }
    }

    /// Feed client handle.
    pub fn feed(&self) -> Arc<ConnectionManager> {
        self.feed.clone()
    }

    /// Log the bot identity. Failure is not fatal.
    pub async fn log_identity(&self) {
        match self.client.get_me().await {
            Ok(me) => info!(
                bot_id = me.id,
                username = me.username.as_deref().unwrap_or("-"),
                "Telegram bot identified"
            ),
            Err(e) => warn!(error = %e, "getMe failed"),
        }
    }

    /// Run until a shutdown signal or a fatal feed error.
    pub async fn run(self) -> AppResult<()> {
        self.log_identity().await;
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves or the feed client gives up.
    pub async fn run_until<F>(mut self, shutdown: F) -> AppResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let feed = self.feed.clone();
        let mut feed_handle = tokio::spawn(async move { feed.connect().await });
        let poller_handle = tokio::spawn(self.poller.run());

        info!("Application running");

        tokio::pin!(shutdown);
        let mut feed_finished = false;

        let result = loop {
            tokio::select! {
                Some(labeled) = self.fill_rx.recv() => {
                    dispatch_notification(self.notifier.clone(), labeled);
                }

                joined = &mut feed_handle => {
                    feed_finished = true;
                    break match joined {
                        Ok(Ok(())) => {
                            info!("Feed client stopped");
                            Ok(())
                        }
                        Ok(Err(e)) => {
                            error!(error = %e, "Feed client failed");
                            Err(AppError::from(e))
                        }
                        Err(e) => Err(AppError::Task(format!("feed task: {e}"))),
                    };
                }

                () = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
            }
        };

        info!("Shutting down");
        self.feed.shutdown();
        self.poll_token.cancel();

        if !feed_finished {
            match feed_handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Feed client ended with error during shutdown"),
                Err(e) => warn!(error = %e, "Feed task failed during shutdown"),
            }
        }
        if let Err(e) = poller_handle.await {
            warn!(error = %e, "Poller task failed during shutdown");
        }

        info!("Shutdown complete");
        result
    }
}

/// Deliver one fill in the background; the outcome is only logged.
fn dispatch_notification(notifier: DynNotifier, labeled: LabeledFill) {
    tokio::spawn(async move {
        let outcome = notifier.notify(&labeled.fill, &labeled.label).await;
        if outcome.is_delivered() {
            debug!(label = %labeled.label, coin = %labeled.fill.coin, "Notification delivered");
        } else {
            warn!(label = %labeled.label, coin = %labeled.fill.coin, ?outcome, "Notification not delivered");
        }
    });
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
