//! Telegram update poller.
//!
//! Long-polls `getUpdates`, feeds message texts to the [`CommandHandler`]
//! and answers in the chat the command came from.

use crate::commands::CommandHandler;
use hlwatch_telegram::{TelegramClient, Update};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause before polling again after a failed `getUpdates`.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct UpdatePoller {
    client: Arc<TelegramClient>,
    handler: CommandHandler,
    poll_timeout_secs: u64,
    /// Next update id to request.
    offset: Option<i64>,
    cancel: CancellationToken,
}

impl UpdatePoller {
    pub fn new(
        client: Arc<TelegramClient>,
        handler: CommandHandler,
        poll_timeout_secs: u64,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            handler,
            poll_timeout_secs,
            offset: None,
            cancel,
        }
    }

    pub fn handler(&self) -> &CommandHandler {
        &self.handler
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Poll until the cancellation token fires.
    pub async fn run(mut self) {
        info!(timeout_secs = self.poll_timeout_secs, "Update poller started");

        loop {
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                result = self.client.get_updates(self.offset, self.poll_timeout_secs) => result,
            };

            match result {
                Ok(updates) => self.process_updates(updates).await,
                Err(e) => {
                    warn!(error = %e, delay_secs = POLL_RETRY_DELAY.as_secs(), "getUpdates failed, retrying");
                    tokio::select! {
                        () = self.cancel.cancelled() => break,
                        () = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                    }
                }
            }
        }

        info!("Update poller stopped");
    }

    /// Handle a batch of updates in order, advancing the offset past each.
    pub async fn process_updates(&mut self, updates: Vec<Update>) {
        for update in updates {
            self.offset = Some(update.update_id + 1);

            let Some(message) = update.message else {
                debug!(update_id = update.update_id, "Skipping non-message update");
                continue;
            };
            let Some(text) = message.text.as_deref() else {
                continue;
            };

            let Some(reply) = self.handler.handle(text) else {
                continue;
            };

            let chat_id = message.chat.id.to_string();
            if let Err(e) = self
                .client
                .send_message(&chat_id, &reply.text, reply.parse_mode)
                .await
            {
                warn!(chat_id = %chat_id, error = %e, "Failed to send command reply");
            }
        }
    }
}
