use anyhow::{Result, anyhow};
use async_trait::async_trait;
use frankenstein::{
    AllowedUpdate, AsyncApi, AsyncTelegramApi, GetUpdatesParams, KeyboardButton, ReplyKeyboardMarkup,
    ReplyMarkup, SendMessageParams, UpdateContent,
};
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{ChatTransport, RatesBot, ReplyKeyboard};
use crate::core::RateFeed;

const POLL_TIMEOUT_SECS: u32 = 30;
const POLL_ERROR_DELAY: Duration = Duration::from_secs(5);

pub struct TelegramTransport {
    api: AsyncApi,
}

impl TelegramTransport {
    pub fn new(token: &str) -> Self {
        TelegramTransport {
            api: AsyncApi::new(token),
        }
    }

    /// Talks to a Bot API server at `api_url`, which already includes the `bot<token>` segment.
    pub fn with_api_url(api_url: &str) -> Self {
        TelegramTransport {
            api: AsyncApi::new_url(api_url),
        }
    }

    pub fn api(&self) -> &AsyncApi {
        &self.api
    }
}

fn reply_markup(keyboard: &ReplyKeyboard) -> ReplyMarkup {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|text| KeyboardButton::builder().text(text.as_str()).build())
                .collect()
        })
        .collect();

    ReplyMarkup::ReplyKeyboardMarkup(
        ReplyKeyboardMarkup::builder()
            .keyboard(rows)
            .resize_keyboard(keyboard.resize)
            .build(),
    )
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<()> {
        let mut params = SendMessageParams::builder().chat_id(chat_id).text(text).build();
        params.reply_markup = keyboard.map(reply_markup);

        self.api
            .send_message(&params)
            .await
            .map_err(|e| anyhow!("Failed to send message to chat {chat_id}: {e:?}"))?;
        Ok(())
    }
}

/// Long-polls Telegram for messages and hands each text message to `bot` until `shutdown` resolves.
pub async fn run_polling<F, S>(bot: &RatesBot<F, TelegramTransport>, shutdown: S) -> Result<()>
where
    F: RateFeed,
    S: Future<Output = ()>,
{
    poll_updates(bot, shutdown, POLL_ERROR_DELAY).await
}

async fn poll_updates<F, S>(
    bot: &RatesBot<F, TelegramTransport>,
    shutdown: S,
    error_delay: Duration,
) -> Result<()>
where
    F: RateFeed,
    S: Future<Output = ()>,
{
    let mut params = GetUpdatesParams::builder()
        .allowed_updates(vec![AllowedUpdate::Message])
        .timeout(POLL_TIMEOUT_SECS)
        .build();

    tokio::pin!(shutdown);
    info!("Polling for updates");

    loop {
        let response = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping polling");
                return Ok(());
            }
            response = bot.transport().api().get_updates(&params) => response,
        };

        let updates = match response {
            Ok(response) => response.result,
            Err(e) => {
                error!(error = ?e, "Failed to fetch updates");
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        info!("Shutdown requested, stopping polling");
                        return Ok(());
                    }
                    _ = tokio::time::sleep(error_delay) => {}
                }
                continue;
            }
        };
        debug!(count = updates.len(), "Received updates");

        let mut messages = Vec::new();
        for update in updates {
            params.offset = Some(i64::from(update.update_id) + 1);
            if let UpdateContent::Message(message) = update.content {
                if let Some(text) = message.text.as_deref() {
                    messages.push((message.chat.id, text.to_string()));
                }
            }
        }

        let results = join_all(
            messages
                .iter()
                .map(|(chat_id, text)| bot.handle_message(*chat_id, text)),
        )
        .await;
        for result in results {
            if let Err(e) = result {
                error!(error = %e, "Failed to answer message");
            }
        }
    }
}
