//! Chat commands and the handlers answering them

pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::{RateFeed, RateTable};
use crate::rates;

pub const TODAY_RATES_BUTTON: &str = "Курс на сегодня";
pub const GREETING: &str = "Привет!";
pub const RATES_UNAVAILABLE: &str = "Не удалось получить курс, попробуйте позже";

/// Reply keyboard attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
}

impl ReplyKeyboard {
    pub fn single_button(text: &str) -> Self {
        ReplyKeyboard {
            rows: vec![vec![text.to_string()]],
            resize: true,
        }
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Start,
    TodayRates,
}

impl Trigger {
    /// Maps message text to a trigger. Unrelated messages yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        if text == TODAY_RATES_BUTTON {
            return Some(Trigger::TodayRates);
        }

        let command = text.split_whitespace().next()?;
        let command = command.split('@').next().unwrap_or(command);
        (command == "/start").then_some(Trigger::Start)
    }
}

pub struct RatesBot<F, T> {
    feed: F,
    table: RateTable,
    transport: T,
    timeout: Duration,
}

impl<F, T> RatesBot<F, T>
where
    F: RateFeed,
    T: ChatTransport,
{
    pub fn new(feed: F, table: RateTable, transport: T, timeout: Duration) -> Self {
        RatesBot {
            feed,
            table,
            transport,
            timeout,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Answers one inbound text message. Errors come only from the transport.
    pub async fn handle_message(&self, chat_id: i64, text: &str) -> Result<()> {
        match Trigger::parse(text) {
            Some(Trigger::Start) => self.start(chat_id).await,
            Some(Trigger::TodayRates) => self.today_rates(chat_id).await,
            None => Ok(()),
        }
    }

    async fn start(&self, chat_id: i64) -> Result<()> {
        let keyboard = ReplyKeyboard::single_button(TODAY_RATES_BUTTON);
        self.transport
            .send_message(chat_id, GREETING, Some(&keyboard))
            .await?;
        info!(chat_id, "User started the bot");
        Ok(())
    }

    async fn today_rates(&self, chat_id: i64) -> Result<()> {
        match rates::today_rates(&self.feed, &self.table, self.timeout).await {
            Ok(reply) => {
                self.transport.send_message(chat_id, &reply, None).await?;
                info!(chat_id, "User requested rates");
            }
            Err(e) => {
                warn!(chat_id, error = %e, "Failed to fetch rates");
                self.transport
                    .send_message(chat_id, RATES_UNAVAILABLE, None)
                    .await?;
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::{RecordingTransport, SentMessage};
    use super::*;
    use crate::rates::test_utils::FakeFeed;

    fn feed() -> FakeFeed {
        RateTable::default()
            .pairs()
            .iter()
            .fold(FakeFeed::new(), |feed, p| {
                let json = format!(r#"{{"date": "2024-01-01", "{}": 2}}"#, p.quote);
                feed.with_payload(&p.to_string(), &json)
            })
    }

    fn bot(feed: FakeFeed, transport: RecordingTransport) -> RatesBot<FakeFeed, RecordingTransport> {
        RatesBot::new(feed, RateTable::default(), transport, Duration::from_secs(5))
    }

    #[test]
    fn test_trigger_parse() {
        assert_eq!(Trigger::parse("/start"), Some(Trigger::Start));
        assert_eq!(Trigger::parse("/start@kurs_bot"), Some(Trigger::Start));
        assert_eq!(Trigger::parse("/start ref123"), Some(Trigger::Start));
        assert_eq!(Trigger::parse("Курс на сегодня"), Some(Trigger::TodayRates));

        assert_eq!(Trigger::parse("курс на сегодня"), None);
        assert_eq!(Trigger::parse("Курс на сегодня!"), None);
        assert_eq!(Trigger::parse(" Курс на сегодня"), None);
        assert_eq!(Trigger::parse("/started"), None);
        assert_eq!(Trigger::parse("hello"), None);
        assert_eq!(Trigger::parse(""), None);
    }

    #[tokio::test]
    async fn test_start_sends_greeting_with_keyboard() {
        let bot = bot(feed(), RecordingTransport::default());
        bot.handle_message(42, "/start").await.unwrap();

        let sent = bot.transport().sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![SentMessage {
                chat_id: 42,
                text: "Привет!".to_string(),
                keyboard: Some(ReplyKeyboard {
                    rows: vec![vec!["Курс на сегодня".to_string()]],
                    resize: true,
                }),
            }]
        );
    }

    #[tokio::test]
    async fn test_today_rates_sends_assembled_block() {
        let bot = bot(feed(), RecordingTransport::default());
        bot.handle_message(7, "Курс на сегодня").await.unwrap();

        let sent = bot.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 7);
        assert!(sent[0].keyboard.is_none());
        assert_eq!(
            sent[0].text,
            "Дата: 2024-01-01\n\
             Евро -> Доллар: 2\n\
             Доллар -> Рубль: 2\n\
             Евро -> Рубль: 2\n\
             Драм -> Рубль: 2\n\
             Рубль -> Драм: 2\n\
             Доллар -> Драм: 2\n\
             Евро -> Драм: 2"
        );
    }

    #[tokio::test]
    async fn test_failed_batch_sends_apology_only() {
        let bot = bot(feed().with_failure("usd/amd", 502), RecordingTransport::default());
        bot.handle_message(7, "Курс на сегодня").await.unwrap();

        let sent = bot.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, RATES_UNAVAILABLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_batch_sends_apology() {
        let bot = bot(
            feed().with_delay("eur/rub", Duration::from_secs(120)),
            RecordingTransport::default(),
        );
        bot.handle_message(7, "Курс на сегодня").await.unwrap();

        let sent = bot.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, RATES_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unrelated_message_is_ignored() {
        let bot = bot(feed(), RecordingTransport::default());
        bot.handle_message(7, "what is the rate?").await.unwrap();

        assert!(bot.transport().sent.lock().unwrap().is_empty());
        assert!(bot.feed.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_returned() {
        let transport = RecordingTransport {
            fail: true,
            ..Default::default()
        };
        let bot = bot(feed(), transport);

        let result = bot.handle_message(7, "/start").await;
        assert_eq!(result.unwrap_err().to_string(), "Chat 7 is unreachable");
    }
}
