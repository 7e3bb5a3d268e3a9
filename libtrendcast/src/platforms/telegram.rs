//! Telegram publishing via the Bot API
//!
//! Posts go to a channel or chat configured in `[telegram]`. Media is sent
//! by file id, so the asset never transits this process; the caption is
//! truncated to the Bot API limit when necessary.

use async_trait::async_trait;
use teloxide::payloads::SendPhotoSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile, Recipient};
use tracing::warn;

use crate::config::TelegramConfig;
use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::MediaRef;

const MESSAGE_LIMIT: usize = 4096;
const CAPTION_LIMIT: usize = 1024;

pub struct TelegramPlatform {
    config: TelegramConfig,
    bot: Option<Bot>,
}

impl TelegramPlatform {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            config: config.clone(),
            bot: None,
        }
    }

    fn chat(&self) -> Result<Recipient> {
        let target = self.config.chat.trim();
        if target.starts_with('@') {
            return Ok(Recipient::ChannelUsername(target.to_string()));
        }
        target
            .parse::<i64>()
            .map(|id| Recipient::Id(ChatId(id)))
            .map_err(|_| {
                PlatformError::Validation(format!(
                    "Telegram chat target '{}' is neither @username nor a numeric chat id",
                    target
                ))
                .into()
            })
    }

    fn bot(&self) -> Result<&Bot> {
        self.bot.as_ref().ok_or_else(|| {
            PlatformError::Authentication(
                "Telegram: authenticate() must be called before post()".to_string(),
            )
            .into()
        })
    }
}

#[async_trait]
impl Platform for TelegramPlatform {
    fn name(&self) -> &str {
        "telegram"
    }

    fn is_configured(&self) -> bool {
        self.config.enabled && !self.config.chat.trim().is_empty()
    }

    fn character_limit(&self) -> Option<usize> {
        Some(MESSAGE_LIMIT)
    }

    async fn authenticate(&mut self) -> Result<()> {
        let token = std::env::var(&self.config.token_env).map_err(|_| {
            PlatformError::Authentication(format!(
                "Telegram bot token not set in ${}",
                self.config.token_env
            ))
        })?;

        let bot = Bot::new(token);
        bot.get_me()
            .await
            .map_err(|e| PlatformError::Authentication(format!("Telegram getMe failed: {}", e)))?;

        self.bot = Some(bot);
        Ok(())
    }

    async fn post(&self, text: &str, media: Option<&MediaRef>) -> Result<String> {
        let bot = self.bot()?;
        let chat = self.chat()?;

        let message = match media {
            Some(m) if m.is_photo() => {
                let caption: String = text.chars().take(CAPTION_LIMIT).collect();
                if caption.len() < text.len() {
                    warn!(limit = CAPTION_LIMIT, "caption truncated for Telegram");
                }
                bot.send_photo(chat, InputFile::file_id(FileId(m.file_id.clone())))
                    .caption(caption)
                    .await
                    .map_err(|e| {
                        PlatformError::Posting(format!("Telegram sendPhoto failed: {}", e))
                    })?
            }
            _ => bot.send_message(chat, text).await.map_err(|e| {
                PlatformError::Posting(format!("Telegram sendMessage failed: {}", e))
            })?,
        };

        Ok(message.id.0.to_string())
    }
}
