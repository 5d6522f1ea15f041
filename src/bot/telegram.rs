//! [`MediaClient`] backed by the Telegram Bot API

use crate::client::{ClientError, MediaClient, UploadedMedia};
use crate::media::{ConversationRef, MediaRef};
use async_trait::async_trait;
use std::path::Path;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, MessageId, ReplyParameters};
use tracing::debug;

/// Largest file the public Bot API accepts for `sendVideo` (50 MB)
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Telegram implementation of the relay collaborator
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    /// Wrap a bot handle
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MediaClient for TelegramClient {
    async fn send_text(
        &self,
        destination: ConversationRef,
        text: String,
        reply_to: i32,
    ) -> Result<(), ClientError> {
        self.bot
            .send_message(ChatId(destination.0), text)
            .reply_parameters(ReplyParameters::new(MessageId(reply_to)))
            .await?;
        Ok(())
    }

    async fn download(
        &self,
        media_ref: &MediaRef,
        sink: &mut tokio::fs::File,
    ) -> Result<(), ClientError> {
        let file = self.bot.get_file(FileId(media_ref.0.clone())).await?;
        debug!(path = %file.path, "Downloading from Telegram");
        self.bot.download_file(&file.path, sink).await?;
        Ok(())
    }

    /// The Bot API streams the bytes as part of `sendVideo`, so this only
    /// validates the local file and hands back its path.
    async fn upload(&self, path: &Path, file_name: &str) -> Result<UploadedMedia, ClientError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size == 0 {
            return Err(ClientError::Rejected("downloaded file is empty".to_string()));
        }
        if size > MAX_UPLOAD_BYTES {
            return Err(ClientError::Rejected(format!(
                "file is {:.1} MB, the upload limit is 50 MB",
                size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(UploadedMedia {
            path: path.to_path_buf(),
            file_name: file_name.to_string(),
            size,
        })
    }

    async fn send_video(
        &self,
        destination: ConversationRef,
        media: UploadedMedia,
        reply_to: i32,
    ) -> Result<(), ClientError> {
        let input = InputFile::file(media.path).file_name(media.file_name);
        self.bot
            .send_video(ChatId(destination.0), input)
            .reply_parameters(ReplyParameters::new(MessageId(reply_to)))
            .supports_streaming(true)
            .await?;
        Ok(())
    }
}
