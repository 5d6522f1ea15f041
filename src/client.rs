//! Messaging client interface consumed by the relay pipeline
//!
//! The pipeline only talks to the origin service through [`MediaClient`], so
//! the Telegram implementation in [`crate::bot::telegram`] can be swapped for a
//! fake in tests.

use crate::media::{ConversationRef, MediaRef};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by a messaging client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Telegram Bot API request failed
    #[error("Telegram API error: {0}")]
    Api(String),
    /// Streaming a payload failed
    #[error("Download error: {0}")]
    Download(String),
    /// Local file access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The local file cannot be uploaded
    #[error("Upload rejected: {0}")]
    Rejected(String),
}

impl From<teloxide::RequestError> for ClientError {
    fn from(e: teloxide::RequestError) -> Self {
        Self::Api(e.to_string())
    }
}

impl From<teloxide::DownloadError> for ClientError {
    fn from(e: teloxide::DownloadError) -> Self {
        Self::Download(e.to_string())
    }
}

/// A local file accepted for sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    /// Local file backing the upload
    pub path: PathBuf,
    /// Name presented to the recipient
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
}

/// Outbound, download and upload capabilities of the origin service.
///
/// Implementations must tolerate concurrent calls from several relay tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaClient: Send + Sync {
    /// Send a text message threaded to `reply_to`
    async fn send_text(
        &self,
        destination: ConversationRef,
        text: String,
        reply_to: i32,
    ) -> Result<(), ClientError>;

    /// Stream the payload behind `media_ref` into `sink`
    async fn download(
        &self,
        media_ref: &MediaRef,
        sink: &mut tokio::fs::File,
    ) -> Result<(), ClientError>;

    /// Prepare a local file for sending
    async fn upload(&self, path: &Path, file_name: &str) -> Result<UploadedMedia, ClientError>;

    /// Send an uploaded file as a native video threaded to `reply_to`
    async fn send_video(
        &self,
        destination: ConversationRef,
        media: UploadedMedia,
        reply_to: i32,
    ) -> Result<(), ClientError>;
}
