//! Download → upload → send cycle for a single video

use super::transient::TransientFile;
use crate::client::{ClientError, MediaClient};
use crate::media::InboundItem;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

/// The step of a relay that failed
#[derive(Error, Debug)]
pub enum RelayError {
    /// Progress notice could not be sent
    #[error("failed to send progress notice: {0}")]
    Notice(#[source] ClientError),
    /// Transient file could not be created or written
    #[error("transient storage error: {0}")]
    Storage(#[from] std::io::Error),
    /// Payload could not be downloaded
    #[error("download failed: {0}")]
    Download(#[source] ClientError),
    /// Local file could not be uploaded
    #[error("upload failed: {0}")]
    Upload(#[source] ClientError),
    /// Final video reply could not be sent
    #[error("sending video failed: {0}")]
    Send(#[source] ClientError),
}

/// Result of relaying one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The video was sent back
    Success,
    /// Some step failed; the reason was reported to the chat
    Failure(String),
}

impl RelayOutcome {
    /// Whether the relay succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Relays single items through a [`MediaClient`].
///
/// Holds no per-item state, so one worker serves any number of concurrent
/// relays.
pub struct RelayWorker<C: MediaClient> {
    client: Arc<C>,
    transient_dir: PathBuf,
}

impl<C: MediaClient> Clone for RelayWorker<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            transient_dir: self.transient_dir.clone(),
        }
    }
}

impl<C: MediaClient> RelayWorker<C> {
    /// Create a worker writing transient files into `transient_dir`
    pub fn new(client: Arc<C>, transient_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            transient_dir: transient_dir.into(),
        }
    }

    /// Relay one item, making a single attempt.
    ///
    /// Failures are logged, reported to the chat as a threaded error notice
    /// and returned as [`RelayOutcome::Failure`]. The transient file is removed
    /// on every path; failing to remove it is only logged, since it says
    /// nothing about whether the video reached the chat.
    pub async fn relay(&self, item: &InboundItem) -> RelayOutcome {
        match self.try_relay(item).await {
            Ok(()) => {
                info!(
                    file_name = %item.suggested_file_name,
                    chat_id = %item.source_conversation,
                    message_id = item.reply_target,
                    "Video relayed"
                );
                RelayOutcome::Success
            }
            Err(e) => {
                error!(
                    file_name = %item.suggested_file_name,
                    chat_id = %item.source_conversation,
                    message_id = item.reply_target,
                    error = %e,
                    "Error processing video"
                );
                let notice = format!("Error: {e}");
                if let Err(notice_err) = self
                    .client
                    .send_text(item.source_conversation, notice, item.reply_target)
                    .await
                {
                    warn!(
                        chat_id = %item.source_conversation,
                        error = %notice_err,
                        "Failed to send error notice"
                    );
                }
                RelayOutcome::Failure(e.to_string())
            }
        }
    }

    async fn try_relay(&self, item: &InboundItem) -> Result<(), RelayError> {
        self.client
            .send_text(
                item.source_conversation,
                format!("Processing: {}...", item.suggested_file_name),
                item.reply_target,
            )
            .await
            .map_err(RelayError::Notice)?;

        let (transient, file) =
            TransientFile::create(&self.transient_dir, &item.suggested_file_name).await?;

        let result = self.transfer(item, &transient, file).await;
        let path = transient.path().to_path_buf();
        if let Err(e) = transient.release().await {
            warn!(
                path = %path.display(),
                file_name = %item.suggested_file_name,
                error = %e,
                "Failed to release transient file"
            );
        }

        result
    }

    async fn transfer(
        &self,
        item: &InboundItem,
        transient: &TransientFile,
        mut file: tokio::fs::File,
    ) -> Result<(), RelayError> {
        self.client
            .download(&item.media_ref, &mut file)
            .await
            .map_err(RelayError::Download)?;
        file.flush().await?;
        drop(file);

        let uploaded = self
            .client
            .upload(transient.path(), &item.suggested_file_name)
            .await
            .map_err(RelayError::Upload)?;

        self.client
            .send_video(item.source_conversation, uploaded, item.reply_target)
            .await
            .map_err(RelayError::Send)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockMediaClient, UploadedMedia};
    use crate::media::{ConversationRef, MediaRef};
    use std::sync::Mutex;

    fn item() -> InboundItem {
        InboundItem {
            group_key: None,
            source_conversation: ConversationRef(7),
            media_ref: MediaRef("ref-1".to_string()),
            suggested_file_name: "clip.mp4".to_string(),
            reply_target: 42,
        }
    }

    #[tokio::test]
    async fn test_success_runs_every_step() {
        let seen_path = Arc::new(Mutex::new(None));
        let mut client = MockMediaClient::new();
        client
            .expect_send_text()
            .withf(|_, text, reply_to| text == "Processing: clip.mp4..." && *reply_to == 42)
            .times(1)
            .returning(|_, _, _| Ok(()));
        client.expect_download().times(1).returning(|_, _| Ok(()));
        let seen = seen_path.clone();
        client.expect_upload().times(1).returning(move |path, name| {
            if let Ok(mut slot) = seen.lock() {
                *slot = Some(path.to_path_buf());
            }
            Ok(UploadedMedia {
                path: path.to_path_buf(),
                file_name: name.to_string(),
                size: 0,
            })
        });
        client
            .expect_send_video()
            .withf(|dest, media, reply_to| {
                *dest == ConversationRef(7) && media.file_name == "clip.mp4" && *reply_to == 42
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let worker = RelayWorker::new(Arc::new(client), std::env::temp_dir());
        assert_eq!(worker.relay(&item()).await, RelayOutcome::Success);

        let path = seen_path.lock().ok().and_then(|p| p.clone()).expect("upload path");
        assert!(!path.exists(), "transient file must be released");
    }

    #[tokio::test]
    async fn test_send_failure_reports_and_releases() {
        let seen_path = Arc::new(Mutex::new(None));
        let mut client = MockMediaClient::new();
        client
            .expect_send_text()
            .withf(|_, text, _| text.starts_with("Processing"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        client
            .expect_send_text()
            .withf(|_, text, reply_to| text.starts_with("Error: ") && *reply_to == 42)
            .times(1)
            .returning(|_, _, _| Ok(()));
        client.expect_download().returning(|_, _| Ok(()));
        let seen = seen_path.clone();
        client.expect_upload().returning(move |path, name| {
            if let Ok(mut slot) = seen.lock() {
                *slot = Some(path.to_path_buf());
            }
            Ok(UploadedMedia {
                path: path.to_path_buf(),
                file_name: name.to_string(),
                size: 0,
            })
        });
        client
            .expect_send_video()
            .returning(|_, _, _| Err(ClientError::Api("Bad Request: file too big".to_string())));

        let worker = RelayWorker::new(Arc::new(client), std::env::temp_dir());
        let outcome = worker.relay(&item()).await;

        let RelayOutcome::Failure(reason) = outcome else {
            panic!("expected failure");
        };
        assert!(reason.contains("file too big"), "unexpected reason: {reason}");
        let path = seen_path.lock().ok().and_then(|p| p.clone()).expect("upload path");
        assert!(!path.exists(), "transient file must be released");
    }

    #[tokio::test]
    async fn test_error_notice_failure_is_swallowed() {
        let mut client = MockMediaClient::new();
        client
            .expect_send_text()
            .returning(|_, _, _| Err(ClientError::Api("chat not found".to_string())));
        client.expect_download().never();

        let worker = RelayWorker::new(Arc::new(client), std::env::temp_dir());
        let outcome = worker.relay(&item()).await;
        assert!(matches!(outcome, RelayOutcome::Failure(reason) if reason.contains("progress notice")));
    }

    #[tokio::test]
    async fn test_release_failure_after_delivery_is_still_success() {
        let seen_path = Arc::new(Mutex::new(None));
        let mut client = MockMediaClient::new();
        // Only the progress notice may be sent; an error notice would not match
        client
            .expect_send_text()
            .withf(|_, text, _| text.starts_with("Processing"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        client.expect_download().returning(|_, _| Ok(()));
        client.expect_upload().returning(|path, name| {
            Ok(UploadedMedia {
                path: path.to_path_buf(),
                file_name: name.to_string(),
                size: 0,
            })
        });
        let seen = seen_path.clone();
        client.expect_send_video().times(1).returning(move |_, media, _| {
            // A directory in place of the file makes the removal fail
            std::fs::remove_file(&media.path)?;
            std::fs::create_dir(&media.path)?;
            if let Ok(mut slot) = seen.lock() {
                *slot = Some(media.path);
            }
            Ok(())
        });

        let worker = RelayWorker::new(Arc::new(client), std::env::temp_dir());
        assert_eq!(worker.relay(&item()).await, RelayOutcome::Success);

        let path = seen_path.lock().ok().and_then(|p| p.clone()).expect("sent path");
        assert!(path.is_dir());
        std::fs::remove_dir(path).ok();
    }

    #[tokio::test]
    async fn test_storage_failure_is_a_relay_failure() {
        let mut client = MockMediaClient::new();
        client.expect_send_text().returning(|_, _, _| Ok(()));
        client.expect_download().never();

        let missing = std::env::temp_dir().join(format!("missing-{}", uuid::Uuid::new_v4()));
        let worker = RelayWorker::new(Arc::new(client), missing);
        let outcome = worker.relay(&item()).await;
        assert!(matches!(outcome, RelayOutcome::Failure(reason) if reason.contains("transient storage")));
    }
}
