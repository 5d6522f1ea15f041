//! Telegram update handling
//!
//! Maps teloxide updates onto the transport-neutral model and feeds them to
//! the [`RelayDispatcher`].

use super::telegram::TelegramClient;
use crate::config::Settings;
use crate::media::{
    ConversationRef, GroupKey, InboundMessage, InboundUpdate, MediaDescriptor, MediaKind,
    MediaRef, VideoAttributes,
};
use crate::relay::RelayDispatcher;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::UpdateKind;
use tracing::debug;

/// Dispatcher type used by the bot binary
pub type TelegramDispatcher = RelayDispatcher<TelegramClient>;

/// Convert a Telegram update into an [`InboundUpdate`].
///
/// Only new messages are relevant; edits, channel posts and service updates
/// are ignored.
#[must_use]
pub fn inbound_from_update(update: &Update) -> InboundUpdate {
    match &update.kind {
        UpdateKind::Message(msg) => InboundUpdate::NewMessage(inbound_from_message(msg)),
        _ => InboundUpdate::Ignored,
    }
}

/// Convert a Telegram message into an [`InboundMessage`]
#[must_use]
pub fn inbound_from_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        id: msg.id.0,
        conversation: Some(ConversationRef(msg.chat.id.0)),
        group_key: msg.media_group_id().map(|id| GroupKey::new(id.0.clone())),
        media: media_descriptor(msg),
    }
}

fn media_descriptor(msg: &Message) -> Option<MediaDescriptor> {
    if let Some(video) = msg.video() {
        return Some(MediaDescriptor {
            kind: MediaKind::Video,
            mime_type: video.mime_type.as_ref().map(ToString::to_string),
            video_attributes: Some(VideoAttributes {
                duration_secs: video.duration.seconds(),
                width: video.width,
                height: video.height,
            }),
            media_ref: MediaRef(video.file.id.0.clone()),
            unique_id: video.file.unique_id.0.clone(),
            file_name: video.file_name.clone(),
        });
    }

    // Round video messages carry no name or MIME type
    if let Some(note) = msg.video_note() {
        return Some(MediaDescriptor {
            kind: MediaKind::Video,
            mime_type: None,
            video_attributes: Some(VideoAttributes {
                duration_secs: note.duration.seconds(),
                width: note.length,
                height: note.length,
            }),
            media_ref: MediaRef(note.file.id.0.clone()),
            unique_id: note.file.unique_id.0.clone(),
            file_name: None,
        });
    }

    // Checked before documents: an animation message also carries `document`
    if let Some(animation) = msg.animation() {
        return Some(MediaDescriptor {
            kind: MediaKind::Document,
            mime_type: animation.mime_type.as_ref().map(ToString::to_string),
            video_attributes: Some(VideoAttributes {
                duration_secs: animation.duration.seconds(),
                width: animation.width,
                height: animation.height,
            }),
            media_ref: MediaRef(animation.file.id.0.clone()),
            unique_id: animation.file.unique_id.0.clone(),
            file_name: animation.file_name.clone(),
        });
    }

    msg.document().map(|doc| MediaDescriptor {
        kind: MediaKind::Document,
        mime_type: doc.mime_type.as_ref().map(ToString::to_string),
        // The Bot API exposes no video attributes on documents
        video_attributes: None,
        media_ref: MediaRef(doc.file.id.0.clone()),
        unique_id: doc.file.unique_id.0.clone(),
        file_name: doc.file_name.clone(),
    })
}

/// Build the teloxide handler tree
#[must_use]
pub fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .filter(|update: Update, settings: Arc<Settings>| {
            update
                .chat()
                .is_none_or(|chat| settings.is_chat_allowed(chat.id.0))
        })
        .endpoint(handle_update)
}

async fn handle_update(
    update: Update,
    dispatcher: Arc<TelegramDispatcher>,
) -> Result<(), teloxide::RequestError> {
    let action = dispatcher.dispatch(inbound_from_update(&update)).await;
    debug!(update_id = update.id.0, ?action, "Update dispatched");
    respond(())
}
