use std::fmt;

/// Identifier shared by every fragment of one album
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(String);

impl GroupKey {
    /// Wrap a transport-specific group identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where replies for an item are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationRef(pub i64);

impl fmt::Display for ConversationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token the origin service uses to address a payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaRef(pub String);

/// Duration and dimensions attached to a video payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoAttributes {
    /// Length in seconds
    pub duration_secs: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// How the origin labelled the media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Dedicated video kind
    Video,
    /// Generic file attachment
    Document,
}

/// Everything the classifier needs to know about an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    /// Kind reported by the origin
    pub kind: MediaKind,
    /// Declared MIME type, if any
    pub mime_type: Option<String>,
    /// Explicit video metadata, if any
    pub video_attributes: Option<VideoAttributes>,
    /// Download reference
    pub media_ref: MediaRef,
    /// Stable unique identifier of the payload
    pub unique_id: String,
    /// File name suggested by the sender
    pub file_name: Option<String>,
}

/// A new message as seen by the dispatcher, before classification
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Message identifier used for reply threading
    pub id: i32,
    /// Reply destination; `None` when it could not be resolved
    pub conversation: Option<ConversationRef>,
    /// Album identifier, present only for album fragments
    pub group_key: Option<GroupKey>,
    /// Attached media, if any
    pub media: Option<MediaDescriptor>,
}

/// One event from the update source
#[derive(Debug, Clone)]
pub enum InboundUpdate {
    /// A freshly posted message
    NewMessage(InboundMessage),
    /// Edits, service updates and everything else
    Ignored,
}

/// A relay-eligible video item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundItem {
    /// Album identifier, present only for album fragments
    pub group_key: Option<GroupKey>,
    /// Where replies are sent
    pub source_conversation: ConversationRef,
    /// Download reference
    pub media_ref: MediaRef,
    /// Display and storage name of the video
    pub suggested_file_name: String,
    /// Message the relay replies to
    pub reply_target: i32,
}
