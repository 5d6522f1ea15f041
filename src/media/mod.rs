//! Transport-neutral media model and video classification

/// Video eligibility rules
pub mod classifier;
/// Inbound items, keys and references
pub mod model;

pub use classifier::{classify, sanitize_file_name, Classification};
pub use model::{
    ConversationRef, GroupKey, InboundItem, InboundMessage, InboundUpdate, MediaDescriptor,
    MediaKind, MediaRef, VideoAttributes,
};
