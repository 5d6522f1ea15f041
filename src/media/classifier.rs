use super::model::{MediaDescriptor, MediaKind, MediaRef};
use crate::config::DEFAULT_VIDEO_EXTENSION;

/// Byte budget for the stem of a sanitized name
const MAX_STEM_BYTES: usize = 128;
/// Longest suffix, dot included, still kept as an extension
const MAX_EXTENSION_BYTES: usize = 16;

/// Result of classifying a media descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Relay-eligible video with a non-empty file name
    VideoItem {
        /// Download reference
        media_ref: MediaRef,
        /// Suggested or synthesized file name
        file_name: String,
    },
    /// Anything else
    NotApplicable,
}

/// Decide whether a descriptor is a relay-eligible video.
///
/// An explicit video kind wins outright. A document qualifies when its MIME
/// type starts with `video/` or when it carries video attributes. A missing
/// file name is synthesized as `video_{unique_id}.mp4`.
#[must_use]
pub fn classify(media: &MediaDescriptor) -> Classification {
    let is_video = match media.kind {
        MediaKind::Video => true,
        MediaKind::Document => {
            media
                .mime_type
                .as_deref()
                .is_some_and(|mime| mime.starts_with("video/"))
                || media.video_attributes.is_some()
        }
    };

    if !is_video {
        return Classification::NotApplicable;
    }

    let file_name = media
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(
            || format!("video_{}.{DEFAULT_VIDEO_EXTENSION}", media.unique_id),
            ToString::to_string,
        );

    Classification::VideoItem {
        media_ref: media.media_ref.clone(),
        file_name,
    }
}

/// Make a file name safe to embed in a local path.
///
/// Directory components are stripped and characters that are hostile to
/// filesystems are replaced with `_`. The stem is cut to a fixed byte budget
/// on a char boundary so the result fits a single path component; a short
/// extension survives the cut.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    // Either separator may appear regardless of the host OS
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let name = name.trim_start_matches('.');

    if name.is_empty() {
        return format!("video.{DEFAULT_VIDEO_EXTENSION}");
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '\0' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();

    truncate_stem(&sanitized)
}

fn truncate_stem(name: &str) -> String {
    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES => name.split_at(dot),
        _ => (name, ""),
    };

    if stem.len() <= MAX_STEM_BYTES {
        return name.to_string();
    }

    let cut = stem
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= MAX_STEM_BYTES)
        .last()
        .unwrap_or(0);
    format!("{}{extension}", &stem[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::model::VideoAttributes;

    fn document(mime: Option<&str>) -> MediaDescriptor {
        MediaDescriptor {
            kind: MediaKind::Document,
            mime_type: mime.map(ToString::to_string),
            video_attributes: None,
            media_ref: MediaRef("file-1".to_string()),
            unique_id: "AgADxyz".to_string(),
            file_name: Some("clip.mp4".to_string()),
        }
    }

    #[test]
    fn test_video_mime_document_is_video() {
        let result = classify(&document(Some("video/quicktime")));
        assert_eq!(
            result,
            Classification::VideoItem {
                media_ref: MediaRef("file-1".to_string()),
                file_name: "clip.mp4".to_string(),
            }
        );
    }

    #[test]
    fn test_octet_stream_with_video_attributes_is_video() {
        let mut media = document(Some("application/octet-stream"));
        media.video_attributes = Some(VideoAttributes {
            duration_secs: 12,
            width: 1280,
            height: 720,
        });
        assert!(matches!(classify(&media), Classification::VideoItem { .. }));
    }

    #[test]
    fn test_plain_documents_are_not_applicable() {
        assert_eq!(
            classify(&document(Some("application/pdf"))),
            Classification::NotApplicable
        );
        assert_eq!(classify(&document(None)), Classification::NotApplicable);
        assert_eq!(
            classify(&document(Some("image/video-like"))),
            Classification::NotApplicable
        );
    }

    #[test]
    fn test_video_kind_wins_over_mime() {
        let mut media = document(Some("application/pdf"));
        media.kind = MediaKind::Video;
        assert!(matches!(classify(&media), Classification::VideoItem { .. }));

        media.mime_type = None;
        assert!(matches!(classify(&media), Classification::VideoItem { .. }));
    }

    #[test]
    fn test_missing_name_is_synthesized_from_unique_id() {
        let mut media = document(Some("video/mp4"));
        media.file_name = None;
        let Classification::VideoItem { file_name, .. } = classify(&media) else {
            panic!("expected a video item");
        };
        assert!(file_name.contains("AgADxyz"));
        assert!(file_name.ends_with(".mp4"));

        media.file_name = Some("   ".to_string());
        assert_eq!(
            classify(&media),
            Classification::VideoItem {
                media_ref: MediaRef("file-1".to_string()),
                file_name: "video_AgADxyz.mp4".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_is_repeatable() {
        let media = document(Some("video/mp4"));
        assert_eq!(classify(&media), classify(&media));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(r"C:\videos\my clip?.mp4"), "my_clip_.mp4");
        assert_eq!(sanitize_file_name(".hidden.mp4"), "hidden.mp4");
        assert_eq!(sanitize_file_name("dir/"), "video.mp4");
        assert_eq!(sanitize_file_name("ok-name_1.mkv"), "ok-name_1.mkv");
    }

    #[test]
    fn test_long_multibyte_name_is_cut_on_char_boundary() {
        let name = format!("{}.mp4", "видео".repeat(24));
        assert_eq!(name.len(), 244);

        let sanitized = sanitize_file_name(&name);
        assert!(sanitized.len() <= MAX_STEM_BYTES + ".mp4".len(), "{}", sanitized.len());
        assert!(sanitized.starts_with("видео"));
        assert!(sanitized.ends_with(".mp4"));
        assert_eq!(sanitized, format!("{}.mp4", "видео".repeat(24).chars().take(64).collect::<String>()));
    }

    #[test]
    fn test_long_name_cut_mid_char_keeps_whole_chars() {
        // 'a' shifts every two-byte char off the budget boundary
        let name = format!("a{}.mkv", "я".repeat(100));
        let sanitized = sanitize_file_name(&name);
        assert_eq!(sanitized.len(), 127 + ".mkv".len());
        assert!(sanitized.ends_with("я.mkv"));
    }

    #[test]
    fn test_long_name_without_extension_is_cut() {
        assert_eq!(sanitize_file_name(&"x".repeat(300)).len(), MAX_STEM_BYTES);

        // An oversized suffix is part of the stem, not an extension
        let name = format!("clip.{}", "y".repeat(200));
        assert_eq!(sanitize_file_name(&name).len(), MAX_STEM_BYTES);
    }
}
