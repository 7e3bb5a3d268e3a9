//! Core types for Trendcast

use serde::{Deserialize, Serialize};

use crate::timeslot::HhMm;

/// One row of the scheduled-post queue.
///
/// Identity is the `(user_id, item_id)` pair. `done` starts false and only
/// ever moves to true; nothing in the API resets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    pub user_id: i64,
    pub item_id: i64,
    pub text: String,
    pub when_hhmm: HhMm,
    pub done: bool,
    pub media: Option<MediaRef>,
}

impl PlanItem {
    pub fn new(user_id: i64, item_id: i64, text: impl Into<String>, when_hhmm: HhMm) -> Self {
        Self {
            user_id,
            item_id,
            text: text.into(),
            when_hhmm,
            done: false,
            media: None,
        }
    }

    pub fn with_media(mut self, media: MediaRef) -> Self {
        self.media = Some(media);
        self
    }
}

/// Opaque reference to an attached media asset.
///
/// `file_id` is whatever the upstream service handed back (a Telegram file
/// id, an IPFS content address); the store returns it unchanged. The two
/// fields travel together, which is how the both-or-neither rule on the
/// nullable columns is kept at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub file_id: String,
    pub kind: String,
}

impl MediaRef {
    pub fn new(file_id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            kind: kind.into(),
        }
    }

    pub fn photo(file_id: impl Into<String>) -> Self {
        Self::new(file_id, "photo")
    }

    pub fn is_photo(&self) -> bool {
        self.kind == "photo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_starts_pending() {
        let item = PlanItem::new(12345, 1, "Test post", "09:00".parse().unwrap());
        assert!(!item.done);
        assert!(item.media.is_none());
    }

    #[test]
    fn test_with_media_attaches_pair() {
        let item = PlanItem::new(1, 1, "post", "10:00".parse().unwrap())
            .with_media(MediaRef::photo("AgACAgIAAxkBAAIB"));
        let media = item.media.unwrap();
        assert_eq!(media.file_id, "AgACAgIAAxkBAAIB");
        assert!(media.is_photo());
    }

    #[test]
    fn test_media_kind_tag() {
        let video = MediaRef::new("QmHash", "video");
        assert!(!video.is_photo());
        assert_eq!(video.kind, "video");
    }
}
