//! Change detection for knowledge base snapshots
//!
//! Two base sets with the same fingerprint are treated as identical, so the
//! owner never pushes a snapshot the replica already holds.

use crate::domain::knowledge_base::KnowledgeBase;

use super::selection::AllowList;

/// Marker used in place of the base list when nothing is selected
pub const EMPTY_MARKER: &str = "#EMPTY";

const SEPARATOR: &str = "|";

/// Compute the fingerprint of the bases selected by `allow_list`
///
/// Format: `<selection>|<id:updatedAt:version:itemCount>|...` where the
/// selection is the sorted allow-list (or `ALL`) and `updatedAt` is in
/// milliseconds since the epoch.
pub fn fingerprint(bases: &[KnowledgeBase], allow_list: &AllowList) -> String {
    let selected = allow_list.select(bases);

    let body = if selected.is_empty() {
        EMPTY_MARKER.to_string()
    } else {
        selected
            .iter()
            .map(|base| {
                format!(
                    "{}:{}:{}:{}",
                    base.id,
                    base.updated_at.timestamp_millis(),
                    base.version,
                    base.item_count()
                )
            })
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    };

    [allow_list.signature(), body].join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::domain::knowledge_base::{ClientDescriptor, KnowledgeItem, KnowledgeItemKind};

    fn base(id: &str, version: u64) -> KnowledgeBase {
        let mut base = KnowledgeBase::new(
            id,
            id,
            768,
            ClientDescriptor::new("openai", "text-embedding-3-small", "https://api.openai.com/v1"),
        );
        base.updated_at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        base.version = version;
        base
    }

    #[test]
    fn test_fingerprint_format() {
        let bases = vec![base("a", 1), base("b", 3)];

        assert_eq!(
            fingerprint(&bases, &AllowList::all()),
            "ALL|a:1700000000000:1:0|b:1700000000000:3:0"
        );
    }

    #[test]
    fn test_fingerprint_with_allow_list() {
        let bases = vec![base("a", 1), base("b", 1), base("c", 1)];
        let allow = AllowList::new(["c", "a"]);

        assert_eq!(
            fingerprint(&bases, &allow),
            "a,c|a:1700000000000:1:0|c:1700000000000:1:0"
        );
    }

    #[test]
    fn test_empty_selection_marker() {
        let bases = vec![base("a", 1)];

        assert_eq!(fingerprint(&[], &AllowList::all()), "ALL|#EMPTY");
        assert_eq!(fingerprint(&bases, &AllowList::new(["z"])), "z|#EMPTY");
    }

    #[test]
    fn test_fingerprint_changes_with_items_and_version() {
        let original = vec![base("a", 1)];

        let mut with_item = original.clone();
        with_item[0]
            .items
            .push(KnowledgeItem::new("i1", KnowledgeItemKind::Note, "note"));

        let mut bumped = original.clone();
        bumped[0].version = 2;

        let allow = AllowList::all();
        assert_ne!(fingerprint(&original, &allow), fingerprint(&with_item, &allow));
        assert_ne!(fingerprint(&original, &allow), fingerprint(&bumped, &allow));
    }

    #[test]
    fn test_fingerprint_ignores_unselected_changes() {
        let allow = AllowList::new(["a"]);
        let before = vec![base("a", 1), base("b", 1)];
        let after = vec![base("a", 1), base("b", 7)];

        assert_eq!(fingerprint(&before, &allow), fingerprint(&after, &allow));
    }
}
