//! Study items
//!
//! Identity of the things a learner studies, and the per-item mastery record.

mod progress;

pub use progress::StudyItemProgress;

use serde::{Deserialize, Serialize};

/// Learner identifier
pub type LearnerId = i64;

/// Catalog identifier of a study item, unique within its [`ItemKind`]
pub type ItemId = i64;

// ============================================================================
// ITEM KINDS
// ============================================================================

/// Kinds of study items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A single kanji character
    Kanji,
    /// A word or expression
    Vocabulary,
    /// A grammar pattern
    Grammar,
    /// A hiragana or katakana character
    Kana,
}

impl ItemKind {
    /// Every kind, in display order
    pub const ALL: [ItemKind; 4] = [
        ItemKind::Kanji,
        ItemKind::Vocabulary,
        ItemKind::Grammar,
        ItemKind::Kana,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Kanji => "kanji",
            ItemKind::Vocabulary => "vocabulary",
            ItemKind::Grammar => "grammar",
            ItemKind::Kana => "kana",
        }
    }

    /// Capitalised name used in statistics keys
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Kanji => "Kanji",
            ItemKind::Vocabulary => "Vocabulary",
            ItemKind::Grammar => "Grammar",
            ItemKind::Kana => "Kana",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kanji" => Ok(ItemKind::Kanji),
            "vocabulary" | "vocab" => Ok(ItemKind::Vocabulary),
            "grammar" => Ok(ItemKind::Grammar),
            "kana" => Ok(ItemKind::Kana),
            _ => Err(format!("Unknown item kind: {}", s)),
        }
    }
}

// ============================================================================
// ITEM KEY
// ============================================================================

/// (learner, kind, item) - shared identity of progress and queue records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemKey {
    pub learner_id: LearnerId,
    pub kind: ItemKind,
    pub item_id: ItemId,
}

impl ItemKey {
    pub fn new(learner_id: LearnerId, kind: ItemKind, item_id: ItemId) -> Self {
        Self {
            learner_id,
            kind,
            item_id,
        }
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.learner_id, self.kind, self.item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_roundtrip() {
        for kind in ItemKind::ALL {
            assert_eq!(kind.as_str().parse::<ItemKind>().unwrap(), kind);
            assert_eq!(kind.label().parse::<ItemKind>().unwrap(), kind);
        }
        assert!("HeiBan".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_item_key_display() {
        let key = ItemKey::new(7, ItemKind::Grammar, 42);
        assert_eq!(key.to_string(), "7:grammar:42");
    }
}
