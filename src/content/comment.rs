use super::{ContentShape, EntityKind, require_text};
use crate::core::{StoreResult, UserId};
use serde::{Deserialize, Serialize};

const SUMMARY_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Comment {
    pub body: String,
    pub mentions: Vec<UserId>,
}

impl ContentShape for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn validate(&self) -> StoreResult<()> {
        require_text("comment body", &self.body)
    }

    fn display_summary(&self) -> Option<String> {
        let body = self.body.trim();
        if body.chars().count() <= SUMMARY_CHARS {
            return Some(body.to_string());
        }
        let mut summary: String = body.chars().take(SUMMARY_CHARS).collect();
        summary.push('…');
        Some(summary)
    }
}
