use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::interaction::InteractionType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub likes: i64,
    pub saves: i64,
    pub shares: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Article {
    pub fn counters(&self) -> ArticleCounters {
        ArticleCounters {
            article_id: self.id,
            likes: self.likes,
            saves: self.saves,
            shares: self.shares,
        }
    }
}

/// Denormalized per-article totals. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleCounters {
    pub article_id: Uuid,
    pub likes: i64,
    pub saves: i64,
    pub shares: i64,
}

impl ArticleCounters {
    pub fn empty(article_id: Uuid) -> Self {
        Self {
            article_id,
            likes: 0,
            saves: 0,
            shares: 0,
        }
    }

    pub fn get(&self, kind: InteractionType) -> i64 {
        match kind {
            InteractionType::Like => self.likes,
            InteractionType::Save => self.saves,
            InteractionType::Share => self.shares,
        }
    }

    pub fn set(&mut self, kind: InteractionType, value: i64) {
        *self.slot(kind) = value.max(0);
    }

    pub fn apply_delta(&mut self, kind: InteractionType, delta: i64) {
        let slot = self.slot(kind);
        *slot = (*slot + delta).max(0);
    }

    fn slot(&mut self, kind: InteractionType) -> &mut i64 {
        match kind {
            InteractionType::Like => &mut self.likes,
            InteractionType::Save => &mut self.saves,
            InteractionType::Share => &mut self.shares,
        }
    }
}
