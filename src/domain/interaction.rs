use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::article::ArticleCounters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Like,
    Save,
    Share,
}

impl InteractionType {
    pub const ALL: [InteractionType; 3] = [Self::Like, Self::Save, Self::Share];

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "like" => Some(Self::Like),
            "save" => Some(Self::Save),
            "share" => Some(Self::Share),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Save => "save",
            Self::Share => "share",
        }
    }

    /// Denormalized counter column on `articles` tracking this type.
    pub fn counter_column(&self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Save => "saves",
            Self::Share => "shares",
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub article_id: Uuid,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleIntent {
    Toggle,
    Add,
    Remove,
}

impl ToggleIntent {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "toggle" => Some(Self::Toggle),
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }

    /// Target existence for a row that currently does (or does not) exist.
    /// `None` when the row is already where the intent wants it.
    pub fn resolve(&self, existing: bool) -> Option<bool> {
        match (self, existing) {
            (Self::Toggle, current) => Some(!current),
            (Self::Add, false) => Some(true),
            (Self::Remove, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
    Unchanged,
}

impl ToggleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub active: bool,
    pub action: ToggleAction,
    pub counters: ArticleCounters,
}

impl ToggleOutcome {
    pub fn changed(&self) -> bool {
        self.action != ToggleAction::Unchanged
    }
}
