//! Persistence seam for interactions.
//!
//! Every implementation runs the same read-modify-write: look up the
//! `(user, article, type)` row, then insert or delete it and move the
//! matching article counter by one in the same atomic unit. Callers never
//! need to know which implementation is active.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::article::ArticleCounters;
use crate::domain::interaction::{Interaction, InteractionType, ToggleIntent, ToggleOutcome};

#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn find(
        &self,
        user_id: Uuid,
        article_id: Uuid,
        kind: InteractionType,
    ) -> Result<Option<Interaction>>;

    /// Applies `intent` atomically. Returns `None` when the article does not exist.
    async fn apply(
        &self,
        user_id: Uuid,
        article_id: Uuid,
        kind: InteractionType,
        intent: ToggleIntent,
    ) -> Result<Option<ToggleOutcome>>;

    /// Newest first. `article_ids` narrows the result when present.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        article_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Interaction>>;

    /// Deletes the user's interactions and decrements the matching counters.
    /// Returns the deleted rows.
    async fn delete_for_user(
        &self,
        user_id: Uuid,
        article_id: Option<Uuid>,
    ) -> Result<Vec<Interaction>>;

    async fn counters(&self, article_id: Uuid) -> Result<Option<ArticleCounters>>;

    /// Recomputes every article counter from the interaction rows.
    /// Returns how many articles had drifted.
    async fn reconcile_counters(&self) -> Result<u64>;

    async fn ping(&self) -> Result<()>;
}
