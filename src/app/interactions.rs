use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::article::ArticleCounters;
use crate::domain::interaction::{Interaction, InteractionType, ToggleIntent, ToggleOutcome};
use crate::infra::cache::CounterCache;
use crate::infra::store::InteractionStore;

#[derive(Clone)]
pub struct InteractionService {
    store: Arc<dyn InteractionStore>,
    cache: Option<Arc<dyn CounterCache>>,
}

impl InteractionService {
    pub fn new(store: Arc<dyn InteractionStore>, cache: Option<Arc<dyn CounterCache>>) -> Self {
        Self { store, cache }
    }

    pub async fn toggle(
        &self,
        user_id: Uuid,
        article_id: Uuid,
        kind: InteractionType,
        intent: ToggleIntent,
    ) -> Result<Option<ToggleOutcome>> {
        let outcome = self.store.apply(user_id, article_id, kind, intent).await?;

        if let Some(outcome) = &outcome {
            if outcome.changed() {
                self.invalidate(&[article_id]).await;
            }
            tracing::info!(
                user_id = %user_id,
                article_id = %article_id,
                kind = %kind,
                action = outcome.action.as_str(),
                count = outcome.counters.get(kind),
                "interaction applied"
            );
        }

        Ok(outcome)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        article_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Interaction>> {
        self.store.list_for_user(user_id, article_ids).await
    }

    /// Returns the number of interactions removed.
    pub async fn delete(&self, user_id: Uuid, article_id: Option<Uuid>) -> Result<u64> {
        let deleted = self.store.delete_for_user(user_id, article_id).await?;

        let touched: Vec<Uuid> = deleted
            .iter()
            .map(|interaction| interaction.article_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.invalidate(&touched).await;

        tracing::info!(
            user_id = %user_id,
            article_id = ?article_id,
            deleted = deleted.len(),
            "interactions deleted"
        );
        Ok(deleted.len() as u64)
    }

    /// Read-through: the generation is read before the store, so a fill
    /// racing a write is stored under a generation that is already retired.
    pub async fn counters(&self, article_id: Uuid) -> Result<Option<ArticleCounters>> {
        let Some(cache) = &self.cache else {
            return self.store.counters(article_id).await;
        };

        let generation = match cache.generation(article_id).await {
            Ok(generation) => generation,
            Err(err) => {
                tracing::warn!(error = ?err, article_id = %article_id, "counter cache read failed");
                return self.store.counters(article_id).await;
            }
        };

        match cache.get_counters(article_id, generation).await {
            Ok(Some(counters)) => return Ok(Some(counters)),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = ?err, article_id = %article_id, "counter cache read failed");
            }
        }

        let counters = self.store.counters(article_id).await?;

        if let Some(counters) = &counters {
            if let Err(err) = cache.put_counters(counters, generation).await {
                tracing::warn!(error = ?err, article_id = %article_id, "counter cache write failed");
            }
        }

        Ok(counters)
    }

    pub async fn health(&self) -> (bool, bool) {
        let store = self.store.ping().await.is_ok();
        let cache = match &self.cache {
            Some(cache) => cache.ping().await.is_ok(),
            None => true,
        };
        (store, cache)
    }

    async fn invalidate(&self, article_ids: &[Uuid]) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(err) = cache.invalidate_counters(article_ids).await {
            tracing::warn!(error = ?err, "counter cache invalidation failed");
        }
    }
}
