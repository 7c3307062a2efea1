use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::article::{Article, ArticleCounters};
use crate::domain::interaction::{
    Interaction, InteractionType, ToggleAction, ToggleIntent, ToggleOutcome,
};
use crate::infra::store::InteractionStore;

type InteractionKey = (Uuid, Uuid, InteractionType);

#[derive(Default)]
struct Tables {
    articles: HashMap<Uuid, Article>,
    interactions: HashMap<InteractionKey, (u64, Interaction)>,
    next_seq: u64,
}

/// In-process store. One lock covers both tables, so every call is atomic
/// the same way a database transaction would be.
#[derive(Clone, Default)]
pub struct MemoryInteractionStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_article(&self, title: impl Into<String>) -> Article {
        let article = Article {
            id: Uuid::new_v4(),
            title: title.into(),
            likes: 0,
            saves: 0,
            shares: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables
            .lock()
            .articles
            .insert(article.id, article.clone());
        article
    }

    /// Overwrites an article's counters without touching interaction rows.
    pub fn set_counters(&self, counters: ArticleCounters) -> bool {
        let mut tables = self.tables.lock();
        match tables.articles.get_mut(&counters.article_id) {
            Some(article) => {
                article.likes = counters.likes;
                article.saves = counters.saves;
                article.shares = counters.shares;
                true
            }
            None => false,
        }
    }
}

impl Tables {
    fn adjust(&mut self, article_id: Uuid, kind: InteractionType, delta: i64) -> Option<ArticleCounters> {
        let article = self.articles.get_mut(&article_id)?;
        let mut counters = article.counters();
        counters.apply_delta(kind, delta);
        article.likes = counters.likes;
        article.saves = counters.saves;
        article.shares = counters.shares;
        Some(counters)
    }
}

#[async_trait]
impl InteractionStore for MemoryInteractionStore {
    async fn find(
        &self,
        user_id: Uuid,
        article_id: Uuid,
        kind: InteractionType,
    ) -> Result<Option<Interaction>> {
        let tables = self.tables.lock();
        Ok(tables
            .interactions
            .get(&(user_id, article_id, kind))
            .map(|(_, interaction)| interaction.clone()))
    }

    async fn apply(
        &self,
        user_id: Uuid,
        article_id: Uuid,
        kind: InteractionType,
        intent: ToggleIntent,
    ) -> Result<Option<ToggleOutcome>> {
        let mut tables = self.tables.lock();
        let Some(article) = tables.articles.get(&article_id) else {
            return Ok(None);
        };
        let current = article.counters();

        let key = (user_id, article_id, kind);
        let existing = tables.interactions.contains_key(&key);

        let Some(target) = intent.resolve(existing) else {
            return Ok(Some(ToggleOutcome {
                active: existing,
                action: ToggleAction::Unchanged,
                counters: current,
            }));
        };

        let (action, delta) = if target {
            let seq = tables.next_seq;
            tables.next_seq += 1;
            let interaction = Interaction {
                id: Uuid::new_v4(),
                user_id,
                article_id,
                kind,
                created_at: OffsetDateTime::now_utc(),
            };
            tables.interactions.insert(key, (seq, interaction));
            (ToggleAction::Added, 1)
        } else {
            tables.interactions.remove(&key);
            (ToggleAction::Removed, -1)
        };

        let counters = tables.adjust(article_id, kind, delta).unwrap_or(current);
        Ok(Some(ToggleOutcome {
            active: target,
            action,
            counters,
        }))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        article_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Interaction>> {
        let tables = self.tables.lock();
        let mut matched: Vec<&(u64, Interaction)> = tables
            .interactions
            .values()
            .filter(|(_, interaction)| interaction.user_id == user_id)
            .filter(|(_, interaction)| {
                article_ids.map_or(true, |ids| ids.contains(&interaction.article_id))
            })
            .collect();
        matched.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(matched.into_iter().map(|(_, i)| i.clone()).collect())
    }

    async fn delete_for_user(
        &self,
        user_id: Uuid,
        article_id: Option<Uuid>,
    ) -> Result<Vec<Interaction>> {
        let mut tables = self.tables.lock();
        let keys: Vec<InteractionKey> = tables
            .interactions
            .keys()
            .filter(|(user, article, _)| {
                *user == user_id && article_id.map_or(true, |id| id == *article)
            })
            .copied()
            .collect();

        let mut deleted = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some((_, interaction)) = tables.interactions.remove(&key) {
                tables.adjust(interaction.article_id, interaction.kind, -1);
                deleted.push(interaction);
            }
        }
        Ok(deleted)
    }

    async fn counters(&self, article_id: Uuid) -> Result<Option<ArticleCounters>> {
        let tables = self.tables.lock();
        Ok(tables.articles.get(&article_id).map(Article::counters))
    }

    async fn reconcile_counters(&self) -> Result<u64> {
        let mut tables = self.tables.lock();
        let mut actual: HashMap<Uuid, ArticleCounters> = tables
            .articles
            .keys()
            .map(|id| (*id, ArticleCounters::empty(*id)))
            .collect();
        for (_, interaction) in tables.interactions.values() {
            if let Some(counters) = actual.get_mut(&interaction.article_id) {
                counters.apply_delta(interaction.kind, 1);
            }
        }

        let mut fixed = 0;
        for (id, counters) in actual {
            if let Some(article) = tables.articles.get_mut(&id) {
                if article.counters() != counters {
                    article.likes = counters.likes;
                    article.saves = counters.saves;
                    article.shares = counters.shares;
                    fixed += 1;
                }
            }
        }
        Ok(fixed)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
