//! Read-through cache for article counters.
//!
//! Entries are keyed by a per-article generation. A write bumps the
//! generation instead of deleting the entry, so a fill that read the store
//! before the write lands under a generation no reader asks for again.

use anyhow::Result;
use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use crate::domain::article::ArticleCounters;

#[async_trait]
pub trait CounterCache: Send + Sync {
    /// Current generation for the article, 0 when none has been recorded.
    async fn generation(&self, article_id: Uuid) -> Result<u64>;

    async fn get_counters(
        &self,
        article_id: Uuid,
        generation: u64,
    ) -> Result<Option<ArticleCounters>>;

    async fn put_counters(&self, counters: &ArticleCounters, generation: u64) -> Result<()>;

    /// Moves every listed article to a fresh generation.
    async fn invalidate_counters(&self, article_ids: &[Uuid]) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    counter_ttl_seconds: u64,
}

impl RedisCache {
    pub async fn connect(redis_url: &str, counter_ttl_seconds: u64) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(Self {
            client,
            counter_ttl_seconds,
        })
    }
}

#[async_trait]
impl CounterCache for RedisCache {
    async fn generation(&self, article_id: Uuid) -> Result<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let generation: Option<u64> = conn.get(generation_key(article_id)).await?;
        Ok(generation.unwrap_or(0))
    }

    async fn get_counters(
        &self,
        article_id: Uuid,
        generation: u64,
    ) -> Result<Option<ArticleCounters>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(counters_key(article_id, generation)).await?;
        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw).ok()),
            None => Ok(None),
        }
    }

    async fn put_counters(&self, counters: &ArticleCounters, generation: u64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw = serde_json::to_string(counters)?;
        conn.set_ex::<_, _, ()>(
            counters_key(counters.article_id, generation),
            raw,
            self.counter_ttl_seconds,
        )
        .await?;
        Ok(())
    }

    async fn invalidate_counters(&self, article_ids: &[Uuid]) -> Result<()> {
        if article_ids.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        for id in article_ids {
            pipe.incr(generation_key(*id), 1).ignore();
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

fn generation_key(article_id: Uuid) -> String {
    format!("article:{}:counters:gen", article_id)
}

fn counters_key(article_id: Uuid, generation: u64) -> String {
    format!("article:{}:counters:{}", article_id, generation)
}
