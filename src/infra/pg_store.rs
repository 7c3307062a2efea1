use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::article::ArticleCounters;
use crate::domain::interaction::{
    Interaction, InteractionType, ToggleAction, ToggleIntent, ToggleOutcome,
};
use crate::infra::db::Db;
use crate::infra::store::InteractionStore;

#[derive(Clone)]
pub struct PgInteractionStore {
    db: Db,
}

impl PgInteractionStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InteractionStore for PgInteractionStore {
    async fn find(
        &self,
        user_id: Uuid,
        article_id: Uuid,
        kind: InteractionType,
    ) -> Result<Option<Interaction>> {
        let row = sqlx::query(
            "SELECT id, user_id, article_id, type, created_at \
             FROM interactions \
             WHERE user_id = $1 AND article_id = $2 AND type = $3",
        )
        .bind(user_id)
        .bind(article_id)
        .bind(kind.as_db())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(interaction_from_row).transpose()
    }

    async fn apply(
        &self,
        user_id: Uuid,
        article_id: Uuid,
        kind: InteractionType,
        intent: ToggleIntent,
    ) -> Result<Option<ToggleOutcome>> {
        let mut tx = self.db.pool().begin().await?;

        // Row lock on the article serializes concurrent toggles touching its counters.
        let article = sqlx::query(
            "SELECT id, likes, saves, shares FROM articles WHERE id = $1 FOR UPDATE",
        )
        .bind(article_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(article) = article else {
            tx.rollback().await?;
            return Ok(None);
        };

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM interactions \
             WHERE user_id = $1 AND article_id = $2 AND type = $3",
        )
        .bind(user_id)
        .bind(article_id)
        .bind(kind.as_db())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(target) = intent.resolve(existing.is_some()) else {
            let counters = counters_from_row(&article)?;
            tx.rollback().await?;
            return Ok(Some(ToggleOutcome {
                active: existing.is_some(),
                action: ToggleAction::Unchanged,
                counters,
            }));
        };

        let (action, delta) = if target {
            let inserted = sqlx::query(
                "INSERT INTO interactions (user_id, article_id, type) VALUES ($1, $2, $3) \
                 ON CONFLICT (user_id, article_id, type) DO NOTHING",
            )
            .bind(user_id)
            .bind(article_id)
            .bind(kind.as_db())
            .execute(&mut *tx)
            .await?;
            let delta = if inserted.rows_affected() > 0 { 1 } else { 0 };
            (ToggleAction::Added, delta)
        } else {
            let deleted = sqlx::query(
                "DELETE FROM interactions \
                 WHERE user_id = $1 AND article_id = $2 AND type = $3",
            )
            .bind(user_id)
            .bind(article_id)
            .bind(kind.as_db())
            .execute(&mut *tx)
            .await?;
            let delta = -(deleted.rows_affected() as i64);
            (ToggleAction::Removed, delta)
        };

        let counters = adjust_counter(&mut tx, article_id, kind, delta).await?;
        tx.commit().await?;

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
        let rows = match article_ids {
            Some(article_ids) => {
                sqlx::query(
                    "SELECT id, user_id, article_id, type, created_at \
                     FROM interactions \
                     WHERE user_id = $1 AND article_id = ANY($2) \
                     ORDER BY created_at DESC, id DESC",
                )
                .bind(user_id)
                .bind(article_ids)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, user_id, article_id, type, created_at \
                     FROM interactions \
                     WHERE user_id = $1 \
                     ORDER BY created_at DESC, id DESC",
                )
                .bind(user_id)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        rows.into_iter().map(interaction_from_row).collect()
    }

    async fn delete_for_user(
        &self,
        user_id: Uuid,
        article_id: Option<Uuid>,
    ) -> Result<Vec<Interaction>> {
        let mut tx = self.db.pool().begin().await?;

        // Same lock order as `apply`: article rows before interaction rows.
        sqlx::query(
            "SELECT id FROM articles \
             WHERE id IN ( \
                 SELECT article_id FROM interactions \
                 WHERE user_id = $1 AND ($2::uuid IS NULL OR article_id = $2) \
             ) \
             ORDER BY id \
             FOR UPDATE",
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_all(&mut *tx)
        .await?;

        let rows = sqlx::query(
            "DELETE FROM interactions \
             WHERE user_id = $1 AND ($2::uuid IS NULL OR article_id = $2) \
             RETURNING id, user_id, article_id, type, created_at",
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_all(&mut *tx)
        .await?;

        let deleted = rows
            .into_iter()
            .map(interaction_from_row)
            .collect::<Result<Vec<_>>>()?;

        for interaction in &deleted {
            adjust_counter(&mut tx, interaction.article_id, interaction.kind, -1).await?;
        }

        tx.commit().await?;
        Ok(deleted)
    }

    async fn counters(&self, article_id: Uuid) -> Result<Option<ArticleCounters>> {
        let row = sqlx::query("SELECT id, likes, saves, shares FROM articles WHERE id = $1")
            .bind(article_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(counters_from_row).transpose()
    }

    async fn reconcile_counters(&self) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;

        // Blocks toggles (which lock their article row first) for the duration,
        // so the counts read below cannot go stale before the update lands.
        sqlx::query("LOCK TABLE articles IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "WITH actual AS ( \
                 SELECT a.id, \
                        COUNT(i.id) FILTER (WHERE i.type = 'like') AS likes, \
                        COUNT(i.id) FILTER (WHERE i.type = 'save') AS saves, \
                        COUNT(i.id) FILTER (WHERE i.type = 'share') AS shares \
                 FROM articles a \
                 LEFT JOIN interactions i ON i.article_id = a.id \
                 GROUP BY a.id \
             ) \
             UPDATE articles AS a \
             SET likes = actual.likes, saves = actual.saves, shares = actual.shares \
             FROM actual \
             WHERE a.id = actual.id \
               AND (a.likes, a.saves, a.shares) \
                   IS DISTINCT FROM (actual.likes, actual.saves, actual.shares)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }
}

async fn adjust_counter(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    article_id: Uuid,
    kind: InteractionType,
    delta: i64,
) -> Result<ArticleCounters> {
    // Column name comes from a closed enum, never from input.
    let column = kind.counter_column();
    let sql = format!(
        "UPDATE articles SET {column} = GREATEST({column} + $2, 0) \
         WHERE id = $1 \
         RETURNING id, likes, saves, shares"
    );
    let row = sqlx::query(&sql)
        .bind(article_id)
        .bind(delta)
        .fetch_one(&mut **tx)
        .await?;
    counters_from_row(&row)
}

fn counters_from_row(row: &PgRow) -> Result<ArticleCounters> {
    Ok(ArticleCounters {
        article_id: row.try_get("id")?,
        likes: row.try_get("likes")?,
        saves: row.try_get("saves")?,
        shares: row.try_get("shares")?,
    })
}

fn interaction_from_row(row: PgRow) -> Result<Interaction> {
    let kind: String = row.try_get("type")?;
    let kind = InteractionType::from_db(&kind)
        .ok_or_else(|| anyhow::anyhow!("unknown interaction type in database: {}", kind))?;
    Ok(Interaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        article_id: row.try_get("article_id")?,
        kind,
        created_at: row.try_get("created_at")?,
    })
}
