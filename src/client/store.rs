//! Optimistic interaction state for the reader-facing UI.
//!
//! Each `(article, type)` pair runs its own small state machine:
//!
//! ```text
//! Idle/Confirmed/RolledBack --dispatch--> Pending --ok--> Confirmed
//!                                                 \--err--> RolledBack
//! ```
//!
//! The local flag and count flip as soon as a toggle is dispatched. The
//! server's answer then either confirms them or restores the previous values.
//! While a pair is `Pending`, further toggles for it are refused, which is how
//! a button stays disabled until its request settles. Nothing is deduplicated
//! across separate stores (tabs, devices); `hydrate` reloads ground truth.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::client::transport::InteractionTransport;
use crate::domain::article::ArticleCounters;
use crate::domain::interaction::InteractionType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TogglePhase {
    Idle {
        active: bool,
    },
    Pending {
        previous: bool,
        optimistic: bool,
        previous_count: i64,
    },
    Confirmed {
        active: bool,
    },
    RolledBack {
        active: bool,
        error: String,
    },
}

impl TogglePhase {
    /// The flag the UI should render right now.
    pub fn active(&self) -> bool {
        match self {
            Self::Idle { active } | Self::Confirmed { active } | Self::RolledBack { active, .. } => {
                *active
            }
            Self::Pending { optimistic, .. } => *optimistic,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

impl Default for TogglePhase {
    fn default() -> Self {
        Self::Idle { active: false }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    phases: HashMap<InteractionType, TogglePhase>,
    counts: ArticleCounters,
    error: Option<String>,
}

impl Entry {
    fn new(article_id: Uuid) -> Self {
        Self {
            phases: HashMap::new(),
            counts: ArticleCounters::empty(article_id),
            error: None,
        }
    }

    fn phase(&self, kind: InteractionType) -> TogglePhase {
        self.phases.get(&kind).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleInteractionState {
    pub article_id: Uuid,
    pub liked: bool,
    pub saved: bool,
    pub shared: bool,
    pub likes: i64,
    pub saves: i64,
    pub shares: i64,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonState {
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub active: bool,
    pub count: i64,
    pub disabled: bool,
}

#[derive(Clone)]
pub struct OptimisticStore {
    transport: Arc<dyn InteractionTransport>,
    entries: Arc<Mutex<HashMap<Uuid, Entry>>>,
}

impl OptimisticStore {
    pub fn new(transport: Arc<dyn InteractionTransport>) -> Self {
        Self {
            transport,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Flips the flag locally, sends the request, then settles on the server's
    /// answer or rolls back. Returns the settled flag.
    pub async fn toggle(
        &self,
        article_id: Uuid,
        kind: InteractionType,
    ) -> Result<bool, ClientError> {
        let (previous, optimistic) = {
            let mut entries = self.entries.lock();
            let entry = entries
                .entry(article_id)
                .or_insert_with(|| Entry::new(article_id));
            let phase = entry.phase(kind);
            if phase.is_pending() {
                return Err(ClientError::InFlight { article_id, kind });
            }

            let previous = phase.active();
            let optimistic = !previous;
            let previous_count = entry.counts.get(kind);
            entry.phases.insert(
                kind,
                TogglePhase::Pending {
                    previous,
                    optimistic,
                    previous_count,
                },
            );
            entry
                .counts
                .apply_delta(kind, if optimistic { 1 } else { -1 });
            entry.error = None;
            (previous, optimistic)
        };

        let result = self.transport.toggle(article_id, kind).await;

        let mut entries = self.entries.lock();
        let entry = entries
            .entry(article_id)
            .or_insert_with(|| Entry::new(article_id));
        let previous_count = match entry.phase(kind) {
            TogglePhase::Pending { previous_count, .. } => previous_count,
            _ => entry.counts.get(kind),
        };

        match result {
            Ok(server) => {
                entry
                    .phases
                    .insert(kind, TogglePhase::Confirmed { active: server.active });
                // Only this kind's count is taken from the response. Responses
                // for other kinds may settle out of order and carry older values.
                match server.counters {
                    Some(counters) => entry.counts.set(kind, counters.get(kind)),
                    None if server.active != optimistic => {
                        entry.counts.apply_delta(kind, if server.active { 1 } else { -1 });
                    }
                    None => {}
                }
                Ok(server.active)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    article_id = %article_id,
                    kind = %kind,
                    "interaction toggle failed, rolling back"
                );
                let message = err.to_string();
                entry.phases.insert(
                    kind,
                    TogglePhase::RolledBack {
                        active: previous,
                        error: message.clone(),
                    },
                );
                entry.counts.set(kind, previous_count);
                entry.error = Some(message);
                Err(err)
            }
        }
    }

    /// Reloads flags and counts from the server. Pairs with a request in
    /// flight keep their pending state.
    pub async fn hydrate(&self, article_ids: &[Uuid]) -> Result<(), ClientError> {
        if article_ids.is_empty() {
            return Ok(());
        }

        let interactions = self.transport.fetch(article_ids).await?;
        let mut counters = Vec::with_capacity(article_ids.len());
        for article_id in article_ids {
            counters.push(self.transport.counters(*article_id).await?);
        }

        let present: HashSet<(Uuid, InteractionType)> = interactions
            .iter()
            .map(|interaction| (interaction.article_id, interaction.kind))
            .collect();

        let mut entries = self.entries.lock();
        for counts in counters {
            let article_id = counts.article_id;
            let entry = entries
                .entry(article_id)
                .or_insert_with(|| Entry::new(article_id));
            for kind in InteractionType::ALL {
                if entry.phase(kind).is_pending() {
                    continue;
                }
                entry.phases.insert(
                    kind,
                    TogglePhase::Idle {
                        active: present.contains(&(article_id, kind)),
                    },
                );
                entry.counts.set(kind, counts.get(kind));
            }
            entry.error = None;
        }
        Ok(())
    }

    pub fn phase(&self, article_id: Uuid, kind: InteractionType) -> TogglePhase {
        self.entries
            .lock()
            .get(&article_id)
            .map(|entry| entry.phase(kind))
            .unwrap_or_default()
    }

    pub fn snapshot(&self, article_id: Uuid) -> ArticleInteractionState {
        let entries = self.entries.lock();
        let entry = entries
            .get(&article_id)
            .cloned()
            .unwrap_or_else(|| Entry::new(article_id));

        ArticleInteractionState {
            article_id,
            liked: entry.phase(InteractionType::Like).active(),
            saved: entry.phase(InteractionType::Save).active(),
            shared: entry.phase(InteractionType::Share).active(),
            likes: entry.counts.likes,
            saves: entry.counts.saves,
            shares: entry.counts.shares,
            is_loading: entry.phases.values().any(TogglePhase::is_pending),
            error: entry.error,
        }
    }

    /// One view model per interaction button, in like/save/share order.
    pub fn buttons(&self, article_id: Uuid) -> Vec<ButtonState> {
        let entries = self.entries.lock();
        let entry = entries.get(&article_id);

        InteractionType::ALL
            .into_iter()
            .map(|kind| {
                let phase = entry.map(|entry| entry.phase(kind)).unwrap_or_default();
                ButtonState {
                    kind,
                    active: phase.active(),
                    count: entry.map(|entry| entry.counts.get(kind)).unwrap_or(0),
                    disabled: phase.is_pending(),
                }
            })
            .collect()
    }

    pub fn clear_error(&self, article_id: Uuid) {
        if let Some(entry) = self.entries.lock().get_mut(&article_id) {
            entry.error = None;
        }
    }
}
