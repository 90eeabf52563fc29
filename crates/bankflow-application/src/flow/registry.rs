use bankflow_core::config::DEFAULT_MAX_FLOWS;
use bankflow_core::session::{FlowState, Session};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-flight consent flows, keyed by reference id.
///
/// Each end user gets their own [`Session`], so concurrent flows never share
/// agreement or requisition state. Sessions are cloned in and out; the lock is
/// never held across an upstream call.
///
/// The registry holds at most `capacity` flows. Registering a new flow when full
/// evicts the oldest unfinished flow, or the oldest completed one when every
/// flow is completed.
#[derive(Clone)]
pub struct FlowRegistry {
    flows: Arc<RwLock<HashMap<String, Session>>>,
    capacity: usize,
}

impl Default for FlowRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_FLOWS)
    }
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry bounded to `capacity` flows (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            flows: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Gets a copy of the flow registered under `reference`.
    pub async fn get(&self, reference: &str) -> Option<Session> {
        let flows = self.flows.read().await;
        flows.get(reference).cloned()
    }

    /// Stores `session` under its current reference id.
    ///
    /// Sessions without a reference id cannot be looked up and are ignored.
    pub async fn insert(&self, session: Session) {
        let Some(reference) = session.reference_id.clone() else {
            return;
        };
        let mut flows = self.flows.write().await;
        if !flows.contains_key(&reference) {
            while flows.len() >= self.capacity {
                let Some(evicted) = eviction_candidate(&flows) else {
                    break;
                };
                flows.remove(&evicted);
                tracing::debug!("Flow registry full, evicted one flow");
            }
        }
        flows.insert(reference, session);
    }

    pub async fn remove(&self, reference: &str) {
        let mut flows = self.flows.write().await;
        flows.remove(reference);
    }

    /// Drops every flow whose reference is older than `ttl` at `now`.
    pub async fn prune_expired(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let mut flows = self.flows.write().await;
        let before = flows.len();
        flows.retain(|_, session| !session.is_expired(ttl, now));
        before - flows.len()
    }

    /// Returns the number of registered flows.
    pub async fn len(&self) -> usize {
        let flows = self.flows.read().await;
        flows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Oldest unfinished flow, else oldest completed flow.
fn eviction_candidate(flows: &HashMap<String, Session>) -> Option<String> {
    flows
        .iter()
        .min_by_key(|(_, session)| {
            (
                session.state == FlowState::Completed,
                session.reference_issued_at,
            )
        })
        .map(|(reference, _)| reference.clone())
}
