use crate::domains::condominium::types::CondominiumRecord;
use crate::domains::core::cancellation::CancellationToken;
use crate::domains::core::remote::{path_segment, ApiClient};
use crate::errors::{DomainResult, RemoteError};
use async_trait::async_trait;
use log::debug;
use serde_json::Value;

/// Trait defining remote condominium lookups
#[async_trait]
pub trait CondominiumRepository: Send + Sync {
    /// `None` when the backend answered with an empty (or non-collection) body.
    async fn find_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<CondominiumRecord>>;
}

/// HTTP implementation for CondominiumRepository
#[derive(Debug, Clone)]
pub struct ApiCondominiumRepository {
    client: ApiClient,
}

impl ApiCondominiumRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

/// The lookup answers with a single-element collection; anything else means "no match".
pub fn first_record(body: Value) -> DomainResult<Option<CondominiumRecord>> {
    match body {
        Value::Array(items) => match items.into_iter().next() {
            Some(first) => serde_json::from_value(first)
                .map(Some)
                .map_err(|e| RemoteError::InvalidResponse(e.to_string()).into()),
            None => Ok(None),
        },
        other => {
            debug!("Condominium lookup returned a non-collection body: {}", other);
            Ok(None)
        }
    }
}

#[async_trait]
impl CondominiumRepository for ApiCondominiumRepository {
    async fn find_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<CondominiumRecord>> {
        let path = format!("/condominiums/{}", path_segment(id));
        let body: Value = self.client.send_json(self.client.get(&path), Some(cancel)).await?;
        first_record(body)
    }
}

/// Canned lookup bodies for tests; lookups can be held at a gate.
#[cfg(test)]
pub struct MockCondominiumRepository {
    bodies: std::sync::Mutex<std::collections::HashMap<String, DomainResult<Value>>>,
    gates: std::sync::Mutex<std::collections::HashMap<String, std::sync::Arc<tokio::sync::Notify>>>,
    pub entered: std::sync::Arc<tokio::sync::Notify>,
}

#[cfg(test)]
impl MockCondominiumRepository {
    pub fn new() -> Self {
        Self {
            bodies: Default::default(),
            gates: Default::default(),
            entered: Default::default(),
        }
    }

    pub fn with_body(self, id: &str, body: Value) -> Self {
        self.bodies.lock().unwrap().insert(id.to_string(), Ok(body));
        self
    }

    pub fn with_error(self, id: &str, error: crate::errors::DomainError) -> Self {
        self.bodies.lock().unwrap().insert(id.to_string(), Err(error));
        self
    }

    pub fn gate(&self, id: &str) -> std::sync::Arc<tokio::sync::Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
#[async_trait]
impl CondominiumRepository for MockCondominiumRepository {
    async fn find_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<CondominiumRecord>> {
        self.entered.notify_one();
        let gate = self.gates.lock().unwrap().get(id).cloned();
        if let Some(gate) = gate {
            tokio::select! {
                _ = cancel.cancelled() => return Err(crate::errors::DomainError::Aborted),
                _ = gate.notified() => {}
            }
        }
        let body = self
            .bodies
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Ok(Value::Array(Vec::new())))?;
        first_record(body)
    }
}
