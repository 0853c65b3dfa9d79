use crate::domains::activity::types::{
    Activity, ActivityListing, CreatePayload, CreateRequestBody, UpdatePayload,
};
use crate::domains::core::cancellation::CancellationToken;
use crate::domains::core::remote::{path_segment, ApiClient};
use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use log::debug;

/// Trait defining remote activity operations
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// All activities of a condominium. Honors `cancel` while the request is pending.
    async fn find_by_condominium(
        &self,
        condominium_id: &str,
        cancel: &CancellationToken,
    ) -> DomainResult<ActivityListing>;

    async fn create(
        &self,
        payload: &CreatePayload,
        condominium_id: &str,
    ) -> DomainResult<Activity>;

    async fn update(
        &self,
        id: &str,
        payload: &UpdatePayload,
    ) -> DomainResult<Activity>;
}

/// HTTP implementation for ActivityRepository
#[derive(Debug, Clone)]
pub struct ApiActivityRepository {
    client: ApiClient,
}

impl ApiActivityRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActivityRepository for ApiActivityRepository {
    async fn find_by_condominium(
        &self,
        condominium_id: &str,
        cancel: &CancellationToken,
    ) -> DomainResult<ActivityListing> {
        debug!("GET /activities for condominium {}", condominium_id);
        let request = self
            .client
            .get("/activities")
            .query(&[("condominiumId", condominium_id)]);
        self.client.send_json(request, Some(cancel)).await
    }

    async fn create(
        &self,
        payload: &CreatePayload,
        condominium_id: &str,
    ) -> DomainResult<Activity> {
        let body = CreateRequestBody {
            payload,
            condominium_id,
        };
        let request = self.client.post("/activities").json(&body);
        self.client.send_json(request, None).await
    }

    async fn update(
        &self,
        id: &str,
        payload: &UpdatePayload,
    ) -> DomainResult<Activity> {
        let path = format!("/activities/{}", path_segment(id));
        let request = self.client.patch(&path).json(payload);
        self.client
            .send_json(request, None)
            .await
            .map_err(|e| match e {
                DomainError::Remote(remote) if remote.is_not_found() => {
                    DomainError::EntityNotFound("Activity".to_string(), id.to_string())
                }
                other => other,
            })
    }
}

/// In-memory repository for tests. Loads can be held at a gate to simulate slow responses.
#[cfg(test)]
pub struct MockActivityRepository {
    listings: std::sync::Mutex<std::collections::HashMap<String, ActivityListing>>,
    gates: std::sync::Mutex<std::collections::HashMap<String, std::sync::Arc<tokio::sync::Notify>>>,
    /// Notified every time a load starts
    pub entered: std::sync::Arc<tokio::sync::Notify>,
    honor_cancellation: std::sync::atomic::AtomicBool,
    load_calls: std::sync::atomic::AtomicUsize,
    load_error: std::sync::Mutex<Option<DomainError>>,
    write_gate: std::sync::Mutex<Option<std::sync::Arc<tokio::sync::Notify>>>,
    /// Notified every time a create or update starts
    pub write_entered: std::sync::Arc<tokio::sync::Notify>,
    write_error: std::sync::Mutex<Option<DomainError>>,
    created: std::sync::Mutex<Vec<serde_json::Value>>,
    updated: std::sync::Mutex<Vec<(String, serde_json::Value)>>,
}

#[cfg(test)]
impl MockActivityRepository {
    pub fn new() -> Self {
        Self {
            listings: Default::default(),
            gates: Default::default(),
            entered: Default::default(),
            honor_cancellation: std::sync::atomic::AtomicBool::new(true),
            load_calls: Default::default(),
            load_error: Default::default(),
            write_gate: Default::default(),
            write_entered: Default::default(),
            write_error: Default::default(),
            created: Default::default(),
            updated: Default::default(),
        }
    }

    pub fn with_listing(self, condominium_id: &str, listing: ActivityListing) -> Self {
        self.set_listing(condominium_id, listing);
        self
    }

    pub fn set_listing(&self, condominium_id: &str, listing: ActivityListing) {
        self.listings
            .lock()
            .unwrap()
            .insert(condominium_id.to_string(), listing);
    }

    /// Hold loads for `condominium_id` until the returned `Notify` is signalled.
    pub fn gate(&self, condominium_id: &str) -> std::sync::Arc<tokio::sync::Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(condominium_id.to_string())
            .or_default()
            .clone()
    }

    /// When false, a gated load ignores its token (simulates a transport without abort).
    pub fn set_honor_cancellation(&self, honor: bool) {
        self.honor_cancellation
            .store(honor, std::sync::atomic::Ordering::SeqCst);
    }

    /// Hold every create and update until the returned `Notify` is signalled.
    pub fn gate_writes(&self) -> std::sync::Arc<tokio::sync::Notify> {
        self.write_gate
            .lock()
            .unwrap()
            .get_or_insert_with(Default::default)
            .clone()
    }

    async fn pass_write_gate(&self) {
        self.write_entered.notify_one();
        let gate = self.write_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    pub fn fail_loads_with(&self, error: Option<DomainError>) {
        *self.load_error.lock().unwrap() = error;
    }

    pub fn fail_writes_with(&self, error: Option<DomainError>) {
        *self.write_error.lock().unwrap() = error;
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn created_bodies(&self) -> Vec<serde_json::Value> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated_bodies(&self) -> Vec<(String, serde_json::Value)> {
        self.updated.lock().unwrap().clone()
    }

    fn apply_update(activity: &mut Activity, payload: &UpdatePayload) {
        activity.title = payload.title.clone();
        if let Some(status) = &payload.status {
            activity.status = status.value().clone();
        }
        activity.budget_status = payload.budget_status;
        activity.budget_amount = payload.budget_amount;
        activity.expected_date = payload.expected_date;
        activity.details = payload.details.clone();
    }
}

#[cfg(test)]
#[async_trait]
impl ActivityRepository for MockActivityRepository {
    async fn find_by_condominium(
        &self,
        condominium_id: &str,
        cancel: &CancellationToken,
    ) -> DomainResult<ActivityListing> {
        self.load_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.entered.notify_one();

        let gate = self.gates.lock().unwrap().get(condominium_id).cloned();
        if let Some(gate) = gate {
            if self
                .honor_cancellation
                .load(std::sync::atomic::Ordering::SeqCst)
            {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(DomainError::Aborted),
                    _ = gate.notified() => {}
                }
            } else {
                gate.notified().await;
            }
        }

        if let Some(error) = self.load_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(condominium_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(
        &self,
        payload: &CreatePayload,
        condominium_id: &str,
    ) -> DomainResult<Activity> {
        let body = serde_json::to_value(CreateRequestBody {
            payload,
            condominium_id,
        })
        .unwrap();
        self.created.lock().unwrap().push(body);
        self.pass_write_gate().await;
        if let Some(error) = self.write_error.lock().unwrap().clone() {
            return Err(error);
        }

        let mut listings = self.listings.lock().unwrap();
        let listing = listings.entry(condominium_id.to_string()).or_default();
        let activity = Activity {
            id: format!("new-{}", listing.items.len() + 1),
            title: payload.title.clone(),
            status: payload
                .status
                .as_ref()
                .map(|s| s.value().clone())
                .unwrap_or_default(),
            condominium_id: condominium_id.to_string(),
            budget_status: payload.budget_status,
            budget_amount: payload.budget_amount,
            expected_date: payload.expected_date,
            details: payload.details.clone(),
        };
        listing.items.push(activity.clone());
        Ok(activity)
    }

    async fn update(
        &self,
        id: &str,
        payload: &UpdatePayload,
    ) -> DomainResult<Activity> {
        self.updated
            .lock()
            .unwrap()
            .push((id.to_string(), serde_json::to_value(payload).unwrap()));
        self.pass_write_gate().await;
        if let Some(error) = self.write_error.lock().unwrap().clone() {
            return Err(error);
        }

        let mut listings = self.listings.lock().unwrap();
        let target = listings
            .values_mut()
            .flat_map(|listing| listing.items.iter_mut())
            .find(|a| a.id == id)
            .ok_or_else(|| DomainError::EntityNotFound("Activity".to_string(), id.to_string()))?;
        Self::apply_update(target, payload);
        Ok(target.clone())
    }
}
