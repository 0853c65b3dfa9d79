use crate::domains::activity::repository::ActivityRepository;
use crate::domains::activity::types::{
    Activity, ActivityListing, ActivityStats, CreatePayload, LoadOutcome, LoadRequest,
    RemoteStats, UpdatePayload,
};
use crate::domains::core::cancellation::{CancellationToken, LatestRequestTracker};
use crate::errors::{DomainError, ServiceResult};
use crate::validation::{Validate, ValidationBuilder};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Immutable view of the collection. Readers hold an `Arc` and never observe a partial update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    pub condominium_id: Option<String>,
    pub items: Vec<Activity>,
    pub remote_stats: Option<RemoteStats>,
    /// Bumped on every applied load
    pub version: u64,
}

impl ActivitySnapshot {
    pub fn stats(&self) -> ActivityStats {
        ActivityStats::derive(&self.items, self.remote_stats.as_ref())
    }

    pub fn find(&self, id: &str) -> Option<&Activity> {
        self.items.iter().find(|a| a.id == id)
    }
}

/// Authoritative client-side collection of the selected condominium's activities.
///
/// Loads follow last-issued-wins: starting a load cancels the previous one, and a
/// response that is no longer current is dropped without touching the snapshot.
pub struct ActivityStore {
    repository: Arc<dyn ActivityRepository>,
    snapshot: RwLock<Arc<ActivitySnapshot>>,
    loads: LatestRequestTracker,
}

impl ActivityStore {
    pub fn new(repository: Arc<dyn ActivityRepository>) -> Self {
        Self {
            repository,
            snapshot: RwLock::new(Arc::new(ActivitySnapshot::default())),
            loads: LatestRequestTracker::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<ActivitySnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn stats(&self) -> ActivityStats {
        self.snapshot().stats()
    }

    pub fn is_loading(&self) -> bool {
        self.loads.has_in_flight()
    }

    /// Abort whatever load is in flight (consumer went away).
    pub fn cancel_loads(&self) {
        self.loads.cancel_all();
    }

    /// Forget the collection (no condominium selected). Any load in flight is
    /// cancelled and will be discarded.
    pub fn clear(&self) {
        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        self.loads.cancel_all();
        *guard = Arc::new(ActivitySnapshot {
            version: guard.version + 1,
            ..Default::default()
        });
        debug!("Activity collection cleared");
    }

    /// Fetch the activities of `request.condominium_id`.
    ///
    /// Returns `Discarded` when the load was superseded or cancelled; the snapshot is
    /// left as it was. On any other failure the last good snapshot is kept as well.
    pub async fn load(
        &self,
        request: LoadRequest,
        cancel: &CancellationToken,
    ) -> ServiceResult<LoadOutcome> {
        ValidationBuilder::new("condominium_id", Some(request.condominium_id.clone()))
            .required()
            .not_blank()
            .validate()?;

        let ticket = self.loads.begin(cancel);
        let request_id = Uuid::new_v4();
        debug!(
            "[{}] Loading activities for condominium {} (reset={})",
            request_id, request.condominium_id, request.reset
        );

        let result = self
            .repository
            .find_by_condominium(&request.condominium_id, &ticket.token)
            .await;

        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        let current = self.loads.is_current(&ticket);
        self.loads.finish(&ticket);

        if !current {
            debug!(
                "[{}] Discarding superseded load for condominium {}",
                request_id, request.condominium_id
            );
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(listing) => {
                let next = Self::apply(&guard, &request, listing);
                let count = next.items.len();
                *guard = Arc::new(next);
                info!(
                    "[{}] Loaded {} activities for condominium {}",
                    request_id, count, request.condominium_id
                );
                Ok(LoadOutcome::Loaded { count })
            }
            Err(DomainError::Aborted) => {
                debug!("[{}] Load aborted", request_id);
                Ok(LoadOutcome::Discarded)
            }
            Err(e) => {
                warn!(
                    "[{}] Failed to load activities for condominium {}: {}",
                    request_id, request.condominium_id, e
                );
                Err(e.into())
            }
        }
    }

    fn apply(
        previous: &ActivitySnapshot,
        request: &LoadRequest,
        listing: ActivityListing,
    ) -> ActivitySnapshot {
        let same_condominium =
            previous.condominium_id.as_deref() == Some(request.condominium_id.as_str());

        let (base, remote_stats) = if request.reset || !same_condominium {
            (Vec::new(), listing.stats)
        } else {
            (
                previous.items.clone(),
                listing.stats.or_else(|| previous.remote_stats.clone()),
            )
        };

        ActivitySnapshot {
            condominium_id: Some(request.condominium_id.clone()),
            items: merge_unique(base, listing.items),
            remote_stats,
            version: previous.version + 1,
        }
    }

    /// Validate and send a creation. The collection is not touched; callers reload.
    pub async fn create_activity(
        &self,
        payload: &CreatePayload,
        condominium_id: &str,
    ) -> ServiceResult<Activity> {
        payload.validate()?;
        ValidationBuilder::new("condominium_id", Some(condominium_id.to_string()))
            .required()
            .not_blank()
            .validate()?;

        let created = self.repository.create(payload, condominium_id).await?;
        info!(
            "Created activity {} in condominium {}",
            created.id, condominium_id
        );
        Ok(created)
    }

    /// Validate and send an update. The collection is not touched; callers reload.
    pub async fn update_activity(
        &self,
        id: &str,
        payload: &UpdatePayload,
    ) -> ServiceResult<Activity> {
        payload.validate()?;
        ValidationBuilder::new("id", Some(id.to_string()))
            .required()
            .not_blank()
            .validate()?;

        let updated = self.repository.update(id, payload).await?;
        info!("Updated activity {}", updated.id);
        Ok(updated)
    }
}

/// Append `incoming` records whose id is not already present; first occurrence wins.
fn merge_unique(mut base: Vec<Activity>, incoming: Vec<Activity>) -> Vec<Activity> {
    let mut seen: HashSet<String> = base.iter().map(|a| a.id.clone()).collect();
    for activity in incoming {
        if seen.insert(activity.id.clone()) {
            base.push(activity);
        } else {
            warn!("Ignoring duplicate activity id {}", activity.id);
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::activity::repository::MockActivityRepository;
    use crate::domains::activity::types::{ActivityDetails, BudgetStatus};
    use crate::errors::{RemoteError, ServiceError};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn listing(items: Value) -> ActivityListing {
        serde_json::from_value(items).unwrap()
    }

    fn setup(repo: MockActivityRepository) -> (Arc<MockActivityRepository>, Arc<ActivityStore>) {
        let repo = Arc::new(repo);
        let store = Arc::new(ActivityStore::new(repo.clone()));
        (repo, store)
    }

    #[tokio::test]
    async fn test_load_replaces_and_derives_stats() {
        let (_repo, store) = setup(MockActivityRepository::new().with_listing(
            "c1",
            listing(json!([
                {"id": "1", "title": "a", "status": 1},
                {"id": "2", "title": "b", "status": "PENDENTE"},
                {"id": "3", "title": "c", "status": true},
                {"id": "4", "title": "d", "status": "bogus"}
            ])),
        ));

        let outcome = store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { count: 4 });
        assert_eq!(
            store.stats(),
            ActivityStats { total: 4, in_progress: 2, pending: 2 }
        );
        let snapshot = store.snapshot();
        assert_eq!(snapshot.condominium_id.as_deref(), Some("c1"));
        assert_eq!(snapshot.version, 1);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_remote_stats_win_when_present() {
        let (_repo, store) = setup(MockActivityRepository::new().with_listing(
            "c1",
            listing(json!({
                "items": [{"id": "1", "status": true}],
                "stats": {"total": 40, "emAndamento": 12}
            })),
        ));
        store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            store.stats(),
            ActivityStats { total: 40, in_progress: 12, pending: 0 }
        );
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (repo, store) = setup(
            MockActivityRepository::new()
                .with_listing("c1", listing(json!([{"id": "old"}])))
                .with_listing("c2", listing(json!([{"id": "new-a"}, {"id": "new-b"}]))),
        );
        // Transport ignores the abort, so the c1 response really arrives late
        repo.set_honor_cancellation(false);
        let gate = repo.gate("c1");

        let first = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .load(LoadRequest::reset("c1"), &CancellationToken::new())
                    .await
            })
        };
        repo.entered.notified().await;

        let second = store
            .load(LoadRequest::reset("c2"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(second, LoadOutcome::Loaded { count: 2 });

        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, LoadOutcome::Discarded);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.condominium_id.as_deref(), Some("c2"));
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn test_superseded_load_is_cancelled() {
        let (repo, store) = setup(
            MockActivityRepository::new()
                .with_listing("c1", listing(json!([{"id": "x"}])))
                .with_listing("c2", listing(json!([{"id": "y"}]))),
        );
        let _gate = repo.gate("c1");

        let first = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .load(LoadRequest::reset("c1"), &CancellationToken::new())
                    .await
            })
        };
        repo.entered.notified().await;
        assert!(store.is_loading());

        store
            .load(LoadRequest::reset("c2"), &CancellationToken::new())
            .await
            .unwrap();

        let first = tokio::time::timeout(Duration::from_secs(1), first)
            .await
            .expect("superseded load should be aborted promptly")
            .unwrap()
            .unwrap();
        assert_eq!(first, LoadOutcome::Discarded);
        assert_eq!(store.snapshot().condominium_id.as_deref(), Some("c2"));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_parent_cancellation_discards_without_change() {
        let (repo, store) = setup(
            MockActivityRepository::new().with_listing("c1", listing(json!([{"id": "x"}]))),
        );
        let _gate = repo.gate("c1");
        let view = CancellationToken::new();

        let pending = {
            let store = store.clone();
            let view = view.clone();
            tokio::spawn(async move { store.load(LoadRequest::reset("c1"), &view).await })
        };
        repo.entered.notified().await;
        view.cancel();

        assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Discarded);
        assert_eq!(*store.snapshot(), ActivitySnapshot::default());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_clear_empties_and_discards_in_flight_load() {
        let (repo, store) = setup(
            MockActivityRepository::new()
                .with_listing("c1", listing(json!([{"id": "1"}, {"id": "2"}]))),
        );
        store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap();
        repo.entered.notified().await;

        repo.set_honor_cancellation(false);
        let gate = repo.gate("c1");
        let late = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .load(LoadRequest::reset("c1"), &CancellationToken::new())
                    .await
            })
        };
        repo.entered.notified().await;

        store.clear();
        gate.notify_one();
        assert_eq!(late.await.unwrap().unwrap(), LoadOutcome::Discarded);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.condominium_id, None);
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.version, 2);
        assert_eq!(store.stats(), ActivityStats::default());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_last_good_snapshot() {
        let (repo, store) = setup(
            MockActivityRepository::new().with_listing("c1", listing(json!([{"id": "x"}]))),
        );
        store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap();

        repo.fail_loads_with(Some(DomainError::Remote(RemoteError::Rejected {
            status: 500,
            message: "Server returned error 500".to_string(),
        })));
        let err = store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Server returned error 500");
        assert_eq!(store.snapshot().items.len(), 1);
        assert_eq!(store.snapshot().version, 1);
    }

    #[tokio::test]
    async fn test_append_keeps_ids_unique() {
        let (repo, store) = setup(
            MockActivityRepository::new().with_listing("c1", listing(json!([{"id": "a"}, {"id": "b"}]))),
        );
        store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap();

        repo.set_listing("c1", listing(json!([{"id": "b"}, {"id": "c"}])));
        let outcome = store
            .load(
                LoadRequest { condominium_id: "c1".to_string(), reset: false },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { count: 3 });
        let ids: Vec<_> = store.snapshot().items.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_blank_condominium_is_rejected() {
        let (repo, store) = setup(MockActivityRepository::new());
        let err = store
            .load(LoadRequest::reset(" "), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert_eq!(repo.load_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_create_is_not_transmitted() {
        let (repo, store) = setup(MockActivityRepository::new());
        let payload = CreatePayload {
            title: String::new(),
            status: None,
            budget_status: BudgetStatus::NoBudget,
            budget_amount: None,
            expected_date: None,
            details: ActivityDetails::default(),
        };
        assert!(store.create_activity(&payload, "c1").await.is_err());
        assert!(repo.created_bodies().is_empty());
        assert_eq!(store.snapshot().version, 0);
    }
}
