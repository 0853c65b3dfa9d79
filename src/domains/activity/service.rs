use crate::domains::activity::status_codec::{CanonicalStatus, StatusCodec};
use crate::domains::activity::store::ActivityStore;
use crate::domains::activity::types::{
    Activity, ActivityDraft, BudgetStatus, CreatePayload, LoadOutcome, LoadRequest, SaveMode,
    UiStatus, UpdatePayload, WireStatus,
};
use crate::domains::condominium::types::CondominiumContext;
use crate::domains::core::cancellation::CancellationToken;
use crate::errors::{ServiceResult, ValidationError};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Trait defining the add/edit entry points used by the dialog and the card shortcuts
#[async_trait]
pub trait ActivityService: Send + Sync {
    /// Create or update from a dialog payload, then reload the selected condominium.
    /// The returned record is what the backend answered; the store reflects the reload.
    /// The reload is skipped once `cancel` fires, the write is not.
    async fn save(
        &self,
        draft: ActivityDraft,
        mode: SaveMode,
        cancel: &CancellationToken,
    ) -> ServiceResult<Activity>;

    /// Apply the card's quick action ("Iniciar" / "Concluir") through the edit path.
    async fn advance(
        &self,
        activity: &Activity,
        cancel: &CancellationToken,
    ) -> ServiceResult<Activity>;

    /// Full reload of the selected condominium.
    async fn reload(&self, cancel: &CancellationToken) -> ServiceResult<LoadOutcome>;
}

/// Implementation of the activity service
pub struct ActivityServiceImpl {
    store: Arc<ActivityStore>,
    codec: StatusCodec,
    context: Arc<CondominiumContext>,
}

impl ActivityServiceImpl {
    pub fn new(
        store: Arc<ActivityStore>,
        codec: StatusCodec,
        context: Arc<CondominiumContext>,
    ) -> Self {
        Self {
            store,
            codec,
            context,
        }
    }

    /// UI labels map straight to their canonical status; any other raw form goes
    /// through the codec's decode. The result is re-encoded for the wire.
    fn normalize_status(&self, raw: &Value) -> WireStatus {
        let canonical: CanonicalStatus = match raw.as_str().and_then(UiStatus::parse_label) {
            Some(label) => label.canonical(),
            None => self.codec.decode(raw),
        };
        let wire = WireStatus::encode(canonical, &self.codec);
        debug!("Status {} normalized to {} ({} mode)", raw, wire.value(), self.codec.mode());
        wire
    }

    fn budget_fields(
        draft: &ActivityDraft,
    ) -> (Option<BudgetStatus>, Option<rust_decimal::Decimal>) {
        let amount = match draft.budget_status {
            Some(BudgetStatus::Approved) => draft.budget_amount,
            _ => {
                if draft.budget_amount.is_some() {
                    debug!("Dropping budget amount: budget is not approved");
                }
                None
            }
        };
        (draft.budget_status, amount)
    }

    fn create_payload(&self, draft: &ActivityDraft) -> CreatePayload {
        let (budget_status, budget_amount) = Self::budget_fields(draft);
        CreatePayload {
            title: draft.title.clone().unwrap_or_default(),
            status: draft.status.as_ref().map(|raw| self.normalize_status(raw)),
            budget_status: budget_status.unwrap_or_default(),
            budget_amount,
            expected_date: draft.expected_date,
            details: draft.details.clone(),
        }
    }

    fn update_payload(&self, draft: &ActivityDraft) -> UpdatePayload {
        let (budget_status, budget_amount) = Self::budget_fields(draft);
        UpdatePayload {
            title: draft.title.clone().unwrap_or_default(),
            status: draft.status.as_ref().map(|raw| self.normalize_status(raw)),
            budget_status: budget_status.unwrap_or_default(),
            budget_amount,
            expected_date: draft.expected_date,
            details: draft.details.clone(),
        }
    }

    /// Status is a free selection; moves outside the usual lifecycle are only noted.
    fn note_transition(&self, id: &str, draft: &ActivityDraft) {
        let snapshot = self.store.snapshot();
        let current = snapshot.find(id).and_then(Activity::ui_status);
        let target = draft.status.as_ref().and_then(UiStatus::from_raw);
        if let (Some(current), Some(target)) = (current, target) {
            if !current.follows(target) {
                debug!(
                    "Activity {} moves from {} to {} outside the usual lifecycle",
                    id,
                    current.label(),
                    target.label()
                );
            }
        }
    }

    /// Reload after a successful write. A failed reload is logged, not surfaced:
    /// the write itself already succeeded.
    async fn reload_after_save(&self, saved: &Activity, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            debug!("Screen closed; skipping reload after saving {}", saved.id);
            return;
        }

        let condominium_id = self
            .context
            .selected_id()
            .or_else(|| Some(saved.condominium_id.clone()).filter(|id| !id.is_empty()));

        let Some(condominium_id) = condominium_id else {
            warn!("No condominium selected; skipping reload after saving {}", saved.id);
            return;
        };

        match self
            .store
            .load(LoadRequest::reset(&condominium_id), cancel)
            .await
        {
            Ok(LoadOutcome::Loaded { count }) => {
                debug!("Reloaded {} activities after saving {}", count, saved.id)
            }
            Ok(LoadOutcome::Discarded) => {
                debug!("Reload after saving {} was superseded", saved.id)
            }
            Err(e) => warn!("Reload after saving {} failed: {}", saved.id, e),
        }
    }
}

#[async_trait]
impl ActivityService for ActivityServiceImpl {
    async fn save(
        &self,
        draft: ActivityDraft,
        mode: SaveMode,
        cancel: &CancellationToken,
    ) -> ServiceResult<Activity> {
        let saved = match (mode, draft.id.as_deref()) {
            (SaveMode::Edit, Some(id)) => {
                self.note_transition(id, &draft);
                let payload = self.update_payload(&draft);
                self.store.update_activity(id, &payload).await?
            }
            (mode, _) => {
                if mode == SaveMode::Edit {
                    warn!("Edit requested without an id; creating a new activity instead");
                }
                let condominium_id = self
                    .context
                    .selected_id()
                    .ok_or_else(|| ValidationError::required("condominium_id"))?;
                let payload = self.create_payload(&draft);
                self.store.create_activity(&payload, &condominium_id).await?
            }
        };

        info!("Saved activity {} ({:?})", saved.id, mode);
        self.reload_after_save(&saved, cancel).await;
        Ok(saved)
    }

    async fn advance(
        &self,
        activity: &Activity,
        cancel: &CancellationToken,
    ) -> ServiceResult<Activity> {
        let action = activity.quick_action().ok_or_else(|| {
            ValidationError::invalid_value("status", "no quick action for this activity")
        })?;

        let mut draft = ActivityDraft::from(activity);
        draft.status = Some(Value::String(action.target().label().to_string()));
        debug!("{} on activity {}", action.label(), activity.id);
        self.save(draft, SaveMode::Edit, cancel).await
    }

    async fn reload(&self, cancel: &CancellationToken) -> ServiceResult<LoadOutcome> {
        let condominium_id = self
            .context
            .selected_id()
            .ok_or_else(|| ValidationError::required("condominium_id"))?;
        self.store
            .load(LoadRequest::reset(&condominium_id), cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::activity::projections;
    use crate::domains::activity::repository::MockActivityRepository;
    use crate::domains::activity::status_codec::WireMode;
    use crate::domains::activity::types::ActivityListing;
    use crate::domains::condominium::types::Condominium;
    use crate::errors::{DomainError, RemoteError, ServiceError};
    use rust_decimal_macros::dec;
    use serde_json::json;

    struct Fixture {
        repo: Arc<MockActivityRepository>,
        store: Arc<ActivityStore>,
        context: Arc<CondominiumContext>,
        service: ActivityServiceImpl,
    }

    fn fixture(mode: WireMode, listing: Value) -> Fixture {
        let listing: ActivityListing = serde_json::from_value(listing).unwrap();
        let repo = Arc::new(MockActivityRepository::new().with_listing("c1", listing));
        let store = Arc::new(ActivityStore::new(repo.clone()));
        let context = Arc::new(CondominiumContext::new());
        context.select(Condominium {
            id: "c1".into(),
            name: "Edifício Aurora".into(),
            logo_url: None,
        });
        let service = ActivityServiceImpl::new(store.clone(), StatusCodec::new(mode), context.clone());
        Fixture { repo, store, context, service }
    }

    fn draft(value: Value) -> ActivityDraft {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_in_progress_boolean_mode_lands_in_ongoing_column() {
        let f = fixture(WireMode::Boolean, json!([]));

        let created = f
            .service
            .save(
                draft(json!({"title": "Reparo de Portão", "status": "Em andamento"})),
                SaveMode::Create,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let bodies = f.repo.created_bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["status"], json!(true));
        assert_eq!(bodies[0]["condominiumId"], json!("c1"));

        // The save resolved only after the reload
        let snapshot = f.store.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        let board = projections::kanban(&snapshot.items);
        let ongoing = board.column(UiStatus::InProgress).unwrap();
        assert_eq!(ongoing.cards.len(), 1);
        assert_eq!(ongoing.cards[0].activity.id, created.id);
    }

    #[tokio::test]
    async fn test_create_in_progress_enum_mode() {
        let f = fixture(WireMode::Enum, json!([]));
        f.service
            .save(
                draft(json!({"title": "Reparo de Portão", "status": "Em andamento"})),
                SaveMode::Create,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(f.repo.created_bodies()[0]["status"], json!("EM_ANDAMENTO"));
    }

    #[tokio::test]
    async fn test_status_normalization() {
        let f = fixture(WireMode::Enum, json!([]));
        for (raw, expected) in [
            (json!("Histórico"), json!("PENDENTE")),
            (json!("Próximas"), json!("PENDENTE")),
            (json!(true), json!("EM_ANDAMENTO")),
            (json!(1), json!("EM_ANDAMENTO")),
            (json!("IN_PROGRESS"), json!("EM_ANDAMENTO")),
            (json!("bogus"), json!("PENDENTE")),
        ] {
            assert_eq!(f.service.normalize_status(&raw).value(), &expected, "raw {}", raw);
        }

        let boolean = fixture(WireMode::Boolean, json!([]));
        assert_eq!(boolean.service.normalize_status(&json!("EM_ANDAMENTO")).value(), &json!(true));
        assert_eq!(boolean.service.normalize_status(&json!("Pendente")).value(), &json!(false));
    }

    #[tokio::test]
    async fn test_absent_status_is_not_transmitted() {
        let f = fixture(WireMode::Boolean, json!([]));
        f.service
            .save(
                draft(json!({"title": "Inspeção de Extintores"})),
                SaveMode::Create,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(f.repo.created_bodies()[0].get("status").is_none());
    }

    #[tokio::test]
    async fn test_budget_amount_only_sent_when_approved() {
        let f = fixture(WireMode::Boolean, json!([]));
        f.service
            .save(
                draft(json!({"title": "A", "budgetStatus": "pendente", "budget": "300"})),
                SaveMode::Create,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        f.service
            .save(
                draft(json!({"title": "B", "budgetStatus": "aprovado", "budget": 300})),
                SaveMode::Create,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let bodies = f.repo.created_bodies();
        assert!(bodies[0].get("budgetAmount").is_none());
        assert_eq!(bodies[1]["budgetAmount"], json!(dec!(300).to_string()));
    }

    #[tokio::test]
    async fn test_edit_updates_by_id_and_reloads() {
        let f = fixture(
            WireMode::Boolean,
            json!([{"id": "t1", "title": "Limpeza", "status": false, "condominiumId": "c1"}]),
        );
        f.store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap();

        let updated = f
            .service
            .save(
                draft(json!({"id": "t1", "title": "Limpeza Geral", "status": "Em andamento"})),
                SaveMode::Edit,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Limpeza Geral");

        let (id, body) = f.repo.updated_bodies().remove(0);
        assert_eq!(id, "t1");
        assert_eq!(body["status"], json!(true));
        assert_eq!(f.repo.load_calls(), 2);
        assert_eq!(f.store.snapshot().find("t1").unwrap().title, "Limpeza Geral");
    }

    #[tokio::test]
    async fn test_edit_clears_emptied_fields() {
        let f = fixture(
            WireMode::Boolean,
            json!([{
                "id": "t1",
                "title": "Pintura",
                "status": false,
                "budgetStatus": "aprovado",
                "budgetAmount": 900,
                "expectedDate": "2025-07-20",
                "observations": "Cor cinza"
            }]),
        );
        f.store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap();

        f.service
            .save(
                draft(json!({
                    "id": "t1",
                    "title": "Pintura",
                    "expectedDate": "",
                    "observations": null
                })),
                SaveMode::Edit,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let (_, body) = f.repo.updated_bodies().remove(0);
        assert_eq!(body["expectedDate"], Value::Null);
        assert_eq!(body["budgetAmount"], Value::Null);
        assert_eq!(body["observations"], Value::Null);
        assert_eq!(body["budgetStatus"], json!(BudgetStatus::default()));
        assert!(body.get("status").is_none());

        let reloaded = f.store.snapshot();
        let activity = reloaded.find("t1").unwrap();
        assert_eq!(activity.expected_date, None);
        assert_eq!(activity.effective_budget(), None);
        assert_eq!(activity.details.observations, None);
    }

    #[tokio::test]
    async fn test_cancelled_save_skips_reload() {
        let f = fixture(WireMode::Boolean, json!([]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let saved = f
            .service
            .save(draft(json!({"title": "Vistoria"})), SaveMode::Create, &cancel)
            .await
            .unwrap();

        assert_eq!(saved.title, "Vistoria");
        assert_eq!(f.repo.created_bodies().len(), 1);
        assert_eq!(f.repo.load_calls(), 0);
        assert!(f.store.snapshot().items.is_empty());
    }

    #[tokio::test]
    async fn test_update_not_found_keeps_snapshot_and_skips_reload() {
        let f = fixture(WireMode::Boolean, json!([{"id": "t1", "title": "Limpeza"}]));
        f.store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap();
        let before = f.store.snapshot();

        let err = f
            .service
            .save(
                draft(json!({"id": "gone", "title": "X"})),
                SaveMode::Edit,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(f.repo.load_calls(), 1);
        assert_eq!(f.store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_rejected_create_surfaces_backend_message() {
        let f = fixture(WireMode::Boolean, json!([]));
        f.repo.fail_writes_with(Some(DomainError::Remote(RemoteError::Rejected {
            status: 422,
            message: "Título já cadastrado".into(),
        })));

        let err = f
            .service
            .save(
                draft(json!({"title": "Duplicada"})),
                SaveMode::Create,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Título já cadastrado");
        assert_eq!(f.repo.load_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_title_is_rejected_before_transmission() {
        let f = fixture(WireMode::Boolean, json!([]));
        let err = f
            .service
            .save(
                draft(json!({"title": "   ", "status": true})),
                SaveMode::Create,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert!(f.repo.created_bodies().is_empty());
        assert_eq!(f.repo.load_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_without_selection_fails() {
        let f = fixture(WireMode::Boolean, json!([]));
        f.context.clear();
        let err = f
            .service
            .save(
                draft(json!({"title": "Sem condomínio"})),
                SaveMode::Create,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::from(ValidationError::required("condominium_id"))
        );
        assert!(f.repo.created_bodies().is_empty());
    }

    #[tokio::test]
    async fn test_edit_without_id_creates() {
        let f = fixture(WireMode::Boolean, json!([]));
        f.service
            .save(
                draft(json!({"title": "Nova"})),
                SaveMode::Edit,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(f.repo.created_bodies().len(), 1);
        assert!(f.repo.updated_bodies().is_empty());
    }

    #[tokio::test]
    async fn test_advance_quick_actions() {
        let f = fixture(
            WireMode::Enum,
            json!([
                {"id": "up", "title": "Pintura", "status": "Próximas"},
                {"id": "run", "title": "Elevador", "status": "EM_ANDAMENTO"},
                {"id": "hold", "title": "Jardim", "status": "PENDENTE"}
            ]),
        );
        f.store
            .load(LoadRequest::reset("c1"), &CancellationToken::new())
            .await
            .unwrap();
        let snapshot = f.store.snapshot();

        let cancel = CancellationToken::new();
        f.service.advance(snapshot.find("up").unwrap(), &cancel).await.unwrap();
        f.service.advance(snapshot.find("run").unwrap(), &cancel).await.unwrap();
        assert!(f.service.advance(snapshot.find("hold").unwrap(), &cancel).await.is_err());

        let updates = f.repo.updated_bodies();
        assert_eq!(updates[0].1["status"], json!("EM_ANDAMENTO"));
        // Concluded collapses to the not-in-progress wire value
        assert_eq!(updates[1].1["status"], json!("PENDENTE"));
        assert_eq!(updates.len(), 2);
    }

    #[tokio::test]
    async fn test_reload_requires_selection() {
        let f = fixture(WireMode::Boolean, json!([{"id": "a"}]));
        let outcome = f.service.reload(&CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { count: 1 });

        f.context.clear();
        assert!(f.service.reload(&CancellationToken::new()).await.is_err());
    }
}
