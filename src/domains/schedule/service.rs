use crate::domains::activity::store::ActivityStore;
use crate::domains::activity::types::LoadRequest;
use crate::domains::condominium::service::{CondominiumResolver, Resolution};
use crate::domains::core::cancellation::CancellationToken;
use crate::domains::schedule::types::{ScheduleOpened, ScheduleSummary};
use crate::errors::ServiceResult;
use log::{debug, info};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Lifetime {
    /// Cancelled by `close`; parent of every open and of saves issued from the screen
    root: CancellationToken,
    /// The latest `open`; superseded by the next one
    open: Option<CancellationToken>,
}

/// One consumer of the schedule screen: route resolution followed by the activity load,
/// both bound to a token that `close` cancels. Opening another condominium cancels the
/// previous open.
pub struct ScheduleSession {
    resolver: Arc<CondominiumResolver>,
    store: Arc<ActivityStore>,
    lifetime: Mutex<Lifetime>,
}

impl ScheduleSession {
    pub fn new(resolver: Arc<CondominiumResolver>, store: Arc<ActivityStore>) -> Self {
        Self {
            resolver,
            store,
            lifetime: Mutex::new(Lifetime::default()),
        }
    }

    /// Token for work started from the screen (saves, reloads). Cancelled by `close`.
    pub fn lifetime_token(&self) -> CancellationToken {
        self.lifetime
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .root
            .clone()
    }

    fn begin_open(&self) -> CancellationToken {
        let mut lifetime = self.lifetime.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = lifetime.open.take() {
            previous.cancel();
        }
        let token = lifetime.root.child_token();
        lifetime.open = Some(token.clone());
        token
    }

    /// Resolve `route_id`, then load its activities. Nothing is loaded unless the
    /// condominium was selected; a redirect also empties the collection so the previous
    /// condominium's activities are not shown.
    pub async fn open(&self, route_id: Option<&str>) -> ServiceResult<ScheduleOpened> {
        let token = self.begin_open();
        self.store.cancel_loads();
        let resolution = self.resolver.resolve(route_id, &token).await;

        let load = match &resolution {
            Resolution::Selected { condominium } => Some(
                self.store
                    .load(LoadRequest::reset(&condominium.id), &token)
                    .await?,
            ),
            Resolution::RedirectToSelection { .. } => {
                debug!("Schedule not loaded: {:?}", resolution);
                self.store.clear();
                None
            }
            Resolution::Aborted => {
                debug!("Schedule open aborted");
                None
            }
        };

        Ok(ScheduleOpened { resolution, load })
    }

    /// Cancel everything in flight for this session. A later `open` starts fresh.
    pub fn close(&self) {
        let mut lifetime = self.lifetime.lock().unwrap_or_else(|e| e.into_inner());
        lifetime.root.cancel();
        *lifetime = Lifetime::default();
        self.resolver.cancel();
        self.store.cancel_loads();
        info!("Schedule session closed");
    }

    pub fn summary(&self) -> ScheduleSummary {
        let context = self.resolver.context();
        let snapshot = self.store.snapshot();
        let stats = snapshot.stats();
        ScheduleSummary {
            condominium_id: context.selected_id(),
            condominium_name: context.display_name(),
            logo_url: context.logo_url(),
            chips: ScheduleSummary::chips_for(&stats),
            stats,
            loading: self.store.is_loading(),
        }
    }
}
