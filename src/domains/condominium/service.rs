use crate::domains::condominium::repository::CondominiumRepository;
use crate::domains::condominium::types::{Condominium, CondominiumContext};
use crate::domains::core::cancellation::{CancellationToken, LatestRequestTracker};
use crate::errors::DomainError;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Where the user is sent when the route's condominium cannot be resolved
pub const SELECTION_ROUTE: &str = "/selecione-o-condominio";

/// Outcome of resolving the route's condominium. Never an error: failures fall back to
/// the selection page, and aborted lookups change nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Selected { condominium: Condominium },
    RedirectToSelection { route: &'static str, reason: String },
    Aborted,
}

impl Resolution {
    fn redirect(reason: impl Into<String>) -> Self {
        Resolution::RedirectToSelection {
            route: SELECTION_ROUTE,
            reason: reason.into(),
        }
    }

    pub fn condominium(&self) -> Option<&Condominium> {
        match self {
            Resolution::Selected { condominium } => Some(condominium),
            _ => None,
        }
    }
}

pub struct CondominiumResolver {
    repository: Arc<dyn CondominiumRepository>,
    context: Arc<CondominiumContext>,
    lookups: LatestRequestTracker,
}

impl CondominiumResolver {
    pub fn new(
        repository: Arc<dyn CondominiumRepository>,
        context: Arc<CondominiumContext>,
    ) -> Self {
        Self {
            repository,
            context,
            lookups: LatestRequestTracker::new(),
        }
    }

    pub fn context(&self) -> &Arc<CondominiumContext> {
        &self.context
    }

    /// Abort the lookup in flight, if any.
    pub fn cancel(&self) {
        self.lookups.cancel_all();
    }

    /// Resolve `route_id` into the selected condominium.
    ///
    /// A newer call supersedes an older one; the superseded call returns `Aborted`
    /// without touching the context.
    pub async fn resolve(&self, route_id: Option<&str>, cancel: &CancellationToken) -> Resolution {
        let id = match route_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                self.lookups.cancel_all();
                self.context.clear();
                info!("No condominium in route; redirecting to selection");
                return Resolution::redirect("missing condominium id");
            }
        };

        let ticket = self.lookups.begin(cancel);
        self.context.show_placeholder(&id);
        debug!("Resolving condominium {}", id);

        let result = self.repository.find_by_id(&id, &ticket.token).await;

        let current = self.lookups.is_current(&ticket);
        self.lookups.finish(&ticket);
        if !current {
            debug!("Discarding superseded lookup for condominium {}", id);
            return Resolution::Aborted;
        }

        let reason = match result {
            Ok(Some(record)) if record.id == id => {
                let condominium = Condominium::from(record);
                info!("Selected condominium {} ({})", condominium.id, condominium.name);
                self.context.select(condominium.clone());
                return Resolution::Selected { condominium };
            }
            Ok(Some(record)) => format!("lookup for {} returned condominium {}", id, record.id),
            Ok(None) => format!("condominium {} not found", id),
            Err(DomainError::Aborted) => return Resolution::Aborted,
            Err(e) => {
                warn!("Condominium lookup for {} failed: {}", id, e);
                format!("lookup for condominium {} failed: {}", id, e)
            }
        };

        info!("Redirecting to selection: {}", reason);
        self.context.clear();
        Resolution::redirect(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::condominium::repository::MockCondominiumRepository;
    use crate::errors::RemoteError;
    use serde_json::json;
    use std::time::Duration;

    fn resolver(repo: MockCondominiumRepository) -> (Arc<MockCondominiumRepository>, Arc<CondominiumResolver>) {
        let repo = Arc::new(repo);
        let resolver = Arc::new(CondominiumResolver::new(
            repo.clone(),
            Arc::new(CondominiumContext::new()),
        ));
        (repo, resolver)
    }

    #[tokio::test]
    async fn test_resolves_and_selects() {
        let (_repo, resolver) = resolver(MockCondominiumRepository::new().with_body(
            "c1",
            json!([{"id": "c1", "name": "Edifício Aurora", "imageUrl": "https://cdn/logo.png"}]),
        ));
        let resolution = resolver.resolve(Some("c1"), &CancellationToken::new()).await;

        let selected = resolution.condominium().unwrap();
        assert_eq!(selected.name, "Edifício Aurora");
        assert_eq!(resolver.context().logo_url().as_deref(), Some("https://cdn/logo.png"));
        assert_eq!(resolver.context().display_name(), "Edifício Aurora");
    }

    #[tokio::test]
    async fn test_empty_result_redirects() {
        let (_repo, resolver) = resolver(MockCondominiumRepository::new().with_body("c1", json!([])));
        let resolution = resolver.resolve(Some("c1"), &CancellationToken::new()).await;

        assert!(matches!(
            resolution,
            Resolution::RedirectToSelection { route: SELECTION_ROUTE, .. }
        ));
        assert_eq!(resolver.context().selected(), None);
    }

    #[tokio::test]
    async fn test_mismatch_and_failure_redirect() {
        let (_repo, resolver) = resolver(
            MockCondominiumRepository::new()
                .with_body("c1", json!([{"id": "c2", "name": "Outro"}]))
                .with_error(
                    "c3",
                    DomainError::Remote(RemoteError::Rejected { status: 500, message: "boom".into() }),
                ),
        );
        let token = CancellationToken::new();
        assert!(matches!(
            resolver.resolve(Some("c1"), &token).await,
            Resolution::RedirectToSelection { .. }
        ));
        assert!(matches!(
            resolver.resolve(Some("c3"), &token).await,
            Resolution::RedirectToSelection { .. }
        ));
        assert!(matches!(
            resolver.resolve(Some("  "), &token).await,
            Resolution::RedirectToSelection { .. }
        ));
        assert!(matches!(resolver.resolve(None, &token).await, Resolution::RedirectToSelection { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_lookup_is_not_a_redirect() {
        let (repo, resolver) = resolver(
            MockCondominiumRepository::new().with_body("c1", json!([{"id": "c1", "name": "Aurora"}])),
        );
        let _gate = repo.gate("c1");
        let view = CancellationToken::new();

        let pending = {
            let resolver = resolver.clone();
            let view = view.clone();
            tokio::spawn(async move { resolver.resolve(Some("c1"), &view).await })
        };
        repo.entered.notified().await;
        view.cancel();

        let resolution = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolution, Resolution::Aborted);
        // Placeholder stays; nothing was cleared or redirected
        assert!(resolver.context().selected().unwrap().is_placeholder());
    }

    #[tokio::test]
    async fn test_superseded_lookup_is_aborted() {
        let (repo, resolver) = resolver(
            MockCondominiumRepository::new()
                .with_body("c1", json!([{"id": "c1", "name": "Aurora"}]))
                .with_body("c2", json!([{"id": "c2", "name": "Boreal"}])),
        );
        let _gate = repo.gate("c1");

        let first = {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve(Some("c1"), &CancellationToken::new()).await })
        };
        repo.entered.notified().await;

        let second = resolver.resolve(Some("c2"), &CancellationToken::new()).await;
        assert_eq!(second.condominium().map(|c| c.name.as_str()), Some("Boreal"));
        assert_eq!(first.await.unwrap(), Resolution::Aborted);
        assert_eq!(resolver.context().selected_id().as_deref(), Some("c2"));
    }
}
