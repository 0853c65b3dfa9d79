use crate::config::AppConfig;
use crate::domains::activity::repository::{ActivityRepository, ApiActivityRepository};
use crate::domains::activity::service::{ActivityService, ActivityServiceImpl};
use crate::domains::activity::status_codec::StatusCodec;
use crate::domains::activity::store::ActivityStore;
use crate::domains::condominium::repository::{ApiCondominiumRepository, CondominiumRepository};
use crate::domains::condominium::service::CondominiumResolver;
use crate::domains::condominium::types::CondominiumContext;
use crate::domains::core::remote::ApiClient;
use crate::domains::schedule::service::ScheduleSession;
use crate::errors::{ServiceError, ServiceResult};
use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// Global state definitions
lazy_static! {
    static ref INIT_MUTEX: tokio::sync::Mutex<()> = tokio::sync::Mutex::new(());
    static ref INITIALIZED: AtomicBool = AtomicBool::new(false);

    static ref CONFIG: Mutex<Option<AppConfig>> = Mutex::new(None);

    // Activity Domain
    static ref ACTIVITY_STORE: Mutex<Option<Arc<ActivityStore>>> = Mutex::new(None);
    static ref ACTIVITY_SERVICE: Mutex<Option<Arc<dyn ActivityService>>> = Mutex::new(None);

    // Schedule
    static ref SCHEDULE_SESSION: Mutex<Option<Arc<ScheduleSession>>> = Mutex::new(None);
}

fn get_global<T: Clone>(slot: &Mutex<Option<T>>, name: &str) -> ServiceResult<T> {
    slot.lock()
        .map_err(|_| ServiceError::NotInitialized(format!("{} lock poisoned", name)))?
        .clone()
        .ok_or_else(|| ServiceError::NotInitialized(format!("{} not initialized", name)))
}

fn set_global<T>(slot: &Mutex<Option<T>>, name: &str, value: T) -> ServiceResult<()> {
    *slot
        .lock()
        .map_err(|_| ServiceError::Configuration(format!("{} lock poisoned", name)))? = Some(value);
    Ok(())
}

// --- Getter Functions ---

pub fn get_config() -> ServiceResult<AppConfig> {
    get_global(&CONFIG, "AppConfig")
}

pub fn get_activity_store() -> ServiceResult<Arc<ActivityStore>> {
    get_global(&ACTIVITY_STORE, "ActivityStore")
}

pub fn get_activity_service() -> ServiceResult<Arc<dyn ActivityService>> {
    get_global(&ACTIVITY_SERVICE, "ActivityService")
}

pub fn get_schedule_session() -> ServiceResult<Arc<ScheduleSession>> {
    get_global(&SCHEDULE_SESSION, "ScheduleSession")
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Initialize global services. A second call after a successful one is a no-op.
pub async fn initialize(config: AppConfig) -> ServiceResult<()> {
    // Acquire the async mutex to ensure single initialization
    let _guard = INIT_MUTEX.lock().await;

    if INITIALIZED.load(Ordering::Acquire) {
        log::debug!("Already initialized; ignoring new configuration");
        return Ok(());
    }

    let result = initialize_internal(config);

    // Mark as initialized only if successful
    if result.is_ok() {
        INITIALIZED.store(true, Ordering::Release);
    }

    result
}

fn initialize_internal(config: AppConfig) -> ServiceResult<()> {
    // Initialize logging first
    if std::env::var("RUST_LOG").is_err() {
        #[cfg(debug_assertions)]
        std::env::set_var("RUST_LOG", "debug");
        #[cfg(not(debug_assertions))]
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = env_logger::try_init();

    log::info!("Starting internal initialization");
    config.validate()?;
    log::debug!("API base URL: {}", config.api_base_url);
    log::debug!("Status wire mode: {}", config.status_wire_mode);
    log::debug!("Request timeout: {:?}", config.request_timeout());

    let client = ApiClient::new(&config.api_base_url, config.request_timeout());
    let codec = StatusCodec::new(config.status_wire_mode);

    let activity_repo: Arc<dyn ActivityRepository> =
        Arc::new(ApiActivityRepository::new(client.clone()));
    let condominium_repo: Arc<dyn CondominiumRepository> =
        Arc::new(ApiCondominiumRepository::new(client));

    let context = Arc::new(CondominiumContext::new());
    let resolver = Arc::new(CondominiumResolver::new(condominium_repo, context.clone()));
    let store = Arc::new(ActivityStore::new(activity_repo));
    let service: Arc<dyn ActivityService> = Arc::new(ActivityServiceImpl::new(
        store.clone(),
        codec,
        context,
    ));
    let session = Arc::new(ScheduleSession::new(resolver, store.clone()));

    set_global(&CONFIG, "AppConfig", config)?;
    set_global(&ACTIVITY_STORE, "ActivityStore", store)?;
    set_global(&ACTIVITY_SERVICE, "ActivityService", service)?;
    set_global(&SCHEDULE_SESSION, "ScheduleSession", session)?;

    log::info!("Initialization complete");
    Ok(())
}
