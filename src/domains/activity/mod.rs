pub mod status_codec;
pub mod types;
pub mod repository;
pub mod store;
pub mod projections;
pub mod service;

// Re-export main items for other domains to use
pub use status_codec::{CanonicalStatus, StatusCodec, WireMode};
pub use types::{Activity, ActivityDraft, ActivityStats, SaveMode, UiStatus};
pub use repository::{ActivityRepository, ApiActivityRepository};
pub use store::{ActivitySnapshot, ActivityStore};
pub use service::{ActivityService, ActivityServiceImpl};
