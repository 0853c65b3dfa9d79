pub mod types;
pub mod service;

pub use types::{HeaderChip, ScheduleOpened, ScheduleSummary};
pub use service::ScheduleSession;
