pub mod cancellation;
pub mod remote;

pub use cancellation::{CancellationToken, LatestRequestTracker, RequestTicket};
pub use remote::ApiClient;
