pub mod types;
pub mod repository;
pub mod service;

pub use types::{Condominium, CondominiumContext};
pub use repository::{ApiCondominiumRepository, CondominiumRepository};
pub use service::{CondominiumResolver, Resolution, SELECTION_ROUTE};
