pub mod activity;
pub mod condominium;
pub mod core;
pub mod schedule;
