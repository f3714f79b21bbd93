//! Agent routing and telemetry synchronization for the Nova dashboard.
//!
//! A [`Session`] owns one user's [`store::TelemetryStore`]. Writes go through
//! the [`coordinator::WriteCoordinator`], which appends optimistically and
//! schedules a reload; the [`reconcile::ReconciliationLoader`] then replaces
//! each collection with server history.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod history;
pub mod reconcile;
pub mod router;
pub mod session;
pub mod store;
pub mod users;

pub use config::SyncConfig;
pub use coordinator::Ack;
pub use error::{Result, SyncError};
pub use session::Session;
