pub mod agent;
pub mod dashboard;
pub mod users;

use nova_sync::{Session, SyncConfig};

use crate::util::report_error;

/// Opens a session for `raw_user_id` and runs the initial reconciliation.
/// On failure the error envelope is printed and its exit code returned.
async fn open_loaded(config: SyncConfig, raw_user_id: &str) -> Result<Session, i32> {
    let session = Session::open_validated(config, raw_user_id)
        .await
        .map_err(|e| report_error(&e))?;
    let report = session.initial_load().await.map_err(|e| report_error(&e))?;
    if !report.failed.is_empty() {
        tracing::warn!(
            user_id = session.user_id(),
            failed = report.failed.len(),
            "initial load incomplete; showing what loaded"
        );
    }
    Ok(session)
}
