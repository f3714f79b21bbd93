use nova_core::agents::AgentKind;
use nova_core::projections::DashboardView;
use nova_sync::reconcile::ReloadReport;
use nova_sync::{Ack, SyncConfig};
use serde::Serialize;
use uuid::Uuid;

use super::open_loaded;
use crate::util::{print_json, report_error};

#[derive(Serialize)]
struct AgentOutput {
    session_id: Uuid,
    user_id: u64,
    ack: Ack,
    reconciliations: Vec<ReloadReport>,
    dashboard: DashboardView,
}

/// Loads the user's history, sends one write through `kind`'s agent, waits
/// for its reconciliation and prints the acknowledgement with the refreshed
/// dashboard.
pub async fn run(config: SyncConfig, raw_user_id: &str, kind: AgentKind, raw: &str) -> i32 {
    let session = match open_loaded(config, raw_user_id).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let ack = match session.submit(kind, raw).await {
        Ok(ack) => ack,
        Err(e) => {
            session.teardown();
            return report_error(&e);
        }
    };
    let reconciliations = session.settle().await;

    let output = AgentOutput {
        session_id: session.id(),
        user_id: session.user_id(),
        ack,
        reconciliations,
        dashboard: session.view(),
    };
    session.teardown();
    print_json(&output)
}
