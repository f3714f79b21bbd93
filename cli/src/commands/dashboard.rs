use nova_core::projections::DashboardView;
use nova_sync::SyncConfig;
use nova_sync::users::UserRecord;
use serde::Serialize;

use super::open_loaded;
use crate::util::print_json;

#[derive(Serialize)]
struct DashboardOutput {
    user: UserRecord,
    dashboard: DashboardView,
}

pub async fn run(config: SyncConfig, raw_user_id: &str) -> i32 {
    let session = match open_loaded(config, raw_user_id).await {
        Ok(session) => session,
        Err(code) => return code,
    };
    let output = DashboardOutput {
        user: session.user().clone(),
        dashboard: session.view(),
    };
    session.teardown();
    print_json(&output)
}
