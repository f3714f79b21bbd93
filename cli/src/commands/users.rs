use nova_sync::SyncConfig;
use nova_sync::client::ApiClient;
use nova_sync::users::fetch_users;

use crate::util::{print_json, report_error};

pub async fn run(config: &SyncConfig) -> i32 {
    let users = match ApiClient::new(config) {
        Ok(client) => fetch_users(&client).await,
        Err(e) => Err(e),
    };
    match users {
        Ok(users) => print_json(&users),
        Err(e) => report_error(&e),
    }
}
