use std::collections::HashSet;
use std::sync::Arc;

use rls_guard_core::testing::InMemoryCatalog;
use rls_guard_core::{PolicyCommand, RlsGuardService, TargetTable};
use rls_guard_server::{serve, AppState};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, Duration};

async fn wait_for_server_ready(addr: &str, max_attempts: u32) -> bool {
    for _ in 0..max_attempts {
        if TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

async fn start_server(catalog: Arc<InMemoryCatalog>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind an ephemeral port");
    let addr = listener
        .local_addr()
        .expect("listener has an address")
        .to_string();

    let state = AppState::new(RlsGuardService::new(catalog));
    tokio::spawn(async move {
        serve(listener, state).await.expect("server should run");
    });

    assert!(
        wait_for_server_ready(&addr, 100).await,
        "server did not start on {addr}"
    );
    format!("http://{addr}")
}

#[tokio::test]
async fn test_http_apply_is_idempotent() {
    let catalog = Arc::new(
        InMemoryCatalog::with_tables(TargetTable::ALL).with_policy(
            TargetTable::Invoices,
            "Authenticated users can view invoices",
            PolicyCommand::Select,
        ),
    );
    let base = start_server(catalog.clone()).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let response = client
            .post(format!("{base}/api/security"))
            .send()
            .await
            .expect("apply request should succeed");
        assert!(response.status().is_success());
    }

    for table in TargetTable::ALL {
        let names = catalog.policy_names(table);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(names.len(), unique.len(), "duplicate policies on {table}");
    }

    let body: Value = client
        .get(format!("{base}/api/security"))
        .send()
        .await
        .expect("status request should succeed")
        .json()
        .await
        .expect("status response should decode");

    assert_eq!(body["success"], true);
    let tables: Vec<&str> = body["data"]
        .as_array()
        .expect("data is a list")
        .iter()
        .filter_map(|entry| entry["table"].as_str())
        .collect();
    assert_eq!(tables, vec!["users", "customers", "invoices", "revenue"]);
}

#[tokio::test]
async fn test_http_inspect_omits_missing_tables() {
    let catalog = Arc::new(InMemoryCatalog::with_tables([TargetTable::Customers]));
    let base = start_server(catalog).await;

    let body: Value = reqwest::get(format!("{base}/api/security"))
        .await
        .expect("status request should succeed")
        .json()
        .await
        .expect("status response should decode");

    assert_eq!(
        body["data"],
        serde_json::json!([{"table": "customers", "rlsEnabled": false, "schema": "public"}])
    );
}

#[tokio::test]
async fn test_http_connection_failure_is_generic() {
    let catalog = Arc::new(InMemoryCatalog::with_tables(TargetTable::ALL));
    catalog.disconnect();
    let base = start_server(catalog).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/security"))
        .send()
        .await
        .expect("apply request should complete");

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.expect("error body should decode");
    assert_eq!(body["success"], false);
    assert!(!body.to_string().contains("connection refused"));
}
