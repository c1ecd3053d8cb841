//! End-to-end instance lifecycle tests
//!
//! Exercise the full composition against HTTP doubles: manifest file ->
//! repository -> governor -> auth provider -> client, including the
//! 401-driven token refresh and a manifest reconciliation run that creates
//! entities through the instance client.

use std::io::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use steward_core::{synchronize, InstanceRepository, SyncStrategy};
use steward_domain::{InstanceCredentials, InstanceMetadata, InstanceRecord, Result};
use steward_infra::{InstanceClient, InstanceGovernor, TomlInstanceRepository};
use tempfile::NamedTempFile;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// In-memory repository double counting its load calls.
struct StaticRepository {
    record: InstanceRecord,
    loads: AtomicUsize,
}

impl StaticRepository {
    fn pointing_at(base_url: &str) -> Self {
        Self {
            record: InstanceRecord {
                metadata: InstanceMetadata {
                    instance_key: "pantry".to_string(),
                    base_url: base_url.to_string(),
                    auth_path: "/api/auth/login".to_string(),
                },
                credentials: InstanceCredentials {
                    identity: "admin@example.com".to_string(),
                    secret: "hunter2".to_string(),
                },
            },
            loads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl InstanceRepository for StaticRepository {
    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(vec!["pantry".to_string()])
    }

    async fn load(&self, key: &str) -> Result<InstanceRecord> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if key == self.record.metadata.instance_key {
            Ok(self.record.clone())
        } else {
            Err(steward_domain::StewardError::NotFound(key.to_string()))
        }
    }
}

async fn mount_login(server: &MockServer, token: &str) {
    let body = json!({ "token": token });
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn governor_builds_a_working_client_from_the_manifest_file() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("GET"))
        .and(path("/api/objects/products"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "products": ["milk"] })),
        )
        .mount(&server)
        .await;

    let mut manifest = NamedTempFile::new().unwrap();
    write!(
        manifest,
        r#"
        [instances.pantry]
        base_url = "{base}"

        [[instances.pantry.credentials]]
        identity = "admin@example.com"
        secret = "hunter2"
        "#,
        base = server.uri()
    )
    .unwrap();

    let repo = Arc::new(TomlInstanceRepository::new(manifest.path()));
    let governor = InstanceGovernor::new(repo);

    assert_eq!(governor.available_instances().await.unwrap(), vec!["pantry".to_string()]);

    let client = governor.client_for("pantry").await.unwrap();
    let body = client.get("/api/objects/products", &[]).await.unwrap();
    assert_eq!(body["products"][0], "milk");
}

#[tokio::test]
async fn expired_token_is_refreshed_transparently_mid_lifetime() {
    let server = MockServer::start().await;

    // Each exchange yields a new token; the data endpoint rejects the first
    // one once, simulating server-side expiry between two requests.
    let logins = Arc::new(AtomicUsize::new(0));
    let logins_clone = logins.clone();
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(move |_req: &Request| -> ResponseTemplate {
            let n = logins_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_json(json!({ "token": format!("tok-{n}") }))
        })
        .mount(&server)
        .await;

    let rejected_once = Arc::new(AtomicUsize::new(0));
    let rejected_clone = rejected_once.clone();
    Mock::given(method("GET"))
        .and(path("/api/objects/products"))
        .respond_with(move |req: &Request| -> ResponseTemplate {
            let authorized_with_stale = req
                .headers
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == "Bearer tok-0");
            if authorized_with_stale && rejected_clone.fetch_add(1, Ordering::SeqCst) >= 1 {
                // Second use of the first token: pretend it expired.
                ResponseTemplate::new(401)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true }))
            }
        })
        .mount(&server)
        .await;

    let repo = Arc::new(StaticRepository::pointing_at(&server.uri()));
    let governor = InstanceGovernor::new(repo.clone());
    let client = governor.client_for("pantry").await.unwrap();

    // First request succeeds with tok-0, second gets a 401 and transparently
    // re-authenticates with tok-1.
    assert_eq!(client.get("/api/objects/products", &[]).await.unwrap()["ok"], true);
    assert_eq!(client.get("/api/objects/products", &[]).await.unwrap()["ok"], true);

    assert_eq!(logins.load(Ordering::SeqCst), 2, "one initial exchange, one refresh");
    assert_eq!(repo.loads.load(Ordering::SeqCst), 1, "no repository reload on token refresh");
}

#[tokio::test]
async fn clear_client_reloads_the_instance_record() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;

    let repo = Arc::new(StaticRepository::pointing_at(&server.uri()));
    let governor = InstanceGovernor::new(repo.clone());

    governor.client_for("pantry").await.unwrap();
    governor.client_for("pantry").await.unwrap();
    assert_eq!(repo.loads.load(Ordering::SeqCst), 1);

    governor.clear_client("pantry");
    governor.client_for("pantry").await.unwrap();
    assert_eq!(repo.loads.load(Ordering::SeqCst), 2);
}

/// Reconciliation strategy creating quantity units through the instance
/// client.
struct QuantityUnitSync<'a> {
    client: &'a InstanceClient,
}

#[async_trait]
impl SyncStrategy for QuantityUnitSync<'_> {
    type Manifest = String;
    type Existing = Value;

    fn manifest_key(&self, item: &String) -> String {
        item.clone()
    }

    fn existing_key(&self, item: &Value) -> String {
        item["name"].as_str().unwrap_or_default().to_string()
    }

    fn existing_id(&self, item: &Value) -> i64 {
        item["id"].as_i64().unwrap_or(0)
    }

    fn build_payload(&self, item: &String, candidate_id: i64) -> Value {
        json!({ "id": candidate_id, "name": item })
    }

    async fn create(&mut self, payload: &Value) -> Result<Option<Value>> {
        self.client.post("/api/objects/quantity_units", payload).await.map(Some)
    }
}

#[tokio::test]
async fn reconciliation_creates_missing_units_through_the_client() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/api/objects/quantity_units"))
        .respond_with(|req: &Request| -> ResponseTemplate {
            // Echo the record back, as the real service does.
            let sent: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            ResponseTemplate::new(200).set_body_json(sent)
        })
        .expect(1)
        .mount(&server)
        .await;

    let repo = Arc::new(StaticRepository::pointing_at(&server.uri()));
    let governor = InstanceGovernor::new(repo);
    let client = governor.client_for("pantry").await.unwrap();

    let manifest = vec!["kg".to_string(), "g".to_string()];
    let existing = vec![json!({ "id": 1, "name": "kg" })];

    let mut strategy = QuantityUnitSync { client: &client };
    let outcome = synchronize(&mut strategy, &manifest, &existing).await.unwrap();

    assert_eq!(outcome.identifier_by_key.get("kg"), Some(&1));
    assert_eq!(outcome.identifier_by_key.get("g"), Some(&2));
    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.created[0].key, "g");
    assert_eq!(outcome.created[0].identifier, 2);
}
