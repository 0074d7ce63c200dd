use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use mqgate_api::app::services::AppServices;
use mqgate_auth::{ClientClaims, Hs256TokenIssuer, InMemoryClientDirectory};
use mqgate_core::ClientId;
use mqgate_infra::{BrokerBridge, InMemoryBroker};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod, in-memory backends, ephemeral port.
    async fn spawn(broker: &InMemoryBroker) -> Self {
        let services = AppServices::new(
            BrokerBridge::new(Arc::new(broker.clone())),
            Arc::new(InMemoryClientDirectory::new()),
            Arc::new(Hs256TokenIssuer::new(JWT_SECRET, ChronoDuration::hours(1))),
        );
        let app = mqgate_api::app::build_router(services, JWT_SECRET);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    /// Register a client and log in with its API key.
    async fn login_new_client(&self, name: &str) -> String {
        let (status, created) = self.post("/clients", None, json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .post("/authenticate-client/login", None, json!({ "apiKey": created["apiKey"] }))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["accessToken"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str) -> String {
    let now = Utc::now();
    let claims = ClientClaims::new(ClientId::new(), "minted", now, now + ChronoDuration::minutes(10));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn send_body(queue: &str, message: &str) -> Value {
    json!({
        "server": "localhost",
        "port": 5672,
        "user": "guest",
        "password": "guest",
        "vhost": "/",
        "queue": queue,
        "message": message,
    })
}

fn receive_body(queue: &str) -> Value {
    json!({
        "server": "localhost",
        "port": 5672,
        "user": "guest",
        "password": "guest",
        "vhost": "/",
        "queue": queue,
    })
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(&InMemoryBroker::new()).await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "API - mqgate is running!");
}

#[tokio::test]
async fn bearer_required_before_broker_is_touched() {
    let broker = InMemoryBroker::new();
    broker.declare_queue("/", "orders");
    let srv = TestServer::spawn(&broker).await;

    let (status, body) = srv.post("/mq/send", None, send_body("orders", "hello")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let forged = mint_jwt("some-other-secret");
    let (status, _) = srv.post("/mq/receive", Some(&forged), receive_body("orders")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(broker.stats().connections_opened, 0);
    assert_eq!(broker.depth("/", "orders"), Some(0));
}

#[tokio::test]
async fn send_then_receive_round_trips_through_the_bridge() {
    let broker = InMemoryBroker::new();
    broker.declare_queue("/", "orders");
    let srv = TestServer::spawn(&broker).await;
    let token = srv.login_new_client("acme").await;

    let (status, body) = srv.post("/mq/send", Some(&token), send_body("orders", "hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, body) = srv.post("/mq/receive", Some(&token), receive_body("orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "hello" }));

    let (status, body) = srv.post("/mq/receive", Some(&token), receive_body("orders")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no_message");

    let stats = broker.stats();
    assert_eq!(stats.connections_opened, 3);
    assert_eq!(stats.open_connections(), 0);
}

#[tokio::test]
async fn externally_minted_token_is_accepted() {
    let broker = InMemoryBroker::new();
    broker.declare_queue("/", "orders");
    let srv = TestServer::spawn(&broker).await;

    let (status, _) = srv
        .post("/mq/send", Some(&mint_jwt(JWT_SECRET)), send_body("orders", "x"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(broker.depth("/", "orders"), Some(1));
}

#[tokio::test]
async fn missing_queue_is_404_and_connection_released() {
    let broker = InMemoryBroker::new();
    let srv = TestServer::spawn(&broker).await;
    let token = mint_jwt(JWT_SECRET);

    let (status, body) = srv.post("/mq/send", Some(&token), send_body("orders", "hello")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "queue_not_found");
    assert_eq!(body["message"], "the queue \"orders\" does not exist");

    assert_eq!(broker.stats().connections_opened, 1);
    assert_eq!(broker.stats().open_connections(), 0);
}

#[tokio::test]
async fn unreachable_broker_is_502() {
    let broker = InMemoryBroker::new().with_credentials("svc", "secret");
    let srv = TestServer::spawn(&broker).await;

    let (status, body) = srv
        .post("/mq/receive", Some(&mint_jwt(JWT_SECRET)), receive_body("orders"))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "broker_unavailable");
    assert!(!body["message"].as_str().unwrap().contains("guest"));
}

#[tokio::test]
async fn invalid_parameters_are_400_without_network_io() {
    let broker = InMemoryBroker::new();
    broker.declare_queue("/", "orders");
    let srv = TestServer::spawn(&broker).await;
    let token = mint_jwt(JWT_SECRET);

    let mut zero_port = send_body("orders", "hello");
    zero_port["port"] = json!(0);
    let (status, body) = srv.post("/mq/send", Some(&token), zero_port).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = srv.post("/mq/send", Some(&token), send_body("  ", "hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = srv
        .post("/mq/receive", Some(&token), json!({ "server": "localhost" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    assert_eq!(broker.stats().connections_opened, 0);
}

#[tokio::test]
async fn unknown_api_key_is_404() {
    let srv = TestServer::spawn(&InMemoryBroker::new()).await;

    let (status, body) = srv
        .post("/authenticate-client/login", None, json!({ "apiKey": "nope" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Client not found");
}

#[tokio::test]
async fn client_update_rotates_key_and_delete_is_idempotent_404() {
    let srv = TestServer::spawn(&InMemoryBroker::new()).await;

    let (status, created) = srv.post("/clients", None, json!({ "name": "acme" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = srv.post("/clients", None, json!({ "name": "acme" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let res = srv
        .client
        .put(srv.url(&format!("/clients/{id}")))
        .json(&json!({ "name": "acme-2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "acme-2");
    assert_ne!(updated["apiKey"], created["apiKey"]);

    let (status, _) = srv
        .post("/authenticate-client/login", None, json!({ "apiKey": created["apiKey"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = srv
        .post("/authenticate-client/login", None, json!({ "apiKey": updated["apiKey"] }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let delete = || srv.client.delete(srv.url(&format!("/clients/{id}"))).send();
    assert_eq!(delete().await.unwrap().status(), StatusCode::NO_CONTENT);
    assert_eq!(delete().await.unwrap().status(), StatusCode::NOT_FOUND);

    let res = srv.client.delete(srv.url("/clients/not-a-uuid")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
