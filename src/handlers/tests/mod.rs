use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::auth::{AuthenticatedUser, Claims, TokenIssuer};
use crate::config::AppConfig;
use crate::routes;
use crate::state::AppState;
use crate::store::store_mock::StoreMock;
use crate::store::StoreError;
use crate::types::Role;


use sample_data::{at, fill_sample_data, EDITOR_ID, EMPLOYEE_ID, OTHER_EMPLOYEE_ID};

const SECRET: &str = "handler-test-secret";

struct TestApp {
    store: Arc<StoreMock>,
    tokens: TokenIssuer,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(StoreMock::default());
        fill_sample_data(&store);
        let tokens = TokenIssuer::new(SECRET, 1).unwrap();
        let state = AppState::new(store.clone(), tokens.clone());
        let router = routes::app(state, &AppConfig::development());
        Self {
            store,
            tokens,
            router,
        }
    }

    fn token_for(&self, user_id: i32, role: Role) -> String {
        self.tokens
            .issue(&AuthenticatedUser {
                user_id,
                username: format!("user{}", user_id),
                role,
            })
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn fail_next_store_call(&self) {
        self.store.data.lock().unwrap().next_error = Some(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

// --- login -----------------------------------------------------------------

#[tokio::test]
async fn login_with_correct_credentials_returns_token() {
    let app = TestApp::new();
    let (status, body) = app
        .send(request(
            Method::POST,
            "/login",
            None,
            r#"{"login":"olga","password":"correct horse"}"#,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());

    let claims = app.tokens.decode(token).unwrap();
    assert_eq!(claims.user_id, Some(EMPLOYEE_ID));
    assert_eq!(claims.role, Some(Role::Employee.code()));
}

#[tokio::test]
async fn login_failures_share_one_generic_message() {
    let app = TestApp::new();
    let (wrong_password_status, wrong_password) = app
        .send(request(
            Method::POST,
            "/login",
            None,
            r#"{"login":"olga","password":"wrong"}"#,
        ))
        .await;
    let (unknown_login_status, unknown_login) = app
        .send(request(
            Method::POST,
            "/login",
            None,
            r#"{"login":"nobody","password":"correct horse"}"#,
        ))
        .await;

    assert_eq!(wrong_password_status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_login_status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password, unknown_login);
    assert_eq!(wrong_password["status"], "Error");
    assert_eq!(wrong_password["error"], "invalid login or password");
    assert!(wrong_password.get("token").is_none());
}

#[tokio::test]
async fn login_rejects_empty_and_malformed_bodies_before_store() {
    let app = TestApp::new();

    let (status, body) = app.send(request(Method::POST, "/login", None, "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty request");

    let (status, body) = app
        .send(request(Method::POST, "/login", None, r#"{"login": "olga""#))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "failed to decode request");

    let (status, body) = app
        .send(request(Method::POST, "/login", None, r#"{"login":"olga"}"#))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("password").is_some());

    assert!(app.store.calls().is_empty());
}

#[tokio::test]
async fn login_store_failure_is_server_error() {
    let app = TestApp::new();
    app.fail_next_store_call();
    let (status, body) = app
        .send(request(
            Method::POST,
            "/login",
            None,
            r#"{"login":"olga","password":"correct horse"}"#,
        ))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "failed to log in");
}

// --- me --------------------------------------------------------------------

#[tokio::test]
async fn me_echoes_token_identity() {
    let app = TestApp::new();
    let token = app.token_for(EDITOR_ID, Role::ShopEditor);
    let (status, body) = app.send(request(Method::GET, "/me", Some(&token), "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "OK",
            "user": { "user_id": EDITOR_ID, "username": "user11", "role": 2 }
        })
    );
}

#[tokio::test]
async fn me_requires_bearer_token() {
    let app = TestApp::new();
    let (status, body) = app.send(request(Method::GET, "/me", None, "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "Error");

    let (status, _) = app
        .send(request(Method::GET, "/me", Some("not-a-jwt"), ""))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_without_identity_claims_is_server_error() {
    let app = TestApp::new();
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        user_id: Some(5),
        username: None,
        role: Some(1),
        exp: now + 600,
        iat: now,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();

    let (status, body) = app.send(request(Method::GET, "/me", Some(&token), "")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "no username in token");
}

// --- shop ------------------------------------------------------------------

#[tokio::test]
async fn shop_editor_deletes_item() {
    let app = TestApp::new();
    let token = app.token_for(EDITOR_ID, Role::ShopEditor);
    let (status, body) = app
        .send(request(Method::DELETE, "/shop/item", Some(&token), r#"{"item_id":101}"#))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK" }));
    assert_eq!(app.store.data.lock().unwrap().items, vec![100, 102]);
}

#[tokio::test]
async fn super_admin_deletes_item() {
    let app = TestApp::new();
    let token = app.token_for(1, Role::SuperAdmin);
    let (status, _) = app
        .send(request(Method::DELETE, "/shop/item", Some(&token), r#"{"item_id":100}"#))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.data.lock().unwrap().items, vec![101, 102]);
}

#[tokio::test]
async fn other_roles_are_denied_before_body_is_read() {
    let app = TestApp::new();
    for role in [Role::Employee, Role::ReservationEditor, Role::Other(9)] {
        let token = app.token_for(EMPLOYEE_ID, role);
        for body in [r#"{"item_id":101}"#, "", "{broken"] {
            let (status, response) = app
                .send(request(Method::DELETE, "/shop/item", Some(&token), body))
                .await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(response["error"], "access was denied");
        }
    }

    assert!(app.store.calls().is_empty());
    assert_eq!(app.store.data.lock().unwrap().items, vec![100, 101, 102]);
}

#[tokio::test]
async fn oversized_body_is_refused_in_envelope() {
    let app = TestApp::new();
    let limit = AppConfig::development().api.max_request_size_bytes;
    let oversized = format!(r#"{{"item_id":101,"pad":"{}"}}"#, "x".repeat(limit));

    let token = app.token_for(EMPLOYEE_ID, Role::Employee);
    let (status, body) = app
        .send(request(Method::DELETE, "/shop/item", Some(&token), &oversized))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "access was denied");

    let token = app.token_for(EDITOR_ID, Role::ShopEditor);
    let (status, body) = app
        .send(request(Method::DELETE, "/shop/item", Some(&token), &oversized))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "Error");

    assert!(app.store.calls().is_empty());
    assert_eq!(app.store.data.lock().unwrap().items, vec![100, 101, 102]);
}

#[tokio::test]
async fn delete_item_rejects_bad_bodies_without_store_call() {
    let app = TestApp::new();
    let token = app.token_for(EDITOR_ID, Role::ShopEditor);

    let (status, body) = app.send(request(Method::DELETE, "/shop/item", Some(&token), "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty request");

    let (status, body) = app
        .send(request(Method::DELETE, "/shop/item", Some(&token), r#"{"item_id":"x"}"#))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "failed to decode request");

    let (status, body) = app
        .send(request(Method::DELETE, "/shop/item", Some(&token), "{}"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("item_id").is_some());

    assert!(app.store.calls().is_empty());
}

#[tokio::test]
async fn delete_item_store_failure_is_unprocessable() {
    let app = TestApp::new();
    let token = app.token_for(EDITOR_ID, Role::ShopEditor);
    app.fail_next_store_call();

    let (status, body) = app
        .send(request(Method::DELETE, "/shop/item", Some(&token), r#"{"item_id":101}"#))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "failed to delete item from shop");
}

// --- availability ----------------------------------------------------------

fn places_uri(start: &str, finish: &str) -> String {
    format!("/reservation/places?start={}&finish={}", start, finish)
}

fn rows_for(body: &Value, place_id: i64) -> Vec<Value> {
    body["places"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|row| row["place_id"] == place_id)
        .cloned()
        .collect()
}

#[tokio::test]
async fn disjoint_period_lists_every_place_available() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);
    let (status, body) = app
        .send(request(
            Method::GET,
            &places_uri("2024-07-05T09:00:00", "2024-07-05T12:00:00"),
            Some(&token),
            "",
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["places"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["place_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    for place_id in 1..=3 {
        let rows = rows_for(&body, place_id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["is_available"], true);
        assert_eq!(rows[0]["user_id"], 0);
    }
}

#[tokio::test]
async fn overlapping_reservation_marks_place_unavailable() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);
    let (status, body) = app
        .send(request(
            Method::GET,
            &places_uri("2024-07-01T17:00:00", "2024-07-01T19:00:00"),
            Some(&token),
            "",
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let rows = rows_for(&body, 2);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["is_available"], false);
    assert_eq!(rows[0]["user_id"], OTHER_EMPLOYEE_ID);
    assert_eq!(rows[0]["start"], at(1, 9).and_utc().timestamp_millis());
    assert_eq!(rows[0]["finish"], at(1, 18).and_utc().timestamp_millis());

    let free = rows_for(&body, 1);
    assert_eq!(free.len(), 1);
    assert_eq!(free[0]["is_available"], true);
}

#[tokio::test]
async fn period_touching_reservation_end_is_available() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);
    let (_, body) = app
        .send(request(
            Method::GET,
            &places_uri("2024-07-01T18:00:00", "2024-07-01T20:00:00"),
            Some(&token),
            "",
        ))
        .await;

    let rows = rows_for(&body, 2);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["is_available"], true);
}

#[tokio::test]
async fn availability_requires_valid_period() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);

    let (status, body) = app
        .send(request(Method::GET, "/reservation/places", Some(&token), ""))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid period");

    let (status, _) = app
        .send(request(
            Method::GET,
            &places_uri("2024-07-01T20:00:00", "2024-07-01T18:00:00"),
            Some(&token),
            "",
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.store.calls().is_empty());
}

#[tokio::test]
async fn place_name_lookup() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);

    let (status, body) = app
        .send(request(Method::GET, "/reservation/places/3", Some(&token), ""))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["place"], json!({ "place_id": 3, "name": "B-201" }));

    let (status, body) = app
        .send(request(Method::GET, "/reservation/places/99", Some(&token), ""))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "place not found");
}

// --- reservations ----------------------------------------------------------

#[tokio::test]
async fn booking_overlapping_taken_place_fails() {
    let app = TestApp::new();
    let token = app.token_for(EDITOR_ID, Role::ShopEditor);
    let (status, body) = app
        .send(request(
            Method::POST,
            "/reservation",
            Some(&token),
            r#"{"place_id":2,"start":"2024-07-01T12:00:00","finish":"2024-07-01T20:00:00"}"#,
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "place is already taken");
    assert_eq!(app.store.data.lock().unwrap().reservations.len(), 2);
}

#[tokio::test]
async fn booking_free_period_is_listed_newest_first() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);

    let (status, body) = app
        .send(request(
            Method::POST,
            "/reservation",
            Some(&token),
            r#"{"place_id":2,"start":"2024-07-03T09:00:00","finish":"2024-07-03T18:00:00"}"#,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK" }));

    let (status, body) = app
        .send(request(Method::GET, "/reservation/my", Some(&token), ""))
        .await;
    assert_eq!(status, StatusCode::OK);
    let reservations = body["reservations"].as_array().unwrap();
    assert_eq!(reservations.len(), 2);
    assert_eq!(reservations[0]["place_id"], 2);
    assert_eq!(reservations[0]["start"], "2024-07-03T09:00:00");
    assert_eq!(reservations[1]["place_id"], 3);
    assert!(reservations.iter().all(|r| r["user_id"] == EMPLOYEE_ID));
}

#[tokio::test]
async fn user_cannot_hold_two_reservations_at_once() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);
    let (status, body) = app
        .send(request(
            Method::POST,
            "/reservation",
            Some(&token),
            r#"{"place_id":1,"start":"2024-07-02T10:00:00","finish":"2024-07-02T11:00:00"}"#,
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "user already has a reservation in this period");
    assert!(!app.store.calls().contains(&"insert_reservation"));
}

#[tokio::test]
async fn rebooking_own_place_reports_place_taken() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);
    let (status, body) = app
        .send(request(
            Method::POST,
            "/reservation",
            Some(&token),
            r#"{"place_id":3,"start":"2024-07-02T10:00:00","finish":"2024-07-02T11:00:00"}"#,
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "place is already taken");
    assert_eq!(app.store.data.lock().unwrap().reservations.len(), 2);
}

#[tokio::test]
async fn missing_timestamps_fail_validation() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);

    let (status, body) = app
        .send(request(
            Method::POST,
            "/reservation",
            Some(&token),
            r#"{"place_id":1,"finish":"2024-07-03T10:00:00"}"#,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("start").is_some());

    let (status, body) = app
        .send(request(
            Method::PUT,
            "/reservation",
            Some(&token),
            r#"{"reservation_id":2,"place_id":1,"start":"2024-07-03T10:00:00"}"#,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("finish").is_some());

    assert!(app.store.calls().is_empty());
}

#[tokio::test]
async fn booking_requires_finish_after_start() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);
    for body in [
        r#"{"place_id":1,"start":"2024-07-03T10:00:00","finish":"2024-07-03T10:00:00"}"#,
        r#"{"place_id":1,"start":"2024-07-03T11:00:00","finish":"2024-07-03T10:00:00"}"#,
    ] {
        let (status, response) = app
            .send(request(Method::POST, "/reservation", Some(&token), body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response["field_errors"].get("finish").is_some());
    }

    let (status, _) = app
        .send(request(
            Method::POST,
            "/reservation",
            Some(&token),
            r#"{"start":"2024-07-03T10:00:00","finish":"2024-07-03T11:00:00"}"#,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.store.calls().is_empty());
}

#[tokio::test]
async fn update_and_delete_reservation() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);

    let (status, _) = app
        .send(request(
            Method::PUT,
            "/reservation",
            Some(&token),
            r#"{"reservation_id":2,"place_id":1,"start":"2024-07-04T09:00:00","finish":"2024-07-04T12:00:00"}"#,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    {
        let data = app.store.data.lock().unwrap();
        let moved = data.reservations.iter().find(|r| r.reservation_id == 2).unwrap();
        assert_eq!(moved.place_id, 1);
        assert_eq!(moved.start, at(4, 9));
        assert_eq!(moved.finish, at(4, 12));
    }

    let (status, _) = app
        .send(request(Method::DELETE, "/reservation", Some(&token), r#"{"reservation_id":2}"#))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app
        .store
        .data
        .lock()
        .unwrap()
        .reservations
        .iter()
        .all(|r| r.reservation_id != 2));
}

#[tokio::test]
async fn reservation_store_failures_are_unprocessable() {
    let app = TestApp::new();
    let token = app.token_for(EMPLOYEE_ID, Role::Employee);

    app.fail_next_store_call();
    let (status, body) = app
        .send(request(Method::DELETE, "/reservation", Some(&token), r#"{"reservation_id":1}"#))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "failed to delete reservation");

    app.fail_next_store_call();
    let (status, body) = app
        .send(request(Method::GET, "/reservation/my", Some(&token), ""))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "failed to get reservations");
}

// --- health ----------------------------------------------------------------

#[tokio::test]
async fn health_reports_database_state() {
    let app = TestApp::new();
    let (status, body) = app.send(request(Method::GET, "/health", None, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK", "database": "ok" }));

    app.fail_next_store_call();
    let (status, body) = app.send(request(Method::GET, "/health", None, "")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "database unavailable");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(request(Method::GET, "/health", None, ""))
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
