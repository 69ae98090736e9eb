//! Shared fixtures for HTTP integration tests.

use std::sync::Arc;

use axum::http::header::SET_COOKIE;
use axum_test::{TestResponse, TestServer};
use cookie::Cookie;
use todoapi_service::app_with_logger;
use todoapi_service_shared::test_utils::{seed_user, test_state, RecordingLogger, TEST_PASSWORD};
use todoapi_service_shared::AppState;

#[allow(dead_code)]
pub const USERNAME: &str = "alice";

pub struct TestApp {
    pub server: TestServer,
    #[allow(dead_code)]
    pub state: AppState,
    #[allow(dead_code)]
    pub logger: Arc<RecordingLogger>,
}

/// Server over a fresh in-memory database holding one user, [`USERNAME`].
pub fn test_app() -> TestApp {
    let state = test_state();
    seed_user(&state, USERNAME);
    let logger = Arc::new(RecordingLogger::default());
    let server = TestServer::new(app_with_logger(state.clone(), logger.clone()))
        .expect("failed to start test server");
    TestApp {
        server,
        state,
        logger,
    }
}

/// `Set-Cookie` values of `response`.
#[allow(dead_code)]
pub fn set_cookies(response: &TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().expect("ascii cookie").to_string())
        .collect()
}

/// `name=value` pair (without attributes) of the `Set-Cookie` named `name`.
#[allow(dead_code)]
pub fn cookie_pair(response: &TestResponse, name: &str) -> String {
    set_cookies(response)
        .into_iter()
        .filter_map(|c| Cookie::parse(c).ok())
        .find(|c| c.name() == name)
        .map(|c| c.stripped().to_string())
        .unwrap_or_else(|| panic!("no {name} cookie set"))
}

/// Log in as [`USERNAME`], returning the login response.
#[allow(dead_code)]
pub async fn login(app: &TestApp) -> TestResponse {
    app.server
        .post("/api/v1/auth/login")
        .json(&serde_json::json!({"username": USERNAME, "password": TEST_PASSWORD}))
        .await
}
