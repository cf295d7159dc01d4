use crate::config::Settings;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client id pre-registered by the server at startup.
const SEEDED_CLIENT_ID: &str = "91be729f-30be-4614-b93f-f2b4a7ec8a98";

/// Test fixture wiring the full application against a mocked GitHub.
///
/// The fixture starts a wiremock server standing in for GitHub's OAuth and
/// API endpoints, builds the application around it, and provides helpers
/// for making requests and for walking whole authorization flows.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     fixture.mock_github_exchange("ghu_token").await;
///
///     let token = fixture.obtain_access_token().await;
///     let response = fixture.get_with_bearer("/user", &token).await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration settings
    pub settings: Settings,
    /// Mock server standing in for GitHub
    pub github_mock: MockServer,
}

impl TestFixture {
    /// Creates a new test fixture with a mocked GitHub backend.
    pub async fn new() -> Self {
        Self::with_settings_modifier(|_| {}).await
    }

    /// Creates a fixture whose settings are adjusted before the app is built.
    ///
    /// The modifier runs after the mocked GitHub endpoints are wired in, so a
    /// test can override individual fields on top of a working baseline.
    pub async fn with_settings_modifier(modify: impl FnOnce(&mut Settings)) -> Self {
        // Initialize test logger
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let github_mock = MockServer::start().await;
        let mut settings = Settings::for_test_with_mocks(&github_mock);
        modify(&mut settings);
        let state = AppState::for_testing(&settings);
        let app = create_app(state).await;

        Self {
            app,
            settings,
            github_mock,
        }
    }

    /// Creates a request builder for the given method and URI.
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder().method(method).uri(uri.as_ref())
    }

    /// Sends a GET request to the specified URI.
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a GET request carrying a bearer token.
    pub async fn get_with_bearer(&self, uri: impl AsRef<str>, token: &str) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a GET request with custom headers.
    pub async fn get_with_headers(
        &self,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = self.request_builder(Method::GET, uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::POST, uri)
            .header("Content-Type", "application/json")
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a POST request with a form-encoded body.
    pub async fn post_form(&self, uri: impl AsRef<str>, body: &str) -> TestResponse {
        let request = self
            .request_builder(Method::POST, uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object when the body is
        // empty or not JSON (redirects have no body)
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }

    /// Mounts a GitHub code exchange answering with the given token.
    pub async fn mock_github_exchange(&self, github_token: &str) {
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": github_token,
                "token_type": "bearer",
                "scope": "read:user"
            })))
            .mount(&self.github_mock)
            .await;
    }

    /// Mounts a GitHub code exchange that rejects the code. GitHub answers
    /// 200 and reports the failure in the body.
    pub async fn mock_github_exchange_rejection(&self, error: &str, description: &str) {
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": error,
                "error_description": description
            })))
            .mount(&self.github_mock)
            .await;
    }

    /// Mounts the GitHub user endpoint for the given token, expecting
    /// exactly `expected_calls` requests.
    pub async fn mock_github_user(&self, github_token: &str, profile: Value, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header(
                "Authorization",
                format!("Bearer {github_token}").as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .expect(expected_calls)
            .mount(&self.github_mock)
            .await;
    }

    /// Mounts a failing GitHub user endpoint.
    pub async fn mock_github_user_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.github_mock)
            .await;
    }

    /// Runs /authorize and /github/callback for the seeded client and
    /// returns the minted authorization code. The GitHub exchange must be
    /// mocked first.
    pub async fn authorize_and_callback(&self) -> String {
        let authorize = self
            .get(format!(
                "/authorize?response_type=code&client_id={SEEDED_CLIENT_ID}"
            ))
            .await;
        authorize.assert_status(StatusCode::FOUND);
        let state = query_param(&authorize.location(), "state").expect("state missing");

        let callback = self
            .get(format!("/github/callback?code=ghcode&state={state}"))
            .await;
        callback.assert_status(StatusCode::FOUND);
        query_param(&callback.location(), "code").expect("code missing")
    }

    /// Runs the full authorization flow for the seeded client and returns
    /// a bearer token.
    pub async fn obtain_access_token(&self) -> String {
        let code = self.authorize_and_callback().await;
        let response = self
            .post_form(
                "/token",
                &format!("grant_type=authorization_code&code={code}&client_id={SEEDED_CLIENT_ID}"),
            )
            .await;
        response.assert_ok();
        response.json["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }
}

/// Extracts a query parameter from a redirect URL.
fn query_param(location: &str, name: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Response from a test request with convenient access to status, headers,
/// and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as JSON (empty object for empty bodies)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Returns a response header as a string, when present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the Location header of a redirect.
    ///
    /// # Panics
    ///
    /// Panics if the response has no Location header.
    pub fn location(&self) -> String {
        self.header("location")
            .expect("Response has no Location header")
            .to_string()
    }
}
