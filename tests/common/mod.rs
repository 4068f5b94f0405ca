use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oauth_relay::auth::identity::{ProviderGrant, ProviderProfile};
use oauth_relay::auth::provider::IdentityProvider;
use oauth_relay::auth::session::{
    set_cookie_value, MemorySessionStore, SessionData, SessionStore, Sessions,
};
use oauth_relay::config::{NotifierConfig, ServerConfig, SessionConfig};
use oauth_relay::error::{RelayError, Result};
use oauth_relay::{build_router, AppState, InMemoryTokenStore, LocalAppNotifier, NotifyOutcome};

pub const GOOD_CODE: &str = "good-code";
pub const ACCESS_TOKEN: &str = "ya29.test-access-token";
pub const HOME_PAGE: &str = "<h1>relay home</h1>";
pub const SESSION_COOKIE: &str = "relay.sid";
pub const STATE_COOKIE: &str = "relay.oauth_state";

/// In-process identity provider. Accepts [`GOOD_CODE`] and rejects anything
/// else, recording every code it was asked to exchange.
pub struct FakeIdentityProvider {
    pub access_token: String,
    pub profile: ProviderProfile,
    pub exchanged: Mutex<Vec<String>>,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self {
            access_token: ACCESS_TOKEN.to_string(),
            profile: ProviderProfile {
                id: "109876543210".to_string(),
                display_name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            },
            exchanged: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn exchange_count(&self) -> usize {
        self.exchanged.lock().expect("lock").len()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorization_url(&self, state: &str) -> Result<String> {
        Ok(format!(
            "https://accounts.example.test/o/oauth2/auth?scope=profile+email&prompt=select_account&state={state}"
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderGrant> {
        self.exchanged.lock().expect("lock").push(code.to_string());
        if code != GOOD_CODE {
            return Err(RelayError::Authentication("invalid_grant".to_string()).into());
        }
        Ok(ProviderGrant {
            access_token: self.access_token.clone(),
            profile: self.profile.clone(),
        })
    }
}

/// Session backend whose every operation fails, standing in for an
/// unavailable store.
pub struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn load(&self, _id: &str) -> Result<Option<SessionData>> {
        Err(RelayError::Session("session store unavailable".to_string()).into())
    }

    async fn save(&self, _id: &str, _data: SessionData) -> Result<()> {
        Err(RelayError::Session("session store unavailable".to_string()).into())
    }

    async fn destroy(&self, _id: &str) -> Result<()> {
        Err(RelayError::Session("session store unavailable".to_string()).into())
    }
}

/// A fully wired router backed by a fake provider and a mock desktop
/// listener.
pub struct TestApp {
    pub router: Router,
    pub tokens: Arc<InMemoryTokenStore>,
    pub provider: Arc<FakeIdentityProvider>,
    pub notifications: mpsc::UnboundedReceiver<NotifyOutcome>,
    pub desktop: MockServer,
    _public: TempDir,
}

/// Result of a completed browser sign-in.
#[allow(dead_code)]
pub struct SignIn {
    /// `Cookie` header value carrying the authenticated session
    pub cookie: String,
    pub status: StatusCode,
    pub html: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let desktop = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/callback"))
            .respond_with(ResponseTemplate::new(200).set_body_string("token received"))
            .mount(&desktop)
            .await;
        let notifier_url = format!("{}/callback", desktop.uri());
        Self::build(desktop, &notifier_url, Arc::new(MemorySessionStore::new())).await
    }

    /// Same as [`TestApp::spawn`] but backed by the given session store.
    #[allow(dead_code)]
    pub async fn spawn_with_sessions(store: Arc<dyn SessionStore>) -> Self {
        let desktop = MockServer::start().await;
        let notifier_url = format!("{}/callback", desktop.uri());
        Self::build(desktop, &notifier_url, store).await
    }

    #[allow(dead_code)]
    pub async fn spawn_with(desktop: MockServer, notifier_url: &str) -> Self {
        Self::build(desktop, notifier_url, Arc::new(MemorySessionStore::new())).await
    }

    async fn build(desktop: MockServer, notifier_url: &str, store: Arc<dyn SessionStore>) -> Self {
        let public = TempDir::new().expect("tempdir");
        write_index(public.path());

        let tokens = Arc::new(InMemoryTokenStore::new());
        let provider = Arc::new(FakeIdentityProvider::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = LocalAppNotifier::new(&NotifierConfig {
            callback_url: notifier_url.to_string(),
            timeout_seconds: 2,
        })
        .expect("notifier")
        .with_completion_channel(tx);
        let sessions = Sessions::new(store, &SessionConfig::default());

        let state = AppState::new(
            tokens.clone(),
            provider.clone(),
            sessions,
            Arc::new(notifier),
            public.path(),
        );
        let router = build_router(state, &ServerConfig::default()).expect("router");

        Self {
            router,
            tokens,
            provider,
            notifications: rx,
            desktop,
            _public: public,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(Body::empty()).expect("request"))
            .await
    }

    /// Starts the consent redirect and returns `(state cookie, state)`.
    pub async fn begin_sign_in(&self) -> (String, String) {
        let response = self.get("/auth/google", &[]).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = header(&response, LOCATION.as_str()).expect("location");
        let state = url::Url::parse(&location)
            .expect("location is a URL")
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .expect("state parameter");
        (state_cookie(&response).expect("state cookie"), state)
    }

    /// Runs `/auth/google` then the callback with [`GOOD_CODE`].
    pub async fn sign_in(&self) -> SignIn {
        let (cookie, state) = self.begin_sign_in().await;
        let uri = format!("/auth/google/callback?code={GOOD_CODE}&state={state}");
        let response = self.get(&uri, &[("cookie", cookie.as_str())]).await;
        let status = response.status();
        let cookie = session_cookie(&response).unwrap_or(cookie);
        let html = body_text(response).await;
        SignIn {
            cookie,
            status,
            html,
        }
    }

    /// Waits for the next notifier outcome.
    #[allow(dead_code)]
    pub async fn next_notification(&mut self) -> NotifyOutcome {
        tokio::time::timeout(Duration::from_secs(5), self.notifications.recv())
            .await
            .expect("notification within timeout")
            .expect("notifier channel open")
    }
}

fn write_index(dir: &Path) {
    std::fs::write(dir.join("index.html"), HOME_PAGE).expect("write index.html");
}

/// `relay.sid=<id>` taken from a response's `Set-Cookie`.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    set_cookie_value(response.headers(), SESSION_COOKIE)
        .filter(|id| !id.is_empty())
        .map(|id| format!("{SESSION_COOKIE}={id}"))
}

/// `relay.oauth_state=<nonce>` taken from a response's `Set-Cookie`.
pub fn state_cookie(response: &Response<Body>) -> Option<String> {
    set_cookie_value(response.headers(), STATE_COOKIE)
        .filter(|nonce| !nonce.is_empty())
        .map(|nonce| format!("{STATE_COOKIE}={nonce}"))
}

/// Whether the response expires cookie `name` (`name=` with `Max-Age=0`).
#[allow(dead_code)]
pub fn clears_cookie(response: &Response<Body>, name: &str) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&format!("{name}=;")) && v.contains("Max-Age=0"))
}

pub fn header(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}
