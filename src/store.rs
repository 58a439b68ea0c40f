//! Credential store: the operations a user drives (login, logout, account
//! flows) on top of the shared session, the auth API and the navigator.

use crate::{
    api::{AuthApi, Credentials},
    config::ClientConfig,
    error::{Error, Result},
    navigation::{Navigator, View},
    session::{Session, SessionState, User},
    storage::TokenStorage,
    transport::Transport,
    validators::{validate, Rule},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, instrument, warn};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

pub struct AuthStore {
    session: Arc<SessionState>,
    api: AuthApi,
    navigator: Arc<dyn Navigator>,
    last_error: Mutex<Option<String>>,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("session", &self.session)
            .field("last_error", &self.last_error())
            .finish_non_exhaustive()
    }
}

impl AuthStore {
    /// Wraps an API client, sharing its transport's session and navigator.
    #[must_use]
    pub fn new(api: AuthApi) -> Self {
        let session = api.transport().session().clone();
        let navigator = api.transport().navigator().clone();
        Self {
            session,
            api,
            navigator,
            last_error: Mutex::new(None),
        }
    }

    /// Hydrates the session from `storage` and wires the transport.
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn connect(
        config: ClientConfig,
        storage: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let session = Arc::new(SessionState::hydrate(storage));
        let transport = Transport::new(config, session, navigator)?;
        Ok(Self::new(AuthApi::new(Arc::new(transport))))
    }

    #[must_use]
    pub fn api(&self) -> &AuthApi {
        &self.api
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.session.snapshot()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    /// Message from the most recent failed login, cleared on success.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_last_error(&self, message: Option<String>) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = message;
    }

    /// # Errors
    /// Returns [`Error::Validation`] for bad input, [`Error::InvalidResponse`] when the
    /// backend omits a token, or the transport error. The session is untouched on failure.
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        match self.try_login(credentials).await {
            Ok(()) => {
                self.set_last_error(None);
                info!("login succeeded");
                self.navigator.navigate(View::LANDING);
                Ok(())
            }
            Err(err) => {
                error!("Login failed: {err}");
                self.set_last_error(Some(login_error_message(&err)));
                Err(err)
            }
        }
    }

    async fn try_login(&self, credentials: &Credentials) -> Result<()> {
        check(&credentials.email, &[Rule::Required, Rule::Email])?;
        check(credentials.password.expose_secret(), &[Rule::Required])?;

        let response = self.api.login(credentials).await?;

        let (Some(access), Some(refresh)) = (
            response.access.filter(|token| !token.is_empty()),
            response.refresh.filter(|token| !token.is_empty()),
        ) else {
            return Err(Error::InvalidResponse(
                "Login response is missing tokens".to_string(),
            ));
        };

        self.session
            .set_tokens(SecretString::from(access), SecretString::from(refresh))?;

        match response.user.and_then(User::from_value) {
            Some(user) => self.session.set_user(Some(user)),
            None => {
                self.fetch_user_profile().await?;
            }
        }

        Ok(())
    }

    /// Clears the session and durable tokens, then shows the login view.
    pub fn logout(&self) {
        self.session.clear();
        info!("logged out");
        self.navigator.navigate(View::Login);
    }

    /// Refreshes through the transport's single-flight path.
    /// # Errors
    /// Returns [`Error::RefreshFailed`]; the session is already cleared by then.
    pub async fn refresh_access_token(&self) -> Result<SecretString> {
        self.api.transport().refresh_access_token().await
    }

    /// Fetches and stores the profile. Any failure ends the session.
    /// # Errors
    /// Propagates the fetch error after logging out.
    #[instrument(skip(self))]
    pub async fn fetch_user_profile(&self) -> Result<User> {
        let result = self
            .api
            .get_user_profile()
            .await
            .and_then(profile_from_value);

        match result {
            Ok(user) => {
                self.session.set_user(Some(user.clone()));
                Ok(user)
            }
            Err(err) => {
                error!("Failed to fetch user profile: {err}");
                self.logout();
                Err(err)
            }
        }
    }

    /// # Errors
    /// Propagates the update error; the session is kept.
    #[instrument(skip(self, fields))]
    pub async fn update_user_profile(&self, fields: &Value) -> Result<User> {
        let user = self
            .api
            .update_user_profile(fields)
            .await
            .and_then(profile_from_value)
            .map_err(|err| logged("Failed to update profile", err))?;
        self.session.set_user(Some(user.clone()));
        Ok(user)
    }

    /// Validates `email`, `password` and `password2` when present, then
    /// creates the account.
    /// # Errors
    /// Returns [`Error::Validation`] or the transport error.
    #[instrument(skip(self, data))]
    pub async fn register(&self, data: &Value) -> Result<Value> {
        let field = |name: &str| data.get(name).and_then(Value::as_str);

        if let Some(email) = field("email") {
            check(email, &[Rule::Required, Rule::Email])?;
        }
        if let Some(password) = field("password") {
            check(password, &[Rule::Required, Rule::PasswordStrength])?;
            if let Some(confirmation) = field("password2") {
                check(confirmation, &[Rule::PasswordMatch(password.to_string())])?;
            }
        }

        let response = self
            .api
            .register(data)
            .await
            .map_err(|err| logged("Registration failed", err))?;
        self.navigator.navigate(View::VerifyEmail);
        Ok(response)
    }

    /// # Errors
    /// Propagates the transport error.
    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str) -> Result<Value> {
        let response = self
            .api
            .verify_email(token)
            .await
            .map_err(|err| logged("Email verification failed", err))?;
        self.navigator.navigate(View::Login);
        Ok(response)
    }

    /// # Errors
    /// Returns [`Error::Validation`] for a malformed email or the transport error.
    #[instrument(skip(self, email))]
    pub async fn request_password_reset(&self, email: &str) -> Result<Value> {
        check(email, &[Rule::Required, Rule::Email])?;
        self.api
            .request_password_reset(email)
            .await
            .map_err(|err| logged("Password reset request failed", err))
    }

    /// # Errors
    /// Returns [`Error::Validation`] for a weak password or the transport error.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &SecretString) -> Result<Value> {
        check(
            new_password.expose_secret(),
            &[Rule::Required, Rule::PasswordStrength],
        )?;
        let response = self
            .api
            .reset_password(token, new_password)
            .await
            .map_err(|err| logged("Password reset failed", err))?;
        self.navigator.navigate(View::Login);
        Ok(response)
    }

    /// Starts TOTP enrollment; the response carries the secret and QR payload.
    /// # Errors
    /// Propagates the transport error.
    #[instrument(skip(self))]
    pub async fn setup_2fa(&self) -> Result<Value> {
        self.api
            .setup_2fa()
            .await
            .map_err(|err| logged("2FA setup failed", err))
    }

    /// # Errors
    /// Propagates the transport error.
    #[instrument(skip(self, token))]
    pub async fn verify_2fa(&self, token: &str) -> Result<Value> {
        let response = self
            .api
            .verify_2fa(token)
            .await
            .map_err(|err| logged("2FA verification failed", err))?;
        self.navigator.navigate(View::Profile);
        Ok(response)
    }

    /// Disables 2FA, then reloads the stored profile if possible.
    /// # Errors
    /// Propagates the transport error of the disable call only.
    #[instrument(skip(self, token, password))]
    pub async fn disable_2fa(&self, token: &str, password: &SecretString) -> Result<Value> {
        let response = self
            .api
            .disable_2fa(token, password)
            .await
            .map_err(|err| logged("Disabling 2FA failed", err))?;

        match self.api.get_user_profile().await.and_then(profile_from_value) {
            Ok(user) => self.session.set_user(Some(user)),
            Err(err) => warn!("profile reload after disabling 2FA failed: {err}"),
        }

        Ok(response)
    }

    /// Deletes the account, ends the session and shows the farewell view.
    /// # Errors
    /// Propagates the transport error; the session is kept in that case.
    #[instrument(skip(self, password))]
    pub async fn delete_account(&self, password: &SecretString) -> Result<Value> {
        let response = self
            .api
            .delete_account(password)
            .await
            .map_err(|err| logged("Account deletion failed", err))?;
        self.logout();
        self.navigator.navigate(View::AccountDeleted);
        Ok(response)
    }

    /// # Errors
    /// Propagates the transport error.
    #[instrument(skip(self, data))]
    pub async fn create_admin_account(&self, data: &Value) -> Result<Value> {
        let response = self
            .api
            .create_admin_account(data)
            .await
            .map_err(|err| logged("Admin account creation failed", err))?;
        self.navigator.navigate(View::Dashboard);
        Ok(response)
    }
}

fn check(value: &str, rules: &[Rule]) -> Result<()> {
    validate(value, rules).map_err(Error::Validation)
}

fn logged(context: &str, err: Error) -> Error {
    error!("{context}: {err}");
    err
}

fn profile_from_value(value: Value) -> Result<User> {
    User::from_value(value)
        .ok_or_else(|| Error::InvalidResponse("profile is not a JSON object".to_string()))
}

/// User-facing text for a failed login.
fn login_error_message(err: &Error) -> String {
    match err {
        Error::Http {
            detail: Some(detail),
            ..
        } => detail.clone(),
        Error::Validation(message) | Error::InvalidResponse(message) => message.clone(),
        _ => LOGIN_FAILED_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use crate::transport::REFRESH_PATH;
    use serde_json::json;
    use std::{net::TcpListener, time::Duration};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    #[derive(Default)]
    struct RecordingNavigator {
        visited: Mutex<Vec<View>>,
    }

    impl RecordingNavigator {
        fn visited(&self) -> Vec<View> {
            self.visited.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, view: View) {
            self.visited.lock().unwrap().push(view);
        }
    }

    struct Fixture {
        store: AuthStore,
        storage: Arc<MemoryStorage>,
        navigator: Arc<RecordingNavigator>,
    }

    fn fixture(server: &MockServer, tokens: Option<(&str, &str)>) -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        if let Some((access, refresh)) = tokens {
            storage.set(ACCESS_TOKEN_KEY, access).unwrap();
            storage.set(REFRESH_TOKEN_KEY, refresh).unwrap();
        }
        let navigator = Arc::new(RecordingNavigator::default());
        let store = AuthStore::connect(
            ClientConfig::new(server.uri()),
            storage.clone(),
            navigator.clone(),
        )
        .unwrap();
        Fixture {
            store,
            storage,
            navigator,
        }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials::new(email, SecretString::from(password.to_string()))
    }

    #[tokio::test]
    async fn login_installs_session() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .and(body_json(json!({"email": "a@b.com", "password": "x"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": "A1",
                "refresh": "R1",
                "user": {"id": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, None);
        fx.store.login(&credentials("a@b.com", "x")).await?;

        let session = fx.store.snapshot();
        assert!(session.is_authenticated());
        assert_eq!(
            session.access_token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("A1".to_string())
        );
        assert_eq!(
            session.refresh_token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("R1".to_string())
        );
        assert_eq!(session.user, User::from_value(json!({"id": 1})));
        assert_eq!(fx.storage.get(ACCESS_TOKEN_KEY), Some("A1".to_string()));
        assert_eq!(fx.storage.get(REFRESH_TOKEN_KEY), Some("R1".to_string()));
        assert_eq!(fx.store.last_error(), None);
        assert_eq!(fx.navigator.visited(), vec![View::Dashboard]);
        Ok(())
    }

    #[tokio::test]
    async fn login_without_refresh_token_is_rejected() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": "A1",
                "user": {"id": 1}
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server, None);
        let result = fx.store.login(&credentials("a@b.com", "x")).await;

        assert!(matches!(result, Err(Error::InvalidResponse(_))));
        assert!(!fx.store.is_authenticated());
        assert_eq!(fx.storage.get(ACCESS_TOKEN_KEY), None);
        assert!(fx.navigator.visited().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn login_failure_records_detail() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Invalid credentials"
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server, None);
        let result = fx.store.login(&credentials("a@b.com", "wrong")).await;

        assert_eq!(result.unwrap_err().status(), Some(401));
        assert_eq!(fx.store.last_error().as_deref(), Some("Invalid credentials"));
        assert!(!fx.store.is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn login_failure_without_detail_uses_generic_message() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let fx = fixture(&server, None);
        let _ = fx.store.login(&credentials("a@b.com", "x")).await;

        assert_eq!(fx.store.last_error().as_deref(), Some(LOGIN_FAILED_MESSAGE));
        Ok(())
    }

    #[tokio::test]
    async fn login_fetches_profile_when_omitted() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": "A1",
                "refresh": "R1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/profile/"))
            .and(header("Authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "email": "a@b.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, None);
        fx.store.login(&credentials("a@b.com", "x")).await?;

        assert_eq!(
            fx.store.user().and_then(|user| user.email().map(str::to_string)),
            Some("a@b.com".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn login_validates_before_network() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let fx = fixture(&server, None);

        let result = fx.store.login(&credentials("not-an-email", "x")).await;
        assert_eq!(
            result,
            Err(Error::Validation("Must be a valid email".to_string()))
        );

        let result = fx.store.login(&credentials("a@b.com", "")).await;
        assert_eq!(
            result,
            Err(Error::Validation("This field is required".to_string()))
        );
        assert_eq!(fx.store.last_error().as_deref(), Some("This field is required"));

        assert!(server.received_requests().await.unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn logout_clears_everything() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let fx = fixture(&server, Some(("A1", "R1")));
        assert!(fx.store.is_authenticated());

        fx.store.logout();

        assert!(!fx.store.is_authenticated());
        assert_eq!(fx.storage.get(REFRESH_TOKEN_KEY), None);
        assert_eq!(fx.navigator.visited(), vec![View::Login]);
        Ok(())
    }

    #[tokio::test]
    async fn logout_during_refresh_keeps_session_cleared() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access": "A2", "refresh": "R2"}))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, Some(("A1", "R1")));
        let (refreshed, ()) = tokio::join!(fx.store.refresh_access_token(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            fx.store.logout();
        });

        assert!(matches!(refreshed, Err(Error::RefreshFailed(_))));
        assert!(!fx.store.is_authenticated());
        assert_eq!(fx.storage.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(fx.storage.get(REFRESH_TOKEN_KEY), None);
        assert_eq!(fx.navigator.visited(), vec![View::Login]);
        Ok(())
    }

    #[tokio::test]
    async fn login_during_refresh_is_not_overwritten() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access": "A2"}))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, Some(("A1", "R1")));
        let session = fx.store.session().clone();
        let (refreshed, ()) = tokio::join!(fx.store.refresh_access_token(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session
                .set_tokens(
                    SecretString::from("B1".to_string()),
                    SecretString::from("S1".to_string()),
                )
                .unwrap();
        });

        assert!(refreshed.is_err());
        assert_eq!(fx.storage.get(ACCESS_TOKEN_KEY), Some("B1".to_string()));
        assert_eq!(fx.storage.get(REFRESH_TOKEN_KEY), Some("S1".to_string()));
        assert!(fx.navigator.visited().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn profile_failure_logs_out() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/profile/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fx = fixture(&server, Some(("A1", "R1")));
        let result = fx.store.fetch_user_profile().await;

        assert_eq!(result.unwrap_err().status(), Some(500));
        assert!(!fx.store.is_authenticated());
        assert_eq!(fx.navigator.visited(), vec![View::Login]);
        Ok(())
    }

    #[tokio::test]
    async fn update_profile_failure_keeps_session() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/auth/profile/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "username": ["already taken"]
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server, Some(("A1", "R1")));
        let result = fx
            .store
            .update_user_profile(&json!({"username": "taken"}))
            .await;

        assert_eq!(result.unwrap_err().status(), Some(400));
        assert!(fx.store.is_authenticated());
        assert!(fx.navigator.visited().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn delete_account_ends_session() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/delete-account/"))
            .and(body_json(json!({"password": "pw"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, Some(("A1", "R1")));
        fx.store
            .delete_account(&SecretString::from("pw".to_string()))
            .await?;

        assert!(!fx.store.is_authenticated());
        assert_eq!(fx.storage.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(
            fx.navigator.visited(),
            vec![View::Login, View::AccountDeleted]
        );
        Ok(())
    }

    #[tokio::test]
    async fn register_checks_confirmation() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, None);
        let mismatch = fx
            .store
            .register(&json!({
                "email": "new@b.com",
                "password": "NewUser@123",
                "password2": "Different@123"
            }))
            .await;
        assert_eq!(
            mismatch,
            Err(Error::Validation("Passwords do not match".to_string()))
        );

        let created = fx
            .store
            .register(&json!({
                "username": "newuser",
                "email": "new@b.com",
                "password": "NewUser@123",
                "password2": "NewUser@123"
            }))
            .await?;
        assert_eq!(created, json!({"id": 3}));
        assert_eq!(fx.navigator.visited(), vec![View::VerifyEmail]);
        Ok(())
    }

    #[tokio::test]
    async fn reset_password_requires_strength() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/reset-password-confirm/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, None);
        let weak = fx
            .store
            .reset_password("t1", &SecretString::from("password".to_string()))
            .await;
        assert!(matches!(weak, Err(Error::Validation(_))));

        fx.store
            .reset_password("t1", &SecretString::from("NewPassword@123".to_string()))
            .await?;
        assert_eq!(fx.navigator.visited(), vec![View::Login]);
        Ok(())
    }

    #[tokio::test]
    async fn two_factor_flows_navigate_and_reload() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify-2fa/"))
            .and(body_json(json!({"token": "123456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"enabled": true})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/disable-2fa/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"enabled": false})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/profile/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "two_factor_enabled": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, Some(("A1", "R1")));
        fx.store.verify_2fa("123456").await?;
        fx.store
            .disable_2fa("654321", &SecretString::from("pw".to_string()))
            .await?;

        assert_eq!(fx.navigator.visited(), vec![View::Profile]);
        assert_eq!(
            fx.store.user().and_then(|user| user.fields().get("two_factor_enabled").cloned()),
            Some(json!(false))
        );
        Ok(())
    }

    #[tokio::test]
    async fn request_password_reset_validates_email() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let fx = fixture(&server, None);

        let result = fx.store.request_password_reset("nope").await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
        Ok(())
    }
}
