use crate::{store::AuthStore, token};
use rand::{rngs::StdRng, Rng, SeedableRng};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone, Copy, Debug)]
pub struct RenewOptions {
    /// Floor for the wait between renewals.
    pub min_delay: std::time::Duration,
}

impl Default for RenewOptions {
    fn default() -> Self {
        Self {
            min_delay: std::time::Duration::from_secs(1),
        }
    }
}

/// Refreshes the access token ahead of its expiry, at a jittered 70-90% of
/// its remaining lifetime. The task ends once the session is gone, a refresh
/// fails, or the token carries no `exp`.
#[instrument(skip(store))]
pub fn spawn(store: Arc<AuthStore>, options: RenewOptions) -> JoinHandle<()> {
    let mut rng = StdRng::from_entropy();

    tokio::spawn(async move {
        loop {
            let Some(access) = store.session().access_token() else {
                info!("no session, stopping token renewal");
                return;
            };

            if token::expiry_date(access.expose_secret()).is_none() {
                warn!("access token has no expiry, stopping token renewal");
                return;
            }

            let remaining =
                token::remaining_lifetime(access.expose_secret()).unwrap_or_default();
            let jittered = remaining.mul_f64(rng.gen_range(0.7..0.9));
            let delay = jittered.max(options.min_delay);

            info!("Will renew access token in {} seconds", delay.as_secs());
            sleep(delay).await;

            if !store.is_authenticated() {
                info!("session ended, stopping token renewal");
                return;
            }

            match store.refresh_access_token().await {
                Ok(_) => debug!("access token renewed"),
                Err(e) => {
                    error!("Error renewing access token: {}", e);
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ClientConfig,
        navigation::TracingNavigator,
        storage::{MemoryStorage, TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
        transport::REFRESH_PATH,
    };
    use chrono::Utc;
    use serde_json::json;
    use std::{net::TcpListener, time::Duration};
    use tokio::time::timeout;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn token_expiring_in(seconds: i64) -> String {
        token::encode_for_tests(&json!({"exp": Utc::now().timestamp() + seconds}))
    }

    fn store_with(
        server: &MockServer,
        access: Option<&str>,
    ) -> (Arc<AuthStore>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        if let Some(access) = access {
            storage.set(ACCESS_TOKEN_KEY, access).unwrap();
            storage.set(REFRESH_TOKEN_KEY, "R1").unwrap();
        }
        let store = AuthStore::connect(
            ClientConfig::new(server.uri()),
            storage.clone(),
            Arc::new(TracingNavigator::default()),
        )
        .unwrap();
        (Arc::new(store), storage)
    }

    fn fast() -> RenewOptions {
        RenewOptions {
            min_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn renews_before_expiry() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let renewed = token_expiring_in(3600);
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": renewed})))
            .expect(1)
            .mount(&server)
            .await;

        let (store, storage) = store_with(&server, Some(&token_expiring_in(1)));
        let handle = spawn(store.clone(), fast());

        timeout(Duration::from_secs(10), async {
            while storage.get(ACCESS_TOKEN_KEY).as_deref() != Some(renewed.as_str()) {
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await?;

        assert!(!handle.is_finished());
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn stops_without_session() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let (store, _) = store_with(&server, None);

        timeout(Duration::from_secs(5), spawn(store, fast())).await??;
        assert!(server.received_requests().await.unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn stops_after_failed_refresh() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Token is invalid or expired"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (store, storage) = store_with(&server, Some(&token_expiring_in(-5)));
        timeout(Duration::from_secs(5), spawn(store.clone(), fast())).await??;

        assert!(!store.is_authenticated());
        assert_eq!(storage.get(REFRESH_TOKEN_KEY), None);
        Ok(())
    }

    #[tokio::test]
    async fn stops_for_tokens_without_expiry() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let (store, _) = store_with(&server, Some("opaque-token"));

        timeout(Duration::from_secs(5), spawn(store.clone(), fast())).await??;
        assert!(store.is_authenticated());
        Ok(())
    }
}
