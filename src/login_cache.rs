//! Pool of provisioned logins shared by the test cases of one scenario.
//!
//! A login handed out by [`LoginCache::get_clean_login`] is dirty until the
//! next [`LoginCache::clean`], and is never handed out twice in between.
//! Logins the cache gives up on but could not delete stay tracked as retired
//! until [`LoginCache::reset`] deletes them.

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{RealError, Result};
use crate::provisioner::{Login, SessionProvisioner};
use crate::users;

/// Outcome of [`LoginCache::clean`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub restored: usize,
    pub discarded: usize,
}

pub struct LoginCache {
    provisioner: Arc<dyn SessionProvisioner>,
    clean: VecDeque<Login>,
    dirty: Vec<Login>,
    retired: Vec<Login>,
}

impl std::fmt::Debug for LoginCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCache")
            .field("clean", &self.clean.len())
            .field("dirty", &self.dirty.len())
            .field("retired", &self.retired.len())
            .finish()
    }
}

impl LoginCache {
    pub fn new(provisioner: Arc<dyn SessionProvisioner>) -> Self {
        Self {
            provisioner,
            clean: VecDeque::new(),
            dirty: Vec::new(),
            retired: Vec::new(),
        }
    }

    pub fn clean_count(&self) -> usize {
        self.clean.len()
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Logins taken out of service whose deletion has not succeeded yet.
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clean.is_empty() && self.dirty.is_empty() && self.retired.is_empty()
    }

    fn contains(&self, user_id: &str) -> bool {
        self.clean
            .iter()
            .chain(self.dirty.iter())
            .chain(self.retired.iter())
            .any(|login| login.user_id() == user_id)
    }

    /// Deletes a login taken out of service. If the delete fails the login is
    /// kept as retired so [`reset`](Self::reset) tries again.
    async fn retire(&mut self, login: Login) {
        if let Err(e) = users::delete_user(&login.client).await {
            tracing::warn!(
                target: "real_integration::login_cache",
                "Failed to delete retired login {}, will retry on reset: {}",
                login.user_id(),
                e
            );
            self.retired.push(login);
        }
    }

    /// Adds a freshly provisioned login to the back of the clean pool.
    pub fn add_clean_login(&mut self, login: Login) -> Result<()> {
        if self.contains(login.user_id()) {
            return Err(RealError::InvalidInput(format!(
                "Login for user {} is already pooled",
                login.user_id()
            )));
        }
        self.clean.push_back(login);
        Ok(())
    }

    /// Provisions `count` logins up front so test cases rarely wait on sign-up.
    pub async fn warm_up(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let login = self.provisioner.provision().await?;
            self.add_clean_login(login)?;
        }
        Ok(())
    }

    /// Hands out the oldest clean login, provisioning one when the pool is empty.
    /// Pooled logins whose credentials have expired are retired, never handed out.
    /// The login stays reserved until the next [`clean`](Self::clean).
    pub async fn get_clean_login(&mut self) -> Result<Login> {
        let login = loop {
            match self.clean.pop_front() {
                Some(login) if login.credentials().is_expired(Utc::now()) => {
                    tracing::warn!(
                        target: "real_integration::login_cache",
                        "Retiring login {}: credentials expired",
                        login.user_id()
                    );
                    self.retire(login).await;
                }
                Some(login) => break login,
                None => {
                    tracing::debug!(target: "real_integration::login_cache", "Clean pool empty, provisioning a new login");
                    break self.provisioner.provision().await?;
                }
            }
        };
        self.dirty.push(login.clone());
        Ok(login)
    }

    /// Resets every dirty login through the backend and returns it to the clean
    /// pool. Logins that cannot be reset are retired.
    pub async fn clean(&mut self) -> CleanReport {
        let mut report = CleanReport::default();

        for login in std::mem::take(&mut self.dirty) {
            match users::reset_user(&login.client, Some(login.username())).await {
                Ok(()) => {
                    self.clean.push_back(login);
                    report.restored += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        target: "real_integration::login_cache",
                        "Discarding login {}: reset failed: {}",
                        login.user_id(),
                        e
                    );
                    self.retire(login).await;
                    report.discarded += 1;
                }
            }
        }

        if report.restored + report.discarded > 0 {
            tracing::debug!(
                target: "real_integration::login_cache",
                "Cleaned logins: {} restored, {} discarded",
                report.restored,
                report.discarded
            );
        }
        report
    }

    /// Deletes every identity the cache still tracks, retired ones included, and
    /// empties the pool. All deletions are attempted; the first failure is returned.
    pub async fn reset(&mut self) -> Result<()> {
        let logins: Vec<Login> = self
            .clean
            .drain(..)
            .chain(self.dirty.drain(..))
            .chain(self.retired.drain(..))
            .collect();
        let mut first_error = None;

        for login in logins {
            match users::delete_user(&login.client).await {
                Ok(user) => {
                    tracing::info!(target: "real_integration::login_cache", "Deleted test user {} ({})", user.username, user.user_id);
                }
                Err(e) => {
                    tracing::error!(
                        target: "real_integration::login_cache",
                        "Failed to delete test user {}: {}",
                        login.user_id(),
                        e
                    );
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::AwsCredentials;
    use crate::graphql::GraphqlClientFactory;
    use crate::provisioner::Identity;
    use async_trait::async_trait;
    use chrono::Duration;
    use mockito::Matcher;
    use reqwest::Url;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hands out logins `user-1`, `user-2`, ... whose clients talk to `endpoint`.
    struct FakeProvisioner {
        factory: GraphqlClientFactory,
        provisioned: AtomicUsize,
        fail: bool,
    }

    impl FakeProvisioner {
        fn new(endpoint: &str) -> Self {
            Self {
                factory: GraphqlClientFactory::new(Url::parse(endpoint).unwrap(), "us-east-1"),
                provisioned: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing(endpoint: &str) -> Self {
            Self {
                fail: true,
                ..Self::new(endpoint)
            }
        }

        fn login(&self, n: usize) -> Login {
            self.login_with(n, AwsCredentials::new(&format!("AKID{}", n), "secret", "token"))
        }

        fn expired_login(&self, n: usize) -> Login {
            let mut credentials = AwsCredentials::new(&format!("AKID{}", n), "secret", "token");
            credentials.expiration = Some(Utc::now() - Duration::hours(2));
            self.login_with(n, credentials)
        }

        fn login_with(&self, n: usize, credentials: AwsCredentials) -> Login {
            Login::new(
                Identity {
                    user_id: format!("user-{}", n),
                    username: format!("name{}", n),
                },
                self.factory.client(credentials),
            )
        }
    }

    #[async_trait]
    impl SessionProvisioner for FakeProvisioner {
        async fn provision(&self) -> Result<Login> {
            if self.fail {
                return Err(RealError::IdentityProvider {
                    kind: "LimitExceededException".to_string(),
                    message: "Attempt limit exceeded".to_string(),
                });
            }
            let n = self.provisioned.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(self.login(n))
        }
    }

    fn cache_with(provisioner: &Arc<FakeProvisioner>) -> LoginCache {
        LoginCache::new(provisioner.clone())
    }

    async fn mock_for_user(
        server: &mut mockito::ServerGuard,
        access_key: &str,
        operation: &str,
        status: usize,
        body: &str,
    ) -> mockito::Mock {
        server
            .mock("POST", "/graphql")
            .match_header(
                "authorization",
                Matcher::Regex(format!("Credential={}/", access_key)),
            )
            .match_body(Matcher::Regex(format!("mutation {}", operation)))
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_pooled_logins_are_reused_in_fifo_order() {
        let provisioner = Arc::new(FakeProvisioner::new("http://127.0.0.1:1/graphql"));
        let mut cache = cache_with(&provisioner);
        cache.add_clean_login(provisioner.login(100)).unwrap();
        cache.add_clean_login(provisioner.login(200)).unwrap();

        assert_eq!(cache.get_clean_login().await.unwrap().user_id(), "user-100");
        assert_eq!(cache.get_clean_login().await.unwrap().user_id(), "user-200");
        assert_eq!(provisioner.provisioned.load(Ordering::SeqCst), 0);

        // pool exhausted, falls back to provisioning
        assert_eq!(cache.get_clean_login().await.unwrap().user_id(), "user-1");
        assert_eq!(provisioner.provisioned.load(Ordering::SeqCst), 1);
        assert_eq!(cache.clean_count(), 0);
        assert_eq!(cache.dirty_count(), 3);
    }

    #[tokio::test]
    async fn test_dirty_login_is_never_handed_out_twice() {
        let provisioner = Arc::new(FakeProvisioner::new("http://127.0.0.1:1/graphql"));
        let mut cache = cache_with(&provisioner);
        cache.add_clean_login(provisioner.login(100)).unwrap();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..5 {
            let login = cache.get_clean_login().await.unwrap();
            assert!(seen.insert(login.user_id().to_string()));
        }
        assert_eq!(provisioner.provisioned.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_add_clean_login_rejects_duplicates() {
        let provisioner = Arc::new(FakeProvisioner::new("http://127.0.0.1:1/graphql"));
        let mut cache = cache_with(&provisioner);
        cache.add_clean_login(provisioner.login(7)).unwrap();
        let _ = cache.get_clean_login().await.unwrap();

        // still reserved as dirty
        assert!(matches!(
            cache.add_clean_login(provisioner.login(7)),
            Err(RealError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_provisioning_failure_propagates() {
        let provisioner = Arc::new(FakeProvisioner::failing("http://127.0.0.1:1/graphql"));
        let mut cache = cache_with(&provisioner);

        let result = cache.get_clean_login().await;
        assert!(matches!(result, Err(RealError::IdentityProvider { .. })));
        assert!(cache.is_empty());

        assert!(cache.warm_up(2).await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_warm_up_fills_clean_pool() {
        let provisioner = Arc::new(FakeProvisioner::new("http://127.0.0.1:1/graphql"));
        let mut cache = cache_with(&provisioner);
        cache.warm_up(2).await.unwrap();
        assert_eq!(cache.clean_count(), 2);
        assert_eq!(cache.dirty_count(), 0);
    }

    #[tokio::test]
    async fn test_clean_restores_reset_logins() {
        let mut server = mockito::Server::new_async().await;
        let reset = mock_for_user(
            &mut server,
            "AKID1",
            "ResetUser",
            200,
            r#"{"data": {"resetUser": {"userId": "user-1", "username": "name1"}}}"#,
        )
        .await;

        let provisioner = Arc::new(FakeProvisioner::new(&format!("{}/graphql", server.url())));
        let mut cache = cache_with(&provisioner);
        cache.warm_up(1).await.unwrap();

        let first = cache.get_clean_login().await.unwrap();
        assert_eq!(cache.clean_count(), 0);

        let report = cache.clean().await;
        assert_eq!(
            report,
            CleanReport {
                restored: 1,
                discarded: 0
            }
        );
        assert_eq!(cache.clean_count(), 1);
        assert_eq!(cache.dirty_count(), 0);

        // the same identity comes back instead of a new one being provisioned
        let again = cache.get_clean_login().await.unwrap();
        assert_eq!(again.user_id(), first.user_id());
        assert_eq!(provisioner.provisioned.load(Ordering::SeqCst), 1);
        reset.assert_async().await;
    }

    #[tokio::test]
    async fn test_clean_discards_logins_that_cannot_be_reset() {
        let mut server = mockito::Server::new_async().await;
        let reset_ok = mock_for_user(
            &mut server,
            "AKID1",
            "ResetUser",
            200,
            r#"{"data": {"resetUser": {"userId": "user-1", "username": "name1"}}}"#,
        )
        .await;
        let reset_failed = mock_for_user(
            &mut server,
            "AKID2",
            "ResetUser",
            200,
            r#"{"data": {"resetUser": null}, "errors": [{"message": "Cannot reset user"}]}"#,
        )
        .await;
        let delete_discarded = mock_for_user(
            &mut server,
            "AKID2",
            "DeleteUser",
            200,
            r#"{"data": {"user": {"userId": "user-2", "username": "name2"}}}"#,
        )
        .await;

        let provisioner = Arc::new(FakeProvisioner::new(&format!("{}/graphql", server.url())));
        let mut cache = cache_with(&provisioner);
        cache.get_clean_login().await.unwrap();
        cache.get_clean_login().await.unwrap();

        let report = cache.clean().await;
        assert_eq!(
            report,
            CleanReport {
                restored: 1,
                discarded: 1
            }
        );
        assert_eq!(cache.clean_count(), 1);
        assert_eq!(cache.get_clean_login().await.unwrap().user_id(), "user-1");

        reset_ok.assert_async().await;
        reset_failed.assert_async().await;
        delete_discarded.assert_async().await;
    }

    #[tokio::test]
    async fn test_clean_without_dirty_logins_is_a_noop() {
        let provisioner = Arc::new(FakeProvisioner::new("http://127.0.0.1:1/graphql"));
        let mut cache = cache_with(&provisioner);
        cache.add_clean_login(provisioner.login(1)).unwrap();

        assert_eq!(cache.clean().await, CleanReport::default());
        assert_eq!(cache.clean_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_deletes_every_login() {
        let mut server = mockito::Server::new_async().await;
        let delete_1 = mock_for_user(
            &mut server,
            "AKID1",
            "DeleteUser",
            200,
            r#"{"data": {"user": {"userId": "user-1", "username": "name1"}}}"#,
        )
        .await;
        let delete_2 = mock_for_user(
            &mut server,
            "AKID2",
            "DeleteUser",
            200,
            r#"{"data": {"user": {"userId": "user-2", "username": "name2"}}}"#,
        )
        .await;

        let provisioner = Arc::new(FakeProvisioner::new(&format!("{}/graphql", server.url())));
        let mut cache = cache_with(&provisioner);
        cache.warm_up(2).await.unwrap();
        // one dirty, one clean
        cache.get_clean_login().await.unwrap();

        cache.reset().await.unwrap();
        assert!(cache.is_empty());
        delete_1.assert_async().await;
        delete_2.assert_async().await;
    }

    #[tokio::test]
    async fn test_reset_attempts_all_deletions_before_failing() {
        let mut server = mockito::Server::new_async().await;
        let delete_1 = mock_for_user(&mut server, "AKID1", "DeleteUser", 500, "boom").await;
        let delete_2 = mock_for_user(
            &mut server,
            "AKID2",
            "DeleteUser",
            200,
            r#"{"data": {"user": {"userId": "user-2", "username": "name2"}}}"#,
        )
        .await;

        let provisioner = Arc::new(FakeProvisioner::new(&format!("{}/graphql", server.url())));
        let mut cache = cache_with(&provisioner);
        cache.warm_up(2).await.unwrap();

        let result = cache.reset().await;
        assert!(matches!(result, Err(RealError::UnexpectedResponse(_))));
        assert!(cache.is_empty());
        delete_1.assert_async().await;
        delete_2.assert_async().await;
    }

    #[tokio::test]
    async fn test_undeletable_discarded_login_is_deleted_again_on_reset() {
        let mut server = mockito::Server::new_async().await;
        let reset_failed = mock_for_user(&mut server, "AKID1", "ResetUser", 500, "boom").await;
        let delete_failed = server
            .mock("POST", "/graphql")
            .match_header("authorization", Matcher::Regex("Credential=AKID1/".to_string()))
            .match_body(Matcher::Regex("mutation DeleteUser".to_string()))
            .with_status(500)
            .with_body("boom")
            .expect(2)
            .create_async()
            .await;

        let provisioner = Arc::new(FakeProvisioner::new(&format!("{}/graphql", server.url())));
        let mut cache = cache_with(&provisioner);
        cache.get_clean_login().await.unwrap();

        let report = cache.clean().await;
        assert_eq!(
            report,
            CleanReport {
                restored: 0,
                discarded: 1
            }
        );
        // not handed out, but still tracked
        assert_eq!(cache.retired_count(), 1);
        assert!(!cache.is_empty());
        assert!(matches!(
            cache.add_clean_login(provisioner.login(1)),
            Err(RealError::InvalidInput(_))
        ));

        let result = cache.reset().await;
        assert!(matches!(result, Err(RealError::UnexpectedResponse(_))));
        assert!(cache.is_empty());

        reset_failed.assert_async().await;
        delete_failed.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_pooled_login_is_deleted_instead_of_handed_out() {
        let mut server = mockito::Server::new_async().await;
        let delete_expired = mock_for_user(
            &mut server,
            "AKID9",
            "DeleteUser",
            200,
            r#"{"data": {"user": {"userId": "user-9", "username": "name9"}}}"#,
        )
        .await;

        let provisioner = Arc::new(FakeProvisioner::new(&format!("{}/graphql", server.url())));
        let mut cache = cache_with(&provisioner);
        cache.add_clean_login(provisioner.expired_login(9)).unwrap();

        let login = cache.get_clean_login().await.unwrap();
        assert_eq!(login.user_id(), "user-1");
        assert!(!login.credentials().is_expired(Utc::now()));
        assert_eq!(provisioner.provisioned.load(Ordering::SeqCst), 1);
        assert_eq!(cache.retired_count(), 0);
        assert_eq!(cache.dirty_count(), 1);

        delete_expired.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_login_that_cannot_be_deleted_is_retired() {
        let mut server = mockito::Server::new_async().await;
        let delete_expired = mock_for_user(&mut server, "AKID9", "DeleteUser", 403, "expired").await;

        let provisioner = Arc::new(FakeProvisioner::new(&format!("{}/graphql", server.url())));
        let mut cache = cache_with(&provisioner);
        cache.add_clean_login(provisioner.expired_login(9)).unwrap();
        cache.add_clean_login(provisioner.login(10)).unwrap();

        // skips the expired login and takes the next pooled one
        assert_eq!(cache.get_clean_login().await.unwrap().user_id(), "user-10");
        assert_eq!(provisioner.provisioned.load(Ordering::SeqCst), 0);
        assert_eq!(cache.retired_count(), 1);

        delete_expired.assert_async().await;
    }
}
