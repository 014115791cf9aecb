use crate::{CleanReport, Login, LoginCache, RealError, SessionProvisioner};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ScenarioContext {
    pub login_cache: LoginCache,
    pub logins: HashMap<String, Login>,
    pub post_ids: HashMap<String, String>,
    pub comment_ids: HashMap<String, String>,
    pub tests_count: u32,
    pub tests_passed: u32,
}

impl ScenarioContext {
    pub fn new(provisioner: Arc<dyn SessionProvisioner>) -> Self {
        Self {
            login_cache: LoginCache::new(provisioner),
            logins: HashMap::new(),
            post_ids: HashMap::new(),
            comment_ids: HashMap::new(),
            tests_count: 0,
            tests_passed: 0,
        }
    }

    /// Starts a fresh group of test cases: logins borrowed so far are forgotten
    /// and returned to the cache clean.
    pub async fn begin_test_group(&mut self) -> CleanReport {
        self.logins.clear();
        self.login_cache.clean().await
    }

    pub fn add_login(&mut self, name: &str, login: Login) {
        self.logins.insert(name.to_string(), login);
    }

    pub fn get_login(&self, name: &str) -> Result<&Login, RealError> {
        self.logins
            .get(name)
            .ok_or_else(|| RealError::LoginNotFound(name.to_string()))
    }

    pub fn add_post_id(&mut self, name: &str, post_id: String) {
        self.post_ids.insert(name.to_string(), post_id);
    }

    pub fn get_post_id(&self, name: &str) -> Result<&String, RealError> {
        self.post_ids.get(name).ok_or_else(|| {
            RealError::Configuration(format!("Post '{}' not found in context", name))
        })
    }

    pub fn add_comment_id(&mut self, name: &str, comment_id: String) {
        self.comment_ids.insert(name.to_string(), comment_id);
    }

    pub fn get_comment_id(&self, name: &str) -> Result<&String, RealError> {
        self.comment_ids.get(name).ok_or_else(|| {
            RealError::Configuration(format!("Comment '{}' not found in context", name))
        })
    }

    pub fn record_test(&mut self, passed: bool) {
        self.tests_count += 1;
        if passed {
            self.tests_passed += 1;
        }
    }
}
