use crate::RealError;
use crate::graphql::documents;
use crate::integration_tests::core::*;
use async_trait::async_trait;
use serde_json::json;

pub struct ReportCommentViewsTestCase {
    login_name: String,
    comment_names: Vec<String>,
}

impl ReportCommentViewsTestCase {
    pub fn new(login_name: &str, comment_names: Vec<&str>) -> Self {
        Self {
            login_name: login_name.to_string(),
            comment_names: comment_names.into_iter().map(String::from).collect(),
        }
    }
}

#[async_trait]
impl TestCase for ReportCommentViewsTestCase {
    async fn run(&self, context: &mut ScenarioContext) -> Result<(), RealError> {
        tracing::info!(
            "Reporting views of {:?} as login: {}",
            self.comment_names,
            self.login_name
        );

        let login = context.get_login(&self.login_name)?;
        let comment_ids = self
            .comment_names
            .iter()
            .map(|name| context.get_comment_id(name).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        login
            .client
            .mutate(
                documents::REPORT_COMMENT_VIEWS,
                json!({ "commentIds": comment_ids }),
            )
            .await?
            .ensure_no_errors()?;

        tracing::info!("✓ Reported {} comment views", comment_ids.len());
        Ok(())
    }
}
