pub mod documents;

use chrono::Utc;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credentials::AwsCredentials;
use crate::error::{RealError, Result};
use crate::sigv4::{Signer, SigningRequest};

const SIGNING_SERVICE: &str = "appsync";

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(rename = "errorType", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
}

/// A decoded response. Both `data` and `errors` are kept: callers decide
/// whether errors are fatal.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

impl GraphqlResponse {
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    pub fn ensure_no_errors(self) -> Result<Self> {
        match self.errors {
            Some(errors) if !errors.is_empty() => Err(RealError::Graphql(errors)),
            _ => Ok(self),
        }
    }

    /// Look up a value below `data` with a JSON pointer such as `/post/postId`.
    /// A JSON `null` is returned as `Some(Value::Null)`.
    pub fn field(&self, pointer: &str) -> Option<&Value> {
        self.data.as_ref()?.pointer(pointer)
    }

    /// Deserialize the non-null value at `pointer`.
    pub fn extract<T: DeserializeOwned>(&self, pointer: &str) -> Result<T> {
        match self.field(pointer) {
            Some(value) if !value.is_null() => Ok(serde_json::from_value(value.clone())?),
            _ => Err(RealError::UnexpectedResponse(format!(
                "Missing value at {}",
                pointer
            ))),
        }
    }

    pub fn str_field(&self, pointer: &str) -> Result<&str> {
        self.field(pointer)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RealError::UnexpectedResponse(format!("Missing string field at {}", pointer))
            })
    }
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

/// Builds authenticated clients for one GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlClientFactory {
    endpoint: Url,
    signer: Signer,
    http: reqwest::Client,
}

impl GraphqlClientFactory {
    pub fn new(endpoint: Url, region: &str) -> Self {
        Self {
            endpoint,
            signer: Signer::new(region, SIGNING_SERVICE),
            http: reqwest::Client::new(),
        }
    }

    pub fn client(&self, credentials: AwsCredentials) -> GraphqlClient {
        GraphqlClient {
            endpoint: self.endpoint.clone(),
            signer: self.signer.clone(),
            http: self.http.clone(),
            credentials,
        }
    }
}

/// A GraphQL client whose requests are signed with one identity's credentials.
#[derive(Clone)]
pub struct GraphqlClient {
    endpoint: Url,
    signer: Signer,
    http: reqwest::Client,
    credentials: AwsCredentials,
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_key_id", &self.credentials.access_key_id)
            .finish()
    }
}

impl GraphqlClient {
    pub fn credentials(&self) -> &AwsCredentials {
        &self.credentials
    }

    pub async fn query(&self, document: &str, variables: Value) -> Result<GraphqlResponse> {
        self.execute(document, variables).await
    }

    pub async fn mutate(&self, document: &str, variables: Value) -> Result<GraphqlResponse> {
        self.execute(document, variables).await
    }

    async fn execute(&self, document: &str, variables: Value) -> Result<GraphqlResponse> {
        let body = serde_json::to_vec(&GraphqlRequest {
            query: document,
            variables: &variables,
        })?;

        let signed = self.signer.sign(
            &SigningRequest {
                method: "POST",
                url: &self.endpoint,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                payload: &body,
            },
            &self.credentials,
            Utc::now(),
        )?;

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json");
        for (name, value) in signed.into_pairs() {
            request = request.header(name, value);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(
            target: "real_integration::graphql",
            "GraphQL response {} ({} bytes)",
            status,
            text.len()
        );

        decode_response(status, &text)
    }
}

fn decode_response(status: StatusCode, text: &str) -> Result<GraphqlResponse> {
    match serde_json::from_str::<GraphqlResponse>(text) {
        Ok(response) if response.data.is_some() || response.errors.is_some() => Ok(response),
        _ if !status.is_success() => Err(RealError::UnexpectedResponse(format!(
            "GraphQL endpoint returned {}: {}",
            status, text
        ))),
        Ok(response) => Ok(response),
        Err(e) => Err(RealError::UnexpectedResponse(format!(
            "Invalid GraphQL response body: {}",
            e
        ))),
    }
}
