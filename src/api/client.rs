//! Jira and Tempo REST client.
//!
//! Implements [`Gateway`] over the Jira REST API v3 and the Tempo v4 API.
//! Handles authentication, JSON mapping, error classification and retry
//! with exponential backoff for transient failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::adf;
use super::auth::Auth;
use super::error::{ApiError, Result};
use super::gateway::Gateway;
use super::types::{
    Issue, IssueDetail, IssueResponse, NewWorklog, Priority, SearchResponse, Status,
    StatusResponse, Transition, TransitionsResponse, User, Worklog, WorklogsResponse,
};
use crate::config::{Credentials, Settings};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Jira caps search pages at 100 issues.
const SEARCH_MAX_RESULTS: u32 = 100;

const LIST_FIELDS: &str = "id,summary,status,issuetype,assignee,priority";

const DETAIL_FIELDS: &str = "id,summary,description,status,issuetype,assignee,reporter,comment,\
priority,parent,timeoriginalestimate,issuelinks,created,updated";

/// Link type used when linking an issue to the change issue.
const LINK_TYPE: &str = "Relates";

/// Which backend a request goes to; selects base URL and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Jira,
    Tempo,
}

/// The Jira + Tempo API client.
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: Client,
    jira_url: String,
    tempo_url: String,
    jira_auth: Auth,
    tempo_auth: Auth,
    jql: String,
    change_issue_key: Option<String>,
}

impl JiraClient {
    /// Create a client from resolved credentials and settings.
    ///
    /// Does NOT validate the connection; the first request surfaces any
    /// authentication problem as a failure message.
    pub fn new(credentials: &Credentials, settings: &Settings) -> Result<Self> {
        info!(jira_url = %credentials.jira_url, "Creating Jira client");

        Ok(Self {
            client: Self::build_http_client()?,
            jira_url: normalize_base_url(&credentials.jira_url),
            tempo_url: normalize_base_url(&credentials.tempo_url),
            jira_auth: Auth::basic(&credentials.jira_email, &credentials.jira_token),
            tempo_auth: Auth::bearer(&credentials.tempo_token),
            jql: settings.jql.clone(),
            change_issue_key: settings.change_issue_key.clone(),
        })
    }

    /// Build the HTTP client with appropriate settings.
    fn build_http_client() -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Network)
    }

    fn jira(&self, path: &str) -> String {
        format!("{}/rest/api/3{}", self.jira_url, path)
    }

    fn tempo(&self, path: &str) -> String {
        format!("{}/4{}", self.tempo_url, path)
    }

    /// Perform a GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, url: &str, service: Service) -> Result<T> {
        let body = self.send(Method::GET, url, service, None).await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Send a request, retrying transient failures with exponential backoff.
    ///
    /// POST is never retried.
    #[instrument(skip(self, body), fields(method = %method, url = %url))]
    async fn send(
        &self,
        method: Method,
        url: &str,
        service: Service,
        body: Option<&Value>,
    ) -> Result<String> {
        let max_attempts = if method == Method::POST { 1 } else { MAX_RETRIES };
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!("Request attempt {}/{}", attempts, max_attempts);

            match self.execute(method.clone(), url, service, body).await {
                Ok(response) => return Ok(response),
                Err(e) if Self::is_retryable(&e) && attempts < max_attempts => {
                    let delay = Self::calculate_retry_delay(attempts);
                    warn!(
                        "Request failed (attempt {}), retrying in {}ms: {}",
                        attempts, delay, e
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Execute a single request and return the raw body of a successful response.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        service: Service,
        body: Option<&Value>,
    ) -> Result<String> {
        let auth = match service {
            Service::Jira => &self.jira_auth,
            Service::Tempo => &self.tempo_auth,
        };

        let mut request = self
            .client
            .request(method, url)
            .header(header::AUTHORIZATION, auth.header_value())
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            Ok(text)
        } else {
            debug!("Error response body: {}", text);
            Err(Self::error_from_response(status, &url, &text))
        }
    }

    /// Create an appropriate error from an HTTP response.
    fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
        if let Ok(json) = serde_json::from_str::<Value>(body) {
            let messages: Vec<String> = json
                .get("errorMessages")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            if !messages.is_empty() {
                return ApiError::from_status(status, &messages.join(", "));
            }

            if let Some(errors) = json.get("errors").and_then(Value::as_object) {
                let fields: Vec<String> = errors
                    .iter()
                    .map(|(k, v)| match v.as_str() {
                        Some(s) => format!("{}: {}", k, s),
                        None => format!("{}: {}", k, v),
                    })
                    .collect();
                if !fields.is_empty() {
                    return ApiError::from_status(status, &fields.join(", "));
                }
            }
        }

        ApiError::from_status(status, url)
    }

    /// Check if an error is retryable.
    fn is_retryable(error: &ApiError) -> bool {
        error.is_transient()
    }

    /// Calculate retry delay with exponential backoff.
    fn calculate_retry_delay(attempt: u32) -> u64 {
        RETRY_DELAY_MS * 2u64.pow(attempt - 1)
    }

    fn search_url(&self, jql: &str) -> String {
        format!(
            "{}?jql={}&maxResults={}&fields={}",
            self.jira("/search/jql"),
            urlencoding::encode(jql),
            SEARCH_MAX_RESULTS,
            LIST_FIELDS
        )
    }

    async fn search(&self, jql: &str) -> Result<Vec<Issue>> {
        let result: SearchResponse = self.get(&self.search_url(jql), Service::Jira).await?;
        debug!("Found {} issues", result.issues.len());
        Ok(result.issues.into_iter().map(Issue::from).collect())
    }
}

/// Query for the children of an epic.
fn epic_children_jql(key: &str) -> String {
    format!("parent = {} ORDER BY status DESC", key)
}

/// Request body for `POST /issue/{key}/transitions`.
fn transition_body(transition_id: &str, comment: Option<&str>) -> Value {
    let mut body = json!({ "transition": { "id": transition_id } });
    if let Some(comment) = comment {
        body["update"] = json!({
            "comment": [{ "add": { "body": adf::plain_document(comment) } }]
        });
    }
    body
}

/// Request body for `POST /issueLink`.
fn link_body(from_key: &str, to_key: &str) -> Value {
    json!({
        "type": { "name": LINK_TYPE },
        "inwardIssue": { "key": from_key },
        "outwardIssue": { "key": to_key },
    })
}

#[async_trait]
impl Gateway for JiraClient {
    #[instrument(skip(self))]
    async fn my_issues(&self) -> Result<Vec<Issue>> {
        self.search(&self.jql).await
    }

    #[instrument(skip(self))]
    async fn myself(&self) -> Result<User> {
        self.get(&self.jira("/myself"), Service::Jira).await
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn issue_detail(&self, key: &str) -> Result<IssueDetail> {
        let url = format!(
            "{}?fields={}",
            self.jira(&format!("/issue/{}", urlencoding::encode(key))),
            DETAIL_FIELDS
        );
        let issue: IssueResponse = self.get(&url, Service::Jira).await.map_err(|e| {
            if matches!(e, ApiError::NotFound(_)) {
                ApiError::NotFound(format!("Issue '{}'", key))
            } else {
                e
            }
        })?;
        Ok(IssueDetail::from_response(
            issue,
            self.change_issue_key.as_deref(),
        ))
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn transitions(&self, key: &str) -> Result<Vec<Transition>> {
        let url = self.jira(&format!("/issue/{}/transitions", urlencoding::encode(key)));
        let result: TransitionsResponse = self.get(&url, Service::Jira).await?;
        Ok(result.transitions.into_iter().map(Transition::from).collect())
    }

    #[instrument(skip(self, comment), fields(issue_key = %key))]
    async fn post_transition(
        &self,
        key: &str,
        transition_id: &str,
        comment: Option<&str>,
    ) -> Result<()> {
        let url = self.jira(&format!("/issue/{}/transitions", urlencoding::encode(key)));
        let body = transition_body(transition_id, comment);
        self.send(Method::POST, &url, Service::Jira, Some(&body))
            .await?;
        info!(transition_id, "Transition executed");
        Ok(())
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn assign(&self, key: &str, account_id: &str) -> Result<()> {
        let url = self.jira(&format!("/issue/{}/assignee", urlencoding::encode(key)));
        let body = json!({ "accountId": account_id });
        self.send(Method::PUT, &url, Service::Jira, Some(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, description), fields(issue_key = %key))]
    async fn update_description(&self, key: &str, description: &str) -> Result<()> {
        let url = self.jira(&format!("/issue/{}", urlencoding::encode(key)));
        let body = json!({ "fields": { "description": adf::plain_document(description) } });
        self.send(Method::PUT, &url, Service::Jira, Some(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn update_priority(&self, key: &str, priority: &str) -> Result<()> {
        let url = self.jira(&format!("/issue/{}", urlencoding::encode(key)));
        let body = json!({ "fields": { "priority": { "name": priority } } });
        self.send(Method::PUT, &url, Service::Jira, Some(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn update_estimate(&self, key: &str, estimate: &str) -> Result<()> {
        let url = self.jira(&format!("/issue/{}", urlencoding::encode(key)));
        let body = json!({ "fields": { "timetracking": { "originalEstimate": estimate } } });
        self.send(Method::PUT, &url, Service::Jira, Some(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, body, users), fields(issue_key = %key))]
    async fn post_comment(&self, key: &str, body: &str, users: &[User]) -> Result<()> {
        let url = self.jira(&format!("/issue/{}/comment", urlencoding::encode(key)));
        let payload = json!({ "body": adf::comment_document(body, users) });
        self.send(Method::POST, &url, Service::Jira, Some(&payload))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn assignable_users(&self, key: &str) -> Result<Vec<User>> {
        let url = format!(
            "{}?issueKey={}",
            self.jira("/user/assignable/search"),
            urlencoding::encode(key)
        );
        self.get(&url, Service::Jira).await
    }

    #[instrument(skip(self))]
    async fn priorities(&self) -> Result<Vec<Priority>> {
        self.get(&self.jira("/priority"), Service::Jira).await
    }

    #[instrument(skip(self))]
    async fn statuses(&self) -> Result<Vec<Status>> {
        let result: Vec<StatusResponse> = self.get(&self.jira("/status"), Service::Jira).await?;
        debug!("Loaded {} statuses", result.len());
        Ok(result.into_iter().map(Status::from).collect())
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn epic_children(&self, key: &str) -> Result<Vec<Issue>> {
        self.search(&epic_children_jql(key)).await
    }

    #[instrument(skip(self))]
    async fn worklogs(&self, issue_id: &str) -> Result<Vec<Worklog>> {
        let url = format!(
            "{}?limit=1000",
            self.tempo(&format!("/worklogs/issue/{}", urlencoding::encode(issue_id)))
        );
        let result: WorklogsResponse = self.get(&url, Service::Tempo).await?;
        Ok(result.results.into_iter().map(Worklog::from).collect())
    }

    #[instrument(skip(self, worklog), fields(issue_id = %worklog.issue_id))]
    async fn post_worklog(&self, worklog: &NewWorklog) -> Result<()> {
        let body = serde_json::to_value(worklog)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode work-log: {}", e)))?;
        self.send(Method::POST, &self.tempo("/worklogs"), Service::Tempo, Some(&body))
            .await?;
        info!(seconds = worklog.seconds, "Work-log created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn link_issue(&self, from_key: &str, to_key: &str) -> Result<()> {
        let body = link_body(from_key, to_key);
        self.send(Method::POST, &self.jira("/issueLink"), Service::Jira, Some(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unlink_issue(&self, link_id: &str) -> Result<()> {
        let url = self.jira(&format!("/issueLink/{}", urlencoding::encode(link_id)));
        self.send(Method::DELETE, &url, Service::Jira, None).await?;
        Ok(())
    }
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Warn if not HTTPS (but don't enforce for localhost/testing)
    if !url.starts_with("https://") && !url.contains("localhost") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> JiraClient {
        let credentials = Credentials {
            jira_url: "https://company.atlassian.net/".to_string(),
            jira_email: "user@company.com".to_string(),
            jira_token: "token".to_string(),
            tempo_url: "https://api.tempo.io".to_string(),
            tempo_token: "tempo".to_string(),
        };
        JiraClient::new(&credentials, &Settings::default()).unwrap()
    }

    #[test]
    fn test_normalize_base_url_removes_trailing_slashes() {
        assert_eq!(
            normalize_base_url("https://company.atlassian.net///"),
            "https://company.atlassian.net"
        );
        assert_eq!(
            normalize_base_url("https://company.atlassian.net/jira/"),
            "https://company.atlassian.net/jira"
        );
    }

    #[test]
    fn test_endpoint_urls() {
        let c = client();
        assert_eq!(c.jira("/myself"), "https://company.atlassian.net/rest/api/3/myself");
        assert_eq!(c.tempo("/worklogs"), "https://api.tempo.io/4/worklogs");
    }

    #[test]
    fn test_search_url_encodes_jql() {
        let c = client();
        let url = c.search_url(&c.jql);
        assert!(url.starts_with("https://company.atlassian.net/rest/api/3/search/jql?jql="));
        assert!(url.contains("assignee%20%3D%20currentUser%28%29"));
        assert!(url.contains("maxResults=100"));
        assert!(url.ends_with("fields=id,summary,status,issuetype,assignee,priority"));
    }

    #[test]
    fn test_epic_children_query() {
        let c = client();
        let url = c.search_url(&epic_children_jql("DEV-7"));
        assert_eq!(epic_children_jql("DEV-7"), "parent = DEV-7 ORDER BY status DESC");
        assert!(url.contains("jql=parent%20%3D%20DEV-7"));
    }

    #[test]
    fn test_transition_body_without_comment() {
        assert_eq!(
            transition_body("31", None),
            json!({ "transition": { "id": "31" } })
        );
    }

    #[test]
    fn test_transition_body_with_comment() {
        let body = transition_body("31", Some("duplicate"));
        assert_eq!(body["transition"]["id"], "31");
        assert_eq!(
            body["update"]["comment"][0]["add"]["body"]["content"][0]["content"][0]["text"],
            "duplicate"
        );
    }

    #[test]
    fn test_link_body() {
        let body = link_body("DEV-1", "OPS-42");
        assert_eq!(body["inwardIssue"]["key"], "DEV-1");
        assert_eq!(body["outwardIssue"]["key"], "OPS-42");
        assert_eq!(body["type"]["name"], LINK_TYPE);
    }

    #[test]
    fn test_error_from_response_uses_error_messages() {
        let err = JiraClient::error_from_response(
            StatusCode::NOT_FOUND,
            "https://x",
            r#"{"errorMessages":["Issue does not exist"],"errors":{}}"#,
        );
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "Issue does not exist"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_from_response_uses_field_errors() {
        let err = JiraClient::error_from_response(
            StatusCode::BAD_REQUEST,
            "https://x",
            r#"{"errorMessages":[],"errors":{"timetracking":"Invalid time format"}}"#,
        );
        match err {
            ApiError::BadRequest(msg) => assert_eq!(msg, "timetracking: Invalid time format"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_from_response_falls_back_to_url() {
        let err = JiraClient::error_from_response(StatusCode::NOT_FOUND, "https://x/y", "");
        assert!(matches!(err, ApiError::NotFound(ref u) if u == "https://x/y"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(JiraClient::is_retryable(&ApiError::RateLimited));
        assert!(JiraClient::is_retryable(&ApiError::ServerError("x".into())));
        assert!(!JiraClient::is_retryable(&ApiError::Unauthorized));
        assert!(!JiraClient::is_retryable(&ApiError::NotFound("x".into())));
    }

    #[test]
    fn test_retry_delay_exponential() {
        assert_eq!(JiraClient::calculate_retry_delay(1), 1000);
        assert_eq!(JiraClient::calculate_retry_delay(2), 2000);
        assert_eq!(JiraClient::calculate_retry_delay(3), 4000);
    }
}
