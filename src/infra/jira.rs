use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::Deserialize;
use tracing::debug;

use crate::config::JiraSettings;
use crate::domain::ticket::{Ticket, TicketStatus};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

const SEARCH_LIMIT: &str = "50";
const ISSUE_FIELDS: &str = "summary,description,status,issuetype,priority,assignee,reporter,created,updated";

pub struct JiraClient {
    http: Client,
    settings: JiraSettings,
}

impl JiraClient {
    pub fn new(settings: JiraSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    fn api_details(&self) -> AppResult<(&str, &str, &str)> {
        let base_url = self
            .settings
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira base URL not configured".to_string()))?;
        let email = self
            .settings
            .email
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira email not configured".to_string()))?;
        let token = self
            .settings
            .token
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira API token not configured".to_string()))?;
        Ok((base_url.trim_end_matches('/'), email, token))
    }

    fn auth_header(email: &str, token: &str) -> String {
        let credentials = format!("{email}:{token}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    fn browse_url(base_url: &str, key: &str) -> String {
        format!("{base_url}/browse/{key}")
    }

    fn open_tickets_jql(&self) -> AppResult<String> {
        let project = self
            .settings
            .project
            .as_deref()
            .map(str::trim)
            .filter(|project| !project.is_empty())
            .ok_or_else(|| AppError::Configuration("Jira project key not configured".to_string()))?;
        Ok(format!(
            "project = \"{project}\" AND statusCategory != Done ORDER BY created ASC"
        ))
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> AppResult<reqwest::Response> {
        let (_, email, token) = self.api_details()?;
        self.http
            .get(url)
            .query(query)
            .header(AUTHORIZATION, Self::auth_header(email, token))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to call Jira: {err}")))
    }
}

async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<unable to read response>".to_string())
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn list_open_tickets(&self) -> AppResult<Vec<Ticket>> {
        let (base_url, _, _) = self.api_details()?;
        let jql = self.open_tickets_jql()?;
        debug!(%jql, "searching Jira");

        let response = self
            .get(
                &format!("{base_url}/rest/api/3/search"),
                &[
                    ("jql", jql.as_str()),
                    ("fields", ISSUE_FIELDS),
                    ("maxResults", SEARCH_LIMIT),
                ],
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(AppError::IssueTracker(format!(
                "Jira responded with {status}: {body}"
            )));
        }

        let payload: JiraSearchResponse = response.json().await.map_err(|err| {
            AppError::IssueTracker(format!("failed to parse Jira response: {err}"))
        })?;

        Ok(payload
            .issues
            .into_iter()
            .map(|issue| issue.into_ticket(base_url))
            .filter(|ticket| ticket.status != TicketStatus::Done)
            .collect())
    }

    async fn get_ticket_details(&self, ticket_id: &str) -> AppResult<Ticket> {
        let key = ticket_id.trim();
        if key.is_empty() {
            return Err(AppError::InvalidRequest(
                "ticket id must not be empty".to_string(),
            ));
        }
        let (base_url, _, _) = self.api_details()?;
        debug!(key, "fetching Jira issue");

        let response = self
            .get(
                &format!("{base_url}/rest/api/3/issue/{key}"),
                &[("fields", ISSUE_FIELDS)],
            )
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::TicketNotFound(key.to_string()));
        }
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(AppError::IssueTracker(format!(
                "Jira responded with {status}: {body}"
            )));
        }

        let issue: JiraIssue = response.json().await.map_err(|err| {
            AppError::IssueTracker(format!("failed to parse Jira response: {err}"))
        })?;
        Ok(issue.into_ticket(base_url))
    }
}

#[derive(Deserialize)]
struct JiraSearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraIssueFields,
}

impl JiraIssue {
    fn into_ticket(self, base_url: &str) -> Ticket {
        let fields = self.fields;
        Ticket {
            url: Some(JiraClient::browse_url(base_url, &self.key)),
            key: self.key,
            summary: fields.summary.unwrap_or_default(),
            description: fields
                .description
                .map(|doc| doc.plain_text())
                .unwrap_or_default(),
            status: fields
                .status
                .map(|status| TicketStatus::from_name(&status.name))
                .unwrap_or(TicketStatus::Unknown),
            issue_type: fields.issuetype.map(|named| named.name),
            priority: fields.priority.map(|named| named.name),
            assignee: fields.assignee.map(|user| user.display_name),
            reporter: fields.reporter.map(|user| user.display_name),
            created: fields.created,
            updated: fields.updated,
        }
    }
}

#[derive(Deserialize)]
struct JiraIssueFields {
    summary: Option<String>,
    description: Option<JiraDocNode>,
    status: Option<JiraNamed>,
    issuetype: Option<JiraNamed>,
    priority: Option<JiraNamed>,
    assignee: Option<JiraUser>,
    reporter: Option<JiraUser>,
    created: Option<String>,
    updated: Option<String>,
}

#[derive(Deserialize)]
struct JiraNamed {
    name: String,
}

#[derive(Deserialize)]
struct JiraUser {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Deserialize)]
struct JiraDocNode {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Vec<JiraDocNode>,
}

impl JiraDocNode {
    fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out, None);
        out.trim().to_string()
    }

    fn write_text(&self, out: &mut String, list_item: Option<String>) {
        match self.node_type.as_str() {
            "text" => {
                if let Some(text) = &self.text {
                    out.push_str(text);
                }
            }
            "hardBreak" => out.push('\n'),
            "bulletList" => {
                for item in &self.content {
                    item.write_text(out, Some("- ".to_string()));
                }
            }
            "orderedList" => {
                for (index, item) in self.content.iter().enumerate() {
                    item.write_text(out, Some(format!("{}. ", index + 1)));
                }
            }
            "listItem" => {
                out.push_str(list_item.as_deref().unwrap_or("- "));
                let mut inner = String::new();
                for child in &self.content {
                    child.write_text(&mut inner, None);
                }
                out.push_str(inner.trim());
                out.push('\n');
            }
            "paragraph" | "heading" => {
                for child in &self.content {
                    child.write_text(out, None);
                }
                out.push_str("\n\n");
            }
            _ => {
                for child in &self.content {
                    child.write_text(out, None);
                }
            }
        }
    }
}
