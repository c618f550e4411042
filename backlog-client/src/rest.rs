//! REST implementation of the backend capability seam.
//!
//! Speaks the Azure DevOps work-item tracking REST API (7.1):
//!
//! ```text
//! GET  {org}/{project}/_apis/wit/queries?$depth=2
//! POST {org}/{project}/_apis/wit/queries/{parentFolder}
//! GET  {org}/_apis/wit/wiql/{queryId}
//! GET  {org}/_apis/wit/workitems?ids=1,2&fields=System.Id,...
//! GET  {org}/_apis/connectionData
//! ```

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use backlog_auth::Connection;
use backlog_core::{Identity, QueryId, QueryNode, WorkItem, WorkItemRef};

use crate::error::ClientError;
use crate::interface::WorkItemClient;

// ============================================================================
// Options
// ============================================================================

/// Settings for the REST client.
#[derive(Debug, Clone)]
pub struct RestOptions {
    /// `api-version` sent with every request.
    pub api_version: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self {
            api_version: "7.1".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// Wire Shapes
// ============================================================================

/// Envelope the backend wraps list results in.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    // A plain `default` would force `T: Default` through the derive.
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

/// Result of executing a query by id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WiqlResponse {
    #[serde(default)]
    work_items: Vec<WorkItemRef>,
}

/// Subset of the connection-data payload we care about.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionData {
    authenticated_user: Identity,
}

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

// ============================================================================
// REST Client
// ============================================================================

/// Reqwest-backed [`WorkItemClient`].
///
/// Owns its [`Connection`]: dropping the client (or the facade above it)
/// releases the session deterministically.
#[derive(Debug)]
pub struct RestWorkItemClient {
    connection: Connection,
    http: Client,
    options: RestOptions,
}

impl RestWorkItemClient {
    /// Creates a client over an authenticated connection with default
    /// options.
    pub fn new(connection: Connection) -> Result<Self, ClientError> {
        Self::with_options(connection, RestOptions::default())
    }

    /// Creates a client with explicit options.
    pub fn with_options(connection: Connection, options: RestOptions) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("backlog-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            connection,
            http,
            options,
        })
    }

    /// The connection this client owns.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Builds an endpoint-relative URL from path segments, keeping any
    /// organization path on the endpoint and percent-encoding each
    /// segment.
    fn api_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.connection.endpoint().clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidResponse("endpoint URL cannot be a base".into()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.connection.authorization_header())
            .query(&[("api-version", self.options.api_version.as_str())])
            .query(query)
            .send()
            .await?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ClientError> {
        debug!(url = %url, "POST");
        let response = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, self.connection.authorization_header())
            .query(&[("api-version", self.options.api_version.as_str())])
            .json(body)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl WorkItemClient for RestWorkItemClient {
    async fn query_folders(
        &self,
        project: &str,
        depth: u32,
    ) -> Result<Vec<QueryNode>, ClientError> {
        let url = self.api_url(&[project, "_apis", "wit", "queries"])?;
        let listed: ListResponse<QueryNode> = self
            .get_json(url, &[("$depth", depth.to_string())])
            .await?;
        Ok(listed.value)
    }

    async fn create_query(
        &self,
        project: &str,
        parent_folder: &str,
        draft: &QueryNode,
    ) -> Result<QueryNode, ClientError> {
        let url = self.api_url(&[project, "_apis", "wit", "queries", parent_folder])?;
        self.post_json(url, draft).await
    }

    async fn run_query(&self, id: &QueryId) -> Result<Vec<WorkItemRef>, ClientError> {
        let url = self.api_url(&["_apis", "wit", "wiql", id.as_str()])?;
        let result: WiqlResponse = self.get_json(url, &[]).await?;
        Ok(result.work_items)
    }

    async fn work_items(
        &self,
        ids: &[i32],
        fields: &[&str],
    ) -> Result<Vec<WorkItem>, ClientError> {
        let url = self.api_url(&["_apis", "wit", "workitems"])?;
        let listed: ListResponse<WorkItem> = self
            .get_json(
                url,
                &[("ids", csv(ids)), ("fields", fields.join(","))],
            )
            .await?;
        Ok(listed.value)
    }

    async fn identity(&self) -> Result<Identity, ClientError> {
        let identity = self
            .connection
            .identity(|| async {
                let url = self.api_url(&["_apis", "connectionData"])?;
                let data: ConnectionData = self.get_json(url, &[]).await?;
                Ok::<_, ClientError>(data.authenticated_user)
            })
            .await?;
        Ok(identity.clone())
    }
}

/// Maps a backend response to a decoded body or a classified error.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unrecognized error")
                .to_owned()
        });
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

fn csv(ids: &[i32]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RestWorkItemClient {
        let conn = Connection::delegated_token("https://dev.azure.com/contoso", "tok").unwrap();
        RestWorkItemClient::new(conn).unwrap()
    }

    #[test]
    fn test_api_url_keeps_organization_path() {
        let url = client()
            .api_url(&["Fabrikam", "_apis", "wit", "queries"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/contoso/Fabrikam/_apis/wit/queries"
        );
    }

    #[test]
    fn test_api_url_encodes_segments() {
        let url = client()
            .api_url(&["My Project", "_apis", "wit", "queries", "My Queries"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/contoso/My%20Project/_apis/wit/queries/My%20Queries"
        );
    }

    #[test]
    fn test_csv_joins_ids() {
        assert_eq!(csv(&[1, 2, 30]), "1,2,30");
        assert_eq!(csv(&[]), "");
    }

    #[test]
    fn test_list_envelope_decodes_payloads_without_default_impls() {
        let json = r#"{"count":1,"value":[{"name":"My Queries","isFolder":true}]}"#;
        let listed: ListResponse<QueryNode> = serde_json::from_str(json).unwrap();
        assert_eq!(listed.value[0].name, "My Queries");

        let items: ListResponse<WorkItem> =
            serde_json::from_str(r#"{"count":1,"value":[{"id":7}]}"#).unwrap();
        assert_eq!(items.value[0].id, 7);

        // Missing `value` still decodes to an empty list.
        let empty: ListResponse<WorkItem> = serde_json::from_str("{}").unwrap();
        assert!(empty.value.is_empty());
    }

    #[test]
    fn test_wiql_response_parses() {
        let json = r#"{"queryType": "flat", "workItems": [{"id": 3}, {"id": 1}]}"#;
        let parsed: WiqlResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.work_items.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![3, 1]
        );
    }

    #[test]
    fn test_error_body_message_extracted() {
        let body = r#"{"$id":"1","message":"TF401243: The query does not exist","typeKey":"QueryItemNotFoundException"}"#;
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert!(parsed.message.unwrap().contains("TF401243"));
    }
}
