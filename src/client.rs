use crate::errors::{ClientError, FetchError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Url;
use serde::Deserialize;

/// Organization account as returned by `GET /orgs/{name}`.
///
/// Counters the API may withhold (depending on token scope) are optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Organization {
    pub login: Option<String>,
    pub public_repos: Option<i64>,
    pub public_gists: Option<i64>,
    pub private_gists: Option<i64>,
    pub followers: Option<i64>,
    pub following: Option<i64>,
    pub collaborators: Option<i64>,
    pub disk_usage: Option<i64>,
    pub total_private_repos: Option<i64>,
    pub owned_private_repos: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrganizationSource: Send + Sync {
    /// Fetch one organization record. Called once per name per scrape.
    async fn get_organization(&self, name: &str) -> Result<Organization, FetchError>;
}

/// REST client for the organizations endpoint.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let base_url = Url::parse(api_url).map_err(|e| ClientError::InvalidApiUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidApiUrl {
                url: api_url.to_string(),
                reason: "url cannot be used as a base".into(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("entity-exporter/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// `{base}/orgs/{name}`, with the name escaped as a single path segment.
    fn org_url(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("orgs").push(name);
        }
        url
    }
}

#[async_trait]
impl OrganizationSource for GithubClient {
    async fn get_organization(&self, name: &str) -> Result<Organization, FetchError> {
        let mut request = self.http.get(self.org_url(name));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| FetchError::Transport {
            name: name.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                name: name.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            name: name.to_string(),
            source: e,
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            name: name.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap as RequestHeaders, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tokio::net::TcpListener;
    use tokio_test::assert_err;

    const SAMPLE_ORG: &str = r#"{
        "login": "acme",
        "id": 1,
        "public_repos": 42,
        "public_gists": 3,
        "followers": 120,
        "following": 0,
        "created_at": "2015-03-01T10:00:00Z",
        "updated_at": "2024-01-15T08:30:00Z"
    }"#;

    async fn spawn_api() -> String {
        async fn org(Path(name): Path<String>, headers: RequestHeaders) -> (StatusCode, String) {
            let authorized = headers
                .get("authorization")
                .map_or(true, |v| v == "Bearer secret");
            match name.as_str() {
                _ if !authorized => (StatusCode::UNAUTHORIZED, String::new()),
                "acme" => (StatusCode::OK, SAMPLE_ORG.to_string()),
                "broken" => (StatusCode::OK, "{\"login\":".to_string()),
                _ => (StatusCode::NOT_FOUND, "{\"message\":\"Not Found\"}".to_string()),
            }
        }

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/api/v3/orgs/:name", get(org));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/v3")
    }

    #[test]
    fn test_decode_partial_record() {
        let org: Organization = serde_json::from_str(SAMPLE_ORG).unwrap();
        assert_eq!(org.public_repos, Some(42));
        assert_eq!(org.following, Some(0));
        assert_eq!(org.disk_usage, None);
        assert_eq!(org.owned_private_repos, None);
        assert_eq!(org.created_at.timestamp(), 1_425_204_000);
    }

    #[test]
    fn test_decode_requires_timestamps() {
        let raw = r#"{"login":"acme","public_repos":1}"#;
        assert!(serde_json::from_str::<Organization>(raw).is_err());
    }

    #[test]
    fn test_org_url_escapes_name() {
        let client = GithubClient::new("https://ghe.example.com/api/v3/", None).unwrap();
        assert_eq!(
            client.org_url("acme").as_str(),
            "https://ghe.example.com/api/v3/orgs/acme"
        );
        assert_eq!(
            client.org_url("a/b").as_str(),
            "https://ghe.example.com/api/v3/orgs/a%2Fb"
        );
    }

    #[test]
    fn test_rejects_invalid_api_url() {
        assert!(matches!(
            GithubClient::new("not a url", None),
            Err(ClientError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            GithubClient::new("mailto:ops@example.com", None),
            Err(ClientError::InvalidApiUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_organization() {
        let base = spawn_api().await;
        let client = GithubClient::new(&base, Some("secret".into())).unwrap();
        let org = client.get_organization("acme").await.unwrap();
        assert_eq!(org.login.as_deref(), Some("acme"));
        assert_eq!(org.followers, Some(120));
    }

    #[tokio::test]
    async fn test_fetch_status_error() {
        let base = spawn_api().await;
        let client = GithubClient::new(&base, None).unwrap();
        match client.get_organization("missing").await {
            Err(FetchError::Status { name, status }) => {
                assert_eq!(name, "missing");
                assert_eq!(status, 404);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let client = GithubClient::new(&base, Some("wrong".into())).unwrap();
        assert_err!(client.get_organization("acme").await);
    }

    #[tokio::test]
    async fn test_fetch_decode_error() {
        let base = spawn_api().await;
        let client = GithubClient::new(&base, None).unwrap();
        let err = client.get_organization("broken").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}
