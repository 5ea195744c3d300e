use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// A team as listed for the active organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub id: String,
    pub name: String,
    pub organization_id: String,
}

/// The two server calls the mirror depends on.
#[async_trait]
pub trait TeamSessionApi: Send + Sync {
    /// Teams of `organization_id`, in server order.
    async fn list_teams(&self, organization_id: &str) -> Result<Vec<TeamSummary>, ClientError>;

    /// Write the active team to the server session. `None` clears it.
    async fn set_active_team(&self, team_id: Option<&str>) -> Result<(), ClientError>;
}

#[async_trait]
impl<T: TeamSessionApi + ?Sized> TeamSessionApi for Arc<T> {
    async fn list_teams(&self, organization_id: &str) -> Result<Vec<TeamSummary>, ClientError> {
        (**self).list_teams(organization_id).await
    }

    async fn set_active_team(&self, team_id: Option<&str>) -> Result<(), ClientError> {
        (**self).set_active_team(team_id).await
    }
}

#[cfg(feature = "http")]
pub use http::{HttpOptions, HttpTeamSessionApi};

#[cfg(feature = "http")]
mod http {
    use super::*;
    use std::time::Duration;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct SetActiveTeamBody<'a> {
        team_id: Option<&'a str>,
    }

    /// Connection options for [`HttpTeamSessionApi`].
    #[derive(Debug, Clone)]
    pub struct HttpOptions {
        /// Server origin, e.g. `https://app.example.com`.
        pub base_url: String,
        /// Path prefix of the auth routes.
        pub base_path: String,
        /// Sent as `Authorization: Bearer <token>` when set.
        pub auth_token: Option<String>,
        pub timeout: Duration,
    }

    impl Default for HttpOptions {
        fn default() -> Self {
            Self {
                base_url: String::new(),
                base_path: "/api/auth".to_string(),
                auth_token: None,
                timeout: Duration::from_secs(30),
            }
        }
    }

    impl HttpOptions {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                base_url: base_url.into(),
                ..Default::default()
            }
        }

        pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
            self.base_path = base_path.into();
            self
        }

        pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
            self.auth_token = Some(token.into());
            self
        }

        pub fn timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }
    }

    /// [`TeamSessionApi`] over HTTP.
    ///
    /// `GET {base}/organization/list-teams?organizationId=...` and
    /// `POST {base}/organization/set-active-team`.
    #[derive(Debug, Clone)]
    pub struct HttpTeamSessionApi {
        http: reqwest::Client,
        options: HttpOptions,
    }

    impl HttpTeamSessionApi {
        pub fn new(options: HttpOptions) -> Result<Self, ClientError> {
            let http = reqwest::Client::builder()
                .timeout(options.timeout)
                .build()
                .map_err(ClientError::network)?;
            Ok(Self { http, options })
        }

        fn url(&self, path: &str) -> String {
            format!(
                "{}{}{}",
                self.options.base_url.trim_end_matches('/'),
                self.options.base_path,
                path
            )
        }

        fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
            match &self.options.auth_token {
                Some(token) => request.bearer_auth(token),
                None => request,
            }
        }

        /// Decode a response, mapping non-2xx statuses to [`ClientError::Status`].
        async fn handle_response<T: serde::de::DeserializeOwned>(
            resp: reqwest::Response,
        ) -> Result<T, ClientError> {
            let status = resp.status();
            let body = resp.text().await.map_err(ClientError::network)?;

            if !status.is_success() {
                let message = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                    .unwrap_or(body);
                return Err(ClientError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = if body.is_empty() { "null" } else { body.as_str() };
            serde_json::from_str(body).map_err(|e| {
                ClientError::Deserialization(format!("Failed to deserialize response: {}", e))
            })
        }
    }

    #[async_trait]
    impl TeamSessionApi for HttpTeamSessionApi {
        async fn list_teams(
            &self,
            organization_id: &str,
        ) -> Result<Vec<TeamSummary>, ClientError> {
            let resp = self
                .authorize(self.http.get(self.url("/organization/list-teams")))
                .query(&[("organizationId", organization_id)])
                .send()
                .await
                .map_err(ClientError::network)?;

            Self::handle_response(resp).await
        }

        async fn set_active_team(&self, team_id: Option<&str>) -> Result<(), ClientError> {
            let resp = self
                .authorize(self.http.post(self.url("/organization/set-active-team")))
                .json(&SetActiveTeamBody { team_id })
                .send()
                .await
                .map_err(ClientError::network)?;

            let _: serde::de::IgnoredAny = Self::handle_response(resp).await?;
            Ok(())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_summary_uses_camel_case() {
        let team: TeamSummary = serde_json::from_str(
            r#"{"id":"t1","name":"Core","organizationId":"org_a","createdAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(team.organization_id, "org_a");
    }
}
