//! Azure Resource Manager role definition listing over HTTP

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, RoleError};
use crate::source::RoleDefinitionSource;
use crate::token::BearerToken;
use crate::types::{ContinuationToken, Page, RoleDefinition, RoleDefinitionId};

/// Public Azure management endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// API version of the role definitions listing
pub const DEFAULT_API_VERSION: &str = "2022-04-01";

const ROLE_DEFINITIONS_PATH: &str = "providers/Microsoft.Authorization/roleDefinitions";

/// Role definition source backed by the ARM REST API
///
/// Follows `nextLink` as the continuation marker. Links pointing anywhere
/// other than the configured endpoint are rejected so the bearer token is
/// only ever sent to that endpoint.
#[derive(Debug, Clone)]
pub struct ArmRoleDefinitionSource {
    client: Client,
    endpoint: String,
    api_version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    value: Vec<ArmRoleDefinition>,
    #[serde(default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArmRoleDefinition {
    id: String,
    properties: ArmRoleProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmRoleProperties {
    role_name: String,
}

impl ArmRoleDefinitionSource {
    /// Creates a source for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, api_version: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RoleError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
        })
    }

    /// Source for the public Azure cloud
    pub fn public_cloud() -> Result<Self> {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_API_VERSION, Duration::from_secs(30))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn first_page_url(&self, scope: &str) -> String {
        let scope = scope.trim_matches('/');
        if scope.is_empty() {
            format!("{}/{}?api-version={}", self.endpoint, ROLE_DEFINITIONS_PATH, self.api_version)
        } else {
            format!(
                "{}/{}/{}?api-version={}",
                self.endpoint, scope, ROLE_DEFINITIONS_PATH, self.api_version
            )
        }
    }

    fn check_next_link(&self, link: &str) -> Result<()> {
        let on_endpoint = link
            .strip_prefix(&self.endpoint)
            .map_or(false, |rest| rest.starts_with('/'));
        if on_endpoint {
            Ok(())
        } else {
            warn!(endpoint = %self.endpoint, "Catalog returned a nextLink outside the endpoint");
            Err(RoleError::InvalidResponse(
                "nextLink does not point at the configured endpoint".to_string(),
            ))
        }
    }
}

#[async_trait]
impl RoleDefinitionSource for ArmRoleDefinitionSource {
    async fn fetch_page(
        &self,
        token: &BearerToken,
        scope: &str,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page<RoleDefinition>> {
        let url = match continuation {
            Some(next) => {
                self.check_next_link(next.as_str())?;
                next.as_str().to_string()
            }
            None => self.first_page_url(scope),
        };
        debug!(%url, "Requesting role definition page");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| RoleError::PageFetchFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(RoleError::Unauthorized(format!("API error ({status}): {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoleError::PageFetchFailed(format!("API error ({status}): {body}")));
        }

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| RoleError::InvalidResponse(e.to_string()))?;

        let items = body
            .value
            .into_iter()
            .map(|definition| RoleDefinition {
                name: definition.properties.role_name,
                id: RoleDefinitionId::new(definition.id),
            })
            .collect();

        let next = body
            .next_link
            .filter(|link| !link.is_empty())
            .map(ContinuationToken::new);

        Ok(Page { items, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(endpoint: &str) -> ArmRoleDefinitionSource {
        ArmRoleDefinitionSource::new(endpoint, DEFAULT_API_VERSION, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_first_page_url_at_root() {
        let source = source("https://management.azure.com/");

        assert_eq!(
            source.first_page_url("/"),
            "https://management.azure.com/providers/Microsoft.Authorization/roleDefinitions?api-version=2022-04-01"
        );
    }

    #[test]
    fn test_first_page_url_at_subscription() {
        let source = source("https://management.azure.com");

        assert_eq!(
            source.first_page_url("/subscriptions/0000/"),
            "https://management.azure.com/subscriptions/0000/providers/Microsoft.Authorization/roleDefinitions?api-version=2022-04-01"
        );
    }

    #[test]
    fn test_next_link_must_stay_on_endpoint() {
        let source = source("https://management.azure.com");

        assert!(source
            .check_next_link("https://management.azure.com/providers/x?$skiptoken=abc")
            .is_ok());
        assert!(source
            .check_next_link("https://management.azure.com.evil.example/providers/x")
            .is_err());
        assert!(source.check_next_link("https://elsewhere.example/x").is_err());
    }

    #[test]
    fn test_parse_list_response() {
        let json = r#"{
            "value": [
                {
                    "id": "/providers/Microsoft.Authorization/roleDefinitions/acdd72a7",
                    "name": "acdd72a7",
                    "type": "Microsoft.Authorization/roleDefinitions",
                    "properties": { "roleName": "Reader", "type": "BuiltInRole" }
                }
            ],
            "nextLink": "https://management.azure.com/next"
        }"#;

        let parsed: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.value.len(), 1);
        assert_eq!(parsed.value[0].properties.role_name, "Reader");
        assert_eq!(parsed.next_link.as_deref(), Some("https://management.azure.com/next"));
    }
}
