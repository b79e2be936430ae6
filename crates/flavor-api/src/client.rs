use crate::errors::{ApiError, HttpError, Result};
use flavor_core::RawFlavor;
use log::{debug, error, info, trace};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Compute API microversion that inlines `description` and `extra_specs`.
pub const COMPUTE_MICROVERSION: &str = "2.61";

pub const DEFAULT_INTERFACE: &str = "public";
pub const DEFAULT_DOMAIN: &str = "Default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How to prove identity to Keystone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// User/password scoped to a project.
    Password {
        username: String,
        password: String,
        user_domain_name: String,
        project_name: String,
        project_domain_name: String,
    },
    /// Application credentials carry their own scope.
    ApplicationCredential { id: String, secret: String },
}

/// Everything needed to reach the compute service.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub auth_url: String,
    pub credentials: Credentials,
    pub region_name: Option<String>,
    pub interface: String,
    /// Skip catalog lookup and talk to this compute endpoint directly.
    pub compute_url: Option<String>,
    pub timeout: Duration,
}

impl AuthSettings {
    pub fn new(auth_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            auth_url: auth_url.into(),
            credentials,
            region_name: None,
            interface: DEFAULT_INTERFACE.to_string(),
            compute_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Trait for providing authentication settings to the client
/// This allows the main application to implement config without circular dependencies
pub trait AuthConfig {
    type Error;

    fn auth_settings(&self) -> std::result::Result<AuthSettings, Self::Error>;
}

/// Show the first and last four characters of a secret
fn mask(secret: &str) -> String {
    if secret.len() <= 8 {
        return "****".to_string();
    }
    format!("{}...{}", &secret[..4], &secret[secret.len() - 4..])
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    interface: String,
    url: String,
    #[serde(default)]
    region_id: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlavorListResponse {
    flavors: Vec<RawFlavor>,
    #[serde(default)]
    flavors_links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    rel: String,
    href: String,
}

/// An issued token plus the compute endpoint it should be used against.
#[derive(Debug, Clone)]
pub struct ComputeSession {
    pub token: String,
    pub compute_url: String,
}

/// HTTP client for the OpenStack Identity and Compute APIs
#[derive(Debug, Clone)]
pub struct OpenStackClient {
    client: Client,
    settings: AuthSettings,
}

impl OpenStackClient {
    /// Create a new client
    pub fn new(settings: AuthSettings) -> Result<Self> {
        Url::parse(&settings.auth_url).map_err(|e| {
            ApiError::Config(format!("invalid auth URL '{}': {}", settings.auth_url, e))
        })?;

        let client = Client::builder().timeout(settings.timeout).build()?;

        debug!("Creating OpenStackClient");
        debug!("  Auth URL: {}", settings.auth_url);
        debug!("  Interface: {}", settings.interface);
        if let Some(ref region) = settings.region_name {
            debug!("  Region: {}", region);
        }

        Ok(Self { client, settings })
    }

    /// Create client from any configuration implementing AuthConfig trait
    pub fn from_config<C>(config: &C) -> std::result::Result<Self, C::Error>
    where
        C: AuthConfig,
        C::Error: From<ApiError>,
    {
        debug!("Creating OpenStackClient from config");
        let settings = config.auth_settings()?;
        Ok(Self::new(settings)?)
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    fn token_url(&self) -> String {
        let base = self.settings.auth_url.trim_end_matches('/');
        if base.ends_with("/v3") {
            format!("{}/auth/tokens", base)
        } else {
            format!("{}/v3/auth/tokens", base)
        }
    }

    fn auth_body(&self) -> Value {
        match &self.settings.credentials {
            Credentials::Password {
                username,
                password,
                user_domain_name,
                project_name,
                project_domain_name,
            } => json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": {
                            "user": {
                                "name": username,
                                "domain": { "name": user_domain_name },
                                "password": password
                            }
                        }
                    },
                    "scope": {
                        "project": {
                            "name": project_name,
                            "domain": { "name": project_domain_name }
                        }
                    }
                }
            }),
            Credentials::ApplicationCredential { id, secret } => json!({
                "auth": {
                    "identity": {
                        "methods": ["application_credential"],
                        "application_credential": {
                            "id": id,
                            "secret": secret
                        }
                    }
                }
            }),
        }
    }

    /// Issue a Keystone token and resolve the compute endpoint
    pub async fn authenticate(&self) -> Result<ComputeSession> {
        let url = self.token_url();
        debug!("HTTP POST request to: {}", url);
        match &self.settings.credentials {
            Credentials::Password { username, .. } => {
                trace!("Authenticating as user '{}'", username)
            }
            Credentials::ApplicationCredential { id, .. } => {
                trace!("Authenticating with application credential {}", mask(id))
            }
        }

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&self.auth_body())
            .send()
            .await
            .map_err(|e| {
                error!("Token request failed: {:?}", e);
                ApiError::Request(e)
            })?;

        let response = self.handle_response(response).await?;

        let token = response
            .headers()
            .get("X-Subject-Token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(HttpError::MissingToken)?;
        trace!("Got token: {}", mask(&token));

        let body: TokenResponse = response.json().await?;

        let compute_url = match &self.settings.compute_url {
            Some(url) => {
                debug!("Using compute endpoint override: {}", url);
                url.clone()
            }
            None => self.find_compute_endpoint(&body.token.catalog)?,
        };

        Ok(ComputeSession { token, compute_url })
    }

    fn find_compute_endpoint(&self, catalog: &[CatalogEntry]) -> Result<String> {
        let service = catalog
            .iter()
            .find(|entry| entry.service_type == "compute")
            .ok_or_else(|| {
                ApiError::Catalog("no compute service in the service catalog".to_string())
            })?;

        let region = self.settings.region_name.as_deref();
        let endpoint = service
            .endpoints
            .iter()
            .filter(|e| e.interface == self.settings.interface)
            .find(|e| match region {
                Some(region) => {
                    e.region_id.as_deref() == Some(region) || e.region.as_deref() == Some(region)
                }
                None => true,
            })
            .ok_or_else(|| {
                ApiError::Catalog(format!(
                    "no {} compute endpoint{}",
                    self.settings.interface,
                    region
                        .map(|r| format!(" in region '{}'", r))
                        .unwrap_or_default()
                ))
            })?;

        debug!("Resolved compute endpoint: {}", endpoint.url);
        Ok(endpoint.url.trim_end_matches('/').to_string())
    }

    /// Make a GET request against the compute service
    async fn get(&self, session: &ComputeSession, url: &str) -> Result<Response> {
        debug!("HTTP GET request to: {}", url);
        trace!("  X-Auth-Token: {}", mask(&session.token));
        trace!("  OpenStack-API-Version: compute {}", COMPUTE_MICROVERSION);

        let response = self
            .client
            .get(url)
            .header("X-Auth-Token", &session.token)
            .header(
                "OpenStack-API-Version",
                format!("compute {}", COMPUTE_MICROVERSION),
            )
            .header("X-OpenStack-Nova-API-Version", COMPUTE_MICROVERSION)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("GET request failed: {:?}", e);
                ApiError::Request(e)
            })?;

        debug!("Response status: {}", response.status());

        self.handle_response(response).await
    }

    /// Handle HTTP response and convert errors
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            debug!("Request successful with status: {}", status);
            Ok(response)
        } else {
            let url = response.url().to_string();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            error!("Request failed with status: {}", status);
            debug!("Error response body: {}", error_text);

            let http_error = match status {
                StatusCode::UNAUTHORIZED => HttpError::AuthenticationFailed,
                StatusCode::FORBIDDEN => HttpError::Forbidden,
                StatusCode::NOT_FOUND => HttpError::NotFound(url),
                StatusCode::SERVICE_UNAVAILABLE => HttpError::ServiceUnavailable,
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => HttpError::Timeout,
                _ => HttpError::HttpError {
                    status: status.as_u16(),
                    message: error_text,
                },
            };

            Err(ApiError::Http(http_error))
        }
    }

    /// List every flavor visible to the session, following pagination links
    pub async fn get_flavors(&self, session: &ComputeSession) -> Result<Vec<RawFlavor>> {
        debug!("Fetching flavors");
        let mut url = format!("{}/flavors/detail?is_public=None", session.compute_url);
        let mut flavors = Vec::new();

        loop {
            let response = self.get(session, &url).await?;
            let page: FlavorListResponse = response.json().await?;
            trace!("Fetched page with {} flavors", page.flavors.len());
            flavors.extend(page.flavors);

            match page.flavors_links.into_iter().find(|l| l.rel == "next") {
                Some(next) if next.href != url => url = next.href,
                _ => break,
            }
        }

        info!("Successfully fetched {} flavors", flavors.len());
        Ok(flavors)
    }

    /// Authenticate and list flavors in one call
    pub async fn list_flavors(&self) -> Result<Vec<RawFlavor>> {
        let session = self.authenticate().await?;
        self.get_flavors(&session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password() -> Credentials {
        Credentials::Password {
            username: "demo".to_string(),
            password: "secret".to_string(),
            user_domain_name: DEFAULT_DOMAIN.to_string(),
            project_name: "demo".to_string(),
            project_domain_name: DEFAULT_DOMAIN.to_string(),
        }
    }

    fn client(auth_url: &str) -> OpenStackClient {
        OpenStackClient::new(AuthSettings::new(auth_url, password())).unwrap()
    }

    #[test]
    fn test_token_url_appends_version() {
        assert_eq!(
            client("https://keystone.example.com:5000").token_url(),
            "https://keystone.example.com:5000/v3/auth/tokens"
        );
        assert_eq!(
            client("https://keystone.example.com:5000/v3/").token_url(),
            "https://keystone.example.com:5000/v3/auth/tokens"
        );
    }

    #[test]
    fn test_invalid_auth_url() {
        let result = OpenStackClient::new(AuthSettings::new("not a url", password()));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_password_auth_body() {
        let body = client("https://keystone.example.com/v3").auth_body();
        assert_eq!(body["auth"]["identity"]["methods"][0], "password");
        assert_eq!(
            body["auth"]["identity"]["password"]["user"]["domain"]["name"],
            "Default"
        );
        assert_eq!(body["auth"]["scope"]["project"]["name"], "demo");
    }

    #[test]
    fn test_application_credential_auth_body_is_unscoped() {
        let settings = AuthSettings::new(
            "https://keystone.example.com/v3",
            Credentials::ApplicationCredential {
                id: "abc".to_string(),
                secret: "xyz".to_string(),
            },
        );
        let body = OpenStackClient::new(settings).unwrap().auth_body();
        assert_eq!(
            body["auth"]["identity"]["methods"][0],
            "application_credential"
        );
        assert!(body["auth"].get("scope").is_none());
    }

    #[test]
    fn test_find_compute_endpoint_by_interface_and_region() {
        let catalog: Vec<CatalogEntry> = serde_json::from_value(json!([
            {"type": "identity", "endpoints": []},
            {"type": "compute", "endpoints": [
                {"interface": "internal", "region_id": "RegionOne", "url": "http://nova-internal/v2.1"},
                {"interface": "public", "region_id": "RegionOne", "url": "http://nova-one/v2.1/"},
                {"interface": "public", "region_id": "RegionTwo", "url": "http://nova-two/v2.1"}
            ]}
        ]))
        .unwrap();

        let mut settings = AuthSettings::new("http://keystone/v3", password());
        let any_region = OpenStackClient::new(settings.clone()).unwrap();
        assert_eq!(
            any_region.find_compute_endpoint(&catalog).unwrap(),
            "http://nova-one/v2.1"
        );

        settings.region_name = Some("RegionTwo".to_string());
        let region_two = OpenStackClient::new(settings.clone()).unwrap();
        assert_eq!(
            region_two.find_compute_endpoint(&catalog).unwrap(),
            "http://nova-two/v2.1"
        );

        settings.region_name = Some("RegionThree".to_string());
        let missing = OpenStackClient::new(settings).unwrap();
        assert!(matches!(
            missing.find_compute_endpoint(&catalog),
            Err(ApiError::Catalog(_))
        ));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("gAAAAABkLongTokenValue"), "gAAA...alue");
    }
}
