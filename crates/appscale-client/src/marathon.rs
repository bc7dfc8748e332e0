//! Marathon REST API client.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::transport::HttpClient;
use crate::Orchestrator;

/// An application as returned by `GET /v2/apps`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct App {
    pub id: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Configured instance count.
    #[serde(default)]
    pub instances: u32,
}

/// An application with its tasks, from `GET /v2/apps/{id}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppDetail {
    pub id: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// A running task of an application.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub host: String,
}

#[derive(Deserialize)]
struct AppList {
    apps: Vec<App>,
}

#[derive(Deserialize)]
struct AppEnvelope {
    app: AppDetail,
}

#[derive(Serialize)]
struct ScaleRequest {
    instances: u32,
}

/// Client for one Marathon endpoint.
#[derive(Debug, Clone)]
pub struct MarathonClient {
    http: HttpClient,
    /// `host:port` to connect to.
    authority: String,
    /// Path prefix when Marathon is served below `/`, without trailing slash.
    base_path: String,
}

impl MarathonClient {
    /// Build a client from `http://host[:port][/prefix]` or `host[:port]`.
    ///
    /// Only plain HTTP is supported; the port defaults to 80.
    pub fn new(endpoint: &str, timeout: Duration) -> ClientResult<Self> {
        let invalid = |reason: &str| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = endpoint.trim();
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
        let uri: http::Uri = with_scheme
            .parse()
            .map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;

        if uri.scheme_str() != Some("http") {
            return Err(invalid("only http:// endpoints are supported"));
        }
        let authority = uri.authority().ok_or_else(|| invalid("missing host"))?;
        let authority = match authority.port_u16() {
            Some(_) => authority.as_str().to_string(),
            None => format!("{}:80", authority.host()),
        };
        let base_path = uri.path().trim_end_matches('/').to_string();

        debug!(%authority, %base_path, "marathon endpoint configured");
        Ok(Self {
            http: HttpClient::new(timeout),
            authority,
            base_path,
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    fn apps_path(&self) -> String {
        format!("{}/v2/apps", self.base_path)
    }

    /// Path of one app. Marathon ids carry a leading `/`.
    fn app_path(&self, app_id: &str) -> String {
        format!("{}/v2/apps/{}", self.base_path, app_id.trim_start_matches('/'))
    }
}

impl Orchestrator for MarathonClient {
    async fn list_apps(&self) -> ClientResult<Vec<App>> {
        let list: AppList = self.http.get_json(&self.authority, &self.apps_path()).await?;
        debug!(apps = list.apps.len(), "apps listed");
        Ok(list.apps)
    }

    async fn app_detail(&self, app_id: &str) -> ClientResult<AppDetail> {
        let envelope: AppEnvelope = self
            .http
            .get_json(&self.authority, &self.app_path(app_id))
            .await?;
        debug!(%app_id, tasks = envelope.app.tasks.len(), "app detail fetched");
        Ok(envelope.app)
    }

    async fn scale_app(&self, app_id: &str, instances: u32) -> ClientResult<()> {
        let path = format!("{}?force=true", self.app_path(app_id));
        self.http
            .put_json(&self.authority, &path, &ScaleRequest { instances })
            .await?;
        info!(%app_id, instances, "scale command accepted");
        Ok(())
    }
}
