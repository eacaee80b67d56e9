//! HTTP client for the fabric controller, with token-cookie session handling.

use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use fabsync_types::{ContractAction, ContractRole, FilterRecord};

use crate::payloads::{
    contract_attach_payload, contract_path, contract_payload, epg_path, epg_payload,
    filter_path, filter_payload, filter_swap_payload, subject_path,
};
use crate::{FabricController, FabricError, FabricResult, FilterBinding, LifecycleStatus};

/// Connection settings for the fabric controller.
#[derive(Debug, Clone)]
pub struct ApicConfig {
    /// Base URL, e.g. `https://apic.example.com`
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Tenant all managed objects live under
    pub tenant: String,
    /// Application profile group objects live under
    pub application_profile: String,
}

/// Authenticated client for the controller's managed-object API.
///
/// Once constructed (via [`crate::SharedController`]) the handle is shared
/// across tasks; individual requests need no mutual exclusion. The session
/// token is refreshed by the session-keeper task through [`Self::refresh`].
pub struct ApicClient {
    http: reqwest::Client,
    config: ApicConfig,
    token: RwLock<Option<String>>,
}

impl ApicClient {
    pub fn new(config: ApicConfig) -> FabricResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            config,
            token: RwLock::new(None),
        })
    }

    pub fn tenant(&self) -> &str {
        &self.config.tenant
    }

    pub fn application_profile(&self) -> &str {
        &self.config.application_profile
    }

    /// Logs into the controller and stores the session token.
    pub async fn login(&self) -> FabricResult<()> {
        let url = format!("{}/api/aaaLogin.json", self.config.base_url);
        let body = json!({
            "aaaUser": {
                "attributes": {
                    "name": self.config.username,
                    "pwd": self.config.password,
                }
            }
        });

        let response = self.http.post(&url).json(&body).send().await?;
        if response.status().as_u16() != 200 {
            return Err(FabricError::Auth(format!(
                "login returned status {}",
                response.status()
            )));
        }

        let value: Value = response.json().await?;
        let token = session_token(&value).ok_or_else(|| {
            FabricError::MalformedResponse("login response missing session token".to_string())
        })?;
        *self.token.write().await = Some(token);

        debug!("Logged into fabric controller");
        Ok(())
    }

    /// Refreshes the session before the validity window lapses. A refreshed
    /// token in the response replaces the stored one.
    pub async fn refresh(&self) -> FabricResult<()> {
        let url = format!("{}/api/aaaRefresh.json", self.config.base_url);
        let cookie = self.cookie().await?;

        let response = self.http.get(&url).header(COOKIE, cookie).send().await?;
        if response.status().as_u16() != 200 {
            return Err(FabricError::Auth(format!(
                "session refresh returned status {}",
                response.status()
            )));
        }

        let value: Value = response.json().await?;
        if let Some(token) = session_token(&value) {
            *self.token.write().await = Some(token);
        }

        debug!("Refreshed fabric controller session");
        Ok(())
    }

    /// Ends the session and drops the stored token.
    pub async fn logout(&self) -> FabricResult<()> {
        let url = format!("{}/api/aaaLogout.json", self.config.base_url);
        let cookie = self.cookie().await?;
        let body = json!({
            "aaaUser": {
                "attributes": {
                    "name": self.config.username,
                }
            }
        });

        let response = self
            .http
            .post(&url)
            .header(COOKIE, cookie)
            .json(&body)
            .send()
            .await?;
        *self.token.write().await = None;

        if response.status().as_u16() != 200 {
            return Err(FabricError::Auth(format!(
                "logout returned status {}",
                response.status()
            )));
        }
        debug!("Logged out of fabric controller");
        Ok(())
    }

    async fn cookie(&self) -> FabricResult<String> {
        let token = self.token.read().await;
        match token.as_deref() {
            Some(token) => Ok(format!("APIC-cookie={}", token)),
            None => Err(FabricError::Auth("no active session".to_string())),
        }
    }

    /// Posts one managed-object tree. A 200 response is success; anything
    /// else fails this call only.
    async fn post_mo(&self, path: &str, payload: &Value) -> FabricResult<()> {
        let url = format!("{}{}", self.config.base_url, path);
        let cookie = self.cookie().await?;

        let response = self
            .http
            .post(&url)
            .header(COOKIE, cookie)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            Err(FabricError::CallFailed {
                path: path.to_string(),
                status,
            })
        }
    }
}

/// Pulls the session token out of an `aaaLogin`/`aaaRefresh` response.
fn session_token(value: &Value) -> Option<String> {
    value["imdata"][0]["aaaLogin"]["attributes"]["token"]
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl FabricController for ApicClient {
    async fn push_epg(&self, epg: &str, status: LifecycleStatus) -> FabricResult<()> {
        debug!(epg, status = status.as_str(), "Pushing EPG to controller");
        let path = epg_path(&self.config.tenant, &self.config.application_profile, epg);
        self.post_mo(&path, &epg_payload(epg, status)).await
    }

    async fn push_filter(
        &self,
        filter: &FilterRecord,
        status: LifecycleStatus,
    ) -> FabricResult<()> {
        debug!(
            filter = filter.name,
            status = status.as_str(),
            "Pushing filter to controller"
        );
        let path = filter_path(&self.config.tenant, &filter.name);
        self.post_mo(&path, &filter_payload(filter, status)).await
    }

    async fn push_contract(
        &self,
        contract: &str,
        binding: Option<&FilterBinding>,
        status: LifecycleStatus,
    ) -> FabricResult<()> {
        debug!(
            contract,
            status = status.as_str(),
            "Pushing contract to controller"
        );
        let path = contract_path(&self.config.tenant, contract);
        self.post_mo(&path, &contract_payload(contract, binding, status))
            .await
    }

    async fn replace_contract_filter(
        &self,
        contract: &str,
        old_filter: &str,
        new_filter: &str,
        action: ContractAction,
    ) -> FabricResult<()> {
        debug!(contract, old_filter, new_filter, "Swapping contract filter");
        let path = subject_path(&self.config.tenant, contract);
        self.post_mo(&path, &filter_swap_payload(old_filter, new_filter, action))
            .await
    }

    async fn attach_contract(
        &self,
        role: ContractRole,
        epg: &str,
        contract: &str,
        status: LifecycleStatus,
    ) -> FabricResult<()> {
        debug!(
            epg,
            contract,
            role = role.party(),
            status = status.as_str(),
            "Updating contract attachment"
        );
        let path = epg_path(&self.config.tenant, &self.config.application_profile, epg);
        self.post_mo(&path, &contract_attach_payload(role, contract, status))
            .await
    }
}
