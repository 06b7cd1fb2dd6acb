use crate::utils::error::Result;
use crate::utils::validation::{validate_aws_region, validate_credential_pair, validate_url, Validate};
use std::env;

/// Object storage connection settings. Anything left unset falls back to the
/// ambient AWS provider chain (function role, `AWS_REGION`, ...).
#[derive(Clone, Default)]
pub struct S3Settings {
    pub endpoint_url: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
}

impl S3Settings {
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            endpoint_url: var("AWS_SERVICE_URL"),
            access_key: var("AWS_ACCESS_KEY"),
            secret_key: var("AWS_SECRET_KEY"),
            region: var("S3_REGION"),
        }
    }

    pub fn has_static_credentials(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }
}

// 不要把金鑰寫進日誌
impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("region", &self.region)
            .finish()
    }
}

impl Validate for S3Settings {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint_url {
            validate_url("endpoint_url", endpoint)?;
        }
        validate_credential_pair(self.access_key.as_deref(), self.secret_key.as_deref())?;
        if let Some(region) = &self.region {
            validate_aws_region("region", region)?;
        }

        tracing::info!(
            "S3 settings validated (endpoint override: {}, static credentials: {})",
            self.endpoint_url.is_some(),
            self.has_static_credentials()
        );
        Ok(())
    }
}
