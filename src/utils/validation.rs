use crate::utils::error::{EtlError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> EtlError {
    EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Endpoint overrides (LocalStack, MinIO, ...) must be absolute http(s) URLs.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "endpoint override is set but empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("not a valid endpoint URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field_name,
            url_str,
            format!("endpoint must use http or https, got {}", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(invalid(field_name, url_str, "endpoint has no host"));
    }
    Ok(())
}

/// Scratch files are created under this path, so it must be usable as one.
pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "scratch directory cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "scratch directory contains a NUL byte"));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "must not be blank"));
    }
    Ok(())
}

/// Access and secret keys only make sense as a pair.
pub fn validate_credential_pair(access_key: Option<&str>, secret_key: Option<&str>) -> Result<()> {
    match (access_key, secret_key) {
        (Some(_), None) => Err(EtlError::ConfigError {
            message: "AWS_ACCESS_KEY is set but AWS_SECRET_KEY is missing".to_string(),
        }),
        (None, Some(_)) => Err(EtlError::ConfigError {
            message: "AWS_SECRET_KEY is set but AWS_ACCESS_KEY is missing".to_string(),
        }),
        _ => Ok(()),
    }
}

pub fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            field_name,
            region,
            "region may only contain lowercase letters, digits and hyphens",
        ));
    }

    Ok(())
}
