//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! consistency. Every problem is reported, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::auth::token::validate_plaintext;
use crate::config::schema::{GuardConfig, MAX_EVICTION_WINDOW_SECS, MAX_SWEEP_INTERVAL_SECS};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate `config`, returning every problem found.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "must be a socket address"));
    }

    let limit = &config.rate_limit;
    if !(limit.requests_per_second.is_finite() && limit.requests_per_second > 0.0) {
        errors.push(ValidationError::new("rate_limit.requests_per_second", "must be positive"));
    }
    if limit.burst == 0 {
        errors.push(ValidationError::new("rate_limit.burst", "must be at least 1"));
    }
    if limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("rate_limit.sweep_interval_secs", "must be positive"));
    } else if limit.sweep_interval_secs > MAX_SWEEP_INTERVAL_SECS {
        errors.push(ValidationError::new(
            "rate_limit.sweep_interval_secs",
            format!("must be at most {MAX_SWEEP_INTERVAL_SECS}"),
        ));
    }
    if limit.eviction_window().as_secs() > MAX_EVICTION_WINDOW_SECS {
        errors.push(ValidationError::new(
            "rate_limit.eviction_window_secs",
            format!("must be at most {MAX_EVICTION_WINDOW_SECS}"),
        ));
    } else if limit.eviction_window() < limit.sweep_interval() {
        errors.push(ValidationError::new(
            "rate_limit.eviction_window_secs",
            "must not be shorter than the sweep interval",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    let mut ids = HashSet::new();
    let mut tokens = HashSet::new();
    for (i, account) in config.accounts.iter().enumerate() {
        if !ids.insert(account.id) {
            errors.push(ValidationError::new(format!("accounts[{i}].id"), "duplicate id"));
        }
        if let Err(e) = validate_plaintext(&account.token) {
            errors.push(ValidationError::new(format!("accounts[{i}].token"), e.to_string()));
        } else if !tokens.insert(account.token.as_str()) {
            errors.push(ValidationError::new(format!("accounts[{i}].token"), "duplicate token"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AccountConfig;

    fn account(id: i64, token: &str) -> AccountConfig {
        AccountConfig {
            id,
            token: token.to_string(),
            activated: true,
            permissions: Vec::new(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GuardConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = GuardConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.rate_limit.requests_per_second = 0.0;
        config.rate_limit.burst = 0;
        config.rate_limit.eviction_window_secs = Some(10);

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "rate_limit.requests_per_second",
                "rate_limit.burst",
                "rate_limit.eviction_window_secs",
            ]
        );
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let mut config = GuardConfig::default();
        config.rate_limit.sweep_interval_secs = i64::MAX as u64;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["rate_limit.sweep_interval_secs", "rate_limit.eviction_window_secs"]
        );

        let mut config = GuardConfig::default();
        config.rate_limit.eviction_window_secs = Some(MAX_EVICTION_WINDOW_SECS + 1);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "rate_limit.eviction_window_secs");
    }

    #[test]
    fn test_accounts_checked() {
        let mut config = GuardConfig::default();
        config.accounts = vec![
            account(1, "Y3QMGX3PJ3WLRL2YRTQGQ6KRHU"),
            account(1, "Y3QMGX3PJ3WLRL2YRTQGQ6KRHU"),
            account(2, "short"),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].to_string(), "accounts[1].id: duplicate id");
        assert_eq!(errors[1].to_string(), "accounts[1].token: duplicate token");
        assert_eq!(errors[2].to_string(), "accounts[2].token: token must be 26 bytes long");
    }
}
