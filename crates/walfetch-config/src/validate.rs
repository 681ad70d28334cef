//! Validation helpers for retrieval configuration snapshots.

use crate::defaults::MIN_CAPACITY;
use crate::error::{ConfigError, ConfigResult};
use crate::model::RetrieveConfig;

/// Check bounds and required fields on a configuration snapshot.
///
/// A missing template is accepted here; retrieval reports it per call.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for the first field that fails.
pub fn validate(config: &RetrieveConfig) -> ConfigResult<()> {
    check_capacity("max_command_len", config.max_command_len)?;
    check_capacity("max_path_len", config.max_path_len)?;

    if config.log_dir.as_os_str().is_empty() {
        return Err(ConfigError::InvalidField {
            field: "log_dir",
            value: None,
            reason: "empty",
        });
    }

    if let Some(command) = config.retrieve_command.as_deref()
        && command.contains('\0')
    {
        return Err(ConfigError::InvalidField {
            field: "retrieve_command",
            value: None,
            reason: "contains_nul",
        });
    }

    if config.archive_dir.contains('\0') {
        return Err(ConfigError::InvalidField {
            field: "archive_dir",
            value: None,
            reason: "contains_nul",
        });
    }

    Ok(())
}

fn check_capacity(field: &'static str, capacity: usize) -> ConfigResult<()> {
    if capacity < MIN_CAPACITY {
        return Err(ConfigError::InvalidField {
            field,
            value: Some(capacity.to_string()),
            reason: "below_minimum",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&RetrieveConfig::default()).is_ok());
    }

    #[test]
    fn capacities_below_minimum_are_rejected() {
        let config = RetrieveConfig::default().with_max_command_len(1);
        let err = validate(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "max_command_len",
                reason: "below_minimum",
                ..
            }
        ));

        let config = RetrieveConfig::default().with_max_path_len(0);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidField {
                field: "max_path_len",
                ..
            })
        ));
    }

    #[test]
    fn empty_log_dir_is_rejected() {
        let mut config = RetrieveConfig::default();
        config.log_dir = PathBuf::new();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidField {
                field: "log_dir",
                reason: "empty",
                ..
            })
        ));
    }

    #[test]
    fn nul_bytes_are_rejected() {
        let config = RetrieveConfig::new("cp %a/%f\0 %p", "/archive");
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidField {
                field: "retrieve_command",
                reason: "contains_nul",
                ..
            })
        ));

        let config = RetrieveConfig::new("cp %a/%f %p", "/arch\0ive");
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidField {
                field: "archive_dir",
                ..
            })
        ));
    }
}
