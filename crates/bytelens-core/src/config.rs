use serde::{Deserialize, Serialize};

use crate::error::TraceError;

pub const DEFAULT_RESERVED_PREFIX: &str = "_";

/// Attribution settings for one parse session.
///
/// # Examples
/// ```
/// use bytelens_core::TraceConfig;
///
/// let config = TraceConfig::from_json_str(r#"{ "strict_stack": true }"#)?;
/// assert!(config.strict_stack);
/// assert!(config.collapse_duplicates);
/// assert_eq!(config.reserved_prefix, "_");
/// # Ok::<(), bytelens_core::TraceError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Fields whose name starts with this prefix are stored but not tracked.
    pub reserved_prefix: String,
    /// Drop stack-top pairs identical to the one just attributed.
    pub collapse_duplicates: bool,
    /// Fail the parse when boundaries remain unattributed at the end. Raw
    /// reads kept in internal fields must be stored with `assign_raw`.
    pub strict_stack: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            collapse_duplicates: true,
            strict_stack: false,
        }
    }
}

impl TraceConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TraceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        !self.reserved_prefix.is_empty() && name.starts_with(&self.reserved_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::TraceConfig;
    use crate::error::TraceError;

    #[test]
    fn empty_json_yields_defaults() {
        let config = TraceConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TraceConfig::default());
    }

    #[test]
    fn reserved_prefix_matches_internal_names() {
        let config = TraceConfig::default();
        assert!(config.is_reserved("_raw_body"));
        assert!(!config.is_reserved("body"));
    }

    #[test]
    fn empty_prefix_reserves_nothing() {
        let config = TraceConfig::from_json_str(r#"{ "reserved_prefix": "" }"#).unwrap();
        assert!(!config.is_reserved("_raw_body"));
    }

    #[test]
    fn invalid_json_is_config_error() {
        let err = TraceConfig::from_json_str(r#"{ "collapse_duplicates": "yes" }"#).unwrap_err();
        assert!(matches!(err, TraceError::Config(_)));
    }
}
