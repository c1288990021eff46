//! Construction parameters of the `ResourceCache`.

use serde::{Deserialize, Serialize};

/// A structure containing configuration data of a `ResourceCache`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheParams {
    /// Suppresses failure logs of every request, as if each one carried the `QUIET` flag.
    pub quiet: bool,
    /// Logs every cache hit at debug level.
    pub trace: bool,
    /// The extension that asks the cache to try every extension known to the loaders of
    /// the requested type.
    pub wildcard: String,
    /// Type chains deeper than this are considered malformed while registering handlers.
    pub max_type_depth: usize,
}

impl Default for CacheParams {
    fn default() -> Self {
        CacheParams {
            quiet: false,
            trace: false,
            wildcard: "*".to_owned(),
            max_type_depth: 32,
        }
    }
}

impl CacheParams {
    /// Parses parameters from json. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, failure::Error> {
        let params = serde_json::from_str(json)?;
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String, failure::Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial() {
        let params = CacheParams::from_json(r#"{ "quiet": true }"#).unwrap();
        assert!(params.quiet);
        assert!(!params.trace);
        assert_eq!(params.wildcard, "*");
        assert_eq!(params.max_type_depth, 32);

        let params = CacheParams::from_json(r#"{ "wildcard": "?", "max_type_depth": 4 }"#).unwrap();
        assert_eq!(params.wildcard, "?");
        assert_eq!(params.max_type_depth, 4);

        assert!(CacheParams::from_json("[1, 2]").is_err());
    }

    #[test]
    fn roundtrip() {
        let params = CacheParams {
            trace: true,
            ..CacheParams::default()
        };

        let json = params.to_json().unwrap();
        assert_eq!(CacheParams::from_json(&json).unwrap(), params);
    }
}
