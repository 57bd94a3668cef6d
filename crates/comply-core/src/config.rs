//! Run configuration.
//!
//! Values come from an optional YAML file; the CLI overlays its flags on top
//! and finally falls back to the `BEACON_COMPLY_TARGET` environment variable
//! for the target URL.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Environment variable consulted when no target is configured.
pub const TARGET_ENV: &str = "BEACON_COMPLY_TARGET";

/// Archive fetched when no local fixture tree is given.
pub const DEFAULT_TESTS_REMOTE: &str =
    "https://github.com/INFURA/eth2-comply/releases/download/v0.3.1/tests-v0.3.1.zip";

/// Top-level configuration for a conformance run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplyConfig {
    /// Base URL of the node under test, e.g. `http://localhost:5051`.
    #[serde(default)]
    pub target: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // FIXTURE SOURCE
    // ─────────────────────────────────────────────────────────────────────────
    /// Local directory tree of fixtures. Takes precedence over `tests_remote`.
    #[serde(default)]
    pub tests_root: Option<PathBuf>,

    /// URL of a ZIP archive holding a `tests/` fixture tree.
    #[serde(default = "default_tests_remote")]
    pub tests_remote: Option<String>,

    /// Where archives are downloaded and unpacked.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    // ─────────────────────────────────────────────────────────────────────────
    // EXECUTION
    // ─────────────────────────────────────────────────────────────────────────
    /// Global deadline for the whole run, e.g. `10s`, `1.5h`, `1h30m`.
    ///
    /// The clock starts once cases launch, after fixtures are loaded; time
    /// spent downloading and unpacking a remote archive does not count.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Only routes starting with this prefix are executed.
    #[serde(default = "default_subset")]
    pub subset: String,

    /// Exit 0 even when cases fail.
    #[serde(default)]
    pub fail_silent: bool,

    /// Delay between readiness polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
}

fn default_tests_remote() -> Option<String> {
    Some(DEFAULT_TESTS_REMOTE.to_string())
}

fn default_out_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_timeout() -> String {
    "10s".to_string()
}

fn default_subset() -> String {
    "/".to_string()
}

fn default_poll_interval() -> String {
    "1s".to_string()
}

impl Default for ComplyConfig {
    fn default() -> Self {
        Self {
            target: None,
            tests_root: None,
            tests_remote: default_tests_remote(),
            out_dir: default_out_dir(),
            timeout: default_timeout(),
            subset: default_subset(),
            fail_silent: false,
            poll_interval: default_poll_interval(),
        }
    }
}

impl ComplyConfig {
    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        debug!(path = %path_ref.display(), "Loading configuration from file");
        let content = std::fs::read_to_string(path_ref)?;
        let config: Self = serde_yaml::from_str(&content)?;
        debug!(
            target = ?config.target,
            timeout = %config.timeout,
            subset = %config.subset,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Fills `target` from `env_value` when nothing else set it.
    pub fn resolve_target(&mut self, env_value: Option<String>) {
        if self.target.is_none() {
            self.target = env_value.filter(|v| !v.trim().is_empty());
        }
    }

    /// Parsed target URL.
    pub fn target_url(&self) -> Result<Url, ConfigError> {
        let raw = self.target.as_deref().ok_or(ConfigError::MissingTarget)?;
        let url = Url::parse(raw).map_err(|e| ConfigError::InvalidTarget {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidTarget {
                value: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(url)
    }

    pub fn timeout_duration(&self) -> Result<Duration, ConfigError> {
        parse_field_duration("timeout", &self.timeout)
    }

    pub fn poll_interval_duration(&self) -> Result<Duration, ConfigError> {
        parse_field_duration("poll_interval", &self.poll_interval)
    }

    /// Checks the configuration before a run.
    ///
    /// Hard problems (no target, unparsable URL or duration) are errors;
    /// suspicious but usable values come back as warnings.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        let mut warnings = Vec::new();

        self.target_url()?;
        let timeout = self.timeout_duration()?;
        let poll = self.poll_interval_duration()?;

        if timeout.is_zero() {
            warnings.push(ConfigWarning::InvalidValue {
                field: "timeout".to_string(),
                message: "Zero timeout cancels every case immediately".to_string(),
            });
        }

        if poll.is_zero() {
            warnings.push(ConfigWarning::InvalidValue {
                field: "poll_interval".to_string(),
                message: "Zero poll interval busy-loops against the target".to_string(),
            });
        } else if poll >= timeout && !timeout.is_zero() {
            warnings.push(ConfigWarning::InvalidValue {
                field: "poll_interval".to_string(),
                message: format!(
                    "Poll interval {} is not shorter than timeout {}; gated cases get at most one poll",
                    self.poll_interval, self.timeout
                ),
            });
        }

        if !self.subset.starts_with('/') {
            warnings.push(ConfigWarning::InvalidValue {
                field: "subset".to_string(),
                message: format!(
                    "Subset '{}' does not start with '/'; no route will match",
                    self.subset
                ),
            });
        }

        let custom_remote = self
            .tests_remote
            .as_deref()
            .is_some_and(|remote| remote != DEFAULT_TESTS_REMOTE);
        if self.tests_root.is_some() && custom_remote {
            warnings.push(ConfigWarning::IgnoredField {
                field: "tests_remote".to_string(),
                reason: "tests_root is set and takes precedence".to_string(),
            });
        }

        if self.tests_root.is_none() && self.tests_remote.is_none() {
            return Err(ConfigError::NoFixtureSource);
        }

        Ok(warnings)
    }
}

/// Non-fatal configuration problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Field has a questionable value.
    InvalidValue { field: String, message: String },
    /// Field is present but has no effect.
    IgnoredField { field: String, reason: String },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::InvalidValue { field, message } => {
                write!(f, "Warning [{}]: {}", field, message)
            }
            ConfigWarning::IgnoredField { field, reason } => {
                write!(f, "Warning [{}]: Field ignored - {}", field, reason)
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No target provided; pass --target or set {TARGET_ENV}")]
    MissingTarget,

    #[error("Invalid target URL '{value}': {reason}")]
    InvalidTarget { value: String, reason: String },

    #[error("Invalid duration for {field}: '{value}' ({reason})")]
    InvalidDuration {
        field: String,
        value: String,
        reason: String,
    },

    #[error("No fixture source: set tests_root or tests_remote")]
    NoFixtureSource,
}

fn parse_field_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).map_err(|reason| ConfigError::InvalidDuration {
        field: field.to_string(),
        value: value.to_string(),
        reason,
    })
}

/// Parses a duration such as `250ms`, `10s`, `1.5h` or `1h30m`.
///
/// Each component is an unsigned decimal number, optionally with a fraction,
/// followed by one of `ns`, `us` (or `µs`), `ms`, `s`, `m` or `h`. A bare `0`
/// is accepted. Precision stops at the nanosecond.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let whole_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (whole, tail) = rest.split_at(whole_len);
        let (fraction, tail) = match tail.strip_prefix('.') {
            Some(after_dot) => {
                let len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(len)
            }
            None => ("", tail),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(format!("expected a number at '{rest}'"));
        }
        let number = &rest[..rest.len() - tail.len()];

        let unit_len: usize = tail
            .chars()
            .take_while(|c| c.is_ascii_alphabetic() || matches!(*c, 'µ' | 'μ'))
            .map(char::len_utf8)
            .sum();
        let (unit, next) = tail.split_at(unit_len);
        let unit_nanos: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            "" => return Err(format!("missing unit after '{number}'")),
            other => return Err(format!("unknown unit '{other}'")),
        };

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|e| format!("invalid number '{number}': {e}"))?
        };
        // Digits past the nanosecond cannot change the result.
        let fraction = &fraction[..fraction.len().min(18)];
        let fraction_nanos = if fraction.is_empty() {
            0
        } else {
            let digits: u128 = fraction
                .parse()
                .map_err(|e| format!("invalid number '{number}': {e}"))?;
            digits.saturating_mul(unit_nanos) / 10u128.pow(fraction.len() as u32)
        };

        total_nanos = total_nanos
            .saturating_add(whole.saturating_mul(unit_nanos))
            .saturating_add(fraction_nanos);
        rest = next;
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000).unwrap_or(u64::MAX);
    Ok(Duration::new(secs, (total_nanos % 1_000_000_000) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_target() -> ComplyConfig {
        ComplyConfig {
            target: Some("http://localhost:5051".to_string()),
            ..ComplyConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = ComplyConfig::default();
        assert_eq!(config.timeout, "10s");
        assert_eq!(config.subset, "/");
        assert!(!config.fail_silent);
        assert_eq!(config.tests_remote.as_deref(), Some(DEFAULT_TESTS_REMOTE));
        assert!(config.target.is_none());
    }

    #[test]
    fn test_parse_yaml_fills_defaults() {
        let yaml = r#"
target: http://127.0.0.1:5052
subset: /v1/node
fail_silent: true
"#;
        let config: ComplyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.target.as_deref(), Some("http://127.0.0.1:5052"));
        assert_eq!(config.subset, "/v1/node");
        assert!(config.fail_silent);
        assert_eq!(config.timeout, "10s");
        assert_eq!(config.poll_interval, "1s");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comply.yml");
        std::fs::write(&path, "timeout: 2m\ntests_root: ./tests\n").unwrap();

        let config = ComplyConfig::from_file(&path).unwrap();
        assert_eq!(config.timeout_duration().unwrap(), Duration::from_secs(120));
        assert_eq!(config.tests_root, Some(PathBuf::from("./tests")));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("3600s").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("60m").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_fractions_and_small_units() {
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("0.25s").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration(".5m").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2.s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("1.5ms").unwrap(), Duration::from_micros(1500));
        assert_eq!(parse_duration("300us").unwrap(), Duration::from_micros(300));
        assert_eq!(parse_duration("300µs").unwrap(), Duration::from_micros(300));
        assert_eq!(parse_duration("10ns").unwrap(), Duration::from_nanos(10));
        assert_eq!(
            parse_duration("1m0.5s").unwrap(),
            Duration::from_millis(60_500)
        );
        assert_eq!(
            parse_duration("0.1234567891s").unwrap(),
            Duration::from_nanos(123_456_789)
        );
        assert!(parse_duration(".s").is_err());
        assert!(parse_duration("1.5").is_err());
        assert!(parse_duration("1..5s").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("ten seconds").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn test_resolve_target_from_env() {
        let mut config = ComplyConfig::default();
        config.resolve_target(Some("http://node:5051".to_string()));
        assert_eq!(config.target.as_deref(), Some("http://node:5051"));

        // An explicit target wins.
        config.resolve_target(Some("http://other:5051".to_string()));
        assert_eq!(config.target.as_deref(), Some("http://node:5051"));
    }

    #[test]
    fn test_validate_requires_target() {
        let config = ComplyConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingTarget)));
    }

    #[test]
    fn test_validate_rejects_bad_target_and_duration() {
        let config = ComplyConfig {
            target: Some("not a url".to_string()),
            ..ComplyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTarget { .. })
        ));

        let config = ComplyConfig {
            target: Some("ftp://node".to_string()),
            ..ComplyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTarget { .. })
        ));

        let config = ComplyConfig {
            timeout: "soon".to_string(),
            ..config_with_target()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration { field, .. }) if field == "timeout"
        ));
    }

    #[test]
    fn test_validate_warnings() {
        let config = ComplyConfig {
            subset: "v1/node".to_string(),
            tests_root: Some(PathBuf::from("tests")),
            tests_remote: Some("https://mirror.example/tests.zip".to_string()),
            poll_interval: "20s".to_string(),
            ..config_with_target()
        };
        let warnings = config.validate().unwrap();
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::InvalidValue { field, .. } if field == "subset")));
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::IgnoredField { field, .. } if field == "tests_remote")));
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::InvalidValue { field, .. } if field == "poll_interval")));
    }

    #[test]
    fn test_validate_clean_config_has_no_warnings() {
        let warnings = config_with_target().validate().unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_local_root_with_default_remote_is_quiet() {
        let config = ComplyConfig {
            tests_root: Some(PathBuf::from("tests")),
            ..config_with_target()
        };
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_validate_requires_fixture_source() {
        let config = ComplyConfig {
            tests_remote: None,
            ..config_with_target()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoFixtureSource)));
    }
}
