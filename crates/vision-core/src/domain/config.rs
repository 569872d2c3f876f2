//! Session configuration types.
//!
//! [`SessionConfig`] is the single source of truth for how a session reaches
//! its camera and its detector.  It is a plain value: the session captures a
//! copy at `start()`, so later edits through [`SessionConfig::apply`] only
//! take effect on the next start.
//!
//! # Design rationale
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! reads) makes sessions easy to embed in tests.  The binary is responsible
//! for populating it from CLI args, environment variables, or a TOML file.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::InspectorError;

/// Fallback detector host used when the page is served from a local
/// development host.
pub const DEFAULT_WS_HOST: &str = "ia.allup.com.co";

/// Default detector route.
pub const DEFAULT_WS_ENDPOINT: &str = "/vision/stream-safety";

/// Default sampling rate in frames per second.
pub const DEFAULT_FRAME_RATE: f64 = 10.0;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera (towards the user).
    User,
    /// Rear camera (away from the user).
    Environment,
}

/// Camera capture constraints.
///
/// `ideal_*` values are hints: a provider may hand back a different native
/// resolution, and the session sizes everything from what the stream
/// actually reports.  `device_id`, when set, is an exact requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing_mode: Option<FacingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideal_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideal_height: Option<u32>,
}

impl Default for VideoConstraints {
    /// Rear-facing camera at an ideal 640×480.
    fn default() -> Self {
        Self {
            device_id: None,
            facing_mode: Some(FacingMode::Environment),
            ideal_width: Some(640),
            ideal_height: Some(480),
        }
    }
}

impl VideoConstraints {
    /// Returns a copy that requires the exact device `device_id`, keeping the
    /// facing mode and ideal resolution.
    pub fn with_device(&self, device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ..self.clone()
        }
    }
}

/// Origin of the page hosting the inspector.
///
/// Used to derive the socket URL when the page is not served from a local
/// development host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageOrigin {
    /// `true` for `https` origins.
    pub secure: bool,
    /// Host with optional `:port`, e.g. `admin.example.com:8443`.
    pub host: String,
}

/// Hostnames treated as local development.
const LOCAL_DEVELOPMENT_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

impl PageOrigin {
    pub fn new(secure: bool, host: impl Into<String>) -> Self {
        Self {
            secure,
            host: host.into(),
        }
    }

    /// Host without the port.  Bracketed IPv6 literals keep their brackets.
    pub fn hostname(&self) -> &str {
        if self.host.starts_with('[') {
            return match self.host.find(']') {
                Some(end) => &self.host[..=end],
                None => &self.host,
            };
        }
        match self.host.rsplit_once(':') {
            Some((name, _port)) => name,
            None => &self.host,
        }
    }

    /// `true` when the page is served from a local development host.
    pub fn is_local_development(&self) -> bool {
        LOCAL_DEVELOPMENT_HOSTS.contains(&self.hostname())
    }
}

impl Default for PageOrigin {
    fn default() -> Self {
        Self::new(false, "localhost")
    }
}

impl FromStr for PageOrigin {
    type Err = InspectorError;

    /// Parses `http://host[:port]` or `https://host[:port]`; a trailing path
    /// is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (secure, rest) = if let Some(rest) = s.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = s.strip_prefix("http://") {
            (false, rest)
        } else {
            return Err(InspectorError::invalid_config(
                format!("page origin must start with http:// or https://, got '{s}'"),
                "origin",
            ));
        };

        let host = rest.split('/').next().unwrap_or_default();
        if host.is_empty() {
            return Err(InspectorError::invalid_config(
                format!("page origin '{s}' has no host"),
                "origin",
            ));
        }
        Ok(Self::new(secure, host))
    }
}

impl TryFrom<String> for PageOrigin {
    type Error = InspectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PageOrigin> for String {
    fn from(origin: PageOrigin) -> Self {
        origin.to_string()
    }
}

impl fmt::Display for PageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "https" } else { "http" };
        write!(f, "{scheme}://{}", self.host)
    }
}

/// All runtime configuration for a capture/stream session.
///
/// # Example
///
/// ```rust
/// use vision_core::SessionConfig;
///
/// let cfg = SessionConfig::default();
/// assert_eq!(cfg.frame_interval().as_millis(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Detector host (optionally `host:port`) used against local development
    /// origins.
    #[serde(default = "default_ws_host")]
    pub ws_host: String,

    /// Detector route, appended to the host.
    #[serde(default = "default_ws_endpoint")]
    pub ws_endpoint: String,

    /// Target sampling rate in frames per second.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,

    #[serde(default)]
    pub video_constraints: VideoConstraints,

    #[serde(default)]
    pub origin: PageOrigin,
}

fn default_ws_host() -> String {
    DEFAULT_WS_HOST.to_string()
}
fn default_ws_endpoint() -> String {
    DEFAULT_WS_ENDPOINT.to_string()
}
fn default_frame_rate() -> f64 {
    DEFAULT_FRAME_RATE
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ws_host: default_ws_host(),
            ws_endpoint: default_ws_endpoint(),
            frame_rate: default_frame_rate(),
            video_constraints: VideoConstraints::default(),
            origin: PageOrigin::default(),
        }
    }
}

impl SessionConfig {
    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`InspectorError::InvalidConfiguration`] naming the first
    /// offending key.
    pub fn validate(&self) -> Result<(), InspectorError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(InspectorError::invalid_config(
                format!("frame rate must be a positive number, got {}", self.frame_rate),
                "frame_rate",
            ));
        }
        if Duration::try_from_secs_f64(1.0 / self.frame_rate).is_err() {
            return Err(InspectorError::invalid_config(
                format!("frame rate {} is too low to schedule", self.frame_rate),
                "frame_rate",
            ));
        }
        if self.ws_host.trim().is_empty() {
            return Err(InspectorError::invalid_config(
                "socket host must not be empty",
                "ws_host",
            ));
        }
        if !self.ws_endpoint.starts_with('/') {
            return Err(InspectorError::invalid_config(
                format!("socket path must start with '/', got '{}'", self.ws_endpoint),
                "ws_endpoint",
            ));
        }
        let c = &self.video_constraints;
        if c.ideal_width == Some(0) || c.ideal_height == Some(0) {
            return Err(InspectorError::invalid_config(
                "ideal camera resolution must be non-zero",
                "video_constraints",
            ));
        }
        Ok(())
    }

    /// Shallow-merges `patch` over `self` and validates the result.
    ///
    /// Fields absent from the patch keep their current value; present fields
    /// replace the whole value (`video_constraints` is not merged field by
    /// field).
    ///
    /// # Errors
    ///
    /// Returns [`InspectorError::InvalidConfiguration`] if the merged
    /// configuration is invalid; `self` is left untouched.
    pub fn apply(&self, patch: ConfigPatch) -> Result<SessionConfig, InspectorError> {
        let merged = SessionConfig {
            ws_host: patch.ws_host.unwrap_or_else(|| self.ws_host.clone()),
            ws_endpoint: patch.ws_endpoint.unwrap_or_else(|| self.ws_endpoint.clone()),
            frame_rate: patch.frame_rate.unwrap_or(self.frame_rate),
            video_constraints: patch
                .video_constraints
                .unwrap_or_else(|| self.video_constraints.clone()),
            origin: patch.origin.unwrap_or_else(|| self.origin.clone()),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Delay between capture ticks: `1000 / frame_rate` milliseconds.
    ///
    /// Rates [`validate`](Self::validate) rejects saturate to
    /// [`Duration::MAX`].
    pub fn frame_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.frame_rate).unwrap_or(Duration::MAX)
    }
}

/// A partial [`SessionConfig`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub ws_host: Option<String>,
    pub ws_endpoint: Option<String>,
    pub frame_rate: Option<f64>,
    pub video_constraints: Option<VideoConstraints>,
    pub origin: Option<PageOrigin>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;

    #[test]
    fn test_default_config_matches_detector_defaults() {
        // Arrange / Act
        let cfg = SessionConfig::default();

        // Assert
        assert_eq!(cfg.ws_host, "ia.allup.com.co");
        assert_eq!(cfg.ws_endpoint, "/vision/stream-safety");
        assert_eq!(cfg.frame_rate, 10.0);
        assert_eq!(
            cfg.video_constraints.facing_mode,
            Some(FacingMode::Environment)
        );
        assert_eq!(cfg.video_constraints.ideal_width, Some(640));
        assert_eq!(cfg.video_constraints.ideal_height, Some(480));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_frame_interval_is_inverse_of_rate() {
        let cfg = SessionConfig {
            frame_rate: 4.0,
            ..Default::default()
        };
        assert_eq!(cfg.frame_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_frame_rate_is_rejected() {
        let cfg = SessionConfig {
            frame_rate: 0.0,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_nan_frame_rate_is_rejected() {
        let cfg = SessionConfig {
            frame_rate: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_frame_rate_too_low_to_schedule_is_rejected() {
        // Arrange: 1 / 1e-20 seconds does not fit in a Duration.
        let cfg = SessionConfig {
            frame_rate: 1e-20,
            ..Default::default()
        };

        // Act
        let err = cfg.validate().unwrap_err();

        // Assert
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(cfg.frame_interval(), Duration::MAX);
    }

    #[test]
    fn test_slow_but_schedulable_frame_rate_is_accepted() {
        let cfg = SessionConfig {
            frame_rate: 0.001,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.frame_interval(), Duration::from_secs(1000));
    }

    #[test]
    fn test_endpoint_without_leading_slash_is_rejected() {
        let cfg = SessionConfig {
            ws_endpoint: "vision".to_string(),
            ..Default::default()
        };
        match cfg.validate() {
            Err(InspectorError::InvalidConfiguration { key, .. }) => {
                assert_eq!(key.as_deref(), Some("ws_endpoint"))
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_apply_replaces_only_present_fields() {
        // Arrange
        let cfg = SessionConfig::default();
        let patch = ConfigPatch {
            frame_rate: Some(25.0),
            ..Default::default()
        };

        // Act
        let merged = cfg.apply(patch).unwrap();

        // Assert
        assert_eq!(merged.frame_rate, 25.0);
        assert_eq!(merged.ws_host, cfg.ws_host);
        assert_eq!(merged.video_constraints, cfg.video_constraints);
    }

    #[test]
    fn test_apply_replaces_constraints_wholesale() {
        let cfg = SessionConfig::default();
        let patch = ConfigPatch {
            video_constraints: Some(VideoConstraints {
                device_id: Some("cam-2".into()),
                facing_mode: None,
                ideal_width: None,
                ideal_height: None,
            }),
            ..Default::default()
        };

        let merged = cfg.apply(patch).unwrap();

        // No field-by-field merge: the old facing mode is gone.
        assert_eq!(merged.video_constraints.facing_mode, None);
        assert_eq!(merged.video_constraints.device_id.as_deref(), Some("cam-2"));
    }

    #[test]
    fn test_apply_invalid_patch_returns_error() {
        let cfg = SessionConfig::default();
        let result = cfg.apply(ConfigPatch {
            frame_rate: Some(-1.0),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_with_device_keeps_facing_and_resolution() {
        let constraints = VideoConstraints::default().with_device("abc");
        assert_eq!(constraints.device_id.as_deref(), Some("abc"));
        assert_eq!(constraints.facing_mode, Some(FacingMode::Environment));
        assert_eq!(constraints.ideal_width, Some(640));
    }

    #[test]
    fn test_parse_https_origin_with_port() {
        let origin: PageOrigin = "https://admin.example.com:8443/inspector".parse().unwrap();
        assert!(origin.secure);
        assert_eq!(origin.host, "admin.example.com:8443");
        assert_eq!(origin.hostname(), "admin.example.com");
    }

    #[test]
    fn test_parse_origin_without_scheme_fails() {
        let result: Result<PageOrigin, _> = "admin.example.com".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_origin_without_host_fails() {
        let result: Result<PageOrigin, _> = "https:///path".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_local_development_detection() {
        assert!(PageOrigin::new(false, "localhost:5173").is_local_development());
        assert!(PageOrigin::new(false, "127.0.0.1").is_local_development());
        assert!(!PageOrigin::new(true, "admin.example.com").is_local_development());
    }

    #[test]
    fn test_ipv6_hostname_keeps_brackets() {
        let origin = PageOrigin::new(false, "[::1]:8080");
        assert_eq!(origin.hostname(), "[::1]");
    }

    #[test]
    fn test_config_deserializes_from_partial_toml() {
        // Arrange
        let toml_str = r#"
frame_rate = 5.0
origin = "https://admin.example.com"
"#;

        // Act
        let cfg: SessionConfig = toml::from_str(toml_str).unwrap();

        // Assert
        assert_eq!(cfg.frame_rate, 5.0);
        assert!(cfg.origin.secure);
        assert_eq!(cfg.ws_endpoint, DEFAULT_WS_ENDPOINT);
    }
}
