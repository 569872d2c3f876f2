//! Detector socket URL resolution.

use crate::domain::config::SessionConfig;

/// Computes the WebSocket URL a session should connect to.
///
/// - Local development origin (`localhost`, `127.0.0.1`): the configured
///   fallback host over `wss`.
/// - Any other origin: the origin's own host, `wss` for `https` pages and
///   `ws` otherwise.
///
/// ```rust
/// use vision_core::{resolve_socket_url, PageOrigin, SessionConfig};
///
/// let cfg = SessionConfig {
///     origin: PageOrigin::new(true, "admin.example.com"),
///     ..Default::default()
/// };
/// assert_eq!(resolve_socket_url(&cfg), "wss://admin.example.com/vision/stream-safety");
/// ```
pub fn resolve_socket_url(config: &SessionConfig) -> String {
    let origin = &config.origin;
    let (scheme, host) = if origin.is_local_development() {
        ("wss", config.ws_host.as_str())
    } else if origin.secure {
        ("wss", origin.host.as_str())
    } else {
        ("ws", origin.host.as_str())
    };
    format!("{scheme}://{host}{}", config.ws_endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::PageOrigin;

    fn config_with_origin(origin: PageOrigin) -> SessionConfig {
        SessionConfig {
            origin,
            ..Default::default()
        }
    }

    #[test]
    fn test_local_development_uses_fallback_host_over_wss() {
        let cfg = config_with_origin(PageOrigin::new(false, "localhost:5173"));
        assert_eq!(
            resolve_socket_url(&cfg),
            "wss://ia.allup.com.co/vision/stream-safety"
        );
    }

    #[test]
    fn test_loopback_ip_counts_as_local_development() {
        let cfg = SessionConfig {
            ws_host: "detector.lan:9001".to_string(),
            origin: PageOrigin::new(false, "127.0.0.1:3000"),
            ..Default::default()
        };
        assert_eq!(
            resolve_socket_url(&cfg),
            "wss://detector.lan:9001/vision/stream-safety"
        );
    }

    #[test]
    fn test_secure_origin_uses_wss_with_origin_host() {
        let cfg = config_with_origin(PageOrigin::new(true, "admin.example.com:8443"));
        assert_eq!(
            resolve_socket_url(&cfg),
            "wss://admin.example.com:8443/vision/stream-safety"
        );
    }

    #[test]
    fn test_plain_origin_uses_ws() {
        let cfg = config_with_origin(PageOrigin::new(false, "10.0.0.7:8080"));
        assert_eq!(
            resolve_socket_url(&cfg),
            "ws://10.0.0.7:8080/vision/stream-safety"
        );
    }

    #[test]
    fn test_custom_endpoint_is_appended() {
        let cfg = SessionConfig {
            ws_endpoint: "/vision/other".to_string(),
            origin: PageOrigin::new(true, "admin.example.com"),
            ..Default::default()
        };
        assert_eq!(
            resolve_socket_url(&cfg),
            "wss://admin.example.com/vision/other"
        );
    }
}
