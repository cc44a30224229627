//! Broker URL parsing.
//!
//! Accepted forms:
//! - `ws://host:port[/path]` - MQTT over WebSocket
//! - `mqtt://host[:port]`, `tcp://host[:port]` - plain MQTT (default port 1883)

use std::fmt;
use std::str::FromStr;

use super::transport::TransportError;

/// Default port for plain MQTT.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default port for a `ws://` URL without an explicit port.
pub const DEFAULT_WS_PORT: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerScheme {
    WebSocket,
    Tcp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub scheme: BrokerScheme,
    pub host: String,
    pub port: u16,
    /// Path component including the leading `/`, empty when absent
    pub path: String,
}

impl BrokerEndpoint {
    /// Full URL as handed to the WebSocket transport.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.scheme {
            BrokerScheme::WebSocket => "ws",
            BrokerScheme::Tcp => "mqtt",
        };
        write!(f, "{scheme}://{}:{}{}", self.host, self.port, self.path)
    }
}

impl FromStr for BrokerEndpoint {
    type Err = TransportError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TransportError::InvalidEndpoint {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = url
            .trim()
            .split_once("://")
            .ok_or_else(|| invalid("missing scheme (expected ws://, mqtt:// or tcp://)"))?;

        let scheme = match scheme.to_ascii_lowercase().as_str() {
            "ws" => BrokerScheme::WebSocket,
            "mqtt" | "tcp" => BrokerScheme::Tcp,
            other => return Err(invalid(&format!("unsupported scheme '{other}'"))),
        };

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], rest[i..].to_string()),
            None => (rest, String::new()),
        };

        if scheme == BrokerScheme::Tcp && !path.is_empty() && path != "/" {
            return Err(invalid("plain MQTT URLs cannot carry a path"));
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| invalid(&format!("invalid port '{port}'")))?;
                (host, port)
            }
            None => {
                let port = match scheme {
                    BrokerScheme::WebSocket => DEFAULT_WS_PORT,
                    BrokerScheme::Tcp => DEFAULT_MQTT_PORT,
                };
                (authority, port)
            }
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            path: if scheme == BrokerScheme::Tcp { String::new() } else { path },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_websocket_url() {
        let ep: BrokerEndpoint = "ws://localhost:9001".parse().unwrap();
        assert_eq!(ep.scheme, BrokerScheme::WebSocket);
        assert_eq!(ep.host, "localhost");
        assert_eq!(ep.port, 9001);
        assert_eq!(ep.path, "");
        assert_eq!(ep.url(), "ws://localhost:9001");
    }

    #[test]
    fn test_parse_websocket_url_with_path() {
        let ep: BrokerEndpoint = "ws://broker.local:8080/mqtt".parse().unwrap();
        assert_eq!(ep.port, 8080);
        assert_eq!(ep.path, "/mqtt");
        assert_eq!(ep.url(), "ws://broker.local:8080/mqtt");
    }

    #[test]
    fn test_parse_plain_mqtt_default_port() {
        let ep: BrokerEndpoint = "mqtt://mosquitto".parse().unwrap();
        assert_eq!(ep.scheme, BrokerScheme::Tcp);
        assert_eq!(ep.port, DEFAULT_MQTT_PORT);

        let ep: BrokerEndpoint = "tcp://10.0.0.5:1884/".parse().unwrap();
        assert_eq!(ep.port, 1884);
        assert_eq!(ep.path, "");
    }

    #[test]
    fn test_reject_missing_scheme() {
        let err = "localhost:9001".parse::<BrokerEndpoint>().unwrap_err();
        assert!(matches!(err, TransportError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_reject_unsupported_scheme() {
        assert!("http://localhost:9001".parse::<BrokerEndpoint>().is_err());
    }

    #[test]
    fn test_reject_bad_port_and_host() {
        assert!("ws://localhost:99999".parse::<BrokerEndpoint>().is_err());
        assert!("ws://:9001".parse::<BrokerEndpoint>().is_err());
        assert!("mqtt://host:1883/topic".parse::<BrokerEndpoint>().is_err());
    }
}
