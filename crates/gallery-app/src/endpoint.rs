//! Tool endpoint connection strings
//!
//! Accepted forms are `host:port` and `[ipv6]:port`. Anything else fails
//! with `Error::ConnectionFormat` before a dial is attempted.

use gallery_core::{Error, Result};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEndpoint {
    host: String,
    port: u16,
}

impl ToolEndpoint {
    pub fn parse(input: &str) -> Result<Self> {
        let fail = |reason: &str| Error::connection_format(input, reason);

        if input.is_empty() {
            return Err(fail("empty connection string"));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(fail("whitespace is not allowed"));
        }

        let (host, port) = if let Some(rest) = input.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or_else(|| fail("unterminated '[' in IPv6 host"))?;
            let port = after
                .strip_prefix(':')
                .ok_or_else(|| fail("expected ':port' after IPv6 host"))?;
            host.parse::<Ipv6Addr>()
                .map_err(|_| fail("invalid IPv6 address"))?;
            (host, port)
        } else {
            let (host, port) = input
                .rsplit_once(':')
                .ok_or_else(|| fail("expected host:port"))?;
            if host.contains(':') {
                return Err(fail("IPv6 hosts must be enclosed in brackets"));
            }
            if host.is_empty() {
                return Err(fail("missing host"));
            }
            if !host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
            {
                return Err(fail("invalid character in host"));
            }
            (host, port)
        };

        if port.is_empty() {
            return Err(fail("missing port"));
        }
        if !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(fail("port must be numeric"));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| fail("port out of range"))?;
        if port == 0 {
            return Err(fail("port 0 is not connectable"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Host without brackets
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for ToolEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ToolEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(input: &str) -> String {
        match ToolEndpoint::parse(input).unwrap_err() {
            Error::ConnectionFormat { input: echoed, reason } => {
                assert_eq!(echoed, input);
                reason
            }
            other => panic!("expected ConnectionFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_host_port() {
        let endpoint = ToolEndpoint::parse("127.0.0.1:5000").unwrap();
        assert_eq!(endpoint.host(), "127.0.0.1");
        assert_eq!(endpoint.port(), 5000);
        assert_eq!(endpoint.to_string(), "127.0.0.1:5000");

        let endpoint: ToolEndpoint = "dev-box.local:65535".parse().unwrap();
        assert_eq!(endpoint.host(), "dev-box.local");
        assert_eq!(endpoint.port(), 65535);
    }

    #[test]
    fn test_parse_bracketed_ipv6() {
        let endpoint = ToolEndpoint::parse("[::1]:9000").unwrap();
        assert_eq!(endpoint.host(), "::1");
        assert_eq!(endpoint.port(), 9000);
        assert_eq!(endpoint.to_string(), "[::1]:9000");
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(reason("").contains("empty"));
        assert!(reason("localhost").contains("host:port"));
        assert!(reason(":5000").contains("missing host"));
        assert!(reason("localhost:").contains("missing port"));
        assert!(reason("localhost:http").contains("numeric"));
        assert!(reason("localhost:70000").contains("range"));
        assert!(reason("localhost:0").contains("port 0"));
        assert!(reason("local host:5000").contains("whitespace"));
        assert!(reason(" localhost:5000").contains("whitespace"));
        assert!(reason("::1:5000").contains("brackets"));
        assert!(reason("[::1]5000").contains("':port'"));
        assert!(reason("[::1:5000").contains("unterminated"));
        assert!(reason("[not-v6]:5000").contains("IPv6"));
        assert!(reason("host/app:5000").contains("character"));
        assert!(reason("localhost:-1").contains("numeric"));
    }
}
