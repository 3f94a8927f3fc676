//! WiFi credential parsing (`WIFI:T:WPA;S:ssid;P:password;;`)

use thiserror::Error;
use tracing::trace;

const WIFI_PREFIX: &str = "WIFI:";

/// Network security announced by the `T:` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityType {
    /// WEP
    Wep,
    /// WPA, WPA2 or WPA3
    Wpa,
    /// No password
    Open,
    /// A marker was present but not recognized
    Unknown,
}

impl SecurityType {
    fn from_marker(value: &str) -> Self {
        let marker = value.trim().to_ascii_uppercase();
        if marker.contains("WEP") {
            SecurityType::Wep
        } else if marker.is_empty() || marker == "NOPASS" {
            SecurityType::Open
        } else if marker.contains("WPA") || marker.contains("SAE") {
            SecurityType::Wpa
        } else {
            SecurityType::Unknown
        }
    }
}

/// Credentials extracted from a WiFi payload
///
/// Absent fields are empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    /// Security type
    pub security: SecurityType,
    /// Network name
    pub ssid: String,
    /// Password; empty for open networks
    pub password: String,
    /// Whether the network does not broadcast its SSID (`H:true`)
    pub hidden: bool,
}

/// WiFi payload parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No `T:` parameter anywhere in the payload
    #[error("WiFi payload has no security type (T:) parameter")]
    MissingSecurityType,
}

/// Parse a `WIFI:` payload.
///
/// Parameters are `;`-separated `key:value` pairs keyed by their first character.
/// Tokens without a `:` and unknown keys are skipped. Backslash escapes
/// (`\;`, `\:`, `\\`, ...) are honoured. Only a missing `T` key fails the parse.
pub fn parse_wifi(payload: &str) -> Result<WifiCredentials, ParseError> {
    let body = match payload.find(WIFI_PREFIX) {
        Some(start) => &payload[start + WIFI_PREFIX.len()..],
        None => payload,
    };

    let mut security = None;
    let mut ssid = String::new();
    let mut password = String::new();
    let mut hidden = false;

    for token in split_unescaped(body, ';') {
        if token.is_empty() {
            continue;
        }
        let Some(colon) = find_unescaped(token, ':') else {
            trace!(token, "skipping WiFi token without key");
            continue;
        };
        let value = unescape(&token[colon + 1..]);
        match token[..colon].trim_start().chars().next() {
            Some('T') => security = Some(SecurityType::from_marker(&value)),
            Some('S') => ssid = value,
            Some('P') => password = value,
            Some('H') => hidden = value.trim().eq_ignore_ascii_case("true"),
            _ => trace!(token, "ignoring unknown WiFi key"),
        }
    }

    let security = security.ok_or(ParseError::MissingSecurityType)?;
    Ok(WifiCredentials {
        security,
        ssid,
        password,
        hidden,
    })
}

fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            tokens.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    tokens.push(&s[start..]);
    tokens
}

fn find_unescaped(s: &str, target: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == target {
            return Some(i);
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next().unwrap_or('\\'));
        } else {
            out.push(c);
        }
    }
    out
}
