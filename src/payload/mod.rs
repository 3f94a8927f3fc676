//! Payload classification and field extraction
//!
//! Turns the decoded text of a scanned symbol into a [`PayloadCategory`] and the
//! structured data the action dispatcher needs:
//! - Classification (first matching rule wins)
//! - WiFi credential parsing
//! - Tracking-parameter stripping for URLs
//! - Contact, event and location extraction

pub mod extract;
pub mod links;
pub mod wifi;

use std::fmt;

use tracing::debug;

pub use extract::{ExtractError, Extracted, extract};
pub use links::{looks_like_absolute_url, strip_tracking_params};
pub use wifi::{ParseError, SecurityType, WifiCredentials, parse_wifi};

/// Semantic category of a decoded payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadCategory {
    /// Web, FaceTime, Shortcuts or mail link
    Url,
    /// vCard contact
    Contact,
    /// iCalendar event
    Event,
    /// `geo:` coordinates
    Location,
    /// WiFi network credentials
    Network,
    /// Anything else that is non-empty
    PlainText,
    /// Empty input
    Unknown,
}

impl fmt::Display for PayloadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PayloadCategory::Url => "url",
            PayloadCategory::Contact => "contact",
            PayloadCategory::Event => "event",
            PayloadCategory::Location => "location",
            PayloadCategory::Network => "network",
            PayloadCategory::PlainText => "text",
            PayloadCategory::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Markers that make a payload a link even when it is not an absolute web URL
const LINK_MARKERS: [&str; 4] = ["facetime:", "facetime-audio:", "shortcuts://", "mailto:"];

/// Classify a decoded payload.
///
/// Total and deterministic. Rules are checked in order and the first match wins,
/// so a string holding both a URL and `WIFI:` is a [`PayloadCategory::Url`].
pub fn classify(payload: &str) -> PayloadCategory {
    let category = if payload.is_empty() {
        PayloadCategory::Unknown
    } else if looks_like_absolute_url(payload) || LINK_MARKERS.iter().any(|m| payload.contains(m))
    {
        PayloadCategory::Url
    } else if payload.contains("BEGIN:VCARD") {
        PayloadCategory::Contact
    } else if payload.contains("BEGIN:VEVENT") {
        PayloadCategory::Event
    } else if payload.contains("geo:") {
        PayloadCategory::Location
    } else if payload.contains("WIFI:") {
        PayloadCategory::Network
    } else {
        PayloadCategory::PlainText
    };
    debug!(%category, len = payload.len(), "classified payload");
    category
}
