//! Per-category field extraction

use thiserror::Error;

use super::PayloadCategory;
use super::wifi::{ParseError, WifiCredentials, parse_wifi};

const VCARD_BEGIN: &str = "BEGIN:VCARD";
const VCARD_END: &str = "END:VCARD";
const VEVENT_BEGIN: &str = "BEGIN:VEVENT";
const VEVENT_END: &str = "END:VEVENT";
const GEO_PREFIX: &str = "geo:";

/// Structured data pulled out of a payload, one variant per category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Link to open
    Url(String),
    /// Raw vCard block, `BEGIN:VCARD` through `END:VCARD`
    Contact(Vec<u8>),
    /// Raw VEVENT block
    Event(String),
    /// Coordinate string with the `geo:` prefix removed
    Location(String),
    /// WiFi credentials
    Network(WifiCredentials),
    /// Text for the clipboard
    Text(String),
}

/// Extraction failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// vCard block is missing or unterminated
    #[error("Payload does not contain a complete vCard")]
    InvalidContact,
    /// `geo:` is not followed by coordinates
    #[error("Location payload has no coordinates")]
    InvalidLocation,
    /// WiFi parameters could not be parsed
    #[error(transparent)]
    Wifi(#[from] ParseError),
    /// Nothing can be extracted from an unknown payload
    #[error("Unrecognized payload")]
    Unrecognized,
}

/// Extract the fields the dispatcher needs for `category`
pub fn extract(category: PayloadCategory, payload: &str) -> Result<Extracted, ExtractError> {
    match category {
        PayloadCategory::Url => Ok(Extracted::Url(payload.trim().to_string())),
        PayloadCategory::Contact => vcard_block(payload)
            .map(|card| Extracted::Contact(card.as_bytes().to_vec()))
            .ok_or(ExtractError::InvalidContact),
        PayloadCategory::Event => Ok(Extracted::Event(event_block(payload).to_string())),
        PayloadCategory::Location => coordinates(payload)
            .map(|c| Extracted::Location(c.to_string()))
            .ok_or(ExtractError::InvalidLocation),
        PayloadCategory::Network => Ok(Extracted::Network(parse_wifi(payload)?)),
        PayloadCategory::PlainText => Ok(Extracted::Text(payload.to_string())),
        PayloadCategory::Unknown => Err(ExtractError::Unrecognized),
    }
}

/// The first complete vCard in `payload`
pub fn vcard_block(payload: &str) -> Option<&str> {
    let start = payload.find(VCARD_BEGIN)?;
    let end = payload[start..].find(VCARD_END)? + start + VCARD_END.len();
    Some(&payload[start..end])
}

/// The first VEVENT in `payload`; runs to the end of input when unterminated
pub fn event_block(payload: &str) -> &str {
    let Some(start) = payload.find(VEVENT_BEGIN) else {
        return payload;
    };
    match payload[start..].find(VEVENT_END) {
        Some(end) => &payload[start..start + end + VEVENT_END.len()],
        None => &payload[start..],
    }
}

/// Coordinates following the first `geo:` prefix
pub fn coordinates(payload: &str) -> Option<&str> {
    let start = payload.find(GEO_PREFIX)? + GEO_PREFIX.len();
    let coords = payload[start..].trim();
    (!coords.is_empty()).then_some(coords)
}
