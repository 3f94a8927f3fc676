//! Platform capabilities the dispatcher acts through
//!
//! Every capability is async and injected, so hosts supply real integrations
//! and tests supply in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::payload::SecurityType;

/// Capability failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// The user dismissed a system prompt
    #[error("Cancelled by user")]
    Cancelled,
    /// The platform gave up waiting
    #[error("Timed out")]
    Timeout,
    /// Any other platform failure
    #[error("{0}")]
    Failed(String),
}

/// A wireless network found by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    /// Network name
    pub ssid: String,
    /// Advertised security
    pub security: SecurityType,
}

/// Opens links in the default handler
#[async_trait]
pub trait UrlOpener: Send + Sync {
    /// Open `url`
    async fn open(&self, url: &str) -> Result<(), CapabilityError>;
}

/// Adds contacts to the address book
#[async_trait]
pub trait ContactImporter: Send + Sync {
    /// Import one vCard block
    async fn import_contact(&self, vcard: &[u8]) -> Result<(), CapabilityError>;
}

/// Shows coordinates in a maps application
#[async_trait]
pub trait MapOpener: Send + Sync {
    /// Open a `lat,lon[,alt]` coordinate string
    async fn open_location(&self, coordinates: &str) -> Result<(), CapabilityError>;
}

/// Joins wireless networks
#[async_trait]
pub trait NetworkAssociator: Send + Sync {
    /// Find a visible network called `ssid`
    async fn scan_for_network(&self, ssid: &str) -> Result<Option<Network>, CapabilityError>;

    /// Join `network` with `password` (empty for open networks)
    async fn associate(&self, network: &Network, password: &str) -> Result<(), CapabilityError>;
}

/// Writes to the system clipboard
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`
    async fn set_text(&self, text: &str) -> Result<(), CapabilityError>;
}

/// The full set of capabilities a dispatcher needs
#[derive(Clone)]
pub struct Capabilities {
    /// Link opener
    pub urls: Arc<dyn UrlOpener>,
    /// Contact importer
    pub contacts: Arc<dyn ContactImporter>,
    /// Maps opener
    pub maps: Arc<dyn MapOpener>,
    /// Network association
    pub networks: Arc<dyn NetworkAssociator>,
    /// Clipboard
    pub clipboard: Arc<dyn Clipboard>,
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
