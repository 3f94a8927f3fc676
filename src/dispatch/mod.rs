//! Consent-gated actions for scanned payloads
//!
//! Scanning only ever produces a [`PendingAction`]. The side effect runs when the
//! host calls [`Dispatcher::dispatch`] after the user confirms, and the pending
//! action is consumed so one confirmation dispatches exactly once.

/// Injected platform capabilities
pub mod capabilities;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

pub use capabilities::{
    Capabilities, CapabilityError, Clipboard, ContactImporter, MapOpener, Network,
    NetworkAssociator, UrlOpener,
};

use crate::config::SettingsProvider;
use crate::payload::{
    ExtractError, Extracted, PayloadCategory, WifiCredentials, classify, extract,
    strip_tracking_params,
};

/// Why an action did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Nothing can be done with the payload
    Unrecognized,
    /// The payload has no complete vCard, or the importer rejected it
    InvalidContact,
    /// `geo:` without coordinates
    InvalidLocation,
    /// WiFi parameters could not be parsed
    InvalidNetwork,
    /// No visible network has the requested SSID
    NetworkNotFound,
    /// Joining the network failed
    AssociationFailed,
    /// A capability did not answer in time
    Timeout,
    /// A capability reported some other failure
    CapabilityFailed(String),
    /// Another dispatch is still in flight
    Busy,
}

/// Result of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action completed
    Succeeded,
    /// The action failed
    Failed(FailureReason),
    /// The user backed out of a system prompt
    UserCancelled,
}

/// The side effect a payload maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open a link
    OpenUrl(String),
    /// Import a vCard block
    ImportContact(Vec<u8>),
    /// Event handling is a placeholder that always succeeds
    ShowEvent(String),
    /// Open coordinates in maps
    OpenMap(String),
    /// Scan for and join a network
    JoinNetwork(WifiCredentials),
    /// Copy text to the clipboard
    CopyText(String),
    /// Nothing to run; dispatching reports this failure
    Reject(FailureReason),
}

/// An action awaiting user confirmation.
///
/// Not `Clone`: dispatching consumes it.
#[derive(Debug)]
pub struct PendingAction {
    category: PayloadCategory,
    action: Action,
}

impl PendingAction {
    /// Build from an already classified payload and its extraction result
    pub fn from_parts(
        category: PayloadCategory,
        extracted: Result<Extracted, ExtractError>,
    ) -> Self {
        let action = match (category, extracted) {
            (PayloadCategory::Unknown, _) => Action::Reject(FailureReason::Unrecognized),
            (_, Ok(Extracted::Url(url))) => Action::OpenUrl(url),
            (_, Ok(Extracted::Contact(card))) => Action::ImportContact(card),
            (_, Ok(Extracted::Event(event))) => Action::ShowEvent(event),
            (_, Ok(Extracted::Location(coords))) => Action::OpenMap(coords),
            (_, Ok(Extracted::Network(credentials))) => Action::JoinNetwork(credentials),
            (_, Ok(Extracted::Text(text))) => Action::CopyText(text),
            (_, Err(err)) => Action::Reject(match err {
                ExtractError::InvalidContact => FailureReason::InvalidContact,
                ExtractError::InvalidLocation => FailureReason::InvalidLocation,
                ExtractError::Wifi(_) => FailureReason::InvalidNetwork,
                ExtractError::Unrecognized => FailureReason::Unrecognized,
            }),
        };
        Self { category, action }
    }

    /// Category of the scanned payload
    pub fn category(&self) -> PayloadCategory {
        self.category
    }

    /// What dispatching will do
    pub fn action(&self) -> &Action {
        &self.action
    }
}

/// Runs confirmed actions through injected capabilities
pub struct Dispatcher {
    capabilities: Capabilities,
    timeout: Duration,
    strip_tracking: bool,
    in_flight: AtomicBool,
}

impl Dispatcher {
    /// Dispatcher with a 15 second capability timeout that strips tracking parameters
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            timeout: Duration::from_millis(15_000),
            strip_tracking: true,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Dispatcher configured from read-only settings
    pub fn from_settings(capabilities: Capabilities, settings: &dyn SettingsProvider) -> Self {
        Self::new(capabilities)
            .with_timeout(settings.dispatch_timeout())
            .with_tracking_stripped(settings.strip_tracking_params())
    }

    /// Bound every capability call by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether `utm*` parameters are removed before opening links
    pub fn with_tracking_stripped(mut self, strip: bool) -> Self {
        self.strip_tracking = strip;
        self
    }

    /// Classify and extract a scanned payload. Pure; nothing runs yet.
    pub fn prepare(&self, payload: &str) -> PendingAction {
        let category = classify(payload);
        let mut pending = PendingAction::from_parts(category, extract(category, payload));
        if self.strip_tracking {
            if let Action::OpenUrl(url) = &pending.action {
                pending.action = Action::OpenUrl(strip_tracking_params(url));
            }
        }
        pending
    }

    /// Run a confirmed action. Never retries and never panics.
    pub async fn dispatch(&self, pending: PendingAction) -> ActionOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!(category = %pending.category, "dispatch rejected, another is in flight");
            return ActionOutcome::Failed(FailureReason::Busy);
        };

        info!(category = %pending.category, "dispatching action");
        let outcome = self.run(pending.action).await;
        match &outcome {
            ActionOutcome::Failed(reason) => warn!(?reason, "action failed"),
            other => info!(outcome = ?other, "action finished"),
        }
        outcome
    }

    async fn run(&self, action: Action) -> ActionOutcome {
        let caps = &self.capabilities;
        match action {
            Action::OpenUrl(url) => {
                let result = self.bounded(caps.urls.open(&url)).await;
                outcome(result, FailureReason::CapabilityFailed)
            }
            Action::ImportContact(card) => {
                let result = self.bounded(caps.contacts.import_contact(&card)).await;
                outcome(result, |_| FailureReason::InvalidContact)
            }
            Action::ShowEvent(event) => {
                debug!(len = event.len(), "event actions are not implemented");
                ActionOutcome::Succeeded
            }
            Action::OpenMap(coords) => {
                let result = self.bounded(caps.maps.open_location(&coords)).await;
                outcome(result, FailureReason::CapabilityFailed)
            }
            Action::JoinNetwork(credentials) => self.join_network(&credentials).await,
            Action::CopyText(text) => {
                let result = self.bounded(caps.clipboard.set_text(&text)).await;
                outcome(result, FailureReason::CapabilityFailed)
            }
            Action::Reject(reason) => ActionOutcome::Failed(reason),
        }
    }

    async fn join_network(&self, credentials: &WifiCredentials) -> ActionOutcome {
        let networks = &self.capabilities.networks;
        let network = match self.bounded(networks.scan_for_network(&credentials.ssid)).await {
            Ok(Some(network)) => network,
            Ok(None) => return ActionOutcome::Failed(FailureReason::NetworkNotFound),
            Err(err) => return outcome(Err(err), FailureReason::CapabilityFailed),
        };
        debug!(ssid = %network.ssid, "network found, associating");
        let result = self
            .bounded(networks.associate(&network, &credentials.password))
            .await;
        outcome(result, |_| FailureReason::AssociationFailed)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, CapabilityError>>,
    ) -> Result<T, CapabilityError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(CapabilityError::Timeout))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .field("strip_tracking", &self.strip_tracking)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Map a capability result; `failed` handles platform-specific failures
fn outcome(
    result: Result<(), CapabilityError>,
    failed: impl FnOnce(String) -> FailureReason,
) -> ActionOutcome {
    match result {
        Ok(()) => ActionOutcome::Succeeded,
        Err(CapabilityError::Cancelled) => ActionOutcome::UserCancelled,
        Err(CapabilityError::Timeout) => ActionOutcome::Failed(FailureReason::Timeout),
        Err(CapabilityError::Failed(message)) => ActionOutcome::Failed(failed(message)),
    }
}

/// Clears the in-flight flag on drop, including when the dispatch future is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{ParseError, SecurityType};

    #[test]
    fn test_from_parts_maps_extraction_errors() {
        let cases = [
            (
                PayloadCategory::Contact,
                Err(ExtractError::InvalidContact),
                FailureReason::InvalidContact,
            ),
            (
                PayloadCategory::Network,
                Err(ExtractError::Wifi(ParseError::MissingSecurityType)),
                FailureReason::InvalidNetwork,
            ),
            (
                PayloadCategory::Location,
                Err(ExtractError::InvalidLocation),
                FailureReason::InvalidLocation,
            ),
            (
                PayloadCategory::Unknown,
                Err(ExtractError::Unrecognized),
                FailureReason::Unrecognized,
            ),
        ];
        for (category, extracted, reason) in cases {
            let pending = PendingAction::from_parts(category, extracted);
            assert_eq!(pending.action(), &Action::Reject(reason));
        }
    }

    #[test]
    fn test_from_parts_network() {
        let credentials = WifiCredentials {
            security: SecurityType::Wpa,
            ssid: "Home".into(),
            password: "pw".into(),
            hidden: false,
        };
        let pending = PendingAction::from_parts(
            PayloadCategory::Network,
            Ok(Extracted::Network(credentials.clone())),
        );
        assert_eq!(pending.category(), PayloadCategory::Network);
        assert_eq!(pending.action(), &Action::JoinNetwork(credentials));
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(
            outcome(Ok(()), FailureReason::CapabilityFailed),
            ActionOutcome::Succeeded
        );
        assert_eq!(
            outcome(Err(CapabilityError::Cancelled), FailureReason::CapabilityFailed),
            ActionOutcome::UserCancelled
        );
        assert_eq!(
            outcome(Err(CapabilityError::Timeout), FailureReason::CapabilityFailed),
            ActionOutcome::Failed(FailureReason::Timeout)
        );
        assert_eq!(
            outcome(Err(CapabilityError::Failed("x".into())), |_| {
                FailureReason::AssociationFailed
            }),
            ActionOutcome::Failed(FailureReason::AssociationFailed)
        );
    }

    #[test]
    fn test_in_flight_guard() {
        let flag = AtomicBool::new(false);
        let guard = InFlightGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(InFlightGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(InFlightGuard::acquire(&flag).is_some());
    }
}
