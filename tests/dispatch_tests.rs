//! Dispatcher behaviour against in-memory capability fakes

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use qr_pipeline::dispatch::{
    Action, ActionOutcome, Capabilities, CapabilityError, Clipboard, ContactImporter,
    Dispatcher, FailureReason, MapOpener, Network, NetworkAssociator, UrlOpener,
};
use qr_pipeline::payload::SecurityType;
use qr_pipeline::{PayloadCategory, Settings};

/// Records every capability call; failures are scripted per capability
#[derive(Default)]
struct Fake {
    calls: Mutex<Vec<String>>,
    fail_with: Mutex<Option<CapabilityError>>,
    visible: Mutex<Vec<Network>>,
    delay: Mutex<Option<Duration>>,
}

impl Fake {
    fn record(&self, call: String) -> Result<(), CapabilityError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UrlOpener for Fake {
    async fn open(&self, url: &str) -> Result<(), CapabilityError> {
        self.pause().await;
        self.record(format!("open {}", url))
    }
}

#[async_trait]
impl ContactImporter for Fake {
    async fn import_contact(&self, vcard: &[u8]) -> Result<(), CapabilityError> {
        self.record(format!("contact {}", vcard.len()))
    }
}

#[async_trait]
impl MapOpener for Fake {
    async fn open_location(&self, coordinates: &str) -> Result<(), CapabilityError> {
        self.record(format!("map {}", coordinates))
    }
}

#[async_trait]
impl NetworkAssociator for Fake {
    async fn scan_for_network(&self, ssid: &str) -> Result<Option<Network>, CapabilityError> {
        self.calls.lock().unwrap().push(format!("scan {}", ssid));
        Ok(self
            .visible
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.ssid == ssid)
            .cloned())
    }

    async fn associate(&self, network: &Network, password: &str) -> Result<(), CapabilityError> {
        self.record(format!("join {} {}", network.ssid, password))
    }
}

#[async_trait]
impl Clipboard for Fake {
    async fn set_text(&self, text: &str) -> Result<(), CapabilityError> {
        self.record(format!("copy {}", text))
    }
}

fn dispatcher(fake: &Arc<Fake>) -> Dispatcher {
    let capabilities = Capabilities {
        urls: fake.clone(),
        contacts: fake.clone(),
        maps: fake.clone(),
        networks: fake.clone(),
        clipboard: fake.clone(),
    };
    Dispatcher::from_settings(capabilities, &Settings::default())
}

#[tokio::test]
async fn test_scan_does_not_dispatch() {
    let fake = Arc::new(Fake::default());
    let d = dispatcher(&fake);
    let pending = d.prepare("https://example.com");
    assert_eq!(pending.category(), PayloadCategory::Url);
    assert!(fake.calls().is_empty());

    assert_eq!(d.dispatch(pending).await, ActionOutcome::Succeeded);
    assert_eq!(fake.calls(), vec!["open https://example.com"]);
}

#[tokio::test]
async fn test_url_tracking_params_stripped_before_open() {
    let fake = Arc::new(Fake::default());
    let d = dispatcher(&fake);
    let pending = d.prepare("https://example.com/?utm_source=poster&id=7");
    assert_eq!(
        pending.action(),
        &Action::OpenUrl("https://example.com/?id=7".into())
    );
    d.dispatch(pending).await;
    assert_eq!(fake.calls(), vec!["open https://example.com/?id=7"]);
}

#[tokio::test]
async fn test_each_category_reaches_its_capability() {
    let fake = Arc::new(Fake::default());
    let d = dispatcher(&fake);

    let vcard = "BEGIN:VCARD\nFN:Jane\nEND:VCARD";
    assert_eq!(d.dispatch(d.prepare(vcard)).await, ActionOutcome::Succeeded);
    assert_eq!(d.dispatch(d.prepare("geo:1.5,2.5")).await, ActionOutcome::Succeeded);
    assert_eq!(d.dispatch(d.prepare("hello")).await, ActionOutcome::Succeeded);
    assert_eq!(
        d.dispatch(d.prepare("BEGIN:VEVENT\nEND:VEVENT")).await,
        ActionOutcome::Succeeded
    );

    assert_eq!(
        fake.calls(),
        vec![
            format!("contact {}", vcard.len()),
            "map 1.5,2.5".to_string(),
            "copy hello".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_unknown_and_invalid_payloads_fail() {
    let fake = Arc::new(Fake::default());
    let d = dispatcher(&fake);
    assert_eq!(
        d.dispatch(d.prepare("")).await,
        ActionOutcome::Failed(FailureReason::Unrecognized)
    );
    assert_eq!(
        d.dispatch(d.prepare("BEGIN:VCARD\nFN:Jane")).await,
        ActionOutcome::Failed(FailureReason::InvalidContact)
    );
    assert_eq!(
        d.dispatch(d.prepare("WIFI:S:Home;P:pw;;")).await,
        ActionOutcome::Failed(FailureReason::InvalidNetwork)
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_network_scan_then_associate() {
    let fake = Arc::new(Fake::default());
    fake.visible.lock().unwrap().push(Network {
        ssid: "Home".into(),
        security: SecurityType::Wpa,
    });
    let d = dispatcher(&fake);

    assert_eq!(
        d.dispatch(d.prepare("WIFI:T:WPA;S:Home;P:pw;;")).await,
        ActionOutcome::Succeeded
    );
    assert_eq!(fake.calls(), vec!["scan Home", "join Home pw"]);

    assert_eq!(
        d.dispatch(d.prepare("WIFI:T:WPA;S:Elsewhere;P:pw;;")).await,
        ActionOutcome::Failed(FailureReason::NetworkNotFound)
    );
}

#[tokio::test]
async fn test_capability_errors_are_mapped() {
    let fake = Arc::new(Fake::default());
    fake.visible.lock().unwrap().push(Network {
        ssid: "Home".into(),
        security: SecurityType::Wpa,
    });
    let d = dispatcher(&fake);

    *fake.fail_with.lock().unwrap() = Some(CapabilityError::Failed("bad key".into()));
    assert_eq!(
        d.dispatch(d.prepare("WIFI:T:WPA;S:Home;P:nope;;")).await,
        ActionOutcome::Failed(FailureReason::AssociationFailed)
    );
    assert_eq!(
        d.dispatch(d.prepare("plain text")).await,
        ActionOutcome::Failed(FailureReason::CapabilityFailed("bad key".into()))
    );

    *fake.fail_with.lock().unwrap() = Some(CapabilityError::Cancelled);
    assert_eq!(
        d.dispatch(d.prepare("https://example.com")).await,
        ActionOutcome::UserCancelled
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_capability_times_out() {
    let fake = Arc::new(Fake::default());
    *fake.delay.lock().unwrap() = Some(Duration::from_secs(60));
    let d = dispatcher(&fake).with_timeout(Duration::from_secs(1));
    assert_eq!(
        d.dispatch(d.prepare("https://example.com")).await,
        ActionOutcome::Failed(FailureReason::Timeout)
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_dispatch_while_in_flight_is_busy() {
    let fake = Arc::new(Fake::default());
    *fake.delay.lock().unwrap() = Some(Duration::from_millis(500));
    let d = dispatcher(&fake);

    let first = d.dispatch(d.prepare("https://example.com/a"));
    let second = async {
        tokio::task::yield_now().await;
        d.dispatch(d.prepare("https://example.com/b")).await
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, ActionOutcome::Succeeded);
    assert_eq!(second, ActionOutcome::Failed(FailureReason::Busy));
    assert_eq!(fake.calls(), vec!["open https://example.com/a"]);

    // The flag is released once the first dispatch finishes
    assert_eq!(
        d.dispatch(d.prepare("https://example.com/c")).await,
        ActionOutcome::Succeeded
    );
}
