//! qr_pipeline - QR content pipeline
//!
//! Two directions through one crate:
//! - Scanned text: [`classify`] it, extract its fields, and hand the user a
//!   [`PendingAction`] that a [`Dispatcher`] runs once they confirm.
//! - Text to print: [`generate`] a styled [`QrSymbol`], rasterise it, and lay out
//!   copies on pages for a [`PageRenderer`].
//!
//! Classification, extraction, generation and layout are synchronous and pure.
//! Dispatch and page rendering are async and run on tokio.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Environment-backed settings
pub mod config;
/// Consent-gated actions through injected capabilities
pub mod dispatch;
/// QR symbol encoder (ECC, placement, masking)
pub mod encoder;
/// Multi-up page layout
pub mod layout;
/// Core data structures (BitMatrix, QrSymbol, QrStyle, ...)
pub mod models;
/// Payload classification and field extraction
pub mod payload;
/// Page renderers for print jobs
pub mod print;
/// Styled rasterisation
pub mod render;

pub use config::{Settings, SettingsProvider, settings};
pub use dispatch::{ActionOutcome, Capabilities, Dispatcher, FailureReason, PendingAction};
pub use encoder::{GenerationError, Generator, generate};
pub use layout::{LayoutEngine, LayoutError, Page, PageSize, PrintJob};
pub use models::{
    BitMatrix, Charset, Color, ECLevel, EyeShape, MaskPattern, PixelShape, QrContent, QrStyle,
    QrSymbol, Version,
};
pub use payload::{PayloadCategory, WifiCredentials, classify, parse_wifi, strip_tracking_params};
pub use print::{PageRenderer, RasterPageRenderer, RenderError, RenderOutcome};

/// Generate a symbol for `text` using the given settings' charset and default level
pub fn generate_with_settings(
    text: &str,
    style: &QrStyle,
    settings: &dyn SettingsProvider,
) -> Result<QrSymbol, GenerationError> {
    let content = QrContent::new(text, settings.default_ec_level());
    Generator::from_settings(settings).generate(&content, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoder::readback::read_text;

    #[test]
    fn test_generate_with_settings_uses_default_level() {
        let settings = Settings {
            default_ec_level: ECLevel::Q,
            ..Settings::default()
        };
        let symbol = generate_with_settings("WIFI:T:WPA;S:Home;P:pw;;", &QrStyle::default(), &settings)
            .unwrap();
        assert_eq!(symbol.error_correction, ECLevel::Q);
        assert_eq!(
            read_text(&symbol.modules, Charset::Utf8).unwrap(),
            "WIFI:T:WPA;S:Home;P:pw;;"
        );
    }

    #[test]
    fn test_generated_payload_classifies_back() {
        let text = "BEGIN:VCARD\nFN:Ada\nEND:VCARD";
        let symbol = generate(&QrContent::new(text, ECLevel::M), &QrStyle::default()).unwrap();
        let decoded = read_text(&symbol.modules, Charset::Utf8).unwrap();
        assert_eq!(classify(&decoded), PayloadCategory::Contact);
    }
}
