//! Generated symbols decoded by an independent reader (rqrr)

use qr_pipeline::encoder::tables::byte_capacity;
use qr_pipeline::render::rasterize;
use qr_pipeline::{ECLevel, PixelShape, QrContent, QrStyle, QrSymbol, Version, generate};

/// Decode the single symbol in a raster of `symbol`
fn decode(symbol: &QrSymbol, scale: u32) -> (rqrr::MetaData, String) {
    let img = rasterize(symbol, scale);
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "version {}", symbol.version.number());
    grids[0].decode().unwrap()
}

fn filler(len: usize) -> String {
    (0..len)
        .map(|i| (b'A' + (i * 7 % 26) as u8) as char)
        .collect()
}

#[test]
fn test_every_version_and_level_decodes() {
    let style = QrStyle::default();
    for level in ECLevel::ALL {
        for version in Version::all() {
            let text = filler(byte_capacity(version, level));
            let symbol = generate(&QrContent::new(text.as_str(), level), &style).unwrap();
            assert_eq!(symbol.version, version);

            let (meta, decoded) = decode(&symbol, 4);
            assert_eq!(meta.version.0, version.number() as usize);
            assert_eq!(meta.mask, u16::from(symbol.mask_pattern.bits()));
            assert_eq!(decoded, text, "version {} level {}", version.number(), level);
        }
    }
}

#[test]
fn test_short_payloads_decode() {
    let style = QrStyle::default();
    for text in ["a", "https://example.com/?q=1", "WIFI:T:WPA;S:Cafe;P:hunter2;;"] {
        for level in ECLevel::ALL {
            let symbol = generate(&QrContent::new(text, level), &style).unwrap();
            assert_eq!(decode(&symbol, 4).1, text);
        }
    }
}

#[test]
fn test_rounded_modules_still_decode() {
    let style = QrStyle {
        pixel_shape: PixelShape::RoundedSquare,
        ..QrStyle::default()
    };
    let text = "https://example.com/menu?table=4";
    let symbol = generate(&QrContent::new(text, ECLevel::H), &style).unwrap();
    assert_eq!(decode(&symbol, 8).1, text);
}
