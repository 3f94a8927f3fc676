//! Symbol generation properties checked through the read-back path

use qr_pipeline::encoder::readback::{read_symbol, read_text};
use qr_pipeline::{
    Charset, Color, ECLevel, EyeShape, GenerationError, Generator, PixelShape, QrContent,
    QrStyle, Version, generate,
};

#[test]
fn test_generation_is_deterministic() {
    let content = QrContent::new("https://example.com/menu?table=4", ECLevel::Q);
    let style = QrStyle::default();
    let a = generate(&content, &style).unwrap();
    let b = generate(&content, &style).unwrap();
    assert_eq!(a.modules, b.modules);
    assert_eq!(a.mask_pattern, b.mask_pattern);
}

#[test]
fn test_level_change_keeps_text() {
    let text = "Meet at the north entrance at 10:30";
    let style = QrStyle::default();
    let symbols: Vec<_> = ECLevel::ALL
        .iter()
        .map(|&level| generate(&QrContent::new(text, level), &style).unwrap())
        .collect();

    for pair in symbols.windows(2) {
        assert_ne!(pair[0].modules, pair[1].modules);
    }
    for symbol in &symbols {
        assert_eq!(read_text(&symbol.modules, Charset::Utf8).unwrap(), text);
        assert_eq!(
            read_symbol(&symbol.modules).unwrap().ec_level,
            symbol.error_correction
        );
    }
}

#[test]
fn test_higher_level_needs_more_space() {
    let text = "x".repeat(100);
    let style = QrStyle::default();
    let low = generate(&QrContent::new(text.as_str(), ECLevel::L), &style).unwrap();
    let high = generate(&QrContent::new(text.as_str(), ECLevel::H), &style).unwrap();
    assert!(high.version > low.version);
}

#[test]
fn test_style_never_changes_modules() {
    let content = QrContent::new("styled", ECLevel::M);
    let plain = generate(&content, &QrStyle::default()).unwrap();
    let fancy = generate(
        &content,
        &QrStyle {
            pixel_shape: PixelShape::RoundedSquare,
            eye_shape: EyeShape::Rounded,
            ..QrStyle::default().with_foreground(Color::rgb(20, 60, 200))
        },
    )
    .unwrap();
    assert_eq!(plain.modules, fancy.modules);
    assert_ne!(plain.style, fancy.style);
}

#[test]
fn test_largest_symbol() {
    let text = "z".repeat(2953);
    let symbol = generate(&QrContent::new(text.as_str(), ECLevel::L), &QrStyle::default()).unwrap();
    assert_eq!(symbol.version, Version::MAX);
    assert_eq!(symbol.size(), 177);
    assert_eq!(read_symbol(&symbol.modules).unwrap().data.len(), 2953);

    let err = generate(
        &QrContent::new("z".repeat(2954), ECLevel::L),
        &QrStyle::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GenerationError::DataTooLong { capacity: 2953, .. }));
}

#[test]
fn test_latin1_charset() {
    let generator = Generator::new(Charset::Latin1);
    let symbol = generator
        .generate(&QrContent::new("Café crème", ECLevel::M), &QrStyle::default())
        .unwrap();
    let data = read_symbol(&symbol.modules).unwrap().data;
    assert_eq!(data.len(), "Café crème".chars().count());
    assert_eq!(read_text(&symbol.modules, Charset::Latin1).unwrap(), "Café crème");
}
