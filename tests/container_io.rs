use image::{DynamicImage, Rgba, RgbaImage};
use lsb_stego::codec::bits::TextWidth;
use lsb_stego::common::config::load_config;
use lsb_stego::diagnostics::{EventLog, StegoEvent};
use lsb_stego::processing::{embed_bytes, extract_bytes, load_carrier, save_stego};
use lsb_stego::{CodecConfig, Message, StegoCodec, StegoError};
use std::fs;
use std::io::Cursor;
use std::sync::Arc;

fn cover() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(60, 40, |x, y| {
        Rgba([(x * 4) as u8, (y * 6) as u8, 200, 255 - (x + y) as u8])
    }))
}

#[test]
fn test_encode_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let cover_path = dir.path().join("cover.png");
    let stego_path = dir.path().join("stego.png");
    save_stego(&cover(), &cover_path).unwrap();

    let codec = StegoCodec::default();
    let message = Message::from("written to disk and read back");
    let encoded = codec
        .encode(&load_carrier(&cover_path).unwrap(), &message)
        .unwrap();
    save_stego(&encoded.image, &stego_path).unwrap();

    let reloaded = load_carrier(&stego_path).unwrap();
    assert_eq!(reloaded, encoded.image);
    assert_eq!(codec.decode(&reloaded, &encoded.key).unwrap(), message);
}

#[test]
fn test_tga_and_tiff_keep_the_payload() {
    let dir = tempfile::tempdir().unwrap();
    let codec = StegoCodec::default();
    let message = Message::from(vec![9u8, 8, 7, 6, 5]);
    let encoded = codec.encode(&cover(), &message).unwrap();

    for name in ["stego.tga", "stego.tiff"] {
        let path = dir.path().join(name);
        save_stego(&encoded.image, &path).unwrap();
        let reloaded = load_carrier(&path).unwrap();
        assert_eq!(codec.decode(&reloaded, &encoded.key).unwrap(), message);
    }
}

#[test]
fn test_lossy_carrier_file_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.jpg");
    DynamicImage::ImageRgb8(cover().to_rgb8()).save(&path).unwrap();

    assert!(matches!(
        load_carrier(&path),
        Err(StegoError::LossyContainer(_))
    ));
}

#[test]
fn test_in_memory_round_trip_with_events() {
    let mut png = Vec::new();
    cover()
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let log = Arc::new(EventLog::new());
    let codec = StegoCodec::default().with_diagnostics(log.clone());
    let message = Message::from("upload, embed, download");

    let (stego, key) = embed_bytes(&png, &message, &codec).unwrap();
    assert_eq!(extract_bytes(&stego, &key, &codec).unwrap(), message);

    let events = log.events();
    assert!(matches!(events.first(), Some(StegoEvent::PayloadSealed { .. })));
    assert!(matches!(events.last(), Some(StegoEvent::PayloadRecovered { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, StegoEvent::HeaderRecovered { .. })));
}

#[test]
fn test_codec_config_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codec.toml");
    fs::write(&path, "max_depth = 2\ndelimiter = \"|\"\ntext_width = \"utf16\"\n").unwrap();

    let config = CodecConfig::from_file(&path).unwrap();
    assert_eq!(config.max_depth, 2);
    assert_eq!(config.delimiter, '|');
    assert_eq!(config.text_width, TextWidth::Utf16);

    let generic: CodecConfig = load_config(&path).unwrap();
    assert_eq!(generic, config);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let bad_depth = dir.path().join("deep.toml");
    fs::write(&bad_depth, "max_depth = 12\n").unwrap();
    assert!(matches!(
        CodecConfig::from_file(&bad_depth),
        Err(StegoError::InvalidOptions(_))
    ));

    let bad_syntax = dir.path().join("broken.toml");
    fs::write(&bad_syntax, "max_depth = = 3\n").unwrap();
    assert!(matches!(
        CodecConfig::from_file(&bad_syntax),
        Err(StegoError::Config(_))
    ));

    assert!(matches!(
        CodecConfig::from_file(dir.path().join("missing.toml")),
        Err(StegoError::Io(_))
    ));
}
