//! Integration tests for the vision-core frame codec and URL resolution.
//!
//! These exercise the public API the way the inspector session uses it:
//! encode a camera frame for the socket, then decode a detector reply and
//! stretch it onto a render surface.

use image::{Rgb, RgbImage, Rgba};
use vision_core::frame::scale_to;
use vision_core::{
    decode_data_url, encode_jpeg_data_url, resolve_socket_url, PageOrigin, SessionConfig,
};

#[test]
fn test_camera_frame_survives_socket_encoding_at_native_size() {
    // Arrange: a 640x480 frame, the default ideal camera resolution.
    let frame = RgbImage::from_pixel(640, 480, Rgb([40, 160, 90]));

    // Act
    let payload = encode_jpeg_data_url(&frame).expect("encode");
    let decoded = decode_data_url(&payload).expect("decode");

    // Assert
    assert_eq!(decoded.dimensions(), (640, 480));
}

#[test]
fn test_detector_reply_is_stretched_to_surface() {
    // Arrange: the detector answers at half resolution.
    let reply = encode_jpeg_data_url(&RgbImage::from_pixel(320, 240, Rgb([250, 250, 250])))
        .expect("encode");

    // Act
    let decoded = decode_data_url(&reply).expect("decode");
    let painted = scale_to(&decoded, 640, 480);

    // Assert
    assert_eq!(painted.dimensions(), (640, 480));
    let Rgba([r, g, b, a]) = *painted.get_pixel(320, 240);
    assert!(r > 240 && g > 240 && b > 240, "unexpected color {r},{g},{b}");
    assert_eq!(a, 255);
}

#[test]
fn test_png_replies_are_accepted() {
    // The detector is not obliged to answer in JPEG.
    let mut png = Vec::new();
    RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("png encode");
    let payload = format!(
        "data:image/png;base64,{}",
        base64_encode_for_test(&png)
    );

    let decoded = decode_data_url(&payload).expect("decode png");

    assert_eq!(decoded.get_pixel(0, 0).0, [1, 2, 3, 255]);
}

#[test]
fn test_production_origin_targets_same_host() {
    let cfg = SessionConfig {
        origin: "https://inspector.example.org".parse::<PageOrigin>().unwrap(),
        ..Default::default()
    };
    assert_eq!(
        resolve_socket_url(&cfg),
        "wss://inspector.example.org/vision/stream-safety"
    );
}

fn base64_encode_for_test(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
