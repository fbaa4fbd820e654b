//! Decoding of base64-encoded frame images.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::DynamicImage;

/// Errors raised while decoding a submitted frame.
#[derive(Debug)]
pub enum DecodeError {
    /// The payload is not valid base64
    Base64(String),
    /// The bytes are not an image we can read
    Image(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Base64(e) => write!(f, "Invalid base64 image data: {e}"),
            DecodeError::Image(e) => write!(f, "Could not decode image: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Strip a `data:<mime>;base64,` style prefix if present.
pub fn strip_data_url(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    }
}

/// Decode a base64 image payload, optionally data-URL prefixed.
///
/// Whitespace anywhere in the payload is ignored, so line-wrapped output of
/// tools like `base64` decodes as-is.
pub fn decode_image(payload: &str) -> Result<DynamicImage, DecodeError> {
    let encoded: String = strip_data_url(payload)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    image::load_from_memory(&bytes).map_err(|e| DecodeError::Image(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_base64(width: u32, height: u32) -> String {
        let image = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        BASE64.encode(bytes.into_inner())
    }

    #[test]
    fn test_strip_data_url() {
        assert_eq!(strip_data_url("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url("AAAA"), "AAAA");
    }

    #[test]
    fn test_decode_plain_and_prefixed() {
        let encoded = png_base64(3, 2);

        let image = decode_image(&encoded).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));

        let prefixed = format!("data:image/png;base64,{encoded}");
        let image = decode_image(&prefixed).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
    }

    #[test]
    fn test_decode_line_wrapped() {
        let encoded = png_base64(16, 16);
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(wrapped.contains('\n'));

        let image = decode_image(&format!("{wrapped}\n")).unwrap();
        assert_eq!((image.width(), image.height()), (16, 16));

        let crlf = format!("data:image/png;base64,{}", wrapped.replace('\n', "\r\n"));
        assert!(decode_image(&crlf).is_ok());
    }

    #[test]
    fn test_malformed_base64() {
        assert!(matches!(
            decode_image("not base64 at all!"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_valid_base64_but_not_an_image() {
        let encoded = BASE64.encode(b"hello world");
        assert!(matches!(decode_image(&encoded), Err(DecodeError::Image(_))));
    }
}
