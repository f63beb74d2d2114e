//! Preview image re-encoding

use image::codecs::jpeg::JpegEncoder;

use crate::errors::{LoadError, LoadResult};
use crate::models::{LogId, PreviewImage};

pub const PREVIEW_MIME_TYPE: &str = "image/jpeg";

/// Decode a stored camera frame and re-encode it as an RGB JPEG
pub fn encode_preview(log_id: &LogId, raw: &[u8], quality: u8) -> LoadResult<PreviewImage> {
    let decoded = image::load_from_memory(raw).map_err(|e| {
        LoadError::corrupt(log_id.as_str(), format!("failed to decode preview frame: {e}"))
    })?;
    let rgb = decoded.to_rgb8();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| LoadError::internal(format!("failed to encode preview for {log_id}: {e}")))?;

    Ok(PreviewImage {
        bytes,
        width: rgb.width(),
        height: rgb.height(),
        mime_type: PREVIEW_MIME_TYPE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_is_reencoded_as_jpeg() {
        let preview = encode_preview(&"000001".into(), &png_fixture(16, 8), 85).unwrap();
        assert_eq!(preview.mime_type, "image/jpeg");
        assert_eq!((preview.width, preview.height), (16, 8));
        assert_eq!(&preview.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_reencoding_is_deterministic() {
        let raw = png_fixture(4, 4);
        let a = encode_preview(&"x".into(), &raw, 85).unwrap();
        let b = encode_preview(&"x".into(), &raw, 85).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_garbage_bytes_are_data_corruption() {
        let err = encode_preview(&"000002".into(), b"not an image", 85).unwrap_err();
        assert!(matches!(err, LoadError::DataCorruption { ref log_id, .. } if log_id == "000002"));
    }
}
