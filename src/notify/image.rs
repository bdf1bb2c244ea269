//! Image resolution from notification hints.
//!
//! Precedence, first present key wins:
//! 1. raw pixel buffers: `image-data`, `image_data`, `icon_data`
//! 2. paths / icon names: `icon`, `image-path`, `image_path`
//!
//! Pixel images larger than the size cap are scaled down so the longer side
//! equals the cap. Nothing here touches shared state.

use std::path::Path;

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use super::value::{HintBag, HintValue};
use crate::error::ImageError;

/// Default cap for the longer side of a notification image.
pub const IMAGE_SIZE: u32 = 128;

/// Raw pixel buffer hints, in preference order.
pub const PIXEL_KEYS: [&str; 3] = ["image-data", "image_data", "icon_data"];

/// Path / icon-name hints, in preference order.
pub const PATH_KEYS: [&str; 3] = ["icon", "image-path", "image_path"];

/// Every hint consumed by image resolution.
pub const IMAGERY_KEYS: [&str; 6] = [
    "image-data",
    "image_data",
    "icon_data",
    "icon",
    "image-path",
    "image_path",
];

/// A renderable image handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    /// Decoded pixels, already capped to the configured size
    Pixels(RgbaImage),
    /// Icon name to look up in the icon theme
    Named(String),
}

impl Image {
    /// Pixel dimensions, when known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Image::Pixels(img) => Some(img.dimensions()),
            Image::Named(_) => None,
        }
    }
}

/// The `(iiibiiay)` pixel tuple from the notification protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelData {
    pub width: i64,
    pub height: i64,
    pub rowstride: i64,
    pub has_alpha: bool,
    pub bits_per_sample: i64,
    pub channels: i64,
    pub data: Vec<u8>,
}

impl PixelData {
    /// Read the tuple out of a normalized hint.
    pub fn from_hint(value: &HintValue) -> Result<Self, ImageError> {
        let fields = value
            .as_seq()
            .ok_or_else(|| ImageError::Malformed("expected a structure".into()))?;
        let [width, height, rowstride, has_alpha, bits, channels, data] = fields else {
            return Err(ImageError::Malformed(format!(
                "expected 7 fields, got {}",
                fields.len()
            )));
        };

        let int = |v: &HintValue, name: &str| {
            v.as_int()
                .ok_or_else(|| ImageError::Malformed(format!("{name} is not an integer")))
        };

        Ok(Self {
            width: int(width, "width")?,
            height: int(height, "height")?,
            rowstride: int(rowstride, "rowstride")?,
            has_alpha: has_alpha
                .as_bool()
                .ok_or_else(|| ImageError::Malformed("has_alpha is not a boolean".into()))?,
            bits_per_sample: int(bits, "bits_per_sample")?,
            channels: int(channels, "channels")?,
            data: data
                .as_bytes()
                .ok_or_else(|| ImageError::Malformed("data is not a byte array".into()))?
                .to_vec(),
        })
    }

    /// Convert to RGBA, honoring the row stride.
    pub fn to_rgba(&self) -> Result<RgbaImage, ImageError> {
        if self.bits_per_sample != 8 {
            return Err(ImageError::Unsupported(format!(
                "{} bits per sample",
                self.bits_per_sample
            )));
        }
        let expected_channels = if self.has_alpha { 4 } else { 3 };
        if self.channels != expected_channels {
            return Err(ImageError::Unsupported(format!(
                "{} channels with has_alpha={}",
                self.channels, self.has_alpha
            )));
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(ImageError::Malformed(format!(
                "dimensions {}x{}",
                self.width, self.height
            )));
        }

        let malformed = || {
            ImageError::Malformed(format!(
                "{}x{} image with rowstride {} does not fit in memory",
                self.width, self.height, self.rowstride
            ))
        };
        let (width, height) = (
            u32::try_from(self.width).map_err(|_| malformed())?,
            u32::try_from(self.height).map_err(|_| malformed())?,
        );
        let channels = self.channels as usize;
        let row_len = (width as usize)
            .checked_mul(channels)
            .ok_or_else(malformed)?;
        let stride = usize::try_from(self.rowstride).unwrap_or(0);
        if stride < row_len {
            return Err(ImageError::Malformed(format!(
                "rowstride {} shorter than row {}",
                self.rowstride, row_len
            )));
        }
        // Last row may omit its padding
        let needed = (height as usize - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(row_len))
            .ok_or_else(malformed)?;
        if self.data.len() < needed {
            return Err(ImageError::Malformed(format!(
                "{} bytes of pixel data, need {}",
                self.data.len(),
                needed
            )));
        }

        let mut img = RgbaImage::new(width, height);
        for y in 0..height {
            let start = y as usize * stride;
            let row = &self.data[start..start + row_len];
            for (x, px) in (0..width).zip(row.chunks_exact(channels)) {
                let alpha = if self.has_alpha { px[3] } else { 255 };
                img.put_pixel(x, y, Rgba([px[0], px[1], px[2], alpha]));
            }
        }
        Ok(img)
    }
}

/// Scale `img` down so its longer side is at most `cap`. Never scales up.
pub fn cap_size(img: RgbaImage, cap: u32) -> RgbaImage {
    let (width, height) = img.dimensions();
    let longest = width.max(height);
    if cap == 0 || longest <= cap {
        return img;
    }
    let factor = f64::from(cap) / f64::from(longest);
    let new_width = ((f64::from(width) * factor).round() as u32).max(1);
    let new_height = ((f64::from(height) * factor).round() as u32).max(1);
    image::imageops::resize(&img, new_width, new_height, FilterType::Triangle)
}

/// Resolve the image for a hint bag. `None` if no usable hint is present.
pub fn resolve(hints: &HintBag, cap: u32) -> Option<Image> {
    if let Some((key, value)) = PIXEL_KEYS
        .iter()
        .find_map(|&key| hints.get(key).map(|v| (key, v)))
    {
        return match PixelData::from_hint(value).and_then(|p| p.to_rgba()) {
            Ok(img) => Some(Image::Pixels(cap_size(img, cap))),
            Err(e) => {
                warn!("Ignoring {key} hint: {e}");
                None
            }
        };
    }

    for key in PATH_KEYS {
        let Some(value) = hints.get(key) else {
            continue;
        };
        let Some(icon) = value.as_str() else {
            warn!("Ignoring non-string {key} hint");
            continue;
        };

        if let Some(uri_path) = icon.strip_prefix("file://") {
            return load_uri(uri_path, cap)
                .map_err(|e| warn!("Ignoring {key} hint {icon:?}: {e}"))
                .ok();
        } else if icon.starts_with('/') {
            return load_file(Path::new(icon), cap)
                .map_err(|e| warn!("Ignoring {key} hint {icon:?}: {e}"))
                .ok();
        } else if !icon.is_empty() {
            debug!("Using themed icon {icon:?}");
            return Some(Image::Named(icon.to_string()));
        }
    }

    None
}

fn load_uri(encoded: &str, cap: u32) -> Result<Image, ImageError> {
    let path = urlencoding::decode(encoded).map_err(|e| ImageError::InvalidUri(e.to_string()))?;
    load_file(Path::new(path.as_ref()), cap)
}

fn load_file(path: &Path, cap: u32) -> Result<Image, ImageError> {
    let img = image::open(path)?.into_rgba8();
    Ok(Image::Pixels(cap_size(img, cap)))
}

/// Drop every imagery hint so the renderer only sees display hints.
pub fn strip_imagery(hints: &mut HintBag) {
    for key in IMAGERY_KEYS {
        hints.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel_hint(width: i64, height: i64, has_alpha: bool) -> HintValue {
        let channels = if has_alpha { 4 } else { 3 };
        let rowstride = width * channels;
        HintValue::Seq(vec![
            HintValue::Int(width),
            HintValue::Int(height),
            HintValue::Int(rowstride),
            HintValue::Bool(has_alpha),
            HintValue::Int(8),
            HintValue::Int(channels),
            HintValue::Bytes(vec![200; (rowstride * height) as usize]),
        ])
    }

    #[test]
    fn test_pixel_buffer_beats_icon_path() {
        let mut hints = HintBag::new();
        hints.insert("icon_data".into(), pixel_hint(4, 2, true));
        hints.insert("icon".into(), "/nonexistent/icon.png".into());

        let image = resolve(&hints, IMAGE_SIZE).unwrap();
        assert_eq!(image.dimensions(), Some((4, 2)));
    }

    #[test]
    fn test_pixel_key_preference() {
        let mut hints = HintBag::new();
        hints.insert("icon_data".into(), pixel_hint(2, 2, false));
        hints.insert("image-data".into(), pixel_hint(3, 1, false));

        assert_eq!(
            resolve(&hints, IMAGE_SIZE).and_then(|i| i.dimensions()),
            Some((3, 1))
        );
    }

    #[test]
    fn test_scales_down_preserving_aspect() {
        let mut hints = HintBag::new();
        hints.insert("image-data".into(), pixel_hint(256, 128, true));

        let image = resolve(&hints, 128).unwrap();
        assert_eq!(image.dimensions(), Some((128, 64)));
    }

    #[test]
    fn test_never_scales_up() {
        let img = RgbaImage::new(64, 32);
        assert_eq!(cap_size(img, 128).dimensions(), (64, 32));
    }

    #[test]
    fn test_rowstride_padding() {
        // 2x2 RGB with 2 bytes of padding per row
        let data = vec![
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        let pixels = PixelData {
            width: 2,
            height: 2,
            rowstride: 8,
            has_alpha: false,
            bits_per_sample: 8,
            channels: 3,
            data,
        };
        let img = pixels.to_rgba().unwrap();
        assert_eq!(*img.get_pixel(1, 0), Rgba([4, 5, 6, 255]));
        assert_eq!(*img.get_pixel(0, 1), Rgba([7, 8, 9, 255]));
    }

    #[test]
    fn test_malformed_pixels_yield_no_image() {
        let mut hints = HintBag::new();
        hints.insert(
            "image-data".into(),
            HintValue::Seq(vec![HintValue::Int(1), HintValue::Int(1)]),
        );
        hints.insert("icon".into(), "dialog-information".into());
        assert_eq!(resolve(&hints, IMAGE_SIZE), None);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let pixels = PixelData {
            width: 4,
            height: 4,
            rowstride: 16,
            has_alpha: true,
            bits_per_sample: 8,
            channels: 4,
            data: vec![0; 20],
        };
        assert!(matches!(pixels.to_rgba(), Err(ImageError::Malformed(_))));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        for (width, height, rowstride) in [
            (1, (1i64 << 62) + 1, 4),
            (i64::from(u32::MAX) + 1, 1, 4),
            (i64::from(u32::MAX), 4, i64::MAX),
        ] {
            let pixels = PixelData {
                width,
                height,
                rowstride,
                has_alpha: true,
                bits_per_sample: 8,
                channels: 4,
                data: vec![0; 4],
            };
            assert!(matches!(pixels.to_rgba(), Err(ImageError::Malformed(_))));
        }
    }

    #[test]
    fn test_huge_pixel_hint_yields_no_image() {
        let mut hints = HintBag::new();
        hints.insert(
            "image-data".into(),
            HintValue::Seq(vec![
                HintValue::Int(1),
                HintValue::Int((1 << 62) + 1),
                HintValue::Int(4),
                HintValue::Bool(true),
                HintValue::Int(8),
                HintValue::Int(4),
                HintValue::Bytes(vec![0; 4]),
            ]),
        );
        assert_eq!(resolve(&hints, IMAGE_SIZE), None);
    }

    #[test]
    fn test_icon_name() {
        let mut hints = HintBag::new();
        hints.insert("icon".into(), "mail-unread".into());
        assert_eq!(
            resolve(&hints, IMAGE_SIZE),
            Some(Image::Named("mail-unread".into()))
        );
    }

    #[test]
    fn test_empty_icon_falls_through_to_image_path() {
        let mut hints = HintBag::new();
        hints.insert("icon".into(), "".into());
        hints.insert("image-path".into(), "network-wireless".into());
        assert_eq!(
            resolve(&hints, IMAGE_SIZE),
            Some(Image::Named("network-wireless".into()))
        );
    }

    #[test]
    fn test_unreadable_file_yields_no_image() {
        let mut hints = HintBag::new();
        hints.insert("icon".into(), "file:///does/not/exist%20here.png".into());
        assert_eq!(resolve(&hints, IMAGE_SIZE), None);
    }

    #[test]
    fn test_file_uri_is_percent_decoded() {
        let dir = std::env::temp_dir().join(format!("oshirase-image-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("big icon.png");
        RgbaImage::new(300, 150).save(&path).unwrap();

        let uri = format!(
            "file://{}",
            path.to_str().unwrap().replace(' ', "%20")
        );
        let mut hints = HintBag::new();
        hints.insert("image_path".into(), uri.into());

        let image = resolve(&hints, 128);
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(image.and_then(|i| i.dimensions()), Some((128, 64)));
    }

    #[test]
    fn test_no_hints() {
        assert_eq!(resolve(&HintBag::new(), IMAGE_SIZE), None);
    }

    #[test]
    fn test_strip_imagery() {
        let mut hints = HintBag::new();
        hints.insert("icon".into(), "x".into());
        hints.insert("image-data".into(), pixel_hint(1, 1, false));
        hints.insert("category".into(), "im".into());
        strip_imagery(&mut hints);
        assert_eq!(hints.keys().collect::<Vec<_>>(), vec!["category"]);
    }
}
