use crate::error::IconError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which billboard texture an icon draw uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IconKind {
    Light,
    Camera,
}

impl IconKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Light => "icon_light",
            Self::Camera => "icon_camera",
        }
    }
}

/// Decoded RGBA8 image, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

const PLACEHOLDER_SIZE: u32 = 32;

impl IconImage {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, IconError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(IconError::SizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Decode any format the `image` crate was built with (PNG, TGA).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IconError> {
        let decoded = image::open(path)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self {
            width,
            height,
            rgba: decoded.into_raw(),
        })
    }

    /// Generated stand-in: a sun-like disc for lights, a boxy body with a
    /// lens for cameras.
    pub fn placeholder(kind: IconKind) -> Self {
        let size = PLACEHOLDER_SIZE;
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        let c = (size as f32 - 1.0) / 2.0;
        for y in 0..size {
            for x in 0..size {
                let (dx, dy) = (x as f32 - c, y as f32 - c);
                let r = (dx * dx + dy * dy).sqrt();
                let pixel = match kind {
                    IconKind::Light => {
                        let on_ray = (dx.abs() < 1.0 || dy.abs() < 1.0 || (dx.abs() - dy.abs()).abs() < 1.0)
                            && r < c;
                        if r < c * 0.45 || on_ray {
                            [255, 220, 80, 255]
                        } else {
                            [0, 0, 0, 0]
                        }
                    }
                    IconKind::Camera => {
                        let body = dx.abs() < c * 0.8 && dy.abs() < c * 0.55;
                        let lens = r < c * 0.3;
                        if lens {
                            [40, 40, 40, 255]
                        } else if body {
                            [200, 200, 210, 255]
                        } else {
                            [0, 0, 0, 0]
                        }
                    }
                };
                rgba.extend_from_slice(&pixel);
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }

    /// Load `path` when given, falling back to the placeholder on any failure.
    pub fn load_or_placeholder(path: Option<&Path>, kind: IconKind) -> Self {
        let Some(path) = path else {
            return Self::placeholder(kind);
        };
        match Self::load(path) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(path = %path.display(), "icon load failed, using placeholder: {e}");
                Self::placeholder(kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_checks_length() {
        assert!(IconImage::from_rgba(2, 2, vec![0; 16]).is_ok());
        let err = IconImage::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            IconError::SizeMismatch {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn placeholders_differ_and_have_transparent_corners() {
        let light = IconImage::placeholder(IconKind::Light);
        let camera = IconImage::placeholder(IconKind::Camera);
        assert_eq!(light.rgba.len(), (light.width * light.height * 4) as usize);
        assert_ne!(light, camera);
        for image in [&light, &camera] {
            assert_eq!(image.rgba[3], 0, "top-left pixel should be transparent");
        }
    }

    #[test]
    fn missing_file_falls_back_to_placeholder() {
        let image = IconImage::load_or_placeholder(
            Some(Path::new("/nonexistent/icon.png")),
            IconKind::Camera,
        );
        assert_eq!(image, IconImage::placeholder(IconKind::Camera));
    }

    #[test]
    fn load_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let loaded = IconImage::load(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (4, 2));
        assert_eq!(&loaded.rgba[..4], &[10, 20, 30, 255]);
    }
}
