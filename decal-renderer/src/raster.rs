//! Raster sources for image layers.
//!
//! The raster-source collaborator (file pickers, drag-and-drop) hands the
//! compositor decoded images; the helpers here cover the common delivery
//! forms, encoded bytes and base64 data URIs. Raster data is read-only
//! once constructed and shared across every render target.

use crate::error::{RenderError, RenderResult};

/// Decoded RGBA raster data, 4 bytes per pixel, row-major.
#[derive(Debug, Clone)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Construct from raw RGBA pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length does not match the
    /// dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> RenderResult<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(RenderError::Source(format!(
                "pixel buffer is {} bytes, expected {}",
                pixels.len(),
                width * height * 4
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an image from encoded bytes (PNG, JPEG, WebP, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded.
    pub fn from_bytes(data: &[u8]) -> RenderResult<Self> {
        let img = image::load_from_memory(data)
            .map_err(|e| RenderError::Source(format!("failed to decode image: {e}")))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Decode an image from a base64 data URI such as
    /// `data:image/png;base64,iVBORw0KGgo...`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is malformed or the payload cannot be
    /// decoded.
    pub fn from_data_uri(uri: &str) -> RenderResult<Self> {
        let payload = uri
            .strip_prefix("data:")
            .ok_or_else(|| RenderError::Source("not a data URI".to_string()))?;
        let (metadata, encoded) = payload
            .split_once(',')
            .ok_or_else(|| RenderError::Source("data URI has no payload".to_string()))?;
        if !metadata.contains(";base64") {
            return Err(RenderError::Source(
                "only base64 data URIs are supported".to_string(),
            ));
        }

        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| RenderError::Source(format!("invalid base64 payload: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// A solid-color raster.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize * 4);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A gray checkerboard raster, used as a placeholder for content that
    /// failed to load.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32) -> Self {
        let cell = 16;
        let mut pixels = Vec::with_capacity((width * height) as usize * 4);
        for y in 0..height {
            for x in 0..width {
                if ((x / cell) + (y / cell)) % 2 == 0 {
                    pixels.extend_from_slice(&[200, 200, 200, 255]);
                } else {
                    pixels.extend_from_slice(&[150, 150, 150, 255]);
                }
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The RGBA pixel at integer coordinates, clamped to the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let offset = (y * self.width as usize + x) * 4;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ]
    }

    /// Bilinear sample at fractional pixel coordinates, clamped at the
    /// edges. `x` and `y` are in source pixel units.
    #[must_use]
    pub fn sample(&self, x: f32, y: f32) -> [u8; 4] {
        let fx = (x - 0.5).max(0.0);
        let fy = (y - 0.5).max(0.0);
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x0, y0) = (x0 as u32, y0 as u32);
        let p00 = self.pixel(x0, y0);
        let p10 = self.pixel(x0 + 1, y0);
        let p01 = self.pixel(x0, y0 + 1);
        let p11 = self.pixel(x0 + 1, y0 + 1);

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = f32::from(p00[c]) * (1.0 - tx) + f32::from(p10[c]) * tx;
            let bottom = f32::from(p01[c]) * (1.0 - tx) + f32::from(p11[c]) * tx;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                out[c] = (top * (1.0 - ty) + bottom * ty).round() as u8;
            }
        }
        out
    }
}
