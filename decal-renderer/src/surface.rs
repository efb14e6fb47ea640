//! Pixel render targets.
//!
//! The same layer state renders to an interactive display surface and to
//! one or more higher-resolution texture surfaces. The role decides
//! whether editing affordances (selection outline, resize handles) are
//! drawn: export surfaces must be pixel-identical to what the end consumer
//! sees.

use serde::{Deserialize, Serialize};

/// What a surface is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceRole {
    /// The on-screen editing surface; selection decoration is drawn here.
    Interactive,
    /// A texture/export surface consumed downstream; never decorated.
    Export,
}

/// An RGBA pixel buffer the compositor renders into.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    role: SurfaceRole,
    pixels: Vec<u8>,
}

impl PixelSurface {
    /// Create a surface of the given pixel size.
    ///
    /// Dimensions must be positive; a zero dimension is a caller contract
    /// violation.
    #[must_use]
    pub fn new(width: u32, height: u32, role: SurfaceRole) -> Self {
        assert!(width > 0 && height > 0, "surface dimensions must be positive");
        Self {
            width,
            height,
            role,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
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

    /// The surface's role.
    #[must_use]
    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    /// Raw RGBA bytes, row-major.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Fill the whole surface with one color.
    pub fn clear(&mut self, rgba: [u8; 4]) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&rgba);
        }
    }

    /// The pixel at the given coordinates. Out-of-bounds reads return
    /// transparent black.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let offset = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ]
    }

    /// Overwrite the pixel at the given coordinates. Out-of-bounds writes
    /// are discarded.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        self.pixels[offset..offset + 4].copy_from_slice(&rgba);
    }

    /// Source-over blend `rgba` onto the pixel at the given coordinates,
    /// with an extra `opacity` multiplier on the source alpha.
    pub fn blend_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4], opacity: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let alpha = (f32::from(rgba[3]) / 255.0) * opacity.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let dest = self.pixel(x, y);
        let mut out = [0u8; 4];
        for c in 0..3 {
            let blended = f32::from(rgba[c]) * alpha + f32::from(dest[c]) * (1.0 - alpha);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                out[c] = blended.round().min(255.0) as u8;
            }
        }
        let dest_alpha = f32::from(dest[3]) / 255.0;
        let out_alpha = alpha + dest_alpha * (1.0 - alpha);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            out[3] = (out_alpha * 255.0).round().min(255.0) as u8;
        }
        self.set_pixel(x, y, out);
    }
}
