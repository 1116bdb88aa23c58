//! Look of the background scene: camera, fog, point material and bloom.

use glam::{Mat4, Vec3};

/// `0xRRGGBB` to linear-ish `[r, g, b]` in `0..=1`.
pub fn hex_rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0)]
}

/// Exponential-squared fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub density: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: hex_rgb(0x050510),
            density: 0.002,
        }
    }
}

impl Fog {
    /// Fraction of fog colour mixed in at `depth` view-space units.
    pub fn factor(&self, depth: f32) -> f32 {
        let d = self.density * depth;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

/// Round additive sprite used for every point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMaterial {
    pub color: [f32; 3],
    /// World-space size; attenuated by distance.
    pub size: f32,
    pub opacity: f32,
}

impl Default for PointMaterial {
    fn default() -> Self {
        Self {
            color: hex_rgb(0x00f2ff),
            size: 0.7,
            opacity: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    /// Luminance below which nothing glows.
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            strength: 1.5,
            radius: 0.0,
            threshold: 0.0,
        }
    }
}

/// CSS size of the window plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub css_width: f64,
    pub css_height: f64,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(css_width: f64, css_height: f64, pixel_ratio: f64) -> Self {
        Self {
            css_width: css_width.max(1.0),
            css_height: css_height.max(1.0),
            pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 },
        }
    }

    pub fn aspect(&self) -> f32 {
        (self.css_width / self.css_height) as f32
    }

    /// Drawing-buffer size in device pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.css_width * self.pixel_ratio).round().max(1.0) as u32,
            (self.css_height * self.pixel_ratio).round().max(1.0) as u32,
        )
    }
}

/// Perspective camera sitting just in front of the origin, pitched to look
/// straight up through the falling points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub pitch: f32,
}

impl CameraRig {
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_y_degrees: 60.0,
            aspect,
            near: 1.0,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 1.0),
            pitch: std::f32::consts::FRAC_PI_2,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        (Mat4::from_translation(self.position) * Mat4::from_rotation_x(self.pitch)).inverse()
    }

    /// Model-view for a field rotated by `rotation_y` about the vertical axis.
    pub fn model_view(&self, rotation_y: f32) -> Mat4 {
        self.view() * Mat4::from_rotation_y(rotation_y)
    }

    /// Scale that turns a world size into pixels at unit depth, for a buffer
    /// `buffer_height` pixels tall.
    pub fn point_scale(&self, buffer_height: u32) -> f32 {
        buffer_height as f32 * 0.5
    }
}
