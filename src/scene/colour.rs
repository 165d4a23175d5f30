/// An sRGB-encoded colour with components in `0.0..=1.0`.
///
/// Colours are authored the way they are written in CSS (`lightGray` is
/// `0xd3d3d3`) and converted to linear space before they reach a shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour::new(1.0, 1.0, 1.0);
    pub const BLACK: Colour = Colour::new(0.0, 0.0, 0.0);
    pub const LIGHT_GRAY: Colour = Colour::from_hex(0xd3d3d3);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Builds a colour from linear components, e.g. a glTF base colour factor.
    pub fn from_linear(linear: [f32; 3]) -> Self {
        Self::new(
            linear_to_srgb(linear[0]),
            linear_to_srgb(linear[1]),
            linear_to_srgb(linear[2]),
        )
    }

    pub fn to_linear(self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }

    pub fn scaled_linear(self, intensity: f32) -> [f32; 3] {
        let [r, g, b] = self.to_linear();
        [r * intensity, g * intensity, b * intensity]
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Clear colours are interpreted in linear space by sRGB surfaces.
impl From<Colour> for wgpu::Color {
    fn from(colour: Colour) -> Self {
        let [r, g, b] = colour.to_linear();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}
