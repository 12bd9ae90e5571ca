use crate::foundation::error::{SceneError, SceneResult};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Canvas with both dimensions non-zero.
    pub fn new(width: u32, height: u32) -> SceneResult<Self> {
        if width == 0 || height == 0 {
            return Err(SceneError::validation("canvas width and height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// `width * height`.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// One of the three stage positions a character can occupy.
///
/// Ordering follows paint/iteration order: left, center, right.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Left third of the stage.
    Left,
    /// Middle of the stage.
    Center,
    /// Right third of the stage.
    Right,
}

impl Slot {
    /// All slots in left-center-right order.
    pub const ALL: [Slot; 3] = [Slot::Left, Slot::Center, Slot::Right];

    /// Lowercase name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Left => "left",
            Slot::Center => "center",
            Slot::Right => "right",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Straight (non-premultiplied) RGBA8 colour, as written in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8(pub [u8; 4]);

impl Rgba8 {
    /// Fully opaque colour.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Premultiplied pixel for this colour.
    pub fn to_premul(self) -> [u8; 4] {
        let [r, g, b, a] = self.0;
        let a16 = u16::from(a);
        let premul = |c: u8| (((u16::from(c) * a16) + 127) / 255) as u8;
        [premul(r), premul(g), premul(b), a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
