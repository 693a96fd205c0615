//! Drawing replication types.
//!
//! A stroke is shipped as a sequence of self-contained [`StrokeSegment`]s,
//! each carrying both endpoints and its own style, wrapped in a sequenced
//! [`StrokeFrame`] for the replication channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{RoundId, WireError};

/// Smallest brush width offered to local input.
pub const MIN_BRUSH_WIDTH: f32 = 1.0;

/// Largest brush width offered to local input.
pub const MAX_BRUSH_WIDTH: f32 = 20.0;

/// An opaque 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Canvas background.
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    /// Default ink.
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// The named colors of the drawing palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    /// `#000000`
    Black,
    /// `#FFFFFF`
    White,
    /// `#FF0000`
    Red,
    /// `#00FF00`
    Green,
    /// `#0000FF`
    Blue,
    /// `#FFFF00`
    Yellow,
    /// `#FF00FF`
    Magenta,
    /// `#00FFFF`
    Cyan,
    /// `#FFA500`
    Orange,
    /// `#800080`
    Purple,
    /// `#FFC0CB`
    Pink,
}

impl NamedColor {
    /// Every palette entry, in palette order.
    pub const ALL: [NamedColor; 11] = [
        NamedColor::Black,
        NamedColor::White,
        NamedColor::Red,
        NamedColor::Green,
        NamedColor::Blue,
        NamedColor::Yellow,
        NamedColor::Magenta,
        NamedColor::Cyan,
        NamedColor::Orange,
        NamedColor::Purple,
        NamedColor::Pink,
    ];

    /// The lowercase palette name.
    pub fn name(&self) -> &'static str {
        match self {
            NamedColor::Black => "black",
            NamedColor::White => "white",
            NamedColor::Red => "red",
            NamedColor::Green => "green",
            NamedColor::Blue => "blue",
            NamedColor::Yellow => "yellow",
            NamedColor::Magenta => "magenta",
            NamedColor::Cyan => "cyan",
            NamedColor::Orange => "orange",
            NamedColor::Purple => "purple",
            NamedColor::Pink => "pink",
        }
    }

    /// The color this name paints with.
    pub fn rgb(&self) -> Rgb {
        match self {
            NamedColor::Black => Rgb::BLACK,
            NamedColor::White => Rgb::WHITE,
            NamedColor::Red => Rgb::new(0xFF, 0x00, 0x00),
            NamedColor::Green => Rgb::new(0x00, 0xFF, 0x00),
            NamedColor::Blue => Rgb::new(0x00, 0x00, 0xFF),
            NamedColor::Yellow => Rgb::new(0xFF, 0xFF, 0x00),
            NamedColor::Magenta => Rgb::new(0xFF, 0x00, 0xFF),
            NamedColor::Cyan => Rgb::new(0x00, 0xFF, 0xFF),
            NamedColor::Orange => Rgb::new(0xFF, 0xA5, 0x00),
            NamedColor::Purple => Rgb::new(0x80, 0x00, 0x80),
            NamedColor::Pink => Rgb::new(0xFF, 0xC0, 0xCB),
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

/// Stroke color: either an explicit RGB value or a palette name.
///
/// On the wire this is always a string (`"#FF0000"` or `"red"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StrokeColor {
    /// Explicit `#RRGGBB` color
    Rgb(Rgb),
    /// Palette name
    Named(NamedColor),
}

impl StrokeColor {
    /// Resolve to the concrete color painted on the surface.
    pub fn rgb(&self) -> Rgb {
        match self {
            StrokeColor::Rgb(rgb) => *rgb,
            StrokeColor::Named(named) => named.rgb(),
        }
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        StrokeColor::Named(NamedColor::Black)
    }
}

impl FromStr for StrokeColor {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with('#') {
            return Rgb::from_hex(trimmed)
                .map(StrokeColor::Rgb)
                .ok_or_else(|| WireError::InvalidColor(s.to_string()));
        }
        NamedColor::from_name(trimmed)
            .map(StrokeColor::Named)
            .ok_or_else(|| WireError::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for StrokeColor {
    type Error = WireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StrokeColor> for String {
    fn from(color: StrokeColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for StrokeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrokeColor::Rgb(rgb) => write!(f, "{}", rgb),
            StrokeColor::Named(named) => f.write_str(named.name()),
        }
    }
}

/// How a segment composites onto the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeMode {
    /// Paint with the segment color.
    #[default]
    Paint,
    /// Replace with the white background at double width.
    Erase,
}

/// One straight piece of a freehand stroke.
///
/// Self-contained: it carries both endpoints and its full style, so a
/// receiver can apply it without knowing anything that came before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeSegment {
    /// Start X in surface pixels
    pub from_x: f32,
    /// Start Y in surface pixels
    pub from_y: f32,
    /// End X in surface pixels
    pub to_x: f32,
    /// End Y in surface pixels
    pub to_y: f32,
    /// Ink color (ignored when erasing)
    pub color: StrokeColor,
    /// Nominal brush width, > 0
    pub width: f32,
    /// Paint or erase
    pub mode: StrokeMode,
}

impl StrokeSegment {
    /// Check that every coordinate is finite and the width is positive.
    pub fn validate(&self) -> Result<(), WireError> {
        let coords = [self.from_x, self.from_y, self.to_x, self.to_y];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(WireError::InvalidSegment("non-finite coordinate".into()));
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(WireError::InvalidSegment(format!(
                "width must be positive, got {}",
                self.width
            )));
        }
        Ok(())
    }

    /// The color actually written to the surface.
    pub fn ink(&self) -> Rgb {
        match self.mode {
            StrokeMode::Paint => self.color.rgb(),
            StrokeMode::Erase => Rgb::WHITE,
        }
    }

    /// Rasterized width. Erasing covers twice the nominal width.
    pub fn effective_width(&self) -> f32 {
        match self.mode {
            StrokeMode::Paint => self.width,
            StrokeMode::Erase => self.width * 2.0,
        }
    }

    /// Start point.
    pub fn from_point(&self) -> (f32, f32) {
        (self.from_x, self.from_y)
    }

    /// End point.
    pub fn to_point(&self) -> (f32, f32) {
        (self.to_x, self.to_y)
    }
}

/// A single replicated canvas mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanvasEvent {
    /// Draw one segment
    Segment(StrokeSegment),
    /// Reset the surface to solid white
    Clear,
}

/// A canvas event wrapped for the replication channel.
///
/// `seq` is assigned by the drawer, starting at 1 for each round, and is
/// what receivers use to restore sending order and drop redeliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeFrame {
    /// Round the event belongs to
    pub round: RoundId,
    /// Drawer-assigned sequence number
    pub seq: u64,
    /// The mutation
    pub event: CanvasEvent,
}

impl StrokeFrame {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes, rejecting malformed segments.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let frame: Self = rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)?;
        frame.validate()?;
        Ok(frame)
    }

    /// Check the carried segment, if any.
    pub fn validate(&self) -> Result<(), WireError> {
        match &self.event {
            CanvasEvent::Segment(segment) => segment.validate(),
            CanvasEvent::Clear => Ok(()),
        }
    }
}
