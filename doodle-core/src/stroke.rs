//! Local stroke capture.
//!
//! [`StrokeCanvas`] turns pointer input into [`StrokeSegment`]s. Each
//! segment is applied to the local surface immediately and handed back to
//! the caller for replication. Remote segments go through
//! [`StrokeCanvas::apply_remote_segment`] and never disturb the local
//! stroke anchor.

use doodle_types::{
    CanvasEvent, StrokeColor, StrokeMode, StrokeSegment, MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH,
};

use crate::surface::ReplaySurface;

/// Brush settings captured into every emitted segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushStyle {
    /// Ink color
    pub color: StrokeColor,
    /// Nominal width in pixels
    pub width: f32,
    /// Paint or erase
    pub mode: StrokeMode,
}

impl BrushStyle {
    /// Default brush width.
    pub const DEFAULT_WIDTH: f32 = 5.0;

    /// Brush with the given color and width in paint mode.
    pub fn new(color: StrokeColor, width: f32) -> Self {
        Self {
            color,
            width,
            mode: StrokeMode::Paint,
        }
    }

    /// Eraser of the given nominal width.
    pub fn eraser(width: f32) -> Self {
        Self {
            color: StrokeColor::default(),
            width,
            mode: StrokeMode::Erase,
        }
    }

    /// Width limited to the supported brush range.
    pub fn clamped_width(&self) -> f32 {
        if self.width.is_nan() {
            return Self::DEFAULT_WIDTH;
        }
        self.width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH)
    }
}

impl Default for BrushStyle {
    fn default() -> Self {
        Self::new(StrokeColor::default(), Self::DEFAULT_WIDTH)
    }
}

/// Drawing surface plus the in-progress local stroke.
#[derive(Debug, Clone)]
pub struct StrokeCanvas {
    surface: ReplaySurface,
    anchor: Option<(f32, f32)>,
}

impl StrokeCanvas {
    /// Wrap a surface with no stroke in progress.
    pub fn new(surface: ReplaySurface) -> Self {
        Self {
            surface,
            anchor: None,
        }
    }

    /// The backing surface.
    pub fn surface(&self) -> &ReplaySurface {
        &self.surface
    }

    /// Whether a local stroke is in progress.
    pub fn is_stroking(&self) -> bool {
        self.anchor.is_some()
    }

    /// Pointer down: remember the position, draw nothing.
    pub fn begin_stroke(&mut self, x: f32, y: f32) {
        self.anchor = Some((x, y));
    }

    /// Pointer move while drawing.
    ///
    /// Returns the segment from the previous position to `(x, y)`, already
    /// applied locally. Returns `None` when no stroke is in progress.
    pub fn extend_stroke(&mut self, x: f32, y: f32, style: &BrushStyle) -> Option<StrokeSegment> {
        let (from_x, from_y) = self.anchor?;
        let segment = StrokeSegment {
            from_x,
            from_y,
            to_x: x,
            to_y: y,
            color: style.color,
            width: style.clamped_width(),
            mode: style.mode,
        };
        self.surface.apply(&segment);
        self.anchor = Some((x, y));
        Some(segment)
    }

    /// Pointer up or leave.
    pub fn end_stroke(&mut self) {
        self.anchor = None;
    }

    /// Apply a segment received from another participant.
    ///
    /// Malformed segments (non-finite coordinates, non-positive width) are
    /// ignored.
    pub fn apply_remote_segment(&mut self, segment: &StrokeSegment) {
        if segment.validate().is_err() {
            return;
        }
        self.surface.apply(segment);
    }

    /// Fill the surface with white.
    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Apply a replicated canvas event.
    pub fn apply_event(&mut self, event: &CanvasEvent) {
        match event {
            CanvasEvent::Segment(segment) => self.apply_remote_segment(segment),
            CanvasEvent::Clear => self.clear(),
        }
    }

    /// Blank surface and no stroke in progress, used at round boundaries.
    pub fn reset(&mut self) {
        self.surface.clear();
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doodle_types::{NamedColor, Rgb};

    fn canvas() -> StrokeCanvas {
        StrokeCanvas::new(ReplaySurface::new(100, 100).unwrap())
    }

    #[test]
    fn move_without_begin_is_ignored() {
        let mut canvas = canvas();
        assert!(canvas
            .extend_stroke(10.0, 10.0, &BrushStyle::default())
            .is_none());
        assert!(canvas.surface().is_blank());
    }

    #[test]
    fn stroke_emits_connected_segments() {
        let mut canvas = canvas();
        let style = BrushStyle::new(StrokeColor::Named(NamedColor::Red), 3.0);

        canvas.begin_stroke(10.0, 10.0);
        let first = canvas.extend_stroke(20.0, 10.0, &style).unwrap();
        let second = canvas.extend_stroke(20.0, 30.0, &style).unwrap();
        canvas.end_stroke();

        assert_eq!(first.from_point(), (10.0, 10.0));
        assert_eq!(first.to_point(), (20.0, 10.0));
        assert_eq!(second.from_point(), (20.0, 10.0));
        assert_eq!(second.to_point(), (20.0, 30.0));
        assert_eq!(canvas.surface().pixel(15, 10), Some(NamedColor::Red.rgb()));
        assert!(!canvas.is_stroking());
        assert!(canvas.extend_stroke(50.0, 50.0, &style).is_none());
    }

    #[test]
    fn width_is_clamped() {
        let mut canvas = canvas();
        canvas.begin_stroke(0.0, 0.0);

        let thick = BrushStyle::new(StrokeColor::default(), 500.0);
        let seg = canvas.extend_stroke(5.0, 5.0, &thick).unwrap();
        assert_eq!(seg.width, MAX_BRUSH_WIDTH);

        let thin = BrushStyle::new(StrokeColor::default(), 0.0);
        let seg = canvas.extend_stroke(6.0, 6.0, &thin).unwrap();
        assert_eq!(seg.width, MIN_BRUSH_WIDTH);
    }

    #[test]
    fn remote_segment_keeps_local_anchor() {
        let mut local = canvas();
        let style = BrushStyle::default();
        local.begin_stroke(10.0, 10.0);

        let remote = StrokeSegment {
            from_x: 80.0,
            from_y: 80.0,
            to_x: 90.0,
            to_y: 90.0,
            color: StrokeColor::Named(NamedColor::Green),
            width: 4.0,
            mode: StrokeMode::Paint,
        };
        local.apply_remote_segment(&remote);

        let next = local.extend_stroke(12.0, 10.0, &style).unwrap();
        assert_eq!(next.from_point(), (10.0, 10.0));
        assert_eq!(local.surface().pixel(85, 85), Some(NamedColor::Green.rgb()));
    }

    #[test]
    fn malformed_remote_segments_are_ignored() {
        let mut canvas = canvas();
        for (to_x, width) in [(20.0, f32::INFINITY), (20.0, -2.0), (f32::NAN, 4.0)] {
            canvas.apply_remote_segment(&StrokeSegment {
                from_x: 0.0,
                from_y: 0.0,
                to_x,
                to_y: 20.0,
                color: StrokeColor::Named(NamedColor::Red),
                width,
                mode: StrokeMode::Paint,
            });
        }
        assert!(canvas.surface().is_blank());
    }

    #[test]
    fn replayed_segments_match_the_drawer() {
        let mut drawer = canvas();
        let mut observer = canvas();
        let style = BrushStyle::new(StrokeColor::Named(NamedColor::Purple), 7.0);

        drawer.begin_stroke(5.0, 5.0);
        let mut sent = Vec::new();
        for (x, y) in [(20.0, 15.0), (40.0, 60.0), (90.0, 70.0)] {
            sent.push(drawer.extend_stroke(x, y, &style).unwrap());
        }
        drawer.end_stroke();
        drawer.begin_stroke(50.0, 50.0);
        sent.extend(drawer.extend_stroke(50.0, 50.0, &BrushStyle::eraser(6.0)));

        for segment in &sent {
            observer.apply_event(&CanvasEvent::Segment(segment.clone()));
        }

        assert_eq!(drawer.surface(), observer.surface());
        assert_eq!(drawer.surface().checksum(), observer.surface().checksum());
    }

    #[test]
    fn reset_clears_pixels_and_anchor() {
        let mut canvas = canvas();
        canvas.begin_stroke(0.0, 0.0);
        canvas.extend_stroke(50.0, 50.0, &BrushStyle::default());

        canvas.reset();
        assert!(canvas.surface().is_blank());
        assert!(!canvas.is_stroking());
        assert_eq!(canvas.surface().pixel(25, 25), Some(Rgb::WHITE));
    }
}
