//! # Drawing
//!
//! Turns a [`Tool`] invocation into a [`Command`]. Nothing here mutates a buffer: the engine draws
//! onto a snapshot of the affected region, and the caller decides whether to commit the result.

pub mod blur;

use crate::{
    buffer::PixelBuffer,
    color::Color,
    commands::{capture, Command},
    raster::{self, Brush, Coverage},
    text::{self, FontDescriptor, HorizontalAlign},
    util::{Point, Rect},
};
pub use blur::BlurKind;

/// One use of an editing tool, with everything needed to reproduce it.
#[derive(Clone, Debug, PartialEq, Eq, strum::AsRefStr, serde::Serialize, serde::Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum Tool {
    /// Freehand stroke through every point in order.
    Pen {
        points: Vec<Point>,
        width: u32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        width: u32,
        color: Color,
    },
    /// Axis-aligned rectangle between two corners, given in any order.
    Rectangle {
        top_left: Point,
        bottom_right: Point,
        #[serde(default)]
        filled: bool,
        width: u32,
        color: Color,
    },
    /// Ellipse inscribed in `bounds`.
    Ellipse {
        bounds: Rect,
        #[serde(default)]
        filled: bool,
        width: u32,
        color: Color,
    },
    /// Text with the baseline of its first line starting at `position`.
    Text {
        position: Point,
        text: String,
        #[serde(default)]
        font: FontDescriptor,
        size: u32,
        color: Color,
    },
    Blur {
        region: Rect,
        #[serde(default)]
        kind: BlurKind,
        radius: u32,
    },
}
impl Tool {
    /// Short human-readable name, used as the history label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.as_ref()
    }
}

/// A round brush of `width`, no wider than any brush that can still change the canvas differently.
///
/// Past twice the longest side, every on-canvas stamp covers the whole canvas.
fn brush_for(canvas: Rect, width: u32) -> Brush {
    let limit = canvas
        .width
        .max(canvas.height)
        .saturating_mul(2)
        .saturating_add(1);
    Brush::round(width.min(limit))
}

/// Stateless converter from tools to commands.
pub struct DrawingEngine;
impl DrawingEngine {
    /// Produce the edit `tool` would make to `buffer`.
    ///
    /// `None` if no on-canvas pixel would change: the shape lies fully outside the canvas, the text is
    /// empty, the color is fully transparent, or the blur region is too small.
    #[must_use]
    pub fn command(buffer: &PixelBuffer, tool: &Tool) -> Option<Command> {
        let canvas = buffer.rect();
        let (coverage, color) = match tool {
            Tool::Blur {
                region,
                kind,
                radius,
            } => {
                let (region, after) = blur::blur_region(buffer, *region, *kind, *radius)?;
                let (_, before) = buffer.extract(region)?;
                return Command::new(tool.label(), region, before, after);
            }
            Tool::Pen {
                points,
                width,
                color,
            } => {
                let brush = brush_for(canvas, *width);
                let bounds = points
                    .iter()
                    .map(|p| Rect::from_corners(*p, *p))
                    .fold(Rect::default(), |acc, r| acc.union(&r));
                let mut coverage = Coverage::new(bounds.inflate(brush.reach()).intersect(&canvas));
                brush.polyline(&mut coverage, points);
                (coverage, *color)
            }
            Tool::Line {
                from,
                to,
                width,
                color,
            } => {
                let brush = brush_for(canvas, *width);
                let bounds = Rect::from_corners(*from, *to).inflate(brush.reach());
                let mut coverage = Coverage::new(bounds.intersect(&canvas));
                brush.line(&mut coverage, *from, *to);
                (coverage, *color)
            }
            Tool::Rectangle {
                top_left,
                bottom_right,
                filled,
                width,
                color,
            } => {
                let brush = brush_for(canvas, *width);
                let rect = Rect::from_corners(*top_left, *bottom_right);
                let mut coverage = Coverage::new(rect.inflate(brush.reach()).intersect(&canvas));
                if *filled {
                    raster::fill_rect(&mut coverage, rect);
                }
                brush.rect_outline(&mut coverage, rect);
                (coverage, *color)
            }
            Tool::Ellipse {
                bounds,
                filled,
                width,
                color,
            } => {
                let brush = brush_for(canvas, *width);
                let mut coverage =
                    Coverage::new(bounds.inflate(brush.reach()).intersect(&canvas));
                if *filled {
                    raster::fill_ellipse(&mut coverage, *bounds);
                }
                brush.ellipse_outline(&mut coverage, *bounds);
                (coverage, *color)
            }
            Tool::Text {
                position,
                text,
                font,
                size,
                color,
            } => {
                let layout = text::layout(text, font, *size, HorizontalAlign::Left);
                let mut coverage = layout.coverage;
                coverage.translate(
                    position.x,
                    position.y.saturating_sub(az::saturating_cast(layout.ascent)),
                );
                (coverage, *color)
            }
        };
        Self::paint(buffer, tool.label(), &coverage, color)
    }
    /// Composite `color` through `coverage` onto a snapshot, as a command.
    fn paint(buffer: &PixelBuffer, label: &str, coverage: &Coverage, color: Color) -> Option<Command> {
        if color.a() == 0 {
            return None;
        }
        let ink = coverage.ink_bounds();
        if ink.is_empty() {
            return None;
        }
        capture(buffer, ink, label, |scratch, origin| {
            // The scratch buffer starts at `origin` in buffer space.
            let mut local = coverage.clone();
            local.translate(-origin.x, -origin.y);
            scratch.composite_coverage(&local, color);
        })
    }
}

#[cfg(test)]
mod test {
    use super::{BlurKind, DrawingEngine, Tool};
    use crate::{
        buffer::{ChannelFormat, PixelBuffer},
        color::Color,
        commands::{CommandConsumer, DoUndo},
        text::FontDescriptor,
        util::{Point, Rect},
    };
    fn canvas() -> PixelBuffer {
        PixelBuffer::create(20, 20, ChannelFormat::Rgb, Color::WHITE).unwrap()
    }
    fn apply(buffer: &mut PixelBuffer, tool: &Tool) -> bool {
        match DrawingEngine::command(buffer, tool) {
            Some(command) => {
                buffer.apply(DoUndo::Do(&command)).unwrap();
                true
            }
            None => false,
        }
    }
    fn ink(buffer: &PixelBuffer) -> usize {
        buffer
            .as_bytes()
            .chunks_exact(3)
            .filter(|px| px != &[255, 255, 255])
            .count()
    }
    #[test]
    fn single_point_pen_is_one_pixel() {
        let mut buffer = canvas();
        let pen = Tool::Pen {
            points: vec![Point::new(4, 7)],
            width: 1,
            color: Color::BLACK,
        };
        assert!(apply(&mut buffer, &pen));
        assert_eq!(ink(&buffer), 1);
        assert_eq!(buffer.get(4, 7), Ok(Color::BLACK));
    }
    #[test]
    fn command_region_is_tight() {
        let buffer = canvas();
        let line = Tool::Line {
            from: Point::new(2, 3),
            to: Point::new(10, 3),
            width: 3,
            color: Color::BLACK,
        };
        let command = DrawingEngine::command(&buffer, &line).unwrap();
        assert_eq!(command.region(), Rect::new(1, 2, 11, 3));
        assert_eq!(command.label(), "line");
    }
    #[test]
    fn translucent_overlap_blends_once() {
        let mut buffer = canvas();
        // Heavily overlapping stamps along a short stroke.
        let pen = Tool::Pen {
            points: vec![Point::new(5, 5), Point::new(6, 5), Point::new(5, 5)],
            width: 5,
            color: Color::new(0, 0, 0, 128),
        };
        apply(&mut buffer, &pen);
        assert_eq!(buffer.get(5, 5), Ok(Color::rgb(127, 127, 127)));
        assert_eq!(buffer.get(6, 6), Ok(Color::rgb(127, 127, 127)));
    }
    #[test]
    fn offscreen_shapes_are_none() {
        let buffer = canvas();
        let tools = [
            Tool::Line {
                from: Point::new(-50, -50),
                to: Point::new(-10, -40),
                width: 4,
                color: Color::BLACK,
            },
            Tool::Rectangle {
                top_left: Point::new(30, 30),
                bottom_right: Point::new(40, 40),
                filled: true,
                width: 1,
                color: Color::BLACK,
            },
            Tool::Text {
                position: Point::new(3, 10),
                text: String::new(),
                font: FontDescriptor::Builtin,
                size: 8,
                color: Color::BLACK,
            },
            Tool::Pen {
                points: vec![Point::new(3, 3)],
                width: 2,
                color: Color::TRANSPARENT,
            },
        ];
        for tool in &tools {
            assert!(DrawingEngine::command(&buffer, tool).is_none(), "{tool:?}");
        }
    }
    #[test]
    fn rectangle_corner_order() {
        let a = Tool::Rectangle {
            top_left: Point::new(12, 14),
            bottom_right: Point::new(3, 2),
            filled: false,
            width: 1,
            color: Color::BLACK,
        };
        let b = Tool::Rectangle {
            top_left: Point::new(3, 2),
            bottom_right: Point::new(12, 14),
            filled: false,
            width: 1,
            color: Color::BLACK,
        };
        let buffer = canvas();
        assert_eq!(
            DrawingEngine::command(&buffer, &a),
            DrawingEngine::command(&buffer, &b)
        );
    }
    #[test]
    fn filled_shapes_cover_interior() {
        let mut buffer = canvas();
        apply(
            &mut buffer,
            &Tool::Ellipse {
                bounds: Rect::new(2, 2, 11, 9),
                filled: true,
                width: 1,
                color: Color::BLACK,
            },
        );
        assert_eq!(buffer.get(7, 6), Ok(Color::BLACK));
        assert_eq!(buffer.get(2, 2), Ok(Color::WHITE));
        let mut outline = canvas();
        apply(
            &mut outline,
            &Tool::Ellipse {
                bounds: Rect::new(2, 2, 11, 9),
                filled: false,
                width: 1,
                color: Color::BLACK,
            },
        );
        assert_eq!(outline.get(7, 6), Ok(Color::WHITE));
        assert_eq!(outline.get(7, 2), Ok(Color::BLACK));
    }
    #[test]
    fn builtin_text_at_baseline() {
        let mut buffer = canvas();
        apply(
            &mut buffer,
            &Tool::Text {
                position: Point::new(1, 10),
                text: "I".into(),
                font: FontDescriptor::Builtin,
                size: 8,
                color: Color::BLACK,
            },
        );
        // 'I' stem is column 2, rows 0..7 above the baseline.
        assert_eq!(buffer.get(3, 3), Ok(Color::BLACK));
        assert_eq!(buffer.get(3, 9), Ok(Color::BLACK));
        assert_eq!(buffer.get(3, 10), Ok(Color::WHITE));
        assert_eq!(buffer.get(3, 2), Ok(Color::WHITE));
    }
    #[test]
    fn outline_text_at_baseline() {
        let font = FontDescriptor::family("sans-serif");
        if crate::repositories::fonts::faces().load(&font).is_err() {
            return;
        }
        let mut buffer = canvas();
        apply(
            &mut buffer,
            &Tool::Text {
                position: Point::new(2, 16),
                text: "H".into(),
                font,
                size: 12,
                color: Color::BLACK,
            },
        );
        let inked = |y: i64| (0..20).any(|x| buffer.get(x, y) != Ok(Color::WHITE));
        // 'H' sits on the baseline and has no descender.
        assert!(inked(15));
        assert!(inked(10));
        assert!(!inked(16));
        assert!(!inked(2));
    }
    #[test]
    fn blur_tool_roundtrips() {
        let mut buffer = canvas();
        buffer.set(8, 8, Color::BLACK).unwrap();
        let original = buffer.clone();
        let blur = Tool::Blur {
            region: Rect::new(4, 4, 8, 8),
            kind: BlurKind::Gaussian,
            radius: 2,
        };
        let command = DrawingEngine::command(&buffer, &blur).unwrap();
        buffer.apply(DoUndo::Do(&command)).unwrap();
        assert_ne!(buffer.get(8, 8), Ok(Color::BLACK));
        assert_eq!(buffer.get(0, 0), Ok(Color::WHITE));
        buffer.apply(DoUndo::Undo(&command)).unwrap();
        assert_eq!(buffer, original);
    }
    #[test]
    fn tool_from_toml() {
        let tool: Tool = toml::from_str(
            r##"
            tool = "line"
            from = { x = 1, y = 2 }
            to = { x = 5, y = 2 }
            width = 2
            color = "#FF0000"
            "##,
        )
        .unwrap();
        assert_eq!(
            tool,
            Tool::Line {
                from: Point::new(1, 2),
                to: Point::new(5, 2),
                width: 2,
                color: Color::rgb(255, 0, 0),
            }
        );
    }
}
