//! Shaping and scanline filling of TrueType/OpenType outlines.

use rustybuzz::ttf_parser;

use super::{HorizontalAlign, TextLayout};
use crate::{raster::Coverage, util::Rect};

/// Vertical samples per pixel row.
const SUBSAMPLES: u32 = 4;

/// A straight edge of a flattened outline, in pixel space (+Y down).
#[derive(Copy, Clone, Debug)]
struct Edge {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

/// Collects glyph outlines as flattened edges, transformed from font units into pixel space.
struct Flattener {
    edges: Vec<Edge>,
    scale: f32,
    /// Pixel position of the glyph origin.
    origin: [f32; 2],
    start: [f32; 2],
    current: [f32; 2],
}
impl Flattener {
    fn new(scale: f32) -> Self {
        Self {
            edges: Vec::new(),
            scale,
            origin: [0.0; 2],
            start: [0.0; 2],
            current: [0.0; 2],
        }
    }
    fn transform(&self, x: f32, y: f32) -> [f32; 2] {
        // Font Y is up.
        [
            self.origin[0] + x * self.scale,
            self.origin[1] - y * self.scale,
        ]
    }
    fn push_line(&mut self, to: [f32; 2]) {
        let from = self.current;
        if from[1] != to[1] {
            self.edges.push(Edge {
                x0: from[0],
                y0: from[1],
                x1: to[0],
                y1: to[1],
            });
        }
        self.current = to;
    }
    /// Number of line segments for a curve with the given control polygon length.
    fn steps(polygon_len: f32) -> u32 {
        az::saturating_cast::<f32, u32>((polygon_len / 2.0).sqrt().ceil() * 2.0).clamp(1, 64)
    }
    fn bounds(&self) -> Option<Rect> {
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        for edge in &self.edges {
            min[0] = min[0].min(edge.x0).min(edge.x1);
            min[1] = min[1].min(edge.y0).min(edge.y1);
            max[0] = max[0].max(edge.x0).max(edge.x1);
            max[1] = max[1].max(edge.y0).max(edge.y1);
        }
        (min[0] <= max[0]).then(|| {
            Rect::from_edges(
                az::saturating_cast(min[0].floor()),
                az::saturating_cast(min[1].floor()),
                az::saturating_cast(max[0].ceil()),
                az::saturating_cast(max[1].ceil()),
            )
        })
    }
}
fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}
impl ttf_parser::OutlineBuilder for Flattener {
    fn move_to(&mut self, x: f32, y: f32) {
        let point = self.transform(x, y);
        self.start = point;
        self.current = point;
    }
    fn line_to(&mut self, x: f32, y: f32) {
        let to = self.transform(x, y);
        self.push_line(to);
    }
    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let p0 = self.current;
        let p1 = self.transform(x1, y1);
        let p2 = self.transform(x, y);
        let steps = Self::steps(distance(p0, p1) + distance(p1, p2));
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            let mt = 1.0 - t;
            let point = [0, 1].map(|c| mt * mt * p0[c] + 2.0 * mt * t * p1[c] + t * t * p2[c]);
            self.push_line(point);
        }
    }
    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.current;
        let p1 = self.transform(x1, y1);
        let p2 = self.transform(x2, y2);
        let p3 = self.transform(x, y);
        let steps = Self::steps(distance(p0, p1) + distance(p1, p2) + distance(p2, p3));
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            let mt = 1.0 - t;
            let point = [0, 1].map(|c| {
                mt * mt * mt * p0[c]
                    + 3.0 * mt * mt * t * p1[c]
                    + 3.0 * mt * t * t * p2[c]
                    + t * t * t * p3[c]
            });
            self.push_line(point);
        }
    }
    fn close(&mut self) {
        let start = self.start;
        self.push_line(start);
    }
}

/// Nonzero-winding fill of `edges` into `coverage`.
///
/// Each pixel row is sampled at [`SUBSAMPLES`] heights, horizontal coverage within a sample is exact.
fn fill(edges: &[Edge], coverage: &mut Coverage) {
    let rect = coverage.rect();
    let left = rect.left() as f32;
    let width = rect.width as usize;
    let mut accum = vec![0.0f32; width];
    let mut crossings = smallvec::SmallVec::<[(f32, i32); 16]>::new();
    let weight = 1.0 / SUBSAMPLES as f32;
    for row in 0..rect.height {
        accum.iter_mut().for_each(|a| *a = 0.0);
        for sample in 0..SUBSAMPLES {
            let y = rect.top() as f32 + row as f32 + (sample as f32 + 0.5) * weight;
            crossings.clear();
            for edge in edges {
                let (top, bottom, dir) = if edge.y0 < edge.y1 {
                    (edge.y0, edge.y1, 1)
                } else {
                    (edge.y1, edge.y0, -1)
                };
                if y < top || y >= bottom {
                    continue;
                }
                let t = (y - edge.y0) / (edge.y1 - edge.y0);
                crossings.push((edge.x0 + t * (edge.x1 - edge.x0), dir));
            }
            crossings.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding != 0 {
                    add_span(&mut accum, pair[0].0 - left, pair[1].0 - left, weight);
                }
            }
        }
        for (out, a) in coverage.row_mut(row).iter_mut().zip(&accum) {
            *out = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    }
}
/// Add exact coverage of the span `[from, to)` to a row, in row-relative pixels.
fn add_span(accum: &mut [f32], from: f32, to: f32, weight: f32) {
    let from = from.max(0.0);
    let to = to.min(accum.len() as f32);
    if from >= to {
        return;
    }
    let first = from.floor() as usize;
    let last = (to.ceil() as usize).min(accum.len());
    for (i, a) in accum.iter_mut().enumerate().take(last).skip(first) {
        let cell_left = i as f32;
        let overlap = to.min(cell_left + 1.0) - from.max(cell_left);
        if overlap > 0.0 {
            *a += overlap * weight;
        }
    }
}

/// Shape and fill `lines` with the face in `data`. `None` if the face cannot be parsed.
pub(super) fn layout(
    data: &[u8],
    index: u32,
    lines: &[&str],
    size: u32,
    align: HorizontalAlign,
) -> Option<TextLayout> {
    let face = rustybuzz::Face::from_slice(data, index)?;
    let units = face.units_per_em().max(1) as f32;
    let scale = size.max(1) as f32 / units;
    let ascent = f32::from(face.ascender()) * scale;
    let descent = f32::from(face.descender()) * scale;
    let gap = f32::from(face.line_gap()) * scale;
    let line_height: u32 = az::saturating_cast((ascent - descent + gap).ceil());
    let line_height = line_height.max(1);
    let ascent_px: u32 = az::saturating_cast(ascent.ceil());

    // Shape everything first, alignment needs the widest line.
    let shaped: Vec<rustybuzz::GlyphBuffer> = lines
        .iter()
        .map(|line| {
            let mut buffer = rustybuzz::UnicodeBuffer::new();
            buffer.push_str(line);
            rustybuzz::shape(&face, &[], buffer)
        })
        .collect();
    let widths: Vec<u32> = shaped
        .iter()
        .map(|glyphs| {
            let advance: i64 = glyphs
                .glyph_positions()
                .iter()
                .map(|pos| i64::from(pos.x_advance))
                .sum();
            az::saturating_cast((advance as f32 * scale).ceil().max(0.0))
        })
        .collect();
    let block_width = widths.iter().copied().max().unwrap_or(0);
    let block_height = line_height.saturating_mul(lines.len() as u32);

    let mut flattener = Flattener::new(scale);
    for (row, (glyphs, &width)) in shaped.iter().zip(&widths).enumerate() {
        let baseline = ascent_px as f32 + (line_height as f32) * row as f32;
        let mut cursor = align.offset(block_width, width) as f32;
        for (info, pos) in glyphs.glyph_infos().iter().zip(glyphs.glyph_positions()) {
            flattener.origin = [
                cursor + pos.x_offset as f32 * scale,
                baseline - pos.y_offset as f32 * scale,
            ];
            // Glyph ids are u16 in a u32.
            if let Ok(id) = u16::try_from(info.glyph_id) {
                // Glyphs without outlines, such as spaces, are fine.
                let _ = face.outline_glyph(ttf_parser::GlyphId(id), &mut flattener);
            }
            cursor += pos.x_advance as f32 * scale;
        }
    }

    // Ink may overhang the nominal block, keep all of it.
    let nominal = Rect::sized(block_width, block_height);
    let rect = flattener
        .bounds()
        .map_or(nominal, |ink| nominal.union(&ink));
    let mut coverage = Coverage::new(rect);
    fill(&flattener.edges, &mut coverage);
    Some(TextLayout {
        coverage,
        ascent: ascent_px,
        line_height,
        lines: lines.len(),
    })
}
