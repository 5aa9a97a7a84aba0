//! Straight-alpha compositing, as used by every drawing and composition path.

use crate::color::Color;

/// Source-over: paint `src` on top of `dst`.
///
/// Fully opaque sources replace, fully transparent sources leave `dst` untouched.
#[must_use]
pub fn over(dst: Color, src: Color) -> Color {
    let sa = u32::from(src.a());
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = u32::from(dst.a());
    let inv = 255 - sa;
    // Output alpha, scaled by 255 to keep the channel math exact.
    let alpha_scaled = sa * 255 + da * inv;
    let channel = |s: u8, d: u8| -> u8 {
        let num = u32::from(s) * sa * 255 + u32::from(d) * da * inv;
        // alpha_scaled > 0 as sa > 0
        ((num + alpha_scaled / 2) / alpha_scaled).min(255) as u8
    };
    Color::new(
        channel(src.r(), dst.r()),
        channel(src.g(), dst.g()),
        channel(src.b(), dst.b()),
        ((alpha_scaled + 127) / 255).min(255) as u8,
    )
}

/// Scale the alpha of `color` by an 8-bit coverage value.
#[must_use]
pub fn modulate(color: Color, coverage: u8) -> Color {
    match coverage {
        255 => color,
        0 => color.with_alpha(0),
        c => {
            let a = (u32::from(color.a()) * u32::from(c) + 127) / 255;
            color.with_alpha(a as u8)
        }
    }
}

#[cfg(test)]
mod test {
    use super::{modulate, over};
    use crate::color::Color;
    #[test]
    fn opaque_replaces() {
        let red = Color::rgb(255, 0, 0);
        assert_eq!(over(Color::WHITE, red), red);
        assert_eq!(over(Color::TRANSPARENT, red), red);
    }
    #[test]
    fn transparent_is_identity() {
        let dst = Color::new(10, 20, 30, 40);
        assert_eq!(over(dst, Color::TRANSPARENT), dst);
        assert_eq!(over(dst, modulate(Color::BLACK, 0)), dst);
    }
    #[test]
    fn half_over_opaque() {
        let out = over(Color::WHITE, Color::new(0, 0, 0, 128));
        assert_eq!(out.a(), 255);
        // 255 * (127/255) rounds to 127
        assert_eq!(out.r(), 127);
    }
    #[test]
    fn half_over_transparent_keeps_color() {
        let out = over(Color::TRANSPARENT, Color::new(200, 100, 50, 128));
        assert_eq!(out, Color::new(200, 100, 50, 128));
    }
}
