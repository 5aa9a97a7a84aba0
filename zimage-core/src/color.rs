/// A straight (non-premultiplied) 8-bit sRGB color with alpha.
///
/// Serialized as a hex string, `#RRGGBB` when opaque, else `#RRGGBBAA`.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color(pub [u8; 4]);
impl Color {
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }
    /// Fully opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }
    #[must_use]
    pub const fn r(self) -> u8 {
        self.0[0]
    }
    #[must_use]
    pub const fn g(self) -> u8 {
        self.0[1]
    }
    #[must_use]
    pub const fn b(self) -> u8 {
        self.0[2]
    }
    #[must_use]
    pub const fn a(self) -> u8 {
        self.0[3]
    }
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self([self.0[0], self.0[1], self.0[2], a])
    }
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.0[3] == 255
    }
    /// Parse `#RGB`, `#RRGGBB`, or `#RRGGBBAA`. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit);
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| ColorParseError::BadDigit);
        match digits.len() {
            3 => {
                // Each nibble doubled, #ABC == #AABBCC
                let mut out = [255u8; 4];
                for (o, i) in out.iter_mut().zip(0..3) {
                    let nibble = byte(&digits[i..=i])?;
                    *o = nibble << 4 | nibble;
                }
                Ok(Self(out))
            }
            6 => Ok(Self::rgb(
                byte(&digits[0..2])?,
                byte(&digits[2..4])?,
                byte(&digits[4..6])?,
            )),
            8 => Ok(Self::new(
                byte(&digits[0..2])?,
                byte(&digits[2..4])?,
                byte(&digits[4..6])?,
                byte(&digits[6..8])?,
            )),
            len => Err(ColorParseError::BadLength(len)),
        }
    }
    #[must_use]
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}
impl std::fmt::Debug for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Color({})", self.to_hex())
    }
}
impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
impl std::str::FromStr for Color {
    type Err = ColorParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
impl From<[u8; 4]> for Color {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}
impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(r, g, b)
    }
}
impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::from_hex(&string).map_err(serde::de::Error::custom)
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorParseError {
    #[error("expected 3, 6, or 8 hex digits, found {0}")]
    BadLength(usize),
    #[error("invalid hex digit")]
    BadDigit,
}

#[cfg(test)]
mod test {
    use super::{Color, ColorParseError};
    #[test]
    fn parse_forms() {
        assert_eq!(Color::from_hex("#E86C00"), Ok(Color::rgb(0xE8, 0x6C, 0x00)));
        assert_eq!(Color::from_hex("fff"), Ok(Color::WHITE));
        assert_eq!(
            Color::from_hex("#00000080"),
            Ok(Color::new(0, 0, 0, 0x80))
        );
        assert_eq!(Color::from_hex("#12345"), Err(ColorParseError::BadLength(5)));
        assert_eq!(Color::from_hex("#GG0000"), Err(ColorParseError::BadDigit));
        // Signs are not digits, even where the integer parser would take them.
        assert_eq!(Color::from_hex("#+F+F+F"), Err(ColorParseError::BadDigit));
        assert_eq!(Color::from_hex("+FF"), Err(ColorParseError::BadDigit));
        assert_eq!(Color::from_hex("#-1-1-1"), Err(ColorParseError::BadDigit));
    }
    #[test]
    fn hex_round_trip() {
        for color in [
            Color::BLACK,
            Color::TRANSPARENT,
            Color::new(1, 2, 3, 4),
            Color::rgb(0xFF, 0x8C, 0x30),
        ] {
            assert_eq!(Color::from_hex(&color.to_hex()), Ok(color));
        }
        assert_eq!(Color::WHITE.to_hex(), "#FFFFFF");
    }
}
