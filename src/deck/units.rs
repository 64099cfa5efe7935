//! Length units and colours for the presentation package.
//!
//! PresentationML measures everything in English Metric Units:
//! 914 400 EMU per inch, 12 700 EMU per point.

pub const EMU_PER_INCH: i64 = 914_400;
pub const EMU_PER_PT: i64 = 12_700;

/// 13.333 in, the standard 16:9 slide width.
pub const WIDESCREEN_WIDTH_EMU: i64 = 12_192_000;
/// 7.5 in.
pub const WIDESCREEN_HEIGHT_EMU: i64 = 6_858_000;

/// Smallest box placed from percentage geometry (about 0.11 in).
pub const MIN_VISION_BOX_EMU: i64 = 100_000;
/// Smallest text box placed from point geometry, per axis.
pub const MIN_DOCUMENT_BOX_PT: f32 = 10.0;

/// Legal slide dimension range: 1 in to 56 in.
pub const MIN_SLIDE_EMU: i64 = 914_400;
pub const MAX_SLIDE_EMU: i64 = 51_206_400;

/// Points → EMU, truncating toward zero.
pub fn pt_to_emu(pt: f32) -> i64 {
    (f64::from(pt) * EMU_PER_PT as f64) as i64
}

/// `pct` percent of `total`, truncating toward zero.
pub fn percent_of(total: i64, pct: f32) -> i64 {
    (total as f64 * f64::from(pct) / 100.0) as i64
}

/// Keep a slide dimension inside the range PowerPoint accepts.
pub fn clamp_slide_dimension(emu: i64) -> i64 {
    emu.clamp(MIN_SLIDE_EMU, MAX_SLIDE_EMU)
}

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    /// `RRGGBB`, as `a:srgbClr/@val` expects.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Parse `#rrggbb` (the `#` is optional). Anything else is black.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    let h = hex.trim().trim_start_matches('#');
    if h.len() != 6 || !h.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Rgb::BLACK;
    }
    let channel = |i: usize| u8::from_str_radix(&h[i..i + 2], 16).unwrap_or(0);
    Rgb {
        r: channel(0),
        g: channel(2),
        b: channel(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(hex_to_rgb("#FF8000"), Rgb { r: 255, g: 128, b: 0 });
        assert_eq!(hex_to_rgb("1e1e2e"), Rgb { r: 30, g: 30, b: 46 });
    }

    #[test]
    fn malformed_hex_is_black() {
        for bad in ["", "#", "#FFF", "#FFFFFFF", "#GGGGGG", "red", "#12345", "#ÿÿÿ"] {
            assert_eq!(hex_to_rgb(bad), Rgb::BLACK, "input {bad:?}");
        }
    }

    #[test]
    fn letter_page_is_exact() {
        assert_eq!(pt_to_emu(720.0), 9_144_000);
        assert_eq!(pt_to_emu(540.0), 6_858_000);
    }

    #[test]
    fn widescreen_is_13_333_by_7_5_inches() {
        assert_eq!(WIDESCREEN_HEIGHT_EMU, EMU_PER_INCH * 15 / 2);
        let inches = WIDESCREEN_WIDTH_EMU as f64 / EMU_PER_INCH as f64;
        assert!((inches - 13.333).abs() < 0.001);
    }

    #[test]
    fn slide_dimension_clamp() {
        assert_eq!(clamp_slide_dimension(10), MIN_SLIDE_EMU);
        assert_eq!(clamp_slide_dimension(9_144_000), 9_144_000);
        assert_eq!(clamp_slide_dimension(i64::MAX), MAX_SLIDE_EMU);
    }

    #[test]
    fn rgb_hex_is_uppercase() {
        assert_eq!(Rgb { r: 10, g: 171, b: 255 }.to_hex(), "0AABFF");
    }
}
