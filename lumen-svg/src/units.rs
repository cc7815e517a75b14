//! Length parsing and unit conversion.

use std::str::FromStr;
use svgtypes::{Length, LengthUnit};

const DPI: f32 = 96.0;

/// Direction a length is measured in, used for percentage resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
    /// Neither horizontal nor vertical (radii, stroke width, ...).
    Diagonal,
}

/// The viewport and font size that relative lengths resolve against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LengthContext {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub font_size: f32,
}

impl LengthContext {
    pub fn new(viewport_width: f32, viewport_height: f32, font_size: f32) -> Self {
        Self {
            viewport_width,
            viewport_height,
            font_size,
        }
    }

    /// Resolve a length to user units.
    pub fn resolve(&self, length: Length, axis: Axis) -> f32 {
        let n = length.number as f32;
        match length.unit {
            LengthUnit::None | LengthUnit::Px => n,
            LengthUnit::In => n * DPI,
            LengthUnit::Cm => n * DPI / 2.54,
            LengthUnit::Mm => n * DPI / 25.4,
            LengthUnit::Pt => n * DPI / 72.0,
            LengthUnit::Pc => n * DPI / 6.0,
            LengthUnit::Em => n * self.font_size,
            LengthUnit::Ex => n * self.font_size / 2.0,
            LengthUnit::Percent => {
                let basis = match axis {
                    Axis::X => self.viewport_width,
                    Axis::Y => self.viewport_height,
                    Axis::Diagonal => {
                        let w = self.viewport_width;
                        let h = self.viewport_height;
                        ((w * w + h * h) / 2.0).sqrt()
                    }
                };
                n * basis / 100.0
            }
        }
    }

    /// Parse and resolve `text`, or return `default` when it is missing or invalid.
    pub fn resolve_str(&self, text: Option<&str>, axis: Axis, default: f32) -> f32 {
        text.and_then(parse_length)
            .map(|length| self.resolve(length, axis))
            .unwrap_or(default)
    }
}

pub(crate) fn parse_length(text: &str) -> Option<Length> {
    Length::from_str(text.trim()).ok()
}

/// Parse a length list such as `stroke-dasharray`.
pub(crate) fn parse_length_list(text: &str) -> Option<Vec<Length>> {
    svgtypes::LengthListParser::from(text.trim())
        .collect::<Result<Vec<_>, _>>()
        .ok()
}

/// Parse a plain number, accepting a trailing `%` as a fraction.
pub(crate) fn parse_number_or_percent(text: &str) -> Option<f32> {
    let text = text.trim();
    match text.strip_suffix('%') {
        Some(number) => number.trim().parse::<f32>().ok().map(|n| n / 100.0),
        None => text.parse::<f32>().ok(),
    }
}

/// Resolve a length given in `objectBoundingBox` units to a fraction of the box.
pub(crate) fn bbox_fraction(text: Option<&str>, default: f32) -> f32 {
    match text.and_then(parse_length) {
        Some(Length {
            number,
            unit: LengthUnit::Percent,
        }) => number as f32 / 100.0,
        Some(length) => length.number as f32,
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10", 10.0)]
    #[case("10px", 10.0)]
    #[case("1in", 96.0)]
    #[case("2.54cm", 96.0)]
    #[case("25.4mm", 96.0)]
    #[case("72pt", 96.0)]
    #[case("6pc", 96.0)]
    #[case("2em", 32.0)]
    #[case("2ex", 16.0)]
    #[case("50%", 100.0)]
    fn test_resolve_units(#[case] text: &str, #[case] expected: f32) {
        let ctx = LengthContext::new(200.0, 100.0, 16.0);
        let resolved = ctx.resolve(parse_length(text).unwrap(), Axis::X);
        assert!((resolved - expected).abs() < 1e-3, "{text}: {resolved}");
    }

    #[test]
    fn test_percentage_axes() {
        let ctx = LengthContext::new(300.0, 400.0, 16.0);
        let pct = parse_length("10%").unwrap();
        assert_eq!(ctx.resolve(pct, Axis::X), 30.0);
        assert_eq!(ctx.resolve(pct, Axis::Y), 40.0);
        let diag = ctx.resolve(pct, Axis::Diagonal);
        assert!((diag - 35.355339).abs() < 1e-3);
    }

    #[test]
    fn test_defaults_and_lists() {
        let ctx = LengthContext::new(100.0, 100.0, 16.0);
        assert_eq!(ctx.resolve_str(None, Axis::X, 7.0), 7.0);
        assert_eq!(ctx.resolve_str(Some("bogus"), Axis::X, 7.0), 7.0);
        assert_eq!(parse_length_list("5, 10 15").map(|l| l.len()), Some(3));
        assert_eq!(parse_number_or_percent("50%"), Some(0.5));
        assert_eq!(parse_number_or_percent("0.25"), Some(0.25));
        assert_eq!(bbox_fraction(Some("25%"), 0.0), 0.25);
        assert_eq!(bbox_fraction(Some("0.75"), 0.0), 0.75);
    }
}
