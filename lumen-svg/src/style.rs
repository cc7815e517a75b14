//! Presentation property value types.

use std::str::FromStr;

/// An RGBA color with straight 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Color with its alpha multiplied by `opacity`.
    pub fn to_skia(self, opacity: f32) -> tiny_skia::Color {
        let mut color = tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a);
        color.apply_opacity(opacity.clamp(0.0, 1.0));
        color
    }
}

impl From<svgtypes::Color> for Rgba {
    fn from(c: svgtypes::Color) -> Self {
        Rgba::new(c.red, c.green, c.blue, c.alpha)
    }
}

/// A color value that may defer to the `color` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorValue {
    /// A specified color.
    Color(Rgba),
    /// The `currentColor` keyword.
    CurrentColor,
}

impl ColorValue {
    pub fn resolve(self, current: Rgba) -> Rgba {
        match self {
            ColorValue::Color(c) => c,
            ColorValue::CurrentColor => current,
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == "currentColor" {
            return Some(ColorValue::CurrentColor);
        }
        svgtypes::Color::from_str(text)
            .ok()
            .map(|c| ColorValue::Color(c.into()))
    }
}

/// Value of `fill` or `stroke`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Paint {
    None,
    Color(ColorValue),
    /// Reference to a gradient or pattern, with the color used when it
    /// cannot be resolved.
    Server {
        id: String,
        fallback: Option<ColorValue>,
    },
}

impl Paint {
    /// Parse a paint value. `None` means the value is invalid or `inherit`.
    pub fn parse(text: &str) -> Option<Self> {
        match svgtypes::Paint::from_str(text.trim()).ok()? {
            svgtypes::Paint::None => Some(Paint::None),
            svgtypes::Paint::CurrentColor => Some(Paint::Color(ColorValue::CurrentColor)),
            svgtypes::Paint::Color(c) => Some(Paint::Color(ColorValue::Color(c.into()))),
            svgtypes::Paint::FuncIRI(id, fallback) => Some(Paint::Server {
                id: id.to_string(),
                fallback: match fallback {
                    Some(svgtypes::PaintFallback::Color(c)) => Some(ColorValue::Color(c.into())),
                    Some(svgtypes::PaintFallback::CurrentColor) => Some(ColorValue::CurrentColor),
                    _ => None,
                },
            }),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Paint::None)
    }
}

/// Fill rule for `fill-rule` and `clip-rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum FillRule {
    /// Inside where the winding number is non-zero.
    #[default]
    NonZero,
    /// Inside where the crossing count is odd.
    EvenOdd,
}

impl From<FillRule> for tiny_skia::FillRule {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::NonZero => tiny_skia::FillRule::Winding,
            FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
        }
    }
}

impl FromStr for FillRule {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "nonzero" => Ok(FillRule::NonZero),
            "evenodd" => Ok(FillRule::EvenOdd),
            _ => Err(()),
        }
    }
}

/// Line cap style for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LineCap {
    /// Flat edge at the endpoint.
    #[default]
    Butt,
    /// Half-circle past the endpoint.
    Round,
    /// Half-square past the endpoint.
    Square,
}

impl From<LineCap> for tiny_skia::LineCap {
    fn from(cap: LineCap) -> Self {
        match cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        }
    }
}

impl FromStr for LineCap {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "butt" => Ok(LineCap::Butt),
            "round" => Ok(LineCap::Round),
            "square" => Ok(LineCap::Square),
            _ => Err(()),
        }
    }
}

/// Line join style for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LineJoin {
    /// Sharp corner, limited by `stroke-miterlimit`.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Beveled corner.
    Bevel,
}

impl From<LineJoin> for tiny_skia::LineJoin {
    fn from(join: LineJoin) -> Self {
        match join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        }
    }
}

impl FromStr for LineJoin {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "miter" | "miter-clip" | "arcs" => Ok(LineJoin::Miter),
            "round" => Ok(LineJoin::Round),
            "bevel" => Ok(LineJoin::Bevel),
            _ => Err(()),
        }
    }
}

/// Value of `visibility`. Hidden content still takes part in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Visibility {
    #[default]
    Visible,
    Hidden,
    /// Same as `Hidden` for SVG content.
    Collapse,
}

impl FromStr for Visibility {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "visible" => Ok(Visibility::Visible),
            "hidden" => Ok(Visibility::Hidden),
            "collapse" => Ok(Visibility::Collapse),
            _ => Err(()),
        }
    }
}

/// Horizontal alignment of a text chunk relative to its start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum TextAnchor {
    /// The chunk starts at the current position.
    #[default]
    Start,
    /// The chunk is centered on the current position.
    Middle,
    /// The chunk ends at the current position.
    End,
}

impl TextAnchor {
    /// Offset applied to a chunk of the given advance.
    pub fn offset(self, advance: f32) -> f32 {
        match self {
            TextAnchor::Start => 0.0,
            TextAnchor::Middle => -advance / 2.0,
            TextAnchor::End => -advance,
        }
    }
}

impl FromStr for TextAnchor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "start" => Ok(TextAnchor::Start),
            "middle" => Ok(TextAnchor::Middle),
            "end" => Ok(TextAnchor::End),
            _ => Err(()),
        }
    }
}

/// `gradientUnits`, `patternUnits`, `clipPathUnits` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Units {
    /// Coordinates in the user space of the referencing element.
    UserSpaceOnUse,
    /// Fractions of the referencing element's bounding box.
    ObjectBoundingBox,
}

impl Units {
    pub fn parse(text: Option<&str>, default: Units) -> Units {
        match text.map(str::trim) {
            Some("userSpaceOnUse") => Units::UserSpaceOnUse,
            Some("objectBoundingBox") => Units::ObjectBoundingBox,
            _ => default,
        }
    }
}

/// Gradient `spreadMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SpreadMethod {
    /// Extend the end stops.
    #[default]
    Pad,
    /// Mirror the gradient on every repetition.
    Reflect,
    /// Restart the gradient on every repetition.
    Repeat,
}

impl SpreadMethod {
    pub fn parse(text: Option<&str>) -> SpreadMethod {
        match text.map(str::trim) {
            Some("reflect") => SpreadMethod::Reflect,
            Some("repeat") => SpreadMethod::Repeat,
            _ => SpreadMethod::Pad,
        }
    }
}

impl From<SpreadMethod> for tiny_skia::SpreadMode {
    fn from(method: SpreadMethod) -> Self {
        match method {
            SpreadMethod::Pad => tiny_skia::SpreadMode::Pad,
            SpreadMethod::Reflect => tiny_skia::SpreadMode::Reflect,
            SpreadMethod::Repeat => tiny_skia::SpreadMode::Repeat,
        }
    }
}

/// Extract the fragment id from `url(#id)`.
pub(crate) fn parse_func_iri(text: &str) -> Option<String> {
    svgtypes::FuncIRI::from_str(text.trim())
        .ok()
        .map(|iri| iri.0.to_string())
}

/// Extract the fragment id from `#id`.
pub(crate) fn parse_iri(text: &str) -> Option<String> {
    svgtypes::IRI::from_str(text.trim())
        .ok()
        .map(|iri| iri.0.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_parse() {
        assert_eq!(Paint::parse("none"), Some(Paint::None));
        assert_eq!(
            Paint::parse("red"),
            Some(Paint::Color(ColorValue::Color(Rgba::new(255, 0, 0, 255))))
        );
        assert_eq!(
            Paint::parse("currentColor"),
            Some(Paint::Color(ColorValue::CurrentColor))
        );
        assert_eq!(
            Paint::parse("url(#grad) blue"),
            Some(Paint::Server {
                id: "grad".to_string(),
                fallback: Some(ColorValue::Color(Rgba::new(0, 0, 255, 255))),
            })
        );
        assert_eq!(Paint::parse("not-a-color"), None);
    }

    #[test]
    fn test_color_value_resolve() {
        let current = Rgba::new(1, 2, 3, 255);
        assert_eq!(ColorValue::CurrentColor.resolve(current), current);
        assert_eq!(
            ColorValue::parse("#00ff00").map(|c| c.resolve(current)),
            Some(Rgba::new(0, 255, 0, 255))
        );
    }

    #[test]
    fn test_keyword_parsing() {
        assert_eq!("evenodd".parse::<FillRule>(), Ok(FillRule::EvenOdd));
        assert_eq!("round".parse::<LineCap>(), Ok(LineCap::Round));
        assert_eq!("bevel".parse::<LineJoin>(), Ok(LineJoin::Bevel));
        assert_eq!("hidden".parse::<Visibility>(), Ok(Visibility::Hidden));
        assert_eq!("middle".parse::<TextAnchor>(), Ok(TextAnchor::Middle));
        assert!("sideways".parse::<TextAnchor>().is_err());
    }

    #[test]
    fn test_iri_parsing() {
        assert_eq!(parse_func_iri("url(#clip1)"), Some("clip1".to_string()));
        assert_eq!(parse_iri("#shape"), Some("shape".to_string()));
        assert_eq!(
            Units::parse(Some("userSpaceOnUse"), Units::ObjectBoundingBox),
            Units::UserSpaceOnUse
        );
        assert_eq!(SpreadMethod::parse(Some("reflect")), SpreadMethod::Reflect);
    }

    #[test]
    fn test_text_anchor_offset() {
        assert_eq!(TextAnchor::Start.offset(10.0), 0.0);
        assert_eq!(TextAnchor::Middle.offset(10.0), -5.0);
        assert_eq!(TextAnchor::End.offset(10.0), -10.0);
    }
}
