//! Computed presentation properties and the inheritance cascade.

use crate::style::{
    parse_func_iri, ColorValue, FillRule, LineCap, LineJoin, Paint, Rgba, TextAnchor, Visibility,
};
use crate::units::{parse_length, parse_length_list, Axis, LengthContext};

const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Property names accepted as presentation attributes.
const PRESENTATION_ATTRIBUTES: &[&str] = &[
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-opacity",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
    "stroke-dashoffset",
    "visibility",
    "color",
    "clip-rule",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "text-anchor",
    "opacity",
    "display",
    "clip-path",
    "mask",
    "stop-color",
    "stop-opacity",
    "overflow",
];

pub(crate) fn is_presentation_attribute(name: &str) -> bool {
    PRESENTATION_ATTRIBUTES.contains(&name)
}

/// Fully resolved style of one element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ComputedStyle {
    pub fill: Paint,
    pub fill_opacity: f32,
    pub fill_rule: FillRule,
    pub stroke: Paint,
    pub stroke_width: f32,
    pub stroke_opacity: f32,
    pub stroke_linecap: LineCap,
    pub stroke_linejoin: LineJoin,
    pub stroke_miterlimit: f32,
    pub stroke_dasharray: Vec<f32>,
    pub stroke_dashoffset: f32,
    pub visibility: Visibility,
    pub color: Rgba,
    pub clip_rule: FillRule,
    pub font_family: Vec<String>,
    pub font_size: f32,
    pub font_weight: u16,
    pub font_italic: bool,
    pub text_anchor: TextAnchor,

    // Not inherited.
    pub opacity: f32,
    pub display_none: bool,
    pub clip_path: Option<String>,
    pub mask: Option<String>,
    pub stop_color: ColorValue,
    pub stop_opacity: f32,
    pub overflow_visible: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            fill: Paint::Color(ColorValue::Color(Rgba::BLACK)),
            fill_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            stroke: Paint::None,
            stroke_width: 1.0,
            stroke_opacity: 1.0,
            stroke_linecap: LineCap::Butt,
            stroke_linejoin: LineJoin::Miter,
            stroke_miterlimit: 4.0,
            stroke_dasharray: Vec::new(),
            stroke_dashoffset: 0.0,
            visibility: Visibility::Visible,
            color: Rgba::BLACK,
            clip_rule: FillRule::NonZero,
            font_family: Vec::new(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: 400,
            font_italic: false,
            text_anchor: TextAnchor::Start,
            opacity: 1.0,
            display_none: false,
            clip_path: None,
            mask: None,
            stop_color: ColorValue::Color(Rgba::BLACK),
            stop_opacity: 1.0,
            overflow_visible: false,
        }
    }
}

impl ComputedStyle {
    /// Compute a child's style from its parent and its declarations, lowest
    /// priority first. `viewport` resolves percentage lengths.
    pub fn cascade(parent: &ComputedStyle, declarations: &[(&str, &str)], viewport: (f32, f32)) -> Self {
        let initial = ComputedStyle::default();
        let mut style = ComputedStyle {
            opacity: initial.opacity,
            display_none: initial.display_none,
            clip_path: None,
            mask: None,
            stop_color: initial.stop_color,
            stop_opacity: initial.stop_opacity,
            overflow_visible: initial.overflow_visible,
            ..parent.clone()
        };

        // em units in every other property depend on the computed font size
        if let Some((_, value)) = declarations.iter().rev().find(|(name, _)| *name == "font-size") {
            style.font_size = resolve_font_size(value, parent.font_size, viewport);
        }

        let ctx = LengthContext::new(viewport.0, viewport.1, style.font_size);
        for (name, value) in declarations {
            let value = value.trim();
            if value == "inherit" {
                style.inherit(name, parent);
            } else {
                style.apply(name, value, parent, &ctx);
            }
        }
        style
    }

    fn apply(&mut self, name: &str, value: &str, parent: &ComputedStyle, ctx: &LengthContext) {
        match name {
            "fill" => {
                if let Some(paint) = Paint::parse(value) {
                    self.fill = paint;
                }
            }
            "stroke" => {
                if let Some(paint) = Paint::parse(value) {
                    self.stroke = paint;
                }
            }
            "fill-opacity" => set_opacity(&mut self.fill_opacity, value),
            "stroke-opacity" => set_opacity(&mut self.stroke_opacity, value),
            "opacity" => set_opacity(&mut self.opacity, value),
            "stop-opacity" => set_opacity(&mut self.stop_opacity, value),
            "fill-rule" => set_keyword(&mut self.fill_rule, value),
            "clip-rule" => set_keyword(&mut self.clip_rule, value),
            "stroke-linecap" => set_keyword(&mut self.stroke_linecap, value),
            "stroke-linejoin" => set_keyword(&mut self.stroke_linejoin, value),
            "visibility" => set_keyword(&mut self.visibility, value),
            "text-anchor" => set_keyword(&mut self.text_anchor, value),
            "stroke-width" => {
                if let Some(length) = parse_length(value) {
                    let width = ctx.resolve(length, Axis::Diagonal);
                    if width >= 0.0 {
                        self.stroke_width = width;
                    }
                }
            }
            "stroke-miterlimit" => {
                if let Ok(limit) = value.parse::<f32>() {
                    if limit >= 1.0 {
                        self.stroke_miterlimit = limit;
                    }
                }
            }
            "stroke-dasharray" => {
                if value == "none" {
                    self.stroke_dasharray.clear();
                } else if let Some(lengths) = parse_length_list(value) {
                    self.stroke_dasharray = lengths
                        .into_iter()
                        .map(|l| ctx.resolve(l, Axis::Diagonal))
                        .collect();
                }
            }
            "stroke-dashoffset" => {
                if let Some(length) = parse_length(value) {
                    self.stroke_dashoffset = ctx.resolve(length, Axis::Diagonal);
                }
            }
            "color" => {
                if let Some(color) = ColorValue::parse(value) {
                    self.color = color.resolve(parent.color);
                }
            }
            "stop-color" => {
                if let Some(color) = ColorValue::parse(value) {
                    self.stop_color = color;
                }
            }
            "font-family" => {
                let families = parse_font_families(value);
                if !families.is_empty() {
                    self.font_family = families;
                }
            }
            "font-weight" => {
                if let Some(weight) = parse_font_weight(value, parent.font_weight) {
                    self.font_weight = weight;
                }
            }
            "font-style" => match value {
                "normal" => self.font_italic = false,
                "italic" | "oblique" => self.font_italic = true,
                _ => {}
            },
            "display" => self.display_none = value == "none",
            "overflow" => self.overflow_visible = matches!(value, "visible" | "auto"),
            "clip-path" => self.clip_path = parse_func_iri(value),
            "mask" => self.mask = parse_func_iri(value),
            _ => {}
        }
    }

    fn inherit(&mut self, name: &str, parent: &ComputedStyle) {
        match name {
            "fill" => self.fill = parent.fill.clone(),
            "stroke" => self.stroke = parent.stroke.clone(),
            "fill-opacity" => self.fill_opacity = parent.fill_opacity,
            "stroke-opacity" => self.stroke_opacity = parent.stroke_opacity,
            "opacity" => self.opacity = parent.opacity,
            "stop-opacity" => self.stop_opacity = parent.stop_opacity,
            "fill-rule" => self.fill_rule = parent.fill_rule,
            "clip-rule" => self.clip_rule = parent.clip_rule,
            "stroke-linecap" => self.stroke_linecap = parent.stroke_linecap,
            "stroke-linejoin" => self.stroke_linejoin = parent.stroke_linejoin,
            "visibility" => self.visibility = parent.visibility,
            "text-anchor" => self.text_anchor = parent.text_anchor,
            "stroke-width" => self.stroke_width = parent.stroke_width,
            "stroke-miterlimit" => self.stroke_miterlimit = parent.stroke_miterlimit,
            "stroke-dasharray" => self.stroke_dasharray = parent.stroke_dasharray.clone(),
            "stroke-dashoffset" => self.stroke_dashoffset = parent.stroke_dashoffset,
            "color" => self.color = parent.color,
            "stop-color" => self.stop_color = parent.stop_color,
            "font-family" => self.font_family = parent.font_family.clone(),
            "font-size" => self.font_size = parent.font_size,
            "font-weight" => self.font_weight = parent.font_weight,
            "font-style" => self.font_italic = parent.font_italic,
            "display" => self.display_none = parent.display_none,
            "overflow" => self.overflow_visible = parent.overflow_visible,
            "clip-path" => self.clip_path = parent.clip_path.clone(),
            "mask" => self.mask = parent.mask.clone(),
            _ => {}
        }
    }

    /// Whether a `font-weight` counts as bold for face lookup.
    pub fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }

    pub fn length_context(&self, viewport: (f32, f32)) -> LengthContext {
        LengthContext::new(viewport.0, viewport.1, self.font_size)
    }
}

fn set_opacity(target: &mut f32, value: &str) {
    if let Some(n) = crate::units::parse_number_or_percent(value) {
        *target = n.clamp(0.0, 1.0);
    }
}

fn set_keyword<T: std::str::FromStr>(target: &mut T, value: &str) {
    if let Ok(parsed) = value.parse::<T>() {
        *target = parsed;
    }
}

fn resolve_font_size(value: &str, parent_size: f32, viewport: (f32, f32)) -> f32 {
    let value = value.trim();
    let keyword = match value {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "larger" => Some(parent_size * 1.2),
        "smaller" => Some(parent_size / 1.2),
        "inherit" => Some(parent_size),
        _ => None,
    };
    if let Some(size) = keyword {
        return size;
    }

    match parse_length(value) {
        Some(length) if length.unit == svgtypes::LengthUnit::Percent => {
            parent_size * length.number as f32 / 100.0
        }
        Some(length) => {
            // em and ex are relative to the parent font size here
            let ctx = LengthContext::new(viewport.0, viewport.1, parent_size);
            ctx.resolve(length, Axis::Diagonal).max(0.0)
        }
        None => parent_size,
    }
}

fn parse_font_weight(value: &str, parent: u16) -> Option<u16> {
    match value {
        "normal" => Some(400),
        "bold" => Some(700),
        "bolder" => Some(match parent {
            0..=349 => 400,
            350..=549 => 700,
            _ => 900,
        }),
        "lighter" => Some(match parent {
            0..=549 => 100,
            550..=749 => 400,
            _ => 700,
        }),
        _ => value
            .parse::<u16>()
            .ok()
            .filter(|w| (1..=1000).contains(w)),
    }
}

pub(crate) fn parse_font_families(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|family| family.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|family| !family.is_empty())
        .map(str::to_string)
        .collect()
}
