//! Mixed-unit size declarations and their resolution to pixels

use serde::{Deserialize, Serialize};

/// Measurement context a size is resolved against
#[derive(Debug, Clone, Copy)]
pub struct UnitContext {
    /// Pixel width of the containing element
    pub container_width: f64,
    /// Root font size in pixels (`rem` basis)
    pub root_font_px: f64,
    /// Table-local font size in pixels (`em` basis)
    pub table_font_px: f64,
}

impl Default for UnitContext {
    fn default() -> Self {
        Self {
            container_width: 0.0,
            root_font_px: 16.0,
            table_font_px: 14.0,
        }
    }
}

/// A column size declaration in one of the supported units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SizeValue {
    Px(f64),
    Percent(f64),
    Rem(f64),
    Em(f64),
    /// Width inferred later from the column's type category
    Auto,
}

impl SizeValue {
    /// Parse a declaration: a bare number or `"N"`/`"Npx"` is pixels,
    /// `"N%"`, `"Nrem"`, `"Nem"`, or the literal `"auto"`.
    ///
    /// Unparseable strings yield `None`; callers fall back to `Auto`.
    pub fn parse(value: &str) -> Option<SizeValue> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("auto") {
            return Some(SizeValue::Auto);
        }
        if let Some(n) = value.strip_suffix("px") {
            return n.trim().parse().ok().map(SizeValue::Px);
        }
        if let Some(n) = value.strip_suffix('%') {
            return n.trim().parse().ok().map(SizeValue::Percent);
        }
        if let Some(n) = value.strip_suffix("rem") {
            return n.trim().parse().ok().map(SizeValue::Rem);
        }
        if let Some(n) = value.strip_suffix("em") {
            return n.trim().parse().ok().map(SizeValue::Em);
        }
        value.parse().ok().map(SizeValue::Px)
    }

    /// Resolve to pixels, or `None` for `Auto`.
    ///
    /// Nonsensical results (negative, NaN) clamp to zero; resolution
    /// never fails.
    pub fn resolve(&self, ctx: &UnitContext) -> Option<f64> {
        let px = match self {
            SizeValue::Px(n) => *n,
            SizeValue::Percent(n) => n / 100.0 * ctx.container_width,
            SizeValue::Rem(n) => n * ctx.root_font_px,
            SizeValue::Em(n) => n * ctx.table_font_px,
            SizeValue::Auto => return None,
        };
        Some(if px.is_finite() { px.max(0.0) } else { 0.0 })
    }
}

impl From<f64> for SizeValue {
    fn from(px: f64) -> Self {
        SizeValue::Px(px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> UnitContext {
        UnitContext {
            container_width: 800.0,
            root_font_px: 16.0,
            table_font_px: 14.0,
        }
    }

    #[test]
    fn parses_every_unit() {
        assert_eq!(SizeValue::parse("120"), Some(SizeValue::Px(120.0)));
        assert_eq!(SizeValue::parse("120px"), Some(SizeValue::Px(120.0)));
        assert_eq!(SizeValue::parse("50%"), Some(SizeValue::Percent(50.0)));
        assert_eq!(SizeValue::parse("5rem"), Some(SizeValue::Rem(5.0)));
        assert_eq!(SizeValue::parse("2em"), Some(SizeValue::Em(2.0)));
        assert_eq!(SizeValue::parse("auto"), Some(SizeValue::Auto));
        assert_eq!(SizeValue::parse("wat"), None);
    }

    #[test]
    fn resolves_against_context() {
        assert_eq!(SizeValue::Rem(5.0).resolve(&ctx()), Some(80.0));
        assert_eq!(SizeValue::Em(2.0).resolve(&ctx()), Some(28.0));
        assert_eq!(SizeValue::Percent(50.0).resolve(&ctx()), Some(400.0));
        assert_eq!(SizeValue::Px(33.0).resolve(&ctx()), Some(33.0));
        assert_eq!(SizeValue::Auto.resolve(&ctx()), None);
    }

    #[test]
    fn nonsense_clamps_to_zero() {
        assert_eq!(SizeValue::Px(-10.0).resolve(&ctx()), Some(0.0));
        assert_eq!(SizeValue::Px(f64::NAN).resolve(&ctx()), Some(0.0));
        assert_eq!(SizeValue::Percent(-5.0).resolve(&ctx()), Some(0.0));
    }
}
