//! Three-region column layout resolution

use std::sync::Arc;

use ahash::AHashMap;
use tracing::trace;

use vt_core::schema::TypeCategory;

use crate::units::{SizeValue, UnitContext};

/// Horizontal region a column is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Left,
    Center,
    Right,
}

/// User-declared sizing for one column
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub key: String,
    /// Category used for width inference when no width is declared
    pub category: TypeCategory,
    pub width: Option<SizeValue>,
    pub flex: Option<f64>,
    pub min_width: Option<SizeValue>,
    pub max_width: Option<SizeValue>,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            category: TypeCategory::Unknown,
            width: None,
            flex: None,
            min_width: None,
            max_width: None,
        }
    }

    pub fn category(mut self, category: TypeCategory) -> Self {
        self.category = category;
        self
    }

    pub fn width(mut self, width: impl Into<SizeValue>) -> Self {
        self.width = Some(width.into());
        self
    }

    /// Width given as a declaration string (`"120px"`, `"10%"`, `"5rem"`,
    /// `"auto"`, ...). Unparseable strings fall back to `auto`.
    pub fn width_str(mut self, width: &str) -> Self {
        self.width = Some(SizeValue::parse(width).unwrap_or(SizeValue::Auto));
        self
    }

    pub fn flex(mut self, weight: f64) -> Self {
        self.flex = Some(weight);
        self
    }

    pub fn min_width(mut self, min: impl Into<SizeValue>) -> Self {
        self.min_width = Some(min.into());
        self
    }

    pub fn max_width(mut self, max: impl Into<SizeValue>) -> Self {
        self.max_width = Some(max.into());
        self
    }
}

/// Ordered pin assignments; keys absent from both lists are centered
#[derive(Debug, Clone, Default)]
pub struct PinnedColumns {
    pub left: Vec<String>,
    pub right: Vec<String>,
}

/// Row height measurements, each resolved through the unit system
#[derive(Debug, Clone)]
pub struct RowMetrics {
    pub num_lines: usize,
    pub line_height: SizeValue,
    pub padding: SizeValue,
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self {
            num_lines: 1,
            line_height: SizeValue::Em(1.5),
            padding: SizeValue::Px(8.0),
        }
    }
}

/// One laid-out column
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub key: String,
    pub width: f64,
    /// Pixel offset from the start of the column's region
    pub offset: f64,
    pub region: Region,
}

/// Immutable layout snapshot; recomputation yields a new one
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    pub columns: Vec<ResolvedColumn>,
    pub left_total: f64,
    pub center_total: f64,
    pub right_total: f64,
    pub row_height: f64,
    index: AHashMap<String, usize>,
}

impl ColumnLayout {
    pub fn total_width(&self) -> f64 {
        self.left_total + self.center_total + self.right_total
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedColumn> {
        self.index.get(key).map(|&i| &self.columns[i])
    }

    pub fn width_of(&self, key: &str) -> Option<f64> {
        self.get(key).map(|c| c.width)
    }

    pub fn offset_of(&self, key: &str) -> Option<f64> {
        self.get(key).map(|c| c.offset)
    }

    pub fn region_of(&self, key: &str) -> Option<Region> {
        self.get(key).map(|c| c.region)
    }
}

/// Default column width by category, in rem
fn default_width(category: TypeCategory) -> SizeValue {
    let rem = match category {
        TypeCategory::Boolean => 4.0,
        TypeCategory::Numeric | TypeCategory::Enum => 7.0,
        TypeCategory::Binary | TypeCategory::Unknown => 8.0,
        TypeCategory::Text => 10.0,
        TypeCategory::Temporal => 11.0,
        TypeCategory::Complex | TypeCategory::Geo => 14.0,
        TypeCategory::Identifier => 18.0,
    };
    SizeValue::Rem(rem)
}

/// Resolves column specs into a pixel layout and caches the snapshot.
///
/// Consumers hold the returned `Arc<ColumnLayout>`; any input change
/// invalidates the cache and the next `snapshot` call recomputes.
pub struct LayoutEngine {
    specs: Vec<ColumnSpec>,
    pins: PinnedColumns,
    ctx: UnitContext,
    row_metrics: RowMetrics,
    cached: Option<Arc<ColumnLayout>>,
}

impl LayoutEngine {
    pub fn new(specs: Vec<ColumnSpec>) -> Self {
        Self {
            specs,
            pins: PinnedColumns::default(),
            ctx: UnitContext::default(),
            row_metrics: RowMetrics::default(),
            cached: None,
        }
    }

    pub fn set_specs(&mut self, specs: Vec<ColumnSpec>) {
        self.specs = specs;
        self.cached = None;
    }

    pub fn set_pins(&mut self, pins: PinnedColumns) {
        self.pins = pins;
        self.cached = None;
    }

    pub fn set_container_width(&mut self, width: f64) {
        self.ctx.container_width = width;
        self.cached = None;
    }

    pub fn set_fonts(&mut self, root_font_px: f64, table_font_px: f64) {
        self.ctx.root_font_px = root_font_px;
        self.ctx.table_font_px = table_font_px;
        self.cached = None;
    }

    pub fn set_row_metrics(&mut self, metrics: RowMetrics) {
        self.row_metrics = metrics;
        self.cached = None;
    }

    /// Current layout, recomputed if any input changed since the last call
    pub fn snapshot(&mut self) -> Arc<ColumnLayout> {
        if let Some(cached) = &self.cached {
            return cached.clone();
        }
        let layout = Arc::new(compute_layout(
            &self.specs,
            &self.pins,
            &self.ctx,
            &self.row_metrics,
        ));
        self.cached = Some(layout.clone());
        layout
    }
}

/// Lay out all columns across the three pin regions.
///
/// Left and right regions size to their natural totals; the center region
/// distributes `container_width - left - right` among its flex columns.
pub fn compute_layout(
    specs: &[ColumnSpec],
    pins: &PinnedColumns,
    ctx: &UnitContext,
    row_metrics: &RowMetrics,
) -> ColumnLayout {
    let by_key: AHashMap<&str, &ColumnSpec> =
        specs.iter().map(|s| (s.key.as_str(), s)).collect();

    let pick = |keys: &[String]| -> Vec<&ColumnSpec> {
        keys.iter()
            .filter_map(|k| by_key.get(k.as_str()).copied())
            .collect()
    };
    let left_specs = pick(&pins.left);
    let right_specs = pick(&pins.right);
    let center_specs: Vec<&ColumnSpec> = specs
        .iter()
        .filter(|s| !pins.left.contains(&s.key) && !pins.right.contains(&s.key))
        .collect();

    let (left_cols, left_total) = layout_region(&left_specs, None, Region::Left, ctx);
    let (right_cols, right_total) = layout_region(&right_specs, None, Region::Right, ctx);
    let center_budget = (ctx.container_width - left_total - right_total).max(0.0);
    let (center_cols, center_total) =
        layout_region(&center_specs, Some(center_budget), Region::Center, ctx);

    trace!(
        left = left_total,
        center = center_total,
        right = right_total,
        "layout recomputed"
    );

    let mut columns = Vec::with_capacity(specs.len());
    columns.extend(left_cols);
    columns.extend(center_cols);
    columns.extend(right_cols);

    let index = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.key.clone(), i))
        .collect();

    let line_height = row_metrics.line_height.resolve(ctx).unwrap_or(0.0);
    let padding = row_metrics.padding.resolve(ctx).unwrap_or(0.0);
    let row_height = row_metrics.num_lines as f64 * line_height + padding;

    ColumnLayout {
        columns,
        left_total,
        center_total,
        right_total,
        row_height,
        index,
    }
}

struct WorkColumn {
    key: String,
    width: f64,
    min: f64,
    max: f64,
    flex: Option<f64>,
    clamped: bool,
}

/// Lay out one region. `budget` caps flex distribution (center only);
/// pinned regions size to their natural totals, so their flex columns
/// degrade to the category default width.
fn layout_region(
    specs: &[&ColumnSpec],
    budget: Option<f64>,
    region: Region,
    ctx: &UnitContext,
) -> (Vec<ResolvedColumn>, f64) {
    let mut work: Vec<WorkColumn> = specs
        .iter()
        .map(|spec| {
            let min = spec
                .min_width
                .and_then(|m| m.resolve(ctx))
                .unwrap_or(0.0);
            let max = spec
                .max_width
                .and_then(|m| m.resolve(ctx))
                .unwrap_or(f64::INFINITY)
                .max(min);

            let declared = spec.width.and_then(|w| w.resolve(ctx));
            let flex = if declared.is_none() { spec.flex } else { None };
            let width = match (declared, flex) {
                (Some(px), _) => px.clamp(min, max),
                (None, Some(_)) if budget.is_some() => 0.0,
                // auto, or flex in an uncapped region
                _ => default_width(spec.category)
                    .resolve(ctx)
                    .unwrap_or(0.0)
                    .clamp(min, max),
            };
            WorkColumn {
                key: spec.key.clone(),
                width,
                min,
                max,
                flex: if budget.is_some() { flex } else { None },
                clamped: false,
            }
        })
        .collect();

    if let Some(budget) = budget {
        distribute_flex(&mut work, budget);
    }

    let mut offset = 0.0;
    let columns = work
        .into_iter()
        .map(|col| {
            let resolved = ResolvedColumn {
                key: col.key,
                width: col.width,
                offset,
                region,
            };
            offset += resolved.width;
            resolved
        })
        .collect();
    (columns, offset)
}

/// Distribute the remaining budget among flex columns proportionally to
/// their weights, with a second pass redistributing what min/max clamping
/// freed or consumed. If every flex column clamps, the overflow stands.
fn distribute_flex(work: &mut [WorkColumn], budget: f64) {
    let fixed_sum: f64 = work
        .iter()
        .filter(|c| c.flex.is_none())
        .map(|c| c.width)
        .sum();
    let weight_sum: f64 = work.iter().filter_map(|c| c.flex).sum();
    if weight_sum <= 0.0 {
        return;
    }
    let remaining = (budget - fixed_sum).max(0.0);

    for col in work.iter_mut() {
        if let Some(weight) = col.flex {
            let share = remaining * weight / weight_sum;
            col.width = share.clamp(col.min, col.max);
            col.clamped = col.width != share;
        }
    }

    let clamped_sum: f64 = work
        .iter()
        .filter(|c| c.flex.is_some() && c.clamped)
        .map(|c| c.width)
        .sum();
    let free_weight: f64 = work
        .iter()
        .filter(|c| !c.clamped)
        .filter_map(|c| c.flex)
        .sum();
    if free_weight > 0.0 {
        let leftover = (remaining - clamped_sum).max(0.0);
        for col in work.iter_mut() {
            if col.flex.is_some() && !col.clamped {
                let share = leftover * col.flex.unwrap_or(0.0) / free_weight;
                col.width = share.clamp(col.min, col.max);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(container: f64) -> UnitContext {
        UnitContext {
            container_width: container,
            root_font_px: 16.0,
            table_font_px: 14.0,
        }
    }

    fn keys_and_widths(layout: &ColumnLayout) -> Vec<(String, f64)> {
        layout
            .columns
            .iter()
            .map(|c| (c.key.clone(), c.width))
            .collect()
    }

    #[test]
    fn mixed_units_and_flex() {
        let specs = vec![
            ColumnSpec::new("a").width_str("5rem"),
            ColumnSpec::new("b").flex(2.0),
            ColumnSpec::new("c").flex(1.0),
            ColumnSpec::new("d").width_str("10%"),
        ];
        let layout = compute_layout(
            &specs,
            &PinnedColumns::default(),
            &ctx(800.0),
            &RowMetrics::default(),
        );

        let widths = keys_and_widths(&layout);
        assert_eq!(widths[0], ("a".into(), 80.0));
        assert!((widths[1].1 - 640.0 * 2.0 / 3.0).abs() < 1e-6);
        assert!((widths[2].1 - 640.0 / 3.0).abs() < 1e-6);
        assert_eq!(widths[3], ("d".into(), 80.0));

        assert_eq!(layout.offset_of("a"), Some(0.0));
        assert_eq!(layout.offset_of("b"), Some(80.0));
        assert!((layout.offset_of("c").unwrap() - 506.666_666_666).abs() < 1e-6);
        assert!((layout.offset_of("d").unwrap() - 720.0).abs() < 1e-6);
    }

    #[test]
    fn center_fills_budget_when_flex_unclamped() {
        let specs = vec![
            ColumnSpec::new("pin").width(100.0),
            ColumnSpec::new("x").flex(1.0),
            ColumnSpec::new("y").width(60.0),
            ColumnSpec::new("z").flex(3.0),
        ];
        let pins = PinnedColumns {
            left: vec!["pin".into()],
            right: vec![],
        };
        let layout = compute_layout(&specs, &pins, &ctx(900.0), &RowMetrics::default());

        assert_eq!(layout.left_total, 100.0);
        assert!((layout.center_total - 800.0).abs() < 1e-6);
        assert!((layout.total_width() - 900.0).abs() < 1e-6);
    }

    #[test]
    fn regions_partition_and_offsets_reset() {
        let specs = vec![
            ColumnSpec::new("l1").width(50.0),
            ColumnSpec::new("c1").width(100.0),
            ColumnSpec::new("c2").width(100.0),
            ColumnSpec::new("r1").width(70.0),
        ];
        let pins = PinnedColumns {
            left: vec!["l1".into()],
            right: vec!["r1".into()],
        };
        let layout = compute_layout(&specs, &pins, &ctx(800.0), &RowMetrics::default());

        assert_eq!(layout.region_of("l1"), Some(Region::Left));
        assert_eq!(layout.region_of("c1"), Some(Region::Center));
        assert_eq!(layout.region_of("r1"), Some(Region::Right));
        // Offsets restart at zero in each region.
        assert_eq!(layout.offset_of("l1"), Some(0.0));
        assert_eq!(layout.offset_of("c1"), Some(0.0));
        assert_eq!(layout.offset_of("c2"), Some(100.0));
        assert_eq!(layout.offset_of("r1"), Some(0.0));
    }

    #[test]
    fn clamped_flex_redistributes() {
        let specs = vec![
            ColumnSpec::new("a").flex(1.0).max_width(100.0),
            ColumnSpec::new("b").flex(1.0),
        ];
        let layout = compute_layout(
            &specs,
            &PinnedColumns::default(),
            &ctx(600.0),
            &RowMetrics::default(),
        );
        assert_eq!(layout.width_of("a"), Some(100.0));
        assert_eq!(layout.width_of("b"), Some(500.0));
        assert!((layout.center_total - 600.0).abs() < 1e-6);
    }

    #[test]
    fn all_flex_clamped_accepts_overflow() {
        let specs = vec![
            ColumnSpec::new("a").flex(1.0).min_width(400.0),
            ColumnSpec::new("b").flex(1.0).min_width(400.0),
        ];
        let layout = compute_layout(
            &specs,
            &PinnedColumns::default(),
            &ctx(600.0),
            &RowMetrics::default(),
        );
        assert_eq!(layout.width_of("a"), Some(400.0));
        assert_eq!(layout.width_of("b"), Some(400.0));
        assert!(layout.center_total > 600.0);
    }

    #[test]
    fn auto_width_uses_category_default() {
        let specs = vec![
            ColumnSpec::new("n")
                .category(TypeCategory::Numeric)
                .width(SizeValue::Auto),
            ColumnSpec::new("id").category(TypeCategory::Identifier),
        ];
        let layout = compute_layout(
            &specs,
            &PinnedColumns::default(),
            &ctx(2000.0),
            &RowMetrics::default(),
        );
        assert_eq!(layout.width_of("n"), Some(7.0 * 16.0));
        assert_eq!(layout.width_of("id"), Some(18.0 * 16.0));
    }

    #[test]
    fn zero_container_keeps_fixed_columns() {
        let specs = vec![
            ColumnSpec::new("fixed").width(120.0),
            ColumnSpec::new("fluid").flex(1.0),
        ];
        let layout = compute_layout(
            &specs,
            &PinnedColumns::default(),
            &ctx(0.0),
            &RowMetrics::default(),
        );
        assert_eq!(layout.width_of("fixed"), Some(120.0));
        assert_eq!(layout.width_of("fluid"), Some(0.0));
    }

    #[test]
    fn row_height_from_measurements() {
        let metrics = RowMetrics {
            num_lines: 2,
            line_height: SizeValue::Em(1.5),
            padding: SizeValue::Px(10.0),
        };
        let layout = compute_layout(&[], &PinnedColumns::default(), &ctx(800.0), &metrics);
        // 2 lines x 1.5em x 14px + 10px
        assert!((layout.row_height - 52.0).abs() < 1e-6);
    }

    #[test]
    fn engine_caches_until_inputs_change() {
        let mut engine = LayoutEngine::new(vec![ColumnSpec::new("a").flex(1.0)]);
        engine.set_container_width(500.0);
        let first = engine.snapshot();
        let second = engine.snapshot();
        assert!(Arc::ptr_eq(&first, &second));

        engine.set_container_width(600.0);
        let third = engine.snapshot();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.width_of("a"), Some(600.0));
    }
}
