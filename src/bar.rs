//! Proportional usage bar with a glide slope marker
//!
//! One bar encodes three facts: fill length is total consumption,
//! the marker cell is the elapsed-time reference, and when usage is
//! ahead of the marker the fill past it switches to the warning look.

/// Visual state of a single bar cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarCell {
    /// Consumption within the glide slope
    Fill,
    /// Consumption past the glide slope marker
    OverFill,
    Empty,
    /// Marker blended with the filled look (over budget)
    MarkerOnFill,
    /// Marker blended with the empty look
    MarkerOnEmpty,
}

impl BarCell {
    #[inline]
    pub fn is_marker(self) -> bool {
        matches!(self, BarCell::MarkerOnFill | BarCell::MarkerOnEmpty)
    }

    #[inline]
    pub fn is_filled(self) -> bool {
        matches!(self, BarCell::Fill | BarCell::OverFill)
    }
}

/// Lay out a bar of `width` cells for the given percentages.
///
/// Bars narrower than 3 cells produce nothing; the caller suppresses
/// the row. The marker is clamped to `width - 1` so it always has a
/// cell to occupy, even at 100%.
pub fn render_bar(width: u16, usage_pct: f64, glide_pct: f64) -> Vec<BarCell> {
    if width < 3 {
        return Vec::new();
    }
    let width = width as usize;

    let usage_cell = ((usage_pct / 100.0 * width as f64).round() as i64).clamp(0, width as i64) as usize;
    let glide_cell =
        ((glide_pct / 100.0 * width as f64).round() as i64).clamp(0, width as i64 - 1) as usize;
    let over_budget = usage_pct > glide_pct;

    let mut cells = Vec::with_capacity(width);
    for i in 0..width {
        let cell = if i == glide_cell {
            if over_budget {
                BarCell::MarkerOnFill
            } else {
                BarCell::MarkerOnEmpty
            }
        } else if i < usage_cell {
            if over_budget && i >= glide_cell {
                BarCell::OverFill
            } else {
                BarCell::Fill
            }
        } else {
            BarCell::Empty
        };
        cells.push(cell);
    }
    cells
}
