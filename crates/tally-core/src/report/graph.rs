//! Proportional bar graphs

use super::Style;
use colored::Color;

/// Rescale `values` to integer widths summing to exactly `width`
///
/// The rounding residual goes to the largest segment (the first one on
/// ties). Negative or non-finite values count as 0. When every value is 0
/// all widths are 0.
pub fn normalize(values: &[f64], width: usize) -> Vec<usize> {
    let values: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() && *v > 0.0 { *v } else { 0.0 })
        .collect();
    let sum: f64 = values.iter().sum();

    if sum <= 0.0 {
        return vec![0; values.len()];
    }

    let scaled: Vec<f64> = values.iter().map(|v| v / sum * width as f64).collect();
    let mut widths: Vec<usize> = scaled.iter().map(|v| v.floor() as usize).collect();

    let used: usize = widths.iter().sum();
    let largest = scaled
        .iter()
        .enumerate()
        .fold(0, |best, (i, v)| if *v > scaled[best] { i } else { best });
    if let Some(slot) = widths.get_mut(largest) {
        *slot = (*slot + width).saturating_sub(used);
    }

    widths
}

/// A bar graph built from (value, color) segments
#[derive(Debug, Clone, Default)]
pub struct Graph {
    segments: Vec<(f64, Color)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(mut self, value: f64, color: Color) -> Self {
        self.segments.push((value, color));
        self
    }

    /// Render as `[####...] description`, `width` including the brackets
    pub fn render(&self, padding: usize, width: usize, description: &str, style: Style) -> String {
        let values: Vec<f64> = self.segments.iter().map(|(value, _)| *value).collect();
        let widths = normalize(&values, width.saturating_sub(2));

        let mut line = format!("{}[", " ".repeat(padding));
        for ((_, color), cells) in self.segments.iter().zip(widths) {
            line.push_str(&style.paint(&"#".repeat(cells), *color));
        }
        line.push_str("] ");
        line.push_str(description);
        line
    }
}
