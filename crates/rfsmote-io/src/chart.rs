//! Horizontal bar chart of the top feature importances.

use std::path::Path;
use std::sync::OnceLock;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use tracing::{info, instrument};

use crate::IoError;

/// DejaVu Sans, served for every `"sans-serif"` lookup plotters makes.
static SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

fn register_embedded_font() -> Result<(), String> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| register_font("sans-serif", FontStyle::Normal, SANS).is_ok());
    if ok {
        Ok(())
    } else {
        Err("embedded DejaVu Sans could not be parsed".to_string())
    }
}

/// Layout of the importance bar chart.
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `width`   | 1200 px |
/// | `height`  | 900 px  |
/// | `top_n`   | 15      |
#[derive(Debug, Clone)]
pub struct ImportanceChart {
    width: u32,
    height: u32,
    top_n: usize,
}

impl Default for ImportanceChart {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 900,
            top_n: 15,
        }
    }
}

impl ImportanceChart {
    /// Set the number of bars.
    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Set the image size in pixels.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Return the number of bars.
    #[must_use]
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Chart title.
    #[must_use]
    pub fn title(&self) -> String {
        format!(
            "Top {} RandomForest feature importances (SMOTE + class_weight)",
            self.top_n
        )
    }

    /// Render `ranked` (most important first) to a PNG at `path`.
    ///
    /// Only the first `top_n` entries are drawn; the most important bar sits
    /// at the top.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Chart`] if drawing or PNG encoding fails.
    #[instrument(skip_all, fields(path = %path.display(), top_n = self.top_n))]
    pub fn render(&self, path: &Path, ranked: &[(&str, f64)]) -> Result<(), IoError> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        self.draw(&root, ranked).map_err(|message| IoError::Chart {
            path: path.to_path_buf(),
            message,
        })?;
        info!(n_bars = ranked.len().min(self.top_n), "importance chart written");
        Ok(())
    }

    /// Draw the chart onto any plotters backend and flush it.
    pub(crate) fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        ranked: &[(&str, f64)],
    ) -> Result<(), String> {
        register_embedded_font()?;

        let top = &ranked[..ranked.len().min(self.top_n)];
        let n = top.len().max(1);
        let x_max = top.iter().map(|&(_, v)| v).fold(0.0f64, f64::max);
        let x_max = if x_max > 0.0 { x_max * 1.05 } else { 1.0 };

        // Bar `i` of `top` is drawn at segment `n - 1 - i` so rank 1 ends up on top.
        let label_of = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(pos) if *pos < top.len() => top[top.len() - 1 - pos].0.to_string(),
            _ => String::new(),
        };

        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title(), ("sans-serif", 26))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(260)
            .build_cartesian_2d(0.0..x_max, (0..n).into_segmented())
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&label_of)
            .x_desc("Importance")
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(
                Histogram::horizontal(&chart)
                    .style(RGBColor(31, 119, 180).filled())
                    .margin(6)
                    .data(
                        top.iter()
                            .enumerate()
                            .map(|(i, &(_, importance))| (top.len() - 1 - i, importance)),
                    ),
            )
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())
    }
}
