use plotters::prelude::*;
use log::info;

use crate::core::normalization::PIXEL_MAX;
use crate::error::{NNError, Result};

/// Width and height of a digit image in pixels.
pub const IMAGE_SIDE: usize = 28;
const CELL: u32 = 10;

/// Renders a flattened 28×28 image as a viridis heatmap PNG.
pub fn plot_digit(pixels: &[f64], filename: &str) -> Result<()> {
    if pixels.len() != IMAGE_SIDE * IMAGE_SIDE {
        return Err(NNError::ShapeMismatch(format!(
            "expected {} pixels, got {}",
            IMAGE_SIDE * IMAGE_SIDE,
            pixels.len()
        )));
    }
    draw_digit(pixels, filename).map_err(|err| NNError::PlotError(err.to_string()))?;
    info!("Digit plot has been saved as '{}'", filename);
    Ok(())
}

fn draw_digit(pixels: &[f64], filename: &str) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let side = IMAGE_SIDE as u32 * CELL;
    let root = BitMapBackend::new(filename, (side, side)).into_drawing_area();
    root.fill(&WHITE)?;

    let color_gradient = colorous::VIRIDIS;
    for (i, &value) in pixels.iter().enumerate() {
        let row = (i / IMAGE_SIDE) as i32;
        let col = (i % IMAGE_SIDE) as i32;
        let color = color_gradient.eval_continuous((value / PIXEL_MAX).clamp(0.0, 1.0));
        let cell = CELL as i32;
        root.draw(&Rectangle::new(
            [(col * cell, row * cell), ((col + 1) * cell, (row + 1) * cell)],
            RGBColor(color.r, color.g, color.b).filled(),
        ))?;
    }

    root.present()?;
    Ok(())
}
