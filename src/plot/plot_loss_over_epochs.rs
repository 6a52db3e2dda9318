use plotters::prelude::*;
use log::info;

use crate::error::{NNError, Result};

/// Training loss per epoch on a log scale.
pub fn plot_loss_over_epochs(losses: &[f64], filename: &str) -> Result<()> {
    draw_losses(losses, filename).map_err(|err| NNError::PlotError(err.to_string()))?;
    info!("Loss plot has been saved as '{}'", filename);
    Ok(())
}

fn draw_losses(losses: &[f64], filename: &str) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let epochs = losses.len().max(1);

    // Adjust losses to avoid log of zero or negative numbers
    let log_losses: Vec<f64> = losses
        .iter()
        .map(|&l| if l <= 0.0 { 1e-10 } else { l })
        .map(f64::log10)
        .collect();

    let mut y_min = log_losses.iter().cloned().fold(f64::INFINITY, f64::min).floor();
    let mut y_max = log_losses.iter().cloned().fold(f64::NEG_INFINITY, f64::max).ceil();
    if !(y_min.is_finite() && y_max.is_finite()) {
        y_min = -1.0;
        y_max = 1.0;
    }
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }

    let mut chart = ChartBuilder::on(&root)
        .caption("Cross-Entropy Loss over Epochs (Log Scale)", ("sans-serif", 30).into_font())
        .margin(5)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0..epochs, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc("Loss (Log Scale)")
        .y_label_formatter(&|y| format!("1e{:.0}", y))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            log_losses.iter().enumerate().map(|(epoch, &log_loss)| (epoch, log_loss)),
            &BLUE,
        ))?
        .label("Training Loss")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
