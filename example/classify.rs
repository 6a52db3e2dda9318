use digitnet::config::DEFAULT_MODEL_PATH;
use digitnet::plot::plot_digit;
use digitnet::prelude::*;
use digitnet::server::PredictRequest;
use log::info;

/// Usage: `classify <image.json> [model path] [digit.png]`.
///
/// The image file uses the request body of `POST /api/predict`:
/// `{"image": [784 pixel values]}`.
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let image_path = args
        .next()
        .ok_or_else(|| NNError::InvalidConfig("usage: classify <image.json> [model] [digit.png]".to_string()))?;
    let model_path = args.next().unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());
    let plot_path = args.next();

    let request: PredictRequest = serde_json::from_reader(std::fs::File::open(&image_path)?)?;
    let model = TwoLayerNetwork::from_parameters(Parameters::load(&model_path)?)?;

    if let Some(plot_path) = plot_path {
        plot_digit(&request.image, &plot_path)?;
    }

    let prediction = model.predict(&request.image)?;
    info!("{} classified as {}", image_path, prediction);
    println!("{}", prediction);
    Ok(())
}
