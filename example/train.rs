use digitnet::config::TrainConfig;
use digitnet::core::losses::one_hot;
use digitnet::dataset::load_csv;
use digitnet::plot::plot_loss_over_epochs;
use digitnet::prelude::*;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Usage: `train [config.json]`. Without a config file the defaults are used.
fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => TrainConfig::from_json_file(path)?,
        None => TrainConfig::default(),
    };
    config.validate()?;

    let mut dataset = load_csv(&config.data_path, Architecture::DIGIT_INPUTS, config.has_headers)?;
    if dataset.is_empty() {
        return Err(NNError::DatasetError(format!("{} holds no examples", config.data_path.display())));
    }
    let batch_size = config.batch_size.unwrap_or(dataset.len());

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut model = TwoLayerNetwork::new(Architecture::digits(config.hidden_dim)?)?;
    model.summary();

    let mut losses = Vec::with_capacity(config.epochs);
    for epoch in 0..config.epochs {
        if config.shuffle {
            dataset.shuffle(&mut rng);
        }
        let mut epoch_loss = 0.0;
        for (images, labels) in dataset.batches(batch_size) {
            let mut x = images.to_owned();
            x.normalize_pixels();
            let y = one_hot(labels, Architecture::DIGIT_CLASSES)?;
            epoch_loss += model.train_step(&x, &y, config.learning_rate)? * labels.len() as f64;
        }
        epoch_loss /= dataset.len() as f64;
        info!("Epoch: {}/{} loss: {:.6}", epoch + 1, config.epochs, epoch_loss);
        losses.push(epoch_loss);
    }

    let accuracy = model.evaluate(dataset.images.clone(), &dataset.labels)?;
    info!("training accuracy: {:.2}%", accuracy * 100.0);

    model.to_parameters().save(&config.model_path)?;
    if let Some(plot) = &config.loss_plot {
        plot_loss_over_epochs(&losses, &plot.to_string_lossy())?;
    }
    Ok(())
}
