use crate::prelude::*;
use csv::ReaderBuilder;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;

/// Labelled raw digit images, one image per column of `images`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub images: Array2<f64>,
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Permutes the examples, keeping every image with its label.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        self.images = self.images.select(Axis(1), &order);
        self.labels = order.iter().map(|&i| self.labels[i]).collect();
    }

    /// Consecutive column slices of at most `batch_size` examples.
    pub fn batches(&self, batch_size: usize) -> impl Iterator<Item = (ArrayView2<'_, f64>, &[usize])> + '_ {
        let batch_size = batch_size.max(1);
        (0..self.len()).step_by(batch_size).map(move |start| {
            let end = (start + batch_size).min(self.len());
            (self.images.slice(s![.., start..end]), &self.labels[start..end])
        })
    }
}

/// Reads a CSV file with one example per row: the label, then `pixels`
/// intensities in `[0, 255]`.
pub fn load_csv(path: impl AsRef<Path>, pixels: usize, has_headers: bool) -> Result<Dataset> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new().has_headers(has_headers).from_path(path)?;

    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != pixels + 1 {
            return Err(NNError::DatasetError(format!(
                "row {} has {} fields, expected {}",
                row,
                record.len(),
                pixels + 1
            )));
        }
        let label = record[0]
            .trim()
            .parse::<usize>()
            .map_err(|err| NNError::DatasetError(format!("row {}: bad label '{}': {}", row, &record[0], err)))?;
        labels.push(label);
        for field in record.iter().skip(1) {
            let value = field
                .trim()
                .parse::<f64>()
                .map_err(|err| NNError::DatasetError(format!("row {}: bad pixel '{}': {}", row, field, err)))?;
            values.push(value);
        }
    }

    // rows were read example-major; the network wants one example per column
    let images = Array2::from_shape_vec((labels.len(), pixels), values)?.reversed_axes();
    info!("loaded {} examples from {}", labels.len(), path.display());
    Ok(Dataset { images, labels })
}
