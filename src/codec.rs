use crate::prelude::*;
use log::info;
use ndarray_npy::{NpzReader, NpzWriter};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Entry names of the persisted container, in file order.
pub const ENTRIES: [&str; 5] = ["architecture", "W1", "b1", "W2", "b2"];

/// Everything needed to rebuild a [`TwoLayerNetwork`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Parameters {
    pub architecture: Architecture,
    pub w1: Array2<f64>,
    pub b1: Array2<f64>,
    pub w2: Array2<f64>,
    pub b2: Array2<f64>,
}

/// On-disk encoding, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// NumPy `.npz` archive as written by `numpy.savez`.
    Npz,
    /// bincode of [`Parameters`].
    Bincode,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("npz") => Self::Npz,
            _ => Self::Bincode,
        }
    }
}

impl Parameters {
    /// Checks every tensor against the architecture and rejects non-finite
    /// values.
    pub fn validate(&self) -> Result<()> {
        let arch = self.architecture;
        if arch.input_dim == 0 || arch.hidden_dim == 0 || arch.output_dim == 0 {
            return Err(NNError::MalformedFile(format!(
                "architecture {:?} has a zero-sized layer",
                arch.to_array()
            )));
        }

        let expected = [
            ("W1", &self.w1, arch.w1_shape()),
            ("b1", &self.b1, arch.b1_shape()),
            ("W2", &self.w2, arch.w2_shape()),
            ("b2", &self.b2, arch.b2_shape()),
        ];
        for (name, tensor, shape) in expected {
            if tensor.dim() != shape {
                return Err(NNError::ShapeMismatch(format!(
                    "{} has shape {:?} but architecture {:?} requires {:?}",
                    name,
                    tensor.shape(),
                    arch.to_array(),
                    shape
                )));
            }
            if let Some(value) = tensor.iter().find(|v| !v.is_finite()) {
                return Err(NNError::MalformedFile(format!("{} contains non-finite value {}", name, value)));
            }
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        match ModelFormat::from_path(path) {
            ModelFormat::Npz => self.write_npz(path)?,
            ModelFormat::Bincode => {
                let encoded: Vec<u8> = bincode::serialize(self)?;
                File::create(path)?.write_all(&encoded)?;
            }
        }
        info!("saved parameters {:?} to {}", self.architecture.to_array(), path.display());
        Ok(())
    }

    /// Reads and validates a parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let parameters = match ModelFormat::from_path(path) {
            ModelFormat::Npz => Self::read_npz(path)?,
            ModelFormat::Bincode => {
                let mut buffer = Vec::new();
                File::open(path)?.read_to_end(&mut buffer)?;
                bincode::deserialize(&buffer)
                    .map_err(|err| NNError::MalformedFile(format!("{}: {}", path.display(), err)))?
            }
        };
        parameters.validate()?;
        info!("loaded parameters {:?} from {}", parameters.architecture.to_array(), path.display());
        Ok(parameters)
    }

    fn write_npz(&self, path: &Path) -> Result<()> {
        let architecture: Array1<i64> = self.architecture.to_array().iter().map(|&d| d as i64).collect();
        let mut npz = NpzWriter::new(File::create(path)?);
        npz.add_array(ENTRIES[0], &architecture)?;
        npz.add_array(ENTRIES[1], &self.w1)?;
        npz.add_array(ENTRIES[2], &self.b1)?;
        npz.add_array(ENTRIES[3], &self.w2)?;
        npz.add_array(ENTRIES[4], &self.b2)?;
        npz.finish()?;
        Ok(())
    }

    fn read_npz(path: &Path) -> Result<Self> {
        let mut npz = NpzReader::new(File::open(path)?)?;
        let names = npz.names()?;

        let name = entry_name(&names, ENTRIES[0])?;
        let dims: Vec<i64> = match npz.by_name::<OwnedRepr<i64>, Ix1>(name) {
            Ok(dims) => dims.to_vec(),
            // numpy on some platforms stores default ints as int32
            Err(_) => npz
                .by_name::<OwnedRepr<i32>, Ix1>(name)?
                .iter()
                .map(|&d| d as i64)
                .collect(),
        };
        let architecture = architecture_from_dims(&dims)?;

        Ok(Self {
            architecture,
            w1: read_matrix(&mut npz, &names, ENTRIES[1])?,
            b1: read_matrix(&mut npz, &names, ENTRIES[2])?,
            w2: read_matrix(&mut npz, &names, ENTRIES[3])?,
            b2: read_matrix(&mut npz, &names, ENTRIES[4])?,
        })
    }
}

/// Reads a float64 entry of any rank; anything but a matrix is a
/// `ShapeMismatch` naming the entry.
fn read_matrix(npz: &mut NpzReader<File>, names: &[String], key: &str) -> Result<Array2<f64>> {
    let tensor: ArrayD<f64> = npz
        .by_name(entry_name(names, key)?)
        .map_err(|err| NNError::MalformedFile(format!("{}: {}", key, err)))?;
    let shape = tensor.shape().to_vec();
    tensor.into_dimensionality::<Ix2>().map_err(|_| {
        NNError::ShapeMismatch(format!("{} must be 2-dimensional, got shape {:?}", key, shape))
    })
}

/// Archive member holding `key`, with or without the `.npy` suffix.
fn entry_name<'a>(names: &'a [String], key: &str) -> Result<&'a str> {
    names
        .iter()
        .find(|name| name.as_str() == key || name.strip_suffix(".npy") == Some(key))
        .map(String::as_str)
        .ok_or_else(|| NNError::MalformedFile(format!("missing entry '{}'", key)))
}

fn architecture_from_dims(dims: &[i64]) -> Result<Architecture> {
    match dims {
        &[input, hidden, output] if input > 0 && hidden > 0 && output > 0 => Ok(Architecture {
            input_dim: input as usize,
            hidden_dim: hidden as usize,
            output_dim: output as usize,
        }),
        _ => Err(NNError::MalformedFile(format!(
            "architecture must hold three positive sizes, got {:?}",
            dims
        ))),
    }
}
