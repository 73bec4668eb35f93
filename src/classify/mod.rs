//! Line classification.

mod noise;

pub use noise::{LineClass, NoiseClassifier, NoiseRule};
