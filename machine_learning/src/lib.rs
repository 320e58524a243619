pub mod arch;
pub mod classifier;
pub mod dataset;
pub mod digits;
pub mod error;
pub mod initialization;
pub mod metrics;
pub mod optimization;
mod test;
pub mod training;

pub use classifier::{ClassifierSpec, MlpClassifier};
pub use dataset::Dataset;
pub use error::{MlErr, Result};
