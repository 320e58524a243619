mod mlp;
mod spec;

pub use mlp::MlpClassifier;
pub use spec::{ActFnSpec, ClassifierSpec, SolverSpec};
