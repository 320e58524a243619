use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use rand_distr::{NormalError, uniform::Error as UniformError};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidDataset(String),
    InvalidSpec(String),
    NotFitted,
    Io(io::Error),
    Parse {
        line: usize,
        msg: String,
    },
    Rand(String),
    Shape(ndarray::ShapeError),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::InvalidDataset(msg) => write!(f, "invalid dataset: {msg}"),
            MlErr::InvalidSpec(msg) => write!(f, "invalid spec: {msg}"),
            MlErr::NotFitted => write!(
                f,
                "the classifier has no parameters yet, call `fit` or `set_params` first"
            ),
            MlErr::Io(e) => write!(f, "io error: {e}"),
            MlErr::Parse { line, msg } => write!(f, "parse error at line {line}: {msg}"),
            MlErr::Rand(msg) => write!(f, "invalid distribution: {msg}"),
            MlErr::Shape(e) => write!(f, "shape error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Io(e) => Some(e),
            MlErr::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ndarray::ShapeError> for MlErr {
    fn from(value: ndarray::ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<NormalError> for MlErr {
    fn from(value: NormalError) -> Self {
        Self::Rand(value.to_string())
    }
}

impl From<UniformError> for MlErr {
    fn from(value: UniformError) -> Self {
        Self::Rand(value.to_string())
    }
}
