use std::{
    error::Error,
    fmt::{self, Display},
};

use machine_learning::MlErr;
use rand_distr::{NormalError, uniform::Error as UniformError};

/// The result type used in the entire evolution module.
pub type Result<T> = std::result::Result<T, EvoErr>;

/// The evolution module's error type.
#[derive(Debug)]
pub enum EvoErr {
    InvalidConfig(String),
    EmptyGenome,
    GenomeLength { got: usize, expected: usize },
    Ml(MlErr),
    NoPopulation,
}

impl Display for EvoErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvoErr::InvalidConfig(msg) => write!(f, "invalid genetic algorithm config: {msg}"),
            EvoErr::EmptyGenome => f.write_str("the initial genome has no genes"),
            EvoErr::GenomeLength { got, expected } => write!(
                f,
                "genome length mismatch, got {got} genes and expected {expected}"
            ),
            EvoErr::Ml(e) => write!(f, "fitness evaluation failed: {e}"),
            EvoErr::NoPopulation => f.write_str("the population is empty"),
        }
    }
}

impl Error for EvoErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EvoErr::Ml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for EvoErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

impl From<NormalError> for EvoErr {
    fn from(value: NormalError) -> Self {
        Self::InvalidConfig(value.to_string())
    }
}

impl From<UniformError> for EvoErr {
    fn from(value: UniformError) -> Self {
        Self::InvalidConfig(value.to_string())
    }
}
