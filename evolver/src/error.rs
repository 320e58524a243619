use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use evolution::EvoErr;
use machine_learning::MlErr;

/// The result type used in the entire evolver module.
pub type Result<T> = std::result::Result<T, EvolverErr>;

/// The evolver module's error type.
#[derive(Debug)]
pub enum EvolverErr {
    InvalidConfig(String),
    Io(io::Error),
    Json(serde_json::Error),
    Ml(MlErr),
    Evo(EvoErr),
}

impl Display for EvolverErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvolverErr::InvalidConfig(msg) => write!(f, "invalid run config: {msg}"),
            EvolverErr::Io(e) => write!(f, "io error: {e}"),
            EvolverErr::Json(e) => write!(f, "json error: {e}"),
            EvolverErr::Ml(e) => write!(f, "{e}"),
            EvolverErr::Evo(e) => write!(f, "{e}"),
        }
    }
}

impl Error for EvolverErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EvolverErr::InvalidConfig(_) => None,
            EvolverErr::Io(e) => Some(e),
            EvolverErr::Json(e) => Some(e),
            EvolverErr::Ml(e) => Some(e),
            EvolverErr::Evo(e) => Some(e),
        }
    }
}

impl From<io::Error> for EvolverErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for EvolverErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<MlErr> for EvolverErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

impl From<EvoErr> for EvolverErr {
    fn from(value: EvoErr) -> Self {
        Self::Evo(value)
    }
}
