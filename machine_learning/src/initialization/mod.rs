mod chained;
mod constant;
mod param_gen;
mod random;

use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use chained::ChainedParamGen;
pub use constant::ConstParamGen;
pub use param_gen::ParamGen;
pub use random::RandParamGen;

use crate::{
    MlErr, Result,
    arch::{Model, Sequential},
};

/// The scheme used to draw a layer's initial weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// `U(-sqrt(6 / (fan_in + fan_out)), sqrt(6 / (fan_in + fan_out)))`.
    #[default]
    XavierUniform,
    /// `U(-sqrt(3 / fan_in), sqrt(3 / fan_in))`.
    LecunUniform,
    /// `N(0, sqrt(2 / fan_in))`.
    Kaiming,
    /// `N(0, sqrt(1 / fan_in))`.
    Lecun,
}

impl WeightInit {
    fn param_gen<R>(
        self,
        rng: Rc<RefCell<R>>,
        fan_in: usize,
        fan_out: usize,
    ) -> Result<Box<dyn ParamGen>>
    where
        R: Rng + 'static,
    {
        let limit = fan_in * fan_out;

        let param_gen: Box<dyn ParamGen> = match self {
            WeightInit::XavierUniform => {
                Box::new(RandParamGen::xavier_uniform(rng, limit, fan_in, fan_out)?)
            }
            WeightInit::LecunUniform => Box::new(RandParamGen::lecun_uniform(rng, limit, fan_in)?),
            WeightInit::Kaiming => Box::new(RandParamGen::kaiming(rng, limit, fan_in)?),
            WeightInit::Lecun => Box::new(RandParamGen::lecun(rng, limit, fan_in)?),
        };

        Ok(param_gen)
    }
}

/// Generates the initial parameters of a `Sequential`: weights drawn with `init` and zero
/// biases for every layer, in the model's flat layout.
///
/// # Arguments
/// * `model` - The model to initialize.
/// * `init` - The weight initialization scheme.
/// * `rng` - A random number generator.
///
/// # Returns
/// The parameters or an error if a layer's distribution is invalid.
pub fn init_sequential<R>(
    model: &Sequential,
    init: WeightInit,
    rng: Rc<RefCell<R>>,
) -> Result<Vec<f32>>
where
    R: Rng + 'static,
{
    let mut param_gens: Vec<Box<dyn ParamGen>> = Vec::with_capacity(model.layers().len() * 2);

    for layer in model.layers() {
        let (fan_in, fan_out) = layer.dim();
        param_gens.push(init.param_gen(Rc::clone(&rng), fan_in, fan_out)?);
        param_gens.push(Box::new(ConstParamGen::new(0., fan_out)));
    }

    let size = model.size();
    let params = ChainedParamGen::new(param_gens)
        .sample(size)
        .unwrap_or_default();

    if params.len() != size {
        return Err(MlErr::SizeMismatch {
            what: "initial params",
            got: params.len(),
            expected: size,
        });
    }

    Ok(params)
}
