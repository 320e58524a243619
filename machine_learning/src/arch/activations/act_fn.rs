use super::Sigmoid;

/// The activation functions a `Dense` layer may apply after its affine transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActFn {
    Identity,
    Sigmoid(Sigmoid),
    Tanh,
    Relu,
}
use ActFn::*;

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Sigmoid(Sigmoid::new(amp))
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            Identity => x,
            Sigmoid(a) => a.f(x),
            Tanh => x.tanh(),
            Relu => x.max(0.),
        }
    }

    pub fn df(&self, x: f32) -> f32 {
        match self {
            Identity => 1.,
            Sigmoid(a) => a.df(x),
            Tanh => 1. - x.tanh().powi(2),
            Relu => {
                if x > 0. {
                    1.
                } else {
                    0.
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_clips_negatives() {
        assert_eq!(Relu.f(-3.), 0.);
        assert_eq!(Relu.f(2.5), 2.5);
        assert_eq!(Relu.df(-3.), 0.);
        assert_eq!(Relu.df(2.5), 1.);
    }

    #[test]
    fn tanh_derivative_matches_finite_difference() {
        let h = 1e-3;
        let x = 0.3;
        let numeric = (Tanh.f(x + h) - Tanh.f(x - h)) / (2. * h);
        assert!((numeric - Tanh.df(x)).abs() < 1e-3);
    }
}
