use serde::{Deserialize, Serialize};

use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationFunction {
    ReLU,
    /// Normalizes over every element of the matrix at once, so it only
    /// yields a distribution when fed a single column of logits.
    Softmax,
}

impl ActivationFunction {
    pub fn apply(&self, m: &Matrix) -> Matrix {
        match self {
            ActivationFunction::ReLU => m.map(|x| x.max(0.0)),
            ActivationFunction::Softmax => {
                let sum: f64 = m.as_slice().iter().map(|x| x.exp()).sum();
                m.map(|x| x.exp() / sum)
            }
        }
    }

    /// Derivative evaluated at the pre-activation `m`.
    ///
    /// For `Softmax` this is a matrix of ones: the output gradient handed to
    /// the last layer already is `predicted - expected`, so the Jacobian is
    /// not applied a second time.
    pub fn derivative(&self, m: &Matrix) -> Matrix {
        match self {
            ActivationFunction::ReLU => m.map(|x| if x > 0.0 { 1.0 } else { 0.0 }),
            ActivationFunction::Softmax => m.map(|_| 1.0),
        }
    }
}
