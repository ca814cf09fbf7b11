use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::utils::error::{RelayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply(self, input: DVector<f64>) -> DVector<f64> {
        match self {
            Activation::Relu => input.map(|x| x.max(0.0)),
            Activation::Linear => input,
        }
    }
}

/// On-disk description of one dense layer.
///
/// `weights[i]` is the row of input coefficients feeding output unit `i`,
/// so every row must have the layer's input width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_dim: usize,
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: DMatrix<f64>,
    bias: DVector<f64>,
    activation: Activation,
}

impl DenseLayer {
    fn forward(&self, input: &DVector<f64>) -> DVector<f64> {
        self.activation.apply(&self.weights * input + &self.bias)
    }
}

/// Fixed feed-forward regression network.
#[derive(Debug, Clone)]
pub struct FeedForward {
    layers: Vec<DenseLayer>,
    input_dim: usize,
    output_dim: usize,
}

impl FeedForward {
    pub fn from_spec(spec: NetworkSpec) -> Result<Self> {
        if spec.input_dim == 0 {
            return Err(RelayError::ModelError {
                message: "network input_dim must be non-zero".to_string(),
            });
        }
        if spec.layers.is_empty() {
            return Err(RelayError::ModelError {
                message: "network has no layers".to_string(),
            });
        }

        let mut layers = Vec::with_capacity(spec.layers.len());
        let mut width = spec.input_dim;

        for (index, layer) in spec.layers.into_iter().enumerate() {
            let rows = layer.weights.len();
            if rows == 0 || rows != layer.bias.len() {
                return Err(RelayError::ModelError {
                    message: format!(
                        "layer {}: {} weight rows vs {} bias values",
                        index,
                        rows,
                        layer.bias.len()
                    ),
                });
            }
            for row in &layer.weights {
                if row.len() != width {
                    return Err(RelayError::ModelError {
                        message: format!(
                            "layer {}: weight row has {} columns, expected {}",
                            index,
                            row.len(),
                            width
                        ),
                    });
                }
            }

            let flat: Vec<f64> = layer.weights.iter().flatten().copied().collect();
            layers.push(DenseLayer {
                weights: DMatrix::from_row_slice(rows, width, &flat),
                bias: DVector::from_vec(layer.bias),
                activation: layer.activation,
            });
            width = rows;
        }

        Ok(Self {
            layers,
            input_dim: spec.input_dim,
            output_dim: width,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_dim {
            return Err(RelayError::ModelError {
                message: format!(
                    "network expects {} inputs, got {}",
                    self.input_dim,
                    input.len()
                ),
            });
        }

        let mut activations = DVector::from_column_slice(input);
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }
        Ok(activations.iter().copied().collect())
    }
}
