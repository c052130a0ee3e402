//! Dense neural network classifier (CPU-only).
//!
//! Small MLPs exported to JSON by the training pipeline:
//! - one output unit: binary classifier, the output is the positive-class
//!   logit (or probability when the last layer is already `sigmoid`)
//! - `k` output units: multiclass logits, softmax over `classes`
//!
//! Shapes are validated at load time so inference can only fail on a row of
//! the wrong width.

use serde::{Deserialize, Serialize};

use super::classifier::{argmax, check_width, sigmoid, softmax, ClassLabel, Classifier};
use crate::error::InferenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Tanh,
    Sigmoid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weights shape: [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    /// Bias shape: [out_dim]
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn out_dim(&self) -> usize {
        self.weights.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    /// Expected input dimension.
    pub input_dim: usize,

    /// Optional z-score normalization.
    #[serde(default)]
    pub input_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub input_std: Option<Vec<f64>>,

    pub layers: Vec<DenseLayer>,

    /// Without classes the network has no probability interface and
    /// predicts the arg-max output index.
    #[serde(default)]
    pub classes: Option<Vec<ClassLabel>>,
}

impl DenseNetwork {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.input_dim == 0 {
            return Err("input_dim must be > 0".to_string());
        }
        if self.layers.is_empty() {
            return Err("layers must not be empty".to_string());
        }
        if let (Some(mean), Some(std)) = (&self.input_mean, &self.input_std) {
            if mean.len() != self.input_dim {
                return Err(format!(
                    "input_mean length {} != input_dim {}",
                    mean.len(),
                    self.input_dim
                ));
            }
            if std.len() != self.input_dim {
                return Err(format!(
                    "input_std length {} != input_dim {}",
                    std.len(),
                    self.input_dim
                ));
            }
            if std.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err("input_std must be finite and > 0".to_string());
            }
        } else if self.input_mean.is_some() || self.input_std.is_some() {
            return Err("input_mean and input_std must be provided together".to_string());
        }

        let mut expected_in = self.input_dim;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.out_dim() == 0 {
                return Err(format!("layer[{idx}] out_dim must be > 0"));
            }
            if layer.bias.len() != layer.out_dim() {
                return Err(format!(
                    "layer[{idx}] bias len {} != out_dim {}",
                    layer.bias.len(),
                    layer.out_dim()
                ));
            }
            for (r, row) in layer.weights.iter().enumerate() {
                if row.len() != expected_in {
                    return Err(format!(
                        "layer[{idx}] weights row {r} len {} != expected in_dim {expected_in}",
                        row.len()
                    ));
                }
                if row.iter().any(|v| !v.is_finite()) {
                    return Err(format!("layer[{idx}] weights contain non-finite values"));
                }
            }
            if layer.bias.iter().any(|v| !v.is_finite()) {
                return Err(format!("layer[{idx}] bias contain non-finite values"));
            }
            expected_in = layer.out_dim();
        }

        let output_dim = self.output_dim();
        if output_dim > 1 && self.last_activation() != Activation::Linear {
            return Err("multiclass output layer must be linear (softmax is applied)".to_string());
        }
        if let Some(classes) = &self.classes {
            let expected = output_dim.max(2);
            if classes.len() != expected {
                return Err(format!(
                    "{} classes declared, output layer implies {expected}",
                    classes.len()
                ));
            }
        }
        Ok(())
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.out_dim()).unwrap_or(0)
    }

    fn last_activation(&self) -> Activation {
        self.layers
            .last()
            .map(|l| l.activation)
            .unwrap_or_default()
    }

    pub fn forward(&self, input: &[f64]) -> std::result::Result<Vec<f64>, InferenceError> {
        check_width(input, self.input_dim)?;

        let mut x: Vec<f64> = input.to_vec();

        if let (Some(mean), Some(std)) = (&self.input_mean, &self.input_std) {
            for i in 0..x.len() {
                let denom = std[i].max(1e-12);
                x[i] = (x[i] - mean[i]) / denom;
            }
        }

        for layer in &self.layers {
            let mut y = Vec::with_capacity(layer.out_dim());
            for (row, bias) in layer.weights.iter().zip(&layer.bias) {
                let sum = bias + row.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>();
                y.push(apply_activation(sum, layer.activation));
            }
            x = y;
        }

        Ok(x)
    }

    /// Class distribution over the output units; a single unit is expanded
    /// to `[1 - p, p]`.
    fn distribution(&self, row: &[f64]) -> std::result::Result<Vec<f64>, InferenceError> {
        let out = self.forward(row)?;
        if out.len() == 1 {
            let p = match self.last_activation() {
                Activation::Sigmoid => out[0],
                _ => sigmoid(out[0]),
            };
            return Ok(vec![1.0 - p, p]);
        }
        softmax(&out)
    }
}

impl Classifier for DenseNetwork {
    fn kind(&self) -> &'static str {
        "mlp"
    }

    fn n_features(&self) -> usize {
        self.input_dim
    }

    fn classes(&self) -> Option<&[ClassLabel]> {
        self.classes.as_deref()
    }

    fn predict(&self, row: &[f64]) -> std::result::Result<ClassLabel, InferenceError> {
        let dist = self.distribution(row)?;
        // Binary ties resolve to the negative class, matching a `p > 0.5` rule.
        let idx = argmax(&dist);
        match &self.classes {
            Some(classes) => Ok(classes[idx].clone()),
            None => Ok(ClassLabel::Int(idx as i64)),
        }
    }

    fn predict_proba(&self, row: &[f64]) -> Option<std::result::Result<Vec<f64>, InferenceError>> {
        self.classes.as_ref()?;
        Some(self.distribution(row))
    }
}

fn apply_activation(x: f64, act: Activation) -> f64 {
    match act {
        Activation::Linear => x,
        Activation::Relu => x.max(0.0),
        Activation::Tanh => x.tanh(),
        Activation::Sigmoid => sigmoid(x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_net(classes: Option<Vec<ClassLabel>>) -> DenseNetwork {
        DenseNetwork {
            input_dim: 2,
            input_mean: None,
            input_std: None,
            layers: vec![DenseLayer {
                weights: vec![vec![1.0, 2.0]],
                bias: vec![0.0],
                activation: Activation::Linear,
            }],
            classes,
        }
    }

    #[test]
    fn binary_output_is_sigmoid_of_logit() {
        let net = binary_net(Some(vec![ClassLabel::Int(0), ClassLabel::Int(1)]));
        net.validate().unwrap();

        let p0 = net.predict_proba(&[0.0, 0.0]).unwrap().unwrap();
        assert!((p0[1] - 0.5).abs() < 1e-12);

        let p1 = net.predict_proba(&[1.0, 0.0]).unwrap().unwrap();
        assert!(p1[1] > 0.5);
        assert_eq!(net.predict(&[1.0, 0.0]).unwrap(), ClassLabel::Int(1));
        assert_eq!(net.predict(&[-1.0, 0.0]).unwrap(), ClassLabel::Int(0));
    }

    #[test]
    fn no_classes_means_no_probability() {
        let net = binary_net(None);
        net.validate().unwrap();
        assert!(net.predict_proba(&[1.0, 1.0]).is_none());
        assert_eq!(net.predict(&[1.0, 1.0]).unwrap(), ClassLabel::Int(1));
    }

    #[test]
    fn validates_shapes() {
        let bad = DenseNetwork {
            input_dim: 3,
            input_mean: None,
            input_std: None,
            layers: vec![DenseLayer {
                weights: vec![vec![1.0, 2.0]], // in_dim mismatch
                bias: vec![0.0],
                activation: Activation::Linear,
            }],
            classes: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn class_count_must_match_outputs() {
        let bad = binary_net(Some(vec![ClassLabel::Int(0)]));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn rejects_wrong_row_width() {
        let net = binary_net(None);
        assert_eq!(
            net.forward(&[1.0]).unwrap_err(),
            InferenceError::ShapeMismatch {
                got: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn multiclass_softmax() {
        let net = DenseNetwork {
            input_dim: 1,
            input_mean: Some(vec![1.0]),
            input_std: Some(vec![2.0]),
            layers: vec![
                DenseLayer {
                    weights: vec![vec![1.0], vec![-1.0]],
                    bias: vec![0.0, 0.0],
                    activation: Activation::Relu,
                },
                DenseLayer {
                    weights: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]],
                    bias: vec![0.0, 0.0, 0.0],
                    activation: Activation::Linear,
                },
            ],
            classes: Some(vec![
                ClassLabel::Text("bajo".into()),
                ClassLabel::Text("medio".into()),
                ClassLabel::Text("alto".into()),
            ]),
        };
        net.validate().unwrap();
        let p = net.predict_proba(&[5.0]).unwrap().unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(net.predict(&[5.0]).unwrap(), ClassLabel::Text("bajo".into()));
    }
}
