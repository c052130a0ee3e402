//! The classifier seam shared by every model kind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// A class value as reported by a trained classifier.
///
/// Training pipelines emit integer classes most of the time, but boolean and
/// string targets are valid too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl ClassLabel {
    /// Integer view of the label, used for the `prediccion` response field.
    pub fn as_int(&self) -> std::result::Result<i64, InferenceError> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Bool(b) => Ok(i64::from(*b)),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| InferenceError::LabelNotInteger(s.clone())),
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Inference interface of a loaded model.
///
/// `predict_proba` returns `None` when the model has no probability
/// interface; one row of probabilities is aligned with `classes()`.
pub trait Classifier: Send + Sync {
    /// Short name of the model kind, e.g. `random_forest`.
    fn kind(&self) -> &'static str;

    /// Width of the input row.
    fn n_features(&self) -> usize;

    /// Ordered class list, if the model reports one.
    fn classes(&self) -> Option<&[ClassLabel]>;

    fn predict(&self, row: &[f64]) -> std::result::Result<ClassLabel, InferenceError>;

    fn predict_proba(&self, row: &[f64]) -> Option<std::result::Result<Vec<f64>, InferenceError>>;
}

pub(crate) fn check_width(row: &[f64], expected: usize) -> std::result::Result<(), InferenceError> {
    if row.len() != expected {
        return Err(InferenceError::ShapeMismatch {
            got: row.len(),
            expected,
        });
    }
    Ok(())
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    // Numerically-stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

pub(crate) fn softmax(scores: &[f64]) -> std::result::Result<Vec<f64>, InferenceError> {
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(InferenceError::Model(format!(
            "non-finite class score {bad}, cannot normalise"
        )));
    }
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    Ok(exps.into_iter().map(|e| e / sum).collect())
}

/// Index of the first maximum.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_coercion() {
        assert_eq!(ClassLabel::Int(1).as_int().unwrap(), 1);
        assert_eq!(ClassLabel::Bool(true).as_int().unwrap(), 1);
        assert_eq!(ClassLabel::Bool(false).as_int().unwrap(), 0);
        assert_eq!(ClassLabel::Text(" 0 ".into()).as_int().unwrap(), 0);
        assert!(matches!(
            ClassLabel::Text("si".into()).as_int(),
            Err(InferenceError::LabelNotInteger(_))
        ));
    }

    #[test]
    fn labels_deserialize_untagged() {
        let labels: Vec<ClassLabel> = serde_json::from_str(r#"[0, true, "alto"]"#).unwrap();
        assert_eq!(
            labels,
            vec![
                ClassLabel::Int(0),
                ClassLabel::Bool(true),
                ClassLabel::Text("alto".into())
            ]
        );
    }

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]).unwrap();
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(argmax(&p), 2);
    }

    #[test]
    fn softmax_rejects_infinite_scores() {
        assert!(matches!(
            softmax(&[f64::INFINITY, f64::NEG_INFINITY, 0.0]),
            Err(InferenceError::Model(_))
        ));
        let p = softmax(&[1e300, -1e300, 0.0]).unwrap();
        assert_eq!(p, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
    }
}
