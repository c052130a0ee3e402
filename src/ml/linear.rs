//! Linear classifiers: logistic regression and linear SVM.
//!
//! Binary models carry a single coefficient row whose decision value scores
//! the second class; multiclass models carry one row per class.

use serde::{Deserialize, Serialize};

use super::classifier::{argmax, check_width, sigmoid, softmax, ClassLabel};
use crate::error::InferenceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    /// Shape: [1 or n_classes][n_features]
    pub coefficients: Vec<Vec<f64>>,
    /// Shape: [1 or n_classes]
    pub intercept: Vec<f64>,
    pub classes: Vec<ClassLabel>,
}

impl LinearModel {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.classes.len() < 2 {
            return Err(format!(
                "at least 2 classes required, got {}",
                self.classes.len()
            ));
        }
        let expected_rows = if self.classes.len() == 2 {
            1
        } else {
            self.classes.len()
        };
        if self.coefficients.len() != expected_rows {
            return Err(format!(
                "{} coefficient rows for {} classes, expected {expected_rows}",
                self.coefficients.len(),
                self.classes.len()
            ));
        }
        if self.intercept.len() != expected_rows {
            return Err(format!(
                "intercept len {} != coefficient rows {expected_rows}",
                self.intercept.len()
            ));
        }
        let width = self.n_features();
        if width == 0 {
            return Err("coefficient rows must not be empty".to_string());
        }
        for (r, row) in self.coefficients.iter().enumerate() {
            if row.len() != width {
                return Err(format!("coefficient row {r} len {} != {width}", row.len()));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(format!("coefficient row {r} contains non-finite values"));
            }
        }
        if self.intercept.iter().any(|v| !v.is_finite()) {
            return Err("intercept contains non-finite values".to_string());
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn decision_function(&self, row: &[f64]) -> std::result::Result<Vec<f64>, InferenceError> {
        check_width(row, self.n_features())?;
        Ok(self
            .coefficients
            .iter()
            .zip(&self.intercept)
            .map(|(w, b)| b + w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>())
            .collect())
    }

    pub fn predict(&self, row: &[f64]) -> std::result::Result<ClassLabel, InferenceError> {
        let scores = self.decision_function(row)?;
        let idx = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores)
        };
        Ok(self.classes[idx].clone())
    }

    /// Logistic probabilities: sigmoid for binary, softmax otherwise.
    pub fn predict_proba(&self, row: &[f64]) -> std::result::Result<Vec<f64>, InferenceError> {
        let scores = self.decision_function(row)?;
        if scores.len() == 1 {
            let p = sigmoid(scores[0]);
            return Ok(vec![1.0 - p, p]);
        }
        softmax(&scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary() -> LinearModel {
        LinearModel {
            coefficients: vec![vec![0.05, 0.8]],
            intercept: vec![-4.0],
            classes: vec![ClassLabel::Int(0), ClassLabel::Int(1)],
        }
    }

    #[test]
    fn binary_decision_and_probability_agree() {
        let model = binary();
        model.validate().unwrap();

        let high = [70.0, 3.0];
        assert_eq!(model.predict(&high).unwrap(), ClassLabel::Int(1));
        let p = model.predict_proba(&high).unwrap();
        assert!(p[1] > 0.5);
        assert!((p[0] + p[1] - 1.0).abs() < 1e-12);

        let low = [20.0, 0.0];
        assert_eq!(model.predict(&low).unwrap(), ClassLabel::Int(0));
        assert!(model.predict_proba(&low).unwrap()[1] < 0.5);
    }

    #[test]
    fn multiclass_uses_one_row_per_class() {
        let model = LinearModel {
            coefficients: vec![vec![1.0], vec![0.0], vec![-1.0]],
            intercept: vec![0.0, 0.5, 0.0],
            classes: vec![ClassLabel::Int(0), ClassLabel::Int(1), ClassLabel::Int(2)],
        };
        model.validate().unwrap();
        assert_eq!(model.predict(&[2.0]).unwrap(), ClassLabel::Int(0));
        assert_eq!(model.predict(&[-2.0]).unwrap(), ClassLabel::Int(2));
        assert_eq!(model.predict(&[0.0]).unwrap(), ClassLabel::Int(1));
    }

    #[test]
    fn overflowing_multiclass_scores_are_a_model_error() {
        let model = LinearModel {
            coefficients: vec![vec![1e308], vec![0.0], vec![-1e308]],
            intercept: vec![0.0, 0.0, 0.0],
            classes: vec![ClassLabel::Int(0), ClassLabel::Int(1), ClassLabel::Int(2)],
        };
        model.validate().unwrap();
        assert!(matches!(
            model.predict_proba(&[10.0]),
            Err(InferenceError::Model(_))
        ));
    }

    #[test]
    fn rejects_row_count_mismatch() {
        let mut model = binary();
        model.coefficients.push(vec![0.0, 0.0]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn rejects_single_class() {
        let mut model = binary();
        model.classes.truncate(1);
        assert!(model.validate().is_err());
    }

    #[test]
    fn wrong_width_is_a_shape_mismatch() {
        assert!(matches!(
            binary().predict(&[1.0]),
            Err(InferenceError::ShapeMismatch { got: 1, expected: 2 })
        ));
    }
}
