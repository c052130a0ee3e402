//! Runs the classifier on an encoded row and reads back the label and the
//! positive-class probability.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::error::{ArtifactError, InferenceError};
use crate::ml::classifier::check_width;
use crate::ml::{ClassLabel, Classifier};

/// How the positive class was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositiveClassSource {
    /// Declared in configuration or in the model artifact.
    Declared,
    /// Heuristic: the class equal to integer `1`.
    IntegerOne,
    /// Heuristic: the class equal to boolean `true`.
    BooleanTrue,
    /// Heuristic fallback: the last class in the model's list.
    LastClass,
}

impl fmt::Display for PositiveClassSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Declared => "declared",
            Self::IntegerOne => "integer_one",
            Self::BooleanTrue => "boolean_true",
            Self::LastClass => "last_class",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositiveClass {
    pub label: ClassLabel,
    /// Column of the label in the probability row.
    pub index: usize,
    pub source: PositiveClassSource,
}

/// Picks the class whose probability is reported.
///
/// A declared class must be present in `classes`. Without a declaration the
/// class `1` is used, then `true`, then the last class.
pub fn resolve_positive_class(
    classes: &[ClassLabel],
    declared: Option<&ClassLabel>,
) -> std::result::Result<Option<PositiveClass>, ArtifactError> {
    if let Some(declared) = declared {
        let index = classes
            .iter()
            .position(|c| same_class(c, declared))
            .ok_or_else(|| {
                ArtifactError::Incompatible(format!(
                    "declared positive class {declared} is not one of the model classes {}",
                    format_classes(classes)
                ))
            })?;
        return Ok(Some(PositiveClass {
            label: classes[index].clone(),
            index,
            source: PositiveClassSource::Declared,
        }));
    }

    if classes.is_empty() {
        return Ok(None);
    }

    let (index, source) = if let Some(i) = classes.iter().position(|c| *c == ClassLabel::Int(1)) {
        (i, PositiveClassSource::IntegerOne)
    } else if let Some(i) = classes.iter().position(|c| *c == ClassLabel::Bool(true)) {
        (i, PositiveClassSource::BooleanTrue)
    } else {
        let i = classes.len() - 1;
        warn!(
            classes = %format_classes(classes),
            "neither 1 nor true is a model class, assuming the last class {} is positive",
            classes[i]
        );
        (i, PositiveClassSource::LastClass)
    };

    Ok(Some(PositiveClass {
        label: classes[index].clone(),
        index,
        source,
    }))
}

/// Equality that also accepts a textual declaration of an integer or boolean
/// class (environment variables arrive as strings).
fn same_class(class: &ClassLabel, declared: &ClassLabel) -> bool {
    match (class, declared) {
        (a, b) if a == b => true,
        (ClassLabel::Int(i), ClassLabel::Text(s)) => s.trim() == i.to_string(),
        (ClassLabel::Bool(b), ClassLabel::Text(s)) => s.trim().eq_ignore_ascii_case(&b.to_string()),
        _ => false,
    }
}

fn format_classes(classes: &[ClassLabel]) -> String {
    let items: Vec<String> = classes.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// Label and positive-class probability for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    #[serde(rename = "prediccion")]
    pub label: i64,
    #[serde(rename = "probabilidad")]
    pub probability: f64,
}

/// Stateless wrapper around the loaded classifier.
#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn Classifier>,
    positive: Option<PositiveClass>,
}

impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predictor")
            .field("kind", &self.model.kind())
            .field("n_features", &self.model.n_features())
            .field("positive", &self.positive)
            .finish()
    }
}

impl Predictor {
    pub fn new(
        model: Arc<dyn Classifier>,
        declared_positive: Option<&ClassLabel>,
    ) -> std::result::Result<Self, ArtifactError> {
        let positive = match (model.classes(), declared_positive) {
            (Some(classes), declared) => resolve_positive_class(classes, declared)?,
            (None, Some(declared)) => {
                return Err(ArtifactError::Incompatible(format!(
                    "positive class {declared} declared but the {} model reports no classes",
                    model.kind()
                )))
            }
            (None, None) => None,
        };
        Ok(Self { model, positive })
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    pub fn positive_class(&self) -> Option<&PositiveClass> {
        self.positive.as_ref()
    }

    /// Predicts one row ordered per the feature schema.
    ///
    /// The probability is `0.0` when the model has no probability interface.
    pub fn predict(&self, row: &[f64]) -> std::result::Result<PredictionResult, InferenceError> {
        check_width(row, self.model.n_features())?;

        let label = self.model.predict(row)?.as_int()?;

        let probability = match (&self.positive, self.model.predict_proba(row)) {
            (Some(positive), Some(proba)) => {
                let proba = proba?;
                let n_classes = self.model.classes().map(<[ClassLabel]>::len).unwrap_or(0);
                if proba.len() != n_classes {
                    return Err(InferenceError::ProbabilityShape {
                        got: proba.len(),
                        expected: n_classes,
                    });
                }
                let p = proba[positive.index];
                if !(0.0..=1.0).contains(&p) {
                    return Err(InferenceError::ProbabilityOutOfRange(p));
                }
                p
            }
            _ => 0.0,
        };

        Ok(PredictionResult { label, probability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{LinearModel, Model};

    /// Test double returning fixed outputs.
    struct Fixed {
        classes: Option<Vec<ClassLabel>>,
        label: ClassLabel,
        proba: Option<Vec<f64>>,
    }

    impl Classifier for Fixed {
        fn kind(&self) -> &'static str {
            "fixed"
        }

        fn n_features(&self) -> usize {
            2
        }

        fn classes(&self) -> Option<&[ClassLabel]> {
            self.classes.as_deref()
        }

        fn predict(&self, _row: &[f64]) -> std::result::Result<ClassLabel, InferenceError> {
            Ok(self.label.clone())
        }

        fn predict_proba(
            &self,
            _row: &[f64],
        ) -> Option<std::result::Result<Vec<f64>, InferenceError>> {
            self.proba.clone().map(Ok)
        }
    }

    fn ints(values: &[i64]) -> Vec<ClassLabel> {
        values.iter().map(|v| ClassLabel::Int(*v)).collect()
    }

    #[test]
    fn resolves_integer_one() {
        let pc = resolve_positive_class(&ints(&[1, 0]), None).unwrap().unwrap();
        assert_eq!(pc.index, 0);
        assert_eq!(pc.source, PositiveClassSource::IntegerOne);
    }

    #[test]
    fn resolves_boolean_true() {
        let classes = vec![ClassLabel::Bool(false), ClassLabel::Bool(true)];
        let pc = resolve_positive_class(&classes, None).unwrap().unwrap();
        assert_eq!(pc.index, 1);
        assert_eq!(pc.source, PositiveClassSource::BooleanTrue);
    }

    #[test]
    fn falls_back_to_last_class() {
        let classes = vec![ClassLabel::Text("no".into()), ClassLabel::Text("si".into())];
        let pc = resolve_positive_class(&classes, None).unwrap().unwrap();
        assert_eq!(pc.index, 1);
        assert_eq!(pc.source, PositiveClassSource::LastClass);
    }

    #[test]
    fn declared_class_wins_and_must_exist() {
        let pc = resolve_positive_class(&ints(&[0, 1]), Some(&ClassLabel::Int(0)))
            .unwrap()
            .unwrap();
        assert_eq!(pc.index, 0);
        assert_eq!(pc.source, PositiveClassSource::Declared);

        let pc = resolve_positive_class(&ints(&[0, 1]), Some(&ClassLabel::Text("1".into())))
            .unwrap()
            .unwrap();
        assert_eq!(pc.label, ClassLabel::Int(1));

        assert!(matches!(
            resolve_positive_class(&ints(&[0, 1]), Some(&ClassLabel::Int(2))),
            Err(ArtifactError::Incompatible(_))
        ));
    }

    #[test]
    fn reads_positive_column() {
        let predictor = Predictor::new(
            Arc::new(Fixed {
                classes: Some(ints(&[0, 1])),
                label: ClassLabel::Int(1),
                proba: Some(vec![0.25, 0.75]),
            }),
            None,
        )
        .unwrap();
        let out = predictor.predict(&[0.0, 0.0]).unwrap();
        assert_eq!(
            out,
            PredictionResult {
                label: 1,
                probability: 0.75
            }
        );
    }

    #[test]
    fn no_probability_interface_reports_zero() {
        let predictor = Predictor::new(
            Arc::new(Fixed {
                classes: None,
                label: ClassLabel::Bool(true),
                proba: None,
            }),
            None,
        )
        .unwrap();
        let out = predictor.predict(&[1.0, 1.0]).unwrap();
        assert_eq!(out.label, 1);
        assert_eq!(out.probability, 0.0);
    }

    #[test]
    fn declaring_without_classes_is_rejected() {
        let err = Predictor::new(
            Arc::new(Fixed {
                classes: None,
                label: ClassLabel::Int(0),
                proba: None,
            }),
            Some(&ClassLabel::Int(1)),
        )
        .unwrap_err();
        assert!(matches!(err, ArtifactError::Incompatible(_)));
    }

    #[test]
    fn malformed_probabilities_are_inference_errors() {
        let wide = Predictor::new(
            Arc::new(Fixed {
                classes: Some(ints(&[0, 1])),
                label: ClassLabel::Int(0),
                proba: Some(vec![0.2, 0.3, 0.5]),
            }),
            None,
        )
        .unwrap();
        assert!(matches!(
            wide.predict(&[0.0, 0.0]),
            Err(InferenceError::ProbabilityShape { got: 3, expected: 2 })
        ));

        let out_of_range = Predictor::new(
            Arc::new(Fixed {
                classes: Some(ints(&[0, 1])),
                label: ClassLabel::Int(0),
                proba: Some(vec![-0.5, 1.5]),
            }),
            None,
        )
        .unwrap();
        assert!(matches!(
            out_of_range.predict(&[0.0, 0.0]),
            Err(InferenceError::ProbabilityOutOfRange(_))
        ));
    }

    #[test]
    fn wrong_width_and_text_labels_fail() {
        let predictor = Predictor::new(
            Arc::new(Fixed {
                classes: Some(vec![ClassLabel::Text("no".into()), ClassLabel::Text("si".into())]),
                label: ClassLabel::Text("si".into()),
                proba: Some(vec![0.4, 0.6]),
            }),
            None,
        )
        .unwrap();
        assert!(matches!(
            predictor.predict(&[0.0]),
            Err(InferenceError::ShapeMismatch { got: 1, expected: 2 })
        ));
        assert!(matches!(
            predictor.predict(&[0.0, 0.0]),
            Err(InferenceError::LabelNotInteger(_))
        ));
    }

    #[test]
    fn repeated_predictions_are_identical() {
        let model = Model::LogisticRegression(LinearModel {
            coefficients: vec![vec![0.03, 0.9]],
            intercept: vec![-2.0],
            classes: ints(&[0, 1]),
        });
        let predictor = Predictor::new(Arc::new(model), None).unwrap();
        let row = [64.0, 2.0];
        let first = predictor.predict(&row).unwrap();
        let second = predictor.predict(&row).unwrap();
        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first.probability));
    }
}
