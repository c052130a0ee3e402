//! One-shot loading of the two training artifacts.
//!
//! Any failure here is fatal: the server is never started with a partially
//! loaded model.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::ModelConfig;
use crate::context::ModelContext;
use crate::error::ArtifactError;
use crate::features::FeatureSchema;
use crate::ml::{Classifier, ModelArtifact};

/// Loads the classifier and the column list and checks they fit together.
///
/// A positive class from configuration overrides the one declared in the
/// model artifact.
pub fn load_context(config: &ModelConfig) -> std::result::Result<ModelContext, ArtifactError> {
    let model_path = config.model_path();
    let columns_path = config.columns_path();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Loading model artifacts from {}",
        config.dir.display()
    );

    info!("Loading model from {}", model_path.display());
    let artifact: ModelArtifact = read_json(&model_path)?;
    artifact
        .model
        .validate()
        .map_err(ArtifactError::InvalidModel)?;
    info!(
        kind = artifact.model.kind(),
        n_features = artifact.model.n_features(),
        classes = ?artifact.model.classes(),
        "Model loaded"
    );

    info!("Loading columns from {}", columns_path.display());
    let columns: Vec<String> = read_json(&columns_path)?;
    let schema = FeatureSchema::new(columns)?;
    let preview: Vec<&str> = schema.columns().iter().take(10).map(String::as_str).collect();
    info!(
        n_columns = schema.len(),
        first = ?preview,
        "Columns loaded"
    );

    let declared = config
        .positive_class
        .as_ref()
        .or(artifact.positive_class.as_ref())
        .cloned();
    let ModelArtifact {
        model, metadata, ..
    } = artifact;

    let context = ModelContext::new(schema, Arc::new(model), declared.as_ref())?
        .with_metadata(metadata);
    if let Some(positive) = context.predictor().positive_class() {
        info!(
            label = %positive.label,
            source = %positive.source,
            "Positive class resolved"
        );
    }
    Ok(context)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> std::result::Result<T, ArtifactError> {
    if !path.is_file() {
        return Err(ArtifactError::Missing {
            path: path.to_path_buf(),
            listing: describe_dir(path.parent().unwrap_or_else(|| Path::new("."))),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Directory contents for the missing-artifact diagnostic.
fn describe_dir(dir: &Path) -> String {
    if !dir.is_dir() {
        return format!(
            "directory {} does not exist or is not a directory",
            dir.display()
        );
    }
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            format!("directory {} contains [{}]", dir.display(), names.join(", "))
        }
        Err(e) => format!("directory {} could not be listed: {e}", dir.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::ClassLabel;
    use crate::predictor::PositiveClassSource;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }

    fn config(dir: &Path) -> ModelConfig {
        ModelConfig {
            dir: dir.to_path_buf(),
            ..ModelConfig::default()
        }
    }

    fn model_json() -> serde_json::Value {
        json!({
            "kind": "logistic_regression",
            "coefficients": [[0.04, 0.5, 0.2, 0.3]],
            "intercept": [-3.0],
            "classes": [0, 1]
        })
    }

    #[test]
    fn loads_valid_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "modelo_reingreso.json", model_json());
        write(
            tmp.path(),
            "model_columns.json",
            json!(["edad", "visitas_ultimos_30_dias", "genero_masculino", "genero_femenino"]),
        );

        let ctx = load_context(&config(tmp.path())).unwrap();
        assert_eq!(ctx.schema().len(), 4);
        let positive = ctx.predictor().positive_class().unwrap();
        assert_eq!(positive.label, ClassLabel::Int(1));
        assert_eq!(positive.source, PositiveClassSource::IntegerOne);
    }

    #[test]
    fn missing_file_lists_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "model_columns.json", json!(["edad"]));
        write(tmp.path(), "notas.txt", json!("x"));

        let err = load_context(&config(tmp.path())).unwrap_err();
        match err {
            ArtifactError::Missing { path, listing } => {
                assert!(path.ends_with("modelo_reingreso.json"));
                assert!(listing.contains("model_columns.json, notas.txt"), "{listing}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_directory_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_context(&config(&tmp.path().join("nope"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"), "{err}");
    }

    #[test]
    fn corrupt_artifact_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("modelo_reingreso.json"), "\u{80}joblib").unwrap();
        write(tmp.path(), "model_columns.json", json!(["edad"]));
        assert!(matches!(
            load_context(&config(tmp.path())),
            Err(ArtifactError::Parse { .. })
        ));
    }

    #[test]
    fn width_mismatch_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "modelo_reingreso.json", model_json());
        write(tmp.path(), "model_columns.json", json!(["edad", "genero_masculino"]));
        assert!(matches!(
            load_context(&config(tmp.path())),
            Err(ArtifactError::Incompatible(_))
        ));
    }

    #[test]
    fn configured_positive_class_overrides_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let mut model = model_json();
        model["positive_class"] = json!(1);
        write(tmp.path(), "modelo_reingreso.json", model);
        write(
            tmp.path(),
            "model_columns.json",
            json!(["edad", "visitas_ultimos_30_dias", "genero_masculino", "genero_femenino"]),
        );

        let mut cfg = config(tmp.path());
        cfg.positive_class = Some(ClassLabel::Int(0));
        let ctx = load_context(&cfg).unwrap();
        let positive = ctx.predictor().positive_class().unwrap();
        assert_eq!(positive.label, ClassLabel::Int(0));
        assert_eq!(positive.source, PositiveClassSource::Declared);
    }
}
