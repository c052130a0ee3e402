//! Decision trees and random forests stored as flat node arrays.
//!
//! Node `i` is a leaf when `feature[i] < 0`, and its children must then both
//! be `-1`. Internal nodes send a
//! row left when `row[feature[i]] <= threshold[i]`. `value[i]` holds the
//! class counts (or fractions) observed at the node.

use serde::{Deserialize, Serialize};

use super::classifier::{argmax, check_width, ClassLabel};
use crate::error::InferenceError;

const LEAF: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn n_nodes(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.feature[node] < 0
    }

    pub fn validate(&self, n_features: usize, n_classes: usize) -> std::result::Result<(), String> {
        let n = self.n_nodes();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(format!("node arrays must all have {n} entries"));
        }
        for node in 0..n {
            if self.is_leaf(node) {
                if self.children_left[node] != LEAF || self.children_right[node] != LEAF {
                    return Err(format!(
                        "leaf {node} (feature {}) has children {} / {}",
                        self.feature[node], self.children_left[node], self.children_right[node]
                    ));
                }
                let dist = &self.value[node];
                if dist.len() != n_classes {
                    return Err(format!(
                        "leaf {node} has {} class values, expected {n_classes}",
                        dist.len()
                    ));
                }
                if dist.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(format!("leaf {node} has negative or non-finite values"));
                }
                if dist.iter().sum::<f64>() <= 0.0 {
                    return Err(format!("leaf {node} has an empty class distribution"));
                }
                continue;
            }
            let feature = self.feature[node];
            if feature as usize >= n_features {
                return Err(format!(
                    "node {node} splits on feature {feature}, model has {n_features}"
                ));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {node} has a non-finite threshold"));
            }
            // Children always come after their parent, which also rules out cycles.
            for child in [self.children_left[node], self.children_right[node]] {
                if child <= node as i64 || child as usize >= n {
                    return Err(format!("node {node} has out-of-range child {child}"));
                }
            }
        }
        Ok(())
    }

    fn leaf_for(&self, row: &[f64]) -> usize {
        let mut node = 0;
        while !self.is_leaf(node) {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        node
    }

    /// Normalized class distribution of the leaf reached by `row`.
    pub fn leaf_distribution(&self, row: &[f64]) -> Vec<f64> {
        let dist = &self.value[self.leaf_for(row)];
        let total: f64 = dist.iter().sum();
        dist.iter().map(|v| v / total).collect()
    }
}

/// One or more trees voting by averaged leaf distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    pub classes: Vec<ClassLabel>,
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be > 0".to_string());
        }
        if self.classes.len() < 2 {
            return Err(format!(
                "at least 2 classes required, got {}",
                self.classes.len()
            ));
        }
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree[{idx}]: {e}"))?;
        }
        Ok(())
    }

    pub fn predict_proba(&self, row: &[f64]) -> std::result::Result<Vec<f64>, InferenceError> {
        check_width(row, self.n_features)?;
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (sum, p) in acc.iter_mut().zip(tree.leaf_distribution(row)) {
                *sum += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(acc.into_iter().map(|v| v / n).collect())
    }

    pub fn predict(&self, row: &[f64]) -> std::result::Result<ClassLabel, InferenceError> {
        let proba = self.predict_proba(row)?;
        Ok(self.classes[argmax(&proba)].clone())
    }
}
