//! Scoring capability behind the opaque model artifact.
//!
//! The model file is a bincode-encoded [`ModelBlob`], one variant per supported
//! algorithm family. Built with `--features onnx`, a model file ending in `.onnx`
//! is run through tract instead.

use crate::error::{IdsError, Result};
use crate::sanitizer::SanitizedTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Index of the positive ("Attack") class in [`Classifier::predict_proba`] output.
pub const ATTACK_CLASS: usize = 1;

pub trait Classifier: Send + Sync + fmt::Debug {
    fn family(&self) -> &'static str;
    fn n_features(&self) -> usize;
    /// Per-row `[benign, attack]` probabilities, in input row order.
    fn predict_proba(&self, x: &SanitizedTable) -> Result<Vec<[f64; 2]>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelBlob {
    Logistic(LogisticModel),
    RandomForest(ForestModel),
    GradientBoosting(BoostedModel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Averages the per-tree class distribution found at each leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub n_features: usize,
    pub trees: Vec<Tree>,
}

/// Binary log-loss boosting: `sigmoid(init + learning_rate * sum(leaf))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedModel {
    pub n_features: usize,
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
}

/// Flat node array, root at index 0. Children always sit after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// `x[feature] <= threshold` goes left.
    Split { feature: usize, threshold: f64, left: usize, right: usize },
    Leaf(Vec<f64>),
}

impl Tree {
    fn validate(&self, n_features: usize, leaf_width: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() { return Err("empty tree".into()); }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, left, right, .. } => {
                    if *feature >= n_features { return Err(format!("node {i} splits on feature {feature} of {n_features}")); }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() { return Err(format!("node {i} has invalid child {child}")); }
                    }
                }
                Node::Leaf(v) if v.len() != leaf_width => {
                    return Err(format!("leaf {i} holds {} values, expected {leaf_width}", v.len()));
                }
                Node::Leaf(_) => {}
            }
        }
        Ok(())
    }

    pub fn leaf(&self, x: &[f32]) -> &[f64] {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Split { feature, threshold, left, right } => {
                    i = if f64::from(x[*feature]) <= *threshold { *left } else { *right };
                }
                Node::Leaf(v) => return v,
            }
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 { 1.0 / (1.0 + (-z).exp()) } else { let e = z.exp(); e / (1.0 + e) }
}

fn check_width(expected: usize, x: &SanitizedTable) -> Result<()> {
    if x.n_cols() != expected {
        return Err(IdsError::SchemaMismatch(format!("model expects {expected} features, table has {}", x.n_cols())));
    }
    Ok(())
}

impl ModelBlob {
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, bincode::Error> { bincode::deserialize(bytes) }
    pub fn encode(&self) -> std::result::Result<Vec<u8>, bincode::Error> { bincode::serialize(self) }

    pub fn validate(&self) -> Result<()> {
        let res = match self {
            ModelBlob::Logistic(m) => {
                if m.coefficients.is_empty() { Err("logistic model without coefficients".to_string()) } else { Ok(()) }
            }
            ModelBlob::RandomForest(m) => {
                if m.trees.is_empty() { Err("forest without trees".to_string()) }
                else { m.trees.iter().try_for_each(|t| t.validate(m.n_features, 2)) }
            }
            ModelBlob::GradientBoosting(m) => {
                if m.trees.is_empty() { Err("boosting model without trees".to_string()) }
                else { m.trees.iter().try_for_each(|t| t.validate(m.n_features, 1)) }
            }
        };
        res.map_err(|e| IdsError::Model(format!("{}: {e}", self.family())))
    }
}

impl Classifier for ModelBlob {
    fn family(&self) -> &'static str {
        match self {
            ModelBlob::Logistic(_) => "logistic",
            ModelBlob::RandomForest(_) => "random_forest",
            ModelBlob::GradientBoosting(_) => "gradient_boosting",
        }
    }

    fn n_features(&self) -> usize {
        match self {
            ModelBlob::Logistic(m) => m.coefficients.len(),
            ModelBlob::RandomForest(m) => m.n_features,
            ModelBlob::GradientBoosting(m) => m.n_features,
        }
    }

    fn predict_proba(&self, x: &SanitizedTable) -> Result<Vec<[f64; 2]>> {
        check_width(self.n_features(), x)?;
        let out: Vec<[f64; 2]> = match self {
            ModelBlob::Logistic(m) => x
                .rows()
                .map(|row| {
                    let z = m.intercept + m.coefficients.iter().zip(row).map(|(w, v)| w * f64::from(*v)).sum::<f64>();
                    let p = sigmoid(z);
                    [1.0 - p, p]
                })
                .collect(),
            ModelBlob::RandomForest(m) => x
                .rows()
                .map(|row| {
                    let mut acc = [0.0f64; 2];
                    for tree in &m.trees {
                        let leaf = tree.leaf(row);
                        let total = leaf[0] + leaf[1];
                        if total > 0.0 {
                            acc[0] += leaf[0] / total;
                            acc[1] += leaf[1] / total;
                        }
                    }
                    let n = m.trees.len() as f64;
                    [acc[0] / n, acc[1] / n]
                })
                .collect(),
            ModelBlob::GradientBoosting(m) => x
                .rows()
                .map(|row| {
                    let raw = m.init + m.learning_rate * m.trees.iter().map(|t| t.leaf(row)[0]).sum::<f64>();
                    let p = sigmoid(raw);
                    [1.0 - p, p]
                })
                .collect(),
        };
        Ok(out)
    }
}

/// Load a model file, dispatching on its suffix.
pub fn load_model(path: &Path, n_features: usize) -> Result<Box<dyn Classifier>> {
    let is_onnx = path.extension().map(|e| e.eq_ignore_ascii_case("onnx")).unwrap_or(false);
    if is_onnx {
        #[cfg(feature = "onnx")]
        {
            return Ok(Box::new(crate::onnx::OnnxClassifier::load(path, n_features)?));
        }
        #[cfg(not(feature = "onnx"))]
        {
            let _ = n_features;
            return Err(IdsError::UnsupportedModelFormat(format!("{} (built without the onnx feature)", path.display())));
        }
    }
    let bytes = std::fs::read(path).map_err(|e| IdsError::io(path, e))?;
    let blob = ModelBlob::decode(&bytes).map_err(|source| IdsError::Blob { path: path.to_path_buf(), source })?;
    blob.validate()?;
    Ok(Box::new(blob))
}
