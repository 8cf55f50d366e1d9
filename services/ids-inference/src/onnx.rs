use crate::error::{IdsError, Result};
use crate::model::Classifier;
use crate::sanitizer::SanitizedTable;
use std::fmt;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Exported classifier graph run row by row with a fixed `[1, n_features]` input.
/// The last graph output is read as per-class probabilities (a single column is
/// taken as the attack probability).
pub struct OnnxClassifier {
    plan: Plan,
    n_features: usize,
    path: PathBuf,
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxClassifier").field("path", &self.path).field("n_features", &self.n_features).finish()
    }
}

fn tract_err(path: &Path, e: impl fmt::Display) -> IdsError { IdsError::Model(format!("{}: {e}", path.display())) }

impl OnnxClassifier {
    pub fn load(path: &Path, n_features: usize) -> Result<Self> {
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, n_features]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| tract_err(path, e))?;
        Ok(Self { plan, n_features, path: path.to_path_buf() })
    }
}

impl Classifier for OnnxClassifier {
    fn family(&self) -> &'static str { "onnx" }
    fn n_features(&self) -> usize { self.n_features }

    fn predict_proba(&self, x: &SanitizedTable) -> Result<Vec<[f64; 2]>> {
        if x.n_cols() != self.n_features {
            return Err(IdsError::SchemaMismatch(format!("model expects {} features, table has {}", self.n_features, x.n_cols())));
        }
        let mut out = Vec::with_capacity(x.n_rows());
        for row in x.rows() {
            let input = Tensor::from_shape(&[1, self.n_features], row).map_err(|e| tract_err(&self.path, e))?;
            let outputs = self.plan.run(tvec!(input.into())).map_err(|e| tract_err(&self.path, e))?;
            let last = outputs.last().ok_or_else(|| tract_err(&self.path, "graph produced no outputs"))?;
            let probs: Vec<f32> = last.to_array_view::<f32>().map_err(|e| tract_err(&self.path, e))?.iter().copied().collect();
            let pair = match probs.as_slice() {
                [p] => [1.0 - f64::from(*p), f64::from(*p)],
                [benign, attack, ..] => [f64::from(*benign), f64::from(*attack)],
                [] => return Err(tract_err(&self.path, "empty probability output")),
            };
            out.push(pair);
        }
        Ok(out)
    }
}
