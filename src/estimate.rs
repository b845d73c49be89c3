use ndarray::{Array2, ArrayView2, Axis};

use crate::state::SamplerState;

/// Point estimates derived from one state of the chain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Parameters {
    /// theta: DT x K
    pub theta: Array2<f64>,
    /// phi: K x VT
    pub phi_topic: Array2<f64>,
    /// phi: K x VO, one per perspective
    pub phi_opinion: Vec<Array2<f64>>,
}

impl Parameters {
    pub fn estimate(state: &SamplerState) -> Parameters {
        Parameters {
            theta:       theta(state),
            phi_topic:   phi_topic(state),
            phi_opinion: (0..state.num_perspectives()).map(|p| phi_opinion(state, p)).collect(),
        }
    }
}

pub fn theta(state: &SamplerState) -> Array2<f64> {
    smoothed_rows(state.topic_counts().ndk.view(), state.hyperparameters().alpha)
}

pub fn phi_topic(state: &SamplerState) -> Array2<f64> {
    smoothed_rows(state.topic_counts().nkw.view(), state.hyperparameters().beta)
}

pub fn phi_opinion(state: &SamplerState, p: usize) -> Array2<f64> {
    let nrs = state.opinion_counts().nrs.index_axis(Axis(0), p);
    smoothed_rows(nrs, state.hyperparameters().beta_o)
}

// (c + prior) / (sum(c) + width * prior), row by row
fn smoothed_rows(counts: ArrayView2<usize>, prior: f64) -> Array2<f64> {
    let width = counts.ncols() as f64;
    let mut rows = counts.mapv(|c| c as f64 + prior);
    for (mut row, row_counts) in rows.outer_iter_mut().zip(counts.outer_iter()) {
        let total = row_counts.sum() as f64 + width * prior;
        row /= total;
    }
    rows
}
