//! Full conditionals of the collapsed Gibbs sampler.
//!
//! Both functions fill `weights` with unnormalized probabilities, one per
//! topic; callers run them through `dist::normalize` before sampling.

use crate::config::Hyperparameters;
use crate::dist;
use crate::error::Result;
use crate::state::{OpinionCounts, SamplerState, TopicCounts};

/// p(z = k | ...) for a topic word `w` in document `d`:
/// `(ndk + alpha) / (n_d + K alpha) * (nkw + beta) / (nk + VT beta)`.
pub fn topic_weights(counts: &TopicCounts, hyper: &Hyperparameters, vocab_size: usize,
                     d: usize, w: usize, weights: &mut [f64]) {
    let ndk = counts.ndk.row(d);
    let doc_norm = ndk.sum() as f64 + hyper.num_topics as f64 * hyper.alpha;
    let beta_sum = hyper.beta * vocab_size as f64;
    for (k, weight) in weights.iter_mut().enumerate() {
        let e_theta_dk = (ndk[k] as f64 + hyper.alpha) / doc_norm;
        let e_phi_kw = (counts.nkw[[k, w]] as f64 + hyper.beta) / (counts.nk[k] as f64 + beta_sum);
        *weight = e_theta_dk * e_phi_kw;
    }
}

/// p(x = k | ...) for an opinion word `w` of perspective `p` in document `d`.
///
/// The opinion likelihood is weighted by the proportion of the document's
/// topic words assigned to `k` (`ndk / ntd`), not by its opinion-word
/// proportions. `ntd[d]` must be positive.
pub fn opinion_weights(topics: &TopicCounts, opinions: &OpinionCounts, hyper: &Hyperparameters,
                       vocab_size: usize, p: usize, d: usize, w: usize, weights: &mut [f64]) {
    let beta_o_sum = hyper.beta_o * vocab_size as f64;
    let ntd = topics.ntd[d] as f64;
    for (k, weight) in weights.iter_mut().enumerate() {
        let e_phi_kw = (opinions.nrs[[p, k, w]] as f64 + hyper.beta_o) / (opinions.ns[[p, k]] as f64 + beta_o_sum);
        *weight = e_phi_kw * (topics.ndk[[d, k]] as f64 / ntd);
    }
}

impl SamplerState {
    /// Normalized distribution over topics for topic word `w` in document `d`,
    /// given the current counts.
    pub fn topic_conditional(&self, d: usize, w: usize) -> Result<Vec<f64>> {
        let mut weights = vec![0.0; self.hyper.num_topics];
        topic_weights(&self.topics, &self.hyper, self.topic_vocab_size, d, w, &mut weights);
        dist::normalize(&mut weights)?;
        Ok(weights)
    }

    /// Normalized distribution over topics for opinion word `w` of
    /// perspective `p` in (global) document `d`.
    pub fn opinion_conditional(&self, p: usize, d: usize, w: usize) -> Result<Vec<f64>> {
        let mut weights = vec![0.0; self.hyper.num_topics];
        opinion_weights(&self.topics, &self.opinions, &self.hyper, self.opinion_vocab_size, p, d, w, &mut weights);
        dist::normalize(&mut weights)?;
        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::error::CptError;
    use crate::state::tests::{hyper, toy_corpus};

    #[test]
    fn topic_conditional_is_a_distribution() {
        let corpus = toy_corpus();
        let state = SamplerState::new(&corpus, hyper(3), &mut StdRng::seed_from_u64(5)).unwrap();
        for d in 0..state.num_documents() {
            for w in 0..state.topic_vocab_size() {
                let p = state.topic_conditional(d, w).unwrap();
                assert_eq!(p.len(), 3);
                assert!(p.iter().all(|&x| x >= 0.0));
                assert_abs_diff_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn opinion_conditional_is_a_distribution() {
        let corpus = toy_corpus();
        let state = SamplerState::new(&corpus, hyper(3), &mut StdRng::seed_from_u64(6)).unwrap();
        for p in 0..state.num_perspectives() {
            for &d in &state.opinion_docs[p] {
                for w in 0..state.opinion_vocab_size() {
                    let probs = state.opinion_conditional(p, d, w).unwrap();
                    assert_eq!(probs.len(), 3);
                    assert!(probs.iter().all(|&x| x >= 0.0));
                    assert_abs_diff_eq!(probs.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn topic_conditional_matches_hand_computation() {
        let corpus = toy_corpus();
        let state = SamplerState::new(&corpus, hyper(2), &mut StdRng::seed_from_u64(7)).unwrap();
        let counts = state.topic_counts();
        let (d, w) = (0, 1);
        let n_d = counts.ntd[d] as f64;
        let vt = state.topic_vocab_size() as f64;
        let raw: Vec<f64> = (0..2).map(|k| {
            (counts.ndk[[d, k]] as f64 + 0.1) / (n_d + 2.0 * 0.1)
                * (counts.nkw[[k, w]] as f64 + 0.1) / (counts.nk[k] as f64 + 0.1 * vt)
        }).collect();
        let total: f64 = raw.iter().sum();
        let p = state.topic_conditional(d, w).unwrap();
        for k in 0..2 {
            assert_abs_diff_eq!(p[k], raw[k] / total, epsilon = 1e-12);
        }
    }

    #[test]
    fn opinion_conditional_follows_topic_word_proportions() {
        let mut corpus = crate::corpus::Corpus::new();
        corpus.add_document("p", &["tax"], &["good", "bad"]);
        let mut state = SamplerState::new(&corpus, hyper(3), &mut StdRng::seed_from_u64(8)).unwrap();
        // Pin the single topic word to topic 2
        let old = state.z[0][0];
        state.topics.remove(0, 0, old);
        state.topics.insert(0, 0, 2);
        state.z[0][0] = 2;
        let p = state.opinion_conditional(0, 0, 1).unwrap();
        assert_eq!(p, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn opinion_conditional_without_topic_words_is_degenerate() {
        let mut corpus = crate::corpus::Corpus::new();
        corpus.add_document("p", &["tax"], &["good"]);
        corpus.add_document("p", &[], &["bad"]);
        let state = SamplerState::new(&corpus, hyper(2), &mut StdRng::seed_from_u64(8)).unwrap();
        match state.opinion_conditional(0, 1, 1) {
            Err(CptError::DegenerateDistribution { len: 2 }) => {},
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
