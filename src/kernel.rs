//! One Gibbs sweep over every token of the corpus.
//!
//! Updates are sequential: each token is resampled against counts that
//! already include every earlier update of the same sweep.

use rand::Rng;

use crate::conditional::{opinion_weights, topic_weights};
use crate::dist;
use crate::error::Result;
use crate::state::{SamplerState, NO_DOCUMENT};

pub fn sweep<R: Rng + ?Sized>(state: &mut SamplerState, rng: &mut R) -> Result<()> {
    let mut weights = vec![0.0; state.hyper.num_topics];
    sweep_topics(state, rng, &mut weights)?;
    sweep_opinions(state, rng, &mut weights)
}

fn sweep_topics<R: Rng + ?Sized>(state: &mut SamplerState, rng: &mut R, weights: &mut [f64]) -> Result<()> {
    let hyper = state.hyper;
    let vocab_size = state.topic_vocab_size;
    for (d, tokens) in state.topic_tokens.iter().enumerate() {
        let z_d = &mut state.z[d];
        for token in tokens {
            let w = token.word;
            let old_k = z_d[token.position];
            state.topics.remove(d, w, old_k);
            topic_weights(&state.topics, &hyper, vocab_size, d, w, weights);
            if let Err(e) = dist::normalize(weights) {
                state.topics.insert(d, w, old_k);
                return Err(e);
            }
            let new_k = dist::inverse_cdf(weights, rng.gen::<f64>());
            z_d[token.position] = new_k;
            state.topics.insert(d, w, new_k);
        }
    }
    Ok(())
}

fn sweep_opinions<R: Rng + ?Sized>(state: &mut SamplerState, rng: &mut R, weights: &mut [f64]) -> Result<()> {
    let hyper = state.hyper;
    let vocab_size = state.opinion_vocab_size;
    for (p, docs) in state.opinion_tokens.iter().enumerate() {
        for (d_p, tokens) in docs.iter().enumerate() {
            let d = state.opinion_docs[p][d_p];
            // Reported at initialization
            if d == NO_DOCUMENT || state.topics.ntd[d] == 0 {
                continue;
            }
            let x_d = &mut state.x[p][d_p];
            for token in tokens {
                let w = token.word;
                let old_k = x_d[token.position];
                state.opinions.remove(p, w, old_k);
                opinion_weights(&state.topics, &state.opinions, &hyper, vocab_size, p, d, w, weights);
                if let Err(e) = dist::normalize(weights) {
                    state.opinions.insert(p, w, old_k);
                    return Err(e);
                }
                let new_k = dist::inverse_cdf(weights, rng.gen::<f64>());
                x_d[token.position] = new_k;
                state.opinions.insert(p, w, new_k);
            }
        }
    }
    Ok(())
}
