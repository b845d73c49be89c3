//! Corpora sampled from the CPT generative process, for smoke runs and tests.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::LogNormal;

use crate::corpus::{Corpus, Vocabulary};
use crate::dist::{Categorical, Dirichlet};
use crate::error::{CptError, Result};

#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub num_perspectives: usize,
    pub docs_per_perspective: usize,
    pub num_topics: usize,
    pub topic_vocab_size: usize,
    pub opinion_vocab_size: usize,
    /// Location and scale of the log-normal topic-word count per document.
    pub mean_ln_topic_words: f64,
    pub std_dev_ln_topic_words: f64,
    pub mean_ln_opinion_words: f64,
    pub std_dev_ln_opinion_words: f64,
    pub alpha: f64,
    pub beta: f64,
    pub beta_o: f64,
}

impl Default for SyntheticSpec {
    fn default() -> SyntheticSpec {
        SyntheticSpec {
            num_perspectives:         2,
            docs_per_perspective:     200,
            num_topics:               10,
            topic_vocab_size:         2000,
            opinion_vocab_size:       1000,
            mean_ln_topic_words:      f64::ln(100.0),
            std_dev_ln_topic_words:   0.3,
            mean_ln_opinion_words:    f64::ln(60.0),
            std_dev_ln_opinion_words: 0.3,
            alpha:                    0.1,
            beta:                     0.1,
            beta_o:                   0.1,
        }
    }
}

/// A generated corpus together with the distributions it was drawn from.
#[derive(Debug, Clone)]
pub struct Synthetic {
    pub corpus: Corpus,
    /// K x VT
    pub phi_topic: Vec<Vec<f64>>,
    /// P x K x VO
    pub phi_opinion: Vec<Vec<Vec<f64>>>,
    /// DT x K
    pub theta: Vec<Vec<f64>>,
}

/// Topic words are drawn from the document's theta; every opinion word takes
/// the topic of a uniformly chosen topic word of the same document and is
/// drawn from its perspective's opinion distribution for that topic.
pub fn generate<R: Rng + ?Sized>(spec: &SyntheticSpec, rng: &mut R) -> Result<Synthetic> {
    let num_topics = spec.num_topics;
    if num_topics == 0 {
        return Err(CptError::InvalidTopicCount);
    }
    // phi
    let dir_beta = Dirichlet::symmetric(spec.beta, spec.topic_vocab_size)?;
    let phi_topic: Vec<Vec<f64>> = (0..num_topics).map(|_| dir_beta.sample(rng)).collect();
    let dir_beta_o = Dirichlet::symmetric(spec.beta_o, spec.opinion_vocab_size)?;
    let mut phi_opinion: Vec<Vec<Vec<f64>>> = Vec::with_capacity(spec.num_perspectives);
    for _p in 0..spec.num_perspectives {
        phi_opinion.push((0..num_topics).map(|_| dir_beta_o.sample(rng)).collect());
    }
    let cat_phi_topic = phi_topic.iter().cloned().map(Categorical::new).collect::<Result<Vec<_>>>()?;
    let mut cat_phi_opinion = Vec::with_capacity(spec.num_perspectives);
    for phi_p in &phi_opinion {
        cat_phi_opinion.push(phi_p.iter().cloned().map(Categorical::new).collect::<Result<Vec<_>>>()?);
    }

    // theta, nd, z, w
    let dir_alpha = Dirichlet::symmetric(spec.alpha, num_topics)?;
    let topic_len = log_normal(spec.mean_ln_topic_words, spec.std_dev_ln_topic_words)?;
    let opinion_len = log_normal(spec.mean_ln_opinion_words, spec.std_dev_ln_opinion_words)?;
    let mut corpus = Corpus::with_vocabularies(
        numbered_vocabulary("t", spec.topic_vocab_size),
        numbered_vocabulary("o", spec.opinion_vocab_size));
    let mut theta = Vec::with_capacity(spec.num_perspectives * spec.docs_per_perspective);
    for p in 0..spec.num_perspectives {
        corpus.add_perspective(&format!("perspective{}", p));
    }
    for _ in 0..spec.docs_per_perspective {
        for p in 0..spec.num_perspectives {
            let theta_d: Vec<f64> = dir_alpha.sample(rng);
            let cat_theta = Categorical::new(theta_d.clone())?;
            let nt = f64::ceil(topic_len.sample(rng)).max(1.0) as usize;
            let no = f64::ceil(opinion_len.sample(rng)) as usize;
            let z_d: Vec<usize> = (0..nt).map(|_| cat_theta.sample(rng)).collect();
            let w_d: Vec<usize> = z_d.iter().map(|&k| cat_phi_topic[k].sample(rng)).collect();
            let among_words = Uniform::new(0, nt);
            let o_d: Vec<usize> = (0..no)
                .map(|_| {
                    let x = z_d[among_words.sample(rng)];
                    cat_phi_opinion[p][x].sample(rng)
                })
                .collect();
            corpus.push_document(p, w_d, o_d);
            theta.push(theta_d);
        }
    }

    Ok(Synthetic {
        corpus:      corpus,
        phi_topic:   phi_topic,
        phi_opinion: phi_opinion,
        theta:       theta,
    })
}

fn log_normal(mean: f64, std_dev: f64) -> Result<LogNormal<f64>> {
    LogNormal::new(mean, std_dev)
        .map_err(|_| CptError::NonPositiveHyperparameter { name: "log-normal std_dev", value: std_dev })
}

fn numbered_vocabulary(prefix: &str, size: usize) -> Vocabulary {
    let mut vocab = Vocabulary::new();
    for v in 0..size {
        vocab.id_or_insert(&format!("{}{}", prefix, v));
    }
    vocab
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::corpus::{CorpusAdapter, WordClass};

    fn small_spec() -> SyntheticSpec {
        SyntheticSpec {
            num_perspectives:      3,
            docs_per_perspective:  4,
            num_topics:            2,
            topic_vocab_size:      30,
            opinion_vocab_size:    20,
            mean_ln_topic_words:   f64::ln(10.0),
            mean_ln_opinion_words: f64::ln(5.0),
            ..SyntheticSpec::default()
        }
    }

    #[test]
    fn generated_corpus_has_requested_shape() {
        let mut rng = StdRng::seed_from_u64(30);
        let synthetic = generate(&small_spec(), &mut rng).unwrap();
        let corpus = &synthetic.corpus;
        assert_eq!(corpus.num_documents(), 12);
        assert_eq!(corpus.num_perspectives(), 3);
        assert_eq!(corpus.opinion_document_counts(), vec![4, 4, 4]);
        assert_eq!(corpus.topic_vocab_size(), 30);
        assert_eq!(corpus.opinion_vocab_size(), 20);
        assert_eq!(&corpus.topic_vocab()[7], "t7");
        assert_eq!(synthetic.theta.len(), 12);
        assert_eq!(synthetic.phi_opinion.len(), 3);
        for d in 0..corpus.num_documents() {
            assert!(corpus.words(d, WordClass::Topic).count() >= 1);
            assert!(corpus.words(d, WordClass::Topic).all(|(w, _)| w < 30));
            assert!(corpus.words(d, WordClass::Opinion).all(|(w, _)| w < 20));
        }
    }

    #[test]
    fn generation_is_seeded() {
        let a = generate(&small_spec(), &mut StdRng::seed_from_u64(31)).unwrap();
        let b = generate(&small_spec(), &mut StdRng::seed_from_u64(31)).unwrap();
        assert_eq!(a.theta, b.theta);
        let words = |s: &Synthetic| -> Vec<Vec<(usize, usize)>> {
            (0..s.corpus.num_documents()).map(|d| s.corpus.words(d, WordClass::Opinion).collect()).collect()
        };
        assert_eq!(words(&a), words(&b));
    }
}
