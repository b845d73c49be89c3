use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::corpus::CorpusAdapter;
use crate::error::Result;
use crate::estimate::Parameters;
use crate::kernel;
use crate::model::Model;
use crate::snapshot::{self, DirectoryStore, InMemorySnapshots, SnapshotSink};
use crate::state::SamplerState;

/// Collapsed Gibbs sampler for the cross-perspective topic model.
pub struct GibbsSampler<'a, C: CorpusAdapter + ?Sized + 'a> {
    corpus: &'a C,
    config: Config,
    state: SamplerState,
    rng: StdRng,
}

impl<'a, C: CorpusAdapter + ?Sized + 'a> GibbsSampler<'a, C> {
    /// Validates `config` and randomly initializes the state.
    pub fn new(corpus: &'a C, config: Config) -> Result<GibbsSampler<'a, C>> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        let state = SamplerState::new(corpus, config.hyperparameters(), &mut rng)?;
        Ok(GibbsSampler {
            corpus: corpus,
            config: config,
            state:  state,
            rng:    rng,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &SamplerState {
        &self.state
    }

    /// Resamples every token once.
    pub fn sweep(&mut self) -> Result<()> {
        kernel::sweep(&mut self.state, &mut self.rng)
    }

    /// Runs the configured number of sweeps and averages the parameter
    /// snapshots, in memory or under `<out_dir>/parameter_samples`.
    pub fn run(&mut self) -> Result<Model> {
        let params = match self.config.parameter_dir() {
            Some(dir) => {
                info!("Storing parameter samples in {}", dir.display());
                let mut store = DirectoryStore::create(dir)?;
                self.run_with_sink(&mut store)?
            },
            None => {
                let mut snapshots = InMemorySnapshots::new();
                self.run_with_sink(&mut snapshots)?
            },
        };
        let perspectives = (0..self.corpus.num_perspectives())
            .map(|p| self.corpus.perspective_name(p))
            .collect();
        let mut model = Model::new(self.config.clone(), perspectives, params);
        model.degenerate_documents = self.state.degenerate_documents().to_vec();
        Ok(model)
    }

    pub fn run_with_sink<S: SnapshotSink + ?Sized>(&mut self, sink: &mut S) -> Result<Parameters> {
        let burn_in = self.config.burn_in;
        let num_iterations = self.config.num_iterations;
        info!("Sampling: {} burn-in sweeps, {} sampled sweeps", burn_in, num_iterations);
        for s in 0..(burn_in + num_iterations) {
            let started = Instant::now();
            self.sweep()?;
            if s < burn_in {
                debug!("Burn-in {} of {}", s + 1, burn_in);
            }
            else {
                let t = s - burn_in;
                sink.record(t, &Parameters::estimate(&self.state))?;
                debug!("Iteration {} of {}", t + 1, num_iterations);
            }
            debug!("time elapsed: {:?}", started.elapsed());
        }
        info!("Sampled.");
        snapshot::mean(&*sink, num_iterations, self.state.num_perspectives())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::corpus::Corpus;
    use crate::error::CptError;

    fn corpus() -> Corpus {
        let mut corpus = Corpus::new();
        corpus.add_document("gov", &["tax", "budget", "school", "tax"], &["raise", "fair"]);
        corpus.add_document("gov", &["school", "teacher"], &["fund", "good", "fund"]);
        corpus.add_document("opp", &["army", "border", "tax"], &["cut", "strong"]);
        corpus.add_document("opp", &["border", "army"], &["protect", "strong", "waste"]);
        corpus
    }

    fn config() -> Config {
        Config {
            num_topics:     2,
            alpha:          0.1,
            beta:           0.1,
            beta_o:         0.1,
            num_iterations: 5,
            burn_in:        0,
            seed:           Some(42),
            out_dir:        None,
        }
    }

    #[test]
    fn end_to_end_shapes_and_normalization() {
        let corpus = corpus();
        let mut sampler = GibbsSampler::new(&corpus, config()).unwrap();
        let model = sampler.run().unwrap();
        assert_eq!(model.theta.dim(), (4, 2));
        for row in model.theta.outer_iter() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
        assert_eq!(model.phi_topic.dim(), (2, corpus.topic_vocab_size()));
        assert_eq!(model.phi_opinion.len(), 2);
        for phi in &model.phi_opinion {
            assert_eq!(phi.dim(), (2, corpus.opinion_vocab_size()));
            for row in phi.outer_iter() {
                assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
            }
        }
        assert_eq!(model.perspectives, vec!["gov".to_string(), "opp".to_string()]);
        assert!(sampler.state().is_consistent());
    }

    #[test]
    fn persisted_and_in_memory_modes_agree() {
        let corpus = corpus();
        let in_memory = GibbsSampler::new(&corpus, config()).unwrap().run().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let persisted_config = Config { out_dir: Some(dir.path().to_path_buf()), ..config() };
        let persisted = GibbsSampler::new(&corpus, persisted_config).unwrap().run().unwrap();

        assert!(dir.path().join("parameter_samples").join("theta_0004.json").is_file());
        for (a, b) in in_memory.theta.iter().zip(persisted.theta.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        for (a, b) in in_memory.phi_topic.iter().zip(persisted.phi_topic.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        for p in 0..2 {
            for (a, b) in in_memory.phi_opinion[p].iter().zip(persisted.phi_opinion[p].iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn burn_in_sweeps_are_not_averaged() {
        let corpus = corpus();
        let config = Config { burn_in: 3, num_iterations: 2, ..config() };
        let mut sampler = GibbsSampler::new(&corpus, config).unwrap();
        let mut snapshots = InMemorySnapshots::new();
        sampler.run_with_sink(&mut snapshots).unwrap();
        assert_eq!(snapshots.len(), 2);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let corpus = corpus();
        let a = GibbsSampler::new(&corpus, config()).unwrap().run().unwrap();
        let b = GibbsSampler::new(&corpus, config()).unwrap().run().unwrap();
        assert_eq!(a.theta, b.theta);
        assert_eq!(a.phi_opinion, b.phi_opinion);
    }

    #[test]
    fn invalid_config_fails_before_initialization() {
        let corpus = corpus();
        let config = Config { num_topics: 0, ..config() };
        match GibbsSampler::new(&corpus, config) {
            Err(CptError::InvalidTopicCount) => {},
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("sampler was created"),
        }
    }
}
