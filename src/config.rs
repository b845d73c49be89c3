use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{CptError, Result};

/// Dirichlet priors and the fixed number of topics.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    pub num_topics: usize,
    /// Document-topic prior.
    pub alpha: f64,
    /// Topic-word prior.
    pub beta: f64,
    /// Opinion-word prior.
    pub beta_o: f64,
}

impl Hyperparameters {
    pub fn validate(&self) -> Result<()> {
        if self.num_topics == 0 {
            return Err(CptError::InvalidTopicCount);
        }
        for &(name, value) in &[("alpha", self.alpha), ("beta", self.beta), ("beta_o", self.beta_o)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CptError::NonPositiveHyperparameter { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub num_topics: usize,
    pub alpha: f64,
    pub beta: f64,
    pub beta_o: f64,
    /// Number of sweeps whose parameter estimates are averaged.
    pub num_iterations: usize,
    /// Sweeps discarded before the first snapshot.
    pub burn_in: usize,
    pub seed: Option<u64>,
    /// When set, snapshots are persisted under `<out_dir>/parameter_samples`
    /// instead of being kept in memory.
    pub out_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            num_topics:     10,
            alpha:          0.02,
            beta:           0.02,
            beta_o:         0.02,
            num_iterations: 2,
            burn_in:        0,
            seed:           None,
            out_dir:        None,
        }
    }
}

impl Config {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let file = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(file)?)
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            num_topics: self.num_topics,
            alpha:      self.alpha,
            beta:       self.beta,
            beta_o:     self.beta_o,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.hyperparameters().validate()?;
        if self.num_iterations == 0 {
            return Err(CptError::ZeroIterations);
        }
        Ok(())
    }

    pub fn parameter_dir(&self) -> Option<PathBuf> {
        self.out_dir.as_ref().map(|dir| dir.join("parameter_samples"))
    }
}
