//! Cross-perspective topic model estimated by collapsed Gibbs sampling.
//!
//! Documents share one set of topics over topic words, while every
//! perspective has its own topic-conditional distribution over opinion words.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod conditional;
pub mod config;
pub mod corpus;
pub mod dist;
pub mod error;
pub mod estimate;
pub mod kernel;
pub mod model;
pub mod sampler;
pub mod snapshot;
pub mod state;
pub mod synthetic;

pub use crate::config::{Config, Hyperparameters};
pub use crate::corpus::{Corpus, CorpusAdapter, DocumentRef, WordClass};
pub use crate::error::{CptError, Result};
pub use crate::estimate::Parameters;
pub use crate::model::Model;
pub use crate::sampler::GibbsSampler;
pub use crate::snapshot::{DirectoryStore, InMemorySnapshots, SnapshotSink, TableKey};
pub use crate::state::SamplerState;
