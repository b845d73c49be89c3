use ndarray::{Array1, Array2, Array3, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::config::Hyperparameters;
use crate::corpus::{CorpusAdapter, WordClass};
use crate::error::{CptError, Result};

/// Marks an opinion-document slot that no corpus document claimed.
pub const NO_DOCUMENT: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub word: usize,
    pub position: usize,
}

/// Sufficient statistics of the topic-word assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicCounts {
    /// DT x K
    pub ndk: Array2<usize>,
    /// K x VT
    pub nkw: Array2<usize>,
    pub nk: Array1<usize>,
    /// Topic-word tokens per document; fixed after initialization.
    pub ntd: Array1<usize>,
}

impl TopicCounts {
    fn new(num_docs: usize, num_topics: usize, vocab_size: usize) -> TopicCounts {
        TopicCounts {
            ndk: Array2::zeros((num_docs, num_topics)),
            nkw: Array2::zeros((num_topics, vocab_size)),
            nk:  Array1::zeros(num_topics),
            ntd: Array1::zeros(num_docs),
        }
    }

    #[inline]
    pub fn remove(&mut self, d: usize, w: usize, k: usize) {
        self.ndk[[d, k]] -= 1;
        self.nkw[[k, w]] -= 1;
        self.nk[k] -= 1;
    }

    #[inline]
    pub fn insert(&mut self, d: usize, w: usize, k: usize) {
        self.ndk[[d, k]] += 1;
        self.nkw[[k, w]] += 1;
        self.nk[k] += 1;
    }
}

/// Sufficient statistics of the opinion-word assignments, per perspective.
#[derive(Debug, Clone, PartialEq)]
pub struct OpinionCounts {
    /// P x K x VO
    pub nrs: Array3<usize>,
    /// P x K
    pub ns: Array2<usize>,
}

impl OpinionCounts {
    fn new(num_perspectives: usize, num_topics: usize, vocab_size: usize) -> OpinionCounts {
        OpinionCounts {
            nrs: Array3::zeros((num_perspectives, num_topics, vocab_size)),
            ns:  Array2::zeros((num_perspectives, num_topics)),
        }
    }

    #[inline]
    pub fn remove(&mut self, p: usize, w: usize, k: usize) {
        self.nrs[[p, k, w]] -= 1;
        self.ns[[p, k]] -= 1;
    }

    #[inline]
    pub fn insert(&mut self, p: usize, w: usize, k: usize) {
        self.nrs[[p, k, w]] += 1;
        self.ns[[p, k]] += 1;
    }
}

/// Latent assignments and count tables of one sampler run.
///
/// Every change of an assignment goes through the `remove`/`insert` pairs of
/// `TopicCounts` and `OpinionCounts`, so the tables always agree with `z` and
/// `x` between token updates.
#[derive(Debug, Clone)]
pub struct SamplerState {
    pub(crate) hyper: Hyperparameters,
    pub(crate) topic_vocab_size: usize,
    pub(crate) opinion_vocab_size: usize,
    pub(crate) topic_tokens: Vec<Vec<Token>>,
    pub(crate) z: Vec<Vec<usize>>,
    // opinion_docs[p][d_p] = d
    pub(crate) opinion_docs: Vec<Vec<usize>>,
    pub(crate) opinion_tokens: Vec<Vec<Vec<Token>>>,
    pub(crate) x: Vec<Vec<Vec<usize>>>,
    pub(crate) topics: TopicCounts,
    pub(crate) opinions: OpinionCounts,
    pub(crate) degenerate_documents: Vec<usize>,
}

impl SamplerState {
    /// Draws a uniformly random topic for every topic-word and opinion-word
    /// token of `corpus` and builds the matching count tables.
    pub fn new<C, R>(corpus: &C, hyper: Hyperparameters, rng: &mut R) -> Result<SamplerState>
        where C: CorpusAdapter + ?Sized, R: Rng + ?Sized
    {
        hyper.validate()?;
        let num_docs = corpus.num_documents();
        let num_perspectives = corpus.num_perspectives();
        let topic_vocab_size = corpus.topic_vocab_size();
        let opinion_vocab_size = corpus.opinion_vocab_size();
        let num_topics = hyper.num_topics;
        if num_docs == 0 {
            return Err(CptError::EmptyCorpus);
        }
        if num_perspectives == 0 {
            return Err(CptError::NoPerspectives);
        }
        if topic_vocab_size == 0 {
            return Err(CptError::EmptyVocabulary { class: WordClass::Topic });
        }
        if opinion_vocab_size == 0 {
            return Err(CptError::EmptyVocabulary { class: WordClass::Opinion });
        }
        let opinion_doc_counts = corpus.opinion_document_counts();

        // Construct zero-filled tables
        let mut topic_tokens: Vec<Vec<Token>> = Vec::with_capacity(num_docs);
        let mut z: Vec<Vec<usize>> = Vec::with_capacity(num_docs);
        let mut opinion_docs: Vec<Vec<usize>> = Vec::with_capacity(num_perspectives);
        let mut opinion_tokens: Vec<Vec<Vec<Token>>> = Vec::with_capacity(num_perspectives);
        let mut x: Vec<Vec<Vec<usize>>> = Vec::with_capacity(num_perspectives);
        for p in 0..num_perspectives {
            let count = opinion_doc_counts.get(p).cloned().unwrap_or(0);
            opinion_docs.push(vec![NO_DOCUMENT; count]);
            opinion_tokens.push(vec![Vec::new(); count]);
            x.push(vec![Vec::new(); count]);
        }
        let mut topics = TopicCounts::new(num_docs, num_topics, topic_vocab_size);
        let mut opinions = OpinionCounts::new(num_perspectives, num_topics, opinion_vocab_size);
        let mut degenerate_documents = Vec::new();

        // Initialize z, x and the counts
        let among_topics = Uniform::new(0, num_topics);
        for d in 0..num_docs {
            let doc = corpus.document(d);
            let p = doc.perspective;
            if p >= num_perspectives {
                return Err(CptError::UnknownPerspective { document: d, perspective: p });
            }
            let d_p = doc.index_in_perspective;
            if d_p >= opinion_docs[p].len() {
                return Err(CptError::OpinionDocumentOutOfRange {
                    document: d,
                    index:    d_p,
                    count:    opinion_docs[p].len(),
                });
            }
            if opinion_docs[p][d_p] != NO_DOCUMENT {
                return Err(CptError::DuplicateOpinionDocument {
                    document:    d,
                    other:       opinion_docs[p][d_p],
                    perspective: p,
                    index:       d_p,
                });
            }
            opinion_docs[p][d_p] = d;

            let mut tokens = Vec::new();
            let mut z_d = Vec::new();
            let mut taken = Vec::new();
            for (w, i) in corpus.words(d, WordClass::Topic) {
                if w >= topic_vocab_size {
                    return Err(CptError::WordOutOfVocabulary {
                        class:      WordClass::Topic,
                        word:       w,
                        vocab_size: topic_vocab_size,
                    });
                }
                if !claim(&mut taken, i) {
                    return Err(CptError::DuplicatePosition { document: d, class: WordClass::Topic, position: i });
                }
                let k = among_topics.sample(rng);
                assign(&mut z_d, i, k);
                topics.insert(d, w, k);
                topics.ntd[d] += 1;
                tokens.push(Token { word: w, position: i });
            }
            topic_tokens.push(tokens);
            z.push(z_d);

            let tokens = &mut opinion_tokens[p][d_p];
            let x_d = &mut x[p][d_p];
            taken.clear();
            for (w, i) in corpus.words(d, WordClass::Opinion) {
                if w >= opinion_vocab_size {
                    return Err(CptError::WordOutOfVocabulary {
                        class:      WordClass::Opinion,
                        word:       w,
                        vocab_size: opinion_vocab_size,
                    });
                }
                if !claim(&mut taken, i) {
                    return Err(CptError::DuplicatePosition { document: d, class: WordClass::Opinion, position: i });
                }
                let k = among_topics.sample(rng);
                assign(x_d, i, k);
                opinions.insert(p, w, k);
                tokens.push(Token { word: w, position: i });
            }

            if topics.ntd[d] == 0 && !tokens.is_empty() {
                warn!("Document {} has opinion words but no topic words; its opinion words will not be resampled", d);
                degenerate_documents.push(d);
            }
        }

        info!("Initialized sampler: DT = {}, P = {}, VT = {}, VO = {}, K = {}",
              num_docs, num_perspectives, topic_vocab_size, opinion_vocab_size, num_topics);

        Ok(SamplerState {
            hyper:                hyper,
            topic_vocab_size:     topic_vocab_size,
            opinion_vocab_size:   opinion_vocab_size,
            topic_tokens:         topic_tokens,
            z:                    z,
            opinion_docs:         opinion_docs,
            opinion_tokens:       opinion_tokens,
            x:                    x,
            topics:               topics,
            opinions:             opinions,
            degenerate_documents: degenerate_documents,
        })
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyper
    }

    pub fn num_documents(&self) -> usize {
        self.topic_tokens.len()
    }

    pub fn num_perspectives(&self) -> usize {
        self.opinion_docs.len()
    }

    pub fn topic_vocab_size(&self) -> usize {
        self.topic_vocab_size
    }

    pub fn opinion_vocab_size(&self) -> usize {
        self.opinion_vocab_size
    }

    /// Topic assignments, `z[d][position]`.
    pub fn z(&self) -> &[Vec<usize>] {
        &self.z
    }

    /// Opinion assignments, `x[p][d_p][position]`.
    pub fn x(&self) -> &[Vec<Vec<usize>>] {
        &self.x
    }

    pub fn topic_counts(&self) -> &TopicCounts {
        &self.topics
    }

    pub fn opinion_counts(&self) -> &OpinionCounts {
        &self.opinions
    }

    /// Documents whose opinion words are skipped by the sweep because they
    /// have no topic words.
    pub fn degenerate_documents(&self) -> &[usize] {
        &self.degenerate_documents
    }

    /// Recounts every table from the assignments and checks the row-sum
    /// invariants.
    pub fn is_consistent(&self) -> bool {
        let num_topics = self.hyper.num_topics;
        let mut expected = TopicCounts::new(self.num_documents(), num_topics, self.topic_vocab_size);
        for (d, tokens) in self.topic_tokens.iter().enumerate() {
            for token in tokens {
                expected.insert(d, token.word, self.z[d][token.position]);
                expected.ntd[d] += 1;
            }
        }
        let mut expected_opinions = OpinionCounts::new(self.num_perspectives(), num_topics, self.opinion_vocab_size);
        for (p, docs) in self.opinion_tokens.iter().enumerate() {
            for (d_p, tokens) in docs.iter().enumerate() {
                for token in tokens {
                    expected_opinions.insert(p, token.word, self.x[p][d_p][token.position]);
                }
            }
        }

        expected == self.topics
            && expected_opinions == self.opinions
            && self.topics.ndk.sum_axis(Axis(1)) == self.topics.ntd
            && self.topics.nkw.sum_axis(Axis(1)) == self.topics.nk
            && self.opinions.nrs.sum_axis(Axis(2)) == self.opinions.ns
    }
}

// false if `position` was already claimed
fn claim(taken: &mut Vec<bool>, position: usize) -> bool {
    if taken.len() <= position {
        taken.resize(position + 1, false);
    }
    !std::mem::replace(&mut taken[position], true)
}

fn assign(labels: &mut Vec<usize>, position: usize, k: usize) {
    if labels.len() <= position {
        labels.resize(position + 1, 0);
    }
    labels[position] = k;
}
