use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::ops::Index;
use std::path::{Path, PathBuf};

use crate::error::{CptError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordClass {
    Topic,
    Opinion,
}

impl fmt::Display for WordClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            WordClass::Topic   => "topic".fmt(f),
            WordClass::Opinion => "opinion".fmt(f),
        }
    }
}

/// Perspective membership of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRef {
    pub perspective: usize,
    /// Stable index of the document among its perspective's opinion documents.
    pub index_in_perspective: usize,
}

/// What the sampler needs from a prepared corpus.
///
/// Documents are numbered `0..num_documents()`; `words` yields
/// `(vocabulary id, position in document)` pairs and may be called any number
/// of times for the same document.
pub trait CorpusAdapter {
    fn num_documents(&self) -> usize;
    fn num_perspectives(&self) -> usize;
    fn topic_vocab_size(&self) -> usize;
    fn opinion_vocab_size(&self) -> usize;
    fn document(&self, d: usize) -> DocumentRef;
    fn words<'a>(&'a self, d: usize, class: WordClass) -> Box<dyn Iterator<Item = (usize, usize)> + 'a>;

    fn perspective_name(&self, p: usize) -> String {
        p.to_string()
    }

    fn documents<'a>(&'a self) -> Box<dyn Iterator<Item = (usize, DocumentRef)> + 'a> {
        Box::new((0..self.num_documents()).map(move |d| (d, self.document(d))))
    }

    // DO[p]
    fn opinion_document_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_perspectives()];
        for (_, doc) in self.documents() {
            if doc.perspective < counts.len() && counts[doc.perspective] <= doc.index_in_perspective {
                counts[doc.perspective] = doc.index_in_perspective + 1;
            }
        }
        counts
    }

    fn max_document_length(&self, class: WordClass) -> usize {
        (0..self.num_documents())
            .map(|d| self.words(d, class).count())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    words: Vec<String>,
    ids: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new() -> Vocabulary {
        Vocabulary::default()
    }

    pub fn id_or_insert(&mut self, word: &str) -> usize {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.words.len();
        self.words.push(word.to_string());
        self.ids.insert(word.to_string(), id);
        id
    }

    pub fn id(&self, word: &str) -> Option<usize> {
        self.ids.get(word).cloned()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Index<usize> for Vocabulary {
    type Output = str;

    fn index(&self, id: usize) -> &str {
        &self.words[id]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Perspective {
    pub name: String,
    /// Global document indices, in opinion-document order.
    pub documents: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub perspective: usize,
    pub index_in_perspective: usize,
    pub topic_words: Vec<usize>,
    pub opinion_words: Vec<usize>,
}

/// In-memory corpus of perspectives, each holding documents made of a
/// topic-word sequence and an opinion-word sequence.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    perspectives: Vec<Perspective>,
    documents: Vec<Document>,
    topic_vocab: Vocabulary,
    opinion_vocab: Vocabulary,
}

impl Corpus {
    pub fn new() -> Corpus {
        Corpus::default()
    }

    pub fn with_vocabularies(topic_vocab: Vocabulary, opinion_vocab: Vocabulary) -> Corpus {
        Corpus {
            perspectives:  Vec::new(),
            documents:     Vec::new(),
            topic_vocab:   topic_vocab,
            opinion_vocab: opinion_vocab,
        }
    }

    /// Loads a corpus laid out as one sub-directory per perspective holding
    /// one file per document: topic words on the first line, opinion words on
    /// the second. Perspectives and documents are read in name order.
    pub fn from_dir<P: AsRef<Path>>(path: P) -> Result<Corpus> {
        let mut corpus = Corpus::new();
        for perspective_dir in sorted_entries(path.as_ref())? {
            if !perspective_dir.is_dir() {
                continue;
            }
            let name = perspective_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let p = corpus.add_perspective(&name);
            for doc_path in sorted_entries(&perspective_dir)? {
                if !doc_path.is_file() {
                    continue;
                }
                let (topic_line, opinion_line) = read_document(&doc_path)?;
                let topic_words: Vec<&str> = topic_line.split_whitespace().collect();
                let opinion_words: Vec<&str> = opinion_line.split_whitespace().collect();
                corpus.add_document_to(p, &topic_words, &opinion_words);
            }
            debug!("Loaded perspective {} ({} documents)", name, corpus.perspectives[p].documents.len());
        }
        Ok(corpus)
    }

    /// Returns the index of the perspective named `name`, creating it if needed.
    pub fn add_perspective(&mut self, name: &str) -> usize {
        if let Some(p) = self.perspectives.iter().position(|persp| persp.name == name) {
            return p;
        }
        self.perspectives.push(Perspective {
            name:      name.to_string(),
            documents: Vec::new(),
        });
        self.perspectives.len() - 1
    }

    pub fn add_document<S: AsRef<str>>(&mut self, perspective: &str, topic_words: &[S], opinion_words: &[S]) -> usize {
        let p = self.add_perspective(perspective);
        self.add_document_to(p, topic_words, opinion_words)
    }

    fn add_document_to<S: AsRef<str>>(&mut self, p: usize, topic_words: &[S], opinion_words: &[S]) -> usize {
        let topic_ids = topic_words.iter().map(|w| self.topic_vocab.id_or_insert(w.as_ref())).collect();
        let opinion_ids = opinion_words.iter().map(|w| self.opinion_vocab.id_or_insert(w.as_ref())).collect();
        self.push_document(p, topic_ids, opinion_ids)
    }

    /// Appends a document whose words are already vocabulary ids.
    ///
    /// Panics if `p` is not a known perspective.
    pub fn push_document(&mut self, p: usize, topic_words: Vec<usize>, opinion_words: Vec<usize>) -> usize {
        let d = self.documents.len();
        let index_in_perspective = self.perspectives[p].documents.len();
        self.perspectives[p].documents.push(d);
        self.documents.push(Document {
            perspective:          p,
            index_in_perspective: index_in_perspective,
            topic_words:          topic_words,
            opinion_words:        opinion_words,
        });
        d
    }

    pub fn perspectives(&self) -> &[Perspective] {
        &self.perspectives
    }

    pub fn topic_vocab(&self) -> &Vocabulary {
        &self.topic_vocab
    }

    pub fn opinion_vocab(&self) -> &Vocabulary {
        &self.opinion_vocab
    }
}

impl CorpusAdapter for Corpus {
    fn num_documents(&self) -> usize {
        self.documents.len()
    }

    fn num_perspectives(&self) -> usize {
        self.perspectives.len()
    }

    fn topic_vocab_size(&self) -> usize {
        self.topic_vocab.len()
    }

    fn opinion_vocab_size(&self) -> usize {
        self.opinion_vocab.len()
    }

    fn document(&self, d: usize) -> DocumentRef {
        let doc = &self.documents[d];
        DocumentRef {
            perspective:          doc.perspective,
            index_in_perspective: doc.index_in_perspective,
        }
    }

    fn words<'a>(&'a self, d: usize, class: WordClass) -> Box<dyn Iterator<Item = (usize, usize)> + 'a> {
        let words = match class {
            WordClass::Topic   => &self.documents[d].topic_words,
            WordClass::Opinion => &self.documents[d].opinion_words,
        };
        Box::new(words.iter().enumerate().map(|(i, &w)| (w, i)))
    }

    fn perspective_name(&self, p: usize) -> String {
        self.perspectives[p].name.clone()
    }

    fn opinion_document_counts(&self) -> Vec<usize> {
        self.perspectives.iter().map(|p| p.documents.len()).collect()
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        paths.push(entry?.path());
    }
    paths.sort();
    Ok(paths)
}

fn read_document(path: &Path) -> Result<(String, String)> {
    let file = BufReader::new(File::open(path)?);
    let mut lines = file.lines();
    let malformed = || CptError::MalformedDocument { path: path.display().to_string() };
    let topic_line = lines.next().ok_or_else(malformed)??;
    // A missing second line means the document has no opinion words
    let opinion_line = match lines.next() {
        Some(line) => line?,
        None       => String::new(),
    };
    for line in lines {
        if !line?.trim().is_empty() {
            return Err(malformed());
        }
    }
    Ok((topic_line, opinion_line))
}
