use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::{Array2, ArrayView1};

use crate::config::Config;
use crate::error::Result;
use crate::estimate::Parameters;

/// Posterior-mean estimates of a finished run.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Model {
    pub config: Config,
    pub perspectives: Vec<String>,
    /// theta: DT x K
    pub theta: Array2<f64>,
    /// phi: K x VT
    pub phi_topic: Array2<f64>,
    /// phi: K x VO, one per perspective
    pub phi_opinion: Vec<Array2<f64>>,
    /// Documents whose opinion words were never resampled.
    #[serde(default)]
    pub degenerate_documents: Vec<usize>,
}

impl Model {
    pub fn new(config: Config, perspectives: Vec<String>, params: Parameters) -> Model {
        Model {
            config:               config,
            perspectives:         perspectives,
            theta:                params.theta,
            phi_topic:            params.phi_topic,
            phi_opinion:          params.phi_opinion,
            degenerate_documents: Vec::new(),
        }
    }

    pub fn num_topics(&self) -> usize {
        self.phi_topic.nrows()
    }

    /// The `n` most probable topic words of topic `k`.
    pub fn top_topic_words(&self, k: usize, n: usize) -> Vec<(usize, f64)> {
        top_n(self.phi_topic.row(k), n)
    }

    /// The `n` most probable opinion words of perspective `p` for topic `k`.
    pub fn top_opinion_words(&self, p: usize, k: usize, n: usize) -> Vec<(usize, f64)> {
        top_n(self.phi_opinion[p].row(k), n)
    }

    pub fn print_topics_and_opinions_by<T, U, F, G>(&self, top: usize, topic_word: F, opinion_word: G) -> io::Result<()>
        where T: fmt::Display, U: fmt::Display, F: FnMut(usize) -> T, G: FnMut(usize) -> U
    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_topics_and_opinions_by(&mut out, top, topic_word, opinion_word)
    }

    /// Renders every topic followed by each perspective's opinion words for it.
    pub fn write_topics_and_opinions_by<W, T, U, F, G>(&self, out: &mut W, top: usize, mut topic_word: F, mut opinion_word: G) -> io::Result<()>
        where W: Write, T: fmt::Display, U: fmt::Display, F: FnMut(usize) -> T, G: FnMut(usize) -> U
    {
        for k in 0..self.num_topics() {
            let words: Vec<String> = self.top_topic_words(k, top)
                .into_iter()
                .map(|(v, prob)| format!("{} ({:.4})", topic_word(v), prob))
                .collect();
            writeln!(out, "Topic {}: {}", k, words.join(" - "))?;
            writeln!(out)?;
            for (p, name) in self.perspectives.iter().enumerate() {
                let words: Vec<String> = self.top_opinion_words(p, k, top)
                    .into_iter()
                    .map(|(v, prob)| format!("{} ({:.4})", opinion_word(v), prob))
                    .collect();
                writeln!(out, "Opinion {}: {}", name, words.join(" - "))?;
            }
            writeln!(out, "-----")?;
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut file, self)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Model> {
        let file = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(file)?)
    }
}

// Descending probability, ties broken by word id
fn top_n(row: ArrayView1<f64>, n: usize) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = row.iter().cloned().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;

    fn model() -> Model {
        let params = Parameters {
            theta:       arr2(&[[0.9, 0.1], [0.2, 0.8]]),
            phi_topic:   arr2(&[[0.1, 0.6, 0.3], [0.5, 0.25, 0.25]]),
            phi_opinion: vec![arr2(&[[0.7, 0.3], [0.4, 0.6]]), arr2(&[[0.5, 0.5], [0.1, 0.9]])],
        };
        Model::new(Config::default(), vec!["gov".to_string(), "opp".to_string()], params)
    }

    #[test]
    fn top_words_are_ranked_by_probability() {
        let model = model();
        assert_eq!(model.top_topic_words(0, 2), vec![(1, 0.6), (2, 0.3)]);
        assert_eq!(model.top_topic_words(1, 10), vec![(0, 0.5), (1, 0.25), (2, 0.25)]);
        assert_eq!(model.top_opinion_words(1, 1, 1), vec![(1, 0.9)]);
    }

    #[test]
    fn report_lists_topics_then_opinions() {
        let model = model();
        let topic_vocab = ["tax", "school", "army"];
        let opinion_vocab = ["good", "bad"];
        let mut out = Vec::new();
        model.write_topics_and_opinions_by(&mut out, 1, |v| topic_vocab[v], |v| opinion_vocab[v]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines[0], "Topic 0: school (0.6000)");
        assert_eq!(lines[1], "Opinion gov: good (0.7000)");
        assert_eq!(lines[2], "Opinion opp: good (0.5000)");
        assert_eq!(lines[3], "-----");
        assert_eq!(lines[4], "Topic 1: tax (0.5000)");
    }

    #[test]
    fn json_round_trip_keeps_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = model();
        model.save_json(&path).unwrap();
        let loaded = Model::load_json(&path).unwrap();
        assert_eq!(loaded.perspectives, model.perspectives);
        assert_eq!(loaded.phi_opinion, model.phi_opinion);
        assert_eq!(loaded.config, model.config);
    }
}
