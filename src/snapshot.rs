//! Per-iteration parameter history and its posterior mean.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::error::{CptError, Result};
use crate::estimate::Parameters;

/// Names one dense table of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKey {
    Theta,
    PhiTopic,
    PhiOpinion(usize),
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TableKey::Theta         => write!(f, "theta"),
            TableKey::PhiTopic      => write!(f, "phi_topic"),
            TableKey::PhiOpinion(p) => write!(f, "phi_opinion_{}", p),
        }
    }
}

impl Parameters {
    pub fn table(&self, key: TableKey) -> Option<&Array2<f64>> {
        match key {
            TableKey::Theta         => Some(&self.theta),
            TableKey::PhiTopic      => Some(&self.phi_topic),
            TableKey::PhiOpinion(p) => self.phi_opinion.get(p),
        }
    }

    fn keys(num_perspectives: usize) -> Vec<TableKey> {
        let mut keys = vec![TableKey::Theta, TableKey::PhiTopic];
        keys.extend((0..num_perspectives).map(TableKey::PhiOpinion));
        keys
    }
}

/// Destination of per-iteration snapshots that can hand them back for
/// averaging.
pub trait SnapshotSink {
    fn record(&mut self, iteration: usize, params: &Parameters) -> Result<()>;

    /// `Ok(None)` when no snapshot of `key` was recorded for `iteration`.
    fn load(&self, iteration: usize, key: TableKey) -> Result<Option<Array2<f64>>>;
}

/// Keeps every snapshot in memory.
#[derive(Debug, Default)]
pub struct InMemorySnapshots {
    snapshots: BTreeMap<usize, Parameters>,
}

impl InMemorySnapshots {
    pub fn new() -> InMemorySnapshots {
        InMemorySnapshots::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotSink for InMemorySnapshots {
    fn record(&mut self, iteration: usize, params: &Parameters) -> Result<()> {
        self.snapshots.insert(iteration, params.clone());
        Ok(())
    }

    fn load(&self, iteration: usize, key: TableKey) -> Result<Option<Array2<f64>>> {
        Ok(self.snapshots
            .get(&iteration)
            .and_then(|params| params.table(key))
            .cloned())
    }
}

/// Writes one JSON file per table and iteration, e.g. `phi_opinion_1_0007.json`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Opens `dir`, creating it if needed. Snapshots already there are kept
    /// and can be aggregated.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<DirectoryStore> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(DirectoryStore {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, iteration: usize, key: TableKey) -> PathBuf {
        self.dir.join(format!("{}_{:04}.json", key, iteration))
    }

    fn write_table(&self, iteration: usize, key: TableKey, table: &Array2<f64>) -> Result<()> {
        let mut file = BufWriter::new(File::create(self.path(iteration, key))?);
        serde_json::to_writer(&mut file, table)?;
        Ok(())
    }
}

impl SnapshotSink for DirectoryStore {
    fn record(&mut self, iteration: usize, params: &Parameters) -> Result<()> {
        for key in Parameters::keys(params.phi_opinion.len()) {
            if let Some(table) = params.table(key) {
                self.write_table(iteration, key, table)?;
            }
        }
        Ok(())
    }

    fn load(&self, iteration: usize, key: TableKey) -> Result<Option<Array2<f64>>> {
        let path = self.path(iteration, key);
        if !path.is_file() {
            return Ok(None);
        }
        let file = BufReader::new(File::open(path)?);
        Ok(Some(serde_json::from_reader(file)?))
    }
}

/// Element-wise mean of the snapshots `0..iterations` of every table.
///
/// Fails if any table is missing for any iteration instead of averaging over
/// fewer samples.
pub fn mean<S: SnapshotSink + ?Sized>(sink: &S, iterations: usize, num_perspectives: usize) -> Result<Parameters> {
    if iterations == 0 {
        return Err(CptError::ZeroIterations);
    }
    let theta = mean_table(sink, TableKey::Theta, iterations)?;
    let phi_topic = mean_table(sink, TableKey::PhiTopic, iterations)?;
    let mut phi_opinion = Vec::with_capacity(num_perspectives);
    for p in 0..num_perspectives {
        phi_opinion.push(mean_table(sink, TableKey::PhiOpinion(p), iterations)?);
    }
    Ok(Parameters {
        theta:       theta,
        phi_topic:   phi_topic,
        phi_opinion: phi_opinion,
    })
}

fn mean_table<S: SnapshotSink + ?Sized>(sink: &S, key: TableKey, iterations: usize) -> Result<Array2<f64>> {
    let mut sum: Option<Array2<f64>> = None;
    let mut found = 0;
    for t in 0..iterations {
        let table = match sink.load(t, key)? {
            Some(table) => table,
            None        => continue,
        };
        found += 1;
        sum = Some(match sum.take() {
            None => table,
            Some(mut acc) => {
                if acc.shape() != table.shape() {
                    return Err(CptError::ShapeMismatch {
                        name:     key.to_string(),
                        expected: acc.shape().to_vec(),
                        found:    table.shape().to_vec(),
                    });
                }
                acc += &table;
                acc
            }
        });
    }
    match sum {
        Some(acc) if found == iterations => Ok(acc / iterations as f64),
        _ => Err(CptError::IncompleteSnapshots {
            name:     key.to_string(),
            expected: iterations,
            found:    found,
        }),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    use super::*;

    fn params(scale: f64) -> Parameters {
        Parameters {
            theta:       arr2(&[[0.25 * scale, 1.0 - 0.25 * scale]]),
            phi_topic:   arr2(&[[0.5, 0.5], [scale / 2.0, 1.0 - scale / 2.0]]),
            phi_opinion: vec![arr2(&[[1.0], [1.0]]), arr2(&[[scale], [1.0]])],
        }
    }

    #[test]
    fn in_memory_mean_is_element_wise() {
        let mut sink = InMemorySnapshots::new();
        sink.record(0, &params(0.0)).unwrap();
        sink.record(1, &params(1.0)).unwrap();
        assert_eq!(sink.len(), 2);
        let mean = mean(&sink, 2, 2).unwrap();
        assert_abs_diff_eq!(mean.theta[[0, 0]], 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(mean.phi_topic[[1, 0]], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(mean.phi_opinion[1][[0, 0]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn directory_store_round_trips_tables() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::create(dir.path().join("parameter_samples")).unwrap();
        store.record(3, &params(1.0)).unwrap();
        assert!(store.dir().join("phi_opinion_1_0003.json").is_file());
        let loaded = store.load(3, TableKey::PhiTopic).unwrap().unwrap();
        assert_eq!(loaded, params(1.0).phi_topic);
        assert!(store.load(4, TableKey::PhiTopic).unwrap().is_none());
    }

    #[test]
    fn missing_snapshots_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::create(dir.path()).unwrap();
        store.record(0, &params(0.5)).unwrap();
        store.record(2, &params(0.5)).unwrap();
        match mean(&store, 3, 2) {
            Err(CptError::IncompleteSnapshots { ref name, expected: 3, found: 2 }) if name == "theta" => {},
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn shape_changes_between_snapshots_are_rejected() {
        let mut sink = InMemorySnapshots::new();
        sink.record(0, &params(0.5)).unwrap();
        let mut odd = params(0.5);
        odd.theta = arr2(&[[0.5, 0.25, 0.25]]);
        sink.record(1, &odd).unwrap();
        match mean(&sink, 2, 2) {
            Err(CptError::ShapeMismatch { expected, found, .. }) => {
                assert_eq!(expected, vec![1, 2]);
                assert_eq!(found, vec![1, 3]);
            },
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn table_keys_name_files() {
        assert_eq!(TableKey::Theta.to_string(), "theta");
        assert_eq!(TableKey::PhiOpinion(3).to_string(), "phi_opinion_3");
    }
}
