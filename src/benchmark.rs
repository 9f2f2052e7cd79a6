//! Benchmarking and experimentation module.
//!
//! The random-instance sweep times the solver on growing random instances and
//! writes one row per vertex count to a CSV with the header
//! `Number of vertices, execution time [ns]`, which is what the plotting
//! script downstream reads. The instance test runs the solver repeatedly on a
//! single instance file and records each run against the known optimum.
//!
//! Solver failures during a sweep are logged and the affected size is
//! skipped; the sweep itself only fails on invalid configuration or I/O.

use crate::error::{Result, SolverError};
use crate::exact::{ExactSolver, HeldKarpSolver, SolverConfig};
use crate::instance::{random_matrix, TspInstance};
use crate::solution::path_string;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Header of the sweep CSV. The leading space of the second column is part of its name.
pub const SWEEP_CSV_HEADER: [&str; 2] = ["Number of vertices", " execution time [ns]"];

/// Header of the instance-test CSV.
pub const INSTANCE_CSV_HEADER: [&str; 5] = [
    "Sample_Name",
    " Sample_Execution_Time_ns",
    " Path",
    " Path_Weight",
    " Is_Correct",
];

/// One row of the sweep CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    #[serde(rename = "Number of vertices")]
    pub vertices: usize,
    /// Mean solve time over the iterations for this size
    #[serde(rename = " execution time [ns]")]
    pub execution_time_ns: u64,
}

/// Timing statistics for one vertex count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeStatistics {
    pub vertices: usize,
    pub samples: usize,
    pub mean_ns: u64,
    pub std_dev_ns: f64,
    pub min_ns: u64,
    pub max_ns: u64,
}

impl SizeStatistics {
    fn from_samples(vertices: usize, samples: &[u64]) -> Self {
        let total: u128 = samples.iter().map(|&s| s as u128).sum();
        let mean_ns = (total / samples.len().max(1) as u128) as u64;
        let as_f64: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let std_dev_ns = if samples.len() > 1 {
            as_f64.iter().std_dev()
        } else {
            0.0
        };

        SizeStatistics {
            vertices,
            samples: samples.len(),
            mean_ns,
            std_dev_ns,
            min_ns: samples.iter().copied().min().unwrap_or(0),
            max_ns: samples.iter().copied().max().unwrap_or(0),
        }
    }

    pub fn record(&self) -> SweepRecord {
        SweepRecord {
            vertices: self.vertices,
            execution_time_ns: self.mean_ns,
        }
    }
}

/// Sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// First vertex count (inclusive)
    pub min_vertices: usize,
    /// Last vertex count (inclusive)
    pub max_vertices: usize,
    /// Random instances solved per vertex count
    pub iterations: usize,
    /// Edge weights are drawn from `1..=max_weight`
    pub max_weight: u32,
    /// Seed of the single generator shared by the whole sweep
    pub seed: u64,
    pub solver: SolverConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            min_vertices: 3,
            max_vertices: 15,
            iterations: 10,
            max_weight: 10,
            seed: 1,
            solver: SolverConfig::default(),
        }
    }
}

impl SweepConfig {
    fn validate(&self) -> Result<()> {
        if self.min_vertices == 0 {
            return Err(SolverError::InvalidInput(
                "sweep must start at one vertex or more".into(),
            ));
        }
        if self.min_vertices > self.max_vertices {
            return Err(SolverError::InvalidInput(format!(
                "empty sweep range {}..={}",
                self.min_vertices, self.max_vertices
            )));
        }
        if self.iterations == 0 {
            return Err(SolverError::InvalidInput(
                "iterations must be at least 1".into(),
            ));
        }
        if self.max_weight == 0 || self.max_weight == u32::MAX {
            return Err(SolverError::InvalidInput(format!(
                "max weight must be in 1..{}, got {}",
                u32::MAX,
                self.max_weight
            )));
        }
        Ok(())
    }

    /// Number of vertex counts covered by the sweep.
    pub fn num_sizes(&self) -> usize {
        self.max_vertices.saturating_sub(self.min_vertices) + 1
    }
}

/// Random-instance benchmarking engine
pub struct Benchmark {
    config: SweepConfig,
    solver: HeldKarpSolver,
    statistics: Vec<SizeStatistics>,
    skipped: Vec<(usize, String)>,
}

impl Benchmark {
    pub fn new(config: SweepConfig) -> Self {
        let solver = HeldKarpSolver::new(config.solver.clone());
        Benchmark {
            config,
            solver,
            statistics: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Run the whole sweep.
    pub fn run_sweep(&mut self) -> Result<Vec<SweepRecord>> {
        self.run_sweep_with_progress(|_| {})
    }

    /// Run the whole sweep, calling `on_size` after each vertex count.
    pub fn run_sweep_with_progress<F: FnMut(usize)>(
        &mut self,
        mut on_size: F,
    ) -> Result<Vec<SweepRecord>> {
        self.config.validate()?;
        self.statistics.clear();
        self.skipped.clear();

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        for n in self.config.min_vertices..=self.config.max_vertices {
            match self.run_size(n, &mut rng) {
                Ok(stats) => {
                    log::info!(
                        "n={:>2}: mean {} ns, std dev {:.0} ns over {} runs",
                        n,
                        stats.mean_ns,
                        stats.std_dev_ns,
                        stats.samples
                    );
                    self.statistics.push(stats);
                }
                Err(e) => {
                    log::warn!("Skipping n={}: {}", n, e);
                    self.skipped.push((n, e.to_string()));
                }
            }
            on_size(n);
        }

        Ok(self.records())
    }

    /// Time `iterations` solves on fresh random instances with `n` vertices.
    fn run_size(&self, n: usize, rng: &mut ChaCha8Rng) -> Result<SizeStatistics> {
        let mut samples = Vec::with_capacity(self.config.iterations);

        for _ in 0..self.config.iterations {
            let matrix = random_matrix(n, self.config.max_weight, rng)?;

            let start = Instant::now();
            self.solver.solve(&matrix)?;
            let elapsed = start.elapsed().as_nanos();

            samples.push(u64::try_from(elapsed).unwrap_or(u64::MAX));
        }

        Ok(SizeStatistics::from_samples(n, &samples))
    }

    pub fn records(&self) -> Vec<SweepRecord> {
        self.statistics.iter().map(SizeStatistics::record).collect()
    }

    pub fn statistics(&self) -> &[SizeStatistics] {
        &self.statistics
    }

    /// Vertex counts that failed, with the reason.
    pub fn skipped(&self) -> &[(usize, String)] {
        &self.skipped
    }

    /// Export the sweep records to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        export_sweep_csv(path, &self.records())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Held-Karp Benchmark Report\n");
        report.push_str("========================================\n\n");

        report.push_str(&format!(
            "Sizes {}..={}, {} iterations each, weights 1..={}, seed {}\n\n",
            self.config.min_vertices,
            self.config.max_vertices,
            self.config.iterations,
            self.config.max_weight,
            self.config.seed
        ));

        report.push_str("-".repeat(70).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:>8} {:>15} {:>15} {:>14} {:>14}\n",
            "Vertices", "Mean [ns]", "Std dev [ns]", "Min [ns]", "Max [ns]"
        ));
        report.push_str("-".repeat(70).as_str());
        report.push('\n');

        for stat in &self.statistics {
            report.push_str(&format!(
                "{:>8} {:>15} {:>15.0} {:>14} {:>14}\n",
                stat.vertices, stat.mean_ns, stat.std_dev_ns, stat.min_ns, stat.max_ns
            ));
        }

        report.push_str("-".repeat(70).as_str());
        report.push('\n');

        if !self.skipped.is_empty() {
            report.push_str("\nSkipped sizes:\n");
            for (n, reason) in &self.skipped {
                report.push_str(&format!("  n={}: {}\n", n, reason));
            }
        }

        report
    }
}

/// Write sweep records, header included, to any writer.
pub fn write_sweep_csv<W: Write>(writer: W, records: &[SweepRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(SWEEP_CSV_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn export_sweep_csv<P: AsRef<Path>>(path: P, records: &[SweepRecord]) -> Result<()> {
    let file = File::create(path)?;
    write_sweep_csv(file, records)
}

/// Read a sweep CSV back. Values may carry a leading space, as older result files do.
pub fn read_sweep_csv<R: Read>(reader: R) -> Result<Vec<SweepRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Fields)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// One timed run of the instance test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRunRecord {
    #[serde(rename = "Sample_Name")]
    pub sample_name: String,
    #[serde(rename = " Sample_Execution_Time_ns")]
    pub execution_time_ns: u64,
    #[serde(rename = " Path")]
    pub path: String,
    #[serde(rename = " Path_Weight")]
    pub path_weight: u64,
    #[serde(rename = " Is_Correct")]
    pub is_correct: bool,
}

/// Solve `instance` `iterations` times and record each run.
pub fn run_instance_test<S: ExactSolver>(
    instance: &TspInstance,
    iterations: usize,
    solver: &S,
) -> Result<Vec<InstanceRunRecord>> {
    let mut records = Vec::with_capacity(iterations);

    for i in 0..iterations {
        let tour = solver.solve_timed(&instance.matrix)?;
        let is_correct = instance.optimum == Some(tour.cost);

        log::debug!(
            "{} run {}: cost {} in {} ns",
            instance.name,
            i + 1,
            tour.cost,
            tour.elapsed_ns
        );

        records.push(InstanceRunRecord {
            sample_name: instance.name.clone(),
            execution_time_ns: u64::try_from(tour.elapsed_ns).unwrap_or(u64::MAX),
            path: path_string(&tour.order),
            path_weight: tour.cost,
            is_correct,
        });
    }

    Ok(records)
}

pub fn write_instance_csv<W: Write>(writer: W, records: &[InstanceRunRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(INSTANCE_CSV_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn export_instance_csv<P: AsRef<Path>>(path: P, records: &[InstanceRunRecord]) -> Result<()> {
    let file = File::create(path)?;
    write_instance_csv(file, records)
}

/// Outcome of checking one instance file against its stored optimum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum VerifyStatus {
    Pass,
    Fail { expected: u64, found: u64 },
    /// The file carries no optimum to compare against
    Unchecked { found: u64 },
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub instance: PathBuf,
    pub status: VerifyStatus,
}

impl VerifyResult {
    pub fn passed(&self) -> bool {
        matches!(self.status, VerifyStatus::Pass)
    }
}

/// Solve each instance file and compare with its optimum.
pub fn verify_instances<S: ExactSolver>(paths: &[PathBuf], solver: &S) -> Vec<VerifyResult> {
    paths
        .iter()
        .map(|path| {
            let status = match verify_one(path, solver) {
                Ok(status) => status,
                Err(e) => VerifyStatus::Error(e.to_string()),
            };
            VerifyResult {
                instance: path.clone(),
                status,
            }
        })
        .collect()
}

fn verify_one<S: ExactSolver>(path: &Path, solver: &S) -> Result<VerifyStatus> {
    let instance = TspInstance::from_file(path)?;
    let found = solver.solve(&instance.matrix)?.cost;

    Ok(match instance.optimum {
        Some(expected) if expected == found => VerifyStatus::Pass,
        Some(expected) => VerifyStatus::Fail { expected, found },
        None => VerifyStatus::Unchecked { found },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SweepConfig {
        SweepConfig {
            min_vertices: 1,
            max_vertices: 7,
            iterations: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_sweep_config_defaults() {
        let config = SweepConfig::default();
        assert_eq!(config.iterations, 10);
        assert_eq!(config.max_weight, 10);
        assert_eq!(config.seed, 1);
        assert_eq!(config.num_sizes(), 13);
    }

    #[test]
    fn test_sweep_produces_one_record_per_size() {
        let mut bench = Benchmark::new(small_config());
        let mut seen = Vec::new();
        let records = bench.run_sweep_with_progress(|n| seen.push(n)).unwrap();

        assert_eq!(records.len(), 7);
        assert_eq!(seen, (1..=7).collect::<Vec<_>>());
        let sizes: Vec<usize> = records.iter().map(|r| r.vertices).collect();
        assert_eq!(sizes, (1..=7).collect::<Vec<_>>());
        assert!(bench.skipped().is_empty());
        assert!(bench.statistics().iter().all(|s| s.samples == 3));
    }

    #[test]
    fn test_sweep_skips_sizes_beyond_the_bound() {
        let config = SweepConfig {
            min_vertices: 4,
            max_vertices: 7,
            iterations: 1,
            solver: SolverConfig {
                max_vertices: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut bench = Benchmark::new(config);
        let records = bench.run_sweep().unwrap();

        assert_eq!(records.iter().map(|r| r.vertices).collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(bench.skipped().len(), 2);
        assert_eq!(bench.skipped()[0].0, 6);
        assert!(bench.generate_report().contains("Skipped sizes"));
    }

    #[test]
    fn test_invalid_sweep_config() {
        let mut bench = Benchmark::new(SweepConfig {
            min_vertices: 5,
            max_vertices: 4,
            ..Default::default()
        });
        assert!(matches!(bench.run_sweep(), Err(SolverError::InvalidInput(_))));

        let mut bench = Benchmark::new(SweepConfig {
            iterations: 0,
            ..Default::default()
        });
        assert!(bench.run_sweep().is_err());
    }

    #[test]
    fn test_sweep_csv_header_is_exact() {
        let records = vec![
            SweepRecord {
                vertices: 3,
                execution_time_ns: 1200,
            },
            SweepRecord {
                vertices: 4,
                execution_time_ns: 3400,
            },
        ];
        let mut buf = Vec::new();
        write_sweep_csv(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "Number of vertices, execution time [ns]\n3,1200\n4,3400\n"
        );
    }

    #[test]
    fn test_empty_sweep_csv_still_has_header() {
        let mut buf = Vec::new();
        write_sweep_csv(&mut buf, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Number of vertices, execution time [ns]\n"
        );
    }

    #[test]
    fn test_read_sweep_csv_with_spaced_values() {
        let text = "Number of vertices, execution time [ns]\n3, 1500\n4, 4100\n";
        let records = read_sweep_csv(text.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                SweepRecord {
                    vertices: 3,
                    execution_time_ns: 1500,
                },
                SweepRecord {
                    vertices: 4,
                    execution_time_ns: 4100,
                },
            ]
        );
    }

    #[test]
    fn test_export_sweep_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("random_instance_res.csv");

        let mut bench = Benchmark::new(SweepConfig {
            min_vertices: 2,
            max_vertices: 4,
            iterations: 2,
            ..Default::default()
        });
        bench.run_sweep().unwrap();
        bench.export_to_csv(&path).unwrap();

        let records = read_sweep_csv(File::open(&path).unwrap()).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_instance_test_records() {
        let text = "four\n4\n-1 10 15 20\n10 -1 35 25\n15 35 -1 30\n20 25 30 -1\n80\n";
        let instance = TspInstance::parse("four", text).unwrap();
        let records = run_instance_test(&instance, 3, &HeldKarpSolver::default()).unwrap();

        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.sample_name, "four");
            assert_eq!(record.path_weight, 80);
            assert!(record.is_correct);
            assert!(record.path.starts_with("0->"));
        }

        let mut buf = Vec::new();
        write_instance_csv(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with(
            "Sample_Name, Sample_Execution_Time_ns, Path, Path_Weight, Is_Correct\n"
        ));
        assert!(text.contains(",0->2->3->1,80,true"));
    }

    #[test]
    fn test_verify_instances() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("good.txt");
        let mut f = File::create(&good).unwrap();
        writeln!(f, "good 3\n0 1 2\n1 0 3\n2 3 0\n6").unwrap();

        let wrong = dir.path().join("wrong.txt");
        let mut f = File::create(&wrong).unwrap();
        writeln!(f, "wrong 3\n0 1 2\n1 0 3\n2 3 0\n5").unwrap();

        let missing = dir.path().join("missing.txt");

        let results = verify_instances(
            &[good.clone(), wrong.clone(), missing.clone()],
            &HeldKarpSolver::default(),
        );
        assert!(results[0].passed());
        assert_eq!(results[1].status, VerifyStatus::Fail { expected: 5, found: 6 });
        assert!(matches!(results[2].status, VerifyStatus::Error(_)));
    }
}
