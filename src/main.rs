//! Held-Karp TSP Solver - Command Line Interface
//!
//! Solves instances exactly and runs the benchmarks whose CSV output feeds
//! the execution-time plots.

use clap::{Parser, Subcommand};
use held_karp_solver::benchmark::{
    export_instance_csv, run_instance_test, verify_instances, Benchmark, SweepConfig,
    VerifyStatus,
};
use held_karp_solver::exact::{
    BruteForceSolver, ExactSolver, HeldKarpSolver, SolverConfig, DEFAULT_MAX_VERTICES,
};
use held_karp_solver::instance::TspInstance;
use held_karp_solver::{Result, SolverError};

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "held-karp")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Exact Held-Karp solver for the Traveling Salesman Problem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance file
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// Only compute the cost, skip tour reconstruction
        #[arg(long)]
        no_path: bool,

        /// Largest instance accepted; raise to opt in to bigger instances
        #[arg(long, default_value_t = DEFAULT_MAX_VERTICES)]
        max_vertices: usize,

        /// Fill each DP layer in parallel
        #[arg(long)]
        parallel: bool,

        /// Cross-check with brute force (small instances only)
        #[arg(long)]
        check: bool,

        /// Write the tour as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Time the solver on random instances of growing size and write the CSV
    Sweep {
        #[arg(long, default_value = "3")]
        min: usize,

        #[arg(long, default_value = "15")]
        max: usize,

        /// Random instances per size
        #[arg(short, long, default_value = "10")]
        iterations: usize,

        /// Edge weights are drawn from 1..=max_weight
        #[arg(long, default_value = "10")]
        max_weight: u32,

        /// Random seed
        #[arg(short, long, default_value = "1")]
        seed: u64,

        #[arg(long, default_value_t = DEFAULT_MAX_VERTICES)]
        max_vertices: usize,

        #[arg(long)]
        parallel: bool,

        /// Output CSV file
        #[arg(short, long, default_value = "results/random_instance_res.csv")]
        output: PathBuf,
    },

    /// Solve one instance file repeatedly and record every run
    InstanceTest {
        #[arg(short, long)]
        instance: PathBuf,

        #[arg(short = 'n', long, default_value = "10")]
        iterations: usize,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check instance files against their stored optimum
    Verify {
        #[arg(required = true)]
        instances: Vec<PathBuf>,
    },

    /// Solve a random instance
    Random {
        #[arg(short = 'n', long)]
        vertices: usize,

        #[arg(long, default_value = "10")]
        max_weight: u32,

        #[arg(short, long, default_value = "1")]
        seed: u64,

        #[arg(long, default_value_t = DEFAULT_MAX_VERTICES)]
        max_vertices: usize,

        #[arg(long)]
        parallel: bool,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve {
            instance,
            no_path,
            max_vertices,
            parallel,
            check,
            output,
            verbose,
        } => {
            let config = SolverConfig {
                max_vertices,
                reconstruct_path: !no_path,
                parallel,
                ..Default::default()
            };
            solve_instance(&instance, config, check, output, verbose)
        }

        Commands::Sweep {
            min,
            max,
            iterations,
            max_weight,
            seed,
            max_vertices,
            parallel,
            output,
        } => {
            let config = SweepConfig {
                min_vertices: min,
                max_vertices: max,
                iterations,
                max_weight,
                seed,
                solver: SolverConfig {
                    max_vertices,
                    parallel,
                    ..Default::default()
                },
            };
            run_sweep(config, &output)
        }

        Commands::InstanceTest {
            instance,
            iterations,
            output,
        } => {
            instance_test(&instance, iterations, &output)
        }

        Commands::Verify { instances } => verify(&instances),

        Commands::Random {
            vertices,
            max_weight,
            seed,
            max_vertices,
            parallel,
        } => {
            let config = SolverConfig {
                max_vertices,
                parallel,
                ..Default::default()
            };
            solve_random(vertices, max_weight, seed, config)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn solve_instance(
    path: &Path,
    config: SolverConfig,
    check: bool,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    println!("Loading instance from {:?}...", path);
    let instance = TspInstance::from_file(path)?;

    if verbose {
        println!("Instance: {}", instance.name);
        print!("{}", instance.matrix.statistics());
    }

    let solver = HeldKarpSolver::new(config);
    println!("Solving with {}...", solver.name());
    let tour = solver.solve_timed(&instance.matrix)?;

    println!("\n========== Results ==========");
    println!("Algorithm: {}", tour.algorithm);
    println!("Cost: {}", tour.cost);
    println!("Time: {} ns", tour.elapsed_ns);
    if !tour.order.is_empty() {
        println!("Path: {}", tour.path_string());
    }
    if let Some(optimum) = instance.optimum {
        println!("Known optimum: {} (PRD {:.2}%)", optimum, tour.prd(optimum as f64));
    }

    if check {
        let reference = BruteForceSolver::default().solve(&instance.matrix)?;
        let status = if reference.cost == tour.cost { "agrees" } else { "DISAGREES" };
        println!("Brute force: {} ({})", reference.cost, status);
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&tour)?;
        std::fs::write(&out_path, json)?;
        println!("\nTour saved to {:?}", out_path);
    }

    Ok(())
}

fn run_sweep(config: SweepConfig, output: &Path) -> Result<()> {
    println!(
        "Sweep started {} ({}..={} vertices, {} iterations)",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        config.min_vertices,
        config.max_vertices,
        config.iterations
    );

    let pb = ProgressBar::new(config.num_sizes() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} sizes {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut benchmark = Benchmark::new(config);
    benchmark.run_sweep_with_progress(|n| {
        pb.set_message(format!("n={}", n));
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    benchmark.export_to_csv(output)?;

    println!("{}", benchmark.generate_report());
    println!("Done. Saved to {:?}", output);
    Ok(())
}

fn instance_test(path: &Path, iterations: usize, output: &Path) -> Result<()> {
    let instance = TspInstance::from_file(path)?;
    let records = run_instance_test(&instance, iterations, &HeldKarpSolver::default())?;
    export_instance_csv(output, &records)?;

    let correct = records.iter().filter(|r| r.is_correct).count();
    println!(
        "{}: {}/{} runs matched the optimum. Saved to {:?}",
        instance.name,
        correct,
        records.len(),
        output
    );
    Ok(())
}

fn verify(paths: &[PathBuf]) -> Result<()> {
    let results = verify_instances(paths, &HeldKarpSolver::default());

    for result in &results {
        let name = result.instance.display().to_string();
        match &result.status {
            VerifyStatus::Pass => println!("{:>20} PASS", name),
            VerifyStatus::Fail { expected, found } => {
                println!("{:>20} FAIL (expected {}, found {})", name, expected, found)
            }
            VerifyStatus::Unchecked { found } => println!("{:>20} ---- (cost {})", name, found),
            VerifyStatus::Error(e) => println!("{:>20} ERROR {}", name, e),
        }
    }

    let failed = results
        .iter()
        .filter(|r| matches!(r.status, VerifyStatus::Fail { .. } | VerifyStatus::Error(_)))
        .count();
    if failed > 0 {
        return Err(SolverError::VerificationFailed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}

fn solve_random(vertices: usize, max_weight: u32, seed: u64, config: SolverConfig) -> Result<()> {
    let instance = TspInstance::random(vertices, max_weight, seed)?;
    let solver = HeldKarpSolver::new(config);
    let tour = solver.solve_timed(&instance.matrix)?;

    println!("{}", instance.name);
    print!("{}", tour);
    Ok(())
}
