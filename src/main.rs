use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use refine_ode::{Method, Problem, Settings, output};
use simplelog::{Config, LevelFilter, SimpleLogger};

/// Approximate e, ln 2 and pi by refining Euler, Heun and RK4 solutions of simple ODEs, writing
/// one result file per problem and method.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory receiving the result files.
    #[arg(long, default_value = "results")]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// JSON array of settings replacing the per-method presets.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Only run these methods.
    #[arg(long)]
    method: Vec<Method>,

    /// Only run these problems (1 to 3).
    #[arg(long)]
    problem: Vec<usize>,

    /// Override the subdivision cap of every method.
    #[arg(long)]
    max_subdivisions: Option<usize>,

    /// Increase log verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Table,
    Csv,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Table => "txt",
            Format::Csv => "csv",
        }
    }
}

type Rhs = fn(f64, f64) -> f64;

fn exp_rhs(_x: f64, y: f64) -> f64 {
    y
}

fn log_rhs(x: f64, _y: f64) -> f64 {
    1. / x
}

fn arctan_rhs(x: f64, _y: f64) -> f64 {
    4. / (1. + x * x)
}

/// `y' = y` reaching e, `y' = 1/x` reaching ln 2 and `y' = 4/(1+x^2)` reaching pi.
fn problems() -> refine_ode::Result<Vec<(usize, Problem<f64, Rhs>)>> {
    Ok(vec![
        (1, Problem::new(exp_rhs as Rhs, 0., 1., 1., 2.71828182846)?),
        (2, Problem::new(log_rhs as Rhs, 1., 0., 2., 0.69314718056)?),
        (3, Problem::new(arctan_rhs as Rhs, 0., 0., 1., 3.14159265359)?),
    ])
}

fn load_settings(cli: &Cli) -> Result<Vec<Settings>, Box<dyn Error>> {
    let mut presets: Vec<Settings> = Method::ALL.map(Settings::for_method).to_vec();
    if let Some(path) = &cli.settings {
        let overrides: Vec<Settings> = serde_json::from_reader(std::fs::File::open(path)?)?;
        for settings in overrides {
            settings.validate()?;
            match presets.iter_mut().find(|p| p.method() == settings.method()) {
                Some(preset) => *preset = settings,
                None => presets.push(settings),
            }
        }
    }
    if let Some(max_subdivisions) = cli.max_subdivisions {
        presets = presets
            .into_iter()
            .map(|settings| settings.with_max_subdivisions(max_subdivisions))
            .collect();
    }
    presets.retain(|settings| cli.method.is_empty() || cli.method.contains(&settings.method()));
    Ok(presets)
}

fn solve(
    number: usize,
    problem: &Problem<f64, Rhs>,
    settings: &Settings,
    out_dir: &Path,
    format: Format,
) -> refine_ode::Result<PathBuf> {
    let approximation = settings.approximate(problem)?;
    let path = out_dir.join(format!(
        "p{number}_{}.{}",
        settings.method(),
        format.extension()
    ));
    let decimals = settings.decimals() as usize;
    match format {
        Format::Table => output::write_table(&path, approximation.trace(), decimals)?,
        Format::Csv => output::write_csv(&path, approximation.trace(), decimals)?,
    }
    log::info!(
        "problem {number} with {}: n = {} after {} attempts, {} derivative evaluations",
        settings.method(),
        approximation.subdivisions(),
        approximation.attempts().len(),
        approximation.num_derivative_evals()
    );
    Ok(path)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::init(level, Config::default())?;

    let settings = load_settings(&cli)?;
    let problems: Vec<_> = problems()?
        .into_iter()
        .filter(|(number, _)| cli.problem.is_empty() || cli.problem.contains(number))
        .collect();

    let jobs: Vec<_> = problems
        .iter()
        .flat_map(|problem| settings.iter().map(move |settings| (problem, settings)))
        .collect();

    let failures = jobs
        .par_iter()
        .map(|((number, problem), settings)| {
            match solve(*number, problem, settings, &cli.out_dir, cli.format) {
                Ok(path) => {
                    log::info!("wrote {}", path.display());
                    0
                }
                Err(err) => {
                    log::error!("problem {number} with {}: {err}", settings.method());
                    1
                }
            }
        })
        .sum::<usize>();

    if failures > 0 {
        return Err(format!("{failures} of {} runs failed", jobs.len()).into());
    }
    Ok(())
}
