//! Command line conversion and inspection of forest timestep files
use clap::{Parser, Subcommand};
use ecoviz_core::import::{convert_file, DatasetFormat};
use ecoviz_core::{decode, DecodeOptions, FileData, ImportError, SpeciesLookup, Truncation};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Convert and inspect forest simulation timestep files
#[derive(Parser, Debug)]
#[command(name = "cohort-convert")]
#[command(about = "Forest timestep file conversion tool", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert text timestep files to binary, writing `.pdbb` next to each input
    Convert {
        /// Input text files; numbered names (`run0.pdb`, `run1.pdb`, ...) are processed in sequence order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Replace the version string of every converted file
        #[arg(short, long)]
        version: Option<String>,

        /// Convert only the first N files in sequence order (0 = all)
        #[arg(short = 'n', long, default_value_t = 0)]
        count: usize,
    },

    /// Decode one file and print a summary
    Inspect {
        /// Timestep file (`.pdbb` is read as binary, anything else as text)
        file: PathBuf,

        /// JSON object mapping species codes to indices
        #[arg(short, long)]
        species: PathBuf,

        /// Reject files older than this version
        #[arg(long, default_value = ecoviz_core::import::DEFAULT_MIN_VERSION)]
        min_version: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct Summary {
    version: String,
    timestep: i32,
    trees: usize,
    cohorts: usize,
    extent: Option<[f32; 4]>,
    cell_size: Option<(f32, f32)>,
    truncation: Option<Truncation>,
}

impl From<&FileData> for Summary {
    fn from(data: &FileData) -> Self {
        Self {
            version: data.version().to_string(),
            timestep: data.timestep(),
            trees: data.trees().len(),
            cohorts: data.cohorts().len(),
            extent: data.extent().map(|e| [e.minx, e.miny, e.maxx, e.maxy]),
            cell_size: data.cell_size(),
            truncation: data.truncation(),
        }
    }
}

/// Trailing number of a file stem (`run12` → 12)
fn sequence_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    stem[stem.len() - digits..].parse().ok()
}

fn run_convert(mut inputs: Vec<PathBuf>, version: Option<&str>, count: usize) -> Result<(), ImportError> {
    inputs.sort_by(|a, b| {
        sequence_number(a)
            .cmp(&sequence_number(b))
            .then_with(|| a.cmp(b))
    });
    if count > 0 {
        inputs.truncate(count);
    }

    for input in &inputs {
        let output = input.with_extension(DatasetFormat::Binary.extension());
        let summary = convert_file(input, &output, version)?;
        println!(
            "{} -> {} ({} trees, {} cohorts)",
            input.display(),
            output.display(),
            summary.trees,
            summary.cohorts
        );
        if let Some(t) = summary.truncation {
            println!("  warning: only {} of {} declared cohorts present", t.read, t.declared);
        }
    }
    info!("Converted {} files", inputs.len());
    Ok(())
}

fn run_inspect(file: &Path, species: &Path, min_version: &str, json: bool) -> Result<(), ImportError> {
    let table = File::open(species).map_err(|e| ImportError::io(species, e))?;
    let lookup = SpeciesLookup::from_json_reader(BufReader::new(table))?;
    info!("Loaded {} species codes from {}", lookup.len(), species.display());

    let options = DecodeOptions::with_min_version(min_version);
    let data = decode(file, &options, &lookup)?;
    let summary = Summary::from(&data);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== {} ===", file.display());
    println!("Version:  {}", summary.version);
    println!("Timestep: {}", summary.timestep);
    println!("Trees:    {}", summary.trees);
    println!("Cohorts:  {}", summary.cohorts);
    match (summary.extent, summary.cell_size) {
        (Some([minx, miny, maxx, maxy]), Some((dx, dy))) => {
            println!("Extent:   x [{minx}, {maxx}], y [{miny}, {maxy}]");
            println!("Cell:     {dx} x {dy}");
        }
        _ => println!("Extent:   none (no cohorts)"),
    }
    if let Some(t) = summary.truncation {
        println!("Truncated: {} of {} declared cohorts read", t.read, t.declared);
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Convert {
            inputs,
            version,
            count,
        } => run_convert(inputs, version.as_deref(), count),
        Command::Inspect {
            file,
            species,
            min_version,
            json,
        } => run_inspect(&file, &species, &min_version, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_number() {
        assert_eq!(sequence_number(Path::new("dir/run12.pdb")), Some(12));
        assert_eq!(sequence_number(Path::new("run0.pdb")), Some(0));
        assert_eq!(sequence_number(Path::new("run.pdb")), None);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["cohort-convert", "convert", "a1.pdb", "a0.pdb", "-n", "1"]).unwrap();
        match args.command {
            Command::Convert { inputs, count, version } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(count, 1);
                assert!(version.is_none());
            }
            Command::Inspect { .. } => panic!("expected convert"),
        }
    }
}
