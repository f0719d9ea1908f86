//! rusrank - train and evaluate linear ranking models.
//!
//! # Usage
//!
//! ```bash
//! # Print a baseline training request
//! rusrank template coordinate_ascent_defaults > request.json
//!
//! # Train on a JSON dataset
//! rusrank -v train --dataset train.json --request request.json --output model.json
//!
//! # Evaluate per query against TREC qrels
//! rusrank evaluate --dataset test.json --model model.json --metric ndcg@5 --qrels test.qrel
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rusrank::{template, Dataset, JudgmentSet, LinearModel, TrainRequest};

/// Train linear ranking models by coordinate ascent.
#[derive(Parser)]
#[command(name = "rusrank", version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a named training request template as JSON
    Template {
        /// Template name
        #[arg(default_value = "coordinate_ascent_defaults")]
        name: String,
    },
    /// Train a model and write it as JSON
    Train {
        /// Dataset in JSON form
        #[arg(long)]
        dataset: PathBuf,
        /// Training request: a JSON file or a template name
        #[arg(long, default_value = "coordinate_ascent_defaults")]
        request: String,
        /// TREC qrels to optimize against
        #[arg(long)]
        qrels: Option<PathBuf>,
        /// Keep only these features (names or ids)
        #[arg(long, value_delimiter = ',')]
        features: Vec<String>,
        /// Where to write the model
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the metric value of every query
    Evaluate {
        /// Dataset in JSON form
        #[arg(long)]
        dataset: PathBuf,
        /// Model in JSON form
        #[arg(long)]
        model: PathBuf,
        /// Metric name, e.g. ndcg@5 or map
        #[arg(long, default_value = "ndcg@5")]
        metric: String,
        /// TREC qrels overriding the dataset's grades
        #[arg(long)]
        qrels: Option<PathBuf>,
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the model's rankings as a TREC run
    Predict {
        /// Dataset in JSON form
        #[arg(long)]
        dataset: PathBuf,
        /// Model in JSON form
        #[arg(long)]
        model: PathBuf,
        /// Where to write the run
        #[arg(short, long)]
        output: PathBuf,
        /// System name written in the last column
        #[arg(long, default_value = "rusrank")]
        system: String,
        /// Maximum number of documents per query
        #[arg(long)]
        depth: Option<usize>,
    },
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    Dataset::from_json(&json).with_context(|| format!("invalid dataset {}", path.display()))
}

fn load_model(path: &Path) -> Result<LinearModel> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read model {}", path.display()))?;
    LinearModel::from_json(&json).with_context(|| format!("invalid model {}", path.display()))
}

fn load_qrels(path: &Path) -> Result<JudgmentSet> {
    let file =
        File::open(path).with_context(|| format!("failed to open qrels {}", path.display()))?;
    JudgmentSet::read_qrels(BufReader::new(file))
        .with_context(|| format!("invalid qrels {}", path.display()))
}

fn load_request(request: &str) -> Result<TrainRequest> {
    let path = Path::new(request);
    if path.exists() {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read request {}", path.display()))?;
        return TrainRequest::from_json(&json)
            .with_context(|| format!("invalid request {}", path.display()));
    }
    Ok(template(request)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Template { name } => {
            println!("{}", template(&name)?.to_json()?);
        }
        Command::Train {
            dataset,
            request,
            qrels,
            features,
            output,
        } => {
            let mut dataset = load_dataset(&dataset)?;
            if !features.is_empty() {
                dataset = dataset.subsample_feature_names(&features)?;
            }
            let mut request = load_request(&request)?;
            if let Some(qrels) = qrels {
                request = request.with_judgments(load_qrels(&qrels)?);
            }
            let model = dataset.train_model(&request)?;
            fs::write(&output, model.to_json()?)
                .with_context(|| format!("failed to write model {}", output.display()))?;
        }
        Command::Evaluate {
            dataset,
            model,
            metric,
            qrels,
            json,
        } => {
            let dataset = load_dataset(&dataset)?;
            let model = load_model(&model)?;
            let qrels = qrels.as_deref().map(load_qrels).transpose()?;
            let values = dataset.evaluate(&model, &metric, qrels.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                let mut sum = 0.0;
                for (qid, value) in values.iter() {
                    println!("{metric}\t{qid}\t{value:.4}");
                    sum += value;
                }
                println!("{metric}\tall\t{:.4}", sum / values.len() as f64);
            }
        }
        Command::Predict {
            dataset,
            model,
            output,
            system,
            depth,
        } => {
            let dataset = load_dataset(&dataset)?;
            let model = load_model(&model)?;
            let mut out = BufWriter::new(
                File::create(&output)
                    .with_context(|| format!("failed to create run {}", output.display()))?,
            );
            let lines = dataset.write_trecrun(&model, &mut out, &system, depth)?;
            out.flush()?;
            tracing::info!(lines, "wrote run");
        }
    }

    Ok(())
}
