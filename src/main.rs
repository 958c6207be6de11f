use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use occsift::config::{self, Config};
use occsift::presets::{self, Preset};
use occsift::topics::embeddings::ModelFormat;
use occsift::topics::relevance::ScoreStrategy;

/// occsift: find the occupations of an industry in multi-year wage tables.
///
/// Reconciles yearly occupational statistics tables into one dataset,
/// scores every occupation title against a free-text description of the
/// industry using word embeddings, and keeps the matching rows.
#[derive(Parser)]
#[command(name = "occsift", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: normalize, classify, filter
    Run {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        classify: ClassifyArgs,

        /// States to keep, comma-separated (default: every state)
        #[arg(long, value_delimiter = ',')]
        states: Option<Vec<String>>,

        /// File name of the filtered table inside the output directory
        #[arg(long)]
        output_name: Option<String>,
    },

    /// Build and checkpoint the unified table only
    Normalize {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Normalize and score occupation titles, without filtering rows
    Classify {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        classify: ClassifyArgs,
    },

    /// Show which yearly input files are present
    Status {
        #[command(flatten)]
        input: InputArgs,
    },

    /// List the built-in corpus presets
    Presets,
}

#[derive(Args)]
struct InputArgs {
    /// First year to read (inclusive)
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year to read (inclusive)
    #[arg(long)]
    end_year: Option<i32>,

    /// Directory holding the yearly tables
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Per-year file name, e.g. state_M{year}_dl.csv
    #[arg(long)]
    template: Option<String>,

    /// Directory for the checkpoint and results
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Field delimiter of the input and output files (`tab` for tabs)
    #[arg(long)]
    delimiter: Option<String>,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Path to a word2vec model (.bin binary, .txt/.vec text)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Override the model format inferred from the extension (binary or text)
    #[arg(long)]
    model_format: Option<ModelFormat>,

    /// Load only the first N words of the model
    #[arg(long)]
    max_vocab: Option<usize>,

    /// Titles scoring strictly above this are relevant (default: 0.55)
    #[arg(long, allow_hyphen_values = true)]
    threshold: Option<f64>,

    /// How pairwise word similarities become a title score
    #[arg(long)]
    strategy: Option<ScoreStrategy>,

    /// Industry description as inline text
    #[arg(long)]
    corpus: Option<String>,

    /// Industry description read from a file
    #[arg(long)]
    corpus_file: Option<PathBuf>,

    /// Built-in industry description (see `occsift presets`)
    #[arg(long)]
    preset: Option<String>,

    /// How many top-scoring titles to print
    #[arg(long, default_value = "25")]
    top: usize,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("occsift=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            classify,
            states,
            output_name,
        } => {
            let mut config = Config::load()?;
            let preset = apply_classify(&mut config, &classify, states.is_some())?;
            apply_input(&mut config, &input)?;
            if let Some(states) = states {
                config.states = Some(states);
            }
            if let Some(name) = output_name {
                config.output_name = name;
            }
            config.validate()?;
            config.require_model()?;
            let corpus = config.resolve_corpus(classify.corpus.as_deref(), preset)?;

            info!(
                states = ?config.states,
                threshold = config.threshold,
                "Starting sift run"
            );
            let summary = occsift::pipeline::run(&config, &corpus)?;

            occsift::output::terminal::display_classification(
                &summary.classification,
                classify.top,
            );
            occsift::output::terminal::display_run_summary(&summary);
        }

        Commands::Normalize { input } => {
            let mut config = Config::load()?;
            apply_input(&mut config, &input)?;

            let (table, checkpoint) = occsift::pipeline::normalize(&config)?;

            println!("\n{}", "Normalization complete.".bold());
            println!("  Columns: {}", table.columns().join(", ").dimmed());
            println!("  Checkpoint: {}", checkpoint.display());
        }

        Commands::Classify { input, classify } => {
            let mut config = Config::load()?;
            let preset = apply_classify(&mut config, &classify, false)?;
            apply_input(&mut config, &input)?;
            config.validate()?;
            config.require_model()?;
            let corpus = config.resolve_corpus(classify.corpus.as_deref(), preset)?;

            let (table, _) = occsift::pipeline::normalize(&config)?;
            let classification = occsift::pipeline::classify(&config, &table, &corpus)?;
            let report =
                occsift::output::report::write_title_report(&classification, &config.output_dir)?;

            occsift::output::terminal::display_classification(&classification, classify.top);
            println!(
                "\n{}",
                format!("Title report saved to: {}", report.display()).bold()
            );
        }

        Commands::Status { input } => {
            let mut config = Config::load()?;
            apply_input(&mut config, &input)?;

            let problems = occsift::status::show(&config)?;
            if problems > 0 {
                anyhow::bail!(
                    "{problems} vintage(s) unavailable; a run over {}-{} would abort",
                    config.start_year,
                    config.end_year
                );
            }
        }

        Commands::Presets => {
            presets::display();
        }
    }

    Ok(())
}

/// Override input/output locations from the command line.
fn apply_input(config: &mut Config, args: &InputArgs) -> Result<()> {
    if let Some(year) = args.start_year {
        config.start_year = year;
    }
    if let Some(year) = args.end_year {
        config.end_year = year;
    }
    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(template) = &args.template {
        config.filename_template = template.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(delimiter) = &args.delimiter {
        config.delimiter = config::parse_delimiter(delimiter)?;
    }
    Ok(())
}

/// Apply the preset (if any), then the classifier flags on top of it.
/// Returns the preset so its corpus can be used.
fn apply_classify(
    config: &mut Config,
    args: &ClassifyArgs,
    states_given: bool,
) -> Result<Option<&'static Preset>> {
    let preset = match &args.preset {
        Some(name) => Some(presets::find(name).ok_or_else(|| {
            anyhow::anyhow!("Unknown preset {name:?}. Run `occsift presets` to list them.")
        })?),
        None => None,
    };

    if let Some(preset) = preset {
        let states_set = states_given || config.states.is_some();
        let threshold_set =
            args.threshold.is_some() || config::env_is_set("OCCSIFT_THRESHOLD");
        config.apply_preset(preset, states_set, threshold_set);
    }

    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    if let Some(format) = args.model_format {
        config.model_format = Some(format);
    }
    if let Some(max_vocab) = args.max_vocab {
        config.max_vocab = Some(max_vocab);
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(path) = &args.corpus_file {
        config.corpus_file = Some(path.clone());
    }

    Ok(preset)
}
