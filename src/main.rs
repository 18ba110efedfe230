use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use citeulike_prep::config::Config;
use citeulike_prep::datasets::{CiteULikeA, CiteULikeT, DatasetKind, PreprocessReport};
use citeulike_prep::split::{LeaveOneOutOptions, LeaveOneOutSplit};

#[derive(Parser)]
#[command(name = "citeulike-prep")]
#[command(about = "Convert CiteULike-A/T raw files into interaction .npz tables", long_about = None)]
struct Cli {
    /// Root directory for datasets (overrides DATA_ROOT)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse users.dat and write <dataset>_interaction.npz
    Preprocess {
        /// Dataset name: citeulike-a, citeulike-t or all
        dataset: String,

        /// Print the per-dataset reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a leave-one-out split from the processed interactions
    Split {
        dataset: DatasetKind,

        /// Hold out a random interaction per user
        #[arg(long)]
        random: bool,

        /// Negative items sampled per held-out interaction
        #[arg(long, default_value = "100")]
        n_negative: usize,

        /// Number of validation/test copies
        #[arg(long, default_value = "10")]
        n_test: usize,

        /// Sampling seed (overrides SPLIT_SEED)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show where a dataset comes from and where it is stored
    Info {
        dataset: DatasetKind,

        /// Print the descriptor as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,citeulike_prep=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(root) = cli.data_root {
        config.data_root = root;
    }
    info!("Using data root {}", config.data_root.display());

    match cli.command {
        Command::Preprocess { dataset, json } => {
            let kinds: Vec<DatasetKind> = if dataset.eq_ignore_ascii_case("all") {
                DatasetKind::ALL.to_vec()
            } else {
                vec![dataset.parse::<DatasetKind>()?]
            };
            let reports = preprocess_all(&config, &kinds).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!(
                        "{}: {} interactions ({} users, {} items) -> {}",
                        report.dataset,
                        report.interactions,
                        report.users,
                        report.items,
                        report.output.display()
                    );
                }
            }
        }
        Command::Split {
            dataset,
            random,
            n_negative,
            n_test,
            seed,
        } => {
            let options = LeaveOneOutOptions {
                random,
                n_negative,
                n_test,
                seed: seed.unwrap_or(config.split_seed),
            };
            let split = split_dataset(&config, dataset, &options).await?;
            println!(
                "{dataset}: {} train rows, {} validation sets, {} test sets",
                split.train.len(),
                split.validate.len(),
                split.test.len()
            );
        }
        Command::Info { dataset, json } => {
            let descriptor = dataset.descriptor();
            if json {
                println!("{}", serde_json::to_string_pretty(&descriptor)?);
            } else {
                let dir = config.dataset_dir(dataset.name());
                println!("Dataset:        {}", descriptor.name);
                println!("Directory:      {}", dir.display());
                println!(
                    "Download URL:   {}",
                    descriptor.url.as_deref().unwrap_or("(manual download)")
                );
                if let Some(manual) = &descriptor.manual_download_url {
                    println!("Homepage:       {manual}");
                }
                if let Some(url) = &descriptor.processed_leave_one_out_url {
                    println!("Leave-one-out:  {url}");
                }
                if let Some(url) = &descriptor.processed_random_split_url {
                    println!("Random split:   {url}");
                }
            }
        }
    }

    Ok(())
}

async fn preprocess_all(
    config: &Config,
    kinds: &[DatasetKind],
) -> Result<Vec<PreprocessReport>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    let pb = ProgressBar::new(kinds.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let mut reports = Vec::with_capacity(kinds.len());
    for kind in kinds {
        pb.set_message(format!("Preprocessing {kind}..."));
        let report = match kind {
            DatasetKind::CiteULikeA => CiteULikeA::new(config)?.preprocess().await?,
            DatasetKind::CiteULikeT => CiteULikeT::new(config)?.preprocess().await?,
        };
        reports.push(report);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    info!(
        "Preprocessed {} dataset(s) in {:.2}s",
        kinds.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(reports)
}

async fn split_dataset(
    config: &Config,
    kind: DatasetKind,
    options: &LeaveOneOutOptions,
) -> Result<LeaveOneOutSplit, Box<dyn std::error::Error>> {
    let split = match kind {
        DatasetKind::CiteULikeA => CiteULikeA::new(config)?.load_leave_one_out(options).await?,
        DatasetKind::CiteULikeT => CiteULikeT::new(config)?.load_leave_one_out(options).await?,
    };
    Ok(split)
}
