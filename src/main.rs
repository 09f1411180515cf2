use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use tracing_subscriber::EnvFilter;

use lookalike::commands::{self, SearchRequest};
use lookalike::config::{self, Config, IndexConfig, ModelConfig};
use lookalike::models::Method;
use lookalike::resnet::{FeatureExtractor, ResNet};

#[cfg(debug_assertions)]
// hnsw_rs is very chatty at Trace level.
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;
#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Warn;

#[derive(Parser)]
#[command(name = "lookalike")]
#[command(about = "Image descriptors and similarity search")]
struct Args {
    /// Log level, e.g. "info" or "lookalike=debug". Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// ResNet50 (include_top=False, pooling=avg) exported to ONNX
    #[arg(long, global = true, env = config::MODEL_ENV_VAR)]
    model: Option<PathBuf>,

    /// ONNX Runtime intra-op threads
    #[arg(long, global = true, default_value_t = config::DEFAULT_INTRA_THREADS)]
    threads: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the Euclidean distance between the descriptors of every pair of images
    Compare {
        #[arg(required = true, num_args = 2..)]
        images: Vec<PathBuf>,
    },
    /// Find the images most similar to QUERY in a directory
    Search {
        query: PathBuf,

        /// list, quadtree, hash or deep (or 1-4). Asked interactively when omitted.
        #[arg(long, value_parser = parse_method)]
        method: Option<Method>,

        #[arg(long, default_value = config::DEFAULT_IMAGES_DIR)]
        images_dir: PathBuf,

        /// Number of results
        #[arg(short, default_value_t = config::DEFAULT_K)]
        k: usize,

        /// Half extent of the quadtree range query
        #[arg(long)]
        radius: Option<f32>,

        /// Points per quadtree node before it subdivides
        #[arg(long)]
        capacity: Option<usize>,

        /// HNSW search width for the deep method
        #[arg(long)]
        ef: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_method(s: &str) -> Result<Method, String> {
    s.parse().map_err(|e: lookalike::Error| e.to_string())
}

fn init_logging(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LOG_LEVEL.to_string().to_lowercase())),
    };

    // Results go to stdout; keep logs out of the way.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn model_config(args: &Args) -> ModelConfig {
    ModelConfig {
        model_path: args.model.clone().unwrap_or_else(config::default_model_path),
        intra_threads: args.threads,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let model = model_config(&args);

    match args.command {
        Command::Compare { images } => {
            let resnet = ResNet::new(&model).context("Unable to load the ResNet50 model")?;
            let distances = commands::compare(&resnet, &images)?;
            print!("{}", commands::render_pair_distances(&distances));
        },
        Command::Search { query, method, images_dir, k, radius, capacity, ef, json } => {
            let method = match method {
                Some(method) => method,
                // The menu goes to stderr so stdout carries only the report.
                None => commands::prompt_for_method(&mut io::stdin().lock(), &mut io::stderr())?,
            };

            let defaults = IndexConfig::default();
            let config = Config {
                model,
                index: IndexConfig {
                    quadtree_capacity: capacity.unwrap_or(defaults.quadtree_capacity),
                    quadtree_radius: radius.unwrap_or(defaults.quadtree_radius),
                    ef_search: ef.unwrap_or(defaults.ef_search),
                },
                images_dir,
                k,
            };
            let request = SearchRequest::new(query, method, &config);
            info!("{:?}", request);

            let resnet = if method.requires_model() {
                Some(ResNet::new(&config.model).context("Unable to load the ResNet50 model")?)
            } else {
                None
            };

            let report = commands::search(&request, resnet.as_ref().map(|r| r as &dyn FeatureExtractor))?;

            let mut stdout = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut stdout, &report)?;
                writeln!(stdout)?;
            } else {
                write!(stdout, "{}", commands::render_search_report(&report))?;
            }
        },
    }

    Ok(())
}
