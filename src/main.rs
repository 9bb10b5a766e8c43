use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use support_prep::checkpoint::CheckpointStore;
use support_prep::config::PrepConfig;
use support_prep::constants;
use support_prep::logging;
use support_prep::pipeline::{Pipeline, PipelineResult, WhatlangDetector};
use support_prep::report::TopicMatrix;
use support_prep::store;

#[derive(Parser)]
#[command(name = "support-prep")]
#[command(about = "Prepare customer-support message corpora for topic modeling")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to $PREP_CONFIG, then prep.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full preparation pipeline and write all checkpoints
    Run,
    /// List the collections available in the configured document store
    Collections,
    /// Reload a checkpoint and show its shape
    Inspect {
        /// Checkpoint name, e.g. tweet_clean
        checkpoint: String,
        /// Output directory to read from instead of the configured one
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print the top words of each topic from an exported weight matrix
    Topics {
        /// JSON file with `components`, `feature_names` and optional `topic_names`
        matrix: PathBuf,
        /// Words shown per topic
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn print_summary(result: &PipelineResult) {
    println!("\n📊 Preparation results for '{}':", result.collection);
    println!("   Run id: {}", result.run_id);
    println!("   Documents: {}", result.load.documents);
    println!("   Loaded: {}", result.load.loaded);
    println!("   Skipped documents: {}", result.load.skipped.len());
    println!("   Kept by thread filter: {}", result.filter.kept);
    println!("   Defaulted rows: {}", result.normalize.defaulted_rows());
    println!("   Kept by language filter: {}", result.language.kept);
    println!("   df_tweet_user rows: {}", result.tweet_user_rows);
    println!("   df_first_tweet_user rows: {}", result.first_tweet_user_rows);
    println!("   df_convo_user rows: {}", result.convo_user_rows);
    println!("   Manifest: {}", result.manifest_path.display());

    if !result.load.skipped.is_empty() {
        println!("\n⚠️  Skipped documents:");
        for reason in result.load.skipped.iter().take(20) {
            println!("   - {}", reason);
        }
        if result.load.skipped.len() > 20 {
            println!("   ... and {} more", result.load.skipped.len() - 20);
        }
    }
}

async fn run(config: &PrepConfig) -> anyhow::Result<()> {
    // Resources first: a bad word list must fail before the store is touched
    let pipeline = Pipeline::new(config, Box::new(WhatlangDetector))
        .context("Failed to load lexical resources")?;
    let store = store::open_store(&config.store).context("Failed to open document store")?;

    match pipeline.run(store.as_ref()).await {
        Ok(result) => {
            print_summary(&result);
            Ok(())
        }
        Err(e) => {
            error!("Preparation run failed: {}", e);
            Err(e.into())
        }
    }
}

fn inspect(dir: PathBuf, checkpoint: &str) -> anyhow::Result<()> {
    if !constants::is_known_checkpoint(checkpoint) {
        bail!(
            "unknown checkpoint '{}', expected one of: {}",
            checkpoint,
            constants::CHECKPOINTS.join(", ")
        );
    }
    let store = CheckpointStore::open(dir)?;
    let snapshot = store.read(checkpoint)?;
    let columns = store.columns(checkpoint)?;

    println!("📦 {} ({})", checkpoint, store.path_for(checkpoint).display());
    println!("   Rows: {}", snapshot.len());
    println!("   Columns: {}", columns.join(", "));
    if let Some(manifest) = store.manifest() {
        println!("   Run id: {}", manifest.run_id);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let config = PrepConfig::load(cli.config.as_deref())?;
            info!(account = %config.target.account, "Running preparation pipeline");
            run(&config).await?;
        }
        Commands::Collections => {
            let config = PrepConfig::load(cli.config.as_deref())?;
            let store = store::open_store(&config.store)?;
            let collections = store.list_collections().await?;
            if collections.is_empty() {
                println!("No collections found in {}", config.store.path.display());
            }
            for name in collections {
                println!("{}", name);
            }
        }
        Commands::Inspect { checkpoint, dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => PrepConfig::load(cli.config.as_deref())?.output.dir,
            };
            inspect(dir, &checkpoint)?;
        }
        Commands::Topics { matrix, top } => {
            let matrix = TopicMatrix::load(&matrix)
                .with_context(|| format!("Failed to read topic matrix {}", matrix.display()))?;
            print!("{}", matrix.display(top));
        }
    }
    Ok(())
}
