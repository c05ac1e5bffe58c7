use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kbcore::persist::{
    build_bundle, load_bundle, load_dataset, save_bundle, ANSWER_FIELD, DEFAULT_BUNDLE_FILE, DEFAULT_DATA_FILE,
};
use kbcore::tfidf::TfidfParams;
use kbcore::{Normalizer, Retriever};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Fit and inspect the TF-IDF bundle for the knowledge base", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the model on a JSON/JSONL dataset and write the bundle
    Build {
        /// Dataset file
        #[arg(long, default_value = DEFAULT_DATA_FILE)]
        input: PathBuf,
        /// Output directory
        #[arg(long, default_value = "./data")]
        output: PathBuf,
        /// Bundle file name inside the output directory
        #[arg(long, default_value = DEFAULT_BUNDLE_FILE)]
        bundle_file: String,
        /// Record fields to fit on; repeat to combine several
        #[arg(long = "text-field", default_values_t = [ANSWER_FIELD.to_string()])]
        text_fields: Vec<String>,
        /// Use idf = ln(N/df) + 1 instead of the smoothed form
        #[arg(long, default_value_t = false)]
        no_smooth_idf: bool,
        /// Use tf = 1 + ln(count)
        #[arg(long, default_value_t = false)]
        sublinear_tf: bool,
    },
    /// Print the bundle meta, optionally checking it against a dataset
    Inspect {
        /// Bundle file
        #[arg(long)]
        bundle: PathBuf,
        /// Dataset to validate the bundle against
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, bundle_file, text_fields, no_smooth_idf, sublinear_tf } => {
            let params = TfidfParams { smooth_idf: !no_smooth_idf, sublinear_tf };
            build(&input, &output.join(bundle_file), &text_fields, params)
        }
        Commands::Inspect { bundle, dataset } => inspect(&bundle, dataset.as_deref()),
    }
}

fn build(input: &Path, bundle_path: &Path, text_fields: &[String], params: TfidfParams) -> Result<()> {
    let records = load_dataset(input)?;
    tracing::info!(num_docs = records.len(), input = %input.display(), "read dataset");

    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let bundle = build_bundle(&records, text_fields, params, &Normalizer::default(), created_at);

    // Refuse to write something the server would reject at startup.
    let documents = records.iter().map(|r| r.document()).collect();
    Retriever::new(bundle.clone(), documents, Arc::new(Normalizer::default()))
        .context("fitted bundle does not match the dataset")?;

    save_bundle(bundle_path, &bundle)?;
    tracing::info!(
        num_docs = bundle.meta.num_docs,
        num_terms = bundle.model.num_terms(),
        ?text_fields,
        output = %bundle_path.display(),
        "bundle written"
    );
    Ok(())
}

fn inspect(bundle_path: &Path, dataset: Option<&Path>) -> Result<()> {
    let bundle = load_bundle(bundle_path)?;
    let summary = serde_json::json!({
        "meta": &bundle.meta,
        "num_terms": bundle.model.num_terms(),
        "params": &bundle.model.params,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(dataset) = dataset {
        let documents = load_dataset(dataset)?.iter().map(|r| r.document()).collect();
        Retriever::new(bundle, documents, Arc::new(Normalizer::default()))?;
        tracing::info!(dataset = %dataset.display(), "bundle matches dataset");
    }
    Ok(())
}
