//! claimcheck — verify a claim against the fact corpus from the command line
//!
//! The thin calling layer around `claimcheck-core`: loads config, builds the
//! scoring services once, runs one verification, and prints the response as
//! JSON. When the pipeline emits `USE_ML_MODEL`, the claim-only fallback
//! classifier runs here — by contract the core never invokes it itself.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use claimcheck_core::scoring::{
    create_embedding_backend, EmbeddingBackend, OnnxClaimClassifier, OnnxCrossEncoder,
    OnnxEntailmentModel,
};
use claimcheck_core::{
    ClaimcheckConfig, FactStore, FallbackClassifier, Reranker, Retriever, StanceScorer, Verdict,
    VerifyPipeline,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "claimcheck.toml")]
    config: String,

    /// Claim to verify, already normalized to English by the caller
    claim: Option<String>,

    /// Check corpus availability and exit
    #[arg(long)]
    health: bool,

    /// Do not run the claim-only classifier on a USE_ML_MODEL verdict
    #[arg(long)]
    no_fallback: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match ClaimcheckConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.service.log_level.clone()));
    fmt().with_env_filter(filter).init();

    // A missing corpus is fatal — never serve verdicts without facts.
    let store = match FactStore::connect(&config.database).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if args.health {
        println!("fact corpus available");
        return Ok(());
    }

    let Some(claim) = args.claim else {
        eprintln!("No claim given. Usage: claimcheck \"<claim>\"");
        std::process::exit(2);
    };

    // Scoring services are expensive — construct once, share everywhere.
    let embedder: Arc<dyn EmbeddingBackend> =
        Arc::from(create_embedding_backend(&config.models)?);
    let cross_encoder = Arc::new(OnnxCrossEncoder::from_model_path(&config.models.reranker_path)?);
    let entailment = Arc::new(OnnxEntailmentModel::from_model_path(
        &config.models.entailment_path,
    )?);

    let retriever = Arc::new(Retriever::new(Arc::new(store), Arc::clone(&embedder)));
    let pipeline = VerifyPipeline::new(
        retriever,
        Reranker::new(cross_encoder),
        StanceScorer::new(embedder, entailment),
        config.verification.clone(),
    );

    let response = pipeline.verify(&claim).await;

    if response.verdict.label == Verdict::UseMlModel && !args.no_fallback {
        let classifier = Arc::new(OnnxClaimClassifier::from_model_path(
            &config.models.fallback_path,
        )?);
        let fallback =
            FallbackClassifier::new(classifier, config.verification.fallback_threshold);
        let fallback_verdict = fallback.predict(&claim).await?;

        let combined = serde_json::json!({
            "verify": response,
            "fallback": fallback_verdict,
        });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
