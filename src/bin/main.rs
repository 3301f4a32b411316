use clap::Parser;
use finance_brief_orchestrator::{
    collaborators::build_http_collaborators, documents::FsDocumentStore, OrchestratorConfig,
    Pipeline,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Ask the orchestrator one question against the configured collaborators
#[derive(Debug, Parser)]
#[command(name = "orchestrator", version)]
struct Args {
    /// The question to answer
    #[arg(required = true)]
    question: Vec<String>,

    /// Print the per-step run trace after the answer
    #[arg(long)]
    trace: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    dotenv::dotenv().ok();

    // Logs go to stderr so the answer stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = OrchestratorConfig::from_env()?;
    let collaborators = build_http_collaborators(&config)?;
    let documents = Arc::new(FsDocumentStore::new(config.docs_dir.clone()));
    let pipeline = Pipeline::new(&config, collaborators, documents);

    let question = args.question.join(" ");
    info!(question = %question, "Running pipeline");

    let run = pipeline.run(&question).await;

    println!("{}", run.answer());

    if args.trace {
        println!("\n=== RUN TRACE ({}) ===", run.run_id);
        for (i, record) in run.trace.iter().enumerate() {
            println!(
                "  {}: {} [{:?}] {} ms {:?}",
                i + 1,
                record.step,
                record.status,
                record.elapsed_ms,
                record.fields
            );
        }
        println!("Total: {} ms", run.elapsed_ms);
    }

    Ok(())
}
