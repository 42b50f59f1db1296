//! Validate command - Check the knowledge documents.

use anyhow::Result;
use clap::Args;
use tracing::info;

use trainbot_kb::{KnowledgeStore, KnowledgeValidator};

use super::ConfigArgs;

#[derive(Args)]
pub struct ValidateArgs {
    /// Treat warnings as failures
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    let config = args.config.load()?;
    info!("Validating knowledge directory: {}", config.knowledge_dir.display());

    let store = KnowledgeStore::new(&config.knowledge_dir);
    let result = KnowledgeValidator::validate(&store);

    println!("📚 Knowledge documents in {}", config.knowledge_dir.display());
    for (kind, count) in &result.counts {
        println!("   • {:<28} {} entries", kind.display_name(), count);
    }

    if !result.errors.is_empty() {
        println!("   ❌ Errors:");
        for error in &result.errors {
            println!("      - {}", error);
        }
    }
    for warning in &result.warnings {
        println!("   ⚠️  {}", warning);
    }

    println!();
    if !result.valid {
        anyhow::bail!("Knowledge validation failed with {} error(s)", result.errors.len());
    }
    if args.strict && !result.warnings.is_empty() {
        anyhow::bail!(
            "Knowledge validation failed: {} warning(s) in strict mode",
            result.warnings.len()
        );
    }

    println!("✅ All knowledge documents are valid!");
    Ok(())
}
