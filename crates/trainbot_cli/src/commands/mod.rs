//! CLI command definitions.
//!
//! Each subcommand maps to one way of talking to the dialogue engine.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use trainbot_chat::{ChatReply, EngineConfig};

pub mod ask;
pub mod chat;
pub mod validate;

/// trainbot - customer-service assistant for 虹宇職訓
#[derive(Parser)]
#[command(name = "trainbot")]
#[command(version, about = "Customer-service assistant for vocational training enquiries")]
#[command(long_about = r#"
trainbot answers course, subsidy, enrollment and FAQ questions for a
vocational-training provider from a directory of JSON knowledge documents,
using a language model for classification and free-form answers.

COMMANDS:
  chat      → Interactive conversation (/reset, /info, /quit)
  ask       → One turn, reply printed to stdout
  validate  → Load and cross-check every knowledge document

ENVIRONMENT:
  OPENAI_API_KEY / ANTHROPIC_API_KEY   provider credentials
  TRAINBOT_KNOWLEDGE_DIR               knowledge directory
  TRAINBOT_MAX_HISTORY                 messages kept per session
  RUST_LOG                             log filter (default trainbot=info,warn)

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Knowledge validation failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive conversation
    Chat(chat::ChatArgs),

    /// Send a single message and print the reply
    Ask(ask::AskArgs),

    /// Validate the knowledge documents
    Validate(validate::ValidateArgs),
}

/// Options shared by the commands that build an engine.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Engine configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Knowledge directory, overriding the configuration
    #[arg(short, long)]
    pub knowledge_dir: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::load(self.config.as_deref())
            .context("Failed to load engine configuration")?;
        if let Some(dir) = &self.knowledge_dir {
            config.knowledge_dir = dir.clone();
        }
        Ok(config)
    }
}

/// Print a reply with its numbered quick options.
pub fn print_reply(reply: &ChatReply) {
    println!("{}", reply.content);
    if !reply.quick_options.is_empty() {
        println!();
        let options: Vec<String> = reply
            .quick_options
            .iter()
            .map(|option| format!("[{}]", option))
            .collect();
        println!("{}", options.join(" "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_overrides() {
        let cli = Cli::try_parse_from([
            "trainbot",
            "ask",
            "待業課程",
            "--device",
            "mobile",
            "--knowledge-dir",
            "/srv/knowledge",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Ask(_)));
    }

    #[test]
    fn test_unknown_device_rejected() {
        let parsed = Cli::try_parse_from(["trainbot", "chat", "--device", "tablet"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_knowledge_dir_override() {
        let args = ConfigArgs {
            config: None,
            knowledge_dir: Some(PathBuf::from("/srv/knowledge")),
        };
        let config = args.load().unwrap();
        assert_eq!(config.knowledge_dir, PathBuf::from("/srv/knowledge"));
    }
}
