//! Ask command - One conversational turn.

use anyhow::Result;
use clap::Args;
use tracing::info;

use trainbot_chat::{ChatEngine, ChatRequest, ClientDevice};

use super::{print_reply, ConfigArgs};

#[derive(Args)]
pub struct AskArgs {
    /// Message to send
    message: String,

    /// Client device class (desktop or mobile)
    #[arg(short, long, default_value = "desktop")]
    device: ClientDevice,

    /// Print the reply as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

pub async fn execute(args: AskArgs) -> Result<()> {
    let config = args.config.load()?;
    let engine = ChatEngine::from_config(&config);

    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id = %session_id, "One-shot turn");

    let request = ChatRequest::new(session_id, args.message).with_device(args.device);
    let reply = engine.handle(request).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        print_reply(&reply);
    }
    Ok(())
}
