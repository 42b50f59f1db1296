//! Chat command - Interactive conversation on stdin/stdout.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use trainbot_chat::{ChatEngine, ChatRequest, ClientDevice};

use super::{print_reply, ConfigArgs};

#[derive(Args)]
pub struct ChatArgs {
    /// Client device class (desktop or mobile)
    #[arg(short, long, default_value = "desktop")]
    device: ClientDevice,

    /// Session identifier (random when omitted)
    #[arg(short, long)]
    session: Option<String>,

    #[command(flatten)]
    config: ConfigArgs,
}

pub async fn execute(args: ChatArgs) -> Result<()> {
    let config = args.config.load()?;
    let engine = ChatEngine::from_config(&config);
    let session_id = args
        .session
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(session_id = %session_id, device = ?args.device, "Starting chat");
    println!("💬 trainbot (/reset 重新開始, /info 對話資訊, /quit 離開)\n");
    print_reply(&engine.reset(&session_id).await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "/quit" | "/exit" => break,
            "/reset" => {
                print_reply(&engine.reset(&session_id).await);
                continue;
            }
            "/info" => {
                match engine.session_info(&session_id).await {
                    Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
                    None => println!("尚無對話紀錄"),
                }
                continue;
            }
            _ => {}
        }

        let request = ChatRequest::new(session_id.clone(), input).with_device(args.device);
        let reply = engine.handle(request).await;
        println!();
        print_reply(&reply);
    }

    engine.end_session(&session_id);
    println!("\n👋 再見！");
    Ok(())
}
