use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use storebot_chat::{ChatSession, HttpApi};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Parser)]
#[command(
    name = "storebot-chat",
    about = "Storefront chat assistant",
    long_about = "Interactive chat that turns free text into storefront API calls.",
    after_help = "Examples:\n  search for hoodie\n  add p1 x2\n  track ORD-1001 for alice@example.com"
)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3001", help = "Base URL of the storefront API")]
    api_url: String,
    #[arg(long, default_value_t = 10, help = "Per-request timeout in seconds")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .compact()
        .init();

    let api = HttpApi::new(&args.api_url, Duration::from_secs(args.timeout_secs))
        .map_err(|error| anyhow::anyhow!("could not build API client: {error}"))?;
    let mut session = ChatSession::new(api);

    let mut stdout = tokio::io::stdout();
    for message in session.messages() {
        stdout.write_all(format!("bot> {}\n", message.content).as_bytes()).await?;
    }
    stdout.write_all(b"you> ").await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            stdout.write_all(b"you> ").await?;
            stdout.flush().await?;
            continue;
        }
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        let reply = session.handle_message(text).await;
        let rendered = format!("bot> {}\n", reply.content);
        stdout.write_all(rendered.as_bytes()).await?;
        stdout
            .write_all(format!("     [cart: {} item(s)]\nyou> ", session.cart_count()).as_bytes())
            .await?;
        stdout.flush().await?;
    }

    Ok(())
}
