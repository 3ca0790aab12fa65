use anyhow::Context as _;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;
use tripgraph::config::ConfigCache;
use tripgraph::persistence::InMemoryBookingStore;
use tripgraph::{build_supervisor, telemetry, AgentServices, Route, TripState};
use tripgraph_core::completion::{ModelBuilder, OpenAiModelBuilder, ScriptedBuilder};
use tripgraph_core::{Context, Message, ScriptedModel};

#[derive(Parser, Debug)]
#[command(name = "tripgraph", about = "Chat with the trip-planning agent")]
struct Args {
    /// Config file layered over config/default.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use a scripted model that routes every message to general input
    #[arg(long)]
    offline: bool,
}

const OFFLINE_REPLY: &str = "I'm running offline, so I can only chat for now. Restart without --offline to plan a trip.";

fn script_offline_turn(model: &ScriptedModel) {
    model
        .push_tool_call("router", json!({ "route": Route::GeneralInput.as_str() }))
        .push_text(OFFLINE_REPLY);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ConfigCache::new(args.config.clone());
    let settings = config.get().context("failed to load configuration")?;
    telemetry::init_logging(&settings.logging)?;

    let scripted = Arc::new(ScriptedModel::new().with_history_limit(0));
    let builder: Arc<dyn ModelBuilder> = if args.offline {
        Arc::new(ScriptedBuilder::new(Arc::clone(&scripted)))
    } else {
        Arc::new(OpenAiModelBuilder)
    };

    let services = Arc::new(AgentServices::new(
        config,
        builder,
        Arc::new(InMemoryBookingStore::new()),
    )?);
    if !args.offline && !services.models().validate_api_keys() {
        anyhow::bail!("OPENAI_API_KEY is not set; export it or run with --offline");
    }
    let graph = build_supervisor(Arc::clone(&services));

    println!("TripGraph ready. Type a message, or 'exit' to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = TripState::default();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }
        if args.offline {
            script_offline_turn(&scripted);
        }

        let turn = state.clone().with_message(Message::human(line));
        let (seen_messages, seen_ui) = (turn.messages.len(), turn.ui.len());

        match graph.run(&Context::default(), turn.clone()).await {
            Ok(next) => {
                for message in next.messages[seen_messages..]
                    .iter()
                    .filter(|message| !message.is_hidden() && !message.content.is_empty())
                {
                    println!("assistant> {}", message.content);
                }
                for ui in &next.ui[seen_ui..] {
                    println!("ui> {}", serde_json::to_string(ui)?);
                }
                state = next;
            }
            Err(err) => {
                error!(error = %err, "Turn failed");
                println!("assistant> Something went wrong: {err}");
                state = turn;
            }
        }
    }

    Ok(())
}
