use log::info;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };

use crate::models::chat::UsageStats;
use crate::session::{ ChatSession, SessionReply };
use crate::surface::Surface;

/// How many past exchanges to replay when the console opens.
const REPLAY_ON_START: usize = 5;

pub struct ConsoleSurface;

impl Surface for ConsoleSurface {
    fn show_user(&self, text: &str) {
        println!("You: {}", text);
    }

    fn show_bot(&self, text: &str) {
        println!("Bot: {}", text);
    }

    fn set_busy(&self, busy: bool) {
        if busy {
            println!("...");
        }
    }

    fn show_stats(&self, stats: &UsageStats) {
        info!(
            "Stats — wallet: {:.2}, chats: {}, earned: {:.2}",
            stats.wallet,
            stats.chats_count,
            stats.total_earned
        );
    }

    fn notify(&self, message: &str) {
        println!("* {}", message);
    }
}

/// Line-oriented front end: read a line, send it through the session,
/// render the reply. `/model`, `/clear` and `/quit` mirror the chat UI
/// actions of the backend's web client.
pub async fn run(
    mut session: ChatSession,
    surface: Arc<dyn Surface>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    for entry in session.recent_history(REPLAY_ON_START).await? {
        surface.show_user(&entry.user);
        surface.show_bot(&entry.bot);
    }
    surface.notify(
        &format!("Model: {}. Commands: /model <id>, /clear, /quit.", session.model())
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim().to_string();
        if input.is_empty() {
            continue;
        }

        if let Some(rest) = input.strip_prefix("/model") {
            let model = rest.trim();
            if model.is_empty() {
                surface.notify(&format!("Current model: {}", session.model()));
            } else {
                session.set_model(model).await?;
                surface.notify(&format!("Switched to model '{}'", model));
            }
            continue;
        }

        match input.as_str() {
            "/quit" | "/exit" => {
                break;
            }
            "/clear" => {
                session.clear_history().await?;
                surface.notify("Chat history cleared.");
                continue;
            }
            _ => {}
        }

        surface.show_user(&input);
        surface.set_busy(true);
        let reply = session.send_message(&input).await;
        surface.set_busy(false);

        match reply {
            Some(SessionReply::Answer { text, stats }) => {
                surface.show_bot(&text);
                if let Some(stats) = stats {
                    surface.show_stats(&stats);
                }
            }
            Some(SessionReply::Failure { text, .. }) => {
                surface.show_bot(&text);
            }
            None => {}
        }
    }

    info!("Console session closed (Conv ID: {})", session.conversation_id());
    Ok(())
}
