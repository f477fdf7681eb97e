pub mod cli;
pub mod console;
pub mod dispatch;
pub mod models;
pub mod recovery;
pub mod report;
pub mod session;
pub mod stats;
pub mod store;
pub mod surface;

use cli::Args;
use console::ConsoleSurface;
use log::info;
use session::ChatSession;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat Endpoint: {}", args.base_url);
    info!("Fallback Model: {}", args.fallback_model);
    info!("Retry Budget: {}", args.max_retries);
    info!("Backoff Unit: {}ms", args.retry_backoff_ms);
    info!("Store Type: {}", args.store_type);
    if args.store_type == "file" {
        info!("Store Path: {}", args.store_path);
    }
    if args.store_type == "redis" {
        info!("Store Redis URL: {}", args.store_redis_url);
    }
    info!("Stats Refresh: {}s", args.stats_refresh_secs);
    info!("Error Reports: {}", if args.disable_error_reports {
        "disabled"
    } else {
        "enabled"
    });
    info!("-------------------------");

    let session = ChatSession::new(&args).await?;
    info!("Conversation ID: {}", session.conversation_id());

    let surface: Arc<dyn surface::Surface> = Arc::new(ConsoleSurface);

    if args.stats_refresh_secs > 0 {
        stats::spawn_refresh(
            session.dispatcher(),
            Arc::clone(&surface),
            Duration::from_secs(args.stats_refresh_secs)
        );
    }

    console::run(session, surface).await
}
