use std::process::ExitCode;
use std::sync::Arc;

use rental_reviews::reviews::tree::render_lines;
use rental_reviews::{ClientConfig, HttpReviewApi, ReviewApi, ReviewThreadStore, SessionFile};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing subscriber for logging, filtered by RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let post_id = match std::env::args().nth(1).map(|arg| arg.parse::<i64>()) {
        Some(Ok(id)) if id > 0 => id,
        _ => {
            eprintln!("usage: rental-reviews <post-id>");
            return ExitCode::from(2);
        }
    };

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = SessionFile::new(&config.session_file).load();
    let api = Arc::new(HttpReviewApi::new(&config.api_base_url));
    let store = ReviewThreadStore::new(api.clone(), session, post_id);

    tracing::info!("Loading review thread for post {}", post_id);
    store.load_tree().await;

    match api.fetch_post(post_id).await {
        Ok(post) => {
            if let Some(title) = &post.title {
                println!("{}", title);
            }
            if let Some(cover) = post.cover_image_url(&config.asset_base_url) {
                println!("{}", cover);
            }
            let summary = post.rating_summary();
            match summary.average {
                Some(avg) => println!("{} reviews, average {:.1}/5", summary.count, avg),
                None => println!("No reviews yet"),
            }
        }
        Err(e) => tracing::warn!("Could not load post {}: {}", post_id, e),
    }

    for line in render_lines(&store.snapshot()) {
        println!("{}", line);
    }

    store.unmount();
    ExitCode::SUCCESS
}
