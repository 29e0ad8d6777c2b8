//! Run a single polling pass and print what it found. Handy for checking a
//! deployment without waiting out the poll interval.

use std::sync::Arc;

use bss_update_notifier::config::{self, Config};
use bss_update_notifier::countdown;
use bss_update_notifier::pipeline::{PassOutcome, UpdatePipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = Config::load_default()?;
    config::log_env_presence();
    let pipeline = Arc::new(UpdatePipeline::from_config(cfg));

    match pipeline.run_polling_pass().await {
        PassOutcome::Completed(posts) => {
            if posts.is_empty() {
                println!("no new posts");
            }
            for sp in &posts {
                println!("== [{}] {}", sp.post.source, sp.post.title);
                if !sp.post.link.is_empty() {
                    println!("   {}", sp.post.link);
                }
                if !sp.rendered.whats_new.is_empty() {
                    println!("WHATS NEW:\n{}", sp.rendered.whats_new);
                }
                if !sp.rendered.most_important.is_empty() {
                    println!("MOST IMPORTANT:\n{}", sp.rendered.most_important);
                }
                if !sp.rendered.notes.is_empty() {
                    println!("NOTES:\n{}", sp.rendered.notes);
                }
            }
            let doc = pipeline.store().load().await;
            if let Some(line) =
                countdown::countdown_line(pipeline.config(), &doc, chrono::Utc::now())
            {
                println!("{line}");
            }
        }
        PassOutcome::Skipped => println!("pass skipped: another pass is running"),
    }

    println!("poll-once done");
    Ok(())
}
