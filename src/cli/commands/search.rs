use crate::config::Config;
use crate::models::{Platform, UserId};
use crate::services::{PlatformOutcome, ResultSource};
use crate::state::SharedState;

pub async fn cmd_search(
    config: &Config,
    query: &str,
    platforms: &[Platform],
    user: Option<&str>,
) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let user = user.and_then(UserId::new);

    println!("Searching for: {query}");

    let outcomes = state
        .dispatcher
        .search(user.as_ref(), query, platforms)
        .await?;

    println!();
    println!("{:-<60}", "");

    for (platform, outcome) in &outcomes {
        match outcome {
            PlatformOutcome::Unconfigured => continue,
            PlatformOutcome::Failed { kind, message } => {
                println!("✗ {platform}: {kind:?} failure: {message}");
            }
            PlatformOutcome::Ready { source, view } => {
                let origin = match source {
                    ResultSource::Cache => "cached",
                    ResultSource::Provider => "fresh",
                };
                let more = if view.has_more { ", more available" } else { "" };
                println!(
                    "• {platform}: {} results ({origin}, {} unseen{more})",
                    view.results.len(),
                    view.unseen().len()
                );
                for item in view.unseen().iter().take(5) {
                    println!("  {} - {}", item.title, item.url);
                }
            }
        }
        println!();
    }

    let hidden: Vec<String> = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, PlatformOutcome::Unconfigured))
        .map(|(p, _)| p.to_string())
        .collect();
    if !hidden.is_empty() {
        println!("Not configured: {}", hidden.join(", "));
    }

    Ok(())
}
