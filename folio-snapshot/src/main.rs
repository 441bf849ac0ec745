//! Loads every section of the site through the edge proxy, the same way the
//! page does on first visit, and prints the result as JSON.

use folio::animate::CounterElement;
use folio::features::cards::{self, CardMeta, HeatmapCell, LanguageBreakdown};
use folio::features::stats::{load_stats, show_stats};
use folio::features::timeline::{TIMELINE_SKELETON, load_timeline, message_preview, timeline_html};
use folio::features::show_result;
use folio::format::{abbreviate_num, relative_time};
use folio::render::Container;
use folio::DataClient;
use futures::future::join_all;
use serde_json::{Value, json};
use shared::config::ClientConfig;
use std::sync::Arc;
use storage_engine::MemorySessionStorage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if dotenv.is_ok() {
        info!("Loaded environment variables from .env file");
    }

    let config = ClientConfig::from_env();
    let client = DataClient::from_config(&config, Arc::new(MemorySessionStorage::new()));
    info!("Loading snapshot from {}", config.edge_url);

    let site = &config.site;
    let (stats, timeline, metas, heatmaps, languages) = futures::join!(
        load_stats(&client, site),
        load_timeline(&client, site),
        cards::load_card_meta(&client, site),
        cards::load_heatmaps(&client, site),
        join_all(
            site.card_repos
                .iter()
                .map(|repo| cards::load_language_breakdown(&client, site, repo))
        ),
    );

    let mut loc = CounterElement::placeholder();
    let mut commits = CounterElement::placeholder();
    show_stats(stats, &mut loc, &mut commits, config.motion).await;

    let timeline_json = match &timeline {
        Ok(list) => Value::Array(
            list.iter()
                .map(|c| {
                    json!({
                        "repo": c.repo,
                        "message": message_preview(&c.message).short,
                        "when": relative_time(&c.date),
                        "additions": c.additions.map(abbreviate_num),
                        "deletions": c.deletions.map(abbreviate_num),
                        "url": c.url,
                    })
                })
                .collect(),
        ),
        Err(e) => json!({ "error": e.to_string() }),
    };

    let mut timeline_section = Container::new(TIMELINE_SKELETON);
    show_result(&mut timeline_section, timeline, |list| timeline_html(&list), || {
        info!("Retry requested for timeline");
    });

    let languages: Vec<Value> = site
        .card_repos
        .iter()
        .zip(languages)
        .map(|(repo, result)| match result {
            Ok(breakdown) => language_json(repo, breakdown.as_ref()),
            Err(e) => json!({ "repo": repo, "error": e.to_string() }),
        })
        .collect();

    let snapshot = json!({
        "stats": { "loc": loc.text(), "commits": commits.text() },
        "timeline": timeline_json,
        "timeline_html_bytes": timeline_section.html().len(),
        "cards": metas.iter().map(card_json).collect::<Vec<_>>(),
        "heatmaps": heatmaps
            .iter()
            .map(|(repo, cells)| heatmap_json(repo, cells))
            .collect::<Vec<_>>(),
        "languages": languages,
    });

    match serde_json::to_string_pretty(&snapshot) {
        Ok(out) => println!("{out}"),
        Err(e) => tracing::error!("Failed to render snapshot: {}", e),
    }
}

fn card_json(meta: &CardMeta) -> Value {
    json!({
        "repo": meta.repo,
        "updated": meta.updated,
        "badges": meta.badges().into_iter().map(|(text, _)| text).collect::<Vec<_>>(),
        "ci": meta.ci.map(|ci| ci.badge()),
    })
}

fn heatmap_json(repo: &str, cells: &[HeatmapCell]) -> Value {
    json!({
        "repo": repo,
        "weeks": cells.iter().map(|c| c.count).collect::<Vec<_>>(),
        "backgrounds": cells.iter().map(|c| c.background.as_str()).collect::<Vec<_>>(),
    })
}

fn language_json(repo: &str, breakdown: Option<&LanguageBreakdown>) -> Value {
    let Some(breakdown) = breakdown else {
        return json!({ "repo": repo, "languages": [] });
    };
    json!({
        "repo": repo,
        "total_lines": breakdown.total_lines,
        "languages": breakdown
            .shares
            .iter()
            .map(|s| json!({ "name": s.name, "color": s.color(), "tooltip": s.tooltip() }))
            .collect::<Vec<_>>(),
        "legend": breakdown.legend().iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
    })
}
