use crate::animate::{CounterElement, animate_counter};
use crate::client::DataClient;
use crate::github::{ContributorData, LanguageData, StatsData};
use futures::future::join_all;
use shared::config::{MotionConfig, SiteConfig};
use tracing::debug;

pub const STATS_KEY: &str = "nd_stats";

/// Rough bytes-per-line used to turn language byte counts into lines of code.
pub const BYTES_PER_LINE: f64 = 40.0;

pub fn lines_from_bytes(bytes: u64) -> u64 {
    (bytes as f64 / BYTES_PER_LINE).round() as u64
}

/// Totals for the stats bar across every card repository.
///
/// A repository whose languages or contributors cannot be loaded contributes
/// nothing; the others still count.
pub async fn load_stats(client: &DataClient, site: &SiteConfig) -> StatsData {
    if let Some(cached) = client.read_entry::<StatsData>(STATS_KEY, client.default_ttl()) {
        return cached;
    }

    let languages = join_all(site.card_repos.iter().map(|repo| async move {
        client
            .cached_fetch_json::<LanguageData>(&site.repo_path(repo, "/languages"))
            .await
            .map(|r| r.payload)
            .unwrap_or_else(|e| {
                debug!("languages for {} unavailable: {}", repo, e);
                LanguageData::new()
            })
    }));

    let contributors = join_all(site.card_repos.iter().map(|repo| async move {
        client
            .cached_fetch_json::<Vec<ContributorData>>(&site.repo_path(repo, "/contributors"))
            .await
            .map(|r| r.payload)
            .unwrap_or_else(|e| {
                debug!("contributors for {} unavailable: {}", repo, e);
                Vec::new()
            })
    }));

    let (languages, contributors) = futures::join!(languages, contributors);

    let total_bytes: u64 = languages.iter().flat_map(|l| l.values()).sum();
    let stats = StatsData {
        loc: lines_from_bytes(total_bytes),
        commits: contributors
            .iter()
            .flatten()
            .map(|c| c.contributions)
            .sum(),
    };

    client.write_entry(STATS_KEY, &stats);
    stats
}

/// Run both stats counters side by side.
pub async fn show_stats(
    stats: StatsData,
    loc: &mut CounterElement,
    commits: &mut CounterElement,
    motion: MotionConfig,
) {
    futures::join!(
        animate_counter(loc, stats.loc, motion),
        animate_counter(commits, stats.commits, motion),
    );
}
