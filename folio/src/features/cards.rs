use crate::client::{ClientError, DataClient};
use crate::features::stats::{BYTES_PER_LINE, lines_from_bytes};
use crate::format::{group_thousands, relative_time};
use crate::github::{LanguageData, ParticipationData, RepoData, WorkflowResponse};
use futures::future::join_all;
use shared::config::SiteConfig;
use tracing::debug;

pub const LANG_KEY_PREFIX: &str = "nd_lang_";
pub const HEATMAP_WEEKS: usize = 12;
pub const LEGEND_SIZE: usize = 4;
/// Languages at or below this share of the total are left out of the bar.
pub const MIN_LANGUAGE_PCT: f64 = 2.0;

const DEFAULT_HEATMAP_RGB: &str = "79,195,247";
const DEFAULT_LANGUAGE_COLOR: &str = "#888";

pub fn heatmap_rgb(repo: &str) -> &'static str {
    match repo {
        "MegaBonk" => "79,195,247",
        "VoltTracker" => "76,175,80",
        "landing-page" => "171,71,188",
        "satellite_processor" => "255,152,0",
        "AudioWhisper" => "233,30,99",
        _ => DEFAULT_HEATMAP_RGB,
    }
}

pub fn language_color(language: &str) -> &'static str {
    match language {
        "TypeScript" => "#3178c6",
        "JavaScript" => "#f1e05a",
        "Python" => "#3572A5",
        "CSS" => "#563d7c",
        "HTML" => "#e34c26",
        "Shell" => "#89e051",
        "PLpgSQL" => "#336790",
        "Swift" => "#F05138",
        "Makefile" => "#427819",
        _ => DEFAULT_LANGUAGE_COLOR,
    }
}

/// Outcome of the most recent CI run, when it has one worth showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CiStatus {
    Success,
    Failure,
}

impl CiStatus {
    pub fn from_runs(runs: &WorkflowResponse) -> Option<Self> {
        match runs.workflow_runs.first()?.conclusion.as_deref() {
            Some("success") => Some(CiStatus::Success),
            Some("failure") => Some(CiStatus::Failure),
            _ => None,
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            CiStatus::Success => "✓",
            CiStatus::Failure => "✗",
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            CiStatus::Success => "ci-success",
            CiStatus::Failure => "ci-failure",
        }
    }
}

/// Everything a project card shows beyond its static text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardMeta {
    pub repo: String,
    pub updated: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub ci: Option<CiStatus>,
}

impl CardMeta {
    fn apply_repo(&mut self, data: &RepoData) {
        self.updated = data
            .pushed_at
            .as_deref()
            .map(|at| format!("Updated {}", relative_time(at)));
        self.stars = data.stargazers_count;
        self.forks = data.forks_count;
    }

    /// `(text, aria-label)` for the star and fork badges that apply.
    pub fn badges(&self) -> Vec<(String, String)> {
        let mut badges = Vec::new();
        if self.stars > 0 {
            badges.push((format!("⭐ {}", self.stars), format!("{} stars", self.stars)));
        }
        if self.forks > 0 {
            badges.push((format!("🔀 {}", self.forks), format!("{} forks", self.forks)));
        }
        badges
    }
}

/// Repository info and latest CI result for every card. The two requests of a
/// card are independent, and so are the cards.
pub async fn load_card_meta(client: &DataClient, site: &SiteConfig) -> Vec<CardMeta> {
    join_all(site.card_repos.iter().map(|repo| async move {
        let mut meta = CardMeta {
            repo: repo.clone(),
            ..Default::default()
        };

        let info_path = site.repo_path(repo, "");
        let runs_path = site.repo_path(repo, "/actions/runs?per_page=1");
        let (info, runs) = futures::join!(
            client.cached_fetch_json::<RepoData>(&info_path),
            client.cached_fetch_json::<WorkflowResponse>(&runs_path),
        );

        match info {
            Ok(r) => meta.apply_repo(&r.payload),
            Err(e) => debug!("repo info for {} unavailable: {}", repo, e),
        }
        match runs {
            Ok(r) => meta.ci = CiStatus::from_runs(&r.payload),
            Err(e) => debug!("workflow runs for {} unavailable: {}", repo, e),
        }
        meta
    }))
    .await
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapCell {
    pub count: u64,
    /// CSS background; quiet weeks use the border color.
    pub background: String,
    pub label: String,
}

/// Weekly commit cells for the last [`HEATMAP_WEEKS`] weeks, shaded against the busiest week.
pub fn heatmap_cells(repo: &str, data: &ParticipationData) -> Vec<HeatmapCell> {
    let weeks = data
        .owner
        .as_deref()
        .or(data.all.as_deref())
        .unwrap_or_default();
    let recent = &weeks[weeks.len().saturating_sub(HEATMAP_WEEKS)..];
    let max = recent.iter().copied().max().unwrap_or(0).max(1);
    let rgb = heatmap_rgb(repo);

    recent
        .iter()
        .map(|&count| {
            let background = if count == 0 {
                "var(--border)".to_string()
            } else {
                let intensity = count as f64 / max as f64;
                format!("rgba({},{})", rgb, 0.2 + intensity * 0.8)
            };
            let label = format!("{} commit{}", count, if count == 1 { "" } else { "s" });
            HeatmapCell {
                count,
                background,
                label,
            }
        })
        .collect()
}

/// Heatmap rows for every repository whose participation loaded; failed rows are omitted.
pub async fn load_heatmaps(client: &DataClient, site: &SiteConfig) -> Vec<(String, Vec<HeatmapCell>)> {
    let rows = join_all(site.repos.iter().map(|repo| async move {
        match client
            .cached_fetch_json::<ParticipationData>(&site.repo_path(repo, "/stats/participation"))
            .await
        {
            Ok(r) => Some((repo.clone(), heatmap_cells(repo, &r.payload))),
            Err(e) => {
                debug!("participation for {} unavailable: {}", repo, e);
                None
            }
        }
    }))
    .await;

    rows.into_iter().flatten().collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct LanguageShare {
    pub name: String,
    pub pct: f64,
    pub lines: u64,
}

impl LanguageShare {
    pub fn color(&self) -> &'static str {
        language_color(&self.name)
    }

    pub fn tooltip(&self) -> String {
        format!(
            "{}: {:.1}% · {} lines",
            self.name,
            self.pct,
            group_thousands(self.lines)
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LanguageBreakdown {
    pub total_lines: u64,
    /// Largest first.
    pub shares: Vec<LanguageShare>,
}

impl LanguageBreakdown {
    /// `None` for a repository with no measured source.
    pub fn from_bytes(data: &LanguageData) -> Option<Self> {
        let total: u64 = data.values().sum();
        if total == 0 {
            return None;
        }

        let mut shares: Vec<LanguageShare> = data
            .iter()
            .map(|(name, &bytes)| LanguageShare {
                name: name.clone(),
                pct: bytes as f64 / total as f64 * 100.0,
                lines: (bytes as f64 / BYTES_PER_LINE).round() as u64,
            })
            .filter(|share| share.pct > MIN_LANGUAGE_PCT)
            .collect();
        shares.sort_by(|a, b| b.pct.total_cmp(&a.pct));

        Some(Self {
            total_lines: lines_from_bytes(total),
            shares,
        })
    }

    pub fn legend(&self) -> &[LanguageShare] {
        &self.shares[..self.shares.len().min(LEGEND_SIZE)]
    }
}

/// Language mix for one repository, cached per repository in session storage.
pub async fn load_language_breakdown(
    client: &DataClient,
    site: &SiteConfig,
    repo: &str,
) -> Result<Option<LanguageBreakdown>, ClientError> {
    let key = format!("{LANG_KEY_PREFIX}{repo}");
    let data = match client.read_entry::<LanguageData>(&key, client.default_ttl()) {
        Some(data) => data,
        None => {
            let fetched = client
                .fetch_json::<LanguageData>(&site.repo_path(repo, "/languages"))
                .await?
                .payload;
            client.write_entry(&key, &fetched);
            fetched
        }
    };
    Ok(LanguageBreakdown::from_bytes(&data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::WorkflowRun;

    #[test]
    fn test_ci_status_from_latest_run() {
        let runs = |c: Option<&str>| WorkflowResponse {
            workflow_runs: vec![WorkflowRun {
                conclusion: c.map(str::to_string),
            }],
        };
        assert_eq!(CiStatus::from_runs(&runs(Some("success"))), Some(CiStatus::Success));
        assert_eq!(CiStatus::from_runs(&runs(Some("failure"))), Some(CiStatus::Failure));
        assert_eq!(CiStatus::from_runs(&runs(Some("cancelled"))), None);
        assert_eq!(CiStatus::from_runs(&runs(None)), None);
        assert_eq!(CiStatus::from_runs(&WorkflowResponse::default()), None);
        assert_eq!(CiStatus::Failure.badge(), "✗");
    }

    #[test]
    fn test_card_badges() {
        let mut meta = CardMeta::default();
        assert!(meta.badges().is_empty());

        meta.apply_repo(&RepoData {
            pushed_at: None,
            stargazers_count: 3,
            forks_count: 0,
        });
        assert_eq!(meta.badges(), vec![("⭐ 3".to_string(), "3 stars".to_string())]);
        assert_eq!(meta.updated, None);
    }

    #[test]
    fn test_heatmap_uses_last_twelve_owner_weeks() {
        let mut weeks = vec![100; 40];
        weeks.extend([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 4]);
        let data = ParticipationData {
            owner: Some(weeks),
            all: Some(vec![1; 52]),
        };
        let cells = heatmap_cells("VoltTracker", &data);

        assert_eq!(cells.len(), HEATMAP_WEEKS);
        assert_eq!(cells[0].background, "var(--border)");
        assert_eq!(cells[0].label, "0 commits");
        assert_eq!(cells[1].label, "1 commit");
        assert_eq!(cells[10].background, "rgba(76,175,80,1)");
    }

    #[test]
    fn test_heatmap_falls_back_to_all_and_short_series() {
        let data = ParticipationData {
            owner: None,
            all: Some(vec![0, 0]),
        };
        let cells = heatmap_cells("unknown", &data);
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.background == "var(--border)"));
        assert!(heatmap_cells("x", &ParticipationData::default()).is_empty());
    }

    #[test]
    fn test_language_breakdown_filters_small_shares() {
        let data = LanguageData::from([
            ("Rust".to_string(), 8_000),
            ("Shell".to_string(), 1_900),
            ("Makefile".to_string(), 100),
        ]);
        let breakdown = LanguageBreakdown::from_bytes(&data).unwrap();

        assert_eq!(breakdown.total_lines, 250);
        let names: Vec<_> = breakdown.shares.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Rust", "Shell"]);
        assert_eq!(breakdown.shares[0].lines, 200);
        assert_eq!(breakdown.shares[0].tooltip(), "Rust: 80.0% · 200 lines");
        assert_eq!(breakdown.shares[1].color(), "#89e051");
        assert_eq!(breakdown.legend().len(), 2);
    }

    #[test]
    fn test_language_breakdown_empty() {
        assert!(LanguageBreakdown::from_bytes(&LanguageData::new()).is_none());
    }
}
