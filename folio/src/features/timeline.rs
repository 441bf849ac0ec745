use crate::client::{ClientError, DataClient};
use crate::format::{abbreviate_num, relative_time};
use crate::github::{Commit, CommitDetailResponse, GitHubCommitResponse};
use crate::render::escape_html;
use chrono::DateTime;
use futures::future::join_all;
use shared::config::SiteConfig;
use tracing::debug;

pub const COMMITS_KEY: &str = "nd_commits";
pub const COMMITS_PER_REPO: usize = 5;
pub const TIMELINE_LENGTH: usize = 10;
pub const PREVIEW_CHARS: usize = 60;

/// The ten most recent commits across all repositories, with line counts
/// where the per-commit detail could be fetched.
///
/// Fails with [`ClientError::Empty`] only when no repository returned any commit.
pub async fn load_timeline(
    client: &DataClient,
    site: &SiteConfig,
) -> Result<Vec<Commit>, ClientError> {
    if let Some(cached) = client.read_entry::<Vec<Commit>>(COMMITS_KEY, client.default_ttl()) {
        return Ok(cached);
    }

    let per_repo = join_all(site.repos.iter().map(|repo| async move {
        let path = site.repo_path(repo, &format!("/commits?per_page={COMMITS_PER_REPO}"));
        match client
            .cached_fetch_json::<Vec<GitHubCommitResponse>>(&path)
            .await
        {
            Ok(result) => result
                .payload
                .into_iter()
                .map(|c| Commit::from_response(repo, c))
                .collect(),
            Err(e) => {
                debug!("commits for {} unavailable: {}", repo, e);
                Vec::new()
            }
        }
    }))
    .await;

    let mut commits: Vec<Commit> = per_repo.into_iter().flatten().collect();
    sort_newest_first(&mut commits);
    commits.truncate(TIMELINE_LENGTH);

    if commits.is_empty() {
        return Err(ClientError::Empty);
    }

    let details = join_all(commits.iter().map(|c| async move {
        let path = site.repo_path(&c.repo, &format!("/commits/{}", c.sha));
        client
            .cached_fetch_json::<CommitDetailResponse>(&path)
            .await
            .map(|r| r.payload)
            .ok()
    }))
    .await;

    for (commit, detail) in commits.iter_mut().zip(details) {
        if let Some(detail) = detail {
            let stats = detail.stats.unwrap_or_default();
            commit.additions = Some(stats.additions);
            commit.deletions = Some(stats.deletions);
        }
    }

    client.write_entry(COMMITS_KEY, &commits);
    Ok(commits)
}

fn sort_newest_first(commits: &mut [Commit]) {
    commits.sort_by_key(|c| {
        std::cmp::Reverse(
            DateTime::parse_from_rfc3339(&c.date)
                .map(|d| d.timestamp_millis())
                .unwrap_or(i64::MIN),
        )
    });
}

/// First line of a commit message, cut at [`PREVIEW_CHARS`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessagePreview {
    pub short: String,
    /// Untruncated first line, present only when `short` was cut.
    pub full: Option<String>,
}

pub fn message_preview(message: &str) -> MessagePreview {
    let first_line = message.lines().next().unwrap_or_default();
    if first_line.chars().count() > PREVIEW_CHARS {
        let mut short: String = first_line.chars().take(PREVIEW_CHARS).collect();
        short.push('…');
        MessagePreview {
            short,
            full: Some(first_line.to_string()),
        }
    } else {
        MessagePreview {
            short: first_line.to_string(),
            full: None,
        }
    }
}

fn commit_meta_html(commit: &Commit) -> String {
    let additions = commit
        .additions
        .map(|n| format!(r#"<span class="stat-add">+{}</span>"#, abbreviate_num(n)))
        .unwrap_or_default();
    let deletions = commit
        .deletions
        .map(|n| format!(r#"<span class="stat-del">-{}</span>"#, abbreviate_num(n)))
        .unwrap_or_default();

    format!(
        r#"<div class="commit-meta">
    <span class="repo-badge repo-{}">{}</span>
    {}
    {}
    <span class="commit-time">{}</span>
  </div>"#,
        escape_html(&commit.repo.to_lowercase()),
        escape_html(&commit.repo),
        additions,
        deletions,
        relative_time(&commit.date)
    )
}

pub fn timeline_item_html(commit: &Commit, index: usize) -> String {
    let preview = message_preview(&commit.message);
    let side = if index % 2 == 0 { "left" } else { "right" };
    let (class, attrs) = match &preview.full {
        Some(full) => (
            " expandable",
            format!(
                r#" data-full="{}" data-short="{}""#,
                escape_html(full),
                escape_html(&preview.short)
            ),
        ),
        None => ("", String::new()),
    };
    let url = if commit.url.is_empty() { "#" } else { commit.url.as_str() };

    format!(
        r#"
    <li class="timeline-item {side} content-fade-in">
      <div class="timeline-dot"></div>
      <a href="{}" target="_blank" rel="noopener noreferrer" class="timeline-content timeline-link">
        <p class="commit-msg{class}"{attrs}>{}</p>
        {}
      </a>
    </li>"#,
        escape_html(url),
        escape_html(&preview.short),
        commit_meta_html(commit)
    )
}

pub fn timeline_html(commits: &[Commit]) -> String {
    if commits.is_empty() {
        return r#"<p class="timeline-empty">No recent activity</p>"#.to_string();
    }
    let items: String = commits
        .iter()
        .enumerate()
        .map(|(i, c)| timeline_item_html(c, i))
        .collect();
    format!(r#"<div class="timeline-line"></div>{items}"#)
}

/// Skeleton shown again when the user retries a failed timeline load.
pub const TIMELINE_SKELETON: &str = r#"<div class="timeline-loading"><div class="skeleton-item"></div><div class="skeleton-item"></div><div class="skeleton-item"></div></div>"#;
