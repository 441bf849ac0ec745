// Payload shapes returned by the GitHub REST API (through the edge proxy),
// plus the records the site derives from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bytes of source per language, as returned by `/languages`.
pub type LanguageData = BTreeMap<String, u64>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RepoData {
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub conclusion: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkflowResponse {
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParticipationData {
    pub owner: Option<Vec<u64>>,
    pub all: Option<Vec<u64>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContributorData {
    #[serde(default)]
    pub contributions: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GitHubCommitResponse {
    pub commit: CommitInfo,
    pub author: Option<AccountInfo>,
    pub html_url: String,
    pub sha: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitInfo {
    pub message: String,
    pub committer: CommitSignature,
    pub author: CommitAuthor,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitSignature {
    pub date: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommitDetailResponse {
    pub stats: Option<CommitStats>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

/// One entry of the activity timeline. Line counts stay `None` until the
/// per-commit detail has been fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub message: String,
    pub date: String,
    pub author: String,
    pub avatar: String,
    pub repo: String,
    pub url: String,
    pub sha: String,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
}

impl Commit {
    pub fn from_response(repo: &str, c: GitHubCommitResponse) -> Self {
        Self {
            message: c.commit.message,
            date: c.commit.committer.date,
            author: c.commit.author.name,
            avatar: c.author.map(|a| a.avatar_url).unwrap_or_default(),
            repo: repo.to_string(),
            url: c.html_url,
            sha: c.sha,
            additions: None,
            deletions: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsData {
    pub loc: u64,
    pub commits: u64,
}
