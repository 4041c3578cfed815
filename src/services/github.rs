use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, TrafficError};
use crate::metrics::{MetricKind, RankedEntry, RankedKind, RankedTable, RawEvent};

const API_VERSION: &str = "2022-11-28";

/// Everything one run fetches, before any merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficSnapshot {
    pub views: Vec<RawEvent>,
    pub clones: Vec<RawEvent>,
    pub referral_sources: RankedTable,
    pub referral_paths: RankedTable,
}

#[derive(Deserialize)]
struct SeriesBody {
    #[serde(alias = "views", alias = "clones")]
    events: Vec<RawEvent>,
}

#[derive(Deserialize)]
struct ReferrerRow {
    referrer: String,
    count: u64,
    uniques: u64,
}

#[derive(Deserialize)]
struct PathRow {
    path: String,
    title: String,
    count: u64,
    uniques: u64,
}

/// Read-only client for `/repos/{repo}/traffic/*`.
#[derive(Clone)]
pub struct TrafficClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TrafficClient {
    pub fn new(api_url: &str, repository: &str, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("traffic-ledger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(repository, "Repository name");
        Ok(Self {
            client,
            base_url: format!("{}/repos/{}/traffic", api_url.trim_end_matches('/'), repository),
            token: token.into(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrafficError::Status {
                endpoint: url,
                status,
            });
        }

        Ok(response.json().await?)
    }

    /// Daily views or clones for the trailing window.
    pub async fn fetch_series(&self, kind: MetricKind) -> Result<Vec<RawEvent>> {
        let body: SeriesBody = self.get(kind.as_str(), &[("per", "day")]).await?;
        info!(kind = %kind, records = body.events.len(), "Fetched series");
        Ok(body.events)
    }

    /// Top referrers or top paths, in the order the API returns them.
    pub async fn fetch_table(&self, kind: RankedKind) -> Result<RankedTable> {
        let entries: Vec<RankedEntry> = match kind {
            RankedKind::ReferralSources => self
                .get::<Vec<ReferrerRow>>("popular/referrers", &[])
                .await?
                .into_iter()
                .map(|r| RankedEntry::referrer(r.referrer, r.count, r.uniques))
                .collect(),
            RankedKind::ReferralPaths => self
                .get::<Vec<PathRow>>("popular/paths", &[])
                .await?
                .into_iter()
                .map(|r| RankedEntry::path(r.path, r.title, r.count, r.uniques))
                .collect(),
        };
        info!(kind = %kind, records = entries.len(), "Fetched table");
        Ok(RankedTable::new(kind, entries))
    }

    /// Fetches all four kinds. Any failure aborts the whole snapshot.
    pub async fn fetch_snapshot(&self) -> Result<TrafficSnapshot> {
        Ok(TrafficSnapshot {
            views: self.fetch_series(MetricKind::Views).await?,
            clones: self.fetch_series(MetricKind::Clones).await?,
            referral_sources: self.fetch_table(RankedKind::ReferralSources).await?,
            referral_paths: self.fetch_table(RankedKind::ReferralPaths).await?,
        })
    }
}
