use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{CatalogConfig, FallbackImages};
use crate::credentials::CredentialPool;
use crate::models::{CatalogRecord, MediaKind, Provenance, RecordId, VideoEntry};

const RATE_LIMITED: u16 = 429;

/// Catalog endpoints the home screen knows how to call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Trending,
    Popular,
    TopRated,
    Upcoming,
    TvPopular,
    Search,
    Videos { kind: MediaKind, id: RecordId },
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Trending => "/trending/all/week".to_string(),
            Endpoint::Popular => "/movie/popular".to_string(),
            Endpoint::TopRated => "/movie/top_rated".to_string(),
            Endpoint::Upcoming => "/movie/upcoming".to_string(),
            Endpoint::TvPopular => "/tv/popular".to_string(),
            Endpoint::Search => "/search/multi".to_string(),
            Endpoint::Videos { kind, id } => format!("/{}/{}/videos", kind.as_path(), id),
        }
    }

    /// Kind implied by the endpoint when a result omits `media_type`.
    fn default_kind(&self) -> Option<MediaKind> {
        match self {
            Endpoint::Popular | Endpoint::TopRated | Endpoint::Upcoming => Some(MediaKind::Movie),
            Endpoint::TvPopular => Some(MediaKind::Tv),
            Endpoint::Trending | Endpoint::Search | Endpoint::Videos { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("rate limited")]
    RateLimited,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// One HTTP GET against the catalog. Split out so the rotation logic can be
/// exercised without a network.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<TransportResponse, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let user_agent = format!("cinefront/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .context("Failed to build catalog HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<TransportResponse, FetchError> {
        let res = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

pub struct CatalogClient {
    transport: Arc<dyn CatalogTransport>,
    credentials: Arc<CredentialPool>,
    images: Arc<FallbackImages>,
    base_url: String,
    poster_base: String,
    backdrop_base: String,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig, transport: Arc<dyn CatalogTransport>) -> Result<Self> {
        let credentials = Arc::new(CredentialPool::new(config.api_keys.clone())?);
        Ok(Self {
            transport,
            credentials,
            images: Arc::new(config.fallback_images.clone()),
            base_url: config.base_url.clone(),
            poster_base: config.poster_base.clone(),
            backdrop_base: config.backdrop_base.clone(),
        })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(config, Arc::new(HttpTransport::new()?))
    }

    pub(crate) fn credentials(&self) -> &CredentialPool {
        &self.credentials
    }

    pub fn images(&self) -> &FallbackImages {
        &self.images
    }

    /// Fetches one endpoint's records. Never fails: any error ends up as `None`.
    /// A successful but empty page is `Some(vec![])`.
    pub async fn fetch(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
    ) -> Option<Vec<CatalogRecord>> {
        let raw: Vec<Value> = self.fetch_results(endpoint, params).await?;
        let default_kind = endpoint.default_kind();
        Some(
            raw.into_iter()
                .filter_map(|v| serde_json::from_value::<RawRecord>(v).ok())
                .filter_map(|r| self.normalize(r, default_kind))
                .collect(),
        )
    }

    pub async fn fetch_videos(&self, kind: MediaKind, id: &RecordId) -> Option<Vec<VideoEntry>> {
        let endpoint = Endpoint::Videos {
            kind,
            id: id.clone(),
        };
        let raw: Vec<Value> = self.fetch_results(&endpoint, &[]).await?;
        Some(
            raw.into_iter()
                .filter_map(|v| serde_json::from_value::<VideoEntry>(v).ok())
                .collect(),
        )
    }

    async fn fetch_results<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
    ) -> Option<Vec<T>> {
        let path = endpoint.path();
        match self.request_with_rotation(&path, params).await {
            Ok(results) => Some(results),
            Err(FetchError::RateLimited) => {
                warn!(path = %path, "All catalog API keys exhausted");
                None
            }
            Err(e) => {
                warn!(path = %path, "Catalog request failed: {}", e);
                None
            }
        }
    }

    async fn request_with_rotation<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, FetchError> {
        match self.attempt(path, self.credentials.current(), params).await {
            Err(FetchError::RateLimited) => {
                let key = self.credentials.rotate();
                debug!(
                    path = %path,
                    key_index = self.credentials.position(),
                    "Rate limited, retrying with next API key"
                );
                self.attempt(path, key, params).await
            }
            other => other,
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        path: &str,
        api_key: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut query = vec![("api_key".to_string(), api_key.to_string())];
        query.extend(
            params
                .iter()
                .filter(|(k, _)| *k != "api_key")
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        debug!(path = %path, "Catalog request");

        let res = self.transport.get(&url, &query).await?;
        if res.status == RATE_LIMITED {
            return Err(FetchError::RateLimited);
        }
        if !(200..300).contains(&res.status) {
            return Err(FetchError::Status(res.status));
        }
        let page: ResultsPage<T> =
            serde_json::from_str(&res.body).map_err(|e| FetchError::Decode(e.to_string()))?;
        page.results
            .ok_or_else(|| FetchError::Decode("response has no results array".to_string()))
    }

    fn normalize(&self, raw: RawRecord, default_kind: Option<MediaKind>) -> Option<CatalogRecord> {
        let id = raw.id?;
        let has_title = raw.title.is_some();
        let media_kind = match (raw.media_type.as_deref(), default_kind) {
            (Some(t), _) => MediaKind::infer(Some(t), has_title)?,
            (None, Some(kind)) => kind,
            (None, None) => MediaKind::infer(None, has_title)?,
        };
        let poster = image_url(&self.poster_base, raw.poster_path.as_deref())
            .unwrap_or_else(|| self.images.poster_for(&id).to_string());
        let backdrop = image_url(&self.backdrop_base, raw.backdrop_path.as_deref())
            .unwrap_or_else(|| self.images.hero_for(&id).to_string());
        let rating = raw
            .vote_average
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, 10.0))
            .unwrap_or(0.0);

        Some(CatalogRecord {
            id,
            title: raw.title.or(raw.name).unwrap_or_default(),
            overview: raw.overview.unwrap_or_default(),
            poster,
            backdrop,
            rating,
            release_date: non_empty(raw.release_date)
                .or_else(|| non_empty(raw.first_air_date))
                .unwrap_or_default(),
            media_kind,
            trailer: None,
            provenance: Provenance::Catalog,
        })
    }
}

fn image_url(base: &str, path: Option<&str>) -> Option<String> {
    path.map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("{base}{p}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct ResultsPage<T> {
    results: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<RecordId>,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    media_type: Option<String>,
}

/// First YouTube trailer, else the first video of any kind.
pub fn select_trailer(videos: &[VideoEntry]) -> Option<&VideoEntry> {
    videos
        .iter()
        .find(|v| v.is_youtube_trailer())
        .or_else(|| videos.first())
}
