use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{select_trailer, CatalogClient, Endpoint};
use crate::models::{
    CatalogRecord, HomeScreen, MediaKind, Provenance, RecordId, Trailer, PLACEHOLDER_TRAILER_KEY,
};
use crate::placeholder::{PlaceholderGenerator, ROW_SIZE};

/// Queries of this many characters or fewer never reach the catalog.
pub const MIN_QUERY_CHARS: usize = 3;

/// What the rendering layer calls: rows for the home screen, search and trailers.
#[derive(Clone)]
pub struct BrowseService {
    catalog: Arc<CatalogClient>,
    placeholders: PlaceholderGenerator,
}

impl BrowseService {
    pub fn new(catalog: Arc<CatalogClient>) -> Self {
        let placeholders = PlaceholderGenerator::new(Arc::new(catalog.images().clone()));
        Self {
            catalog,
            placeholders,
        }
    }

    pub async fn load_home(&self) -> HomeScreen {
        let (trending, popular, top_rated, upcoming, tv_shows) = tokio::join!(
            self.catalog.fetch(&Endpoint::Trending, &[]),
            self.catalog.fetch(&Endpoint::Popular, &[]),
            self.catalog.fetch(&Endpoint::TopRated, &[]),
            self.catalog.fetch(&Endpoint::Upcoming, &[]),
            self.catalog.fetch(&Endpoint::TvPopular, &[]),
        );

        let trending = self.or_placeholder("trending", trending, MediaKind::Movie);
        let popular = self.or_placeholder("popular", popular, MediaKind::Movie);
        let top_rated = self.or_placeholder("top_rated", top_rated, MediaKind::Movie);
        let upcoming = self.or_placeholder("upcoming", upcoming, MediaKind::Movie);
        let tv_shows = self.or_placeholder("tv_shows", tv_shows, MediaKind::Tv);

        HomeScreen {
            featured: trending.first().cloned(),
            trending,
            popular,
            top_rated,
            upcoming,
            tv_shows,
        }
    }

    fn or_placeholder(
        &self,
        row: &str,
        fetched: Option<Vec<CatalogRecord>>,
        kind: MediaKind,
    ) -> Vec<CatalogRecord> {
        match fetched {
            Some(records) if !records.is_empty() => records,
            _ => {
                info!("Row '{}' has no catalog data, using placeholders", row);
                self.placeholders
                    .generate(kind, ROW_SIZE, &mut rand::rng())
            }
        }
    }

    /// Empty results stay empty; search is never backfilled.
    pub async fn search(&self, query: &str) -> Vec<CatalogRecord> {
        let query = query.trim();
        if query.chars().count() <= MIN_QUERY_CHARS {
            debug!("Skipping search for short query");
            return Vec::new();
        }
        self.catalog
            .fetch(&Endpoint::Search, &[("query", query)])
            .await
            .unwrap_or_default()
    }

    pub async fn lookup_trailer(&self, record: &CatalogRecord) -> Trailer {
        if record.provenance == Provenance::Placeholder {
            let key = record
                .trailer
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_TRAILER_KEY.to_string());
            return Trailer::new(record.title.clone(), key);
        }
        self.lookup_trailer_for(record.media_kind, &record.id, &record.title, record.provenance)
            .await
    }

    /// Placeholder ids never exist upstream, so they get the fixed key without a request.
    pub async fn lookup_trailer_for(
        &self,
        kind: MediaKind,
        id: &RecordId,
        title: &str,
        provenance: Provenance,
    ) -> Trailer {
        if provenance == Provenance::Placeholder {
            debug!("Placeholder {} {}, skipping trailer lookup", kind, id);
            return Trailer::new(title, PLACEHOLDER_TRAILER_KEY);
        }
        let key = match self.catalog.fetch_videos(kind, id).await {
            Some(videos) => match select_trailer(&videos) {
                Some(video) => video.key.clone(),
                None => {
                    debug!("No videos for {} {}, using placeholder trailer", kind, id);
                    PLACEHOLDER_TRAILER_KEY.to_string()
                }
            },
            None => {
                warn!("Trailer lookup failed for {} {}, using placeholder", kind, id);
                PLACEHOLDER_TRAILER_KEY.to_string()
            }
        };
        Trailer::new(title, key)
    }
}
