//! Synthetic rows shown when the catalog is unreachable.
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;

use crate::config::FallbackImages;
use crate::models::{CatalogRecord, MediaKind, Provenance, RecordId, PLACEHOLDER_TRAILER_KEY};

pub const ROW_SIZE: usize = 20;

const MOVIE_TITLES: [&str; 20] = [
    "The Dark Phoenix",
    "Midnight Runner",
    "Ocean's Revenge",
    "Storm Rising",
    "Silent Hunter",
    "The Last Stand",
    "Crimson Dawn",
    "Steel Thunder",
    "Shadow Protocol",
    "Neon Nights",
    "Blood Moon",
    "Fire Storm",
    "Ice Cold",
    "Dark Matter",
    "Star Crossed",
    "Time Shift",
    "Ghost Protocol",
    "Black Widow",
    "Iron Thunder",
    "Silver Bullet",
];

const TV_TITLES: [&str; 20] = [
    "Detective Stories",
    "City Lights",
    "Family Matters",
    "The Investigation",
    "Modern Times",
    "Dark Secrets",
    "Love Actually",
    "Crime Scene",
    "The Office Hours",
    "Night Shift",
    "Breaking News",
    "Time Travel",
    "Mystery Files",
    "The Hospital",
    "School Days",
    "Adventure Time",
    "Comedy Central",
    "Drama Queens",
    "Action Heroes",
    "Sci-Fi Chronicles",
];

const RELEASE_YEARS: [&str; 4] = ["2020", "2021", "2022", "2023"];
const MIN_RATING: f32 = 6.0;
const MAX_RATING: f32 = 10.0;

pub fn titles(kind: MediaKind) -> &'static [&'static str] {
    match kind {
        MediaKind::Movie => &MOVIE_TITLES,
        MediaKind::Tv => &TV_TITLES,
    }
}

#[derive(Debug, Clone)]
pub struct PlaceholderGenerator {
    images: Arc<FallbackImages>,
}

impl PlaceholderGenerator {
    pub fn new(images: Arc<FallbackImages>) -> Self {
        Self { images }
    }

    /// `count` synthetic records; ids are unique within the batch only.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        kind: MediaKind,
        count: usize,
        rng: &mut R,
    ) -> Vec<CatalogRecord> {
        let base_id = Utc::now().timestamp_millis();
        self.generate_from(base_id, kind, count, rng)
    }

    pub fn generate_from<R: Rng + ?Sized>(
        &self,
        base_id: i64,
        kind: MediaKind,
        count: usize,
        rng: &mut R,
    ) -> Vec<CatalogRecord> {
        let titles = titles(kind);
        (0..count)
            .map(|i| {
                let rating = rng.random_range(MIN_RATING..=MAX_RATING);
                let year = RELEASE_YEARS[rng.random_range(0..RELEASE_YEARS.len())];
                CatalogRecord {
                    id: RecordId::Int(base_id.wrapping_add(i as i64)),
                    title: titles[i % titles.len()].to_string(),
                    overview: format!(
                        "An incredible {kind} that will keep you on the edge of your seat. \
                         A must-watch experience filled with thrilling moments and unforgettable characters."
                    ),
                    poster: self.images.poster_at(i).to_string(),
                    backdrop: self.images.hero_at(i).to_string(),
                    rating: ((rating * 10.0).round() / 10.0).clamp(MIN_RATING, MAX_RATING),
                    release_date: year.to_string(),
                    media_kind: kind,
                    trailer: Some(PLACEHOLDER_TRAILER_KEY.to_string()),
                    provenance: Provenance::Placeholder,
                }
            })
            .collect()
    }
}
