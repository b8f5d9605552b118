use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::models::RecordId;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/original";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_PORT: u16 = 3147;

const HERO_IMAGES: [&str; 3] = [
    "https://images.unsplash.com/photo-1509347528160-9a9e33742cdb",
    "https://images.pexels.com/photos/7149329/pexels-photo-7149329.jpeg",
    "https://images.unsplash.com/photo-1489599849927-2ee91cede3ba",
];

const POSTER_IMAGES: [&str; 9] = [
    "https://images.unsplash.com/photo-1590179068383-b9c69aacebd3",
    "https://images.pexels.com/photos/6091649/pexels-photo-6091649.jpeg",
    "https://images.pexels.com/photos/9944851/pexels-photo-9944851.jpeg",
    "https://images.pexels.com/photos/1358833/pexels-photo-1358833.jpeg",
    "https://images.pexels.com/photos/5407939/pexels-photo-5407939.jpeg",
    "https://images.unsplash.com/photo-1511406361295-0a1ff814c0ce",
    "https://images.pexels.com/photos/4551914/pexels-photo-4551914.jpeg",
    "https://images.pexels.com/photos/19046437/pexels-photo-19046437.jpeg",
    "https://images.pexels.com/photos/6659571/pexels-photo-6659571.jpeg",
];

/// Static images used when the catalog has no artwork for a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackImages {
    hero: Vec<String>,
    poster: Vec<String>,
}

impl FallbackImages {
    /// Both sets must be non-empty.
    pub fn new(hero: Vec<String>, poster: Vec<String>) -> Result<Self> {
        if hero.is_empty() || poster.is_empty() {
            anyhow::bail!("fallback image sets must not be empty");
        }
        Ok(Self { hero, poster })
    }

    pub fn hero_at(&self, index: usize) -> &str {
        &self.hero[index % self.hero.len()]
    }

    pub fn poster_at(&self, index: usize) -> &str {
        &self.poster[index % self.poster.len()]
    }

    pub fn hero_for(&self, id: &RecordId) -> &str {
        self.hero_at(id.bucket(self.hero.len()))
    }

    pub fn poster_for(&self, id: &RecordId) -> &str {
        self.poster_at(id.bucket(self.poster.len()))
    }
}

impl Default for FallbackImages {
    fn default() -> Self {
        Self {
            hero: HERO_IMAGES.iter().map(|s| s.to_string()).collect(),
            poster: POSTER_IMAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub poster_base: String,
    pub backdrop_base: String,
    pub debounce: Duration,
    pub port: u16,
    pub fallback_images: FallbackImages,
}

impl CatalogConfig {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys,
            base_url: DEFAULT_BASE_URL.to_string(),
            poster_base: DEFAULT_POSTER_BASE.to_string(),
            backdrop_base: DEFAULT_BACKDROP_BASE.to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            port: DEFAULT_PORT,
            fallback_images: FallbackImages::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let raw_keys = env::var("CATALOG_API_KEYS").context("CATALOG_API_KEYS not set")?;
        let api_keys = parse_key_list(&raw_keys);
        if api_keys.is_empty() {
            anyhow::bail!("CATALOG_API_KEYS must contain at least one key");
        }

        let mut config = Self::new(api_keys);
        if let Some(v) = non_empty_var("CATALOG_BASE_URL") {
            config.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty_var("CATALOG_POSTER_BASE") {
            config.poster_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty_var("CATALOG_BACKDROP_BASE") {
            config.backdrop_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty_var("SEARCH_DEBOUNCE_MS") {
            let ms: u64 = v
                .parse()
                .with_context(|| format!("SEARCH_DEBOUNCE_MS is not a number: {v}"))?;
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(v) = non_empty_var("CINEFRONT_PORT") {
            config.port = v
                .parse()
                .with_context(|| format!("CINEFRONT_PORT is not a valid port: {v}"))?;
        }
        config.fallback_images = fallback_images_from(
            non_empty_var("FALLBACK_HERO_IMAGES").as_deref(),
            non_empty_var("FALLBACK_POSTER_IMAGES").as_deref(),
        )?;
        Ok(config)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Comma-separated overrides for either image set; an unset set keeps its default.
pub fn fallback_images_from(hero: Option<&str>, poster: Option<&str>) -> Result<FallbackImages> {
    let defaults = FallbackImages::default();
    FallbackImages::new(
        hero.map(parse_key_list).unwrap_or(defaults.hero),
        poster.map(parse_key_list).unwrap_or(defaults.poster),
    )
    .context("FALLBACK_HERO_IMAGES / FALLBACK_POSTER_IMAGES must list at least one URL")
}

pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_key_list() {
        assert_eq!(parse_key_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_key_list(" , ").is_empty());
    }

    #[test]
    fn fallback_selection_is_deterministic() {
        let images = FallbackImages::default();
        let id = RecordId::Int(603);
        assert_eq!(images.poster_for(&id), images.poster_for(&id));
        assert_eq!(images.poster_for(&id), POSTER_IMAGES[603 % 9]);
        assert_eq!(images.hero_for(&id), HERO_IMAGES[0]);

        let text = RecordId::Text("abc".to_string());
        assert_eq!(images.hero_for(&text), images.hero_for(&text));
    }

    #[test]
    fn image_overrides_replace_only_the_given_set() {
        let images = fallback_images_from(Some("https://img/a.jpg, https://img/b.jpg"), None).unwrap();
        assert_eq!(images.hero_at(0), "https://img/a.jpg");
        assert_eq!(images.hero_at(3), "https://img/b.jpg");
        assert_eq!(images.poster_at(1), POSTER_IMAGES[1]);

        assert_eq!(fallback_images_from(None, None).unwrap(), FallbackImages::default());
        assert!(fallback_images_from(None, Some(" , ")).is_err());
    }

    #[test]
    fn rejects_empty_image_sets() {
        assert!(FallbackImages::new(vec![], vec!["p".to_string()]).is_err());
        assert!(FallbackImages::new(vec!["h".to_string()], vec![]).is_err());
    }
}
