use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trailer key used whenever no real video can be found.
pub const PLACEHOLDER_TRAILER_KEY: &str = "dQw4w9WgXcQ";

const EMBED_BASE: &str = "https://www.youtube.com/embed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    /// Kind from the wire `media_type`, falling back to "has a title means movie".
    /// Returns `None` for media types that are not displayable (e.g. `person`).
    pub fn infer(media_type: Option<&str>, has_title: bool) -> Option<Self> {
        match media_type {
            Some(t) => t.parse().ok(),
            None if has_title => Some(MediaKind::Movie),
            None => Some(MediaKind::Tv),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "tv" => Ok(MediaKind::Tv),
            _ => Err(anyhow::anyhow!("media kind must be 'movie' or 'tv'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Stable bucket index for picking a fallback image.
    pub fn bucket(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        match self {
            RecordId::Int(n) => n.rem_euclid(len as i64) as usize,
            RecordId::Text(s) => (fnv1a(s.as_bytes()) % len as u64) as usize,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Text(s.trim().to_string()),
        })
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Catalog,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: RecordId,
    pub title: String,
    pub overview: String,
    pub poster: String,
    pub backdrop: String,
    pub rating: f32,
    pub release_date: String,
    pub media_kind: MediaKind,
    pub trailer: Option<String>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub official: Option<bool>,
}

impl VideoEntry {
    pub fn is_youtube_trailer(&self) -> bool {
        self.kind == "Trailer" && self.site.eq_ignore_ascii_case("YouTube")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    pub title: String,
    pub key: String,
    pub embed_url: String,
}

impl Trailer {
    pub fn new(title: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            title: title.into(),
            embed_url: embed_url(&key),
            key,
        }
    }
}

pub fn embed_url(key: &str) -> String {
    format!("{EMBED_BASE}/{}?autoplay=1", urlencoding::encode(key))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeScreen {
    pub featured: Option<CatalogRecord>,
    pub trending: Vec<CatalogRecord>,
    pub popular: Vec<CatalogRecord>,
    pub top_rated: Vec<CatalogRecord>,
    pub upcoming: Vec<CatalogRecord>,
    pub tv_shows: Vec<CatalogRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<CatalogRecord>,
}
