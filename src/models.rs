use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // First 4-digit run in a card subtitle like "2023 / 美国 / 剧情"
    static ref YEAR_RE: Regex = Regex::new(r"(\d{4})").unwrap();
}

// Upstream category listing format
#[derive(Deserialize, Debug)]
pub struct CategoryApiResponse {
    pub total: u32,
    pub items: Vec<CategoryApiItem>,
}

#[derive(Deserialize, Debug)]
pub struct CategoryApiItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub card_subtitle: Option<String>,
    #[serde(default)]
    pub pic: Option<Pic>,
    #[serde(default)]
    pub rating: Option<Rating>,
}

#[derive(Deserialize, Debug)]
pub struct Pic {
    #[serde(default)]
    pub large: String,
    #[serde(default)]
    pub normal: String,
}

#[derive(Deserialize, Debug)]
pub struct Rating {
    #[serde(default)]
    pub value: f64,
}

// Flattened item served to clients
#[derive(Serialize, Debug, PartialEq)]
pub struct VideoItem {
    pub id: String,
    pub title: String,
    pub poster: String,
    pub rate: String,
    pub year: String,
}

impl From<CategoryApiItem> for VideoItem {
    fn from(item: CategoryApiItem) -> Self {
        let poster = item
            .pic
            .map(|pic| {
                if !pic.normal.is_empty() {
                    pic.normal
                } else {
                    pic.large
                }
            })
            .unwrap_or_default();

        let rate = item
            .rating
            .filter(|rating| rating.value > 0.0)
            .map(|rating| format!("{:.1}", rating.value))
            .unwrap_or_default();

        let year = item
            .card_subtitle
            .as_deref()
            .and_then(|subtitle| YEAR_RE.find(subtitle))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        Self {
            id: item.id,
            title: item.title,
            poster,
            rate,
            year,
        }
    }
}

// Success envelope for the categories route
#[derive(Serialize, Debug)]
pub struct CategoryResult {
    pub code: u16,
    pub message: String,
    pub list: Vec<VideoItem>,
}

// Error envelope for the categories route
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub retry_suggested: bool,
}
