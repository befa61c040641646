use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Rating table (one row per user, one column per dish)
    #[serde(default = "default_ratings_path")]
    pub ratings_path: PathBuf,

    /// Dish inventory table (ingredient and meal-time flags)
    #[serde(default = "default_inventory_path")]
    pub inventory_path: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of dishes returned per recommendation request
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Neighbors touched by a selection and explored by the fallback
    #[serde(default = "default_neighborhood_size")]
    pub neighborhood_size: usize,
}

fn default_ratings_path() -> PathBuf {
    PathBuf::from("data/ratings.csv")
}

fn default_inventory_path() -> PathBuf {
    PathBuf::from("data/dish_inventory.csv")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_recommendation_limit() -> usize {
    5
}

fn default_neighborhood_size() -> usize {
    5
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the web shell binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
