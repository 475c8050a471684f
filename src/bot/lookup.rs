//! Item database lookups against an XIVAPI-compatible service.
//!
//! Two-step fetch: a free-text search (fuzzy matching is the service's
//! problem) resolves the item id, then the detail endpoint supplies name,
//! item level, crafting requirement and icon. Lookups are best-effort: on a
//! miss, a timeout or any transport failure the original query text is
//! returned verbatim so the chat command never fails outright.

use anyhow::{anyhow, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::config::LookupConfig;

/// Search endpoint response
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "Results", default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Item detail endpoint response (the columns we ask for)
#[derive(Debug, Deserialize)]
pub struct ItemDetail {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "LevelItem")]
    pub item_level: Option<i64>,
    #[serde(rename = "Icon")]
    pub icon: Option<String>,
    #[serde(rename = "Recipes", default)]
    pub recipes: Vec<RecipeRef>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeRef {
    #[serde(rename = "ClassJobID")]
    pub class_job_id: i64,
    #[serde(rename = "Level")]
    pub level: i64,
}

/// Crafting job names for the ClassJobID values the item database hands back.
fn class_job_name(id: i64) -> &'static str {
    match id {
        8 => "Carpenter",
        9 => "Blacksmith",
        10 => "Armorer",
        11 => "Goldsmith",
        12 => "Leatherworker",
        13 => "Weaver",
        14 => "Alchemist",
        15 => "Culinarian",
        _ => "Unknown job",
    }
}

#[derive(Debug, Clone)]
struct LookupCacheEntry {
    fetched_at: Instant,
    query: String,
    rendered: String,
}

/// Item lookup service with a single-entry cache for the most recent query.
pub struct ItemLookup {
    config: LookupConfig,
    cache: Option<LookupCacheEntry>,
    client: reqwest::Client,
}

impl ItemLookup {
    pub fn new(config: LookupConfig) -> Self {
        Self {
            config,
            cache: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Look up `query` and return a rendered reply. Degrades to echoing the
    /// query when the service is disabled or nothing is found.
    pub async fn lookup(&mut self, query: &str) -> String {
        if !self.config.enabled {
            debug!("item lookup disabled; echoing query");
            return query.to_string();
        }

        if let Some(cache) = &self.cache {
            if cache.query.eq_ignore_ascii_case(query) {
                let ttl = Duration::from_secs(self.config.cache_ttl_minutes as u64 * 60);
                if cache.fetched_at.elapsed() < ttl {
                    debug!("returning cached item lookup for '{query}'");
                    return cache.rendered.clone();
                }
            }
        }

        match self.fetch(query).await {
            Ok(Some(rendered)) => {
                self.cache = Some(LookupCacheEntry {
                    fetched_at: Instant::now(),
                    query: query.to_string(),
                    rendered: rendered.clone(),
                });
                rendered
            }
            Ok(None) => {
                debug!("item lookup miss for '{query}'");
                query.to_string()
            }
            Err(e) => {
                warn!("item lookup failed for '{query}': {e}");
                query.to_string()
            }
        }
    }

    async fn fetch(&self, query: &str) -> Result<Option<String>> {
        let hit = match self.search(query).await? {
            Some(hit) => hit,
            None => return Ok(None),
        };
        let detail = self.detail(hit.id).await?;
        Ok(Some(render_item(&detail)))
    }

    async fn search(&self, query: &str) -> Result<Option<SearchHit>> {
        let url = self.search_url(query);
        let response: SearchResponse = self.get_json(&url).await?;
        Ok(response.results.into_iter().next())
    }

    async fn detail(&self, id: u64) -> Result<ItemDetail> {
        let url = self.detail_url(id);
        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("item lookup GET {url}");
        let request = self.client.get(url);
        let timeout_duration = Duration::from_secs(self.config.timeout_seconds as u64);

        let response = timeout(timeout_duration, request.send())
            .await
            .map_err(|_| anyhow!("request timeout after {}s", self.config.timeout_seconds))?
            .map_err(|e| anyhow!("HTTP request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("API returned status: {}", response.status()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| anyhow!("failed to parse JSON response: {e}"))
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?indexes=Item&string={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }

    pub fn detail_url(&self, id: u64) -> String {
        format!(
            "{}/Item/{}?columns=Name,LevelItem,Icon,Recipes",
            self.config.base_url.trim_end_matches('/'),
            id
        )
    }

    pub fn clear_cache(&mut self) {
        self.cache = None;
    }
}

/// Render item detail into a single chat line.
fn render_item(detail: &ItemDetail) -> String {
    let mut out = detail.name.clone();
    if let Some(level) = detail.item_level {
        out.push_str(&format!(" (ilvl {level})"));
    }
    if let Some(recipe) = detail.recipes.first() {
        out.push_str(&format!(
            ", crafted by {} Lv.{}",
            class_job_name(recipe.class_job_id),
            recipe.level
        ));
    }
    if let Some(icon) = &detail.icon {
        out.push_str(&format!(" [icon: {icon}]"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(enabled: bool) -> ItemLookup {
        ItemLookup::new(LookupConfig {
            enabled,
            ..LookupConfig::default()
        })
    }

    #[tokio::test]
    async fn disabled_lookup_echoes_query() {
        let mut svc = service(false);
        assert_eq!(svc.lookup("dark matter").await, "dark matter");
    }

    #[test]
    fn search_url_encodes_query() {
        let svc = service(true);
        assert_eq!(
            svc.search_url("oak lumber"),
            "https://xivapi.com/search?indexes=Item&string=oak%20lumber"
        );
    }

    #[test]
    fn detail_url_selects_columns() {
        let svc = service(true);
        assert_eq!(
            svc.detail_url(42),
            "https://xivapi.com/Item/42?columns=Name,LevelItem,Icon,Recipes"
        );
    }

    #[test]
    fn renders_full_detail() {
        let detail = ItemDetail {
            name: "Oak Lumber".into(),
            item_level: Some(25),
            icon: Some("/i/022000/022500.png".into()),
            recipes: vec![RecipeRef {
                class_job_id: 8,
                level: 23,
            }],
        };
        assert_eq!(
            render_item(&detail),
            "Oak Lumber (ilvl 25), crafted by Carpenter Lv.23 [icon: /i/022000/022500.png]"
        );
    }

    #[test]
    fn renders_sparse_detail() {
        let detail = ItemDetail {
            name: "Dark Matter".into(),
            item_level: None,
            icon: None,
            recipes: vec![],
        };
        assert_eq!(render_item(&detail), "Dark Matter");
    }
}
