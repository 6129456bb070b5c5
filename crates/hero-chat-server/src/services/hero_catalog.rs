use parking_lot::Mutex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::models::HeroRecord;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(String),

    #[error("hero API unreachable: {0}")]
    Unavailable(String),

    #[error("hero API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode hero API response: {0}")]
    Decode(String),
}

struct CachedCatalog {
    fetched_at: Instant,
    heroes: Arc<Vec<HeroRecord>>,
}

/// Read-only client for the OpenDota hero catalog.
///
/// Every lookup fetches the whole collection and filters locally. With a
/// `cache_ttl` the last successful fetch is reused until it expires.
pub struct HeroCatalog {
    client: Client,
    base_url: String,
    cache_ttl: Option<Duration>,
    cache: Mutex<Option<CachedCatalog>>,
}

impl HeroCatalog {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache_ttl: config.cache_ttl(),
            cache: Mutex::new(None),
        }
    }

    pub async fn fetch_all(&self) -> Result<Arc<Vec<HeroRecord>>, CatalogError> {
        if let Some(heroes) = self.cached() {
            debug!("Serving {} heroes from catalog cache", heroes.len());
            return Ok(heroes);
        }

        let heroes: Vec<HeroRecord> = self.get_json("/heroes").await?;
        debug!("Fetched {} heroes from upstream", heroes.len());
        let heroes = Arc::new(heroes);

        if self.cache_ttl.is_some() {
            *self.cache.lock() = Some(CachedCatalog {
                fetched_at: Instant::now(),
                heroes: heroes.clone(),
            });
        }

        Ok(heroes)
    }

    pub async fn fetch_by_id(&self, id: u32) -> Result<HeroRecord, CatalogError> {
        let heroes = self.fetch_all().await?;
        heroes
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("Hero with id {} not found", id)))
    }

    pub async fn fetch_by_localized_name(&self, name: &str) -> Result<HeroRecord, CatalogError> {
        let heroes = self.fetch_all().await?;
        heroes
            .iter()
            .find(|h| h.matches_name(name))
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("Hero '{}' not found", name)))
    }

    pub async fn fetch_by_role(&self, role: &str) -> Result<Vec<HeroRecord>, CatalogError> {
        let heroes = self.fetch_all().await?;
        let matched: Vec<HeroRecord> = heroes.iter().filter(|h| h.has_role(role)).cloned().collect();

        if matched.is_empty() {
            return Err(CatalogError::NotFound(format!("No heroes with role '{}'", role)));
        }
        Ok(matched)
    }

    /// Recent matches for a hero, returned as the upstream sent them.
    pub async fn fetch_matches(&self, id: u32) -> Result<serde_json::Value, CatalogError> {
        self.get_json(&format!("/heroes/{}/matches", id)).await
    }

    fn cached(&self) -> Option<Arc<Vec<HeroRecord>>> {
        let ttl = self.cache_ttl?;
        let cache = self.cache.lock();
        cache
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < ttl)
            .map(|c| c.heroes.clone())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("Hero API request to {} failed: {}", url, e);
            CatalogError::Unavailable(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog_json() -> serde_json::Value {
        json!([
            {
                "id": 1, "name": "npc_dota_hero_antimage", "localized_name": "Anti-Mage",
                "primary_attr": "agi", "attack_type": "Melee",
                "roles": ["Carry", "Escape", "Nuker"], "legs": 2
            },
            {
                "id": 14, "name": "npc_dota_hero_pudge", "localized_name": "Pudge",
                "primary_attr": "str", "attack_type": "Melee",
                "roles": ["Disabler", "Initiator", "Durable", "Nuker"], "legs": 2
            }
        ])
    }

    fn catalog_for(server: &MockServer, cache_ttl_seconds: u64) -> HeroCatalog {
        HeroCatalog::new(&UpstreamConfig {
            base_url: server.uri(),
            timeout_seconds: 5,
            cache_ttl_seconds,
        })
    }

    async fn mount_heroes(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/heroes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_name_lookup_is_case_insensitive() {
        let server = MockServer::start().await;
        mount_heroes(&server).await;
        let catalog = catalog_for(&server, 0);

        let upper = catalog.fetch_by_localized_name("PUDGE").await.unwrap();
        let lower = catalog.fetch_by_localized_name("pudge").await.unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.id, 14);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let server = MockServer::start().await;
        mount_heroes(&server).await;
        let catalog = catalog_for(&server, 0);

        assert_eq!(catalog.fetch_by_id(1).await.unwrap().localized_name, "Anti-Mage");
        assert!(matches!(catalog.fetch_by_id(999).await, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_role_filter() {
        let server = MockServer::start().await;
        mount_heroes(&server).await;
        let catalog = catalog_for(&server, 0);

        let nukers = catalog.fetch_by_role("nuker").await.unwrap();
        assert_eq!(nukers.len(), 2);

        let carries = catalog.fetch_by_role("CARRY").await.unwrap();
        assert_eq!(carries.len(), 1);
        assert_eq!(carries[0].id, 1);

        assert!(matches!(
            catalog.fetch_by_role("Jungler").await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_every_lookup_refetches_without_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/heroes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
            .expect(2)
            .mount(&server)
            .await;
        let catalog = catalog_for(&server, 0);

        catalog.fetch_all().await.unwrap();
        catalog.fetch_by_id(14).await.unwrap();
    }

    #[tokio::test]
    async fn test_cache_reuses_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/heroes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
            .expect(1)
            .mount(&server)
            .await;
        let catalog = catalog_for(&server, 60);

        catalog.fetch_all().await.unwrap();
        catalog.fetch_by_localized_name("anti-mage").await.unwrap();
        catalog.fetch_by_role("Durable").await.unwrap();
    }

    #[tokio::test]
    async fn test_upstream_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/heroes"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;
        let catalog = catalog_for(&server, 0);

        match catalog.fetch_all().await {
            Err(CatalogError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected result: {:?}", other.map(|h| h.len())),
        }
    }

    #[tokio::test]
    async fn test_connection_failure_is_unavailable() {
        let catalog = HeroCatalog::new(&UpstreamConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 2,
            cache_ttl_seconds: 0,
        });
        assert!(matches!(catalog.fetch_all().await, Err(CatalogError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_matches_pass_through() {
        let server = MockServer::start().await;
        let payload = json!([{ "match_id": 7_000_000_001u64, "radiant_win": true }]);
        Mock::given(method("GET"))
            .and(path("/heroes/14/matches"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
            .mount(&server)
            .await;
        let catalog = catalog_for(&server, 0);

        assert_eq!(catalog.fetch_matches(14).await.unwrap(), payload);
    }
}
