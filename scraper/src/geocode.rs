//! Normalises free-form location strings to `City - UF` via Nominatim.

use std::num::NonZeroUsize;

use lru::LruCache;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::FetchError;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

pub trait GeoLookup {
    /// `Ok(None)` when the service knows no such place.
    fn lookup(&self, query: &str) -> Result<Option<String>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct Place {
    #[serde(default)]
    address: Address,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    #[serde(rename = "ISO3166-2-lvl4")]
    iso_state: Option<String>,
}

impl Address {
    fn display(self) -> Option<String> {
        let uf = self
            .iso_state
            .as_deref()
            .and_then(|code| code.strip_prefix("BR-"))
            .map(str::to_string);
        match (self.city.or(self.town).or(self.village), uf) {
            (Some(city), Some(uf)) => Some(format!("{city} - {uf}")),
            (Some(city), None) => Some(city),
            (None, Some(uf)) => Some(uf),
            (None, None) => self.state,
        }
    }
}

/// Display form of the first place in a Nominatim `format=json` body.
pub fn parse_places(body: &str) -> Result<Option<String>, serde_json::Error> {
    let places: Vec<Place> = serde_json::from_str(body)?;
    Ok(places.into_iter().next().and_then(|place| place.address.display()))
}

pub struct NominatimLookup {
    client: Client,
    base_url: String,
}

impl NominatimLookup {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

impl GeoLookup for NominatimLookup {
    fn lookup(&self, query: &str) -> Result<Option<String>, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("countrycodes", "br"),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.base_url.clone(),
            });
        }
        Ok(parse_places(&response.text()?)?)
    }
}

/// Lookup with a bounded memo. Misses are cached too; failures are not.
pub struct Geocoder {
    lookup: Box<dyn GeoLookup>,
    cache: LruCache<String, Option<String>>,
}

impl Geocoder {
    pub fn new(lookup: Box<dyn GeoLookup>, capacity: NonZeroUsize) -> Self {
        Self {
            lookup,
            cache: LruCache::new(capacity),
        }
    }

    /// Canonical form of `location`, or `None` to keep what we have.
    pub fn resolve(&mut self, location: &str) -> Option<String> {
        let key = location.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        match self.lookup.lookup(location.trim()) {
            Ok(found) => {
                debug!(location, resolved = ?found, "geocoded");
                self.cache.put(key, found.clone());
                found
            }
            Err(e) => {
                warn!(location, error = %e, "⚠️ Geocoding failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingLookup {
        calls: Rc<Cell<u32>>,
        fail: bool,
    }

    impl GeoLookup for CountingLookup {
        fn lookup(&self, query: &str) -> Result<Option<String>, FetchError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(FetchError::Empty(query.to_string()));
            }
            Ok((query == "Campinas").then(|| "Campinas - SP".to_string()))
        }
    }

    fn geocoder(fail: bool) -> (Geocoder, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let lookup = CountingLookup {
            calls: Rc::clone(&calls),
            fail,
        };
        let capacity = NonZeroUsize::new(8).unwrap();
        (Geocoder::new(Box::new(lookup), capacity), calls)
    }

    #[test]
    fn test_parse_places() {
        let body = r#"[{"display_name": "Campinas, SP", "address": {
            "city": "Campinas", "state": "São Paulo", "ISO3166-2-lvl4": "BR-SP", "country": "Brasil"
        }}]"#;
        assert_eq!(parse_places(body).unwrap(), Some("Campinas - SP".to_string()));

        let town = r#"[{"address": {"town": "Holambra", "state": "São Paulo"}}]"#;
        assert_eq!(parse_places(town).unwrap(), Some("Holambra".to_string()));

        assert_eq!(parse_places("[]").unwrap(), None);
        assert!(parse_places("{").is_err());
    }

    #[test]
    fn test_resolve_caches_hits_and_misses() {
        let (mut geocoder, calls) = geocoder(false);
        assert_eq!(geocoder.resolve("Campinas"), Some("Campinas - SP".to_string()));
        assert_eq!(geocoder.resolve("  campinas "), Some("Campinas - SP".to_string()));
        assert_eq!(geocoder.resolve("Atlântida"), None);
        assert_eq!(geocoder.resolve("Atlântida"), None);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_resolve_does_not_cache_failures() {
        let (mut geocoder, calls) = geocoder(true);
        assert_eq!(geocoder.resolve("Campinas"), None);
        assert_eq!(geocoder.resolve("Campinas"), None);
        assert_eq!(calls.get(), 2);
        assert_eq!(geocoder.resolve("   "), None);
        assert_eq!(calls.get(), 2);
    }
}
