use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::fetcher::ScheduleFetcher;

/// Regions keyed by the two-digit prefix of a city id.
const REGIONS: [(&str, &str); 34] = [
    ("01", "ACEH"),
    ("02", "SUMATERA UTARA"),
    ("03", "SUMATERA BARAT"),
    ("04", "RIAU"),
    ("05", "KEPULAUAN RIAU"),
    ("06", "JAMBI"),
    ("07", "BENGKULU"),
    ("08", "SUMATERA SELATAN"),
    ("09", "BANGKA BELITUNG"),
    ("10", "LAMPUNG"),
    ("11", "BANTEN"),
    ("12", "JAWA BARAT"),
    ("13", "DKI JAKARTA"),
    ("14", "JAWA TENGAH"),
    ("15", "DI YOGYAKARTA"),
    ("16", "JAWA TIMUR"),
    ("17", "BALI"),
    ("18", "NUSA TENGGARA BARAT"),
    ("19", "NUSA TENGGARA TIMUR"),
    ("20", "KALIMANTAN BARAT"),
    ("21", "KALIMANTAN SELATAN"),
    ("22", "KALIMANTAN TENGAH"),
    ("23", "KALIMANTAN TIMUR"),
    ("24", "KALIMANTAN UTARA"),
    ("25", "GORONTALO"),
    ("26", "SULAWESI SELATAN"),
    ("27", "SULAWESI TENGGARA"),
    ("28", "SULAWESI TENGAH"),
    ("29", "SULAWESI UTARA"),
    ("30", "SULAWESI BARAT"),
    ("31", "MALUKU"),
    ("32", "MALUKU UTARA"),
    ("33", "PAPUA"),
    ("34", "PAPUA BARAT"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    #[serde(rename = "lokasi")]
    pub label: String,
}

impl City {
    /// Empty when the id prefix is not a known region.
    pub fn region(&self) -> &'static str {
        region_for(&self.id)
    }
}

pub fn region_for(city_id: &str) -> &'static str {
    REGIONS
        .iter()
        .find(|(prefix, _)| city_id.starts_with(prefix))
        .map(|(_, name)| *name)
        .unwrap_or("")
}

/// City list from the location endpoint, loaded once and reloaded on demand
/// when empty.
pub struct LocationDirectory {
    fetcher: ScheduleFetcher,
    cities: RwLock<Vec<City>>,
}

impl LocationDirectory {
    pub fn new(fetcher: ScheduleFetcher) -> Self {
        Self {
            fetcher,
            cities: RwLock::new(Vec::new()),
        }
    }

    pub fn with_cities(fetcher: ScheduleFetcher, cities: Vec<City>) -> Self {
        Self {
            fetcher,
            cities: RwLock::new(cities),
        }
    }

    pub async fn load(&self) -> Result<usize> {
        let cities = self.fetcher.fetch_locations().await?;
        let count = cities.len();
        *self.cities.write().await = cities;
        info!(count, "location list loaded");
        Ok(count)
    }

    /// Reload once if nothing has been loaded yet.
    pub async fn ensure_loaded(&self) -> Result<()> {
        if !self.cities.read().await.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.load().await {
            warn!(error = %e, "location list reload failed");
        }
        if self.cities.read().await.is_empty() {
            return Err(AppError::LocationError("location list is not available".to_string()));
        }
        Ok(())
    }

    pub async fn regions(&self) -> Vec<String> {
        let cities = self.cities.read().await;
        cities
            .iter()
            .map(City::region)
            .filter(|region| !region.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub async fn cities_in(&self, region: &str) -> Vec<City> {
        let cities = self.cities.read().await;
        let mut matching: Vec<City> = cities
            .iter()
            .filter(|c| !region.is_empty() && c.region() == region)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.label.cmp(&b.label));
        matching
    }

    pub async fn find(&self, region: &str, city_id: &str) -> Option<City> {
        self.cities_in(region)
            .await
            .into_iter()
            .find(|c| c.id == city_id)
    }
}
