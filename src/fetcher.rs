use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::locations::City;
use crate::prayer::PrayerSchedule;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(4)
        .build()
        .unwrap_or_else(|_| Client::new())
});

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: bool,
    data: Option<T>,
}

#[derive(Deserialize)]
struct ScheduleData {
    jadwal: Option<PrayerSchedule>,
}

/// Client for the public prayer schedule API. Performs exactly one request
/// per call; retry policy belongs to the caller.
#[derive(Clone, Debug)]
pub struct ScheduleFetcher {
    base_url: String,
}

impl ScheduleFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn schedule_url(&self, location_id: &str, date: NaiveDate) -> String {
        format!(
            "{}/jadwal/{}/{}/{:02}/{:02}",
            self.base_url,
            location_id,
            date.year(),
            date.month(),
            date.day()
        )
    }

    pub async fn fetch_schedule(&self, location_id: &str, date: NaiveDate) -> Result<PrayerSchedule> {
        let url = self.schedule_url(location_id, date);
        info!(location_id, %date, "fetching prayer schedule");

        let envelope: Envelope<ScheduleData> = get_json(&url).await?;
        if !envelope.status {
            return Err(AppError::ProtocolError("schedule API reported failure".to_string()));
        }

        let schedule = envelope
            .data
            .and_then(|data| data.jadwal)
            .ok_or_else(|| AppError::ProtocolError("response has no schedule".to_string()))?;

        debug!(?schedule, "schedule fetched");
        Ok(schedule)
    }

    pub async fn fetch_locations(&self) -> Result<Vec<City>> {
        let url = format!("{}/kota/semua", self.base_url);
        info!("fetching location list");

        let envelope: Envelope<Vec<City>> = get_json(&url).await?;
        if !envelope.status {
            return Err(AppError::ProtocolError("location API reported failure".to_string()));
        }

        envelope
            .data
            .ok_or_else(|| AppError::ProtocolError("response has no location list".to_string()))
    }
}

async fn get_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T> {
    let response = CLIENT.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(AppError::ProtocolError(format!("HTTP {}: {}", status.as_u16(), body)));
    }

    Ok(serde_json::from_str(&body)?)
}
