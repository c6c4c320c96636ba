//! Fetch-with-cache read path for today's schedule.
//!
//! Order of preference: today's entry for the requested location, a fresh
//! fetch, any previously cached entry, nothing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::{AppError, Result};
use crate::fetcher::ScheduleFetcher;
use crate::prayer::PrayerSchedule;
use crate::presenter::{NoticeLevel, Presenter};
use crate::store::{StateStore, SCHEDULE_CACHE_KEY};
use crate::time::date_key;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSchedule {
    pub date: String,
    pub location_id: String,
    pub timings: PrayerSchedule,
}

impl CachedSchedule {
    pub fn matches(&self, date: &str, location_id: &str) -> bool {
        self.date == date && self.location_id == location_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleOrigin {
    /// Today's entry for the requested location.
    Cached,
    Fetched,
    /// Fetch failed; an entry for another date or location was reused.
    Stale,
}

#[derive(Debug, Clone)]
pub struct ScheduleLookup {
    pub schedule: PrayerSchedule,
    pub origin: ScheduleOrigin,
}

#[derive(Clone)]
pub struct ScheduleCache {
    fetcher: ScheduleFetcher,
    store: StateStore,
    presenter: Arc<Presenter>,
}

impl ScheduleCache {
    pub fn new(fetcher: ScheduleFetcher, store: StateStore, presenter: Arc<Presenter>) -> Self {
        Self {
            fetcher,
            store,
            presenter,
        }
    }

    pub fn cached(&self) -> Option<CachedSchedule> {
        self.store.get(SCHEDULE_CACHE_KEY)
    }

    /// `Err(NoDataAvailable)` only when the fetch failed and nothing was
    /// ever cached.
    pub async fn get_today_schedule(&self, location_id: &str, today: NaiveDate) -> Result<ScheduleLookup> {
        let date = date_key(today);
        if let Some(cached) = self.cached().filter(|c| c.matches(&date, location_id)) {
            debug!(location_id, date = %date, "using cached schedule for today");
            return Ok(ScheduleLookup {
                schedule: cached.timings,
                origin: ScheduleOrigin::Cached,
            });
        }

        self.fetch_or_fallback(location_id, today).await
    }

    /// Like [`get_today_schedule`](Self::get_today_schedule) but always
    /// goes to the network first.
    pub async fn refresh(&self, location_id: &str, today: NaiveDate) -> Result<ScheduleLookup> {
        self.fetch_or_fallback(location_id, today).await
    }

    async fn fetch_or_fallback(&self, location_id: &str, today: NaiveDate) -> Result<ScheduleLookup> {
        match self.fetcher.fetch_schedule(location_id, today).await {
            Ok(timings) => {
                let entry = CachedSchedule {
                    date: date_key(today),
                    location_id: location_id.to_string(),
                    timings,
                };
                if let Err(e) = self.store.update(SCHEDULE_CACHE_KEY, &entry) {
                    error!(error = %e, "failed to persist schedule cache");
                }
                Ok(ScheduleLookup {
                    schedule: entry.timings,
                    origin: ScheduleOrigin::Fetched,
                })
            }
            Err(e) => {
                warn!(location_id, error = %e, "schedule fetch failed");
                match self.cached() {
                    Some(stale) => {
                        self.presenter.notify(
                            NoticeLevel::Warning,
                            format!(
                                "Could not fetch a new schedule. Using cached data from {} (location {}).",
                                stale.date, stale.location_id
                            ),
                        );
                        Ok(ScheduleLookup {
                            schedule: stale.timings,
                            origin: ScheduleOrigin::Stale,
                        })
                    }
                    None => {
                        warn!(location_id, "no cached schedule to fall back to");
                        Err(AppError::NoDataAvailable)
                    }
                }
            }
        }
    }
}
