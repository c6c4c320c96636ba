//! User-initiated actions: show the schedule, pick a location, edit
//! settings. Failures here are surfaced as notices, once per action.

use chrono::Local;
use tracing::{error, info};

use crate::api::models::{ScheduleEntry, ScheduleView};
use crate::config::{ReminderSettings, SettingsUpdate};
use crate::error::{AppError, Result};
use crate::locations::City;
use crate::prayer::Prayer;
use crate::presenter::NoticeLevel;
use crate::store::SETTINGS_KEY;
use crate::time::date_key;
use crate::AppState;

pub async fn show_today_schedule(state: &AppState) -> Result<ScheduleView> {
    let settings = state.current_settings();
    let today = Local::now().date_naive();

    let lookup = match state
        .cache
        .get_today_schedule(&settings.location_id, today)
        .await
    {
        Ok(lookup) => lookup,
        Err(e) => {
            state
                .presenter
                .notify(NoticeLevel::Error, "Could not retrieve the prayer schedule.");
            return Err(e);
        }
    };

    let date = date_key(today);
    let entries: Vec<ScheduleEntry> = Prayer::ALL
        .iter()
        .map(|prayer| ScheduleEntry {
            prayer: *prayer,
            name: prayer.display_name().to_string(),
            time: lookup.schedule.get(*prayer).map(str::to_string),
        })
        .collect();

    let text = format_schedule_text(&settings, &date, &entries);
    Ok(ScheduleView {
        location_label: settings.location_label,
        region_label: settings.region_label,
        date,
        origin: lookup.origin,
        entries,
        text,
    })
}

pub fn format_schedule_text(settings: &ReminderSettings, date: &str, entries: &[ScheduleEntry]) -> String {
    let mut lines = vec![
        format!("Prayer Schedule - {}", settings.location_label),
        settings.region_label.clone(),
        format!("Date: {}", date),
        String::new(),
    ];
    for entry in entries {
        lines.push(format!("{}: {}", entry.name, entry.time.as_deref().unwrap_or("N/A")));
    }
    lines.join("\n")
}

pub async fn list_regions(state: &AppState) -> Result<Vec<String>> {
    ensure_locations(state).await?;
    Ok(state.locations.regions().await)
}

pub async fn list_cities(state: &AppState, region: &str) -> Result<Vec<City>> {
    ensure_locations(state).await?;
    let cities = state.locations.cities_in(region).await;
    if cities.is_empty() {
        return Err(AppError::LocationError(format!("unknown region: {}", region)));
    }
    Ok(cities)
}

/// Second step of the picker: applies the chosen city and restarts the
/// scheduler through the settings channel.
pub async fn select_location(state: &AppState, region: &str, city_id: &str) -> Result<ReminderSettings> {
    ensure_locations(state).await?;
    let city = state
        .locations
        .find(region, city_id)
        .await
        .ok_or_else(|| AppError::LocationError(format!("no city {} in {}", city_id, region)))?;

    let mut settings = state.current_settings();
    settings.location_id = city.id.clone();
    settings.location_label = city.label.clone();
    settings.region_label = region.to_string();
    apply_settings(state, settings.clone())?;

    state.presenter.notify(
        NoticeLevel::Info,
        format!("Location set: {}, {}", city.label, region),
    );
    Ok(settings)
}

pub fn update_settings(state: &AppState, update: &SettingsUpdate) -> Result<ReminderSettings> {
    let mut settings = state.current_settings();
    update.apply(&mut settings);
    apply_settings(state, settings.clone())?;
    Ok(settings)
}

fn apply_settings(state: &AppState, settings: ReminderSettings) -> Result<()> {
    state.store.update(SETTINGS_KEY, &settings)?;
    info!(location_id = %settings.location_id, enabled = settings.enabled, "settings updated");
    state.settings.send_replace(settings);
    Ok(())
}

async fn ensure_locations(state: &AppState) -> Result<()> {
    state.locations.ensure_loaded().await.map_err(|e| {
        error!(error = %e, "location list unavailable");
        state
            .presenter
            .notify(NoticeLevel::Warning, "City data is not loaded yet. Try again shortly.");
        e
    })
}
