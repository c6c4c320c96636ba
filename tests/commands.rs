//! User commands against an app state wired to a mock schedule API.

use chrono::Local;
use prayer_reminder::cache::{CachedSchedule, ScheduleOrigin};
use prayer_reminder::commands;
use prayer_reminder::config::{Config, ReminderSettings, SettingsUpdate};
use prayer_reminder::error::AppError;
use prayer_reminder::prayer::PrayerSchedule;
use prayer_reminder::presenter::NoticeLevel;
use prayer_reminder::store::{StateStore, SCHEDULE_CACHE_KEY, SETTINGS_KEY};
use prayer_reminder::time::date_key;
use prayer_reminder::AppState;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let base = server.uri();
    Config::from_vars(|key| match key {
        "API_BASE_URL" => Some(base.clone()),
        _ => None,
    })
    .unwrap()
}

fn partial_schedule() -> PrayerSchedule {
    PrayerSchedule {
        subuh: Some("04:30".into()),
        dzuhur: Some("12:00".into()),
        ashar: None,
        maghrib: Some("18:00".into()),
        isya: Some("19:15".into()),
    }
}

async fn mount_locations(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/kota/semua"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [
                {"id": "1609", "lokasi": "KOTA SURABAYA"},
                {"id": "1301", "lokasi": "KOTA JAKARTA"},
                {"id": "1601", "lokasi": "KAB. BANGKALAN"}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn shows_todays_schedule_as_text() {
    let server = MockServer::start().await;
    let store = StateStore::in_memory();
    let today = date_key(Local::now().date_naive());
    store
        .update(
            SCHEDULE_CACHE_KEY,
            &CachedSchedule {
                date: today.clone(),
                location_id: "1301".into(),
                timings: partial_schedule(),
            },
        )
        .unwrap();
    let (state, _rx) = AppState::new(config_for(&server), store);

    let view = commands::show_today_schedule(&state).await.unwrap();

    assert_eq!(view.origin, ScheduleOrigin::Cached);
    assert_eq!(view.entries.len(), 5);
    let expected = format!(
        "Prayer Schedule - KOTA JAKARTA\nDKI JAKARTA\nDate: {}\n\nSubuh: 04:30\nDzuhur: 12:00\nAshar: N/A\nMaghrib: 18:00\nIsya: 19:15",
        today
    );
    assert_eq!(view.text, expected);
}

#[tokio::test]
async fn missing_schedule_is_surfaced_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (state, _rx) = AppState::new(config_for(&server), StateStore::in_memory());

    let err = commands::show_today_schedule(&state).await.unwrap_err();
    assert!(matches!(err, AppError::NoDataAvailable));

    let notices = state.presenter.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn picker_lists_regions_then_cities() {
    let server = MockServer::start().await;
    mount_locations(&server).await;
    let (state, _rx) = AppState::new(config_for(&server), StateStore::in_memory());

    // Directory is empty, so the first step reloads it.
    let regions = commands::list_regions(&state).await.unwrap();
    assert_eq!(regions, vec!["DKI JAKARTA", "JAWA TIMUR"]);

    let cities = commands::list_cities(&state, "JAWA TIMUR").await.unwrap();
    let labels: Vec<&str> = cities.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["KAB. BANGKALAN", "KOTA SURABAYA"]);

    let err = commands::list_cities(&state, "ATLANTIS").await.unwrap_err();
    assert!(matches!(err, AppError::LocationError(_)));
}

#[tokio::test]
async fn selecting_a_city_updates_and_broadcasts_settings() {
    let server = MockServer::start().await;
    mount_locations(&server).await;
    let store = StateStore::in_memory();
    let (state, mut rx) = AppState::new(config_for(&server), store.clone());

    let settings = commands::select_location(&state, "JAWA TIMUR", "1609").await.unwrap();
    assert_eq!(settings.location_id, "1609");
    assert_eq!(settings.location_label, "KOTA SURABAYA");
    assert_eq!(settings.region_label, "JAWA TIMUR");

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().location_id, "1609");
    assert_eq!(
        store.get::<ReminderSettings>(SETTINGS_KEY).unwrap().location_id,
        "1609"
    );

    let last = state.presenter.notices().pop().unwrap();
    assert_eq!(last.message, "Location set: KOTA SURABAYA, JAWA TIMUR");

    let err = commands::select_location(&state, "DKI JAKARTA", "1609").await.unwrap_err();
    assert!(matches!(err, AppError::LocationError(_)));
}

#[tokio::test]
async fn location_list_unavailable_warns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (state, _rx) = AppState::new(config_for(&server), StateStore::in_memory());

    let err = commands::list_regions(&state).await.unwrap_err();
    assert!(matches!(err, AppError::LocationError(_)));
    assert_eq!(state.presenter.notices()[0].level, NoticeLevel::Warning);
}

#[tokio::test]
async fn settings_update_persists_and_overrides_env_on_restart() {
    let server = MockServer::start().await;
    let store = StateStore::in_memory();
    let (state, mut rx) = AppState::new(config_for(&server), store.clone());

    let update = SettingsUpdate {
        enabled: Some(false),
        ..Default::default()
    };
    let settings = commands::update_settings(&state, &update).unwrap();
    assert!(!settings.enabled);
    assert!(!rx.borrow_and_update().enabled);

    let (restarted, _rx) = AppState::new(config_for(&server), store);
    assert!(!restarted.current_settings().enabled);
}
