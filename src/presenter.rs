//! Notification surfaces: the alert slot, the status indicator and the
//! notice feed.
//!
//! At most one alert exists at a time. Opening a new one disposes the
//! previous alert first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::prayer::{NextPrayer, Prayer};
use crate::templates;

const MAX_NOTICES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub prayer: Prayer,
    pub time: String,
    pub quote: String,
    /// Whether the rendered alert carries an audio cue.
    pub audible: bool,
    pub html: String,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusIndicator {
    pub visible: bool,
    pub text: String,
    pub tooltip: String,
}

#[derive(Debug, Default)]
pub struct Presenter {
    media_dir: Option<PathBuf>,
    alert: Mutex<Option<Alert>>,
    status: Mutex<StatusIndicator>,
    notices: Mutex<VecDeque<Notice>>,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audio cues are served from `media_dir`; without it alerts are silent.
    pub fn with_media_dir(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: Some(media_dir.into()),
            ..Self::default()
        }
    }

    fn audio_available(&self, prayer: Prayer) -> bool {
        self.media_dir
            .as_ref()
            .is_some_and(|dir| dir.join(templates::audio_file(prayer)).is_file())
    }

    pub fn present_prayer_alert(&self, prayer: Prayer, time: &str, sound_enabled: bool) -> Alert {
        let audible = sound_enabled && self.audio_available(prayer);
        if sound_enabled && !audible {
            debug!(%prayer, file = templates::audio_file(prayer), "audio file missing, alert will be silent");
        }

        let quote = templates::random_quote();
        let alert = Alert {
            prayer,
            time: time.to_string(),
            quote: quote.to_string(),
            audible,
            html: templates::render_alert(prayer, time, quote, audible),
            opened_at: Utc::now(),
        };

        let mut slot = lock(&self.alert);
        if let Some(previous) = slot.take() {
            debug!(prayer = %previous.prayer, "disposing previous alert");
        }
        *slot = Some(alert.clone());

        info!(%prayer, time, "prayer alert opened");
        alert
    }

    pub fn current_alert(&self) -> Option<Alert> {
        lock(&self.alert).clone()
    }

    /// Returns whether an alert was open.
    pub fn close_alert(&self) -> bool {
        let closed = lock(&self.alert).take();
        if let Some(alert) = &closed {
            debug!(prayer = %alert.prayer, "alert closed");
        }
        closed.is_some()
    }

    pub fn present_status(&self, next: &NextPrayer, remaining_minutes: u32) {
        let name = next.prayer.display_name();
        let hours = remaining_minutes / 60;
        let minutes = remaining_minutes % 60;
        let remaining = if hours > 0 {
            format!("{} h {} min", hours, minutes)
        } else {
            format!("{} min", minutes)
        };

        *lock(&self.status) = StatusIndicator {
            visible: true,
            text: format!("{}: {}", name, remaining),
            tooltip: format!("{} at {}", name, next.time),
        };
    }

    pub fn present_no_schedule(&self) {
        *lock(&self.status) = StatusIndicator {
            visible: true,
            text: "Prayer Reminder".to_string(),
            tooltip: "Open the schedule".to_string(),
        };
    }

    pub fn hide_status(&self) {
        lock(&self.status).visible = false;
    }

    pub fn status(&self) -> StatusIndicator {
        lock(&self.status).clone()
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Info => info!(notice = %message),
            NoticeLevel::Warning | NoticeLevel::Error => warn!(notice = %message),
        }

        let mut notices = lock(&self.notices);
        if notices.len() == MAX_NOTICES {
            notices.pop_front();
        }
        notices.push_back(Notice {
            level,
            message,
            at: Utc::now(),
        });
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).iter().cloned().collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn text_of(html: &str, selector: &str) -> String {
        let document = Html::parse_document(html);
        let selector = Selector::parse(selector).unwrap();
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
    }

    #[test]
    fn new_alert_replaces_previous_one() {
        let presenter = Presenter::new();
        presenter.present_prayer_alert(Prayer::Ashar, "15:15", false);
        presenter.present_prayer_alert(Prayer::Maghrib, "18:00", false);

        let current = presenter.current_alert().unwrap();
        assert_eq!(current.prayer, Prayer::Maghrib);
        assert_eq!(text_of(&current.html, ".prayer-name"), "Maghrib");
        assert_eq!(text_of(&current.html, ".prayer-time"), "18:00");
        assert_eq!(text_of(&current.html, ".message"), Prayer::Maghrib.message());
        assert!(templates::QUOTES.contains(&current.quote.as_str()));
    }

    #[test]
    fn audio_cue_follows_sound_setting() {
        let media = tempfile::tempdir().unwrap();
        std::fs::write(media.path().join("adzan-subuh.mp3"), b"ID3").unwrap();
        let presenter = Presenter::with_media_dir(media.path());

        let silent = presenter.present_prayer_alert(Prayer::Subuh, "04:30", false);
        assert!(!silent.audible);
        assert!(!silent.html.contains("<audio"));

        let loud = presenter.present_prayer_alert(Prayer::Subuh, "04:30", true);
        assert!(loud.audible);
        let document = Html::parse_document(&loud.html);
        let audio = Selector::parse("audio#adzan").unwrap();
        let src = document
            .select(&audio)
            .next()
            .and_then(|el| el.value().attr("src"))
            .unwrap();
        assert_eq!(src, "/media/adzan-subuh.mp3");
    }

    #[test]
    fn missing_audio_file_drops_the_cue() {
        let media = tempfile::tempdir().unwrap();
        std::fs::write(media.path().join("adzan-subuh.mp3"), b"ID3").unwrap();
        let presenter = Presenter::with_media_dir(media.path());

        // Only the Subuh file exists.
        let alert = presenter.present_prayer_alert(Prayer::Dzuhur, "12:00", true);
        assert!(!alert.audible);
        assert!(!alert.html.contains("<audio"));

        let unconfigured = Presenter::new().present_prayer_alert(Prayer::Subuh, "04:30", true);
        assert!(!unconfigured.audible);
    }

    #[test]
    fn close_empties_the_slot() {
        let presenter = Presenter::new();
        assert!(!presenter.close_alert());
        presenter.present_prayer_alert(Prayer::Isya, "19:15", false);
        assert!(presenter.close_alert());
        assert!(presenter.current_alert().is_none());
    }

    #[test]
    fn status_countdown_text() {
        let presenter = Presenter::new();
        let next = NextPrayer {
            prayer: Prayer::Subuh,
            time: "04:30".into(),
        };

        presenter.present_status(&next, 510);
        let status = presenter.status();
        assert!(status.visible);
        assert_eq!(status.text, "Subuh: 8 h 30 min");
        assert_eq!(status.tooltip, "Subuh at 04:30");

        presenter.present_status(&next, 4);
        assert_eq!(presenter.status().text, "Subuh: 4 min");

        presenter.hide_status();
        assert!(!presenter.status().visible);
    }

    #[test]
    fn notice_feed_is_bounded() {
        let presenter = Presenter::new();
        for i in 0..(MAX_NOTICES + 5) {
            presenter.notify(NoticeLevel::Info, format!("notice {}", i));
        }
        let notices = presenter.notices();
        assert_eq!(notices.len(), MAX_NOTICES);
        assert_eq!(notices[0].message, "notice 5");
    }
}
