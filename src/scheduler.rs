//! Prayer time scheduler.
//!
//! One spawned task owns all reminder state and multiplexes the three
//! timers with `select!`, so a tick runs to completion (including any
//! network await) before the next timer callback is handled.

use chrono::{Local, NaiveDateTime};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::cache::ScheduleCache;
use crate::config::ReminderSettings;
use crate::prayer::Prayer;
use crate::presenter::{NoticeLevel, Presenter};
use crate::store::{StateStore, LAST_CHECK_DATE_KEY};
use crate::time::{clock_of, date_key, minutes_of_day, minutes_until, next_rollover, offset_minutes_before, parse_clock};

pub const CHECK_INTERVAL: Duration = Duration::from_secs(60);
pub const STATUS_INTERVAL: Duration = Duration::from_secs(10);
pub const FIRST_CHECK_DELAY: Duration = Duration::from_secs(3);
pub const PRE_REMINDER_MINUTES: u32 = 5;

/// At-most-once bookkeeping, keyed by `(date, prayer)`. Memory only.
#[derive(Debug, Default)]
pub struct TriggerState {
    alerted: HashSet<(String, Prayer)>,
    pre_reminded: HashSet<(String, Prayer)>,
}

impl TriggerState {
    /// True the first time the pair is marked.
    pub fn mark_alert(&mut self, date: &str, prayer: Prayer) -> bool {
        self.alerted.insert((date.to_string(), prayer))
    }

    pub fn mark_pre_reminder(&mut self, date: &str, prayer: Prayer) -> bool {
        self.pre_reminded.insert((date.to_string(), prayer))
    }

    pub fn clear(&mut self) {
        self.alerted.clear();
        self.pre_reminded.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.alerted.is_empty() && self.pre_reminded.is_empty()
    }

    pub fn alerted_count(&self) -> usize {
        self.alerted.len()
    }

    pub fn pre_reminded_count(&self) -> usize {
        self.pre_reminded.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    PreReminder(Prayer),
    Alert(Prayer),
}

/// State owned by the running scheduler task.
pub struct ReminderLoop {
    settings: ReminderSettings,
    cache: ScheduleCache,
    store: StateStore,
    presenter: Arc<Presenter>,
    triggers: TriggerState,
}

impl ReminderLoop {
    pub fn new(
        settings: ReminderSettings,
        cache: ScheduleCache,
        store: StateStore,
        presenter: Arc<Presenter>,
    ) -> Self {
        Self {
            settings,
            cache,
            store,
            presenter,
            triggers: TriggerState::default(),
        }
    }

    pub fn triggers(&self) -> &TriggerState {
        &self.triggers
    }

    pub async fn check_prayer_times(&mut self, now: NaiveDateTime) -> Vec<Trigger> {
        let mut fired = Vec::new();
        if !self.settings.enabled {
            return fired;
        }

        let lookup = match self
            .cache
            .get_today_schedule(&self.settings.location_id, now.date())
            .await
        {
            Ok(lookup) => lookup,
            Err(e) => {
                debug!(error = %e, "skipping prayer check");
                return fired;
            }
        };

        let today = date_key(now.date());
        let current = clock_of(now);
        let current_minutes = minutes_of_day(now);
        self.reset_on_new_day(&today);

        for (prayer, time) in lookup.schedule.entries() {
            if self.settings.pre_reminder_enabled
                && offset_minutes_before(time, PRE_REMINDER_MINUTES).as_deref() == Some(current.as_str())
                && self.triggers.mark_pre_reminder(&today, prayer)
            {
                self.presenter.notify(
                    NoticeLevel::Info,
                    format!("{} in {} minutes ({})", prayer, PRE_REMINDER_MINUTES, time),
                );
                fired.push(Trigger::PreReminder(prayer));
            }

            if parse_clock(time) == Some(current_minutes) && self.triggers.mark_alert(&today, prayer) {
                info!(%prayer, time, "prayer time reached");
                self.presenter
                    .present_prayer_alert(prayer, time, self.settings.sound_enabled);
                fired.push(Trigger::Alert(prayer));
            }
        }

        fired
    }

    /// Clears trigger state when the persisted last-check date differs,
    /// e.g. after the host was closed overnight.
    fn reset_on_new_day(&mut self, today: &str) {
        let last = self.store.get::<String>(LAST_CHECK_DATE_KEY);
        if last.as_deref() == Some(today) {
            return;
        }

        debug!(?last, today, "date changed since last check");
        self.triggers.clear();
        if let Err(e) = self.store.update(LAST_CHECK_DATE_KEY, &today) {
            error!(error = %e, "failed to persist last check date");
        }
    }

    pub async fn update_status(&mut self, now: NaiveDateTime) {
        if !self.settings.enabled {
            self.presenter.hide_status();
            return;
        }

        let lookup = self
            .cache
            .get_today_schedule(&self.settings.location_id, now.date())
            .await;

        let next = lookup
            .ok()
            .and_then(|lookup| lookup.schedule.next_prayer(minutes_of_day(now)));

        match next {
            Some(next) => {
                let now_minutes = minutes_of_day(now);
                let target = parse_clock(&next.time).unwrap_or(now_minutes);
                self.presenter
                    .present_status(&next, minutes_until(now_minutes, target));
            }
            None => self.presenter.present_no_schedule(),
        }
    }

    pub async fn daily_rollover(&mut self, now: NaiveDateTime) {
        info!("daily refresh triggered");
        self.triggers.clear();
        if let Err(e) = self
            .cache
            .refresh(&self.settings.location_id, now.date())
            .await
        {
            warn!(error = %e, "daily schedule refresh failed");
        }
    }

    async fn run(mut self) {
        let mut check = interval_at(Instant::now() + FIRST_CHECK_DELAY, CHECK_INTERVAL);
        check.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut status = interval(STATUS_INTERVAL);
        status.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let rollover = sleep(until_rollover(local_now()));
        tokio::pin!(rollover);

        info!(location_id = %self.settings.location_id, "scheduler started");
        loop {
            tokio::select! {
                _ = check.tick() => {
                    self.check_prayer_times(local_now()).await;
                }
                _ = status.tick() => {
                    self.update_status(local_now()).await;
                }
                _ = &mut rollover => {
                    self.daily_rollover(local_now()).await;
                    let wait = until_rollover(local_now());
                    info!(minutes = wait.as_secs() / 60, "next daily refresh scheduled");
                    rollover.as_mut().reset(Instant::now() + wait);
                }
            }
        }
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn until_rollover(now: NaiveDateTime) -> Duration {
    (next_rollover(now) - now).to_std().unwrap_or(Duration::ZERO)
}

/// Owns the running reminder task. `stop` is safe to call at any time.
pub struct Scheduler {
    cache: ScheduleCache,
    store: StateStore,
    presenter: Arc<Presenter>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(cache: ScheduleCache, store: StateStore, presenter: Arc<Presenter>) -> Self {
        Self {
            cache,
            store,
            presenter,
            handle: None,
        }
    }

    /// Returns whether a reminder task was spawned. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self, settings: ReminderSettings) -> bool {
        self.stop();

        if !settings.enabled {
            info!("reminders are disabled");
            return false;
        }

        if !settings.has_location() {
            self.presenter.notify(
                NoticeLevel::Warning,
                "Please pick your location to receive prayer reminders.",
            );
            return false;
        }

        let reminder = ReminderLoop::new(
            settings,
            self.cache.clone(),
            self.store.clone(),
            self.presenter.clone(),
        );
        self.handle = Some(tokio::spawn(reminder.run()));
        true
    }

    /// Cancels every timer. Trigger state lives in the task and is dropped
    /// with it.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("scheduler stopped");
        }
        self.presenter.hide_status();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Starts the scheduler and restarts it on every settings change until the
/// sender is dropped.
pub async fn supervise(mut scheduler: Scheduler, mut settings: watch::Receiver<ReminderSettings>) {
    let initial = settings.borrow_and_update().clone();
    scheduler.start(initial);

    while settings.changed().await.is_ok() {
        let updated = settings.borrow_and_update().clone();
        info!("settings changed, restarting scheduler");
        scheduler.stop();
        scheduler.start(updated);
    }

    scheduler.stop();
}
