pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod locations;
pub mod prayer;
pub mod presenter;
pub mod scheduler;
pub mod store;
pub mod templates;
pub mod time;

use std::sync::Arc;
use tokio::sync::watch;

use cache::ScheduleCache;
use config::{Config, ReminderSettings};
use fetcher::ScheduleFetcher;
use locations::LocationDirectory;
use presenter::Presenter;
use scheduler::Scheduler;
use store::{StateStore, SETTINGS_KEY};

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: StateStore,
    pub cache: ScheduleCache,
    pub presenter: Arc<Presenter>,
    pub locations: Arc<LocationDirectory>,
    pub settings: Arc<watch::Sender<ReminderSettings>>,
}

impl AppState {
    /// Persisted settings win over the environment defaults.
    pub fn new(config: Config, store: StateStore) -> (Self, watch::Receiver<ReminderSettings>) {
        let settings = store
            .get::<ReminderSettings>(SETTINGS_KEY)
            .unwrap_or_else(|| config.settings.clone());
        let (settings_tx, settings_rx) = watch::channel(settings);

        let fetcher = ScheduleFetcher::new(config.api_base_url.clone());
        let presenter = Arc::new(Presenter::with_media_dir(config.media_dir.clone()));
        let cache = ScheduleCache::new(fetcher.clone(), store.clone(), presenter.clone());

        let state = AppState {
            config: Arc::new(config),
            store,
            cache,
            presenter,
            locations: Arc::new(LocationDirectory::new(fetcher)),
            settings: Arc::new(settings_tx),
        };
        (state, settings_rx)
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.cache.clone(), self.store.clone(), self.presenter.clone())
    }

    pub fn current_settings(&self) -> ReminderSettings {
        self.settings.borrow().clone()
    }
}
