// --- File: crates/reservo_client/src/preferences.rs ---
use reservo_config::ClientConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub locale: String,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            locale: "th".to_string(),
            theme: Theme::default(),
        }
    }
}

/// Shared, observable UI preferences. Cloning shares the same store.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    sender: Arc<watch::Sender<Preferences>>,
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

impl PreferenceStore {
    pub fn new(initial: Preferences) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(Preferences {
            locale: config.locale.clone(),
            ..Preferences::default()
        })
    }

    pub fn current(&self) -> Preferences {
        self.sender.borrow().clone()
    }

    pub fn locale(&self) -> String {
        self.sender.borrow().locale.clone()
    }

    /// Ignores blank locales. Subscribers are only woken on an actual change.
    pub fn set_locale(&self, locale: &str) {
        let locale = locale.trim().to_lowercase();
        if locale.is_empty() {
            return;
        }
        self.sender.send_if_modified(|prefs| {
            if prefs.locale == locale {
                return false;
            }
            debug!("locale changed to {}", locale);
            prefs.locale = locale;
            true
        });
    }

    pub fn set_theme(&self, theme: Theme) {
        self.sender.send_if_modified(|prefs| {
            let changed = prefs.theme != theme;
            prefs.theme = theme;
            changed
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.sender.subscribe()
    }
}
