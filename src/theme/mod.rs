//! Persisted theme preference: a state cell structurally parallel to the
//! session cells, with an apply-to-target effect on every commit.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::warn;

use crate::cell::StateCell;
use crate::storage::{KeyValueStore, THEME_CONFIG_KEY};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FontSize {
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Spacing {
    Compact,
    #[default]
    Normal,
    Relaxed,
}

/// Theme preference. Persisted as camelCase JSON under the `theme-config`
/// storage key on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeConfig {
    pub mode: ThemeMode,
    pub font_size: FontSize,
    pub font_family: FontFamily,
    pub spacing: Spacing,
}

impl ThemeConfig {
    pub fn is_dark(&self) -> bool {
        self.mode == ThemeMode::Dark
    }

    /// Class names derived from the non-mode fields.
    pub fn class_names(&self) -> Vec<String> {
        vec![
            format!("text-{}", self.font_size),
            format!("font-{}", self.font_family),
            format!("spacing-{}", self.spacing),
        ]
    }
}

/// Partial update merged into the current config by [`ThemeStore::update_theme`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThemeUpdate {
    pub mode: Option<ThemeMode>,
    pub font_size: Option<FontSize>,
    pub font_family: Option<FontFamily>,
    pub spacing: Option<Spacing>,
}

/// Where the applied theme lands: the document, in the original host; a test
/// double here.
pub trait ThemeTarget: Send + Sync {
    fn set_dark(&self, dark: bool);
    fn set_classes(&self, classes: &[String]);
}

/// Target that discards everything.
#[derive(Debug, Default)]
pub struct NullTarget;

impl ThemeTarget for NullTarget {
    fn set_dark(&self, _dark: bool) {}
    fn set_classes(&self, _classes: &[String]) {}
}

/// Recording target for tests.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    dark: RwLock<Option<bool>>,
    classes: RwLock<Vec<String>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dark(&self) -> Option<bool> {
        *self.dark.read().unwrap()
    }

    pub fn classes(&self) -> Vec<String> {
        self.classes.read().unwrap().clone()
    }
}

impl ThemeTarget for MemoryTarget {
    fn set_dark(&self, dark: bool) {
        *self.dark.write().unwrap() = Some(dark);
    }

    fn set_classes(&self, classes: &[String]) {
        *self.classes.write().unwrap() = classes.to_vec();
    }
}

/// Reactive theme cell. Configuration is read once from storage at
/// construction (or defaulted), mutated only through [`ThemeStore::update_theme`],
/// and persisted on every mutation.
///
/// Each commit triggers the apply effect: dark marker and derived class names
/// on the target, then a re-persist with a read-back check that logs a
/// discrepancy without failing. The effect runs synchronously on the
/// committing thread.
pub struct ThemeStore {
    config: StateCell<ThemeConfig>,
    storage: Arc<dyn KeyValueStore>,
}

impl ThemeStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, target: Arc<dyn ThemeTarget>) -> Self {
        let initial = load_config(storage.as_ref());
        let config = StateCell::new(initial);

        let effect_storage = Arc::clone(&storage);
        config.subscribe(move |committed: &ThemeConfig| {
            apply_to_target(target.as_ref(), committed);
            persist_with_check(effect_storage.as_ref(), committed);
        });

        // The initial value never went through replace(), so apply and
        // persist it once by committing it.
        config.replace(initial);

        Self { config, storage }
    }

    /// The theme config cell, for subscription and reads.
    pub fn config_cell(&self) -> &StateCell<ThemeConfig> {
        &self.config
    }

    /// Current configuration.
    pub fn config(&self) -> ThemeConfig {
        self.config.get()
    }

    /// Merge a partial update into the current config and persist it.
    pub fn update_theme(&self, update: ThemeUpdate) {
        let current = self.config.get();
        let merged = ThemeConfig {
            mode: update.mode.unwrap_or(current.mode),
            font_size: update.font_size.unwrap_or(current.font_size),
            font_family: update.font_family.unwrap_or(current.font_family),
            spacing: update.spacing.unwrap_or(current.spacing),
        };
        if let Ok(serialized) = serde_json::to_string(&merged) {
            if let Err(err) = self.storage.set(THEME_CONFIG_KEY, &serialized) {
                warn!(error = %err, "failed to persist theme config");
            }
        }
        self.config.replace(merged);
    }

    /// Flip light/dark, leaving every other field unchanged.
    pub fn toggle_dark_mode(&self) {
        let mode = self.config.get().mode.toggled();
        self.update_theme(ThemeUpdate {
            mode: Some(mode),
            ..ThemeUpdate::default()
        });
    }
}

fn load_config(storage: &dyn KeyValueStore) -> ThemeConfig {
    match storage.get(THEME_CONFIG_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "stored theme config is malformed; using defaults");
            ThemeConfig::default()
        }),
        Ok(None) => ThemeConfig::default(),
        Err(err) => {
            warn!(error = %err, "failed to read theme config; using defaults");
            ThemeConfig::default()
        }
    }
}

fn apply_to_target(target: &dyn ThemeTarget, config: &ThemeConfig) {
    target.set_dark(config.is_dark());
    target.set_classes(&config.class_names());
}

/// Re-persist and read back. A mismatch means another writer raced us or the
/// storage dropped the write; either way it is logged, not fatal.
fn persist_with_check(storage: &dyn KeyValueStore, config: &ThemeConfig) {
    let Ok(serialized) = serde_json::to_string(config) else {
        return;
    };
    if let Err(err) = storage.set(THEME_CONFIG_KEY, &serialized) {
        warn!(error = %err, "failed to persist theme config");
        return;
    }
    match storage.get(THEME_CONFIG_KEY) {
        Ok(Some(stored)) if stored == serialized => {}
        Ok(stored) => {
            warn!(
                expected = %serialized,
                found = ?stored,
                "persisted theme config does not match what was written"
            );
        }
        Err(err) => warn!(error = %err, "failed to read back theme config"),
    }
}
