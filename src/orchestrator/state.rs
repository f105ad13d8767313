//! Orchestrator-owned session state

use crate::chat::WeatherSnapshot;
use crate::conversation::SessionId;
use crate::language::{Language, Translations};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The active server-side conversation
///
/// Immutable once created; clearing the conversation drops it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Session {
    pub(crate) id: SessionId,
    pub(crate) language: Language,
}

/// Everything the UI reads besides the message list
#[derive(Debug, Default)]
pub(crate) struct OrchestratorState {
    pub(super) session: Option<Session>,
    pub(super) language: Language,
    pub(super) weather: Option<WeatherSnapshot>,
    pub(super) translations: Translations,
    loading: Arc<AtomicBool>,
}

impl OrchestratorState {
    pub(crate) fn new(language: Language) -> Self {
        Self {
            language,
            ..Default::default()
        }
    }

    pub(crate) fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub(crate) fn language(&self) -> Language {
        self.language
    }

    pub(crate) fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    pub(crate) fn translations(&self) -> &Translations {
        &self.translations
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn loading_flag(&self) -> Arc<AtomicBool> {
        self.loading.clone()
    }

    /// Mark a network round trip as in progress until the guard drops
    pub(super) fn begin_loading(&self) -> LoadingGuard {
        LoadingGuard::new(self.loading.clone())
    }
}

/// Holds the loading flag up; resets it on drop, whatever the exit path
pub(crate) struct LoadingGuard {
    flag: Arc<AtomicBool>,
}

impl LoadingGuard {
    fn new(flag: Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
