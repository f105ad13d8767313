//! Scripted in-memory backend for orchestrator tests

use super::{ConversationApi, SessionId, SuggestionRequest, SuggestionResponse, WeatherSession};
use crate::chat::{sample_snapshot, Message, WeatherSnapshot};
use crate::error::ApiError;
use crate::language::Language;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Translations(Language),
    Examples(Language),
    Weather(String),
    CreateWeatherSession { location: String, language: Language },
    CreateSession(Language),
    Query { session_id: String, query: String, language: Language },
    DeleteChat(String),
}

/// Fake backend that keeps a server-side history like the real one
#[derive(Default)]
pub(crate) struct MockConversation {
    calls: Mutex<Vec<Call>>,
    server_history: Mutex<Vec<Message>>,
    next_session: AtomicUsize,
    pub(crate) fail_session_creation: AtomicBool,
    pub(crate) fail_dispatch: AtomicBool,
    pub(crate) fail_delete: AtomicBool,
    pub(crate) failure_detail: Mutex<Option<String>>,
    /// Snapshot returned (flagged as updated) by the next dispatch
    pub(crate) next_weather_update: Mutex<Option<WeatherSnapshot>>,
    /// Loading flag sampled on every dispatch
    loading_probe: Mutex<Option<Arc<AtomicBool>>>,
    loading_seen: Mutex<Vec<bool>>,
}

impl MockConversation {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn set_failure_detail(&self, detail: Option<&str>) {
        *self.failure_detail.lock().unwrap() = detail.map(str::to_string);
    }

    /// Sample `flag` whenever a query is dispatched
    pub(crate) fn probe_loading(&self, flag: Arc<AtomicBool>) {
        *self.loading_probe.lock().unwrap() = Some(flag);
    }

    pub(crate) fn loading_seen(&self) -> Vec<bool> {
        self.loading_seen.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(&self) -> ApiError {
        ApiError::Server {
            status: 500,
            detail: self.failure_detail.lock().unwrap().clone(),
        }
    }

    fn new_session_id(&self) -> SessionId {
        let n = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        SessionId::new(format!("session-{}", n))
    }

    pub(crate) fn reply_for(query: &str) -> String {
        format!("Suggestion for: {}\n- stay hydrated", query)
    }
}

#[async_trait]
impl ConversationApi for MockConversation {
    async fn load_translations(
        &self,
        language: Language,
    ) -> Result<HashMap<String, String>, ApiError> {
        self.record(Call::Translations(language));
        let mut strings = HashMap::new();
        let clear = match language {
            Language::En => "Clear Chat",
            Language::Ja => "チャットをクリア",
        };
        strings.insert("clear_chat".to_string(), clear.to_string());
        Ok(strings)
    }

    async fn example_prompts(&self, language: Language) -> Result<Vec<String>, ApiError> {
        self.record(Call::Examples(language));
        Ok(vec!["What should I wear today?".to_string()])
    }

    async fn fetch_weather(&self, location: &str) -> Result<WeatherSnapshot, ApiError> {
        self.record(Call::Weather(location.to_string()));
        if self.fail_session_creation.load(Ordering::SeqCst) {
            return Err(self.failure());
        }
        Ok(sample_snapshot(location))
    }

    async fn create_session_with_weather(
        &self,
        location: &str,
        language: Language,
    ) -> Result<WeatherSession, ApiError> {
        self.record(Call::CreateWeatherSession {
            location: location.to_string(),
            language,
        });
        if self.fail_session_creation.load(Ordering::SeqCst) {
            return Err(self.failure());
        }
        self.server_history.lock().unwrap().clear();
        Ok(WeatherSession {
            session_id: self.new_session_id(),
            weather: sample_snapshot(location),
        })
    }

    async fn create_session(&self, language: Language) -> Result<SessionId, ApiError> {
        self.record(Call::CreateSession(language));
        if self.fail_session_creation.load(Ordering::SeqCst) {
            return Err(self.failure());
        }
        self.server_history.lock().unwrap().clear();
        Ok(self.new_session_id())
    }

    async fn send_query(
        &self,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse, ApiError> {
        self.record(Call::Query {
            session_id: request.session_id.to_string(),
            query: request.query.clone(),
            language: request.language,
        });
        if let Some(flag) = self.loading_probe.lock().unwrap().as_ref() {
            self.loading_seen
                .lock()
                .unwrap()
                .push(flag.load(Ordering::SeqCst));
        }
        if self.fail_dispatch.load(Ordering::SeqCst) {
            return Err(self.failure());
        }

        let suggestion = Self::reply_for(&request.query);
        let mut history = self.server_history.lock().unwrap();
        history.push(Message::user(request.query.clone()));
        history.push(Message::assistant(suggestion.clone()));

        let weather = self.next_weather_update.lock().unwrap().take();
        Ok(SuggestionResponse {
            suggestion,
            weather_updated: weather.is_some(),
            weather,
            chat_history: Some(history.clone()),
        })
    }

    async fn delete_session_chat(&self, session_id: &SessionId) -> Result<(), ApiError> {
        self.record(Call::DeleteChat(session_id.to_string()));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(self.failure());
        }
        self.server_history.lock().unwrap().clear();
        Ok(())
    }
}
