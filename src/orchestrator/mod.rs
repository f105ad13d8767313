//! Session lifecycle and message dispatch
//!
//! [`SessionOrchestrator`] is the only writer of the chat history. Typed
//! text and finished transcripts both enter through [`SessionOrchestrator::submit`],
//! which bootstraps a session on first use and then dispatches the query.
//! Every failure is turned into an error message or a [`Notice`] here;
//! nothing propagates to the caller.

mod bootstrap;
mod state;
mod voice;

pub(crate) use bootstrap::{BootstrapMode, MergePolicy};
pub(crate) use state::{OrchestratorState, Session};

use crate::audio::{AudioCaptureController, RecordingState};
use crate::chat::{ChatHistoryStore, Message, WeatherSnapshot};
use crate::conversation::{ConversationApi, SuggestionRequest, SuggestionResponse};
use crate::error::ChatError;
use crate::language::{Language, Translations};
use crate::location::LocationExtractor;
use crate::transcription::Transcriber;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown when a dispatch fails without backend detail
const DISPATCH_FALLBACK: &str = "Error getting AI response";

/// Shown when a weather lookup fails without backend detail
const WEATHER_FALLBACK: &str = "Error fetching weather data";

/// Prompts offered when the backend cannot supply any
const FALLBACK_EXAMPLES: [&str; 3] = [
    "What should I do today in Tokyo?",
    "What should I wear today?",
    "Best time to go outside?",
];

/// Out-of-band message for the user that is not part of the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    /// Needs acknowledgement (e.g. microphone permission)
    Blocking(String),
    /// Informational, safe to show inline
    Info(String),
}

impl Notice {
    pub(crate) fn text(&self) -> &str {
        match self {
            Notice::Blocking(text) | Notice::Info(text) => text,
        }
    }
}

/// Owns the session, the conversation state and the voice pipeline
pub(crate) struct SessionOrchestrator {
    client: Arc<dyn ConversationApi>,
    transcriber: Arc<dyn Transcriber>,
    capture: AudioCaptureController,
    extractor: LocationExtractor,
    mode: BootstrapMode,
    state: OrchestratorState,
    history: ChatHistoryStore,
}

impl SessionOrchestrator {
    pub(crate) fn new(
        client: Arc<dyn ConversationApi>,
        transcriber: Arc<dyn Transcriber>,
        capture: AudioCaptureController,
        mode: BootstrapMode,
        language: Language,
    ) -> Self {
        info!(%mode, %language, "Creating session orchestrator");
        Self {
            client,
            transcriber,
            capture,
            extractor: LocationExtractor::new(),
            mode,
            state: OrchestratorState::new(language),
            history: ChatHistoryStore::new(),
        }
    }

    pub(crate) fn history(&self) -> &ChatHistoryStore {
        &self.history
    }

    pub(crate) fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub(crate) fn mode(&self) -> BootstrapMode {
        self.mode
    }

    pub(crate) fn recording_state(&self) -> RecordingState {
        self.capture.state()
    }

    /// Whether new input (text, recording, upload) may be accepted
    pub(crate) fn accepts_input(&self) -> bool {
        !self.state.is_loading() && self.capture.state() == RecordingState::Idle
    }

    /// Send user text to the backend
    ///
    /// Empty or whitespace-only text is ignored. The user message is
    /// recorded before any network call is made.
    pub(crate) async fn submit(&mut self, text: &str) {
        let query = text.trim();
        if query.is_empty() {
            return;
        }

        self.history.push(Message::user(query));

        if self.state.session.is_none() {
            if let Err(e) = self.bootstrap(query).await {
                warn!("Session bootstrap failed: {}", e);
                let fallback = self.mode.failure_fallback();
                self.history.push(Message::error(e.user_message(fallback)));
                return;
            }
        }

        self.dispatch(query).await;
    }

    /// Establish a session according to the bootstrap mode
    async fn bootstrap(&mut self, query: &str) -> Result<(), ChatError> {
        let language = self.state.language;
        let _loading = self.state.begin_loading();

        let id = match self.mode {
            BootstrapMode::EagerWeather => {
                let location = self
                    .extractor
                    .extract(query)
                    .unwrap_or_else(|| language.default_city().to_string());
                debug!(%location, "Bootstrapping weather-seeded session");

                let created = self
                    .client
                    .create_session_with_weather(&location, language)
                    .await
                    .map_err(ChatError::SessionCreation)?;

                let announcement = format!("🌤️ Weather for {}", created.weather.location);
                self.state.weather = Some(created.weather.clone());
                self.history
                    .push(Message::weather(announcement, created.weather));
                created.session_id
            }
            BootstrapMode::Lazy => self
                .client
                .create_session(language)
                .await
                .map_err(ChatError::SessionCreation)?,
        };

        info!(session_id = %id, %language, "Session established");
        self.state.session = Some(Session { id, language });
        Ok(())
    }

    /// One round trip to the suggestion endpoint for the active session
    async fn dispatch(&mut self, query: &str) {
        let Some(session) = self.state.session.as_ref() else {
            return;
        };
        let request = SuggestionRequest {
            session_id: session.id.clone(),
            query: query.to_string(),
            language: self.state.language,
        };

        let result = {
            let _loading = self.state.begin_loading();
            self.client.send_query(&request).await
        };

        match result {
            Ok(response) => self.merge_reply(response),
            Err(e) => {
                let error = ChatError::Dispatch(e);
                warn!(session_id = %request.session_id, "{}", error);
                self.history
                    .push(Message::error(error.user_message(DISPATCH_FALLBACK)));
            }
        }
    }

    /// Fold a suggestion response into history and weather state
    fn merge_reply(&mut self, response: SuggestionResponse) {
        let refreshed = response.refreshed_weather().cloned();
        if let Some(snapshot) = &refreshed {
            info!(location = %snapshot.location, "Weather refreshed by backend");
            self.state.weather = Some(snapshot.clone());
        }

        match self.mode.merge_policy() {
            MergePolicy::AppendReply => {
                if let Some(snapshot) = refreshed {
                    let announcement = format!("🌤️ Weather updated for {}", snapshot.location);
                    self.history.push(Message::weather(announcement, snapshot));
                }
                self.history.push(Message::assistant(response.suggestion));
            }
            MergePolicy::ReplaceWithServer => {
                match response.chat_history {
                    Some(server) => self.history.replace_with(server),
                    None => self.history.push(Message::assistant(response.suggestion)),
                }
                if let Some(snapshot) = refreshed {
                    if !self.history.attach_weather_to_last_reply(snapshot.clone()) {
                        let announcement =
                            format!("🌤️ Weather updated for {}", snapshot.location);
                        self.history.push(Message::weather(announcement, snapshot));
                    }
                }
            }
        }
    }

    /// Forget the session, the history and the weather
    ///
    /// The server-side chat deletion is best effort; a failure is logged
    /// and the local reset happens regardless.
    pub(crate) async fn clear(&mut self) {
        if let Some(session) = self.state.session.take() {
            let _loading = self.state.begin_loading();
            match self.client.delete_session_chat(&session.id).await {
                Ok(()) => debug!(session_id = %session.id, "Deleted session chat"),
                Err(e) => warn!(session_id = %session.id, "Failed to delete session chat: {}", e),
            }
        }
        self.history.clear();
        self.state.weather = None;
        info!("Conversation cleared");
    }

    /// Switch language for later dispatches, transcriptions and UI strings
    ///
    /// An active session keeps the language it was created with.
    pub(crate) async fn set_language(&mut self, language: Language) {
        if self.state.language == language {
            return;
        }
        info!(%language, "Language changed");
        self.state.language = language;
        self.load_translations().await;
    }

    /// Fetch UI strings for the current language
    ///
    /// On failure lookups fall back to the keys themselves.
    pub(crate) async fn load_translations(&mut self) {
        let language = self.state.language;
        let result = {
            let _loading = self.state.begin_loading();
            self.client.load_translations(language).await
        };
        self.state.translations = match result {
            Ok(strings) => Translations::new(strings),
            Err(e) => {
                warn!(%language, "Failed to load translations: {}", e);
                Translations::default()
            }
        };
    }

    /// Suggested first questions for an empty conversation
    pub(crate) async fn example_prompts(&self) -> Vec<String> {
        let language = self.state.language;
        let result = {
            let _loading = self.state.begin_loading();
            self.client.example_prompts(language).await
        };
        match result {
            Ok(examples) if !examples.is_empty() => examples,
            Ok(_) => fallback_examples(),
            Err(e) => {
                warn!(%language, "Failed to load example prompts: {}", e);
                fallback_examples()
            }
        }
    }

    /// Show the weather for a place without touching the session
    pub(crate) async fn lookup_weather(&mut self, location: &str) {
        let location = location.trim();
        if location.is_empty() {
            return;
        }

        let result = {
            let _loading = self.state.begin_loading();
            self.client.fetch_weather(location).await
        };

        match result {
            Ok(snapshot) => self.show_weather(snapshot),
            Err(e) => {
                let error = ChatError::WeatherLookup(e);
                warn!(%location, "{}", error);
                self.history
                    .push(Message::error(error.user_message(WEATHER_FALLBACK)));
            }
        }
    }

    fn show_weather(&mut self, snapshot: WeatherSnapshot) {
        let announcement = format!("🌤️ Weather for {}", snapshot.location);
        self.state.weather = Some(snapshot.clone());
        self.history.push(Message::weather(announcement, snapshot));
    }
}

fn fallback_examples() -> Vec<String> {
    FALLBACK_EXAMPLES.iter().map(|s| s.to_string()).collect()
}


#[cfg(test)]
mod tests {
    use super::testing::harness;
    use super::*;
    use crate::chat::render::{conversation_transcript, render_message};
    use crate::chat::{sample_snapshot, MessageKind, Role};
    use crate::conversation::mock::{Call, MockConversation};
    use std::sync::atomic::Ordering;

    const MODES: [BootstrapMode; 2] = [BootstrapMode::EagerWeather, BootstrapMode::Lazy];

    fn is_session_creation(call: &Call) -> bool {
        matches!(
            call,
            Call::CreateWeatherSession { .. } | Call::CreateSession(_)
        )
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        for mode in MODES {
            let mut h = harness(mode);
            for text in ["", "   ", "\n\t "] {
                h.orchestrator.submit(text).await;
            }
            assert!(h.orchestrator.history().is_empty());
            assert!(h.backend.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_first_submit_creates_session_then_dispatches() {
        for mode in MODES {
            let mut h = harness(mode);
            h.orchestrator.submit("What should I do today in Tokyo?").await;

            let calls = h.backend.calls();
            assert_eq!(calls.len(), 2, "{:?}", calls);
            assert!(is_session_creation(&calls[0]));
            assert!(matches!(calls[1], Call::Query { .. }));
            assert!(h.orchestrator.state().session().is_some());
            assert_eq!(
                h.orchestrator.history().messages()[0],
                Message::user("What should I do today in Tokyo?")
            );
        }
    }

    #[tokio::test]
    async fn test_second_submit_only_dispatches() {
        for mode in MODES {
            let mut h = harness(mode);
            h.orchestrator.submit("hello").await;
            h.orchestrator.submit("and tomorrow?").await;

            let calls = h.backend.calls();
            assert_eq!(calls.iter().filter(|c| is_session_creation(c)).count(), 1);
            assert_eq!(
                calls.last(),
                Some(&Call::Query {
                    session_id: "session-1".to_string(),
                    query: "and tomorrow?".to_string(),
                    language: Language::En,
                })
            );
        }
    }

    #[tokio::test]
    async fn test_eager_bootstrap_uses_extracted_location() {
        let mut h = harness(BootstrapMode::EagerWeather);
        h.orchestrator.submit("What should I do today in Tokyo?").await;

        assert_eq!(
            h.backend.calls()[0],
            Call::CreateWeatherSession {
                location: "Tokyo".to_string(),
                language: Language::En,
            }
        );
        let messages = h.orchestrator.history().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].kind, MessageKind::Weather);
        assert_eq!(messages[1].content, "🌤️ Weather for Tokyo");
        assert_eq!(
            messages[2],
            Message::assistant(MockConversation::reply_for(
                "What should I do today in Tokyo?"
            ))
        );
        assert_eq!(
            h.orchestrator.state().weather().map(|w| w.location.as_str()),
            Some("Tokyo")
        );
    }

    #[tokio::test]
    async fn test_eager_bootstrap_falls_back_to_default_city() {
        let mut h = harness(BootstrapMode::EagerWeather);
        h.orchestrator.set_language(Language::Ja).await;
        h.orchestrator.submit("今日は何を着ればいい？").await;

        assert!(h.backend.calls().contains(&Call::CreateWeatherSession {
            location: "Tokyo".to_string(),
            language: Language::Ja,
        }));

        let mut h = harness(BootstrapMode::EagerWeather);
        h.orchestrator.submit("hello").await;
        assert_eq!(
            h.backend.calls()[0],
            Call::CreateWeatherSession {
                location: "New York".to_string(),
                language: Language::En,
            }
        );
    }

    #[tokio::test]
    async fn test_lazy_bootstrap_replaces_with_server_history() {
        let mut h = harness(BootstrapMode::Lazy);
        h.orchestrator.submit("hello").await;

        assert_eq!(h.backend.calls()[0], Call::CreateSession(Language::En));
        assert_eq!(
            h.orchestrator.history().messages(),
            &[
                Message::user("hello"),
                Message::assistant(MockConversation::reply_for("hello")),
            ]
        );
        assert!(h.orchestrator.state().weather().is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_failure_adds_error_and_skips_dispatch() {
        let mut h = harness(BootstrapMode::EagerWeather);
        h.backend.fail_session_creation.store(true, Ordering::SeqCst);
        h.orchestrator.submit("Plans in Paris?").await;

        let calls = h.backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(h.orchestrator.state().session().is_none());
        let messages = h.orchestrator.history().messages();
        assert_eq!(messages[0], Message::user("Plans in Paris?"));
        assert_eq!(messages[1], Message::error("Error fetching weather data"));
        assert!(!h.orchestrator.state().is_loading());

        let mut h = harness(BootstrapMode::Lazy);
        h.backend.fail_session_creation.store(true, Ordering::SeqCst);
        h.backend.set_failure_detail(Some("Language not supported"));
        h.orchestrator.submit("hello").await;
        assert_eq!(
            h.orchestrator.history().messages()[1],
            Message::error("Language not supported")
        );
    }

    #[tokio::test]
    async fn test_dispatch_failure_uses_detail_or_fallback() {
        for mode in MODES {
            let mut h = harness(mode);
            h.orchestrator.submit("hello").await;
            h.backend.fail_dispatch.store(true, Ordering::SeqCst);

            h.orchestrator.submit("again").await;
            assert_eq!(
                h.orchestrator.history().messages().last(),
                Some(&Message::error("Error getting AI response"))
            );

            h.backend.set_failure_detail(Some("Session not found"));
            h.orchestrator.submit("once more").await;
            assert_eq!(
                h.orchestrator.history().messages().last(),
                Some(&Message::error("Session not found"))
            );
            assert!(!h.orchestrator.state().is_loading());
        }
    }

    #[tokio::test]
    async fn test_loading_held_during_dispatch() {
        let mut h = harness(BootstrapMode::Lazy);
        assert!(!h.orchestrator.state().is_loading());
        h.orchestrator.submit("hello").await;
        h.orchestrator.submit("again").await;

        assert_eq!(h.backend.loading_seen(), vec![true, true]);
        assert!(!h.orchestrator.state().is_loading());
    }

    #[tokio::test]
    async fn test_weather_update_replaces_snapshot_once() {
        for mode in MODES {
            let mut h = harness(mode);
            h.orchestrator.submit("hello").await;

            let refreshed = sample_snapshot("Osaka, Japan");
            *h.backend.next_weather_update.lock().unwrap() = Some(refreshed.clone());
            h.orchestrator.submit("What about Osaka?").await;

            assert_eq!(h.orchestrator.state().weather(), Some(&refreshed));
            let carrying = h
                .orchestrator
                .history()
                .messages()
                .iter()
                .filter(|m| m.weather.as_ref() == Some(&refreshed))
                .count();
            assert_eq!(carrying, 1, "mode {}", mode);

            // A later reply without the flag leaves the snapshot alone
            h.orchestrator.submit("thanks").await;
            assert_eq!(h.orchestrator.state().weather(), Some(&refreshed));
        }
    }

    #[tokio::test]
    async fn test_clear_resets_even_when_delete_fails() {
        for fail in [false, true] {
            let mut h = harness(BootstrapMode::EagerWeather);
            h.orchestrator.submit("Plans in Tokyo?").await;
            h.backend.fail_delete.store(fail, Ordering::SeqCst);

            h.orchestrator.clear().await;

            assert!(h.orchestrator.state().session().is_none());
            assert!(h.orchestrator.history().is_empty());
            assert!(h.orchestrator.state().weather().is_none());
            assert!(!h.orchestrator.state().is_loading());
            assert_eq!(
                h.backend.calls().last(),
                Some(&Call::DeleteChat("session-1".to_string()))
            );
        }
    }

    #[tokio::test]
    async fn test_submit_after_clear_bootstraps_again() {
        let mut h = harness(BootstrapMode::Lazy);
        h.orchestrator.submit("hello").await;
        h.orchestrator.clear().await;
        h.orchestrator.submit("hi again").await;

        let creations = h
            .backend
            .calls()
            .into_iter()
            .filter(is_session_creation)
            .count();
        assert_eq!(creations, 2);
        assert_eq!(
            h.orchestrator.state().session().map(|s| s.id.to_string()),
            Some("session-2".to_string())
        );
    }

    #[tokio::test]
    async fn test_clear_without_session_skips_delete() {
        let mut h = harness(BootstrapMode::EagerWeather);
        h.orchestrator.clear().await;
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_history_replay_matches_across_policies() {
        let queries = ["Plans in Kyoto?", "What should I wear?", "Any indoor ideas?"];
        let mut transcripts = Vec::new();

        for mode in MODES {
            let mut h = harness(mode);
            for query in queries {
                h.orchestrator.submit(query).await;
            }

            let stored = serde_json::to_string(h.orchestrator.history().messages()).unwrap();
            let replayed =
                ChatHistoryStore::from_messages(serde_json::from_str(&stored).unwrap());

            let rendered: Vec<_> = h
                .orchestrator
                .history()
                .messages()
                .iter()
                .map(render_message)
                .collect();
            let rendered_replay: Vec<_> = replayed.messages().iter().map(render_message).collect();
            assert_eq!(rendered, rendered_replay, "mode {}", mode);

            transcripts.push(conversation_transcript(replayed.messages()));
        }

        assert_eq!(transcripts[0], transcripts[1]);
        assert!(transcripts[0].contains("user: Any indoor ideas?"));
    }

    #[tokio::test]
    async fn test_dispatch_uses_current_language() {
        let mut h = harness(BootstrapMode::Lazy);
        h.orchestrator.submit("hello").await;
        h.orchestrator.set_language(Language::Ja).await;
        h.orchestrator.submit("こんにちは").await;

        assert!(matches!(
            h.backend.calls().last(),
            Some(Call::Query { language: Language::Ja, .. })
        ));
        assert_eq!(
            h.orchestrator.state().session().map(|s| s.language),
            Some(Language::En)
        );
    }

    #[tokio::test]
    async fn test_set_language_reloads_translations() {
        let mut h = harness(BootstrapMode::EagerWeather);
        h.orchestrator.load_translations().await;
        assert_eq!(h.orchestrator.state().translations().t("clear_chat"), "Clear Chat");

        h.orchestrator.set_language(Language::Ja).await;
        assert_eq!(
            h.orchestrator.state().translations().t("clear_chat"),
            "チャットをクリア"
        );
        assert_eq!(
            h.backend.calls(),
            vec![Call::Translations(Language::En), Call::Translations(Language::Ja)]
        );

        // Same language again is a no-op
        h.orchestrator.set_language(Language::Ja).await;
        assert_eq!(h.backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_example_prompts() {
        let h = harness(BootstrapMode::EagerWeather);
        assert_eq!(
            h.orchestrator.example_prompts().await,
            vec!["What should I wear today?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_lookup_weather() {
        let mut h = harness(BootstrapMode::EagerWeather);
        h.orchestrator.lookup_weather("  London ").await;

        assert_eq!(h.backend.calls(), vec![Call::Weather("London".to_string())]);
        assert_eq!(
            h.orchestrator.history().messages()[0].content,
            "🌤️ Weather for London"
        );
        assert!(h.orchestrator.state().session().is_none());

        h.backend.fail_session_creation.store(true, Ordering::SeqCst);
        h.orchestrator.lookup_weather("Atlantis").await;
        assert_eq!(
            h.orchestrator.history().messages().last(),
            Some(&Message::error("Error fetching weather data"))
        );
        // The previous snapshot stays on display
        assert_eq!(
            h.orchestrator.state().weather().map(|w| w.location.as_str()),
            Some("London")
        );
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(Notice::Info("hi".to_string()).text(), "hi");
        assert_eq!(Notice::Blocking("stop".to_string()).text(), "stop");
    }
}
