//! Conversation backend client
//!
//! A thin request/response layer over the session, suggestion, weather,
//! translation and example-prompt endpoints. No retries, no caching: every
//! failure comes back as an [`ApiError`] for the orchestrator to handle.

mod messages;
#[cfg(test)]
pub(crate) mod mock;

pub(crate) use messages::{SessionId, SuggestionRequest, SuggestionResponse, WeatherSession};

use crate::api::{self, Backend};
use crate::chat::WeatherSnapshot;
use crate::error::ApiError;
use crate::language::Language;
use async_trait::async_trait;
use messages::{CreateSessionResponse, ExamplesResponse, WeatherRequest};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Operations the orchestrator needs from the backend
#[async_trait]
pub(crate) trait ConversationApi: Send + Sync {
    /// `GET /api/translations/{language}`
    async fn load_translations(
        &self,
        language: Language,
    ) -> Result<HashMap<String, String>, ApiError>;

    /// `GET /api/examples/{language}`
    async fn example_prompts(&self, language: Language) -> Result<Vec<String>, ApiError>;

    /// `POST /api/weather` - snapshot without a session
    async fn fetch_weather(&self, location: &str) -> Result<WeatherSnapshot, ApiError>;

    /// `POST /api/weather-with-suggestions?language=`
    async fn create_session_with_weather(
        &self,
        location: &str,
        language: Language,
    ) -> Result<WeatherSession, ApiError>;

    /// `POST /api/session/create?language=`
    async fn create_session(&self, language: Language) -> Result<SessionId, ApiError>;

    /// `POST /api/suggestions`
    async fn send_query(&self, request: &SuggestionRequest)
        -> Result<SuggestionResponse, ApiError>;

    /// `DELETE /api/session/{id}/chat`
    async fn delete_session_chat(&self, session_id: &SessionId) -> Result<(), ApiError>;
}

/// HTTP implementation of [`ConversationApi`]
pub(crate) struct ConversationClient {
    backend: Backend,
}

impl ConversationClient {
    pub(crate) fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ConversationApi for ConversationClient {
    #[instrument(skip(self))]
    async fn load_translations(
        &self,
        language: Language,
    ) -> Result<HashMap<String, String>, ApiError> {
        let url = self
            .backend
            .endpoint(&["api", "translations", language.code()])?;
        let response = self.backend.http().get(url).send().await?;
        let translations: HashMap<String, String> = api::decode_json(response).await?;
        debug!(count = translations.len(), "Loaded translations");
        Ok(translations)
    }

    #[instrument(skip(self))]
    async fn example_prompts(&self, language: Language) -> Result<Vec<String>, ApiError> {
        let url = self.backend.endpoint(&["api", "examples", language.code()])?;
        let response = self.backend.http().get(url).send().await?;
        let examples: ExamplesResponse = api::decode_json(response).await?;
        Ok(examples.examples)
    }

    #[instrument(skip(self))]
    async fn fetch_weather(&self, location: &str) -> Result<WeatherSnapshot, ApiError> {
        let url = self.backend.endpoint(&["api", "weather"])?;
        let response = self
            .backend
            .http()
            .post(url)
            .json(&WeatherRequest { location })
            .send()
            .await?;
        api::decode_json(response).await
    }

    #[instrument(skip(self))]
    async fn create_session_with_weather(
        &self,
        location: &str,
        language: Language,
    ) -> Result<WeatherSession, ApiError> {
        let url = self.backend.endpoint(&["api", "weather-with-suggestions"])?;
        let response = self
            .backend
            .http()
            .post(url)
            .query(&[("language", language.code())])
            .json(&WeatherRequest { location })
            .send()
            .await?;
        let session: WeatherSession = api::decode_json(response).await?;
        info!(
            session_id = %session.session_id,
            location = %session.weather.location,
            "Created weather-seeded session"
        );
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn create_session(&self, language: Language) -> Result<SessionId, ApiError> {
        let url = self.backend.endpoint(&["api", "session", "create"])?;
        let response = self
            .backend
            .http()
            .post(url)
            .query(&[("language", language.code())])
            .send()
            .await?;
        let created: CreateSessionResponse = api::decode_json(response).await?;
        info!(session_id = %created.session_id, "Created empty session");
        Ok(created.session_id)
    }

    #[instrument(skip(self, request), fields(session_id = %request.session_id, query_len = request.query.len()))]
    async fn send_query(
        &self,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse, ApiError> {
        let url = self.backend.endpoint(&["api", "suggestions"])?;
        let response = self.backend.http().post(url).json(request).send().await?;
        let suggestion: SuggestionResponse = api::decode_json(response).await?;
        debug!(
            weather_updated = suggestion.weather_updated,
            history_len = suggestion.chat_history.as_ref().map(Vec::len),
            "Received suggestion"
        );
        Ok(suggestion)
    }

    #[instrument(skip(self))]
    async fn delete_session_chat(&self, session_id: &SessionId) -> Result<(), ApiError> {
        let url = self
            .backend
            .endpoint(&["api", "session", session_id.as_str(), "chat"])?;
        let response = self.backend.http().delete(url).send().await?;
        api::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::StubServer;

    const WEATHER_JSON: &str = r#"{
        "location": "Tokyo, Japan", "condition": "Clear", "icon": "",
        "temperature": "21.0°C / 69.8°F", "feels_like": "21.0°C",
        "humidity": "40%", "wind": "9.0 km/h", "uv_index": 4.0,
        "precipitation": "0.0 mm", "visibility": "10 km",
        "local_time": "2024-05-01 10:00"
    }"#;

    #[tokio::test]
    async fn test_create_session_sends_language() {
        let stub = StubServer::respond(200, r#"{"session_id": "abc-123"}"#).await;
        let client = ConversationClient::new(stub.backend.clone());

        let session_id = client.create_session(Language::Ja).await.unwrap();
        assert_eq!(session_id, SessionId::new("abc-123"));

        let request = stub.request().await;
        assert_eq!(
            request.request_line(),
            "POST /api/session/create?language=ja HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_weather_session_sends_location_and_language() {
        let body = format!(r#"{{"session_id": "s-1", "weather": {}}}"#, WEATHER_JSON);
        let stub = StubServer::respond(200, &body).await;
        let client = ConversationClient::new(stub.backend.clone());

        let session = client
            .create_session_with_weather("Tokyo", Language::En)
            .await
            .unwrap();
        assert_eq!(session.session_id, SessionId::new("s-1"));
        assert_eq!(session.weather.location, "Tokyo, Japan");

        let request = stub.request().await;
        assert_eq!(
            request.request_line(),
            "POST /api/weather-with-suggestions?language=en HTTP/1.1"
        );
        let sent: serde_json::Value = serde_json::from_str(&request.body_text()).unwrap();
        assert_eq!(sent, serde_json::json!({ "location": "Tokyo" }));
    }

    #[tokio::test]
    async fn test_send_query_body() {
        let stub = StubServer::respond(200, r#"{"suggestion": "Visit a museum."}"#).await;
        let client = ConversationClient::new(stub.backend.clone());

        let reply = client
            .send_query(&SuggestionRequest {
                session_id: SessionId::new("s-1"),
                query: "Rainy day plans?".to_string(),
                language: Language::En,
            })
            .await
            .unwrap();
        assert_eq!(reply.suggestion, "Visit a museum.");

        let request = stub.request().await;
        assert_eq!(request.request_line(), "POST /api/suggestions HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&request.body_text()).unwrap();
        assert_eq!(
            sent,
            serde_json::json!({
                "session_id": "s-1",
                "query": "Rainy day plans?",
                "language": "en"
            })
        );
    }

    #[tokio::test]
    async fn test_delete_chat_escapes_session_id() {
        let stub = StubServer::respond(200, r#"{"message": "ok"}"#).await;
        let client = ConversationClient::new(stub.backend.clone());

        client
            .delete_session_chat(&SessionId::new("a/b c"))
            .await
            .unwrap();

        let request = stub.request().await;
        assert_eq!(
            request.request_line(),
            "DELETE /api/session/a%2Fb%20c/chat HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_server_detail_is_kept() {
        let stub =
            StubServer::respond(404, r#"{"detail": "Location 'Atlantis' not found"}"#).await;
        let client = ConversationClient::new(stub.backend.clone());

        let error = client.fetch_weather("Atlantis").await.unwrap_err();
        assert!(matches!(error, ApiError::Server { status: 404, .. }));
        assert_eq!(error.detail(), Some("Location 'Atlantis' not found"));

        let request = stub.request().await;
        assert_eq!(request.request_line(), "POST /api/weather HTTP/1.1");
    }

    #[tokio::test]
    async fn test_example_prompts_path() {
        let stub = StubServer::respond(200, r#"{"examples": ["What should I wear?"]}"#).await;
        let client = ConversationClient::new(stub.backend.clone());

        let examples = client.example_prompts(Language::Ja).await.unwrap();
        assert_eq!(examples, vec!["What should I wear?".to_string()]);
        assert_eq!(
            stub.request().await.request_line(),
            "GET /api/examples/ja HTTP/1.1"
        );
    }
}
