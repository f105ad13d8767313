//! Ordered conversation history

use super::message::{Message, MessageKind, Role, WeatherSnapshot};
use tracing::debug;

/// Ordered messages of the current conversation
///
/// Only the orchestrator mutates the store; everything else reads it
/// through [`ChatHistoryStore::messages`].
#[derive(Debug, Clone, Default)]
pub(crate) struct ChatHistoryStore {
    messages: Vec<Message>,
}

impl ChatHistoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously stored messages
    #[cfg(test)]
    pub(crate) fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub(crate) fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }

    /// Replace the history with the server's canonical list
    ///
    /// The server only knows the text exchange. Weather attachments held
    /// locally are carried over to the server entries that match them.
    pub(crate) fn replace_with(&mut self, server: Vec<Message>) {
        let mut local_text = self
            .messages
            .iter()
            .filter(|message| message.kind == MessageKind::Text);

        let reconciled: Vec<Message> = server
            .into_iter()
            .map(|mut incoming| {
                if let Some(local) = local_text.next() {
                    if incoming.weather.is_none() && local.same_utterance(&incoming) {
                        incoming.weather = local.weather.clone();
                    }
                }
                incoming
            })
            .collect();

        debug!(
            before = self.messages.len(),
            after = reconciled.len(),
            "Replaced chat history with server list"
        );
        self.messages = reconciled;
    }

    /// Attach a snapshot to the latest assistant text message
    ///
    /// Returns false when there is no assistant reply to attach to.
    pub(crate) fn attach_weather_to_last_reply(&mut self, snapshot: WeatherSnapshot) -> bool {
        match self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == Role::Assistant && m.kind == MessageKind::Text)
        {
            Some(reply) => {
                reply.weather = Some(snapshot);
                true
            }
            None => false,
        }
    }
}
