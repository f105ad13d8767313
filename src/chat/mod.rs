//! Conversation model: messages, weather snapshots, history and rendering

mod history;
mod message;
pub(crate) mod render;

pub(crate) use history::ChatHistoryStore;
pub(crate) use message::{Message, WeatherSnapshot};

#[cfg(test)]
pub(crate) use message::{sample_snapshot, MessageKind, Role};
