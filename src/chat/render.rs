//! Structured rendering of chat messages
//!
//! Backend text is never treated as markup for a display engine. It is
//! parsed line by line into plain segments (headings, bullets, bold spans,
//! paragraphs) that the front end prints however it likes.

use super::message::{Message, MessageKind, Role, WeatherSnapshot};

/// Inline span within a paragraph or bullet
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Span {
    Plain(String),
    Bold(String),
}

/// One rendered line of assistant text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TextSegment {
    Heading(String),
    Bullet(Vec<Span>),
    Paragraph(Vec<Span>),
    Blank,
}

/// Compact weather summary shown inside the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WeatherCard {
    pub(crate) temperature: String,
    pub(crate) condition: String,
    pub(crate) humidity: String,
    pub(crate) wind: String,
    pub(crate) uv: String,
}

/// Message ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RenderedMessage {
    User(String),
    Assistant {
        segments: Vec<TextSegment>,
        weather: Option<WeatherCard>,
    },
    Weather {
        title: String,
        card: Option<WeatherCard>,
    },
    Error(String),
}

/// Render one message
pub(crate) fn render_message(message: &Message) -> RenderedMessage {
    match (message.kind, message.role) {
        (MessageKind::Weather, _) => RenderedMessage::Weather {
            title: message.content.clone(),
            card: message.weather.as_ref().map(weather_card),
        },
        (MessageKind::Error, _) => RenderedMessage::Error(message.content.clone()),
        (MessageKind::Text, Role::User) => RenderedMessage::User(message.content.clone()),
        (MessageKind::Text, Role::Assistant) => RenderedMessage::Assistant {
            segments: parse_segments(&message.content),
            weather: message.weather.as_ref().map(weather_card),
        },
    }
}

/// Split assistant text into line segments
pub(crate) fn parse_segments(text: &str) -> Vec<TextSegment> {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.is_empty() {
                TextSegment::Blank
            } else if let Some(content) = trimmed
                .strip_prefix("### ")
                .or_else(|| trimmed.strip_prefix("## "))
                .or_else(|| trimmed.strip_prefix("# "))
            {
                TextSegment::Heading(content.to_string())
            } else if let Some(content) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                TextSegment::Bullet(parse_spans(content))
            } else {
                TextSegment::Paragraph(parse_spans(line))
            }
        })
        .collect()
}

/// Parse `**bold**` spans; an unmatched marker is kept as plain text
fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some(start) = remaining.find("**") else {
            spans.push(Span::Plain(remaining.to_string()));
            break;
        };
        let after_start = &remaining[start + 2..];
        let Some(end) = after_start.find("**") else {
            spans.push(Span::Plain(remaining.to_string()));
            break;
        };
        if start > 0 {
            spans.push(Span::Plain(remaining[..start].to_string()));
        }
        spans.push(Span::Bold(after_start[..end].to_string()));
        remaining = &after_start[end + 2..];
    }

    spans
}

/// Compact card: first temperature unit, wind speed only
pub(crate) fn weather_card(snapshot: &WeatherSnapshot) -> WeatherCard {
    let temperature = snapshot
        .temperature
        .split(" / ")
        .next()
        .unwrap_or(&snapshot.temperature)
        .to_string();
    let wind_speed = snapshot.wind.split(' ').next().unwrap_or(&snapshot.wind);

    WeatherCard {
        temperature,
        condition: snapshot.condition.clone(),
        humidity: snapshot.humidity.clone(),
        wind: format!("{} km/h", wind_speed),
        uv: format!("UV {}", snapshot.uv_index),
    }
}

/// Full snapshot as labelled lines, for the weather side panel
pub(crate) fn weather_panel(snapshot: &WeatherSnapshot) -> Vec<(&'static str, String)> {
    vec![
        ("Location", snapshot.location.clone()),
        ("Condition", snapshot.condition.clone()),
        ("Temperature", snapshot.temperature.clone()),
        ("Feels like", snapshot.feels_like.clone()),
        ("Humidity", snapshot.humidity.clone()),
        ("Wind", snapshot.wind.clone()),
        ("UV Index", snapshot.uv_index.to_string()),
        ("Precipitation", snapshot.precipitation.clone()),
        ("Visibility", snapshot.visibility.clone()),
        ("Local Time", snapshot.local_time.clone()),
    ]
}

/// Plain-text transcript of the user/assistant exchange
///
/// Weather cards and error notices are presentation extras and are left
/// out, so the transcript only depends on what was said.
pub(crate) fn conversation_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.kind == MessageKind::Text)
        .map(|m| {
            let speaker = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Index from which `current` differs from what was already shown
pub(crate) fn divergence_index(shown: &[Message], current: &[Message]) -> usize {
    shown
        .iter()
        .zip(current)
        .take_while(|(a, b)| a == b)
        .count()
}
