//! Text formatting of rendered messages for the terminal

use crate::chat::render::{self, RenderedMessage, Span, TextSegment, WeatherCard};
use crate::chat::{Message, WeatherSnapshot};
use colored::Colorize;

/// Format one message as terminal lines
pub(crate) fn format_message(message: &Message) -> String {
    match render::render_message(message) {
        RenderedMessage::User(text) => format!("{} {}", "you>".green().bold(), text),
        RenderedMessage::Assistant { segments, weather } => {
            let mut out = format!("{}\n", "assistant>".cyan().bold());
            out.push_str(&format_segments(&segments));
            if let Some(card) = weather {
                out.push('\n');
                out.push_str(&format_card(&card));
            }
            out
        }
        RenderedMessage::Weather { title, card } => {
            let mut out = title.bright_yellow().bold().to_string();
            if let Some(card) = card {
                out.push('\n');
                out.push_str(&format_card(&card));
            }
            out
        }
        RenderedMessage::Error(text) => format!("{} {}", "error>".red().bold(), text.red()),
    }
}

fn format_segments(segments: &[TextSegment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            TextSegment::Heading(text) => format!("  {}", text.bold().underline()),
            TextSegment::Bullet(spans) => format!("  • {}", format_spans(spans)),
            TextSegment::Paragraph(spans) => format!("  {}", format_spans(spans)),
            TextSegment::Blank => String::new(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Plain(text) => text.normal().to_string(),
            Span::Bold(text) => text.bold().to_string(),
        })
        .collect()
}

fn format_card(card: &WeatherCard) -> String {
    format!(
        "  {} {}  💧 {}  💨 {}  ☀️ {}",
        card.temperature.bold(),
        card.condition,
        card.humidity,
        card.wind,
        card.uv
    )
}

/// Full snapshot, shown when the current weather changes
pub(crate) fn format_weather_panel(title: &str, snapshot: &WeatherSnapshot) -> String {
    let mut out = format!("── {} ──", title).bright_blue().bold().to_string();
    for (label, value) in render::weather_panel(snapshot) {
        out.push_str(&format!("\n  {} {}", format!("{:<14}", label).dimmed(), value));
    }
    out
}
