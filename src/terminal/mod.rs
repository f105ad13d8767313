//! Line-oriented terminal front end
//!
//! Reads commands and questions from stdin, drives the orchestrator and
//! prints whatever changed in the conversation after each step. Input that
//! would start new work is refused while a request or recording is in
//! progress.

mod command;
mod display;

use crate::audio::RecordingState;
use crate::chat::render::{conversation_transcript, divergence_index};
use crate::chat::{Message, WeatherSnapshot};
use crate::orchestrator::{Notice, SessionOrchestrator};
use anyhow::Context;
use colored::Colorize;
use command::{Command, HELP};
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Interactive chat session on the terminal
pub(crate) struct Terminal {
    orchestrator: SessionOrchestrator,
    /// Messages already printed, in order
    shown: Vec<Message>,
    shown_weather: Option<WeatherSnapshot>,
}

impl Terminal {
    pub(crate) fn new(orchestrator: SessionOrchestrator) -> Self {
        Self {
            orchestrator,
            shown: Vec::new(),
            shown_weather: None,
        }
    }

    /// Run until `/quit`, end of input or Ctrl-C
    pub(crate) async fn run(mut self) -> anyhow::Result<()> {
        self.orchestrator.load_translations().await;
        self.print_banner();
        self.print_welcome().await;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        // One listener for the whole session, so Ctrl-C is seen while a
        // command is running as well as at the prompt
        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);
        loop {
            self.print_prompt();

            let line = match unless_interrupted(lines.next_line(), interrupted.as_mut()).await {
                Some(line) => line.context("Failed to read from standard input")?,
                None => {
                    info!("Interrupted");
                    None
                }
            };
            let Some(line) = line else {
                break;
            };

            let command = match Command::parse(&line) {
                Command::Quit => break,
                command => command,
            };
            if unless_interrupted(self.handle(command), interrupted.as_mut())
                .await
                .is_none()
            {
                info!("Interrupted while handling a command");
                break;
            }
            self.refresh();
        }

        // Releases the microphone if a recording was left running
        self.orchestrator.cancel_recording();
        println!("{}", "Goodbye!".bright_green());
        Ok(())
    }

    async fn handle(&mut self, command: Command) {
        if command.needs_idle() && !self.orchestrator.accepts_input() {
            let hint = match self.orchestrator.recording_state() {
                RecordingState::Recording => "Recording in progress. Use /stop or /cancel first.",
                RecordingState::Transcribing => "Still transcribing, please wait.",
                RecordingState::Idle => "Still waiting for the previous request.",
            };
            println!("{}", hint.yellow());
            return;
        }

        match command {
            Command::Say(text) => self.orchestrator.submit(&text).await,
            Command::Record => match self.orchestrator.start_recording().await {
                Some(notice) => print_notice(&notice),
                None => println!("{}", "● Recording... type /stop when done.".red()),
            },
            Command::Stop => {
                println!("{}", "Transcribing...".dimmed());
                if let Some(notice) = self.orchestrator.stop_recording().await {
                    print_notice(&notice);
                }
            }
            Command::Cancel => {
                self.orchestrator.cancel_recording();
                println!("{}", "Recording discarded.".dimmed());
            }
            Command::Upload(path) => {
                println!("{}", format!("Transcribing {}...", path.display()).dimmed());
                if let Some(notice) = self.orchestrator.transcribe_file(&path).await {
                    print_notice(&notice);
                }
            }
            Command::Clear => {
                self.orchestrator.clear().await;
                self.shown.clear();
                self.shown_weather = None;
                println!("{}", self.label("clear_chat", "Clear Chat").dimmed());
                self.print_welcome().await;
            }
            Command::Language(language) => {
                self.orchestrator.set_language(language).await;
                println!(
                    "{} {}",
                    self.label("language", "Language").dimmed(),
                    language
                );
                if self.orchestrator.history().is_empty() {
                    self.print_welcome().await;
                }
            }
            Command::Weather(location) => self.orchestrator.lookup_weather(&location).await,
            Command::Examples => self.print_examples().await,
            Command::Status => self.print_status(),
            Command::Transcript => {
                println!("{}", conversation_transcript(self.orchestrator.history().messages()));
            }
            Command::Help => println!("{}", HELP),
            Command::Invalid(message) => {
                println!("{}", message.yellow());
                println!("{}", "Type /help for the list of commands.".dimmed());
            }
            Command::Quit => {}
        }
    }

    /// Print messages and weather that changed since the last refresh
    fn refresh(&mut self) {
        let current = self.orchestrator.history().messages();
        let from = divergence_index(&self.shown, current);
        if from < self.shown.len() {
            println!("{}", "(conversation synced with server)".dimmed());
        }
        for message in &current[from..] {
            println!("{}\n", display::format_message(message));
        }
        self.shown = current.to_vec();

        let weather = self.orchestrator.state().weather();
        if weather != self.shown_weather.as_ref() {
            if let Some(snapshot) = weather {
                let title = self.label("weather_info", "Current Weather Information");
                println!("{}\n", display::format_weather_panel(title, snapshot));
            }
            self.shown_weather = weather.cloned();
        }
    }

    /// Translated UI string, or the English default before translations load
    fn label<'a>(&'a self, key: &'a str, default: &'a str) -> &'a str {
        let translations = self.orchestrator.state().translations();
        if translations.is_empty() {
            default
        } else {
            translations.t(key)
        }
    }

    fn print_banner(&self) {
        println!(
            "{}",
            self.label("title", "🌤️ Weather Activity Advisor")
                .bright_magenta()
                .bold()
        );
        println!(
            "{}",
            self.label(
                "subtitle",
                "Get personalized activity suggestions based on real-time weather"
            )
            .bright_black()
        );
        println!("{}\n", "Type /help for commands.".bright_black());
    }

    async fn print_welcome(&self) {
        let (title, body) = self.orchestrator.state().language().welcome();
        println!("{}", title.bold());
        println!("{}", body);
        self.print_examples().await;
    }

    async fn print_examples(&self) {
        let examples = self.orchestrator.example_prompts().await;
        println!("{}", self.label("example_prompts", "Example Prompts:").bold());
        for example in examples {
            println!("  • {}", example);
        }
        println!();
    }

    fn print_status(&self) {
        let state = self.orchestrator.state();
        let session = match state.session() {
            Some(session) => format!("{} ({})", session.id, session.language),
            None => "none".to_string(),
        };
        println!("  {:<10} {}", "language", state.language());
        println!("  {:<10} {}", "bootstrap", self.orchestrator.mode());
        println!("  {:<10} {}", "session", session);
        println!("  {:<10} {:?}", "recording", self.orchestrator.recording_state());
        println!("  {:<10} {}", "messages", self.orchestrator.history().messages().len());
    }

    fn print_prompt(&self) {
        let prompt = match self.orchestrator.recording_state() {
            RecordingState::Recording => "[rec] > ".red().to_string(),
            _ => "> ".bright_cyan().to_string(),
        };
        print!("{}", prompt);
        let _ = std::io::stdout().flush();
    }
}

/// Drive `work` to completion, or drop it and return `None` once `interrupt`
/// resolves
async fn unless_interrupted<W, I>(work: W, interrupt: Pin<&mut I>) -> Option<W::Output>
where
    W: Future,
    I: Future,
{
    tokio::select! {
        output = work => Some(output),
        _ = interrupt => None,
    }
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::Blocking(text) => println!("{} {}", "⚠".red().bold(), text.red().bold()),
        Notice::Info(text) => println!("{}", text.yellow()),
    }
}
