//! Parsing of terminal input lines

use crate::language::Language;
use std::path::PathBuf;

/// One line of user input
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    /// Plain text for the assistant
    Say(String),
    Record,
    Stop,
    Cancel,
    Upload(PathBuf),
    Clear,
    Language(Language),
    Weather(String),
    Examples,
    Status,
    Transcript,
    Help,
    Quit,
    /// Anything starting with `/` that is not understood
    Invalid(String),
}

impl Command {
    pub(crate) fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Say(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match (name.to_lowercase().as_str(), arg) {
            ("record" | "rec", "") => Command::Record,
            ("stop", "") => Command::Stop,
            ("cancel", "") => Command::Cancel,
            ("clear", "") => Command::Clear,
            ("examples", "") => Command::Examples,
            ("status", "") => Command::Status,
            ("transcript", "") => Command::Transcript,
            ("help" | "?", "") => Command::Help,
            ("quit" | "exit" | "q", "") => Command::Quit,
            ("upload", path) if !path.is_empty() => Command::Upload(PathBuf::from(path)),
            ("weather", location) if !location.is_empty() => {
                Command::Weather(location.to_string())
            }
            ("lang" | "language", code) => match code.parse::<Language>() {
                Ok(language) => Command::Language(language),
                Err(e) => Command::Invalid(e.to_string()),
            },
            _ => Command::Invalid(format!("Unknown command: {}", line)),
        }
    }

    /// Commands that start new work and are refused while busy
    pub(crate) fn needs_idle(&self) -> bool {
        matches!(
            self,
            Command::Say(_) | Command::Record | Command::Upload(_) | Command::Weather(_)
        )
    }
}

pub(crate) const HELP: &str = "\
Type a question and press Enter, or use a command:
  /record            start recording from the microphone
  /stop              stop recording and send the transcript
  /cancel            discard the current recording
  /upload <file>     transcribe an audio file (mp3, wav, flac, m4a, ogg, opus, webm)
  /weather <city>    show the current weather for a place
  /lang <en|ja>      switch language
  /examples          show example prompts
  /status            show language, session and recording state
  /transcript        print the conversation as plain text
  /clear             start a new conversation
  /quit              exit";
