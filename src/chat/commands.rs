//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the API.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history and any attached image.
    Clear,

    /// Change the text model.
    Model(String),

    /// Change the vision model.
    VisionModel(String),

    /// Set the system prompt.
    /// `None` restores the default system prompt.
    System(Option<String>),

    /// Set how many past messages are sent per request.
    Window(usize),

    /// Set the sampling temperature.
    Temperature(f32),

    /// Clear the sampling temperature (use the server default).
    ClearTemperature,

    /// Set the typing delay in milliseconds.  Zero disables it.
    Speed(u64),

    /// Show or hide the streaming cursor.
    Cursor(bool),

    /// Stream replies or wait for them whole.
    Stream(bool),

    /// Attach an image file to the next message.
    Attach(String),

    /// Drop the attached image.
    Detach,

    /// Print an image-generation link for a prompt.
    Imagine(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics (message count, current model, etc.).
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use chatterbox::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model llama-3.3-70b-versatile").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" | "new" => ChatCommand::Clear,
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "vision_model" | "vision" => match argument {
            Some(model) => ChatCommand::VisionModel(model.to_string()),
            None => ChatCommand::Invalid("/vision_model requires a model name".to_string()),
        },
        "system" => ChatCommand::System(argument.map(|s| s.to_string())),
        "window" => match argument.map(str::parse::<usize>) {
            Some(Ok(n)) if n >= 1 => ChatCommand::Window(n),
            Some(_) => ChatCommand::Invalid("/window expects an integer of at least 1".to_string()),
            None => ChatCommand::Invalid("/window requires a value".to_string()),
        },
        "temperature" => match argument {
            Some(arg) if arg.eq_ignore_ascii_case("clear") => ChatCommand::ClearTemperature,
            Some(arg) => match parse_f32_in_range(arg, 0.0, 2.0) {
                Ok(value) => ChatCommand::Temperature(value),
                Err(err) => ChatCommand::Invalid(format!("/temperature {err}")),
            },
            None => ChatCommand::Invalid("/temperature requires a value".to_string()),
        },
        "speed" | "delay" => match argument.map(str::parse::<u64>) {
            Some(Ok(ms)) => ChatCommand::Speed(ms),
            Some(Err(_)) => {
                ChatCommand::Invalid("/speed expects a delay in milliseconds".to_string())
            }
            None => ChatCommand::Invalid("/speed requires a value".to_string()),
        },
        "cursor" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Cursor(value),
            None => ChatCommand::Invalid("/cursor expects 'on' or 'off'".to_string()),
        },
        "stream" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Stream(value),
            None => ChatCommand::Invalid("/stream expects 'on' or 'off'".to_string()),
        },
        "attach" | "image" => match argument {
            Some(path) => ChatCommand::Attach(path.to_string()),
            None => ChatCommand::Invalid("/attach requires a file path".to_string()),
        },
        "detach" => ChatCommand::Detach,
        "imagine" => match argument {
            Some(prompt) => ChatCommand::Imagine(prompt.to_string()),
            None => ChatCommand::Invalid("/imagine requires a prompt".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_f32_in_range(value: &str, min: f32, max: f32) -> Result<f32, String> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| format!("expects a value between {min} and {max}"))?;
    if parsed.is_finite() && parsed >= min && parsed <= max {
        Ok(parsed)
    } else {
        Err(format!("expects a value between {min} and {max}"))
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear, /new           Start a new conversation
  /model <name>          Change the text model (e.g., /model llama-3.3-70b-versatile)
  /vision_model <name>   Change the model used for messages with images
  /system [prompt]       Set system prompt (no argument restores the default)
  /window <n>            Send the last n messages with each request
  /temperature <v>       Set temperature 0.0-2.0 (use 'clear' to reset)
  /speed <ms>            Pause after each streamed fragment (0 disables)
  /cursor on|off         Show or hide the streaming cursor
  /stream on|off         Stream replies or wait for them whole
  /attach <file>         Attach an image to your next message
  /detach                Drop the attached image
  /imagine <prompt>      Print a link to a generated image
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/new"), Some(ChatCommand::Clear));
    }

    #[test]
    fn parse_models() {
        assert_eq!(
            parse_command("/model   llama-3.3-70b-versatile  "),
            Some(ChatCommand::Model("llama-3.3-70b-versatile".to_string()))
        );
        assert_eq!(
            parse_command("/vision_model meta-llama/llama-4-maverick-17b-128e-instruct"),
            Some(ChatCommand::VisionModel(
                "meta-llama/llama-4-maverick-17b-128e-instruct".to_string()
            ))
        );
        assert_eq!(
            parse_command("/model"),
            Some(ChatCommand::Invalid(
                "/model requires a model name".to_string()
            ))
        );
    }

    #[test]
    fn parse_system() {
        assert_eq!(
            parse_command("/system You are a pirate"),
            Some(ChatCommand::System(Some("You are a pirate".to_string())))
        );
        assert_eq!(parse_command("/system"), Some(ChatCommand::System(None)));
    }

    #[test]
    fn parse_window() {
        assert_eq!(parse_command("/window 4"), Some(ChatCommand::Window(4)));
        assert!(matches!(
            parse_command("/window 0"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("at least 1")
        ));
        assert!(matches!(
            parse_command("/window"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_temperature() {
        assert_eq!(
            parse_command("/temperature 0.5"),
            Some(ChatCommand::Temperature(0.5))
        );
        assert_eq!(
            parse_command("/temperature clear"),
            Some(ChatCommand::ClearTemperature)
        );
        assert!(matches!(
            parse_command("/temperature 3"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("between 0 and 2")
        ));
        assert!(matches!(
            parse_command("/temperature"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_speed() {
        assert_eq!(parse_command("/speed 25"), Some(ChatCommand::Speed(25)));
        assert_eq!(parse_command("/speed 0"), Some(ChatCommand::Speed(0)));
        assert!(matches!(
            parse_command("/speed fast"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("milliseconds")
        ));
    }

    #[test]
    fn parse_toggles() {
        assert_eq!(parse_command("/cursor on"), Some(ChatCommand::Cursor(true)));
        assert_eq!(parse_command("/cursor OFF"), Some(ChatCommand::Cursor(false)));
        assert_eq!(parse_command("/stream off"), Some(ChatCommand::Stream(false)));
        assert!(matches!(
            parse_command("/stream maybe"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn parse_image_commands() {
        assert_eq!(
            parse_command("/attach photos/cat.png"),
            Some(ChatCommand::Attach("photos/cat.png".to_string()))
        );
        assert_eq!(parse_command("/detach"), Some(ChatCommand::Detach));
        assert_eq!(
            parse_command("/imagine a lighthouse at dusk"),
            Some(ChatCommand::Imagine("a lighthouse at dusk".to_string()))
        );
        assert!(matches!(
            parse_command("/imagine   "),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_stats_and_config() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("what is 1/2?"), None);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid("Unknown command: /frobnicate".to_string()))
        );
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for name in [
            "/clear", "/model", "/vision_model", "/system", "/window", "/temperature", "/speed",
            "/cursor",
            "/stream", "/attach", "/detach", "/imagine", "/stats", "/config", "/help", "/quit",
        ] {
            assert!(help.contains(name), "help is missing {name}");
        }
    }
}
