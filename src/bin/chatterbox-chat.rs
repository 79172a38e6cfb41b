//! Interactive chat against an OpenAI-compatible completion API.
//!
//! This binary provides a streaming REPL that keeps one conversation in memory and
//! sends its most recent messages with every turn.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings (key from CHATTERBOX_API_KEY)
//! chatterbox-chat
//!
//! # Specify a model and a shorter history
//! chatterbox-chat --model llama-3.3-70b-versatile --window 4
//!
//! # Type replies out slowly behind a cursor
//! chatterbox-chat --delay-ms 30 --cursor
//!
//! # Read the key from a secrets file
//! chatterbox-chat --secrets ~/.chatterbox/secrets.yaml
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Start a new conversation
//! - `/model <name>` - Change the model
//! - `/attach <file>` - Send an image with the next message
//! - `/imagine <prompt>` - Print a link to a generated image
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::time::Duration;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use chatterbox::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, DEFAULT_CURSOR, PlainTextRenderer, Renderer,
    help_text, parse_command,
};
use chatterbox::{ChatClient, ImageLinker, Model, resolve_api_key};

/// Main entry point for the chatterbox-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("chatterbox-chat [OPTIONS]");
    init_logging(args.verbose);
    let config = ChatConfig::from(args);

    let cursor = config.cursor.then_some(DEFAULT_CURSOR);
    let mut renderer = PlainTextRenderer::with_color(config.use_color).with_cursor(cursor);
    let (mut session, linker) = match start(config) {
        Ok(started) => started,
        Err(err) => {
            eprintln!("{}", startup_message(&err));
            std::process::exit(1);
        }
    };
    let mut rl = DefaultEditor::new()?;

    println!("Chatterbox (model: {})", session.config().model);
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Started a new conversation.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Model(model_name) => {
                            session.set_model(Model::from(model_name.as_str()));
                            renderer.print_info(&format!("Model changed to: {}", model_name));
                        }
                        ChatCommand::VisionModel(model_name) => {
                            let model = Model::from(model_name.as_str());
                            let supports_vision = model.supports_vision();
                            session.set_vision_model(model);
                            renderer
                                .print_info(&format!("Vision model changed to: {}", model_name));
                            if !supports_vision {
                                renderer.print_hint(&format!(
                                    "{model_name} is not known to accept images; image turns may be rejected."
                                ));
                            }
                        }
                        ChatCommand::System(prompt) => {
                            session.set_system_prompt(prompt);
                            renderer.print_info(&format!(
                                "System prompt set to: {}",
                                session.config().system_prompt
                            ));
                        }
                        ChatCommand::Window(window) => match session.set_window(window) {
                            Ok(()) => renderer
                                .print_info(&format!("Sending the last {window} messages.")),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Temperature(value) => {
                            session.set_temperature(Some(value));
                            renderer.print_info(&format!("temperature set to {:.2}", value));
                        }
                        ChatCommand::ClearTemperature => {
                            session.set_temperature(None);
                            renderer.print_info("temperature reset to server default");
                        }
                        ChatCommand::Speed(ms) => {
                            session.set_typing_delay(Duration::from_millis(ms));
                            if ms == 0 {
                                renderer.print_info("Typing delay disabled.");
                            } else {
                                renderer.print_info(&format!("Typing delay set to {ms} ms."));
                            }
                        }
                        ChatCommand::Cursor(show) => {
                            session.set_cursor(show);
                            renderer.set_cursor(show.then_some(DEFAULT_CURSOR));
                            if show {
                                renderer.print_info("Cursor shown while streaming.");
                            } else {
                                renderer.print_info("Cursor hidden.");
                            }
                        }
                        ChatCommand::Stream(stream) => {
                            session.set_stream(stream);
                            if stream {
                                renderer.print_info("Streaming replies.");
                            } else {
                                renderer.print_info("Waiting for complete replies.");
                            }
                        }
                        ChatCommand::Attach(path) => match session.attach_image_path(&path) {
                            Ok(image) => renderer.print_info(&format!(
                                "Attached {} ({} bytes encoded); it goes with your next message.",
                                path,
                                image.encoded_len()
                            )),
                            Err(err) => {
                                renderer.print_error(&format!("Failed to attach image: {}", err))
                            }
                        },
                        ChatCommand::Detach => {
                            if session.detach_image() {
                                renderer.print_info("Image detached.");
                            } else {
                                renderer.print_info("No image attached.");
                            }
                        }
                        ChatCommand::Imagine(prompt) => match linker.link(&prompt) {
                            Ok(url) => println!("{url}"),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to API
                println!("Assistant:");
                if let Err(err) = session.submit(line, &mut renderer).await {
                    // The session has already shown the error.
                    tracing::debug!(error = %err, "turn ended without a reply");
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Resolve the key and build everything the REPL needs.
fn start(config: ChatConfig) -> chatterbox::Result<(ChatSession<ChatClient>, ImageLinker)> {
    config.validate()?;
    let api_key = resolve_api_key(None, config.secrets_path.as_deref())?;
    let client = ChatClient::with_options(api_key, config.base_url.clone(), None)?;
    let linker = ImageLinker::new(&config.image_url)?;
    let session = ChatSession::new(client, config)?;
    Ok((session, linker))
}

fn startup_message(err: &chatterbox::Error) -> String {
    format!("chatterbox-chat: {err}")
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_stats(session: &ChatSession<ChatClient>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model);
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Turns: {} answered, {} failed",
        stats.completed_turns, stats.failed_turns
    );
    println!(
        "      Image attached: {}",
        if stats.image_attached { "yes" } else { "no" }
    );
    println!(
        "      Total tokens: {} in / {} out",
        stats.total_usage.prompt_tokens, stats.total_usage.completion_tokens
    );
    if let Some(usage) = stats.last_turn_usage {
        println!(
            "      Last turn tokens: {} in / {} out",
            usage.prompt_tokens, usage.completion_tokens
        );
    }
}

fn print_config(session: &ChatSession<ChatClient>) {
    let stats = session.stats();
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Model: {}", stats.model);
    println!("      Vision model: {}", stats.vision_model);
    println!("      Window: {} messages", stats.window);
    match config.max_tokens {
        Some(max_tokens) => println!("      Max tokens: {}", max_tokens),
        None => println!("      Max tokens: default"),
    }
    match config.temperature {
        Some(temperature) => println!("      Temperature: {:.2}", temperature),
        None => println!("      Temperature: default"),
    }
    if stats.system_prompt.trim().is_empty() {
        println!("      System prompt: (none)");
    } else {
        println!("      System prompt: {}", stats.system_prompt);
    }
    println!(
        "      Streaming: {}",
        if stats.stream { "on" } else { "off" }
    );
    println!("      Typing delay: {} ms", stats.typing_delay.as_millis());
    println!(
        "      Cursor: {}",
        if stats.cursor { "on" } else { "off" }
    );
}
