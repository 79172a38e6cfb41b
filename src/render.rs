//! Output rendering for the chat REPL.
//!
//! [`Renderer`] is the seam between a session and the terminal.  The stream renderer
//! calls [`Renderer::show_partial`] once per fragment with the text accumulated so
//! far, so an implementation can either append the fragment or redraw the whole
//! buffer.

use std::io::{self, Stdout, Write};

use crate::chat::TurnState;

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for yellow text (used for hints).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Glyph shown after the text while a reply is still streaming.
pub const DEFAULT_CURSOR: char = '▌';

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Called each time the session moves to another [`TurnState`].
    fn turn_state(&mut self, state: TurnState) {
        _ = state;
    }

    /// Called before the first fragment of a reply.
    fn start_response(&mut self, model: &str) {
        _ = model;
    }

    /// Show the reply so far.
    ///
    /// `buffer` is everything received for this reply, `fragment` is its newest suffix.
    fn show_partial(&mut self, buffer: &str, fragment: &str);

    /// Called once the reply is complete, with its final text.
    fn finish_response(&mut self, text: &str);

    /// Print an error message, shown in place of the reply.
    fn print_error(&mut self, error: &str);

    /// Print a follow-up suggestion for the last error.
    fn print_hint(&mut self, hint: &str) {
        self.print_info(hint);
    }

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling and typing cursor.
///
/// Fragments are appended to stdout as they arrive, which is equivalent to redrawing
/// the buffer on a terminal.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    cursor: Option<char>,
    cursor_visible: bool,
    line_start: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled and no cursor.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            cursor: None,
            cursor_visible: false,
            line_start: true,
        }
    }

    /// Shows `glyph` after the text while streaming.
    pub fn with_cursor(mut self, glyph: Option<char>) -> Self {
        self.cursor = glyph;
        self
    }

    /// Enables or disables the cursor glyph.
    pub fn set_cursor(&mut self, glyph: Option<char>) {
        self.cursor = glyph;
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn erase_cursor(&mut self) {
        if self.cursor_visible {
            // Back over the glyph, blank it, back again.
            print!("\x08 \x08");
            self.cursor_visible = false;
        }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self, _model: &str) {
        self.cursor_visible = false;
        self.line_start = true;
    }

    fn show_partial(&mut self, _buffer: &str, fragment: &str) {
        self.erase_cursor();
        print!("{fragment}");
        self.line_start = fragment.ends_with('\n');
        if let Some(glyph) = self.cursor {
            print!("{glyph}");
            self.cursor_visible = true;
        }
        self.flush();
    }

    fn finish_response(&mut self, _text: &str) {
        self.erase_cursor();
        if !self.line_start {
            println!();
        }
        self.line_start = true;
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.erase_cursor();
        let lead = if self.line_start { "" } else { "\n" };
        eprintln!("{lead}{}", self.styled(ANSI_RED, &format!("Error: {error}")));
        self.line_start = true;
    }

    fn print_hint(&mut self, hint: &str) {
        eprintln!("{}", self.styled(ANSI_YELLOW, hint));
    }

    fn print_info(&mut self, info: &str) {
        println!("{}", self.styled(ANSI_DIM, info));
        self.line_start = true;
        self.flush();
    }
}
