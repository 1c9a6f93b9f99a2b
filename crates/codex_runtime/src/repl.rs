//! The interactive command loop.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use codex_foundation::{Error, ErrorKind, Result};
use tracing::debug;

use crate::command::{Command, CommandError, parse_command, vocabulary};
use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::Session;

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Stores and paths.
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a REPL with the rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a REPL with the given editor and an empty session.
    pub fn with_editor(editor: E) -> Self {
        Self {
            editor,
            session: Session::default(),
            show_banner: true,
            prompt: "codex> ".to_string(),
        }
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Consumes the REPL, returning its session.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Runs the loop until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }
        self.refresh_keywords();

        loop {
            let line = match self.editor.read_line(&self.prompt)? {
                ReadResult::Line(line) => line,
                ReadResult::Interrupted => {
                    println!();
                    continue;
                }
                ReadResult::Eof => break,
            };
            if line.trim().is_empty() {
                continue;
            }
            self.editor.add_history(&line);

            match self.execute_line(&line) {
                Ok(Some(output)) => {
                    if !output.is_empty() {
                        println!("{output}");
                    }
                }
                Ok(None) => break,
                Err(e) => self.print_error(&e),
            }
            self.refresh_keywords();
        }

        println!("\nGoodbye!");
        Ok(())
    }

    /// Parses and runs one line.
    ///
    /// Returns `None` when the line asks to quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not parse or the command fails.
    pub fn execute_line(
        &mut self,
        line: &str,
    ) -> std::result::Result<Option<String>, CommandError> {
        let command = parse_command(line)?;
        debug!(?command, "executing");
        if command == Command::Quit {
            return Ok(None);
        }
        self.session.execute(command).map(Some)
    }

    /// Runs every command in a script file, stopping at the first failure.
    ///
    /// Blank lines and lines starting with `#` are skipped. Returns the
    /// output of each command that printed something.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or a
    /// [`CommandError::Script`] naming the failing line.
    pub fn eval_file(&mut self, path: &Path) -> std::result::Result<Vec<String>, CommandError> {
        let source = fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorKind::Io(format!(
                "failed to read '{}': {e}",
                path.display()
            )))
        })?;

        let mut outputs = Vec::new();
        for (index, line) in source.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match self.execute_line(trimmed) {
                Ok(Some(output)) if !output.is_empty() => outputs.push(output),
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    return Err(CommandError::Script {
                        location: format!("{}:{}", path.display(), index + 1),
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(outputs)
    }

    /// Offers entity names alongside the command words.
    fn refresh_keywords(&mut self) {
        let mut words = vocabulary();
        words.extend(self.session.store().iter().map(|e| e.name.clone()));
        words.sort();
        words.dedup();
        self.editor.set_keywords(words);
    }

    /// Prints an error to stderr.
    #[allow(clippy::unused_self)]
    fn print_error(&self, error: &CommandError) {
        eprintln!("\x1b[31mError: {error}\x1b[0m");
    }

    /// Prints the welcome banner.
    #[allow(clippy::unused_self)]
    fn print_banner(&self) {
        println!("\x1b[1;36mCodex Graph v{}\x1b[0m", env!("CARGO_PKG_VERSION"));
        println!("Type `help` for commands. Use Ctrl+D to exit.\n");
        let _ = io::stdout().flush();
    }
}
