//! Interactive read-eval-print loop
//!
//! Reads lines with rustyline, parses them into commands and runs them
//! against the session. Command errors are printed and never end the loop.

use crossterm::style::Stylize;
use directories::ProjectDirs;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::app::{Command, Flow, Session};

/// Prompt shown before every input line
pub const PROMPT: &str = "Pokedex > ";

/// Location of the persisted line-editor history
///
/// Returns `None` if no home directory can be determined.
pub fn history_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "pokedex")?;
    Some(dirs.data_dir().join("history.txt"))
}

/// REPL state
pub struct Repl {
    session: Session,
    editor: Editor<(), DefaultHistory>,
    history: Option<PathBuf>,
}

impl Repl {
    /// Creates a REPL around `session`
    ///
    /// # Arguments
    /// * `session` - The session commands run against
    /// * `history` - File to load history from and save it to, if any
    pub fn new(session: Session, history: Option<PathBuf>) -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();
        let mut editor = Editor::with_config(config)?;

        if let Some(path) = &history {
            // A missing file on first run is expected
            if let Err(e) = editor.load_history(path) {
                debug!(path = %path.display(), error = %e, "no history loaded");
            }
        }

        Ok(Self {
            session,
            editor,
            history,
        })
    }

    /// Runs the loop until `exit`, Ctrl+D or an input error
    pub async fn run(&mut self) -> rustyline::Result<()> {
        print_welcome();

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    if self.handle_line(&line).await == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "(Interrupted - type exit to quit)".dim());
                }
                Err(ReadlineError::Eof) => {
                    println!("Closing the Pokedex... Goodbye!");
                    break;
                }
                Err(e) => {
                    print_error(&format!("Input error: {}", e));
                    break;
                }
            }
        }

        self.save_history();
        Ok(())
    }

    /// Parses and runs one input line
    async fn handle_line(&mut self, line: &str) -> Flow {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                print_error(&e.to_string());
                return Flow::Continue;
            }
        };

        let mut stdout = io::stdout();
        let result = self.session.execute(command, &mut stdout).await;
        flush_output(&mut stdout);

        match result {
            Ok(flow) => flow,
            Err(e) => {
                print_error(&e.to_string());
                Flow::Continue
            }
        }
    }

    fn save_history(&mut self) {
        let Some(path) = &self.history else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "cannot create history directory");
                return;
            }
        }
        if let Err(e) = self.editor.save_history(path) {
            warn!(path = %path.display(), error = %e, "cannot save history");
        }
    }
}

/// Flushes command output, logging rather than propagating a failure
fn flush_output<W: Write>(out: &mut W) -> bool {
    match out.flush() {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "cannot flush command output");
            false
        }
    }
}

fn print_welcome() {
    println!();
    println!("{}", "Welcome to the Pokedex!".bold().cyan());
    println!("{}", "─".repeat(40).dim());
    println!("{}", "Type help for commands, exit or Ctrl+D to quit.".dim());
    println!();
}

fn print_error(msg: &str) {
    println!("{} {}", "Error:".red(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_path_is_under_pokedex_dir() {
        if let Some(path) = history_path() {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("pokedex"), "History path should contain project name");
            assert!(path_str.ends_with("history.txt"));
        }
        // Test passes if history_path() returns None (e.g., no home directory in CI)
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_flush_failure_is_reported_not_ignored() {
        assert!(!flush_output(&mut BrokenPipe));
        assert!(flush_output(&mut Vec::<u8>::new()));
    }
}
