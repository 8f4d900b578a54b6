//! Session state and command handling for the Pokedex CLI
//!
//! This module holds the per-session state (pagination cursor and caught
//! Pokemon), parses input lines into commands and runs them. Output is written
//! to any `io::Write` so the handlers can be exercised without a terminal.

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::io::{self, Write};
use thiserror::Error;
use tracing::{debug, info};

use crate::catch::attempt_catch;
use crate::data::{ApiError, PokeApiClient, Pokemon};

/// Errors a command can report back to the REPL
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required argument was not given
    #[error("{command} requires a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    /// The Pokemon is already in the Pokedex
    #[error("{0} is already in your Pokedex")]
    AlreadyCaught(String),

    /// The Pokemon has not been caught yet
    #[error("you have not caught {0}")]
    NotCaught(String),

    /// Fetching from the API failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Writing output failed
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// A parsed REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Map,
    MapBack,
    Explore(String),
    Catch(String),
    Inspect(String),
    Pokedex,
    Unknown(String),
}

/// Name and description of each command, in help order
pub const COMMANDS: &[(&str, &str)] = &[
    ("help", "Displays a help message"),
    ("exit", "Exit the Pokedex"),
    ("map", "Show the next 20 location areas"),
    ("mapb", "Show the previous 20 location areas"),
    ("explore <area>", "List the Pokemon found in a location area"),
    ("catch <pokemon>", "Throw a Pokeball at a Pokemon"),
    ("inspect <pokemon>", "Show details of a caught Pokemon"),
    ("pokedex", "List every Pokemon you have caught"),
];

/// Splits an input line into lowercase words, dropping empty ones
pub fn clean_input(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_lowercase).collect()
}

impl Command {
    /// Parses an input line
    ///
    /// # Returns
    /// * `Ok(None)` for a blank line
    /// * `Ok(Some(Command))` for a recognised or unknown command
    /// * `Err(CommandError::MissingArgument)` when a command needs exactly one
    ///   argument and got a different number
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let words = clean_input(line);
        let Some((name, args)) = words.split_first() else {
            return Ok(None);
        };

        let command = match name.as_str() {
            "help" => Command::Help,
            "exit" => Command::Exit,
            "map" => Command::Map,
            "mapb" => Command::MapBack,
            "explore" => Command::Explore(single_arg(args, "explore", "location area")?),
            "catch" => Command::Catch(single_arg(args, "catch", "pokemon")?),
            "inspect" => Command::Inspect(single_arg(args, "inspect", "pokemon")?),
            "pokedex" => Command::Pokedex,
            other => Command::Unknown(other.to_string()),
        };

        Ok(Some(command))
    }
}

fn single_arg(
    args: &[String],
    command: &'static str,
    argument: &'static str,
) -> Result<String, CommandError> {
    match args {
        [arg] => Ok(arg.clone()),
        _ => Err(CommandError::MissingArgument { command, argument }),
    }
}

/// Whether the REPL should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A Pokemon in the session's Pokedex
#[derive(Debug, Clone)]
pub struct CaughtPokemon {
    pub pokemon: Pokemon,
    pub caught_at: DateTime<Local>,
}

/// Per-session state shared by every command
pub struct Session {
    client: PokeApiClient,
    /// Cursor for `map`; `None` means start from the first page
    next: Option<String>,
    /// Cursor for `mapb`; `None` means we are on the first page
    previous: Option<String>,
    /// Caught Pokemon keyed by name
    pokedex: BTreeMap<String, CaughtPokemon>,
}

impl Session {
    /// Creates an empty session that fetches through `client`
    pub fn new(client: PokeApiClient) -> Self {
        Self {
            client,
            next: None,
            previous: None,
            pokedex: BTreeMap::new(),
        }
    }

    /// The caught Pokemon, sorted by name
    pub fn pokedex(&self) -> &BTreeMap<String, CaughtPokemon> {
        &self.pokedex
    }

    /// Current `map` cursor
    pub fn next_page(&self) -> Option<&str> {
        self.next.as_deref()
    }

    /// Current `mapb` cursor
    pub fn previous_page(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Runs a command, rolling catches with an OS-seeded RNG
    pub async fn execute<W: Write>(
        &mut self,
        command: Command,
        out: &mut W,
    ) -> Result<Flow, CommandError> {
        let mut rng = StdRng::from_os_rng();
        self.execute_with_rng(command, out, &mut rng).await
    }

    /// Runs a command with an injected RNG for the catch roll
    pub async fn execute_with_rng<W: Write, R: Rng>(
        &mut self,
        command: Command,
        out: &mut W,
        rng: &mut R,
    ) -> Result<Flow, CommandError> {
        debug!(?command, "executing command");

        match command {
            Command::Help => self.help(out)?,
            Command::Exit => {
                writeln!(out, "Closing the Pokedex... Goodbye!")?;
                return Ok(Flow::Exit);
            }
            Command::Map => self.map(out).await?,
            Command::MapBack => self.map_back(out).await?,
            Command::Explore(area) => self.explore(&area, out).await?,
            Command::Catch(name) => self.catch(&name, out, rng).await?,
            Command::Inspect(name) => self.inspect(&name, out)?,
            Command::Pokedex => self.list_pokedex(out)?,
            Command::Unknown(_) => writeln!(out, "Unknown command")?,
        }

        Ok(Flow::Continue)
    }

    fn help<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Welcome to the Pokedex!")?;
        writeln!(out, "Usage:")?;
        writeln!(out)?;
        for (name, description) in COMMANDS {
            writeln!(out, "{name} - {description}")?;
        }
        Ok(())
    }

    async fn map<W: Write>(&mut self, out: &mut W) -> Result<(), CommandError> {
        let url = self
            .next
            .clone()
            .unwrap_or_else(|| self.client.first_page_url());
        self.show_page(&url, out).await
    }

    async fn map_back<W: Write>(&mut self, out: &mut W) -> Result<(), CommandError> {
        let Some(url) = self.previous.clone() else {
            writeln!(out, "you're on the first page")?;
            return Ok(());
        };
        self.show_page(&url, out).await
    }

    async fn show_page<W: Write>(&mut self, url: &str, out: &mut W) -> Result<(), CommandError> {
        let page = self.client.location_areas(url).await?;

        for area in &page.results {
            writeln!(out, "{}", area.name)?;
        }

        self.next = page.next;
        self.previous = page.previous;
        Ok(())
    }

    async fn explore<W: Write>(&mut self, area: &str, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Exploring {area}...")?;
        let location = self.client.location_area(area).await?;

        writeln!(out, "Found Pokemon:")?;
        for encounter in &location.pokemon_encounters {
            writeln!(out, " - {}", encounter.pokemon.name)?;
        }
        Ok(())
    }

    async fn catch<W: Write, R: Rng>(
        &mut self,
        name: &str,
        out: &mut W,
        rng: &mut R,
    ) -> Result<(), CommandError> {
        if self.pokedex.contains_key(name) {
            return Err(CommandError::AlreadyCaught(name.to_string()));
        }

        writeln!(out, "Throwing a Pokeball at {name}...")?;
        let pokemon = self.client.pokemon(name).await?;

        if attempt_catch(&pokemon, rng) {
            writeln!(out, "{name} was caught!")?;
            writeln!(out, "You may now inspect it with the inspect command.")?;
            info!(pokemon = name, "caught");
            self.pokedex.insert(
                name.to_string(),
                CaughtPokemon {
                    pokemon,
                    caught_at: Local::now(),
                },
            );
        } else {
            writeln!(out, "{name} escaped!")?;
        }
        Ok(())
    }

    fn inspect<W: Write>(&self, name: &str, out: &mut W) -> Result<(), CommandError> {
        let caught = self
            .pokedex
            .get(name)
            .ok_or_else(|| CommandError::NotCaught(name.to_string()))?;
        let pokemon = &caught.pokemon;

        writeln!(out, "Name: {}", pokemon.name)?;
        writeln!(out, "Height: {}", pokemon.height)?;
        writeln!(out, "Weight: {}", pokemon.weight)?;
        writeln!(out, "Stats:")?;
        for stat in &pokemon.stats {
            writeln!(out, "  -{}: {}", stat.stat.name, stat.base_stat)?;
        }
        writeln!(out, "Types:")?;
        for kind in &pokemon.types {
            writeln!(out, "  - {}", kind.kind.name)?;
        }
        writeln!(out, "Caught: {}", caught.caught_at.format("%Y-%m-%d %H:%M"))?;
        Ok(())
    }

    fn list_pokedex<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Your Pokedex:")?;
        if self.pokedex.is_empty() {
            writeln!(out, "  (empty - try catch <pokemon>)")?;
        }
        for name in self.pokedex.keys() {
            writeln!(out, "  - {name}")?;
        }
        Ok(())
    }
}
