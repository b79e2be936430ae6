//! Interactive flavor browser.
//!
//! Each turn renders the current [`Session`] and collection, blocks for one
//! command from the [`Frontend`], then applies it. Rendering and transitions
//! are plain functions over explicit state; only the frontend touches the
//! terminal.

use crate::display::{flavors_table, Table};
use crate::{CliError, Result};
use colored::Colorize;
use dialoguer::console::Term;
use dialoguer::{theme::ColorfulTheme, Input};
use flavor_core::{FlavorCollection, FlavorError, SortKey};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// Sort keys reachable from the menu, in menu order.
pub const MENU_SORT_KEYS: [SortKey; 3] = [SortKey::Name, SortKey::Vcpus, SortKey::Memory];

/// One menu choice entered at the main prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SortBy(SortKey),
    ToggleOrder,
    ToggleDetails,
    Filter,
    Quit,
}

impl Action {
    pub const CHOICES: [&'static str; 7] = ["1", "2", "3", "f", "o", "d", "q"];
}

impl FromStr for Action {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(Action::SortBy(SortKey::Name)),
            "2" => Ok(Action::SortBy(SortKey::Vcpus)),
            "3" => Ok(Action::SortBy(SortKey::Memory)),
            "o" | "toggle-order" => Ok(Action::ToggleOrder),
            "d" | "toggle-details" => Ok(Action::ToggleDetails),
            "f" | "filter" => Ok(Action::Filter),
            "q" | "quit" => Ok(Action::Quit),
            other => Err(CliError::InvalidInput(format!(
                "'{}' is not one of [{}]",
                other,
                Action::CHOICES.join("/")
            ))),
        }
    }
}

/// Filterable dimension picked in the filter dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Name,
    Vcpus,
    Memory,
}

impl FromStr for Facet {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "n" | "name" => Ok(Facet::Name),
            "c" | "vcpus" => Ok(Facet::Vcpus),
            "m" | "memory" => Ok(Facet::Memory),
            other => Err(CliError::InvalidInput(format!(
                "'{}' is not one of [n/c/m]",
                other
            ))),
        }
    }
}

/// New filter values gathered by the filter dialog. A zero bound resets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    Name(String),
    Vcpus { min: u32, max: u32 },
    Memory { min: u64, max: u64 },
}

/// A fully gathered user command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SortBy(SortKey),
    ToggleOrder,
    ToggleDetails,
    EditFilter(FilterEdit),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// State carried across turns of the interactive loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub sort_by: SortKey,
    pub sort_descending: bool,
    pub show_details: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            sort_by: SortKey::Name,
            sort_descending: false,
            show_details: false,
        }
    }
}

impl Session {
    /// Start a session; only the menu sort keys are accepted.
    pub fn new(sort_by: SortKey, sort_descending: bool, show_details: bool) -> Result<Self> {
        if !MENU_SORT_KEYS.contains(&sort_by) {
            return Err(FlavorError::InvalidSortKey(sort_by.to_string()).into());
        }
        Ok(Self {
            sort_by,
            sort_descending,
            show_details,
        })
    }

    pub fn order(&self) -> &'static str {
        if self.sort_descending {
            "desc"
        } else {
            "asc"
        }
    }

    /// Apply one command to the session and the collection's filter
    pub fn apply(&mut self, flavors: &mut FlavorCollection, command: Command) -> Flow {
        match command {
            Command::SortBy(key) => self.sort_by = key,
            Command::ToggleOrder => self.sort_descending = !self.sort_descending,
            Command::ToggleDetails => self.show_details = !self.show_details,
            Command::EditFilter(FilterEdit::Name(name)) => flavors.filter_mut().set_name(&name),
            Command::EditFilter(FilterEdit::Vcpus { min, max }) => {
                flavors.filter_mut().set_vcpu_range(min, max)
            }
            Command::EditFilter(FilterEdit::Memory { min, max }) => {
                flavors.filter_mut().set_memory_range(min, max)
            }
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }
}

/// Everything drawn for one turn
#[derive(Debug, Clone)]
pub struct Screen {
    pub table: Table,
    pub status: String,
    pub menu: String,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)?;
        writeln!(f, "{}", self.status)?;
        writeln!(f, "{}", self.menu)
    }
}

fn range_text<T: fmt::Display>(bounds: (Option<T>, Option<T>)) -> String {
    let show = |b: Option<T>| b.map(|v| v.to_string()).unwrap_or_else(|| "*".to_string());
    format!("{}-{}", show(bounds.0), show(bounds.1))
}

/// Plain-text summary of the active filters and sort state
pub fn status_line(session: &Session, flavors: &FlavorCollection) -> String {
    let filter = flavors.filter();
    format!(
        "Filtering flavors (name: {} / VCPUs: {} / Mem: {})  Sorting by: {}  Sort order: {}  Show all details: {}",
        filter.name_substring().unwrap_or("*"),
        range_text(filter.vcpu_bounds()),
        range_text(filter.memory_bounds()),
        session.sort_by,
        session.order(),
        session.show_details,
    )
}

fn menu_line() -> String {
    [
        ("1", "Sort by Name"),
        ("2", "Sort by VCPUs"),
        ("3", "Sort by Memory"),
        ("f", "Change Filter"),
        ("o", "Sort order"),
        ("d", "Show details"),
        ("q", "Quit"),
    ]
    .iter()
    .map(|(key, label)| format!("{} {}", key.white(), label.blue().bold()))
    .collect::<Vec<_>>()
    .join("  ")
}

/// Build the screen for the current state
pub fn render(session: &Session, flavors: &FlavorCollection) -> Screen {
    let sorted = flavors.sorted(session.sort_by, session.sort_descending);
    debug!(
        "rendering {} flavors, sort_by: {} order: {} details: {}",
        sorted.len(),
        session.sort_by,
        session.order(),
        session.show_details
    );

    Screen {
        table: flavors_table(&sorted, session.show_details),
        status: status_line(session, flavors).red().to_string(),
        menu: menu_line(),
    }
}

/// Terminal capability used by the loop: drawing and blocking prompts
pub trait Frontend {
    fn draw(&mut self, screen: &Screen) -> Result<()>;
    fn read_action(&mut self) -> Result<Action>;
    fn read_facet(&mut self) -> Result<Facet>;
    fn read_text(&mut self, prompt: &str) -> Result<String>;
    fn read_number<T>(&mut self, prompt: &str) -> Result<T>
    where
        T: FromStr + Clone + ToString,
        T::Err: ToString;
}

/// Ask the frontend for one complete command, running the filter dialog if needed
pub fn read_command<F: Frontend>(frontend: &mut F) -> Result<Command> {
    let command = match frontend.read_action()? {
        Action::SortBy(key) => Command::SortBy(key),
        Action::ToggleOrder => Command::ToggleOrder,
        Action::ToggleDetails => Command::ToggleDetails,
        Action::Quit => Command::Quit,
        Action::Filter => {
            let edit = match frontend.read_facet()? {
                Facet::Name => FilterEdit::Name(frontend.read_text("Enter name to filter")?),
                Facet::Vcpus => FilterEdit::Vcpus {
                    min: frontend.read_number("Enter VCPUs Minimum (0 to reset)")?,
                    max: frontend.read_number("Enter VCPUs Maximum (0 to reset)")?,
                },
                Facet::Memory => FilterEdit::Memory {
                    min: frontend.read_number("Enter Memory Minimum in GiB (0 to reset)")?,
                    max: frontend.read_number("Enter Memory Maximum in GiB (0 to reset)")?,
                },
            };
            Command::EditFilter(edit)
        }
    };
    Ok(command)
}

/// Run the interactive loop until the user quits; returns the final session
pub fn run<F: Frontend>(
    flavors: &mut FlavorCollection,
    mut session: Session,
    frontend: &mut F,
) -> Result<Session> {
    loop {
        frontend.draw(&render(&session, flavors))?;

        let command = read_command(frontend)?;
        debug!("command: {:?}", command);

        if session.apply(flavors, command) == Flow::Quit {
            return Ok(session);
        }
    }
}

/// Frontend backed by the real terminal
pub struct TerminalFrontend {
    term: Term,
    theme: ColorfulTheme,
    /// Keep previous output on screen (debug logging is interleaved)
    keep_history: bool,
}

impl TerminalFrontend {
    pub fn new(keep_history: bool) -> Self {
        Self {
            term: Term::stdout(),
            theme: ColorfulTheme::default(),
            keep_history,
        }
    }

    fn choice<T>(&self, prompt: &str) -> Result<T>
    where
        T: FromStr<Err = CliError> + 'static,
    {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(|input: &String| input.parse::<T>().map(|_| ()))
            .interact_text_on(&self.term)?;
        answer.parse()
    }
}

impl Frontend for TerminalFrontend {
    fn draw(&mut self, screen: &Screen) -> Result<()> {
        if !self.keep_history {
            self.term.clear_screen()?;
        }
        self.term.write_str(&screen.to_string())?;
        Ok(())
    }

    fn read_action(&mut self) -> Result<Action> {
        self.choice(&format!("Choose the option [{}]", Action::CHOICES.join("/")))
    }

    fn read_facet(&mut self) -> Result<Facet> {
        self.choice("Choose filter Name, VCPUs or Memory [n/c/m]")
    }

    fn read_text(&mut self, prompt: &str) -> Result<String> {
        let text = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text_on(&self.term)?;
        Ok(text)
    }

    fn read_number<T>(&mut self, prompt: &str) -> Result<T>
    where
        T: FromStr + Clone + ToString,
        T::Err: ToString,
    {
        let value = Input::<T>::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text_on(&self.term)?;
        Ok(value)
    }
}
