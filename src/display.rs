use colored::{Color, Colorize};
use flavor_core::Flavor;
use std::fmt;

/// Horizontal alignment of a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct Column {
    header: String,
    align: Align,
    color: Option<Color>,
}

/// Table formatting utilities
///
/// Widths are measured on the plain cell text; colors are applied after
/// padding so escape codes never skew the layout.
#[derive(Debug, Clone)]
pub struct Table {
    title: Option<String>,
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
    max_widths: Vec<usize>,
}

fn width(text: &str) -> usize {
    text.chars().count()
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        let mut table = Self {
            title: None,
            columns: Vec::new(),
            rows: Vec::new(),
            max_widths: Vec::new(),
        };
        for header in headers {
            table.add_column(header, Align::Left, None);
        }
        table
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn add_column(&mut self, header: impl Into<String>, align: Align, color: Option<Color>) {
        let header = header.into();
        self.max_widths.push(width(&header));
        self.columns.push(Column {
            header,
            align,
            color,
        });
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        // Update max widths
        for (i, cell) in row.iter().enumerate() {
            if i < self.max_widths.len() {
                self.max_widths[i] = self.max_widths[i].max(width(cell));
            }
        }
        self.rows.push(row);
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn separator(&self, f: &mut fmt::Formatter<'_>, left: &str, mid: &str, right: &str) -> fmt::Result {
        write!(f, "{}", left)?;
        for (i, &width) in self.max_widths.iter().enumerate() {
            write!(f, "{}", "─".repeat(width + 2))?;
            if i < self.max_widths.len() - 1 {
                write!(f, "{}", mid)?;
            }
        }
        writeln!(f, "{}", right)
    }

    fn pad(&self, i: usize, text: &str) -> String {
        let width = self.max_widths.get(i).copied().unwrap_or(0);
        match self.columns.get(i).map(|c| c.align) {
            Some(Align::Right) => format!("{:>width$}", text, width = width),
            _ => format!("{:<width$}", text, width = width),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return Ok(());
        }

        if let Some(title) = &self.title {
            writeln!(f, "{}", title.bold())?;
        }

        self.separator(f, "┌", "┬", "┐")?;
        write!(f, "│")?;
        for (i, column) in self.columns.iter().enumerate() {
            write!(f, " {} │", self.pad(i, &column.header).bold())?;
        }
        writeln!(f)?;
        self.separator(f, "├", "┼", "┤")?;

        for row in &self.rows {
            write!(f, "│")?;
            for (i, cell) in row.iter().enumerate() {
                let padded = self.pad(i, cell);
                match self.columns.get(i).and_then(|c| c.color) {
                    Some(color) => write!(f, " {} │", padded.color(color))?,
                    None => write!(f, " {} │", padded)?,
                }
            }
            writeln!(f)?;
        }

        self.separator(f, "└", "┴", "┘")
    }
}

/// Build the flavor table; `long` adds description, rxtx factor and extra specs
pub fn flavors_table(flavors: &[&Flavor], long: bool) -> Table {
    let mut table = Table::new(Vec::new()).with_title("OpenStack Flavors");

    table.add_column("ID", Align::Left, Some(Color::Green));
    table.add_column("Name", Align::Left, Some(Color::Magenta));
    table.add_column("VCPUs", Align::Right, Some(Color::Cyan));
    table.add_column("Mem (GiB)", Align::Right, Some(Color::Cyan));
    table.add_column("Disk", Align::Right, Some(Color::Cyan));
    table.add_column("Swap", Align::Right, Some(Color::Cyan));
    table.add_column("Ephemeral", Align::Right, Some(Color::Cyan));
    table.add_column("Is Public", Align::Right, Some(Color::Cyan));
    if long {
        table.add_column("Description", Align::Left, None);
        table.add_column("RXTX Factor", Align::Right, Some(Color::Cyan));
        table.add_column("Extra Specs", Align::Left, None);
    }

    for flavor in flavors {
        let mut row = vec![
            flavor.id.clone(),
            flavor.name.clone(),
            flavor.vcpus.to_string(),
            flavor.memory.to_string(),
            flavor.disk.to_string(),
            flavor.swap.to_string(),
            flavor.ephemeral.to_string(),
            flavor.is_public.to_string(),
        ];
        if long {
            row.extend([
                flavor.description.clone(),
                flavor.rxtx_factor.to_string(),
                flavor.extra_specs_text(),
            ]);
        }
        table.add_row(row);
    }

    table
}

/// Status messages
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}
