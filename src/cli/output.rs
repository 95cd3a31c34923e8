//! Rendering of command results in the selected output format
//!
//! JSON output serializes the result value as-is. Every other format renders
//! the same rows: `auto` and `md` as tables, `tsv` and `csv` as plain
//! delimited lines for piping.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, escape_tsv};
use crate::cli::{GlobalOpts, OutputFormat};

/// Header plus display rows for a listing
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Listing {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render for a non-JSON format
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Tsv => self.render_delimited("\t", escape_tsv),
            OutputFormat::Csv => self.render_delimited(",", escape_csv),
            OutputFormat::Md => self.render_table(true),
            OutputFormat::Auto | OutputFormat::Json => self.render_table(false),
        }
    }

    fn render_table(&self, markdown: bool) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().cloned());
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }
        let mut table = builder.build();
        if markdown {
            table.with(Style::markdown());
        } else {
            table.with(Style::rounded());
        }
        format!("{}\n", table)
    }

    fn render_delimited(&self, sep: &str, escape: fn(&str) -> String) -> String {
        let mut out = String::new();
        for line in std::iter::once(&self.headers).chain(self.rows.iter()) {
            let fields: Vec<String> = line.iter().map(|f| escape(f)).collect();
            out.push_str(&fields.join(sep));
            out.push('\n');
        }
        out
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

/// Print a result: JSON as-is, otherwise the listing followed by an optional
/// status message (suppressed for machine formats and `--quiet`)
pub fn emit<T: Serialize + ?Sized>(
    global: &GlobalOpts,
    value: &T,
    listing: &Listing,
    message: Option<&str>,
) -> Result<()> {
    if global.format == OutputFormat::Json {
        return print_json(value);
    }

    if !listing.is_empty() || global.format.is_machine() {
        print!("{}", listing.render(global.format));
    }

    if let Some(message) = message {
        if !global.quiet && !global.format.is_machine() {
            println!("{}", message);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct MessageResponse<'a> {
    message: &'a str,
}

/// Print the outcome of a mutating command
pub fn emit_message(global: &GlobalOpts, message: &str) -> Result<()> {
    if global.format == OutputFormat::Json {
        return print_json(&MessageResponse { message });
    }
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
    Ok(())
}
