use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Subcommand;
use lvs_columns::{Column, Filter, RelationalOperator, Row};
use serde_derive::Serialize;
use serde_json::Value;
use tracing::info;

use crate::fixture::{Fixture, Table, Tables};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the dynamic columns of a table
    Columns {
        #[arg(long, env = "LVS_FIXTURE")]
        /// The JSON fixture holding the monitoring objects.
        fixture: PathBuf,
        #[arg(long, value_enum, default_value = "hosts")]
        /// The table to list the dynamic columns of.
        table: Table,
    },
    /// Bind a dynamic column and print its value for every row
    Query {
        #[arg(long, env = "LVS_FIXTURE")]
        /// The JSON fixture holding the monitoring objects.
        fixture: PathBuf,
        #[arg(long, value_enum, default_value = "hosts")]
        /// The table to query.
        table: Table,
        #[arg(long)]
        /// Only output rows matching `<operator> <value>`, e.g. `>= 10`.
        filter: Option<String>,
        /// The column reference in the form `<dynamic>:<name>:<arguments>`. {n}
        /// {n}
        /// For example `rrddata:load:load1,load5,+:1426411073:1426416473:60`.
        column: String,
    },
}

#[derive(Debug, Serialize)]
struct RowOutput<'a> {
    row: String,
    column: &'a str,
    value: Value,
}

impl Commands {
    /// Triggers any additional startup messages which are aware
    /// of the provided subcommand.
    pub fn display_startup_message(&self) {
        match self {
            Commands::Columns { fixture, table } => {
                info!(fixture = %fixture.display(), table = table.as_str(), "Listing dynamic columns");
            },
            Commands::Query {
                fixture,
                table,
                column,
                ..
            } => {
                info!(fixture = %fixture.display(), table = table.as_str(), column = %column, "Querying dynamic column");
            },
        }
    }

    /// Executes the command, writing its results to `out`.
    pub fn execute(self, out: &mut impl Write) -> anyhow::Result<()> {
        match self {
            Commands::Columns { fixture, table } => {
                let tables = Fixture::load(&fixture)?.build()?;
                list_columns(&tables, table, out)?;
            },
            Commands::Query {
                fixture,
                table,
                filter,
                column,
            } => {
                let tables = Fixture::load(&fixture)?.build()?;
                query(&tables, table, &column, filter.as_deref(), out)?;
            },
        }

        Ok(())
    }
}

fn list_columns(tables: &Tables, table: Table, out: &mut impl Write) -> anyhow::Result<()> {
    let columns = tables.columns(table);
    for name in columns.names() {
        let Some(column) = columns.get(name) else {
            continue;
        };
        writeln!(out, "{name}\t{}\t{}", column.kind(), column.description())?;
    }
    Ok(())
}

fn query(
    tables: &Tables,
    table: Table,
    reference: &str,
    filter: Option<&str>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let column = tables
        .columns(table)
        .resolve(reference)
        .with_context(|| format!("Bind column '{reference}' of table {}", table.as_str()))?;

    let filter = filter
        .map(|filter| parse_filter(column.as_ref(), filter))
        .transpose()?;

    for &object in tables.rows(table) {
        let row = Row::new(object, tables.core());
        if let Some(filter) = filter.as_ref() {
            if !filter.accepts(&row)? {
                continue;
            }
        }

        let output = RowOutput {
            row: tables.row_key(table, object),
            column: column.name(),
            value: column.output(&row)?,
        };
        serde_json::to_writer(&mut *out, &output)?;
        writeln!(out)?;
    }

    Ok(())
}

fn parse_filter(column: &dyn Column, filter: &str) -> anyhow::Result<Box<dyn Filter>> {
    let (operator, value) = filter
        .trim()
        .split_once(' ')
        .ok_or_else(|| anyhow!("Filter '{filter}' must be of the form '<operator> <value>'"))?;
    let operator: RelationalOperator = operator.parse()?;
    let filter = column
        .create_filter(operator, value.trim())
        .with_context(|| format!("Create filter for column '{}'", column.name()))?;
    Ok(filter)
}
