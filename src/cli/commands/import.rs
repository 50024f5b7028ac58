//! `partnum import` command - Create parts in bulk from CSV
//!
//! Recognised columns (case-insensitive, any order):
//! `key`, `type`, `name`, `parent`, `subteam`, `subsystem`, `description`,
//! `status`, `quantity`, `material`, `revision`, `notes`, `priority`.
//! Only `type` and `name` are required.
//!
//! `parent`, `subteam` and `subsystem` take a part number, a `#id`, or the
//! `key` of an earlier row in the same file.

use console::style;
use csv::{ReaderBuilder, StringRecord};
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use crate::cli::helpers::{open_session, truncate_str, Session};
use crate::cli::GlobalOpts;
use crate::core::identity::PartType;
use crate::core::NumberingError;
use crate::engine::validator::parse_type;
use crate::engine::CreatePart;
use crate::store::{Part, PartDetails, Priority, Project};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,

    /// Validate rows without creating anything
    #[arg(long)]
    pub dry_run: bool,

    /// Continue importing after errors (default: stop on first error)
    #[arg(long)]
    pub skip_errors: bool,
}

/// Import statistics
#[derive(Debug, Default, PartialEq)]
pub struct ImportStats {
    pub rows_processed: usize,
    pub created: usize,
    pub errors: usize,
}

/// One parsed CSV row
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub row: usize,
    pub key: Option<String>,
    pub part_type: PartType,
    pub name: String,
    pub parent: Option<String>,
    pub subteam: Option<String>,
    pub subsystem: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub quantity: Option<u32>,
    pub details: PartDetails,
}

/// A parsed row, or the row number and the reason it was rejected
pub type RowResult = std::result::Result<ImportRow, (usize, String)>;

/// Build a map from header name to column index
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect()
}

fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_row(
    row: usize,
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> std::result::Result<ImportRow, String> {
    let raw_type = get_field(record, header_map, "type").ok_or("missing required field 'type'")?;
    let part_type = parse_type(&raw_type).map_err(|e| e.to_string())?;
    let name = get_field(record, header_map, "name").ok_or("missing required field 'name'")?;
    let quantity = get_field(record, header_map, "quantity")
        .map(|q| {
            q.parse::<u32>()
                .map_err(|_| format!("quantity '{}' is not a whole number", q))
        })
        .transpose()?;
    let priority = get_field(record, header_map, "priority")
        .map(|p| p.parse::<Priority>())
        .transpose()?
        .unwrap_or_default();

    Ok(ImportRow {
        row,
        key: get_field(record, header_map, "key"),
        part_type,
        name,
        parent: get_field(record, header_map, "parent"),
        subteam: get_field(record, header_map, "subteam"),
        subsystem: get_field(record, header_map, "subsystem"),
        description: get_field(record, header_map, "description"),
        status: get_field(record, header_map, "status"),
        quantity,
        details: PartDetails {
            material: get_field(record, header_map, "material"),
            revision: get_field(record, header_map, "revision"),
            notes: get_field(record, header_map, "notes"),
            priority,
            ..PartDetails::default()
        },
    })
}

/// Parse every row of a CSV document. Data rows are numbered from 2 so
/// they match spreadsheet line numbers.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RowResult>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().into_diagnostic()?.clone();
    let header_map = build_header_map(&headers);
    for required in ["type", "name"] {
        if !header_map.contains_key(required) {
            return Err(miette::miette!(
                help = "the header row needs at least: type,name",
                "CSV has no '{}' column",
                required
            ));
        }
    }

    Ok(rdr
        .records()
        .enumerate()
        .map(|(idx, result)| {
            let row = idx + 2;
            match result {
                Ok(record) => parse_row(row, &record, &header_map).map_err(|e| (row, e)),
                Err(e) => Err((row, format!("CSV parse error: {}", e))),
            }
        })
        .collect())
}

/// Resolves references against rows created earlier in the same file,
/// then against the store
struct References<'a> {
    session: &'a Session,
    keys: &'a HashMap<String, Option<Part>>,
}

impl References<'_> {
    /// `Ok(None)` when the reference points at a row that was only planned
    /// (dry run)
    fn resolve(&self, reference: &str) -> std::result::Result<Option<Part>, NumberingError> {
        match self.keys.get(reference) {
            Some(planned) => Ok(planned.clone()),
            None => self.session.service.resolve_ref(reference).map(Some),
        }
    }

    fn resolve_opt(&self, reference: Option<&str>) -> std::result::Result<Option<Part>, NumberingError> {
        Ok(reference.map(|r| self.resolve(r)).transpose()?.flatten())
    }

    /// Parent, subteam and subsystem of a row
    fn row(&self, row: &ImportRow) -> std::result::Result<[Option<Part>; 3], NumberingError> {
        Ok([
            self.resolve_opt(row.parent.as_deref())?,
            self.resolve_opt(row.subteam.as_deref())?,
            self.resolve_opt(row.subsystem.as_deref())?,
        ])
    }
}

fn report_error(stats: &mut ImportStats, row: usize, message: &str, skip_errors: bool) -> Result<()> {
    eprintln!("{} Row {}: {}", style("✗").red(), row, message);
    stats.errors += 1;
    if skip_errors {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "fix the row or pass --skip-errors",
            "import stopped at row {}: {}",
            row,
            message
        ))
    }
}

fn import_rows(
    session: &mut Session,
    project: &Project,
    rows: Vec<RowResult>,
    args: &ImportArgs,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let mut keys: HashMap<String, Option<Part>> = HashMap::new();

    for row in rows {
        stats.rows_processed += 1;
        let row = match row {
            Ok(row) => row,
            Err((n, message)) => {
                report_error(&mut stats, n, &message, args.skip_errors)?;
                continue;
            }
        };

        if let Some(key) = &row.key {
            if keys.contains_key(key) {
                report_error(&mut stats, row.row, &format!("duplicate key '{}'", key), args.skip_errors)?;
                continue;
            }
        }

        let resolved = References {
            session: &*session,
            keys: &keys,
        }
        .row(&row);
        let [parent, subteam, subsystem] = match resolved {
            Ok(found) => found,
            Err(e) => {
                report_error(&mut stats, row.row, &e.to_string(), args.skip_errors)?;
                continue;
            }
        };

        if args.dry_run {
            let planned_parent = row.parent.is_some() && parent.is_none();
            if !planned_parent {
                let check = session.service.validate_parentage(
                    row.part_type,
                    parent.as_ref().map(|p| p.id),
                    project.id,
                );
                if let Err(e) = check {
                    report_error(&mut stats, row.row, &e.to_string(), args.skip_errors)?;
                    continue;
                }
            }
            let under = row.parent.as_deref().unwrap_or("top level");
            println!(
                "{} Row {}: Would create {} {} under {}",
                style("○").dim(),
                row.row,
                row.part_type,
                style(truncate_str(&row.name, 30)).yellow(),
                style(under).cyan()
            );
            if let Some(key) = row.key {
                keys.insert(key, None);
            }
            continue;
        }

        let mut request = CreatePart::new(project.id, row.part_type, parent.map(|p| p.id), row.name);
        request.description = row.description;
        request.status = row.status;
        request.quantity = row.quantity;
        request.details = row.details;
        request.subteam_id = subteam.map(|p| p.id);
        request.subsystem_id = subsystem.map(|p| p.id);

        match session.service.create_part(&request) {
            Ok(part) => {
                println!(
                    "{} Row {}: Created {} {}",
                    style("✓").green(),
                    row.row,
                    style(&part.part_number).cyan(),
                    truncate_str(&part.name, 30)
                );
                stats.created += 1;
                if let Some(key) = row.key {
                    keys.insert(key, Some(part));
                }
            }
            Err(e) => report_error(&mut stats, row.row, &e.to_string(), args.skip_errors)?,
        }
    }
    Ok(stats)
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if !args.file.exists() {
        return Err(miette::miette!("File not found: {}", args.file.display()));
    }
    let mut session = open_session(global)?;
    let project = session.project(global)?;

    println!(
        "{} Importing into {} from {}{}",
        style("→").blue(),
        style(&project.prefix).cyan(),
        style(args.file.display()).yellow(),
        if args.dry_run { " (dry run)" } else { "" }
    );

    let file = File::open(&args.file).into_diagnostic()?;
    let rows = read_rows(BufReader::new(file))?;
    let stats = import_rows(&mut session, &project, rows, &args)?;

    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "Rows processed: {}  Created: {}  Errors: {}",
        style(stats.rows_processed).cyan(),
        style(stats.created).green(),
        if stats.errors > 0 {
            style(stats.errors).red()
        } else {
            style(stats.errors).dim()
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows() {
        let csv = "Key,Type,Name,Parent,Quantity,Material,Priority\n\
                   tla,assembly,TLA,,,,\n\
                   ,part,Bracket,tla,4,6061,high\n\
                   ,bracket,Bad,,,,\n\
                   ,part,Nut,tla,lots,,\n\
                   ,part,Washer,tla,,,soon\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 5);

        let tla = rows[0].as_ref().unwrap();
        assert_eq!(tla.row, 2);
        assert_eq!(tla.key.as_deref(), Some("tla"));
        assert_eq!(tla.part_type, PartType::Assembly);
        assert_eq!(tla.parent, None);

        let bracket = rows[1].as_ref().unwrap();
        assert_eq!(bracket.parent.as_deref(), Some("tla"));
        assert_eq!(bracket.quantity, Some(4));
        assert_eq!(bracket.details.material.as_deref(), Some("6061"));
        assert_eq!(bracket.details.priority, Priority::High);
        assert_eq!(tla.details.priority, Priority::Normal);

        assert!(matches!(&rows[2], Err((4, _))));
        assert!(matches!(&rows[3], Err((5, msg)) if msg.contains("lots")));
        assert!(matches!(&rows[4], Err((6, msg)) if msg.contains("soon")));
    }

    #[test]
    fn test_read_rows_requires_columns() {
        assert!(read_rows("name,parent\nA,\n".as_bytes()).is_err());
    }
}
