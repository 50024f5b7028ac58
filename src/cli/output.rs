//! Rendering of parts and projects in every output format

use std::collections::HashMap;
use std::io;

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;
use crate::core::identity::PartId;
use crate::store::{Part, Project};

/// Maps store keys to part numbers for display
pub struct NumberIndex {
    numbers: HashMap<PartId, String>,
}

impl NumberIndex {
    pub fn new<'a>(parts: impl IntoIterator<Item = &'a Part>) -> Self {
        Self {
            numbers: parts
                .into_iter()
                .map(|p| (p.id, p.part_number.clone()))
                .collect(),
        }
    }

    pub fn number(&self, id: Option<PartId>) -> Option<&str> {
        id.map(|id| self.numbers.get(&id).map_or("?", String::as_str))
    }
}

/// A part with its references rendered as part numbers
#[derive(Serialize)]
pub struct PartView<'a> {
    #[serde(flatten)]
    pub part: &'a Part,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subteam: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<&'a str>,
}

impl<'a> PartView<'a> {
    pub fn new(part: &'a Part, index: &'a NumberIndex) -> Self {
        Self {
            part,
            parent: index.number(part.parent_id),
            subteam: index.number(part.subteam_id),
            subsystem: index.number(part.subsystem_id),
        }
    }
}

const PART_HEADERS: [&str; 8] = [
    "part_number",
    "type",
    "name",
    "parent",
    "subteam",
    "subsystem",
    "status",
    "quantity",
];

fn part_row(view: &PartView<'_>) -> [String; 8] {
    [
        view.part.part_number.clone(),
        view.part.part_type.to_string(),
        view.part.name.clone(),
        view.parent.unwrap_or("").to_string(),
        view.subteam.unwrap_or("").to_string(),
        view.subsystem.unwrap_or("").to_string(),
        view.part.status.clone(),
        view.part.quantity.to_string(),
    ]
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

pub fn print_yaml<T: Serialize>(value: &T) -> Result<()> {
    let yaml = serde_yml::to_string(value).into_diagnostic()?;
    print!("{}", yaml);
    Ok(())
}

/// Print a list of parts
pub fn print_parts(
    parts: &[Part],
    index: &NumberIndex,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let views: Vec<PartView<'_>> = parts.iter().map(|p| PartView::new(p, index)).collect();

    match format {
        OutputFormat::Json => print_json(&views)?,
        OutputFormat::Yaml => print_yaml(&views)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            wtr.write_record(PART_HEADERS).into_diagnostic()?;
            for view in &views {
                wtr.write_record(part_row(view)).into_diagnostic()?;
            }
            wtr.flush().into_diagnostic()?;
        }
        OutputFormat::Tsv => {
            println!("{}", PART_HEADERS.join("\t"));
            for view in &views {
                println!("{}", part_row(view).join("\t"));
            }
        }
        OutputFormat::Md => {
            let mut builder = Builder::default();
            builder.push_record(PART_HEADERS);
            for view in &views {
                builder.push_record(part_row(view));
            }
            println!("{}", builder.build().with(Style::markdown()));
        }
        OutputFormat::Id => {
            for part in parts {
                println!("{}", part.part_number);
            }
        }
        OutputFormat::Auto => {
            println!(
                "{:<14} {:<9} {:<28} {:<14} {:<14} {:<14} {:<12}",
                style("PART #").bold(),
                style("TYPE").bold(),
                style("NAME").bold(),
                style("PARENT").bold(),
                style("SUBTEAM").bold(),
                style("SUBSYSTEM").bold(),
                style("STATUS").bold(),
            );
            println!("{}", "-".repeat(110));
            for view in &views {
                println!(
                    "{:<14} {:<9} {:<28} {:<14} {:<14} {:<14} {:<12}",
                    style(&view.part.part_number).cyan(),
                    view.part.part_type,
                    truncate_str(&view.part.name, 26),
                    view.parent.unwrap_or("-"),
                    view.subteam.unwrap_or("-"),
                    view.subsystem.unwrap_or("-"),
                    view.part.status,
                );
            }
            if !quiet {
                println!();
                println!("{} item(s) found.", style(parts.len()).cyan());
            }
        }
    }
    Ok(())
}

/// A part with its ancestry and direct children, for `part show`
#[derive(Serialize)]
struct PartDetail<'a> {
    #[serde(flatten)]
    view: PartView<'a>,
    path: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<&'a str>,
}

/// Print one part in detail, with its ancestry and direct children
pub fn print_part(
    part: &Part,
    breadcrumb: &[Part],
    children: &[Part],
    index: &NumberIndex,
    format: OutputFormat,
) -> Result<()> {
    let view = PartView::new(part, index);
    let path: Vec<&str> = breadcrumb.iter().map(|p| p.part_number.as_str()).collect();
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let detail = PartDetail {
                view,
                path,
                children: children.iter().map(|c| c.part_number.as_str()).collect(),
            };
            if format == OutputFormat::Json {
                print_json(&detail)
            } else {
                print_yaml(&detail)
            }
        }
        OutputFormat::Id => {
            println!("{}", part.part_number);
            Ok(())
        }
        OutputFormat::Csv | OutputFormat::Tsv | OutputFormat::Md => {
            print_parts(std::slice::from_ref(part), index, format, true)
        }
        OutputFormat::Auto => {
            println!("{}", style("─".repeat(60)).dim());
            println!(
                "{}: {}",
                style("Part Number").bold(),
                style(&part.part_number).cyan()
            );
            println!("{}: {}", style("Name").bold(), style(&part.name).yellow());
            println!("{}: {}", style("Type").bold(), part.part_type);
            println!("{}: {}", style("Status").bold(), part.status);
            println!("{}: {}", style("Quantity").bold(), part.quantity);
            println!("{}: {}", style("Priority").bold(), part.details.priority);
            println!("{}: {}", style("Store ID").bold(), part.id);
            println!("{}", style("─".repeat(60)).dim());

            let details = &part.details;
            println!();
            println!("{}", style("Manufacturing:").bold());
            if let Some(material) = &details.material {
                println!("  {}: {}", style("Material").dim(), material);
            }
            if let Some(revision) = &details.revision {
                println!("  {}: {}", style("Revision").dim(), revision);
            }
            println!(
                "  {}: {} on hand, {} on order",
                style("Stock").dim(),
                details.quantity_on_hand,
                details.quantity_on_order
            );
            println!(
                "  {}: {}",
                style("Drawing").dim(),
                if details.drawing_created { "yes" } else { "no" }
            );

            if let Some(desc) = part.description.as_deref().filter(|d| !d.is_empty()) {
                println!();
                println!("{}", style("Description:").bold());
                println!("  {}", desc);
            }

            println!();
            println!("{}", style("Classification:").bold());
            println!(
                "  {}: {}",
                style("Subteam").dim(),
                view.subteam.unwrap_or("-")
            );
            println!(
                "  {}: {}",
                style("Subsystem").dim(),
                view.subsystem.unwrap_or("-")
            );

            if let Some(notes) = part.details.notes.as_deref().filter(|n| !n.is_empty()) {
                println!();
                println!("{}", style("Notes:").bold());
                println!("  {}", notes);
            }

            if path.len() > 1 {
                println!();
                println!("{}", style("Path:").bold());
                println!("  {}", path.join(" > "));
            }

            if !children.is_empty() {
                println!();
                println!("{} ({})", style("Children:").bold(), children.len());
                for child in children {
                    println!(
                        "  {} {}  {}",
                        style("•").dim(),
                        style(&child.part_number).cyan(),
                        child.name
                    );
                }
            }

            println!();
            println!(
                "{}: {}",
                style("Created").dim(),
                part.created.format("%Y-%m-%d %H:%M")
            );
            Ok(())
        }
    }
}

/// Print the project list
pub fn print_projects(projects: &[Project], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(projects)?,
        OutputFormat::Yaml => print_yaml(&projects)?,
        OutputFormat::Id => {
            for project in projects {
                println!("{}", project.prefix);
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            wtr.write_record(["prefix", "name", "description"])
                .into_diagnostic()?;
            for project in projects {
                wtr.write_record([
                    project.prefix.as_str(),
                    project.name.as_str(),
                    project.description.as_deref().unwrap_or(""),
                ])
                .into_diagnostic()?;
            }
            wtr.flush().into_diagnostic()?;
        }
        OutputFormat::Tsv => {
            println!("prefix\tname\tdescription");
            for project in projects {
                println!(
                    "{}\t{}\t{}",
                    project.prefix,
                    project.name,
                    project.description.as_deref().unwrap_or("")
                );
            }
        }
        OutputFormat::Md | OutputFormat::Auto => {
            let mut builder = Builder::default();
            builder.push_record(["Prefix", "Name", "Description"]);
            for project in projects {
                builder.push_record([
                    project.prefix.as_str(),
                    project.name.as_str(),
                    project.description.as_deref().unwrap_or(""),
                ]);
            }
            let mut table = builder.build();
            if format == OutputFormat::Md {
                table.with(Style::markdown());
            } else {
                table.with(Style::sharp());
            }
            println!("{}", table);
        }
    }
    Ok(())
}
