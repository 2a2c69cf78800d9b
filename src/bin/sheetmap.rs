//! Sheet Mapper terminal front end
//!
//! Drives the mapping engine locally: inspect workbooks, convert a source
//! sheet into a template layout and manage saved mapping schemes.
//!
//! Usage:
//!   `cargo run --bin sheetmap -- sheets orders.xlsx`
//!   `cargo run --bin sheetmap -- headers orders.xlsx --sheet Orders`
//!   `cargo run --bin sheetmap -- convert orders.xlsx import.xlsx --map "Order No=OrderId"`
//!   `cargo run --bin sheetmap -- convert orders.xlsx import.xlsx --scheme "Orders import"`
//!   `cargo run --bin sheetmap -- schemes list`

use anyhow::{Context, Result, anyhow, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sheet_mapper::config::Config;
use sheet_mapper::schemes::store::{SchemeStore, find_scheme, remove_scheme, upsert_scheme};
use sheet_mapper::services::data_processing_service::DataProcessingService;
use sheet_mapper::services::models::SheetIdentifier;
use sheet_mapper::session::Session;

fn cli() -> Command {
    let file = |name: &'static str, help: &'static str| {
        Arg::new(name)
            .value_name("FILE")
            .help(help)
            .required(true)
            .value_parser(clap::value_parser!(PathBuf))
    };

    Command::new("sheetmap")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Map source spreadsheet columns onto a template and convert rows")
        .subcommand_required(true)
        .arg(
            Arg::new("schemes")
                .long("schemes")
                .value_name("PATH")
                .global(true)
                .help("Scheme store location (defaults to SCHEMES_PATH or the per-user store)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .subcommand(
            Command::new("sheets")
                .about("List the sheets of a workbook")
                .arg(file("file", "Workbook to inspect")),
        )
        .subcommand(
            Command::new("headers")
                .about("Print the header names of a sheet")
                .arg(file("file", "Workbook to inspect"))
                .arg(
                    Arg::new("sheet")
                        .short('s')
                        .long("sheet")
                        .value_name("NAME_OR_INDEX")
                        .help("Sheet name or zero-based index")
                        .default_value("0"),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a source sheet into the template layout")
                .arg(file("source", "Source workbook"))
                .arg(file("template", "Template workbook"))
                .arg(
                    Arg::new("source-sheet")
                        .long("source-sheet")
                        .value_name("NAME_OR_INDEX")
                        .help("Source sheet (defaults to the scheme's, else the first)"),
                )
                .arg(
                    Arg::new("template-sheet")
                        .long("template-sheet")
                        .value_name("NAME_OR_INDEX")
                        .help("Template sheet (defaults to the scheme's, else the first)"),
                )
                .arg(
                    Arg::new("map")
                        .short('m')
                        .long("map")
                        .value_name("SOURCE=TEMPLATE")
                        .help("Field pair; repeat for more pairs")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("scheme")
                        .long("scheme")
                        .value_name("NAME")
                        .help("Apply a saved scheme before any --map pairs"),
                )
                .arg(
                    Arg::new("save-as")
                        .long("save-as")
                        .value_name("NAME")
                        .help("Save the final mapping as a scheme"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Output path (defaults to Converted_<source>.xlsx next to the source)")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("schemes")
                .about("Manage saved schemes")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List saved schemes"))
                .subcommand(
                    Command::new("delete")
                        .about("Delete a saved scheme")
                        .arg(Arg::new("name").value_name("NAME").required(true)),
                ),
        )
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for listings
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let matches = cli().get_matches();
    let config = Config::from_env();
    let store = SchemeStore::new(
        matches
            .get_one::<PathBuf>("schemes")
            .cloned()
            .unwrap_or_else(|| config.schemes_path.clone()),
    );
    let service = DataProcessingService::new(config.header_scan_rows);

    match matches.subcommand() {
        Some(("sheets", args)) => list_sheets(service, args),
        Some(("headers", args)) => print_headers(service, args),
        Some(("convert", args)) => convert(service, &store, args),
        Some(("schemes", args)) => manage_schemes(&store, args),
        _ => unreachable!("subcommand is required"),
    }
}

fn read_file(path: &Path) -> Result<(String, Vec<u8>)> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok((name, bytes))
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .ok_or_else(|| anyhow!("missing <{name}>"))
}

fn list_sheets(service: DataProcessingService, args: &ArgMatches) -> Result<()> {
    let (name, bytes) = read_file(required_path(args, "file")?)?;
    let sheets = service.open_and_list_sheets(&bytes)?;

    println!("{}", style(&name).bold());
    for (idx, sheet) in sheets.iter().enumerate() {
        println!("  {} {}", style(format!("[{idx}]")).dim(), sheet);
    }
    Ok(())
}

fn print_headers(service: DataProcessingService, args: &ArgMatches) -> Result<()> {
    let (name, bytes) = read_file(required_path(args, "file")?)?;
    let mut session = Session::new(service);
    session.load_source(&name, bytes)?;

    let sheet = args
        .get_one::<String>("sheet")
        .map_or_else(SheetIdentifier::default, |s| SheetIdentifier::from(s.as_str()));
    let ordinal = session
        .source()
        .context("source not loaded")?
        .sheet_ordinal(&sheet)?;
    session.select_source_sheet(ordinal)?;

    let source = session.source().context("source not loaded")?;
    let sheet_name = source.selected_sheet_name().unwrap_or_default();
    if source.headers().is_empty() {
        println!(
            "{} No header names found in sheet '{sheet_name}'",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("{} {}", style(&name).bold(), style(format!("/ {sheet_name}")).dim());
    for header in source.headers() {
        println!("  {header}");
    }
    Ok(())
}

fn convert(service: DataProcessingService, store: &SchemeStore, args: &ArgMatches) -> Result<()> {
    let source_path = required_path(args, "source")?;
    let (source_name, source_bytes) = read_file(source_path)?;
    let (template_name, template_bytes) = read_file(required_path(args, "template")?)?;

    let mut schemes = store.load_all();
    let scheme = match args.get_one::<String>("scheme") {
        Some(name) => Some(
            find_scheme(&schemes, name)
                .cloned()
                .ok_or_else(|| anyhow!("No saved scheme named '{name}'"))?,
        ),
        None => None,
    };

    let mut session = Session::new(service);
    session.load_source(&source_name, source_bytes)?;
    session.load_template(&template_name, template_bytes)?;

    let source_sheet = args
        .get_one::<String>("source-sheet")
        .map(|s| SheetIdentifier::from(s.as_str()))
        .or_else(|| scheme.as_ref().map(|s| s.source_sheet.clone()))
        .unwrap_or_default();
    let template_sheet = args
        .get_one::<String>("template-sheet")
        .map(|s| SheetIdentifier::from(s.as_str()))
        .or_else(|| scheme.as_ref().map(|s| s.template_sheet.clone()))
        .unwrap_or_default();

    let ordinal = session
        .source()
        .context("source not loaded")?
        .sheet_ordinal(&source_sheet)?;
    session.select_source_sheet(ordinal)?;
    let ordinal = session
        .template()
        .context("template not loaded")?
        .sheet_ordinal(&template_sheet)?;
    session.select_template_sheet(ordinal)?;

    if let Some(scheme) = &scheme {
        session.apply_scheme(scheme)?;
        println!(
            "{} Applied scheme {}",
            style("✓").green(),
            style(&scheme.name).bold()
        );
    }

    for pair in args.get_many::<String>("map").into_iter().flatten() {
        let (source, template) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected SOURCE=TEMPLATE, got '{pair}'"))?;
        session.add_pair(source.trim(), template.trim())?;
    }

    if session.mapping().is_empty() {
        bail!("No field pairs given; use --map SOURCE=TEMPLATE or --scheme NAME");
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .context("invalid spinner template")?,
    );
    pb.set_message("Converting rows...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let output = match session.process() {
        Ok(output) => {
            pb.finish_and_clear();
            output
        }
        Err(e) => {
            pb.abandon_with_message("Conversion failed");
            return Err(e.into());
        }
    };

    let output_path = args.get_one::<PathBuf>("output").cloned().unwrap_or_else(|| {
        source_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&output.output_file_name)
    });
    fs::write(&output_path, &output.output_bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!(
        "{} Converted {} rows into {} columns in {}ms",
        style("✓").green(),
        style(output.row_count).bold().green(),
        output.output_column_count,
        output.processing_time_ms
    );
    println!("  Saved to {}", style(output_path.display()).cyan());

    if let Some(name) = args.get_one::<String>("save-as") {
        let scheme = session.to_scheme(name)?;
        let saved_name = scheme.name.clone();
        upsert_scheme(&mut schemes, scheme)?;
        store.save_all(&schemes)?;
        println!(
            "{} Saved scheme {} to {}",
            style("✓").green(),
            style(saved_name).bold(),
            store.path().display()
        );
    }

    Ok(())
}

fn manage_schemes(store: &SchemeStore, args: &ArgMatches) -> Result<()> {
    let mut schemes = store.load_all();

    match args.subcommand() {
        Some(("list", _)) => {
            if schemes.is_empty() {
                println!("No saved schemes in {}", store.path().display());
            }
            for scheme in &schemes {
                println!(
                    "{}  {} {} -> {} ({} pairs)",
                    style(&scheme.name).bold(),
                    style("·").dim(),
                    scheme.source_file,
                    scheme.template_file,
                    scheme.mappings.len()
                );
            }
        }
        Some(("delete", args)) => {
            let name = args
                .get_one::<String>("name")
                .ok_or_else(|| anyhow!("missing <NAME>"))?;
            if !remove_scheme(&mut schemes, name) {
                bail!("No saved scheme named '{name}'");
            }
            store.save_all(&schemes)?;
            println!("{} Deleted scheme {}", style("✓").green(), style(name).bold());
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}
