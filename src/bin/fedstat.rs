use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fedstat_rs::storage;
use fedstat_rs::{Axis, Client, Facet};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fedstat",
    version,
    about = "Discover facets & fetch indicator data from the EMISS (fedstat.ru) portal"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List an indicator's facets and their default selection.
    Facets(FacetsArgs),
    /// Fetch data (and optionally save as CSV/JSON).
    Get(GetArgs),
}

#[derive(Args, Debug)]
struct FacetsArgs {
    /// Indicator id (e.g., 57796)
    indicator: i64,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct GetArgs {
    /// Indicator id (e.g., 57796)
    indicator: i64,
    /// Override the default selection with FACETID_VALUEID, repeatable.
    /// A facet mentioned at least once has only the listed values checked.
    #[arg(short, long = "select")]
    select: Vec<String>,
    /// Save results to file (format inferred by --format or extension);
    /// without it, CSV goes to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Facets(args) => cmd_facets(args),
        Command::Get(args) => cmd_get(args),
    }
}

fn axis_label(axis: Axis) -> &'static str {
    match axis {
        Axis::Filter => "filter",
        Axis::Line => "line",
        Axis::Column => "column",
        Axis::Group => "group",
    }
}

fn cmd_facets(args: FacetsArgs) -> Result<()> {
    let client = Client::default();
    let facets = client.fetch_facets(args.indicator)?;
    for f in &facets {
        let fixed = if f.is_selectable() { "" } else { " (fixed)" };
        println!("[{}] {} ({}){}", f.id, f.title, axis_label(f.axis), fixed);
        for v in &f.values {
            println!("\t({}) {} {}", v.id, v.title, if v.checked { "+" } else { "-" });
        }
    }
    Ok(())
}

fn parse_selection(s: &str) -> Result<(i64, i64)> {
    let (facet, value) = s
        .split_once('_')
        .ok_or_else(|| anyhow::anyhow!("invalid --select `{s}`, expected FACETID_VALUEID"))?;
    Ok((facet.parse()?, value.parse()?))
}

/// For each facet named in `selections`, replace the server's default
/// checked set with exactly the listed values. Unmentioned facets keep
/// their defaults.
fn apply_selection(facets: &mut [Facet], selections: &[(i64, i64)]) {
    for facet in facets.iter_mut() {
        if !selections.iter().any(|(f, _)| *f == facet.id) {
            continue;
        }
        for value in &mut facet.values {
            value.checked = selections
                .iter()
                .any(|(f, v)| *f == facet.id && *v == value.id);
        }
    }
}

fn cmd_get(args: GetArgs) -> Result<()> {
    let selections = args
        .select
        .iter()
        .map(|s| parse_selection(s))
        .collect::<Result<Vec<_>>>()?;
    let client = Client::default();
    let mut facets = client.fetch_facets(args.indicator)?;
    apply_selection(&mut facets, &selections);
    let records = client.fetch_records(args.indicator, &facets)?;

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(&records, path)?,
            "json" => storage::save_json(&records, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", records.len(), path.display());
    } else {
        storage::write_csv(&records, std::io::stdout().lock())?;
    }
    Ok(())
}
