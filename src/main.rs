use clap::Parser;
use quire::data::{DefaultTableModel, Parameters};
use quire::{
    ContentWriter, CsvContentWriter, EngineConfig, HtmlContentWriter, QuireError, ReportProcessor,
    RunStatistics, TabularReport,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

/// Lays out a JSON array of records as a tabular report and writes it as CSV or HTML.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON file holding an array of records
    data: PathBuf,

    /// Output file; `.html` writes HTML, anything else CSV
    output: PathBuf,

    /// Report title (default: the data file name)
    #[arg(long)]
    title: Option<String>,

    /// Start a group whenever this field changes
    #[arg(long, value_name = "FIELD")]
    group_by: Option<String>,

    /// Add a page footer with the page number
    #[arg(long)]
    page_numbers: bool,

    /// Print run statistics as JSON to stdout
    #[arg(long)]
    stats: bool,

    /// Engine property, e.g. -D quire.fast-path=never
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, String)>,
}

fn parse_property(property: &str) -> Result<(String, String), String> {
    property
        .split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{property}'"))
}

#[derive(Serialize)]
struct RunSummary {
    pages: usize,
    rows: usize,
    passes: Vec<String>,
    fast_path: bool,
    peak_active_boxes: usize,
    diagnostics: usize,
}

impl From<&RunStatistics> for RunSummary {
    fn from(stats: &RunStatistics) -> Self {
        Self {
            pages: stats.pages,
            rows: stats.rows,
            passes: stats.passes.iter().map(ToString::to_string).collect(),
            fast_path: stats.fast_path,
            peak_active_boxes: stats.peak_active_boxes,
            diagnostics: stats.diagnostics.len(),
        }
    }
}

fn run(args: Args) -> Result<(), QuireError> {
    let started = Instant::now();
    log::info!("Loading data from {}", args.data.display());
    let json: Vec<serde_json::Value> = serde_json::from_str(&fs::read_to_string(&args.data)?)?;
    let table = DefaultTableModel::from_json_rows(&json)?;

    let title = args.title.clone().unwrap_or_else(|| {
        args.data
            .file_stem()
            .map_or_else(|| "Report".to_string(), |s| s.to_string_lossy().into_owned())
    });
    let mut tabular = TabularReport::new(&title).page_numbers(args.page_numbers);
    if let Some(field) = &args.group_by {
        tabular = tabular.group_by(field);
    }
    let report = tabular.build(table);

    let properties: HashMap<String, String> = args.properties.iter().cloned().collect();
    let config = EngineConfig::from_properties(&properties)?;
    let processor = ReportProcessor::new(config);
    let out = BufWriter::new(File::create(&args.output)?);
    let html = args.output.extension().is_some_and(|ext| ext == "html");
    let mut writer: Box<dyn ContentWriter> = if html {
        Box::new(HtmlContentWriter::new(out, &title))
    } else {
        Box::new(CsvContentWriter::new(out))
    };

    let statistics = processor
        .export(
            &report,
            &Parameters::new(),
            processor.create_cache(),
            writer.as_mut(),
        )
        .into_result()?;

    log::info!(
        "Wrote {} rows to {} in {:.2?} ({})",
        statistics.rows,
        args.output.display(),
        started.elapsed(),
        if statistics.fast_path { "single pass" } else { "full pipeline" }
    );
    for diagnostic in &statistics.diagnostics {
        log::warn!("{diagnostic:?}");
    }
    if args.stats {
        println!("{}", serde_json::to_string_pretty(&RunSummary::from(&statistics))?);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
