use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use boardmill::{compile_job, init_logging, Inventory, Length, Operations, PadRecord, Settings};

/// Board description as exported by the CAD bridge: the pad list plus the
/// outline routing diameter.
#[derive(Debug, Deserialize)]
struct BoardFile {
    #[serde(default)]
    pads: Vec<PadRecord>,
    #[serde(default)]
    outline_diameter: Option<Length>,
}

fn parse_operations(arg: &str) -> anyhow::Result<Operations> {
    match arg {
        "pth" | "first" => Ok(Operations::FIRST),
        "npth" => Ok(Operations::NPTH),
        "outline" => Ok(Operations::OUTLINE),
        "final" => Ok(Operations::FINAL),
        "all" => Ok(Operations::ALL),
        other => anyhow::bail!("unknown pass selection '{other}'"),
    }
}

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let mut args = std::env::args().skip(1);
    let Some(board_path) = args.next().map(PathBuf::from) else {
        eprintln!("Usage: boardmill <board.json> [pth|npth|outline|final|all]");
        std::process::exit(2);
    };
    let operations = match args.next() {
        Some(arg) => parse_operations(&arg)?,
        None => Operations::ALL,
    };

    let settings = Settings::load().context("loading settings")?;

    let content = std::fs::read_to_string(&board_path)
        .with_context(|| format!("reading {}", board_path.display()))?;
    let board: BoardFile = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", board_path.display()))?;

    let mut inventory = Inventory::new();
    for pad in &board.pads {
        inventory.add_hole(pad);
    }
    inventory.add_route(
        board
            .outline_diameter
            .unwrap_or(settings.machining.router_diameter_for_contour),
    );

    let source = board_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| board_path.display().to_string());

    let job = compile_job(&settings, &inventory, operations, &source)?;

    if job.setup.is_empty() {
        eprintln!("Rack is ready, no setup required");
    } else {
        eprintln!("Rack setup:");
        for instruction in &job.setup {
            eprintln!("  {instruction}");
        }
    }

    print!("{}", job.gcode);

    Ok(())
}
