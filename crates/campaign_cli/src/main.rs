mod config;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use campaign_core::resources::{resource_index, resource_label};
use campaign_core::{
    CodecOptions, SaveBody, SaveDocument, SaveHeader, delete_save, duplicate_save, list_saves,
    read_mod_metadata,
};
use clap::{Parser, Subcommand};
use serde_json::{Value as JsonValue, json};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Config file (defaults to <config dir>/campaign-se/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log more (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Header and body summary
    Info {
        save: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Header fields only
    Header {
        save: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Squaddies and leaders
    Roster {
        save: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Planet control values
    Planets {
        save: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Patch body fields in place (a .bak copy is written first)
    Set {
        save: PathBuf,
        #[arg(long, value_name = "true|false")]
        ironman: Option<bool>,
        /// NAME_OR_INDEX=VALUE, e.g. credits=500
        #[arg(long = "resource", value_parser = parse_resource_edit, allow_hyphen_values = true)]
        resources: Vec<(usize, i32)>,
        /// INDEX=CONTROL[,CHANGE]
        #[arg(long = "planet", value_parser = parse_planet_edit, allow_hyphen_values = true)]
        planets: Vec<PlanetEdit>,
    },
    /// Change the save's display name
    Rename { save: PathBuf, name: String },
    /// Copy a save with its sidecars under a new name
    Duplicate {
        source: PathBuf,
        destination: PathBuf,
        /// Display name for the copy
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete a save with its sidecars
    Delete { save: PathBuf },
    /// List saves in a directory
    List {
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show the mods recorded for a save
    Modmeta {
        save: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlanetEdit {
    index: usize,
    control: i32,
    control_change: Option<i32>,
}

fn parse_resource_edit(value: &str) -> Result<(usize, i32), String> {
    let (key, amount) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {value:?}"))?;
    let index = resource_index(key).ok_or_else(|| format!("unknown resource {key:?}"))?;
    let amount = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid value {amount:?}: {e}"))?;
    Ok((index, amount))
}

fn parse_planet_edit(value: &str) -> Result<PlanetEdit, String> {
    let (index, rest) = value
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=CONTROL[,CHANGE], got {value:?}"))?;
    let index = index
        .trim()
        .parse()
        .map_err(|e| format!("invalid planet index {index:?}: {e}"))?;
    let (control, change) = match rest.split_once(',') {
        Some((control, change)) => (control, Some(change)),
        None => (rest, None),
    };
    let control = control
        .trim()
        .parse()
        .map_err(|e| format!("invalid control {control:?}: {e}"))?;
    let control_change = change
        .map(|c| c.trim().parse())
        .transpose()
        .map_err(|e| format!("invalid control change: {e}"))?;
    Ok(PlanetEdit {
        index,
        control,
        control_change,
    })
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(fallback)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error loading config: {e:#}");
        process::exit(1);
    });

    if let Err(e) = run(cli.command, config.codec) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command, options: CodecOptions) -> Result<()> {
    match command {
        Command::Info { save, json } => info(&save, options, json),
        Command::Header { save, json } => header(&save, options, json),
        Command::Roster { save, json } => roster(&save, options, json),
        Command::Planets { save, json } => planets(&save, options, json),
        Command::Set {
            save,
            ironman,
            resources,
            planets,
        } => set(&save, options, ironman, &resources, &planets),
        Command::Rename { save, name } => rename(&save, options, name),
        Command::Duplicate {
            source,
            destination,
            name,
        } => duplicate(&source, &destination, name),
        Command::Delete { save } => {
            let removed = delete_save(&save)?;
            for path in removed {
                println!("Deleted {}", path.display());
            }
            Ok(())
        }
        Command::List { dir, json } => list(&dir, json),
        Command::Modmeta { save, json } => modmeta(&save, json),
    }
}

fn open(save: &Path, options: CodecOptions) -> Result<SaveDocument> {
    SaveDocument::open_with(save, options)
        .with_context(|| format!("Error parsing save file: {}", save.display()))
}

fn require_body(doc: &SaveDocument) -> Result<&SaveBody> {
    match (doc.body(), doc.body_error()) {
        (Some(body), _) => Ok(body),
        (None, Some(e)) => Err(anyhow::anyhow!("save body unavailable: {e}")),
        (None, None) => Err(anyhow::anyhow!("save body unavailable")),
    }
}

fn print_json(value: &JsonValue) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Error rendering JSON output")?;
    println!("{rendered}");
    Ok(())
}

fn info(save: &Path, options: CodecOptions, json: bool) -> Result<()> {
    let doc = open(save, options)?;
    if json {
        return print_json(&json!({
            "header": doc.header(),
            "body": doc.body(),
            "body_error": doc.body_error().map(|e| e.to_string()),
        }));
    }

    print_header(doc.header());
    println!();
    match (doc.body(), doc.body_error()) {
        (Some(body), _) => print_body_summary(body),
        (None, Some(e)) => println!("Body: unavailable ({e})"),
        (None, None) => println!("Body: unavailable"),
    }
    Ok(())
}

fn header(save: &Path, options: CodecOptions, json: bool) -> Result<()> {
    let doc = open(save, options)?;
    if json {
        return print_json(&json!(doc.header()));
    }
    print_header(doc.header());
    Ok(())
}

fn print_header(h: &SaveHeader) {
    println!("Save:        {}", h.save_name);
    println!("Version:     {}", h.version);
    println!("State:       {}", h.state);
    match h.saved_at() {
        Some(at) => println!("Saved at:    {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Saved at:    (ticks {})", h.timestamp_ticks),
    }
    println!("Planet:      {}", h.planet_name);
    println!(
        "Operation:   {} ({}/{} missions)",
        h.operation_name, h.completed_missions, h.operation_length
    );
    println!("Difficulty:  {}", h.difficulty);
    if let Some(config) = &h.strategy_config_name {
        println!("Config:      {config}");
    }
    println!("Play time:   {}", format_duration(h.play_time_seconds));
}

fn print_body_summary(body: &SaveBody) {
    println!(
        "Ironman:     {}{}",
        if body.ironman { "yes" } else { "no" },
        if body.ironman_name.is_empty() {
            String::new()
        } else {
            format!(" ({})", body.ironman_name)
        }
    );
    println!("Config:      {}", body.config_label.display_name());
    println!("Resources:");
    for (i, value) in body.resources.iter().enumerate() {
        println!("  {:<12} {value}", resource_label(i));
    }
    if body.corruption_marker_ok == Some(false) {
        println!("Warning: corruption marker mismatch");
    }
    println!(
        "Squaddies: {}  Leaders: {} hired, {} dismissed, {} dead  Planets: {}",
        body.squaddies.len(),
        body.hired.len(),
        body.dismissed.len(),
        body.dead.len(),
        body.planets.len()
    );
    if let Some(op) = &body.current_operation {
        println!(
            "Current operation: {} on {} (mission {})",
            op.template, op.planet, op.current_mission_index
        );
    }
    if let Some(failure) = &body.extended_failure {
        println!("Roster/planet data incomplete: {failure}");
    }
}

fn roster(save: &Path, options: CodecOptions, json: bool) -> Result<()> {
    let doc = open(save, options)?;
    let body = require_body(&doc)?;
    if json {
        return print_json(&json!({
            "squaddies": body.squaddies,
            "hired": body.hired,
            "dismissed": body.dismissed,
            "dead": body.dead,
            "complete": body.is_fully_valid(),
        }));
    }

    println!("Squaddies:");
    for s in &body.squaddies {
        println!("  #{:<4} {:<24} {}", s.id, s.full_name(), s.template);
    }
    for (title, list) in [
        ("Hired", &body.hired),
        ("Dismissed", &body.dismissed),
        ("Dead", &body.dead),
    ] {
        println!("{title}:");
        for l in list {
            println!(
                "  #{:<4} {:<24} {} [{}]",
                l.id, l.custom_name, l.template, l.actor_type
            );
        }
    }
    if let Some(failure) = &body.extended_failure {
        println!("Roster may be incomplete: {failure}");
    }
    Ok(())
}

fn planets(save: &Path, options: CodecOptions, json: bool) -> Result<()> {
    let doc = open(save, options)?;
    let body = require_body(&doc)?;
    if json {
        return print_json(&json!(body.planets));
    }
    for (i, p) in body.planets.iter().enumerate() {
        println!(
            "{i:>3}  {:<24} control={} change={}",
            p.template, p.control, p.control_change
        );
    }
    Ok(())
}

fn set(
    save: &Path,
    options: CodecOptions,
    ironman: Option<bool>,
    resources: &[(usize, i32)],
    planets: &[PlanetEdit],
) -> Result<()> {
    if ironman.is_none() && resources.is_empty() && planets.is_empty() {
        eprintln!("set requires at least one of --ironman, --resource, --planet");
        process::exit(2);
    }

    let mut doc = open(save, options)?;
    if let Some(flag) = ironman {
        doc.set_ironman(flag)?;
    }
    for &(index, value) in resources {
        doc.set_resource(index, value)?;
    }
    for edit in planets {
        doc.set_planet_control(edit.index, edit.control, edit.control_change)?;
    }

    let (_doc, report) = doc.commit_body()?;
    if let Some(mismatch) = report.planet_count_mismatch {
        eprintln!(
            "Warning: planet count on disk ({}) differs from parsed ({}); patched {}",
            mismatch.on_disk,
            mismatch.in_memory,
            mismatch.on_disk.min(mismatch.in_memory)
        );
    }
    println!(
        "Patched {} range(s) in {} (backup: {})",
        report.ranges.len(),
        save.display(),
        report.backup.display()
    );
    Ok(())
}

fn rename(save: &Path, options: CodecOptions, name: String) -> Result<()> {
    let mut doc = open(save, options)?;
    doc.set_save_name(name);
    let doc = doc.commit_header()?;
    println!("Renamed {} to {:?}", save.display(), doc.header().save_name);
    Ok(())
}

fn duplicate(source: &Path, destination: &Path, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => {
            let header = campaign_core::parse_header(source)
                .with_context(|| format!("Error parsing save file: {}", source.display()))?;
            format!("{} (copy)", header.save_name)
        }
    };
    let header = duplicate_save(source, destination, &name)?;
    println!(
        "Duplicated {} to {} as {:?}",
        source.display(),
        destination.display(),
        header.save_name
    );
    Ok(())
}

fn list(dir: &Path, json: bool) -> Result<()> {
    let units = list_saves(dir)?;
    if json {
        return print_json(&json!(units));
    }
    for unit in units {
        let mut extras = Vec::new();
        if !unit.screenshots.is_empty() {
            extras.push("screenshot");
        }
        if unit.backup.is_some() {
            extras.push("backup");
        }
        if unit.modmeta.is_some() {
            extras.push("modmeta");
        }
        if extras.is_empty() {
            println!("{}", unit.save.display());
        } else {
            println!("{} [{}]", unit.save.display(), extras.join(", "));
        }
    }
    Ok(())
}

fn modmeta(save: &Path, json: bool) -> Result<()> {
    let meta = read_mod_metadata(save)?;
    if json {
        return print_json(&json!(meta));
    }
    let Some(meta) = meta else {
        println!("No mod metadata");
        return Ok(());
    };
    if let Some(version) = &meta.game_version {
        println!("Game version: {version}");
    }
    for m in &meta.mods {
        match &m.version {
            Some(v) => println!("{} ({}) v{v}", m.name, m.id),
            None => println!("{} ({})", m.name, m.id),
        }
    }
    Ok(())
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}h {:02}m {:02}s", total / 3600, (total / 60) % 60, total % 60)
}
