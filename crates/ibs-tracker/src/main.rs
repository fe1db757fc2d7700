//! `ibstrack` - CLI for ibs-tracker
//!
//! This binary records daily entries and reports on them. It owns the single
//! [`Journal`] for the run and hands it to each command handler.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;

use ibs_tracker::cli::{Cli, Command, ConfigCommand, HistoryCommand, SettingsCommand};
use ibs_tracker::export::{write_export, ExportFormat};
use ibs_tracker::history::{filter_dates, BloatingBand};
use ibs_tracker::storage::Storage;
use ibs_tracker::trends::{TrendReport, Window};
use ibs_tracker::{init_logging, Config, Ease, Entry, ImportMode, Journal};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    run(&config, cli.command, Local::now().date_naive())
}

fn open_journal(config: &Config) -> Result<Journal<Storage>> {
    Journal::open(config).with_context(|| {
        format!(
            "opening journal database at {}",
            config.database_path().display()
        )
    })
}

fn run(config: &Config, command: Command, today: NaiveDate) -> Result<()> {
    match command {
        Command::Log(cmd) => {
            let mut journal = open_journal(config)?;
            let date = cmd.date.unwrap_or(today);
            let mut entry = journal.entry_or_default(date);
            cmd.apply(&mut entry);
            journal.save_entry(entry)?;
            println!("Saved entry for {date}");
        }
        Command::CopyPrevious(cmd) => {
            let mut journal = open_journal(config)?;
            let entry = journal.copy_previous(cmd.date.unwrap_or(today))?;
            println!("Copied previous entry onto {}", entry.date);
        }
        Command::Show(cmd) => {
            let journal = open_journal(config)?;
            let date = cmd.date.unwrap_or(today);
            match journal.entry(date) {
                Some(entry) if cmd.json => println!("{}", serde_json::to_string_pretty(entry)?),
                Some(entry) => print_entry(entry),
                None => println!("No entry for {date}"),
            }
        }
        Command::History(cmd) => handle_history(&open_journal(config)?, &cmd)?,
        Command::Trends(cmd) => {
            let window = match cmd.window {
                Some(days) => Window::from_days(days)?,
                None => config.default_window(),
            };
            let report = open_journal(config)?.report(window, cmd.today.unwrap_or(today));
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Command::Export(cmd) => {
            let journal = open_journal(config)?;
            let dir = cmd.out.unwrap_or_else(|| config.export_dir());
            let path = write_export(
                journal.data(),
                ExportFormat::from(cmd.format),
                &dir,
                &config.export.app_name,
                today,
            )?;
            println!("{}", path.display());
        }
        Command::Import(cmd) => {
            let mut journal = open_journal(config)?;
            journal.import_file(&cmd.file, cmd.mode.into())?;
            println!(
                "Imported {} ({}); journal now has {} entries",
                cmd.file.display(),
                ImportMode::from(cmd.mode),
                journal.data().len()
            );
        }
        Command::Clear(cmd) => {
            if !cmd.yes {
                bail!("refusing to delete all data without --yes");
            }
            open_journal(config)?.clear()?;
            println!("All data cleared");
        }
        Command::Status(cmd) => handle_status(&open_journal(config)?, cmd.json)?,
        Command::Settings(cmd) => handle_settings(&mut open_journal(config)?, cmd)?,
        Command::Config(cmd) => handle_config(config, cmd)?,
    }

    Ok(())
}

fn handle_history(journal: &Journal<Storage>, cmd: &HistoryCommand) -> Result<()> {
    let entries = &journal.data().entries;
    let dates = filter_dates(entries, cmd.filter.into(), cmd.limit);

    if cmd.json {
        let listed: Vec<&Entry> = dates.iter().filter_map(|d| entries.get(d)).collect();
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if dates.is_empty() {
        println!("No matching entries");
        return Ok(());
    }

    for entry in dates.iter().filter_map(|d| entries.get(d)) {
        let mut tags = Vec::new();
        if entry.ease == Ease::Blocked {
            tags.push("blocked");
        }
        if entry.used_enema() {
            tags.push("enema");
        }
        if entry.has_trigger() {
            tags.push("trigger");
        }
        if entry.on_period() {
            tags.push("period");
        }
        println!(
            "{}  BM {}  bloating {:>2} ({:<8})  mood {}  {}",
            entry.date,
            entry.bm_count,
            entry.bloating_pm,
            BloatingBand::for_level(entry.bloating_pm).label(),
            entry.mood,
            tags.join(", ")
        );
    }
    Ok(())
}

fn handle_status(journal: &Journal<Storage>, json: bool) -> Result<()> {
    let data = journal.data();
    let store = journal.gateway().store();
    let stats = store.stats()?;
    let span = data.date_span();

    if json {
        let status = serde_json::json!({
            "database_path": store.path(),
            "storage_key": journal.gateway().key(),
            "entries": data.len(),
            "first_date": span.map(|(first, _)| first),
            "last_date": span.map(|(_, last)| last),
            "last_saved_at": data.last_saved_at,
            "stored_bytes": stats.value_bytes,
            "database_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("ibstrack status");
        println!("---------------");
        println!("Database:      {}", store.path().display());
        println!("Storage key:   {}", journal.gateway().key());
        println!("Entries:       {}", data.len());
        if let Some((first, last)) = span {
            println!("Date range:    {first} to {last}");
        }
        match data.last_saved_at {
            Some(at) => println!("Last saved:    {}", at.to_rfc3339()),
            None => println!("Last saved:    never"),
        }
        println!("Stored bytes:  {}", stats.value_bytes);
        println!("Database size: {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_settings(journal: &mut Journal<Storage>, cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Show { json } => {
            let settings = journal.data().settings;
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                println!("Track morning bloating: {}", settings.track_am_bloating);
                println!("Track gas smell:        {}", settings.track_gas_smell);
            }
        }
        SettingsCommand::Set {
            track_am_bloating,
            track_gas_smell,
        } => {
            let mut settings = journal.data().settings;
            if let Some(v) = track_am_bloating {
                settings.track_am_bloating = v;
            }
            if let Some(v) = track_gas_smell {
                settings.track_gas_smell = v;
            }
            journal.update_settings(settings)?;
            println!("Settings saved");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!("  Storage key:    {}", config.storage.storage_key);
                println!("  Max blob bytes: {}", config.storage.max_blob_bytes);
                println!();
                println!("[Export]");
                println!("  App name:       {}", config.export.app_name);
                println!("  Output dir:     {}", config.export_dir().display());
                println!();
                println!("[Trends]");
                println!("  Default window: {}", config.default_window());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("validating {}", path.display()))?;
            println!("Configuration is valid: {}", path.display());
        }
    }
    Ok(())
}

fn print_entry(entry: &Entry) {
    fn or_dash(value: Option<u8>) -> String {
        value.map_or_else(|| "-".to_string(), |v| v.to_string())
    }
    fn join<T: std::fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
        let joined: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
        if joined.is_empty() {
            "-".to_string()
        } else {
            joined.join(", ")
        }
    }

    println!("Entry for {}", entry.date);
    println!("==============");
    println!("  BM count:           {}", entry.bm_count);
    println!("  Ease:               {}", entry.ease);
    println!("  Incomplete:         {}", entry.incomplete_emptying);
    println!("  Bristol:            {}", or_dash(entry.bristol));
    println!("  Bloating (AM/PM):   {} / {}", or_dash(entry.bloating_am), entry.bloating_pm);
    println!("  Gas:                {} ({})", entry.gas_severity, entry.gas_smell);
    println!("  Night gas:          {}", entry.night_gas);
    println!("  Garlic/onion:       {}", entry.garlic_onion);
    println!("  High fat:           {}", entry.high_fat);
    println!("  High bread/wheat:   {}", entry.high_bread_wheat);
    println!("  Alcohol:            {}", entry.alcohol);
    println!("  Spicy:              {}", entry.spicy);
    println!("  ADHD meds:          {}", entry.adhd_meds);
    println!("  Caffeine:           {}", entry.caffeine);
    println!("  Laxatives:          {}", join(&entry.laxatives));
    println!("  Dose note:          {}", entry.dose_note);
    println!("  Mood:               {}", entry.mood);
    println!("  Gross body:         {}", entry.gross_body);
    println!("  Period:             {}", entry.period_status);
    println!("  Period symptoms:    {}", join(&entry.period_symptoms));
    println!("  Note:               {}", entry.quick_note);
}

fn print_report(report: &TrendReport) {
    println!(
        "Trends: last {} to {} ({} of {} days recorded)",
        report.window,
        report.today,
        report.current.days_recorded,
        report.window.days()
    );
    println!();

    for m in &report.metrics {
        let fmt = |v: f64| {
            if m.metric.is_percent() {
                format!("{v:.0}%")
            } else {
                format!("{v:.1}")
            }
        };
        let verdict = match m.is_improvement() {
            Some(true) => "better",
            Some(false) => "worse",
            None => "",
        };
        println!(
            "  {:<22} {:>7}  (was {:>7})  {} {}",
            m.metric.label(),
            fmt(m.current),
            fmt(m.previous),
            m.trend.symbol(),
            verdict
        );
    }

    println!();
    println!("  Laxative doses:        {}", report.current.laxative_uses);
    println!("  Enema days:            {}", report.current.enema_uses);
    if report.current.period_percent > 0.0 {
        println!(
            "  Bloating on/off period: {:.1} / {:.1}",
            report.current.bloating_on_period, report.current.bloating_off_period
        );
    }

    if !report.red_flags.is_empty() {
        println!();
        println!("Red flags - consider talking to your doctor:");
        for flag in &report.red_flags {
            println!("  ! {flag}");
        }
    }
}
