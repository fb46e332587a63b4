use crate::output::{Output, OutputFormat};
use crate::HistoryCommands;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use focusflow_config::PathManager;
use focusflow_core::{resolve, SessionController};
use std::path::Path;

pub fn run_history(cmd: HistoryCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let mut controller = super::open_controller(&paths);

    match cmd {
        HistoryCommands::List => list(&controller, output),
        HistoryCommands::Delete { id, yes } => delete(&mut controller, &id, yes, output),
        HistoryCommands::Export { file } => export(&controller, &file, output),
        HistoryCommands::Import { file, yes } => import(&mut controller, &file, yes, output),
        HistoryCommands::Clear { yes } => clear(&mut controller, yes, output),
    }
}

fn list(controller: &SessionController, output: &Output) -> Result<()> {
    let records = controller.store().records();

    if output.format() != OutputFormat::Human {
        output.print_json(&serde_json::to_value(records)?);
        return Ok(());
    }

    if records.is_empty() {
        output.info("History is empty.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Title", "Video", "Last played", "Position", "Done"]);
    for record in records {
        let video = resolve(&record.url)
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            short_id(&record.id),
            record.title.clone(),
            video,
            record.last_played.format("%Y-%m-%d %H:%M").to_string(),
            format_position(record.progress, record.duration),
            String::from(if record.completed { "✓" } else { "" }),
        ]);
    }
    output.println(table.to_string());
    Ok(())
}

fn delete(
    controller: &mut SessionController,
    id: &str,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let Some(record_id) = find_record_id(controller, id) else {
        output.warn(format!("No history record matches id {}", id));
        return Ok(());
    };
    let title = controller
        .store()
        .get(&record_id)
        .map(|r| r.title.clone())
        .unwrap_or_default();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete \"{}\" from history?", title))
            .default(false)
            .interact()?;
        if !confirmed {
            output.info("Nothing deleted");
            return Ok(());
        }
    }

    controller.delete_record(&record_id);
    output.success(format!("Deleted \"{}\"", title));
    Ok(())
}

fn export(controller: &SessionController, file: &Path, output: &Output) -> Result<()> {
    let bytes = controller.export().map_err(|e| eyre!("{:#}", e))?;
    std::fs::write(file, bytes)
        .wrap_err_with(|| format!("failed to write {}", file.display()))?;
    output.success(format!(
        "Exported {} records to {}",
        controller.store().len(),
        file.display()
    ));
    Ok(())
}

fn import(
    controller: &mut SessionController,
    file: &Path,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let bytes = std::fs::read(file)
        .wrap_err_with(|| format!("failed to read {}", file.display()))?;

    if !yes && !controller.store().is_empty() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Replace the {} existing records with the contents of {}?",
                controller.store().len(),
                file.display()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output.info("Import cancelled");
            return Ok(());
        }
    }

    let count = controller
        .import(&bytes)
        .map_err(|e| eyre!("import rejected, history unchanged: {}", e))?;
    output.success(format!("Imported {} records", count));
    Ok(())
}

fn clear(controller: &mut SessionController, yes: bool, output: &Output) -> Result<()> {
    if controller.store().is_empty() {
        output.info("History is already empty.");
        return Ok(());
    }
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete all {} history records?",
                controller.store().len()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output.info("Nothing cleared");
            return Ok(());
        }
    }
    controller.import(b"[]").map_err(|e| eyre!("{}", e))?;
    output.success("History cleared");
    Ok(())
}

/// Accept either a full record id or an unambiguous prefix (as shown in the
/// list view).
fn find_record_id(controller: &SessionController, id: &str) -> Option<String> {
    let records = controller.store().records();
    if let Some(record) = records.iter().find(|r| r.id == id) {
        return Some(record.id.clone());
    }
    let mut matches = records.iter().filter(|r| r.id.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Some(record.id.clone()),
        _ => None,
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn format_position(progress: f64, duration: f64) -> String {
    let fmt = |seconds: f64| {
        let total = seconds.max(0.0) as u64;
        format!("{}:{:02}", total / 60, total % 60)
    };
    if duration > 0.0 {
        format!("{} / {}", fmt(progress), fmt(duration))
    } else {
        fmt(progress)
    }
}
