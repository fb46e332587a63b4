use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Confirm, Editor, Input, Select};
use focusflow_config::{Config, CredentialStore, PathManager};
use focusflow_core::{
    resolve, CoreError, EnrichmentCoordinator, EnrichmentState, SessionController, SessionPatch,
};
use focusflow_models::{SessionRecord, StudyAidKind};
use focusflow_providers::{GeminiProvider, StudyAidProvider, StudyAidRequest};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::warn;

pub async fn run_load(url: Option<String>, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config = Config::load(&paths.config_file())
        .map_err(|e| eyre!("failed to read {}: {:#}", paths.config_file().display(), e))?;
    let mut controller = super::open_controller(&paths);
    let mut coordinator = EnrichmentCoordinator::new();
    let provider = build_provider(&config, &paths);

    match url {
        Some(raw) => {
            let record = controller
                .load_link(&raw)
                .map_err(|e| eyre!("{} - paste a watch/short/embed URL or a bare 11-character id", e))?;
            output.success(format!("Loaded \"{}\"", record.title));
        }
        None => {
            if !pick_from_history(&mut controller)? {
                output.warn("History is empty. Pass a link to start: focusflow load <url>");
                return Ok(());
            }
        }
    }

    session_loop(&mut controller, &mut coordinator, &provider, &config, output).await
}

/// The interactive focus session: one process, one active session, each menu
/// action runs to completion before the next is read.
async fn session_loop(
    controller: &mut SessionController,
    coordinator: &mut EnrichmentCoordinator,
    provider: &std::result::Result<GeminiProvider, String>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    const ACTIONS: &[&str] = &[
        "Edit notes",
        "Generate study plan",
        "Generate quiz",
        "Refine notes into a summary",
        "Show last study aid",
        "Set watch position",
        "Rename session",
        "Toggle completed",
        "Load another link",
        "Switch from history",
        "Delete this session",
        "Quit",
    ];

    loop {
        let Some(record) = controller.active().cloned() else {
            output.warn("No active session.");
            return Ok(());
        };
        print_session(&record, config, output);

        let action = Select::new()
            .with_prompt("Action")
            .items(ACTIONS)
            .default(0)
            .interact()?;

        match action {
            0 => edit_notes(controller, &record, output)?,
            1 => generate(controller, coordinator, provider, StudyAidKind::Plan, output).await?,
            2 => generate(controller, coordinator, provider, StudyAidKind::Quiz, output).await?,
            3 => generate(controller, coordinator, provider, StudyAidKind::Summary, output).await?,
            4 => show_last_aid(coordinator, output),
            5 => set_watch_position(controller, output)?,
            6 => {
                let title: String = Input::new()
                    .with_prompt("New title")
                    .with_initial_text(record.title.clone())
                    .interact_text()?;
                controller.apply_update(SessionPatch {
                    title: Some(title),
                    ..Default::default()
                });
            }
            7 => {
                controller.apply_update(SessionPatch {
                    completed: Some(!record.completed),
                    ..Default::default()
                });
            }
            8 => {
                let raw: String = Input::new().with_prompt("Video link").interact_text()?;
                match controller.load_link(&raw) {
                    Ok(loaded) => {
                        output.success(format!("Loaded \"{}\"", loaded.title));
                        coordinator.reset();
                    }
                    Err(e) => {
                        // The failed load cleared the active session.
                        coordinator.reset();
                        output.error(format!("{} - paste a valid YouTube link", e));
                        return Ok(());
                    }
                }
            }
            9 => {
                if pick_from_history(controller)? {
                    coordinator.reset();
                } else {
                    output.warn("History is empty.");
                }
            }
            10 => {
                if Confirm::new()
                    .with_prompt(format!("Delete \"{}\" from history?", record.title))
                    .default(false)
                    .interact()?
                {
                    controller.delete_record(&record.id);
                    coordinator.reset();
                    output.success("Session deleted");
                    return Ok(());
                }
            }
            _ => return Ok(()),
        }
    }
}

fn print_session(record: &SessionRecord, config: &Config, output: &Output) {
    output.println("");
    output.println(format!("» {}", record.title));
    output.println(format!("  {}", record.url));
    if let Some(video_id) = resolve(&record.url) {
        output.println(format!(
            "  player: {}",
            video_id.embed_url(config.player.autoplay, config.player.controls)
        ));
    }
    let status = if record.completed { "completed" } else { "in progress" };
    output.println(format!(
        "  {} | position {} | notes: {}",
        status,
        format_seconds(record.progress),
        if record.notes.is_empty() {
            "none".to_string()
        } else {
            format!("{} chars", record.notes.chars().count())
        }
    ));
}

fn edit_notes(
    controller: &mut SessionController,
    record: &SessionRecord,
    output: &Output,
) -> Result<()> {
    let edited = match Editor::new().edit(&record.notes) {
        Ok(result) => result,
        Err(e) => {
            warn!("editor unavailable, falling back to inline input: {}", e);
            let line: String = Input::new()
                .with_prompt("Notes")
                .with_initial_text(record.notes.clone())
                .allow_empty(true)
                .interact_text()?;
            Some(line)
        }
    };
    match edited {
        Some(notes) => {
            controller.apply_update(SessionPatch {
                notes: Some(notes),
                ..Default::default()
            });
            output.success("Notes saved");
        }
        None => output.info("Notes unchanged"),
    }
    Ok(())
}

fn set_watch_position(controller: &mut SessionController, output: &Output) -> Result<()> {
    let progress: String = Input::new()
        .with_prompt("Watch position in seconds (empty to keep)")
        .allow_empty(true)
        .interact_text()?;
    let duration: String = Input::new()
        .with_prompt("Total duration in seconds (empty to keep)")
        .allow_empty(true)
        .interact_text()?;
    let patch = SessionPatch {
        progress: progress.trim().parse().ok(),
        duration: duration.trim().parse().ok(),
        ..Default::default()
    };
    if patch.progress.is_none() && patch.duration.is_none() {
        output.info("Position unchanged");
        return Ok(());
    }
    controller.apply_update(patch);
    output.success("Position saved");
    Ok(())
}

/// Drive one study-aid request end to end: single-flight begin, the awaited
/// provider call, and the staleness-guarded finish.
async fn generate(
    controller: &mut SessionController,
    coordinator: &mut EnrichmentCoordinator,
    provider: &std::result::Result<GeminiProvider, String>,
    kind: StudyAidKind,
    output: &Output,
) -> Result<()> {
    let Some(record) = controller.active().cloned() else {
        output.warn("No active session.");
        return Ok(());
    };
    let provider = match provider {
        Ok(provider) => provider,
        Err(reason) => {
            output.error(CoreError::Enrichment(reason.clone()).to_string());
            return Ok(());
        }
    };
    let Some(ticket) = coordinator.begin(&record, kind) else {
        output.info("A study aid request is already running.");
        return Ok(());
    };

    let request = StudyAidRequest {
        title: record.title.clone(),
        notes: record.notes.clone(),
        kind,
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Generating {}...", kind));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let outcome = provider
        .generate(&request)
        .await
        .map_err(|e| e.to_string());
    spinner.finish_and_clear();

    if !coordinator.finish(ticket, outcome, controller.active_id()) {
        output.warn("Discarded a study aid result for a session that is no longer active.");
        return Ok(());
    }
    show_last_aid(coordinator, output);
    Ok(())
}

fn show_last_aid(coordinator: &EnrichmentCoordinator, output: &Output) {
    match coordinator.state() {
        EnrichmentState::Idle => output.info("No study aid generated yet."),
        EnrichmentState::Requesting { kind, .. } => {
            output.info(format!("A {} request is still running.", kind));
        }
        EnrichmentState::Ready { kind, text, .. } => {
            output.println(format!("\n--- {} ---", kind));
            output.println(text);
            output.println("");
        }
        EnrichmentState::Failed { reason, .. } => {
            output.error(format!("Study aid generation failed: {}", reason));
        }
    }
}

fn pick_from_history(controller: &mut SessionController) -> Result<bool> {
    let items: Vec<String> = controller
        .store()
        .records()
        .iter()
        .map(|r| {
            format!(
                "{}  {}  ({})",
                r.last_played.format("%Y-%m-%d %H:%M"),
                r.title,
                r.url
            )
        })
        .collect();
    if items.is_empty() {
        return Ok(false);
    }
    let index = Select::new()
        .with_prompt("Pick a session")
        .items(&items)
        .default(0)
        .interact()?;
    let id = controller.store().records()[index].id.clone();
    controller.select_existing(&id).map_err(|e| eyre!("{}", e))?;
    Ok(true)
}

/// Resolve the configured study-aid provider, or the reason it is
/// unavailable.
fn build_provider(config: &Config, paths: &PathManager) -> std::result::Result<GeminiProvider, String> {
    if !config.enrichment.enabled {
        return Err("study aid generation is disabled in the config".to_string());
    }
    let mut credentials = CredentialStore::new(paths.credentials_file());
    if let Err(e) = credentials.load() {
        warn!("could not read credentials file: {:#}", e);
    }
    GeminiProvider::with_resolved_key(
        credentials.get_gemini_api_key().cloned(),
        config.enrichment.model.clone(),
        config.enrichment.base_url.clone(),
    )
    .map_err(|e| format!("{} - run: focusflow config gemini", e))
}

fn format_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
