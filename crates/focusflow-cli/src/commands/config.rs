use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use focusflow_config::{Config, CredentialStore, PathManager};
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let mut config = Config::load(&paths.config_file()).map_err(|e| eyre!("{:#}", e))?;

    match cmd {
        ConfigCommands::Show => show(&config, &paths, output),
        ConfigCommands::Gemini { model, api_key } => {
            gemini(&mut config, &paths, model, api_key, output)
        }
        ConfigCommands::Player { autoplay, controls } => {
            player(&mut config, &paths, autoplay, controls, output)
        }
    }
}

fn api_key_status(paths: &PathManager) -> &'static str {
    if std::env::var("GEMINI_API_KEY").map(|k| !k.is_empty()).unwrap_or(false) {
        return "configured (environment)";
    }
    let mut credentials = CredentialStore::new(paths.credentials_file());
    if credentials.load().is_ok() && credentials.get_gemini_api_key().is_some() {
        return "configured (stored)";
    }
    "not set"
}

fn show(config: &Config, paths: &PathManager, output: &Output) -> Result<()> {
    let key_status = api_key_status(paths);

    if output.format() != OutputFormat::Human {
        output.print_json(&json!({
            "enrichment": {
                "enabled": config.enrichment.enabled,
                "model": config.enrichment.model,
                "base_url": config.enrichment.base_url,
                "api_key": key_status,
            },
            "player": {
                "autoplay": config.player.autoplay,
                "controls": config.player.controls,
            },
            "config_file": paths.config_file(),
            "history_file": paths.history_file(),
        }));
        return Ok(());
    }

    output.println(format!("Config file:  {}", paths.config_file().display()));
    output.println(format!("History file: {}", paths.history_file().display()));
    output.println("");
    output.println("[enrichment]");
    output.println(format!("  enabled:  {}", config.enrichment.enabled));
    output.println(format!("  model:    {}", config.enrichment.model));
    if let Some(base_url) = &config.enrichment.base_url {
        output.println(format!("  base_url: {}", base_url));
    }
    output.println(format!("  api key:  {}", key_status));
    output.println("");
    output.println("[player]");
    output.println(format!("  autoplay: {}", config.player.autoplay));
    output.println(format!("  controls: {}", config.player.controls));
    Ok(())
}

fn gemini(
    config: &mut Config,
    paths: &PathManager,
    model: Option<String>,
    api_key: Option<String>,
    output: &Output,
) -> Result<()> {
    if let Some(model) = model {
        config.enrichment.model = model;
    }
    config.enrichment.enabled = true;
    config
        .save(&paths.config_file())
        .map_err(|e| eyre!("{:#}", e))?;

    let key = match api_key {
        Some(key) => key,
        None => rpassword::prompt_password("Gemini API Key (empty to keep current): ")?,
    };
    if key.trim().is_empty() {
        output.info("API key unchanged");
    } else {
        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials.load().map_err(|e| eyre!("{:#}", e))?;
        credentials.set_gemini_api_key(key.trim().to_string());
        credentials.save().map_err(|e| eyre!("{:#}", e))?;
        output.success("Gemini API key saved");
    }

    output.success(format!(
        "Study aid generation enabled with model {}",
        config.enrichment.model
    ));
    Ok(())
}

fn player(
    config: &mut Config,
    paths: &PathManager,
    autoplay: Option<bool>,
    controls: Option<bool>,
    output: &Output,
) -> Result<()> {
    if autoplay.is_none() && controls.is_none() {
        output.println(format!("autoplay: {}", config.player.autoplay));
        output.println(format!("controls: {}", config.player.controls));
        return Ok(());
    }
    if let Some(autoplay) = autoplay {
        config.player.autoplay = autoplay;
    }
    if let Some(controls) = controls {
        config.player.controls = controls;
    }
    config
        .save(&paths.config_file())
        .map_err(|e| eyre!("{:#}", e))?;
    output.success("Player settings saved");
    Ok(())
}
