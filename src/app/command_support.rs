use crate::backend::{BackendError, CrmApiClient};
use crate::config::{
    default_state_root, load_global_settings, ConfigError, Settings,
};
use crate::shared::SessionLog;
use crate::templates::TemplateCatalog;
use crate::tui::EditorOptions;

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

pub fn load_settings() -> Result<Settings, String> {
    load_global_settings().map_err(map_config_err)
}

/// Session log under the state root, or a disabled one when there is no
/// home directory to put it in.
pub fn session_log() -> SessionLog {
    match default_state_root() {
        Ok(root) => SessionLog::for_state_root(&root),
        Err(_) => SessionLog::disabled(),
    }
}

pub fn api_client(settings: &Settings) -> Result<CrmApiClient, String> {
    let base = settings.resolved_api_base().ok_or_else(|| {
        BackendError::NotConfigured(format!(
            "set api.base_url in the config file or {}",
            crate::config::API_BASE_ENV
        ))
        .to_string()
    })?;
    Ok(CrmApiClient::new(
        &base,
        settings.api_token(),
        settings.api_timeout(),
    ))
}

pub fn template_catalog(settings: &Settings) -> TemplateCatalog {
    TemplateCatalog::with_extras(&settings.templates)
}

pub fn editor_options(settings: &Settings) -> EditorOptions {
    EditorOptions {
        trigger: settings.trigger_char(),
        palette_height: settings.editor.palette_height,
        min_top_margin: settings.editor.min_top_margin,
    }
}
