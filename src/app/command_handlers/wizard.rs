use crate::app::command_support::{
    api_client, editor_options, load_settings, session_log, template_catalog,
};
use crate::decision::TokenCodec;
use crate::tui::{run_wizard_tui, TuiDeps};
use crate::wizard::WizardContext;

pub fn cmd_wizard() -> Result<String, String> {
    let settings = load_settings()?;
    let client = api_client(&settings)?;
    let catalog = template_catalog(&settings);
    let codec = TokenCodec::new();
    let log = session_log();
    let deps = TuiDeps {
        ctx: WizardContext {
            registry: &client,
            content: &client,
            catalog: &catalog,
            codec: &codec,
            log: &log,
            principal_name: settings.batch.principal_name.clone(),
            resolve_delay: settings.resolve_delay(),
        },
        reference: &client,
        media: &client,
        editor: editor_options(&settings),
    };
    run_wizard_tui(&deps)
}
