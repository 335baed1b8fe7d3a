use crate::app::command_support::{load_settings, template_catalog};
use crate::templates::TemplateCatalog;

pub fn cmd_templates() -> Result<String, String> {
    let settings = load_settings()?;
    Ok(templates_report(&template_catalog(&settings)))
}

pub fn templates_report(catalog: &TemplateCatalog) -> String {
    std::iter::once(catalog.principal())
        .chain(catalog.specialists())
        .map(|template| {
            format!(
                "{:<14} {:<14} steps={} faq={}  {}",
                template.id.as_str(),
                template.name,
                template.steps.len(),
                template.faq.len(),
                template.description
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
