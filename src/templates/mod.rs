pub mod agent_templates;

pub use agent_templates::{
    builtin_specialists, principal_template, AgentTemplate, TemplateFaq, TemplateStep,
};

/// Built-in templates plus any extras from the settings file. An extra
/// template with a built-in id replaces that built-in in place.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    principal: AgentTemplate,
    specialists: Vec<AgentTemplate>,
}

impl TemplateCatalog {
    pub fn builtin() -> Self {
        Self::with_extras(&[])
    }

    pub fn with_extras(extras: &[AgentTemplate]) -> Self {
        let mut specialists = builtin_specialists();
        for extra in extras {
            match specialists.iter_mut().find(|t| t.id == extra.id) {
                Some(existing) => *existing = extra.clone(),
                None => specialists.push(extra.clone()),
            }
        }
        Self {
            principal: principal_template(),
            specialists,
        }
    }

    pub fn principal(&self) -> &AgentTemplate {
        &self.principal
    }

    pub fn specialists(&self) -> &[AgentTemplate] {
        &self.specialists
    }

    pub fn get(&self, id: &str) -> Option<&AgentTemplate> {
        if id == self.principal.id.as_str() {
            return Some(&self.principal);
        }
        self.specialists.iter().find(|t| t.id.as_str() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::TemplateId;

    #[test]
    fn extras_replace_builtins_by_id_and_append_new_ones() {
        let mut bpc = builtin_specialists()[1].clone();
        bpc.name = "BPC/LOAS".to_string();
        let inss = AgentTemplate {
            id: TemplateId::parse("inss").expect("id"),
            name: "INSS".to_string(),
            description: String::new(),
            rules_html: String::new(),
            steps: Vec::new(),
            faq: Vec::new(),
        };
        let catalog = TemplateCatalog::with_extras(&[bpc, inss]);
        assert_eq!(catalog.get("bpc").map(|t| t.name.as_str()), Some("BPC/LOAS"));
        assert_eq!(catalog.specialists().len(), 5);
        assert_eq!(catalog.get("principal").map(|t| t.name.as_str()), Some("Principal"));
    }
}
