use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Template ids double as CLI arguments and YAML keys, so they stay plain
/// ASCII: letters, digits, `-` and `_`.
fn validate_template_id(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("template id must be non-empty".to_string());
    }
    match value
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
    {
        None => Ok(()),
        Some(ch) => Err(format!(
            "template id must use only ASCII letters, digits, '-' or '_' (found `{ch}`)"
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    /// Name-override key reserved for the principal agent.
    pub const PRINCIPAL: &'static str = "principal";

    pub fn parse(raw: &str) -> Result<Self, String> {
        validate_template_id(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn principal() -> Self {
        Self(Self::PRINCIPAL.to_string())
    }

    pub fn is_principal(&self) -> bool {
        self.0 == Self::PRINCIPAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::borrow::Borrow<str> for TemplateId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .map_err(|err| D::Error::custom(format!("invalid template id `{raw}`: {err}")))
    }
}
