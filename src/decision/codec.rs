use super::token::{DecisionKind, DecisionToken};
use crate::content::markup::{escape_attribute, escape_text, tokenize, MarkupToken};
use std::collections::BTreeMap;

const TOKEN_TAG: &str = "span";
const TOKEN_CLASS: &str = "decision-token";
const ATTR_KIND: &str = "data-decision-kind";
const ATTR_TARGET_ID: &str = "data-decision-target-id";
const ATTR_LABEL: &str = "data-decision-label";

/// An inline element as it appears inside stored rich text: tag name,
/// attribute map, and visible text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
}

impl Fragment {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn to_html(&self) -> String {
        let mut out = format!("<{}", self.tag);
        for (name, value) in &self.attributes {
            out.push_str(&format!(" {name}=\"{}\"", escape_attribute(value)));
        }
        out.push('>');
        out.push_str(&escape_text(&self.text));
        out.push_str(&format!("</{}>", self.tag));
        out
    }

    /// Parses the first element of `html`, keeping its inner text.
    pub fn parse(html: &str) -> Option<Self> {
        let mut tokens = tokenize(html).into_iter();
        let (tag, attributes, self_closing) = loop {
            match tokens.next()? {
                MarkupToken::Open {
                    name,
                    attributes,
                    self_closing,
                } => break (name, attributes, self_closing),
                MarkupToken::Text(text) if text.trim().is_empty() => continue,
                _ => return None,
            }
        };
        let mut text = String::new();
        if !self_closing {
            let mut depth = 1usize;
            for token in tokens {
                match token {
                    MarkupToken::Open { self_closing, .. } if !self_closing => depth += 1,
                    MarkupToken::Close { .. } => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    MarkupToken::Text(chunk) => text.push_str(&chunk),
                    MarkupToken::Open { .. } => {}
                }
            }
        }
        Some(Self {
            tag,
            attributes,
            text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("fragment is not a decision token")]
    NotADecision,
    #[error("decision fragment has no kind")]
    MissingKind,
    #[error("unknown decision kind `{0}`")]
    UnknownKind(String),
    #[error("decision `{0}` is missing its target id")]
    MissingTarget(DecisionKind),
    #[error("decision target id `{0}` is not an integer")]
    InvalidTarget(String),
}

/// Encodes decision tokens to inline fragments and back.
///
/// Built once per editing session and handed by reference to every
/// component that reads or writes stored rich text.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    tag: &'static str,
    class_name: &'static str,
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCodec {
    pub fn new() -> Self {
        Self {
            tag: TOKEN_TAG,
            class_name: TOKEN_CLASS,
        }
    }

    pub fn encode(&self, token: &DecisionToken) -> Fragment {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "class".to_string(),
            format!("{} {}", self.class_name, token.kind().css_class()),
        );
        attributes.insert("contenteditable".to_string(), "false".to_string());
        attributes.insert(ATTR_KIND.to_string(), token.kind().as_str().to_string());
        if let Some(target_id) = token.target_id() {
            attributes.insert(ATTR_TARGET_ID.to_string(), target_id.to_string());
        }
        attributes.insert(ATTR_LABEL.to_string(), token.label().to_string());
        Fragment {
            tag: self.tag.to_string(),
            attributes,
            text: token.render_label(),
        }
    }

    pub fn encode_html(&self, token: &DecisionToken) -> String {
        self.encode(token).to_html()
    }

    /// True when the fragment claims to be a decision, whether or not its
    /// payload decodes.
    pub fn is_decision_fragment(&self, fragment: &Fragment) -> bool {
        if fragment.attributes.contains_key(ATTR_KIND) {
            return true;
        }
        fragment
            .attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == self.class_name))
            .unwrap_or(false)
    }

    pub fn decode(&self, fragment: &Fragment) -> Result<DecisionToken, DecodeError> {
        if !self.is_decision_fragment(fragment) {
            return Err(DecodeError::NotADecision);
        }
        let raw_kind = fragment
            .attribute(ATTR_KIND)
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(DecodeError::MissingKind)?;
        let kind = DecisionKind::parse(raw_kind)
            .ok_or_else(|| DecodeError::UnknownKind(raw_kind.to_string()))?;
        let label = fragment.attribute(ATTR_LABEL).unwrap_or_default().to_string();
        let target_id = if kind.requires_target() {
            let raw_target = fragment
                .attribute(ATTR_TARGET_ID)
                .map(str::trim)
                .filter(|raw| !raw.is_empty())
                .ok_or(DecodeError::MissingTarget(kind))?;
            Some(
                raw_target
                    .parse::<i64>()
                    .map_err(|_| DecodeError::InvalidTarget(raw_target.to_string()))?,
            )
        } else {
            None
        };
        DecisionToken::new(kind, target_id, label).map_err(|_| DecodeError::MissingTarget(kind))
    }

    pub fn decode_html(&self, html: &str) -> Result<DecisionToken, DecodeError> {
        let fragment = Fragment::parse(html).ok_or(DecodeError::NotADecision)?;
        self.decode(&fragment)
    }
}
