use super::markup::{escape_attribute, escape_text, tokenize, MarkupToken};
use super::rich_text::{Embed, MediaRef, RichText, Run, TextStyle};
use crate::decision::codec::{Fragment, TokenCodec};
use std::collections::BTreeMap;

const MEDIA_TYPE_ATTR: &str = "data-media-type";
const MEDIA_NAME_ATTR: &str = "data-media-name";

/// Serializes a document as the HTML the content store expects: one `<p>`
/// per line, `<strong>`/`<em>` for styles, inline fragments for embeds.
pub fn to_html(doc: &RichText, codec: &TokenCodec) -> String {
    let mut paragraphs: Vec<String> = vec![String::new()];
    for run in doc.runs() {
        match run {
            Run::Text { text, style } => {
                for (idx, line) in text.split('\n').enumerate() {
                    if idx > 0 {
                        paragraphs.push(String::new());
                    }
                    if line.is_empty() {
                        continue;
                    }
                    if let Some(current) = paragraphs.last_mut() {
                        current.push_str(&styled(line, *style));
                    }
                }
            }
            Run::Embed(embed) => {
                if let Some(current) = paragraphs.last_mut() {
                    current.push_str(&embed_html(embed, codec));
                }
            }
        }
    }
    if doc.is_empty() {
        return String::new();
    }
    paragraphs
        .into_iter()
        .map(|body| {
            if body.is_empty() {
                "<p><br></p>".to_string()
            } else {
                format!("<p>{body}</p>")
            }
        })
        .collect()
}

fn styled(text: &str, style: TextStyle) -> String {
    let mut out = escape_text(text);
    if style.italic {
        out = format!("<em>{out}</em>");
    }
    if style.bold {
        out = format!("<strong>{out}</strong>");
    }
    out
}

pub fn embed_html(embed: &Embed, codec: &TokenCodec) -> String {
    match embed {
        Embed::Decision(token) => codec.encode_html(token),
        Embed::Media(media) => media_html(media),
    }
}

fn media_html(media: &MediaRef) -> String {
    let url = escape_attribute(&media.url);
    let mime = escape_attribute(&media.mime_type);
    let name = escape_attribute(&media.name);
    if media.mime_type.starts_with("image/") {
        format!(r#"<img src="{url}" {MEDIA_TYPE_ATTR}="{mime}" {MEDIA_NAME_ATTR}="{name}">"#)
    } else if media.mime_type.starts_with("video/") {
        format!(r#"<video src="{url}" {MEDIA_TYPE_ATTR}="{mime}" {MEDIA_NAME_ATTR}="{name}"></video>"#)
    } else if media.mime_type.starts_with("audio/") {
        format!(r#"<audio src="{url}" {MEDIA_TYPE_ATTR}="{mime}" {MEDIA_NAME_ATTR}="{name}"></audio>"#)
    } else {
        format!(
            r#"<a class="media-embed" href="{url}" {MEDIA_TYPE_ATTR}="{mime}" {MEDIA_NAME_ATTR}="{name}">{}</a>"#,
            escape_text(&media.name)
        )
    }
}

/// Rebuilds a document from stored HTML.
///
/// Decision spans that fail to decode keep their visible text as plain
/// content. Unknown tags are dropped and their text kept.
pub fn from_html(html: &str, codec: &TokenCodec) -> RichText {
    let mut builder = Builder::default();
    let mut tokens = tokenize(html).into_iter();
    while let Some(token) = tokens.next() {
        match token {
            MarkupToken::Text(text) => builder.text(&text),
            MarkupToken::Open {
                name,
                attributes,
                self_closing,
            } => match name.as_str() {
                "p" | "div" | "li" => builder.open_block(),
                "br" => builder.line_break(),
                "strong" | "b" => builder.bold += 1,
                "em" | "i" => builder.italic += 1,
                "img" | "video" | "audio" => {
                    builder.embed(Embed::Media(media_from_attributes(&attributes, None)));
                    if !self_closing {
                        skip_element(&mut tokens, &name);
                    }
                }
                "a" if attributes.contains_key(MEDIA_TYPE_ATTR) => {
                    let text = if self_closing {
                        String::new()
                    } else {
                        collect_element_text(&mut tokens, &name)
                    };
                    builder.embed(Embed::Media(media_from_attributes(&attributes, Some(text))));
                }
                "span" => {
                    let text = if self_closing {
                        String::new()
                    } else {
                        collect_element_text(&mut tokens, &name)
                    };
                    let fragment = Fragment {
                        tag: name.clone(),
                        attributes,
                        text,
                    };
                    if !codec.is_decision_fragment(&fragment) {
                        builder.text(&fragment.text);
                        continue;
                    }
                    match codec.decode(&fragment) {
                        Ok(token) => builder.embed(Embed::Decision(token)),
                        Err(_) => builder.plain_text(&fragment.text),
                    }
                }
                _ => {}
            },
            MarkupToken::Close { name } => match name.as_str() {
                "p" | "div" | "li" => builder.close_block(),
                "strong" | "b" => builder.bold = builder.bold.saturating_sub(1),
                "em" | "i" => builder.italic = builder.italic.saturating_sub(1),
                _ => {}
            },
        }
    }
    RichText::from_runs(builder.runs)
}

fn media_from_attributes(attributes: &BTreeMap<String, String>, text: Option<String>) -> MediaRef {
    let url = attributes
        .get("src")
        .or_else(|| attributes.get("href"))
        .cloned()
        .unwrap_or_default();
    let name = attributes
        .get(MEDIA_NAME_ATTR)
        .cloned()
        .or(text.filter(|t| !t.trim().is_empty()))
        .unwrap_or_else(|| url.rsplit('/').next().unwrap_or_default().to_string());
    MediaRef {
        mime_type: attributes.get(MEDIA_TYPE_ATTR).cloned().unwrap_or_default(),
        url,
        name,
    }
}

fn collect_element_text<I>(tokens: &mut I, name: &str) -> String
where
    I: Iterator<Item = MarkupToken>,
{
    let mut depth = 1usize;
    let mut text = String::new();
    for token in tokens.by_ref() {
        match token {
            MarkupToken::Open {
                name: inner,
                self_closing,
                ..
            } if inner == name && !self_closing => depth += 1,
            MarkupToken::Close { name: inner } if inner == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            MarkupToken::Text(chunk) => text.push_str(&chunk),
            _ => {}
        }
    }
    text
}

fn skip_element<I>(tokens: &mut I, name: &str)
where
    I: Iterator<Item = MarkupToken>,
{
    let _ = collect_element_text(tokens, name);
}

#[derive(Default)]
struct Builder {
    runs: Vec<Run>,
    bold: usize,
    italic: usize,
    seen_block: bool,
    in_block: bool,
    block_has_content: bool,
}

impl Builder {
    fn style(&self) -> TextStyle {
        TextStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
        }
    }

    fn open_block(&mut self) {
        if self.seen_block {
            self.runs.push(Run::plain("\n"));
        }
        self.seen_block = true;
        self.in_block = true;
        self.block_has_content = false;
    }

    fn close_block(&mut self) {
        self.in_block = false;
        self.block_has_content = false;
    }

    fn line_break(&mut self) {
        if self.block_has_content {
            self.runs.push(Run::plain("\n"));
            self.block_has_content = false;
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.in_block && text.trim().is_empty() {
            return;
        }
        self.runs.push(Run::Text {
            text: text.to_string(),
            style: self.style(),
        });
        self.block_has_content = true;
    }

    fn plain_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.runs.push(Run::plain(text));
        self.block_has_content = true;
    }

    fn embed(&mut self, embed: Embed) {
        self.runs.push(Run::Embed(embed));
        self.block_has_content = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::token::{DecisionKind, DecisionToken};

    #[test]
    fn document_survives_html_round_trip() {
        let codec = TokenCodec::new();
        let token = DecisionToken::new(DecisionKind::TransferStage, Some(31), "Proposta")
            .expect("token");
        let doc = RichText::from_runs(vec![
            Run::plain("Apresente a proposta "),
            Run::Text {
                text: "com calma".to_string(),
                style: TextStyle {
                    bold: true,
                    italic: false,
                },
            },
            Run::plain("\nDepois "),
            Run::decision(token),
        ]);
        let html = to_html(&doc, &codec);
        assert_eq!(from_html(&html, &codec), doc);
    }

    #[test]
    fn undecodable_decision_spans_become_plain_text() {
        let codec = TokenCodec::new();
        let html = r#"<p>Antes <span class="decision-token" data-decision-kind="explode">Explode</span></p>"#;
        let doc = from_html(html, &codec);
        assert_eq!(doc.runs(), &[Run::plain("Antes Explode")]);
    }

    #[test]
    fn empty_paragraphs_round_trip_as_blank_lines() {
        let codec = TokenCodec::new();
        let doc = RichText::plain("um\n\ndois");
        let html = to_html(&doc, &codec);
        assert_eq!(html, "<p>um</p><p><br></p><p>dois</p>");
        assert_eq!(from_html(&html, &codec), doc);
    }

    #[test]
    fn media_embeds_keep_url_type_and_name() {
        let codec = TokenCodec::new();
        let media = MediaRef {
            url: "https://cdn.example.com/tabela.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            name: "tabela.pdf".to_string(),
        };
        let doc = RichText::from_runs(vec![Run::Embed(Embed::Media(media.clone()))]);
        let parsed = from_html(&to_html(&doc, &codec), &codec);
        assert_eq!(parsed.runs(), &[Run::Embed(Embed::Media(media))]);
    }
}
