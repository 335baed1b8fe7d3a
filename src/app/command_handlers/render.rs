use crate::content::from_html;
use crate::decision::TokenCodec;
use std::fs;

pub fn cmd_render(args: &[String]) -> Result<String, String> {
    if args.len() != 1 {
        return Err("usage: render <file.html>".to_string());
    }
    let html = fs::read_to_string(&args[0])
        .map_err(|e| format!("failed to read {}: {e}", args[0]))?;
    Ok(render_html_report(&html, &TokenCodec::new()))
}

/// Plain-text rendering of stored HTML followed by the decisions it holds.
pub fn render_html_report(html: &str, codec: &TokenCodec) -> String {
    let document = from_html(html, codec);
    let mut lines = vec![document.to_plain_text()];
    let decisions: Vec<String> = document
        .decisions()
        .map(|(offset, token)| {
            format!(
                "  offset={offset} kind={} target={} label={}",
                token.kind().as_str(),
                token
                    .target_id()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                token.label()
            )
        })
        .collect();
    if !decisions.is_empty() {
        lines.push(String::new());
        lines.push("decisions:".to_string());
        lines.extend(decisions);
    }
    lines.join("\n")
}
