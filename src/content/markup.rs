use std::collections::BTreeMap;

const VOID_ELEMENTS: [&str; 6] = ["br", "img", "hr", "input", "meta", "link"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupToken {
    Open {
        name: String,
        attributes: BTreeMap<String, String>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    Text(String),
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attribute(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let Some(end) = candidate.find(';').filter(|end| *end <= 10) else {
            out.push('&');
            rest = &candidate[1..];
            continue;
        };
        let entity = &candidate[1..end];
        match decode_entity(entity) {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = entity.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Splits an HTML-ish string into open tags, close tags, and unescaped text.
///
/// The lexer is forgiving: a `<` that does not start a well-formed tag is
/// kept as text, and comments are dropped.
pub fn tokenize(input: &str) -> Vec<MarkupToken> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut idx = 0;

    while idx < chars.len() {
        if chars[idx] != '<' {
            text.push(chars[idx]);
            idx += 1;
            continue;
        }
        match lex_tag(&chars, idx) {
            Some((token, next)) => {
                if !text.is_empty() {
                    tokens.push(MarkupToken::Text(unescape(&text)));
                    text.clear();
                }
                if let Some(token) = token {
                    tokens.push(token);
                }
                idx = next;
            }
            None => {
                text.push('<');
                idx += 1;
            }
        }
    }
    if !text.is_empty() {
        tokens.push(MarkupToken::Text(unescape(&text)));
    }
    tokens
}

fn lex_tag(chars: &[char], start: usize) -> Option<(Option<MarkupToken>, usize)> {
    let mut idx = start + 1;
    match *chars.get(idx)? {
        '!' => {
            let is_comment = chars.get(idx + 1) == Some(&'-') && chars.get(idx + 2) == Some(&'-');
            let end = if is_comment {
                find_sequence(chars, idx, &['-', '-', '>'])? + 3
            } else {
                find_char(chars, idx, '>')? + 1
            };
            Some((None, end))
        }
        '/' => {
            idx += 1;
            let end = find_char(chars, idx, '>')?;
            let name: String = chars[idx..end].iter().collect();
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            Some((Some(MarkupToken::Close { name }), end + 1))
        }
        ch if ch.is_ascii_alphabetic() => {
            let name_start = idx;
            while idx < chars.len() && (chars[idx].is_ascii_alphanumeric() || chars[idx] == '-') {
                idx += 1;
            }
            let name: String = chars[name_start..idx].iter().collect();
            let name = name.to_ascii_lowercase();
            let mut attributes = BTreeMap::new();
            let mut self_closing = false;
            loop {
                while idx < chars.len() && chars[idx].is_whitespace() {
                    idx += 1;
                }
                match *chars.get(idx)? {
                    '>' => {
                        idx += 1;
                        break;
                    }
                    '/' => {
                        self_closing = true;
                        idx += 1;
                        continue;
                    }
                    _ => {}
                }
                let attr_start = idx;
                while idx < chars.len()
                    && !chars[idx].is_whitespace()
                    && !matches!(chars[idx], '=' | '>' | '/')
                {
                    idx += 1;
                }
                let attr_name: String = chars[attr_start..idx].iter().collect();
                let attr_name = attr_name.to_ascii_lowercase();
                while idx < chars.len() && chars[idx].is_whitespace() {
                    idx += 1;
                }
                let mut value = String::new();
                if chars.get(idx) == Some(&'=') {
                    idx += 1;
                    while idx < chars.len() && chars[idx].is_whitespace() {
                        idx += 1;
                    }
                    match *chars.get(idx)? {
                        quote @ ('"' | '\'') => {
                            let close = find_char(chars, idx + 1, quote)?;
                            value = chars[idx + 1..close].iter().collect();
                            idx = close + 1;
                        }
                        _ => {
                            let value_start = idx;
                            while idx < chars.len()
                                && !chars[idx].is_whitespace()
                                && chars[idx] != '>'
                            {
                                idx += 1;
                            }
                            value = chars[value_start..idx].iter().collect();
                        }
                    }
                }
                if !attr_name.is_empty() {
                    attributes.insert(attr_name, unescape(&value));
                }
            }
            let self_closing = self_closing || is_void_element(&name);
            Some((
                Some(MarkupToken::Open {
                    name,
                    attributes,
                    self_closing,
                }),
                idx,
            ))
        }
        _ => None,
    }
}

fn find_char(chars: &[char], from: usize, needle: char) -> Option<usize> {
    chars[from.min(chars.len())..]
        .iter()
        .position(|ch| *ch == needle)
        .map(|pos| pos + from)
}

fn find_sequence(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
    if from >= chars.len() {
        return None;
    }
    chars[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_reads_attributes_in_any_quote_style() {
        let tokens = tokenize(r#"<span data-a="1" data-b='two' data-c=3>x &amp; y</span>"#);
        let MarkupToken::Open {
            name, attributes, ..
        } = &tokens[0]
        else {
            panic!("expected open tag, got {tokens:?}");
        };
        assert_eq!(name, "span");
        assert_eq!(attributes.get("data-a").map(String::as_str), Some("1"));
        assert_eq!(attributes.get("data-b").map(String::as_str), Some("two"));
        assert_eq!(attributes.get("data-c").map(String::as_str), Some("3"));
        assert_eq!(tokens[1], MarkupToken::Text("x & y".to_string()));
        assert_eq!(
            tokens[2],
            MarkupToken::Close {
                name: "span".to_string()
            }
        );
    }

    #[test]
    fn stray_angle_bracket_stays_text() {
        let tokens = tokenize("a < b");
        assert_eq!(tokens, vec![MarkupToken::Text("a < b".to_string())]);
    }

    #[test]
    fn void_elements_are_self_closing() {
        let tokens = tokenize("<p>one<br>two</p>");
        assert!(matches!(
            &tokens[2],
            MarkupToken::Open { name, self_closing: true, .. } if name == "br"
        ));
    }

    #[test]
    fn unescape_handles_numeric_and_unknown_entities() {
        assert_eq!(unescape("&#231;&#x41; &bogus; &"), "çA &bogus; &");
        assert_eq!(escape_attribute(r#"a"b'c"#), "a&quot;b&#39;c");
    }
}
