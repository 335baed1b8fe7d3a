use super::codec::{DecodeError, Fragment, TokenCodec};
use super::token::DecisionToken;
use crate::content::{Embed, RichText, Run};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocateError {
    #[error("clicked fragment is not an editable decision: {0}")]
    Decode(#[from] DecodeError),
    #[error("decision is no longer present in the document")]
    NotFound,
}

/// Finds the logical offset of the first embed whose decision equals
/// `token` by value.
///
/// Documents are rebuilt from stored HTML on every render, so there is no
/// object identity to compare. Two identical decisions in one document are
/// indistinguishable here and the first one wins.
pub fn locate_token(document: &RichText, token: &DecisionToken) -> Option<usize> {
    let mut offset = 0;
    for run in document.runs() {
        if let Run::Embed(Embed::Decision(candidate)) = run {
            if candidate == token {
                return Some(offset);
            }
        }
        offset += run.width();
    }
    None
}

/// Decodes the fragment the user clicked and locates it in `document`.
pub fn locate(
    document: &RichText,
    clicked: &Fragment,
    codec: &TokenCodec,
) -> Result<(usize, DecisionToken), LocateError> {
    let token = codec.decode(clicked)?;
    let offset = locate_token(document, &token).ok_or(LocateError::NotFound)?;
    Ok((offset, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TextStyle;
    use crate::decision::token::DecisionKind;

    fn token(kind: DecisionKind, id: i64, label: &str) -> DecisionToken {
        DecisionToken::new(kind, Some(id), label).expect("token")
    }

    #[test]
    fn offset_counts_text_chars_and_embeds() {
        let codec = TokenCodec::new();
        let first = token(DecisionKind::AddTag, 1, "VIP");
        let second = token(DecisionKind::Notify, 2, "Gerente");
        let mut doc = RichText::plain("Olá");
        doc.insert_embed(3, Embed::Decision(first)).expect("insert");
        doc.insert_text(4, ", tudo bem?", TextStyle::PLAIN)
            .expect("insert");
        doc.insert_embed(doc.len(), Embed::Decision(second.clone()))
            .expect("insert");

        let (offset, found) = locate(&doc, &codec.encode(&second), &codec).expect("locate");
        assert_eq!(offset, 15);
        assert_eq!(found, second);
    }

    #[test]
    fn structural_mismatch_is_not_found() {
        let codec = TokenCodec::new();
        let mut doc = RichText::new();
        doc.insert_embed(0, Embed::Decision(token(DecisionKind::AddTag, 1, "VIP")))
            .expect("insert");
        let clicked = codec.encode(&token(DecisionKind::AddTag, 1, "VIP 2"));
        assert_eq!(locate(&doc, &clicked, &codec), Err(LocateError::NotFound));
    }

    #[test]
    fn identical_duplicates_resolve_to_the_first() {
        let tag = token(DecisionKind::AddTag, 1, "VIP");
        let mut doc = RichText::plain("ab");
        doc.insert_embed(1, Embed::Decision(tag.clone())).expect("insert");
        doc.insert_embed(3, Embed::Decision(tag.clone())).expect("insert");
        assert_eq!(locate_token(&doc, &tag), Some(1));
    }
}
