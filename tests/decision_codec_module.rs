use roteiro::content::{from_html, to_html, Embed, RichText, TextStyle};
use roteiro::decision::{
    locate, locate_token, DecisionKind, DecisionToken, DecodeError, Fragment, LocateError,
    TokenCodec, ALL_DECISION_KINDS,
};

fn sample_token(kind: DecisionKind) -> DecisionToken {
    if kind.requires_target() {
        DecisionToken::new(kind, Some(42), "Pós-venda & \"VIP\"").expect("token")
    } else {
        DecisionToken::stop_agent()
    }
}

#[test]
fn every_kind_decodes_back_to_the_encoded_token() {
    let codec = TokenCodec::new();
    for kind in ALL_DECISION_KINDS {
        let token = sample_token(kind);
        let html = codec.encode_html(&token);
        assert_eq!(codec.decode_html(&html).expect("decode"), token, "{kind}");
    }
}

#[test]
fn unknown_kind_is_rejected() {
    let codec = TokenCodec::new();
    let html = r#"<span class="decision-token" data-decision-kind="delete_everything" data-decision-target-id="1" data-decision-label="x">x</span>"#;
    assert_eq!(
        codec.decode_html(html),
        Err(DecodeError::UnknownKind("delete_everything".to_string()))
    );
}

#[test]
fn missing_or_malformed_target_is_rejected() {
    let codec = TokenCodec::new();
    let missing = r#"<span class="decision-token" data-decision-kind="add_tag" data-decision-label="VIP">Add tag: VIP</span>"#;
    assert_eq!(
        codec.decode_html(missing),
        Err(DecodeError::MissingTarget(DecisionKind::AddTag))
    );
    let malformed = r#"<span class="decision-token" data-decision-kind="add_tag" data-decision-target-id="abc" data-decision-label="VIP">Add tag: VIP</span>"#;
    assert_eq!(
        codec.decode_html(malformed),
        Err(DecodeError::InvalidTarget("abc".to_string()))
    );
}

#[test]
fn plain_spans_are_not_decisions() {
    let codec = TokenCodec::new();
    let fragment = Fragment::parse(r#"<span class="highlight">texto</span>"#).expect("fragment");
    assert!(!codec.is_decision_fragment(&fragment));
    assert_eq!(codec.decode(&fragment), Err(DecodeError::NotADecision));
}

#[test]
fn document_html_keeps_decisions_and_styles() {
    let codec = TokenCodec::new();
    let tag = DecisionToken::new(DecisionKind::AddTag, Some(7), "Lead quente").expect("token");
    let mut doc = RichText::plain("Confirme o CPF ");
    doc.insert_embed(doc.len(), Embed::Decision(tag.clone()))
        .expect("insert");
    doc.insert_text(doc.len(), "\nDepois ", TextStyle::PLAIN)
        .expect("text");
    doc.insert_text(
        doc.len(),
        "encerre",
        TextStyle {
            bold: true,
            italic: false,
        },
    )
    .expect("bold");

    let html = to_html(&doc, &codec);
    assert!(html.starts_with("<p>Confirme o CPF <span"));
    assert!(html.contains("<strong>encerre</strong>"));

    let back = from_html(&html, &codec);
    assert_eq!(back, doc);
    assert_eq!(back.decisions().next(), Some((15, &tag)));
}

#[test]
fn broken_decision_span_degrades_to_text() {
    let codec = TokenCodec::new();
    let html = r#"<p>Antes <span class="decision-token" data-decision-kind="teleport">Teleport</span> depois</p>"#;
    let doc = from_html(html, &codec);
    assert_eq!(doc.decisions().count(), 0);
    assert_eq!(doc.to_plain_text(), "Antes Teleport depois");
}

#[test]
fn locate_finds_clicked_decision_by_value() {
    let codec = TokenCodec::new();
    let notify = DecisionToken::new(DecisionKind::Notify, Some(3), "Gerente").expect("token");
    let html = format!(
        "<p>Se o cliente pedir, {} e aguarde.</p>",
        codec.encode_html(&notify)
    );
    let doc = from_html(&html, &codec);

    let clicked = codec.encode(&notify);
    let (offset, token) = locate(&doc, &clicked, &codec).expect("located");
    assert_eq!(offset, "Se o cliente pedir, ".chars().count());
    assert_eq!(token, notify);

    let other = DecisionToken::new(DecisionKind::Notify, Some(4), "Gerente").expect("token");
    assert_eq!(locate_token(&doc, &other), None);
    assert_eq!(
        locate(&doc, &codec.encode(&other), &codec),
        Err(LocateError::NotFound)
    );

    let garbage = Fragment::parse(r#"<span class="decision-token">?</span>"#).expect("fragment");
    assert!(matches!(
        locate(&doc, &garbage, &codec),
        Err(LocateError::Decode(_))
    ));
}
