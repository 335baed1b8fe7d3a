use roteiro::content::{is_dense, AgentContent, OrderError, RichText};

fn step_names(content: &AgentContent) -> Vec<(u32, &str)> {
    content
        .steps
        .iter()
        .map(|s| (s.order, s.name.as_str()))
        .collect()
}

#[test]
fn step_order_stays_dense_through_every_edit() {
    let mut content = AgentContent::default();
    for name in ["Saudação", "Qualificação", "Simulação", "Fechamento"] {
        content.add_step(name, RichText::plain(name));
        assert!(is_dense(&content.steps));
    }

    content.remove_step(1).expect("remove");
    assert!(is_dense(&content.steps));
    assert_eq!(
        step_names(&content),
        vec![(1, "Saudação"), (2, "Simulação"), (3, "Fechamento")]
    );

    content.move_step(2, 0).expect("move");
    assert!(is_dense(&content.steps));
    assert_eq!(
        step_names(&content),
        vec![(1, "Fechamento"), (2, "Saudação"), (3, "Simulação")]
    );

    content
        .insert_step(1, "Documentos", RichText::new())
        .expect("insert");
    assert!(is_dense(&content.steps));
    assert_eq!(content.steps[1].order, 2);
    assert_eq!(content.steps[1].name, "Documentos");
}

#[test]
fn faq_order_stays_dense_and_blank_questions_become_none() {
    let mut content = AgentContent::default();
    content.add_faq(Some("Qual o prazo?"), RichText::plain("Até 84 meses."));
    content.add_faq(Some("   "), RichText::plain("Sem pergunta."));
    content.add_faq(None, RichText::plain("Também sem."));
    assert!(is_dense(&content.faq));
    assert_eq!(content.faq[1].question, None);

    content.move_faq(0, 2).expect("move");
    content.remove_faq(0).expect("remove");
    assert!(is_dense(&content.faq));
    let orders: Vec<u32> = content.faq.iter().map(|f| f.order).collect();
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(content.faq[1].question.as_deref(), Some("Qual o prazo?"));
}

#[test]
fn out_of_range_edits_leave_the_list_untouched() {
    let mut content = AgentContent::default();
    content.add_step("Única", RichText::new());
    assert_eq!(
        content.remove_step(3).map(|_| ()),
        Err(OrderError::OutOfRange { index: 3, len: 1 })
    );
    assert!(content.move_step(0, 1).is_err());
    assert!(content.insert_step(5, "Fora", RichText::new()).is_err());
    assert_eq!(step_names(&content), vec![(1, "Única")]);
}

#[test]
fn content_read_back_with_gaps_is_renumbered() {
    use roteiro::content::ScriptStep;
    let content = AgentContent::new(
        RichText::new(),
        vec![
            ScriptStep {
                order: 7,
                name: "Depois".to_string(),
                body: RichText::new(),
            },
            ScriptStep {
                order: 2,
                name: "Antes".to_string(),
                body: RichText::new(),
            },
        ],
        Vec::new(),
    );
    assert_eq!(step_names(&content), vec![(1, "Antes"), (2, "Depois")]);
}
