use roteiro::backend::{
    AgentRecord, AgentRegistry, AgentUpdate, BackendError, ContentStore, CreatedAgent,
    FaqPayload, NewAgent, RulesPayload, StepsPayload,
};
use roteiro::batch::CreationState;
use roteiro::content::{to_html, ContentPhase, RichText, TextStyle};
use roteiro::decision::TokenCodec;
use roteiro::shared::{SessionLog, TemplateId};
use roteiro::templates::TemplateCatalog;
use roteiro::wizard::{CreationType, StepId, Wizard, WizardContext, WizardError, WizardMode};
use std::cell::{Cell, RefCell};
use std::time::Duration;

#[derive(Default)]
struct FakeCrm {
    agents: RefCell<Vec<AgentRecord>>,
    created: RefCell<Vec<NewAgent>>,
    renames: RefCell<Vec<(i64, String)>>,
    saves: RefCell<Vec<String>>,
    rules_html: RefCell<Vec<String>>,
    fail_saves: Cell<bool>,
}

impl FakeCrm {
    fn with_agent(id: i64, name: &str) -> Self {
        let crm = Self::default();
        crm.agents.borrow_mut().push(AgentRecord {
            id,
            name: name.to_string(),
            active: true,
            is_principal: false,
        });
        crm
    }

    fn save(&self, what: &str, agent_id: i64) -> Result<(), BackendError> {
        if self.fail_saves.get() {
            return Err(BackendError::Response("503 unavailable".to_string()));
        }
        self.saves.borrow_mut().push(format!("{what}:{agent_id}"));
        Ok(())
    }
}

impl AgentRegistry for FakeCrm {
    fn list_agents(&self) -> Result<Vec<AgentRecord>, BackendError> {
        Ok(self.agents.borrow().clone())
    }

    fn create_agent(&self, agent: &NewAgent) -> Result<CreatedAgent, BackendError> {
        self.created.borrow_mut().push(agent.clone());
        let id = 100 + self.agents.borrow().len() as i64;
        self.agents.borrow_mut().push(AgentRecord {
            id,
            name: agent.name.clone(),
            active: true,
            is_principal: agent.is_principal,
        });
        Ok(CreatedAgent {
            id: Some(id),
            name: Some(agent.name.clone()),
        })
    }

    fn update_agent(&self, agent_id: i64, update: &AgentUpdate) -> Result<(), BackendError> {
        let mut agents = self.agents.borrow_mut();
        let agent = agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| BackendError::Response("404".to_string()))?;
        if let Some(name) = &update.name {
            agent.name = name.clone();
            self.renames.borrow_mut().push((agent_id, name.clone()));
        }
        if let Some(flag) = update.is_principal {
            agent.is_principal = flag;
        }
        Ok(())
    }
}

impl ContentStore for FakeCrm {
    fn save_rules(&self, payload: &RulesPayload) -> Result<(), BackendError> {
        self.save("rules", payload.agent_id)?;
        self.rules_html.borrow_mut().push(payload.rules_html.clone());
        Ok(())
    }

    fn save_steps(&self, payload: &StepsPayload) -> Result<(), BackendError> {
        self.save("steps", payload.agent_id)
    }

    fn save_faq(&self, payload: &FaqPayload) -> Result<(), BackendError> {
        self.save("faq", payload.agent_id)
    }
}

struct Fixture {
    crm: FakeCrm,
    catalog: TemplateCatalog,
    codec: TokenCodec,
    log: SessionLog,
}

impl Fixture {
    fn new(crm: FakeCrm) -> Self {
        Self {
            crm,
            catalog: TemplateCatalog::builtin(),
            codec: TokenCodec::new(),
            log: SessionLog::disabled(),
        }
    }

    fn ctx(&self) -> WizardContext<'_> {
        WizardContext {
            registry: &self.crm,
            content: &self.crm,
            catalog: &self.catalog,
            codec: &self.codec,
            log: &self.log,
            principal_name: "Principal".to_string(),
            resolve_delay: Duration::ZERO,
        }
    }
}

fn save_current(wizard: &mut Wizard, ctx: &WizardContext<'_>) {
    let content = wizard.editing_content().clone();
    wizard.save_content(ctx, content).expect("save phase");
}

#[test]
fn single_agent_from_template_runs_to_confirmation() {
    let fixture = Fixture::new(FakeCrm::default());
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();

    wizard.choose_mode(&ctx, WizardMode::Single).expect("mode");
    wizard
        .choose_creation_type(&ctx, CreationType::Template)
        .expect("type");
    wizard.choose_template(&ctx, "bpc").expect("template");
    assert_eq!(wizard.step(), StepId::DefineName);
    assert_eq!(wizard.state().single.name, "BPC");
    assert_eq!(wizard.editing_content().steps.len(), 3);

    wizard.submit_single_name(&ctx, "BPC").expect("name");
    assert_eq!(wizard.step(), StepId::EditRules);
    let agent_id = wizard
        .state()
        .single
        .created_agent
        .as_ref()
        .map(|a| a.id)
        .expect("created agent");

    let mut content = wizard.editing_content().clone();
    content.rules = RichText::plain("Seja breve.");
    wizard.save_content(&ctx, content).expect("rules");
    assert_eq!(wizard.step(), StepId::EditSteps);
    assert_eq!(wizard.editing_phase(), Some(ContentPhase::Steps));
    save_current(&mut wizard, &ctx);
    save_current(&mut wizard, &ctx);
    assert_eq!(wizard.step(), StepId::FinalConfirmation);

    assert_eq!(
        *fixture.crm.saves.borrow(),
        vec![
            format!("rules:{agent_id}"),
            format!("steps:{agent_id}"),
            format!("faq:{agent_id}"),
        ]
    );
    assert_eq!(
        *fixture.crm.rules_html.borrow(),
        vec!["<p>Seja breve.</p>".to_string()]
    );
}

#[test]
fn scratch_agent_starts_with_empty_content() {
    let fixture = Fixture::new(FakeCrm::default());
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();
    wizard.choose_mode(&ctx, WizardMode::Single).expect("mode");
    wizard
        .choose_creation_type(&ctx, CreationType::Scratch)
        .expect("type");
    assert_eq!(wizard.step(), StepId::DefineName);
    assert!(wizard.editing_content().steps.is_empty());
    assert_eq!(wizard.go_back(&fixture.log), StepId::SelectCreationType);
}

#[test]
fn name_validation_happens_before_any_create() {
    let fixture = Fixture::new(FakeCrm::with_agent(1, "BPC"));
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();
    wizard.choose_mode(&ctx, WizardMode::Single).expect("mode");
    wizard
        .choose_creation_type(&ctx, CreationType::Scratch)
        .expect("type");

    let err = wizard.submit_single_name(&ctx, "   ").expect_err("empty");
    assert!(matches!(err, WizardError::Validation(_)));
    let err = wizard.submit_single_name(&ctx, "bpc").expect_err("duplicate");
    assert!(matches!(err, WizardError::Validation(_)));
    assert!(fixture.crm.created.borrow().is_empty());
    assert_eq!(wizard.step(), StepId::DefineName);
}

#[test]
fn revisiting_define_name_renames_instead_of_creating_again() {
    let fixture = Fixture::new(FakeCrm::default());
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();
    wizard.choose_mode(&ctx, WizardMode::Single).expect("mode");
    wizard
        .choose_creation_type(&ctx, CreationType::Scratch)
        .expect("type");
    wizard.submit_single_name(&ctx, "FGTS").expect("create");

    assert_eq!(wizard.go_back(&fixture.log), StepId::DefineName);
    wizard.submit_single_name(&ctx, "FGTS").expect("same name");
    assert_eq!(wizard.go_back(&fixture.log), StepId::DefineName);
    wizard.submit_single_name(&ctx, "FGTS Saque").expect("rename");

    assert_eq!(fixture.crm.created.borrow().len(), 1);
    assert_eq!(
        *fixture.crm.renames.borrow(),
        vec![(100, "FGTS Saque".to_string())]
    );
    assert_eq!(wizard.step(), StepId::EditRules);
}

#[test]
fn failed_save_keeps_the_edits_and_the_step() {
    let fixture = Fixture::new(FakeCrm::default());
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();
    wizard.choose_mode(&ctx, WizardMode::Single).expect("mode");
    wizard
        .choose_creation_type(&ctx, CreationType::Scratch)
        .expect("type");
    wizard.submit_single_name(&ctx, "Novo").expect("create");

    let mut content = wizard.editing_content().clone();
    content
        .rules
        .insert_text(0, "Nunca prometa taxa.", TextStyle::PLAIN)
        .expect("type");
    fixture.crm.fail_saves.set(true);
    let err = wizard
        .save_content(&ctx, content.clone())
        .expect_err("save fails");
    assert!(matches!(err, WizardError::Backend { .. }));
    assert_eq!(wizard.step(), StepId::EditRules);
    assert_eq!(wizard.editing_content(), &content);

    fixture.crm.fail_saves.set(false);
    save_current(&mut wizard, &ctx);
    assert_eq!(wizard.step(), StepId::EditSteps);
}

#[test]
fn multi_agent_flow_creates_then_edits_every_agent() {
    let fixture = Fixture::new(FakeCrm::with_agent(1, "Bancário"));
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();

    wizard.choose_mode(&ctx, WizardMode::Multi).expect("mode");
    assert_eq!(wizard.step(), StepId::SelectTemplates);
    wizard.toggle_template(&ctx, "bancario").expect("toggle");
    wizard.toggle_template(&ctx, "fgts").expect("toggle");
    wizard.toggle_template(&ctx, "fgts").expect("untoggle");
    wizard.toggle_template(&ctx, "bpc").expect("toggle");
    wizard.confirm_templates(&ctx).expect("templates");
    assert_eq!(wizard.step(), StepId::ConfigureNames);

    wizard.confirm_names(&ctx).expect("names");
    let report = wizard.create_agents(&ctx).expect("batch").clone();
    assert_eq!(report.success_count(), 3);
    assert_eq!(report.specialists[0].display_name(), "Bancário (2)");
    assert_eq!(report.specialists[1].display_name(), "BPC");
    assert!(report
        .specialists
        .iter()
        .all(|s| s.state == CreationState::Success && s.agent_id.is_some()));

    // a second call reuses the successful report
    wizard.create_agents(&ctx).expect("batch again");
    assert_eq!(fixture.crm.created.borrow().len(), 3);

    wizard.begin_multi_edit(&ctx).expect("edit");
    assert_eq!(wizard.step(), StepId::EditMultiAgent);
    assert_eq!(wizard.editing_phase(), Some(ContentPhase::Rules));
    let first = wizard.state().multi.current_agent().cloned().expect("agent");
    assert!(first.template_id.is_principal());

    save_current(&mut wizard, &ctx);
    assert_eq!(wizard.editing_phase(), Some(ContentPhase::Steps));
    assert_eq!(wizard.go_back(&fixture.log), StepId::EditMultiAgent);
    assert_eq!(wizard.editing_phase(), Some(ContentPhase::Rules));

    let mut saved_phases = 0;
    while wizard.step() == StepId::EditMultiAgent {
        save_current(&mut wizard, &ctx);
        saved_phases += 1;
    }
    assert_eq!(saved_phases, 9);
    assert_eq!(wizard.step(), StepId::FinalConfirmation);
    assert_eq!(wizard.state().multi.edited_content.len(), 3);

    let bpc = &report.specialists[1];
    let bpc_id = bpc.agent_id.expect("id");
    let bpc_saves: Vec<String> = fixture
        .crm
        .saves
        .borrow()
        .iter()
        .filter(|s| s.ends_with(&format!(":{bpc_id}")))
        .cloned()
        .collect();
    assert_eq!(
        bpc_saves,
        vec![
            format!("rules:{bpc_id}"),
            format!("steps:{bpc_id}"),
            format!("faq:{bpc_id}"),
        ]
    );
}

#[test]
fn failed_multi_agent_save_keeps_earlier_agents_and_the_draft() {
    let fixture = Fixture::new(FakeCrm::default());
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();
    wizard.choose_mode(&ctx, WizardMode::Multi).expect("mode");
    wizard.toggle_template(&ctx, "bpc").expect("toggle");
    wizard.confirm_templates(&ctx).expect("templates");
    wizard.confirm_names(&ctx).expect("names");
    wizard.create_agents(&ctx).expect("batch");
    wizard.begin_multi_edit(&ctx).expect("edit");

    for _ in 0..3 {
        save_current(&mut wizard, &ctx);
    }
    assert_eq!(wizard.state().multi.current_agent_index, 1);
    assert_eq!(wizard.state().multi.edited_content.len(), 1);

    let mut content = wizard.editing_content().clone();
    content
        .rules
        .insert_text(0, "Confirme o NB. ", TextStyle::PLAIN)
        .expect("type");
    fixture.crm.fail_saves.set(true);
    let err = wizard
        .save_content(&ctx, content.clone())
        .expect_err("save fails");
    assert!(matches!(err, WizardError::Backend { .. }));

    let multi = &wizard.state().multi;
    assert_eq!(wizard.step(), StepId::EditMultiAgent);
    assert_eq!(multi.phase, ContentPhase::Rules);
    assert_eq!(multi.current_agent_index, 1);
    assert_eq!(multi.edited_content.len(), 1);
    assert_eq!(multi.draft, content);

    fixture.crm.fail_saves.set(false);
    save_current(&mut wizard, &ctx);
    assert_eq!(wizard.editing_phase(), Some(ContentPhase::Steps));
    assert_eq!(
        fixture.crm.rules_html.borrow().last().map(String::as_str),
        Some(to_html(&content.rules, &fixture.codec).as_str())
    );
}

#[test]
fn multi_agent_drafts_come_from_each_template() {
    let fixture = Fixture::new(FakeCrm::default());
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();
    wizard.choose_mode(&ctx, WizardMode::Multi).expect("mode");
    wizard.toggle_template(&ctx, "bpc").expect("toggle");
    wizard.confirm_templates(&ctx).expect("templates");
    wizard.confirm_names(&ctx).expect("names");
    wizard.create_agents(&ctx).expect("batch");
    wizard.begin_multi_edit(&ctx).expect("edit");

    for _ in 0..3 {
        save_current(&mut wizard, &ctx);
    }
    let current = wizard.state().multi.current_agent().cloned().expect("agent");
    assert_eq!(current.template_id, TemplateId::parse("bpc").expect("id"));
    let bpc = fixture.catalog.get("bpc").expect("template");
    assert_eq!(wizard.editing_content(), &bpc.to_content(&fixture.codec));
}

#[test]
fn duplicate_names_inside_the_batch_are_rejected_before_create() {
    let fixture = Fixture::new(FakeCrm::default());
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();
    wizard.choose_mode(&ctx, WizardMode::Multi).expect("mode");
    wizard.toggle_template(&ctx, "bancario").expect("toggle");
    wizard.toggle_template(&ctx, "bpc").expect("toggle");
    wizard.confirm_templates(&ctx).expect("templates");

    wizard.set_agent_name("bpc", "bancário").expect("rename");
    let err = wizard.confirm_names(&ctx).expect_err("duplicate");
    assert!(matches!(err, WizardError::Validation(_)));
    assert!(wizard.set_agent_name("fgts", "FGTS").is_err());

    wizard.set_agent_name("principal", "Recepção").expect("principal");
    wizard.set_agent_name("bpc", "BPC/LOAS").expect("rename");
    wizard.confirm_names(&ctx).expect("names");
    wizard.create_agents(&ctx).expect("batch");
    let names: Vec<String> = fixture
        .crm
        .created
        .borrow()
        .iter()
        .map(|a| a.name.clone())
        .collect();
    assert_eq!(names, vec!["Recepção", "Bancário", "BPC/LOAS"]);
}

#[test]
fn empty_selection_and_out_of_order_actions_are_rejected() {
    let fixture = Fixture::new(FakeCrm::default());
    let ctx = fixture.ctx();
    let mut wizard = Wizard::new();
    wizard.choose_mode(&ctx, WizardMode::Multi).expect("mode");
    let err = wizard.confirm_templates(&ctx).expect_err("nothing selected");
    assert!(matches!(err, WizardError::Validation(_)));
    let err = wizard.begin_multi_edit(&ctx).expect_err("wrong step");
    assert!(matches!(err, WizardError::InvalidStep { .. }));
}
