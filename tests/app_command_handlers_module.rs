use roteiro::app::command_handlers::batch::{parse_batch_args, run_batch, BatchArgs};
use roteiro::app::command_handlers::render::render_html_report;
use roteiro::app::command_handlers::run_cli;
use roteiro::app::command_handlers::templates::templates_report;
use roteiro::app::command_handlers::agents::list_agents_report;
use roteiro::backend::{
    AgentRecord, AgentRegistry, AgentUpdate, BackendError, ContentStore, CreatedAgent,
    FaqPayload, NewAgent, RulesPayload, StepsPayload,
};
use roteiro::decision::TokenCodec;
use roteiro::shared::SessionLog;
use roteiro::templates::TemplateCatalog;
use roteiro::wizard::WizardContext;
use std::cell::{Cell, RefCell};
use std::time::Duration;

#[derive(Default)]
struct FakeCrm {
    agents: RefCell<Vec<AgentRecord>>,
    created: RefCell<Vec<String>>,
    saves: RefCell<Vec<String>>,
    fail_list: Cell<bool>,
}

impl AgentRegistry for FakeCrm {
    fn list_agents(&self) -> Result<Vec<AgentRecord>, BackendError> {
        if self.fail_list.get() {
            return Err(BackendError::Request("connection refused".to_string()));
        }
        Ok(self.agents.borrow().clone())
    }

    fn create_agent(&self, agent: &NewAgent) -> Result<CreatedAgent, BackendError> {
        self.created.borrow_mut().push(agent.name.clone());
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
        if let Some(agent) = self
            .agents
            .borrow_mut()
            .iter_mut()
            .find(|a| a.id == agent_id)
        {
            if let Some(flag) = update.is_principal {
                agent.is_principal = flag;
            }
        }
        Ok(())
    }
}

impl ContentStore for FakeCrm {
    fn save_rules(&self, payload: &RulesPayload) -> Result<(), BackendError> {
        self.saves
            .borrow_mut()
            .push(format!("rules:{}", payload.agent_id));
        Ok(())
    }

    fn save_steps(&self, payload: &StepsPayload) -> Result<(), BackendError> {
        self.saves
            .borrow_mut()
            .push(format!("steps:{}", payload.agent_id));
        Ok(())
    }

    fn save_faq(&self, payload: &FaqPayload) -> Result<(), BackendError> {
        self.saves.borrow_mut().push(format!("faq:{}", payload.agent_id));
        Ok(())
    }
}

fn ctx<'a>(
    crm: &'a FakeCrm,
    catalog: &'a TemplateCatalog,
    codec: &'a TokenCodec,
    log: &'a SessionLog,
) -> WizardContext<'a> {
    WizardContext {
        registry: crm,
        content: crm,
        catalog,
        codec,
        log,
        principal_name: "Principal".to_string(),
        resolve_delay: Duration::ZERO,
    }
}

fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn record(id: i64, name: &str, active: bool, is_principal: bool) -> AgentRecord {
    AgentRecord {
        id,
        name: name.to_string(),
        active,
        is_principal,
    }
}

#[test]
fn batch_creates_agents_and_saves_template_content() {
    let crm = FakeCrm::default();
    crm.agents
        .borrow_mut()
        .push(record(1, "Bancário", true, false));
    let catalog = TemplateCatalog::builtin();
    let codec = TokenCodec::new();
    let log = SessionLog::disabled();
    let parsed = parse_batch_args(&args(&["bancario", "bpc", "--principal", "Recepção"]))
        .expect("parse");

    let output = run_batch(&ctx(&crm, &catalog, &codec, &log), &parsed).expect("batch");
    let lines: Vec<&str> = output.lines().collect();

    assert!(lines[0].starts_with("success\tprincipal\tRecepção"));
    assert!(lines[1].starts_with("success\tbancario\tBancário (2)"));
    assert!(lines[2].starts_with("success\tbpc\tBPC"));
    assert_eq!(lines.last(), Some(&"content saved for 3 agent(s)"));
    assert_eq!(
        *crm.created.borrow(),
        vec!["Recepção", "Bancário (2)", "BPC"]
    );
    // three phases per agent
    assert_eq!(crm.saves.borrow().len(), 9);
}

#[test]
fn batch_rejects_a_template_listed_twice() {
    let crm = FakeCrm::default();
    let catalog = TemplateCatalog::builtin();
    let codec = TokenCodec::new();
    let log = SessionLog::disabled();
    let parsed = BatchArgs {
        templates: vec!["bpc".to_string(), "bpc".to_string()],
        ..BatchArgs::default()
    };
    let err = run_batch(&ctx(&crm, &catalog, &codec, &log), &parsed).expect_err("duplicate");
    assert!(err.contains("listed more than once"));
    assert!(crm.created.borrow().is_empty());
}

#[test]
fn batch_reports_unknown_templates() {
    let crm = FakeCrm::default();
    let catalog = TemplateCatalog::builtin();
    let codec = TokenCodec::new();
    let log = SessionLog::disabled();
    let parsed = parse_batch_args(&args(&["previdencia"])).expect("parse");
    assert!(run_batch(&ctx(&crm, &catalog, &codec, &log), &parsed).is_err());
    assert!(crm.created.borrow().is_empty());
}

#[test]
fn batch_with_unreachable_backend_prints_every_failed_item() {
    let crm = FakeCrm::default();
    crm.fail_list.set(true);
    let catalog = TemplateCatalog::builtin();
    let codec = TokenCodec::new();
    let log = SessionLog::disabled();
    let parsed = parse_batch_args(&args(&["fgts"])).expect("parse");

    let err = run_batch(&ctx(&crm, &catalog, &codec, &log), &parsed).expect_err("failed");
    let error_lines = err.lines().filter(|l| l.starts_with("error\t")).count();
    assert_eq!(error_lines, 2);
    assert!(crm.saves.borrow().is_empty());
}

#[test]
fn agents_report_is_sorted_and_flags_principal_and_inactive() {
    let crm = FakeCrm::default();
    crm.agents.borrow_mut().extend([
        record(9, "FGTS", false, false),
        record(2, "Principal", true, true),
        record(5, "BPC", true, false),
    ]);
    let report = list_agents_report(&crm).expect("report");
    assert_eq!(
        report,
        "2\tPrincipal\t(principal)\n5\tBPC\n9\tFGTS\t(inactive)"
    );

    assert_eq!(
        list_agents_report(&FakeCrm::default()).expect("empty"),
        "no agents"
    );
    crm.fail_list.set(true);
    assert!(list_agents_report(&crm).is_err());
}

#[test]
fn templates_report_lists_principal_first() {
    let report = templates_report(&TemplateCatalog::builtin());
    let ids: Vec<&str> = report
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(ids, vec!["principal", "bancario", "bpc", "fgts", "consignado"]);
    assert!(report
        .lines()
        .any(|line| line.starts_with("bpc") && line.contains("steps=3")));
}

#[test]
fn render_report_lists_decisions_with_offsets() {
    let html = r#"<p>Oi <span class="decision-token" data-decision-kind="add_tag" data-decision-target-id="7" data-decision-label="VIP">Add tag: VIP</span> ok</p>"#;
    let report = render_html_report(html, &TokenCodec::new());
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "Oi [Add tag: VIP] ok");
    assert_eq!(lines[2], "decisions:");
    assert_eq!(lines[3], "  offset=3 kind=add_tag target=7 label=VIP");

    let plain = render_html_report("<p>Sem decisões</p>", &TokenCodec::new());
    assert_eq!(plain, "Sem decisões");
}

#[test]
fn cli_prints_help_and_rejects_unknown_verbs() {
    let help = run_cli(Vec::new()).expect("help");
    assert!(help.contains("batch <template>..."));
    assert!(help.contains("ROTEIRO_API_BASE"));
    assert_eq!(run_cli(args(&["help"])).expect("help"), help);

    let err = run_cli(args(&["setup"])).expect_err("unknown");
    assert_eq!(err, "unknown command `setup`");
    assert!(run_cli(args(&["render"])).is_err());
}
