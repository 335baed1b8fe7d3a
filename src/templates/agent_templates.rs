use crate::content::{from_html, AgentContent, FaqItem, RichText, ScriptStep};
use crate::decision::TokenCodec;
use crate::shared::TemplateId;
use serde::{Deserialize, Serialize};

/// Starting content for an agent, stored as HTML the same way the backend
/// stores it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules_html: String,
    #[serde(default)]
    pub steps: Vec<TemplateStep>,
    #[serde(default)]
    pub faq: Vec<TemplateFaq>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TemplateStep {
    pub name: String,
    #[serde(default)]
    pub body_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TemplateFaq {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer_html: String,
}

impl AgentTemplate {
    pub fn to_content(&self, codec: &TokenCodec) -> AgentContent {
        let steps = self
            .steps
            .iter()
            .zip(1u32..)
            .map(|(step, order)| ScriptStep {
                order,
                name: step.name.clone(),
                body: from_html(&step.body_html, codec),
            })
            .collect();
        let faq = self
            .faq
            .iter()
            .zip(1u32..)
            .map(|(item, order)| FaqItem {
                order,
                question: item.question.clone(),
                answer: from_html(&item.answer_html, codec),
            })
            .collect();
        let rules = if self.rules_html.trim().is_empty() {
            RichText::new()
        } else {
            from_html(&self.rules_html, codec)
        };
        AgentContent::new(rules, steps, faq)
    }
}

fn step(name: &str, body_html: &str) -> TemplateStep {
    TemplateStep {
        name: name.to_string(),
        body_html: body_html.to_string(),
    }
}

fn faq(question: &str, answer_html: &str) -> TemplateFaq {
    TemplateFaq {
        question: Some(question.to_string()),
        answer_html: answer_html.to_string(),
    }
}

fn template(
    id: &str,
    name: &str,
    description: &str,
    rules_html: &str,
    steps: Vec<TemplateStep>,
    faq: Vec<TemplateFaq>,
) -> AgentTemplate {
    AgentTemplate {
        // Built-in ids are literals that always satisfy the id rules.
        id: TemplateId::parse(id).unwrap_or_else(|_| TemplateId::principal()),
        name: name.to_string(),
        description: description.to_string(),
        rules_html: rules_html.to_string(),
        steps,
        faq,
    }
}

const STOP_AGENT_SPAN: &str = r#"<span class="decision-token decision-token--stop-agent" contenteditable="false" data-decision-kind="stop_agent" data-decision-label="">Stop agent</span>"#;

pub fn principal_template() -> AgentTemplate {
    template(
        TemplateId::PRINCIPAL,
        "Principal",
        "Recebe todas as conversas novas e encaminha para o especialista certo.",
        "<p>Seja cordial e objetivo.</p><p>Identifique o produto de interesse antes de transferir.</p>",
        vec![
            step(
                "Saudação",
                "<p>Cumprimente o cliente pelo nome e pergunte como pode ajudar.</p>",
            ),
            step(
                "Triagem",
                "<p>Descubra se o interesse é <strong>crédito consignado</strong>, <strong>FGTS</strong>, <strong>BPC</strong> ou conta bancária.</p>",
            ),
            step(
                "Encaminhamento",
                "<p>Transfira para o agente especialista do produto escolhido.</p>",
            ),
        ],
        vec![faq(
            "Vocês cobram alguma taxa antecipada?",
            "<p>Não. Nenhum valor é cobrado antes da liberação.</p>",
        )],
    )
}

fn bancario_template() -> AgentTemplate {
    template(
        "bancario",
        "Bancário",
        "Abertura de conta e dúvidas bancárias.",
        "<p>Nunca solicite senhas ou códigos de segurança.</p>",
        vec![
            step(
                "Coleta de dados",
                "<p>Peça nome completo, CPF e data de nascimento.</p>",
            ),
            step(
                "Abertura de conta",
                "<p>Explique as etapas de abertura e envie o link do aplicativo.</p>",
            ),
        ],
        vec![faq(
            "A conta tem tarifa?",
            "<p>A conta digital é <em>isenta</em> de tarifa mensal.</p>",
        )],
    )
}

fn bpc_template() -> AgentTemplate {
    template(
        "bpc",
        "BPC",
        "Benefício de Prestação Continuada (LOAS).",
        "<p>Confirme se o cliente já recebe o benefício antes de simular.</p>",
        vec![
            step(
                "Elegibilidade",
                "<p>Pergunte se o benefício está ativo e há quanto tempo.</p>",
            ),
            step(
                "Simulação",
                "<p>Solicite o extrato do benefício e informe o valor disponível.</p>",
            ),
            step(
                "Encerramento",
                &format!("<p>Agradeça o contato. {STOP_AGENT_SPAN}</p>"),
            ),
        ],
        vec![faq(
            "Quem recebe BPC pode contratar empréstimo?",
            "<p>Sim, dentro da margem consignável permitida.</p>",
        )],
    )
}

fn fgts_template() -> AgentTemplate {
    template(
        "fgts",
        "FGTS",
        "Antecipação do saque-aniversário.",
        "<p>Explique que a adesão ao saque-aniversário é feita no app do FGTS.</p>",
        vec![
            step(
                "Adesão",
                "<p>Confirme se o cliente já aderiu ao saque-aniversário.</p>",
            ),
            step(
                "Autorização",
                "<p>Oriente a autorizar o banco no aplicativo do FGTS.</p>",
            ),
            step(
                "Proposta",
                "<p>Apresente o valor antecipado e colete a confirmação.</p>",
            ),
        ],
        vec![faq(
            "Em quanto tempo o dinheiro cai?",
            "<p>Normalmente no mesmo dia útil da aprovação.</p>",
        )],
    )
}

fn consignado_template() -> AgentTemplate {
    template(
        "consignado",
        "Consignado",
        "Crédito consignado para aposentados, pensionistas e servidores.",
        "<p>Informe sempre a taxa e o número de parcelas.</p>",
        vec![
            step(
                "Perfil",
                "<p>Pergunte se é aposentado, pensionista ou servidor público.</p>",
            ),
            step(
                "Margem",
                "<p>Solicite o extrato de margem consignável.</p>",
            ),
        ],
        vec![faq(
            "Posso quitar antes do prazo?",
            "<p>Sim, com desconto proporcional dos juros.</p>",
        )],
    )
}

pub fn builtin_specialists() -> Vec<AgentTemplate> {
    vec![
        bancario_template(),
        bpc_template(),
        fgts_template(),
        consignado_template(),
    ]
}
