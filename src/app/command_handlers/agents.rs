use crate::app::command_support::{api_client, load_settings};
use crate::backend::AgentRegistry;

pub fn cmd_agents() -> Result<String, String> {
    let settings = load_settings()?;
    let client = api_client(&settings)?;
    list_agents_report(&client)
}

pub fn list_agents_report(registry: &dyn AgentRegistry) -> Result<String, String> {
    let mut agents = registry.list_agents().map_err(|e| e.to_string())?;
    if agents.is_empty() {
        return Ok("no agents".to_string());
    }
    agents.sort_by_key(|agent| agent.id);
    Ok(agents
        .iter()
        .map(|agent| {
            let mut flags = Vec::new();
            if agent.is_principal {
                flags.push("principal");
            }
            if !agent.active {
                flags.push("inactive");
            }
            if flags.is_empty() {
                format!("{}\t{}", agent.id, agent.name)
            } else {
                format!("{}\t{}\t({})", agent.id, agent.name, flags.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n"))
}
