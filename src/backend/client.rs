use super::{
    AgentRecord, AgentRegistry, AgentUpdate, BackendError, ContentStore, CreatedAgent, FaqPayload,
    Funnel, MediaStore, NewAgent, ReferenceData, ReferenceItem, RulesPayload, StepsPayload,
    UploadedMedia,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Blocking HTTP client for the CRM backend.
#[derive(Debug, Clone)]
pub struct CrmApiClient {
    api_base: String,
    token: Option<String>,
    agent: ureq::Agent,
}

/// Listings come back either bare or wrapped in `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListEnvelope<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemEnvelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> ItemEnvelope<T> {
    fn into_item(self) -> T {
        match self {
            Self::Bare(item) | Self::Wrapped { data: item } => item,
        }
    }
}

impl CrmApiClient {
    pub fn new(api_base: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            agent,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    fn read_error(err: ureq::Error) -> BackendError {
        match err {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                let body = body.trim();
                if body.is_empty() {
                    BackendError::Response(format!("http {code}"))
                } else {
                    BackendError::Response(format!("http {code}: {body}"))
                }
            }
            other => BackendError::Request(other.to_string()),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.endpoint(path);
        let response = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(Self::read_error)?;
        response
            .into_json::<T>()
            .map_err(|e| BackendError::Request(e.to_string()))
    }

    fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, BackendError> {
        self.get_json::<ListEnvelope<T>>(path)
            .map(ListEnvelope::into_items)
    }

    fn send_json<B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: &B,
    ) -> Result<ureq::Response, BackendError> {
        let url = self.endpoint(path);
        let body = serde_json::to_value(body).map_err(|e| BackendError::Request(e.to_string()))?;
        self.authorize(self.agent.request(method, &url))
            .send_json(body)
            .map_err(Self::read_error)
    }

    fn post_discarding<B: Serialize>(&self, path: &str, body: &B) -> Result<(), BackendError> {
        self.send_json("POST", path, body).map(|_| ())
    }
}

impl AgentRegistry for CrmApiClient {
    fn list_agents(&self) -> Result<Vec<AgentRecord>, BackendError> {
        self.get_list("agents")
    }

    fn create_agent(&self, agent: &NewAgent) -> Result<CreatedAgent, BackendError> {
        let response = self.send_json("POST", "agents", agent)?;
        let raw = response
            .into_string()
            .map_err(|e| BackendError::Request(e.to_string()))?;
        if raw.trim().is_empty() {
            return Ok(CreatedAgent::default());
        }
        // Some deployments answer with a bare acknowledgement instead of the
        // record; treat anything unparseable as "no id".
        Ok(serde_json::from_str::<ItemEnvelope<CreatedAgent>>(&raw)
            .map(ItemEnvelope::into_item)
            .unwrap_or_default())
    }

    fn update_agent(&self, agent_id: i64, update: &AgentUpdate) -> Result<(), BackendError> {
        self.send_json("PUT", &format!("agents/{agent_id}"), update)
            .map(|_| ())
    }
}

impl ContentStore for CrmApiClient {
    fn save_rules(&self, payload: &RulesPayload) -> Result<(), BackendError> {
        self.post_discarding(&format!("agents/{}/rules", payload.agent_id), payload)
    }

    fn save_steps(&self, payload: &StepsPayload) -> Result<(), BackendError> {
        self.post_discarding(&format!("agents/{}/steps", payload.agent_id), payload)
    }

    fn save_faq(&self, payload: &FaqPayload) -> Result<(), BackendError> {
        self.post_discarding(&format!("agents/{}/faq", payload.agent_id), payload)
    }
}

impl ReferenceData for CrmApiClient {
    fn tags(&self) -> Result<Vec<ReferenceItem>, BackendError> {
        self.get_list("tags")
    }

    fn agents(&self) -> Result<Vec<ReferenceItem>, BackendError> {
        self.get_list("agents")
    }

    fn users(&self) -> Result<Vec<ReferenceItem>, BackendError> {
        self.get_list("users")
    }

    fn sources(&self) -> Result<Vec<ReferenceItem>, BackendError> {
        self.get_list("sources")
    }

    fn funnels(&self) -> Result<Vec<Funnel>, BackendError> {
        self.get_list("funnels")
    }

    fn notification_functions(&self) -> Result<Vec<ReferenceItem>, BackendError> {
        self.get_list("notification-functions")
    }

    fn products(&self) -> Result<Vec<ReferenceItem>, BackendError> {
        self.get_list("products")
    }
}

impl MediaStore for CrmApiClient {
    fn upload(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<UploadedMedia, BackendError> {
        let url = self.endpoint("media");
        let response = self
            .authorize(self.agent.post(&url))
            .set("Content-Type", mime_type)
            .set("X-File-Name", &urlencoding::encode(file_name))
            .send_bytes(bytes)
            .map_err(Self::read_error)?;
        response
            .into_json::<ItemEnvelope<UploadedMedia>>()
            .map(ItemEnvelope::into_item)
            .map_err(|e| BackendError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let client = CrmApiClient::new("https://crm.example.com/api/", None, Duration::from_secs(5));
        assert_eq!(
            client.endpoint("/agents/3/rules"),
            "https://crm.example.com/api/agents/3/rules"
        );
    }

    #[test]
    fn list_envelope_accepts_bare_and_wrapped_arrays() {
        let bare: ListEnvelope<ReferenceItem> =
            serde_json::from_str(r#"[{"id":1,"name":"VIP"}]"#).expect("bare");
        let wrapped: ListEnvelope<ReferenceItem> =
            serde_json::from_str(r#"{"data":[{"id":1,"name":"VIP"}]}"#).expect("wrapped");
        assert_eq!(bare.into_items(), wrapped.into_items());
    }

    #[test]
    fn created_agent_without_id_parses_as_none() {
        let created: ItemEnvelope<CreatedAgent> =
            serde_json::from_str(r#"{"name":"BPC"}"#).expect("parse");
        assert_eq!(created.into_item().id, None);
    }
}
