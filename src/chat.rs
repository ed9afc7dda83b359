use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Hosted inference endpoint the book chatbot talks to.
pub const DEFAULT_ENDPOINT: &str = "https://abdul123233-my-book.hf.space/chat";

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

/// HTTP client for the chat backend. One POST per question, no retries,
/// no timeout beyond the transport default.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `{"question": ...}` and return the `answer` field of the JSON
    /// reply. Transport failures, non-2xx statuses, non-JSON bodies, and a
    /// missing `answer` field all surface as errors.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let request = AskRequest { question };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status: {}",
                response.status()
            ));
        }

        let body: AskResponse = response.json().await?;
        Ok(body.answer)
    }
}
