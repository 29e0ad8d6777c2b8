// src/summarize/openai.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::summarize::SummaryProvider;

/// Chat-completions provider. Requires an API key; a missing key surfaces as
/// an error the summarizer turns into its fixed fallback.
pub struct OpenAiSummaries {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiSummaries {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: model.into(),
        }
    }
}

#[async_trait]
impl SummaryProvider for OpenAiSummaries {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            anyhow::bail!("OPENAI_API_KEY is not set");
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.4,
            max_tokens: 500,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai chat completions call")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("openai returned {status}");
        }
        let body: Resp = resp.json().await.context("openai response body")?;
        Ok(body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
