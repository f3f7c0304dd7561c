use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use super::types::{
    ChunkContent, CreateRun, CreateThreadRequest, FileObject, ListResponse, NewMessage, Run,
    RunStep, Thread, ThreadMessage,
};
use super::AssistantBackend;
use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};

/// Beta header required by the thread/run/message endpoints.
pub const ASSISTANTS_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// reqwest-backed [`AssistantBackend`].
#[derive(Clone)]
pub struct AssistantsClient {
    api_key: String,
    api_base: String,
    client: reqwest::Client,
}

impl AssistantsClient {
    /// Build a client for `api_base` (e.g. `https://api.openai.com/v1`).
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.into().trim().to_string(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(&config.api_key, &config.api_base, config.http_timeout)
    }

    fn request(&self, method: Method, path: &str, beta: bool) -> RequestBuilder {
        let url = format!("{}{}", self.api_base, path);
        let builder = self.client.request(method, url).bearer_auth(&self.api_key);
        if beta {
            builder.header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
        } else {
            builder
        }
    }

    /// Send, require a 2xx status and decode the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> ProxyResult<T> {
        let res = builder
            .send()
            .await
            .map_err(|source| ProxyError::Transport { operation, source })?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|source| ProxyError::Transport { operation, source })?;

        if !status.is_success() {
            return Err(ProxyError::Upstream {
                operation,
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| ProxyError::Decode { operation, source })
    }
}

#[async_trait]
impl AssistantBackend for AssistantsClient {
    async fn create_thread(&self, question: &str) -> ProxyResult<Thread> {
        let body = CreateThreadRequest {
            messages: vec![NewMessage {
                role: "user",
                content: question,
            }],
        };
        let builder = self.request(Method::POST, "/threads", true).json(&body);
        self.send("create thread", builder).await
    }

    async fn create_run(&self, thread_id: &str, request: &CreateRun) -> ProxyResult<Run> {
        let builder = self
            .request(Method::POST, &format!("/threads/{}/runs", thread_id), true)
            .json(request);
        self.send("create run", builder).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> ProxyResult<Run> {
        let builder = self.request(
            Method::GET,
            &format!("/threads/{}/runs/{}", thread_id, run_id),
            true,
        );
        self.send("run status", builder).await
    }

    async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> ProxyResult<Vec<RunStep>> {
        let builder = self.request(
            Method::GET,
            &format!("/threads/{}/runs/{}/steps", thread_id, run_id),
            true,
        );
        let list: ListResponse<RunStep> = self.send("list run steps", builder).await?;
        Ok(list.data)
    }

    async fn list_messages(&self, thread_id: &str) -> ProxyResult<Vec<ThreadMessage>> {
        let builder = self.request(Method::GET, &format!("/threads/{}/messages", thread_id), true);
        let list: ListResponse<ThreadMessage> = self.send("list messages", builder).await?;
        Ok(list.data)
    }

    async fn get_file(&self, file_id: &str) -> ProxyResult<FileObject> {
        let builder = self.request(Method::GET, &format!("/files/{}", file_id), false);
        self.send("file metadata", builder).await
    }

    async fn get_file_chunk(&self, file_id: &str, chunk_id: &str) -> ProxyResult<ChunkContent> {
        let builder = self
            .request(Method::GET, &format!("/files/{}/content", file_id), false)
            .query(&[("chunk_id", chunk_id)]);
        self.send("file chunk", builder).await
    }
}
