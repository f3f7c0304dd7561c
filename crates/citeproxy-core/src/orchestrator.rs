//! Request orchestrator: one question in, one cited answer out.
//!
//! Flow per request: thread → run → poll → steps → messages → citation lookups →
//! rewrite. Every step before citation lookup aborts the request on failure;
//! citation lookups degrade to fallback labels and unknown pages.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::assistant::{AssistantBackend, CreateRun, MessageRole, RunOutcome};
use crate::citations::{
    answer_text, collect_markers, resolve_citations, rewrite_answer, ChunkMap, ResolvedCitation,
};
use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::instructions::InstructionPolicy;

/// Response body of a successful chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatAnswer {
    pub content: String,
    pub citations: Vec<ResolvedCitation>,
}

pub struct Orchestrator {
    backend: Arc<dyn AssistantBackend>,
    config: Arc<ProxyConfig>,
    instructions: Box<dyn InstructionPolicy>,
}

impl Orchestrator {
    /// Instruction policy comes from `config`.
    pub fn new(backend: Arc<dyn AssistantBackend>, config: Arc<ProxyConfig>) -> Self {
        let instructions = config.instruction_policy();
        Self {
            backend,
            config,
            instructions,
        }
    }

    pub fn with_instructions(mut self, policy: impl InstructionPolicy + 'static) -> Self {
        self.instructions = Box::new(policy);
        self
    }

    /// Answer `question`. Cancelling `cancel` stops the run poll at its next wait.
    pub async fn handle(&self, question: &str, cancel: &CancellationToken) -> ProxyResult<ChatAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ProxyError::InvalidInput);
        }
        if cancel.is_cancelled() {
            return Err(ProxyError::Cancelled);
        }

        let thread = self.backend.create_thread(question).await?;
        let run_request = CreateRun {
            assistant_id: self.config.assistant_id.clone(),
            instructions: self.instructions.instructions(question),
        };
        let run = self.backend.create_run(&thread.id, &run_request).await?;
        tracing::info!(
            target: "citeproxy::orchestrator",
            thread_id = %thread.id,
            run_id = %run.id,
            with_instructions = run_request.instructions.is_some(),
            "run started"
        );

        self.wait_for_run(&thread.id, &run.id, cancel).await?;

        let steps = self.backend.list_run_steps(&thread.id, &run.id).await?;
        let chunks = ChunkMap::from_steps(&steps);

        let messages = self.backend.list_messages(&thread.id).await?;
        let reply = messages
            .iter()
            .find(|m| m.role == MessageRole::Assistant)
            .ok_or_else(|| ProxyError::NoAnswer {
                thread_id: thread.id.clone(),
            })?;

        let answer = answer_text(reply);
        let markers = collect_markers(reply);
        let citations = resolve_citations(
            self.backend.as_ref(),
            markers,
            &chunks,
            self.config.citation_concurrency,
        )
        .await;

        tracing::info!(
            target: "citeproxy::orchestrator",
            thread_id = %thread.id,
            citations = citations.len(),
            chunks = chunks.len(),
            "answer ready"
        );

        Ok(ChatAnswer {
            content: rewrite_answer(&answer, &citations),
            citations,
        })
    }

    /// Poll until the run is terminal, the attempt cap is hit, or `cancel` fires.
    async fn wait_for_run(&self, thread_id: &str, run_id: &str, cancel: &CancellationToken) -> ProxyResult<()> {
        let attempts = self.config.max_poll_attempts.max(1);
        for attempt in 1..=attempts {
            let run = self.backend.get_run(thread_id, run_id).await?;
            match run.status.outcome() {
                RunOutcome::Completed => {
                    tracing::debug!(target: "citeproxy::orchestrator", run_id, attempt, "run completed");
                    return Ok(());
                }
                RunOutcome::Failed => {
                    return Err(ProxyError::RunFailed {
                        status: run.status.to_string(),
                        message: run.error_message().unwrap_or("unknown error").to_string(),
                    });
                }
                RunOutcome::Pending => {}
            }

            if attempt == attempts {
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(target: "citeproxy::orchestrator", run_id, attempt, "poll cancelled");
                    return Err(ProxyError::Cancelled);
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        tracing::warn!(target: "citeproxy::orchestrator", run_id, attempts, "run still pending, giving up");
        Err(ProxyError::PollTimeout { attempts })
    }
}
