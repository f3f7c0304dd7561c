//! Citation resolution: chunk map, labels, pages and answer rewriting.
//!
//! The assistant API attaches chunk ids to tool calls in the run steps rather
//! than to the citation annotations in the final message, so pages are found by
//! way of a per-run [`ChunkMap`].

use std::collections::HashMap;
use std::fmt;

use futures_util::stream::{self, StreamExt};
use serde::{Serialize, Serializer};

use crate::assistant::{Annotation, AssistantBackend, PageValue, RunStep, ThreadMessage};

/// Placeholder page shown when no page could be resolved.
pub const UNKNOWN_PAGE: &str = "?";

/// File id → first chunk id seen in the run steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMap {
    chunks: HashMap<String, String>,
}

impl ChunkMap {
    /// Scan steps in order; the first chunk id recorded for a file wins.
    pub fn from_steps(steps: &[RunStep]) -> Self {
        let mut map = Self::default();
        for citation in steps.iter().filter_map(RunStep::first_file_citation) {
            if let Some(chunk_id) = citation.file_chunk_id.as_deref() {
                map.record(&citation.file_id, chunk_id);
            }
        }
        map
    }

    /// Returns false when the file already had a chunk (or `chunk_id` is empty).
    pub fn record(&mut self, file_id: &str, chunk_id: &str) -> bool {
        if chunk_id.is_empty() || self.chunks.contains_key(file_id) {
            return false;
        }
        self.chunks.insert(file_id.to_string(), chunk_id.to_string());
        true
    }

    pub fn get(&self, file_id: &str) -> Option<&str> {
        self.chunks.get(file_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// A resolved page. Serializes as a JSON number, the page text, or `"?"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Number(serde_json::Number),
    Text(String),
    Unknown,
}

impl Page {
    /// Whole-valued floats collapse to integers, so `3.0` renders as `3`.
    pub fn number(n: serde_json::Number) -> Self {
        match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT => {
                Page::Number(serde_json::Number::from(f as i64))
            }
            _ => Page::Number(n),
        }
    }
}

/// Largest magnitude below which every whole f64 is an exact integer (2^53).
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

impl From<u64> for Page {
    fn from(value: u64) -> Self {
        Page::Number(value.into())
    }
}

impl From<Option<&PageValue>> for Page {
    fn from(value: Option<&PageValue>) -> Self {
        match value {
            Some(PageValue::Number(n)) => Page::number(n.clone()),
            Some(PageValue::Text(t)) if !t.trim().is_empty() => Page::Text(t.clone()),
            _ => Page::Unknown,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Number(n) => write!(f, "{}", n),
            Page::Text(t) => f.write_str(t),
            Page::Unknown => f.write_str(UNKNOWN_PAGE),
        }
    }
}

impl Serialize for Page {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Page::Number(n) => n.serialize(serializer),
            Page::Text(t) => serializer.serialize_str(t),
            Page::Unknown => serializer.serialize_str(UNKNOWN_PAGE),
        }
    }
}

/// A `file_citation` annotation as found in the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationMarker {
    pub file_id: String,
    pub token: String,
}

/// Every file citation across the message's text blocks, in order.
pub fn collect_markers(message: &ThreadMessage) -> Vec<CitationMarker> {
    message
        .text_blocks()
        .flat_map(|block| block.annotations.iter())
        .filter_map(|annotation| match annotation {
            Annotation::FileCitation {
                text,
                file_citation,
            } => Some(CitationMarker {
                file_id: file_citation.file_id.clone(),
                token: text.clone(),
            }),
            Annotation::Other => None,
        })
        .collect()
}

/// Text blocks joined by a blank line.
pub fn answer_text(message: &ThreadMessage) -> String {
    message
        .text_blocks()
        .map(|block| block.value.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCitation {
    pub file_id: String,
    pub label: String,
    pub page: Page,
    pub token: String,
}

impl ResolvedCitation {
    /// Replacement text, leading space included: `" [Label s.4]"` or `" [Label]"`.
    pub fn marker(&self) -> String {
        match &self.page {
            Page::Unknown => format!(" [{}]", self.label),
            page => format!(" [{} s.{}]", self.label, page),
        }
    }
}

/// Replace every occurrence of each citation token with its marker, in list order.
pub fn rewrite_answer(answer: &str, citations: &[ResolvedCitation]) -> String {
    citations.iter().fold(answer.to_string(), |text, citation| {
        if citation.token.is_empty() {
            return text;
        }
        text.replace(&citation.token, &citation.marker())
    })
}

/// Filename without a trailing `.pdf` (any case).
pub fn label_from_filename(filename: &str) -> String {
    let cut = filename.len().saturating_sub(4);
    match filename.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => filename[..cut].to_string(),
        _ => filename.to_string(),
    }
}

/// `fil-` followed by the last six characters of the file id.
pub fn fallback_label(file_id: &str) -> String {
    let count = file_id.chars().count();
    let tail: String = file_id.chars().skip(count.saturating_sub(6)).collect();
    format!("fil-{}", tail)
}

/// Document label; any lookup failure yields [`fallback_label`].
pub async fn resolve_label(backend: &dyn AssistantBackend, file_id: &str) -> String {
    match backend.get_file(file_id).await {
        Ok(file) => label_from_filename(&file.filename),
        Err(e) => {
            tracing::debug!(target: "citeproxy::citations", file_id, error = %e, "file lookup failed, using fallback label");
            fallback_label(file_id)
        }
    }
}

/// Page of the chunk, if one is known for the file and the lookup succeeds.
pub async fn resolve_page(
    backend: &dyn AssistantBackend,
    file_id: &str,
    chunk_id: Option<&str>,
) -> Page {
    let Some(chunk_id) = chunk_id else {
        return Page::Unknown;
    };
    match backend.get_file_chunk(file_id, chunk_id).await {
        Ok(chunk) => chunk.page().into(),
        Err(e) => {
            tracing::debug!(target: "citeproxy::citations", file_id, chunk_id, error = %e, "chunk lookup failed, page unknown");
            Page::Unknown
        }
    }
}

/// Resolve all markers with at most `concurrency` lookups in flight.
/// Output order matches `markers`.
pub async fn resolve_citations(
    backend: &dyn AssistantBackend,
    markers: Vec<CitationMarker>,
    chunks: &ChunkMap,
    concurrency: usize,
) -> Vec<ResolvedCitation> {
    stream::iter(markers)
        .map(|marker| async move {
            let chunk_id = chunks.get(&marker.file_id);
            let (label, page) = tokio::join!(
                resolve_label(backend, &marker.file_id),
                resolve_page(backend, &marker.file_id, chunk_id),
            );
            ResolvedCitation {
                file_id: marker.file_id,
                label,
                page,
                token: marker.token,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
