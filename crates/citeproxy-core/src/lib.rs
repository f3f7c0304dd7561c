//! citeproxy core library.
//! Drives an assistant thread/run to completion and turns its file citations
//! into readable `[Document s.N]` markers.

pub mod assistant;
pub mod citations;
pub mod config;
pub mod error;
pub mod instructions;
pub mod orchestrator;

pub use assistant::{AssistantBackend, AssistantsClient};
pub use citations::{ChunkMap, Page, ResolvedCitation};
pub use config::{InstructionSource, ProxyConfig};
pub use error::{ConfigError, ProxyError, ProxyResult};
pub use instructions::{classify_language, InstructionPolicy, Language};
pub use orchestrator::{ChatAnswer, Orchestrator};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
