pub mod llm_service;
pub mod prompt_builder;
pub mod result_writer;
pub mod resume_index;

pub use llm_service::{ChatBackend, ModelRouter};
pub use prompt_builder::{build_payload, BatchPayload, PromptTemplate};
pub use result_writer::ResultWriter;
pub use resume_index::{artifact_name, completed_batches};
