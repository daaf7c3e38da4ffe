//! These models represent the objects passed between the request handler,
//! the orchestrator and the tool registry.
//!
//! The completion service speaks the OpenAI chat format; we keep our own
//! smaller structs and convert at the edge in `providers::utils`.
pub mod message;
pub mod role;
pub mod stream;
pub mod tool;
