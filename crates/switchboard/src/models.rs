//! These models represent the objects passed around by the agents
//!
//! There are several different related formats we need to interact with:
//! - chat requests from the terminal or the http front end, sent to the chat agent
//! - openai-compatible messages/tools, sent from the agents to the LLM
//! - tool requests, sent from the agents to the local tool handlers
//! - structured outputs (search plans, reports) returned by pipeline agents
//!
//! We always immediately convert those data models into the internal structs using
//! to/from helpers, so the internal models are not an exact match to any of these formats.
pub mod message;
pub mod research;
pub mod role;
pub mod tool;
