//! Built-in tool implementations.
//!
//! Each sub-module implements one tool the agent can invoke and exposes a
//! `register` function that adds it to a [`super::ToolRegistry`].

pub mod calculator;
pub mod job_search;
pub mod web_search;
