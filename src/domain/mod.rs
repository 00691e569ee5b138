//! Domain objects parsing and resource/tool integrations
//!
//! Provides the bookmark tools, resources, prompts and renderers exposed over
//! the MCP protocol.

pub mod citation;
pub mod highlights;
pub mod prompts;
pub mod render;
pub mod resources;
pub mod tools;
pub mod utils;
