//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the external API routing, including the configurable MCP listener and the health and discovery endpoints.

pub mod handlers;
