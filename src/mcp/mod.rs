//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides protocol-level specifics surrounding JSON-RPC validation, negotiation,
//! framing, and routing for both the stdio and HTTP transports.

pub mod framing;
pub mod rpc;
pub mod server;
pub mod stdio;
