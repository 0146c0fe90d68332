//! Supported AI coding agents.
//!
//! The table lives in `agents/registry.toml` and is embedded at build
//! time. Each entry names where the agent reads skills (and optionally
//! commands) in project scope and in global scope:
//!
//! ```toml
//! [[agents]]
//! id = "claude-code"
//! name = "Claude Code"
//! config_dir = "~/.claude"
//! skills_dir = ".claude/skills"
//! global_skills_dir = "~/.claude/skills"
//! commands_dir = ".claude/commands"
//! global_commands_dir = "~/.claude/commands"
//! ```

pub mod definition;
pub mod registry;

pub use definition::AgentDescriptor;
pub use registry::AgentRegistry;
