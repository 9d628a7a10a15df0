//! chatplug - plugin registry and function-call dispatch for chat agents
//!
//! Hosts build a [`plugins::PluginRegistry`] from configuration, offer its
//! aggregated function specs to the model and route the model's calls back
//! through [`plugins::PluginRegistry::dispatch`].

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod plugins;
pub mod speech;
