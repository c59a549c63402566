//! Rolegate - command-line front end for the Rolegate API client.
//!
//! The binary parses its arguments into an [`cli::Invocation`], loads
//! [`rolegate_infrastructure::ClientConfig`], and runs the command against a
//! [`rolegate_application::RolegateClient`].

pub mod cli;

pub use cli::{CliError, Command, Invocation, USAGE, run};
