//! Network monitoring and recovery for the Nano Pi deployment.
//!
//! The [`monitor::Monitor`] loop captures a [`snapshot`] of the primary interface every
//! cycle, detects changes with [`compare`], polls the managed services through [`health`]
//! and hands remediation to the [`recovery`] orchestrator. Everything that touches the host
//! sits behind a trait ([`runner::CommandRunner`], [`network::NetworkInspector`],
//! [`backend::NetworkBackend`], [`runtime::ServiceRuntime`], [`health::HttpProbe`],
//! [`dns::Resolver`]) so the decision logic can run against fakes.

pub mod backend;
pub mod compare;
pub mod dns;
pub mod health;
pub mod monitor;
pub mod network;
pub mod recovery;
pub mod runner;
pub mod runtime;
pub mod snapshot;
pub mod system;
