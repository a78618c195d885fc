//! `axe`: command line access to AxeOS devices and a mock device server.

pub mod commands;
pub mod server;
