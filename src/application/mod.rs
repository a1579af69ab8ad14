//! Application layer: input parsing, status tracking and the batch
//! orchestrator that drives confidential payments through the domain ports.

pub mod input;
pub mod orchestrator;
pub mod tracker;
