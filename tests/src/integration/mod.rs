//! # Integration Scenarios

pub mod agreement_flows;
pub mod concurrency;
pub mod durability;
