//! Service layer: intake orchestration, aggregate statistics, the AI
//! collaborator client, and the escalation sweep.

pub mod ai_client;
pub mod intake;
pub mod stats;
pub mod theme_sweep;
