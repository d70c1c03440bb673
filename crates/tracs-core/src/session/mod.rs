//! Session domain module.
//!
//! - `flow_mode`: the workflow state enum (`FlowMode`)
//! - `model`: the per-conversation state object (`Session`)

mod flow_mode;
mod model;

pub use flow_mode::FlowMode;
pub use model::{PendingActivation, Session};
