//! Agent configuration

use serde::{Deserialize, Serialize};

/// Default TCP port the agent binds to.
pub const DEFAULT_PORT: u16 = 26003;

/// Identity and verbosity of one agent instance. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Address to bind the control server to.
    pub host: String,
    pub port: u16,
    /// Id of the virtual machine this agent controls.
    pub vm_id: String,
    /// Snapshot used when an operation is called without an explicit snapshot id.
    pub snap_id: String,
    /// Verbosity threshold for the agent's own log calls (default 1).
    pub log_level: u8,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            vm_id: String::new(),
            snap_id: String::new(),
            log_level: 1,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.vm_id.trim().is_empty() {
            return Err(crate::Error::Config("vm_id cannot be empty".into()));
        }
        if self.snap_id.trim().is_empty() {
            return Err(crate::Error::Config("snap_id cannot be empty".into()));
        }
        Ok(())
    }
}
