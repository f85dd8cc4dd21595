//! VM lifecycle operations
//!
//! Translates control intents into `vim-cmd` invocations and owns the
//! restart sequencing (revert, then wait for the target to come back up).

use tracing::info;

use crate::config::AgentConfig;
use crate::exec::CommandExecutor;
use crate::probe::{FixedDelayProbe, ReadinessProbe};
use crate::{vim, Result};

/// Control agent for a single target VM.
///
/// Identity and verbosity are fixed at construction; every operation is
/// synchronous and blocks until the underlying hypervisor command completes.
pub struct VmAgent {
    config: AgentConfig,
    executor: CommandExecutor,
    probe: Box<dyn ReadinessProbe>,
}

impl VmAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self::with_parts(
            config,
            CommandExecutor::new(),
            Box::new(FixedDelayProbe::default()),
        )
    }

    /// Construct with an explicit executor and readiness probe.
    pub fn with_parts(
        config: AgentConfig,
        executor: CommandExecutor,
        probe: Box<dyn ReadinessProbe>,
    ) -> Self {
        let agent = Self {
            config,
            executor,
            probe,
        };
        agent.log("VM control agent initialized:", 1);
        agent.log(&format!("\t vm id: {}", agent.config.vm_id), 1);
        agent.log(&format!("\t snap id: {}", agent.config.snap_id), 1);
        agent.log(&format!("\t log level: {}", agent.config.log_level), 1);
        agent.log("Awaiting requests...", 1);
        agent
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Health check for remote callers. Never touches the hypervisor.
    pub fn alive(&self) -> bool {
        true
    }

    /// Emit `msg` if `level` falls within the configured verbosity.
    pub fn log(&self, msg: &str, level: u8) {
        if self.should_log(level) {
            info!("{msg}");
        }
    }

    pub fn should_log(&self, level: u8) -> bool {
        level <= self.config.log_level
    }

    pub fn start(&self) -> Result<String> {
        self.log("starting image", 2);
        self.executor.run(&vim::power_on(&self.config.vm_id))
    }

    pub fn stop(&self) -> Result<String> {
        self.log("stopping image", 2);
        self.executor.run(&vim::power_shutdown(&self.config.vm_id))
    }

    pub fn suspend(&self) -> Result<String> {
        self.log("suspending image", 2);
        self.executor.run(&vim::power_suspend(&self.config.vm_id))
    }

    pub fn reset(&self) -> Result<String> {
        self.log("resetting image", 2);
        self.executor.run(&vim::power_reset(&self.config.vm_id))
    }

    /// Enumerate all VMs on the host. Not scoped to the target.
    pub fn list(&self) -> Result<String> {
        self.log("listing running images", 2);
        self.executor.run(&vim::get_all_vms())
    }

    pub fn list_snapshots(&self) -> Result<String> {
        self.log("listing snapshots", 2);
        self.executor.run(&vim::snapshot_get(&self.config.vm_id))
    }

    pub fn snapshot(&self, name: &str) -> Result<String> {
        self.log(&format!("taking snapshot: {name}"), 2);
        self.executor
            .run(&vim::snapshot_create(&self.config.vm_id, name))
    }

    /// Remove `snap_id`, or the configured default snapshot when `None`.
    pub fn delete_snapshot(&self, snap_id: Option<&str>) -> Result<String> {
        let snap_id = snap_id.unwrap_or(&self.config.snap_id);
        self.log(&format!("deleting snapshot: {snap_id}"), 2);
        self.executor
            .run(&vim::snapshot_remove(&self.config.vm_id, snap_id))
    }

    /// Revert to `snap_id`, or the configured default snapshot when `None`.
    pub fn revert_to_snapshot(&self, snap_id: Option<&str>) -> Result<String> {
        let snap_id = snap_id.unwrap_or(&self.config.snap_id);
        self.log(&format!("reverting to snapshot: {snap_id}"), 2);
        self.executor
            .run(&vim::snapshot_revert(&self.config.vm_id, snap_id))
    }

    /// Revert the target to its default snapshot and block until it is
    /// usable again. Reverting a running snapshot powers the VM on, so no
    /// explicit start is issued.
    pub fn restart_target(&self) -> Result<()> {
        self.log("restarting virtual machine...", 1);
        self.revert_to_snapshot(None)?;
        self.wait();
        Ok(())
    }

    pub fn is_target_running(&self) -> bool {
        self.probe.is_running()
    }

    /// Block until the readiness probe reports the target up. The loop is
    /// kept even though the stub probe always succeeds on its first call.
    pub fn wait(&self) {
        self.log(&format!("waiting for vm to come up: {}", self.config.vm_id), 1);
        loop {
            if self.is_target_running() {
                break;
            }
        }
    }
}
