//! vim-cmd command-string builders
//!
//! One formatting function per hypervisor operation so quoting is applied in
//! exactly one place and the strings can be tested without running anything.

/// Fixed description attached to every snapshot the agent creates.
const SNAPSHOT_DESCRIPTION: &str = "Description";

pub fn power_on(vm_id: &str) -> String {
    format!("vim-cmd vmsvc/power.on {vm_id}")
}

pub fn power_shutdown(vm_id: &str) -> String {
    format!("vim-cmd vmsvc/power.shutdown {vm_id}")
}

pub fn power_suspend(vm_id: &str) -> String {
    format!("vim-cmd vmsvc/power.suspend {vm_id}")
}

pub fn power_reset(vm_id: &str) -> String {
    format!("vim-cmd vmsvc/power.reset {vm_id}")
}

/// Enumerates every VM on the host, not just the target.
pub fn get_all_vms() -> String {
    "vim-cmd vmsvc/getallvms".to_string()
}

pub fn snapshot_get(vm_id: &str) -> String {
    format!("vim-cmd vmsvc/snapshot.get {vm_id}")
}

/// Creates a snapshot with the fixed description and power-off flag 1.
pub fn snapshot_create(vm_id: &str, name: &str) -> String {
    format!(
        "vim-cmd vmsvc/snapshot.create {vm_id} '{}' {SNAPSHOT_DESCRIPTION} 1",
        escape_single_quoted(name)
    )
}

pub fn snapshot_remove(vm_id: &str, snap_id: &str) -> String {
    format!("vim-cmd vmsvc/snapshot.remove {vm_id} {snap_id} 0")
}

pub fn snapshot_revert(vm_id: &str, snap_id: &str) -> String {
    format!("vim-cmd vmsvc/snapshot.revert {vm_id} {snap_id} 0")
}

/// Escape a value embedded in a single-quoted shell argument.
fn escape_single_quoted(s: &str) -> String {
    s.replace('\'', r"'\''")
}
