//! VM control agent
//!
//! A TCP agent that controls a single virtual machine through the ESXi
//! `vim-cmd` CLI. Its main job in a test harness is restoring the target to a
//! known-good snapshot between iterations and blocking until the machine is
//! usable again.
//!
//! # Example
//!
//! ```no_run
//! use vmcontrol::{AgentConfig, Server, VmAgent};
//!
//! # async fn run() -> std::io::Result<()> {
//! let config = AgentConfig {
//!     vm_id: "12".into(),
//!     snap_id: "3".into(),
//!     ..Default::default()
//! };
//! let addr = format!("{}:{}", config.host, config.port).parse().unwrap();
//!
//! let agent = VmAgent::new(config);
//! Server::new(agent, addr).run().await
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod exec;
pub mod probe;
pub mod vim;

pub use agent::VmAgent;
pub use api::Server;
pub use config::AgentConfig;
pub use error::{Error, Result};
