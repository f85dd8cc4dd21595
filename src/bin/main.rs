//! vmcontrol CLI - TCP control agent for a single target VM

use clap::Parser;
use std::net::SocketAddr;
use vmcontrol::config::DEFAULT_PORT;
use vmcontrol::{AgentConfig, Server, VmAgent};

#[derive(Parser)]
#[command(name = "vmcontrol")]
#[command(about = "TCP control agent that reverts a target VM to a known-good snapshot", long_about = None)]
#[command(version)]
struct Cli {
    /// Id of the virtual machine to control
    #[arg(short = 'x', long)]
    vm_id: String,

    /// Id of the snapshot used when a request does not name one
    #[arg(short = 's', long)]
    snap_id: String,

    /// Log output level, increase for more verbosity
    #[arg(short = 'l', long, default_value_t = 1)]
    log_level: u8,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// TCP port to bind this agent to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

/// Map the agent's integer verbosity onto a tracing filter.
fn filter_directive(log_level: u8) -> &'static str {
    match log_level {
        0 | 1 => "vmcontrol=info",
        2..=4 => "vmcontrol=debug",
        _ => "vmcontrol=trace",
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(filter_directive(cli.log_level).parse()?),
        )
        .init();

    let config = AgentConfig {
        host: cli.host,
        port: cli.port,
        vm_id: cli.vm_id,
        snap_id: cli.snap_id,
        log_level: cli.log_level,
    };
    config.validate()?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let agent = VmAgent::new(config);
    Server::new(agent, addr).run().await?;

    Ok(())
}
