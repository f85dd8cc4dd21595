//! TCP control server
//!
//! Accepts connections, reads newline-delimited JSON requests, and writes one
//! response line per request. Agent operations block (the retry loop and the
//! readiness wait have no upper bound), so each request runs on the blocking
//! pool and is never cancelled once started.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::types::{Request, Response};
use crate::agent::VmAgent;

/// Control server for one agent instance.
pub struct Server {
    agent: Arc<VmAgent>,
    addr: SocketAddr,
}

impl Server {
    pub fn new(agent: VmAgent, addr: SocketAddr) -> Self {
        Self {
            agent: Arc::new(agent),
            addr,
        }
    }

    /// Accept connections and serve until the process is killed.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("control server listening on {}", self.addr);
        self.serve(listener).await
    }

    /// Bind to an OS-assigned port and return it along with the serve future.
    /// Used by tests; `run` is the production entry point.
    pub async fn bind_ephemeral(self) -> std::io::Result<(SocketAddr, impl std::future::Future<Output = std::io::Result<()>>)> {
        let listener = TcpListener::bind((self.addr.ip(), 0)).await?;
        let addr = listener.local_addr()?;
        Ok((addr, self.serve(listener)))
    }

    async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!("connection from {peer}");
            let agent = self.agent.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, agent).await {
                    warn!("connection from {peer} closed with error: {e}");
                }
            });
        }
    }
}

async fn handle_connection(stream: TcpStream, agent: Arc<VmAgent>) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatch(agent.clone(), request).await,
            Err(e) => {
                warn!("rejecting malformed request: {e}");
                Response::error("BadRequest", format!("invalid request: {e}"))
            }
        };

        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        writer.write_all(&payload).await?;
    }

    debug!("connection closed by client");
    Ok(())
}

async fn dispatch(agent: Arc<VmAgent>, request: Request) -> Response {
    let handle = tokio::task::spawn_blocking(move || match request {
        Request::Alive => Response::alive(agent.alive()),
        Request::Start => Response::from_output(agent.start()),
        Request::Stop => Response::from_output(agent.stop()),
        Request::Suspend => Response::from_output(agent.suspend()),
        Request::Reset => Response::from_output(agent.reset()),
        Request::List => Response::from_output(agent.list()),
        Request::ListSnapshots => Response::from_output(agent.list_snapshots()),
        Request::Snapshot { snap_name } => Response::from_output(agent.snapshot(&snap_name)),
        Request::DeleteSnapshot { snap_id } => {
            let snap_id = snap_id.map(|id| id.as_string());
            Response::from_output(agent.delete_snapshot(snap_id.as_deref()))
        }
        Request::RevertToSnapshot { snap_id } => {
            let snap_id = snap_id.map(|id| id.as_string());
            Response::from_output(agent.revert_to_snapshot(snap_id.as_deref()))
        }
        Request::RestartTarget => Response::from_unit(agent.restart_target()),
        Request::Wait => {
            agent.wait();
            Response::done()
        }
    });

    match handle.await {
        Ok(response) => response,
        Err(e) => Response::error("Internal", format!("operation aborted: {e}")),
    }
}
