//! End-to-end tests: real TCP socket, JSON-lines protocol, scripted runner
//! standing in for the hypervisor CLI.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use vmcontrol::exec::{CommandExecutor, CommandRunner, RetryPolicy};
use vmcontrol::probe::FixedDelayProbe;
use vmcontrol::{AgentConfig, Result, Server, VmAgent};

/// Records every command and answers with canned hypervisor output.
#[derive(Clone, Default)]
struct ScriptedRunner {
    commands: Arc<Mutex<Vec<String>>>,
    close_failures_left: Arc<Mutex<u32>>,
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &str) -> Result<String> {
        self.commands.lock().unwrap().push(command.to_string());

        let mut failures = self.close_failures_left.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Ok("close failed in file object destructor\n".to_string());
        }

        if command.contains("getallvms") {
            Ok("Vmid Name\n12   target\n".to_string())
        } else if command.contains("snapshot.revert") {
            Ok(String::new())
        } else {
            Ok(format!("ran: {command}\n"))
        }
    }
}

async fn start_server(runner: ScriptedRunner) -> SocketAddr {
    let config = AgentConfig {
        vm_id: "12".into(),
        snap_id: "3".into(),
        ..Default::default()
    };
    let executor = CommandExecutor::with_runner(
        Box::new(runner),
        RetryPolicy {
            max_attempts: None,
            delay: Duration::from_millis(5),
        },
    );
    let probe = FixedDelayProbe::new(Duration::from_millis(5));
    let agent = VmAgent::with_parts(config, executor, Box::new(probe));

    let server = Server::new(agent, "127.0.0.1:0".parse().unwrap());
    let (addr, serve) = server.bind_ephemeral().await.unwrap();
    tokio::spawn(serve);
    addr
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn call(&mut self, request: &str) -> serde_json::Value {
        self.writer
            .write_all(format!("{request}\n").as_bytes())
            .await
            .unwrap();
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }
}

#[tokio::test]
async fn test_alive() {
    let addr = start_server(ScriptedRunner::default()).await;
    let mut client = Client::connect(addr).await;

    let resp = client.call(r#"{"method":"alive"}"#).await;
    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["alive"], true);
}

#[tokio::test]
async fn test_list_returns_raw_output() {
    let addr = start_server(ScriptedRunner::default()).await;
    let mut client = Client::connect(addr).await;

    let resp = client.call(r#"{"method":"list"}"#).await;
    assert_eq!(resp["status"], "ok");
    assert!(resp["output"].as_str().unwrap().contains("target"));
}

#[tokio::test]
async fn test_revert_defaults_and_overrides_snapshot() {
    let runner = ScriptedRunner::default();
    let commands = runner.commands.clone();
    let addr = start_server(runner).await;
    let mut client = Client::connect(addr).await;

    let resp = client.call(r#"{"method":"revertToSnapshot"}"#).await;
    assert_eq!(resp["status"], "ok");

    let resp = client.call(r#"{"method":"revertToSnapshot","snap_id":7}"#).await;
    assert_eq!(resp["status"], "ok");

    let commands = commands.lock().unwrap();
    assert_eq!(
        *commands,
        vec![
            "vim-cmd vmsvc/snapshot.revert 12 3 0".to_string(),
            "vim-cmd vmsvc/snapshot.revert 12 7 0".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_snapshot_command_shape() {
    let runner = ScriptedRunner::default();
    let commands = runner.commands.clone();
    let addr = start_server(runner).await;
    let mut client = Client::connect(addr).await;

    let resp = client
        .call(r#"{"method":"snapshot","snap_name":"demo"}"#)
        .await;
    assert_eq!(resp["status"], "ok");

    assert_eq!(
        commands.lock().unwrap().as_slice(),
        ["vim-cmd vmsvc/snapshot.create 12 'demo' Description 1".to_string()]
    );
}

#[tokio::test]
async fn test_restart_target_reverts_then_blocks_until_ready() {
    let runner = ScriptedRunner::default();
    let commands = runner.commands.clone();
    let addr = start_server(runner).await;
    let mut client = Client::connect(addr).await;

    let resp = client.call(r#"{"method":"restartTarget"}"#).await;
    assert_eq!(resp["status"], "ok");

    // the revert happened before the call returned
    assert_eq!(
        commands.lock().unwrap().as_slice(),
        ["vim-cmd vmsvc/snapshot.revert 12 3 0".to_string()]
    );
}

#[tokio::test]
async fn test_transient_failure_retried_behind_the_protocol() {
    let runner = ScriptedRunner {
        commands: Arc::new(Mutex::new(Vec::new())),
        close_failures_left: Arc::new(Mutex::new(2)),
    };
    let commands = runner.commands.clone();
    let addr = start_server(runner).await;
    let mut client = Client::connect(addr).await;

    let resp = client.call(r#"{"method":"reset"}"#).await;
    assert_eq!(resp["status"], "ok");
    assert!(resp["output"].as_str().unwrap().starts_with("ran:"));

    // two transient failures plus the successful attempt
    assert_eq!(commands.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_malformed_request_keeps_connection_usable() {
    let addr = start_server(ScriptedRunner::default()).await;
    let mut client = Client::connect(addr).await;

    let resp = client.call(r#"{"method":"noSuchMethod"}"#).await;
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["error"], "BadRequest");

    let resp = client.call("not json at all").await;
    assert_eq!(resp["status"], "error");

    let resp = client.call(r#"{"method":"alive"}"#).await;
    assert_eq!(resp["status"], "ok");
}

#[tokio::test]
async fn test_wait_completes() {
    let addr = start_server(ScriptedRunner::default()).await;
    let mut client = Client::connect(addr).await;

    let resp = client.call(r#"{"method":"wait"}"#).await;
    assert_eq!(resp, serde_json::json!({"status":"ok"}));
}
