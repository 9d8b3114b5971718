use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::{Duration, Instant};

pub struct ServerProcess {
    child: Child,
    pub addr: SocketAddr,
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        self.child.kill().ok();
    }
}

/// Reserve `count` free TCP ports by binding to port 0 for each, then
/// releasing them all at once.  Holding all listeners alive until the ports
/// are collected prevents the same port from being issued twice and reduces
/// the TOCTOU window between releasing and the caller binding.
pub fn pick_free_ports(count: usize) -> Vec<u16> {
    let listeners: Vec<std::net::TcpListener> = (0..count)
        .map(|_| std::net::TcpListener::bind("127.0.0.1:0").unwrap())
        .collect();
    let ports = listeners.iter().map(|l| l.local_addr().unwrap().port()).collect();
    drop(listeners);
    ports
}

/// Return the path to the `greetrpc-server` binary that sits alongside this
/// executable in `target/debug/` (or `target/debug/deps/` when run as a test).
fn server_binary_path() -> PathBuf {
    let mut path = std::env::current_exe().expect("cannot determine own executable path");
    path.pop(); // remove own filename
    if path.file_name().map(|n| n == "deps").unwrap_or(false) {
        path.pop(); // step out of target/debug/deps → target/debug/
    }
    path.push("greetrpc-server");
    path
}

const READY_TIMEOUT: Duration = Duration::from_secs(30);

impl ServerProcess {
    /// Build the `greetrpc-server` binary, spawn it on a free port with the
    /// given extra flags, wait until it accepts TCP connections, and return
    /// the live process handle.
    ///
    /// Returns `Err` if the build fails, the process cannot be spawned, or
    /// the readiness deadline elapses.  The caller should map this error to
    /// exit code 3 as documented in the CLI spec.
    pub fn build_and_spawn(extra_args: &[&str]) -> Result<Self, String> {
        let status = Command::new("cargo")
            .args(["build", "-p", "greetrpc-server"])
            .status()
            .map_err(|e| format!("Failed to invoke cargo build: {e}"))?;
        if !status.success() {
            return Err(format!("cargo build -p greetrpc-server failed: {status}"));
        }

        let port = pick_free_ports(1)[0];
        let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();

        let server_bin = server_binary_path();
        let listen = addr.to_string();
        let mut args = vec!["--listen", listen.as_str()];
        args.extend_from_slice(extra_args);

        let child = Command::new(&server_bin)
            .args(&args)
            .spawn()
            .map_err(|e| format!("Failed to spawn greetrpc-server: {e}"))?;
        let server = ServerProcess { child, addr };

        // If the poll fails, `server` drops here, killing the process.
        let deadline = Instant::now() + READY_TIMEOUT;
        poll_until_ready(server.addr, deadline)
            .map_err(|e| format!("Server not ready within timeout: {e}"))?;

        Ok(server)
    }
}

/// Poll `addr` with a TCP connect attempt until the connection succeeds
/// (server is accepting connections) or `deadline` is reached.
///
/// A successful TCP connection is sufficient to confirm the HTTP server is
/// ready: our axum-based server starts accepting the moment it binds, so
/// a successful `connect` implies it will also answer HTTP requests.
fn poll_until_ready(addr: SocketAddr, deadline: Instant) -> Result<(), String> {
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(format!("timed out waiting for {addr}"));
        }
        let probe = Duration::min(remaining, Duration::from_millis(200));
        if TcpStream::connect_timeout(&addr, probe).is_ok() {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
