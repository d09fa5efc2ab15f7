use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

/// Nothing listens on the discard port; requests sent here fail fast.
#[allow(dead_code)]
pub const OFFLINE_API_BASE: &str = "http://127.0.0.1:9/repos/tailwindlabs/tailwindcss";

#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub project_dir: PathBuf,
    pub install_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project_dir = temp_dir.path().join("project");
        let install_dir = temp_dir.path().join("cli");
        std::fs::create_dir_all(&project_dir).expect("Failed to create project dir");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_tailwind-build"));

        Self {
            _temp_dir: temp_dir,
            project_dir,
            install_dir,
            bin_path,
        }
    }

    /// Command running in the project directory with an isolated install root
    /// and no reachable release API.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.current_dir(&self.project_dir);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_DATA_HOME", self._temp_dir.path().join("data"));
        cmd.env("TAILWIND_INSTALL_PATH", &self.install_dir);
        cmd.env("TAILWIND_API_BASE", OFFLINE_API_BASE);
        for key in [
            "TAILWIND_VERSION",
            "TAILWIND_LOCK_FILE",
            "TAILWIND_MINIFY",
            "TAILWIND_HTTP_TIMEOUT_SECS",
            "GITHUB_TOKEN",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }

    pub fn project_file(&self, relative: &str) -> PathBuf {
        self.project_dir.join(relative)
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.status.success() {
            panic!(
                "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}

/// Write an executable shell script.
#[cfg(unix)]
#[allow(dead_code)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}

#[derive(Clone)]
struct Route {
    status: u16,
    body: Vec<u8>,
    declared_length: Option<usize>,
}

/// Minimal HTTP/1.1 server standing in for the GitHub release API.
///
/// Every connection serves one request and is closed. Unknown paths get 404.
#[allow(dead_code)]
pub struct ReleaseServer {
    addr: String,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    requests: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl ReleaseServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
        let addr = listener.local_addr().unwrap().to_string();
        let routes: Arc<Mutex<HashMap<String, Route>>> = Arc::default();
        let requests = Arc::new(AtomicUsize::new(0));

        let (server_routes, counter) = (routes.clone(), requests.clone());
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                counter.fetch_add(1, Ordering::SeqCst);
                serve(stream, &server_routes);
            }
        });

        Self {
            addr,
            routes,
            requests,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api_base(&self) -> String {
        format!("{}/repos/tailwindlabs/tailwindcss", self.base_url())
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn route(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.insert(path, status, body.into(), None);
    }

    /// Serve `body` while announcing `declared_length` bytes.
    pub fn route_truncated(&self, path: &str, body: impl Into<Vec<u8>>, declared_length: usize) {
        self.insert(path, 200, body.into(), Some(declared_length));
    }

    /// Publish a release whose assets are served from `/download/{tag}/{name}`.
    pub fn release(&self, tag: &str, assets: &[(&str, &[u8])]) {
        let listed: Vec<serde_json::Value> = assets
            .iter()
            .map(|(name, _)| {
                serde_json::json!({
                    "name": name,
                    "browser_download_url":
                        format!("{}/download/{}/{}", self.base_url(), tag, name),
                    "size": 0,
                })
            })
            .collect();
        let release = serde_json::json!({ "tag_name": tag, "assets": listed }).to_string();

        self.route(&format!("/repos/tailwindlabs/tailwindcss/releases/tags/{}", tag), 200, release);
        for (name, bytes) in assets {
            self.route(&format!("/download/{}/{}", tag, name), 200, bytes.to_vec());
        }
    }

    fn insert(&self, path: &str, status: u16, body: Vec<u8>, declared_length: Option<usize>) {
        self.routes.lock().unwrap().insert(
            path.to_string(),
            Route {
                status,
                body,
                declared_length,
            },
        );
    }
}

fn serve(stream: TcpStream, routes: &Mutex<HashMap<String, Route>>) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) | Err(_) => break,
            Ok(_) if header == "\r\n" || header == "\n" => break,
            Ok(_) => {}
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
    let route = routes.lock().unwrap().get(&path).cloned().unwrap_or(Route {
        status: 404,
        body: br#"{"message":"Not Found"}"#.to_vec(),
        declared_length: None,
    });

    let reason = if route.status == 200 { "OK" } else { "Not Found" };
    let length = route.declared_length.unwrap_or(route.body.len());
    let head = format!(
        concat!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n",
            "Content-Type: application/octet-stream\r\nConnection: close\r\n\r\n"
        ),
        route.status, reason, length
    );

    let mut stream = stream;
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&route.body);
    let _ = stream.flush();
}
