use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::browser::discovery::{ControlCandidate, ControlSource, filter_candidates};
use crate::schema::schema_model::RawControl;
use crate::service::error::ExtractError;

/// Extra time granted on top of the page timeout before the helper itself is
/// considered hung.
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// How long to wait for the helper to start Chromium and report ready.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How long `quit` waits for the helper to close the browser and exit
/// before killing it.
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

const QUIT_POLL: Duration = Duration::from_millis(20);

/// Request sent to the form helper over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrowserRequest {
    Navigate {
        cmd: &'static str,
        url: String,
        wait_for: String,
        timeout_ms: u64,
    },
    ListControls {
        cmd: &'static str,
    },
    Quit {
        cmd: &'static str,
    },
}

impl BrowserRequest {
    pub fn navigate(url: &str, wait_for: &str, timeout: Duration) -> Self {
        BrowserRequest::Navigate {
            cmd: "navigate",
            url: url.to_string(),
            wait_for: wait_for.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn list_controls() -> Self {
        BrowserRequest::ListControls { cmd: "list_controls" }
    }

    pub fn quit() -> Self {
        BrowserRequest::Quit { cmd: "quit" }
    }
}

/// Response read from the form helper over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Set when the failure was a navigation or wait timeout.
    #[serde(default)]
    pub timeout: Option<bool>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub controls: Option<Vec<ControlCandidate>>,
}

/// How to start the Node.js form helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    pub node: String,
    pub script: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            script: "node/form_server.js".to_string(),
        }
    }
}

// ============================================================================
// BrowserSession
// ============================================================================

/// A headless Chromium session driven through the Node.js form helper.
///
/// Commands go out as NDJSON on stdin; replies come back on stdout and are
/// read on a background thread so every wait can be bounded. The helper
/// process is shut down when the session is dropped.
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<std::io::Result<String>>,
    script: String,
    closed: bool,
}

impl BrowserSession {
    /// Spawn the helper and wait for its ready signal.
    pub fn launch(config: &BrowserConfig) -> Result<Self, ExtractError> {
        let mut child = Command::new(&config.node)
            .arg(&config.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExtractError::SubprocessSpawn {
                script: config.script.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExtractError::Session("failed to capture helper stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractError::Session("failed to capture helper stdout".into()))?;

        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    debug!(target: "form_helper", "{}", line);
                }
            });
        }

        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });

        let mut session = BrowserSession {
            child,
            stdin,
            lines,
            script: config.script.clone(),
            closed: false,
        };

        let response = session.read_response(LAUNCH_TIMEOUT)?;
        if !response.ok || response.ready != Some(true) {
            return Err(ExtractError::Session(format!(
                "{} did not send a ready signal",
                session.script
            )));
        }

        debug!(script = %session.script, "browser session ready");
        Ok(session)
    }

    fn write_request(&mut self, request: &BrowserRequest) -> Result<(), ExtractError> {
        let json = serde_json::to_string(request).map_err(|e| ExtractError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| ExtractError::Session(format!("failed to write to helper stdin: {}", e)))
    }

    fn read_response(&mut self, wait: Duration) -> Result<BrowserResponse, ExtractError> {
        let line = match self.lines.recv_timeout(wait) {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                return Err(ExtractError::Session(format!("failed to read helper stdout: {}", e)));
            }
            Err(RecvTimeoutError::Timeout) => {
                return Err(ExtractError::NoReply {
                    script: self.script.clone(),
                    waited_secs: wait.as_secs(),
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ExtractError::SubprocessExited {
                    script: self.script.clone(),
                    status: self.child.try_wait().ok().flatten(),
                });
            }
        };

        serde_json::from_str(line.trim()).map_err(|e| ExtractError::JsonParse {
            context: format!("{} response", self.script),
            source: e,
        })
    }

    /// Send a request and verify it succeeded.
    fn send_ok(
        &mut self,
        request: &BrowserRequest,
        command_name: &str,
        wait: Duration,
    ) -> Result<BrowserResponse, ExtractError> {
        self.write_request(request)?;
        let response = self.read_response(wait)?;
        if !response.ok {
            let error = response.error.unwrap_or_else(|| "unknown error".into());
            return Err(ExtractError::Failed(format!("{}: {}", command_name, error)));
        }
        Ok(response)
    }

    /// Load `url` and wait until `wait_for` matches, both within `timeout`.
    pub fn navigate(&mut self, url: &str, wait_for: &str, timeout: Duration) -> Result<(), ExtractError> {
        let timed_out = || ExtractError::Timeout {
            url: url.to_string(),
            timeout_secs: timeout.as_secs(),
        };

        let request = BrowserRequest::navigate(url, wait_for, timeout);
        self.write_request(&request)?;
        let response = match self.read_response(timeout + REPLY_GRACE) {
            Ok(r) => r,
            Err(ExtractError::NoReply { .. }) => return Err(timed_out()),
            Err(e) => return Err(e),
        };

        if response.ok {
            return Ok(());
        }
        if response.timeout == Some(true) {
            return Err(timed_out());
        }
        Err(ExtractError::Failed(format!(
            "navigate: {}",
            response.error.unwrap_or_else(|| "unknown error".into())
        )))
    }

    /// Every `input`/`select` on the current page, filtered into raw controls.
    pub fn list_controls(&mut self, wait: Duration) -> Result<Vec<RawControl>, ExtractError> {
        let request = BrowserRequest::list_controls();
        let response = self.send_ok(&request, "list_controls", wait)?;
        let candidates = response.controls.ok_or_else(|| {
            ExtractError::Session("no controls in list_controls response".into())
        })?;

        let found = candidates.len();
        let controls = filter_candidates(candidates);
        debug!(found, kept = controls.len(), "controls collected from browser");
        Ok(controls)
    }

    /// Close the browser and reap the helper. Safe to call more than once.
    pub fn quit(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let deadline = Instant::now() + QUIT_TIMEOUT;
        if self.write_request(&BrowserRequest::quit()).is_ok() {
            let _ = self.read_response(QUIT_TIMEOUT);
        }

        // The helper exits on its own once the browser is closed; only a
        // helper still running at the deadline is killed.
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(script = %self.script, %status, "browser session closed");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(QUIT_POLL),
                _ => break,
            }
        }
        warn!(script = %self.script, "form helper did not exit, killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.quit();
    }
}

// ============================================================================
// Browser-backed control source
// ============================================================================

/// Control discovery through a fresh headless browser per extraction.
pub struct BrowserControlSource {
    config: BrowserConfig,
    url: String,
    form_selector: String,
    timeout: Duration,
}

impl BrowserControlSource {
    pub fn new(config: BrowserConfig, url: &str, form_selector: &str, timeout: Duration) -> Self {
        Self {
            config,
            url: url.to_string(),
            form_selector: form_selector.to_string(),
            timeout,
        }
    }
}

impl ControlSource for BrowserControlSource {
    fn list_controls(&mut self) -> Result<Vec<RawControl>, ExtractError> {
        info!(url = %self.url, "launching browser for extraction");
        // Dropping the session on any early return shuts the browser down.
        let mut session = BrowserSession::launch(&self.config)?;
        session.navigate(&self.url, &self.form_selector, self.timeout)?;
        let controls = session.list_controls(self.timeout)?;
        session.quit();

        if controls.is_empty() {
            warn!(url = %self.url, "form loaded but no usable controls were found");
        }
        Ok(controls)
    }
}
