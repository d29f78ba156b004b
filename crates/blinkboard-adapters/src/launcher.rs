//! HTTP page that starts the detection process.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Reply sent when the detection process was spawned.
pub const STARTED: &str = "Code execution started.";

/// Reply sent when spawning failed.
pub const START_FAILED: &str = "Failed to start detection process.";

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Starts a detection process and forgets about it.
pub trait Launcher: Send + Sync {
    /// Spawns the process, returning its pid.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be spawned.
    fn launch(&self) -> io::Result<u32>;
}

/// Spawns `program args...` as a child sharing the server's stdout and stderr.
///
/// Each child is reaped on a background thread so finished processes do not
/// linger as zombies.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessLauncher {
    /// Creates a launcher for `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self) -> io::Result<u32> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;
        let pid = child.id();

        std::thread::Builder::new()
            .name(format!("reap-{pid}"))
            .spawn(move || match child.wait() {
                Ok(status) if status.success() => {
                    debug!("Detection process {pid} exited");
                }
                Ok(status) => warn!("Detection process {pid} exited with {status}"),
                Err(e) => warn!("Failed to wait for detection process {pid}: {e}"),
            })?;

        Ok(pid)
    }
}

/// Builds the launcher routes: `GET /` and `POST /runcode`.
pub fn router(launcher: Arc<dyn Launcher>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/runcode", post(run_code))
        .layer(TraceLayer::new_for_http())
        .with_state(launcher)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn run_code(State(launcher): State<Arc<dyn Launcher>>) -> (StatusCode, &'static str) {
    match launcher.launch() {
        Ok(pid) => {
            info!("Started detection process {pid}");
            (StatusCode::OK, STARTED)
        }
        Err(e) => {
            error!("Failed to spawn detection process: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, START_FAILED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_posts_to_runcode() {
        assert!(INDEX_HTML.contains("/runcode"));
        assert!(INDEX_HTML.contains("method: \"POST\""));
    }

    #[test]
    fn test_missing_program_fails_to_launch() {
        let launcher = ProcessLauncher::new("/nonexistent/blinkboard", vec!["run".into()]);
        assert!(launcher.launch().is_err());
    }

    #[cfg(target_os = "linux")]
    fn process_state(pid: u32) -> Option<char> {
        let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
        // Field 3, after the parenthesised command name.
        stat.rsplit_once(')')?.1.trim_start().chars().next()
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[allow(clippy::expect_used)]
    fn test_failed_child_is_reaped() {
        use std::time::{Duration, Instant};

        let launcher = ProcessLauncher::new(
            "/bin/sh",
            vec!["-c".into(), "echo 'error: Missing model files' >&2; exit 1".into()],
        );
        let pid = launcher.launch().expect("spawn sh");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut state = process_state(pid);
        while state.is_some() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
            state = process_state(pid);
        }

        assert_eq!(state, None, "pid {pid} still present in state {state:?}");
    }
}
