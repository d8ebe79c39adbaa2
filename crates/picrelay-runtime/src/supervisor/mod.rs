//! Supervisor for the fixed set of named long-running services.
//!
//! Tracks at most one running process per name, drains child output into
//! tracing, and clears tracked state through an exit observer whenever a
//! process terminates, whether or not a stop was requested. Lifecycle
//! changes are broadcast so the orchestrator and tests can watch them.

pub mod shutdown;

use picrelay_core::error::ProcessError;
use picrelay_core::events::ProcessEvent;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Broadcast capacity for lifecycle events.
const EVENT_CAPACITY: usize = 64;

/// Executable reference for a supervised service.
#[derive(Debug, Clone)]
pub struct ServiceCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ServiceCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Result of a `start` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new process was spawned and is now tracked.
    Started(u32),
    /// A process with that name is already tracked as running.
    AlreadyRunning,
}

/// A supervised process tracked by name.
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    pub name: String,
    pub pid: u32,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Supervisor instance owning all tracked process state.
///
/// State lives on the instance, never in process-wide globals; clone the
/// `Arc` wrapper if shared access is needed.
pub struct Supervisor {
    processes: Arc<Mutex<HashMap<String, ManagedProcess>>>,
    /// Names with a stop in progress, so the exit observer can tell a
    /// requested stop from a crash.
    stopping: Arc<Mutex<HashSet<String>>>,
    events: broadcast::Sender<ProcessEvent>,
}

impl Supervisor {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            processes: Arc::new(Mutex::new(HashMap::new())),
            stopping: Arc::new(Mutex::new(HashSet::new())),
            events,
        }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessEvent> {
        self.events.subscribe()
    }

    /// Whether a process with this name is tracked as running.
    pub fn is_running(&self, name: &str) -> bool {
        lock(&self.processes).contains_key(name)
    }

    /// Snapshot of all tracked processes.
    pub fn list(&self) -> Vec<ManagedProcess> {
        lock(&self.processes).values().cloned().collect()
    }

    /// Start a named service.
    ///
    /// A duplicate start is a no-op: it logs a warning and returns
    /// [`StartOutcome::AlreadyRunning`]. Spawn failure is logged and
    /// surfaces as an error; the supervisor itself stays usable and a
    /// later retry may succeed.
    pub fn start(
        &self,
        name: &str,
        command: &ServiceCommand,
    ) -> Result<StartOutcome, ProcessError> {
        if self.is_running(name) {
            warn!(service = %name, "service is already started");
            return Ok(StartOutcome::AlreadyRunning);
        }

        info!(service = %name, program = %command.program.display(), "starting service");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group so stop() can signal the whole tree.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| {
            error!(service = %name, error = %e, "failed to spawn service");
            ProcessError::SpawnFailed(format!("{name}: {e}"))
        })?;
        let pid = child
            .id()
            .ok_or_else(|| ProcessError::SpawnFailed(format!("{name}: child has no PID")))?;

        spawn_output_readers(&mut child, name);

        lock(&self.processes).insert(
            name.to_string(),
            ManagedProcess {
                name: name.to_string(),
                pid,
                started_at: chrono::Utc::now(),
            },
        );
        let _ = self.events.send(ProcessEvent::started(name, pid));

        self.spawn_exit_observer(name.to_string(), pid, child);
        Ok(StartOutcome::Started(pid))
    }

    /// Observer that reaps the child and clears tracked state when the
    /// process terminates for any reason.
    fn spawn_exit_observer(&self, name: String, pid: u32, mut child: Child) {
        let processes = Arc::clone(&self.processes);
        let stopping = Arc::clone(&self.stopping);
        let events = self.events.clone();
        tokio::spawn(async move {
            let status = child.wait().await;

            // Only clear the entry if it is still ours; a crash followed
            // by a restart must not have its fresh entry removed.
            {
                let mut map = lock(&processes);
                if map.get(&name).is_some_and(|p| p.pid == pid) {
                    map.remove(&name);
                }
            }
            let was_stopping = lock(&stopping).remove(&name);

            match status {
                Ok(code) if was_stopping => {
                    info!(service = %name, pid, ?code, "service stopped");
                    let _ = events.send(ProcessEvent::stopped(&name, Some(pid)));
                }
                Ok(code) => {
                    warn!(service = %name, pid, ?code, "service exited unexpectedly");
                    let _ = events.send(ProcessEvent::crashed(&name, Some(pid)));
                }
                Err(e) => {
                    error!(service = %name, pid, error = %e, "failed to reap service");
                    let _ = events.send(ProcessEvent::crashed(&name, Some(pid)));
                }
            }
        });
    }

    /// Stop a named service, signalling its entire process tree.
    ///
    /// Stopping a service that has already exited succeeds silently.
    pub async fn stop(&self, name: &str) -> Result<(), ProcessError> {
        let pid = lock(&self.processes).get(name).map(|p| p.pid);
        let Some(pid) = pid else {
            info!(service = %name, "service already exited");
            return Ok(());
        };

        lock(&self.stopping).insert(name.to_string());
        debug!(service = %name, pid, "stopping service tree");

        let result = shutdown::terminate_tree(pid).await;

        // Wait for the exit observer to reap and clear the entry.
        for _ in 0..50 {
            if !self.is_running(name) {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }
        if self.is_running(name) {
            warn!(service = %name, pid, "tracked state not cleared after stop");
        }
        lock(&self.stopping).remove(name);

        result.map_err(|e| ProcessError::StopFailed(format!("{name}: {e}")))
    }

    /// Stop all tracked services, honoring the given dependency order
    /// first, then any stragglers.
    pub async fn stop_all(&self, order: &[&str]) -> Result<(), ProcessError> {
        for name in order {
            self.stop(name).await?;
        }
        let remaining: Vec<String> = lock(&self.processes).keys().cloned().collect();
        for name in remaining {
            self.stop(&name).await?;
        }
        Ok(())
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Drain child stdout/stderr into tracing, line by line.
fn spawn_output_readers(child: &mut Child, name: &str) {
    if let Some(stdout) = child.stdout.take() {
        let service = name.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(target: "picrelay::service", service = %service, "{line}");
            }
            debug!(service = %service, "stdout reader exiting");
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let service = name.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(target: "picrelay::service", service = %service, "{line}");
            }
            debug!(service = %service, "stderr reader exiting");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picrelay_core::events::ProcessEventKind;
    use tokio::time::timeout;

    fn sleep_cmd() -> ServiceCommand {
        ServiceCommand::new("sleep").with_arg("30")
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn double_start_tracks_exactly_one_process() {
        let supervisor = Supervisor::new();
        let first = supervisor.start("svc", &sleep_cmd()).unwrap();
        assert!(matches!(first, StartOutcome::Started(_)));

        let second = supervisor.start("svc", &sleep_cmd()).unwrap();
        assert_eq!(second, StartOutcome::AlreadyRunning);
        assert_eq!(supervisor.list().len(), 1);

        supervisor.stop("svc").await.unwrap();
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn stop_clears_tracked_state() {
        let supervisor = Supervisor::new();
        supervisor.start("svc", &sleep_cmd()).unwrap();
        assert!(supervisor.is_running("svc"));

        supervisor.stop("svc").await.unwrap();
        assert!(!supervisor.is_running("svc"));
    }

    #[tokio::test]
    async fn stop_of_unknown_name_succeeds_silently() {
        let supervisor = Supervisor::new();
        assert!(supervisor.stop("never-started").await.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn stop_after_natural_exit_succeeds() {
        let supervisor = Supervisor::new();
        let cmd = ServiceCommand::new("true");
        supervisor.start("short", &cmd).unwrap();

        // Let the exit observer clear the state.
        for _ in 0..50 {
            if !supervisor.is_running("short") {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }

        assert!(supervisor.stop("short").await.is_ok());
    }

    #[tokio::test]
    async fn spawn_failure_surfaces_as_not_started() {
        let supervisor = Supervisor::new();
        let cmd = ServiceCommand::new("/nonexistent/picrelay-service");
        let result = supervisor.start("broken", &cmd);
        assert!(matches!(result, Err(ProcessError::SpawnFailed(_))));
        assert!(!supervisor.is_running("broken"));

        // The supervisor stays alive and can still start other services.
        assert!(supervisor.stop("broken").await.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn unexpected_exit_broadcasts_crashed() {
        let supervisor = Supervisor::new();
        let mut events = supervisor.subscribe();

        let cmd = ServiceCommand::new("sh").with_args(["-c", "exit 3"]);
        supervisor.start("flaky", &cmd).unwrap();

        // Started, then crashed.
        let started = timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(started.kind, ProcessEventKind::Started);

        let exited = timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(exited.kind, ProcessEventKind::Crashed);
        assert!(!supervisor.is_running("flaky"));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn stop_all_honors_order_then_stragglers() {
        let supervisor = Supervisor::new();
        supervisor.start("ingest", &sleep_cmd()).unwrap();
        supervisor.start("web", &sleep_cmd()).unwrap();
        supervisor.start("extra", &sleep_cmd()).unwrap();

        supervisor.stop_all(&["ingest", "web"]).await.unwrap();
        assert!(supervisor.list().is_empty());
    }
}
