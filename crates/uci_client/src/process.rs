//! The engine process handle: a child process spoken to over stdin/stdout.
//!
//! Lines coming back from the engine are read on a dedicated thread and
//! handed over through a channel. That lets every wait carry a deadline, so a
//! hung or non-UCI binary surfaces as [`EngineError::Timeout`] instead of
//! blocking the caller forever.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command as ProcessCommand, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use cozy_chess::{Board, Move};
use tracing::{debug, info, trace, warn};

use crate::protocol::{parse_move, Command, Response};
use crate::{Engine, EngineError, SearchLimits};

/// How long a child gets to exit on its own after `quit`.
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// How to launch and initialise an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Path to the engine binary
    pub path: PathBuf,
    /// Extra command line arguments
    pub args: Vec<String>,
    /// `setoption` pairs sent after `uciok`
    pub options: Vec<(String, String)>,
    /// Deadline for `uciok` / `readyok`
    pub handshake_timeout: Duration,
    /// Slack on top of the move time before a `go` is considered hung
    pub move_grace: Duration,
}

impl EngineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            options: Vec::new(),
            handshake_timeout: Duration::from_secs(5),
            move_grace: Duration::from_secs(5),
        }
    }
}

/// A running UCI engine.
///
/// The process is owned exclusively; dropping the handle sends `quit` and
/// kills the child if it does not exit in time.
pub struct UciEngine {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    lines: Receiver<String>,
    name: String,
    handshake_timeout: Duration,
    move_grace: Duration,
}

impl std::fmt::Debug for UciEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UciEngine")
            .field("name", &self.name)
            .field("pid", &self.child.id())
            .finish()
    }
}

impl UciEngine {
    /// Start the engine and run the `uci` / `isready` handshake.
    pub fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut child = ProcessCommand::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: config.path.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdout unavailable".to_string()))?;

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("uci-reader".to_string())
            .spawn(move || {
                let mut reader = BufReader::new(stdout);
                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                    // Engines are not always UTF-8 clean (e.g. Latin-1 author names).
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })?;

        let fallback_name = config
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "engine".to_string());

        let mut engine = Self {
            child,
            stdin: BufWriter::new(stdin),
            lines: rx,
            name: fallback_name,
            handshake_timeout: config.handshake_timeout,
            move_grace: config.move_grace,
        };
        engine.handshake(&config.options)?;

        info!(engine = %engine.name, pid = engine.child.id(), "engine ready");
        Ok(engine)
    }

    fn handshake(&mut self, options: &[(String, String)]) -> Result<(), EngineError> {
        self.send(Command::Uci)?;
        let timeout = self.handshake_timeout;
        let mut reported_name = None;
        self.wait_for("uciok", timeout, |resp| match resp {
            Response::IdName(name) => {
                reported_name = Some(name);
                None
            }
            Response::UciOk => Some(()),
            _ => None,
        })?;
        if let Some(name) = reported_name {
            self.name = name;
        }

        for (name, value) in options {
            self.send(Command::SetOption { name, value })?;
        }
        self.sync()
    }

    /// `isready` / `readyok` round trip.
    fn sync(&mut self) -> Result<(), EngineError> {
        self.send(Command::IsReady)?;
        let timeout = self.handshake_timeout;
        self.wait_for("readyok", timeout, |resp| {
            (resp == Response::ReadyOk).then_some(())
        })
    }

    fn send(&mut self, command: Command<'_>) -> Result<(), EngineError> {
        debug!(engine = %self.name, "-> {}", command);
        writeln!(self.stdin, "{}", command)?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Read responses until `accept` returns a value or `timeout` elapses.
    fn wait_for<T>(
        &mut self,
        waiting_for: &'static str,
        timeout: Duration,
        mut accept: impl FnMut(Response) -> Option<T>,
    ) -> Result<T, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let line = match self.lines.recv_timeout(remaining) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(EngineError::Timeout {
                        waiting_for,
                        timeout,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => return Err(EngineError::Terminated),
            };
            debug!(engine = %self.name, "<- {}", line);
            if let Some(value) = accept(Response::parse(&line)) {
                return Ok(value);
            }
        }
    }
}

impl Engine for UciEngine {
    fn best_move(&mut self, board: &Board, limits: &SearchLimits) -> Result<Move, EngineError> {
        self.send(Command::Position(board))?;
        self.send(Command::Go(limits))?;

        let timeout = limits.move_time + self.move_grace;
        let best = self.wait_for("bestmove", timeout, |resp| match resp {
            Response::BestMove { best, .. } => Some(best),
            Response::Info(line) => {
                trace!("{}", line);
                None
            }
            _ => None,
        })?;

        let txt = best.ok_or(EngineError::NoMove)?;
        parse_move(board, &txt)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        self.send(Command::UciNewGame)?;
        self.sync()
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.send(Command::Quit).ok();

        let deadline = Instant::now() + QUIT_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(engine = %self.name, %status, "engine exited");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => break,
            }
        }

        warn!(engine = %self.name, "engine ignored quit, killing it");
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

#[cfg(all(test, unix))]
#[path = "process_tests.rs"]
mod process_tests;
