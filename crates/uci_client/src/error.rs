//! Errors raised while driving an engine process.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("could not start engine `{}`: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine process terminated")]
    Terminated,
    #[error("engine did not answer `{waiting_for}` within {timeout:?}")]
    Timeout {
        waiting_for: &'static str,
        timeout: Duration,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("engine reported no move")]
    NoMove,
    #[error("engine proposed illegal move `{0}`")]
    IllegalMove(String),
}
