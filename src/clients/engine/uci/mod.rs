use std::{
    fmt::{Debug, Formatter},
    path::PathBuf,
    process::Stdio,
};

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines},
    process::Command,
};

use crate::clients::engine::{
    EngineClient,
    types::{EngineError, Evaluation, parse_info_line},
};

/// Line-oriented UCI conversation with one engine.
pub struct UciSession<R, W> {
    lines: Lines<BufReader<R>>,
    writer: W,
}

impl<R, W> UciSession<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, command: &str) -> Result<(), EngineError> {
        tracing::trace!(command, "uci >");
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self) -> Result<String, EngineError> {
        match self.lines.next_line().await? {
            Some(line) => {
                tracing::trace!(%line, "uci <");
                Ok(line)
            }
            None => Err(EngineError::Protocol(
                "engine closed its output".to_string(),
            )),
        }
    }

    async fn wait_for(&mut self, token: &str) -> Result<(), EngineError> {
        loop {
            let line = self.next_line().await?;
            if line.trim() == token {
                return Ok(());
            }
        }
    }

    /// `uci` / `uciok` followed by `isready` / `readyok`.
    pub async fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    pub async fn analyse_start_position(&mut self, depth: u32) -> Result<Evaluation, EngineError> {
        self.send("ucinewgame").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        self.send("position startpos").await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut last = None;
        loop {
            let line = self.next_line().await?;
            if line.starts_with("bestmove") {
                break;
            }
            if let Some(eval) = parse_info_line(&line) {
                last = Some(eval);
            }
        }

        last.ok_or_else(|| EngineError::Protocol("engine reported no score".to_string()))
    }

    pub async fn quit(&mut self) -> Result<(), EngineError> {
        self.send("quit").await
    }
}

/// An `EngineClient` that runs a fresh Stockfish (or any UCI engine) process
/// per analysis.
#[derive(Clone)]
pub struct StockfishClient {
    path: PathBuf,
}

impl StockfishClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EngineClient for StockfishClient {
    async fn analyse_start_position(&self, depth: u32) -> Result<Evaluation, EngineError> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: self.path.display().to_string(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(EngineError::Protocol(
                "engine pipes unavailable".to_string(),
            ));
        };

        let mut session = UciSession::new(stdout, stdin);
        session.handshake().await?;
        let eval = session.analyse_start_position(depth).await?;

        if let Err(err) = session.quit().await {
            tracing::warn!(error = %err, "Engine did not accept quit");
        }

        Ok(eval)
    }

    async fn ping(&self) -> anyhow::Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.is_file() && is_executable(&meta)),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}

impl Debug for StockfishClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockfishClient")
            .field("path", &self.path)
            .finish()
    }
}
