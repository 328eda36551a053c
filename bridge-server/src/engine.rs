//! 引擎进程句柄
//!
//! 每个句柄独占一个外部引擎进程：向其标准输入写入走法行，
//! 从其标准输出按行读取，并负责终止进程。

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use protocol::{GameVariant, LineBuffer, Move};

use crate::config::EngineConfig;

/// 单次读取的缓冲区大小
const READ_CHUNK_SIZE: usize = 1024;

/// 引擎错误
#[derive(Error, Debug)]
pub enum EngineError {
    /// 进程无法启动
    #[error("Failed to spawn engine `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 写入失败（进程已退出或正在退出）
    #[error("Failed to write to engine: {0}")]
    Write(#[from] std::io::Error),

    /// 写入超时
    #[error("Engine write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// 句柄已终止
    #[error("Engine is not running")]
    NotRunning,

    /// 会话已关闭，不再启动引擎
    #[error("Session is closed")]
    SessionClosed,
}

/// 引擎进程句柄
pub struct EngineHandle {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    variant: GameVariant,
    pid: Option<u32>,
    write_timeout: Duration,
    alive: bool,
}

impl EngineHandle {
    /// 按变体启动引擎进程，只在创建进程时同步等待
    pub fn spawn(config: &EngineConfig, variant: GameVariant) -> Result<Self, EngineError> {
        let mut child = Command::new(&config.program)
            .args(config.launch_args(variant))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: config.program.clone(),
                source,
            })?;

        let pid = child.id();
        info!(?pid, %variant, program = %config.program, "引擎进程已启动");

        Ok(Self {
            stdin: child.stdin.take(),
            stdout: child.stdout.take(),
            child,
            variant,
            pid,
            write_timeout: config.write_timeout(),
            alive: true,
        })
    }

    /// 写入一步走法（四位数字加换行）
    pub async fn send(&mut self, mv: Move) -> Result<(), EngineError> {
        if !self.alive {
            return Err(EngineError::NotRunning);
        }
        let write_timeout = self.write_timeout;
        let stdin = self.stdin.as_mut().ok_or(EngineError::NotRunning)?;
        let line = mv.to_engine_line();

        let write = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await
        };

        match timeout(write_timeout, write).await {
            Ok(Ok(())) => {
                debug!(pid = ?self.pid, line = line.trim_end(), "已写入引擎");
                Ok(())
            }
            Ok(Err(e)) => Err(EngineError::Write(e)),
            Err(_) => Err(EngineError::WriteTimeout(write_timeout)),
        }
    }

    /// 取出输出行流，只能取一次
    pub fn take_lines(&mut self) -> Option<EngineLines<ChildStdout>> {
        self.stdout.take().map(EngineLines::new)
    }

    /// 终止进程；幂等，进程已自行退出时同样安全。返回本次是否真正发出了终止信号
    pub fn terminate(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.stdin = None;

        if let Err(e) = self.child.start_kill() {
            // 进程已经退出并被回收
            debug!(pid = ?self.pid, error = %e, "引擎进程已不存在");
        }
        info!(pid = ?self.pid, variant = %self.variant, "引擎进程已终止");
        true
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    #[cfg(test)]
    pub(crate) fn is_alive(&self) -> bool {
        self.alive
    }

    #[cfg(test)]
    pub(crate) fn variant(&self) -> GameVariant {
        self.variant
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// 引擎输出行流
///
/// 只产出以换行结尾的完整行；进程关闭输出或退出时结束。
pub struct EngineLines<R> {
    reader: R,
    buffer: LineBuffer,
    ready: VecDeque<String>,
    closed: bool,
}

impl<R: AsyncRead + Unpin> EngineLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: LineBuffer::new(),
            ready: VecDeque::new(),
            closed: false,
        }
    }

    /// 下一行输出，流结束时返回 None
    pub async fn next_line(&mut self) -> Option<String> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            if let Some(line) = self.ready.pop_front() {
                return Some(line);
            }
            if self.closed {
                return None;
            }

            match self.reader.read(&mut chunk).await {
                Ok(0) => {
                    self.closed = true;
                    let dropped = self.buffer.discard();
                    if dropped > 0 {
                        debug!(bytes = dropped, "引擎输出结束，丢弃未完成的行");
                    }
                }
                Ok(n) => self.ready.extend(self.buffer.push(&chunk[..n])),
                Err(e) => {
                    warn!(error = %e, "读取引擎输出失败");
                    self.closed = true;
                }
            }
        }
    }
}
