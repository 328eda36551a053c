//! 会话：一个客户端连接与其当前引擎进程的绑定
//!
//! 会话持有至多一个存活的引擎句柄。开新局时先终止旧引擎再启动新引擎；
//! 引擎输出由独立的读取任务按行转发回连接任务，附带代号（generation），
//! 旧引擎的残余输出因代号不匹配而被丢弃。

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use protocol::{ClientMessage, ConnectionId, EngineEvent, GameVariant, Move, ServerMessage};

use crate::config::EngineConfig;
use crate::engine::{EngineError, EngineHandle, EngineLines};

/// 对局状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// 没有对局
    NoGame,
    /// 对局进行中
    InProgress,
    /// 引擎已宣布结果
    Finished,
}

/// 提交走法的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 已写入引擎
    Sent,
    /// 没有进行中的对局
    NoGame,
    /// 上一步还在等待判定
    Pending,
    /// 走法越界
    OffBoard,
    /// 写入失败，引擎已被终止
    EngineLost,
}

/// 引擎读取任务发回连接任务的通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineNotice {
    pub generation: u64,
    pub kind: NoticeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    /// 一行完整输出
    Line(String),
    /// 输出流结束
    Closed,
}

struct SessionState {
    engine: Option<EngineHandle>,
    variant: GameVariant,
    move_pending: bool,
    status: GameStatus,
    generation: u64,
    /// 已执行 teardown
    closed: bool,
}

/// 会话
pub struct Session {
    id: ConnectionId,
    engine_config: EngineConfig,
    outbound: mpsc::Sender<ServerMessage>,
    notices: mpsc::Sender<EngineNotice>,
    state: Mutex<SessionState>,
}

impl Session {
    /// 创建会话
    ///
    /// `outbound` 发往客户端，`notices` 由引擎读取任务写入、连接任务读出后交给 [`Session::handle_notice`]。
    pub fn new(
        id: ConnectionId,
        engine_config: EngineConfig,
        outbound: mpsc::Sender<ServerMessage>,
        notices: mpsc::Sender<EngineNotice>,
    ) -> Self {
        Self {
            id,
            engine_config,
            outbound,
            notices,
            state: Mutex::new(SessionState {
                engine: None,
                variant: GameVariant::default(),
                move_pending: false,
                status: GameStatus::NoGame,
                generation: 0,
                closed: false,
            }),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// 处理客户端消息
    pub async fn handle_client(&self, msg: ClientMessage) {
        match msg {
            ClientMessage::NewGame { variant } => {
                let variant = GameVariant::from_token(&variant);
                if let Err(e) = self.start_game(variant).await {
                    debug!(conn = self.id, error = %e, "开局失败");
                }
            }
            ClientMessage::Move { start, end } => {
                let outcome = self.submit_move(Move::new(start, end)).await;
                if outcome != SubmitOutcome::Sent {
                    debug!(conn = self.id, ?outcome, "走法未提交");
                }
            }
            ClientMessage::Ping => self.send(ServerMessage::Pong).await,
        }
    }

    /// 开始新对局：先终止旧引擎，再启动新引擎并开始转发其输出
    pub async fn start_game(&self, variant: GameVariant) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(EngineError::SessionClosed);
        }

        if let Some(mut old) = state.engine.take() {
            old.terminate();
            debug!(conn = self.id, generation = state.generation, pid = ?old.pid(), "旧引擎已替换");
        }
        state.generation += 1;
        state.variant = variant;
        state.move_pending = false;

        match EngineHandle::spawn(&self.engine_config, variant) {
            Ok(mut engine) => {
                if let Some(lines) = engine.take_lines() {
                    tokio::spawn(forward_lines(state.generation, lines, self.notices.clone()));
                }
                state.engine = Some(engine);
                state.status = GameStatus::InProgress;
                info!(conn = self.id, generation = state.generation, %variant, "新对局开始");
                Ok(())
            }
            Err(e) => {
                state.status = GameStatus::NoGame;
                drop(state);
                warn!(conn = self.id, error = %e, "引擎启动失败");
                self.send(ServerMessage::Unavailable {
                    reason: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    /// 提交走法；同一时间最多一步等待判定
    pub async fn submit_move(&self, mv: Move) -> SubmitOutcome {
        if !mv.is_on_board() {
            return SubmitOutcome::OffBoard;
        }

        let mut state = self.state.lock().await;
        if state.status != GameStatus::InProgress {
            return SubmitOutcome::NoGame;
        }
        if state.move_pending {
            return SubmitOutcome::Pending;
        }
        let Some(engine) = state.engine.as_mut() else {
            return SubmitOutcome::NoGame;
        };

        // 写入受写超时限制，持锁时间有上界
        match engine.send(mv).await {
            Ok(()) => {
                state.move_pending = true;
                SubmitOutcome::Sent
            }
            Err(e) => {
                warn!(conn = self.id, error = %e, "引擎写入失败，视为引擎丢失");
                drop_engine(&mut state);
                state.status = GameStatus::NoGame;
                drop(state);
                self.send(ServerMessage::Unavailable {
                    reason: e.to_string(),
                })
                .await;
                SubmitOutcome::EngineLost
            }
        }
    }

    /// 处理引擎读取任务的通知
    ///
    /// 状态在锁内更新，发往客户端的消息在释放锁之后再发送。
    pub async fn handle_notice(&self, notice: EngineNotice) {
        let reply = {
            let mut state = self.state.lock().await;
            self.apply_notice(&mut state, notice)
        };
        if let Some(msg) = reply {
            self.send(msg).await;
        }
    }

    fn apply_notice(&self, state: &mut SessionState, notice: EngineNotice) -> Option<ServerMessage> {
        if notice.generation != state.generation {
            debug!(conn = self.id, generation = notice.generation, "丢弃旧引擎输出");
            return None;
        }

        match notice.kind {
            NoticeKind::Line(line) => {
                if state.engine.is_none() {
                    debug!(conn = self.id, %line, "引擎已终止，丢弃输出");
                    return None;
                }
                let Some(event) = EngineEvent::parse(&line) else {
                    debug!(conn = self.id, %line, "忽略无法识别的引擎输出");
                    return None;
                };

                if event.is_verdict() {
                    state.move_pending = false;
                }
                if event.is_terminal() {
                    drop_engine(state);
                    state.move_pending = false;
                    state.status = GameStatus::Finished;
                    info!(conn = self.id, variant = %state.variant, "对局结束");
                }
                Some(ServerMessage::from(event))
            }
            NoticeKind::Closed => {
                drop_engine(state);
                if state.status != GameStatus::InProgress {
                    return None;
                }
                warn!(conn = self.id, "引擎意外退出");
                state.status = GameStatus::NoGame;
                state.move_pending = false;
                Some(ServerMessage::Unavailable {
                    reason: "engine exited".to_string(),
                })
            }
        }
    }

    /// 断线或进程退出时调用；幂等。此后会话不再开局。返回是否终止了引擎
    pub async fn teardown(&self) -> bool {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.move_pending = false;
        state.status = GameStatus::NoGame;
        drop_engine(&mut state)
    }

    async fn send(&self, msg: ServerMessage) {
        if self.outbound.send(msg).await.is_err() {
            debug!(conn = self.id, "客户端已断开，丢弃消息");
        }
    }
}

#[cfg(test)]
impl Session {
    pub(crate) async fn status(&self) -> GameStatus {
        self.state.lock().await.status
    }

    pub(crate) async fn variant(&self) -> GameVariant {
        self.state.lock().await.variant
    }

    pub(crate) async fn is_move_pending(&self) -> bool {
        self.state.lock().await.move_pending
    }

    pub(crate) async fn has_engine(&self) -> bool {
        self.state.lock().await.engine.is_some()
    }

    pub(crate) async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }
}

/// 终止并移除当前引擎
fn drop_engine(state: &mut SessionState) -> bool {
    match state.engine.take() {
        Some(mut engine) => engine.terminate(),
        None => false,
    }
}

/// 读取引擎输出并按顺序转发，流结束时发送 Closed
async fn forward_lines<R>(
    generation: u64,
    mut lines: EngineLines<R>,
    notices: mpsc::Sender<EngineNotice>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    while let Some(line) = lines.next_line().await {
        let notice = EngineNotice {
            generation,
            kind: NoticeKind::Line(line),
        };
        if notices.send(notice).await.is_err() {
            return;
        }
    }

    let _ = notices
        .send(EngineNotice {
            generation,
            kind: NoticeKind::Closed,
        })
        .await;
}
