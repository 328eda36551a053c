//! 服务器主逻辑
//!
//! 每个连接一个任务：帧读取与帧写入各自独立运行，
//! 连接任务在客户端消息和引擎通知之间选择，依次交给会话处理。

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use protocol::{ClientMessage, Listener, ServerMessage, TcpConnection, TcpListener};

use crate::config::ServerConfig;
use crate::registry::SessionRegistry;
use crate::session::{EngineNotice, Session};

/// 每个连接的出站消息队列长度
const OUTBOUND_QUEUE_SIZE: usize = 64;

/// 每个连接的入站消息队列长度
const INBOUND_QUEUE_SIZE: usize = 16;

/// 每个会话的引擎通知队列长度
const NOTICE_QUEUE_SIZE: usize = 256;

/// 桥接服务器
pub struct BridgeServer {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    /// 进程退出时置为 true，通知所有连接任务停止
    closing: watch::Sender<bool>,
}

impl BridgeServer {
    pub fn new(config: ServerConfig) -> Self {
        let (closing, _) = watch::channel(false);
        Self {
            config,
            registry: Arc::new(SessionRegistry::new()),
            closing,
        }
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    /// 绑定配置中的监听地址
    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        let addr = self.config.network.addr();
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %listener.local_addr().unwrap_or(addr), "服务器开始监听");
        Ok(listener)
    }

    /// 接受连接直到 `shutdown` 完成，随后终止所有会话的引擎
    pub async fn serve<F>(&self, mut listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("收到退出信号，停止接受连接");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok(conn) => self.accept_connection(conn),
                    Err(e) => warn!(error = %e, "接受连接失败"),
                },
            }
        }

        self.closing.send_replace(true);
        let terminated = self
            .registry
            .shutdown_all(self.config.shutdown_grace())
            .await;
        info!(terminated, "所有引擎已终止");
        Ok(())
    }

    fn accept_connection(&self, conn: TcpConnection) {
        let peer = conn.peer_addr().unwrap_or_else(|| "unknown".to_string());
        if self.registry.len() >= self.config.max_connections {
            warn!(%peer, max = self.config.max_connections, "连接数已满，拒绝连接");
            return;
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let (notice_tx, notice_rx) = mpsc::channel(NOTICE_QUEUE_SIZE);
        let session = Arc::new(Session::new(
            self.registry.next_id(),
            self.config.engine.clone(),
            outbound_tx,
            notice_tx,
        ));
        self.registry.register(session.clone());
        info!(conn = session.id(), %peer, "客户端已连接");

        tokio::spawn(run_connection(
            conn,
            session,
            notice_rx,
            outbound_rx,
            self.registry.clone(),
            self.closing.subscribe(),
        ));
    }
}

/// 单个连接的生命周期：断线后走与进程退出相同的 teardown
async fn run_connection(
    conn: TcpConnection,
    session: Arc<Session>,
    mut notices: mpsc::Receiver<EngineNotice>,
    mut outbound: mpsc::Receiver<ServerMessage>,
    registry: Arc<SessionRegistry>,
    mut closing: watch::Receiver<bool>,
) {
    let id = session.id();
    let (mut reader, mut writer) = conn.split();
    let (inbound_tx, mut inbound) = mpsc::channel(INBOUND_QUEUE_SIZE);

    // 帧读取不可取消，放在独立任务中
    tokio::spawn(async move {
        loop {
            match reader.read_frame::<ClientMessage>().await {
                Ok(msg) => {
                    if inbound_tx.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(e) if e.is_closed() => break,
                Err(e) => {
                    warn!(conn = id, error = %e, "读取客户端消息失败");
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            if let Err(e) = writer.write_frame(&msg).await {
                warn!(conn = id, error = %e, "发送消息失败");
                break;
            }
        }
    });

    loop {
        tokio::select! {
            msg = inbound.recv() => match msg {
                Some(msg) => session.handle_client(msg).await,
                None => break,
            },
            Some(notice) = notices.recv() => session.handle_notice(notice).await,
            _ = closing.changed() => {
                debug!(conn = id, "服务器关闭，结束连接");
                break;
            }
        }
    }

    session.teardown().await;
    registry.remove(id);
    info!(conn = id, "客户端已断开");
}
