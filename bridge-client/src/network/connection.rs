//! 服务器连接
//!
//! 使用 protocol 库的传输层抽象，读写各在独立任务中运行

use protocol::{ClientMessage, Connector, ServerMessage, TcpConnector};
use tokio::sync::mpsc;

/// 发送队列长度
const SEND_QUEUE_SIZE: usize = 16;
/// 接收队列长度
const RECV_QUEUE_SIZE: usize = 64;

/// 与桥接服务器的连接
pub struct ServerLink {
    outgoing: mpsc::Sender<ClientMessage>,
    incoming: mpsc::Receiver<ServerMessage>,
}

impl ServerLink {
    /// 连接到服务器
    pub async fn connect(addr: &str) -> anyhow::Result<Self> {
        let conn = TcpConnector.connect(addr).await?;
        tracing::info!("Connected to server: {}", addr);

        let (mut reader, mut writer) = conn.split();
        let (outgoing, mut send_rx) = mpsc::channel::<ClientMessage>(SEND_QUEUE_SIZE);
        let (recv_tx, incoming) = mpsc::channel(RECV_QUEUE_SIZE);

        tokio::spawn(async move {
            loop {
                match reader.read_frame::<ServerMessage>().await {
                    Ok(msg) => {
                        if recv_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(e) if e.is_closed() => {
                        tracing::info!("Server closed the connection");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Receive error: {}", e);
                        break;
                    }
                }
            }
        });

        tokio::spawn(async move {
            while let Some(msg) = send_rx.recv().await {
                if let Err(e) = writer.write_frame(&msg).await {
                    tracing::error!("Failed to send message: {}", e);
                    break;
                }
            }
        });

        Ok(Self { outgoing, incoming })
    }

    /// 发送消息
    pub async fn send(&self, msg: ClientMessage) -> anyhow::Result<()> {
        self.outgoing
            .send(msg)
            .await
            .map_err(|_| anyhow::anyhow!("connection closed"))
    }

    /// 接收下一条消息，连接断开时返回 None
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.incoming.recv().await
    }
}
