//! 引擎桥接共享协议库
//!
//! 包含:
//! - 格子、走法、阵营、变体等值类型
//! - 引擎文本协议翻译（行 → 事件，走法 → 输入行）与行缓冲
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - TCP 传输与帧编解码

mod constants;
mod engine_line;
mod error;
mod message;
mod moves;
mod piece;
mod transport;

pub use constants::*;
pub use engine_line::{EngineEvent, LineBuffer};
pub use error::{ProtocolError, Result};
pub use message::{ClientMessage, ConnectionId, ServerMessage};
pub use moves::Move;
pub use piece::{GameVariant, Piece, PieceKind, Side, Square};
pub use transport::{
    Connector, FrameReader, FrameWriter, Listener, NetworkConfig, TcpConnection, TcpConnector,
    TcpListener,
};
