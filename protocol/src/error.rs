//! 传输层错误

use thiserror::Error;

/// 客户端与桥接服务之间的传输错误
///
/// 引擎相关的错误不在这里，它们由服务端转换为 `unavailable` 消息。
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// 帧内容无法编解码
    #[error("malformed frame payload: {0}")]
    Bincode(#[from] bincode::Error),

    /// 对端使用了不同的协议版本
    #[error("peer speaks protocol v{actual}, this build speaks v{expected}")]
    VersionMismatch { expected: u8, actual: u8 },

    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接服务端超时
    #[error("timed out connecting to bridge")]
    ConnectionTimeout,

    /// 对端在帧边界处关闭了连接
    #[error("peer closed the connection")]
    ConnectionClosed,
}

impl ProtocolError {
    /// 是否为对端正常关闭
    pub fn is_closed(&self) -> bool {
        matches!(self, ProtocolError::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
