//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘边长（6×6）
pub const BOARD_SIZE: u8 = 6;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 服务端默认最大连接数
pub const MAX_CONNECTIONS: usize = 100;

/// 服务端默认端口
pub const DEFAULT_PORT: u16 = 3000;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// 引擎输出单行最大长度，超出的行被丢弃
pub const MAX_ENGINE_LINE_LEN: usize = 4096;
