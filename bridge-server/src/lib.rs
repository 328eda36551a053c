//! 引擎桥接服务端
//!
//! 包含:
//! - 引擎进程句柄（启动、写入、按行读取、终止）
//! - 会话（连接与引擎的绑定，至多一步走法等待判定）
//! - 会话表（进程退出时统一终止引擎）
//! - 配置与 TCP 服务

pub mod config;
pub mod engine;
pub mod registry;
pub mod server;
pub mod session;

pub use config::{ConfigError, EngineConfig, ServerConfig};
pub use engine::{EngineError, EngineHandle, EngineLines};
pub use registry::SessionRegistry;
pub use server::BridgeServer;
pub use session::{EngineNotice, GameStatus, NoticeKind, Session, SubmitOutcome};
