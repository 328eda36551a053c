//! 引擎桥接终端客户端
//!
//! 本地棋盘、走法输入状态机与服务器连接

pub mod board;
pub mod game;
pub mod network;

pub use board::LocalBoard;
pub use game::{ClientGame, GamePhase, MoveInputController};
pub use network::ServerLink;
