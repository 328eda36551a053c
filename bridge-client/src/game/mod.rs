//! 游戏逻辑模块
//!
//! 管理对局状态和走法输入

mod input;
mod state;

pub use input::*;
pub use state::*;
