//! 消息类型定义

use serde::{Deserialize, Serialize};

use crate::engine_line::EngineEvent;
use crate::moves::Move;
use crate::piece::{Side, Square};

/// 连接 ID
pub type ConnectionId = u64;

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientMessage {
    /// 开始新对局，变体标记无法识别时使用默认变体
    NewGame { variant: String },
    /// 走棋
    Move { start: Square, end: Square },
    /// 心跳请求
    Ping,
}

impl ClientMessage {
    /// 由走法构造走棋消息
    pub fn from_move(mv: Move) -> Self {
        ClientMessage::Move {
            start: mv.start,
            end: mv.end,
        }
    }
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMessage {
    // === 走法判定 ===
    /// 走法合法
    Legal,
    /// 走法非法
    Illegal,
    /// 引擎应着
    Response { start: Square, end: Square },

    // === 对局事件 ===
    /// 将军
    Check { side: Side },
    /// 对局结束
    Result { text: String },

    // === 引擎状态 ===
    /// 引擎不可用（启动失败、写入失败或中途退出），需要重新开局
    Unavailable { reason: String },

    // === 心跳 ===
    /// 心跳响应
    Pong,
}

impl From<EngineEvent> for ServerMessage {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Legal => ServerMessage::Legal,
            EngineEvent::Illegal => ServerMessage::Illegal,
            EngineEvent::Response(mv) => ServerMessage::Response {
                start: mv.start,
                end: mv.end,
            },
            EngineEvent::Check(side) => ServerMessage::Check { side },
            EngineEvent::Result(text) => ServerMessage::Result { text },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialize() {
        let msg = ClientMessage::NewGame {
            variant: "kings_cross".to_string(),
        };
        let bytes = bincode::serialize(&msg).unwrap();
        let decoded: ClientMessage = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_message_tags() {
        let json = serde_json::to_string(&ServerMessage::Legal).unwrap();
        assert_eq!(json, "\"legal\"");

        let msg = ServerMessage::Response {
            start: Square::new(0, 5).unwrap(),
            end: Square::new(0, 1).unwrap(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["response"]["start"]["row"], 0);
        assert_eq!(json["response"]["start"]["col"], 5);
        assert_eq!(json["response"]["end"]["col"], 1);
    }

    #[test]
    fn test_from_engine_event() {
        let msg = ServerMessage::from(EngineEvent::Result("Draw".to_string()));
        assert_eq!(msg, ServerMessage::Result { text: "Draw".to_string() });

        let msg = ServerMessage::from(EngineEvent::Check(Side::White));
        assert_eq!(msg, ServerMessage::Check { side: Side::White });
    }
}
