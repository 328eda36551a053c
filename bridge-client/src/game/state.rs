//! 客户端游戏状态

use protocol::{ClientMessage, GameVariant, Move, ServerMessage, Side, Square};

use super::input::{ClickOutcome, MoveInputController, Verdict};
use crate::board::LocalBoard;

/// 对局阶段
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GamePhase {
    /// 尚未开局
    #[default]
    Idle,
    /// 对局进行中
    Playing,
    /// 引擎宣布了结果
    Over(String),
    /// 引擎不可用，需要重新开局
    Unavailable(String),
}

/// 客户端游戏状态
#[derive(Debug, Clone, Default)]
pub struct ClientGame {
    /// 本地棋盘
    pub board: LocalBoard,
    /// 走法输入
    pub input: MoveInputController,
    /// 当前变体
    pub variant: GameVariant,
    /// 对局阶段
    pub phase: GamePhase,
    /// 每方被将军的次数（白, 黑）
    checks: [u8; 2],
    /// 最后一步走法
    pub last_move: Option<Move>,
}

impl ClientGame {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始新对局，返回需要发送的消息
    pub fn start_game(&mut self, variant: GameVariant) -> ClientMessage {
        *self = Self {
            variant,
            phase: GamePhase::Playing,
            ..Self::default()
        };
        ClientMessage::NewGame {
            variant: variant.token().to_string(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// 处理棋盘点击，组成走法时返回需要发送的消息
    pub fn click(&mut self, row: i32, col: i32) -> Option<ClientMessage> {
        if !self.is_playing() {
            return None;
        }

        match self.input.click(row, col) {
            ClickOutcome::Proposed(mv) => {
                tracing::debug!("Proposing move {}", mv);
                Some(ClientMessage::from_move(mv))
            }
            ClickOutcome::Selected(_) | ClickOutcome::Deselected(_) | ClickOutcome::Ignored => None,
        }
    }

    /// 处理服务器消息
    pub fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Legal => self.settle(Verdict::Legal),
            ServerMessage::Illegal => self.settle(Verdict::Illegal),
            ServerMessage::Response { start, end } => {
                // 引擎可能只回应着而不先发 Legal，此时视为己方走法已被接受
                self.settle(Verdict::Legal);
                let mv = Move::new(start, end);
                self.board.apply(mv);
                self.last_move = Some(mv);
            }
            ServerMessage::Check { side } => {
                if self.variant.counts_checks() {
                    self.checks[side.index()] = self.checks[side.index()].saturating_add(1);
                }
            }
            ServerMessage::Result { text } => {
                self.input.reset();
                self.phase = GamePhase::Over(text);
            }
            ServerMessage::Unavailable { reason } => {
                self.input.reset();
                self.phase = GamePhase::Unavailable(reason);
            }
            ServerMessage::Pong => {}
        }
    }

    /// 解锁等待判定的走法，合法时落到本地棋盘
    fn settle(&mut self, verdict: Verdict) {
        let Some(outcome) = self.input.on_verdict(verdict) else {
            return;
        };
        if outcome.apply {
            self.board.apply(outcome.mv);
            self.last_move = Some(outcome.mv);
        }
    }

    /// 某方被将军次数；变体不计将军时返回 None
    pub fn check_count(&self, side: Side) -> Option<u8> {
        self.variant
            .counts_checks()
            .then(|| self.checks[side.index()])
    }

    /// 需要高亮的格子
    pub fn markers(&self) -> Vec<Square> {
        self.input.selected().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{Piece, PieceKind};

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col).unwrap()
    }

    #[test]
    fn test_click_before_game_ignored() {
        let mut game = ClientGame::new();
        assert_eq!(game.click(5, 0), None);
        assert!(game.input.is_ready());
    }

    #[test]
    fn test_move_round_trip() {
        let mut game = ClientGame::new();
        let msg = game.start_game(GameVariant::ThreeChecks);
        assert_eq!(
            msg,
            ClientMessage::NewGame {
                variant: "three_checks".to_string()
            }
        );

        assert_eq!(game.click(5, 0), None);
        assert_eq!(game.markers(), vec![sq(5, 0)]);
        let msg = game.click(4, 0).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Move {
                start: sq(5, 0),
                end: sq(4, 0)
            }
        );
        assert!(game.markers().is_empty());

        // 判定前的点击不会产生新走法
        assert_eq!(game.click(5, 2), None);
        assert_eq!(game.click(4, 2), None);

        game.handle_server_message(ServerMessage::Legal);
        assert_eq!(game.board.get(sq(4, 0)), Some(Piece::new(PieceKind::King, Side::White)));
        assert_eq!(game.board.get(sq(5, 0)), None);

        game.handle_server_message(ServerMessage::Response {
            start: sq(0, 5),
            end: sq(0, 4),
        });
        assert_eq!(game.board.get(sq(0, 4)), Some(Piece::new(PieceKind::King, Side::Black)));
        assert_eq!(game.last_move, Some(Move::new(sq(0, 5), sq(0, 4))));
        assert!(game.input.is_ready());
    }

    #[test]
    fn test_illegal_leaves_board() {
        let mut game = ClientGame::new();
        game.start_game(GameVariant::KingsCross);
        let before = game.board.clone();

        game.click(5, 0);
        game.click(3, 3);
        game.handle_server_message(ServerMessage::Illegal);

        assert_eq!(game.board, before);
        assert!(game.input.is_ready());
    }

    #[test]
    fn test_check_counter_gated_by_variant() {
        let mut game = ClientGame::new();
        game.start_game(GameVariant::ThreeChecks);
        game.handle_server_message(ServerMessage::Check { side: Side::White });
        game.handle_server_message(ServerMessage::Check { side: Side::White });
        game.handle_server_message(ServerMessage::Check { side: Side::Black });
        assert_eq!(game.check_count(Side::White), Some(2));
        assert_eq!(game.check_count(Side::Black), Some(1));

        game.start_game(GameVariant::KingsCross);
        game.handle_server_message(ServerMessage::Check { side: Side::White });
        assert_eq!(game.check_count(Side::White), None);
    }

    #[test]
    fn test_result_and_unavailable() {
        let mut game = ClientGame::new();
        game.start_game(GameVariant::ThreeChecks);
        game.click(5, 0);
        game.click(4, 0);

        game.handle_server_message(ServerMessage::Result {
            text: "White wins by checkmate.".to_string(),
        });
        assert_eq!(game.phase, GamePhase::Over("White wins by checkmate.".to_string()));
        assert!(game.input.is_ready());
        assert_eq!(game.click(5, 2), None);

        game.start_game(GameVariant::ThreeChecks);
        assert!(game.is_playing());
        assert_eq!(game.board, LocalBoard::initial());

        game.handle_server_message(ServerMessage::Unavailable {
            reason: "engine exited".to_string(),
        });
        assert!(!game.is_playing());
        assert_eq!(game.click(5, 0), None);
    }

    #[test]
    fn test_response_without_legal_unlocks_input() {
        let mut game = ClientGame::new();
        game.start_game(GameVariant::KingsCross);
        game.click(5, 0);
        game.click(4, 0);
        assert!(!game.input.is_ready());

        game.handle_server_message(ServerMessage::Response {
            start: sq(0, 5),
            end: sq(1, 5),
        });
        assert!(game.input.is_ready());
        assert_eq!(game.board.get(sq(4, 0)), Some(Piece::new(PieceKind::King, Side::White)));
        assert_eq!(game.board.get(sq(1, 5)), Some(Piece::new(PieceKind::King, Side::Black)));
        assert_eq!(game.last_move, Some(Move::new(sq(0, 5), sq(1, 5))));

        // 解锁后可以提交下一步
        game.click(5, 2);
        assert!(game.click(3, 3).is_some());
    }
}
