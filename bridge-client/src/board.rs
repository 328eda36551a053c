//! 本地棋盘

use std::fmt;

use protocol::{Move, Piece, PieceKind, Side, Square, BOARD_SIZE};

const SQUARE_COUNT: usize = BOARD_SIZE as usize * BOARD_SIZE as usize;

/// 客户端棋盘，只记录棋子位置，不做规则判断
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBoard {
    squares: [Option<Piece>; SQUARE_COUNT],
}

impl LocalBoard {
    /// 空棋盘
    pub fn empty() -> Self {
        Self {
            squares: [None; SQUARE_COUNT],
        }
    }

    /// 初始局面：黑马占第 0 行前四列，黑王在 (0, 5)；白马占第 5 行后四列，白王在 (5, 0)
    pub fn initial() -> Self {
        let mut board = Self::empty();
        let last = BOARD_SIZE - 1;

        for i in 0..BOARD_SIZE - 2 {
            board.set(
                Square::new_unchecked(0, i),
                Some(Piece::new(PieceKind::Knight, Side::Black)),
            );
            board.set(
                Square::new_unchecked(last, last - i),
                Some(Piece::new(PieceKind::Knight, Side::White)),
            );
        }
        board.set(
            Square::new_unchecked(0, last),
            Some(Piece::new(PieceKind::King, Side::Black)),
        );
        board.set(
            Square::new_unchecked(last, 0),
            Some(Piece::new(PieceKind::King, Side::White)),
        );

        board
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        if !square.is_valid() {
            return None;
        }
        self.squares[square.to_index()]
    }

    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        if square.is_valid() {
            self.squares[square.to_index()] = piece;
        }
    }

    /// 执行走法，返回被吃掉的棋子。起点为空或越界时棋盘不变
    pub fn apply(&mut self, mv: Move) -> Option<Piece> {
        if !mv.is_on_board() {
            return None;
        }
        let piece = self.get(mv.start)?;
        let captured = self.get(mv.end);
        self.set(mv.start, None);
        self.set(mv.end, Some(piece));
        captured
    }

    /// 某一方剩余棋子数
    pub fn count(&self, side: Side) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|piece| piece.side == side)
            .count()
    }
}

impl Default for LocalBoard {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for LocalBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for col in 0..BOARD_SIZE {
            write!(f, " {}", col)?;
        }
        writeln!(f)?;

        for row in 0..BOARD_SIZE {
            write!(f, "{} ", row)?;
            for col in 0..BOARD_SIZE {
                let c = self
                    .get(Square::new_unchecked(row, col))
                    .map(|piece| piece.display_char())
                    .unwrap_or('.');
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col).unwrap()
    }

    #[test]
    fn test_initial_position() {
        let board = LocalBoard::initial();

        assert_eq!(board.get(sq(0, 5)), Some(Piece::new(PieceKind::King, Side::Black)));
        assert_eq!(board.get(sq(5, 0)), Some(Piece::new(PieceKind::King, Side::White)));
        for col in 0..4 {
            assert_eq!(board.get(sq(0, col)), Some(Piece::new(PieceKind::Knight, Side::Black)));
        }
        for col in 2..6 {
            assert_eq!(board.get(sq(5, col)), Some(Piece::new(PieceKind::Knight, Side::White)));
        }
        assert_eq!(board.get(sq(0, 4)), None);
        assert_eq!(board.get(sq(5, 1)), None);
        assert_eq!(board.count(Side::White), 5);
        assert_eq!(board.count(Side::Black), 5);
    }

    #[test]
    fn test_apply_move() {
        let mut board = LocalBoard::initial();

        assert_eq!(board.apply(Move::new(sq(5, 0), sq(4, 0))), None);
        assert_eq!(board.get(sq(5, 0)), None);
        assert_eq!(board.get(sq(4, 0)), Some(Piece::new(PieceKind::King, Side::White)));

        // 吃子
        let captured = board.apply(Move::new(sq(0, 5), sq(0, 1)));
        assert_eq!(captured, Some(Piece::new(PieceKind::Knight, Side::Black)));
        assert_eq!(board.count(Side::Black), 4);
    }

    #[test]
    fn test_apply_from_empty_square() {
        let mut board = LocalBoard::initial();
        let before = board.clone();

        assert_eq!(board.apply(Move::new(sq(2, 2), sq(3, 3))), None);
        assert_eq!(board, before);
    }

    #[test]
    fn test_display() {
        let text = LocalBoard::initial().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "0  n n n n . k");
        assert_eq!(lines[6], "5  K . N N N N");
    }
}
