//! 走法输入控制
//!
//! 两次点击组成一步走法：第一次选中起点，第二次点击不同格子即发出走法；
//! 再次点击起点取消选择。走法发出后锁定输入，直到收到 Legal 或 Illegal。
//! 棋盘外的点击在任何状态下都被忽略。

use protocol::{Move, Square};

/// 输入状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputState {
    /// 等待选择起点
    #[default]
    Ready,
    /// 已选中起点
    SquareSelected(Square),
    /// 走法已发出，等待判定
    AwaitingVerdict(Move),
}

/// 一次点击的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// 忽略（越界或等待判定中）
    Ignored,
    /// 选中起点，显示选择框
    Selected(Square),
    /// 取消选择，清除选择框
    Deselected(Square),
    /// 发出走法
    Proposed(Move),
}

/// 引擎判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Legal,
    Illegal,
}

/// 判定到达后的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictOutcome {
    /// 被判定的走法，起点和终点的标记需要清除
    pub mv: Move,
    /// 是否应当在本地棋盘上执行
    pub apply: bool,
}

/// 走法输入控制器
#[derive(Debug, Clone, Default)]
pub struct MoveInputController {
    state: InputState,
}

impl MoveInputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == InputState::Ready
    }

    /// 当前选中的起点
    pub fn selected(&self) -> Option<Square> {
        match self.state {
            InputState::SquareSelected(square) => Some(square),
            _ => None,
        }
    }

    /// 等待判定的走法
    pub fn in_flight(&self) -> Option<Move> {
        match self.state {
            InputState::AwaitingVerdict(mv) => Some(mv),
            _ => None,
        }
    }

    /// 处理一次点击（行、列可能越界或为负）
    pub fn click(&mut self, row: i32, col: i32) -> ClickOutcome {
        let Some(square) = Square::from_coords(row, col) else {
            return ClickOutcome::Ignored;
        };

        match self.state {
            InputState::Ready => {
                self.state = InputState::SquareSelected(square);
                ClickOutcome::Selected(square)
            }
            InputState::SquareSelected(selected) if selected == square => {
                self.state = InputState::Ready;
                ClickOutcome::Deselected(square)
            }
            InputState::SquareSelected(selected) => {
                let mv = Move::new(selected, square);
                self.state = InputState::AwaitingVerdict(mv);
                ClickOutcome::Proposed(mv)
            }
            InputState::AwaitingVerdict(_) => ClickOutcome::Ignored,
        }
    }

    /// 收到判定后解锁；未在等待判定时返回 None
    pub fn on_verdict(&mut self, verdict: Verdict) -> Option<VerdictOutcome> {
        let InputState::AwaitingVerdict(mv) = self.state else {
            return None;
        };
        self.state = InputState::Ready;

        Some(VerdictOutcome {
            mv,
            apply: verdict == Verdict::Legal,
        })
    }

    /// 新对局或对局中断时回到初始状态
    pub fn reset(&mut self) {
        self.state = InputState::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col).unwrap()
    }

    #[test]
    fn test_select_and_deselect() {
        let mut input = MoveInputController::new();

        assert_eq!(input.click(5, 0), ClickOutcome::Selected(sq(5, 0)));
        assert_eq!(input.selected(), Some(sq(5, 0)));

        assert_eq!(input.click(5, 0), ClickOutcome::Deselected(sq(5, 0)));
        assert!(input.is_ready());
        assert_eq!(input.in_flight(), None);
    }

    #[test]
    fn test_propose_move_locks_input() {
        let mut input = MoveInputController::new();

        input.click(5, 0);
        let mv = Move::new(sq(5, 0), sq(4, 0));
        assert_eq!(input.click(4, 0), ClickOutcome::Proposed(mv));
        assert_eq!(input.state(), InputState::AwaitingVerdict(mv));
        assert_eq!(input.selected(), None);

        // 等待判定期间的点击全部忽略
        for (row, col) in [(3, 3), (4, 0), (5, 0), (0, 0)] {
            assert_eq!(input.click(row, col), ClickOutcome::Ignored);
        }
        assert_eq!(input.in_flight(), Some(mv));
    }

    #[test]
    fn test_verdicts_unlock() {
        let mut input = MoveInputController::new();
        input.click(5, 0);
        input.click(4, 0);

        let outcome = input.on_verdict(Verdict::Legal).unwrap();
        assert_eq!(outcome.mv, Move::new(sq(5, 0), sq(4, 0)));
        assert!(outcome.apply);
        assert!(input.is_ready());

        input.click(4, 0);
        input.click(2, 1);
        let outcome = input.on_verdict(Verdict::Illegal).unwrap();
        assert!(!outcome.apply);
        assert!(input.is_ready());

        // 没有等待中的走法时判定无效
        assert_eq!(input.on_verdict(Verdict::Legal), None);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut input = MoveInputController::new();

        for (row, col) in [(-1, 0), (0, -1), (6, 0), (0, 6), (100, 100)] {
            assert_eq!(input.click(row, col), ClickOutcome::Ignored);
            assert!(input.is_ready());
        }

        input.click(1, 1);
        assert_eq!(input.click(1, 6), ClickOutcome::Ignored);
        assert_eq!(input.selected(), Some(sq(1, 1)));
    }

    #[test]
    fn test_reset() {
        let mut input = MoveInputController::new();
        input.click(1, 1);
        input.click(2, 3);
        input.reset();
        assert!(input.is_ready());
        assert_eq!(input.on_verdict(Verdict::Illegal), None);
    }
}
