//! 走法定义及其引擎文本编码

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;
use crate::piece::Square;

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 起始格
    pub start: Square,
    /// 目标格
    pub end: Square,
}

impl Move {
    /// 创建新走法
    pub fn new(start: Square, end: Square) -> Self {
        Self { start, end }
    }

    /// 两端都在棋盘内
    pub fn is_on_board(&self) -> bool {
        self.start.is_valid() && self.end.is_valid()
    }

    /// 编码为引擎输入行：起始行、起始列、目标行、目标列四位数字加换行
    pub fn to_engine_line(&self) -> String {
        format!(
            "{}{}{}{}\n",
            self.start.row, self.start.col, self.end.row, self.end.col
        )
    }

    /// 解析四位数字走法，每位必须在 0..BOARD_SIZE 内
    pub fn from_digits(text: &str) -> Option<Move> {
        let bytes = text.as_bytes();
        if bytes.len() != 4 {
            return None;
        }

        let mut digits = [0u8; 4];
        for (slot, &b) in digits.iter_mut().zip(bytes) {
            if !b.is_ascii_digit() {
                return None;
            }
            let d = b - b'0';
            if d >= BOARD_SIZE {
                return None;
            }
            *slot = d;
        }

        Some(Move {
            start: Square::new_unchecked(digits[0], digits[1]),
            end: Square::new_unchecked(digits[2], digits[3]),
        })
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}
