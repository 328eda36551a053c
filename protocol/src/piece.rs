//! 棋子、阵营、格子与变体定义

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;

/// 棋子类型（只有马和王）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// 马
    Knight,
    /// 王
    King,
}

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 白方（先手，在下方）
    White,
    /// 黑方（后手，在上方）
    Black,
}

impl Side {
    /// 引擎 `Check` 行中的阵营标记："0" 为白方，其余为黑方
    pub fn from_token(token: &str) -> Side {
        if token == "0" {
            Side::White
        } else {
            Side::Black
        }
    }

    /// 转换为引擎标记
    pub fn token(&self) -> &'static str {
        match self {
            Side::White => "0",
            Side::Black => "1",
        }
    }

    /// 数组下标
    pub fn index(&self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    /// 创建新棋子
    pub fn new(kind: PieceKind, side: Side) -> Self {
        Self { kind, side }
    }

    /// 终端显示字符（白方大写，黑方小写）
    pub fn display_char(&self) -> char {
        let c = match self.kind {
            PieceKind::Knight => 'n',
            PieceKind::King => 'k',
        };
        match self.side {
            Side::White => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }
}

/// 棋盘格子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    /// 行 (0-5)
    pub row: u8,
    /// 列 (0-5)
    pub col: u8,
}

impl Square {
    /// 创建新格子，越界返回 None
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 创建新格子（不检查边界，内部使用）
    pub const fn new_unchecked(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// 从有符号坐标创建（点击坐标可能为负）
    pub fn from_coords(row: i32, col: i32) -> Option<Self> {
        let row = u8::try_from(row).ok()?;
        let col = u8::try_from(col).ok()?;
        Self::new(row, col)
    }

    /// 检查格子是否在棋盘内
    pub fn is_valid(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// 转换为数组索引
    pub fn to_index(&self) -> usize {
        self.row as usize * BOARD_SIZE as usize + self.col as usize
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 游戏变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameVariant {
    /// 三将胜
    #[default]
    ThreeChecks,
    /// 王过河
    KingsCross,
}

impl GameVariant {
    /// 从客户端标记解析，无法识别的标记使用默认变体
    pub fn from_token(token: &str) -> GameVariant {
        match token {
            "kings_cross" => GameVariant::KingsCross,
            "three_checks" => GameVariant::ThreeChecks,
            _ => GameVariant::default(),
        }
    }

    /// 客户端标记
    pub fn token(&self) -> &'static str {
        match self {
            GameVariant::ThreeChecks => "three_checks",
            GameVariant::KingsCross => "kings_cross",
        }
    }

    /// 是否显示将军计数
    pub fn counts_checks(&self) -> bool {
        matches!(self, GameVariant::ThreeChecks)
    }
}

impl std::fmt::Display for GameVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}
