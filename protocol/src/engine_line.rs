//! 引擎文本协议
//!
//! 引擎每行输出一条消息，按首个记号区分（区分大小写）：
//! - `Legal` / `Illegal`：对上一步走法的判定
//! - `Response <4位数字>`：引擎自己的走法
//! - `Check <阵营>`：`0` 为白方，其余为黑方
//! - `Result: <文本>`：对局结束
//!
//! 其余行（包括空行）一律忽略。

use tracing::warn;

use crate::constants::MAX_ENGINE_LINE_LEN;
use crate::moves::Move;
use crate::piece::Side;

/// 由一行引擎输出翻译而来的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// 走法合法
    Legal,
    /// 走法非法
    Illegal,
    /// 引擎应着
    Response(Move),
    /// 将军
    Check(Side),
    /// 对局结束（附带说明文本）
    Result(String),
}

impl EngineEvent {
    /// 翻译一行引擎输出，无法识别的行返回 None
    pub fn parse(line: &str) -> Option<EngineEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let tag_end = line.find(|c: char| c == ' ' || c == ':').unwrap_or(line.len());
        let (tag, rest) = line.split_at(tag_end);

        match tag {
            "Legal" => Some(EngineEvent::Legal),
            "Illegal" => Some(EngineEvent::Illegal),
            "Response" => {
                let payload = rest.strip_prefix(' ')?;
                Move::from_digits(payload.trim()).map(EngineEvent::Response)
            }
            "Check" => {
                let payload = rest.strip_prefix(' ')?;
                let token = payload.split_whitespace().next()?;
                Some(EngineEvent::Check(Side::from_token(token)))
            }
            "Result" => {
                // 取第一个冒号之后的文本；没有冒号时取标记之后的全部文本
                let text = match line.split_once(':') {
                    Some((_, after)) => after,
                    None => rest,
                };
                Some(EngineEvent::Result(text.trim().to_string()))
            }
            _ => None,
        }
    }

    /// 是否为一步走法的最终判定（Legal / Illegal / Response 任一即可）
    pub fn is_verdict(&self) -> bool {
        matches!(
            self,
            EngineEvent::Legal | EngineEvent::Illegal | EngineEvent::Response(_)
        )
    }

    /// 是否结束对局
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineEvent::Result(_))
    }
}

/// 行缓冲
///
/// 进程输出的一次读取可能包含半行或多行，只有以换行结尾的完整行才会被取出，
/// 剩余部分留待下次读取拼接。超过长度上限的行整行丢弃，直到下一个换行。
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    max_line_len: usize,
    /// 当前行已超长，丢弃到下一个换行为止
    overflowed: bool,
}

impl LineBuffer {
    /// 创建空缓冲，行长上限为 [`MAX_ENGINE_LINE_LEN`]
    pub fn new() -> Self {
        Self::with_limit(MAX_ENGINE_LINE_LEN)
    }

    pub fn with_limit(max_line_len: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line_len,
            overflowed: false,
        }
    }

    /// 追加一段数据，返回其中所有完整行（不含换行符）
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut segments = chunk.split(|&b| b == b'\n');
        let mut current = segments.next();

        while let Some(segment) = current {
            let next = segments.next();
            self.append(segment);
            // 后面还有分段，说明这一段以换行结尾
            if next.is_some() {
                if let Some(line) = self.finish_line() {
                    lines.push(line);
                }
            }
            current = next;
        }

        lines
    }

    /// 丢弃未成行的残余数据，返回被丢弃的字节数
    pub fn discard(&mut self) -> usize {
        let len = self.pending.len();
        self.pending.clear();
        self.overflowed = false;
        len
    }

    fn append(&mut self, bytes: &[u8]) {
        if self.overflowed {
            return;
        }
        if self.pending.len() + bytes.len() > self.max_line_len {
            warn!(limit = self.max_line_len, "引擎输出行过长，整行丢弃");
            self.pending.clear();
            self.overflowed = true;
            return;
        }
        self.pending.extend_from_slice(bytes);
    }

    fn finish_line(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.pending);
        if std::mem::replace(&mut self.overflowed, false) {
            return None;
        }
        let bytes: &[u8] = &raw;
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Square;

    #[test]
    fn test_parse_verdicts() {
        assert_eq!(EngineEvent::parse("Legal"), Some(EngineEvent::Legal));
        assert_eq!(EngineEvent::parse("Illegal"), Some(EngineEvent::Illegal));
        assert_eq!(EngineEvent::parse("Legal\r"), Some(EngineEvent::Legal));
    }

    #[test]
    fn test_parse_response() {
        let event = EngineEvent::parse("Response 0501").unwrap();
        assert_eq!(
            event,
            EngineEvent::Response(Move::new(
                Square::new(0, 5).unwrap(),
                Square::new(0, 1).unwrap()
            ))
        );
        assert!(event.is_verdict());

        // 格式错误的走法直接忽略
        assert_eq!(EngineEvent::parse("Response 0561"), None);
        assert_eq!(EngineEvent::parse("Response 050"), None);
        assert_eq!(EngineEvent::parse("Response"), None);
    }

    #[test]
    fn test_response_digits_round_trip() {
        for text in ["0000", "5040", "0501", "3124", "5555"] {
            let line = format!("Response {}", text);
            let Some(EngineEvent::Response(mv)) = EngineEvent::parse(&line) else {
                panic!("expected response for {}", line);
            };
            assert_eq!(mv.to_engine_line(), format!("{}\n", text));
        }
    }

    #[test]
    fn test_parse_check() {
        assert_eq!(EngineEvent::parse("Check 0"), Some(EngineEvent::Check(Side::White)));
        assert_eq!(EngineEvent::parse("Check 1"), Some(EngineEvent::Check(Side::Black)));
        assert_eq!(EngineEvent::parse("Check x"), Some(EngineEvent::Check(Side::Black)));
        assert_eq!(EngineEvent::parse("Check"), None);
        assert_eq!(EngineEvent::parse("Check "), None);
    }

    #[test]
    fn test_parse_result() {
        let event = EngineEvent::parse("Result: White wins by checkmate.").unwrap();
        assert_eq!(event, EngineEvent::Result("White wins by checkmate.".to_string()));
        assert!(event.is_terminal());
        assert!(!event.is_verdict());

        assert_eq!(
            EngineEvent::parse("Result:   Draw  "),
            Some(EngineEvent::Result("Draw".to_string()))
        );
        assert_eq!(
            EngineEvent::parse("Result Black wins"),
            Some(EngineEvent::Result("Black wins".to_string()))
        );
    }

    #[test]
    fn test_parse_ignores_unknown() {
        for line in ["", " ", "legal", "Legality", "5040", "Checkmate 1", "Info depth 3"] {
            assert_eq!(EngineEvent::parse(line), None, "line: {:?}", line);
        }
    }

    #[test]
    fn test_line_buffer_partial() {
        let mut buffer = LineBuffer::new();

        assert!(buffer.push(b"Leg").is_empty());
        assert_eq!(buffer.pending_len(), 3);

        assert_eq!(buffer.push(b"al\nResp"), vec!["Legal".to_string()]);
        assert_eq!(buffer.push(b"onse 0501\n"), vec!["Response 0501".to_string()]);
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn test_line_buffer_many_lines() {
        let mut buffer = LineBuffer::new();

        let lines = buffer.push(b"Legal\r\n\nCheck 0\nRes");
        assert_eq!(lines, vec!["Legal".to_string(), String::new(), "Check 0".to_string()]);
        assert_eq!(buffer.discard(), 3);
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn test_line_buffer_drops_overlong_line() {
        let mut buffer = LineBuffer::with_limit(8);

        assert!(buffer.push(b"Result: W").is_empty());
        assert_eq!(buffer.pending_len(), 0);
        assert!(buffer.push(b"hite wins on time").is_empty());

        // 超长行在换行处结束，之后的行照常取出
        assert_eq!(
            buffer.push(b".\nLegal\nCheck 0\n"),
            vec!["Legal".to_string(), "Check 0".to_string()]
        );
        assert_eq!(buffer.push(b"Illegal\n"), vec!["Illegal".to_string()]);
    }

    #[test]
    fn test_line_buffer_limit_is_inclusive() {
        let mut buffer = LineBuffer::with_limit(5);
        assert_eq!(buffer.push(b"Legal\n"), vec!["Legal".to_string()]);
        assert!(buffer.push(b"Illegal\n").is_empty());
        assert_eq!(buffer.push(b"Check\n"), vec!["Check".to_string()]);
    }
}
