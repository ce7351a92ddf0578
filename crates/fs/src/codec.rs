//! 寄存器值编解码
//!
//! 读：`"0x<addr> -> 0x<value>\n"`，均为不带前导零的小写十六进制。
//!
//! 写：接受一个无符号整数字面量，前后的 ASCII 空白（如 `echo` 附带的换行）被忽略：
//!
//! | 前缀 | 进制 |
//! |---|---|
//! | `0x` / `0X` | 16 |
//! | `0o` / `0O` | 8 |
//! | `0b` / `0B` | 2 |
//! | 无 | 10（前导零不表示八进制） |
//!
//! 空输入、非法字符、符号、尾随垃圾和超过 64 位的值都会被拒绝，绝不会被当作 0。

use std::num::IntErrorKind;

use thiserror::Error;

/// 写入值解析错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// 输入为空（或只有空白）
    #[error("empty write value")]
    Empty,
    /// 不是合法的数字字面量
    #[error("malformed write value '{0}'")]
    Malformed(String),
    /// 超过 64 位
    #[error("write value '{0}' does not fit in 64 bits")]
    Overflow(String),
}

/// 格式化一次寄存器读取的结果
pub fn format_read_result(addr: u64, value: u64) -> String {
    format!("{addr:#x} -> {value:#x}\n")
}

/// 解析写入寄存器文件的数据
pub fn parse_write_value(data: &[u8]) -> Result<u64, ParseError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ParseError::Malformed(String::from_utf8_lossy(data).into_owned()))?;
    let literal = text.trim_ascii();
    if literal.is_empty() {
        return Err(ParseError::Empty);
    }

    let (radix, digits) = split_radix(literal);
    // from_str_radix 接受前导 '+'，这里只允许纯数字
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ParseError::Malformed(literal.to_string()));
    }

    u64::from_str_radix(digits, radix).map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow => ParseError::Overflow(literal.to_string()),
        _ => ParseError::Malformed(literal.to_string()),
    })
}

fn split_radix(literal: &str) -> (u32, &str) {
    let bytes = literal.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => return (16, &literal[2..]),
            b'o' | b'O' => return (8, &literal[2..]),
            b'b' | b'B' => return (2, &literal[2..]),
            _ => {}
        }
    }
    (10, literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_read_result() {
        assert_eq!(format_read_result(0x1000_0004, 0xbeef), "0x10000004 -> 0xbeef\n");
        assert_eq!(format_read_result(0, 0), "0x0 -> 0x0\n");
        assert_eq!(
            format_read_result(u64::MAX, u64::MAX),
            "0xffffffffffffffff -> 0xffffffffffffffff\n"
        );
    }

    #[test]
    fn test_parse_hex_and_decimal() {
        assert_eq!(parse_write_value(b"0x10"), Ok(16));
        assert_eq!(parse_write_value(b"0XfF"), Ok(255));
        assert_eq!(parse_write_value(b"16"), Ok(16));
        assert_eq!(parse_write_value(b"0"), Ok(0));
        assert_eq!(parse_write_value(b"010"), Ok(10));
    }

    #[test]
    fn test_parse_octal_and_binary() {
        assert_eq!(parse_write_value(b"0o17"), Ok(15));
        assert_eq!(parse_write_value(b"0b1010"), Ok(10));
    }

    #[test]
    fn test_parse_ignores_surrounding_whitespace() {
        assert_eq!(parse_write_value(b"0x10\n"), Ok(16));
        assert_eq!(parse_write_value(b"  42\t\r\n"), Ok(42));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_write_value(b""), Err(ParseError::Empty));
        assert_eq!(parse_write_value(b" \n"), Err(ParseError::Empty));
    }

    #[test]
    fn test_parse_malformed() {
        let inputs: [&[u8]; 9] = [
            b"notanumber",
            b"0x",
            b"0x10zz",
            b"12 34",
            b"+5",
            b"-1",
            b"0b102",
            b"1.5",
            b"\xff\xfe",
        ];
        for input in inputs {
            assert!(
                matches!(parse_write_value(input), Err(ParseError::Malformed(_))),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_parse_overflow() {
        assert_eq!(parse_write_value(b"0xffffffffffffffff"), Ok(u64::MAX));
        assert!(matches!(
            parse_write_value(b"0x10000000000000000"),
            Err(ParseError::Overflow(_))
        ));
        assert!(matches!(
            parse_write_value(b"18446744073709551616"),
            Err(ParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_format_then_parse_round_trip() {
        for value in [0u64, 1, 0xff, 0xbeef, 0xdead_beef, u64::MAX] {
            let text = format_read_result(0x4000, value);
            let (_, shown) = text.trim_end().split_once(" -> ").unwrap();
            assert_eq!(parse_write_value(shown.as_bytes()), Ok(value));
        }
    }
}
