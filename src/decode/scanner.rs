use memchr::memchr;

use crate::constants::{DICT_BEGIN, END, INTEGER_BEGIN, LENGTH_SEP, LIST_BEGIN};
use crate::error::{Error, ErrorKind};
use crate::options::DecodeOptions;
use crate::Result;

/// One structural unit of the wire format. Integer and byte-string tokens
/// carry spans borrowed from the input buffer; nothing is copied here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'de> {
    ListBegin,
    DictBegin,
    End,
    /// Digit span including an optional leading `-`, already validated
    /// against the grammar (no leading zeros, no `-0`).
    Integer(&'de [u8]),
    /// Raw payload of a length-prefixed byte string.
    Bytes(&'de [u8]),
}

impl Token<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            Token::ListBegin => "list",
            Token::DictBegin => "dictionary",
            Token::End => "end of container",
            Token::Integer(_) => "integer",
            Token::Bytes(_) => "byte string",
        }
    }
}

pub struct Scanner<'de> {
    input: &'de [u8],
    position: usize,
    depth: usize,
    max_depth: usize,
}

impl<'de> Scanner<'de> {
    pub fn new(input: &'de [u8], options: &DecodeOptions) -> Self {
        Self {
            input,
            position: 0,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    /// Yields the next token, or `Ok(None)` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token<'de>>> {
        let Some(byte) = self.peek() else {
            return Ok(None);
        };
        match byte {
            INTEGER_BEGIN => self.scan_integer().map(Some),
            b'0'..=b'9' => self.scan_bytes().map(Some),
            LIST_BEGIN => {
                self.enter()?;
                self.position += 1;
                Ok(Some(Token::ListBegin))
            }
            DICT_BEGIN => {
                self.enter()?;
                self.position += 1;
                Ok(Some(Token::DictBegin))
            }
            END => {
                // Depth never wraps; an `End` with no open container is
                // rejected by the decoder as an out-of-place token.
                self.depth = self.depth.saturating_sub(1);
                self.position += 1;
                Ok(Some(Token::End))
            }
            other => Err(Error::at(
                ErrorKind::UnexpectedCharacter(other as char),
                self.position,
            )),
        }
    }

    /// Consumes and discards exactly one full value, including arbitrarily
    /// nested containers, without materializing it.
    pub fn skip_value(&mut self) -> Result<()> {
        let start = self.depth;
        match self.next_token()? {
            Some(Token::Integer(_)) | Some(Token::Bytes(_)) => Ok(()),
            Some(Token::ListBegin) | Some(Token::DictBegin) => {
                while self.depth > start {
                    if self.next_token()?.is_none() {
                        return Err(Error::at(ErrorKind::UnexpectedEnd, self.position));
                    }
                }
                Ok(())
            }
            // An `End` here closes the enclosing container instead of
            // starting a value: structurally invalid input.
            Some(Token::End) | None => Err(Error::at(ErrorKind::UnexpectedEnd, self.position)),
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::at(
                ErrorKind::DepthExceeded(self.max_depth),
                self.position,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn scan_integer(&mut self) -> Result<Token<'de>> {
        let start = self.position + 1;
        let Some(len) = memchr(END, &self.input[start..]) else {
            return Err(Error::at(ErrorKind::UnexpectedEnd, self.input.len()));
        };
        let span = &self.input[start..start + len];
        validate_integer(span).map_err(|kind| Error::at(kind, start))?;
        self.position = start + len + 1;
        Ok(Token::Integer(span))
    }

    fn scan_bytes(&mut self) -> Result<Token<'de>> {
        let start = self.position;
        let Some(len) = memchr(LENGTH_SEP, &self.input[start..]) else {
            return Err(Error::at(ErrorKind::UnexpectedEnd, self.input.len()));
        };
        let length =
            parse_length(&self.input[start..start + len]).map_err(|kind| Error::at(kind, start))?;
        let payload_start = start + len + 1;
        let payload_end = payload_start
            .checked_add(length)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| Error::at(ErrorKind::UnexpectedEnd, self.input.len()))?;
        self.position = payload_end;
        Ok(Token::Bytes(&self.input[payload_start..payload_end]))
    }
}

fn validate_integer(span: &[u8]) -> std::result::Result<(), ErrorKind> {
    let digits = match span {
        [b'-', rest @ ..] => rest,
        _ => span,
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ErrorKind::InvalidInteger);
    }
    // A single `0` is the only digit run allowed to start with zero,
    // and it must not carry a sign.
    if digits[0] == b'0' && (digits.len() > 1 || span[0] == b'-') {
        return Err(ErrorKind::InvalidInteger);
    }
    Ok(())
}

fn parse_length(digits: &[u8]) -> std::result::Result<usize, ErrorKind> {
    if digits.len() > 1 && digits[0] == b'0' {
        return Err(ErrorKind::InvalidInteger);
    }
    let mut length = 0usize;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return Err(ErrorKind::InvalidByteString);
        }
        length = length
            .checked_mul(10)
            .and_then(|length| length.checked_add(usize::from(byte - b'0')))
            .ok_or(ErrorKind::InvalidByteString)?;
    }
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(input: &[u8]) -> Result<Vec<Token<'_>>> {
        let mut scanner = Scanner::new(input, &DecodeOptions::default());
        let mut tokens = Vec::new();
        while let Some(token) = scanner.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    #[rstest::rstest]
    fn test_scan_scalars() {
        assert_eq!(
            scan_all(b"i-42e4:spam0:").unwrap(),
            vec![
                Token::Integer(b"-42"),
                Token::Bytes(b"spam"),
                Token::Bytes(b""),
            ]
        );
    }

    #[rstest::rstest]
    fn test_scan_containers_track_depth() {
        let mut scanner = Scanner::new(b"ld1:kee", &DecodeOptions::default());
        assert_eq!(scanner.next_token().unwrap(), Some(Token::ListBegin));
        assert_eq!(scanner.depth(), 1);
        assert_eq!(scanner.next_token().unwrap(), Some(Token::DictBegin));
        assert_eq!(scanner.depth(), 2);
        assert_eq!(scanner.next_token().unwrap(), Some(Token::Bytes(b"k")));
        assert_eq!(scanner.next_token().unwrap(), Some(Token::End));
        assert_eq!(scanner.next_token().unwrap(), Some(Token::End));
        assert_eq!(scanner.depth(), 0);
        assert_eq!(scanner.next_token().unwrap(), None);
    }

    #[rstest::rstest]
    #[case(b"ie".as_slice())]
    #[case(b"i-0e".as_slice())]
    #[case(b"i01e".as_slice())]
    #[case(b"i-e".as_slice())]
    #[case(b"i1x2e".as_slice())]
    fn test_invalid_integers(#[case] input: &[u8]) {
        let err = scan_all(input).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidInteger));
    }

    #[rstest::rstest]
    fn test_unterminated_integer() {
        let err = scan_all(b"i12").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEnd));
    }

    #[rstest::rstest]
    fn test_byte_string_leading_zero_length() {
        let err = scan_all(b"01:a").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidInteger));
    }

    #[rstest::rstest]
    fn test_byte_string_short_payload() {
        let err = scan_all(b"4:spa").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEnd));
    }

    #[rstest::rstest]
    fn test_unexpected_character() {
        let err = scan_all(b"x").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedCharacter('x')));
    }

    #[rstest::rstest]
    fn test_skip_scalar_and_nested() {
        let mut scanner = Scanner::new(b"d1:ai1e1:bld2:xxi2eeee", &DecodeOptions::default());
        assert_eq!(scanner.next_token().unwrap(), Some(Token::DictBegin));
        assert_eq!(scanner.next_token().unwrap(), Some(Token::Bytes(b"a")));
        scanner.skip_value().unwrap();
        assert_eq!(scanner.next_token().unwrap(), Some(Token::Bytes(b"b")));
        scanner.skip_value().unwrap();
        assert_eq!(scanner.next_token().unwrap(), Some(Token::End));
        assert_eq!(scanner.next_token().unwrap(), None);
    }

    #[rstest::rstest]
    fn test_skip_unterminated_container() {
        let mut scanner = Scanner::new(b"li1e", &DecodeOptions::default());
        let err = scanner.skip_value().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEnd));
    }
}
