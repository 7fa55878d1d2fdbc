use super::base_stream::BaseStream;
use super::error::{PDFError, PDFResult};

/// PDF token types returned by the Lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// End of file marker
    EOF,

    /// Boolean value
    Boolean(bool),

    /// Null value
    Null,

    /// Integer value (no decimal point, no exponent)
    Integer(i64),

    /// Real (floating point) value
    Real(f64),

    /// String value (from literal strings like (hello))
    String(Vec<u8>),

    /// Hex string value (from hex strings like <48656c6c6f>)
    HexString(Vec<u8>),

    /// Name value (from /Name)
    Name(String),

    /// One of the fixed PDF structural keywords: obj, endobj, stream,
    /// endstream, xref, trailer, startxref, R, n, f.
    Symbol(String),

    /// Any other command/operator (content-stream operators like 'q', 'Tj', ...)
    Command(String),

    /// Array start '['
    ArrayStart,

    /// Array end ']'
    ArrayEnd,

    /// Dictionary start '<<'
    DictStart,

    /// Dictionary end '>>'
    DictEnd,

    /// PostScript-calculator-function brace start '{'
    BraceStart,

    /// PostScript-calculator-function brace end '}'
    BraceEnd,
}

/// The fixed set of PDF structural keywords (spec §3's Symbol kind).
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "obj", "endobj", "stream", "endstream", "xref", "trailer", "startxref", "R", "n", "f",
];

/// PDF Lexer for tokenizing PDF syntax.
///
/// Handles whitespace/comment skipping, number parsing (integers, reals,
/// scientific notation), literal and hex string parsing, name parsing, and
/// command/keyword parsing.
pub struct Lexer {
    /// The input stream
    stream: Box<dyn BaseStream>,

    /// Current character being examined
    current_char: i32,

    /// Buffer for building strings
    str_buf: Vec<u8>,
}

impl Lexer {
    /// Creates a new Lexer from a stream.
    pub fn new(mut stream: Box<dyn BaseStream>) -> PDFResult<Self> {
        let current_char = Self::read_char(&mut stream)?;

        Ok(Lexer {
            stream,
            current_char,
            str_buf: Vec::new(),
        })
    }

    /// Reads the next character from the stream. Returns -1 on EOF.
    fn read_char(stream: &mut Box<dyn BaseStream>) -> PDFResult<i32> {
        match stream.get_byte() {
            Ok(byte) => Ok(byte as i32),
            Err(PDFError::UnexpectedEndOfStream) => Ok(-1),
            Err(e) => Err(e),
        }
    }

    /// Advances to the next character.
    fn next_char(&mut self) -> PDFResult<i32> {
        self.current_char = Self::read_char(&mut self.stream)?;
        Ok(self.current_char)
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> PDFResult<i32> {
        match self.stream.peek_byte() {
            Ok(byte) => Ok(byte as i32),
            Err(PDFError::UnexpectedEndOfStream) => Ok(-1),
            Err(e) => Err(e),
        }
    }

    /// Returns the byte offset of the character the lexer is currently sitting on.
    ///
    /// Used by the object parser to record a stream's content start position.
    pub fn stream_pos(&self) -> usize {
        self.stream.pos()
    }

    /// Checks if a character is whitespace according to PDF spec.
    ///
    /// PDF whitespace: NUL, TAB, LF, FF, CR, SPACE
    fn is_whitespace(ch: i32) -> bool {
        matches!(ch, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
    }

    /// Checks if a character is a delimiter according to PDF spec.
    ///
    /// PDF delimiters: ( ) < > [ ] { } / %
    fn is_delimiter(ch: i32) -> bool {
        matches!(
            ch,
            0x28 | 0x29 | 0x3C | 0x3E | 0x5B | 0x5D | 0x7B | 0x7D | 0x2F | 0x25
        )
    }

    /// Checks if a character is special (whitespace or delimiter).
    fn is_special(ch: i32) -> bool {
        Self::is_whitespace(ch) || Self::is_delimiter(ch)
    }

    /// Skips whitespace and comments.
    fn skip_whitespace_and_comments(&mut self) -> PDFResult<()> {
        let mut comment = false;

        loop {
            let ch = self.current_char;

            if ch < 0 {
                break;
            }

            if comment {
                if ch == 0x0A || ch == 0x0D {
                    comment = false;
                }
            } else if ch == 0x25 {
                comment = true;
            } else if !Self::is_whitespace(ch) {
                break;
            }

            self.next_char()?;
        }

        Ok(())
    }

    /// Consumes exactly one end-of-line marker after the `stream` keyword.
    ///
    /// Accepts CRLF or a lone LF as conformant; per spec §4.2 a lone CR is
    /// not acceptable but is tolerated here for the sake of real-world files.
    pub fn skip_stream_eol(&mut self) -> PDFResult<()> {
        match self.current_char {
            0x0D => {
                self.next_char()?;
                if self.current_char == 0x0A {
                    self.next_char()?;
                }
            }
            0x0A => {
                self.next_char()?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Reads exactly `length` raw bytes starting at the lexer's current
    /// position, bypassing tokenization. Used to read stream bodies whose
    /// `/Length` is known.
    pub fn read_stream_bytes(&mut self, length: usize) -> PDFResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(length);
        for _ in 0..length {
            if self.current_char < 0 {
                return Err(PDFError::UnexpectedEndOfStream);
            }
            bytes.push(self.current_char as u8);
            self.next_char()?;
        }
        Ok(bytes)
    }

    /// Reads raw bytes until the literal marker `endstream`, for stream
    /// bodies whose `/Length` is missing or unresolvable. Trailing
    /// whitespace immediately before the marker is trimmed, and the marker
    /// itself is consumed.
    pub fn scan_until_endstream(&mut self) -> PDFResult<Vec<u8>> {
        const MARKER: &[u8] = b"endstream";
        let mut bytes = Vec::new();
        let mut match_len = 0usize;

        loop {
            if self.current_char < 0 {
                return Err(PDFError::corrupted_pdf(
                    "unexpected end of file while scanning for endstream",
                ));
            }
            let byte = self.current_char as u8;
            bytes.push(byte);

            if byte == MARKER[match_len] {
                match_len += 1;
                if match_len == MARKER.len() {
                    bytes.truncate(bytes.len() - MARKER.len());
                    while matches!(bytes.last(), Some(b'\n') | Some(b'\r') | Some(b' ')) {
                        bytes.pop();
                    }
                    self.next_char()?;
                    break;
                }
            } else {
                match_len = 0;
            }

            self.next_char()?;
        }

        Ok(bytes)
    }

    /// Gets the next token/object from the stream.
    pub fn get_object(&mut self) -> PDFResult<Token> {
        self.skip_whitespace_and_comments()?;

        let ch = self.current_char;

        if ch < 0 {
            return Ok(Token::EOF);
        }

        match ch {
            // Numbers: 0-9, +, -, .
            0x30..=0x39 | 0x2B | 0x2D | 0x2E => self.get_number(),

            // Literal string: (
            0x28 => self.get_string(),

            // Name: /
            0x2F => self.get_name(),

            // Array start: [
            0x5B => {
                self.next_char()?;
                Ok(Token::ArrayStart)
            }

            // Array end: ]
            0x5D => {
                self.next_char()?;
                Ok(Token::ArrayEnd)
            }

            // Hex string or dict start: <
            0x3C => {
                let next_ch = self.next_char()?;
                if next_ch == 0x3C {
                    self.next_char()?;
                    Ok(Token::DictStart)
                } else {
                    self.get_hex_string()
                }
            }

            // Dict end: >
            0x3E => {
                let next_ch = self.next_char()?;
                if next_ch == 0x3E {
                    self.next_char()?;
                    Ok(Token::DictEnd)
                } else {
                    Err(PDFError::Generic(format!(
                        "Unexpected character: >{}",
                        next_ch
                    )))
                }
            }

            // Closing paren is an error if encountered here
            0x29 => {
                self.next_char()?;
                Err(PDFError::Generic(format!("Illegal character: {}", ch)))
            }

            // PostScript calculator function brace start: {
            0x7B => {
                self.next_char()?;
                Ok(Token::BraceStart)
            }

            // PostScript calculator function brace end: }
            0x7D => {
                self.next_char()?;
                Ok(Token::BraceEnd)
            }

            // Everything else is a command/keyword
            _ => self.get_command(),
        }
    }

    /// Parses a number token, producing an Integer or Real token depending
    /// on whether a decimal point or exponent was present in the lexeme.
    fn get_number(&mut self) -> PDFResult<Token> {
        let mut ch = self.current_char;
        let mut e_notation = false;
        let mut divide_by = 0.0;
        let mut sign = 1.0;

        if ch == 0x2D {
            sign = -1.0;
            ch = self.next_char()?;

            // Ignore double negative (consistent with Adobe Reader)
            if ch == 0x2D {
                ch = self.next_char()?;
            }
        } else if ch == 0x2B {
            ch = self.next_char()?;
        }

        // Ignore line-breaks after sign (consistent with Adobe Reader)
        if ch == 0x0A || ch == 0x0D {
            loop {
                ch = self.next_char()?;
                if ch != 0x0A && ch != 0x0D {
                    break;
                }
            }
        }

        if ch == 0x2E {
            divide_by = 10.0;
            ch = self.next_char()?;
        }

        if ch < 0x30 || ch > 0x39 {
            // Not a digit; return 0 for invalid numbers followed by
            // whitespace/delimiters/EOF (consistent with Adobe Reader).
            if Self::is_whitespace(ch) || ch == 0x28 || ch == 0x3C || ch == -1 {
                return Ok(Token::Integer(0));
            }
            return Err(PDFError::Generic(format!(
                "Invalid number: {} (charCode {})",
                if ch >= 0 {
                    (ch as u8 as char).to_string()
                } else {
                    "EOF".to_string()
                },
                ch
            )));
        }

        let mut base_value = (ch - 0x30) as f64;
        let mut power_value = 0;
        let mut power_value_sign = 1;

        loop {
            ch = self.next_char()?;
            if ch < 0 {
                break;
            }

            if ch >= 0x30 && ch <= 0x39 {
                let current_digit = (ch - 0x30) as f64;
                if e_notation {
                    power_value = power_value * 10 + (ch - 0x30);
                } else {
                    if divide_by != 0.0 {
                        divide_by *= 10.0;
                    }
                    base_value = base_value * 10.0 + current_digit;
                }
            } else if ch == 0x2E {
                if divide_by == 0.0 {
                    divide_by = 1.0;
                } else {
                    // A number can have only one dot
                    break;
                }
            } else if ch == 0x2D {
                // Ignore minus signs in the middle, matching Adobe's behavior
            } else if ch == 0x45 || ch == 0x65 {
                let peek_ch = self.peek_char()?;
                if peek_ch == 0x2B || peek_ch == 0x2D {
                    power_value_sign = if peek_ch == 0x2D { -1 } else { 1 };
                    self.next_char()?;
                } else if peek_ch < 0x30 || peek_ch > 0x39 {
                    break;
                }
                e_notation = true;
            } else {
                break;
            }
        }

        let is_real = divide_by != 0.0 || e_notation;

        if !is_real {
            return Ok(Token::Integer((sign * base_value) as i64));
        }

        let mut result = base_value;
        if divide_by != 0.0 {
            result /= divide_by;
        }
        if e_notation {
            result *= 10_f64.powi(power_value_sign * power_value);
        }

        Ok(Token::Real(sign * result))
    }

    /// Parses a literal string token.
    fn get_string(&mut self) -> PDFResult<Token> {
        let mut num_paren = 1;
        self.str_buf.clear();

        let mut ch = self.next_char()?;

        loop {
            let mut char_buffered = false;

            match ch {
                -1 => break,

                0x28 => {
                    num_paren += 1;
                    self.str_buf.push(b'(');
                }

                0x29 => {
                    num_paren -= 1;
                    if num_paren == 0 {
                        self.next_char()?;
                        break;
                    }
                    self.str_buf.push(b')');
                }

                0x5C => {
                    ch = self.next_char()?;
                    match ch {
                        -1 => break,
                        0x6E => self.str_buf.push(b'\n'),
                        0x72 => self.str_buf.push(b'\r'),
                        0x74 => self.str_buf.push(b'\t'),
                        0x62 => self.str_buf.push(0x08),
                        0x66 => self.str_buf.push(0x0C),
                        0x5C | 0x28 | 0x29 => {
                            self.str_buf.push(ch as u8);
                        }
                        0x30..=0x37 => {
                            // Octal escape \ddd (1-3 digits)
                            let mut x = (ch & 0x0F) as u8;
                            ch = self.next_char()?;
                            char_buffered = true;

                            if ch >= 0x30 && ch <= 0x37 {
                                x = (x << 3) + (ch & 0x0F) as u8;
                                ch = self.next_char()?;

                                if ch >= 0x30 && ch <= 0x37 {
                                    char_buffered = false;
                                    x = (x << 3) + (ch & 0x0F) as u8;
                                }
                            }
                            self.str_buf.push(x);
                        }
                        0x0D => {
                            if self.peek_char()? == 0x0A {
                                self.next_char()?;
                            }
                        }
                        0x0A => {}
                        _ => {
                            self.str_buf.push(ch as u8);
                        }
                    }
                }

                _ => {
                    self.str_buf.push(ch as u8);
                }
            }

            if !char_buffered {
                ch = self.next_char()?;
            }
        }

        Ok(Token::String(self.str_buf.clone()))
    }

    /// Converts a hex character to its numeric value, or -1 if invalid.
    fn to_hex_digit(ch: i32) -> i32 {
        if ch >= 0x30 && ch <= 0x39 {
            ch & 0x0F
        } else if (ch >= 0x41 && ch <= 0x46) || (ch >= 0x61 && ch <= 0x66) {
            (ch & 0x0F) + 9
        } else {
            -1
        }
    }

    /// Parses a hex string token: <48656c6c6f>
    fn get_hex_string(&mut self) -> PDFResult<Token> {
        self.str_buf.clear();
        let mut ch = self.current_char;
        let mut first_digit = -1;

        loop {
            if ch < 0 {
                break;
            } else if ch == 0x3E {
                self.next_char()?;
                break;
            } else if Self::is_whitespace(ch) {
                ch = self.next_char()?;
                continue;
            } else {
                let digit = Self::to_hex_digit(ch);
                if digit == -1 {
                    // Invalid hex digit - skip it
                } else if first_digit == -1 {
                    first_digit = digit;
                } else {
                    self.str_buf.push(((first_digit << 4) | digit) as u8);
                    first_digit = -1;
                }
                ch = self.next_char()?;
            }
        }

        // Odd number of hex digits: assume the final digit is 0
        if first_digit != -1 {
            self.str_buf.push((first_digit << 4) as u8);
        }

        Ok(Token::HexString(self.str_buf.clone()))
    }

    /// Parses a name token. Names start with '/' and continue until
    /// whitespace or a delimiter; handles '#hh' escape sequences.
    fn get_name(&mut self) -> PDFResult<Token> {
        self.str_buf.clear();

        let mut ch = self.next_char()?;

        while ch >= 0 && !Self::is_special(ch) {
            if ch == 0x23 {
                ch = self.next_char()?;

                if Self::is_special(ch) {
                    self.str_buf.push(b'#');
                    break;
                }

                let x = Self::to_hex_digit(ch);
                if x != -1 {
                    let previous_ch = ch;
                    ch = self.next_char()?;
                    let x2 = Self::to_hex_digit(ch);

                    if x2 == -1 {
                        self.str_buf.push(b'#');
                        self.str_buf.push(previous_ch as u8);

                        if Self::is_special(ch) {
                            break;
                        }
                        self.str_buf.push(ch as u8);
                        ch = self.next_char()?;
                        continue;
                    }

                    self.str_buf.push(((x << 4) | x2) as u8);
                } else {
                    self.str_buf.push(b'#');
                    self.str_buf.push(ch as u8);
                }
            } else {
                self.str_buf.push(ch as u8);
            }

            ch = self.next_char()?;
        }

        let name = String::from_utf8_lossy(&self.str_buf).to_string();

        Ok(Token::Name(name))
    }

    /// Parses a command/keyword token, recognizing `true`/`false`/`null`
    /// and the fixed structural keyword set (spec §3's Symbol kind).
    fn get_command(&mut self) -> PDFResult<Token> {
        let mut str_buf = String::new();
        let mut ch = self.current_char;

        while ch >= 0 && !Self::is_special(ch) {
            if str_buf.len() >= 128 {
                return Err(PDFError::Generic(format!(
                    "Command token too long: {}",
                    str_buf.len()
                )));
            }

            str_buf.push(ch as u8 as char);
            ch = self.next_char()?;
        }

        if str_buf == "true" {
            return Ok(Token::Boolean(true));
        }
        if str_buf == "false" {
            return Ok(Token::Boolean(false));
        }
        if str_buf == "null" {
            return Ok(Token::Null);
        }
        if STRUCTURAL_KEYWORDS.contains(&str_buf.as_str()) {
            return Ok(Token::Symbol(str_buf));
        }

        Ok(Token::Command(str_buf))
    }
}
