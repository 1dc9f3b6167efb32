//! Static reader for style definition modules.
//!
//! Only the literal subset is understood: imports, `export const X =
//! style({...})`, literal exports and `globalStyle(selector, {...})`.
//! Other top-level statements are skipped without evaluation.

use std::fmt;

/// A literal value inside a style object.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Value {
    Str(String),
    /// Number kept as written, so `1.50` stays `1.50`.
    Num(String),
    Bool(bool),
    Object(Vec<(String, Value)>),
}

pub(super) type Object = Vec<(String, Value)>;

/// Top-level item that contributes CSS or exports, in source order.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Item {
    Style { name: String, object: Object },
    Literal { name: String, value: Value },
    Global { selector: String, object: Object },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct StyleModule {
    pub imports: Vec<String>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parse a whole style module.
pub(super) fn parse_module(src: &str) -> ParseResult<StyleModule> {
    let mut cursor = Cursor::new(src);
    let mut module = StyleModule::default();

    loop {
        cursor.skip_trivia();
        if cursor.eof() {
            break;
        }
        if cursor.at_word("import") {
            module.imports.extend(cursor.import_statement()?);
        } else if cursor.at_word("export") {
            if let Some(item) = cursor.export_statement()? {
                module.items.push(item);
            }
        } else if cursor.at_word("globalStyle") {
            module.items.push(cursor.global_style()?);
        } else {
            cursor.skip_statement();
        }
    }

    Ok(module)
}

/// Collect import specifiers only, ignoring everything else.
///
/// Used for dependency files, which need not be evaluable on their own.
pub(super) fn scan_imports(src: &str) -> Vec<String> {
    let mut cursor = Cursor::new(src);
    let mut imports = Vec::new();

    loop {
        cursor.skip_trivia();
        if cursor.eof() {
            break;
        }
        if cursor.at_word("import") {
            match cursor.import_statement() {
                Ok(spec) => imports.extend(spec),
                Err(_) => cursor.skip_statement(),
            }
        } else {
            cursor.skip_statement();
        }
    }

    imports
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> ParseResult<()> {
        if self.eat(s) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{s}`")))
        }
    }

    /// `word` followed by a non-identifier character.
    fn at_word(&self, word: &str) -> bool {
        let rest = self.rest();
        rest.starts_with(word)
            && !rest[word.len()..]
                .chars()
                .next()
                .is_some_and(is_ident_char)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let before = &self.src[..self.pos];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    match self.rest().find("*/") {
                        Some(end) => self.pos += end + 2,
                        None => self.pos = self.src.len(),
                    }
                }
                _ => return,
            }
        }
    }

    fn ident(&mut self) -> Option<String> {
        let first = self.peek()?;
        if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
            return None;
        }
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        Some(self.src[start..self.pos].to_string())
    }

    /// Quoted string; template literals are accepted without substitutions.
    fn string(&mut self) -> ParseResult<String> {
        let Some(quote @ ('\'' | '"' | '`')) = self.peek() else {
            return Err(self.error("expected string literal"));
        };
        self.bump();

        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string literal")),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated string literal")),
                },
                Some('$') if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error("template substitutions cannot be evaluated statically"));
                }
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Option<String> {
        let start = self.pos;
        self.eat("-");
        let mut digits = 0;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits += 1;
            } else if c != '.' {
                break;
            }
            self.bump();
        }
        if digits == 0 {
            self.pos = start;
            return None;
        }
        Some(self.src[start..self.pos].to_string())
    }

    fn at_quote(&self) -> bool {
        matches!(self.peek(), Some('\'' | '"' | '`'))
    }

    fn at_number(&self) -> bool {
        match (self.peek(), self.peek_second()) {
            (Some(c), _) if c.is_ascii_digit() => true,
            (Some('-' | '.'), Some(c)) => c.is_ascii_digit() || c == '.',
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// `import ... from 'spec'` or `import 'spec'`.
    fn import_statement(&mut self) -> ParseResult<Option<String>> {
        self.eat_word("import");
        self.skip_trivia();
        if self.peek() == Some('(') {
            // dynamic import expression statement
            self.skip_statement();
            return Ok(None);
        }

        loop {
            self.skip_trivia();
            if self.at_quote() {
                let spec = self.string()?;
                self.skip_trivia();
                self.eat(";");
                return Ok(Some(spec));
            }
            if self.bump().is_none() {
                return Err(self.error("unterminated import statement"));
            }
        }
    }

    /// `export const NAME = ...`; type-only exports are skipped.
    fn export_statement(&mut self) -> ParseResult<Option<Item>> {
        self.eat_word("export");
        self.skip_trivia();

        if self.at_word("type") || self.at_word("interface") {
            self.skip_statement();
            return Ok(None);
        }
        if !(self.eat_word("const") || self.eat_word("let") || self.eat_word("var")) {
            return Err(self.error("only `export const` declarations can be evaluated"));
        }

        self.skip_trivia();
        let name = self
            .ident()
            .ok_or_else(|| self.error("expected export name"))?;
        self.skip_trivia();
        if self.eat(":") {
            // type annotation up to `=`
            while !self.eof() && self.peek() != Some('=') {
                self.bump();
            }
        }
        self.expect("=")?;
        self.skip_trivia();

        let item = if self.at_quote() || self.at_number() || self.at_bool() {
            Item::Literal {
                value: self.scalar()?,
                name,
            }
        } else if let Some(callee) = self.ident() {
            self.skip_trivia();
            if callee != "style" || !self.eat("(") {
                return Err(self.error(format!(
                    "export `{name}` must be a style() call or a literal, found `{callee}`"
                )));
            }
            let object = self.call_object_argument()?;
            Item::Style { name, object }
        } else {
            return Err(self.error(format!(
                "export `{name}` must be a style() call or a literal"
            )));
        };

        self.skip_trivia();
        self.eat(";");
        Ok(Some(item))
    }

    /// `globalStyle('selector', {...})`.
    fn global_style(&mut self) -> ParseResult<Item> {
        self.eat_word("globalStyle");
        self.skip_trivia();
        self.expect("(")?;
        self.skip_trivia();
        let selector = self.string()?;
        self.skip_trivia();
        self.expect(",")?;
        let object = self.call_object_argument()?;
        self.skip_trivia();
        self.eat(";");
        Ok(Item::Global { selector, object })
    }

    /// Object literal argument followed by an optional comma and `)`.
    fn call_object_argument(&mut self) -> ParseResult<Object> {
        self.skip_trivia();
        let object = self.object()?;
        self.skip_trivia();
        self.eat(",");
        self.skip_trivia();
        if !self.eat(")") {
            return Err(self.error("style definitions take a single object argument"));
        }
        Ok(object)
    }

    /// Skip to the end of the current statement.
    ///
    /// Ends at `;` or a newline outside any bracket.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                '\'' | '"' | '`' => self.skip_string(),
                '/' if matches!(self.peek_second(), Some('/' | '*')) => {
                    // a line comment ends the line, and so the statement
                    let line_comment = self.peek_second() == Some('/');
                    self.skip_trivia();
                    if line_comment && depth == 0 {
                        return;
                    }
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    self.bump();
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                }
                ';' | '\n' if depth == 0 => {
                    self.bump();
                    return;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn skip_string(&mut self) {
        let Some(quote) = self.bump() else { return };
        while let Some(c) = self.bump() {
            if c == '\\' {
                self.bump();
            } else if c == quote {
                return;
            }
        }
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn at_bool(&self) -> bool {
        self.at_word("true") || self.at_word("false")
    }

    fn scalar(&mut self) -> ParseResult<Value> {
        if self.at_quote() {
            return self.string().map(Value::Str);
        }
        if self.eat_word("true") {
            return Ok(Value::Bool(true));
        }
        if self.eat_word("false") {
            return Ok(Value::Bool(false));
        }
        self.number()
            .map(Value::Num)
            .ok_or_else(|| self.error("expected literal value"))
    }

    fn object(&mut self) -> ParseResult<Object> {
        self.expect("{")?;
        let mut entries = Vec::new();

        loop {
            self.skip_trivia();
            if self.eat("}") {
                return Ok(entries);
            }

            let key = if self.at_quote() {
                self.string()?
            } else if let Some(number) = self.number() {
                number
            } else if let Some(ident) = self.ident() {
                ident
            } else {
                return Err(self.error("expected property key"));
            };

            self.skip_trivia();
            self.expect(":")?;
            self.skip_trivia();
            let value = self.value(&key)?;
            entries.push((key, value));

            self.skip_trivia();
            if !self.eat(",") {
                self.skip_trivia();
                self.expect("}")?;
                return Ok(entries);
            }
        }
    }

    fn value(&mut self, key: &str) -> ParseResult<Value> {
        if self.peek() == Some('{') {
            return self.object().map(Value::Object);
        }
        if self.at_quote() || self.at_number() || self.at_bool() {
            return self.scalar();
        }
        Err(self.error(format!(
            "value of `{key}` is not a literal and cannot be evaluated statically"
        )))
    }
}

#[inline]
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
