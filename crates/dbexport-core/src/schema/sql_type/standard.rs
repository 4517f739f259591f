//! Type grammar for the GoogleSQL-style standard dialect.
//!
//! ```text
//! type     := scalar | STRING len? | BYTES len? | ARRAY '<' type '>' vector?
//!           | STRUCT '<' (member (',' member)*)? '>'
//! len      := '(' (digits | MAX) ')'
//! vector   := '(' 'vector_length' '=>' digits ')'
//! member   := ident type
//! ```
//!
//! Keywords are case-insensitive, so `String(1024)` parses like `STRING(1024)`.

use super::{SqlType, StructField};
use crate::{bail, Result};

pub(crate) fn parse(src: &str) -> Result<SqlType> {
    let mut parser = Parser { src, pos: 0 };
    let ty = parser.parse_type()?;
    parser.skip_ws();
    if parser.pos != src.len() {
        bail!(
            "unexpected trailing input `{}` in type `{src}`",
            &src[parser.pos..]
        );
    }
    Ok(ty)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_type(&mut self) -> Result<SqlType> {
        self.skip_ws();
        let word = self.ident()?;

        let ty = match word.to_ascii_uppercase().as_str() {
            "BOOL" => SqlType::Bool,
            "INT64" => SqlType::Int64,
            "FLOAT32" => SqlType::Float32,
            "FLOAT64" => SqlType::Float64,
            "NUMERIC" => SqlType::Numeric,
            "DATE" => SqlType::Date,
            "TIMESTAMP" => SqlType::Timestamp,
            "JSON" => SqlType::Json,
            "TOKENLIST" => SqlType::TokenList,
            "STRING" => {
                self.length()?;
                SqlType::String
            }
            "BYTES" => {
                self.length()?;
                SqlType::Bytes
            }
            "ARRAY" => {
                self.expect('<')?;
                let elem = self.parse_type()?;
                self.expect('>')?;
                self.vector_length()?;
                SqlType::Array(Box::new(elem))
            }
            "STRUCT" => SqlType::Struct(self.members()?),
            _ => bail!("unknown type `{word}`"),
        };

        Ok(ty)
    }

    fn members(&mut self) -> Result<Vec<StructField>> {
        self.expect('<')?;

        let mut members = vec![];

        if self.eat('>') {
            return Ok(members);
        }

        loop {
            self.skip_ws();
            let name = self.ident()?.to_string();

            if !matches!(self.peek(), Some(c) if c.is_whitespace()) {
                bail!("struct member `{name}` has no type in `{}`", self.src);
            }

            self.skip_ws();
            let start = self.pos;
            let ty = self.parse_type()?;
            let sql_type = self.src[start..self.pos].trim_end().to_string();

            members.push(StructField { name, sql_type, ty });

            if self.eat(',') {
                continue;
            }

            self.expect('>')?;
            return Ok(members);
        }
    }

    /// `(n)` or `(MAX)` after `STRING` and `BYTES`.
    fn length(&mut self) -> Result<()> {
        if !self.eat('(') {
            return Ok(());
        }

        self.skip_ws();
        let len = self.ident()?;
        if !len.eq_ignore_ascii_case("MAX") && !len.bytes().all(|b| b.is_ascii_digit()) {
            bail!("invalid length `{len}` in type `{}`", self.src);
        }

        self.expect(')')
    }

    /// `(vector_length=>n)` after `ARRAY<...>`.
    fn vector_length(&mut self) -> Result<()> {
        if !self.eat('(') {
            return Ok(());
        }

        self.skip_ws();
        let option = self.ident()?;
        if !option.eq_ignore_ascii_case("vector_length") {
            bail!("unknown array option `{option}` in type `{}`", self.src);
        }

        self.skip_ws();
        if !self.src[self.pos..].starts_with("=>") {
            bail!("expected `=>` in type `{}`", self.src);
        }
        self.pos += 2;

        self.skip_ws();
        let len = self.ident()?;
        if !len.bytes().all(|b| b.is_ascii_digit()) {
            bail!("invalid vector length `{len}` in type `{}`", self.src);
        }

        self.expect(')')
    }

    /// A bare or backquoted identifier.
    fn ident(&mut self) -> Result<&'a str> {
        let rest = &self.src[self.pos..];

        if let Some(quoted) = rest.strip_prefix('`') {
            let Some(end) = quoted.find('`') else {
                bail!("unterminated identifier in type `{}`", self.src);
            };
            self.pos += end + 2;
            return Ok(&quoted[..end]);
        }

        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());

        if len == 0 {
            match rest.chars().next() {
                Some(c) => bail!("unexpected `{c}` in type `{}`", self.src),
                None => bail!("unexpected end of type `{}`", self.src),
            }
        }

        self.pos += len;
        Ok(&rest[..len])
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            match self.peek() {
                Some(found) => bail!("expected `{c}`, found `{found}` in type `{}`", self.src),
                None => bail!("expected `{c}` at end of type `{}`", self.src),
            }
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }
}
