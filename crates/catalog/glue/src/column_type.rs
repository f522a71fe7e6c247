// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Validation of Glue column type strings.
//!
//! Glue stores column types as Hive type strings, e.g. `bigint`,
//! `decimal(10,2)`, `array<struct<lat:float, lon:float>>`.

use crate::error::{Error, ErrorKind, Result};

const PRIMITIVE_TYPES: [&str; 12] = [
    "boolean",
    "tinyint",
    "smallint",
    "int",
    "integer",
    "bigint",
    "float",
    "double",
    "string",
    "binary",
    "date",
    "timestamp",
];

const MAX_DECIMAL_PRECISION: u32 = 38;
const MAX_CHAR_LENGTH: u32 = 255;
const MAX_VARCHAR_LENGTH: u32 = 65535;

/// Checks that `column_type` is a type the catalog accepts.
pub(crate) fn validate_column_type(column_type: &str) -> Result<()> {
    let mut parser = TypeParser::new(column_type);

    let valid = parser
        .parse_type()
        .and_then(|_| parser.expect_end())
        .is_some();

    if !valid {
        return Err(Error::new(
            ErrorKind::DataInvalid,
            format!("{} is not a valid Glue type", column_type),
        ));
    }

    Ok(())
}

/// Whether a parsed type may be used as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Primitive,
    Complex,
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> Option<()> {
        self.skip_whitespace();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            Some(())
        } else {
            None
        }
    }

    fn peek(&mut self, c: char) -> bool {
        self.skip_whitespace();
        self.rest().starts_with(c)
    }

    fn expect_end(&mut self) -> Option<()> {
        self.skip_whitespace();
        self.rest().is_empty().then_some(())
    }

    fn identifier(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    fn number(&mut self) -> Option<u32> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        rest[..len].parse().ok()
    }

    fn parse_type(&mut self) -> Option<Kind> {
        let name = self.identifier()?.to_ascii_lowercase();

        match name.as_str() {
            "decimal" => self.decimal_args().map(|_| Kind::Primitive),
            "char" => self.length_arg(MAX_CHAR_LENGTH).map(|_| Kind::Primitive),
            "varchar" => self.length_arg(MAX_VARCHAR_LENGTH).map(|_| Kind::Primitive),
            "array" => {
                self.eat('<')?;
                self.parse_type()?;
                self.eat('>')?;
                Some(Kind::Complex)
            }
            "map" => {
                self.eat('<')?;
                if self.parse_type()? != Kind::Primitive {
                    return None;
                }
                self.eat(',')?;
                self.parse_type()?;
                self.eat('>')?;
                Some(Kind::Complex)
            }
            "struct" => {
                self.eat('<')?;
                loop {
                    self.identifier()?;
                    self.eat(':')?;
                    self.parse_type()?;
                    if self.eat(',').is_none() {
                        break;
                    }
                }
                self.eat('>')?;
                Some(Kind::Complex)
            }
            other if PRIMITIVE_TYPES.contains(&other) => Some(Kind::Primitive),
            _ => None,
        }
    }

    /// `decimal`, `decimal(p)` or `decimal(p,s)`.
    fn decimal_args(&mut self) -> Option<()> {
        if !self.peek('(') {
            return Some(());
        }
        self.eat('(')?;
        let precision = self.number()?;
        let scale = if self.eat(',').is_some() {
            self.number()?
        } else {
            0
        };
        self.eat(')')?;

        ((1..=MAX_DECIMAL_PRECISION).contains(&precision) && scale <= precision).then_some(())
    }

    fn length_arg(&mut self, max: u32) -> Option<()> {
        self.eat('(')?;
        let length = self.number()?;
        self.eat(')')?;
        (1..=max).contains(&length).then_some(())
    }
}
