// This file is part of cfgscan, a libconfig-family lexical scanner.
// Copyright 2022 Jeffrey Sharp
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
// cfgscan is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// cfgscan is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with cfgscan.  If not, see <http://www.gnu.org/licenses/>.

//! Lexical tokens.

use std::fmt::{self, Display, Formatter};

use crate::location::Location;

/// A single lexical token, together with the location it was scanned at.
///
/// `'a` is the lifetime of the scanner's internal name buffer: a
/// `TokenKind::Name` payload borrows from it and is valid only until the
/// next call to `Scanner::next_token`, per the external interface's
/// payload-ownership rule for `NAME`.
#[derive(Debug, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub loc: Location,
}

/// Lexical token kinds and their payloads.
#[derive(Debug, PartialEq)]
pub enum TokenKind<'a> {
    /// `=` or `:`.
    Equals,
    /// `,`.
    Comma,
    /// `;`.
    Semicolon,
    /// `{`.
    GroupStart,
    /// `}`.
    GroupEnd,
    /// `[`.
    ArrayStart,
    /// `]`.
    ArrayEnd,
    /// `(`.
    ListStart,
    /// `)`.
    ListEnd,
    /// Case-insensitive `true`/`false`.
    Boolean(bool),
    /// An identifier. Borrowed; valid only until the next token pull.
    Name(&'a str),
    /// A quoted string literal, with escapes decoded.
    String(Vec<u8>),
    /// A 32-bit signed decimal or promoted/demoted integer literal.
    Integer(i32),
    /// A 64-bit signed integer literal (`L`/`LL` suffix, or overflow of
    /// the 32-bit forms).
    Integer64(i64),
    /// A 32-bit hexadecimal literal, exposed as its signed bit pattern.
    Hex(i32),
    /// A 64-bit hexadecimal literal (`L`/`LL` suffix).
    Hex64(u64),
    /// A floating-point literal.
    Float(f64),
    /// A byte that matched no rule in `INITIAL` mode.
    Garbage(u8),
    /// A scanner-level failure; see `Scanner::last_error`.
    Error,
    /// End of the token stream: every include frame has been exhausted.
    Eof,
}

impl Display for TokenKind<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use TokenKind::*;
        match self {
            Equals => write!(f, "="),
            Comma => write!(f, ","),
            Semicolon => write!(f, ";"),
            GroupStart => write!(f, "{{"),
            GroupEnd => write!(f, "}}"),
            ArrayStart => write!(f, "["),
            ArrayEnd => write!(f, "]"),
            ListStart => write!(f, "("),
            ListEnd => write!(f, ")"),
            Boolean(b) => write!(f, "{b}"),
            Name(s) => write!(f, "{s}"),
            String(s) => write!(f, "{:?}", std::string::String::from_utf8_lossy(s)),
            Integer(n) => write!(f, "{n}"),
            Integer64(n) => write!(f, "{n}L"),
            Hex(n) => write!(f, "{:#x}", *n as u32),
            Hex64(n) => write!(f, "{n:#x}L"),
            Float(n) => write!(f, "{n}"),
            Garbage(b) => write!(f, "<garbage {b:#04x}>"),
            Error => write!(f, "<error>"),
            Eof => write!(f, "<eof>"),
        }
    }
}
