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

//! The scanner state machine: mode-switching lexer over a libconfig-family
//! byte stream, reading through the include stack and writing into the
//! string accumulator.

mod accumulator;
mod escape;
mod number;
pub mod token;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use accumulator::Accumulator;
use number::Number;
use token::TokenKind;

use crate::error::{IncludeError, ScanError};
use crate::include::{ByteSource, DirPushOutcome, IncludeStack, PopOutcome};
use crate::location::Location;

/// The exclusive lexer modes. Each selects a disjoint pattern set; the
/// tokenizer is a pure function of `(mode, byte, include stack)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mode {
    Initial,
    Comment,
    String,
    IncludeF,
    IncludeD,
}

/// A lexical scanner over one root file (or in-memory byte buffer) and
/// whatever it transitively `@include`s.
pub struct Scanner {
    stack: IncludeStack,
    accumulator: Accumulator,
    mode: Mode,
    /// Scratch buffer for the current `NAME` lexeme. Owned directly by the
    /// scanner (not by any include frame) so that a `TokenKind::Name`
    /// borrow stays valid across the frame pops that drive ordinary
    /// tokenizing — it is invalidated only by the *next* `next_token`
    /// call, exactly the contract the external interface promises.
    name_buf: String,
    /// Tracks whether only spaces/tabs have been consumed since the start
    /// of the current line, i.e. whether an `@include`/`@include_dir`
    /// directive could legally start here.
    at_line_start: bool,
    last_error: Option<ScanError>,
}

impl Scanner {
    /// Opens `path` and scans it as the root file.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Ok(Self::from_bytes(bytes, path.to_path_buf()))
    }

    /// Scans `bytes` as the root file, attributed to `path` for error
    /// messages and as the base directory for relative includes. `path`
    /// need not exist on disk; this is primarily useful for tests and for
    /// embedding configuration text that did not come from a file.
    pub fn from_bytes(bytes: Vec<u8>, path: impl Into<PathBuf>) -> Self {
        let path: Rc<Path> = Rc::from(path.into());
        Self {
            stack: IncludeStack::new(path, bytes),
            accumulator: Accumulator::default(),
            mode: Mode::Initial,
            name_buf: String::new(),
            at_line_start: true,
            last_error: None,
        }
    }

    /// Returns the diagnostic behind the most recently emitted
    /// `TokenKind::Error`, if any.
    pub fn last_error(&self) -> Option<&ScanError> {
        self.last_error.as_ref()
    }

    /// Produces the next token, or `TokenKind::Eof` once the include stack
    /// (root included) has been fully consumed.
    pub fn next_token(&mut self) -> token::Token<'_> {
        let kind = self.next_token_kind();
        let loc = self.loc();
        token::Token { kind, loc }
    }

    fn loc(&self) -> Location {
        Location::new(self.stack.active_path(), self.stack.active_line())
    }

    fn record_error(&mut self, text: impl Into<String>) -> TokenKind<'static> {
        let path = self.stack.active_path();
        let line = self.stack.active_line();
        self.last_error = Some(ScanError::new(text, Some(&path), line));
        TokenKind::Error
    }

    fn record_include_error(&mut self, err: IncludeError) -> TokenKind<'static> {
        let path = err.path().to_path_buf();
        let text = err.to_string();
        let line = self.stack.active_line();
        self.last_error = Some(ScanError::new(text, Some(&path), line));
        TokenKind::Error
    }

    // -- cursor helpers over the active frame ---------------------------

    fn source(&self) -> &ByteSource {
        &self.stack.top().source
    }

    fn source_mut(&mut self) -> &mut ByteSource {
        &mut self.stack.top_mut().source
    }

    fn peek(&self) -> Option<u8> {
        self.source().peek()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source().peek_at(offset)
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.source_mut().advance();
        match byte {
            Some(b'\n') => {
                self.stack.top_mut().line += 1;
                self.at_line_start = true;
            }
            Some(b' ') | Some(b'\t') => {}
            Some(_) => self.at_line_start = false,
            None => {}
        }
        byte
    }

    // -- the main loop: dispatch on mode, restart on EOF handling --------

    /// Runs the mode dispatch loop until it has a token's worth of kind to
    /// report. Also used internally after a successful `@include*` push,
    /// since directives themselves never produce a token of their own.
    fn next_token_kind(&mut self) -> TokenKind<'_> {
        loop {
            if self.source().is_eof() {
                match self.on_eof() {
                    EofOutcome::Emit(kind) => return kind,
                    EofOutcome::Continue => continue,
                    EofOutcome::EndOfStream => return TokenKind::Eof,
                }
            }

            match self.mode {
                Mode::Initial => {
                    if let Some(kind) = self.scan_initial() {
                        return kind;
                    }
                }
                Mode::Comment => self.scan_comment(),
                Mode::String => return self.finish_quoted(true),
                Mode::IncludeF => return self.finish_include_file(),
                Mode::IncludeD => return self.finish_include_dir(),
            }
        }
    }

    // -- end of buffer ----------------------------------------------------

    fn on_eof(&mut self) -> EofOutcome {
        let unterminated = match self.mode {
            Mode::Comment => Some("unterminated block comment at end of file"),
            Mode::String => Some("unterminated string literal at end of file"),
            Mode::IncludeF | Mode::IncludeD => Some("unterminated include path at end of file"),
            Mode::Initial => None,
        };

        if let Some(text) = unterminated {
            self.mode = Mode::Initial;
            self.accumulator.clear();
            return EofOutcome::Emit(self.record_error(text));
        }

        match self.stack.pop() {
            PopOutcome::Continue => {
                self.at_line_start = true;
                EofOutcome::Continue
            }
            PopOutcome::ContinueWithError(err) => {
                self.at_line_start = true;
                EofOutcome::Emit(self.record_include_error(err))
            }
            PopOutcome::EndOfStream => EofOutcome::EndOfStream,
        }
    }

    // -- INITIAL mode -----------------------------------------------------

    fn scan_initial(&mut self) -> Option<TokenKind<'_>> {
        let b = self.peek()?;

        match b {
            b'\n' | b'\r' | 0x0c | b' ' | b'\t' => {
                self.bump();
                None
            }
            b'#' => {
                self.skip_line_comment();
                None
            }
            b'/' if self.peek_at(1) == Some(b'/') => {
                self.skip_line_comment();
                None
            }
            b'/' if self.peek_at(1) == Some(b'*') => {
                self.bump();
                self.bump();
                self.mode = Mode::Comment;
                None
            }
            b'"' => {
                self.bump();
                self.accumulator.clear();
                self.mode = Mode::String;
                None
            }
            b'@' if self.at_line_start && self.try_start_directive() => None,
            b'=' | b':' => {
                self.bump();
                Some(TokenKind::Equals)
            }
            b',' => {
                self.bump();
                Some(TokenKind::Comma)
            }
            b';' => {
                self.bump();
                Some(TokenKind::Semicolon)
            }
            b'{' => {
                self.bump();
                Some(TokenKind::GroupStart)
            }
            b'}' => {
                self.bump();
                Some(TokenKind::GroupEnd)
            }
            b'[' => {
                self.bump();
                Some(TokenKind::ArrayStart)
            }
            b']' => {
                self.bump();
                Some(TokenKind::ArrayEnd)
            }
            b'(' => {
                self.bump();
                Some(TokenKind::ListStart)
            }
            b')' => {
                self.bump();
                Some(TokenKind::ListEnd)
            }
            _ if is_ident_start(b) => Some(self.scan_ident_or_bool()),
            _ if is_number_start(b, self.peek_at(1)) => Some(self.scan_number()),
            other => {
                self.bump();
                Some(TokenKind::Garbage(other))
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.bump();
        }
    }

    fn scan_comment(&mut self) {
        loop {
            match self.peek() {
                None => return, // EOF handled by the caller's loop
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.bump();
                    self.bump();
                    self.mode = Mode::Initial;
                    return;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    // -- identifiers & booleans --------------------------------------------

    fn scan_ident_or_bool(&mut self) -> TokenKind<'_> {
        self.name_buf.clear();
        while let Some(b) = self.peek() {
            if is_ident_continue(b) {
                self.name_buf.push(b as char);
                self.bump();
            } else {
                break;
            }
        }

        if self.name_buf.eq_ignore_ascii_case("true") {
            TokenKind::Boolean(true)
        } else if self.name_buf.eq_ignore_ascii_case("false") {
            TokenKind::Boolean(false)
        } else {
            TokenKind::Name(&self.name_buf)
        }
    }

    // -- numbers ------------------------------------------------------------

    fn scan_number(&mut self) -> TokenKind<'static> {
        // Hex literals carry no sign in this grammar, so they must be
        // recognized before any sign is consumed.
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(b) = self.peek() {
                if b.is_ascii_hexdigit() {
                    digits.push(b as char);
                    self.bump();
                } else {
                    break;
                }
            }
            return self.finish_hex(digits);
        }

        let mut text = String::new();

        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            text.push(self.bump().unwrap() as char);
        }

        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                text.push(b as char);
                self.bump();
            } else {
                break;
            }
        }

        let mut is_float = false;

        if self.peek() == Some(b'.') {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(b) = self.peek() {
                if b.is_ascii_digit() {
                    text.push(b as char);
                    self.bump();
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            if let Some(exponent) = self.try_read_exponent() {
                is_float = true;
                text.push_str(&exponent);
            }
        }

        if is_float {
            return self.finish_number(number::classify_float(&text));
        }

        if self.peek() == Some(b'L') {
            self.bump();
            if self.peek() == Some(b'L') {
                self.bump();
            }
            return self.finish_number(number::classify_decimal64(&text));
        }

        self.finish_number(number::classify_decimal(&text))
    }

    /// Looks ahead for `e`/`E` [`+`/`-`] digit+ without committing; only
    /// consumes input (returning the matched text) when a decimal
    /// exponent with at least one digit is actually present, since `e`/`E`
    /// alone (no digits) is not part of the float grammar.
    fn try_read_exponent(&mut self) -> Option<String> {
        let mut offset = 1; // past the 'e'/'E' already peeked by the caller
        let mut text = String::new();
        text.push(self.peek().unwrap() as char);

        if matches!(self.peek_at(offset), Some(b'+') | Some(b'-')) {
            text.push(self.peek_at(offset).unwrap() as char);
            offset += 1;
        }

        let digits_start = offset;
        while let Some(b) = self.peek_at(offset) {
            if b.is_ascii_digit() {
                text.push(b as char);
                offset += 1;
            } else {
                break;
            }
        }

        if offset == digits_start {
            return None;
        }

        for _ in 0..offset {
            self.bump();
        }
        Some(text)
    }

    fn finish_hex(&mut self, digits: String) -> TokenKind<'static> {
        if self.peek() == Some(b'L') {
            self.bump();
            if self.peek() == Some(b'L') {
                self.bump();
            }
            return self.finish_number(number::classify_hex64(&digits));
        }
        self.finish_number(number::classify_hex(&digits))
    }

    fn finish_number(&mut self, result: Number<'static>) -> TokenKind<'static> {
        match result {
            Number::Kind(kind) => kind,
            Number::Malformed(why) => self.record_error(why),
        }
    }

    // -- quoted fragments (STRING, INCLUDE_F, INCLUDE_D) --------------------

    /// Accumulates fragments until the closing `"`; returns `false` on EOF
    /// so the caller's EOF handler can report "unterminated".
    fn accumulate_quoted(&mut self, decode_escapes: bool) -> bool {
        loop {
            let b = match self.peek() {
                Some(b) => b,
                None => return false,
            };

            match b {
                b'"' => {
                    self.bump();
                    return true;
                }
                b'\\' => {
                    self.bump();
                    match escape::decode_escape(self.source_mut(), decode_escapes) {
                        Some(byte) => self.accumulator.push(byte),
                        None => self.accumulator.push(b'\\'),
                    }
                }
                _ => {
                    self.accumulator.push(b);
                    self.bump();
                }
            }
        }
    }

    fn finish_quoted(&mut self, decode_escapes: bool) -> TokenKind<'static> {
        if self.accumulate_quoted(decode_escapes) {
            self.mode = Mode::Initial;
            TokenKind::String(self.accumulator.take())
        } else {
            // EOF: the main loop's on_eof() reports "unterminated" next.
            self.accumulator.clear();
            TokenKind::Error
        }
    }

    fn finish_include_file(&mut self) -> TokenKind<'_> {
        if !self.accumulate_quoted(false) {
            self.accumulator.clear();
            return TokenKind::Error;
        }
        self.mode = Mode::Initial;
        let path = bytes_to_path(self.accumulator.take());
        match self.stack.push_file(&path) {
            Ok(()) => {
                self.at_line_start = true;
                self.next_token_kind()
            }
            Err(err) => self.record_include_error(err),
        }
    }

    fn finish_include_dir(&mut self) -> TokenKind<'_> {
        if !self.accumulate_quoted(false) {
            self.accumulator.clear();
            return TokenKind::Error;
        }
        self.mode = Mode::Initial;
        let path = bytes_to_path(self.accumulator.take());
        match self.stack.push_dir(&path) {
            Ok(DirPushOutcome { pushed, error: None }) => {
                if pushed {
                    self.at_line_start = true;
                }
                self.next_token_kind()
            }
            Ok(DirPushOutcome { pushed, error: Some(err) }) => {
                // A bad entry was skipped (or every entry failed to open);
                // report the first such failure now. If an entry did end up
                // pushed, it's already the active frame and the *next*
                // `next_token` call picks up from it, same as `pop()`'s
                // `ContinueWithError` path.
                if pushed {
                    self.at_line_start = true;
                }
                self.record_include_error(err)
            }
            Err(err) => self.record_include_error(err),
        }
    }

    // -- directive recognition ----------------------------------------------

    /// Attempts to recognize `@include "` or `@include_dir "` starting at
    /// the current `@`. Only called when `at_line_start` holds. Returns
    /// `true` and switches mode if a directive matched; leaves the cursor
    /// untouched and returns `false` otherwise, so the `@` falls through
    /// to ordinary (GARBAGE) handling.
    fn try_start_directive(&mut self) -> bool {
        const INCLUDE: &[u8] = b"include";
        const INCLUDE_DIR: &[u8] = b"include_dir";

        if self.matches_directive(INCLUDE_DIR) {
            self.consume_directive(INCLUDE_DIR.len());
            self.mode = Mode::IncludeD;
            self.accumulator.clear();
            return true;
        }

        if self.matches_directive(INCLUDE) {
            self.consume_directive(INCLUDE.len());
            self.mode = Mode::IncludeF;
            self.accumulator.clear();
            return true;
        }

        false
    }

    /// Checks for `@` + `keyword` + at least one space/tab + `"`, without
    /// consuming anything.
    fn matches_directive(&self, keyword: &[u8]) -> bool {
        let mut offset = 1; // past '@'
        for &expected in keyword {
            if self.peek_at(offset) != Some(expected) {
                return false;
            }
            offset += 1;
        }

        let ws_start = offset;
        while matches!(self.peek_at(offset), Some(b' ') | Some(b'\t')) {
            offset += 1;
        }
        if offset == ws_start {
            return false; // directive grammar requires `[ \t]+`
        }

        self.peek_at(offset) == Some(b'"')
    }

    /// Consumes `@` + `keyword` + whitespace + the opening `"`, given that
    /// `matches_directive` already confirmed the shape.
    fn consume_directive(&mut self, keyword_len: usize) {
        self.bump(); // '@'
        for _ in 0..keyword_len {
            self.bump();
        }
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.bump();
        }
        self.bump(); // opening '"'
    }
}

enum EofOutcome<'a> {
    Emit(TokenKind<'a>),
    Continue,
    EndOfStream,
}

fn bytes_to_path(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'*'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'*')
}

fn is_number_start(b: u8, next: Option<u8>) -> bool {
    match b {
        b'0'..=b'9' => true,
        b'+' | b'-' => matches!(next, Some(b'0'..=b'9') | Some(b'.')),
        b'.' => matches!(next, Some(b'0'..=b'9')),
        _ => false,
    }
}
