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

//! Escape decoding for quoted-string and include-path fragments.
//!
//! The escape set is deliberately narrow: four named control escapes, the
//! two structural escapes (`\\`, `\"`), and `\xHH`. Everything else falls
//! through to a bare literal backslash rather than an error, matching the
//! grammar's "any other `\` → literal backslash" catch-all.

use crate::include::ByteSource;

/// Attempts to decode one escape sequence. `source` must be positioned
/// just past the introducing backslash (not yet consumed past it).
///
/// On a recognized escape, consumes its bytes and returns the decoded
/// byte. On no match, consumes nothing — the caller is expected to emit a
/// literal backslash and let the byte that follows it be processed as an
/// ordinary fragment character on the next iteration.
///
/// `allow_control` gates the four named control escapes (`\n \r \t \f`)
/// and the hex escape (`\xHH`); include-path accumulation (INCLUDE_F /
/// INCLUDE_D) sets this to `false`, since the directive grammar admits
/// only `\\` and `\"`.
pub(super) fn decode_escape(source: &mut ByteSource, allow_control: bool) -> Option<u8> {
    let introducer = source.peek()?;

    if allow_control {
        let control = match introducer {
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'f' => Some(0x0c),
            _ => None,
        };
        if let Some(byte) = control {
            source.advance();
            return Some(byte);
        }
    }

    match introducer {
        b'\\' => {
            source.advance();
            Some(b'\\')
        }
        b'"' => {
            source.advance();
            Some(b'"')
        }
        b'x' | b'X' if allow_control => {
            let h1 = hex_digit(source.peek_at(1)?)?;
            let h2 = hex_digit(source.peek_at(2)?)?;
            source.advance_by(3);
            Some(h1 << 4 | h2)
        }
        _ => None,
    }
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
