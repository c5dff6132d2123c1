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

//! Numeric literal disambiguation: decimal, octal, hexadecimal, and their
//! explicit-width variants, with the overflow-driven promotion/demotion
//! rules preserved exactly as specified.

use super::token::TokenKind;

/// The outcome of scanning a numeric lexeme: either a classified token, or
/// a reason it could not be classified (reported by the caller as an
/// `ERROR` token).
pub(super) enum Number<'a> {
    Kind(TokenKind<'a>),
    Malformed(&'static str),
}

/// Classifies an already-captured decimal digit run (optional leading
/// sign, no `L` suffix, not a float) per the promotion table in the
/// scanner's numeric rules.
///
/// This is the one rule in the whole grammar where the historical
/// behavior is intentionally not the "obvious" one: a leading-zero lexeme
/// is *always* truncated to 32 bits, even when its decimal value would
/// otherwise warrant `INTEGER64`. That quirk is load-bearing for backward
/// compatibility and must not be "fixed".
pub(super) fn classify_decimal<'a>(lexeme: &str) -> Number<'a> {
    let value: i64 = match lexeme.parse() {
        Ok(v) => v,
        Err(_) => return Number::Malformed("integer literal out of 64-bit range"),
    };

    let digits = lexeme.trim_start_matches(['+', '-']);
    let is_octal_legacy = digits.len() >= 2 && digits.starts_with('0');

    if is_octal_legacy {
        return Number::Kind(TokenKind::Integer(value as i32));
    }

    if let Ok(v32) = i32::try_from(value) {
        return Number::Kind(TokenKind::Integer(v32));
    }

    if let Ok(vu32) = u32::try_from(value) {
        return Number::Kind(TokenKind::Integer(vu32 as i32));
    }

    Number::Kind(TokenKind::Integer64(value))
}

/// Classifies a decimal digit run with a confirmed `L`/`LL` suffix already
/// stripped from `digits`.
pub(super) fn classify_decimal64<'a>(digits: &str) -> Number<'a> {
    match digits.parse::<i64>() {
        Ok(value) => Number::Kind(TokenKind::Integer64(value)),
        Err(_) => Number::Malformed("64-bit integer literal out of range"),
    }
}

/// Classifies a `0x`/`0X` hex digit run with no `L` suffix.
pub(super) fn classify_hex<'a>(digits: &str) -> Number<'a> {
    match u32::from_str_radix(digits, 16) {
        Ok(value) => Number::Kind(TokenKind::Hex(value as i32)),
        Err(_) => Number::Malformed("hex literal out of 32-bit range"),
    }
}

/// Classifies a `0x`/`0X` hex digit run with a confirmed `L`/`LL` suffix
/// already stripped from `digits`.
pub(super) fn classify_hex64<'a>(digits: &str) -> Number<'a> {
    match u64::from_str_radix(digits, 16) {
        Ok(value) => Number::Kind(TokenKind::Hex64(value)),
        Err(_) => Number::Malformed("64-bit hex literal out of range"),
    }
}

/// Parses a captured float lexeme (already confirmed to contain `.` or
/// `e`/`E` by the caller's maximal-munch scan).
pub(super) fn classify_float<'a>(lexeme: &str) -> Number<'a> {
    match lexeme.parse::<f64>() {
        Ok(value) => Number::Kind(TokenKind::Float(value)),
        Err(_) => Number::Malformed("malformed floating-point literal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(n: Number<'static>) -> TokenKind<'static> {
        match n {
            Number::Kind(k) => k,
            Number::Malformed(why) => panic!("unexpected malformed: {why}"),
        }
    }

    #[test]
    fn decimal_in_i32_range() {
        assert_eq!(kind(classify_decimal("42")), TokenKind::Integer(42));
        assert_eq!(kind(classify_decimal("-42")), TokenKind::Integer(-42));
    }

    #[test]
    fn decimal_demoted_from_int_max_to_uint_max() {
        // 3_000_000_000 > i32::MAX, <= u32::MAX
        assert_eq!(
            kind(classify_decimal("3000000000")),
            TokenKind::Integer(-1294967296)
        );
    }

    #[test]
    fn decimal_promoted_beyond_uint_max() {
        assert_eq!(
            kind(classify_decimal("5000000000")),
            TokenKind::Integer64(5_000_000_000)
        );
    }

    #[test]
    fn decimal_overflowing_i64_is_malformed() {
        assert!(matches!(
            classify_decimal("99999999999999999999"),
            Number::Malformed(_)
        ));
    }

    #[test]
    fn leading_zero_is_always_truncated_to_integer() {
        // Legacy "octal" rule: decimal-parsed, then truncated to 32 bits,
        // regardless of whether it would otherwise fit as INTEGER64.
        let value: i64 = "05000000000".parse().unwrap();
        assert_eq!(
            kind(classify_decimal("05000000000")),
            TokenKind::Integer(value as i32)
        );
    }

    #[test]
    fn single_leading_zero_digit_is_not_octal() {
        // Length 1: "0" alone has no extra digits, so the leading-zero
        // rule (length >= 2) does not apply.
        assert_eq!(kind(classify_decimal("0")), TokenKind::Integer(0));
    }

    #[test]
    fn decimal64_suffix() {
        assert_eq!(kind(classify_decimal64("255")), TokenKind::Integer64(255));
    }

    #[test]
    fn hex_and_hex64() {
        assert_eq!(kind(classify_hex("ff")), TokenKind::Hex(0xff));
        assert_eq!(kind(classify_hex64("ff")), TokenKind::Hex64(0xff));
    }

    #[test]
    fn hex_overflow_is_malformed() {
        assert!(matches!(classify_hex("123456789"), Number::Malformed(_)));
    }

    #[test]
    fn float_forms() {
        assert_eq!(kind(classify_float("1.5")), TokenKind::Float(1.5));
        assert_eq!(kind(classify_float(".5")), TokenKind::Float(0.5));
        assert_eq!(kind(classify_float("1.")), TokenKind::Float(1.0));
        assert_eq!(kind(classify_float("5e3")), TokenKind::Float(5000.0));
        assert_eq!(kind(classify_float("-2.5e-1")), TokenKind::Float(-0.25));
    }
}
