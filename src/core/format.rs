//! Protocol styling codes and helpers
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Color constants built with [`color_code!`]; stripping without regex
//! - 1.1.0: Strip italic and two-digit background colors
//! - 1.0.0: Initial release

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

/// Color code for palette entry `$n` as a string literal, usable inside
/// `concat!`. Clients accept both one and two digit numbers.
macro_rules! color_code {
    ($n:literal) => {
        concat!("\x03", $n)
    };
}
pub(crate) use color_code;

pub const BOLD: &str = "\x02";
pub const COLOR: &str = "\x03";
pub const RESET: &str = "\x0F";
pub const REVERSE: &str = "\x16";
pub const ITALIC: &str = "\x1D";
pub const UNDERLINE: &str = "\x1F";

pub const COLOUR_DARKGREEN: &str = color_code!("03");
pub const COLOUR_RED: &str = color_code!("04");
pub const COLOUR_ORANGE: &str = color_code!("07");
pub const COLOUR_TEAL: &str = color_code!("10");
pub const COLOUR_BLUE: &str = color_code!("12");
pub const COLOUR_DARKGREY: &str = color_code!("14");

/// Whether the text carries any styling codes
pub fn is_formatted(text: &str) -> bool {
    text.contains(['\x02', '\x03', '\x0F', '\x16', '\x1D', '\x1F'])
}

/// Remove all styling codes, including color numbers following a color code
pub fn strip_formatting(text: &str) -> Cow<'_, str> {
    if !is_formatted(text) {
        return Cow::Borrowed(text);
    }

    let mut stripped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x03' => skip_color_numbers(&mut chars),
            '\x02' | '\x0F' | '\x16' | '\x1D' | '\x1F' => {}
            _ => stripped.push(c),
        }
    }
    Cow::Owned(stripped)
}

/// Consume `fg[,bg]` after a color code. A comma without a digit after it is
/// text.
fn skip_color_numbers(chars: &mut Peekable<Chars<'_>>) {
    if skip_digits(chars) == 0 {
        return;
    }
    let mut lookahead = chars.clone();
    if lookahead.next() == Some(',') && lookahead.peek().is_some_and(char::is_ascii_digit) {
        chars.next();
        skip_digits(chars);
    }
}

/// Up to two digits
fn skip_digits(chars: &mut Peekable<Chars<'_>>) -> usize {
    let mut skipped = 0;
    while skipped < 2 && chars.next_if(char::is_ascii_digit).is_some() {
        skipped += 1;
    }
    skipped
}

/// Wrap content in a color and reset afterwards
pub fn colored(color: &str, content: &str) -> String {
    format!("{color}{content}{RESET}")
}

pub fn bold(content: &str) -> String {
    format!("{BOLD}{content}{BOLD}")
}
