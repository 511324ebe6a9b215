//! Mission text scanner.
//!
//! The scanner walks the input left to right. After skipping whitespace and
//! comments it tries a fixed list of alternatives at the current position and
//! takes the first that matches:
//!
//! ```text
//! ")"                                   GroupClose
//! [time:]H:MM:SS | MM:SS   (then space) Time
//! 3X | 3x                  (then space) Strikes
//! strikes|widgets|...[:value]           Setting
//! [N[!] (;|*)] "("                      GroupOpen
//! [N[!] (;|*)] body                     ModulePool
//! ```
//!
//! The order matters: `5:00` is a time and never a module id, `3X` is a
//! strike count, and `widgets:3` is a setting even though all three would
//! also scan as pool bodies.
//!
//! A pool body is a run of id characters, quoted runs and `,`/`+`
//! separators, so `Wires, "Space Test"+Maze` is one token. A trailing
//! `!` marks the pool unique just like the `N!*` prefix does.

use log::debug;

use crate::{PoolToken, Range, SettingName, Token, TokenKind};

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

/// Scan `input` into tokens.
///
/// Every position left after trivia is either `)` or the start of a pool
/// body, so the whole input is always consumed.
pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut tokens = Vec::new();

    loop {
        lexer.skip_trivia();
        if lexer.pos >= input.len() {
            break;
        }
        // pool bodies take any non-space character other than `)`
        let Some(token) = lexer.scan() else { break };
        debug!("[lex] {}..{} {:?}", token.range.start, token.range.end, token.kind);
        lexer.pos = token.range.end;
        tokens.push(token);
    }
    tokens
}

/// Strip quote characters and surrounding whitespace from pool text.
pub(crate) fn normalize_module_text(text: &str) -> String {
    text.replace(|c: char| c == '"' || c == '\'', "").trim().to_string()
}

impl<'a> Lexer<'a> {
    fn rest(&self, at: usize) -> &'a str {
        &self.input[at..]
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest(self.pos);
            if let Some(m) = regex!(r"^\s+").find(rest) {
                self.pos += m.end();
            } else if let Some(m) = regex!(r"^(?://[^\n]*|/\*(?s:.*?)(?:\*/|\z))").find(rest) {
                self.pos += m.end();
            } else {
                return;
            }
        }
    }

    /// Literals must be followed by whitespace or the end of input.
    fn ends_word(&self, at: usize) -> bool {
        self.rest(at).chars().next().is_none_or(char::is_whitespace)
    }

    fn scan(&self) -> Option<Token> {
        let at = self.pos;
        self.close(at)
            .or_else(|| self.time(at))
            .or_else(|| self.strikes(at))
            .or_else(|| self.setting(at))
            .or_else(|| self.pool(at))
            .map(|(kind, end)| Token { range: Range { start: at, end }, kind })
    }

    fn close(&self, at: usize) -> Option<(TokenKind, usize)> {
        self.rest(at).starts_with(')').then_some((TokenKind::GroupClose, at + 1))
    }

    fn time(&self, at: usize) -> Option<(TokenKind, usize)> {
        let caps = regex!(r"^(?i:time:)?([0-9]{1,9}):([0-9]{1,9})(?::([0-9]{1,9}))?").captures(self.rest(at))?;
        let end = at + caps.get(0)?.end();
        if !self.ends_word(end) {
            return None;
        }

        let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
        let seconds = match field(3) {
            Some(s) => field(1)? * 3600 + field(2)? * 60 + s,
            None => field(1)? * 60 + field(2)?,
        };
        Some((TokenKind::Time(seconds), end))
    }

    fn strikes(&self, at: usize) -> Option<(TokenKind, usize)> {
        let caps = regex!(r"^([0-9]{1,9})[xX]").captures(self.rest(at))?;
        let end = at + caps.get(0)?.end();
        if !self.ends_word(end) {
            return None;
        }
        let count = caps.get(1)?.as_str().parse().ok()?;
        Some((TokenKind::Strikes(count), end))
    }

    fn setting(&self, at: usize) -> Option<(TokenKind, usize)> {
        let caps =
            regex!(r"^(?i:(strikes|needyactivationtime|widgets|nopacing|frontonly|factory|ruleseed))(?::([^\s)]*))?")
                .captures(self.rest(at))?;
        let name = SettingName::from_keyword(caps.get(1)?.as_str())?;
        let value = caps.get(2).map(|m| m.as_str().to_string());
        Some((TokenKind::Setting { name, value }, at + caps.get(0)?.end()))
    }

    /// Group open or module pool, with or without the `N[!](;|*)` prefix.
    fn pool(&self, at: usize) -> Option<(TokenKind, usize)> {
        if let Some(caps) = regex!(r"^([0-9]{1,9})(!)?\s*[;*]\s*").captures(self.rest(at)) {
            let count = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let unique = caps.get(2).is_some();
            let after = at + caps.get(0).map_or(0, |m| m.end());
            if let Some(found) = self.group_or_body(after, count, unique) {
                return Some(found);
            }
        }
        self.group_or_body(at, None, false)
    }

    fn group_or_body(&self, at: usize, count: Option<u32>, unique: bool) -> Option<(TokenKind, usize)> {
        if self.rest(at).starts_with('(') {
            return Some((TokenKind::GroupOpen { count }, at + 1));
        }

        let (end, unclosed_quote) = self.pool_body(at)?;
        let mut raw = &self.input[at..end];
        let mut unique = unique;
        if !unclosed_quote && raw.len() > 1 && raw.ends_with('!') {
            unique = true;
            raw = &raw[..raw.len() - 1];
        }

        let body = normalize_module_text(raw);
        Some((TokenKind::ModulePool(PoolToken { body, count, unique, unclosed_quote }), end))
    }

    /// End offset of the pool body starting at `at`, and whether a quote was
    /// left open (it then runs to the end of input).
    fn pool_body(&self, at: usize) -> Option<(usize, bool)> {
        let rest = self.rest(at);
        let mut i = 0;
        let mut unclosed = false;

        while let Some(c) = rest[i..].chars().next() {
            match c {
                '\'' | '"' => match rest[i + 1..].find(c) {
                    Some(close) => i += close + 2,
                    None => {
                        i = rest.len();
                        unclosed = true;
                    }
                },
                ',' | '+' => {
                    i += 1;
                    i += rest[i..].len() - rest[i..].trim_start().len();
                }
                c if c.is_whitespace() || c == ')' => break,
                c => i += c.len_utf8(),
            }
        }

        (i > 0).then_some((at + i, unclosed))
    }
}
