//! VDF tokenizer.
//!
//! A single-character fed state machine: every fed character causes
//! exactly one state transition, and a one-character pushback slot lets a
//! delimiter be re-examined as the first character of the next token.

use std::collections::VecDeque;
use std::str::Chars;

/// Tokens produced by the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Quoted(String),
    Unquoted(String),
    /// `{`
    Nest,
    /// `}`
    Denest,
    Comment(String),
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Between tokens, skipping whitespace.
    Begin,
    /// Inside a quoted token.
    Quoted,
    /// Immediately after `\` in a quoted token.
    Escaped,
    /// Inside an unquoted run.
    Unquoted,
    /// Seen `{`.
    Nesting,
    /// Seen `}`.
    Denesting,
    /// Seen one `/`; the next character decides comment vs. token text.
    Semicomment,
    /// Inside a `//` comment.
    Comment,
    Finish,
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

pub struct Tokenizer {
    state: State,
    build: String,
    pushback: Option<char>,
    pending: VecDeque<Token>,
    position: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Tokenizer {
            state: State::Begin,
            build: String::new(),
            pushback: None,
            pending: VecDeque::new(),
            position: 0,
        }
    }

    /// Byte offset of the next character to be fed.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Feed one character, or `None` at end of stream. Any pushed-back
    /// character is re-examined first.
    pub fn feed(&mut self, ch: Option<char>) {
        if let Some(back) = self.pushback.take() {
            self.step(Some(back));
        }
        if let Some(ch) = ch {
            self.position += ch.len_utf8();
        }
        self.step(ch);
    }

    /// Next completed token, if any.
    pub fn next_token(&mut self) -> Option<Token> {
        self.pending.pop_front()
    }

    fn unget(&mut self, ch: char) {
        self.pushback = Some(ch);
    }

    fn commit(&mut self, token: Token) {
        self.pending.push_back(token);
    }

    fn commit_build(&mut self, quoted: bool) {
        let text = std::mem::take(&mut self.build);
        if quoted {
            self.commit(Token::Quoted(text));
        } else if !text.is_empty() {
            self.commit(Token::Unquoted(text));
        }
    }

    fn finish(&mut self) {
        self.state = State::Finish;
        self.commit(Token::End);
    }

    fn step(&mut self, ch: Option<char>) {
        match self.state {
            State::Begin => match ch {
                None => self.finish(),
                Some(c) if is_whitespace(c) => {},
                Some('"') => self.state = State::Quoted,
                Some('{') => {
                    self.build.push('{');
                    self.state = State::Nesting;
                },
                Some('}') => {
                    self.build.push('}');
                    self.state = State::Denesting;
                },
                Some('/') => {
                    self.build.push('/');
                    self.state = State::Semicomment;
                },
                Some(c) => {
                    self.build.push(c);
                    self.state = State::Unquoted;
                },
            },

            State::Quoted => match ch {
                None => {
                    self.commit_build(true);
                    self.finish();
                },
                Some('"') => {
                    self.commit_build(true);
                    self.state = State::Begin;
                },
                Some('\\') => self.state = State::Escaped,
                Some(c) => self.build.push(c),
            },

            State::Escaped => match ch {
                None => {
                    self.commit_build(true);
                    self.finish();
                },
                Some(c) => {
                    self.build.push(c);
                    self.state = State::Quoted;
                },
            },

            State::Nesting | State::Denesting => {
                let token =
                    if self.state == State::Nesting { Token::Nest } else { Token::Denest };
                self.build.clear();
                self.commit(token);
                match ch {
                    None => self.finish(),
                    Some(c) => {
                        self.unget(c);
                        self.state = State::Begin;
                    },
                }
            },

            State::Semicomment => match ch {
                None => {
                    self.commit_build(false);
                    self.finish();
                },
                // Second '/': the accumulated run (minus the first '/')
                // ends here and a comment begins.
                Some('/') => {
                    self.build.pop();
                    self.commit_build(false);
                    self.state = State::Comment;
                },
                Some(c) if is_whitespace(c) || matches!(c, '"' | '{' | '}') => {
                    self.commit_build(false);
                    self.unget(c);
                    self.state = State::Begin;
                },
                Some(c) => {
                    self.build.push(c);
                    self.state = State::Unquoted;
                },
            },

            State::Unquoted => match ch {
                None => {
                    self.commit_build(false);
                    self.finish();
                },
                Some('/') => {
                    self.build.push('/');
                    self.state = State::Semicomment;
                },
                Some(c) if is_whitespace(c) || matches!(c, '"' | '{' | '}') => {
                    self.commit_build(false);
                    self.unget(c);
                    self.state = State::Begin;
                },
                Some(c) => self.build.push(c),
            },

            State::Comment => match ch {
                None => {
                    let text = std::mem::take(&mut self.build);
                    self.commit(Token::Comment(text));
                    self.finish();
                },
                Some('\r') | Some('\n') => {
                    let text = std::mem::take(&mut self.build);
                    self.commit(Token::Comment(text));
                    self.state = State::Begin;
                },
                Some(c) => self.build.push(c),
            },

            State::Finish => {},
        }
    }
}

/// Pull interface over [`Tokenizer`] for a string source.
pub struct TokenStream<'a> {
    tokenizer: Tokenizer,
    chars: Chars<'a>,
    exhausted: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(src: &'a str) -> Self {
        TokenStream { tokenizer: Tokenizer::new(), chars: src.chars(), exhausted: false }
    }

    /// Next token; yields `Token::End` forever once the source is drained.
    pub fn next(&mut self) -> Token {
        loop {
            if let Some(token) = self.tokenizer.next_token() {
                return token;
            }
            if self.exhausted {
                return Token::End;
            }
            let ch = self.chars.next();
            if ch.is_none() {
                self.exhausted = true;
            }
            self.tokenizer.feed(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut stream = TokenStream::new(src);
        let mut out = Vec::new();
        loop {
            let token = stream.next();
            let done = token == Token::End;
            out.push(token);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn unquoted_token() {
        assert_eq!(tokens("foo"), vec![Token::Unquoted("foo".into()), Token::End]);
    }

    #[test]
    fn quoted_token_with_escape() {
        assert_eq!(
            tokens(r#""say \"hi\"""#),
            vec![Token::Quoted(r#"say "hi""#.into()), Token::End]
        );
    }

    #[test]
    fn quoted_token_empty() {
        assert_eq!(tokens(r#""""#), vec![Token::Quoted(String::new()), Token::End]);
    }

    #[test]
    fn eof_inside_quote_emits_partial() {
        assert_eq!(tokens("\"abc"), vec![Token::Quoted("abc".into()), Token::End]);
    }

    #[test]
    fn nesting_tokens() {
        assert_eq!(
            tokens("a { b c }"),
            vec![
                Token::Unquoted("a".into()),
                Token::Nest,
                Token::Unquoted("b".into()),
                Token::Unquoted("c".into()),
                Token::Denest,
                Token::End,
            ]
        );
    }

    #[test]
    fn braces_delimit_unquoted() {
        assert_eq!(
            tokens("a{b"),
            vec![
                Token::Unquoted("a".into()),
                Token::Nest,
                Token::Unquoted("b".into()),
                Token::End,
            ]
        );
    }

    #[test]
    fn comment_runs_to_newline() {
        assert_eq!(
            tokens("a // note\nb"),
            vec![
                Token::Unquoted("a".into()),
                Token::Comment(" note".into()),
                Token::Unquoted("b".into()),
                Token::End,
            ]
        );
    }

    #[test]
    fn comment_delimits_token_without_whitespace() {
        assert_eq!(
            tokens("foo//bar"),
            vec![
                Token::Unquoted("foo".into()),
                Token::Comment("bar".into()),
                Token::End,
            ]
        );
    }

    #[test]
    fn lone_slash_stays_in_token() {
        assert_eq!(tokens("a/b"), vec![Token::Unquoted("a/b".into()), Token::End]);
    }
}
