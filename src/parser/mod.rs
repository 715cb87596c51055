//! Parsing for the player command grammar.
//!
//! Commands are whitespace-separated token streams, case-insensitive, with
//! three token shapes beyond bare words: `"quoted strings"`, `/r/subreddit`
//! names, and `,` separating movement destinations.
//!
//! ```text
//! status
//! codeword (remove (all|"CODE") | status ["CODE"] | "CODE" is (TROOP|"WORD"))
//! lead (NUM|all)? to DEST ("," DEST)*
//! invade LOC
//! (attack|oppose|support) ["#" NUM] with NUM [TROOP|"CODEWORD"]
//! defect [to (orangered|periwinkle)]
//! (promote|demote) NAME
//! extract | stop | time
//! ```

use crate::order::{
    Command, CodewordOrder, DefectOrder, Destination, InvadeOrder, LeadOrder, RankOrder,
    SkirmishOrder, SkirmishVerb,
};
use crate::team::Team;
use std::str::FromStr;

mod error;

pub use self::error::{Error, ErrorKind};

type ParseResult<T> = Result<T, Error>;

/// One token of a command. Quoting is preserved so that codewords can be
/// told apart from keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Quoted(String),
    Comma,
}

impl Token {
    pub fn text(&self) -> &str {
        match self {
            Token::Word(w) | Token::Quoted(w) => w,
            Token::Comma => ",",
        }
    }

    fn is_word(&self, expected: &str) -> bool {
        matches!(self, Token::Word(w) if w == expected)
    }
}

/// A parser which operates on tokens from an input command.
pub trait FromTokens: Sized {
    /// The associated error which can be returned from parsing.
    type Err;

    /// Performs the conversion.
    fn from_tokens(tokens: &[Token]) -> Result<Self, Self::Err>;
}

/// Splits a command into tokens: lowercases everything, honors `"..."` with
/// backslash escapes, and breaks `,` out as its own token.
pub fn tokenize(input: &str) -> ParseResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == ',' {
            chars.next();
            tokens.push(Token::Comma);
        } else if c == '"' {
            chars.next();
            let mut quoted = String::new();
            let mut closed = false;
            while let Some(q) = chars.next() {
                match q {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            quoted.push(escaped);
                        }
                    }
                    other => quoted.push(other),
                }
            }
            if !closed {
                return Err(Error::new(ErrorKind::UnclosedQuote, input));
            }
            tokens.push(Token::Quoted(quoted.to_lowercase()));
        } else {
            let mut word = String::new();
            while let Some(&w) = chars.peek() {
                if w.is_whitespace() || w == ',' || w == '"' {
                    break;
                }
                word.push(w);
                chars.next();
            }
            tokens.push(Token::Word(word.to_lowercase()));
        }
    }

    Ok(tokens)
}

/// Parse a full command string.
pub fn parse(input: &str) -> ParseResult<Command> {
    let tokens = tokenize(input)?;
    let (head, rest) = tokens
        .split_first()
        .ok_or_else(|| Error::new(ErrorKind::TooFewWords(1), input))?;

    match head.text() {
        "status" => expect_end(rest, Command::Status),
        "lands" => {
            // Tolerate the long form "lands status".
            if rest.is_empty() || (rest.len() == 1 && rest[0].is_word("status")) {
                Ok(Command::Lands)
            } else {
                Err(Error::new(ErrorKind::TrailingInput, join(rest)))
            }
        }
        "lead" | "move" => Ok(LeadOrder::from_tokens(rest)?.into()),
        "invade" => Ok(InvadeOrder::from_tokens(rest)?.into()),
        "attack" | "oppose" => Ok(skirmish(SkirmishVerb::Attack, rest)?.into()),
        "support" => Ok(skirmish(SkirmishVerb::Support, rest)?.into()),
        "defect" => Ok(DefectOrder::from_tokens(rest)?.into()),
        "promote" | "demote" => Ok(rank_order(head.text(), rest)?.into()),
        "codeword" | "codewords" => Ok(CodewordOrder::from_tokens(rest)?.into()),
        "extract" => expect_end(rest, Command::Extract),
        "stop" => expect_end(rest, Command::Stop),
        "time" => expect_end(rest, Command::Time),
        other => Err(Error::new(ErrorKind::UnknownCommand, other)),
    }
}

/// Pulls the command line out of a comment body. Commands are written as a
/// quote line: `&gt; attack with 30` (the forum HTML-escapes `>`).
pub fn extract_command(body: &str) -> Option<String> {
    for line in body.trim().lines() {
        let stripped = line.strip_prefix("&gt;").or_else(|| line.strip_prefix('>'));
        if let Some(cmd) = stripped {
            let cmd = cmd.trim();
            if !cmd.is_empty() {
                return Some(cmd.to_string());
            }
        }
    }
    None
}

fn expect_end(rest: &[Token], cmd: Command) -> ParseResult<Command> {
    if rest.is_empty() {
        Ok(cmd)
    } else {
        Err(Error::new(ErrorKind::TrailingInput, join(rest)))
    }
}

fn join(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(Token::text)
        .collect::<Vec<_>>()
        .join(" ")
}

fn number(token: &Token) -> ParseResult<i64> {
    token
        .text()
        .parse()
        .map_err(|_| Error::new(ErrorKind::BadNumber, token.text()))
}

/// Strips the location syntax down to a bare region name: quoted names are
/// taken verbatim, `/r/name` loses its prefix.
fn location(token: &Token) -> String {
    match token {
        Token::Quoted(name) => name.clone(),
        other => other
            .text()
            .strip_prefix("/r/")
            .unwrap_or(other.text())
            .to_string(),
    }
}

/// Parses a `#N` fragment, either fused (`#3`) or as a bare `#` then number.
fn sector_suffix(text: &str) -> ParseResult<i64> {
    text.strip_prefix('#')
        .unwrap_or(text)
        .parse()
        .map_err(|_| Error::new(ErrorKind::BadSector, text))
}

impl FromTokens for LeadOrder {
    type Err = Error;

    fn from_tokens(tokens: &[Token]) -> ParseResult<Self> {
        if tokens.is_empty() {
            return Err(Error::new(ErrorKind::MalformedMove, ""));
        }

        // Optional amount before "to"; missing means everyone.
        let (amount, rest) = if tokens[0].is_word("to") {
            (-1, &tokens[1..])
        } else {
            let amount = if tokens[0].is_word("all") {
                -1
            } else {
                number(&tokens[0])?
            };
            match tokens.get(1) {
                Some(t) if t.is_word("to") => (amount, &tokens[2..]),
                _ => return Err(Error::new(ErrorKind::MalformedMove, join(tokens))),
            }
        };

        let mut path = Vec::new();
        for leg in rest.split(|t| *t == Token::Comma) {
            path.push(destination(leg)?);
        }
        Ok(LeadOrder { amount, path })
    }
}

fn destination(leg: &[Token]) -> ParseResult<Destination> {
    match leg {
        [tok] if tok.is_word("*") => Ok(Destination::Wildcard),
        [Token::Word(w)] if w.starts_with('#') => Ok(Destination::Sector(sector_suffix(w)?)),
        [tok] => {
            let name = location(tok);
            match tok {
                // A bare word can carry a fused sector suffix: "sapphire#2".
                Token::Word(_) => match name.split_once('#') {
                    Some((region, sector)) => Ok(Destination::Region {
                        name: region.to_string(),
                        sector: Some(sector_suffix(sector)?),
                    }),
                    None => Ok(Destination::Region { name, sector: None }),
                },
                _ => Ok(Destination::Region { name, sector: None }),
            }
        }
        [tok, Token::Word(suffix)] if suffix.starts_with('#') => Ok(Destination::Region {
            name: location(tok),
            sector: Some(sector_suffix(suffix)?),
        }),
        _ => Err(Error::new(ErrorKind::MalformedMove, join(leg))),
    }
}

impl FromTokens for InvadeOrder {
    type Err = Error;

    fn from_tokens(tokens: &[Token]) -> ParseResult<Self> {
        match tokens {
            [tok] => Ok(InvadeOrder {
                region: location(tok),
            }),
            _ => Err(Error::new(ErrorKind::MalformedInvade, join(tokens))),
        }
    }
}

fn skirmish(verb: SkirmishVerb, tokens: &[Token]) -> ParseResult<SkirmishOrder> {
    let mut rest = tokens;

    // Optional explicit target: "#3" or "# 3".
    let mut target = None;
    match rest {
        [Token::Word(w), ..] if w == "#" => {
            let id = rest
                .get(1)
                .ok_or_else(|| Error::new(ErrorKind::MalformedSkirmish, join(tokens)))?;
            target = Some(number(id)?);
            rest = &rest[2..];
        }
        [Token::Word(w), ..] if w.starts_with('#') => {
            target = Some(sector_suffix(w)?);
            rest = &rest[1..];
        }
        _ => {}
    }

    match rest {
        [with, amount] if with.is_word("with") => Ok(SkirmishOrder {
            verb,
            target,
            amount: number(amount)?,
            troops: None,
        }),
        [with, amount, troops] if with.is_word("with") => Ok(SkirmishOrder {
            verb,
            target,
            amount: number(amount)?,
            troops: Some(troops.text().to_string()),
        }),
        _ => Err(Error::new(ErrorKind::MalformedSkirmish, join(tokens))),
    }
}

impl FromTokens for DefectOrder {
    type Err = Error;

    fn from_tokens(tokens: &[Token]) -> ParseResult<Self> {
        match tokens {
            [] => Ok(DefectOrder { team: None }),
            [to, team] if to.is_word("to") => Ok(DefectOrder {
                team: Some(Team::from_str(team.text())?),
            }),
            _ => Err(Error::new(ErrorKind::MalformedDefect, join(tokens))),
        }
    }
}

fn rank_order(verb: &str, tokens: &[Token]) -> ParseResult<RankOrder> {
    match tokens {
        [name] => {
            let name = name
                .text()
                .strip_prefix("/u/")
                .unwrap_or(name.text())
                .to_string();
            if verb == "promote" {
                Ok(RankOrder::Promote(name))
            } else {
                Ok(RankOrder::Demote(name))
            }
        }
        _ => Err(Error::new(ErrorKind::MalformedRank, join(tokens))),
    }
}

impl FromTokens for CodewordOrder {
    type Err = Error;

    fn from_tokens(tokens: &[Token]) -> ParseResult<Self> {
        match tokens {
            [remove, all] if remove.is_word("remove") && all.is_word("all") => {
                Ok(CodewordOrder::RemoveAll)
            }
            [remove, code] if remove.is_word("remove") => {
                Ok(CodewordOrder::Remove(code.text().to_string()))
            }
            [status] if status.is_word("status") => Ok(CodewordOrder::Status(None)),
            [status, code] if status.is_word("status") => {
                Ok(CodewordOrder::Status(Some(code.text().to_string())))
            }
            [code, is, word] if is.is_word("is") => Ok(CodewordOrder::Add {
                code: code.text().to_string(),
                word: word.text().to_string(),
            }),
            _ => Err(Error::new(ErrorKind::MalformedCodeword, join(tokens))),
        }
    }
}
