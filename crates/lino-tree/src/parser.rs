//! Links notation parser
//!
//! Grammar (whitespace allowed between any two elements):
//!
//! ```text
//! links  := link*
//! link   := node | token
//! node   := "(" [token ":"] link* ")"
//! token  := bare | "\"" escaped "\"" | "'" escaped "'"
//! ```
//!
//! Nodes are built on an explicit stack, so parsing does not recurse; the
//! nesting limit bounds what later recursive consumers (decode, drop) see.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::opt,
    error::{ContextError, ErrorKind, ParseError as NomParseError, VerboseError},
    sequence::{pair, terminated},
    IResult,
};

use crate::error::TreeError;
use crate::link::{is_word_char, Link};

// ============================================================================
// Public API
// ============================================================================

/// Parser limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum parenthesis nesting
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 1024 }
    }
}

/// Parse every top-level link in the input
pub fn parse_links(input: &str) -> Result<Vec<Link>, TreeError> {
    parse_links_with(input, ParseOptions::default())
}

/// Parse exactly one top-level link
pub fn parse_link(input: &str) -> Result<Link, TreeError> {
    parse_link_with(input, ParseOptions::default())
}

/// Parse exactly one top-level link with explicit limits
pub fn parse_link_with(input: &str, options: ParseOptions) -> Result<Link, TreeError> {
    let mut links = parse_links_with(input, options)?;
    match links.len() {
        0 => Err(TreeError::Empty),
        1 => Ok(links.remove(0)),
        count => Err(TreeError::Trailing { count }),
    }
}

fn parse_links_with(input: &str, options: ParseOptions) -> Result<Vec<Link>, TreeError> {
    match links::<VerboseError<&str>>(input, options.max_depth) {
        Ok((rest, parsed)) if rest.is_empty() => {
            tracing::trace!(count = parsed.len(), "parsed links notation");
            Ok(parsed)
        }
        Ok((rest, _)) => Err(TreeError::Syntax {
            message: format!(
                "unexpected input at offset {}: {}",
                input.len() - rest.len(),
                rest.chars().take(20).collect::<String>()
            ),
        }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let too_deep = e
                .errors
                .iter()
                .any(|(_, kind)| *kind == nom::error::VerboseErrorKind::Nom(ErrorKind::TooLarge));
            if too_deep {
                Err(TreeError::TooDeep {
                    limit: options.max_depth,
                })
            } else {
                Err(TreeError::Syntax {
                    message: nom::error::convert_error(input, e),
                })
            }
        }
        Err(nom::Err::Incomplete(_)) => Err(TreeError::Syntax {
            message: "Incomplete input".to_string(),
        }),
    }
}

// ============================================================================
// Internal Parsers
// ============================================================================

/// A node whose `(` has been read but not yet its `)`
struct OpenNode {
    id: Option<String>,
    values: Vec<Link>,
}

/// Zero or more top-level links.
///
/// Open nodes live on an explicit stack rather than the call stack, so the
/// nesting limit is the only bound on depth.
fn links<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    max_depth: usize,
) -> IResult<&'a str, Vec<Link>, E> {
    let mut top: Vec<Link> = Vec::new();
    let mut open: Vec<OpenNode> = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0::<_, E>(remaining)?;
        remaining = rest;

        if remaining.starts_with('(') {
            if open.len() >= max_depth {
                return Err(nom::Err::Failure(E::add_context(
                    remaining,
                    "nesting depth limit",
                    E::from_error_kind(remaining, ErrorKind::TooLarge),
                )));
            }
            let (rest, _) = char('(')(remaining)?;
            let (rest, _) = multispace0(rest)?;
            // Optional `id:` prefix
            let (rest, id) = opt(terminated(token, pair(multispace0, char(':'))))(rest)?;
            open.push(OpenNode { id, values: Vec::new() });
            remaining = rest;
            continue;
        }

        let link = if remaining.starts_with(')') {
            // An unmatched `)` ends the input; the caller reports it as trailing
            let Some(node) = open.pop() else { break };
            let (rest, _) = char(')')(remaining)?;
            remaining = rest;
            Link::Node {
                id: node.id,
                values: node.values,
            }
        } else {
            match token::<E>(remaining) {
                Ok((rest, text)) => {
                    remaining = rest;
                    Link::Leaf(text)
                }
                Err(nom::Err::Error(_)) if open.is_empty() => break,
                Err(nom::Err::Error(_)) => {
                    return Err(nom::Err::Failure(E::add_context(
                        remaining,
                        "closing parenthesis",
                        E::from_char(remaining, ')'),
                    )))
                }
                Err(e) => return Err(e),
            }
        };

        match open.last_mut() {
            Some(parent) => parent.values.push(link),
            None => top.push(link),
        }
    }

    Ok((remaining, top))
}

fn token<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, String, E> {
    if input.starts_with('"') {
        quoted(input, '"')
    } else if input.starts_with('\'') {
        quoted(input, '\'')
    } else {
        take_while1(is_word_char)(input).map(|(rest, word)| (rest, word.to_string()))
    }
}

/// Quoted token with backslash escapes. Once the opening quote is seen,
/// failures are not recoverable.
fn quoted<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    quote: char,
) -> IResult<&'a str, String, E> {
    let (mut rest, _) = char(quote)(input)?;
    let mut out = String::new();

    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None => {
                return Err(nom::Err::Failure(E::add_context(
                    rest,
                    "closing quote",
                    E::from_char(rest, quote),
                )))
            }
            Some(c) if c == quote => return Ok((&rest[c.len_utf8()..], out)),
            Some('\\') => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    Some('\'') => '\'',
                    _ => {
                        return Err(nom::Err::Failure(E::add_context(
                            rest,
                            "escape sequence",
                            E::from_error_kind(rest, ErrorKind::Escaped),
                        )))
                    }
                };
                out.push(escaped);
                // backslash plus one ASCII character
                rest = &rest[2..];
            }
            Some(c) => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
