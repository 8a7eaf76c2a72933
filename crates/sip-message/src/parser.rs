//! nom parsers for the address grammar carried by From and To headers
//!
//! ```text
//! from-spec      =  ( name-addr / addr-spec ) *( SEMI from-param )
//! name-addr      =  [ display-name ] LAQUOT addr-spec RAQUOT
//! display-name   =  *(token LWS) / quoted-string
//! generic-param  =  token [ EQUAL gen-value ]
//! gen-value      =  token / host / quoted-string
//! ```
//!
//! The URI inside the angle brackets (or the bare addr-spec) is returned as
//! the exact text found on the wire.

use nom::{
    branch::alt,
    bytes::complete::{is_not, take, take_while, take_while1},
    character::complete::char,
    combinator::{all_consuming, map, opt, recognize},
    multi::{fold_many0, many0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::header::is_token_char;

// Type alias for parser result
pub type ParseResult<'a, O> = IResult<&'a str, O>;

/// A header parameter: name and optional value
pub type Param = (String, Option<String>);

fn is_wsp(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Optional whitespace (SP or HTAB)
pub fn sws(input: &str) -> ParseResult<&str> {
    take_while(is_wsp)(input)
}

/// Parses a quoted-string, returning its unescaped contents
pub fn quoted_string(input: &str) -> ParseResult<String> {
    delimited(
        char('"'),
        fold_many0(
            alt((is_not("\"\\"), preceded(char('\\'), take(1usize)))),
            String::new,
            |mut acc, part: &str| {
                acc.push_str(part);
                acc
            },
        ),
        char('"'),
    )(input)
}

/// display-name in its unquoted `*(token LWS)` form
fn token_display_name(input: &str) -> ParseResult<String> {
    map(
        recognize(pair(
            take_while1(is_token_char),
            many0(pair(take_while1(is_wsp), take_while1(is_token_char))),
        )),
        str::to_string,
    )(input)
}

pub fn display_name(input: &str) -> ParseResult<String> {
    alt((quoted_string, token_display_name))(input)
}

/// name-addr: `[ display-name ] "<" addr-spec ">"`
pub fn name_addr(input: &str) -> ParseResult<(Option<String>, &str)> {
    pair(
        opt(terminated(display_name, sws)),
        delimited(char('<'), take_while1(|c: char| c != '>'), char('>')),
    )(input)
}

/// Bare addr-spec; header parameters start at the first `;`
pub fn addr_spec(input: &str) -> ParseResult<&str> {
    take_while1(|c: char| !is_wsp(c) && !matches!(c, ';' | ',' | '<' | '>' | '"'))(input)
}

pub fn name_addr_or_addr_spec(input: &str) -> ParseResult<(Option<String>, &str)> {
    alt((name_addr, map(addr_spec, |uri| (None, uri))))(input)
}

fn gen_value(input: &str) -> ParseResult<&str> {
    alt((
        recognize(quoted_string),
        take_while1(|c: char| is_token_char(c) || matches!(c, ':' | '[' | ']')),
    ))(input)
}

/// generic-param: `token [ "=" gen-value ]`
pub fn generic_param(input: &str) -> ParseResult<Param> {
    map(
        pair(
            take_while1(is_token_char),
            opt(preceded(tuple((sws, char('='), sws)), gen_value)),
        ),
        |(name, value): (&str, Option<&str>)| (name.to_string(), value.map(str::to_string)),
    )(input)
}

/// Zero or more `;`-prefixed header parameters
pub fn header_params(input: &str) -> ParseResult<Vec<Param>> {
    many0(preceded(tuple((sws, char(';'), sws)), generic_param))(input)
}

/// A complete From/To header value
pub fn address_value(input: &str) -> ParseResult<((Option<String>, &str), Vec<Param>)> {
    all_consuming(delimited(sws, pair(name_addr_or_addr_spec, header_params), sws))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_string() {
        let (rem, s) = quoted_string("\"Alice <Ops>; \\\"x\\\"\" rest").unwrap();
        assert_eq!(s, "Alice <Ops>; \"x\"");
        assert_eq!(rem, " rest");

        let (_, s) = quoted_string("\"\"").unwrap();
        assert_eq!(s, "");

        assert!(quoted_string("\"unterminated").is_err());
    }

    #[test]
    fn test_display_name_forms() {
        let (rem, name) = display_name("Bob Smith <sip:bob@biloxi.com>").unwrap();
        assert_eq!(name, "Bob Smith");
        assert_eq!(rem, " <sip:bob@biloxi.com>");

        let (rem, name) = display_name("\"Bob <Sales>\"<sip:bob@biloxi.com>").unwrap();
        assert_eq!(name, "Bob <Sales>");
        assert_eq!(rem, "<sip:bob@biloxi.com>");
    }

    #[test]
    fn test_name_addr() {
        let (rem, (name, uri)) = name_addr("\"A;B\" <sip:a@b.com;transport=tcp>;tag=1").unwrap();
        assert_eq!(name.as_deref(), Some("A;B"));
        assert_eq!(uri, "sip:a@b.com;transport=tcp");
        assert_eq!(rem, ";tag=1");

        assert!(name_addr("sip:a@b.com").is_err());
        assert!(name_addr("<>").is_err());
    }

    #[test]
    fn test_addr_spec_fallback() {
        let (rem, (name, uri)) = name_addr_or_addr_spec("sip:carol@chicago.com;tag=887s").unwrap();
        assert_eq!(name, None);
        assert_eq!(uri, "sip:carol@chicago.com");
        assert_eq!(rem, ";tag=887s");
    }

    #[test]
    fn test_header_params() {
        let (rem, params) = header_params(" ; tag = 88 ;lr;received=[2001:db8::1];x=\"a;b\"").unwrap();
        assert_eq!(rem, "");
        assert_eq!(
            params,
            vec![
                ("tag".to_string(), Some("88".to_string())),
                ("lr".to_string(), None),
                ("received".to_string(), Some("[2001:db8::1]".to_string())),
                ("x".to_string(), Some("\"a;b\"".to_string())),
            ]
        );
    }

    #[test]
    fn test_address_value_rejects_trailing_garbage() {
        assert!(address_value("<sip:a@b.com> junk").is_err());
        assert!(address_value("Bob <sip:bob@biloxi.com").is_err());
        assert!(address_value("").is_err());
        assert!(address_value("  <sip:a@b.com>;tag=1  ").is_ok());
    }
}
