//! `${...}` token substitution in header value templates
//!
//! Templates are scanned once, left to right. Each recognised token is
//! dispatched to its resolver on [`TemplateContext`]; tokens that are not
//! recognised, or whose source is missing for this request, stay in the
//! output verbatim. Substituted text is never rescanned.
//!
//! | token              | value                                                   |
//! |--------------------|---------------------------------------------------------|
//! | `${from.address}`  | From URI                                                |
//! | `${from.domain}`   | From URI, configured domain replaced by the UID host    |
//! | `${from.userID}`   | From user part, configured domain removed               |
//! | `${to.address}`    | To URI                                                  |
//! | `${to.userID}`     | To user part                                            |
//! | `${domain}`        | configured domain                                       |
//! | `${tag}`           | From tag                                                |
//! | `${userID}`        | configured user id up to `@`                            |
//! | `${user.domain}`   | host part of the To URI                                 |
//! | `${from.fqdn}`     | From URI with the local FQDN as host                    |
//! | `${from.ip}`       | From URI with the local address as host                 |
//! | `${lookup.srv}`    | discovered proxy address                                |
//!
//! When `PLUS_DISABLED` is set, every `+` is removed from the result.

use tracing::debug;

use crate::context::TemplateContext;

/// A recognised template token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    FromAddress,
    FromDomain,
    FromUserId,
    ToAddress,
    ToUserId,
    Domain,
    Tag,
    UserId,
    UserDomain,
    FromFqdn,
    FromIp,
    LookupSrv,
}

type Resolver = fn(&TemplateContext) -> Option<String>;

static TOKENS: &[(&str, Token)] = &[
    ("from.address", Token::FromAddress),
    ("from.domain", Token::FromDomain),
    ("from.userID", Token::FromUserId),
    ("to.address", Token::ToAddress),
    ("to.userID", Token::ToUserId),
    ("domain", Token::Domain),
    ("tag", Token::Tag),
    ("userID", Token::UserId),
    ("user.domain", Token::UserDomain),
    ("from.fqdn", Token::FromFqdn),
    ("from.ip", Token::FromIp),
    ("lookup.srv", Token::LookupSrv),
];

impl Token {
    /// Looks a token up by the name between `${` and `}`
    pub fn from_name(name: &str) -> Option<Token> {
        TOKENS.iter().find(|(n, _)| *n == name).map(|(_, t)| *t)
    }

    /// Name as written in templates, without `${}`
    pub fn name(self) -> &'static str {
        match self {
            Token::FromAddress => "from.address",
            Token::FromDomain => "from.domain",
            Token::FromUserId => "from.userID",
            Token::ToAddress => "to.address",
            Token::ToUserId => "to.userID",
            Token::Domain => "domain",
            Token::Tag => "tag",
            Token::UserId => "userID",
            Token::UserDomain => "user.domain",
            Token::FromFqdn => "from.fqdn",
            Token::FromIp => "from.ip",
            Token::LookupSrv => "lookup.srv",
        }
    }

    fn resolver(self) -> Resolver {
        match self {
            Token::FromAddress => TemplateContext::from_address,
            Token::FromDomain => TemplateContext::from_domain,
            Token::FromUserId => TemplateContext::from_user_id,
            Token::ToAddress => TemplateContext::to_address,
            Token::ToUserId => TemplateContext::to_user_id,
            Token::Domain => TemplateContext::domain,
            Token::Tag => TemplateContext::tag,
            Token::UserId => TemplateContext::user_id,
            Token::UserDomain => TemplateContext::user_domain,
            Token::FromFqdn => TemplateContext::from_fqdn,
            Token::FromIp => TemplateContext::from_ip,
            Token::LookupSrv => TemplateContext::lookup_srv,
        }
    }

    /// Resolves this token against a context
    pub fn resolve(self, ctx: &TemplateContext) -> Option<String> {
        (self.resolver())(ctx)
    }

    /// True if `template` contains this token
    pub fn appears_in(self, template: &str) -> bool {
        tokens_in(template).any(|t| t == self)
    }
}

/// Recognised tokens in order of appearance
pub fn tokens_in(template: &str) -> impl Iterator<Item = Token> + '_ {
    Segments::new(template).filter_map(|s| match s {
        Segment::Token(name) => Token::from_name(name),
        Segment::Literal(_) => None,
    })
}

/// Resolves every token in `template` against `ctx`
///
/// # Examples
///
/// ```rust
/// use rvoip_config_headers::context::TemplateContext;
/// use rvoip_config_headers::template::resolve;
///
/// let ctx = TemplateContext {
///     domain: Some("example.com".into()),
///     ..Default::default()
/// };
/// assert_eq!(resolve("sip:x@${domain}", &ctx), "sip:x@example.com");
/// assert_eq!(resolve("${tag};${unknown}", &ctx), "${tag};${unknown}");
/// ```
pub fn resolve(template: &str, ctx: &TemplateContext) -> String {
    let mut out = String::with_capacity(template.len());

    for segment in Segments::new(template) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Token(name) => {
                match Token::from_name(name).and_then(|t| t.resolve(ctx)) {
                    Some(value) => out.push_str(&value),
                    None => {
                        debug!("Leaving template token ${{{}}} unresolved", name);
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
            }
        }
    }

    if ctx.plus_disabled && out.contains('+') {
        debug!("Stripping '+' from resolved header value");
        out.retain(|c| c != '+');
    }

    out
}

enum Segment<'a> {
    Literal(&'a str),
    Token(&'a str),
}

/// Splits a template into literal text and `${name}` tokens
struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Segments<'a> {
    fn new(template: &'a str) -> Self {
        Segments { rest: template }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        match self.rest.find("${") {
            Some(0) => match self.rest[2..].find('}') {
                Some(close) => {
                    let name = &self.rest[2..2 + close];
                    self.rest = &self.rest[2 + close + 1..];
                    Some(Segment::Token(name))
                }
                None => {
                    // Unterminated: the remainder is literal
                    let text = self.rest;
                    self.rest = "";
                    Some(Segment::Literal(text))
                }
            },
            Some(start) => {
                let text = &self.rest[..start];
                self.rest = &self.rest[start..];
                Some(Segment::Literal(text))
            }
            None => {
                let text = self.rest;
                self.rest = "";
                Some(Segment::Literal(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HostFacts;
    use crate::lookup::LookupOutcome;

    fn ctx() -> TemplateContext {
        TemplateContext {
            from_uri: Some("sip:+15551234@example.com".into()),
            from_tag: Some("1928301774".into()),
            to_uri: Some("sip:bob@biloxi.com;transport=udp".into()),
            domain: Some("example.com".into()),
            user_id: Some("alice@example.com".into()),
            account_uid: Some("alice@ims.example.net".into()),
            lookup_server: LookupOutcome::Resolved("10.9.8.7".into()),
            plus_disabled: false,
            host: HostFacts::default(),
        }
    }

    #[test]
    fn test_token_table_round_trip() {
        for (name, token) in TOKENS {
            assert_eq!(Token::from_name(name), Some(*token));
            assert_eq!(token.name(), *name);
        }
        assert_eq!(Token::from_name("from.Address"), None);
    }

    #[test]
    fn test_resolve_every_token() {
        let c = ctx();
        assert_eq!(resolve("${from.address}", &c), "sip:+15551234@example.com");
        assert_eq!(resolve("${from.domain}", &c), "sip:+15551234@ims.example.net");
        assert_eq!(resolve("${from.userID}", &c), "+15551234");
        assert_eq!(resolve("${to.address}", &c), "sip:bob@biloxi.com;transport=udp");
        assert_eq!(resolve("${to.userID}", &c), "bob");
        assert_eq!(resolve("${domain}", &c), "example.com");
        assert_eq!(resolve("${tag}", &c), "1928301774");
        assert_eq!(resolve("${userID}", &c), "alice");
        assert_eq!(resolve("${user.domain}", &c), "biloxi.com");
        assert_eq!(resolve("${lookup.srv}", &c), "10.9.8.7");
    }

    #[test]
    fn test_mixed_template() {
        let c = ctx();
        assert_eq!(
            resolve("<sip:${from.userID}@${domain};user=phone>;tag=${tag}", &c),
            "<sip:+15551234@example.com;user=phone>;tag=1928301774"
        );
    }

    #[test]
    fn test_missing_sources_leave_token() {
        let c = TemplateContext {
            lookup_server: LookupOutcome::Unresolved,
            from_tag: None,
            ..ctx()
        };
        assert_eq!(resolve("<sip:${lookup.srv};lr>", &c), "<sip:${lookup.srv};lr>");
        assert_eq!(resolve("${tag}-${domain}", &c), "${tag}-example.com");
    }

    #[test]
    fn test_plus_stripping() {
        let c = TemplateContext {
            plus_disabled: true,
            ..ctx()
        };
        assert_eq!(resolve("tel:+1${from.userID}", &c), "tel:115551234");
        assert_eq!(resolve("no plus here", &c), "no plus here");
    }

    #[test]
    fn test_substitutions_are_not_rescanned() {
        let c = TemplateContext {
            domain: Some("${tag}".into()),
            ..ctx()
        };
        assert_eq!(resolve("${domain}", &c), "${tag}");
    }

    #[test]
    fn test_malformed_templates() {
        let c = ctx();
        assert_eq!(resolve("", &c), "");
        assert_eq!(resolve("${domain", &c), "${domain");
        assert_eq!(resolve("$domain}", &c), "$domain}");
        assert_eq!(resolve("${}", &c), "${}");
        assert_eq!(resolve("a${domain}b${domain}", &c), "aexample.combexample.com");
    }

    #[test]
    fn test_tokens_in() {
        let found: Vec<_> = tokens_in("${from.ip};${bogus};${lookup.srv}").collect();
        assert_eq!(found, vec![Token::FromIp, Token::LookupSrv]);
        assert!(Token::FromFqdn.appears_in("x${from.fqdn}"));
        assert!(!Token::FromFqdn.appears_in("x${from.ip}"));
    }
}
