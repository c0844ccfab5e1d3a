//! Cookie and header projection of session tokens.
//!
//! Session tokens travel as cookies; the id-refresh and anti-CSRF tokens are
//! also mirrored in response headers so browser code can read them. Every
//! projection returns a complete [`HeaderMutations`] batch that the caller
//! applies in one go.

use crate::error::{Error, Result};

use httpdate::fmt_http_date;
use sessionline_api::{HandshakeInfo, SameSite, SessionRecord, Token};
use sessionline_config::CookieNames;
use std::time::{Duration, UNIX_EPOCH};

pub const SET_COOKIE: &str = "Set-Cookie";
pub const EXPOSE_HEADERS: &str = "Access-Control-Expose-Headers";
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";

/// Header value telling the client to forget its id-refresh token.
pub const ID_REFRESH_REMOVED: &str = "remove";

/// Options used to build a session cookie.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub name: String,

    pub path: String,

    pub domain: Option<String>,

    /// Send on HTTPS only.
    pub secure: bool,

    /// Not accessible to JS.
    pub http_only: bool,

    pub same_site: SameSite,

    /// Absolute expiry in epoch milliseconds, rendered as `Expires`.
    pub expires_at_ms: Option<u64>,

    /// Max-Age in seconds.
    pub max_age_seconds: Option<u64>,
}

impl CookieOptions {
    /// Options that mirror what the core said about a token.
    pub fn for_token(name: &str, token: &Token) -> Self {
        Self {
            name: name.to_string(),
            path: token.cookie_path.clone(),
            domain: token.cookie_domain.clone(),
            secure: token.cookie_secure,
            http_only: true,
            same_site: token.same_site,
            expires_at_ms: Some(token.expires_at),
            max_age_seconds: None,
        }
    }

    /// Options for clearing a cookie previously set under `path`.
    fn for_clearing(name: &str, path: &str, info: &HandshakeInfo) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            domain: info.cookie_domain.clone(),
            secure: info.cookie_secure,
            http_only: true,
            same_site: info.cookie_same_site,
            expires_at_ms: None,
            max_age_seconds: None,
        }
    }
}

fn cookie_name(opts: &CookieOptions) -> Result<&str> {
    let name = opts.name.as_str();
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_ascii_control() || c.is_whitespace() || "()<>@,;:\\\"/[]?={}".contains(c));
    if invalid {
        return Err(Error::Config(format!("invalid cookie name: {name:?}")));
    }
    Ok(name)
}

fn attributes(parts: &mut Vec<String>, opts: &CookieOptions) {
    parts.push(format!("Path={}", opts.path));

    if let Some(domain) = &opts.domain {
        parts.push(format!("Domain={domain}"));
    }

    if opts.secure {
        parts.push("Secure".to_string());
    }
    if opts.http_only {
        parts.push("HttpOnly".to_string());
    }

    parts.push(format!("SameSite={}", opts.same_site.as_str()));
}

/// Build a `Set-Cookie` header value.
pub fn build_set_cookie(value: &str, opts: &CookieOptions) -> Result<String> {
    let name = cookie_name(opts)?;

    let mut parts: Vec<String> = Vec::new();
    parts.push(format!("{name}={value}"));
    attributes(&mut parts, opts);

    if let Some(max_age) = opts.max_age_seconds {
        parts.push(format!("Max-Age={max_age}"));
    }
    if let Some(expires_ms) = opts.expires_at_ms {
        let expires = UNIX_EPOCH + Duration::from_millis(expires_ms);
        parts.push(format!("Expires={}", fmt_http_date(expires)));
    }

    Ok(parts.join("; "))
}

/// Build a `Set-Cookie` header value that clears the cookie.
pub fn build_clear_cookie(opts: &CookieOptions) -> Result<String> {
    let name = cookie_name(opts)?;

    let mut parts: Vec<String> = Vec::new();
    parts.push(format!("{name}="));
    attributes(&mut parts, opts);
    parts.push("Max-Age=0".to_string());
    parts.push(format!("Expires={}", fmt_http_date(UNIX_EPOCH)));

    Ok(parts.join("; "))
}

/// Ordered header writes for one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMutations {
    headers: Vec<(String, String)>,
}

impl HeaderMutations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn extend(&mut self, other: HeaderMutations) {
        self.headers.extend(other.headers);
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Values written under `name`, compared case-insensitively.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
            .collect()
    }

    /// Hand every header to `sink`, in order.
    pub fn apply<F>(&self, mut sink: F)
    where
        F: FnMut(&str, &str),
    {
        for (name, value) in self.iter() {
            sink(name, value);
        }
    }
}

/// Session tokens found on an incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_refresh_token: Option<String>,
    pub anti_csrf_token: Option<String>,
}

/// Split a `Cookie` request header into name/value pairs.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Maps session records onto cookies and headers using configured names.
#[derive(Debug, Clone, Default)]
pub struct CookieProjection {
    names: CookieNames,
}

impl CookieProjection {
    pub fn new(names: CookieNames) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &CookieNames {
        &self.names
    }

    /// Everything a record carries: any reissued tokens and the anti-CSRF
    /// header.
    pub fn session_headers(&self, record: &SessionRecord) -> Result<HeaderMutations> {
        let mut out = HeaderMutations::new();
        if let Some(token) = &record.access_token {
            out.extend(self.access_token_headers(token)?);
        }
        if let Some(token) = &record.refresh_token {
            out.push(
                SET_COOKIE,
                build_set_cookie(
                    &token.value,
                    &CookieOptions::for_token(&self.names.refresh_token, token),
                )?,
            );
        }
        if let Some(token) = &record.id_refresh_token {
            out.push(
                SET_COOKIE,
                build_set_cookie(
                    &token.value,
                    &CookieOptions::for_token(&self.names.id_refresh_token, token),
                )?,
            );
            out.push(
                &self.names.id_refresh_header,
                format!("{};{}", token.value, token.expires_at),
            );
        }
        if let Some(csrf) = &record.anti_csrf_token {
            out.push(&self.names.anti_csrf_header, csrf);
        }
        if record.id_refresh_token.is_some() || record.anti_csrf_token.is_some() {
            out.push(EXPOSE_HEADERS, self.expose_value());
        }
        Ok(out)
    }

    /// Set only the access-token cookie, as after a verify that reissued it.
    pub fn access_token_headers(&self, token: &Token) -> Result<HeaderMutations> {
        let mut out = HeaderMutations::new();
        out.push(
            SET_COOKIE,
            build_set_cookie(
                &token.value,
                &CookieOptions::for_token(&self.names.access_token, token),
            )?,
        );
        Ok(out)
    }

    /// Headers for a freshly created or refreshed session.
    ///
    /// Fails unless the record carries the whole token triple.
    pub fn full_triple_headers(&self, record: &SessionRecord) -> Result<HeaderMutations> {
        if !record.has_full_triple() {
            return Err(Error::Internal(
                "session record is missing part of the token triple".to_string(),
            ));
        }
        self.session_headers(record)
    }

    /// Expire every session cookie and tell the client to drop its
    /// id-refresh token.
    pub fn clear_headers(&self, info: &HandshakeInfo) -> Result<HeaderMutations> {
        let cookies = [
            (&self.names.access_token, &info.access_token_path),
            (&self.names.refresh_token, &info.refresh_token_path),
            (&self.names.id_refresh_token, &info.id_refresh_token_path),
        ];
        let mut out = HeaderMutations::new();
        for (name, path) in cookies {
            out.push(
                SET_COOKIE,
                build_clear_cookie(&CookieOptions::for_clearing(name, path, info))?,
            );
        }
        out.push(&self.names.id_refresh_header, ID_REFRESH_REMOVED);
        out.push(EXPOSE_HEADERS, self.expose_value());
        Ok(out)
    }

    /// Headers a pre-flight `OPTIONS` response needs.
    pub fn options_headers(&self) -> HeaderMutations {
        let mut out = HeaderMutations::new();
        out.push(ALLOW_HEADERS, self.names.anti_csrf_header.clone());
        out.push(ALLOW_CREDENTIALS, "true");
        out
    }

    /// Pull session tokens out of a request.
    ///
    /// `headers` is searched case-insensitively for the anti-CSRF header. The
    /// first cookie with a given name wins.
    pub fn read_request<'a, I>(&self, cookie_header: Option<&str>, headers: I) -> RequestTokens
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let cookies = cookie_header.map(parse_cookie_header).unwrap_or_default();
        let cookie = |name: &str| {
            cookies
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .filter(|v| !v.is_empty())
        };
        let anti_csrf_token = headers
            .into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(&self.names.anti_csrf_header))
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty());

        RequestTokens {
            access_token: cookie(&self.names.access_token),
            refresh_token: cookie(&self.names.refresh_token),
            id_refresh_token: cookie(&self.names.id_refresh_token),
            anti_csrf_token,
        }
    }

    fn expose_value(&self) -> String {
        format!(
            "{}, {}",
            self.names.id_refresh_header, self.names.anti_csrf_header
        )
    }
}
