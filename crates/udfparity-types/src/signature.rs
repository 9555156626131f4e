//! Signature mini-language: `ReturnKind(ArgKind, ArgKind, ...)`.
//!
//! A signature contains exactly one parenthesized, comma-separated argument
//! list. Anything else is a configuration error, never a skip.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;
use udfparity_error::{Result, UdfError};

use crate::Kind;

/// A parsed UDF type signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature {
    text: String,
    ret: Kind,
    args: Vec<Kind>,
}

impl Signature {
    /// Parse `R(K1, K2, ...)`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let malformed = |detail: &str| UdfError::MalformedSignature {
            signature: text.to_owned(),
            detail: detail.to_owned(),
        };

        let open = text.find('(').ok_or_else(|| malformed("missing '('"))?;
        if text[open + 1..].contains('(') {
            return Err(malformed("more than one argument list"));
        }
        let inner = text[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| malformed("argument list must end the signature with ')'"))?;
        if inner.contains(')') {
            return Err(malformed("unbalanced ')'"));
        }

        let ret_token = text[..open].trim();
        if ret_token.is_empty() {
            return Err(malformed("missing return kind"));
        }
        let ret = Kind::parse(ret_token)?;
        if ret == Kind::Constant {
            return Err(malformed("'constant' is not a return kind"));
        }

        let args = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner
                .split(',')
                .map(|token| {
                    if token.trim().is_empty() {
                        Err(malformed("empty argument kind"))
                    } else {
                        Kind::parse(token)
                    }
                })
                .collect::<Result<Vec<_>>>()?
        };
        if args.contains(&Kind::Constant) && args.len() != 1 {
            return Err(malformed("'constant' must be the only argument kind"));
        }

        trace!(signature = text, arity = args.len(), "parsed signature");
        Ok(Self {
            text: text.to_owned(),
            ret,
            args,
        })
    }

    /// Number of usable arguments. A `constant` argument list is degenerate
    /// and has arity zero.
    #[must_use]
    pub fn arity(&self) -> usize {
        if self.args == [Kind::Constant] {
            0
        } else {
            self.args.len()
        }
    }

    /// First argument kind; `constant` when the list is empty.
    #[must_use]
    pub fn primary_kind(&self) -> Kind {
        self.args.first().copied().unwrap_or(Kind::Constant)
    }

    #[must_use]
    pub const fn return_kind(&self) -> Kind {
        self.ret
    }

    /// Kinds of the usable arguments.
    #[must_use]
    pub fn arg_kinds(&self) -> &[Kind] {
        if self.arity() == 0 {
            &[]
        } else {
            self.args.as_slice()
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Normalized spelling, e.g. `int(int, int)` → `int32(int32, int32)`.
    #[must_use]
    pub fn canonical(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(|k| k.as_str()).collect();
        format!("{}({})", self.ret.as_str(), args.join(", "))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Signature {
    type Err = UdfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Signature {
    type Error = UdfError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Signature> for String {
    fn from(value: Signature) -> Self {
        value.text
    }
}
