//! Turning catalog references into compilable scalar functions.
//!
//! The adapter shape comes from the entry's [`AdapterKind`]:
//!
//! | kind | body | arity |
//! |------|------|-------|
//! | `Direct` | the scalar reference itself | the reference's own |
//! | `ElementwiseWrap` | 1- or 2-parameter lambda calling the ufunc on length-1 slices | the signature's |
//! | `ConstantWrap` | ignores its arguments, returns the constant | the signature's |
//!
//! Every adapted function carries its public name explicitly; renaming
//! produces a new pairing and never touches the body.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use udfparity_error::{Result, UdfError};
use udfparity_types::{Signature, Value};

use crate::catalog::{AdapterKind, CatalogEntry, Reference};

/// Largest arity an adapter will produce.
pub const MAX_ADAPTED_ARITY: usize = 2;

/// Shareable UDF body.
pub type UdfBody = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A named scalar function ready for registration.
#[derive(Clone)]
pub struct AdaptedFunction {
    name: String,
    signature: Signature,
    kind: AdapterKind,
    arity: usize,
    body: UdfBody,
}

impl AdaptedFunction {
    pub fn new(
        name: impl Into<String>,
        signature: Signature,
        kind: AdapterKind,
        arity: usize,
        body: UdfBody,
    ) -> Self {
        Self {
            name: name.into(),
            signature,
            kind,
            arity,
            body,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub const fn kind(&self) -> AdapterKind {
        self.kind
    }

    /// Number of parameters the body accepts.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }

    /// Invoke the body.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        if args.len() != self.arity {
            return Err(UdfError::function_error(format!(
                "{}() takes {} positional arguments but {} were given",
                self.name,
                self.arity,
                args.len()
            )));
        }
        (self.body)(args)
    }

    /// Same body, bound to a different public name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for AdaptedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptedFunction")
            .field("name", &self.name)
            .field("signature", &self.signature.as_str())
            .field("kind", &self.kind)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Adapt a catalog entry. Arity above [`MAX_ADAPTED_ARITY`] fails fast with
/// a configuration error.
pub fn adapt(entry: &CatalogEntry) -> Result<AdaptedFunction> {
    let signature = entry.signature().clone();
    let declared = signature.arity();
    if declared > MAX_ADAPTED_ARITY {
        return Err(UdfError::UnsupportedArity {
            name: entry.name().to_owned(),
            signature: signature.as_str().to_owned(),
            arity: declared,
        });
    }

    let (arity, body): (usize, UdfBody) = match *entry.reference() {
        Reference::Scalar { arity, call } => {
            let body: UdfBody = Arc::new(call);
            (arity, body)
        }
        Reference::Ufunc(ufunc) => {
            let body: UdfBody = match declared {
                1 => Arc::new(move |args: &[Value]| {
                    let out = ufunc.call(&[std::slice::from_ref(&args[0])])?;
                    first(ufunc.name(), out)
                }),
                2 => Arc::new(move |args: &[Value]| {
                    let out = ufunc.call(&[
                        std::slice::from_ref(&args[0]),
                        std::slice::from_ref(&args[1]),
                    ])?;
                    first(ufunc.name(), out)
                }),
                other => {
                    return Err(UdfError::UnsupportedArity {
                        name: entry.name().to_owned(),
                        signature: signature.as_str().to_owned(),
                        arity: other,
                    });
                }
            };
            (declared, body)
        }
        Reference::Constant(value) => {
            let body: UdfBody = Arc::new(move |_: &[Value]| Ok(Value::Double(value)));
            (declared, body)
        }
    };

    debug!(
        name = entry.name(),
        signature = signature.as_str(),
        adapter = entry.adapter().as_str(),
        arity,
        "adapted reference"
    );
    Ok(AdaptedFunction::new(
        entry.name(),
        signature,
        entry.adapter(),
        arity,
        body,
    ))
}

fn first(name: &str, mut out: Vec<Value>) -> Result<Value> {
    out.pop()
        .ok_or_else(|| UdfError::internal(format!("{name} produced no output")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::ufunc;

    #[test]
    fn direct_keeps_reference_arity() {
        let math = Catalog::math().unwrap();
        let sqrt = adapt(math.get("sqrt").unwrap()).unwrap();
        assert_eq!(sqrt.name(), "sqrt");
        assert_eq!(sqrt.kind(), AdapterKind::Direct);
        assert_eq!(sqrt.arity(), 1);
        assert_eq!(sqrt.call(&[Value::Double(4.0)]).unwrap(), Value::Double(2.0));

        let widened = CatalogEntry::new(
            "modf",
            "double(double, double)",
            Reference::scalar(1, crate::math::modf),
        )
        .unwrap();
        let modf = adapt(&widened).unwrap();
        assert_eq!(modf.arity(), 1);
        assert_eq!(modf.signature().arity(), 2);
    }

    #[test]
    fn elementwise_wraps_ufunc() {
        let numpy = Catalog::numpy().unwrap();
        let hypot = adapt(numpy.get("hypot").unwrap()).unwrap();
        assert_eq!(hypot.kind(), AdapterKind::ElementwiseWrap);
        assert_eq!(hypot.arity(), 2);
        assert_eq!(
            hypot
                .call(&[Value::Double(3.0), Value::Double(4.0)])
                .unwrap(),
            Value::Double(5.0)
        );
        let err = hypot.call(&[Value::Double(3.0)]).unwrap_err();
        assert!(err.to_string().contains("takes 2 positional arguments"));
    }

    #[test]
    fn constant_ignores_input() {
        let math = Catalog::math().unwrap();
        let tau = adapt(math.get("tau").unwrap()).unwrap();
        assert_eq!(tau.kind(), AdapterKind::ConstantWrap);
        assert_eq!(tau.arity(), 1);
        assert_eq!(
            tau.call(&[Value::Double(123.0)]).unwrap(),
            Value::Double(std::f64::consts::TAU)
        );
    }

    #[test]
    fn arity_above_two_fails_fast() {
        let entry = CatalogEntry::new(
            "fma",
            "double(double, double, double)",
            Reference::Ufunc(&ufunc::ADD),
        )
        .unwrap();
        let err = adapt(&entry).unwrap_err();
        assert!(err.is_configuration(), "{err:?}");
        assert!(matches!(err, UdfError::UnsupportedArity { arity: 3, .. }));
    }

    #[test]
    fn rename_is_a_new_pairing() {
        let numpy = Catalog::numpy().unwrap();
        let sinh = adapt(numpy.get("sinh").unwrap()).unwrap();
        let fixed = sinh.renamed("sinhFIX");
        assert_eq!(sinh.name(), "sinh");
        assert_eq!(fixed.name(), "sinhFIX");
        assert_eq!(
            fixed.call(&[Value::Double(0.0)]).unwrap(),
            sinh.call(&[Value::Double(0.0)]).unwrap()
        );
        assert!(format!("{fixed:?}").contains("sinhFIX"));
    }
}
