//! Skip-policy registry.
//!
//! A policy is an ordered table of [`SkipRule`]s evaluated uniformly for each
//! case. The first `Skip` rule that matches ends evaluation; `Rename` rules
//! change the SQL-visible name seen by later rules; `Probe` rules call the
//! adapted function with sample arguments and skip when generic dispatch has
//! no matching loop.

use serde::Serialize;
use tracing::debug;
use udfparity_error::{Result, UdfError};
use udfparity_func::{AdaptedFunction, Suite};
use udfparity_runtime::ServerVersion;
use udfparity_types::Value;

/// Sample argument used by probe rules.
pub const PROBE_ARG: f64 = 0.5;

/// Version constraint of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionBound {
    /// `version <= bound`
    AtMost(ServerVersion),
    /// `version < bound`
    Below(ServerVersion),
}

impl VersionBound {
    #[must_use]
    pub fn admits(self, version: ServerVersion) -> bool {
        match self {
            Self::AtMost(bound) => version <= bound,
            Self::Below(bound) => version < bound,
        }
    }
}

/// What a matching rule does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Skip with a reason template. `{name}` and `{version}` are substituted.
    Skip(&'static str),
    /// Call the function on sample arguments; skip on dispatch failure.
    Probe,
    /// Register and query under `name + suffix`.
    Rename(&'static str),
}

/// One declarative rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkipRule {
    pub id: &'static str,
    /// Names the rule applies to; empty means every name.
    pub names: &'static [&'static str],
    pub version: Option<VersionBound>,
    /// Only applies when the runtime has CUDA enabled.
    pub cuda_only: bool,
    pub action: RuleAction,
}

impl SkipRule {
    #[must_use]
    pub fn matches(&self, ctx: &CaseContext<'_>) -> bool {
        (self.names.is_empty() || self.names.contains(&ctx.name))
            && self.version.is_none_or(|bound| bound.admits(ctx.version))
            && (!self.cuda_only || ctx.has_cuda)
    }
}

/// What the rules see about a case.
#[derive(Debug, Clone, Copy)]
pub struct CaseContext<'a> {
    pub name: &'a str,
    pub version: ServerVersion,
    pub has_cuda: bool,
}

/// Outcome of evaluating a policy for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Run the case; `name` is the SQL-visible function name.
    Run { name: String },
    Skip { rule: String, reason: String },
}

fn render(template: &str, ctx: &CaseContext<'_>) -> String {
    template
        .replace("{name}", ctx.name)
        .replace("{version}", &ctx.version.to_string())
}

/// An ordered rule table.
#[derive(Debug, Clone, Default)]
pub struct SkipPolicy {
    rules: Vec<SkipRule>,
}

impl SkipPolicy {
    #[must_use]
    pub fn new(rules: Vec<SkipRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn math() -> Self {
        Self::new(MATH_RULES.to_vec())
    }

    #[must_use]
    pub fn numpy() -> Self {
        Self::new(NUMPY_RULES.to_vec())
    }

    #[must_use]
    pub fn for_suite(suite: Suite) -> Self {
        match suite {
            Suite::Math => Self::math(),
            Suite::Numpy => Self::numpy(),
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[SkipRule] {
        &self.rules
    }

    /// Evaluate every rule in order for `function`.
    ///
    /// A probe that fails for any reason other than a missing dispatch loop
    /// is returned as an error.
    pub fn decide(
        &self,
        version: ServerVersion,
        has_cuda: bool,
        function: &AdaptedFunction,
    ) -> Result<Decision> {
        let mut name = function.name().to_owned();
        for rule in &self.rules {
            let ctx = CaseContext {
                name: &name,
                version,
                has_cuda,
            };
            if !rule.matches(&ctx) {
                continue;
            }
            match rule.action {
                RuleAction::Skip(template) => {
                    let reason = render(template, &ctx);
                    debug!(name = %name, rule = rule.id, reason = %reason, "skip rule matched");
                    return Ok(Decision::Skip {
                        rule: rule.id.to_owned(),
                        reason,
                    });
                }
                RuleAction::Probe => {
                    let args = vec![Value::Double(PROBE_ARG); function.arity()];
                    match function.call(&args) {
                        Ok(_) => debug!(name = %name, rule = rule.id, "probe passed"),
                        Err(err @ UdfError::NoMatchingLoop { .. }) => {
                            let message = err.to_string();
                            let reason = message.lines().next().unwrap_or_default().to_owned();
                            debug!(name = %name, rule = rule.id, reason = %reason, "probe failed");
                            return Ok(Decision::Skip {
                                rule: rule.id.to_owned(),
                                reason,
                            });
                        }
                        Err(err) => return Err(err),
                    }
                }
                RuleAction::Rename(suffix) => {
                    debug!(name = %name, rule = rule.id, suffix, "renaming");
                    name.push_str(suffix);
                }
            }
        }
        Ok(Decision::Run { name })
    }
}

const fn skip(id: &'static str, names: &'static [&'static str], template: &'static str) -> SkipRule {
    SkipRule {
        id,
        names,
        version: None,
        cuda_only: false,
        action: RuleAction::Skip(template),
    }
}

const fn cuda_skip(
    id: &'static str,
    names: &'static [&'static str],
    template: &'static str,
) -> SkipRule {
    SkipRule {
        id,
        names,
        version: None,
        cuda_only: true,
        action: RuleAction::Skip(template),
    }
}

const V5_2: ServerVersion = ServerVersion::new(5, 2);
const V5_4: ServerVersion = ServerVersion::new(5, 4);

/// Names registered with a `FIX` suffix on servers older than 5.2.
pub const FORBIDDEN_NAMES: &[&str] = &[
    "sinh", "cosh", "tanh", "rint", "trunc", "expm1", "exp2", "log2", "log1p", "gcd", "lcm",
    "around", "fmod", "hypot",
];

pub static MATH_RULES: &[SkipRule] = &[
    skip("math-fixme", &["inf", "nan"], "{name}: FIXME"),
    skip(
        "math-cpython",
        &["prod", "remainder", "log2", "comb", "factorial", "fmod", "isclose", "isqrt"],
        "{name}: Numba uses cpython implementation! Replace it",
    ),
    skip("math-pair", &["frexp"], "{name} returns a pair (m, e)"),
];

pub static NUMPY_RULES: &[SkipRule] = &[
    skip(
        "numpy-signbit",
        &["signbit"],
        "np.signbit requires numba runtime [issue 152]",
    ),
    skip(
        "numpy-unsupported",
        &["cbrt", "float_power"],
        "Numba does not support {name}",
    ),
    SkipRule {
        id: "numpy-boolean-args",
        names: &["logical_or", "logical_xor", "logical_and", "logical_not"],
        version: Some(VersionBound::AtMost(V5_4)),
        cuda_only: false,
        action: RuleAction::Skip(
            "using boolean arguments requires omniscidb v 5.4 or newer (got {version}) [issue 108]",
        ),
    },
    SkipRule {
        id: "numpy-dispatch-probe",
        names: &["positive", "divmod0", "frexp0"],
        version: None,
        cuda_only: false,
        action: RuleAction::Probe,
    },
    skip(
        "numpy-fixme",
        &["ldexp", "spacing", "nextafter", "signbit"],
        "{name}: FIXME",
    ),
    cuda_skip(
        "numpy-cuda-59",
        &[
            "arcsin", "arccos", "arctan", "arctan2", "hypot", "sinh", "cosh", "tanh", "arcsinh",
            "arccosh", "arctanh", "expm1", "exp2", "log2", "log1p", "logaddexp2",
        ],
        "{name}: crashes CUDA enabled omniscidb server [rbc issue 59]",
    ),
    cuda_skip(
        "numpy-cuda-60",
        &["logaddexp"],
        "{name}: crashes CUDA enabled omniscidb server [rbc issue 60]",
    ),
    cuda_skip(
        "numpy-cuda-71",
        &["lcm"],
        "{name}: crashes CUDA enabled omniscidb server [rbc issue 71]",
    ),
    SkipRule {
        id: "numpy-forbidden-names",
        names: FORBIDDEN_NAMES,
        version: Some(VersionBound::Below(V5_2)),
        cuda_only: false,
        action: RuleAction::Rename("FIX"),
    },
    SkipRule {
        id: "numpy-cuda-legacy",
        names: &["fmax", "fmin", "power", "sqrt", "tan", "radians", "degrees"],
        version: Some(VersionBound::Below(V5_2)),
        cuda_only: true,
        action: RuleAction::Skip("{name}: crashes CUDA enabled omniscidb server < 5.2"),
    },
];

#[cfg(test)]
mod tests {
    use udfparity_func::{Catalog, adapt};

    use super::*;

    fn numpy_fn(name: &str) -> AdaptedFunction {
        let catalog = Catalog::numpy().unwrap();
        adapt(catalog.get(name).unwrap()).unwrap()
    }

    fn decide(policy: &SkipPolicy, name: &str, version: (u32, u32), cuda: bool) -> Decision {
        policy
            .decide(ServerVersion::new(version.0, version.1), cuda, &numpy_fn(name))
            .unwrap()
    }

    fn reason(decision: Decision) -> String {
        match decision {
            Decision::Skip { reason, .. } => reason,
            Decision::Run { name } => panic!("expected skip, ran as {name}"),
        }
    }

    #[test]
    fn ldexp_is_skipped_on_every_version() {
        let policy = SkipPolicy::numpy();
        for version in [(5, 0), (5, 4), (5, 5), (6, 0)] {
            for cuda in [false, true] {
                assert_eq!(
                    reason(decide(&policy, "ldexp", version, cuda)),
                    "ldexp: FIXME"
                );
            }
        }
    }

    #[test]
    fn signbit_hits_first_rule() {
        let policy = SkipPolicy::numpy();
        match decide(&policy, "signbit", (5, 5), false) {
            Decision::Skip { rule, reason } => {
                assert_eq!(rule, "numpy-signbit");
                assert_eq!(reason, "np.signbit requires numba runtime [issue 152]");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn boolean_rule_depends_on_version() {
        let policy = SkipPolicy::numpy();
        assert_eq!(
            reason(decide(&policy, "logical_and", (5, 4), false)),
            "using boolean arguments requires omniscidb v 5.4 or newer (got 5.4) [issue 108]"
        );
        assert_eq!(
            decide(&policy, "logical_and", (5, 5), false),
            Decision::Run {
                name: "logical_and".to_owned()
            }
        );
    }

    #[test]
    fn cuda_rules_only_apply_with_cuda() {
        let policy = SkipPolicy::numpy();
        assert_eq!(
            reason(decide(&policy, "lcm", (5, 5), true)),
            "lcm: crashes CUDA enabled omniscidb server [rbc issue 71]"
        );
        assert_eq!(
            reason(decide(&policy, "logaddexp", (5, 5), true)),
            "logaddexp: crashes CUDA enabled omniscidb server [rbc issue 60]"
        );
        assert!(matches!(
            decide(&policy, "lcm", (5, 5), false),
            Decision::Run { .. }
        ));
        assert_eq!(
            reason(decide(&policy, "sqrt", (5, 1), true)),
            "sqrt: crashes CUDA enabled omniscidb server < 5.2"
        );
        assert!(matches!(
            decide(&policy, "sqrt", (5, 2), true),
            Decision::Run { .. }
        ));
    }

    #[test]
    fn forbidden_names_renamed_before_5_2() {
        let policy = SkipPolicy::numpy();
        assert_eq!(
            decide(&policy, "gcd", (5, 1), false),
            Decision::Run {
                name: "gcdFIX".to_owned()
            }
        );
        assert_eq!(
            decide(&policy, "gcd", (5, 2), false),
            Decision::Run {
                name: "gcd".to_owned()
            }
        );
    }

    #[test]
    fn builtin_probes_pass() {
        let policy = SkipPolicy::numpy();
        for name in ["positive", "divmod0", "frexp0"] {
            assert!(matches!(
                decide(&policy, name, (5, 5), false),
                Decision::Run { .. }
            ));
        }
    }

    #[test]
    fn probe_without_loop_becomes_skip() {
        let policy = SkipPolicy::new(vec![SkipRule {
            id: "probe-gcd",
            names: &["gcd"],
            version: None,
            cuda_only: false,
            action: RuleAction::Probe,
        }]);
        match decide(&policy, "gcd", (5, 5), false) {
            Decision::Skip { rule, reason } => {
                assert_eq!(rule, "probe-gcd");
                assert!(reason.contains("gcd"), "{reason}");
                assert!(!reason.contains('\n'));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn math_rules() {
        let policy = SkipPolicy::math();
        let catalog = Catalog::math().unwrap();
        let run = |name: &str| {
            policy
                .decide(
                    ServerVersion::new(5, 5),
                    false,
                    &adapt(catalog.get(name).unwrap()).unwrap(),
                )
                .unwrap()
        };
        assert_eq!(reason(run("nan")), "nan: FIXME");
        assert_eq!(
            reason(run("isqrt")),
            "isqrt: Numba uses cpython implementation! Replace it"
        );
        assert_eq!(reason(run("frexp")), "frexp returns a pair (m, e)");
        assert!(matches!(run("modf"), Decision::Run { .. }));
        assert!(matches!(run("ldexp"), Decision::Run { .. }));
        assert!(matches!(run("sqrt"), Decision::Run { .. }));
    }

    #[test]
    fn empty_name_list_matches_everything() {
        let rule = skip("all", &[], "{name}: off");
        let ctx = CaseContext {
            name: "anything",
            version: ServerVersion::default(),
            has_cuda: false,
        };
        assert!(rule.matches(&ctx));
    }
}
