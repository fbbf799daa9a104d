//! Built-in rule catalog for Dockerfiles and Kubernetes Pod manifests
//!
//! Order matters only for output ordering: every top-level rule is
//! independent. The Pod group reports a missing `securityContext:` block on
//! its own and only inspects the individual hardening flags once the block
//! exists.

use crate::models::Severity;
use crate::rules::base::{Outcome, Predicate, Rule, RuleKind};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::warn;

static ENV_PASSWORD: OnceLock<Regex> = OnceLock::new();
static EXPOSE_HTTP: OnceLock<Regex> = OnceLock::new();
static BROAD_COPY_SOURCE: OnceLock<Regex> = OnceLock::new();

/// `ENV <name containing PASS> = <value>`, case-sensitive, one line
pub(crate) fn env_password_pattern() -> &'static Regex {
    ENV_PASSWORD.get_or_init(|| Regex::new(r"(?m)^ENV[ \t]+\w*PASS\w*[ \t]*=[ \t]*\S.*").unwrap())
}

/// `COPY` whose source is the build context root (`.` or `./`) or `/`
pub(crate) fn broad_copy_pattern() -> &'static Regex {
    BROAD_COPY_SOURCE.get_or_init(|| {
        Regex::new(r"(?m)COPY[ \t]+(?:--\S+[ \t]+)*(?:\./?|/)(?:[ \t]|$)").unwrap()
    })
}

/// `EXPOSE 80`, but not `EXPOSE 8080`
pub(crate) fn expose_http_pattern() -> &'static Regex {
    EXPOSE_HTTP.get_or_init(|| Regex::new(r"EXPOSE 80\b").unwrap())
}

pub const ROOT_USER: Outcome = Outcome::new(
    Severity::High,
    "Runs as root user",
    "Use non-root user (CIS Docker Benchmark 4.1, OWASP A3)",
);
pub const LATEST_TAG: Outcome = Outcome::new(
    Severity::Medium,
    "Uses 'latest' tag",
    "Use fixed version tag like 'ubuntu:20.04' (OWASP A1)",
);
pub const ENV_PASSWORD_OUTCOME: Outcome = Outcome::new(
    Severity::High,
    "ENV variable contains possible password",
    "Avoid using passwords in ENV (OWASP A6)",
);
pub const ADD_INSTEAD_OF_COPY: Outcome = Outcome::new(
    Severity::Low,
    "Using ADD instead of COPY",
    "Use COPY unless you need ADD features (CIS 4.9)",
);
pub const BROAD_COPY: Outcome = Outcome::new(
    Severity::Medium,
    "Copying entire directory",
    "Use specific files/folders in COPY (CIS 4.10)",
);
pub const PLAIN_HTTP_PORT: Outcome = Outcome::new(
    Severity::Medium,
    "Exposing port 80 without HTTPS",
    "Consider using EXPOSE 443 (OWASP A5)",
);
pub const MISSING_HEALTHCHECK: Outcome = Outcome::new(
    Severity::Low,
    "No HEALTHCHECK defined",
    "Define a HEALTHCHECK for better container reliability (OWASP A10)",
);
pub const INSTALL_RECOMMENDS: Outcome = Outcome::new(
    Severity::Low,
    "No install optimization",
    "Use --no-install-recommends to reduce image size (CIS 4.4)",
);
pub const APT_CACHE: Outcome = Outcome::new(
    Severity::Low,
    "APT cache not cleaned",
    "Clean apt cache after install to reduce size (CIS 4.5)",
);
pub const K8S_SECURITY_CONTEXT: Outcome = Outcome::new(
    Severity::High,
    "Kubernetes: securityContext block missing",
    "Define securityContext with proper fields (CIS K8s 5.2.5)",
);
pub const K8S_RUN_AS_NON_ROOT: Outcome = Outcome::new(
    Severity::Medium,
    "Kubernetes: runAsNonRoot missing",
    "Set runAsNonRoot: true (CIS K8s 5.2.6)",
);
pub const K8S_READ_ONLY_ROOT_FS: Outcome = Outcome::new(
    Severity::Medium,
    "Kubernetes: readOnlyRootFilesystem missing",
    "Set readOnlyRootFilesystem: true (CIS K8s 5.2.8)",
);
pub const K8S_PRIVILEGE_ESCALATION: Outcome = Outcome::new(
    Severity::Medium,
    "Kubernetes: allowPrivilegeEscalation missing",
    "Set allowPrivilegeEscalation: false (CIS K8s 5.2.9)",
);

/// Ordered, immutable set of rules handed to the engine
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleCatalog {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The default catalog
    pub fn builtin() -> Self {
        Self::new(vec![
            Rule::simple("root-user", Predicate::contains("USER root"), ROOT_USER),
            Rule::simple(
                "latest-tag",
                Predicate::any(vec![
                    Predicate::contains("ubuntu:latest"),
                    Predicate::contains("alpine:latest"),
                ]),
                LATEST_TAG,
            ),
            Rule::simple(
                "env-password",
                Predicate::matches(env_password_pattern()),
                ENV_PASSWORD_OUTCOME,
            ),
            Rule::simple("add-instead-of-copy", Predicate::contains("ADD "), ADD_INSTEAD_OF_COPY),
            Rule::simple(
                "broad-copy",
                Predicate::matches(broad_copy_pattern()),
                BROAD_COPY,
            ),
            Rule::simple(
                "plain-http-port",
                Predicate::matches(expose_http_pattern()),
                PLAIN_HTTP_PORT,
            ),
            Rule::simple(
                "missing-healthcheck",
                Predicate::absent("HEALTHCHECK"),
                MISSING_HEALTHCHECK,
            ),
            Rule::simple(
                "install-recommends",
                Predicate::all(vec![
                    Predicate::contains("apt-get install"),
                    Predicate::absent("--no-install-recommends"),
                ]),
                INSTALL_RECOMMENDS,
            ),
            Rule::simple(
                "apt-cache",
                Predicate::absent("rm -rf /var/lib/apt/lists"),
                APT_CACHE,
            ),
            Rule::gated(
                "k8s-pod",
                "Kubernetes Pod hardening",
                Predicate::all(vec![
                    Predicate::contains("apiVersion"),
                    Predicate::contains("kind: Pod"),
                ]),
                vec![
                    Rule::simple(
                        "k8s-security-context",
                        Predicate::absent("securityContext:"),
                        K8S_SECURITY_CONTEXT,
                    ),
                    Rule::gated(
                        "k8s-security-context-fields",
                        "securityContext hardening flags",
                        Predicate::contains("securityContext:"),
                        vec![
                            Rule::simple(
                                "k8s-run-as-non-root",
                                Predicate::absent("runAsNonRoot: true"),
                                K8S_RUN_AS_NON_ROOT,
                            ),
                            Rule::simple(
                                "k8s-read-only-root-fs",
                                Predicate::absent("readOnlyRootFilesystem: true"),
                                K8S_READ_ONLY_ROOT_FS,
                            ),
                            Rule::simple(
                                "k8s-privilege-escalation",
                                Predicate::absent("allowPrivilegeEscalation: false"),
                                K8S_PRIVILEGE_ESCALATION,
                            ),
                        ],
                    ),
                ],
            ),
        ])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every rule id in the catalog, depth-first
    pub fn ids(&self) -> Vec<&'static str> {
        self.entries().into_iter().map(|e| e.id).collect()
    }

    /// Flattened view for listing, depth-first with nesting depth
    pub fn entries(&self) -> Vec<CatalogEntry> {
        fn walk(rules: &[Rule], depth: usize, out: &mut Vec<CatalogEntry>) {
            for rule in rules {
                out.push(CatalogEntry {
                    id: rule.id,
                    depth,
                    severity: rule.severity(),
                    description: rule.description(),
                });
                walk(rule.children(), depth + 1, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.rules, 0, &mut out);
        out
    }

    /// Copy of this catalog with the given rules removed.
    ///
    /// Removing a group removes all of its children. Unknown ids are logged
    /// and otherwise ignored.
    pub fn without<S: AsRef<str>>(&self, disabled: &[S]) -> Self {
        let disabled: HashSet<&str> = disabled.iter().map(|s| s.as_ref()).collect();
        let known: HashSet<&str> = self.ids().into_iter().collect();
        for id in disabled.iter().filter(|id| !known.contains(*id)) {
            warn!("Ignoring unknown rule id '{}'", id);
        }

        fn filter(rules: &[Rule], disabled: &HashSet<&str>) -> Vec<Rule> {
            rules
                .iter()
                .filter(|r| !disabled.contains(r.id))
                .map(|r| match &r.kind {
                    RuleKind::Simple { .. } => r.clone(),
                    RuleKind::Gated {
                        gate,
                        description,
                        children,
                    } => Rule::gated(r.id, *description, gate.clone(), filter(children, disabled)),
                })
                .collect()
        }

        Self::new(filter(&self.rules, &disabled))
    }
}

/// One line of a flattened catalog listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub depth: usize,
    pub severity: Option<Severity>,
    pub description: &'static str,
}
