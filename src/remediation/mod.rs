//! Deterministic remediation
//!
//! Produces a "fixed" copy of a document by running an ordered list of
//! named text transforms. Each step is a pure `&str -> String` function that
//! runs once over the whole text (no re-scanning of its own output) and is
//! idempotent on its own. The engine never looks at findings: the same input
//! always yields the same output.
//!
//! Steps, in order:
//!
//! | id                     | change                                                        |
//! |------------------------|---------------------------------------------------------------|
//! | `non-root-user`        | `USER root` → create and switch to `appuser`                  |
//! | `pin-base-image`       | `ubuntu:latest` → `ubuntu:20.04`, `alpine:latest` → `alpine:3.18` |
//! | `drop-password-env`    | delete `ENV ...PASS...=...` lines                             |
//! | `add-to-copy`          | literal `ADD . /app` → `COPY ./src /app`                      |
//! | `no-install-recommends`| add `--no-install-recommends` to `apt-get install`            |
//! | `apt-cache-cleanup`    | append `RUN rm -rf /var/lib/apt/lists/*` if missing           |
//! | `healthcheck`          | append a default `HEALTHCHECK` if missing                     |
//! | `https-port`           | `EXPOSE 80` → `EXPOSE 443`                                    |
//! | `k8s-security-context` | append a hardened `securityContext:` to manifests lacking one |

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

const APT_INSTALL: &str = "apt-get install";
const NO_RECOMMENDS: &str = "--no-install-recommends";
const APT_CLEANUP_MARKER: &str = "rm -rf /var/lib/apt/lists";
const APT_CLEANUP: &str = "RUN rm -rf /var/lib/apt/lists/*";
const HEALTHCHECK_MARKER: &str = "HEALTHCHECK";
const DEFAULT_HEALTHCHECK: &str = "HEALTHCHECK CMD curl --fail http://localhost || exit 1";
const MANIFEST_MARKER: &str = "apiVersion";
const SECURITY_CONTEXT_MARKER: &str = "securityContext:";
const HARDENED_SECURITY_CONTEXT: &str = "securityContext:\n  runAsNonRoot: true\n  readOnlyRootFilesystem: true\n  allowPrivilegeEscalation: false";

/// Pinned replacements for floating base-image tags
pub const PINNED_IMAGES: &[(&str, &str)] = &[
    ("ubuntu:latest", "ubuntu:20.04"),
    ("alpine:latest", "alpine:3.18"),
];

static PASSWORD_ENV_LINE: OnceLock<Regex> = OnceLock::new();

fn password_env_line() -> &'static Regex {
    // Whole line, trailing newline included
    PASSWORD_ENV_LINE.get_or_init(|| Regex::new(r"(?m)^ENV[ \t]+.*PASS.*=.*\n?").unwrap())
}

/// One named, pure text transform
#[derive(Debug, Clone, Copy)]
pub struct RemediationStep {
    pub id: &'static str,
    pub description: &'static str,
    apply: fn(&str) -> String,
}

impl RemediationStep {
    pub const fn new(id: &'static str, description: &'static str, apply: fn(&str) -> String) -> Self {
        Self {
            id,
            description,
            apply,
        }
    }

    pub fn apply(&self, document: &str) -> String {
        (self.apply)(document)
    }
}

/// Output of a remediation pass with the steps that changed the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remediation {
    pub fixed: String,
    pub applied: Vec<&'static str>,
}

impl Remediation {
    pub fn is_unchanged(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Ordered list of remediation steps
#[derive(Debug, Clone)]
pub struct RemediationEngine {
    steps: Vec<RemediationStep>,
}

impl Default for RemediationEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RemediationEngine {
    pub fn new(steps: Vec<RemediationStep>) -> Self {
        Self { steps }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            RemediationStep::new(
                "non-root-user",
                "Replace USER root with an unprivileged appuser",
                replace_root_user,
            ),
            RemediationStep::new(
                "pin-base-image",
                "Pin floating ubuntu/alpine tags",
                pin_base_images,
            ),
            RemediationStep::new(
                "drop-password-env",
                "Remove ENV lines that look like passwords",
                drop_password_env,
            ),
            RemediationStep::new(
                "add-to-copy",
                "Replace `ADD . /app` with `COPY ./src /app`",
                add_to_copy,
            ),
            RemediationStep::new(
                "no-install-recommends",
                "Add --no-install-recommends to apt-get install",
                add_no_install_recommends,
            ),
            RemediationStep::new(
                "apt-cache-cleanup",
                "Append an apt cache cleanup",
                append_apt_cleanup,
            ),
            RemediationStep::new("healthcheck", "Append a default HEALTHCHECK", append_healthcheck),
            RemediationStep::new("https-port", "Expose 443 instead of 80", expose_https),
            RemediationStep::new(
                "k8s-security-context",
                "Append a hardened securityContext to manifests",
                append_security_context,
            ),
        ])
    }

    pub fn steps(&self) -> &[RemediationStep] {
        &self.steps
    }

    /// Fixed copy of `document`
    pub fn remediate(&self, document: &str) -> String {
        self.steps
            .iter()
            .fold(document.to_string(), |text, step| step.apply(&text))
    }

    /// Fixed copy of `document` plus the ids of the steps that changed it
    pub fn remediate_with_changes(&self, document: &str) -> Remediation {
        let mut text = document.to_string();
        let mut applied = Vec::new();
        for step in &self.steps {
            let next = step.apply(&text);
            if next != text {
                debug!("Remediation step {} changed the document", step.id);
                applied.push(step.id);
                text = next;
            }
        }
        Remediation {
            fixed: text,
            applied,
        }
    }
}

fn replace_root_user(document: &str) -> String {
    document.replace("USER root", "RUN useradd -m appuser\nUSER appuser")
}

fn pin_base_images(document: &str) -> String {
    PINNED_IMAGES
        .iter()
        .fold(document.to_string(), |text, (floating, pinned)| {
            text.replace(floating, pinned)
        })
}

fn drop_password_env(document: &str) -> String {
    password_env_line().replace_all(document, "").into_owned()
}

/// Only the exact literal is rewritten; other ADD forms are left alone.
fn add_to_copy(document: &str) -> String {
    document.replace("ADD . /app", "COPY ./src /app")
}

/// Inserts the flag after every `apt-get install` whose remaining line does
/// not already carry it. Flags on continuation lines are not seen.
fn add_no_install_recommends(document: &str) -> String {
    let mut out = String::with_capacity(document.len());
    let mut last = 0;
    for (start, _) in document.match_indices(APT_INSTALL) {
        let end = start + APT_INSTALL.len();
        let line_end = document[end..]
            .find('\n')
            .map_or(document.len(), |offset| end + offset);
        out.push_str(&document[last..end]);
        if !document[end..line_end].contains(NO_RECOMMENDS) {
            out.push(' ');
            out.push_str(NO_RECOMMENDS);
        }
        last = end;
    }
    out.push_str(&document[last..]);
    out
}

fn append_line(document: &str, line: &str) -> String {
    let mut out = String::with_capacity(document.len() + line.len() + 2);
    out.push_str(document);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(line);
    out.push('\n');
    out
}

fn append_apt_cleanup(document: &str) -> String {
    if document.contains(APT_CLEANUP_MARKER) {
        return document.to_string();
    }
    append_line(document, APT_CLEANUP)
}

fn append_healthcheck(document: &str) -> String {
    if document.contains(HEALTHCHECK_MARKER) {
        return document.to_string();
    }
    append_line(document, DEFAULT_HEALTHCHECK)
}

fn expose_https(document: &str) -> String {
    crate::rules::expose_http_pattern()
        .replace_all(document, "EXPOSE 443")
        .into_owned()
}

fn append_security_context(document: &str) -> String {
    if !document.contains(MANIFEST_MARKER) || document.contains(SECURITY_CONTEXT_MARKER) {
        return document.to_string();
    }
    append_line(document, HARDENED_SECURITY_CONTEXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remediate(doc: &str) -> String {
        RemediationEngine::default().remediate(doc)
    }

    #[test]
    fn test_root_user_replaced() {
        let fixed = replace_root_user("FROM alpine\nUSER root\nRUN id\n");
        assert_eq!(fixed, "FROM alpine\nRUN useradd -m appuser\nUSER appuser\nRUN id\n");
        assert!(!remediate("USER root\nUSER root").contains("USER root"));
    }

    #[test]
    fn test_base_images_pinned() {
        let fixed = pin_base_images("FROM ubuntu:latest\nFROM alpine:latest\nFROM debian:latest\n");
        assert_eq!(fixed, "FROM ubuntu:20.04\nFROM alpine:3.18\nFROM debian:latest\n");
    }

    #[test]
    fn test_password_env_lines_removed() {
        let doc = "FROM x\nENV DB_PASSWORD=secret\nENV USER_NAME=bob\nENV PASS=1\nRUN true\n";
        assert_eq!(drop_password_env(doc), "FROM x\nENV USER_NAME=bob\nRUN true\n");
    }

    #[test]
    fn test_password_env_last_line_without_newline() {
        assert_eq!(drop_password_env("FROM x\nENV PASSWORD=x"), "FROM x\n");
    }

    #[test]
    fn test_add_to_copy_is_literal_only() {
        assert_eq!(add_to_copy("ADD . /app\n"), "COPY ./src /app\n");
        assert_eq!(add_to_copy("ADD . /srv\n"), "ADD . /srv\n");
        assert_eq!(
            add_to_copy("ADD https://example.com/x.tgz /opt\n"),
            "ADD https://example.com/x.tgz /opt\n"
        );
    }

    #[test]
    fn test_no_install_recommends_inserted() {
        assert_eq!(
            add_no_install_recommends("RUN apt-get install -y curl"),
            "RUN apt-get install --no-install-recommends -y curl"
        );
        // Already present later on the same line
        let doc = "RUN apt-get install -y --no-install-recommends curl\n";
        assert_eq!(add_no_install_recommends(doc), doc);
    }

    #[test]
    fn test_no_install_recommends_per_occurrence() {
        let doc = "RUN apt-get update && apt-get install -y a\nRUN apt-get install --no-install-recommends b\n";
        assert_eq!(
            add_no_install_recommends(doc),
            "RUN apt-get update && apt-get install --no-install-recommends -y a\nRUN apt-get install --no-install-recommends b\n"
        );
    }

    #[test]
    fn test_no_install_recommends_misses_continuation_lines() {
        let doc = "RUN apt-get install -y \\\n    --no-install-recommends curl\n";
        assert_eq!(
            add_no_install_recommends(doc),
            "RUN apt-get install --no-install-recommends -y \\\n    --no-install-recommends curl\n"
        );
    }

    #[test]
    fn test_appends_only_when_missing() {
        assert_eq!(append_apt_cleanup("FROM x"), "FROM x\nRUN rm -rf /var/lib/apt/lists/*\n");
        assert_eq!(append_apt_cleanup("FROM x\n"), "FROM x\nRUN rm -rf /var/lib/apt/lists/*\n");
        assert_eq!(append_apt_cleanup(""), "RUN rm -rf /var/lib/apt/lists/*\n");
        let done = "RUN rm -rf /var/lib/apt/lists/partial\n";
        assert_eq!(append_apt_cleanup(done), done);

        let healthy = "HEALTHCHECK NONE\n";
        assert_eq!(append_healthcheck(healthy), healthy);
        assert!(append_healthcheck("FROM x\n").ends_with(&format!("{DEFAULT_HEALTHCHECK}\n")));
    }

    #[test]
    fn test_expose_https() {
        assert_eq!(expose_https("EXPOSE 80\n"), "EXPOSE 443\n");
        assert_eq!(expose_https("EXPOSE 8080\n"), "EXPOSE 8080\n");
    }

    #[test]
    fn test_security_context_for_manifests_only() {
        let pod = "apiVersion: v1\nkind: Pod\n";
        let fixed = append_security_context(pod);
        assert!(fixed.ends_with("allowPrivilegeEscalation: false\n"));
        assert!(fixed.contains("runAsNonRoot: true"));
        assert!(fixed.contains("readOnlyRootFilesystem: true"));

        assert_eq!(append_security_context("FROM x\n"), "FROM x\n");
        let hardened = "apiVersion: v1\nsecurityContext:\n  runAsUser: 1000\n";
        assert_eq!(append_security_context(hardened), hardened);
    }

    #[test]
    fn test_each_step_is_idempotent() {
        let docs = [
            "",
            "FROM ubuntu:latest\nUSER root\nENV DB_PASSWORD=x\nADD . /app\nRUN apt-get install -y curl\nEXPOSE 80\n",
            "apiVersion: v1\nkind: Pod\nspec:\n  containers: []\n",
        ];
        for step in RemediationEngine::builtin().steps() {
            for doc in docs {
                let once = step.apply(doc);
                let twice = step.apply(&once);
                assert_eq!(once, twice, "step {} is not idempotent", step.id);
            }
        }
    }

    #[test]
    fn test_full_remediation_is_stable() {
        let doc = "FROM ubuntu:latest\nUSER root\nRUN apt-get install -y curl\n";
        let once = remediate(doc);
        assert_eq!(remediate(&once), once);
        assert_eq!(once.matches(APT_CLEANUP).count(), 1);
        assert_eq!(once.matches(HEALTHCHECK_MARKER).count(), 1);
    }

    #[test]
    fn test_remediate_with_changes() {
        let engine = RemediationEngine::default();
        let result = engine.remediate_with_changes("FROM ubuntu:latest\nEXPOSE 80\n");
        assert_eq!(
            result.applied,
            vec!["pin-base-image", "apt-cache-cleanup", "healthcheck", "https-port"]
        );
        assert_eq!(result.fixed, engine.remediate("FROM ubuntu:latest\nEXPOSE 80\n"));

        let clean = engine.remediate_with_changes(&result.fixed);
        assert!(clean.is_unchanged());
        assert_eq!(clean.fixed, result.fixed);
    }

    #[test]
    fn test_full_example() {
        let doc = "FROM ubuntu:latest\n\
                   USER root\n\
                   ENV ADMIN_PASSWORD=changeme\n\
                   ADD . /app\n\
                   RUN apt-get update && apt-get install -y nginx\n\
                   EXPOSE 80\n";
        let expected = "FROM ubuntu:20.04\n\
                        RUN useradd -m appuser\n\
                        USER appuser\n\
                        COPY ./src /app\n\
                        RUN apt-get update && apt-get install --no-install-recommends -y nginx\n\
                        EXPOSE 443\n\
                        RUN rm -rf /var/lib/apt/lists/*\n\
                        HEALTHCHECK CMD curl --fail http://localhost || exit 1\n";
        assert_eq!(remediate(doc), expected);
    }
}
