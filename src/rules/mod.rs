//! Detection rules for container build files and Kubernetes manifests
//!
//! Rules work on raw text with substring and regex checks; nothing is parsed
//! into a syntax tree. See `catalog` for the built-in rule set and `engine`
//! for how it is evaluated.

mod base;
mod catalog;
mod engine;

pub use base::{Outcome, Predicate, Rule, RuleKind};
pub use catalog::{CatalogEntry, RuleCatalog};
pub use engine::RuleEngine;

pub(crate) use catalog::{env_password_pattern, expose_http_pattern};
