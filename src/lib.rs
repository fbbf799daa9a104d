//! containerguard - security checks for container build files
//!
//! Scans Dockerfiles and Kubernetes Pod manifests with a fixed catalog of
//! text rules, turns the findings into a 0-10 risk score, and produces a
//! hardened copy of each document.
//!
//! ```
//! use containerguard::pipeline::Analyzer;
//!
//! let analyzer = Analyzer::default();
//! let result = analyzer.analyze("FROM ubuntu:latest\nUSER root\n");
//! assert_eq!(result.tally.total(), result.findings.len());
//! assert!(!analyzer.remediate("USER root\n").contains("USER root"));
//! ```

pub mod advisory;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod models;
pub mod pipeline;
pub mod remediation;
pub mod reporters;
pub mod rules;
pub mod scoring;
