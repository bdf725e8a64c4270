//! Declaration validation workflow.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Serialize;

use gir2hs_codegen::{cleanup_on_failure, plan, CleanupAction};
use gir2hs_model::{ApiIndex, Declaration};

use super::generate::{build_index, load_all};

#[derive(Serialize)]
struct CheckEntry {
    file: String,
    namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    callable: Option<String>,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Unsupported-combination cleanup details: the callable still
    /// generates, but the output will carry a marker on the affected line.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<String>,
}

#[derive(Serialize)]
struct CheckReport {
    inputs: usize,
    failures: usize,
    diagnostics: usize,
    entries: Vec<CheckEntry>,
}

/// Run the `gir2hs check` workflow: parse, register, validate, plan every
/// active callable, and resolve its cleanup, without writing any output.
pub fn run(inputs: &[PathBuf], json: bool) -> Result<()> {
    if inputs.is_empty() {
        bail!("no declaration files given");
    }
    let declarations = load_all(inputs)?;
    let index = build_index(&declarations)?;
    let report = build_report(&declarations, &index);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for entry in &report.entries {
            let subject = entry.callable.as_deref().unwrap_or("(declaration)");
            match &entry.error {
                Some(e) => println!("{}: {subject} — {e}", entry.namespace),
                None => println!("{}: {subject} {}", entry.namespace, entry.status),
            }
            for detail in &entry.diagnostics {
                println!("    unsupported cleanup: {detail}");
            }
        }
        println!(
            "{} input(s), {} problem(s), {} unsupported cleanup diagnostic(s)",
            report.inputs, report.failures, report.diagnostics
        );
    }

    if report.failures > 0 {
        bail!("check failed: {} problem(s)", report.failures);
    }
    Ok(())
}

fn build_report(declarations: &[(PathBuf, Declaration)], index: &ApiIndex) -> CheckReport {
    let mut report = CheckReport {
        inputs: declarations.len(),
        failures: 0,
        diagnostics: 0,
        entries: Vec::new(),
    };
    for (path, decl) in declarations {
        check_declaration(&mut report, path, decl, index);
    }
    report
}

fn check_declaration(report: &mut CheckReport, path: &Path, decl: &Declaration, index: &ApiIndex) {
    if let Err(e) = decl.validate(index) {
        report.failures += 1;
        report
            .entries
            .push(entry(path, decl, None, Some(e.to_string()), Vec::new()));
        return;
    }
    for callable in decl.active_functions() {
        let mut error = plan(callable, index).err().map(|e| e.to_string());
        let mut diagnostics = Vec::new();
        if error.is_none() && callable.throws {
            // The failure-path resolver is the one that can come up empty:
            // surface here what generate would render as a marker comment.
            for arg in &callable.args {
                match cleanup_on_failure(arg, index) {
                    Ok(actions) => {
                        for action in actions {
                            if let CleanupAction::Unsupported { detail } = action {
                                diagnostics.push(detail);
                            }
                        }
                    }
                    Err(e) => error = Some(e.to_string()),
                }
            }
        }
        if error.is_some() {
            report.failures += 1;
        }
        report.diagnostics += diagnostics.len();
        report.entries.push(entry(
            path,
            decl,
            Some(callable.name.clone()),
            error,
            diagnostics,
        ));
    }
}

fn entry(
    path: &Path,
    decl: &Declaration,
    callable: Option<String>,
    error: Option<String>,
    diagnostics: Vec<String>,
) -> CheckEntry {
    CheckEntry {
        file: path.display().to_string(),
        namespace: decl.namespace.name.clone(),
        callable,
        status: if error.is_some() { "error" } else { "ok" },
        error,
        diagnostics,
    }
}
