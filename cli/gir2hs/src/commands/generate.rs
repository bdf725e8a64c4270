//! Binding generation workflow.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use gir2hs_codegen::{emit, plan};
use gir2hs_model::{ApiIndex, Callable, Declaration};

/// Run the `gir2hs generate` workflow over a set of declaration files.
///
/// All namespaces are registered before any is validated or generated, so a
/// declaration may reference types from sibling inputs. A callable that
/// fails to plan is reported and skipped; the batch keeps going and the
/// failure count is surfaced at the end.
pub fn run(inputs: &[PathBuf], out_dir: Option<&Path>) -> Result<()> {
    if inputs.is_empty() {
        bail!("no declaration files given");
    }
    let declarations = load_all(inputs)?;
    let index = build_index(&declarations)?;

    let out_dir = out_dir.unwrap_or(Path::new("."));
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut failed = 0usize;
    for (path, decl) in &declarations {
        decl.validate(&index)
            .with_context(|| format!("validating {}", path.display()))?;

        let active = decl.active_functions();
        let mut module = module_header(&decl.namespace.name);
        let mut generated = 0usize;
        for callable in &active {
            match generate_one(callable, &index) {
                Ok(text) => {
                    module.push('\n');
                    module.push_str(&text);
                    generated += 1;
                }
                Err(e) => {
                    eprintln!("warning: skipping '{}': {e}", callable.name);
                    failed += 1;
                }
            }
        }

        let out_path = out_dir.join(format!("GI.{}.hs", decl.namespace.name));
        std::fs::write(&out_path, &module)
            .with_context(|| format!("writing {}", out_path.display()))?;
        println!(
            "Generated {generated} of {} bindings for '{}' → {}",
            active.len(),
            decl.namespace.name,
            out_path.display()
        );
    }

    if failed > 0 {
        bail!("{failed} callable(s) could not be generated");
    }
    Ok(())
}

/// Parse every input file, keeping the path for diagnostics.
pub(crate) fn load_all(inputs: &[PathBuf]) -> Result<Vec<(PathBuf, Declaration)>> {
    inputs
        .iter()
        .map(|path| {
            let decl = Declaration::load(path)
                .with_context(|| format!("loading {}", path.display()))?;
            Ok((path.clone(), decl))
        })
        .collect()
}

/// Register every namespace's types into one shared index.
pub(crate) fn build_index(declarations: &[(PathBuf, Declaration)]) -> Result<ApiIndex> {
    let mut index = ApiIndex::new();
    for (path, decl) in declarations {
        decl.register_types(&mut index)
            .with_context(|| format!("registering types from {}", path.display()))?;
    }
    Ok(index)
}

fn generate_one(callable: &Callable, index: &ApiIndex) -> Result<String> {
    let p = plan(callable, index)?;
    Ok(emit(callable, &p, index)?)
}

fn module_header(namespace: &str) -> String {
    format!("-- Generated by gir2hs. Do not edit.\nmodule GI.{namespace} where\n")
}
