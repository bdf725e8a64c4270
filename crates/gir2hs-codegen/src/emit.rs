//! Code emission.
//!
//! [`emit`] walks a marshalling plan and renders the generated binding for
//! one callable: the raw foreign-import declaration, the public wrapper
//! signature, the hidden-length prologue, input conversions, the invocation,
//! output conversions, cleanup, keep-alive touches, and the result — with a
//! second, parallel cleanup path when the callable may raise a native error.
//!
//! Unsupported cleanup combinations surface as `-- XXX:` markers next to the
//! statement they would have been, so a reviewer of the output can find and
//! fix them.

use gir2hs_model::{ApiIndex, Arg, Callable, Direction};

use crate::cleanup::{cleanup_on_failure, cleanup_on_success, CleanupAction};
use crate::error::{CodegenError, Result};
use crate::haskell::{from_native, native_type, paren, public_type, to_native, Conversion};
use crate::names::{lower_camel, upper_first};
use crate::plan::{ArgPlan, LengthOwner, Plan, ResultShape};

const INDENT: &str = "    ";

/// Emit the complete binding for one callable.
pub fn emit(callable: &Callable, plan: &Plan, index: &ApiIndex) -> Result<String> {
    let mut lines = Vec::new();
    emit_foreign_import(&mut lines, callable, plan, index)?;
    lines.push(String::new());
    emit_wrapper(&mut lines, callable, plan, index)?;
    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Step 1: the raw foreign-call declaration, argument-for-argument in the
/// native order. Out-direction parameters pass by address; a throwing
/// callable takes a trailing error-out slot.
fn emit_foreign_import(
    lines: &mut Vec<String>,
    callable: &Callable,
    _plan: &Plan,
    index: &ApiIndex,
) -> Result<()> {
    lines.push(format!(
        "foreign import ccall \"{0}\" {0} ::",
        callable.symbol
    ));
    for arg in &callable.args {
        let base = native_type(&arg.ty, index)?;
        let rendered = if arg.direction.is_out() {
            format!("Ptr {}", paren(&base))
        } else {
            base
        };
        lines.push(format!(
            "{INDENT}{rendered} ->   -- {} : {}",
            arg.name, arg.ty
        ));
    }
    if callable.throws {
        lines.push(format!("{INDENT}Ptr (Ptr GError) ->   -- error"));
    }
    let ret = match &callable.ret {
        Some(ret) => format!("IO {}", paren(&native_type(&ret.ty, index)?)),
        None => "IO ()".to_string(),
    };
    lines.push(format!("{INDENT}{ret}"));
    Ok(())
}

/// Steps 2-8: the public wrapper.
fn emit_wrapper(
    lines: &mut Vec<String>,
    callable: &Callable,
    plan: &Plan,
    index: &ApiIndex,
) -> Result<()> {
    let wrapper = lower_camel(&callable.name);

    // Signature: constrained where inputs are object- or interface-typed.
    let mut sig = format!("{wrapper} :: ");
    let constraints = plan.constraints();
    if !constraints.is_empty() {
        sig.push_str(&format!("({}) => ", constraints.join(", ")));
    }
    for &i in &plan.public_inputs {
        sig.push_str(&format!("{} -> ", public_param_type(&callable.args[i], &plan.args[i], index)?));
    }
    sig.push_str(&format!("IO {}", paren(&result_type(callable, plan, index)?)));
    lines.push(sig);

    // Equation head.
    let params: Vec<&str> = plan
        .public_inputs
        .iter()
        .map(|&i| callable.args[i].name.as_str())
        .collect();
    if params.is_empty() {
        lines.push(format!("{wrapper} = do"));
    } else {
        lines.push(format!("{wrapper} {} = do", params.join(" ")));
    }

    let mut body: Vec<String> = Vec::new();
    emit_prologue(&mut body, callable, plan)?;
    emit_input_conversions(&mut body, callable, plan, index)?;

    let call = invocation(callable, plan)?;
    let success = success_path(callable, plan, index)?;

    if callable.throws {
        let failure = failure_path(callable, plan, index)?;
        body.push("onException (do".to_string());
        body.push(format!("{INDENT}{}", bind_call(callable, plan, &call, true)));
        for line in success {
            body.push(format!("{INDENT}{line}"));
        }
        body.push(" ) (do".to_string());
        for line in failure {
            body.push(format!("{INDENT}{line}"));
        }
        body.push(format!("{INDENT}return ()"));
        body.push(" )".to_string());
    } else {
        body.push(bind_call(callable, plan, &call, false));
        body.extend(success);
    }

    for line in body {
        lines.push(format!("{INDENT}{line}"));
    }
    Ok(())
}

/// The buffer variable an out-direction argument peeks and frees through.
/// A missing slot is inconsistent bookkeeping, fatal for this callable.
fn out_buffer<'a>(callable: &Callable, ap: &'a ArgPlan, name: &str) -> Result<&'a str> {
    ap.buffer_var
        .as_deref()
        .ok_or_else(|| CodegenError::InvalidPlan {
            callable: callable.name.clone(),
            detail: format!("out argument '{name}' has no buffer slot"),
        })
}

/// The wrapper-signature type of one public input.
fn public_param_type(arg: &Arg, ap: &ArgPlan, index: &ApiIndex) -> Result<String> {
    let base = match &ap.tyvar {
        Some(v) => v.clone(),
        None => public_type(&arg.ty, index)?,
    };
    Ok(if ap.wrap_maybe {
        format!("Maybe {}", paren(&base))
    } else {
        base
    })
}

/// The public result type, following the plan's declared shape.
fn result_type(callable: &Callable, plan: &Plan, index: &ApiIndex) -> Result<String> {
    let ret = match &callable.ret {
        Some(ret) if !plan.suppress_return => {
            let base = public_type(&ret.ty, index)?;
            Some(if ret.nullable {
                format!("Maybe {}", paren(&base))
            } else {
                base
            })
        }
        _ => None,
    };
    let mut outs = Vec::new();
    for &i in &plan.public_outputs {
        outs.push(public_type(&callable.args[i].ty, index)?);
    }
    Ok(match plan.shape {
        ResultShape::ReturnOnly => ret.unwrap_or_else(|| "()".to_string()),
        ResultShape::OutArgsOnly => tuple_type(&outs),
        ResultShape::ReturnAndOutArgs => {
            let mut parts = vec![ret.unwrap_or_else(|| "()".to_string())];
            parts.extend(outs);
            tuple_type(&parts)
        }
    })
}

fn tuple_type(parts: &[String]) -> String {
    match parts {
        [] => "()".to_string(),
        [single] => single.clone(),
        many => format!("({})", many.join(", ")),
    }
}

/// Step 3: compute each hidden length from its companion array's runtime
/// length. A nullable companion contributes zero when absent.
fn emit_prologue(body: &mut Vec<String>, callable: &Callable, plan: &Plan) -> Result<()> {
    for (j, ap) in plan.args.iter().enumerate() {
        let Some(owner) = ap.length_of else { continue };
        if !callable.args[j].direction.is_in() {
            continue;
        }
        match owner {
            LengthOwner::Arg(i) => {
                let owner_name = &callable.args[i].name;
                let expr = if plan.args[i].wrap_maybe {
                    format!("maybe 0 (fromIntegral . length) {owner_name}")
                } else {
                    format!("fromIntegral (length {owner_name})")
                };
                body.push(format!("let {} = {}", ap.native_var, expr));
            }
            LengthOwner::Return => {
                // A caller-supplied capacity for the returned array is
                // outside the canonical set.
                return Err(CodegenError::InvalidPlan {
                    callable: callable.name.clone(),
                    detail: format!(
                        "input-direction length argument '{}' measures the return value",
                        callable.args[j].name
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Step 4: native representations for every argument, in original order.
/// `InOut` converts and stores into a fresh buffer; `Out` only allocates.
fn emit_input_conversions(
    body: &mut Vec<String>,
    callable: &Callable,
    plan: &Plan,
    index: &ApiIndex,
) -> Result<()> {
    for (i, arg) in callable.args.iter().enumerate() {
        let ap = &plan.args[i];
        match arg.direction {
            Direction::In => {
                if !ap.is_hidden() {
                    push_in_conversion(body, arg, ap, index)?;
                }
            }
            Direction::InOut => {
                if !ap.is_hidden() {
                    push_in_conversion(body, arg, ap, index)?;
                }
                let buffer = out_buffer(callable, ap, &arg.name)?;
                let native = native_type(&arg.ty, index)?;
                body.push(format!("{buffer} <- allocMem :: IO (Ptr {})", paren(&native)));
                body.push(format!("poke {buffer} {}", ap.native_var));
            }
            Direction::Out => {
                let buffer = out_buffer(callable, ap, &arg.name)?;
                let native = native_type(&arg.ty, index)?;
                body.push(format!("{buffer} <- allocMem :: IO (Ptr {})", paren(&native)));
            }
        }
    }
    Ok(())
}

fn push_in_conversion(
    body: &mut Vec<String>,
    arg: &Arg,
    ap: &ArgPlan,
    index: &ApiIndex,
) -> Result<()> {
    if ap.wrap_maybe {
        let binder = format!("j{}", upper_first(&arg.name));
        let inner = to_native(&binder, &arg.ty, index)?;
        body.push(format!("{} <- case {} of", ap.native_var, arg.name));
        body.push(format!("{INDENT}Nothing -> return nullPtr"));
        body.push(match inner {
            Conversion::Monadic(expr) => format!("{INDENT}Just {binder} -> {expr}"),
            Conversion::Pure(expr) => format!("{INDENT}Just {binder} -> return ({expr})"),
        });
    } else {
        let conv = to_native(&arg.name, &arg.ty, index)?;
        body.push(conv.bind(&ap.native_var));
    }
    Ok(())
}

/// Step 5: the invocation expression, all converted arguments in original
/// order. Out-direction arguments pass their buffer.
fn invocation(callable: &Callable, plan: &Plan) -> Result<String> {
    let mut call = callable.symbol.clone();
    for (i, arg) in callable.args.iter().enumerate() {
        let ap = &plan.args[i];
        let var = if arg.direction.is_out() {
            out_buffer(callable, ap, &arg.name)?
        } else {
            &ap.native_var
        };
        call.push(' ');
        call.push_str(var);
    }
    Ok(call)
}

/// Bind the call result according to whether the wrapper needs it. On the
/// raising path the value is retrieved through the error propagator, which
/// re-signals after failure-path cleanup.
fn bind_call(callable: &Callable, plan: &Plan, call: &str, throws: bool) -> String {
    let expr = if throws {
        format!("propagateGError $ {call}")
    } else {
        call.to_string()
    };
    match &callable.ret {
        None => expr,
        Some(_) if plan.suppress_return => format!("_ <- {expr}"),
        Some(_) => format!("result <- {expr}"),
    }
}

/// Steps 6-7: the success path after the call returns.
fn success_path(callable: &Callable, plan: &Plan, index: &ApiIndex) -> Result<Vec<String>> {
    let mut body = Vec::new();

    // Hidden out-direction lengths first; return/output conversion needs
    // them.
    for (j, ap) in plan.args.iter().enumerate() {
        if ap.is_hidden() && callable.args[j].direction.is_out() {
            let arg = &callable.args[j];
            body.push(format!(
                "{} <- peek {}",
                peek_var(arg),
                out_buffer(callable, ap, &arg.name)?
            ));
        }
    }

    // Return conversion.
    let mut result_var = None;
    if let Some(ret) = &callable.ret {
        if !plan.suppress_return {
            let length_var = match plan.return_length {
                Some(j) => Some(companion_var(callable, plan, j)),
                None => None,
            };
            if ret.nullable {
                let inner = from_native("p", &ret.ty, ret.transfer, length_var.as_deref(), index)?;
                let lambda = match inner {
                    Conversion::Monadic(expr) => expr,
                    Conversion::Pure(expr) => format!("return ({expr})"),
                };
                body.push(format!("result' <- traverseMaybePtr (\\p -> {lambda}) result"));
            } else {
                let conv =
                    from_native("result", &ret.ty, ret.transfer, length_var.as_deref(), index)?;
                body.push(conv.bind("result'"));
            }
            result_var = Some("result'");
        }
    }

    // Output conversions.
    let mut out_vars = Vec::new();
    for &i in &plan.public_outputs {
        let arg = &callable.args[i];
        let ap = &plan.args[i];
        let peeked = peek_var(arg);
        body.push(format!(
            "{peeked} <- peek {}",
            out_buffer(callable, ap, &arg.name)?
        ));
        let length_var = length_companion_of(callable, plan, i);
        let conv = from_native(&peeked, &arg.ty, arg.transfer, length_var.as_deref(), index)?;
        let converted = format!("{peeked}'");
        body.push(conv.bind(&converted));
        out_vars.push(converted);
    }

    // Success-path cleanup, in argument order: element contents strictly
    // before container shells.
    for (i, arg) in callable.args.iter().enumerate() {
        for action in cleanup_on_success(arg, index)? {
            body.push(render_action(&action, callable, arg, &plan.args[i])?);
        }
    }

    // Keep-alive touches for managed inputs.
    for (i, arg) in callable.args.iter().enumerate() {
        if arg.direction.is_in() && plan.args[i].category.is_managed() {
            if plan.args[i].wrap_maybe {
                body.push(format!("mapM_ touchManagedPtr {}", arg.name));
            } else {
                body.push(format!("touchManagedPtr {}", arg.name));
            }
        }
    }

    // Result construction per the declared shape.
    body.push(match plan.shape {
        ResultShape::ReturnOnly => match result_var {
            Some(var) => format!("return {var}"),
            None => "return ()".to_string(),
        },
        ResultShape::OutArgsOnly => format!("return {}", tuple_expr(&out_vars)),
        ResultShape::ReturnAndOutArgs => {
            let mut parts = vec![result_var.unwrap_or("()").to_string()];
            parts.extend(out_vars);
            format!("return ({})", parts.join(", "))
        }
    });

    Ok(body)
}

/// Step 8: failure-path cleanup, for callables that may raise.
fn failure_path(callable: &Callable, plan: &Plan, index: &ApiIndex) -> Result<Vec<String>> {
    let mut body = Vec::new();
    for (i, arg) in callable.args.iter().enumerate() {
        for action in cleanup_on_failure(arg, index)? {
            body.push(render_action(&action, callable, arg, &plan.args[i])?);
        }
    }
    Ok(body)
}

fn render_action(
    action: &CleanupAction,
    callable: &Callable,
    arg: &Arg,
    ap: &ArgPlan,
) -> Result<String> {
    Ok(match action {
        CleanupAction::FreeElements { map_fn, free } => {
            format!("{map_fn} {} {}", free.helper(), ap.native_var)
        }
        CleanupAction::Free { free } => format!("{} {}", free.helper(), ap.native_var),
        CleanupAction::FreeOutBuffer => {
            format!("freeMem {}", out_buffer(callable, ap, &arg.name)?)
        }
        CleanupAction::Unsupported { detail } => format!("-- XXX: {detail}"),
    })
}

/// The post-call native value of an out-direction argument.
fn peek_var(arg: &Arg) -> String {
    format!("{}Out", arg.name)
}

/// The variable holding the length companion at index `j`, whichever side
/// of the call bound it.
fn companion_var(callable: &Callable, plan: &Plan, j: usize) -> String {
    if callable.args[j].direction.is_out() {
        peek_var(&callable.args[j])
    } else {
        plan.args[j].native_var.clone()
    }
}

/// The length companion variable for the array argument at index `i`, if
/// one exists.
fn length_companion_of(callable: &Callable, plan: &Plan, i: usize) -> Option<String> {
    plan.args.iter().enumerate().find_map(|(j, ap)| {
        (ap.length_of == Some(LengthOwner::Arg(i))).then(|| companion_var(callable, plan, j))
    })
}

fn tuple_expr(vars: &[String]) -> String {
    match vars {
        [] => "()".to_string(),
        [single] => single.clone(),
        many => format!("({})", many.join(", ")),
    }
}
