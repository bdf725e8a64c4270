//! Marshalling planner.
//!
//! [`plan`] computes, for one callable, everything the emitter needs:
//! which arguments appear in the public signature, which are hidden length
//! companions of array arguments, whether the return value is suppressed,
//! the nullable wrapping of each input, and the intermediate variable names.
//! A plan is a pure function of the callable and the API index; it is built
//! fresh per callable and discarded after emission.

use gir2hs_model::{classify, ApiIndex, Callable, Category, Direction, ScalarKind, TypeDesc};

use crate::error::{CodegenError, Result};
use crate::names::{buffer_var, native_var, NameSupply};

/// Whose element count a hidden length argument carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthOwner {
    /// Length of the argument at this index.
    Arg(usize),
    /// Length of the return value.
    Return,
}

/// Per-argument planning record, index-addressed parallel to the
/// callable's argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgPlan {
    pub category: Category,
    /// Name of the native-representation variable.
    pub native_var: String,
    /// Name of the wrapper-allocated buffer, for out-direction arguments.
    pub buffer_var: Option<String>,
    /// Type variable standing in for the concrete type in the wrapper
    /// signature, for constrained (object/interface-typed) inputs.
    pub tyvar: Option<String>,
    /// The constraint introduced by `tyvar` (e.g. `IsWidget a`).
    pub constraint: Option<String>,
    /// Whether the public input is wrapped in an optional representation.
    pub wrap_maybe: bool,
    /// Set when this argument is a hidden length companion.
    pub length_of: Option<LengthOwner>,
}

impl ArgPlan {
    /// Hidden arguments never appear in the public signature.
    pub fn is_hidden(&self) -> bool {
        self.length_of.is_some()
    }
}

/// Shape of the public result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// The (possibly suppressed, possibly nullable) return value alone.
    ReturnOnly,
    /// The tuple of output arguments; the return value is void or
    /// suppressed.
    OutArgsOnly,
    /// The tuple of the return value followed by the output arguments.
    ReturnAndOutArgs,
}

/// The complete marshalling plan for one callable.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub args: Vec<ArgPlan>,
    /// Indices of arguments visible as wrapper parameters, in original
    /// relative order.
    pub public_inputs: Vec<usize>,
    /// Indices of arguments contributing to the result tuple.
    pub public_outputs: Vec<usize>,
    pub suppress_return: bool,
    pub return_category: Option<Category>,
    /// Index of the argument carrying the return value's element count.
    pub return_length: Option<usize>,
    pub shape: ResultShape,
}

impl Plan {
    /// Indices of hidden length arguments, in original order.
    pub fn hidden_args(&self) -> Vec<usize> {
        self.args
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_hidden())
            .map(|(i, _)| i)
            .collect()
    }

    /// All constraints introduced by the wrapper signature, in parameter
    /// order.
    pub fn constraints(&self) -> Vec<&str> {
        self.public_inputs
            .iter()
            .filter_map(|&i| self.args[i].constraint.as_deref())
            .collect()
    }
}

/// Compute the marshalling plan for a callable.
pub fn plan(callable: &Callable, index: &ApiIndex) -> Result<Plan> {
    let n = callable.args.len();

    // Length-argument map: array argument (or return) → companion index.
    let mut length_of: Vec<Option<LengthOwner>> = vec![None; n];
    for (i, arg) in callable.args.iter().enumerate() {
        if let Some(j) = arg.ty.length_index() {
            check_length_companion(callable, j)?;
            // Shared length companions keep their first owner.
            if length_of[j].is_none() {
                length_of[j] = Some(LengthOwner::Arg(i));
            }
        }
    }
    let mut return_length = None;
    if let Some(ret) = &callable.ret {
        if let Some(j) = ret.ty.length_index() {
            check_length_companion(callable, j)?;
            return_length = Some(j);
            if length_of[j].is_none() {
                length_of[j] = Some(LengthOwner::Return);
            }
        }
    }

    // Return suppression: explicit skip, or a success boolean made
    // redundant by error-raising.
    let suppress_return = callable.skip_return
        || (callable.throws
            && matches!(
                callable.ret.as_ref().map(|r| &r.ty),
                Some(TypeDesc::Scalar(ScalarKind::Boolean))
            ));

    let mut supply = NameSupply::new();
    let mut args = Vec::with_capacity(n);
    for (i, arg) in callable.args.iter().enumerate() {
        let category = classify(&arg.ty, index)?;
        let hidden = length_of[i].is_some();
        let public_input = arg.direction.is_in() && !hidden;

        // Interface-typed (and object-typed) inputs are generalized to any
        // type providing the capability set, via a constrained type
        // variable.
        let (tyvar, constraint) = if public_input && category.is_managed() {
            match &arg.ty {
                TypeDesc::Named { name, .. } => {
                    let v = supply.fresh_tyvar();
                    let c = format!("Is{name} {v}");
                    (Some(v), Some(c))
                }
                _ => (None, None),
            }
        } else {
            (None, None)
        };

        // Lists represent absence as the empty list; everything else
        // nullable gets an optional wrapper.
        let wrap_maybe = arg.direction == Direction::In
            && arg.nullable
            && !category.is_list();

        args.push(ArgPlan {
            category,
            native_var: native_var(&arg.name),
            buffer_var: arg.direction.is_out().then(|| buffer_var(&arg.name)),
            tyvar,
            constraint,
            wrap_maybe,
            length_of: length_of[i],
        });
    }

    let public_inputs: Vec<usize> = callable
        .args
        .iter()
        .enumerate()
        .filter(|(i, a)| a.direction.is_in() && !args[*i].is_hidden())
        .map(|(i, _)| i)
        .collect();
    let public_outputs: Vec<usize> = callable
        .args
        .iter()
        .enumerate()
        .filter(|(i, a)| a.direction.is_out() && !args[*i].is_hidden())
        .map(|(i, _)| i)
        .collect();

    let return_category = match &callable.ret {
        Some(ret) => Some(classify(&ret.ty, index)?),
        None => None,
    };

    let has_public_return = callable.ret.is_some() && !suppress_return;
    let shape = if public_outputs.is_empty() {
        ResultShape::ReturnOnly
    } else if !has_public_return {
        ResultShape::OutArgsOnly
    } else {
        ResultShape::ReturnAndOutArgs
    };

    Ok(Plan {
        args,
        public_inputs,
        public_outputs,
        suppress_return,
        return_category,
        return_length,
        shape,
    })
}

fn check_length_companion(callable: &Callable, j: usize) -> Result<()> {
    let Some(companion) = callable.args.get(j) else {
        return Err(CodegenError::InvalidPlan {
            callable: callable.name.clone(),
            detail: format!("length index {j} does not name an argument"),
        });
    };
    if companion.ty.is_array() {
        return Err(CodegenError::InvalidPlan {
            callable: callable.name.clone(),
            detail: format!("length argument '{}' is array-typed", companion.name),
        });
    }
    Ok(())
}
