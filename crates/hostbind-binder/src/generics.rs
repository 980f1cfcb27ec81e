//! Generic argument resolution.
//!
//! Type arguments of a generic method come from, in order of preference:
//! 1. The explicit type-argument list of the bind
//! 2. Leading type-marker arguments, when no explicit list is given
//! 3. Inference from the runtime types of the value arguments
//!
//! A leading marker in addition to an explicit list is redundant. It must
//! agree with the list and is then dropped from the arguments.

use hostbind_core::{
    BindError, DataType, GenericConstraints, MetadataProvider, TypeHash, primitives,
};

use crate::cache::ArgShape;
use crate::catalog::MemberDescriptor;

/// How leading type markers are treated for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPlan {
    /// Fixed type arguments, or `None` when they must be inferred.
    pub type_args: Option<Vec<TypeHash>>,
    /// Leading arguments consumed as type markers.
    pub consumed: usize,
}

/// Decide where a candidate's type arguments come from.
///
/// Returns `Ok(None)` when the explicit list cannot apply to the candidate
/// (wrong arity), and `TypeArgumentMismatch` when a redundant marker
/// disagrees with the explicit list.
pub fn plan_markers(
    provider: &dyn MetadataProvider,
    candidate: &MemberDescriptor,
    explicit: &[TypeHash],
    args: &[ArgShape],
) -> Result<Option<MarkerPlan>, BindError> {
    let arity = candidate.generic_arity();
    if arity == 0 {
        return Ok(explicit.is_empty().then(|| MarkerPlan {
            type_args: Some(Vec::new()),
            consumed: 0,
        }));
    }
    if !explicit.is_empty() && explicit.len() != arity {
        return Ok(None);
    }

    let markers: Vec<TypeHash> = args
        .iter()
        .take(arity)
        .map_while(|a| a.marker)
        .collect();
    // Markers are ordinary arguments when the method takes type values first.
    let takes_type_values = candidate
        .params()
        .iter()
        .take(arity)
        .any(|p| p.data_type.type_hash == primitives::TYPE && !p.data_type.is_array);
    let has_markers = markers.len() == arity && !takes_type_values;

    if !explicit.is_empty() {
        if !has_markers {
            return Ok(Some(MarkerPlan {
                type_args: Some(explicit.to_vec()),
                consumed: 0,
            }));
        }
        if let Some((expected, found)) = explicit.iter().zip(&markers).find(|(e, m)| e != m) {
            return Err(BindError::TypeArgumentMismatch {
                method: candidate.name().to_string(),
                expected: provider.type_name(*expected),
                found: provider.type_name(*found),
            });
        }
        return Ok(Some(MarkerPlan {
            type_args: Some(explicit.to_vec()),
            consumed: arity,
        }));
    }

    if has_markers {
        return Ok(Some(MarkerPlan {
            type_args: Some(markers),
            consumed: arity,
        }));
    }
    Ok(Some(MarkerPlan {
        type_args: None,
        consumed: 0,
    }))
}

/// The declared parameter type an argument at `index` binds to.
///
/// In the expanded form every argument past the params-array position binds
/// to the array's element type.
pub fn param_type_for_arg(
    candidate: &MemberDescriptor,
    index: usize,
    expanded: bool,
) -> Option<DataType> {
    let params = candidate.params();
    if expanded {
        let last = params.len().checked_sub(1)?;
        if index >= last {
            return Some(params[last].data_type.element());
        }
    }
    params.get(index).map(|p| p.data_type)
}

/// Infer every type argument of `candidate` from the argument shapes.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn infer_type_arguments(
    provider: &dyn MetadataProvider,
    candidate: &MemberDescriptor,
    args: &[ArgShape],
    expanded: bool,
) -> Result<Vec<TypeHash>, BindError> {
    let mut bindings: Vec<Option<TypeHash>> = vec![None; candidate.generic_arity()];

    for (index, arg) in args.iter().enumerate() {
        let Some(param) = param_type_for_arg(candidate, index, expanded) else {
            continue;
        };
        let Some(position) = param.type_hash.generic_position() else {
            continue;
        };
        let Some(inferred) = inferred_type(&param, arg) else {
            continue;
        };
        match bindings.get(position).copied() {
            Some(None) => bindings[position] = Some(inferred),
            Some(Some(previous)) if previous != inferred => {
                return Err(BindError::TypeArgumentConflict {
                    method: candidate.name().to_string(),
                    parameter: generic_name(candidate, position),
                    first: provider.type_name(previous),
                    second: provider.type_name(inferred),
                });
            }
            _ => {}
        }
    }

    bindings
        .into_iter()
        .enumerate()
        .map(|(position, binding)| {
            binding.ok_or_else(|| BindError::MissingTypeArgument {
                method: candidate.name().to_string(),
                parameter: generic_name(candidate, position),
            })
        })
        .collect()
}

/// What a single argument says about the generic parameter in `param`.
fn inferred_type(param: &DataType, arg: &ArgShape) -> Option<TypeHash> {
    let arg_type = arg.value_type();
    if arg_type.type_hash == primitives::NULL && !arg_type.is_array {
        return None;
    }
    match (param.is_array, arg_type.is_array) {
        (true, true) => Some(arg_type.type_hash),
        (false, false) => Some(arg_type.type_hash),
        // T[] against a scalar, or T against an array: nothing to learn
        _ => None,
    }
}

fn generic_name(candidate: &MemberDescriptor, position: usize) -> String {
    candidate
        .generic_params()
        .get(position)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| format!("T{position}"))
}

/// Check fixed type arguments against the candidate's constraints.
pub fn check_constraints(
    provider: &dyn MetadataProvider,
    candidate: &MemberDescriptor,
    type_args: &[TypeHash],
) -> Result<(), BindError> {
    for (param, &type_arg) in candidate.generic_params().iter().zip(type_args) {
        let violation = |constraint: String| BindError::TypeArgumentConstraintViolation {
            method: candidate.name().to_string(),
            parameter: param.name.clone(),
            type_arg: provider.type_name(type_arg),
            constraint,
        };

        let kind = provider.type_kind(type_arg);
        if param.constraints.contains(GenericConstraints::VALUE_TYPE)
            && !kind.is_some_and(|k| k.is_value_type())
        {
            return Err(violation("struct".to_string()));
        }
        if param.constraints.contains(GenericConstraints::REFERENCE_TYPE)
            && !kind.is_some_and(|k| k.is_reference_type())
        {
            return Err(violation("class".to_string()));
        }
        if let Some(&bound) = param
            .bounds
            .iter()
            .find(|&&bound| !provider.is_assignable_to(type_arg, bound))
        {
            return Err(violation(provider.type_name(bound)));
        }
    }
    Ok(())
}
