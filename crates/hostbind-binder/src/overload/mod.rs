//! Overload resolution for dynamic member calls.
//!
//! This module selects the best matching member from a candidate set based on
//! the runtime shapes of the supplied arguments and their conversion costs.
//!
//! ## Algorithm
//!
//! 1. Split leading type markers off the argument list (see [`crate::generics`])
//! 2. Filter candidates by argument count (default parameters, params-arrays)
//! 3. Fix the type arguments of generic candidates and check their constraints
//! 4. Check argument conversions against the substituted parameter types
//! 5. Rank viable candidates and apply the tie-breakers
//! 6. Report ambiguous overloads when candidates still tie
//!
//! A candidate is tried in its normal form first, then in its expanded form
//! where trailing arguments are collected into the params-array.

mod ranking;

pub use ranking::find_best_match;

use std::sync::Arc;

use tracing::trace;

use hostbind_core::{BindError, DataType, MetadataProvider, RefModifier, TypeHash};

use crate::cache::ArgShape;
use crate::catalog::MemberDescriptor;
use crate::conversion::{Conversion, find_conversion};
use crate::generics::{check_constraints, infer_type_arguments, plan_markers};

/// Result of successful overload resolution.
#[derive(Debug, Clone)]
pub struct OverloadMatch {
    /// The selected member.
    pub candidate: Arc<MemberDescriptor>,
    /// Fixed generic type arguments (empty for non-generic members).
    pub type_args: Vec<TypeHash>,
    /// Declared parameter types with the type arguments substituted.
    pub params: Vec<DataType>,
    /// Declared result type with the type arguments substituted.
    pub return_type: DataType,
    /// Conversion for each supplied argument, markers excluded.
    pub arg_conversions: Vec<Conversion>,
    /// Leading arguments consumed as type markers.
    pub consumed_markers: usize,
    /// Trailing arguments are packed into the params-array.
    pub expanded: bool,
    /// Total conversion cost (lower is better).
    pub total_cost: u32,
    /// Arguments passed without any conversion.
    pub exact_count: usize,
    /// By-ref parameters matched by by-ref arguments.
    pub byref_matches: usize,
}

impl OverloadMatch {
    /// Check if the selected member is generic.
    pub fn is_generic(&self) -> bool {
        !self.type_args.is_empty()
    }

    /// The parameter type the supplied argument at `index` binds to.
    pub fn param_for_arg(&self, index: usize) -> Option<DataType> {
        if self.expanded {
            let last = self.params.len().checked_sub(1)?;
            if index >= last {
                return Some(self.params[last].element());
            }
        }
        self.params.get(index).copied()
    }
}

/// Outcome of matching one candidate.
#[derive(Debug)]
enum Attempt {
    Match(Box<OverloadMatch>),
    /// The arguments cannot bind. `arity_ok` is set when the count
    /// fit but a conversion did not.
    NotApplicable { arity_ok: bool },
    /// The count fit but the type arguments could not be fixed.
    GenericFailure(BindError),
}

/// Resolve an overloaded call.
///
/// # Arguments
///
/// * `name` - Member name, for diagnostics
/// * `candidates` - Members to consider, most-derived first
/// * `explicit` - Explicit type arguments of the bind
/// * `args` - Shapes of the supplied arguments, markers included
///
/// # Returns
///
/// * `Ok(OverloadMatch)` - The best matching member with its conversion plan
/// * `Err(BindError)` - No match, an ambiguous match, or the generic failure
///   shared by every candidate whose argument count fit
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve_overload(
    provider: &dyn MetadataProvider,
    name: &str,
    candidates: &[Arc<MemberDescriptor>],
    explicit: &[TypeHash],
    args: &[ArgShape],
) -> Result<OverloadMatch, BindError> {
    let mut viable = Vec::new();
    let mut generic_failures = Vec::new();
    let mut arity_compatible = 0usize;

    for candidate in candidates {
        match try_match_candidate(provider, candidate, explicit, args) {
            Attempt::Match(m) => {
                arity_compatible += 1;
                viable.push(*m);
            }
            Attempt::GenericFailure(err) => {
                arity_compatible += 1;
                generic_failures.push(err);
            }
            Attempt::NotApplicable { arity_ok: true } => arity_compatible += 1,
            Attempt::NotApplicable { arity_ok: false } => {}
        }
    }

    trace!(
        member = name,
        candidates = candidates.len(),
        viable = viable.len(),
        "overload candidates matched"
    );

    if viable.is_empty() {
        if !generic_failures.is_empty() && generic_failures.len() == arity_compatible {
            return Err(generic_failures.swap_remove(0));
        }
        return Err(no_matching_overload_error(provider, name, args));
    }

    find_best_match(provider, name, viable)
}

/// Try to match the arguments against one candidate.
fn try_match_candidate(
    provider: &dyn MetadataProvider,
    candidate: &Arc<MemberDescriptor>,
    explicit: &[TypeHash],
    args: &[ArgShape],
) -> Attempt {
    let plan = match plan_markers(provider, candidate, explicit, args) {
        Ok(Some(plan)) => plan,
        Ok(None) => return Attempt::NotApplicable { arity_ok: false },
        Err(err) => return Attempt::GenericFailure(err),
    };
    let values = &args[plan.consumed..];
    let count = values.len();

    let params = candidate.params();
    let required = candidate.entry().required_params();
    let has_params_array = candidate.entry().has_params_array();

    // With a params-array the normal form passes the array itself.
    let normal_ok = count >= required
        && count <= params.len()
        && (!has_params_array || count == params.len());
    let expanded_ok = has_params_array && count >= required;

    if !normal_ok && !expanded_ok {
        return Attempt::NotApplicable { arity_ok: false };
    }

    let mut generic_failure = None;
    for expanded in [false, true] {
        if (expanded && !expanded_ok) || (!expanded && !normal_ok) {
            continue;
        }

        let type_args = match &plan.type_args {
            Some(fixed) => fixed.clone(),
            None => match infer_type_arguments(provider, candidate, values, expanded) {
                Ok(inferred) => inferred,
                Err(err) => {
                    generic_failure.get_or_insert(err);
                    continue;
                }
            },
        };
        if let Err(err) = check_constraints(provider, candidate, &type_args) {
            generic_failure.get_or_insert(err);
            continue;
        }

        let matched = match_form(
            provider,
            candidate,
            type_args,
            values,
            plan.consumed,
            expanded,
        );
        if let Some(m) = matched {
            return Attempt::Match(Box::new(m));
        }
    }

    match generic_failure {
        Some(err) => Attempt::GenericFailure(err),
        None => Attempt::NotApplicable { arity_ok: true },
    }
}

/// Check every argument of one form against the substituted parameters.
fn match_form(
    provider: &dyn MetadataProvider,
    candidate: &Arc<MemberDescriptor>,
    type_args: Vec<TypeHash>,
    values: &[ArgShape],
    consumed_markers: usize,
    expanded: bool,
) -> Option<OverloadMatch> {
    let params: Vec<DataType> = candidate
        .params()
        .iter()
        .map(|p| p.data_type.substitute(&type_args))
        .collect();

    let mut m = OverloadMatch {
        candidate: Arc::clone(candidate),
        return_type: candidate.data_type().substitute(&type_args),
        type_args,
        params,
        arg_conversions: Vec::with_capacity(values.len()),
        consumed_markers,
        expanded,
        total_cost: 0,
        exact_count: 0,
        byref_matches: 0,
    };

    for (index, arg) in values.iter().enumerate() {
        let param = m.param_for_arg(index)?;
        let conv = convert_arg(provider, arg, param)?;
        if conv.is_exact() {
            m.exact_count += 1;
        }
        if param.is_by_ref() && arg.is_by_ref() {
            m.byref_matches += 1;
        }
        m.total_cost = m.total_cost.saturating_add(conv.cost);
        m.arg_conversions.push(conv);
    }

    Some(m)
}

/// The conversion of one argument to one parameter.
///
/// `out` parameters ignore the incoming value, so any argument binds to them
/// without cost.
fn convert_arg(
    provider: &dyn MetadataProvider,
    arg: &ArgShape,
    param: DataType,
) -> Option<Conversion> {
    if param.ref_modifier == RefModifier::Out {
        return Some(Conversion::identity());
    }
    find_conversion(&arg.value_type(), &param.without_ref(), provider)
}

/// Build error for no matching overload.
fn no_matching_overload_error(
    provider: &dyn MetadataProvider,
    name: &str,
    args: &[ArgShape],
) -> BindError {
    let args = args
        .iter()
        .map(|a| match a.marker {
            Some(marker) => format!("type {}", provider.type_name(marker)),
            None => provider.data_type_name(&a.data_type),
        })
        .collect::<Vec<_>>()
        .join(", ");

    BindError::NoMatchingOverload {
        name: name.to_string(),
        args,
    }
}
