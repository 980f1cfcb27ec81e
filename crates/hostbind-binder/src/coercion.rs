//! Argument coercion.
//!
//! Converts script values to the parameter type the overload scorer selected.
//! Shape-level checks already passed when a plan exists; this is where values
//! are range-checked, enums are mapped, and `op_Implicit` operators run.
//!
//! ## Rules
//!
//! | Target | Accepts |
//! |--------|---------|
//! | integer | integers and enums in range, floats without a fractional part |
//! | `float` / `double` | any number within range |
//! | enum | the same enum, or a numeric zero |
//! | struct | a struct of that type, copied |
//! | class / interface | an object or value assignable to it |
//! | `object` | anything but void |
//! | nullable, reference, array | null |

use hostbind_core::{
    BindError, CallContext, DataType, MemberImpl, MetadataProvider, PrimitiveKind, RefModifier,
    StructValue, TypeHash, TypeKind, Value, ValueCell, primitives,
};

use crate::conversion::{Conversion, ConversionKind};
use crate::overload::OverloadMatch;

/// Coerce `value` to `target`, ignoring any reference modifier.
///
/// A `UserImplicit` plan runs the selected operator first.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn coerce(
    provider: &dyn MetadataProvider,
    value: Value,
    target: DataType,
    plan: Option<&Conversion>,
) -> Result<Value, BindError> {
    let target = target.without_ref();
    let value = match value {
        Value::Ref(cell) => cell.get(),
        other => other,
    };

    if let Some(Conversion {
        kind: ConversionKind::UserImplicit {
            declaring_type,
            method,
        },
        ..
    }) = plan
    {
        let converted = apply_implicit_operator(provider, *declaring_type, *method, value)?;
        return coerce(provider, converted, target, None);
    }

    if value.is_void() {
        return Err(mismatch(provider, &target, &value));
    }

    if target.is_array {
        return coerce_array(provider, value, target);
    }

    if target.is_nullable {
        if value.is_null() {
            return Ok(Value::Null);
        }
        return coerce(provider, value, DataType::simple(target.type_hash), None);
    }

    match target.type_hash {
        primitives::OBJECT => return Ok(value),
        primitives::EVENT => {
            return match value {
                Value::Event(_) | Value::Null => Ok(value),
                other => Err(mismatch(provider, &target, &other)),
            };
        }
        _ => {}
    }

    if value.is_null() {
        return if provider.is_reference_type(target.type_hash) {
            Ok(Value::Null)
        } else {
            Err(mismatch(provider, &target, &value))
        };
    }

    let Some(kind) = provider.type_kind(target.type_hash) else {
        return Err(mismatch(provider, &target, &value));
    };

    match kind {
        TypeKind::Primitive(kind) => coerce_primitive(provider, value, kind, &target),
        TypeKind::Enum { .. } => coerce_enum(provider, value, &target),
        TypeKind::String => match value {
            Value::String(_) => Ok(value),
            other => Err(mismatch(provider, &target, &other)),
        },
        TypeKind::TypeMarker => match value {
            Value::Type(_) => Ok(value),
            other => Err(mismatch(provider, &target, &other)),
        },
        TypeKind::Struct => match value {
            Value::Struct(ref s) if s.type_hash == target.type_hash => Ok(value),
            other => Err(mismatch(provider, &target, &other)),
        },
        TypeKind::Object | TypeKind::Class | TypeKind::Interface => {
            let runtime = match &value {
                Value::Object(obj) => obj.runtime_type(),
                other => other.runtime_type().type_hash,
            };
            if !value.runtime_type().is_array
                && provider.is_assignable_to(runtime, target.type_hash)
            {
                Ok(value)
            } else {
                Err(mismatch(provider, &target, &value))
            }
        }
    }
}

fn coerce_array(
    provider: &dyn MetadataProvider,
    value: Value,
    target: DataType,
) -> Result<Value, BindError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Array(ref array) => {
            let element = array.element();
            let covariant = element == target.type_hash
                || target.type_hash == primitives::OBJECT
                || (provider.is_reference_type(element)
                    && provider.is_assignable_to(element, target.type_hash));
            if covariant {
                Ok(value)
            } else {
                Err(mismatch(provider, &target, &value))
            }
        }
        other => Err(mismatch(provider, &target, &other)),
    }
}

fn coerce_primitive(
    provider: &dyn MetadataProvider,
    value: Value,
    kind: PrimitiveKind,
    target: &DataType,
) -> Result<Value, BindError> {
    if kind == PrimitiveKind::Bool || matches!(value, Value::Bool(_)) {
        return match value {
            Value::Bool(_) if kind == PrimitiveKind::Bool => Ok(value),
            other => Err(mismatch(provider, target, &other)),
        };
    }

    let overflow = || BindError::NumericOverflow {
        value: numeric_text(&value),
        target: kind.name().to_string(),
    };

    if kind.is_integer() {
        if let Some(integer) = value.as_integer() {
            return Value::from_integer(kind, integer).ok_or_else(overflow);
        }
        let Some(float) = value.as_f64() else {
            return Err(mismatch(provider, target, &value));
        };
        if !float.is_finite() || float.fract() != 0.0 {
            return Err(overflow());
        }
        let (min, max) = kind.integer_range().ok_or_else(overflow)?;
        if float < min as f64 || float > max as f64 {
            return Err(overflow());
        }
        return Value::from_integer(kind, float as i128).ok_or_else(overflow);
    }

    let Some(float) = value.as_f64() else {
        return Err(mismatch(provider, target, &value));
    };
    match kind {
        PrimitiveKind::Float => {
            if float.is_finite() && float.abs() > f32::MAX as f64 {
                return Err(overflow());
            }
            Ok(Value::Float(float as f32))
        }
        _ => Ok(Value::Double(float)),
    }
}

fn coerce_enum(
    provider: &dyn MetadataProvider,
    value: Value,
    target: &DataType,
) -> Result<Value, BindError> {
    match value {
        Value::Enum { type_hash, .. } if type_hash == target.type_hash => Ok(value),
        Value::Enum { .. } => Err(mismatch(provider, target, &value)),
        ref number if number.as_f64() == Some(0.0) => Ok(Value::Enum {
            type_hash: target.type_hash,
            value: 0,
        }),
        other => Err(mismatch(provider, target, &other)),
    }
}

/// Run an `op_Implicit` operator on `value`.
fn apply_implicit_operator(
    provider: &dyn MetadataProvider,
    declaring_type: TypeHash,
    method: TypeHash,
    value: Value,
) -> Result<Value, BindError> {
    let operator = provider
        .declared_members(declaring_type)
        .and_then(|members| members.iter().find(|m| m.member_hash(declaring_type) == method));
    let Some(MemberImpl::Method(body)) = operator.map(|m| &m.implementation) else {
        return Err(BindError::InvalidTarget(format!(
            "conversion operator missing on '{}'",
            provider.type_name(declaring_type)
        )));
    };
    let mut args = [value];
    let mut ctx = CallContext::new(None, &mut args, &[]);
    Ok(body.call(&mut ctx)?)
}

fn mismatch(provider: &dyn MetadataProvider, target: &DataType, value: &Value) -> BindError {
    BindError::TypeMismatch {
        expected: provider.data_type_name(target),
        actual: provider.data_type_name(&value.runtime_type()),
    }
}

fn numeric_text(value: &Value) -> String {
    match value {
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        other => other
            .as_integer()
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("{other:?}")),
    }
}

/// The value an unset field, an omitted argument or an `out` slot starts with.
pub fn default_value(provider: &dyn MetadataProvider, data_type: DataType) -> Value {
    let data_type = data_type.without_ref();
    if data_type.is_void() {
        return Value::Void;
    }
    if data_type.is_array || data_type.is_nullable {
        return Value::Null;
    }
    match provider.type_kind(data_type.type_hash) {
        Some(TypeKind::Primitive(kind)) => Value::zero(kind),
        Some(TypeKind::Enum { .. }) => Value::Enum {
            type_hash: data_type.type_hash,
            value: 0,
        },
        Some(TypeKind::Struct) => Value::Struct(StructValue::new(data_type.type_hash)),
        _ => Value::Null,
    }
}

/// Arguments coerced for one call, with the cells to update afterwards.
#[derive(Debug)]
pub struct PreparedArgs {
    /// One slot per declared parameter, params-array packed.
    pub values: Vec<Value>,
    write_back: Vec<(usize, ValueCell)>,
}

impl PreparedArgs {
    /// Copy `ref`/`out` slots back into the caller's cells.
    pub fn write_back(&self) {
        for (slot, cell) in &self.write_back {
            if let Some(value) = self.values.get(*slot) {
                cell.set(value.clone());
            }
        }
    }
}

/// Coerce every argument of a resolved call before the host callable runs.
///
/// Omitted parameters take their declared defaults, and in the expanded form
/// trailing arguments are packed into a fresh params-array. Nothing is
/// mutated when any argument fails.
pub fn prepare_arguments(
    provider: &dyn MetadataProvider,
    matched: &OverloadMatch,
    args: &[Value],
) -> Result<PreparedArgs, BindError> {
    let supplied = args.get(matched.consumed_markers..).unwrap_or_default();
    let declared = matched.candidate.params();
    let fixed = if matched.expanded {
        matched.params.len().saturating_sub(1)
    } else {
        matched.params.len()
    };

    let mut values = Vec::with_capacity(matched.params.len());
    let mut write_back = Vec::new();
    let mut packed = Vec::new();

    for (index, arg) in supplied.iter().enumerate() {
        let Some(param) = matched.param_for_arg(index) else {
            return Err(BindError::InvalidTarget(format!(
                "too many arguments for '{}'",
                matched.candidate.name()
            )));
        };
        let plan = matched.arg_conversions.get(index);

        let coerced = match (param.ref_modifier, arg) {
            (RefModifier::Out, _) => default_value(provider, param),
            (_, Value::Ref(cell)) => coerce(provider, cell.get(), param, plan)?,
            (_, value) => coerce(provider, value.clone(), param, plan)?,
        };

        if index < fixed {
            if let (true, Value::Ref(cell)) = (param.is_by_ref(), arg) {
                write_back.push((index, cell.clone()));
            }
            values.push(coerced);
        } else {
            packed.push(coerced);
        }
    }

    for index in values.len()..fixed {
        let param = matched.params[index];
        let value = match declared.get(index).and_then(|p| p.default.clone()) {
            Some(default) => coerce(provider, default, param, None)?,
            None => default_value(provider, param),
        };
        values.push(value);
    }

    if matched.expanded {
        let element = matched
            .params
            .last()
            .map_or(primitives::OBJECT, |p| p.type_hash);
        values.push(Value::array(element, packed));
    }

    Ok(PreparedArgs { values, write_back })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hostbind_core::{HostObject, MemberEntry, NativeFn, Param, TypeEntry};
    use hostbind_registry::{TypeBuilder, TypeRegistry};

    use crate::cache::ArgShape;
    use crate::catalog::{MemberDescriptor, MemberOrigin};
    use crate::overload::resolve_overload;

    fn int(hash: TypeHash) -> DataType {
        DataType::simple(hash)
    }

    #[test]
    fn integer_narrowing_is_range_checked() {
        let registry = TypeRegistry::with_primitives();
        assert_eq!(
            coerce(&registry, Value::Int32(200), int(primitives::UINT8), None).unwrap(),
            Value::UInt8(200)
        );
        let err = coerce(&registry, Value::Int32(300), int(primitives::UINT8), None).unwrap_err();
        assert_eq!(err.to_string(), "value 300 is out of range for 'uint8'");
        assert!(coerce(&registry, Value::Int32(-1), int(primitives::UINT32), None).is_err());
    }

    #[test]
    fn float_to_integer_requires_whole_values() {
        let registry = TypeRegistry::with_primitives();
        assert_eq!(
            coerce(&registry, Value::Double(42.0), int(primitives::INT16), None).unwrap(),
            Value::Int16(42)
        );
        let err = coerce(&registry, Value::Double(1.5), int(primitives::INT32), None).unwrap_err();
        assert!(matches!(err, BindError::NumericOverflow { .. }));
        assert!(coerce(&registry, Value::Double(1e20), int(primitives::INT32), None).is_err());
        let nan = Value::Double(f64::NAN);
        assert!(coerce(&registry, nan, int(primitives::INT32), None).is_err());
    }

    #[test]
    fn double_to_float_overflow() {
        let registry = TypeRegistry::with_primitives();
        assert_eq!(
            coerce(&registry, Value::Double(1.5), int(primitives::FLOAT), None).unwrap(),
            Value::Float(1.5)
        );
        let huge = Value::Double(1e300);
        assert!(coerce(&registry, huge, int(primitives::FLOAT), None).is_err());
    }

    #[test]
    fn bool_does_not_mix_with_numbers() {
        let registry = TypeRegistry::with_primitives();
        let err = coerce(&registry, Value::Bool(true), int(primitives::INT32), None).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected int, got bool");
        assert!(coerce(&registry, Value::Int32(1), int(primitives::BOOL), None).is_err());
    }

    #[test]
    fn enums() {
        let mut registry = TypeRegistry::with_primitives();
        let color = TypeBuilder::enumeration("Color", PrimitiveKind::Int32)
            .enum_value("None", 0)
            .enum_value("Red", 1)
            .register(&mut registry)
            .unwrap();
        let shade = TypeBuilder::enumeration("Shade", PrimitiveKind::Uint8)
            .register(&mut registry)
            .unwrap();

        assert_eq!(
            coerce(&registry, Value::Int32(0), int(color), None).unwrap(),
            Value::Enum {
                type_hash: color,
                value: 0
            }
        );
        let err = coerce(&registry, Value::Int32(1), int(color), None).unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { .. }));

        let red = Value::Enum {
            type_hash: color,
            value: 1,
        };
        assert_eq!(
            coerce(&registry, red.clone(), int(color), None).unwrap(),
            red
        );
        assert!(coerce(&registry, red.clone(), int(shade), None).is_err());
        assert_eq!(
            coerce(&registry, red, int(primitives::INT64), None).unwrap(),
            Value::Int64(1)
        );

        let big = Value::Enum {
            type_hash: color,
            value: 1000,
        };
        assert!(coerce(&registry, big, int(primitives::INT8), None).is_err());
    }

    #[test]
    fn null_targets() {
        let mut registry = TypeRegistry::with_primitives();
        let widget = TypeBuilder::class("Widget")
            .register(&mut registry)
            .unwrap();
        assert_eq!(
            coerce(&registry, Value::Null, int(widget), None).unwrap(),
            Value::Null
        );
        let nullable = DataType::nullable(primitives::INT32);
        assert_eq!(
            coerce(&registry, Value::Null, nullable, None).unwrap(),
            Value::Null
        );
        let array = DataType::array_of(primitives::INT32);
        assert_eq!(
            coerce(&registry, Value::Null, array, None).unwrap(),
            Value::Null
        );
        assert!(coerce(&registry, Value::Null, int(primitives::INT32), None).is_err());
    }

    #[test]
    fn object_target_boxes_anything() {
        let registry = TypeRegistry::with_primitives();
        assert_eq!(
            coerce(&registry, Value::Int32(3), int(primitives::OBJECT), None).unwrap(),
            Value::Int32(3)
        );
        assert!(coerce(&registry, Value::Void, int(primitives::OBJECT), None).is_err());
    }

    #[test]
    fn structs_are_copied() {
        let mut registry = TypeRegistry::with_primitives();
        let point = TypeBuilder::value_type("Point")
            .register(&mut registry)
            .unwrap();
        let original = StructValue::new(point).with_field("X", 1);
        let coerced = coerce(&registry, Value::Struct(original.clone()), int(point), None).unwrap();
        let Value::Struct(mut copy) = coerced else {
            panic!("expected struct");
        };
        copy.fields.clear();
        assert_eq!(original.field("X"), Some(&Value::Int32(1)));
    }

    #[test]
    fn array_element_types() {
        let mut registry = TypeRegistry::with_primitives();
        let base = TypeBuilder::class("Base").register(&mut registry).unwrap();
        let derived = TypeBuilder::class("Derived")
            .extends(base)
            .register(&mut registry)
            .unwrap();

        let derived_items = Value::array(derived, vec![]);
        assert!(coerce(&registry, derived_items, DataType::array_of(base), None).is_ok());

        let ints = Value::array(primitives::INT32, vec![Value::Int32(1)]);
        let err = coerce(&registry, ints, DataType::array_of(primitives::INT64), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch: expected int64[], got int[]"
        );
    }

    #[test]
    fn objects_must_be_assignable() {
        let mut registry = TypeRegistry::with_primitives();
        let named = TypeBuilder::interface("INamed")
            .register(&mut registry)
            .unwrap();
        let person = TypeBuilder::class("Person")
            .implements(named)
            .register(&mut registry)
            .unwrap();
        let rock = TypeBuilder::class("Rock").register(&mut registry).unwrap();

        let p = Value::object(HostObject::new(person));
        assert!(coerce(&registry, p, int(named), None).is_ok());
        let r = Value::object(HostObject::new(rock));
        assert!(coerce(&registry, r, int(named), None).is_err());
    }

    #[test]
    fn implicit_operator_runs() {
        let mut registry = TypeRegistry::with_primitives();
        let meters = TypeHash::from_name("Meters");
        TypeBuilder::value_type("Meters")
            .member(
                MemberEntry::method(
                    "op_Implicit",
                    vec![Param::new("m", int(meters))],
                    int(primitives::DOUBLE),
                    NativeFn::new(|ctx: &mut CallContext| {
                        let Some(Value::Struct(s)) = ctx.arg(0) else {
                            return Err(hostbind_core::NativeError::InvalidThis);
                        };
                        Ok(s.field("Value").cloned().unwrap_or(Value::Double(0.0)))
                    }),
                )
                .as_static(),
            )
            .register(&mut registry)
            .unwrap();

        let (source, target) = (int(meters), int(primitives::DOUBLE));
        let plan = crate::conversion::find_conversion(&source, &target, &registry).unwrap();
        let value = Value::Struct(StructValue::new(meters).with_field("Value", 2.5));
        assert_eq!(
            coerce(&registry, value, int(primitives::DOUBLE), Some(&plan)).unwrap(),
            Value::Double(2.5)
        );
    }

    #[test]
    fn defaults() {
        let mut registry = TypeRegistry::with_primitives();
        let color = TypeBuilder::enumeration("Color", PrimitiveKind::Int32)
            .register(&mut registry)
            .unwrap();
        assert_eq!(
            default_value(&registry, int(primitives::INT16)),
            Value::Int16(0)
        );
        assert_eq!(
            default_value(&registry, int(primitives::STRING)),
            Value::Null
        );
        assert_eq!(
            default_value(&registry, int(color)),
            Value::Enum {
                type_hash: color,
                value: 0
            }
        );
        assert_eq!(default_value(&registry, DataType::void()), Value::Void);
    }

    fn method(params: Vec<Param>) -> Arc<MemberDescriptor> {
        let entry = MemberEntry::method(
            "Run",
            params,
            DataType::void(),
            NativeFn::new(|_: &mut CallContext| Ok(Value::Void)),
        );
        Arc::new(MemberDescriptor::new(
            entry,
            &TypeEntry::new("Runner", TypeKind::Class),
            MemberOrigin::Own,
            0,
        ))
    }

    fn prepare(
        registry: &TypeRegistry,
        candidate: Arc<MemberDescriptor>,
        args: &[Value],
    ) -> Result<PreparedArgs, BindError> {
        let shapes: Vec<ArgShape> = args.iter().map(ArgShape::of).collect();
        let matched = resolve_overload(registry, "Run", &[candidate], &[], &shapes)?;
        prepare_arguments(registry, &matched, args)
    }

    #[test]
    fn prepare_fills_defaults_and_packs_params() {
        let registry = TypeRegistry::with_primitives();
        let candidate = method(vec![
            Param::new("msg", int(primitives::STRING)),
            Param::new("level", int(primitives::DOUBLE)).with_default(1),
            Param::params("rest", primitives::INT64),
        ]);
        let prepared = prepare(&registry, candidate, &[Value::from("hi")]).unwrap();
        assert_eq!(prepared.values.len(), 3);
        assert_eq!(prepared.values[1], Value::Double(1.0));
        let Value::Array(rest) = &prepared.values[2] else {
            panic!("expected params array");
        };
        assert!(rest.is_empty());
        assert_eq!(rest.element(), primitives::INT64);
    }

    #[test]
    fn prepare_packs_coerced_trailing_arguments() {
        let registry = TypeRegistry::with_primitives();
        let candidate = method(vec![Param::params("rest", primitives::INT64)]);
        let prepared = prepare(&registry, candidate, &[Value::Int32(1), Value::Int8(2)]).unwrap();
        let Value::Array(rest) = &prepared.values[0] else {
            panic!("expected params array");
        };
        assert_eq!(rest.to_vec(), vec![Value::Int64(1), Value::Int64(2)]);
    }

    #[test]
    fn prepare_writes_back_cells() {
        let registry = TypeRegistry::with_primitives();
        let out_int = int(primitives::INT32).with_ref(RefModifier::Out);
        let candidate = method(vec![Param::new("result", out_int)]);
        let cell = ValueCell::new(Value::from("ignored"));
        let mut prepared = prepare(&registry, candidate, &[Value::Ref(cell.clone())]).unwrap();
        assert_eq!(prepared.values[0], Value::Int32(0));

        prepared.values[0] = Value::Int32(7);
        prepared.write_back();
        assert_eq!(cell.get(), Value::Int32(7));
    }

    #[test]
    fn prepare_fails_without_partial_effects() {
        let registry = TypeRegistry::with_primitives();
        let candidate = method(vec![
            Param::new("a", int(primitives::INT32).with_ref(RefModifier::Ref)),
            Param::new("b", int(primitives::UINT8)),
        ]);
        let cell = ValueCell::new(Value::Int32(5));
        let args = [Value::Ref(cell.clone()), Value::Int32(999)];
        let err = prepare(&registry, candidate, &args).unwrap_err();
        assert!(matches!(err, BindError::NumericOverflow { .. }));
        assert_eq!(cell.get(), Value::Int32(5));
    }
}
