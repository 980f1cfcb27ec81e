//! Shared fixtures for the engine integration tests.
//!
//! One registry models a small application: an interface, a class
//! hierarchy with members of every visibility, an enum, a struct, a static
//! utility class with overloads and generic methods, a keyed indexer, and an
//! extension scope.

#![allow(dead_code)]

use hostbind::prelude::*;

pub struct Zoo {
    pub engine: Engine,
    pub greeter: TypeHash,
    pub base: TypeHash,
    pub derived: TypeHash,
    pub options: TypeHash,
    pub color: TypeHash,
    pub vector: TypeHash,
    pub util: TypeHash,
    pub bag: TypeHash,
}

impl Zoo {
    pub fn base_object(&self) -> Value {
        Value::object(HostObject::new(self.base))
    }

    pub fn derived_object(&self) -> Value {
        Value::object(HostObject::new(self.derived))
    }

    pub fn bag_object(&self) -> Value {
        Value::object(HostObject::new(self.bag))
    }

    pub fn util_type(&self) -> Value {
        Value::Type(self.util)
    }

    pub fn vector(&self, x: f64, y: f64) -> Value {
        Value::Struct(StructValue::new(self.vector).with_field("X", x).with_field("Y", y))
    }
}

pub fn int() -> DataType {
    DataType::simple(primitives::INT32)
}

pub fn string() -> DataType {
    DataType::simple(primitives::STRING)
}

pub fn double() -> DataType {
    DataType::simple(primitives::DOUBLE)
}

fn text(s: &str) -> Result<Value, NativeError> {
    Ok(Value::from(s))
}

fn native(
    f: impl Fn(&mut CallContext) -> Result<Value, NativeError> + Send + Sync + 'static,
) -> NativeFn {
    NativeFn::new(f)
}

fn static_method(
    name: &str,
    params: Vec<Param>,
    return_type: DataType,
    body: impl Fn(&mut CallContext) -> Result<Value, NativeError> + Send + Sync + 'static,
) -> MemberEntry {
    MemberEntry::method(name, params, return_type, native(body)).as_static()
}

fn integer_arg(ctx: &CallContext, index: usize) -> Result<i128, NativeError> {
    ctx.arg_or_err(index, "integer")?
        .as_integer()
        .ok_or(NativeError::InvalidArgument {
            index,
            expected: "integer".to_string(),
        })
}

pub fn zoo() -> Zoo {
    let mut registry = TypeRegistry::with_primitives();
    let app = ModuleId::named("app");

    let greeter = TypeBuilder::interface("IGreeter")
        .in_module(app)
        .member(MemberEntry::abstract_method("Greet", vec![], string()))
        .register(&mut registry)
        .unwrap();

    let color = TypeBuilder::enumeration("Color", PrimitiveKind::Int32)
        .enum_value("Red", 0)
        .enum_value("Green", 1)
        .enum_value("Blue", 2)
        .register(&mut registry)
        .unwrap();

    let base_hash = TypeHash::from_name("Base");
    let score_slot = TypeHash::from_member(base_hash, "_score");
    let speak = MemberEntry::method("Speak", vec![], string(), native(|_| text("base")));
    let base = TypeBuilder::class("Base")
        .in_module(app)
        .method("Describe", vec![Param::new("n", int())], string(), |_: &mut CallContext| {
            text("Base.Describe(int)")
        })
        .member(speak.as_virtual())
        .member(MemberEntry::field("Level", int()).with_visibility(Visibility::Protected))
        .member(MemberEntry::field("token", string()).with_visibility(Visibility::Private))
        .member(
            MemberEntry::method("Helper", vec![], string(), native(|_| text("helper")))
                .with_visibility(Visibility::Internal),
        )
        .property(
            "Score",
            DataType::simple(primitives::UINT8),
            Some(move |ctx: &mut CallContext| {
                Ok(ctx.this_object()?.field(score_slot).unwrap_or(Value::UInt8(0)))
            }),
            Some(move |ctx: &mut CallContext| {
                let value = ctx.arg_or_err(0, "uint8")?.clone();
                ctx.this_object()?.set_field(score_slot, value);
                Ok(Value::Void)
            }),
        )
        .member(MemberEntry::property(
            "Id",
            int(),
            Some(native(|_| Ok(Value::Int32(42)))),
            None,
        ))
        .field("Tint", DataType::simple(color))
        .field("Ratio", DataType::simple(primitives::FLOAT))
        .field("Numbers", DataType::array_of(primitives::INT32))
        .event("Changed")
        .register(&mut registry)
        .unwrap();

    let options = TypeBuilder::class("Options")
        .nested_in(base)
        .field("Verbose", DataType::simple(primitives::BOOL))
        .register(&mut registry)
        .unwrap();

    let derived_hash = TypeHash::from_name("Derived");
    let speak = MemberEntry::method("Speak", vec![], string(), native(|_| text("derived")));
    let derived = TypeBuilder::class("Derived")
        .in_module(app)
        .extends(base)
        .implements(greeter)
        .member(
            MemberEntry::method(
                "Describe",
                vec![Param::new("value", DataType::generic(0))],
                string(),
                native(|_| text("Derived.Describe<T>")),
            )
            .with_generic_params(vec![GenericParam::new("T")])
            .with_visibility(Visibility::Protected),
        )
        .member(
            MemberEntry::method("Greet", vec![], string(), native(|_| text("hello")))
                .with_explicit_interface(greeter)
                .with_visibility(Visibility::Private),
        )
        .member(speak.as_virtual())
        .member(MemberEntry::method(
            "Partner",
            vec![],
            DataType::simple(base_hash),
            native(move |_| Ok(Value::object(HostObject::new(derived_hash)))),
        ))
        .member(
            MemberEntry::method(
                "ExactPartner",
                vec![],
                DataType::simple(base_hash),
                native(move |_| Ok(Value::object(HostObject::new(derived_hash)))),
            )
            .exposing_runtime_type(),
        )
        .member(MemberEntry::method(
            "AsGreeter",
            vec![],
            DataType::simple(greeter),
            native(|ctx| Ok(ctx.this().cloned().unwrap_or(Value::Null))),
        ))
        .member(MemberEntry::method(
            "Crowd",
            vec![],
            DataType::array_of(base_hash),
            native(move |_| {
                Ok(Value::array(
                    base_hash,
                    vec![Value::object(HostObject::new(derived_hash))],
                ))
            }),
        ))
        .register(&mut registry)
        .unwrap();

    let scale = vec![Param::new("k", double())];
    let vector = TypeBuilder::value_type("Vector2")
        .field("X", double())
        .field("Y", double())
        .method("Scale", scale, DataType::void(), |ctx: &mut CallContext| {
            let k = ctx.arg_or_err(0, "double")?.as_f64().unwrap_or(1.0);
            if let Some(Value::Struct(s)) = ctx.this_mut() {
                for value in s.fields.values_mut() {
                    if let Some(x) = value.as_f64() {
                        *value = Value::Double(x * k);
                    }
                }
            }
            Ok(Value::Void)
        })
        .register(&mut registry)
        .unwrap();

    let util = TypeBuilder::class("Util")
        .member(MemberEntry::field("Calls", int()).as_static())
        .member(
            MemberEntry::field("Version", string())
                .as_static()
                .read_only()
                .with_initial_value("1.0"),
        )
        .member(
            static_method(
                "Identity",
                vec![Param::new("value", DataType::generic(0))],
                DataType::generic(0),
                |ctx| Ok(ctx.arg(0).cloned().unwrap_or(Value::Null)),
            )
            .with_generic_params(vec![GenericParam::new("T")]),
        )
        .member(
            static_method(
                "Pair",
                vec![
                    Param::new("a", DataType::generic(0)),
                    Param::new("b", DataType::generic(0)),
                ],
                string(),
                |_| text("pair"),
            )
            .with_generic_params(vec![GenericParam::new("T")]),
        )
        .member(
            static_method("TypeOf", vec![], DataType::simple(primitives::TYPE), |ctx| {
                Ok(ctx.type_args().first().map_or(Value::Null, |t| Value::Type(*t)))
            })
            .with_generic_params(vec![GenericParam::new("T")]),
        )
        .member(
            static_method(
                "Track",
                vec![Param::new("value", DataType::generic(0))],
                int(),
                |_| Ok(Value::Int32(1)),
            )
            .with_generic_params(vec![
                GenericParam::new("T").with_constraints(GenericConstraints::REFERENCE_TYPE),
            ]),
        )
        .member(static_method(
            "Add",
            vec![Param::new("a", int()), Param::new("b", double())],
            double(),
            |_| Ok(Value::Double(1.0)),
        ))
        .member(static_method(
            "Add",
            vec![Param::new("a", double()), Param::new("b", int())],
            double(),
            |_| Ok(Value::Double(2.0)),
        ))
        .member(static_method(
            "Sum",
            vec![Param::params("values", primitives::INT32)],
            DataType::simple(primitives::INT64),
            |ctx| {
                let total: i128 = match ctx.arg(0) {
                    Some(Value::Array(items)) => {
                        items.to_vec().iter().filter_map(Value::as_integer).sum()
                    }
                    _ => 0,
                };
                Ok(Value::Int64(total as i64))
            },
        ))
        .member(static_method(
            "Swap",
            vec![
                Param::new("a", int().with_ref(RefModifier::Ref)),
                Param::new("b", int().with_ref(RefModifier::Ref)),
            ],
            DataType::void(),
            |ctx| {
                let a = ctx.arg_or_err(0, "int")?.clone();
                let b = ctx.arg_or_err(1, "int")?.clone();
                ctx.set_arg(0, b)?;
                ctx.set_arg(1, a)?;
                Ok(Value::Void)
            },
        ))
        .member(static_method(
            "Store",
            vec![Param::new("value", DataType::simple(primitives::UINT8))],
            int(),
            |ctx| Ok(Value::Int32(integer_arg(ctx, 0)? as i32)),
        ))
        .member(static_method(
            "Echo",
            vec![Param::new("value", DataType::simple(primitives::OBJECT))],
            DataType::simple(primitives::OBJECT),
            |ctx| Ok(ctx.arg(0).cloned().unwrap_or(Value::Null)),
        ))
        .member(static_method(
            "Paint",
            vec![Param::new("color", DataType::simple(color))],
            int(),
            |ctx| match ctx.arg(0) {
                Some(Value::Enum { value, .. }) => Ok(Value::Int32(*value as i32)),
                _ => Err(NativeError::InvalidArgument {
                    index: 0,
                    expected: "Color".to_string(),
                }),
            },
        ))
        .member(static_method(
            "Clamp",
            vec![
                Param::new("value", int()),
                Param::new("min", int()).with_default(0),
                Param::new("max", int()).with_default(100),
            ],
            int(),
            |ctx| {
                let value = integer_arg(ctx, 0)?;
                let (lo, hi) = (integer_arg(ctx, 1)?, integer_arg(ctx, 2)?);
                Ok(Value::Int32(value.clamp(lo, hi) as i32))
            },
        ))
        .member(static_method(
            "Length",
            vec![Param::new("v", DataType::simple(vector))],
            double(),
            |ctx| match ctx.arg(0) {
                Some(Value::Struct(s)) => {
                    let x = s.field("X").and_then(Value::as_f64).unwrap_or(0.0);
                    let y = s.field("Y").and_then(Value::as_f64).unwrap_or(0.0);
                    Ok(Value::Double((x * x + y * y).sqrt()))
                }
                _ => Err(NativeError::InvalidArgument {
                    index: 0,
                    expected: "Vector2".to_string(),
                }),
            },
        ))
        .register(&mut registry)
        .unwrap();

    let bag_hash = TypeHash::from_name("Bag");
    let bag = TypeBuilder::class("Bag")
        .member(MemberEntry::indexer(
            vec![Param::new("key", string())],
            int(),
            Some(native(move |ctx| {
                let key = ctx
                    .arg(0)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(ctx
                    .this_object()?
                    .field(TypeHash::from_member(bag_hash, &key))
                    .unwrap_or(Value::Int32(0)))
            })),
            Some(native(move |ctx| {
                let key = ctx
                    .arg(0)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let value = ctx.arg_or_err(1, "int")?.clone();
                ctx.this_object()?
                    .set_field(TypeHash::from_member(bag_hash, &key), value);
                Ok(Value::Void)
            })),
        ))
        .register(&mut registry)
        .unwrap();

    let extensions = TypeBuilder::class("Extensions")
        .member(
            static_method(
                "Shout",
                vec![Param::new("greeter", DataType::simple(greeter))],
                string(),
                |_| text("SHOUT"),
            )
            .as_extension(),
        )
        .member(
            static_method("Doubled", vec![Param::new("n", int())], int(), |ctx| {
                Ok(Value::Int32(integer_arg(ctx, 0)? as i32 * 2))
            })
            .as_extension(),
        )
        .register(&mut registry)
        .unwrap();
    registry.register_extension_scope(extensions).unwrap();

    Zoo {
        engine: Engine::new(registry).unwrap(),
        greeter,
        base,
        derived,
        options,
        color,
        vector,
        util,
        bag,
    }
}
