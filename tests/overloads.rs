mod common;

use common::*;
use hostbind::prelude::*;

fn bind_error(result: hostbind::Result<Value>) -> BindError {
    match result.unwrap_err() {
        HostBindError::Bind(err) => err,
        other => panic!("expected a bind error, got {other}"),
    }
}

#[test]
fn test_exact_match() {
    let zoo = zoo();
    let util = zoo.util_type();
    let result = zoo
        .engine
        .invoke_method(&util, "Add", &[Value::Int32(1), Value::Double(2.0)])
        .unwrap();
    assert_eq!(result, Value::Double(1.0));

    let result = zoo
        .engine
        .invoke_method(&util, "Add", &[Value::Double(1.0), Value::Int32(2)])
        .unwrap();
    assert_eq!(result, Value::Double(2.0));
}

#[test]
fn test_crossed_conversions_are_ambiguous() {
    let zoo = zoo();
    let err = bind_error(
        zoo.engine
            .invoke_method(&zoo.util_type(), "Add", &[Value::Int32(1), Value::Int32(2)]),
    );
    let BindError::AmbiguousOverload { name, candidates } = err else {
        panic!("expected an ambiguity, got {err}");
    };
    assert_eq!(name, "Add");
    assert!(candidates.contains(&"Add(int, double)".to_string()));
    assert!(candidates.contains(&"Add(double, int)".to_string()));
}

#[test]
fn test_no_match_names_the_arguments() {
    let zoo = zoo();
    let err = bind_error(zoo.engine.invoke_method(
        &zoo.util_type(),
        "Sum",
        &[Value::Int32(1), Value::from("x")],
    ));
    assert_eq!(
        err.to_string(),
        "no matching overload for 'Sum(int, string)'"
    );
}

#[test]
fn test_params_array() {
    let zoo = zoo();
    let util = zoo.util_type();
    assert_eq!(
        zoo.engine.invoke_method(&util, "Sum", &[]).unwrap(),
        Value::Int64(0)
    );
    assert_eq!(
        zoo.engine
            .invoke_method(
                &util,
                "Sum",
                &[Value::Int32(1), Value::Int16(2), Value::Int8(3)],
            )
            .unwrap(),
        Value::Int64(6)
    );

    let packed = Value::array(primitives::INT32, vec![Value::Int32(4), Value::Int32(5)]);
    assert_eq!(
        zoo.engine.invoke_method(&util, "Sum", &[packed]).unwrap(),
        Value::Int64(9)
    );
}

#[test]
fn test_default_arguments() {
    let zoo = zoo();
    let util = zoo.util_type();
    let clamp = |args: &[Value]| zoo.engine.invoke_method(&util, "Clamp", args).unwrap();

    assert_eq!(clamp(&[Value::Int32(150)]), Value::Int32(100));
    assert_eq!(clamp(&[Value::Int32(-5)]), Value::Int32(0));
    assert_eq!(clamp(&[Value::Int32(5), Value::Int32(6)]), Value::Int32(6));
    assert_eq!(
        clamp(&[Value::Int32(5), Value::Int32(0), Value::Int32(3)]),
        Value::Int32(3)
    );
}

#[test]
fn test_ref_arguments_are_written_back() {
    let zoo = zoo();
    let a = ValueCell::new(Value::Int32(1));
    let b = ValueCell::new(Value::Int32(2));
    zoo.engine
        .invoke_method(
            &zoo.util_type(),
            "Swap",
            &[Value::Ref(a.clone()), Value::Ref(b.clone())],
        )
        .unwrap();
    assert_eq!(a.get(), Value::Int32(2));
    assert_eq!(b.get(), Value::Int32(1));
}

#[test]
fn test_virtual_dispatch_through_restricted_result() {
    let zoo = zoo();
    let obj = zoo.derived_object();
    assert_eq!(
        zoo.engine.invoke_method(&obj, "Speak", &[]).unwrap(),
        Value::from("derived")
    );

    let partner = zoo.engine.invoke_method(&obj, "Partner", &[]).unwrap();
    assert_eq!(partner.as_object().and_then(|o| o.view()), Some(zoo.base));
    assert_eq!(
        zoo.engine.invoke_method(&partner, "Speak", &[]).unwrap(),
        Value::from("derived")
    );
    assert!(
        zoo.engine
            .invoke_method(&partner, "AsGreeter", &[])
            .is_err()
    );

    let exact = zoo.engine.invoke_method(&obj, "ExactPartner", &[]).unwrap();
    assert_eq!(exact.as_object().and_then(|o| o.view()), None);
    assert!(zoo.engine.invoke_method(&exact, "AsGreeter", &[]).is_ok());
}

#[test]
fn test_disabling_type_restriction() {
    let zoo = zoo();
    let obj = zoo.derived_object();
    zoo.engine.set_disable_type_restriction(true);
    let partner = zoo.engine.invoke_method(&obj, "Partner", &[]).unwrap();
    assert!(zoo.engine.invoke_method(&partner, "AsGreeter", &[]).is_ok());
}

#[test]
fn test_array_elements_restricted_on_index() {
    let zoo = zoo();
    let obj = zoo.derived_object();
    let crowd = zoo.engine.invoke_method(&obj, "Crowd", &[]).unwrap();
    assert_eq!(
        zoo.engine.get_property(&crowd, "Length").unwrap(),
        Value::Int32(1)
    );

    let first = zoo.engine.get_index(&crowd, &[Value::Int32(0)]).unwrap();
    assert_eq!(first.as_object().and_then(|o| o.view()), Some(zoo.base));

    zoo.engine.set_disable_list_index_type_restriction(true);
    let first = zoo.engine.get_index(&crowd, &[Value::Int32(0)]).unwrap();
    assert_eq!(first.as_object().and_then(|o| o.view()), None);

    let err = zoo
        .engine
        .get_index(&crowd, &[Value::Int32(5)])
        .unwrap_err();
    assert_eq!(
        err,
        HostBindError::Bind(BindError::Native(NativeError::IndexOutOfRange {
            index: 5,
            length: 1
        }))
    );
}

#[test]
fn test_extension_methods() {
    let zoo = zoo();
    let obj = zoo.derived_object();
    assert_eq!(
        zoo.engine.invoke_method(&obj, "Shout", &[]).unwrap(),
        Value::from("SHOUT")
    );

    let greeter = zoo.engine.view_as(&obj, zoo.greeter).unwrap();
    assert_eq!(
        zoo.engine.invoke_method(&greeter, "Shout", &[]).unwrap(),
        Value::from("SHOUT")
    );

    assert_eq!(
        zoo.engine
            .invoke_method(&Value::Int32(4), "Doubled", &[])
            .unwrap(),
        Value::Int32(8)
    );

    let err = bind_error(zoo.engine.invoke_method(&zoo.base_object(), "Shout", &[]));
    assert!(err.is_not_found());
}

#[test]
fn test_indexer() {
    let zoo = zoo();
    let bag = zoo.bag_object();
    zoo.engine
        .set_index(&bag, &[Value::from("apples")], Value::Int16(5))
        .unwrap();
    assert_eq!(
        zoo.engine
            .get_index(&bag, &[Value::from("apples")])
            .unwrap(),
        Value::Int32(5)
    );
    assert_eq!(
        zoo.engine.get_index(&bag, &[Value::from("pears")]).unwrap(),
        Value::Int32(0)
    );

    let err = bind_error(zoo.engine.get_index(&bag, &[Value::Bool(true)]));
    assert!(matches!(err, BindError::NoMatchingOverload { .. }));
}

#[test]
fn test_static_members_and_nested_types() {
    let zoo = zoo();
    let base_type = zoo.engine.type_value("Base").unwrap();
    assert_eq!(
        zoo.engine.get_property(&base_type, "Options").unwrap(),
        Value::Type(zoo.options)
    );

    let util = zoo.util_type();
    zoo.engine
        .set_property(&util, "Calls", Value::Int32(2))
        .unwrap();
    assert_eq!(
        zoo.engine.get_property(&util, "Calls").unwrap(),
        Value::Int32(2)
    );
    assert_eq!(
        zoo.engine.get_property(&util, "Version").unwrap(),
        Value::from("1.0")
    );

    let err = zoo
        .engine
        .set_property(&util, "Version", Value::from("2.0"))
        .unwrap_err();
    assert_eq!(err.to_string(), "'Version' is read-only");
}

#[test]
fn test_ignore_case_lookup() {
    let zoo = zoo();
    let obj = zoo.derived_object();
    let accessor = zoo
        .engine
        .bind(
            &obj,
            "speak",
            &[],
            &[],
            BindFlags::INVOKE_METHOD | BindFlags::IGNORE_CASE,
        )
        .unwrap();
    assert_eq!(
        zoo.engine.binder().invoke(&accessor, &obj, &[]).unwrap(),
        Value::from("derived")
    );

    let err = zoo
        .engine
        .bind(&obj, "speak", &[], &[], BindFlags::INVOKE_METHOD)
        .unwrap_err();
    assert!(err.is_not_found());
}
