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
fn test_inferred_type_arguments() {
    let zoo = zoo();
    let util = zoo.util_type();
    assert_eq!(
        zoo.engine
            .invoke_method(&util, "Identity", &[Value::from("a")])
            .unwrap(),
        Value::from("a")
    );

    let accessor = zoo
        .engine
        .bind(
            &util,
            "Identity",
            &[],
            &[Value::Int64(1)],
            BindFlags::INVOKE_METHOD,
        )
        .unwrap();
    assert_eq!(accessor.type_args(), &[primitives::INT64]);
}

#[test]
fn test_explicit_type_arguments_convert() {
    let zoo = zoo();
    let result = zoo
        .engine
        .invoke_generic(
            &zoo.util_type(),
            "Identity",
            &[primitives::INT64],
            &[Value::Int32(5)],
        )
        .unwrap();
    assert_eq!(result, Value::Int64(5));
}

#[test]
fn test_type_markers_supply_type_arguments() {
    let zoo = zoo();
    let util = zoo.util_type();

    let from_list = zoo
        .engine
        .invoke_generic(&util, "TypeOf", &[primitives::STRING], &[])
        .unwrap();
    let from_marker = zoo
        .engine
        .invoke_method(&util, "TypeOf", &[Value::Type(primitives::STRING)])
        .unwrap();
    assert_eq!(from_list, Value::Type(primitives::STRING));
    assert_eq!(from_marker, from_list);
}

#[test]
fn test_redundant_marker_resolves_like_plain_call() {
    let zoo = zoo();
    let util = zoo.util_type();

    let plain = zoo
        .engine
        .invoke_generic(&util, "Identity", &[primitives::INT32], &[Value::Int32(7)])
        .unwrap();
    let redundant = zoo
        .engine
        .invoke_generic(
            &util,
            "Identity",
            &[primitives::INT32],
            &[Value::Type(primitives::INT32), Value::Int32(7)],
        )
        .unwrap();
    assert_eq!(plain, redundant);

    let err = bind_error(zoo.engine.invoke_generic(
        &util,
        "Identity",
        &[primitives::INT32],
        &[Value::Type(primitives::STRING), Value::Int32(7)],
    ));
    assert!(matches!(err, BindError::TypeArgumentMismatch { .. }));
}

#[test]
fn test_missing_type_argument() {
    let zoo = zoo();
    let err = bind_error(zoo.engine.invoke_method(&zoo.util_type(), "TypeOf", &[]));
    assert!(matches!(err, BindError::MissingTypeArgument { .. }));
}

#[test]
fn test_conflicting_inference() {
    let zoo = zoo();
    let err = bind_error(zoo.engine.invoke_method(
        &zoo.util_type(),
        "Pair",
        &[Value::Int32(1), Value::from("b")],
    ));
    assert!(matches!(err, BindError::TypeArgumentConflict { .. }));

    assert_eq!(
        zoo.engine
            .invoke_method(
                &zoo.util_type(),
                "Pair",
                &[Value::Int32(1), Value::Int32(2)],
            )
            .unwrap(),
        Value::from("pair")
    );
}

#[test]
fn test_constraint_violation() {
    let zoo = zoo();
    let util = zoo.util_type();
    let err = bind_error(zoo.engine.invoke_method(&util, "Track", &[Value::Int32(1)]));
    assert!(matches!(err, BindError::TypeArgumentConstraintViolation { .. }));

    assert_eq!(
        zoo.engine
            .invoke_method(&util, "Track", &[zoo.base_object()])
            .unwrap(),
        Value::Int32(1)
    );
}

#[test]
fn test_wrong_type_argument_count() {
    let zoo = zoo();
    let err = bind_error(zoo.engine.invoke_generic(
        &zoo.util_type(),
        "Identity",
        &[primitives::INT32, primitives::INT32],
        &[Value::Int32(1)],
    ));
    assert!(matches!(err, BindError::NoMatchingOverload { .. }));
}
