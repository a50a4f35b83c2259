use std::sync::Arc;

use anode::{
    Binding, Container, ContainerError, Parameter, TypeCatalog, TypeDescriptor, TypeHint, Value,
};

struct Logger;

struct SmsTransport;

struct Mailer {
    logger: Arc<Logger>,
    retries: i64,
}

fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(TypeDescriptor::class("Logger").construct(|_| Ok(Logger)))
        .with(TypeDescriptor::interface("Transport"))
        .with(
            TypeDescriptor::class("SmsTransport")
                .implements("Transport")
                .construct(|_| Ok(SmsTransport)),
        )
        .with(
            TypeDescriptor::class("Mailer")
                .param(Parameter::new("logger").typed("Logger"))
                .param(Parameter::new("retries").typed("int").default_value(3_i64))
                .construct(|args| {
                    Ok(Mailer {
                        logger: args.instance("logger")?,
                        retries: args.data("retries")?,
                    })
                }),
        )
        .with(TypeDescriptor::interface("Readable"))
        .with(TypeDescriptor::interface("Writable"))
        .with(
            TypeDescriptor::class("Stream")
                .implements("Readable")
                .implements("Writable")
                .construct(|_| Ok(())),
        )
}

#[test]
fn test_typed_dependency_and_builtin_default() {
    let container = Container::new(catalog());

    let mailer = container.get("Mailer").unwrap();
    let mailer = mailer.downcast::<Mailer>().unwrap();

    assert_eq!(mailer.retries, 3);
    assert!(Arc::strong_count(&mailer.logger) >= 1);
}

#[test]
fn test_dependency_through_alias() {
    let types = catalog().with(
        TypeDescriptor::class("Service")
            .param(Parameter::new("logger").typed("log"))
            .construct(|args| Ok(args.instance::<Logger>("logger")?)),
    );
    let container = Container::new(types);
    container.singleton("Logger", Binding::SelfReference).unwrap();
    container.alias("log", "Logger").unwrap();

    let service = container.get("Service").unwrap();
    let logger = container.get("Logger").unwrap();

    assert!(Arc::ptr_eq(
        service.downcast_ref::<Arc<Logger>>().unwrap(),
        &logger.downcast::<Logger>().unwrap(),
    ));
}

#[test]
fn test_builtin_without_default() {
    let types = catalog().with(
        TypeDescriptor::class("Greeter")
            .param(Parameter::new("greeting").typed("string"))
            .construct(|_| Ok(())),
    );
    let container = Container::new(types);

    let err = container.get("Greeter").unwrap_err();

    assert!(matches!(err, ContainerError::AutowiringFailure { .. }));
    assert!(matches!(
        err.root_cause(),
        ContainerError::BuiltinWithoutDefault { parameter, ty }
            if parameter == "greeting" && ty == "string"
    ));
}

#[test]
fn test_annotation_supplies_type() {
    let types = catalog().with(
        TypeDescriptor::class("Reporter")
            .doc("/**\n * @param string|\\Logger $logger\n */")
            .param(Parameter::new("logger"))
            .construct(|args| Ok(args.instance::<Logger>("logger")?)),
    );
    let container = Container::new(types);

    let reporter = container.get("Reporter").unwrap();

    assert!(reporter.downcast::<Arc<Logger>>().is_some());
}

#[test]
fn test_untyped_parameter_uses_default() {
    let types = catalog().with(
        TypeDescriptor::class("Greeter")
            .param(Parameter::new("greeting").default_value("hello"))
            .construct(|args| args.data::<String>("greeting")),
    );
    let container = Container::new(types);

    let greeter = container.get("Greeter").unwrap();

    assert_eq!(greeter.downcast_ref::<String>().unwrap(), "hello");
}

#[test]
fn test_untyped_parameter_without_default() {
    let types = catalog().with(
        TypeDescriptor::class("Greeter")
            .param(Parameter::new("greeting"))
            .construct(|_| Ok(())),
    );
    let container = Container::new(types);

    let err = container.get("Greeter").unwrap_err();

    assert!(matches!(
        err.root_cause(),
        ContainerError::MissingTypeHint(name) if name == "greeting"
    ));
}

#[test]
fn test_union_skips_builtin_and_unknown_members() {
    let types = catalog().with(
        TypeDescriptor::class("Notifier")
            .param(Parameter::new("transport").union(["Missing", "string", "SmsTransport"]))
            .construct(|args| Ok(args.object("transport")?.class().to_owned())),
    );
    let container = Container::new(types);

    let notifier = container.get("Notifier").unwrap();

    assert_eq!(notifier.downcast_ref::<String>().unwrap(), "SmsTransport");
}

#[test]
fn test_union_falls_through_failed_members() {
    // `Transport` is declared but has nothing bound to it.
    let types = catalog().with(
        TypeDescriptor::class("Notifier")
            .param(Parameter::new("transport").union(["Transport", "SmsTransport"]))
            .construct(|args| Ok(args.object("transport")?.class().to_owned())),
    );
    let container = Container::new(types);

    let notifier = container.get("Notifier").unwrap();
    assert_eq!(notifier.downcast_ref::<String>().unwrap(), "SmsTransport");

    container
        .bind("Transport", Binding::redirect("SmsTransport"))
        .unwrap();
    let notifier = container.get("Notifier").unwrap();
    assert_eq!(notifier.downcast_ref::<String>().unwrap(), "SmsTransport");
}

#[test]
fn test_union_with_intersection_member() {
    let types = catalog().with(
        TypeDescriptor::class("Pipe")
            .param(Parameter::new("stream").hint(TypeHint::union([
                TypeHint::intersection(["Readable", "Writable"]),
                TypeHint::named("Logger"),
            ])))
            .construct(|args| Ok(args.object("stream")?.class().to_owned())),
    );
    let container = Container::new(types);

    let pipe = container.get("Pipe").unwrap();
    assert_eq!(pipe.downcast_ref::<String>().unwrap(), "Logger");

    container
        .bind(["Readable", "Writable"], Binding::redirect("Stream"))
        .unwrap();
    let pipe = container.get("Pipe").unwrap();
    assert_eq!(pipe.downcast_ref::<String>().unwrap(), "Stream");
}

#[test]
fn test_unresolvable_union() {
    let types = catalog().with(
        TypeDescriptor::class("Notifier")
            .param(Parameter::new("transport").union(["Transport", "string"]))
            .construct(|_| Ok(())),
    );
    let container = Container::new(types);

    let err = container.get("Notifier").unwrap_err();

    assert!(err.causes().any(|e| matches!(
        e,
        ContainerError::UnresolvableUnion { types, .. } if types == &["Transport", "string"]
    )));
    // The last member failure is kept as the union's cause.
    assert!(matches!(
        err.root_cause(),
        ContainerError::NotInstantiable(class) if class == "Transport"
    ));
}

#[test]
fn test_intersection_parameter() {
    let types = catalog().with(
        TypeDescriptor::class("Pipe")
            .param(Parameter::new("stream").intersection(["Readable", "Writable"]))
            .construct(|args| Ok(args.object("stream")?.class().to_owned())),
    );
    let container = Container::new(types);

    let err = container.get("Pipe").unwrap_err();
    assert!(matches!(
        err.root_cause(),
        ContainerError::EntryNotFound(id) if id == "Readable&Writable"
    ));

    container
        .bind(["Readable", "Writable"], Binding::redirect("Stream"))
        .unwrap();
    let pipe = container.get("Pipe").unwrap();
    assert_eq!(pipe.downcast_ref::<String>().unwrap(), "Stream");
}

#[test]
fn test_failed_dependency_falls_back_to_default() {
    let types = catalog().with(
        TypeDescriptor::class("Notifier")
            .param(
                Parameter::new("transport")
                    .typed("Transport")
                    .default_value(Value::null()),
            )
            .construct(|args| Ok(args.get("transport").and_then(Value::as_data).cloned())),
    );
    let container = Container::new(types);

    let notifier = container.get("Notifier").unwrap();

    assert_eq!(
        notifier.downcast_ref::<Option<serde_json::Value>>().unwrap(),
        &Some(serde_json::Value::Null)
    );
}

#[test]
fn test_failure_names_target_and_parameter() {
    let types = catalog().with(
        TypeDescriptor::class("Notifier")
            .param(Parameter::new("transport").typed("Transport"))
            .construct(|_| Ok(())),
    );
    let container = Container::new(types);

    let err = container.get("Notifier").unwrap_err();

    match &err {
        ContainerError::AutowiringFailure {
            target, parameter, ..
        } => {
            assert_eq!(target, "Notifier");
            assert_eq!(parameter, "transport");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        err.root_cause(),
        ContainerError::NotInstantiable(class) if class == "Transport"
    ));
}

fn circular_catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(
            TypeDescriptor::class("A")
                .param(Parameter::new("b").typed("B"))
                .construct(|_| Ok(())),
        )
        .with(
            TypeDescriptor::class("B")
                .param(Parameter::new("a").typed("A"))
                .construct(|_| Ok(())),
        )
        .with(
            TypeDescriptor::class("C")
                .param(Parameter::new("d").union(["Missing", "D"]))
                .construct(|_| Ok(())),
        )
        .with(
            TypeDescriptor::class("D")
                .param(Parameter::new("c").typed("C"))
                .construct(|_| Ok(())),
        )
        .with(
            TypeDescriptor::class("E")
                .param(Parameter::new("f").typed("F").default_value(Value::null()))
                .construct(|_| Ok(())),
        )
        .with(
            TypeDescriptor::class("F")
                .param(Parameter::new("e").typed("E"))
                .construct(|_| Ok(())),
        )
}

#[test]
fn test_direct_circular_reference() {
    let container = Container::new(circular_catalog());

    let err = container.get("A").unwrap_err();

    assert!(matches!(err, ContainerError::AutowiringFailure { .. }));
    assert!(matches!(
        err.root_cause(),
        ContainerError::CircularReference { .. }
    ));
    let chain = err.circular_chain().unwrap();
    assert!(chain.iter().any(|v| v == "A"));
    assert!(chain.iter().any(|v| v == "B"));
}

#[test]
fn test_circular_reference_through_union() {
    let container = Container::new(circular_catalog());

    let err = container.get("C").unwrap_err();

    assert!(matches!(
        err.root_cause(),
        ContainerError::CircularReference { .. }
    ));
    let chain = err.circular_chain().unwrap();
    assert!(chain.iter().any(|v| v == "C"));
    assert!(chain.iter().any(|v| v == "D"));
}

#[test]
fn test_circular_reference_is_not_masked_by_default() {
    let container = Container::new(circular_catalog());

    let err = container.get("E").unwrap_err();

    assert!(matches!(
        err.root_cause(),
        ContainerError::CircularReference { .. }
    ));
}

#[test]
fn test_chain_is_reset_after_failure() {
    let container = Container::new(circular_catalog().with(
        TypeDescriptor::class("Leaf").construct(|_| Ok(())),
    ));

    let first = container.get("A").unwrap_err();
    let second = container.get("A").unwrap_err();

    assert_eq!(first.circular_chain(), second.circular_chain());
    assert!(container.get("Leaf").is_ok());
}
