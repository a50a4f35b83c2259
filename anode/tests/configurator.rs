use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use anode::{
    Binding, Configuration, ConfigurationError, Configurator, Container, ContainerError, Object,
    Parameter, TypeCatalog, TypeDescriptor,
};
use serde_json::json;
use tempfile::NamedTempFile;

struct Logger;

struct ServiceAImpl {
    logger: Arc<Logger>,
}

struct Page {
    engine: Object,
}

fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(TypeDescriptor::interface("LoggerInterface"))
        .with(
            TypeDescriptor::class("FileLogger")
                .implements("LoggerInterface")
                .construct(|_| Ok(Logger)),
        )
        .with(TypeDescriptor::class("Logger").construct(|_| Ok(Logger)))
        .with(TypeDescriptor::interface("ServiceA"))
        .with(
            TypeDescriptor::class("ServiceAImpl")
                .implements("ServiceA")
                .param(Parameter::new("logger").typed("LoggerInterface"))
                .construct(|args| {
                    Ok(ServiceAImpl {
                        logger: args.instance("logger")?,
                    })
                }),
        )
        .with(TypeDescriptor::interface("Renderer"))
        .with(TypeDescriptor::interface("TemplatingEngine").implements("Renderer"))
        .with(
            TypeDescriptor::class("TwigEngine")
                .implements("TemplatingEngine")
                .construct(|_| Ok(())),
        )
        .with(
            TypeDescriptor::class("Page")
                .param(Parameter::new("engine").typed("TwigEngine"))
                .construct(|args| {
                    Ok(Page {
                        engine: args.object("engine")?.clone(),
                    })
                }),
        )
        .with(
            TypeDescriptor::class("PlainRenderer")
                .implements("Renderer")
                .construct(|_| Ok(())),
        )
}

fn apply(config: serde_json::Value) -> Result<Container, ContainerError> {
    let container = Container::new(catalog());
    container.use_configurator(&Configurator::from_value(config)?)?;
    Ok(container)
}

fn logger_of(service: &Object) -> Arc<Logger> {
    service.downcast::<ServiceAImpl>().unwrap().logger.clone()
}

#[test]
fn test_apply_sections() {
    let container = apply(json!({
        "aliases": { "log": "Logger" },
        "singletons": ["Logger", "FileLogger"],
        "entries": { "ServiceA": "ServiceAImpl", "LoggerInterface": "FileLogger" },
    }))
    .unwrap();

    assert!(container.has_alias("log"));
    assert!(container.has_singleton("Logger"));
    assert!(container.has_singleton("FileLogger"));
    assert!(container.has_entry("ServiceA"));
    assert!(
        container
            .get("log")
            .unwrap()
            .ptr_eq(&container.get("Logger").unwrap())
    );

    let first = container.get("ServiceA").unwrap();
    let second = container.get("ServiceA").unwrap();
    assert_eq!(first.class(), "ServiceAImpl");
    assert!(!first.ptr_eq(&second));
}

#[test]
fn test_integer_keys_are_self_bindings() {
    let container = apply(json!({
        "singletons": { "0": "Logger", "LoggerInterface": "FileLogger" },
        "entries": { "0": "TwigEngine" },
    }))
    .unwrap();

    assert!(container.has_singleton("Logger"));
    assert!(container.has_singleton("LoggerInterface"));
    assert!(container.has_entry("TwigEngine"));
}

#[test]
fn test_singleton_dependency_registered_ahead_of_order() {
    // `ServiceA` needs `LoggerInterface`, which is only configured after it.
    let container = apply(json!({
        "singletons": { "ServiceA": "ServiceAImpl", "LoggerInterface": "FileLogger" },
    }))
    .unwrap();

    let service = container.get("ServiceA").unwrap();
    let logger = container.get("LoggerInterface").unwrap();
    assert!(Arc::ptr_eq(
        &logger_of(&service),
        &logger.downcast::<Logger>().unwrap()
    ));
}

#[test]
fn test_entry_dependency_registered_ahead_of_order() {
    let container = apply(json!({
        "entries": { "ServiceA": "ServiceAImpl", "LoggerInterface": "FileLogger" },
    }))
    .unwrap();

    assert!(container.has_entry("LoggerInterface"));
    let first = logger_of(&container.get("ServiceA").unwrap());
    let second = logger_of(&container.get("ServiceA").unwrap());
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_bootstrap_lookup_ends_with_configuration() {
    let container = apply(json!({ "aliases": { "log": "Logger" } })).unwrap();

    let err = container.get("ServiceAImpl").unwrap_err();

    assert!(matches!(
        err.root_cause(),
        ContainerError::NotInstantiable(class) if class == "LoggerInterface"
    ));
}

#[test]
fn test_templating_engines() {
    let container = apply(json!({
        "templating_engines": { "twig": "TwigEngine" },
    }))
    .unwrap();

    assert!(container.has_singleton("TwigEngine"));
    assert!(container.has_alias("twig"));
    assert!(
        container
            .get("twig")
            .unwrap()
            .ptr_eq(&container.get("TwigEngine").unwrap())
    );
}

#[test]
fn test_templating_engine_capability() {
    let err = apply(json!({
        "templating_engines": { "plain": "PlainRenderer" },
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        ContainerError::Configuration(ConfigurationError::NotTemplatingEngine { .. })
    ));

    let container = Container::new(catalog());
    let configurator =
        Configurator::new(Configuration::new().templating_engine("plain", "PlainRenderer"))
            .with_templating_capability("Renderer");
    container.use_configurator(&configurator).unwrap();
    assert!(container.has_singleton("PlainRenderer"));
}

#[test]
fn test_templating_engine_listed_as_singleton_is_created_once() {
    let container = apply(json!({
        "templating_engines": { "twig": "TwigEngine" },
        "singletons": ["Page", "TwigEngine"],
    }))
    .unwrap();

    let engine = container.get("TwigEngine").unwrap();
    let page = container.get("Page").unwrap();
    assert!(page.downcast::<Page>().unwrap().engine.ptr_eq(&engine));
    assert!(container.get("twig").unwrap().ptr_eq(&engine));
}

#[test]
fn test_singleton_dependency_materialized_once() {
    let container = apply(json!({
        "singletons": ["Page", "TwigEngine"],
    }))
    .unwrap();

    let engine = container.get("TwigEngine").unwrap();
    let page = container.get("Page").unwrap();
    assert!(page.downcast::<Page>().unwrap().engine.ptr_eq(&engine));
}

#[test]
fn test_singleton_configured_as_alias() {
    let container = Container::new(catalog());
    let configurator = Configurator::from_value(json!({
        "aliases": { "Logger": "FileLogger" },
        "singletons": ["Logger"],
    }))
    .unwrap();

    assert!(matches!(
        container.use_configurator(&configurator),
        Err(ContainerError::Configuration(ConfigurationError::AliasedSingleton(id)))
            if id == "Logger"
    ));
    assert!(!container.has("Logger"));

    let err = apply(json!({
        "templating_engines": { "twig": "TwigEngine" },
        "singletons": { "twig": "TwigEngine" },
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        ContainerError::Configuration(ConfigurationError::AliasedSingleton(_))
    ));
}

#[test]
fn test_configuration_builder() {
    let logger = Object::new("Logger", Logger);
    let configuration = Configuration::new()
        .alias("log", "Logger")
        .singleton("Logger", Binding::instance(logger.clone()))
        .entry("ServiceA", Binding::redirect("ServiceAImpl"))
        .entry("LoggerInterface", Binding::redirect("FileLogger"));
    let container = Container::new(catalog());

    container
        .use_configurator(&Configurator::new(configuration))
        .unwrap();

    assert!(container.get("log").unwrap().ptr_eq(&logger));
    assert_eq!(container.get("ServiceA").unwrap().class(), "ServiceAImpl");
}

#[test]
fn test_validation_happens_before_registration() {
    let container = Container::new(catalog());
    let configurator = Configurator::from_value(json!({
        "aliases": { "log": "Logger" },
        "entries": { "ServiceA": "Missing" },
    }))
    .unwrap();

    let result = container.use_configurator(&configurator);

    assert!(matches!(
        result,
        Err(ContainerError::Configuration(ConfigurationError::UnknownClass { .. }))
    ));
    assert!(!container.has_alias("log"));
}

#[test]
fn test_configuration_errors_are_distinct() {
    let invalid = [
        json!([]),
        json!({}),
        json!({ "services": {} }),
        json!({ "aliases": [] }),
        json!({ "aliases": { "": "Logger" } }),
        json!({ "aliases": { "0": "Logger" } }),
        json!({ "aliases": { "log": 5 } }),
        json!({ "aliases": { "log": "" } }),
    ];
    let mut messages = HashSet::new();
    for config in invalid {
        let err = Configurator::from_value(config.clone()).unwrap_err();
        assert!(messages.insert(err.to_string()), "{config} repeats {err}");
    }

    let unknown = apply(json!({ "aliases": { "log": "Missing" } })).unwrap_err();
    match unknown {
        ContainerError::Configuration(err) => {
            assert!(matches!(err, ConfigurationError::UnknownClass { .. }));
            assert!(messages.insert(err.to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_deserialize_configuration() {
    let configuration: Configuration = serde_json::from_str(
        r#"{ "singletons": ["Logger"], "entries": { "ServiceA": "ServiceAImpl" } }"#,
    )
    .unwrap();

    assert_eq!(configuration.singletons().unwrap().len(), 1);
    assert!(matches!(
        configuration.entries().unwrap().get("ServiceA"),
        Some(Binding::Redirect(target)) if target == "ServiceAImpl"
    ));
    assert!(configuration.aliases().is_none());

    let err = serde_json::from_str::<Configuration>(r#"{ "unknown": {} }"#).unwrap_err();
    assert!(err.to_string().contains("unknown"));
}

#[test]
fn test_configuration_from_file() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        r#"
        {
            "aliases": { "log": "Logger" },
            "singletons": ["Logger"]
        }
        "#,
    )
    .unwrap();

    let container = Container::new(catalog());
    container
        .use_configurator(&Configurator::from_file(file.path()).unwrap())
        .unwrap();

    assert!(container.has_singleton("log"));
}

#[test]
fn test_configuration_file_errors() {
    assert!(matches!(
        Configuration::parse_file(""),
        Err(ConfigurationError::EmptyPath)
    ));
    assert!(matches!(
        Configuration::parse_file("nonexistent_container.json"),
        Err(ConfigurationError::FileNotFound(_))
    ));

    let empty = NamedTempFile::new().unwrap();
    assert!(matches!(
        Configuration::parse_file(empty.path()),
        Err(ConfigurationError::Empty)
    ));

    let invalid = NamedTempFile::new().unwrap();
    fs::write(invalid.path(), r#"{ "aliases": json }"#).unwrap();
    assert!(matches!(
        Configuration::parse_file(invalid.path()),
        Err(ConfigurationError::Parse { .. })
    ));
}
