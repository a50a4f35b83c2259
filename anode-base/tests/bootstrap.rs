use std::fs;
use std::sync::Arc;

use anode::{ContainerError, Parameter, TypeCatalog, TypeDescriptor};
use anode_base::{Config, bootstrap};
use tempfile::NamedTempFile;

struct Logger;

struct ServiceAImpl {
    logger: Arc<Logger>,
}

fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(TypeDescriptor::class("Logger").construct(|_| Ok(Logger)))
        .with(TypeDescriptor::interface("ServiceA"))
        .with(
            TypeDescriptor::class("ServiceAImpl")
                .implements("ServiceA")
                .param(Parameter::new("logger").typed("Logger"))
                .construct(|args| {
                    Ok(ServiceAImpl {
                        logger: args.instance("logger")?,
                    })
                }),
        )
}

#[test]
fn test_bootstrap_applies_container_section() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        r#"
        {
            "tracing": { "level": "debug", "directives": ["anode=trace"] },
            "container": {
                "singletons": ["Logger"],
                "entries": { "ServiceA": "ServiceAImpl" }
            }
        }
        "#,
    )
    .unwrap();
    let config = Config::parse_file(file.path()).unwrap();

    let container = bootstrap(&config, catalog()).unwrap();

    let first = container.get("ServiceA").unwrap();
    let second = container.get("ServiceA").unwrap();
    let logger = container.get("Logger").unwrap().downcast::<Logger>().unwrap();
    assert!(!first.ptr_eq(&second));
    for service in [first, second] {
        let service = service.downcast::<ServiceAImpl>().unwrap();
        assert!(Arc::ptr_eq(&service.logger, &logger));
    }
}

#[test]
fn test_bootstrap_without_container_section() {
    let config = Config::new().with("name", "app");

    let container = bootstrap(&config, catalog()).unwrap();

    assert!(!container.has("Logger"));
    assert!(container.get("Logger").is_ok());
}

#[test]
fn test_bootstrap_rejects_invalid_configuration() {
    let config = Config::parse(r#"{ "container": { "entries": { "ServiceA": "Missing" } } }"#)
        .unwrap();

    let err = bootstrap(&config, catalog()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ContainerError>(),
        Some(ContainerError::Configuration(_))
    ));
}

#[test]
fn test_bootstrap_rejects_malformed_section() {
    let config = Config::parse(r#"{ "container": [] }"#).unwrap();

    assert!(bootstrap(&config, catalog()).is_err());
}
