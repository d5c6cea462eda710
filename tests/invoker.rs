#![no_std]

extern crate alloc;

use alloc::{string::String, vec, vec::Vec};

use bindery::{
    Arguments, Callable, Catalog, Container, InstantiateErrorKind, InvokeErrorKind, Invoker, ParamSpec, Registry,
    TypeHint, TypeMeta, Value,
};

struct Mailer;

struct Report {
    recipient: String,
    format: String,
    attachments: Vec<String>,
}

fn catalog() -> Catalog {
    Catalog::builder()
        .interface("Transport")
        .class(
            TypeMeta::new("Mailer")
                .implements(&["Transport"])
                .constructor(|_args: Vec<Value>| Ok::<_, InstantiateErrorKind>(Value::object("Mailer", Mailer))),
        )
        .class(
            TypeMeta::new("Report")
                .param(ParamSpec::new("recipient", TypeHint::Str))
                .param(ParamSpec::new("format", TypeHint::Str).default_value("pdf"))
                .constructor(|args: Vec<Value>| {
                    Ok::<_, InstantiateErrorKind>(Value::object(
                        "Report",
                        Report {
                            recipient: String::from(args[0].as_str().unwrap_or_default()),
                            format: String::from(args[1].as_str().unwrap_or_default()),
                            attachments: Vec::new(),
                        },
                    ))
                }),
        )
        .build()
}

#[test]
fn test_invoke_mixes_lookup_defaults_and_variadic_tail() {
    let container = Container::new(Registry::new(catalog()));
    let invoker = Invoker::with_container(container);

    let callable = Callable::new(
        vec![
            ParamSpec::new("transport", TypeHint::Class("Mailer")),
            ParamSpec::new("format", TypeHint::Str).default_value("pdf"),
            ParamSpec::new("extra", TypeHint::Str).variadic(),
        ],
        |args: Vec<Value>| {
            assert!(args[0].downcast::<Mailer>().is_some());
            assert_eq!(args[1], Value::from("pdf"));
            assert_eq!(args[2], Value::List(vec![Value::from("x"), Value::from("y")]));
            Ok::<_, InstantiateErrorKind>(Value::Bool(true))
        },
    );

    let result = invoker
        .invoke(&callable, &Arguments::positional([Value::from("x"), Value::from("y")]))
        .unwrap();
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn test_invoke_without_container_uses_zero_values() {
    let invoker = Invoker::new(catalog());

    let callable = Callable::new(
        vec![ParamSpec::new("label", TypeHint::Str)],
        |args: Vec<Value>| Ok::<_, InstantiateErrorKind>(args[0].clone()),
    );

    let result = invoker.invoke(&callable, &Arguments::none()).unwrap();
    assert_eq!(result, Value::Str(String::new()));
}

#[test]
fn test_make_with_named_arguments() {
    let invoker = Invoker::new(catalog());

    let report = invoker
        .make("Report", &Arguments::named([("recipient", Value::from("ops@example.com"))]))
        .unwrap()
        .downcast::<Report>()
        .unwrap();

    assert_eq!(report.recipient, "ops@example.com");
    assert_eq!(report.format, "pdf");
    assert!(report.attachments.is_empty());
}

#[test]
fn test_make_rejects_mismatched_named_argument() {
    let invoker = Invoker::new(catalog());

    assert!(matches!(
        invoker.make("Report", &Arguments::named([("recipient", Value::Bool(false))])),
        Err(InvokeErrorKind::Arguments(_))
    ));
}

#[test]
fn test_make_unknown_type_fails() {
    let invoker = Invoker::new(catalog());

    assert!(matches!(
        invoker.make("Spreadsheet", &Arguments::none()),
        Err(InvokeErrorKind::UnknownType { .. })
    ));
}

#[test]
fn test_make_abstract_goes_through_a_forked_container() {
    let mut registry = Registry::new(catalog());
    registry.bind("Mailer", Some("Transport")).unwrap();

    let container = Container::new(registry);
    let invoker = Invoker::with_container(container.clone());

    let made = invoker.make("Transport", &Arguments::none()).unwrap();
    assert!(made.downcast::<Mailer>().is_some());

    // The caller's cache stays untouched: resolving through the container
    // afterwards builds its own instance.
    let resolved = container.get("Transport").unwrap();
    assert!(!resolved.as_object().unwrap().ptr_eq(made.as_object().unwrap()));
}

#[test]
fn test_make_abstract_without_container_fails() {
    let invoker = Invoker::new(catalog());

    assert!(matches!(
        invoker.make("Transport", &Arguments::none()),
        Err(InvokeErrorKind::AbstractTarget { .. })
    ));
}
