use alloc::{
    boxed::Box,
    collections::{BTreeMap, VecDeque},
    string::String,
    vec::Vec,
};

use crate::{
    catalog::{Catalog, ParamSpec, TypeHint},
    errors::{ArgumentsErrorKind, ResolveErrorKind},
    value::Value,
};

/// Supplied arguments for a construction or invocation: positional by index
/// or associative by name, never mixed.
#[derive(Clone, Debug)]
pub enum Arguments {
    Positional(Vec<Value>),
    Named(BTreeMap<String, Value>),
}

impl Default for Arguments {
    fn default() -> Self {
        Self::none()
    }
}

impl Arguments {
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::Positional(Vec::new())
    }

    #[must_use]
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self::Positional(values.into_iter().collect())
    }

    #[must_use]
    pub fn named<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Named(pairs.into_iter().map(|(name, value)| (name.into(), value)).collect())
    }
}

/// The resolution-facing slice of the container contract: `has` reports a
/// type as resolvable, `get` resolves it.
pub trait Lookup {
    fn has(&self, type_name: &str) -> bool;

    fn get(&self, type_name: &str) -> Result<Value, ResolveErrorKind>;
}

/// Maps formal parameters plus supplied arguments to the final ordered
/// argument list.
///
/// Per parameter, in declaration order: a variadic tail drains every
/// remaining positional value; a named argument wins outright; class-typed
/// hints resolve through the lookup; a parameter left unfilled that carries
/// no code default consumes the next positional value; the rest fall back
/// to default, then null when nullable, then the zero value of the first
/// builtin hint. Every supplied value is shape-checked against the declared
/// types, unconditionally.
pub fn resolve_arguments(
    params: &[ParamSpec],
    arguments: &Arguments,
    lookup: Option<&dyn Lookup>,
    catalog: &Catalog,
) -> Result<Vec<Value>, ArgumentsErrorKind> {
    let mut queue: VecDeque<Value> = match arguments {
        Arguments::Positional(values) => values.iter().cloned().collect(),
        Arguments::Named(_) => VecDeque::new(),
    };

    let mut resolved = Vec::with_capacity(params.len());
    for param in params {
        if param.variadic {
            let mut rest = Vec::with_capacity(queue.len());
            while let Some(value) = queue.pop_front() {
                check_supplied(param, &value, catalog)?;
                rest.push(value);
            }
            resolved.push(Value::List(rest));
            break;
        }

        if let Arguments::Named(named) = arguments {
            if let Some(value) = named.get(param.name) {
                check_supplied(param, value, catalog)?;
                resolved.push(value.clone());
                continue;
            }
        }

        if let Some(value) = lookup_scan(param, lookup)? {
            resolved.push(value);
            continue;
        }

        if param.default.is_none() {
            if let Some(value) = queue.pop_front() {
                check_supplied(param, &value, catalog)?;
                resolved.push(value);
                continue;
            }
        }

        resolved.push(fallback_value(param)?);
    }

    Ok(resolved)
}

fn lookup_scan(param: &ParamSpec, lookup: Option<&dyn Lookup>) -> Result<Option<Value>, ArgumentsErrorKind> {
    let Some(lookup) = lookup else { return Ok(None) };
    for hint in &param.hints {
        let TypeHint::Class(type_name) = *hint else { continue };
        if lookup.has(type_name) {
            return match lookup.get(type_name) {
                Ok(value) => Ok(Some(value)),
                Err(err) => Err(ArgumentsErrorKind::Lookup {
                    parameter: param.name,
                    type_name,
                    cause: Box::new(err),
                }),
            };
        }
    }
    Ok(None)
}

/// Default, then null when nullable, then the zero value of the first
/// builtin hint; a parameter with none of those is unresolvable.
pub(crate) fn fallback_value(param: &ParamSpec) -> Result<Value, ArgumentsErrorKind> {
    if let Some(default) = &param.default {
        return Ok(default.clone());
    }
    if param.nullable {
        return Ok(Value::Null);
    }
    if let Some(zero) = param.hints.iter().find_map(|hint| zero_value(*hint)) {
        return Ok(zero);
    }
    Err(ArgumentsErrorKind::Unresolved { parameter: param.name })
}

fn zero_value(hint: TypeHint) -> Option<Value> {
    match hint {
        TypeHint::Bool => Some(Value::Bool(false)),
        TypeHint::Int => Some(Value::Int(0)),
        TypeHint::Float => Some(Value::Float(0.0)),
        TypeHint::Str => Some(Value::Str(String::new())),
        TypeHint::List => Some(Value::List(Vec::new())),
        TypeHint::Class(_) => None,
    }
}

/// Verifies a supplied value against the declared types. For a variadic
/// parameter both a whole pack (a list) and a single element are accepted.
pub(crate) fn check_supplied(param: &ParamSpec, value: &Value, catalog: &Catalog) -> Result<(), ArgumentsErrorKind> {
    let ok = if param.variadic {
        match value {
            Value::List(items) => items.iter().all(|item| matches_hints(item, param, catalog)),
            other => matches_hints(other, param, catalog),
        }
    } else {
        matches_hints(value, param, catalog)
    };

    if ok {
        Ok(())
    } else {
        Err(ArgumentsErrorKind::TypeMismatch {
            parameter: param.name,
            expected: expected_labels(param),
            actual: value.type_label(),
        })
    }
}

fn matches_hints(value: &Value, param: &ParamSpec, catalog: &Catalog) -> bool {
    if value.is_null() {
        return param.nullable;
    }
    param.hints.iter().any(|hint| matches_hint(value, *hint, catalog))
}

fn matches_hint(value: &Value, hint: TypeHint, catalog: &Catalog) -> bool {
    match (hint, value) {
        (TypeHint::Bool, Value::Bool(_))
        | (TypeHint::Int, Value::Int(_))
        | (TypeHint::Float, Value::Float(_) | Value::Int(_))
        | (TypeHint::Str, Value::Str(_))
        | (TypeHint::List, Value::List(_)) => true,
        (TypeHint::Class(name), Value::Object(object)) => catalog.is_a(object.type_name(), name),
        _ => false,
    }
}

fn expected_labels(param: &ParamSpec) -> String {
    let labels: Vec<&str> = param.hints.iter().map(|hint| hint.label()).collect();
    labels.join(" | ")
}
