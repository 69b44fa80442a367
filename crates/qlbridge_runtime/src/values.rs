//! Conversions between literals, JSON values and schema types.
//!
//! Input coercion turns variables and argument literals into the JSON
//! values resolvers see; result serialization checks what resolvers
//! return for scalar and enum fields.

use crate::schema::{Schema, TypeDef, TypeRef};
use qlbridge_syntax as ast;
use serde_json::{Map, Number, Value};

/// Converts a constant literal to JSON. Enum values become strings.
#[must_use]
pub fn const_value(value: &ast::Value) -> Value {
    value_from_ast(value, &Map::new())
}

/// Converts a literal to JSON, substituting variables. Unknown variables
/// become `null`.
#[must_use]
pub fn value_from_ast(value: &ast::Value, variables: &Map<String, Value>) -> Value {
    match value {
        ast::Value::Variable(name) => variables.get(&name.value).cloned().unwrap_or(Value::Null),
        ast::Value::Int(i, _) => Value::from(*i),
        ast::Value::Float(f, _) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        ast::Value::String(s, _) => Value::String(s.clone()),
        ast::Value::Boolean(b, _) => Value::Bool(*b),
        ast::Value::Null(_) => Value::Null,
        ast::Value::Enum(name) => Value::String(name.value.clone()),
        ast::Value::List(items, _) => Value::Array(
            items
                .iter()
                .map(|item| value_from_ast(item, variables))
                .collect(),
        ),
        ast::Value::Object(fields, _) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.value.clone(), value_from_ast(value, variables)))
                .collect(),
        ),
    }
}

fn inspect(value: &Value) -> String {
    value.to_string()
}

/// Coerces a variable value supplied as JSON against its declared type.
pub fn coerce_input(schema: &Schema, ty: &TypeRef, value: &Value) -> Result<Value, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("Expected non-nullable type \"{ty}\" not to be null."));
            }
            coerce_input(schema, inner, value)
        }
        _ if value.is_null() => Ok(Value::Null),
        TypeRef::List(inner) => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_input(schema, inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            // A single item is accepted where a list is expected.
            single => Ok(Value::Array(vec![coerce_input(schema, inner, single)?])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(TypeDef::Scalar(_)) => parse_scalar(name, value),
            Some(TypeDef::Enum(def)) => match value {
                Value::String(s) if def.has_value(s) => Ok(value.clone()),
                _ => Err(format!(
                    "Value {} does not exist in \"{name}\" enum.",
                    inspect(value)
                )),
            },
            Some(TypeDef::InputObject(def)) => {
                let Value::Object(fields) = value else {
                    return Err(format!(
                        "Expected type \"{name}\" to be an object, found {}.",
                        inspect(value)
                    ));
                };
                if let Some(unknown) = fields.keys().find(|k| !def.fields.contains_key(*k)) {
                    return Err(format!(
                        "Field \"{unknown}\" is not defined by type \"{name}\"."
                    ));
                }
                let mut coerced = Map::new();
                for (field_name, field) in &def.fields {
                    match fields.get(field_name) {
                        Some(v) => {
                            let v = coerce_input(schema, &field.ty, v).map_err(|e| {
                                format!("In field \"{field_name}\": {e}")
                            })?;
                            coerced.insert(field_name.clone(), v);
                        }
                        None => {
                            if let Some(default) = &field.default_value {
                                coerced.insert(field_name.clone(), default.clone());
                            } else if field.ty.is_non_null() {
                                return Err(format!(
                                    "Field \"{field_name}\" of required type \"{}\" was not provided.",
                                    field.ty
                                ));
                            }
                        }
                    }
                }
                Ok(Value::Object(coerced))
            }
            _ => Err(format!("Type \"{name}\" is not an input type.")),
        },
    }
}

/// Coerces an argument literal against its declared type. Returns `None`
/// when the literal is a variable that was not provided, so the caller can
/// fall back to the argument's default.
pub fn coerce_literal(
    schema: &Schema,
    ty: &TypeRef,
    value: &ast::Value,
    variables: &Map<String, Value>,
) -> Result<Option<Value>, String> {
    if let ast::Value::Variable(name) = value {
        return match variables.get(&name.value) {
            Some(v) if v.is_null() && ty.is_non_null() => Err(format!(
                "Expected non-nullable type \"{ty}\" not to be null."
            )),
            Some(v) => Ok(Some(v.clone())),
            None => Ok(None),
        };
    }
    let coerced = match ty {
        TypeRef::NonNull(inner) => {
            if matches!(value, ast::Value::Null(_)) {
                return Err(format!("Expected value of type \"{ty}\", found null."));
            }
            return coerce_literal(schema, inner, value, variables);
        }
        _ if matches!(value, ast::Value::Null(_)) => Value::Null,
        TypeRef::List(inner) => match value {
            ast::Value::List(items, _) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(coerce_literal(schema, inner, item, variables)?.unwrap_or(Value::Null));
                }
                Value::Array(out)
            }
            single => Value::Array(vec![
                coerce_literal(schema, inner, single, variables)?.unwrap_or(Value::Null),
            ]),
        },
        TypeRef::Named(name) => match (schema.get_type(name), value) {
            (Some(TypeDef::Enum(def)), ast::Value::Enum(v)) if def.has_value(&v.value) => {
                Value::String(v.value.clone())
            }
            (Some(TypeDef::Enum(_)), _) => {
                return Err(format!(
                    "Enum \"{name}\" cannot represent non-enum value: {}.",
                    ast::print_value(value)
                ))
            }
            (Some(TypeDef::InputObject(def)), ast::Value::Object(fields, _)) => {
                let mut coerced = Map::new();
                for (field_name, _) in fields {
                    if !def.fields.contains_key(&field_name.value) {
                        return Err(format!(
                            "Field \"{field_name}\" is not defined by type \"{name}\"."
                        ));
                    }
                }
                for (field_name, field) in &def.fields {
                    let provided = fields
                        .iter()
                        .find(|(n, _)| n.value == *field_name)
                        .map(|(_, v)| v);
                    let value = match provided {
                        Some(v) => coerce_literal(schema, &field.ty, v, variables)?,
                        None => None,
                    };
                    match value.or_else(|| field.default_value.clone()) {
                        Some(v) => {
                            coerced.insert(field_name.clone(), v);
                        }
                        None if field.ty.is_non_null() => {
                            return Err(format!(
                                "Field \"{name}.{field_name}\" of required type \"{}\" was not provided.",
                                field.ty
                            ));
                        }
                        None => {}
                    }
                }
                Value::Object(coerced)
            }
            (Some(TypeDef::InputObject(_)), _) => {
                return Err(format!(
                    "Expected value of type \"{name}\", found {}.",
                    ast::print_value(value)
                ))
            }
            (Some(TypeDef::Scalar(_)), literal) => {
                let json = value_from_ast(literal, variables);
                // Literals keep their lexical kind: `"1"` is not an Int.
                let kind_matches = match name.as_str() {
                    "Int" => matches!(literal, ast::Value::Int(..)),
                    "Float" => matches!(literal, ast::Value::Int(..) | ast::Value::Float(..)),
                    "String" => matches!(literal, ast::Value::String(..)),
                    "Boolean" => matches!(literal, ast::Value::Boolean(..)),
                    "ID" => matches!(literal, ast::Value::String(..) | ast::Value::Int(..)),
                    _ => true,
                };
                if !kind_matches {
                    return Err(format!(
                        "{name} cannot represent value: {}",
                        ast::print_value(literal)
                    ));
                }
                parse_scalar(name, &json)?
            }
            _ => return Err(format!("Type \"{name}\" is not an input type.")),
        },
    };
    Ok(Some(coerced))
}

/// The integer a float without a fractional part stands for.
fn whole_number(value: &Value) -> Option<i64> {
    let f = value.as_f64()?;
    #[allow(clippy::cast_possible_truncation)]
    (f.fract() == 0.0 && f.abs() < 9.0e15).then(|| f as i64)
}

/// Accepts an input value for a scalar type.
fn parse_scalar(name: &str, value: &Value) -> Result<Value, String> {
    match name {
        // Whole-number floats such as `3.0` are integers.
        "Int" => match value.as_i64().or_else(|| whole_number(value)) {
            Some(i) if i32::try_from(i).is_ok() => Ok(Value::from(i)),
            Some(_) => Err(format!(
                "Int cannot represent non 32-bit signed integer value: {}",
                inspect(value)
            )),
            None => Err(format!(
                "Int cannot represent non-integer value: {}",
                inspect(value)
            )),
        },
        "Float" => match value {
            Value::Number(_) => Ok(value.clone()),
            _ => Err(format!(
                "Float cannot represent non numeric value: {}",
                inspect(value)
            )),
        },
        "String" => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(format!(
                "String cannot represent a non string value: {}",
                inspect(value)
            )),
        },
        "Boolean" => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(format!(
                "Boolean cannot represent a non boolean value: {}",
                inspect(value)
            )),
        },
        "ID" => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
            _ => Err(format!("ID cannot represent value: {}", inspect(value))),
        },
        _ => Ok(value.clone()),
    }
}

/// Serializes a resolved value for a leaf type.
pub fn serialize_leaf(def: &TypeDef, value: &Value) -> Result<Value, String> {
    match def {
        TypeDef::Enum(e) => match value {
            Value::String(s) if e.has_value(s) => Ok(value.clone()),
            _ => Err(format!(
                "Enum \"{}\" cannot represent value: {}",
                e.name,
                inspect(value)
            )),
        },
        TypeDef::Scalar(s) => serialize_scalar(&s.name, value),
        other => Err(format!("Type \"{}\" is not a leaf type.", other.name())),
    }
}

fn serialize_scalar(name: &str, value: &Value) -> Result<Value, String> {
    let numeric = |value: &Value| -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) if !s.is_empty() => s.trim().parse().ok(),
            _ => None,
        }
    };
    match name {
        "Int" => {
            if let Some(i) = value.as_i64() {
                return if i32::try_from(i).is_ok() {
                    Ok(Value::from(i))
                } else {
                    Err(format!(
                        "Int cannot represent non 32-bit signed integer value: {}",
                        inspect(value)
                    ))
                };
            }
            match numeric(value) {
                #[allow(clippy::cast_possible_truncation)]
                Some(f) if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) => {
                    Ok(Value::from(f as i64))
                }
                _ => Err(format!(
                    "Int cannot represent non-integer value: {}",
                    inspect(value)
                )),
            }
        }
        "Float" => match numeric(value).and_then(Number::from_f64) {
            Some(_) if value.is_number() => Ok(value.clone()),
            Some(n) => Ok(Value::Number(n)),
            None => Err(format!(
                "Float cannot represent non numeric value: {}",
                inspect(value)
            )),
        },
        "String" => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(format!(
                "String cannot represent value: {}",
                inspect(value)
            )),
        },
        "Boolean" => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
            _ => Err(format!(
                "Boolean cannot represent a non boolean value: {}",
                inspect(value)
            )),
        },
        "ID" => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
            _ => Err(format!("ID cannot represent value: {}", inspect(value))),
        },
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::parse(
            r#"
            enum Order { NEWEST OLDEST }
            input Filter { tag: String!, limit: Int = 5 }
            type Query { a: Int }
            "#,
        )
        .unwrap()
    }

    fn ty(source: &str) -> TypeRef {
        // Borrow the parser for type syntax via a throwaway field.
        let document = ast::parse_document(&format!("type T {{ f: {source} }}")).unwrap();
        let ast::Definition::Type(ast::TypeDefinition::Object(object)) = &document.definitions[0]
        else {
            panic!("expected object");
        };
        TypeRef::from_ast(&object.fields[0].ty)
    }

    fn literal(source: &str) -> ast::Value {
        let document = ast::parse_document(&format!("{{ f(a: {source}) }}")).unwrap();
        let ast::Definition::Operation(op) = &document.definitions[0] else {
            panic!("expected operation");
        };
        let ast::Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        field.arguments[0].value.clone()
    }

    #[test]
    fn test_const_value() {
        assert_eq!(
            const_value(&literal(r#"{ a: [1, 2.5, "x", true, null, RED] }"#)),
            json!({"a": [1, 2.5, "x", true, null, "RED"]})
        );
    }

    #[test]
    fn test_coerce_input_scalars() {
        let schema = schema();
        assert_eq!(coerce_input(&schema, &ty("ID"), &json!(7)), Ok(json!("7")));
        assert_eq!(coerce_input(&schema, &ty("Float"), &json!(1)), Ok(json!(1)));
        assert_eq!(
            coerce_input(&schema, &ty("Int"), &json!(1.5)),
            Err("Int cannot represent non-integer value: 1.5".to_string())
        );
        assert_eq!(
            coerce_input(&schema, &ty("String!"), &Value::Null),
            Err("Expected non-nullable type \"String!\" not to be null.".to_string())
        );
        assert_eq!(coerce_input(&schema, &ty("[Int]"), &json!(3)), Ok(json!([3])));
    }

    #[test]
    fn test_coerce_input_whole_float_as_int() {
        let schema = schema();
        assert_eq!(coerce_input(&schema, &ty("Int"), &json!(3.0)), Ok(json!(3)));
        assert_eq!(coerce_input(&schema, &ty("Int!"), &json!(-7.0)), Ok(json!(-7)));
        assert_eq!(
            coerce_input(&schema, &ty("Int"), &json!(4_294_967_296.0)),
            Err("Int cannot represent non 32-bit signed integer value: 4294967296.0".to_string())
        );
    }

    #[test]
    fn test_coerce_input_objects_and_enums() {
        let schema = schema();
        assert_eq!(
            coerce_input(&schema, &ty("Filter"), &json!({"tag": "rust"})),
            Ok(json!({"tag": "rust", "limit": 5}))
        );
        assert!(coerce_input(&schema, &ty("Filter"), &json!({})).is_err());
        assert!(coerce_input(&schema, &ty("Filter"), &json!({"tag": "a", "x": 1})).is_err());
        assert_eq!(coerce_input(&schema, &ty("Order"), &json!("OLDEST")), Ok(json!("OLDEST")));
        assert!(coerce_input(&schema, &ty("Order"), &json!("RANDOM")).is_err());
    }

    #[test]
    fn test_coerce_literal() {
        let schema = schema();
        let vars: Map<String, Value> = [("n".to_string(), json!(3))].into_iter().collect();

        assert_eq!(
            coerce_literal(&schema, &ty("Int"), &literal("$n"), &vars),
            Ok(Some(json!(3)))
        );
        assert_eq!(coerce_literal(&schema, &ty("Int"), &literal("$missing"), &vars), Ok(None));
        assert_eq!(
            coerce_literal(&schema, &ty("Order"), &literal("NEWEST"), &vars),
            Ok(Some(json!("NEWEST")))
        );
        assert!(coerce_literal(&schema, &ty("Order"), &literal("\"NEWEST\""), &vars).is_err());
        assert!(coerce_literal(&schema, &ty("Int"), &literal("\"1\""), &vars).is_err());
        assert!(coerce_literal(&schema, &ty("Int"), &literal("3.0"), &vars).is_err());
        assert_eq!(
            coerce_literal(&schema, &ty("Filter"), &literal("{ tag: \"x\", limit: $n }"), &vars),
            Ok(Some(json!({"tag": "x", "limit": 3})))
        );
        assert_eq!(
            coerce_literal(&schema, &ty("[ID]"), &literal("[1, \"b\"]"), &vars),
            Ok(Some(json!(["1", "b"])))
        );
    }

    #[test]
    fn test_serialize_leaf() {
        let schema = schema();
        let leaf = |name: &str, value: Value| serialize_leaf(schema.get_type(name).unwrap(), &value);

        assert_eq!(leaf("Int", json!(2.0)), Ok(json!(2)));
        assert_eq!(leaf("Int", json!(true)), Ok(json!(1)));
        assert!(leaf("Int", json!("abc")).is_err());
        assert_eq!(leaf("String", json!(12)), Ok(json!("12")));
        assert_eq!(leaf("ID", json!(12)), Ok(json!("12")));
        assert_eq!(leaf("Boolean", json!(0)), Ok(json!(false)));
        assert_eq!(leaf("Float", json!("1.5")), Ok(json!(1.5)));
        assert_eq!(leaf("Order", json!("NEWEST")), Ok(json!("NEWEST")));
        assert_eq!(
            leaf("Order", json!("RANDOM")),
            Err("Enum \"Order\" cannot represent value: \"RANDOM\"".to_string())
        );
    }
}
