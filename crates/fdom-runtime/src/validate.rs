#![forbid(unsafe_code)]

//! Declarative prop schemas.
//!
//! A [`PropSchema`] lists the props a component accepts. Factories validate
//! initial props against it and seed defaults; updates validate their delta.
//! A `null` value counts as absent for optional props and as missing for
//! required ones.

use fdom_core::{PropError, Props};
use serde_json::Value;

/// Accepted shape of a single prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Any,
    String,
    Bool,
    Number,
    Array,
    Object,
    /// A string drawn from a fixed set.
    OneOf(&'static [&'static str]),
}

impl PropKind {
    fn describe(self) -> &'static str {
        match self {
            Self::Any => "any value",
            Self::String | Self::OneOf(_) => "a string",
            Self::Bool => "a boolean",
            Self::Number => "a number",
            Self::Array => "an array",
            Self::Object => "an object",
        }
    }

    fn check(self, prop: &str, value: &Value) -> Result<(), PropError> {
        let ok = match self {
            Self::Any => true,
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::OneOf(allowed) => {
                let Some(s) = value.as_str() else {
                    return Err(PropError::wrong_type(prop, self.describe(), value));
                };
                if allowed.contains(&s) {
                    return Ok(());
                }
                return Err(PropError::InvalidValue {
                    prop: prop.to_owned(),
                    allowed: allowed.iter().map(|a| (*a).to_owned()).collect(),
                    found: value.to_string(),
                });
            }
        };
        if ok {
            Ok(())
        } else {
            Err(PropError::wrong_type(prop, self.describe(), value))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropDecl {
    pub name: &'static str,
    pub kind: PropKind,
    pub required: bool,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropSchema {
    decls: Vec<PropDecl>,
}

impl PropSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn required(self, name: &'static str, kind: PropKind) -> Self {
        self.declare(PropDecl {
            name,
            kind,
            required: true,
            default: None,
        })
    }

    #[must_use]
    pub fn optional(self, name: &'static str, kind: PropKind) -> Self {
        self.declare(PropDecl {
            name,
            kind,
            required: false,
            default: None,
        })
    }

    /// Optional prop seeded with `default` when absent.
    #[must_use]
    pub fn with_default(self, name: &'static str, kind: PropKind, default: impl Into<Value>) -> Self {
        self.declare(PropDecl {
            name,
            kind,
            required: false,
            default: Some(default.into()),
        })
    }

    #[must_use]
    pub fn declare(mut self, decl: PropDecl) -> Self {
        self.decls.retain(|d| d.name != decl.name);
        self.decls.push(decl);
        self
    }

    #[must_use]
    pub fn decls(&self) -> &[PropDecl] {
        &self.decls
    }

    fn decl(&self, name: &str) -> Option<&PropDecl> {
        self.decls.iter().find(|d| d.name == name)
    }

    fn check_present(&self, props: &Props, strict: bool) -> Result<(), PropError> {
        for (name, value) in props.iter() {
            match self.decl(name) {
                Some(decl) if value.is_null() => {
                    if decl.required {
                        return Err(PropError::Missing {
                            prop: name.to_owned(),
                        });
                    }
                }
                Some(decl) => decl.kind.check(name, value)?,
                None if strict => {
                    return Err(PropError::Unknown {
                        prop: name.to_owned(),
                        known: self.decls.iter().map(|d| d.name.to_owned()).collect(),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Validate a complete prop set.
    pub fn validate(&self, props: &Props, strict: bool) -> Result<(), PropError> {
        if let Some(missing) = self
            .decls
            .iter()
            .find(|d| d.required && props.get(d.name).is_none_or(Value::is_null))
        {
            return Err(PropError::Missing {
                prop: missing.name.to_owned(),
            });
        }
        self.check_present(props, strict)
    }

    /// Validate an update delta: only the keys it carries are checked.
    pub fn validate_delta(&self, delta: &Props, strict: bool) -> Result<(), PropError> {
        self.check_present(delta, strict)
    }

    /// Fill in defaults for absent or null props.
    pub fn apply_defaults(&self, props: &mut Props) {
        for decl in &self.decls {
            if let Some(default) = &decl.default {
                if props.get(decl.name).is_none_or(Value::is_null) {
                    props.set(decl.name, default.clone());
                }
            }
        }
    }

    /// Validate `initial` and return a seeded copy with defaults applied.
    pub fn seed(&self, initial: &Props, strict: bool) -> Result<Props, PropError> {
        self.validate(initial, strict)?;
        let mut state = initial.clone();
        self.apply_defaults(&mut state);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdom_core::props;

    const SIZES: &[&str] = &["sm", "md", "lg"];

    fn schema() -> PropSchema {
        PropSchema::new()
            .required("items", PropKind::Array)
            .with_default("multiple", PropKind::Bool, false)
            .with_default("size", PropKind::OneOf(SIZES), "md")
            .optional("class", PropKind::String)
    }

    #[test]
    fn seed_applies_defaults_without_touching_input() {
        let initial = props!({ "items": [] });
        let state = schema().seed(&initial, false).unwrap();
        assert_eq!(initial.len(), 1);
        assert_eq!(state.get("multiple"), Some(&Value::Bool(false)));
        assert_eq!(state.str("size").unwrap(), "md");
    }

    #[test]
    fn missing_required_prop() {
        let err = schema().seed(&props!({ "multiple": true }), false).unwrap_err();
        assert_eq!(err, PropError::Missing { prop: "items".into() });
        let err = schema().seed(&props!({ "items": null }), false).unwrap_err();
        assert_eq!(err, PropError::Missing { prop: "items".into() });
    }

    #[test]
    fn wrong_type_is_precise() {
        let err = schema()
            .validate(&props!({ "items": [], "multiple": "yes" }), false)
            .unwrap_err();
        assert_eq!(err.to_string(), "prop `multiple` must be a boolean, found a string");
    }

    #[test]
    fn enum_values_are_checked() {
        let err = schema()
            .validate(&props!({ "items": [], "size": "xl" }), false)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "prop `size` must be one of [sm, md, lg], found \"xl\""
        );
    }

    #[test]
    fn strict_mode_rejects_unknown_props() {
        let props = props!({ "items": [], "itmes": [] });
        assert!(schema().validate(&props, false).is_ok());
        assert!(matches!(
            schema().validate(&props, true),
            Err(PropError::Unknown { prop, .. }) if prop == "itmes"
        ));
    }

    #[test]
    fn delta_checks_only_carried_keys() {
        assert!(schema().validate_delta(&props!({ "multiple": true }), false).is_ok());
        assert_eq!(
            schema().validate_delta(&props!({ "items": null }), false),
            Err(PropError::Missing { prop: "items".into() })
        );
        assert!(schema().validate_delta(&props!({ "class": null }), false).is_ok());
    }

    #[test]
    fn redeclaring_replaces() {
        let schema = PropSchema::new()
            .required("a", PropKind::String)
            .optional("a", PropKind::Number);
        assert_eq!(schema.decls().len(), 1);
        assert!(!schema.decls()[0].required);
    }
}
