//! Field sets, the selection syntax used by `@key`, `@provides` and `@requires`

use std::fmt;

use async_graphql_parser::{types as ast, Positioned};
use serde_json::{Map, Value};

use crate::ConfigurationError;

/// A set of fields, e.g. `id organization { id name }`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldSet(pub Vec<Selection>);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Selection {
    pub field: String,
    pub selections: Vec<Selection>,
}

impl Selection {
    pub fn field(field: impl Into<String>) -> Self {
        Selection {
            field: field.into(),
            selections: vec![],
        }
    }

    pub fn nested(field: impl Into<String>, selections: impl IntoIterator<Item = Selection>) -> Self {
        Selection {
            field: field.into(),
            selections: selections.into_iter().collect(),
        }
    }
}

impl FieldSet {
    pub fn new(selections: impl IntoIterator<Item = Selection>) -> Self {
        FieldSet(selections.into_iter().collect())
    }

    /// Parses a field set string.
    ///
    /// Only plain fields are accepted: no aliases, arguments, directives or fragments.
    pub fn parse(input: &str) -> Result<FieldSet, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidFieldSet {
            input: input.to_string(),
            reason,
        };

        let parsed = async_graphql_parser::parse_query(format!("{{ {input} }}")).map_err(|err| invalid(err.to_string()))?;

        let ast::ExecutableDocument {
            operations: ast::DocumentOperations::Single(operation),
            fragments,
        } = parsed
        else {
            return Err(invalid("not a valid selection set".to_string()));
        };

        if !fragments.is_empty() {
            return Err(invalid("fragment definitions are not allowed".to_string()));
        }

        convert_selections(&operation.node.selection_set.node.items)
            .map(FieldSet)
            .map_err(invalid)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.0.iter()
    }

    /// Names of the top level fields, in order
    pub fn top_level_fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|selection| selection.field.as_str())
    }

    /// Adds the selections of `other`, merging sub-selections of fields present in both
    pub fn merge(&mut self, other: FieldSet) {
        merge_selections(&mut self.0, other.0);
    }

    /// Checks if all the fields of this FieldSet are present in the given JSON object
    pub fn all_fields_are_present(&self, object: &Map<String, Value>) -> bool {
        selections_are_present(object, &self.0)
    }
}

fn convert_selections(items: &[Positioned<ast::Selection>]) -> Result<Vec<Selection>, String> {
    items
        .iter()
        .map(|selection| {
            let ast::Selection::Field(field) = &selection.node else {
                return Err(format!("unsupported fragment in selection set at {}", selection.pos));
            };
            let field = &field.node;

            if field.alias.is_some() || !field.arguments.is_empty() || !field.directives.is_empty() {
                return Err(format!(
                    "field '{}' must not have an alias, arguments or directives",
                    field.name.node
                ));
            }

            Ok(Selection {
                field: field.name.node.to_string(),
                selections: convert_selections(&field.selection_set.node.items)?,
            })
        })
        .collect()
}

fn merge_selections(target: &mut Vec<Selection>, incoming: Vec<Selection>) {
    for selection in incoming {
        match target.iter_mut().find(|existing| existing.field == selection.field) {
            Some(existing) => merge_selections(&mut existing.selections, selection.selections),
            None => target.push(selection),
        }
    }
}

fn selections_are_present(object: &Map<String, Value>, selections: &[Selection]) -> bool {
    selections.iter().all(|selection| {
        let Some(value) = object.get(&selection.field) else {
            return false;
        };
        if selection.selections.is_empty() {
            return true;
        }

        match value {
            Value::Object(object) => selections_are_present(object, &selection.selections),
            // A null is a present, nullable, sub-object
            Value::Null => true,
            _ => false,
        }
    })
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut selections = self.0.iter().peekable();

        while let Some(selection) = selections.next() {
            write!(f, "{selection}")?;
            if selections.peek().is_some() {
                f.write_str(" ")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field)?;

        if !self.selections.is_empty() {
            f.write_str(" {")?;
            for selection in &self.selections {
                write!(f, " {selection}")?;
            }
            f.write_str(" }")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_and_display() {
        let field_set = FieldSet::parse("id organization {   id\n name }").unwrap();

        assert_eq!(
            field_set,
            FieldSet::new([
                Selection::field("id"),
                Selection::nested("organization", [Selection::field("id"), Selection::field("name")]),
            ])
        );
        assert_eq!(field_set.to_string(), "id organization { id name }");
    }

    #[rstest::rstest]
    #[case::empty("")]
    #[case::unbalanced("id { name")]
    #[case::fragment("... on User { id }")]
    #[case::arguments("id(first: 1)")]
    #[case::alias("key: id")]
    #[case::trailing_fragment("id } fragment F on Episode { title")]
    #[case::trailing_operation("id } query Other { title")]
    fn invalid_field_sets(#[case] input: &str) {
        let error = FieldSet::parse(input).unwrap_err();
        assert!(matches!(error, ConfigurationError::InvalidFieldSet { .. }), "{error}");
    }

    #[test]
    fn merging_combines_sub_selections() {
        let mut field_set = FieldSet::parse("id obj { a }").unwrap();
        field_set.merge(FieldSet::parse("obj { b } region").unwrap());

        assert_eq!(field_set.to_string(), "id obj { a b } region");
    }

    #[test]
    fn presence_checks() {
        let field_set = FieldSet::parse("id obj { x }").unwrap();
        let present = |value: serde_json::Value| field_set.all_fields_are_present(value.as_object().unwrap());

        assert!(present(json!({"id": 1, "obj": {"x": 2}})));
        assert!(present(json!({"id": 1, "obj": null})));
        assert!(!present(json!({"id": 1})));
        assert!(!present(json!({"id": 1, "obj": {"y": 2}})));
        assert!(!present(json!({"id": 1, "obj": 3})));
    }
}
