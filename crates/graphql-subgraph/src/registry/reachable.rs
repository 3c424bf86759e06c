use std::collections::HashSet;

use super::{MetaType, Registry};
use crate::{ConfigurationError, Error};

/// Names of every type reachable from `root`, `root` included, in discovery order.
///
/// Follows fields, field arguments, implemented interfaces, union members and input fields.
/// Field thunks met on the way are evaluated.
pub fn reachable_types(registry: &Registry, root: &str) -> Result<Vec<String>, Error> {
    let mut seen = HashSet::from([root.to_string()]);
    let mut discovered = vec![root.to_string()];
    let mut queue = vec![(root.to_string(), "schema".to_string())];
    let mut cursor = 0;

    while let Some((name, referenced_by)) = queue.get(cursor).cloned() {
        cursor += 1;

        let ty = registry
            .lookup(&name)
            .ok_or(ConfigurationError::UnknownType { ty: name, referenced_by })?;

        for (next, location) in references(ty)? {
            if seen.insert(next.clone()) {
                discovered.push(next.clone());
                queue.push((next, location));
            }
        }
    }

    Ok(discovered)
}

/// The types directly used by `ty`, each with the place it is used from
fn references(ty: &MetaType) -> Result<Vec<(String, String)>, Error> {
    let mut references = Vec::new();

    if let Some(fields) = ty.try_fields().map_err(Error::Resolver)? {
        for field in fields.values() {
            let location = format!("{}.{}", ty.name(), field.name);
            references.push((field.ty.named_type().to_string(), location.clone()));

            for arg in field.args.values() {
                references.push((arg.ty.named_type().to_string(), format!("{location}({})", arg.name)));
            }
        }
    }

    for interface in ty.interfaces() {
        references.push((interface.clone(), ty.name().to_string()));
    }

    match ty {
        MetaType::Union(union) => {
            for member in &union.possible_types {
                references.push((member.clone(), union.name.clone()));
            }
        }
        MetaType::InputObject(input) => {
            for field in input.input_fields.values() {
                references.push((
                    field.ty.named_type().to_string(),
                    format!("{}.{}", input.name, field.name),
                ));
            }
        }
        _ => {}
    }

    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{InputObjectType, MetaField, MetaInputValue, ObjectType, TypeRef, UnionType};

    #[test]
    fn walks_through_wrappers_unions_and_arguments() {
        let mut registry = Registry::new("Query");
        registry
            .insert_type(ObjectType::new(
                "Query",
                [
                    MetaField::new("search", TypeRef::named_nn_list_nn("SearchResult"))
                        .with_arg(MetaInputValue::new("filter", "Filter")),
                    MetaField::new("other", TypeRef::named_list("Planet")),
                ],
            ))
            .unwrap();
        registry
            .insert_type(UnionType::new("SearchResult", ["Human", "Planet"]))
            .unwrap();
        registry
            .insert_type(ObjectType::new("Human", [MetaField::new("home", "Planet")]))
            .unwrap();
        registry
            .insert_type(ObjectType::new("Planet", [MetaField::new("name", TypeRef::STRING)]))
            .unwrap();
        registry
            .insert_type(InputObjectType::new("Filter", [MetaInputValue::new("name", TypeRef::STRING)]))
            .unwrap();
        registry.insert_type(ObjectType::new("Unused", [])).unwrap();

        let reachable = reachable_types(&registry, "Query").unwrap();

        assert_eq!(
            reachable,
            ["Query", "SearchResult", "Filter", "Planet", "Human", "String"]
        );
    }

    #[test]
    fn unknown_types_are_reported() {
        let mut registry = Registry::new("Query");
        registry
            .insert_type(ObjectType::new("Query", [MetaField::new("droid", "Droid")]))
            .unwrap();

        let error = reachable_types(&registry, "Query").unwrap_err();
        assert_eq!(error.to_string(), "Unknown type 'Droid' referenced by 'Query.droid'");
    }
}
