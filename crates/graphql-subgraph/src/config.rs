use crate::{directives::FederationDirective, entity::ReferenceValidation, link::Link, sdl::PrintOptions};

/// Federation settings of a schema, usually read from a TOML file
///
/// ```toml
/// directives = ["key", "external", "link"]
/// reference_validation = "matching_key"
///
/// [print]
/// sort_fields = true
///
/// [[links]]
/// url = "https://specs.apollo.dev/federation/v2.0"
/// import = ["@key", { name = "@shareable", as = "@share" }]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FederationConfig {
    /// The federation directives to declare, all of them if unset
    pub directives: Option<Vec<FederationDirective>>,
    /// Policy applied to every reference resolved through `_entities`
    pub reference_validation: Option<ReferenceValidation>,
    /// Options of the SDL returned by `_service`, replacing any set on the builder
    pub print: Option<PrintOptions>,
    pub links: Vec<Link>,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty() {
        let config: FederationConfig = toml::from_str("").unwrap();
        assert_eq!(config, FederationConfig::default());
    }

    #[test]
    fn everything() {
        let config: FederationConfig = toml::from_str(indoc! {r#"
            directives = ["key", "external", "link"]
            reference_validation = "matching_key"

            [print]
            sort_fields = true
            comment_descriptions = false

            [[links]]
            url = "https://specs.apollo.dev/federation/v2.0"
            import = ["@key", { name = "@shareable", as = "@share" }]
        "#})
        .unwrap();

        assert_eq!(
            config,
            FederationConfig {
                directives: Some(vec![
                    FederationDirective::Key,
                    FederationDirective::External,
                    FederationDirective::Link
                ]),
                reference_validation: Some(ReferenceValidation::MatchingKey),
                print: Some(PrintOptions {
                    sort_fields: true,
                    comment_descriptions: false,
                }),
                links: vec![Link::new(Link::FEDERATION_V2)
                    .import("@key")
                    .import_as("@shareable", "@share")],
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = toml::from_str::<FederationConfig>("sort_fields = true").unwrap_err();
        assert!(error.to_string().contains("unknown field `sort_fields`"), "{error}");
    }

    #[test]
    fn unknown_directives_are_rejected() {
        assert!(toml::from_str::<FederationConfig>(r#"directives = ["tag"]"#).is_err());
    }
}
