//! `@link` directives applied to the schema

use std::fmt::{self, Write};

use crate::{sdl::display_utils::write_quoted, ConfigurationError};

/// A link to a set of definitions the subgraph imports, e.g. the federation directives
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub url: String,
    #[serde(default, rename = "as")]
    pub r#as: Option<String>,
    #[serde(default, rename = "for")]
    pub r#for: Option<String>,
    #[serde(default)]
    pub import: Vec<LinkImport>,
}

/// One entry of the `import` argument of `@link`
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum LinkImport {
    /// `"@key"`
    Name(String),
    /// `{ name: "@key", as: "@primaryKey" }`
    Renamed {
        name: String,
        #[serde(rename = "as")]
        alias: String,
    },
}

impl Link {
    pub const FEDERATION_V2: &'static str = "https://specs.apollo.dev/federation/v2.0";

    pub fn new(url: impl Into<String>) -> Self {
        Link {
            url: url.into(),
            r#as: None,
            r#for: None,
            import: vec![],
        }
    }

    #[must_use]
    pub fn import(mut self, name: impl Into<String>) -> Self {
        self.import.push(LinkImport::Name(name.into()));
        self
    }

    #[must_use]
    pub fn import_as(mut self, name: impl Into<String>, alias: impl Into<String>) -> Self {
        self.import.push(LinkImport::Renamed {
            name: name.into(),
            alias: alias.into(),
        });
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.import.iter().try_for_each(LinkImport::validate)
    }
}

impl LinkImport {
    /// Names must not be empty, and a directive can only be renamed to a directive.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            LinkImport::Name(name) if name.is_empty() => {
                Err(ConfigurationError::InvalidLinkImport("imported names cannot be empty".to_string()))
            }
            LinkImport::Name(_) => Ok(()),
            LinkImport::Renamed { name, alias } if name.is_empty() || alias.is_empty() => Err(
                ConfigurationError::InvalidLinkImport(format!("'{name}' as '{alias}': both names are required")),
            ),
            LinkImport::Renamed { name, alias } if name.starts_with('@') != alias.starts_with('@') => {
                Err(ConfigurationError::InvalidLinkImport(format!(
                    "'{name}' as '{alias}': either both or none of the names must start with '@'"
                )))
            }
            LinkImport::Renamed { .. } => Ok(()),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("@link(url: ")?;
        write_quoted(f, &self.url)?;

        if let Some(namespace) = &self.r#as {
            f.write_str(", as: ")?;
            write_quoted(f, namespace)?;
        }

        if let Some(purpose) = &self.r#for {
            f.write_str(", for: ")?;
            write_quoted(f, purpose)?;
        }

        if !self.import.is_empty() {
            f.write_str(", import: [")?;
            let mut imports = self.import.iter().peekable();
            while let Some(import) = imports.next() {
                match import {
                    LinkImport::Name(name) => write_quoted(f, name)?,
                    LinkImport::Renamed { name, alias } => {
                        f.write_str("{name: ")?;
                        write_quoted(f, name)?;
                        f.write_str(", as: ")?;
                        write_quoted(f, alias)?;
                        f.write_char('}')?;
                    }
                }
                if imports.peek().is_some() {
                    f.write_str(", ")?;
                }
            }
            f.write_char(']')?;
        }

        f.write_char(')')
    }
}
