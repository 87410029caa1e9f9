//! Field renaming conventions of Serde's `rename_all` attribute, so that
//! member names match the keys the entity is actually serialized under.

use syn::LitStr;
use crate::error::Result;
use self::RenameRule::*;

/// A renaming convention, as defined by Serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenameRule {
    /// "lowercase"
    LowerCase,
    /// "UPPERCASE"
    UpperCase,
    /// "PascalCase"
    PascalCase,
    /// "camelCase"
    CamelCase,
    /// "snake_case"
    SnakeCase,
    /// "SCREAMING_SNAKE_CASE"
    ScreamingSnakeCase,
    /// "kebab-case"
    KebabCase,
    /// "SCREAMING-KEBAB-CASE"
    ScreamingKebabCase,
}

impl RenameRule {
    /// Parses the value of `#[serde(rename_all = "...")]`.
    pub fn from_lit(lit: &LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "lowercase"            => Ok(LowerCase),
            "UPPERCASE"            => Ok(UpperCase),
            "PascalCase"           => Ok(PascalCase),
            "camelCase"            => Ok(CamelCase),
            "snake_case"           => Ok(SnakeCase),
            "SCREAMING_SNAKE_CASE" => Ok(ScreamingSnakeCase),
            "kebab-case"           => Ok(KebabCase),
            "SCREAMING-KEBAB-CASE" => Ok(ScreamingKebabCase),
            other => err_fmt!(lit, "unknown `rename_all` rule: {}", other),
        }
    }

    /// Renames a `snake_case` field name according to `self`.
    pub fn apply_to_field(self, field: &str) -> String {
        match self {
            LowerCase | SnakeCase => field.to_owned(),
            UpperCase | ScreamingSnakeCase => field.to_ascii_uppercase(),
            PascalCase => {
                let mut pascal = String::with_capacity(field.len());
                let mut capitalize = true;

                for ch in field.chars() {
                    if ch == '_' {
                        capitalize = true;
                    } else if capitalize {
                        pascal.push(ch.to_ascii_uppercase());
                        capitalize = false;
                    } else {
                        pascal.push(ch);
                    }
                }

                pascal
            }
            CamelCase => {
                let pascal = PascalCase.apply_to_field(field);
                let mut chars = pascal.chars();

                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
            KebabCase => field.replace('_', "-"),
            ScreamingKebabCase => field.to_ascii_uppercase().replace('_', "-"),
        }
    }
}
