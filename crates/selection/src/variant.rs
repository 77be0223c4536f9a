//! Validation of "add variant" input such as `en (English)` or `v257`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::ValidationError;

static INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w*)(?:\s+\(?(.*?)\)?)?$").expect("input regex is valid")
});
static LANG_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z]$").expect("lang regex is valid"));
static LANG_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w{4,}$").expect("title regex is valid"));
static VERSION_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v\d{3}([ab]\d(_p\d)?)?$").expect("version regex is valid")
});
static SCOPE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^[a-z][a-z0-9]{2,}$")
        .case_insensitive(true)
        .build()
        .expect("scope regex is valid")
});
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s()]+").expect("separator regex is valid"));

/// Kind of variant value the generator can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Language,
    Version,
    Scope,
}

impl VariantKind {
    pub const ALL: [VariantKind; 3] = [
        VariantKind::Language,
        VariantKind::Version,
        VariantKind::Scope,
    ];

    /// Single-letter field passed to the generator (`-a<field>=...`).
    pub fn field(self) -> char {
        match self {
            VariantKind::Language => 'l',
            VariantKind::Version => 'v',
            VariantKind::Scope => 's',
        }
    }

    /// Example input shown to the user.
    pub fn placeholder(self) -> &'static str {
        match self {
            VariantKind::Language => "en (English)",
            VariantKind::Version => "v257",
            VariantKind::Scope => "app (Reference)",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VariantKind::Language => "Language",
            VariantKind::Version => "Version",
            VariantKind::Scope => "Scope",
        })
    }
}

impl FromStr for VariantKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "language" | "lang" => Ok(VariantKind::Language),
            "version" | "ver" => Ok(VariantKind::Version),
            "scope" => Ok(VariantKind::Scope),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

/// A validated variant value, normalized to the generator's `code=Title` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInput {
    pub kind: VariantKind,
    pub value: String,
}

/// Validates raw user input for `kind` and normalizes it.
///
/// `"en (English)"` becomes `en=English`; `"v257"` stays `v257`.
pub fn parse_variant_input(kind: VariantKind, raw: &str) -> Result<VariantInput, ValidationError> {
    let invalid = |msg: &str| Err(ValidationError::Variant(msg.to_string()));

    let Some(caps) = INPUT.captures(raw) else {
        return invalid("Invalid Input");
    };
    let code = caps.get(1).map_or("", |m| m.as_str());
    let title = caps.get(2).map_or("", |m| m.as_str());

    match kind {
        VariantKind::Language => {
            if !LANG_CODE.is_match(code) {
                return invalid("Language code must have 2 lower case letters");
            }
            if !LANG_TITLE.is_match(title) {
                return invalid("Missing name after language code");
            }
        }
        VariantKind::Version => {
            if !VERSION_CODE.is_match(code) {
                return invalid("Version must start with a 'v' followed by 3 digits");
            }
        }
        VariantKind::Scope => {
            if !SCOPE_CODE.is_match(code) {
                return invalid("Scope namespace must have at least 3 characters");
            }
            if title.chars().count() < 4 {
                return invalid("Missing title after scope namespace");
            }
        }
    }

    let collapsed = SEPARATORS.replace_all(raw, " ");
    let value = collapsed.trim().replacen(' ', "=", 1);
    Ok(VariantInput { kind, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_valid() {
        for kind in VariantKind::ALL {
            assert!(parse_variant_input(kind, kind.placeholder()).is_ok(), "{kind}");
        }
    }

    #[test]
    fn language_is_normalized_to_code_equals_title() {
        let v = parse_variant_input(VariantKind::Language, "en (English)").unwrap();
        assert_eq!(v.value, "en=English");
        let v = parse_variant_input(VariantKind::Language, "de Deutsch").unwrap();
        assert_eq!(v.value, "de=Deutsch");
    }

    #[test]
    fn language_rules() {
        assert!(parse_variant_input(VariantKind::Language, "EN (English)").is_err());
        assert!(parse_variant_input(VariantKind::Language, "eng (English)").is_err());
        assert!(parse_variant_input(VariantKind::Language, "en").is_err());
        assert!(parse_variant_input(VariantKind::Language, "en (Eng)").is_err());
    }

    #[test]
    fn version_rules() {
        assert_eq!(
            parse_variant_input(VariantKind::Version, "v257").unwrap().value,
            "v257"
        );
        assert!(parse_variant_input(VariantKind::Version, "v258b1_p2").is_ok());
        assert!(parse_variant_input(VariantKind::Version, "v25").is_err());
        assert!(parse_variant_input(VariantKind::Version, "257").is_err());
    }

    #[test]
    fn scope_rules() {
        let v = parse_variant_input(VariantKind::Scope, "MUI (Material UI)").unwrap();
        assert_eq!(v.value, "MUI=Material UI");
        assert!(parse_variant_input(VariantKind::Scope, "ui (User Interface)").is_err());
        assert!(parse_variant_input(VariantKind::Scope, "gfx (abc)").is_err());
    }

    #[test]
    fn field_letters() {
        assert_eq!(VariantKind::Language.field(), 'l');
        assert_eq!(VariantKind::Version.field(), 'v');
        assert_eq!(VariantKind::Scope.field(), 's');
    }
}
