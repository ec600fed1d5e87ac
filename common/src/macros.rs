/// Case-insensitive `FromStr` for a fieldless enum, matching on the variant names.
#[macro_export]
macro_rules! impl_from_str_for_enum {
    ($enum_name:ident, $( $variant:ident ),*) => {
        impl std::str::FromStr for $enum_name {
            type Err = $crate::error::LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case(stringify!($variant)) {
                        return Ok($enum_name::$variant);
                    }
                )*
                Err($crate::error::LedgerError::InvalidInput(format!(
                    "invalid {}: {}",
                    stringify!($enum_name),
                    s
                )))
            }
        }
    };
}

/// Lowercase `Display` for a fieldless enum. This is the form stored in the database.
#[macro_export]
macro_rules! impl_display_for_enum {
    ($enum_name:ident, $( $variant:ident ),*) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let name = match self {
                    $( $enum_name::$variant => stringify!($variant), )*
                };
                f.write_str(&name.to_ascii_lowercase())
            }
        }
    };
}
