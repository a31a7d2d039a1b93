/// For a type with `TryFrom<&str, Error = eyre::Report>`, derive `FromStr` and
/// `TryFrom<String>` from it, so `"...".parse()`, `String::try_into()` and serde_with's
/// `DeserializeFromStr` all work.
#[macro_export]
macro_rules! str_conversions {
    ($name:ty) => {
        impl std::str::FromStr for $name {
            type Err = eyre::Report;

            fn from_str(s: &str) -> eyre::Result<Self> {
                <$name>::try_from(s)
            }
        }

        impl std::convert::TryFrom<String> for $name {
            type Error = eyre::Report;

            fn try_from(s: String) -> eyre::Result<Self> {
                <$name>::try_from(s.as_str())
            }
        }
    };
}
