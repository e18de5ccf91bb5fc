/// Implements `Display` and `FromStr` for a fieldless enum from its `ALL`
/// list and a `fn(self) -> &'static str` naming each variant.
macro_rules! impl_name_conversions {
    ($ty:ty, $name:ident, $label:literal) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.$name())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|v| v.$name() == s)
                    .ok_or_else(|| {
                        let known: Vec<_> = <$ty>::ALL.iter().map(|v| v.$name()).collect();
                        format!("unknown {} '{s}' (expected one of: {})", $label, known.join(", "))
                    })
            }
        }
    };
}

pub(crate) use impl_name_conversions;
