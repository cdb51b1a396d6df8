//! Macros for ergonomic machine definitions.

/// Declare a fieldless enum usable as a state or event id.
///
/// The enum derives `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Debug` and
/// serde's traits, gets a `name()` accessor and a `Display` impl printing
/// the variant name.
///
/// # Example
///
/// ```
/// use tantamount::id_enum;
///
/// id_enum! {
///     pub enum Door {
///         Open,
///         Closed,
///     }
/// }
///
/// assert_eq!(Door::Open.name(), "Open");
/// assert_eq!(Door::Closed.to_string(), "Closed");
/// ```
#[macro_export]
macro_rules! id_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Debug,
            serde::Serialize,
            serde::Deserialize
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Variant name.
            #[allow(dead_code)]
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::Id;

    id_enum! {
        enum Light {
            Red,
            Yellow,
            Green,
        }
    }

    fn assert_id<T: Id>(_: &T) {}

    #[test]
    fn id_enum_generates_names() {
        assert_eq!(Light::Red.name(), "Red");
        assert_eq!(Light::Yellow.to_string(), "Yellow");
        assert_eq!(format!("{:?}", Light::Green), "Green");
    }

    #[test]
    fn id_enum_is_an_id() {
        assert_id(&Light::Red);
    }

    #[test]
    fn id_enum_serializes_by_name() {
        let json = serde_json::to_string(&Light::Green).unwrap();
        assert_eq!(json, "\"Green\"");
        let back: Light = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Light::Green);
    }

    #[test]
    fn id_enum_supports_visibility() {
        id_enum! {
            pub enum Signal {
                Tick,
            }
        }

        assert_eq!(Signal::Tick.name(), "Tick");
    }
}
