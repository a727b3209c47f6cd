/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (purchase dates, warranty periods) carry no time zone.
pub type Date = chrono::NaiveDate;

/// Define a closed enumeration stored as a lowercase string in the database.
///
/// Generates `ALL`, `as_str`, `from_str_value`, `Display`, and a
/// `TryFrom<String>` impl (used by sqlx `try_from` column decoding).
/// `Name (default = Variant) { .. }` also implements `Default`.
macro_rules! define_str_enum {
    (
        $(#[$meta:meta])*
        $name:ident $( (default = $default:ident) )? {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $value)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Convert to the database string value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $value ),+
                }
            }

            /// Convert from a database string value.
            pub fn from_str_value(s: &str) -> Result<Self, String> {
                match s {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(format!(
                        "Invalid {} '{s}'. Must be one of: {}",
                        stringify!($name),
                        [$( $value ),+].join(", ")
                    )),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        $(
            impl Default for $name {
                fn default() -> Self {
                    $name::$default
                }
            }
        )?

        impl TryFrom<String> for $name {
            type Error = $crate::error::CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_str_value(&value).map_err($crate::error::CoreError::Validation)
            }
        }
    };
}

pub(crate) use define_str_enum;
