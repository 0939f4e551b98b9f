//! Closed string enums
//!
//! Enum-typed fields travel as plain strings on the wire. [`wire_enum!`]
//! declares a compile-time enum over such a token set; [`crate::EnumShape`]
//! covers enums that are only known from a loaded model. Both resolve tokens
//! with the same exact-match rules.

use crate::{Result, WireError};

/// Reject absent and empty tokens
pub fn require_token(value: Option<&str>) -> Result<&str> {
    match value {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(WireError::InvalidArgument(
            "Value cannot be null or empty!".to_string(),
        )),
    }
}

/// Error for a token outside the declared set
pub fn unknown_token(token: &str) -> WireError {
    WireError::InvalidArgument(format!("Cannot create enum from {} value!", token))
}

/// Declare an enum whose variants map 1:1 to wire tokens
///
/// ```
/// shapewire_common::wire_enum! {
///     /// Traffic policy record type
///     pub enum RrType {
///         A => "A",
///         Aaaa => "AAAA",
///     }
/// }
///
/// assert_eq!(RrType::from_value(Some("AAAA")).unwrap(), RrType::Aaaa);
/// assert_eq!(RrType::A.to_string(), "A");
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            const VALUES: &'static [$name] = &[$($name::$variant),+];

            /// Wire token of this constant
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }

            /// All constants in declaration order
            pub fn values() -> &'static [$name] {
                Self::VALUES
            }

            /// Resolve a wire token; absent, empty and unknown tokens are rejected
            pub fn from_value(value: Option<&str>) -> $crate::Result<Self> {
                let token = $crate::enums::require_token(value)?;
                Self::VALUES
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == token)
                    .ok_or_else(|| $crate::enums::unknown_token(token))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::WireError;

            fn from_str(s: &str) -> $crate::Result<Self> {
                Self::from_value(Some(s))
            }
        }

        impl ::std::convert::From<$name> for $crate::Value {
            fn from(v: $name) -> Self {
                $crate::Value::String(v.as_str().to_string())
            }
        }
    };
}

wire_enum! {
    /// Availability of a domain name for registration
    pub enum DomainAvailability {
        Available => "AVAILABLE",
        AvailableReserved => "AVAILABLE_RESERVED",
        AvailablePreorder => "AVAILABLE_PREORDER",
        Unavailable => "UNAVAILABLE",
        UnavailablePremium => "UNAVAILABLE_PREMIUM",
        UnavailableRestricted => "UNAVAILABLE_RESTRICTED",
        Reserved => "RESERVED",
        DontKnow => "DONT_KNOW",
    }
}

wire_enum! {
    /// Status of a registered CA certificate
    pub enum CaCertificateStatus {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Model, Value};

    #[test]
    fn test_from_value_inverts_as_str() {
        for v in DomainAvailability::values() {
            assert_eq!(DomainAvailability::from_value(Some(v.as_str())).unwrap(), *v);
            assert_eq!(v.to_string().parse::<DomainAvailability>().unwrap(), *v);
        }
        for v in CaCertificateStatus::values() {
            assert_eq!(CaCertificateStatus::from_value(Some(v.as_str())).unwrap(), *v);
        }
        assert_eq!(DomainAvailability::values().len(), 8);
    }

    #[test]
    fn test_invalid_tokens_are_rejected() {
        for bad in [None, Some(""), Some("UNKNOWN_TOKEN"), Some("active"), Some(" ACTIVE")] {
            let err = CaCertificateStatus::from_value(bad).unwrap_err();
            assert!(matches!(err, WireError::InvalidArgument(_)), "{:?}", bad);
        }
        assert!("DONT".parse::<DomainAvailability>().is_err());
    }

    #[test]
    fn test_enum_sets_field_as_string() {
        let cert = Model::new("CACertificate").with("status", CaCertificateStatus::Inactive);
        assert_eq!(cert.get("status"), Some(&Value::String("INACTIVE".to_string())));
        assert_eq!(
            CaCertificateStatus::from_value(cert.get_str("status")).unwrap(),
            CaCertificateStatus::Inactive
        );
    }
}
