//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input includes a scheme or path.
    #[error("shop domain must be a bare host (no scheme or path)")]
    NotBareHost,
    /// The input has no dot.
    #[error("shop domain must contain a dot")]
    MissingDot,
}

/// The domain of a Shopify shop, e.g. `my-shop.myshopify.com`.
///
/// Rules, logs and redactions are all keyed by shop domain. Domains are
/// normalised to lowercase so the same shop never ends up with two rules.
///
/// ## Examples
///
/// ```
/// use collection_gate_core::ShopDomain;
///
/// let shop = ShopDomain::parse("My-Shop.myshopify.com").unwrap();
/// assert_eq!(shop.as_str(), "my-shop.myshopify.com");
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("https://my-shop.myshopify.com").is_err());
/// assert!(ShopDomain::parse("localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a DNS name.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, contains a scheme,
    /// path or whitespace, or has no dot.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.contains("://") || s.contains('/') || s.chars().any(char::is_whitespace) {
            return Err(ShopDomainError::NotBareHost);
        }

        if !s.contains('.') {
            return Err(ShopDomainError::MissingDot);
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopDomain {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let shop = ShopDomain::parse("demo-store.myshopify.com").unwrap();
        assert_eq!(shop.as_str(), "demo-store.myshopify.com");
        assert_eq!(shop.to_string(), "demo-store.myshopify.com");
    }

    #[test]
    fn test_parse_normalises_case_and_whitespace() {
        let shop = ShopDomain::parse("  Demo-Store.MyShopify.com ").unwrap();
        assert_eq!(shop.as_str(), "demo-store.myshopify.com");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ShopDomain::parse(""), Err(ShopDomainError::Empty));
        assert_eq!(ShopDomain::parse("   "), Err(ShopDomainError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}.com", "a".repeat(300));
        assert!(matches!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { max: 255 })
        ));
    }

    #[test]
    fn test_parse_rejects_urls() {
        assert_eq!(
            ShopDomain::parse("https://demo.myshopify.com"),
            Err(ShopDomainError::NotBareHost)
        );
        assert_eq!(
            ShopDomain::parse("demo.myshopify.com/admin"),
            Err(ShopDomainError::NotBareHost)
        );
    }

    #[test]
    fn test_parse_requires_dot() {
        assert_eq!(
            ShopDomain::parse("localhost"),
            Err(ShopDomainError::MissingDot)
        );
    }

    #[test]
    fn test_serde_validates() {
        let shop: ShopDomain = serde_json::from_str("\"demo.myshopify.com\"").unwrap();
        assert_eq!(shop.as_str(), "demo.myshopify.com");
        assert!(serde_json::from_str::<ShopDomain>("\"nodot\"").is_err());
        assert_eq!(
            serde_json::to_string(&shop).unwrap(),
            "\"demo.myshopify.com\""
        );
    }
}
