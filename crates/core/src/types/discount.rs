//! Discount kinds as reported by the Shopify `__typename` field.
//!
//! Only the two "basic" kinds carry a `customerGets.items` collection list
//! that rules can rewrite. Everything else is rejected before any mutation
//! is attempted.

use serde::{Deserialize, Serialize};

/// Classification of a remote discount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DiscountKind {
    /// `DiscountCodeBasic` - amount off, applied with a code.
    CodeBasic,
    /// `DiscountAutomaticBasic` - amount off, applied automatically.
    AutomaticBasic,
    /// A known kind whose eligibility is not collection based.
    Incompatible(IncompatibleKind),
    /// A typename we do not recognise.
    Unsupported(String),
}

impl DiscountKind {
    /// Classify a discount from its GraphQL `__typename`.
    #[must_use]
    pub fn from_typename(typename: &str) -> Self {
        match typename {
            "DiscountCodeBasic" => Self::CodeBasic,
            "DiscountAutomaticBasic" => Self::AutomaticBasic,
            "DiscountCodeBxgy" => Self::Incompatible(IncompatibleKind::CodeBxgy),
            "DiscountAutomaticBxgy" => Self::Incompatible(IncompatibleKind::AutomaticBxgy),
            "DiscountCodeFreeShipping" => Self::Incompatible(IncompatibleKind::CodeFreeShipping),
            "DiscountAutomaticFreeShipping" => {
                Self::Incompatible(IncompatibleKind::AutomaticFreeShipping)
            }
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// The GraphQL typename this kind was parsed from.
    #[must_use]
    pub fn typename(&self) -> &str {
        match self {
            Self::CodeBasic => "DiscountCodeBasic",
            Self::AutomaticBasic => "DiscountAutomaticBasic",
            Self::Incompatible(kind) => kind.typename(),
            Self::Unsupported(name) => name,
        }
    }

    /// Returns the mutable basic kind, if this discount is one.
    #[must_use]
    pub const fn basic(&self) -> Option<BasicDiscountKind> {
        match self {
            Self::CodeBasic => Some(BasicDiscountKind::Code),
            Self::AutomaticBasic => Some(BasicDiscountKind::Automatic),
            Self::Incompatible(_) | Self::Unsupported(_) => None,
        }
    }
}

impl std::fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.typename())
    }
}

/// Discount kinds that exist on the platform but cannot be scoped by collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompatibleKind {
    CodeBxgy,
    AutomaticBxgy,
    CodeFreeShipping,
    AutomaticFreeShipping,
}

impl IncompatibleKind {
    /// Every incompatible kind, in a stable order.
    pub const ALL: [Self; 4] = [
        Self::CodeBxgy,
        Self::AutomaticBxgy,
        Self::CodeFreeShipping,
        Self::AutomaticFreeShipping,
    ];

    /// The GraphQL typename of this kind.
    #[must_use]
    pub const fn typename(self) -> &'static str {
        match self {
            Self::CodeBxgy => "DiscountCodeBxgy",
            Self::AutomaticBxgy => "DiscountAutomaticBxgy",
            Self::CodeFreeShipping => "DiscountCodeFreeShipping",
            Self::AutomaticFreeShipping => "DiscountAutomaticFreeShipping",
        }
    }

    /// Human readable explanation of why rules cannot be applied.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::CodeBxgy | Self::AutomaticBxgy => {
                "BXGY discounts use different collection logic (customerBuys vs customerGets). Not compatible with simple collection exclusion rules."
            }
            Self::CodeFreeShipping | Self::AutomaticFreeShipping => {
                "Free shipping discounts don't use collection restrictions"
            }
        }
    }
}

/// The two discount kinds whose collections can be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicDiscountKind {
    /// `DiscountCodeBasic`
    Code,
    /// `DiscountAutomaticBasic`
    Automatic,
}

impl BasicDiscountKind {
    /// Name of the update mutation field.
    #[must_use]
    pub const fn mutation_name(self) -> &'static str {
        match self {
            Self::Code => "discountCodeBasicUpdate",
            Self::Automatic => "discountAutomaticBasicUpdate",
        }
    }

    /// Name of the input variable carried by the update mutation.
    #[must_use]
    pub const fn variables_key(self) -> &'static str {
        match self {
            Self::Code => "basicCodeDiscount",
            Self::Automatic => "automaticBasicDiscount",
        }
    }

    /// Node type used in mutation GIDs.
    #[must_use]
    pub const fn node_type(self) -> &'static str {
        match self {
            Self::Code => "DiscountCodeNode",
            Self::Automatic => "DiscountAutomaticNode",
        }
    }
}

impl From<BasicDiscountKind> for DiscountKind {
    fn from(kind: BasicDiscountKind) -> Self {
        match kind {
            BasicDiscountKind::Code => Self::CodeBasic,
            BasicDiscountKind::Automatic => Self::AutomaticBasic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_typename_basic_kinds() {
        assert_eq!(
            DiscountKind::from_typename("DiscountCodeBasic"),
            DiscountKind::CodeBasic
        );
        assert_eq!(
            DiscountKind::from_typename("DiscountAutomaticBasic"),
            DiscountKind::AutomaticBasic
        );
    }

    #[test]
    fn test_from_typename_round_trips_incompatible_kinds() {
        for kind in IncompatibleKind::ALL {
            let parsed = DiscountKind::from_typename(kind.typename());
            assert_eq!(parsed, DiscountKind::Incompatible(kind));
            assert_eq!(parsed.typename(), kind.typename());
            assert!(parsed.basic().is_none());
        }
    }

    #[test]
    fn test_from_typename_unknown() {
        let kind = DiscountKind::from_typename("DiscountCodeApp");
        assert_eq!(kind, DiscountKind::Unsupported("DiscountCodeApp".to_string()));
        assert_eq!(kind.to_string(), "DiscountCodeApp");
    }

    #[test]
    fn test_incompatible_reasons() {
        assert!(IncompatibleKind::CodeBxgy.reason().contains("BXGY"));
        assert!(IncompatibleKind::AutomaticFreeShipping
            .reason()
            .contains("Free shipping"));
    }

    #[test]
    fn test_basic_kind_mutation_shapes() {
        assert_eq!(
            BasicDiscountKind::Code.mutation_name(),
            "discountCodeBasicUpdate"
        );
        assert_eq!(
            BasicDiscountKind::Automatic.variables_key(),
            "automaticBasicDiscount"
        );
        assert_eq!(
            DiscountKind::from(BasicDiscountKind::Automatic).basic(),
            Some(BasicDiscountKind::Automatic)
        );
    }
}
