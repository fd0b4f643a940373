/// Case-insensitive, whitespace-insensitive comparison against a canonical code.
pub fn validate(code: &str, canonical: &str) -> bool {
    let normalize = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_uppercase)
            .collect()
    };

    let code = normalize(code);
    !code.is_empty() && code == normalize(canonical)
}

/// Decides whether a typed code grants the discount.
///
/// Kept separate from the checkout so expiry or single-use rules can be
/// layered on without touching the state machine.
pub trait CouponPolicy: Send + Sync {
    fn accepts(&self, code: &str) -> bool;
}

/// One canonical code, no expiry, unlimited use.
#[derive(Debug, Clone)]
pub struct CanonicalCoupon {
    code: String,
}

impl CanonicalCoupon {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CouponPolicy for CanonicalCoupon {
    fn accepts(&self, code: &str) -> bool {
        validate(code, &self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_ignores_case() {
        assert!(validate("mivai2026", "MIVAI2026"));
        assert!(validate("MiVaI2026", "MIVAI2026"));
    }

    #[test]
    fn test_validate_ignores_whitespace() {
        assert!(validate("  MIVAI2026 ", "MIVAI2026"));
        assert!(validate("MIVAI 2026", "MIVAI2026"));
    }

    #[test]
    fn test_validate_rejects_other_codes() {
        assert!(!validate("MIVAI2025", "MIVAI2026"));
        assert!(!validate("", "MIVAI2026"));
        assert!(!validate("   ", "MIVAI2026"));
    }

    #[test]
    fn test_canonical_policy_is_reusable() {
        let policy = CanonicalCoupon::new("MIVAI2026");
        assert!(policy.accepts("mivai2026"));
        assert!(policy.accepts("mivai2026"));
        assert!(!policy.accepts("nope"));
    }

    proptest! {
        #[test]
        fn validate_matches_any_casing(code in "[a-zA-Z0-9]{1,16}") {
            prop_assert!(validate(&code.to_lowercase(), &code.to_uppercase()));
        }
    }
}
