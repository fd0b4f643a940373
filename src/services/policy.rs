use crate::models::checkout::{Locale, PaymentMethod};
use crate::models::plan::Region;

/// Chooses the payment method offered for a locale.
pub trait MethodPolicy: Send + Sync {
    fn method(&self, locale: &Locale) -> PaymentMethod;
}

/// Chooses which price table a locale is quoted from.
pub trait RegionPolicy: Send + Sync {
    fn region(&self, locale: &Locale) -> Region;
}

impl<F> MethodPolicy for F
where
    F: Fn(&Locale) -> PaymentMethod + Send + Sync,
{
    fn method(&self, locale: &Locale) -> PaymentMethod {
        self(locale)
    }
}

impl<F> RegionPolicy for F
where
    F: Fn(&Locale) -> Region + Send + Sync,
{
    fn region(&self, locale: &Locale) -> Region {
        self(locale)
    }
}

/// One language gets card pricing in the international table; every other
/// language is quoted in BRL and pays by PIX.
#[derive(Debug, Clone)]
pub struct LanguagePolicy {
    card_language: String,
}

impl LanguagePolicy {
    pub fn new(card_language: impl Into<String>) -> Self {
        Self {
            card_language: card_language.into().to_ascii_lowercase(),
        }
    }

    fn is_card_language(&self, locale: &Locale) -> bool {
        locale.language() == self.card_language
    }
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        Self::new("en")
    }
}

impl MethodPolicy for LanguagePolicy {
    fn method(&self, locale: &Locale) -> PaymentMethod {
        if self.is_card_language(locale) {
            PaymentMethod::Card
        } else {
            PaymentMethod::Pix
        }
    }
}

impl RegionPolicy for LanguagePolicy {
    fn region(&self, locale: &Locale) -> Region {
        if self.is_card_language(locale) {
            Region::International
        } else {
            Region::Brazil
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::checkout_service::CheckoutOptions;

    #[test]
    fn test_language_policy_defaults() {
        let policy = LanguagePolicy::default();
        assert_eq!(policy.method(&Locale::new("en")), PaymentMethod::Card);
        assert_eq!(policy.region(&Locale::new("en")), Region::International);
        assert_eq!(policy.method(&Locale::new("pt")), PaymentMethod::Pix);
        assert_eq!(policy.region(&Locale::new("es")), Region::Brazil);
    }

    #[test]
    fn test_closure_policy_can_replace_default() {
        let always_pix = |_: &Locale| PaymentMethod::Pix;
        assert_eq!(always_pix.method(&Locale::new("en")), PaymentMethod::Pix);

        let always_brazil = |_: &Locale| Region::Brazil;
        let options = CheckoutOptions::for_locale(&Locale::new("en"), &always_brazil, &LanguagePolicy::default());
        assert_eq!(options.region, Region::Brazil);
        assert_eq!(options.method, PaymentMethod::Card);
    }
}
