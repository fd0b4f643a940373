use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Brl,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Brl => "BRL",
        }
    }
}

/// Pricing region. Selects which catalog a session is quoted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Brazil,
    International,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlanId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A selectable plan. Prices are in minor units (cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub display_name: String,
    pub base_price: u64,
    pub discounted_price: u64,
    pub currency: Currency,
    /// Title sent to the payment provider; defaults to "Activation {display_name}".
    #[serde(default)]
    pub item_title: Option<String>,
}

impl Plan {
    pub fn quoted_price(&self, coupon_applied: bool) -> u64 {
        if coupon_applied {
            self.discounted_price
        } else {
            self.base_price
        }
    }

    pub fn item_title(&self) -> String {
        self.item_title
            .clone()
            .unwrap_or_else(|| format!("Activation {}", self.display_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    pub fn get(&self, id: &PlanId) -> Option<&Plan> {
        self.plans.iter().find(|plan| &plan.id == id)
    }

    pub fn quote(&self, id: &PlanId, coupon_applied: bool) -> Option<u64> {
        self.get(id).map(|plan| plan.quoted_price(coupon_applied))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plan> {
        self.plans.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalCatalogs {
    pub brazil: PlanCatalog,
    pub international: PlanCatalog,
}

impl RegionalCatalogs {
    pub fn for_region(&self, region: Region) -> &PlanCatalog {
        match region {
            Region::Brazil => &self.brazil,
            Region::International => &self.international,
        }
    }
}
