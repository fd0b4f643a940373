use crate::models::plan::{Currency, Plan, PlanCatalog, PlanId, RegionalCatalogs};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read profile file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse profile file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown checkout profile: {0}")]
    UnknownProfile(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("invalid payment endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub pix_endpoint: String,
    pub http_timeout_ms: u64,
    pub tick_interval_ms: u64,
    pub queue_buffer_size: usize,
    pub coupon_code: String,
    pub language: String,
    pub profile: String,
    pub profile_file: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pix_endpoint: "http://localhost:8080/api/pix".to_string(),
            http_timeout_ms: 5000,
            tick_interval_ms: 1000,
            queue_buffer_size: 64,
            coupon_code: "MIVAI2026".to_string(),
            language: "pt".to_string(),
            profile: "plans".to_string(),
            profile_file: None,
            state_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pix_endpoint: env::var("PIX_ENDPOINT").unwrap_or(defaults.pix_endpoint),
            http_timeout_ms: env::var("HTTP_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_ms),
            tick_interval_ms: env::var("TICK_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.tick_interval_ms),
            queue_buffer_size: env::var("QUEUE_BUFFER_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.queue_buffer_size),
            coupon_code: env::var("COUPON_CODE").unwrap_or(defaults.coupon_code),
            language: env::var("CHECKOUT_LANGUAGE").unwrap_or(defaults.language),
            profile: env::var("CHECKOUT_PROFILE").unwrap_or(defaults.profile),
            profile_file: env::var("CHECKOUT_PROFILE_FILE").ok().map(PathBuf::from),
            state_file: env::var("STATE_FILE").ok().map(PathBuf::from),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.pix_endpoint)?;
        if self.http_timeout_ms == 0 {
            return Err(ConfigError::Invalid("HTTP_TIMEOUT_MS must be positive".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("TICK_INTERVAL_MS must be positive".to_string()));
        }
        if self.queue_buffer_size == 0 {
            return Err(ConfigError::Invalid("QUEUE_BUFFER_SIZE must be positive".to_string()));
        }
        if self.coupon_code.trim().is_empty() {
            return Err(ConfigError::Invalid("COUPON_CODE must not be empty".to_string()));
        }
        Ok(())
    }

    /// Profile file wins over the built-in name. The tick interval from the
    /// environment overrides whatever the profile carries.
    pub fn load_profile(&self) -> Result<FlowProfile, ConfigError> {
        let mut profile = match &self.profile_file {
            Some(path) => FlowProfile::from_file(path)?,
            None => FlowProfile::builtin(&self.profile)?,
        };
        profile.tick_interval_ms = self.tick_interval_ms;
        profile.validate()?;
        Ok(profile)
    }
}

/// Everything that differs between the activation popup and the plan page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowProfile {
    pub name: String,
    #[serde(default = "default_confirm_ticks")]
    pub confirm_ticks: u32,
    pub qr_expiry_ticks: u32,
    #[serde(default = "default_feedback_ticks")]
    pub card_processing_ticks: u32,
    #[serde(default = "default_feedback_ticks")]
    pub copied_feedback_ticks: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub coupon_preapplied: bool,
    pub reference_tag: String,
    #[serde(default = "default_expires_in_days")]
    pub pix_expires_in_days: u32,
    pub default_plan: PlanId,
    pub catalogs: RegionalCatalogs,
}

fn default_confirm_ticks() -> u32 {
    5
}

fn default_feedback_ticks() -> u32 {
    2
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_expires_in_days() -> u32 {
    1
}

fn plan(id: &str, name: &str, base: u64, discounted: u64, currency: Currency) -> Plan {
    Plan {
        id: PlanId::new(id),
        display_name: name.to_string(),
        base_price: base,
        discounted_price: discounted,
        currency,
        item_title: None,
    }
}

impl FlowProfile {
    pub fn builtin(name: &str) -> Result<Self, ConfigError> {
        match name {
            "plans" => Ok(Self::plan_page()),
            "activation" => Ok(Self::activation()),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Monthly and annual plans, coupon-gated discount, 10 minute QR.
    pub fn plan_page() -> Self {
        Self {
            name: "plans".to_string(),
            confirm_ticks: default_confirm_ticks(),
            qr_expiry_ticks: 600,
            card_processing_ticks: default_feedback_ticks(),
            copied_feedback_ticks: default_feedback_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
            coupon_preapplied: false,
            reference_tag: "PLAN".to_string(),
            pix_expires_in_days: default_expires_in_days(),
            default_plan: PlanId::new("monthly"),
            catalogs: RegionalCatalogs {
                brazil: PlanCatalog::new(vec![
                    plan("monthly", "Plano Mensal", 38900, 11150, Currency::Brl),
                    plan("annual", "Plano Anual", 326760, 21830, Currency::Brl),
                ]),
                international: PlanCatalog::new(vec![
                    plan("monthly", "Monthly Plan", 3999, 1999, Currency::Usd),
                    plan("annual", "Annual Plan", 29999, 4999, Currency::Usd),
                ]),
            },
        }
    }

    /// Single one-year activation at the discounted price, 3 minute QR.
    pub fn activation() -> Self {
        let mut brazil = plan("activation", "Ativação Anual", 49990, 10790, Currency::Brl);
        brazil.item_title = Some("Account Activation - 1 Year".to_string());
        let mut international = plan("activation", "Annual Activation", 9999, 2099, Currency::Usd);
        international.item_title = Some("Account Activation - 1 Year".to_string());

        Self {
            name: "activation".to_string(),
            confirm_ticks: default_confirm_ticks(),
            qr_expiry_ticks: 180,
            card_processing_ticks: default_feedback_ticks(),
            copied_feedback_ticks: default_feedback_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
            coupon_preapplied: true,
            reference_tag: "ACTIVATION".to_string(),
            pix_expires_in_days: default_expires_in_days(),
            default_plan: PlanId::new("activation"),
            catalogs: RegionalCatalogs {
                brazil: PlanCatalog::new(vec![brazil]),
                international: PlanCatalog::new(vec![international]),
            },
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ticks = [
            ("confirm_ticks", self.confirm_ticks),
            ("qr_expiry_ticks", self.qr_expiry_ticks),
            ("card_processing_ticks", self.card_processing_ticks),
            ("copied_feedback_ticks", self.copied_feedback_ticks),
        ];
        for (field, value) in ticks {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be positive", field)));
            }
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".to_string()));
        }
        if self.reference_tag.is_empty() {
            return Err(ConfigError::Invalid("reference_tag must not be empty".to_string()));
        }

        for (region, catalog) in [
            ("brazil", &self.catalogs.brazil),
            ("international", &self.catalogs.international),
        ] {
            if catalog.is_empty() {
                return Err(ConfigError::Invalid(format!("{} catalog has no plans", region)));
            }
            if catalog.get(&self.default_plan).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "default plan {} missing from {} catalog",
                    self.default_plan, region
                )));
            }
            if let Some(free) = catalog.iter().find(|p| p.base_price == 0 || p.discounted_price == 0) {
                return Err(ConfigError::Invalid(format!(
                    "plan {} in {} catalog has a zero price",
                    free.id, region
                )));
            }
        }
        Ok(())
    }
}
