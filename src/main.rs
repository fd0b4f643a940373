use pix_checkout::app::config::Config;
use pix_checkout::models::checkout::{CardDetails, CheckoutOutcome, Locale, Screen};
use pix_checkout::services::auth_session::{AuthSession, FileFlagStore, FlagStore, MemoryFlagStore};
use pix_checkout::services::clipboard::MemoryClipboard;
use pix_checkout::services::coupon::CanonicalCoupon;
use pix_checkout::services::notifications::{StaticTranslator, TracingNotifier};
use pix_checkout::services::policy::LanguagePolicy;
use pix_checkout::services::{CheckoutOptions, CheckoutService, Collaborators, HttpPixClient};
use pix_checkout::utils::clock::format_countdown;
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn card_from_env() -> CardDetails {
    let var = |name: &str| env::var(name).unwrap_or_default();
    CardDetails {
        number: var("CARD_NUMBER"),
        holder_name: var("CARD_NAME"),
        expiry: var("CARD_EXPIRY"),
        cvv: var("CARD_CVV"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    config.validate()?;
    let profile = Arc::new(config.load_profile()?);
    let client = HttpPixClient::new(&config)?;
    info!("Starting checkout demo with profile {} against {}", profile.name, client.endpoint());

    let store: Arc<dyn FlagStore> = match &config.state_file {
        Some(path) => Arc::new(FileFlagStore::new(path)),
        None => Arc::new(MemoryFlagStore::new()),
    };
    let auth = AuthSession::new(store);
    if auth.is_authenticated()? {
        info!("Account already active, nothing to check out");
        return Ok(());
    }

    let locale = Locale::new(&config.language);
    let policy = LanguagePolicy::default();
    let options = CheckoutOptions::for_locale(&locale, &policy, &policy);

    let deps = Collaborators {
        intents: Arc::new(client),
        translator: Arc::new(StaticTranslator::new(locale.language())),
        notifier: Arc::new(TracingNotifier),
        clipboard: Arc::new(MemoryClipboard::new()),
        coupons: Arc::new(CanonicalCoupon::new(config.coupon_code.clone())),
    };
    let mut checkout = CheckoutService::new(profile, options, deps, config.queue_buffer_size)?;

    if let Ok(plan) = env::var("DEMO_PLAN") {
        checkout.select_plan(plan.as_str())?;
    }
    if let Ok(code) = env::var("DEMO_COUPON") {
        if let Err(e) = checkout.apply_coupon(&code) {
            warn!("Coupon not applied: {}", e);
        }
    }
    for quote in checkout.offer().plans {
        info!(
            "{}{}: {} (list {}, {}% off)",
            if quote.active { "* " } else { "  " },
            quote.display_name,
            quote.formatted_price,
            quote.formatted_list_price,
            quote.discount_percent
        );
    }

    let mut screens = checkout.screens();
    tokio::spawn(async move {
        let mut last = "";
        while screens.changed().await.is_ok() {
            let name = screens.borrow().name();
            if name != last {
                info!("screen: {}", name);
                last = name;
            }
        }
    });

    checkout.subscribe()?;
    let screen = checkout
        .run_until(|s| {
            matches!(
                s,
                Screen::QrDisplayed { .. } | Screen::ErrorDisplayed { .. } | Screen::CreditCardForm
            )
        })
        .await
        .clone();

    match screen {
        Screen::QrDisplayed { intent, time_left, .. } => {
            checkout.copy_code()?;
            info!("PIX code {} expires in {}", intent.qr_payload, format_countdown(time_left));
            tokio::select! {
                _ = checkout.run_until(|s| matches!(s, Screen::ExpiredDisplayed)) => {
                    info!("PIX code expired");
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                }
            }
            checkout.abandon();
        }
        Screen::CreditCardForm => {
            if let Err(e) = checkout.submit_card(card_from_env()) {
                warn!("Card rejected: {}", e);
                checkout.abandon();
                return Ok(());
            }
            let result = checkout.run_until(Screen::is_terminal).await;
            if *result == Screen::Result(CheckoutOutcome::Success) {
                auth.sign_in()?;
            }
        }
        Screen::ErrorDisplayed { message } => {
            warn!("Checkout failed: {}", message);
            checkout.abandon();
        }
        _ => checkout.abandon(),
    }

    Ok(())
}
