use crate::app::config::{ConfigError, FlowProfile};
use crate::models::checkout::{
    CardDetails, CardField, CheckoutOutcome, CheckoutSession, Locale, PaymentMethod, Screen,
};
use crate::models::payment::{IntentRequest, PixIntent};
use crate::models::plan::{Plan, PlanCatalog, PlanId, Region};
use crate::queue::checkout_queue::{create_queue, CheckoutEvent, IntentFailure, TimerKind};
use crate::services::clipboard::{Clipboard, ClipboardError};
use crate::services::countdown::{Countdown, CountdownError, TimerHandle};
use crate::services::coupon::CouponPolicy;
use crate::services::notifications::{Notifier, NotifyKind, Translator};
use crate::services::pix_intent_client::PaymentIntentClient;
use crate::services::policy::{MethodPolicy, RegionPolicy};
use crate::utils::money::{discount_percentage, format_currency};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid coupon code")]
    InvalidCoupon,
    #[error("card field {} is required", .0.as_str())]
    MissingCardField(CardField),
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{operation} is not allowed on the {screen} screen")]
    InvalidTransition {
        operation: &'static str,
        screen: &'static str,
    },
    #[error("unknown plan {0}")]
    UnknownPlan(PlanId),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Timer(#[from] CountdownError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// External services the checkout talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub intents: Arc<dyn PaymentIntentClient>,
    pub translator: Arc<dyn Translator>,
    pub notifier: Arc<dyn Notifier>,
    pub clipboard: Arc<dyn Clipboard>,
    pub coupons: Arc<dyn CouponPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutOptions {
    pub region: Region,
    pub method: PaymentMethod,
}

impl CheckoutOptions {
    pub fn for_locale(locale: &Locale, regions: &dyn RegionPolicy, methods: &dyn MethodPolicy) -> Self {
        Self {
            region: regions.region(locale),
            method: methods.method(locale),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanQuote {
    pub plan: PlanId,
    pub display_name: String,
    pub price: u64,
    pub list_price: u64,
    pub formatted_price: String,
    pub formatted_list_price: String,
    pub discount_percent: u32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferView {
    pub plans: Vec<PlanQuote>,
    pub coupon_applied: bool,
    pub method: PaymentMethod,
}

fn tick_event(timer: TimerKind) -> impl Fn(TimerHandle, u32) -> CheckoutEvent + Send + 'static {
    move |handle, remaining| CheckoutEvent::Tick {
        timer,
        handle,
        remaining,
    }
}

/// The activation / plan checkout state machine.
///
/// User actions are the synchronous methods. Timers and the intent request
/// report back through an internal queue that [`CheckoutService::step`]
/// drains in arrival order. Both the activation popup and the plan page are
/// this type with a different [`FlowProfile`].
pub struct CheckoutService {
    profile: Arc<FlowProfile>,
    session: CheckoutSession,
    deps: Collaborators,
    events_tx: mpsc::Sender<CheckoutEvent>,
    events_rx: mpsc::Receiver<CheckoutEvent>,
    confirm: Countdown,
    expiry: Countdown,
    copied: Countdown,
    processing: Countdown,
    in_flight: Option<JoinHandle<()>>,
    pending_failure: Option<IntentFailure>,
    screens: watch::Sender<Screen>,
}

impl CheckoutService {
    pub fn new(
        profile: Arc<FlowProfile>,
        options: CheckoutOptions,
        deps: Collaborators,
        queue_buffer: usize,
    ) -> Result<Self, CheckoutError> {
        profile.validate()?;
        let plan = profile.default_plan.clone();
        if profile.catalogs.for_region(options.region).get(&plan).is_none() {
            return Err(CheckoutError::UnknownPlan(plan));
        }

        let session = CheckoutSession::new(plan, options.region, options.method, profile.coupon_preapplied);
        let (events_tx, events_rx) = create_queue(queue_buffer.max(1));
        let (screens, _) = watch::channel(session.screen.clone());

        info!(
            "Checkout session {} opened: profile={} region={:?} method={:?} language={}",
            session.id,
            profile.name,
            session.region,
            session.method,
            deps.translator.language()
        );

        Ok(Self {
            profile,
            session,
            deps,
            events_tx,
            events_rx,
            confirm: Countdown::new("confirm"),
            expiry: Countdown::new("qr_expiry"),
            copied: Countdown::new("copied_feedback"),
            processing: Countdown::new("card_processing"),
            in_flight: None,
            pending_failure: None,
            screens,
        })
    }

    pub fn screen(&self) -> &Screen {
        &self.session.screen
    }

    pub fn session(&self) -> &CheckoutSession {
        &self.session
    }

    pub fn profile(&self) -> &FlowProfile {
        &self.profile
    }

    /// Receiver that always holds the latest screen.
    pub fn screens(&self) -> watch::Receiver<Screen> {
        self.screens.subscribe()
    }

    /// The value to encode in the QR and to copy. Only present while a QR is shown.
    pub fn qr_content(&self) -> Option<&str> {
        match &self.session.screen {
            Screen::QrDisplayed { intent, time_left, .. } if *time_left > 0 => Some(&intent.qr_payload),
            _ => None,
        }
    }

    pub fn current_price(&self) -> Result<u64, CheckoutError> {
        self.catalog()
            .quote(&self.session.plan, self.session.coupon.applied)
            .ok_or_else(|| CheckoutError::UnknownPlan(self.session.plan.clone()))
    }

    pub fn offer(&self) -> OfferView {
        let applied = self.session.coupon.applied;
        let plans = self
            .catalog()
            .iter()
            .map(|plan| {
                let price = plan.quoted_price(applied);
                PlanQuote {
                    plan: plan.id.clone(),
                    display_name: plan.display_name.clone(),
                    price,
                    list_price: plan.base_price,
                    formatted_price: format_currency(price, plan.currency),
                    formatted_list_price: format_currency(plan.base_price, plan.currency),
                    discount_percent: discount_percentage(plan.base_price, price),
                    active: plan.id == self.session.plan,
                }
            })
            .collect();

        OfferView {
            plans,
            coupon_applied: applied,
            method: self.session.method,
        }
    }

    pub fn select_plan(&mut self, plan: impl Into<PlanId>) -> Result<(), CheckoutError> {
        self.expect_offer("select_plan")?;
        let plan = plan.into();
        if self.catalog().get(&plan).is_none() {
            return Err(CheckoutError::UnknownPlan(plan));
        }
        debug!("Session {} selected plan {}", self.session.id, plan);
        self.session.plan = plan;
        Ok(())
    }

    pub fn apply_coupon(&mut self, code: &str) -> Result<(), CheckoutError> {
        self.expect_offer("apply_coupon")?;
        self.session.coupon.input = code.to_string();

        if self.deps.coupons.accepts(code) {
            self.session.coupon.applied = true;
            self.session.coupon.input.clear();
            info!("Session {} coupon applied", self.session.id);
            self.notify(NotifyKind::Success, "coupon_applied");
            Ok(())
        } else {
            self.session.coupon.applied = false;
            warn!("Session {} rejected coupon", self.session.id);
            self.notify(NotifyKind::Error, "invalid_coupon");
            Err(ValidationError::InvalidCoupon.into())
        }
    }

    /// Starts the confirm countdown. For PIX the intent request goes out at
    /// the same time so the QR is ready when the countdown ends. A second call
    /// while counting is ignored.
    pub fn subscribe(&mut self) -> Result<(), CheckoutError> {
        match self.session.screen {
            Screen::Offer => {}
            Screen::ConfirmingCountdown { .. } => {
                debug!("Session {} subscribe ignored: already counting", self.session.id);
                return Ok(());
            }
            ref other => return Err(self.invalid("subscribe", other)),
        }

        // preço calculado no momento do subscribe, não na seleção
        let amount = self.current_price()?;
        let ticks = self.profile.confirm_ticks;
        self.confirm.start(
            ticks,
            self.profile.tick_interval(),
            self.events_tx.clone(),
            tick_event(TimerKind::Confirm),
        )?;

        self.session.pix_intent = None;
        self.pending_failure = None;
        self.session.countdown_value = ticks;
        info!(
            "Session {} subscribed to {} at {} via {:?}",
            self.session.id, self.session.plan, amount, self.session.method
        );
        self.set_screen(Screen::ConfirmingCountdown { remaining: ticks });

        if self.session.method.requires_intent() {
            self.issue_intent(amount)?;
        }
        Ok(())
    }

    /// Issues one new intent request after a failure or an expired QR.
    pub fn retry(&mut self) -> Result<(), CheckoutError> {
        match self.session.screen {
            Screen::ErrorDisplayed { .. } | Screen::ExpiredDisplayed => {}
            ref other => return Err(self.invalid("retry", other)),
        }

        let amount = self.current_price()?;
        self.discard_intent();
        info!("Session {} retrying intent", self.session.id);
        self.set_screen(Screen::AwaitingIntent);
        self.issue_intent(amount)
    }

    pub fn copy_code(&mut self) -> Result<(), CheckoutError> {
        let payload = match &self.session.screen {
            Screen::QrDisplayed { intent, .. } => intent.qr_payload.clone(),
            other => return Err(self.invalid("copy_code", other)),
        };

        self.deps.clipboard.write_text(&payload)?;

        self.copied.cancel();
        self.copied.start(
            self.profile.copied_feedback_ticks,
            self.profile.tick_interval(),
            self.events_tx.clone(),
            tick_event(TimerKind::CopiedFeedback),
        )?;

        if let Screen::QrDisplayed { copied, .. } = &mut self.session.screen {
            *copied = true;
        }
        self.publish();
        self.notify(NotifyKind::Success, "copied");
        Ok(())
    }

    pub fn submit_card(&mut self, details: CardDetails) -> Result<(), CheckoutError> {
        match self.session.screen {
            Screen::CreditCardForm => {}
            ref other => return Err(self.invalid("submit_card", other)),
        }

        if let Some(field) = details.missing_field() {
            warn!("Session {} card submission missing {}", self.session.id, field.as_str());
            self.notify(NotifyKind::Error, "card_details_missing");
            return Err(ValidationError::MissingCardField(field).into());
        }

        let ticks = self.profile.card_processing_ticks;
        self.processing.start(
            ticks,
            self.profile.tick_interval(),
            self.events_tx.clone(),
            tick_event(TimerKind::CardProcessing),
        )?;
        self.session.card_details = Some(details);
        self.set_screen(Screen::Validating { remaining: ticks });
        Ok(())
    }

    /// Leaves the checkout: stops every timer and drops any in-flight request.
    pub fn abandon(&mut self) {
        if self.session.screen.is_terminal() {
            return;
        }
        self.abort_in_flight();
        self.discard_intent();
        self.session.attempt += 1;
        info!("Session {} abandoned on {}", self.session.id, self.session.screen.name());
        self.set_screen(Screen::Result(CheckoutOutcome::Abandoned));
    }

    /// Waits for the next timer tick or intent response and applies it.
    ///
    /// Returns `None` without waiting when nothing is left to report: no timer
    /// running, no request in flight and the queue empty. Only a user action
    /// can move the screen from there.
    pub async fn step(&mut self) -> Option<&Screen> {
        let event = self.next_event().await?;
        self.handle_event(event);
        Some(&self.session.screen)
    }

    /// Steps until `done` holds or the checkout goes idle. The returned screen
    /// may not satisfy `done` when it stopped because of the latter.
    pub async fn run_until<F>(&mut self, mut done: F) -> &Screen
    where
        F: FnMut(&Screen) -> bool,
    {
        while !done(&self.session.screen) {
            match self.next_event().await {
                Some(event) => self.handle_event(event),
                None => {
                    debug!(
                        "Session {} idle on {}, waiting for user action",
                        self.session.id,
                        self.session.screen.name()
                    );
                    break;
                }
            }
        }
        &self.session.screen
    }

    /// Whether a timer or the intent request can still put an event on the queue.
    pub fn has_pending_events(&self) -> bool {
        self.confirm.is_running()
            || self.expiry.is_running()
            || self.copied.is_running()
            || self.processing.is_running()
            || self
                .in_flight
                .as_ref()
                .is_some_and(|task| !task.is_finished())
    }

    async fn next_event(&mut self) -> Option<CheckoutEvent> {
        // checar as fontes antes do try_recv: um envio concluído já está na fila
        let live = self.has_pending_events();
        match self.events_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) if live => self.events_rx.recv().await,
            Err(_) => None,
        }
    }

    pub fn handle_event(&mut self, event: CheckoutEvent) {
        match event {
            CheckoutEvent::Tick {
                timer,
                handle,
                remaining,
            } => self.on_tick(timer, handle, remaining),
            CheckoutEvent::IntentResolved { attempt, result } => self.on_intent(attempt, result),
        }
    }

    fn on_tick(&mut self, timer: TimerKind, handle: TimerHandle, remaining: u32) {
        let accepted = match timer {
            TimerKind::Confirm => self.confirm.accept(handle, remaining),
            TimerKind::QrExpiry => self.expiry.accept(handle, remaining),
            TimerKind::CopiedFeedback => self.copied.accept(handle, remaining),
            TimerKind::CardProcessing => self.processing.accept(handle, remaining),
        };
        if !accepted {
            debug!("Session {} dropped stale {:?} tick", self.session.id, timer);
            return;
        }

        match timer {
            TimerKind::Confirm => {
                self.session.countdown_value = remaining;
                if remaining > 0 {
                    self.set_screen(Screen::ConfirmingCountdown { remaining });
                } else {
                    self.on_confirm_finished();
                }
            }
            TimerKind::QrExpiry => {
                self.session.expiry_value = remaining;
                if remaining == 0 {
                    info!("Session {} QR expired", self.session.id);
                    self.set_screen(Screen::ExpiredDisplayed);
                } else {
                    if let Screen::QrDisplayed { time_left, .. } = &mut self.session.screen {
                        *time_left = remaining;
                    }
                    self.publish();
                }
            }
            TimerKind::CopiedFeedback => {
                if remaining == 0 {
                    if let Screen::QrDisplayed { copied, .. } = &mut self.session.screen {
                        *copied = false;
                    }
                    self.publish();
                }
            }
            TimerKind::CardProcessing => {
                if remaining > 0 {
                    self.set_screen(Screen::Validating { remaining });
                } else {
                    info!("Session {} card payment accepted", self.session.id);
                    self.notify(NotifyKind::Success, "payment_success");
                    self.set_screen(Screen::Result(CheckoutOutcome::Success));
                }
            }
        }
    }

    fn on_confirm_finished(&mut self) {
        match self.session.method {
            PaymentMethod::Card => self.set_screen(Screen::CreditCardForm),
            PaymentMethod::Pix => {
                if let Some(intent) = self.session.pix_intent.clone() {
                    self.show_qr(intent);
                } else if let Some(failure) = self.pending_failure.take() {
                    self.set_screen(Screen::AwaitingIntent);
                    self.show_failure(failure);
                } else {
                    self.set_screen(Screen::AwaitingIntent);
                }
            }
        }
    }

    fn on_intent(&mut self, attempt: u64, result: Result<PixIntent, IntentFailure>) {
        if attempt != self.session.attempt {
            debug!(
                "Session {} discarded stale intent response (attempt {}, current {})",
                self.session.id, attempt, self.session.attempt
            );
            return;
        }
        self.in_flight = None;

        match self.session.screen {
            Screen::ConfirmingCountdown { .. } => match result {
                Ok(intent) => {
                    debug!("Session {} intent {} ready before countdown end", self.session.id, intent.id);
                    self.session.pix_intent = Some(intent);
                }
                Err(failure) => self.pending_failure = Some(failure),
            },
            Screen::AwaitingIntent => match result {
                Ok(intent) => {
                    self.session.pix_intent = Some(intent.clone());
                    self.show_qr(intent);
                }
                Err(failure) => self.show_failure(failure),
            },
            ref other => {
                debug!(
                    "Session {} ignored intent response on {}",
                    self.session.id,
                    other.name()
                );
            }
        }
    }

    fn show_qr(&mut self, intent: PixIntent) {
        let ticks = self.profile.qr_expiry_ticks;
        self.expiry.cancel();
        if let Err(e) = self.expiry.start(
            ticks,
            self.profile.tick_interval(),
            self.events_tx.clone(),
            tick_event(TimerKind::QrExpiry),
        ) {
            error!("Session {} could not start QR expiry: {}", self.session.id, e);
            self.show_failure(IntentFailure { reason: e.to_string() });
            return;
        }

        info!("Session {} showing QR for intent {}", self.session.id, intent.id);
        self.session.expiry_value = ticks;
        self.set_screen(Screen::QrDisplayed {
            intent,
            time_left: ticks,
            copied: false,
        });
    }

    fn show_failure(&mut self, failure: IntentFailure) {
        warn!(
            "Session {} intent attempt {} failed: {}",
            self.session.id, self.session.attempt, failure.reason
        );
        let message = self.deps.translator.t("pix_error");
        self.deps.notifier.notify(NotifyKind::Error, &message);
        self.set_screen(Screen::ErrorDisplayed { message });
    }

    fn issue_intent(&mut self, amount: u64) -> Result<(), CheckoutError> {
        self.session.attempt += 1;
        let attempt = self.session.attempt;
        let plan = self.active_plan()?;
        let request = IntentRequest {
            amount_minor: amount,
            reference: format!(
                "{}_{}_{}_{}",
                self.profile.reference_tag,
                plan.id.as_str().to_uppercase(),
                Utc::now().timestamp_millis(),
                attempt
            ),
            title: plan.item_title(),
            expires_in_days: self.profile.pix_expires_in_days,
        };

        info!(
            "Session {} requesting PIX intent {} for {}",
            self.session.id, request.reference, amount
        );

        let client = Arc::clone(&self.deps.intents);
        let events = self.events_tx.clone();
        self.abort_in_flight();
        self.in_flight = Some(tokio::spawn(async move {
            let result = client
                .create_intent(&request)
                .await
                .map_err(|e| IntentFailure { reason: e.to_string() });
            if events
                .send(CheckoutEvent::IntentResolved { attempt, result })
                .await
                .is_err()
            {
                debug!("Intent response for {} dropped: checkout closed", request.reference);
            }
        }));
        Ok(())
    }

    fn discard_intent(&mut self) {
        self.session.pix_intent = None;
        self.pending_failure = None;
        self.session.expiry_value = 0;
        self.expiry.cancel();
        self.copied.cancel();
    }

    fn abort_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }

    fn set_screen(&mut self, screen: Screen) {
        // timers pertencem à tela que os iniciou
        if !matches!(screen, Screen::ConfirmingCountdown { .. }) {
            self.confirm.cancel();
        }
        if !matches!(screen, Screen::QrDisplayed { .. }) {
            self.expiry.cancel();
            self.copied.cancel();
        }
        if !matches!(screen, Screen::Validating { .. }) {
            self.processing.cancel();
        }

        if self.session.screen.name() != screen.name() {
            debug!(
                "Session {} screen {} -> {}",
                self.session.id,
                self.session.screen.name(),
                screen.name()
            );
        }
        self.session.screen = screen;
        self.publish();
    }

    fn publish(&self) {
        self.screens.send_replace(self.session.screen.clone());
    }

    fn notify(&self, kind: NotifyKind, key: &str) {
        let message = self.deps.translator.t(key);
        self.deps.notifier.notify(kind, &message);
    }

    fn catalog(&self) -> &PlanCatalog {
        self.profile.catalogs.for_region(self.session.region)
    }

    fn active_plan(&self) -> Result<Plan, CheckoutError> {
        self.catalog()
            .get(&self.session.plan)
            .cloned()
            .ok_or_else(|| CheckoutError::UnknownPlan(self.session.plan.clone()))
    }

    fn expect_offer(&self, operation: &'static str) -> Result<(), CheckoutError> {
        match &self.session.screen {
            Screen::Offer => Ok(()),
            other => Err(self.invalid(operation, other)),
        }
    }

    fn invalid(&self, operation: &'static str, screen: &Screen) -> CheckoutError {
        debug!("Session {} rejected {} on {}", self.session.id, operation, screen.name());
        CheckoutError::InvalidTransition {
            operation,
            screen: screen.name(),
        }
    }
}

impl Drop for CheckoutService {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}
