use parking_lot::Mutex;
use tracing::{info, warn};

/// Looks up user-facing strings for the current language.
pub trait Translator: Send + Sync {
    fn t(&self, key: &str) -> String;
    fn language(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Error,
}

/// Toast sink of the presentation layer.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotifyKind, message: &str);
}

/// The strings the checkout itself emits, in English and Portuguese.
/// Unknown keys fall back to the key.
#[derive(Debug, Clone)]
pub struct StaticTranslator {
    language: String,
}

impl StaticTranslator {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into().to_ascii_lowercase(),
        }
    }
}

impl Translator for StaticTranslator {
    fn t(&self, key: &str) -> String {
        let english = self.language == "en";
        let text = match key {
            "coupon_applied" if english => "Coupon applied successfully!",
            "coupon_applied" => "Cupom aplicado com sucesso!",
            "invalid_coupon" if english => "Invalid coupon.",
            "invalid_coupon" => "Cupom inválido.",
            "pix_error" if english => "Could not generate the PIX code. Please try again.",
            "pix_error" => "Não foi possível gerar o código PIX. Tente novamente.",
            "copied" if english => "Copied!",
            "copied" => "Copiado!",
            "card_details_missing" if english => "Please fill in all card details.",
            "card_details_missing" => "Por favor, preencha todos os detalhes do cartão.",
            "payment_success" if english => "Payment successful! Your account has been activated.",
            "payment_success" => "Pagamento realizado com sucesso! Sua conta foi ativada.",
            other => other,
        };
        text.to_string()
    }

    fn language(&self) -> &str {
        &self.language
    }
}

/// Sends notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotifyKind, message: &str) {
        match kind {
            NotifyKind::Success => info!("notify: {}", message),
            NotifyKind::Error => warn!("notify: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotifyKind,
    pub message: String,
}

/// Buffers notifications until the presentation layer drains them.
#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: Mutex<Vec<Notification>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, kind: NotifyKind, message: &str) {
        self.pending.lock().push(Notification {
            kind,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translator_languages() {
        assert_eq!(StaticTranslator::new("en").t("copied"), "Copied!");
        assert_eq!(StaticTranslator::new("pt").t("copied"), "Copiado!");
        assert_eq!(StaticTranslator::new("es").t("copied"), "Copiado!");
        assert_eq!(StaticTranslator::new("en").t("unknown_key"), "unknown_key");
    }

    #[test]
    fn test_toast_queue_drains_in_order() {
        let toasts = ToastQueue::new();
        toasts.notify(NotifyKind::Error, "first");
        toasts.notify(NotifyKind::Success, "second");
        assert_eq!(toasts.len(), 2);

        let drained = toasts.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind, NotifyKind::Error);
        assert_eq!(drained[1].message, "second");
        assert!(toasts.is_empty());
    }
}
