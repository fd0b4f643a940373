// Utilitários para manipulação de valores monetários

use crate::models::plan::Currency;

pub fn format_currency(amount: u64, currency: Currency) -> String {
    let (thousands, decimal, prefix) = match currency {
        Currency::Usd => (',', '.', "$"),
        Currency::Brl => ('.', ',', "R$ "),
    };

    let units = (amount / 100).to_string();
    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(thousands);
        }
        grouped.push(digit);
    }

    format!("{}{}{}{:02}", prefix, grouped, decimal, amount % 100)
}

/// Rounded discount of `price` relative to `list_price`, in percent.
pub fn discount_percentage(list_price: u64, price: u64) -> u32 {
    if list_price == 0 || price >= list_price {
        return 0;
    }
    let saved = (list_price - price) as f64;
    (saved / list_price as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(2099, Currency::Usd), "$20.99");
        assert_eq!(format_currency(10790, Currency::Brl), "R$ 107,90");
        assert_eq!(format_currency(326760, Currency::Brl), "R$ 3.267,60");
        assert_eq!(format_currency(123456789, Currency::Usd), "$1,234,567.89");
        assert_eq!(format_currency(5, Currency::Usd), "$0.05");
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(discount_percentage(49990, 10790), 78); // ativação BRL
        assert_eq!(discount_percentage(9999, 2099), 79);
        assert_eq!(discount_percentage(0, 100), 0);
        assert_eq!(discount_percentage(100, 200), 0);
    }
}
