//! Token amount formatting.

use pledge_types::Amount;

/// Render a raw amount as whole tokens with up to 18 fractional digits,
/// trailing zeros trimmed.
pub fn format_token_amount(amount: Amount) -> String {
    let unit = Amount::UNIT;
    let whole = amount.raw() / unit;
    let frac = amount.raw() % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:018}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_tokens() {
        assert_eq!(format_token_amount(Amount::from_tokens(5)), "5");
        assert_eq!(format_token_amount(Amount::ZERO), "0");
    }

    #[test]
    fn fractional_tokens() {
        let half = Amount::new(Amount::UNIT / 2);
        assert_eq!(format_token_amount(half), "0.5");
        assert_eq!(format_token_amount(Amount::new(1)), "0.000000000000000001");
    }
}
