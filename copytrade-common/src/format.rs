// format.rs
// Display rules shared by every view of market and account data

use rust_decimal::{Decimal, RoundingStrategy};

/// Price with precision chosen by magnitude.
///
/// Below 1 shows 6 decimals, below 100 shows 4, anything else 2.
pub fn format_price(price: Decimal) -> String {
    let dp = price_decimals(price);
    fixed(price, dp)
}

pub fn price_decimals(price: Decimal) -> u32 {
    if price < Decimal::ONE {
        6
    } else if price < Decimal::ONE_HUNDRED {
        4
    } else {
        2
    }
}

/// Signed percentage, e.g. `+1.23%` or `-0.50%`. Zero is shown as `+0.00%`.
pub fn format_percent(value: Decimal) -> String {
    let body = fixed(value.abs(), 2);
    if value.is_sign_negative() && body != "0.00" {
        format!("-{}%", body)
    } else {
        format!("+{}%", body)
    }
}

/// Dollar amount with thousands separators
pub fn format_usd(value: Decimal) -> String {
    let body = fixed(value.abs(), 2);
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() && body != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac_part)
}

/// `0x1234...abcd`. Inputs too short to shorten are returned as-is.
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 12 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.1$}", rounded, dp as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_precision_tiers() {
        assert_eq!(format_price(dec!(0.5)), "0.500000");
        assert_eq!(format_price(dec!(0.00012345)), "0.000123");
        assert_eq!(format_price(dec!(1)), "1.0000");
        assert_eq!(format_price(dec!(42.123456)), "42.1235");
        assert_eq!(format_price(dec!(99.99)), "99.9900");
        assert_eq!(format_price(dec!(100)), "100.00");
        assert_eq!(format_price(dec!(64250.567)), "64250.57");
    }

    #[test]
    fn test_precision_tiers_are_monotonic() {
        let samples = [dec!(0.001), dec!(0.99), dec!(1), dec!(50), dec!(99.9), dec!(100), dec!(1000)];
        let mut last = u32::MAX;
        for price in samples {
            let dp = price_decimals(price);
            assert!(dp <= last, "precision grew at {}", price);
            last = dp;
        }
    }

    #[test]
    fn test_percent_is_always_signed() {
        assert_eq!(format_percent(dec!(1.234)), "+1.23%");
        assert_eq!(format_percent(dec!(-0.5)), "-0.50%");
        assert_eq!(format_percent(Decimal::ZERO), "+0.00%");
        assert_eq!(format_percent(dec!(-0.001)), "+0.00%");
    }

    #[test]
    fn test_usd_grouping() {
        assert_eq!(format_usd(dec!(0)), "$0.00");
        assert_eq!(format_usd(dec!(999.5)), "$999.50");
        assert_eq!(format_usd(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_usd(dec!(-1500)), "-$1,500.00");
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(
            shorten_address("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234...5678"
        );
        assert_eq!(shorten_address("0xabc"), "0xabc");
    }
}
