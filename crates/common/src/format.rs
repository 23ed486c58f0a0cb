//! Display formatting for outbound messages.

use crate::lang::Localizer;

/// Formats a raw on-chain amount by dividing by the coin's atomic unit,
/// keeping two fractional digits.
pub fn amount(value: u64, atomic_unit: u16) -> String {
    let scaled = value as f64 / atomic_unit.max(1) as f64;
    format!("{scaled:.2}")
}

/// Localized yes/no.
pub fn bool_text(value: bool, localizer: &Localizer<'_>) -> String {
    localizer.render(if value { "Yes" } else { "No" }, &[])
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::lang::Languages;

    #[test]
    fn test_amount_scaling() {
        assert_eq!(amount(150, 100), "1.50");
        assert_eq!(amount(0, 100), "0.00");
        assert_eq!(amount(1, 1000), "0.00");
        assert_eq!(amount(12_345, 1000), "12.35");
    }

    #[test]
    fn test_amount_zero_atomic_unit_does_not_divide_by_zero() {
        assert_eq!(amount(42, 0), "42.00");
    }

    #[test]
    fn test_bool_text() {
        let mut en = HashMap::new();
        en.insert("Yes".to_owned(), "yes".to_owned());
        en.insert("No".to_owned(), "no".to_owned());
        let mut map = HashMap::new();
        map.insert("en".to_owned(), en);
        let langs = Languages::from_bundles(map).unwrap();
        let loc = langs.localizer("en");

        assert_eq!(bool_text(true, &loc), "yes");
        assert_eq!(bool_text(false, &loc), "no");
    }
}
