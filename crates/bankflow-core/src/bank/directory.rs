//! Pure operations over bank listings.

use super::logo::LogoTable;
use super::model::Bank;

/// Keeps the banks whose name contains `term`, ignoring case, in input order.
pub fn filter_banks(banks: Vec<Bank>, term: &str) -> Vec<Bank> {
    let needle = term.to_lowercase();
    banks
        .into_iter()
        .filter(|bank| bank.name.to_lowercase().contains(&needle))
        .collect()
}

/// Sets `logo_link` on every bank from `table`.
pub fn attach_logo_links(mut banks: Vec<Bank>, table: &LogoTable) -> Vec<Bank> {
    for bank in &mut banks {
        bank.logo_link = Some(table.link_for(&bank.id).to_string());
    }
    banks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::DEFAULT_LOGO_URL;

    fn banks() -> Vec<Bank> {
        vec![
            Bank::new("SWEDBANK_HABALV22", "Swedbank"),
            Bank::new("CITADELE_PARXLV22", "Citadele"),
            Bank::new("SEB_UNLALV2X", "SEB"),
            Bank::new("LUMINOR_RIKOLV2X", "Luminor Bank"),
            Bank::new("BLUOR_BANK_CBBRLV22", "BluOr Bank"),
        ]
    }

    fn ids(banks: &[Bank]) -> Vec<&str> {
        banks.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_filter_is_case_insensitive_and_ordered() {
        let filtered = filter_banks(banks(), "BANK");
        assert_eq!(
            ids(&filtered),
            vec!["SWEDBANK_HABALV22", "LUMINOR_RIKOLV2X", "BLUOR_BANK_CBBRLV22"]
        );
        assert!(filtered.iter().all(|b| b.name.to_lowercase().contains("bank")));
    }

    #[test]
    fn test_filter_without_match_is_empty() {
        assert!(filter_banks(banks(), "revolut").is_empty());
    }

    #[test]
    fn test_empty_term_keeps_everything() {
        assert_eq!(filter_banks(banks(), "").len(), 5);
    }

    #[test]
    fn test_attach_logo_links_uses_default_for_missing() {
        let table = LogoTable::parse("id,logo\nSEB_UNLALV2X,https://cdn.example/seb.png\n");
        let banks = attach_logo_links(banks(), &table);

        for bank in &banks {
            let expected = if bank.id == "SEB_UNLALV2X" {
                "https://cdn.example/seb.png"
            } else {
                DEFAULT_LOGO_URL
            };
            assert_eq!(bank.logo_link.as_deref(), Some(expected));
        }
    }
}
