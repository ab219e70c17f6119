//! Sequential transaction and customer codes

use chrono::Datelike;

use super::CodeError;

/// Offset from the Gregorian to the Buddhist era year
pub const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Two-digit Buddhist-era year followed by the two-digit month, e.g. `6701`
pub fn period_code<D: Datelike>(date: &D) -> String {
    format!(
        "{:02}{:02}",
        (date.year() + BUDDHIST_ERA_OFFSET) % 100,
        date.month()
    )
}

/// Kinds of transaction that carry a prefixed sequence code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Purchase,
    Sale,
}

impl TransactionKind {
    /// `PUR-VAT`, `PUR-NV`, `INV` or `NV`
    pub fn marker(&self, is_vat: bool) -> &'static str {
        match (self, is_vat) {
            (TransactionKind::Purchase, true) => "PUR-VAT",
            (TransactionKind::Purchase, false) => "PUR-NV",
            (TransactionKind::Sale, true) => "INV",
            (TransactionKind::Sale, false) => "NV",
        }
    }

    /// Marker plus period, e.g. `PUR-VAT-6701`
    pub fn prefix<D: Datelike>(&self, is_vat: bool, date: &D) -> String {
        format!("{}-{}", self.marker(is_vat), period_code(date))
    }

    fn sequence_of(&self, code: &str) -> Option<u32> {
        match self {
            // last four characters
            TransactionKind::Purchase => {
                let start = code.len().checked_sub(4)?;
                code.get(start..)?.parse().ok()
            }
            // last dash-separated part, at least three parts
            TransactionKind::Sale => {
                let parts: Vec<&str> = code.split('-').collect();
                if parts.len() < 3 {
                    return None;
                }
                parts.last()?.parse().ok()
            }
        }
    }
}

/// Next sequence for `prefix` given every stored code
///
/// Takes the lexicographically greatest code starting with `prefix` (case-insensitive),
/// parses its trailing sequence and adds one. Falls back to 1. Two callers that see the
/// same codes get the same answer; uniqueness is enforced where codes are stored.
pub fn next_sequence_number<S: AsRef<str>>(kind: TransactionKind, prefix: &str, codes: &[S]) -> u32 {
    let prefix = prefix.to_lowercase();
    codes
        .iter()
        .map(AsRef::as_ref)
        .filter(|code| code.to_lowercase().starts_with(&prefix))
        .max()
        .and_then(|last| kind.sequence_of(last))
        .map(|seq| seq + 1)
        .unwrap_or(1)
}

/// `<prefix>-<sequence, 4 digits>`
pub fn format_sequence_code(prefix: &str, sequence: u32) -> String {
    format!("{}-{:04}", prefix, sequence)
}

/// `QU-<YYMM>-<last sequence + 1>`
///
/// The sequence continues from the newest stored code regardless of its period.
pub fn generate_quotation_code<D: Datelike>(last_code: &str, today: &D) -> Result<String, CodeError> {
    let prefix = format!("QU-{}", period_code(today));
    if last_code.is_empty() {
        return Ok(format_sequence_code(&prefix, 1));
    }

    let invalid = || CodeError::InvalidQuotationCode(last_code.to_string());
    let rest = last_code.strip_prefix("QU-").ok_or_else(invalid)?;
    let (period, sequence) = rest.split_once('-').ok_or_else(invalid)?;
    if period.len() != 4 || !period.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let sequence: u32 = sequence.parse().map_err(|_| invalid())?;

    Ok(format_sequence_code(&prefix, sequence + 1))
}

/// `C-<max + 1, 4 digits>`; codes not shaped `C-NNNN` are ignored
pub fn next_customer_code<S: AsRef<str>>(codes: &[S]) -> String {
    let next = codes
        .iter()
        .map(AsRef::as_ref)
        .max()
        .and_then(|last| {
            let parts: Vec<&str> = last.split('-').collect();
            if parts.len() == 2 {
                parts[1].parse::<u32>().ok()
            } else {
                None
            }
        })
        .map(|n| n + 1)
        .unwrap_or(1);
    format!("C-{:04}", next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn jan_2024() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
    }

    #[test]
    fn test_period_code_uses_buddhist_year() {
        assert_eq!(period_code(&jan_2024()), "6701");
        let dec = NaiveDate::from_ymd_opt(2057, 12, 1).unwrap();
        // 2057 + 543 = 2600
        assert_eq!(period_code(&dec), "0012");
    }

    #[test]
    fn test_prefixes() {
        let d = jan_2024();
        assert_eq!(TransactionKind::Purchase.prefix(true, &d), "PUR-VAT-6701");
        assert_eq!(TransactionKind::Purchase.prefix(false, &d), "PUR-NV-6701");
        assert_eq!(TransactionKind::Sale.prefix(true, &d), "INV-6701");
        assert_eq!(TransactionKind::Sale.prefix(false, &d), "NV-6701");
    }

    #[test]
    fn test_next_sequence_number() {
        let codes = ["PUR-VAT-6701-0003", "PUR-VAT-6701-0001", "PUR-NV-6701-0009", "PUR-VAT-6612-0042"];
        assert_eq!(next_sequence_number(TransactionKind::Purchase, "PUR-VAT-6701", &codes), 4);
        assert_eq!(next_sequence_number(TransactionKind::Purchase, "pur-nv-6701", &codes), 10);
        assert_eq!(next_sequence_number(TransactionKind::Purchase, "PUR-VAT-6702", &codes), 1);
    }

    #[test]
    fn test_sale_prefix_does_not_match_invoice() {
        let codes = ["INV-6701-0007", "NV-6701-0002"];
        assert_eq!(next_sequence_number(TransactionKind::Sale, "NV-6701", &codes), 3);
        assert_eq!(next_sequence_number(TransactionKind::Sale, "INV-6701", &codes), 8);
    }

    #[test]
    fn test_unparsable_last_code_falls_back_to_one() {
        let codes = ["NV-6701"];
        assert_eq!(next_sequence_number(TransactionKind::Sale, "NV-6701", &codes), 1);
        let codes = ["PUR-VAT-6701-00AB"];
        assert_eq!(next_sequence_number(TransactionKind::Purchase, "PUR-VAT-6701", &codes), 1);
    }

    #[test]
    fn test_quotation_code() {
        let d = jan_2024();
        assert_eq!(generate_quotation_code("", &d).unwrap(), "QU-6701-0001");
        assert_eq!(generate_quotation_code("QU-6612-0041", &d).unwrap(), "QU-6701-0042");
        assert_eq!(
            generate_quotation_code("Q-2024-1", &d),
            Err(CodeError::InvalidQuotationCode("Q-2024-1".into()))
        );
        assert!(generate_quotation_code("QU-6701-XXXX", &d).is_err());
    }

    #[test]
    fn test_customer_code() {
        let none: [&str; 0] = [];
        assert_eq!(next_customer_code(&none), "C-0001");
        assert_eq!(next_customer_code(&["C-0001", "C-0012", "C-0003"]), "C-0013");
        assert_eq!(next_customer_code(&["CUST"]), "C-0001");
    }
}
