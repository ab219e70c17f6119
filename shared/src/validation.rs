//! Validation utilities
//!
//! Includes Thailand-specific checks for customer records.

// ============================================================================
// General Validations
// ============================================================================

/// Largest quantity a single line or adjustment may move
pub const MAX_QUANTITY: i32 = 1_000_000;

/// Validate that a quantity moved in or out of stock is positive and bounded
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than 0");
    }
    if quantity > MAX_QUANTITY {
        return Err("Quantity must not exceed 1000000");
    }
    Ok(())
}

/// Validate that a text field is not blank
pub fn validate_required(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("Value is required");
    }
    Ok(())
}

// ============================================================================
// Thailand-Specific Validations
// ============================================================================

/// Validate Thai phone number format
/// Accepts: 0812345678, 081-234-5678, +66812345678, 02-123-4567
pub fn validate_thai_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Mobile: 10 digits starting with 0
    if digits.len() == 10 && digits.starts_with('0') {
        return Ok(());
    }
    // Landline (02-123-4567) or international without leading 0
    if digits.len() == 9 {
        return Ok(());
    }
    // Country code prefix
    if digits.len() == 11 && digits.starts_with("66") {
        return Ok(());
    }

    Err("Invalid Thai phone number format")
}

/// Validate Thai Tax ID (เลขประจำตัวผู้เสียภาษี)
/// 13-digit number for businesses/individuals
pub fn validate_thai_tax_id(tax_id: &str) -> Result<(), &'static str> {
    if tax_id
        .chars()
        .any(|c| !(c.is_ascii_digit() || c == '-' || c == ' '))
    {
        return Err("Invalid Thai Tax ID format");
    }

    let digits = tax_id.chars().filter(|c| c.is_ascii_digit()).count();
    if digits != 13 {
        return Err("Thai Tax ID must be 13 digits");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert_eq!(
            validate_quantity(MAX_QUANTITY + 1),
            Err("Quantity must not exceed 1000000")
        );
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("Box").is_ok());
        assert!(validate_required("   ").is_err());
    }

    // ========================================================================
    // Thailand-Specific Validation Tests
    // ========================================================================

    #[test]
    fn test_thai_phone_valid() {
        assert!(validate_thai_phone("0812345678").is_ok());
        assert!(validate_thai_phone("081-234-5678").is_ok());
        assert!(validate_thai_phone("+66812345678").is_ok());
        assert!(validate_thai_phone("02-123-4567").is_ok());
    }

    #[test]
    fn test_thai_phone_invalid() {
        assert!(validate_thai_phone("12345").is_err());
        assert!(validate_thai_phone("08123456789012").is_err());
    }

    #[test]
    fn test_thai_tax_id() {
        assert!(validate_thai_tax_id("0105556012345").is_ok());
        assert!(validate_thai_tax_id("0-1055-56012-34-5").is_ok());
        assert!(validate_thai_tax_id("123456789").is_err());
        assert!(validate_thai_tax_id("01055560123AB").is_err());
    }
}
