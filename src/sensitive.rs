//! Sensitive-data heuristics: map query text to a taxonomy of sensitive
//! data types, and map those types to the field-name patterns the scorer
//! treats as direct hits.
//!
//! Unlike intent classification, detection is non-exclusive: a query may
//! map to several types. The table order is fixed and the full table is
//! always evaluated.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitiveDataType {
    CreditCard,
    Ssn,
    Email,
    Phone,
    Address,
    Name,
    Password,
    Salary,
    DateOfBirth,
}

impl SensitiveDataType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit card",
            Self::Ssn => "SSN",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Name => "name",
            Self::Password => "password",
            Self::Salary => "salary",
            Self::DateOfBirth => "date of birth",
        }
    }

    /// Compliance regime the type falls under, used in warning text.
    pub fn compliance_label(&self) -> &'static str {
        match self {
            Self::CreditCard => "PCI-DSS",
            Self::Ssn | Self::DateOfBirth | Self::Name | Self::Address => "PII",
            Self::Email | Self::Phone => "PII",
            Self::Password => "credential handling",
            Self::Salary => "HR confidentiality",
        }
    }

    /// Field names that count as a direct hit for this type. A column
    /// whose name contains one of these scores the exact-match boost.
    pub fn field_name_markers(&self) -> &'static [&'static str] {
        match self {
            Self::CreditCard => &["card_number", "card_no", "credit_card", "cc_number", "pan"],
            Self::Ssn => &["ssn", "social_security"],
            Self::Email => &["email", "e_mail"],
            Self::Phone => &["phone", "mobile", "telephone"],
            Self::Address => &["address", "street", "zip", "postal"],
            Self::Name => &["first_name", "last_name", "full_name", "customer_name"],
            Self::Password => &["password", "passwd", "secret", "credential"],
            Self::Salary => &["salary", "compensation", "wage"],
            Self::DateOfBirth => &["birth_date", "date_of_birth", "dob", "birthday"],
        }
    }
}

lazy_static! {
    static ref DETECTION_RULES: Vec<(Regex, SensitiveDataType)> = vec![
        (Regex::new(r"credit\s*card|card\s*number|payment\s*card|visa|mastercard|\bpan\b").unwrap(), SensitiveDataType::CreditCard),
        (Regex::new(r"\bssn\b|social\s*security").unwrap(), SensitiveDataType::Ssn),
        (Regex::new(r"e-?mail").unwrap(), SensitiveDataType::Email),
        (Regex::new(r"phone|mobile\s*number|telephone").unwrap(), SensitiveDataType::Phone),
        (Regex::new(r"address|street|postal|zip\s*code").unwrap(), SensitiveDataType::Address),
        (Regex::new(r"customer\s*name|first\s*name|last\s*name|full\s*name").unwrap(), SensitiveDataType::Name),
        (Regex::new(r"password|credential").unwrap(), SensitiveDataType::Password),
        (Regex::new(r"salary|compensation|payroll").unwrap(), SensitiveDataType::Salary),
        (Regex::new(r"date\s*of\s*birth|\bdob\b|birthday|birth\s*date").unwrap(), SensitiveDataType::DateOfBirth),
    ];

    /// Entity names that suggest customer/order/payment data, used for the
    /// asymmetric credit-card boosts on data sources and tables.
    static ref CUSTOMER_CONTEXT: Regex =
        Regex::new(r"customer|order|payment|billing|transaction").unwrap();
}

/// Detect every sensitive data type the query text maps to. Pure and
/// deterministic; a query may match multiple types.
pub fn detect(raw_query: &str) -> Vec<SensitiveDataType> {
    let lowered = raw_query.to_lowercase();
    DETECTION_RULES
        .iter()
        .filter(|(pattern, _)| pattern.is_match(&lowered))
        .map(|(_, ty)| *ty)
        .collect()
}

/// Whether a name/description marks a customer-, order- or payment-style
/// asset, which domain knowledge says is more likely to carry payment
/// fields than a generic description match.
pub fn is_customer_context(text: &str) -> bool {
    CUSTOMER_CONTEXT.is_match(&text.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_credit_card() {
        let types = detect("Where is credit card data stored?");
        assert_eq!(types, vec![SensitiveDataType::CreditCard]);
    }

    #[test]
    fn test_detection_is_non_exclusive() {
        let types = detect("customer name and email for billing");
        assert!(types.contains(&SensitiveDataType::Email));
        assert!(types.contains(&SensitiveDataType::Name));
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(detect("dashboard usage metrics").is_empty());
    }

    #[test]
    fn test_field_markers_cover_card_number() {
        assert!(SensitiveDataType::CreditCard
            .field_name_markers()
            .iter()
            .any(|m| "card_number".contains(m)));
    }

    #[test]
    fn test_customer_context() {
        assert!(is_customer_context("Customer orders"));
        assert!(!is_customer_context("weather readings"));
    }
}
