//! Fixed code tables published by Platron.

/// Label for a `pg_error_code` returned by the gateway API.
pub fn error_code_label(code: u32) -> Option<&'static str> {
    let label = match code {
        100 => "Invalid request signature",
        101 => "Invalid merchant id",
        110 => "Merchant contract missing or inactive",
        120 => "Requested action is disabled in merchant settings",
        200 => "Missing or invalid request parameter",
        340 => "Transaction not found",
        350 => "Transaction is locked",
        360 => "Transaction expired",
        400 => "Payment cancelled by customer or payment system",
        420 => "Payment cancelled due to limit excess",
        490 => "Payment cannot be cancelled",
        600 => "General error",
        700 => "Invalid data entered by customer",
        701 => "Invalid phone number",
        711 => "Phone number not accepted by selected payment system",
        1000 => "Internal service error (may not repeat on retry)",
        _ => return None,
    };
    Some(label)
}

/// Label for a `pg_failure_code` explaining why a payment was rejected.
pub fn reject_code_label(code: u32) -> Option<&'static str> {
    let label = match code {
        1 => "Unknown rejection reason",
        2 => "General error",
        3 => "Payment system error",
        4 => "Could not issue invoice to any payment system",
        5 => "Invalid request to payment system",
        40 => "Limits exceeded",
        50 => "Payment cancelled",
        100 => "Invalid customer data",
        101 => "Invalid phone number",
        300 => "Invalid transaction",
        301 => "Invalid card number",
        302 => "Invalid cardholder name",
        303 => "Invalid CVV2/CVC2",
        304 => "Invalid card expiry date",
        305 => "Card type not supported by the bank",
        306 => "Invalid amount",
        310 => "Card expired",
        320 => "Suspected fraud",
        321 => "3-D Secure authentication failed",
        329 => "Card reported stolen",
        330 => "Unknown acquiring bank",
        350 => "Card usage count exceeded for the period",
        351 => "Amount limit exceeded",
        352 => "Insufficient funds",
        353 => "Transaction not permitted for cardholder",
        354 => "Transaction not permitted for acquiring bank",
        389 => "General technical error",
        390 => "Card restrictions",
        391 => "Card blocked",
        400 => "Transaction blocked by fraud filters",
        410 => "Customer did not confirm phone number",
        _ => return None,
    };
    Some(label)
}

/// Parses a code as the gateway sends it (`"101"`, `" 101 "`) and looks it up.
pub fn error_label_for(code: &str) -> Option<&'static str> {
    code.trim().parse().ok().and_then(error_code_label)
}

pub fn reject_label_for(code: &str) -> Option<&'static str> {
    code.trim().parse().ok().and_then(reject_code_label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_error_code() {
        assert_eq!(error_code_label(101), Some("Invalid merchant id"));
        assert_eq!(error_label_for("1000"), error_code_label(1000));
    }

    #[test]
    fn test_unknown_error_code() {
        assert_eq!(error_code_label(9999), None);
        assert_eq!(error_label_for("not-a-code"), None);
    }

    #[test]
    fn test_reject_codes_are_separate_table() {
        assert_eq!(reject_code_label(352), Some("Insufficient funds"));
        assert_eq!(reject_code_label(101), Some("Invalid phone number"));
        assert_ne!(reject_code_label(101), error_code_label(101));
        assert_eq!(reject_label_for("9999"), None);
    }
}
