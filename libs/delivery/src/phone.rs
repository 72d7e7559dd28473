//! Canonicalizes free-form phone numbers into the gateway dialing format.

/// Country-level dialing rules applied to every outbound number.
#[derive(Debug, Clone)]
pub struct DialPlan {
    /// Prefixed when the number does not already start with it.
    pub country_code: String,
    /// Digit inserted after the area code for short mobile numbers.
    pub mobile_prefix: char,
}

impl Default for DialPlan {
    fn default() -> Self {
        Self {
            country_code: "55".into(),
            mobile_prefix: '9',
        }
    }
}

/// Normalizes a number to all digits, with country code and mobile prefix.
///
/// Strips punctuation and spacing, prepends the country code when missing,
/// and inserts the mobile prefix when the digit count matches a mobile
/// number that lacks it (country code + two-digit area code + eight-digit
/// local number). Idempotent, and never fails: garbage input stays garbage
/// and is rejected by the gateway instead.
pub fn normalize_msisdn(raw: &str, plan: &DialPlan) -> String {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if !digits.starts_with(&plan.country_code) {
        digits.insert_str(0, &plan.country_code);
    }

    let missing_prefix_len = plan.country_code.len() + 2 + 8;
    if digits.len() == missing_prefix_len {
        digits.insert(plan.country_code.len() + 2, plan.mobile_prefix);
    }

    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> DialPlan {
        DialPlan::default()
    }

    #[test]
    fn strips_punctuation_and_spacing() {
        assert_eq!(normalize_msisdn("+55 (86) 99900-1122", &plan()), "5586999001122");
    }

    #[test]
    fn prepends_country_code_when_missing() {
        assert_eq!(normalize_msisdn("86999001122", &plan()), "5586999001122");
    }

    #[test]
    fn inserts_mobile_prefix_on_short_mobile_numbers() {
        // Country code + area code + eight local digits, missing the nine.
        assert_eq!(normalize_msisdn("558699001122", &plan()), "5586999001122");
    }

    #[test]
    fn leaves_full_numbers_alone() {
        assert_eq!(normalize_msisdn("5586999001122", &plan()), "5586999001122");
    }

    #[test]
    fn is_idempotent() {
        for raw in ["+55 86 9900-1122", "86999001122", "5586999001122", "not a phone"] {
            let once = normalize_msisdn(raw, &plan());
            assert_eq!(normalize_msisdn(&once, &plan()), once, "input {raw:?}");
        }
    }
}
