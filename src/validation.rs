use validator::ValidationErrors;

/// Flattens validator output into `field: msg, msg; field: msg`
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();

    // field_errors() skips nested structs
    for (field, kind) in errors.errors() {
        if let validator::ValidationErrorsKind::Struct(inner) = kind {
            parts.push(format!("{}.{}", field, validation_message(inner)));
        }
    }

    parts.sort();
    parts.join("; ")
}

/// Groups digits by thousands, e.g. `1500000` -> `1,500,000`
pub fn format_toman(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateUserRequest, SubscribeRequest, SubscriptionKeys};
    use validator::Validate;

    #[test]
    fn test_format_toman_groups_thousands() {
        assert_eq!(format_toman(0), "0");
        assert_eq!(format_toman(999), "999");
        assert_eq!(format_toman(1000), "1,000");
        assert_eq!(format_toman(45000), "45,000");
        assert_eq!(format_toman(1500000), "1,500,000");
        assert_eq!(format_toman(-25000), "-25,000");
    }

    #[test]
    fn test_validation_message_names_fields() {
        let request = CreateUserRequest {
            name: "Sara".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };

        let errors = request.validate().unwrap_err();
        let message = validation_message(&errors);

        assert!(message.contains("email: Invalid email format"));
        assert!(message.contains("password: Password must be at least 8 characters"));
    }

    #[test]
    fn test_validation_message_includes_nested_errors() {
        let request = SubscribeRequest {
            endpoint: "https://push.example.com/abc".to_string(),
            keys: SubscriptionKeys {
                p256dh: "".to_string(),
                auth: "secret".to_string(),
            },
        };

        let errors = request.validate().unwrap_err();
        let message = validation_message(&errors);

        assert!(message.contains("keys.p256dh: p256dh key is required"));
    }
}
