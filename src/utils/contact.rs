use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

// 以色列手机号: 05X-XXXXXXX / 05XXXXXXXX / +9725XXXXXXXX
static IL_PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+972|0)5\d-?\d{7}$").expect("valid phone regex")
});

/// 验证邮箱格式
pub fn validate_email(email: &str) -> AppResult<()> {
    if !EMAIL_REGEX.is_match(email) {
        return Err(AppError::ValidationError(
            "Invalid email address".to_string(),
        ));
    }
    Ok(())
}

/// 邮箱统一小写存储，登录时同样处理
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// 验证以色列手机号格式
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !IL_PHONE_REGEX.is_match(phone.trim()) {
        return Err(AppError::ValidationError(
            "Invalid phone number, expected 05X-XXXXXXX".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("dana@example.com").is_ok());
        assert!(validate_email("michal.levi+news@mail.co.il").is_ok());
        assert!(validate_email("dana@").is_err());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Dana@Example.COM "), "dana@example.com");
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("050-1234567").is_ok());
        assert!(validate_phone("0521234567").is_ok());
        assert!(validate_phone("+972521234567").is_ok());
        assert!(validate_phone("03-1234567").is_err());
        assert!(validate_phone("050-123").is_err());
    }
}
