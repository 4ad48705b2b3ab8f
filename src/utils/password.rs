use crate::error::{AppError, AppResult};
use bcrypt::{DEFAULT_COST, hash, verify};
use std::ops::RangeInclusive;

/// 密码长度（按字符数计）
pub const PASSWORD_LENGTH: RangeInclusive<usize> = 8..=128;

/// 注册密码规则：8-128 个字符，至少一个小写字母、一个大写字母和一个数字
pub fn validate_password(password: &str) -> AppResult<()> {
    let length = password.chars().count();
    if !PASSWORD_LENGTH.contains(&length) {
        return Err(AppError::ValidationError(format!(
            "Password must be between {} and {} characters",
            PASSWORD_LENGTH.start(),
            PASSWORD_LENGTH.end()
        )));
    }

    let (mut lower, mut upper, mut digit) = (false, false, false);
    for c in password.chars() {
        lower |= c.is_lowercase();
        upper |= c.is_uppercase();
        digit |= c.is_ascii_digit();
    }

    let missing: Vec<&str> = [
        (lower, "a lowercase letter"),
        (upper, "an uppercase letter"),
        (digit, "a digit"),
    ]
    .into_iter()
    .filter(|(present, _)| !present)
    .map(|(_, label)| label)
    .collect();

    if !missing.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Password must contain {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

/// 哈希格式错误时返回 InternalError，密码不匹配返回 Ok(false)
pub fn verify_password(password: &str, hashed: &str) -> AppResult<bool> {
    verify(password, hashed)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: AppResult<()>) -> String {
        match result {
            Err(AppError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_accepts_mixed_password() {
        assert!(validate_password("Shalom2026").is_ok());
        assert!(validate_password("Aa345678").is_ok());
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(message(validate_password("Ab1")).contains("between 8 and 128"));
        assert!(validate_password(&format!("Ab1{}", "x".repeat(126))).is_err());
        // 多字节字符按一个字符计
        assert!(validate_password("Ab1ééééé").is_ok());
    }

    #[test]
    fn test_reports_every_missing_class() {
        assert_eq!(
            message(validate_password("lowercase123")),
            "Password must contain an uppercase letter"
        );
        assert_eq!(
            message(validate_password("onlyletters")),
            "Password must contain an uppercase letter, a digit"
        );
        assert_eq!(
            message(validate_password("12345678")),
            "Password must contain a lowercase letter, an uppercase letter"
        );
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hashed = hash_password("Shalom2026").unwrap();
        assert!(verify_password("Shalom2026", &hashed).unwrap());
        assert!(!verify_password("Shalom2027", &hashed).unwrap());
        assert!(verify_password("Shalom2026", "not-a-hash").is_err());
    }
}
