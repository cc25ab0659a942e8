//! Input checks shared by the service layer. Each helper returns
//! `AppError::Validation` naming the offending field.

use rust_decimal::Decimal;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation("email is not a valid address".into()))
    }
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Lowercase ASCII letters and digits separated by single dashes.
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid slug '{slug}'")))
    }
}

pub fn validate_rating(rating: i32) -> Result<(), AppError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::Validation("rating must be between 1 and 5".into()))
    }
}

pub fn validate_currency(currency: &str) -> Result<(), AppError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "currency must be a 3-letter uppercase code".into(),
        ))
    }
}

/// Money columns are `NUMERIC(12,2)`: ten integer digits and two decimals.
pub fn fits_money_column(amount: Decimal) -> bool {
    amount.abs() < Decimal::from(10_000_000_000_i64) && amount.normalize().scale() <= 2
}

pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    if !fits_money_column(price) {
        return Err(AppError::Validation(
            "price must be below 10000000000 with at most 2 decimal places".into(),
        ));
    }
    Ok(())
}

pub fn validate_min(field: &str, value: i32, min: i32) -> Result<(), AppError> {
    if value < min {
        return Err(AppError::Validation(format!("{field} must be at least {min}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert!(validate_slug("bali-sunrise-trek-2").is_ok());
        assert!(validate_slug("Bali").is_err());
        assert!(validate_slug("bali--trek").is_err());
        assert!(validate_slug("-bali").is_err());
        assert!(validate_slug("bali_trek").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn ratings() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(matches!(validate_rating(0), Err(AppError::Validation(_))));
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("ana.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@localhost").is_err());
        assert!(validate_email("ana@example.").is_err());
    }

    #[test]
    fn currencies_and_prices() {
        assert!(validate_currency("EUR").is_ok());
        assert!(validate_currency("eur").is_err());
        assert!(validate_currency("EURO").is_err());
        assert!(validate_price(Decimal::new(19900, 2)).is_ok());
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn prices_must_fit_the_money_column() {
        assert!(validate_price(Decimal::new(999_999_999_999, 2)).is_ok());
        assert!(matches!(
            validate_price(Decimal::new(10_000_000_000, 0)),
            Err(AppError::Validation(_))
        ));
        assert!(validate_price(Decimal::new(100_000_000_000, 0)).is_err());
        assert!(validate_price(Decimal::new(19999, 3)).is_err());
        // Trailing zeros do not count as extra precision.
        assert!(validate_price(Decimal::new(19900, 3)).is_ok());
    }

    #[test]
    fn passwords_and_text() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(require_non_empty("subject", "   ").is_err());
        assert!(require_non_empty("subject", "Refund").is_ok());
        assert!(validate_min("quantity", 0, 1).is_err());
    }
}
