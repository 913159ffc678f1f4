use crate::utils::error::{PoolError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// The playable vocabulary is the roulette board: "0", "00" and "1".."36".
/// Tokens are compared as written, so "06" is not a valid spelling of "6".
pub fn is_valid_token(token: &str) -> bool {
    match token {
        "0" | "00" => true,
        _ => token
            .parse::<u8>()
            .map(|n| (1..=36).contains(&n) && token == n.to_string())
            .unwrap_or(false),
    }
}

pub fn validate_token(token: &str) -> Result<()> {
    if is_valid_token(token) {
        Ok(())
    } else {
        Err(PoolError::InvalidNumber {
            token: token.to_string(),
        })
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(PoolError::Config {
            message: format!("{}: URL cannot be empty", field_name),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(PoolError::Config {
                message: format!("{}: unsupported URL scheme: {}", field_name, scheme),
            }),
        },
        Err(e) => Err(PoolError::Config {
            message: format!("{}: invalid URL format: {}", field_name, e),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PoolError::Config {
            message: format!("{}: value cannot be empty or whitespace-only", field_name),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(PoolError::Config {
            message: format!("{}: value must be at least {}", field_name, min_value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_vocabulary() {
        assert!(is_valid_token("0"));
        assert!(is_valid_token("00"));
        assert!(is_valid_token("1"));
        assert!(is_valid_token("36"));

        assert!(!is_valid_token("37"));
        assert!(!is_valid_token("000"));
        assert!(!is_valid_token("06"));
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("-1"));
        assert!(!is_valid_token("seis"));
    }

    #[test]
    fn test_validate_token_error_carries_input() {
        let err = validate_token("37").unwrap_err();
        match err {
            PoolError::InvalidNumber { token } => assert_eq!(token, "37"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("backend_url", "https://example.supabase.co").is_ok());
        assert!(validate_url("backend_url", "http://localhost:3000").is_ok());
        assert!(validate_url("backend_url", "").is_err());
        assert!(validate_url("backend_url", "not-a-url").is_err());
        assert!(validate_url("backend_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("bulk_concurrency", 5, 1).is_ok());
        assert!(validate_positive_number("bulk_concurrency", 0, 1).is_err());
    }
}
