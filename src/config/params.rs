//! Task input validation
//!
//! Turns the raw pipeline inputs into [`ExecutionParameters`]. Only a
//! malformed execution token is fatal; every other invalid input is replaced
//! by its default and marks the run as degraded.

use thiserror::Error;
use tracing::warn;

/// Required length of the execution token
pub const EXEC_TOKEN_LENGTH: usize = 88;

/// Threshold used when the THRESHOLD input is missing or invalid
pub const DEFAULT_THRESHOLD: f64 = 100.0;

/// Number of mask characters shown before the visible token suffix
const TOKEN_MASK_WIDTH: usize = 70;

/// Fatal input errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error(" ERR: The EXEC_TOKEN value is invalid")]
    InvalidToken { length: usize },
}

/// Task inputs as received from the pipeline runner
#[derive(Clone, Debug, Default)]
pub struct RawInputs {
    pub exec_token: Option<String>,
    pub app_url: Option<String>,
    pub threshold: Option<String>,
    pub verbose: Option<String>,
}

/// Sanitized inputs for one run
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionParameters {
    pub exec_token: String,
    /// Empty means the service default
    pub app_url: String,
    /// Always within [0, 100]
    pub threshold: f64,
    pub verbose: bool,
}

impl ExecutionParameters {
    /// Token with everything but the trailing `suffix` characters masked
    pub fn masked_token(&self, suffix: usize) -> String {
        let chars: Vec<char> = self.exec_token.chars().collect();
        let visible: String = chars[chars.len().saturating_sub(suffix)..].iter().collect();
        format!("{}{}", "*".repeat(TOKEN_MASK_WIDTH), visible)
    }
}

/// Validation result
#[derive(Clone, Debug)]
pub struct ValidatedParameters {
    pub params: ExecutionParameters,
    /// Set when at least one input was defaulted
    pub has_warnings: bool,
    /// Names of the defaulted inputs
    pub defaulted: Vec<&'static str>,
}

/// Validate raw task inputs
pub fn validate(raw: RawInputs) -> Result<ValidatedParameters, ValidationError> {
    let exec_token = raw.exec_token.unwrap_or_default();
    let length = exec_token.chars().count();
    if length != EXEC_TOKEN_LENGTH {
        return Err(ValidationError::InvalidToken { length });
    }

    let mut defaulted = Vec::new();

    let app_url = match raw.app_url {
        Some(url) if url.chars().count() >= 2 => url,
        _ => {
            warn!(
                " ERR: The APPURL value is invalid. (Resolving to default app url: {})",
                super::DEFAULT_APP_URL
            );
            defaulted.push("APPURL");
            String::new()
        }
    };

    let threshold = match raw.threshold.as_deref().and_then(parse_threshold) {
        Some(threshold) => threshold,
        None => {
            warn!(
                " ERR: The THRESHOLD value is invalid. (Resolving to default threshold: {}%)",
                DEFAULT_THRESHOLD
            );
            defaulted.push("THRESHOLD");
            DEFAULT_THRESHOLD
        }
    };

    let verbose = match raw.verbose.as_deref() {
        Some(value) => value.trim().eq_ignore_ascii_case("true"),
        None => {
            warn!(" ERR: The VERBOSE value is missing. (Resolving to default verbose: false)");
            defaulted.push("VERBOSE");
            false
        }
    };

    Ok(ValidatedParameters {
        params: ExecutionParameters {
            exec_token,
            app_url,
            threshold,
            verbose,
        },
        has_warnings: !defaulted.is_empty(),
        defaulted,
    })
}

/// Parse the leading number of a threshold input, so `"50%"` reads as 50
fn parse_threshold(value: &str) -> Option<f64> {
    let value = value.trim();
    value[..leading_number_len(value)]
        .parse::<f64>()
        .ok()
        .filter(|t| (0.0..=100.0).contains(t))
}

/// Byte length of the longest `[+-]digits[.digits][e[+-]digits]` prefix
fn leading_number_len(value: &str) -> usize {
    let bytes = value.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let integer = digits_from(end);
    end += integer;

    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if integer > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }

    if integer == 0 && fraction == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let digits = digits_from(exponent);
        if digits > 0 {
            end = exponent + digits;
        }
    }

    end
}
