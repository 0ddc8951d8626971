//! Business rule validation for posting requests.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::PostingInput;

/// Maximum description length, matching the column width.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum idempotency key length, matching the column width.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Validates a posting request before any state is read.
///
/// The magnitude must be strictly positive; zero and negative amounts are
/// rejected here, so a signed amount derived from the kind always carries
/// the correct sign. The description must be non-empty and bounded, and an
/// idempotency key, when present, must be non-empty and bounded.
///
/// # Errors
///
/// Returns the matching [`LedgerError`] validation variant.
pub fn validate_posting(input: &PostingInput) -> Result<(), LedgerError> {
    if input.amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(input.amount));
    }

    if input.description.trim().is_empty() {
        return Err(LedgerError::EmptyDescription);
    }

    if input.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(LedgerError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LEN,
        });
    }

    if let Some(key) = &input.idempotency_key
        && (key.is_empty() || key.chars().count() > MAX_IDEMPOTENCY_KEY_LEN)
    {
        return Err(LedgerError::InvalidIdempotencyKey {
            max: MAX_IDEMPOTENCY_KEY_LEN,
        });
    }

    Ok(())
}
