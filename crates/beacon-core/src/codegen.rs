//! # Code Generation Module
//!
//! Deterministic derivation of SKUs and numeric barcodes for new products.
//!
//! ## Derivation Scheme
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    SKU / Barcode Derivation                             │
//! │                                                                         │
//! │  Inputs: category="Lash", name="Lash Kit", created_on=Aug 7            │
//! │                                                                         │
//! │  generate_sku                                                           │
//! │  ├── category token: first 3 alnum chars, uppercased   → "LAS"         │
//! │  ├── name token:     first 8 alnum chars, uppercased   → "LASHKIT"     │
//! │  ├── date token:     month+day, zero padded            → "0807"        │
//! │  └── joined with '-'                    → Code("LAS-LASHKIT-0807")     │
//! │                                                                         │
//! │  generate_barcode(existing, seed)                                       │
//! │  ├── splitmix64 stream over the seed                                   │
//! │  ├── each draw: 12-digit decimal, zero padded                          │
//! │  ├── collision with `existing`? draw again                             │
//! │  └── bounded at MAX_GENERATION_ATTEMPTS → GenerationExhausted          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both functions are pure with respect to their explicit inputs: the same
//! category/name/date always reproduce the same SKU, and the same
//! (existing, seed) pair always reproduces the same barcode. Callers own
//! the entropy — the dispatch layer seeds from the wall clock, tests pass
//! fixed seeds.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use crate::code::{normalize, Code};
use crate::error::{CoreError, CoreResult};
use crate::{BARCODE_LENGTH, MAX_GENERATION_ATTEMPTS};

/// Maximum characters taken from the category for the SKU prefix.
const CATEGORY_TOKEN_LENGTH: usize = 3;

/// Maximum characters taken from the product name for the SKU slug.
const NAME_TOKEN_LENGTH: usize = 8;

/// The addressable barcode space: 10^12 values for 12 decimal digits.
const BARCODE_SPACE: u64 = 1_000_000_000_000;

// =============================================================================
// Generated SKU
// =============================================================================

/// A derived SKU together with the tokens it was built from.
///
/// The tokens let the audit trail reproduce the derivation: re-running
/// [`generate_sku`] with the same product attributes on the same day yields
/// the same code unless the name materially differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSku {
    /// The joined, normalized SKU code.
    pub code: Code,
    /// Category prefix actually used (may be empty).
    pub category_token: String,
    /// Name slug actually used.
    pub name_token: String,
    /// MMDD date token.
    pub date_token: String,
}

// =============================================================================
// SKU Generation
// =============================================================================

/// Derives a SKU from product attributes.
///
/// ## Rules
/// - Category contributes up to 3 alphanumeric characters (token omitted
///   entirely when the category has none)
/// - Name contributes up to 8 alphanumeric characters and must contribute
///   at least one
/// - The creation date contributes a 4-digit MMDD token
/// - Tokens are uppercased and joined with `-`
///
/// ## Determinism
/// Same inputs, same SKU. The date token means regeneration on a later day
/// produces a different code on purpose: relabeling a product is a visible
/// event, not a silent overwrite.
///
/// ## Example
/// ```rust
/// use beacon_core::codegen::generate_sku;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
/// let sku = generate_sku("Lash", "Lash Kit", day).unwrap();
/// assert_eq!(sku.code.as_str(), "LAS-LASHKIT-0807");
/// ```
pub fn generate_sku(category: &str, name: &str, created_on: NaiveDate) -> CoreResult<GeneratedSku> {
    let category_token = alnum_token(category, CATEGORY_TOKEN_LENGTH);
    let name_token = alnum_token(name, NAME_TOKEN_LENGTH);

    if name_token.is_empty() {
        return Err(CoreError::malformed(
            "product name contributes no code characters",
        ));
    }

    let date_token = format!("{:02}{:02}", created_on.month(), created_on.day());

    let joined = if category_token.is_empty() {
        format!("{}-{}", name_token, date_token)
    } else {
        format!("{}-{}-{}", category_token, name_token, date_token)
    };

    // The tokens are already drawn from the code alphabet, so this cannot
    // fail; going through normalize keeps the Code invariant in one place.
    let code = normalize(&joined)?;

    Ok(GeneratedSku {
        code,
        category_token,
        name_token,
        date_token,
    })
}

/// Extracts up to `limit` alphanumeric characters, uppercased.
fn alnum_token(input: &str, limit: usize) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(limit)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// =============================================================================
// Barcode Generation
// =============================================================================

/// Draws a unique 12-digit numeric barcode.
///
/// ## Arguments
/// * `existing` - every barcode and SKU currently in use; the generator
///   never queries storage itself, which keeps it testable without a live
///   store
/// * `seed` - entropy source; the same (existing, seed) pair always yields
///   the same code
///
/// ## Failure
/// Returns [`CoreError::GenerationExhausted`] when all
/// `MAX_GENERATION_ATTEMPTS` draws collide with `existing`. Against the
/// 10^12 space this needs a pathological set, but it is handled rather
/// than assumed away: the caller blocks product creation until a barcode
/// is supplied manually.
///
/// ## Example
/// ```rust
/// use beacon_core::codegen::generate_barcode;
/// use std::collections::HashSet;
///
/// let code = generate_barcode(&HashSet::new(), 42).unwrap();
/// assert_eq!(code.len(), 12);
/// assert!(code.is_numeric());
/// ```
pub fn generate_barcode(existing: &HashSet<Code>, seed: u64) -> CoreResult<Code> {
    let mut state = seed;

    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let draw = splitmix64(&mut state) % BARCODE_SPACE;
        let candidate = format!("{:0width$}", draw, width = BARCODE_LENGTH);

        // Digits only; normalize cannot fail here.
        let code = normalize(&candidate)?;
        if !existing.contains(&code) {
            return Ok(code);
        }
    }

    Err(CoreError::GenerationExhausted {
        attempts: MAX_GENERATION_ATTEMPTS,
    })
}

/// One step of the splitmix64 sequence.
///
/// Small, seedable, and stable across platforms and releases — properties a
/// library RNG does not promise for reproducing historical draws.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_sku_shape() {
        let sku = generate_sku("Lash", "Lash Kit", day()).unwrap();
        assert_eq!(sku.code.as_str(), "LAS-LASHKIT-0807");
        assert_eq!(sku.category_token, "LAS");
        assert_eq!(sku.name_token, "LASHKIT");
        assert_eq!(sku.date_token, "0807");
    }

    #[test]
    fn test_sku_is_deterministic() {
        let a = generate_sku("Nails", "Gel Polish Red", day()).unwrap();
        let b = generate_sku("Nails", "Gel Polish Red", day()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sku_without_category() {
        let sku = generate_sku("", "Mirror", day()).unwrap();
        assert_eq!(sku.code.as_str(), "MIRROR-0807");
        assert!(sku.category_token.is_empty());
    }

    #[test]
    fn test_sku_strips_punctuation_and_truncates() {
        // "Lash o'clock" style category names collapse to their letters
        let sku = generate_sku("Lash o'clock", "Extension Kit #2 (pro)", day()).unwrap();
        assert_eq!(sku.code.as_str(), "LAS-EXTENSIO-0807");
    }

    #[test]
    fn test_sku_rejects_nameless_product() {
        assert!(generate_sku("Lash", "!!!", day()).is_err());
        assert!(generate_sku("Lash", "", day()).is_err());
    }

    #[test]
    fn test_barcode_shape_and_determinism() {
        let existing = HashSet::new();
        let a = generate_barcode(&existing, 1234).unwrap();
        let b = generate_barcode(&existing, 1234).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert!(a.is_numeric());
    }

    #[test]
    fn test_barcode_redraws_on_collision() {
        let first = generate_barcode(&HashSet::new(), 99).unwrap();

        let mut existing = HashSet::new();
        existing.insert(first.clone());

        let second = generate_barcode(&existing, 99).unwrap();
        assert_ne!(first, second);
        assert!(!existing.contains(&second));
    }

    #[test]
    fn test_barcode_exhaustion_is_reported() {
        // Feed every draw of the fixed-seed sequence back into `existing`;
        // after MAX_GENERATION_ATTEMPTS rounds the next call has nowhere
        // left to go.
        let mut existing = HashSet::new();
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let code = generate_barcode(&existing, 7).unwrap();
            existing.insert(code);
        }

        let err = generate_barcode(&existing, 7).unwrap_err();
        assert!(matches!(err, CoreError::GenerationExhausted { .. }));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: SKU derivation is a function of its inputs.
            #[test]
            fn sku_is_deterministic(
                category in "[A-Za-z0-9 ]{0,20}",
                name in "[A-Za-z][A-Za-z0-9 ]{0,30}",
                month in 1u32..=12,
                day in 1u32..=28,
            ) {
                let date = NaiveDate::from_ymd_opt(2026, month, day).unwrap();
                let a = generate_sku(&category, &name, date);
                let b = generate_sku(&category, &name, date);
                match (a, b) {
                    (Ok(x), Ok(y)) => prop_assert_eq!(x, y),
                    (Err(_), Err(_)) => {}
                    _ => prop_assert!(false, "one derivation succeeded, the other failed"),
                }
            }

            /// Property: against any small existing-code set, generation
            /// terminates with a fresh 12-digit code.
            #[test]
            fn barcode_terminates_and_is_fresh(
                seed in any::<u64>(),
                taken in prop::collection::hash_set(0u64..1_000_000u64, 0..50),
            ) {
                let existing: HashSet<Code> = taken
                    .into_iter()
                    .map(|n| normalize(&format!("{:012}", n)).unwrap())
                    .collect();

                let code = generate_barcode(&existing, seed).unwrap();
                prop_assert_eq!(code.len(), BARCODE_LENGTH);
                prop_assert!(code.is_numeric());
                prop_assert!(!existing.contains(&code));
            }
        }
    }
}
