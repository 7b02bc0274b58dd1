//! # Validation Module
//!
//! Input validation for product forms and account forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (front end)                                             │
//! │  ├── Strips non-digits while typing a price                            │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Parses price/quantity text                                        │
//! │  ├── Checks name, category, positivity                                 │
//! │  └── Runs BEFORE the store or the record service sees anything         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Record service                                               │
//! │  └── NOT NULL / foreign key constraints                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fields are checked in form order: name, category, price, quantity. The
//! first failure is reported.
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{parse_price, parse_quantity};
//!
//! assert_eq!(parse_price("Rp 12.500").unwrap(), 12_500);
//! assert_eq!(parse_quantity("3").unwrap(), 3);
//! assert!(parse_quantity("0").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{CategoryChoice, NewProduct, Product, ProductDraft, ProductPatch};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum product name length.
pub const MAX_NAME_LEN: usize = 200;

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_product_name;
///
/// assert_eq!(validate_product_name("  Mouse ").unwrap(), "Mouse");
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a category label and returns it trimmed.
pub fn validate_category_label(label: &str) -> ValidationResult<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(required("category"));
    }
    Ok(label.to_string())
}

/// Validates the category picked on the add form.
///
/// An existing category with a non-positive id counts as "not chosen",
/// matching a picker whose placeholder entry has id 0.
pub fn validate_category_choice(choice: Option<&CategoryChoice>) -> ValidationResult<CategoryChoice> {
    match choice {
        None => Err(required("category")),
        Some(CategoryChoice::Existing(category)) => {
            if category.id <= 0 || category.name.trim().is_empty() {
                return Err(required("category"));
            }
            Ok(CategoryChoice::Existing(category.clone()))
        }
        Some(CategoryChoice::Label(label)) => {
            validate_category_label(label).map(CategoryChoice::Label)
        }
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a price typed by the user.
///
/// ## Rules
/// - Optional `Rp` prefix
/// - `.` and spaces are thousands separators and are ignored
/// - Anything else must be a digit
/// - The result must be > 0
///
/// ```text
/// "150000"      → 150000
/// "Rp 12.500"   → 12500
/// "12,50"       → InvalidFormat
/// "0" / "-5"    → MustBePositive
/// ""            → Required
/// ```
pub fn parse_price(input: &str) -> ValidationResult<i64> {
    let trimmed = input.trim();
    let without_prefix = trimmed
        .strip_prefix("Rp")
        .or_else(|| trimmed.strip_prefix("rp"))
        .or_else(|| trimmed.strip_prefix("RP"))
        .unwrap_or(trimmed);

    let normalized: String = without_prefix
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .collect();

    parse_positive_integer("price", &normalized)
}

/// Parses a stock quantity typed by the user. Digits only, > 0.
pub fn parse_quantity(input: &str) -> ValidationResult<i64> {
    parse_positive_integer("quantity", input.trim())
}

/// Validates an already-parsed price.
pub fn validate_price(price: i64) -> ValidationResult<()> {
    validate_positive("price", price)
}

/// Validates an already-parsed quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    validate_positive("quantity", quantity)
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a draft in form order and returns the parsed product.
pub fn validate_draft(draft: &ProductDraft) -> ValidationResult<NewProduct> {
    let name = validate_product_name(&draft.name)?;
    let category = validate_category_choice(draft.category.as_ref())?;
    let price = parse_price(&draft.price)?;
    let quantity = parse_quantity(&draft.quantity)?;

    Ok(NewProduct {
        name,
        price,
        quantity,
        category,
    })
}

/// Validates the fields a patch sets and returns a normalized copy.
///
/// This catches bad input before any lookup; the merged record is checked
/// again with [`validate_product`].
pub fn validate_patch(patch: &ProductPatch) -> ValidationResult<ProductPatch> {
    Ok(ProductPatch {
        name: patch
            .name
            .as_deref()
            .map(validate_product_name)
            .transpose()?,
        category: patch
            .category
            .as_deref()
            .map(validate_category_label)
            .transpose()?,
        price: patch
            .price
            .map(|p| validate_price(p).map(|_| p))
            .transpose()?,
        quantity: patch
            .quantity
            .map(|q| validate_quantity(q).map(|_| q))
            .transpose()?,
    })
}

/// Validates a complete record before it is accepted into the store.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_category_label(&product.category)?;
    validate_price(product.price)?;
    validate_quantity(product.quantity)?;
    Ok(())
}

// =============================================================================
// Account Validators
// =============================================================================

/// Validates a username and returns it trimmed.
///
/// ## Rules
/// - 3 to 50 characters
/// - Letters, digits, `_`, `-`, `.`
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = username.trim();

    if username.is_empty() {
        return Err(required("username"));
    }

    let len = username.chars().count();
    if len < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if len > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, '_', '-' and '.'".to_string(),
        });
    }

    Ok(username.to_string())
}

/// Validates an email address shape and returns it trimmed.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() {
        return Err(required("email"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(email.to_string())
}

/// Validates a new password. The password is never trimmed or echoed.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(required("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

fn validate_positive(field: &str, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn parse_positive_integer(field: &str, digits: &str) -> ValidationResult<i64> {
    if digits.is_empty() {
        return Err(required(field));
    }

    // A leading minus is a sign, not a format problem.
    if let Some(rest) = digits.strip_prefix('-') {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::MustBePositive {
                field: field.to_string(),
            });
        }
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    let value = digits
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "number is too large".to_string(),
        })?;

    validate_positive(field, value)?;
    Ok(value)
}
