//! Input validation for API requests.
//!
//! For collecting multiple validation errors and returning them as an
//! ApiError, use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating email addresses (pragmatic, not RFC-complete)
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();

    /// Regex for validating postal pincodes (exactly 6 digits)
    static ref PINCODE_REGEX: Regex = Regex::new(r"^[0-9]{6}$").unwrap();

    /// Regex for validating vehicle registration numbers
    static ref VEHICLE_NO_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 -]*$").unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 120 {
        return Err("Email is too long (max 120 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }

    Ok(())
}

/// Validate a password at registration
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }

    Ok(())
}

/// Validate a person or lot display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }

    if name.len() > 150 {
        return Err("Name is too long (max 150 characters)".to_string());
    }

    Ok(())
}

/// Validate a street address
pub fn validate_address(address: &str) -> Result<(), String> {
    if address.trim().is_empty() {
        return Err("Address is required".to_string());
    }

    if address.len() > 250 {
        return Err("Address is too long (max 250 characters)".to_string());
    }

    Ok(())
}

/// Validate a postal pincode (exactly 6 digits)
pub fn validate_pincode(pincode: &str) -> Result<(), String> {
    if !PINCODE_REGEX.is_match(pincode) {
        return Err("Enter a valid 6-digit pincode".to_string());
    }

    Ok(())
}

/// Validate an optional pincode field (absent or empty is fine)
pub fn validate_optional_pincode(pincode: &Option<String>) -> Result<(), String> {
    if let Some(p) = pincode {
        if p.is_empty() {
            return Ok(());
        }
        return validate_pincode(p);
    }

    Ok(())
}

/// Validate an hourly price
pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err("Price must be a valid number".to_string());
    }

    if price < 0.0 {
        return Err("Price must not be negative".to_string());
    }

    Ok(())
}

/// Validate a lot capacity
pub fn validate_max_spots(max_spots: i64) -> Result<(), String> {
    if max_spots <= 0 {
        return Err("Max spots must be a positive number".to_string());
    }

    if max_spots > 10_000 {
        return Err("Max spots is too large (max 10000)".to_string());
    }

    Ok(())
}

/// Validate a vehicle registration number
pub fn validate_vehicle_no(vehicle_no: &str) -> Result<(), String> {
    if vehicle_no.trim().is_empty() {
        return Err("Vehicle number is required".to_string());
    }

    if vehicle_no.len() > 20 {
        return Err("Vehicle number is too long (max 20 characters)".to_string());
    }

    if !VEHICLE_NO_REGEX.is_match(vehicle_no) {
        return Err("Vehicle number may only contain letters, digits, spaces and dashes".to_string());
    }

    Ok(())
}
