//! # Form Validation
//!
//! The checks the site's forms apply before anything is sent. All failing
//! fields are reported together so a form can highlight every problem at once.
//!
//! | Field       | Rule                                                        |
//! |-------------|-------------------------------------------------------------|
//! | name        | required, at least 2 characters                             |
//! | phone       | required, Bangladeshi mobile: `(+88)?01[3-9]` + 8 digits    |
//! | email       | required, `local@domain.tld`                                |
//! | requirement | required, at least 10 characters                            |
//! | file        | at most 10 MiB, image / PDF / Word document                 |

use std::fmt;
use thiserror::Error;

use crate::common::attachment::FileAttachment;
use crate::common::messages::{ContactForm, ServiceQuery};

/// Largest accepted attachment.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Content types accepted as attachments.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

const MIN_NAME_CHARS: usize = 2;
const MIN_REQUIREMENT_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First message recorded for `field`.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Client-side checks run before a payload is dispatched.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for ContactForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Name is required");
        } else if name.chars().count() < MIN_NAME_CHARS {
            errors.add("name", "Name must be at least 2 characters");
        }

        if self.phone.trim().is_empty() {
            errors.add("phone", "Phone number is required");
        } else if !is_bangladeshi_mobile(&self.phone) {
            errors.add("phone", "Please enter a valid Bangladeshi phone number");
        }

        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "Please enter a valid email address");
        }

        let requirement = self.requirement.trim();
        if requirement.is_empty() {
            errors.add("requirement", "Please describe your requirement");
        } else if requirement.chars().count() < MIN_REQUIREMENT_CHARS {
            errors.add(
                "requirement",
                "Please provide more details (at least 10 characters)",
            );
        }

        if let Some(file) = &self.file {
            if let Err(file_errors) = file.validate() {
                errors.merge(file_errors);
            }
        }

        errors.into_result()
    }
}

impl Validate for ServiceQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.contact.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if self.service_type.trim().is_empty() {
            errors.add("serviceType", "Please select a service type");
        }
        errors.into_result()
    }
}

impl Validate for FileAttachment {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.len() > MAX_FILE_BYTES {
            errors.add("file", "File size must be less than 10MB");
        }
        if !ALLOWED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            errors.add("file", "Please upload an image, PDF, or Word document");
        }
        errors.into_result()
    }
}

/// `(+88)?01[3-9]` followed by eight digits. Spaces and dashes are ignored.
pub fn is_bangladeshi_mobile(phone: &str) -> bool {
    let compact: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let local = compact.strip_prefix("+88").unwrap_or(&compact);
    let bytes = local.as_bytes();

    bytes.len() == 11
        && local.starts_with("01")
        && (b'3'..=b'9').contains(&bytes[2])
        && bytes.iter().all(u8::is_ascii_digit)
}

/// `local@domain.tld`: local part from `[A-Za-z0-9._%+-]`, domain from
/// `[A-Za-z0-9.-]`, and an alphabetic top-level domain of two or more letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::messages::Urgency;

    fn valid_contact() -> ContactForm {
        ContactForm {
            name: "Nusrat Jahan".to_string(),
            phone: "+8801912345678".to_string(),
            email: "nusrat@shop.com.bd".to_string(),
            requirement: "Looking for 2,000 cotton tote bags".to_string(),
            file: None,
        }
    }

    #[test]
    fn test_valid_contact_passes() {
        assert!(valid_contact().validate().is_ok());
    }

    #[test]
    fn test_all_failures_reported_together() {
        let form = ContactForm {
            name: "A".to_string(),
            phone: "12345".to_string(),
            email: "not-an-email".to_string(),
            requirement: "short".to_string(),
            file: None,
        };

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 4);
        assert_eq!(errors.for_field("name"), Some("Name must be at least 2 characters"));
        assert_eq!(
            errors.for_field("phone"),
            Some("Please enter a valid Bangladeshi phone number")
        );
        assert_eq!(errors.for_field("email"), Some("Please enter a valid email address"));
        assert_eq!(
            errors.for_field("requirement"),
            Some("Please provide more details (at least 10 characters)")
        );
    }

    #[test]
    fn test_required_fields() {
        let errors = ContactForm::default().validate().unwrap_err();
        assert_eq!(errors.for_field("name"), Some("Name is required"));
        assert_eq!(errors.for_field("phone"), Some("Phone number is required"));
        assert_eq!(errors.for_field("email"), Some("Email is required"));
        assert_eq!(errors.for_field("requirement"), Some("Please describe your requirement"));
    }

    #[test]
    fn test_bangladeshi_mobile_numbers() {
        assert!(is_bangladeshi_mobile("01712345678"));
        assert!(is_bangladeshi_mobile("+8801312345678"));
        assert!(is_bangladeshi_mobile("+880 1712-345678"));
        assert!(!is_bangladeshi_mobile("01212345678"));
        assert!(!is_bangladeshi_mobile("0171234567"));
        assert!(!is_bangladeshi_mobile("017123456789"));
        assert!(!is_bangladeshi_mobile("+8601712345678"));
        assert!(!is_bangladeshi_mobile("0171234567a"));
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("buyer@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co"));
        assert!(!is_valid_email("buyer@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("buyer@.com"));
        assert!(!is_valid_email("buyer@example.c"));
        assert!(!is_valid_email("buyer@exa@mple.com"));
        assert!(!is_valid_email("buyer@example.c0m"));
    }

    #[test]
    fn test_file_limits() {
        let ok = FileAttachment::new("datasheet.pdf", "application/pdf", vec![0u8; 1024]);
        assert!(ok.validate().is_ok());

        let big = FileAttachment::new("scan.png", "image/png", vec![0u8; MAX_FILE_BYTES + 1]);
        assert_eq!(
            big.validate().unwrap_err().for_field("file"),
            Some("File size must be less than 10MB")
        );

        let exe = FileAttachment::new("setup.exe", "application/octet-stream", vec![1]);
        assert_eq!(
            exe.validate().unwrap_err().for_field("file"),
            Some("Please upload an image, PDF, or Word document")
        );
    }

    #[test]
    fn test_contact_includes_file_errors() {
        let mut form = valid_contact();
        form.file = Some(FileAttachment::new("a.zip", "application/zip", vec![1]));
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert!(errors.for_field("file").is_some());
    }

    #[test]
    fn test_service_query_requires_service_type() {
        let query = ServiceQuery {
            contact: valid_contact(),
            service_type: "  ".to_string(),
            urgency: Urgency::Medium,
            budget: None,
            quantity: None,
        };
        let errors = query.validate().unwrap_err();
        assert_eq!(errors.for_field("serviceType"), Some("Please select a service type"));
        assert_eq!(errors.to_string(), "serviceType: Please select a service type");
    }
}
