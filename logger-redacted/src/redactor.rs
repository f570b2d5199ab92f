use regex::Regex;
use lazy_static::lazy_static;
use sha2::{Sha256, Digest};
use base64::{Engine as _, engine::general_purpose};

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"(?:\+1[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b").unwrap();
    static ref SSN_REGEX: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap();
    static ref MRN_REGEX: Regex = Regex::new(r"(?i)\bMRN[:#\s]*\d{4,}\b").unwrap();
    static ref DOB_REGEX: Regex = Regex::new(r"\b(?:\d{1,2}/\d{1,2}/\d{4}|\d{4}-\d{2}-\d{2})\b").unwrap();
}

/// PHI redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    pub redact_mrn: bool,
    pub redact_dates: bool,
    /// Replace matches with a short hash so repeated values can be correlated
    pub hash_for_correlation: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            redact_mrn: true,
            redact_dates: true,
            hash_for_correlation: true,
        }
    }
}

/// PHI redactor for consultation text that reaches log lines
#[derive(Debug, Clone, Default)]
pub struct PhiRedactor {
    config: RedactionConfig,
}

impl PhiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        // SSNs and MRNs first so the phone pattern never claims their digits.
        if self.config.redact_ssn {
            result = self.replace(&SSN_REGEX, &result, "SSN", "***-**-****");
        }
        if self.config.redact_mrn {
            result = self.replace(&MRN_REGEX, &result, "MRN", "MRN[REDACTED]");
        }
        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }
        if self.config.redact_phones {
            result = self.replace(&PHONE_REGEX, &result, "PHONE", "(***) ***-****");
        }
        if self.config.redact_dates {
            result = self.replace(&DOB_REGEX, &result, "DATE", "**/**/****");
        }

        result
    }

    /// Redacted prefix of `text`, at most `max_chars` characters before the
    /// ellipsis.
    pub fn excerpt(&self, text: &str, max_chars: usize) -> String {
        let redacted = self.redact(text);
        let flattened = redacted.split_whitespace().collect::<Vec<_>>().join(" ");
        if flattened.chars().count() <= max_chars {
            return flattened;
        }
        let mut excerpt: String = flattened.chars().take(max_chars).collect();
        excerpt.push('…');
        excerpt
    }

    /// Stable short digest of `text` for correlating log lines without
    /// logging the text itself.
    pub fn fingerprint(&self, text: &str) -> String {
        self.hash_value(text)
    }

    fn replace(&self, pattern: &Regex, text: &str, tag: &str, mask: &str) -> String {
        pattern.replace_all(text, |caps: &regex::Captures| {
            if self.config.hash_for_correlation {
                format!("{tag}[{}]", self.hash_value(&caps[0]))
            } else {
                mask.to_string()
            }
        }).to_string()
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX.replace_all(text, |caps: &regex::Captures| {
            let email = &caps[0];
            if self.config.hash_for_correlation {
                format!("EMAIL[{}]", self.hash_value(email))
            } else {
                match email.split_once('@') {
                    Some((local, domain)) => format!(
                        "{}***@{}***",
                        local.chars().next().unwrap_or('*'),
                        domain.chars().next().unwrap_or('*')
                    ),
                    None => "***@***".to_string(),
                }
            }
        }).to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let digest = Sha256::digest(value.as_bytes());
        general_purpose::URL_SAFE_NO_PAD.encode(&digest[..8])
    }
}
