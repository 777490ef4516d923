//! Brazilian fiscal identifiers.
//!
//! The provider returns a personal id (CPF, 11 digits) in the "organization
//! id" field for unincorporated subscribers, so the kind is detected from the
//! digit count instead of being assumed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::{AppError, Result};

const CPF_LEN: usize = 11;
const CNPJ_LEN: usize = 14;

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Detected document kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// 11-digit personal id (CPF)
    Personal,
    /// 14-digit organization id (CNPJ)
    Organization,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Personal => write!(f, "CPF"),
            DocumentKind::Organization => write!(f, "CNPJ"),
        }
    }
}

/// A checksum-validated fiscal document, stored as its normalized digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalDocument {
    digits: String,
    kind: DocumentKind,
}

impl FiscalDocument {
    /// Strip punctuation, detect the kind by length and verify both check digits
    pub fn parse(raw: &str) -> Result<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        let kind = match digits.len() {
            CPF_LEN => DocumentKind::Personal,
            CNPJ_LEN => DocumentKind::Organization,
            other => {
                return Err(AppError::invalid_document(format!(
                    "expected 11 or 14 digits, got {}",
                    other
                )))
            }
        };

        let values: Vec<u32> = digits.bytes().map(|b| u32::from(b - b'0')).collect();

        if values.iter().all(|d| *d == values[0]) {
            return Err(AppError::invalid_document(format!(
                "{} with all digits equal",
                kind
            )));
        }

        let valid = match kind {
            DocumentKind::Personal => cpf_checksum_ok(&values),
            DocumentKind::Organization => cnpj_checksum_ok(&values),
        };

        if !valid {
            return Err(AppError::invalid_document(format!(
                "{} check digits do not match",
                kind
            )));
        }

        Ok(Self { digits, kind })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn is_personal(&self) -> bool {
        self.kind == DocumentKind::Personal
    }

    /// Normalized digit string, as sent to the billing API
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Conventional punctuation: `000.000.000-00` or `00.000.000/0000-00`
    pub fn formatted(&self) -> String {
        let d = &self.digits;
        match self.kind {
            DocumentKind::Personal => {
                format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
            }
            DocumentKind::Organization => format!(
                "{}.{}.{}/{}-{}",
                &d[0..2],
                &d[2..5],
                &d[5..8],
                &d[8..12],
                &d[12..14]
            ),
        }
    }

    /// Form safe for log output, keeping only the middle digits
    pub fn masked(&self) -> String {
        let d = &self.digits;
        match self.kind {
            DocumentKind::Personal => format!("***.{}.{}-**", &d[3..6], &d[6..9]),
            DocumentKind::Organization => format!("**.{}.{}/****-**", &d[2..5], &d[5..8]),
        }
    }
}

/// Modulo-11 check digit: remainder below 2 maps to 0, otherwise `11 - remainder`
fn check_digit(digits: &[u32], weights: impl Iterator<Item = u32>) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

fn cpf_checksum_ok(values: &[u32]) -> bool {
    let first = check_digit(&values[..9], (2..=10).rev());
    let second = check_digit(&values[..10], (2..=11).rev());
    values[9] == first && values[10] == second
}

fn cnpj_checksum_ok(values: &[u32]) -> bool {
    let first = check_digit(&values[..12], CNPJ_FIRST_WEIGHTS.iter().copied());
    let second = check_digit(&values[..13], CNPJ_SECOND_WEIGHTS.iter().copied());
    values[12] == first && values[13] == second
}

impl FromStr for FiscalDocument {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FiscalDocument {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FiscalDocument> for String {
    fn from(doc: FiscalDocument) -> Self {
        doc.digits
    }
}

impl fmt::Display for FiscalDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}
