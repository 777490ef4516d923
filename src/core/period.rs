use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{AppError, Result};

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

/// A validated (month, year) pair.
///
/// Billing statements are issued for the month after the service was
/// rendered, so every import period has a companion reference period one
/// month earlier (see [`Period::reference_period`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    // Field order matters for the derived Ord: year first
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawPeriod {
    month: u32,
    year: i32,
}

impl TryFrom<RawPeriod> for Period {
    type Error = AppError;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        Period::new(raw.month, raw.year)
    }
}

impl Period {
    /// Create a period, rejecting month outside 1..=12 or year outside 2000..=2100
    pub fn new(month: u32, year: i32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(AppError::InvalidPeriod { month, year });
        }
        Ok(Self { year, month })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The period the billed amounts are attributed to: one month earlier,
    /// rolling January back to December of the previous year.
    ///
    /// January 2000 maps to December 1999, which is outside the constructible
    /// range; the value is still returned since it is only ever used as a label.
    pub fn reference_period(&self) -> Period {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Zero-padded `MMYYYY`, the billing API's `periodo` parameter
    pub fn formatted(&self) -> String {
        format!("{:02}{:04}", self.month, self.year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}
