use serde::{Serialize, Serializer};
use std::fmt;

use crate::common::AppError;

/// Institutions accepted as the source of a receipt payment.
pub const BANKS: [&str; 31] = [
    "Commercial Bank of Ethiopia (CBE)",
    "Development Bank of Ethiopia (DBE)",
    "Awash Bank",
    "Dashen Bank",
    "Bank of Abyssinia",
    "Wegagen Bank",
    "Nib International Bank",
    "Hibret Bank (United Bank)",
    "Lion International Bank",
    "Zemen Bank",
    "Oromia International Bank",
    "Cooperative Bank of Oromia",
    "Berhan Bank",
    "Abay Bank",
    "Bunna International Bank",
    "Debub Global Bank",
    "Enat Bank",
    "Addis International Bank",
    "Gadaa Bank",
    "Siinqee Bank",
    "Shabelle Bank",
    "Hijra Bank",
    "ZamZam Bank",
    "Rammis Bank",
    "Tsehay Bank",
    "Ahadu Bank",
    "Amhara Bank",
    "Goh Betoch Bank",
    "Sheger Bank",
    "Telebirr",
    "M-Pesa Ethiopia",
];

/// A payment institution from [`BANKS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bank(&'static str);

impl Bank {
    /// Resolve a display label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Result<Self, AppError> {
        let wanted = label.trim();
        BANKS
            .iter()
            .find(|b| b.eq_ignore_ascii_case(wanted))
            .map(|b| Bank(*b))
            .ok_or_else(|| AppError::validation(format!("Unsupported bank: {wanted}")))
    }

    pub fn label(&self) -> &'static str {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Bank> {
        BANKS.iter().map(|b| Bank(*b))
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for Bank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}
