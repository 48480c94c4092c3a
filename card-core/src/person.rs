//! Person records printed on the card.

use serde::{Deserialize, Serialize};

use crate::CardResult;

/// Placeholder for a missing name or identifier.
pub const UNKNOWN: &str = "Unknown";

/// Placeholder national registration code.
pub const PLACEHOLDER_NRC: &str = "12/MAKANA(N)123456";

/// Placeholder date of birth.
pub const PLACEHOLDER_DOB: &str = "1990-05-15";

/// Issue date printed on the back face.
pub const ISSUE_DATE: &str = "15 Jan 2024";

/// Issue date in the machine-readable QR payload.
pub const ISSUE_DATE_ISO: &str = "2024-01-15";

/// Expiry date printed on the back face.
pub const EXPIRY_DATE: &str = "31 Dec 2029";

/// Short expiry printed in the front footer.
pub const EXPIRY_SHORT: &str = "12/2029";

/// Issuing authority printed on the back face.
pub const AUTHORITY: &str = "Digital ID Dept";

/// Issuing authority in the QR payload.
pub const AUTHORITY_FULL: &str = "Myanmar Digital ID Authority";

/// Public verification address.
pub const VERIFICATION_URL: &str = "https://eid.gov.mm/verify";

/// The fields of a person record needed to draw a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonFields {
    /// Full name.
    pub name: String,
    /// Personal identifier, e.g. `ID-001`.
    pub personal_id: String,
    /// National registration code, e.g. `12/MAKANA(N)123456`.
    pub nrc: String,
    /// Date of birth as displayed, e.g. `1990-05-15`.
    pub date_of_birth: String,
    /// Optional photo URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl Default for PersonFields {
    fn default() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            personal_id: UNKNOWN.to_string(),
            nrc: PLACEHOLDER_NRC.to_string(),
            date_of_birth: PLACEHOLDER_DOB.to_string(),
            photo: None,
        }
    }
}

impl PersonFields {
    /// Create a record from the three identifying fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        personal_id: impl Into<String>,
        nrc: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            personal_id: personal_id.into(),
            nrc: nrc.into(),
            ..Self::default()
        }
    }

    /// Set the date of birth.
    #[must_use]
    pub fn with_date_of_birth(mut self, dob: impl Into<String>) -> Self {
        self.date_of_birth = dob.into();
        self
    }

    /// Set the photo URL.
    #[must_use]
    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self
    }

    /// Replace blank fields with their placeholders.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.name.trim().is_empty() {
            self.name = defaults.name;
        }
        if self.personal_id.trim().is_empty() {
            self.personal_id = defaults.personal_id;
        }
        if self.nrc.trim().is_empty() {
            self.nrc = defaults.nrc;
        }
        if self.date_of_birth.trim().is_empty() {
            self.date_of_birth = defaults.date_of_birth;
        }
        self
    }

    /// First character of the name, used as the avatar fallback.
    #[must_use]
    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }

    /// Serial number shown in the front footer.
    #[must_use]
    pub fn front_serial(&self) -> String {
        format!("SC-{}", self.personal_id)
    }

    /// Serial number shown on the back face.
    #[must_use]
    pub fn back_serial(&self) -> String {
        format!("MID{}", self.personal_id)
    }

    /// Default export file stem derived from the name, e.g. `John-Doe-Card`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        let words: Vec<String> = self
            .name
            .split_whitespace()
            .map(|w| {
                w.chars()
                    .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                    .collect::<String>()
            })
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            "ID-Card".to_string()
        } else {
            format!("{}-Card", words.join("-"))
        }
    }

    /// Parse one record from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> CardResult<Self> {
        let person: Self = serde_json::from_str(json)?;
        Ok(person.normalized())
    }

    /// Parse either a single record or an array of records from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is neither a record nor an array of records.
    pub fn list_from_json(json: &str) -> CardResult<Vec<Self>> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let people: Vec<Self> = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            vec![serde_json::from_value(value)?]
        };
        Ok(people.into_iter().map(Self::normalized).collect())
    }
}
