//! QR code image URLs.
//!
//! Cards embed QR codes by URL against a public rendering endpoint; nothing
//! is generated locally. Both payloads are derived from the person record.

use serde::Serialize;
use url::{form_urlencoded, Url};

use crate::person::{AUTHORITY_FULL, ISSUE_DATE_ISO, VERIFICATION_URL};
use crate::{CardResult, PersonFields};

/// Default public QR rendering endpoint.
pub const DEFAULT_QR_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Default rendered QR size in pixels.
pub const DEFAULT_QR_SIZE: u32 = 150;

/// Machine-readable record encoded in the back-face QR code.
#[derive(Debug, Serialize)]
struct EidPayload<'a> {
    id: &'a str,
    nrc: &'a str,
    name: &'a str,
    dob: &'a str,
    issued: &'a str,
    authority: &'a str,
    verification_url: &'a str,
}

/// Builds QR image URLs for card faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrEndpoint {
    base: String,
    size: u32,
}

impl Default for QrEndpoint {
    fn default() -> Self {
        Self {
            base: DEFAULT_QR_ENDPOINT.to_string(),
            size: DEFAULT_QR_SIZE,
        }
    }
}

impl QrEndpoint {
    /// Create an endpoint from a base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not an absolute URL.
    pub fn new(base: &str, size: u32) -> CardResult<Self> {
        let parsed = Url::parse(base)?;
        Ok(Self {
            base: parsed.as_str().trim_end_matches('?').to_string(),
            size,
        })
    }

    /// URL rendering an arbitrary payload.
    #[must_use]
    pub fn url_for(&self, payload: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("size", &format!("{0}x{0}", self.size))
            .append_pair("data", payload)
            .finish();
        let sep = if self.base.contains('?') { '&' } else { '?' };
        format!("{}{sep}{query}", self.base)
    }

    /// URL for the front-face QR code (`{personal_id}-{nrc}`).
    #[must_use]
    pub fn front_url(&self, person: &PersonFields) -> String {
        self.url_for(&format!("{}-{}", person.personal_id, person.nrc))
    }

    /// URL for the back-face verification QR code.
    #[must_use]
    pub fn back_url(&self, person: &PersonFields) -> String {
        self.url_for(&eid_payload(person))
    }
}

/// JSON verification record for the back-face QR code.
#[must_use]
pub fn eid_payload(person: &PersonFields) -> String {
    let payload = EidPayload {
        id: &person.personal_id,
        nrc: &person.nrc,
        name: &person.name,
        dob: &person.date_of_birth,
        issued: ISSUE_DATE_ISO,
        authority: AUTHORITY_FULL,
        verification_url: VERIFICATION_URL,
    };
    serde_json::to_string(&payload).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn john() -> PersonFields {
        PersonFields::new("John Doe", "ID-001", "12/MAKANA(N)123456")
    }

    #[test]
    fn test_front_url_encodes_payload() {
        let raw = QrEndpoint::default().front_url(&john());
        let url = Url::parse(&raw).expect("valid url");
        assert_eq!(url.host_str(), Some("api.qrserver.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("size".to_string(), "150x150".to_string())));
        assert!(pairs.contains(&("data".to_string(), "ID-001-12/MAKANA(N)123456".to_string())));
        assert!(!raw.contains("(N)"), "payload must be escaped");
    }

    #[test]
    fn test_back_payload_is_json() {
        let payload = eid_payload(&john());
        let value: serde_json::Value = serde_json::from_str(&payload).expect("json");
        assert_eq!(value["id"], "ID-001");
        assert_eq!(value["issued"], "2024-01-15");
        assert_eq!(value["verification_url"], "https://eid.gov.mm/verify");
    }

    #[test]
    fn test_back_url_round_trips_payload() {
        let url = Url::parse(&QrEndpoint::default().back_url(&john())).expect("valid url");
        let data = url
            .query_pairs()
            .find(|(k, _)| k == "data")
            .map(|(_, v)| v.into_owned())
            .expect("data param");
        assert_eq!(data, eid_payload(&john()));
    }

    #[test]
    fn test_custom_endpoint() {
        let qr = QrEndpoint::new("http://localhost:8080/qr", 64).expect("endpoint");
        let url = qr.url_for("x");
        assert!(url.starts_with("http://localhost:8080/qr?size=64x64"));
        assert!(QrEndpoint::new("not a url", 64).is_err());
    }
}
