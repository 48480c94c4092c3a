//! Card faces and the face-toggle state machine.

use serde::{Deserialize, Serialize};

/// Phrase a toggle label carries while the back face is visible.
const SHOW_FRONT_PHRASE: &str = "Show Front";

/// One of the two printable sides of an identity card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardFace {
    /// Photo, name and identifiers.
    Front,
    /// Verification QR code and card information.
    Back,
}

impl CardFace {
    /// The opposite face. Toggling is symmetric in both directions.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// Short uppercase title, e.g. `FRONT SIDE`.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Front => "FRONT SIDE",
            Self::Back => "BACK SIDE",
        }
    }

    /// Heading printed above the face in exported documents.
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            Self::Front => "ID CARD - FRONT SIDE",
            Self::Back => "ID CARD - BACK SIDE",
        }
    }

    /// Label the toggle control shows while this face is visible.
    #[must_use]
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Front => "Show Back",
            Self::Back => "Show Front",
        }
    }

    /// Derive the visible face from a toggle control's label text.
    ///
    /// A label offering to show the front means the back is showing. Any
    /// other label is read as the front showing.
    #[must_use]
    pub fn from_toggle_label(label: &str) -> Self {
        if label.contains(SHOW_FRONT_PHRASE) {
            Self::Back
        } else {
            Self::Front
        }
    }
}

impl std::fmt::Display for CardFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Front => write!(f, "front"),
            Self::Back => write!(f, "back"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_is_involution() {
        assert_eq!(CardFace::Front.other(), CardFace::Back);
        assert_eq!(CardFace::Back.other(), CardFace::Front);
        assert_eq!(CardFace::Front.other().other(), CardFace::Front);
    }

    #[test]
    fn test_from_toggle_label() {
        assert_eq!(CardFace::from_toggle_label("Show Back"), CardFace::Front);
        assert_eq!(CardFace::from_toggle_label("Show Front"), CardFace::Back);
        assert_eq!(
            CardFace::from_toggle_label("  ↻ Show Front side"),
            CardFace::Back
        );
        assert_eq!(CardFace::from_toggle_label(""), CardFace::Front);
    }

    #[test]
    fn test_toggle_label_matches_parse() {
        for face in [CardFace::Front, CardFace::Back] {
            assert_eq!(CardFace::from_toggle_label(face.toggle_label()), face);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&CardFace::Back).expect("serialize");
        assert_eq!(json, "\"back\"");
        let face: CardFace = serde_json::from_str("\"front\"").expect("deserialize");
        assert_eq!(face, CardFace::Front);
    }
}
