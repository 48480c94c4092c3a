//! Driving the card between its front and back faces.
//!
//! Both faces occupy the same node, so the toggle is the only way to reach
//! the hidden side. The toggler reads the starting face instead of assuming
//! it, awaits a bounded settle after every change, and can put the card
//! back the way it found it.

use std::sync::Arc;
use std::time::Duration;

use card_core::{CardFace, ExportConfig};

use crate::error::{ExportError, ExportResult, Stage};
use crate::surface::FaceControl;

/// Face state machine over a container's [`FaceControl`].
pub struct FaceToggler {
    container_id: String,
    control: Option<Arc<dyn FaceControl>>,
    original: Option<CardFace>,
    settle_delay: Duration,
    settle_timeout: Duration,
    transitions: Vec<(CardFace, CardFace)>,
}

impl FaceToggler {
    /// Create a toggler and record the face visible right now.
    #[must_use]
    pub fn new(
        container_id: impl Into<String>,
        control: Option<Arc<dyn FaceControl>>,
        config: &ExportConfig,
    ) -> Self {
        let original = control.as_ref().map(|c| c.face());
        Self {
            container_id: container_id.into(),
            control,
            original,
            settle_delay: config.settle_delay(),
            settle_timeout: config.settle_timeout(),
            transitions: Vec::new(),
        }
    }

    /// True if the container has a face control.
    #[must_use]
    pub fn has_control(&self) -> bool {
        self.control.is_some()
    }

    /// The face visible when the toggler was created.
    #[must_use]
    pub fn original(&self) -> Option<CardFace> {
        self.original
    }

    /// The face visible now, if there is a control to ask.
    #[must_use]
    pub fn current(&self) -> Option<CardFace> {
        self.control.as_ref().map(|c| c.face())
    }

    /// True if the back is visible now.
    #[must_use]
    pub fn currently_showing_back(&self) -> bool {
        self.current() == Some(CardFace::Back)
    }

    /// Every transition performed, in order.
    #[must_use]
    pub fn transitions(&self) -> &[(CardFace, CardFace)] {
        &self.transitions
    }

    /// Make `face` visible and wait for it to render.
    ///
    /// Does nothing if `face` is already visible.
    ///
    /// # Errors
    ///
    /// - [`ExportError::ToggleMissing`] if there is no face control.
    /// - [`ExportError::Timeout`] if the settle signal does not arrive in time.
    /// - [`ExportError::FaceMismatch`] if the control reports another face afterwards.
    pub async fn show(&mut self, face: CardFace) -> ExportResult<()> {
        let control = self
            .control
            .clone()
            .ok_or_else(|| ExportError::ToggleMissing(self.container_id.clone()))?;

        let from = control.face();
        if from == face {
            return Ok(());
        }

        tracing::debug!(container = %self.container_id, %from, to = %face, "switching face");
        control.set_face(face);
        self.transitions.push((from, face));

        self.settle().await?;
        self.verify(face)
    }

    /// Wait for the last face change to render, bounded by the settle timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Timeout`] if the settle signal does not arrive
    /// in time.
    pub async fn settle(&self) -> ExportResult<()> {
        let Some(control) = &self.control else {
            return Ok(());
        };
        tokio::time::timeout(self.settle_timeout, control.settled(self.settle_delay))
            .await
            .map_err(|_| ExportError::Timeout {
                stage: Stage::Settle,
                after: self.settle_timeout,
            })
    }

    /// Check the control reports `face`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::FaceMismatch`] if it reports another face.
    pub fn verify(&self, face: CardFace) -> ExportResult<()> {
        match self.current() {
            Some(actual) if actual != face => Err(ExportError::FaceMismatch {
                expected: face,
                actual,
            }),
            _ => Ok(()),
        }
    }

    /// Return the card to the face recorded at creation.
    ///
    /// # Errors
    ///
    /// Same as [`FaceToggler::show`].
    pub async fn restore(&mut self) -> ExportResult<()> {
        match self.original {
            Some(face) => self.show(face).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct Switch {
        face: Mutex<CardFace>,
        stuck: bool,
        hang: bool,
    }

    impl Switch {
        fn new(face: CardFace) -> Arc<Self> {
            Arc::new(Self {
                face: Mutex::new(face),
                stuck: false,
                hang: false,
            })
        }
    }

    #[async_trait]
    impl FaceControl for Switch {
        fn face(&self) -> CardFace {
            *self.face.lock().expect("lock")
        }

        fn set_face(&self, face: CardFace) {
            if !self.stuck {
                *self.face.lock().expect("lock") = face;
            }
        }

        async fn settled(&self, _fallback: Duration) {
            if self.hang {
                std::future::pending::<()>().await;
            }
        }
    }

    fn fast_config() -> ExportConfig {
        ExportConfig {
            settle_delay_ms: 1,
            settle_timeout_ms: 30,
            ..ExportConfig::default()
        }
    }

    #[tokio::test]
    async fn test_show_and_restore() {
        let switch = Switch::new(CardFace::Back);
        let mut toggler = FaceToggler::new("c", Some(switch.clone()), &fast_config());
        assert!(toggler.currently_showing_back());

        toggler.show(CardFace::Front).await.expect("front");
        toggler.show(CardFace::Front).await.expect("no-op");
        toggler.restore().await.expect("restore");

        assert_eq!(switch.face(), CardFace::Back);
        assert_eq!(
            toggler.transitions(),
            &[
                (CardFace::Back, CardFace::Front),
                (CardFace::Front, CardFace::Back)
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_control() {
        let mut toggler = FaceToggler::new("c", None, &fast_config());
        assert!(!toggler.has_control());
        assert!(matches!(
            toggler.show(CardFace::Back).await,
            Err(ExportError::ToggleMissing(id)) if id == "c"
        ));
        toggler.restore().await.expect("nothing to restore");
    }

    #[tokio::test]
    async fn test_settle_timeout() {
        let switch = Arc::new(Switch {
            face: Mutex::new(CardFace::Front),
            stuck: false,
            hang: true,
        });
        let mut toggler = FaceToggler::new("c", Some(switch), &fast_config());
        let result = toggler.show(CardFace::Back).await;
        assert!(matches!(
            result,
            Err(ExportError::Timeout {
                stage: Stage::Settle,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_stuck_control_is_mismatch() {
        let switch = Arc::new(Switch {
            face: Mutex::new(CardFace::Front),
            stuck: true,
            hang: false,
        });
        let mut toggler = FaceToggler::new("c", Some(switch), &fast_config());
        let result = toggler.show(CardFace::Back).await;
        assert!(matches!(
            result,
            Err(ExportError::FaceMismatch {
                expected: CardFace::Back,
                actual: CardFace::Front
            })
        ));
    }
}
