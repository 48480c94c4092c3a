//! The export pipeline.
//!
//! Every operation runs the same capture session:
//!
//! ```text
//! lock target -> locate -> hide controls
//!     -> [show face -> settle -> capture]*
//!     -> restore face -> show controls
//! ```
//!
//! and then hands the captured faces to one composer. Public operations
//! never return errors or panic; failures are logged and reported as
//! `false`.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use card_core::{CardFace, CardLayout, ExportConfig, PersonFields, QrEndpoint};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::compose::{compose_composite, render_pdf, PrintDocument};
use crate::error::{ExportError, ExportResult, Stage};
use crate::locator::{locate, locate_container, Target};
use crate::lock::TargetLocks;
use crate::raster::{encode_png, Background, CaptureOptions, RasterImage, Rasterizer};
use crate::sink::{Artifact, DownloadSink, PrintHost};
use crate::suppress::ControlsHidden;
use crate::surface::CardHost;
use crate::toggle::FaceToggler;

/// Exports cards rendered by a [`CardHost`].
///
/// Operations on the same container are serialized; operations on
/// different containers run independently.
pub struct CardExporter {
    host: Arc<dyn CardHost>,
    rasterizer: Arc<dyn Rasterizer>,
    sink: Arc<dyn DownloadSink>,
    printer: Arc<dyn PrintHost>,
    config: ExportConfig,
    qr: QrEndpoint,
    locks: TargetLocks,
    prints: Mutex<Vec<JoinHandle<()>>>,
}

impl CardExporter {
    /// Exporter with the default configuration.
    pub fn new(
        host: Arc<dyn CardHost>,
        rasterizer: Arc<dyn Rasterizer>,
        sink: Arc<dyn DownloadSink>,
        printer: Arc<dyn PrintHost>,
    ) -> Self {
        Self {
            host,
            rasterizer,
            sink,
            printer,
            config: ExportConfig::default(),
            qr: QrEndpoint::default(),
            locks: TargetLocks::new(),
            prints: Mutex::new(Vec::new()),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the QR endpoint used by print documents.
    #[must_use]
    pub fn with_qr_endpoint(mut self, qr: QrEndpoint) -> Self {
        self.qr = qr;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Capture the card in `target_id` and save it as `{file_name}.pdf`.
    pub async fn generate_card_pdf(
        &self,
        target_id: &str,
        file_name: &str,
        both_sides: bool,
    ) -> bool {
        self.run("pdf", Some(target_id), async {
            let faces = self
                .capture_faces(target_id, both_sides, Background::Transparent)
                .await?;
            let layout = CardLayout::a4(both_sides);
            let bytes = render_pdf(&faces, &layout, self.config.cutting_guides)?;
            self.sink.save(&Artifact::pdf(file_name, bytes))
        })
        .await
    }

    /// Capture the card in `target_id` and save it as a PNG.
    ///
    /// Single-sided output is the captured front as `{file_name}.png`;
    /// dual-sided output stacks both faces into
    /// `{file_name}-both-sides.png`.
    pub async fn download_card_image(
        &self,
        target_id: &str,
        file_name: &str,
        both_sides: bool,
    ) -> bool {
        self.run("png", Some(target_id), async {
            let faces = self
                .capture_faces(target_id, both_sides, Background::White)
                .await?;
            let artifact = if both_sides {
                let sheet = compose_composite(&faces, self.config.cutting_guides)?;
                Artifact::png(&format!("{file_name}-both-sides"), encode_png(&sheet)?)
            } else {
                let front = faces
                    .first()
                    .ok_or_else(|| ExportError::Encode("no face captured".to_string()))?;
                Artifact::png(file_name, front.to_png()?)
            };
            self.sink.save(&artifact)
        })
        .await
    }

    /// Open a print document for the card in `target_id`.
    ///
    /// The document is rebuilt from the container's person record (or
    /// placeholders if it exposes none). Returns once the document is
    /// written; printing happens in the background.
    pub async fn print_card(&self, target_id: &str, both_sides: bool) -> bool {
        self.run("print", Some(target_id), async {
            let surface = locate_container(self.host.as_ref(), target_id)?;
            let person = surface.person().unwrap_or_else(|| {
                tracing::warn!("container exposes no person record, printing placeholders");
                PersonFields::default()
            });
            self.open_print(&person, both_sides)
        })
        .await
    }

    /// Open a print document for `person` without touching any container.
    pub async fn print_person(&self, person: &PersonFields, both_sides: bool) -> bool {
        self.run("print", None, async { self.open_print(person, both_sides) })
            .await
    }

    /// Export one PDF per `(target_id, file_name)`, strictly one after the
    /// other. Returns how many succeeded.
    pub async fn generate_pdfs(&self, batch: &[(String, String)], both_sides: bool) -> usize {
        let mut succeeded = 0;
        for (target_id, file_name) in batch {
            if self.generate_card_pdf(target_id, file_name, both_sides).await {
                succeeded += 1;
            }
        }
        tracing::info!(total = batch.len(), succeeded, "batch export finished");
        succeeded
    }

    /// Wait for every background print task started so far.
    ///
    /// Returns how many tasks were awaited. Tasks started while waiting
    /// are left for the next call.
    pub async fn wait_for_prints(&self) -> usize {
        let pending = {
            let mut prints = self.prints.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *prints)
        };
        let count = pending.len();
        for task in pending {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "print task failed");
            }
        }
        count
    }

    /// Run one operation inside its span, under the target's lock, and
    /// flatten every failure to `false`.
    async fn run<F>(&self, op: &'static str, target_id: Option<&str>, work: F) -> bool
    where
        F: Future<Output = ExportResult<()>>,
    {
        let job = uuid::Uuid::new_v4();
        let span = tracing::info_span!("export", %job, op, target = target_id.unwrap_or("-"));

        async move {
            let _lock = match target_id {
                Some(id) => Some(self.locks.acquire(id).await),
                None => None,
            };
            let started = std::time::Instant::now();

            match AssertUnwindSafe(work).catch_unwind().await {
                Ok(Ok(())) => {
                    tracing::info!(elapsed = ?started.elapsed(), "export finished");
                    true
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "export failed");
                    false
                }
                Err(_) => {
                    tracing::error!("export panicked");
                    false
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Capture the requested faces, then put the card back as it was.
    ///
    /// Faces come back front first. The face is restored before the
    /// controls reappear, on success, on error and when a capture panics.
    async fn capture_faces(
        &self,
        target_id: &str,
        both_sides: bool,
        background: Background,
    ) -> ExportResult<Vec<RasterImage>> {
        let target = locate(self.host.as_ref(), target_id, self.config.design_size)?;
        let options = CaptureOptions::from_config(&self.config, background);

        let _hidden = ControlsHidden::hide(target.surface.clone());
        let mut toggler = FaceToggler::new(target_id, target.surface.face_control(), &self.config);

        let captured =
            AssertUnwindSafe(self.capture_sequence(&target, &mut toggler, both_sides, &options))
                .catch_unwind()
                .await;
        let restored = toggler.restore().await;

        tracing::debug!(
            transitions = toggler.transitions().len(),
            original = ?toggler.original(),
            "capture session finished"
        );

        let faces = match captured {
            Ok(result) => result?,
            Err(panic) => {
                tracing::debug!(restored = restored.is_ok(), "capture panicked");
                std::panic::resume_unwind(panic)
            }
        };
        if let Err(e) = restored {
            tracing::warn!(error = %e, "could not restore original face");
            return Err(e);
        }
        Ok(faces)
    }

    async fn capture_sequence(
        &self,
        target: &Target,
        toggler: &mut FaceToggler,
        both_sides: bool,
        options: &CaptureOptions,
    ) -> ExportResult<Vec<RasterImage>> {
        if both_sides {
            if !toggler.has_control() {
                return Err(ExportError::ToggleMissing(target.surface.id().to_string()));
            }
            let front = self
                .settle_and_capture(target, toggler, CardFace::Front, options)
                .await?;
            let back = self
                .settle_and_capture(target, toggler, CardFace::Back, options)
                .await?;
            return Ok(vec![front, back]);
        }

        if !toggler.has_control() {
            tracing::warn!("no face control, capturing the visible face as the front");
        }
        let front = self
            .settle_and_capture(target, toggler, CardFace::Front, options)
            .await?;
        Ok(vec![front])
    }

    /// Show `face`, wait for it to settle and capture it, retrying the
    /// whole step on timeouts and face mismatches.
    async fn settle_and_capture(
        &self,
        target: &Target,
        toggler: &mut FaceToggler,
        face: CardFace,
        options: &CaptureOptions,
    ) -> ExportResult<RasterImage> {
        let mut attempt = 0;
        loop {
            let result = async {
                if toggler.has_control() {
                    if attempt > 0 {
                        toggler.settle().await?;
                    }
                    toggler.show(face).await?;
                }
                self.capture_face(target, face, options).await
            }
            .await;

            match result {
                Err(e) if e.is_retryable() && attempt < self.config.capture_retries => {
                    attempt += 1;
                    tracing::warn!(%face, attempt, error = %e, "retrying capture");
                }
                other => return other,
            }
        }
    }

    async fn capture_face(
        &self,
        target: &Target,
        face: CardFace,
        options: &CaptureOptions,
    ) -> ExportResult<RasterImage> {
        let limit = self.config.capture_timeout();
        let image = tokio::time::timeout(limit, self.rasterizer.capture(&target.node, options))
            .await
            .map_err(|_| ExportError::Timeout {
                stage: Stage::Capture,
                after: limit,
            })??;

        let raster = RasterImage::new(face, image);
        if raster.is_empty() {
            return Err(ExportError::EmptyRaster(face));
        }
        tracing::debug!(
            %face,
            width = raster.image.width(),
            height = raster.image.height(),
            "face captured"
        );
        Ok(raster)
    }

    /// Write the print document and hand printing to a background task.
    ///
    /// The task is tracked so [`CardExporter::wait_for_prints`] can await it.
    fn open_print(&self, person: &PersonFields, both_sides: bool) -> ExportResult<()> {
        let document = PrintDocument::build(person, both_sides, &self.qr, None);
        let mut window = self.printer.open().ok_or(ExportError::PopupBlocked)?;
        window.write(document.as_str())?;
        window.close_document()?;

        let load_timeout = self.config.print_load_timeout();
        let delay = self.config.print_delay();
        let task = tokio::spawn(
            async move {
                if tokio::time::timeout(load_timeout, window.loaded()).await.is_err() {
                    let e = ExportError::Timeout {
                        stage: Stage::PrintLoad,
                        after: load_timeout,
                    };
                    tracing::warn!(error = %e, "printing without full load");
                }
                tokio::time::sleep(delay).await;
                window.print();
                window.close();
                tracing::debug!("print window closed");
            }
            .in_current_span(),
        );

        let mut prints = self.prints.lock().unwrap_or_else(PoisonError::into_inner);
        prints.retain(|t| !t.is_finished());
        prints.push(task);
        Ok(())
    }
}

impl std::fmt::Debug for CardExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardExporter")
            .field("config", &self.config)
            .field("qr", &self.qr)
            .finish_non_exhaustive()
    }
}
