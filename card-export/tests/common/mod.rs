//! Scripted fakes for exercising the export pipeline.
//!
//! Every fake appends to one shared event log so tests can assert on the
//! exact order of face changes and captures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use card_core::{CardFace, ExportConfig, PersonFields, PixelSize};
use card_export::{
    CaptureOptions, CardExporter, CardHost, CardSurface, ControlId, ExportError, ExportResult,
    FaceControl, FaceNode, MemorySink, PrintHost, PrintWindow, Rasterizer,
};
use image::RgbaImage;

/// Something observable that happened during an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A face change was requested.
    SetFace { container: String, face: CardFace },
    /// A capture began; records what was on screen.
    CaptureStart {
        container: String,
        face: CardFace,
        visible_controls: usize,
    },
    /// A capture finished.
    CaptureEnd { container: String },
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// One scripted card container.
pub struct FakeCard {
    pub id: String,
    face: Mutex<CardFace>,
    has_control: bool,
    visible: Mutex<Vec<bool>>,
    node_size: PixelSize,
    hang_settle: AtomicBool,
    person: Option<PersonFields>,
    log: EventLog,
}

impl FakeCard {
    pub fn face(&self) -> CardFace {
        *self.face.lock().expect("face lock")
    }

    pub fn visibility(&self) -> Vec<bool> {
        self.visible.lock().expect("visible lock").clone()
    }

    pub fn set_hang_settle(&self, hang: bool) {
        self.hang_settle.store(hang, Ordering::SeqCst);
    }
}

/// Builder for [`FakeCard`].
pub struct CardSpec {
    id: String,
    face: CardFace,
    has_control: bool,
    controls: Vec<bool>,
    node_size: PixelSize,
    person: Option<PersonFields>,
}

impl CardSpec {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            face: CardFace::Front,
            has_control: true,
            controls: vec![true, true, true],
            node_size: PixelSize::design(),
            person: Some(PersonFields::new("John Doe", "P-001", "12/ABC(N)654321")),
        }
    }

    pub fn showing(mut self, face: CardFace) -> Self {
        self.face = face;
        self
    }

    pub fn without_control(mut self) -> Self {
        self.has_control = false;
        self
    }

    pub fn controls(mut self, visible: &[bool]) -> Self {
        self.controls = visible.to_vec();
        self
    }

    pub fn node_size(mut self, size: PixelSize) -> Self {
        self.node_size = size;
        self
    }

    pub fn without_person(mut self) -> Self {
        self.person = None;
        self
    }
}

/// Host over a fixed set of fake cards.
pub struct FakeHost {
    cards: HashMap<String, Arc<FakeCard>>,
}

impl FakeHost {
    pub fn card(&self, id: &str) -> Arc<FakeCard> {
        self.cards.get(id).cloned().expect("card exists")
    }
}

impl CardHost for FakeHost {
    fn container(&self, id: &str) -> Option<Arc<dyn CardSurface>> {
        self.cards
            .get(id)
            .map(|card| Arc::new(FakeSurface(card.clone())) as Arc<dyn CardSurface>)
    }
}

struct FakeSurface(Arc<FakeCard>);

impl CardSurface for FakeSurface {
    fn id(&self) -> &str {
        &self.0.id
    }

    fn face_node(&self) -> Option<FaceNode> {
        Some(FaceNode {
            container_id: self.0.id.clone(),
            size: self.0.node_size,
            marker: "w-[400px]".to_string(),
        })
    }

    fn controls(&self) -> Vec<ControlId> {
        (0..self.0.visibility().len()).map(ControlId).collect()
    }

    fn is_control_visible(&self, control: ControlId) -> bool {
        self.0.visibility()[control.0]
    }

    fn set_control_visible(&self, control: ControlId, visible: bool) {
        self.0.visible.lock().expect("visible lock")[control.0] = visible;
    }

    fn face_control(&self) -> Option<Arc<dyn FaceControl>> {
        self.0
            .has_control
            .then(|| Arc::new(FakeControl(self.0.clone())) as Arc<dyn FaceControl>)
    }

    fn person(&self) -> Option<PersonFields> {
        self.0.person.clone()
    }
}

struct FakeControl(Arc<FakeCard>);

#[async_trait]
impl FaceControl for FakeControl {
    fn face(&self) -> CardFace {
        self.0.face()
    }

    fn set_face(&self, face: CardFace) {
        *self.0.face.lock().expect("face lock") = face;
        self.0.log.lock().expect("log lock").push(Event::SetFace {
            container: self.0.id.clone(),
            face,
        });
    }

    async fn settled(&self, _fallback: Duration) {
        if self.0.hang_settle.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

/// How the fake rasterizer behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterMode {
    /// A small solid bitmap, coloured by face.
    Normal,
    /// A zero-height bitmap.
    Empty,
    /// Never finishes.
    Hang,
    /// Panics when asked to draw the back face.
    PanicOnBack,
}

/// Rasterizer that records what it saw.
pub struct FakeRasterizer {
    cards: HashMap<String, Arc<FakeCard>>,
    log: EventLog,
    mode: Mutex<RasterMode>,
    delay: Duration,
    pub captures: AtomicUsize,
}

impl FakeRasterizer {
    pub fn set_mode(&self, mode: RasterMode) {
        *self.mode.lock().expect("mode lock") = mode;
    }
}

/// Width of every fake capture.
pub const FAKE_WIDTH: u32 = 40;
/// Height of every fake capture.
pub const FAKE_HEIGHT: u32 = 25;

#[async_trait]
impl Rasterizer for FakeRasterizer {
    async fn capture(&self, node: &FaceNode, _options: &CaptureOptions) -> ExportResult<RgbaImage> {
        let card = self
            .cards
            .get(&node.container_id)
            .cloned()
            .ok_or_else(|| ExportError::Raster("unknown container".to_string()))?;
        let face = card.face();
        let visible_controls = card.visibility().iter().filter(|v| **v).count();

        self.captures.fetch_add(1, Ordering::SeqCst);
        self.log.lock().expect("log lock").push(Event::CaptureStart {
            container: card.id.clone(),
            face,
            visible_controls,
        });

        let mode = *self.mode.lock().expect("mode lock");
        if mode == RasterMode::Hang {
            std::future::pending::<()>().await;
        }
        if mode == RasterMode::PanicOnBack && face == CardFace::Back {
            panic!("rasterizer crashed on the back face");
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.log.lock().expect("log lock").push(Event::CaptureEnd {
            container: card.id.clone(),
        });

        let colour = match face {
            CardFace::Front => image::Rgba([200, 30, 30, 255]),
            CardFace::Back => image::Rgba([30, 30, 200, 255]),
        };
        Ok(match mode {
            RasterMode::Empty => RgbaImage::new(FAKE_WIDTH, 0),
            _ => RgbaImage::from_pixel(FAKE_WIDTH, FAKE_HEIGHT, colour),
        })
    }
}

/// What happened to one print window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowRecord {
    pub html: String,
    pub document_closed: bool,
    pub printed: bool,
    pub closed: bool,
}

/// Print host that records its windows, or refuses to open any.
#[derive(Default)]
pub struct RecordingPrintHost {
    pub blocked: bool,
    /// Windows never report that their document loaded.
    pub never_loads: bool,
    pub windows: Arc<Mutex<Vec<WindowRecord>>>,
}

impl RecordingPrintHost {
    pub fn records(&self) -> Vec<WindowRecord> {
        self.windows.lock().expect("windows lock").clone()
    }
}

impl PrintHost for RecordingPrintHost {
    fn open(&self) -> Option<Box<dyn PrintWindow>> {
        if self.blocked {
            return None;
        }
        let mut windows = self.windows.lock().expect("windows lock");
        windows.push(WindowRecord::default());
        Some(Box::new(RecordingWindow {
            index: windows.len() - 1,
            windows: self.windows.clone(),
            never_loads: self.never_loads,
        }))
    }
}

struct RecordingWindow {
    index: usize,
    windows: Arc<Mutex<Vec<WindowRecord>>>,
    never_loads: bool,
}

impl RecordingWindow {
    fn update(&self, f: impl FnOnce(&mut WindowRecord)) {
        f(&mut self.windows.lock().expect("windows lock")[self.index]);
    }
}

#[async_trait]
impl PrintWindow for RecordingWindow {
    fn write(&mut self, html: &str) -> ExportResult<()> {
        self.update(|r| r.html.push_str(html));
        Ok(())
    }

    fn close_document(&mut self) -> ExportResult<()> {
        self.update(|r| r.document_closed = true);
        Ok(())
    }

    async fn loaded(&self) {
        if self.never_loads {
            std::future::pending::<()>().await;
        }
    }

    fn print(&mut self) {
        self.update(|r| r.printed = true);
    }

    fn close(&mut self) {
        self.update(|r| r.closed = true);
    }
}

/// Short waits so failure paths finish quickly.
pub fn fast_config() -> ExportConfig {
    ExportConfig {
        settle_delay_ms: 1,
        settle_timeout_ms: 50,
        capture_timeout_ms: 200,
        capture_retries: 1,
        raster_scale: 1,
        print_delay_ms: 5,
        print_load_timeout_ms: 50,
        ..ExportConfig::default()
    }
}

/// An exporter wired to fakes, plus handles on every fake.
pub struct Harness {
    pub host: Arc<FakeHost>,
    pub rasterizer: Arc<FakeRasterizer>,
    pub sink: Arc<MemorySink>,
    pub printer: Arc<RecordingPrintHost>,
    pub log: EventLog,
    pub exporter: Arc<CardExporter>,
}

impl Harness {
    pub fn new(cards: Vec<CardSpec>) -> Self {
        Self::build(cards, Duration::ZERO, RecordingPrintHost::default())
    }

    /// Captures take `delay` each.
    pub fn with_capture_delay(cards: Vec<CardSpec>, delay: Duration) -> Self {
        Self::build(cards, delay, RecordingPrintHost::default())
    }

    /// The print host refuses every window.
    pub fn popup_blocked(cards: Vec<CardSpec>) -> Self {
        let printer = RecordingPrintHost {
            blocked: true,
            ..RecordingPrintHost::default()
        };
        Self::build(cards, Duration::ZERO, printer)
    }

    /// Print documents never finish loading.
    pub fn print_never_loads(cards: Vec<CardSpec>) -> Self {
        let printer = RecordingPrintHost {
            never_loads: true,
            ..RecordingPrintHost::default()
        };
        Self::build(cards, Duration::ZERO, printer)
    }

    fn build(cards: Vec<CardSpec>, delay: Duration, printer: RecordingPrintHost) -> Self {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let cards: HashMap<String, Arc<FakeCard>> = cards
            .into_iter()
            .map(|spec| {
                let card = Arc::new(FakeCard {
                    id: spec.id.clone(),
                    face: Mutex::new(spec.face),
                    has_control: spec.has_control,
                    visible: Mutex::new(spec.controls),
                    node_size: spec.node_size,
                    hang_settle: AtomicBool::new(false),
                    person: spec.person,
                    log: log.clone(),
                });
                (spec.id, card)
            })
            .collect();

        let host = Arc::new(FakeHost {
            cards: cards.clone(),
        });
        let rasterizer = Arc::new(FakeRasterizer {
            cards,
            log: log.clone(),
            mode: Mutex::new(RasterMode::Normal),
            delay,
            captures: AtomicUsize::new(0),
        });
        let sink = Arc::new(MemorySink::new());
        let printer = Arc::new(printer);
        let exporter = Arc::new(
            CardExporter::new(host.clone(), rasterizer.clone(), sink.clone(), printer.clone())
                .with_config(fast_config()),
        );

        Self {
            host,
            rasterizer,
            sink,
            printer,
            log,
            exporter,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().expect("log lock").clone()
    }

    /// Face changes, in order.
    pub fn face_changes(&self) -> Vec<CardFace> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::SetFace { face, .. } => Some(face),
                _ => None,
            })
            .collect()
    }

    /// Faces seen by each capture, in order.
    pub fn captured_faces(&self) -> Vec<CardFace> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::CaptureStart { face, .. } => Some(face),
                _ => None,
            })
            .collect()
    }

    pub fn capture_count(&self) -> usize {
        self.rasterizer.captures.load(Ordering::SeqCst)
    }
}
