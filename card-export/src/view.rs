//! In-memory card host and an SVG face rasterizer.
//!
//! [`CardBoard`] holds rendered cards keyed by container id, the way a page
//! holds card components. Each [`CardView`] shows one face at a time and
//! carries the usual controls (face toggle, download, print). The
//! [`SvgFaceRasterizer`] draws a view's current face with resvg.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use card_core::person::{AUTHORITY, EXPIRY_DATE, EXPIRY_SHORT, ISSUE_DATE};
use card_core::{CardFace, PersonFields, PixelSize, QrEndpoint};
use image::RgbaImage;

use crate::error::{ExportError, ExportResult};
use crate::raster::{CaptureOptions, Rasterizer};
use crate::surface::{CardHost, CardSurface, ControlId, FaceControl, FaceNode, ToggleButton};
use crate::svg::{escape_xml, rasterize_svg};

/// Marker carried by the fixed-width face node.
pub const FACE_MARKER: &str = "w-[400px]";

/// Label of the download control.
pub const DOWNLOAD_LABEL: &str = "Download";

/// Label of the print control.
pub const PRINT_LABEL: &str = "Print";

/// Rendered cards keyed by container id.
#[derive(Debug, Default)]
pub struct CardBoard {
    views: RwLock<HashMap<String, Arc<CardView>>>,
}

impl CardBoard {
    /// Empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a card for `person` under `id`, replacing any previous one.
    pub fn insert(&self, id: impl Into<String>, person: PersonFields) -> Arc<CardView> {
        self.insert_view(CardView::new(id, person))
    }

    /// Add a prepared view.
    pub fn insert_view(&self, view: CardView) -> Arc<CardView> {
        let view = Arc::new(view);
        self.views
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(view.id.clone(), view.clone());
        view
    }

    /// The view under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<CardView>> {
        self.views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Remove and return the view under `id`.
    pub fn remove(&self, id: &str) -> Option<Arc<CardView>> {
        self.views
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// All container ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if the board holds no cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CardHost for CardBoard {
    fn container(&self, id: &str) -> Option<Arc<dyn CardSurface>> {
        self.get(id).map(|view| view as Arc<dyn CardSurface>)
    }
}

/// What an interactive control does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Switches between front and back.
    FaceToggle,
    /// Downloads the card.
    Download,
    /// Prints the card.
    Print,
}

/// Visible face of a [`CardView`]. Changes render synchronously.
#[derive(Debug)]
pub struct FaceState {
    face: Mutex<CardFace>,
}

impl FaceState {
    fn new(face: CardFace) -> Self {
        Self {
            face: Mutex::new(face),
        }
    }
}

#[async_trait]
impl FaceControl for FaceState {
    fn face(&self) -> CardFace {
        *self.face.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_face(&self, face: CardFace) {
        *self.face.lock().unwrap_or_else(PoisonError::into_inner) = face;
    }

    async fn settled(&self, _fallback: Duration) {}
}

/// The face toggle as a button, labelled with the face it would show.
#[derive(Debug, Clone)]
pub struct ViewToggle {
    state: Arc<FaceState>,
}

impl ToggleButton for ViewToggle {
    fn label(&self) -> String {
        self.state.face().toggle_label().to_string()
    }

    fn click(&self) {
        let next = self.state.face().other();
        self.state.set_face(next);
    }
}

/// One rendered card.
#[derive(Debug)]
pub struct CardView {
    id: String,
    person: PersonFields,
    size: PixelSize,
    state: Arc<FaceState>,
    controls: Vec<ControlKind>,
    visible: Mutex<Vec<bool>>,
}

impl CardView {
    /// A card showing its front, with toggle, download and print controls.
    pub fn new(id: impl Into<String>, person: PersonFields) -> Self {
        let controls = vec![ControlKind::FaceToggle, ControlKind::Download, ControlKind::Print];
        Self {
            id: id.into(),
            person: person.normalized(),
            size: PixelSize::design(),
            state: Arc::new(FaceState::new(CardFace::Front)),
            visible: Mutex::new(vec![true; controls.len()]),
            controls,
        }
    }

    /// Start on `face` instead of the front.
    #[must_use]
    pub fn showing(self, face: CardFace) -> Self {
        self.state.set_face(face);
        self
    }

    /// Drop the face toggle, leaving a front-only card.
    #[must_use]
    pub fn without_toggle(mut self) -> Self {
        self.controls.retain(|&kind| kind != ControlKind::FaceToggle);
        self.visible = Mutex::new(vec![true; self.controls.len()]);
        self
    }

    /// Render the face node at another size.
    #[must_use]
    pub fn with_size(mut self, size: PixelSize) -> Self {
        self.size = size;
        self
    }

    /// The person drawn on the card.
    #[must_use]
    pub fn person_fields(&self) -> &PersonFields {
        &self.person
    }

    /// Face visible now.
    #[must_use]
    pub fn face(&self) -> CardFace {
        self.state.face()
    }

    /// Show `face`.
    pub fn set_face(&self, face: CardFace) {
        self.state.set_face(face);
    }

    /// The face toggle as a label-driven button, if the card has one.
    #[must_use]
    pub fn toggle_button(&self) -> Option<ViewToggle> {
        self.has_toggle().then(|| ViewToggle {
            state: self.state.clone(),
        })
    }

    /// Labels of the currently visible controls.
    #[must_use]
    pub fn visible_labels(&self) -> Vec<String> {
        let visible = self.visible.lock().unwrap_or_else(PoisonError::into_inner);
        self.controls
            .iter()
            .zip(visible.iter())
            .filter(|(_, shown)| **shown)
            .map(|(&kind, _)| self.label(kind))
            .collect()
    }

    fn has_toggle(&self) -> bool {
        self.controls.contains(&ControlKind::FaceToggle)
    }

    fn label(&self, kind: ControlKind) -> String {
        match kind {
            ControlKind::FaceToggle => self.face().toggle_label().to_string(),
            ControlKind::Download => DOWNLOAD_LABEL.to_string(),
            ControlKind::Print => PRINT_LABEL.to_string(),
        }
    }
}

impl CardSurface for CardView {
    fn id(&self) -> &str {
        &self.id
    }

    fn face_node(&self) -> Option<FaceNode> {
        Some(FaceNode {
            container_id: self.id.clone(),
            size: self.size,
            marker: FACE_MARKER.to_string(),
        })
    }

    fn controls(&self) -> Vec<ControlId> {
        (0..self.controls.len()).map(ControlId).collect()
    }

    fn is_control_visible(&self, control: ControlId) -> bool {
        self.visible
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(control.0)
            .copied()
            .unwrap_or(false)
    }

    fn set_control_visible(&self, control: ControlId, visible: bool) {
        if let Some(slot) = self
            .visible
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(control.0)
        {
            *slot = visible;
        }
    }

    fn face_control(&self) -> Option<Arc<dyn FaceControl>> {
        self.has_toggle()
            .then(|| self.state.clone() as Arc<dyn FaceControl>)
    }

    fn person(&self) -> Option<PersonFields> {
        Some(self.person.clone())
    }
}

/// Draws the current face of a [`CardBoard`] view.
#[derive(Debug, Clone)]
pub struct SvgFaceRasterizer {
    board: Arc<CardBoard>,
    qr: QrEndpoint,
}

impl SvgFaceRasterizer {
    /// Rasterizer reading views from `board`.
    #[must_use]
    pub fn new(board: Arc<CardBoard>) -> Self {
        Self {
            board,
            qr: QrEndpoint::default(),
        }
    }

    /// Use another QR endpoint for the QR image references.
    #[must_use]
    pub fn with_qr_endpoint(mut self, qr: QrEndpoint) -> Self {
        self.qr = qr;
        self
    }
}

#[async_trait]
impl Rasterizer for SvgFaceRasterizer {
    async fn capture(&self, node: &FaceNode, options: &CaptureOptions) -> ExportResult<RgbaImage> {
        let view = self
            .board
            .get(&node.container_id)
            .ok_or_else(|| ExportError::Raster(format!("no view for {}", node.container_id)))?;

        let svg = face_svg(
            view.person_fields(),
            view.face(),
            node.size,
            options,
            &self.qr,
        );
        let background = options.background;

        tokio::task::spawn_blocking(move || rasterize_svg(&svg, background))
            .await
            .map_err(|e| ExportError::Raster(format!("render task failed: {e}")))?
    }
}

/// SVG for one face, drawn in design coordinates and scaled to the output.
#[must_use]
pub fn face_svg(
    person: &PersonFields,
    face: CardFace,
    design: PixelSize,
    options: &CaptureOptions,
    qr: &QrEndpoint,
) -> String {
    let out = design.scaled(options.scale);
    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}" viewBox="0 0 400 250">
<defs><linearGradient id="bg" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{dark}"/><stop offset="0.5" stop-color="{mid}"/><stop offset="1" stop-color="{dark}"/></linearGradient></defs>
<rect x="0.5" y="0.5" width="399" height="249" rx="14" fill="url(#bg)" stroke="#1e40af"/>
"##,
        out.width,
        out.height,
        dark = if face == CardFace::Front { "#0f172a" } else { "#1e293b" },
        mid = if face == CardFace::Front { "#1e3a8a" } else { "#334155" },
    );

    let qr_href = if options.allow_cross_origin {
        Some(match face {
            CardFace::Front => qr.front_url(person),
            CardFace::Back => qr.back_url(person),
        })
    } else {
        None
    };

    match face {
        CardFace::Front => front_face(&mut svg, person, qr_href.as_deref()),
        CardFace::Back => back_face(&mut svg, person, qr_href.as_deref()),
    }

    svg.push_str("</svg>");
    svg
}

const SANS: &str = "Arial, sans-serif";
const MONO: &str = "monospace";

/// Presentation attributes of one `<text>` element.
#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    fill: &'static str,
    family: &'static str,
    bold: bool,
    anchor: &'static str,
}

impl TextStyle {
    fn new(size: f32, fill: &'static str) -> Self {
        Self {
            size,
            fill,
            family: SANS,
            bold: false,
            anchor: "start",
        }
    }

    fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    fn mono(self) -> Self {
        Self {
            family: MONO,
            ..self
        }
    }

    fn middle(self) -> Self {
        Self {
            anchor: "middle",
            ..self
        }
    }

    fn end(self) -> Self {
        Self {
            anchor: "end",
            ..self
        }
    }
}

fn text(svg: &mut String, x: f32, y: f32, style: TextStyle, content: &str) {
    let weight = if style.bold { "bold" } else { "normal" };
    let _ = write!(
        svg,
        r#"<text x="{x}" y="{y}" font-size="{}" fill="{}" font-family="{}" font-weight="{weight}" text-anchor="{}">{}</text>"#,
        style.size,
        style.fill,
        style.family,
        style.anchor,
        escape_xml(content)
    );
}

fn qr_slot(svg: &mut String, x: f32, y: f32, side: f32, href: Option<&str>) {
    let _ = write!(
        svg,
        r##"<rect x="{x}" y="{y}" width="{side}" height="{side}" rx="4" fill="#ffffff"/>"##
    );
    if let Some(href) = href {
        let _ = write!(
            svg,
            r#"<image x="{x}" y="{y}" width="{side}" height="{side}" xlink:href="{}"/>"#,
            escape_xml(href)
        );
    }
}

fn front_face(svg: &mut String, person: &PersonFields, qr: Option<&str>) {
    let badge = TextStyle::new(9.0, "#ffffff").bold();
    let muted = TextStyle::new(9.0, "#cbd5e1");

    text(svg, 12.0, 20.0, TextStyle::new(9.0, "#a7f3d0").bold(), "SECURE");
    text(svg, 340.0, 20.0, TextStyle::new(9.0, "#bfdbfe").bold(), "VERIFIED");
    let title = TextStyle::new(15.0, "#ffffff").bold().middle();
    text(svg, 200.0, 42.0, title, "MYANMAR DIGITAL ID");
    svg.push_str(r##"<rect x="120" y="50" width="160" height="2" fill="#fbbf24"/>"##);

    svg.push_str(r##"<circle cx="62" cy="120" r="36" fill="#fbbf24"/>"##);
    let initial = TextStyle::new(34.0, "#0f172a").bold().middle();
    text(svg, 62.0, 132.0, initial, &person.initial());

    text(svg, 112.0, 92.0, TextStyle::new(16.0, "#ffffff").bold(), &person.name);
    let rows = [
        ("ID:", person.personal_id.as_str()),
        ("NRC:", person.nrc.as_str()),
        ("DOB:", person.date_of_birth.as_str()),
    ];
    let mut y = 114.0;
    for (label, value) in rows {
        text(svg, 112.0, y, TextStyle::new(10.0, "#cbd5e1"), label);
        text(svg, 146.0, y, TextStyle::new(10.0, "#ffffff").mono(), value);
        y += 16.0;
    }

    svg.push_str(r##"<rect x="112" y="164" width="62" height="16" rx="3" fill="#059669"/>"##);
    svg.push_str(r##"<rect x="180" y="164" width="56" height="16" rx="3" fill="#2563eb"/>"##);
    text(svg, 118.0, 176.0, badge, "CITIZEN");
    text(svg, 186.0, 176.0, badge, "ACTIVE");

    qr_slot(svg, 300.0, 80.0, 80.0, qr);
    text(svg, 340.0, 176.0, TextStyle::new(9.0, "#ffffff").middle(), "SCAN");

    let serial = format!("Serial: {}", person.front_serial());
    text(svg, 16.0, 236.0, muted, &serial);
    text(svg, 384.0, 236.0, muted.end(), &format!("Exp: {EXPIRY_SHORT}"));
}

fn back_face(svg: &mut String, person: &PersonFields, qr: Option<&str>) {
    let muted = TextStyle::new(9.0, "#cbd5e1");
    let heading = TextStyle::new(9.0, "#fbbf24").bold();
    let label = TextStyle::new(8.0, "#cbd5e1");

    text(svg, 12.0, 20.0, TextStyle::new(9.0, "#a7f3d0").bold(), "OFFICIAL");
    text(svg, 330.0, 20.0, TextStyle::new(9.0, "#bfdbfe").bold(), "AUTHENTIC");
    text(svg, 200.0, 34.0, muted.middle(), "REPUBLIC OF THE UNION OF MYANMAR");
    let title = TextStyle::new(14.0, "#ffffff").bold().middle();
    text(svg, 200.0, 50.0, title, "DIGITAL IDENTITY CARD");
    svg.push_str(r##"<rect x="120" y="57" width="160" height="2" fill="#fbbf24"/>"##);

    qr_slot(svg, 16.0, 70.0, 100.0, qr);
    let scan = TextStyle::new(9.0, "#ffffff").bold().middle();
    text(svg, 66.0, 186.0, scan, "SCAN TO VERIFY");
    text(svg, 66.0, 198.0, label.middle(), "Digital Auth");

    svg.push_str(
        r##"<rect x="130" y="68" width="256" height="64" rx="4" fill="#ffffff" fill-opacity="0.08"/>"##,
    );
    text(svg, 138.0, 82.0, heading, "VERIFICATION GUIDE");
    let guide = [
        "Scan QR using official eID app",
        "Visit eid.gov.mm for verification",
        "Check digital signature",
        "Verify national database",
    ];
    let mut y = 95.0;
    for line in guide {
        text(svg, 138.0, y, TextStyle::new(8.0, "#e2e8f0"), line);
        y += 11.0;
    }

    svg.push_str(
        r##"<rect x="130" y="138" width="256" height="66" rx="4" fill="#ffffff" fill-opacity="0.08"/>"##,
    );
    text(svg, 138.0, 152.0, heading, "CARD INFORMATION");
    let serial = person.back_serial();
    let details = [
        ("Issue:", ISSUE_DATE),
        ("Expiry:", EXPIRY_DATE),
        ("Authority:", AUTHORITY),
        ("Serial:", serial.as_str()),
    ];
    let mut y = 165.0;
    for (name, value) in details {
        text(svg, 138.0, y, label, name);
        text(svg, 200.0, y, TextStyle::new(8.0, "#ffffff"), value);
        y += 11.0;
    }

    text(svg, 16.0, 236.0, muted, "eid.gov.mm/verify");
    let secure = TextStyle::new(9.0, "#a7f3d0").bold().end();
    text(svg, 384.0, 236.0, secure, "SECURE");
}
