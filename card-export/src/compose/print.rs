//! Print document.
//!
//! Rebuilds the card from the person record as standalone HTML/CSS so the
//! print context needs nothing from the host page.

use std::fmt::Write;
use std::time::Duration;

use card_core::person::{
    AUTHORITY, EXPIRY_DATE, EXPIRY_SHORT, ISSUE_DATE, VERIFICATION_URL,
};
use card_core::{CardFace, PersonFields, QrEndpoint};

use crate::svg::escape_xml as escape;

/// A self-contained, print-ready HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintDocument {
    html: String,
    faces: Vec<CardFace>,
}

impl PrintDocument {
    /// Build the document for `person`.
    ///
    /// With `auto_print`, the page prints and closes itself that long after
    /// it finishes loading.
    #[must_use]
    pub fn build(
        person: &PersonFields,
        both_sides: bool,
        qr: &QrEndpoint,
        auto_print: Option<Duration>,
    ) -> Self {
        let person = person.clone().normalized();
        let faces = if both_sides {
            vec![CardFace::Front, CardFace::Back]
        } else {
            vec![CardFace::Front]
        };

        let mut body = String::with_capacity(8192);
        body.push_str("<div class=\"print-container\">\n");
        let _ = writeln!(
            body,
            "<div class=\"print-header\"><h1>{}</h1><p>Print on A4 paper, cut along dotted lines, insert in plastic card sleeve</p></div>",
            if both_sides {
                "ID CARD PRINTOUT - READY FOR CUTTING"
            } else {
                "ID CARD PRINTOUT"
            }
        );

        for &face in &faces {
            body.push_str("<div class=\"card-section\">\n");
            if both_sides {
                let _ = writeln!(body, "<h2 class=\"card-title\">{}</h2>", face.title());
            }
            body.push_str("<div class=\"card-wrapper\"><div class=\"cutting-guide\"></div>\n");
            match face {
                CardFace::Front => front_card(&mut body, &person, qr),
                CardFace::Back => back_card(&mut body, &person, qr),
            }
            body.push_str("</div></div>\n");
        }

        if both_sides {
            body.push_str(INSTRUCTIONS);
        }
        body.push_str("</div>\n");

        let mut html = String::with_capacity(body.len() + STYLE.len() + 512);
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>ID Card Print - {}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}",
            escape(&person.name),
        );
        if let Some(delay) = auto_print {
            html.push_str(&auto_print_script(delay));
        }
        html.push_str("</body>\n</html>\n");

        Self { html, faces }
    }

    /// The HTML source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.html
    }

    /// Faces laid out in the document, in page order.
    #[must_use]
    pub fn faces(&self) -> &[CardFace] {
        &self.faces
    }

    /// Consume into the HTML source.
    #[must_use]
    pub fn into_string(self) -> String {
        self.html
    }
}

/// Script that prints and closes the page `delay` after it loads.
#[must_use]
pub fn auto_print_script(delay: Duration) -> String {
    format!(
        "<script>window.onload = function() {{ setTimeout(function() {{ window.print(); window.close(); }}, {}); }};</script>\n",
        delay.as_millis()
    )
}

/// Insert [`auto_print_script`] before `</body>`, or append it if the
/// document has no body end tag.
#[must_use]
pub fn with_auto_print(html: &str, delay: Duration) -> String {
    let script = auto_print_script(delay);
    match html.rfind("</body>") {
        Some(at) => format!("{}{script}{}", &html[..at], &html[at..]),
        None => format!("{html}{script}"),
    }
}

fn front_card(out: &mut String, person: &PersonFields, qr: &QrEndpoint) {
    let id = escape(&person.personal_id);
    let _ = write!(
        out,
        r#"<div class="id-card front-card">
<div class="security-badges"><div class="badge">&#128737; SECURE</div><div class="badge">&#10003; VERIFIED</div></div>
<div class="card-header"><h3>MYANMAR DIGITAL ID</h3><div class="gradient-line"></div></div>
<div class="card-content">
<div class="avatar">{initial}</div>
<div class="info">
<div class="name">{name}</div>
<div class="details">
<div><span class="label">ID:</span> <span class="value">{id}</span></div>
<div><span class="label">NRC:</span> <span class="value">{nrc}</span></div>
<div><span class="label">DOB:</span> <span class="value">{dob}</span></div>
</div>
<div class="status-badges"><div class="status-badge citizen">&#10003; CITIZEN</div><div class="status-badge active">&#9733; ACTIVE</div></div>
</div>
<div class="qr-section"><img class="qr-code" src="{qr_src}" alt="QR"><div class="qr-label">SCAN</div></div>
</div>
<div class="card-footer"><span>Serial: {serial}</span><span>Exp: {EXPIRY_SHORT}</span></div>
</div>
"#,
        initial = escape(&person.initial()),
        name = escape(&person.name),
        nrc = escape(&person.nrc),
        dob = escape(&person.date_of_birth),
        qr_src = escape(&qr.front_url(person)),
        serial = escape(&person.front_serial()),
    );
}

fn back_card(out: &mut String, person: &PersonFields, qr: &QrEndpoint) {
    let verify_host = VERIFICATION_URL.trim_start_matches("https://");
    let _ = write!(
        out,
        r#"<div class="id-card back-card">
<div class="security-badges"><div class="badge">&#128737; OFFICIAL</div><div class="badge">&#10003; AUTHENTIC</div></div>
<div class="card-header"><h4>REPUBLIC OF THE UNION OF MYANMAR</h4><h3>DIGITAL IDENTITY CARD</h3><div class="gradient-line"></div></div>
<div class="card-content-back">
<div class="qr-section-large"><img class="qr-code-large" src="{qr_src}" alt="QR"><div class="verify-info"><div class="verify-title">SCAN TO VERIFY</div><div class="auth-text">Digital Auth</div></div></div>
<div class="info-section">
<div class="info-box"><h5>VERIFICATION GUIDE</h5><div class="guide-list">
<div>&#8226; Scan QR using official eID app</div>
<div>&#8226; Visit {verify_host} for verification</div>
<div>&#8226; Check digital signature</div>
<div>&#8226; Verify national database</div>
</div></div>
<div class="info-box"><h5>CARD INFORMATION</h5><div class="card-details">
<div><span>Issue:</span> <span>{ISSUE_DATE}</span></div>
<div><span>Expiry:</span> <span>{EXPIRY_DATE}</span></div>
<div><span>Authority:</span> <span>{AUTHORITY}</span></div>
<div><span>Serial:</span> <span>{serial}</span></div>
</div></div>
</div>
</div>
<div class="card-footer"><span>{verify_host}</span><div class="secure-indicator">&#128737; SECURE</div></div>
</div>
"#,
        qr_src = escape(&qr.back_url(person)),
        serial = escape(&person.back_serial()),
    );
}

const INSTRUCTIONS: &str = r#"<div class="instructions">
<h3>CUTTING AND ASSEMBLY INSTRUCTIONS</h3>
<ol>
<li>Print this page on A4 cardstock paper (recommended weight: 200-300gsm)</li>
<li>Cut carefully along the dotted lines around each card</li>
<li>Ensure clean, straight cuts for professional appearance</li>
<li>Insert cut cards into plastic card sleeves (CR80 size: 85.6mm &#215; 54mm)</li>
<li>Cards are now ready for professional use</li>
</ol>
</div>
"#;

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: system-ui, -apple-system, sans-serif; background: white; padding: 20mm; color: #333; line-height: 1.4; }
.print-container { max-width: 170mm; margin: 0 auto; }
.print-header { text-align: center; margin-bottom: 20mm; padding-bottom: 10mm; border-bottom: 2px solid #333; }
.print-header h1 { font-size: 18pt; font-weight: bold; margin-bottom: 5mm; color: #000; }
.print-header p { font-size: 10pt; color: #666; }
.card-section { margin-bottom: 25mm; page-break-inside: avoid; break-inside: avoid; }
.card-section + .card-section { page-break-before: always; break-before: page; }
.card-title { font-size: 14pt; font-weight: bold; text-align: center; margin-bottom: 10mm; color: #000; }
.card-wrapper { position: relative; display: flex; justify-content: center; margin: 15mm 0; }
.cutting-guide { position: absolute; width: 85.6mm; height: 54mm; border: 1px dashed #999; border-radius: 3mm; top: 0; left: 50%; transform: translateX(-50%); z-index: 3; pointer-events: none; }
.cutting-guide::before { content: "Cut along this line"; position: absolute; top: -6mm; left: 50%; transform: translateX(-50%); font-size: 8pt; color: #666; background: white; padding: 0 2mm; white-space: nowrap; }
.id-card { width: 85.6mm; height: 54mm; border-radius: 3mm; padding: 3mm; color: white; position: relative; overflow: hidden; background: linear-gradient(135deg, #0f172a 0%, #1e3a8a 50%, #0f172a 100%); border: 1px solid #1e40af; z-index: 2; }
.back-card { background: linear-gradient(135deg, #1e293b 0%, #334155 50%, #1e293b 100%); }
.security-badges { position: absolute; top: 1.5mm; left: 1.5mm; right: 1.5mm; display: flex; justify-content: space-between; }
.badge { font-size: 5pt; font-weight: bold; padding: 0.5mm 1.5mm; border-radius: 1mm; background: rgba(255, 255, 255, 0.15); }
.card-header { text-align: center; margin-top: 4mm; }
.card-header h3 { font-size: 8pt; letter-spacing: 0.5mm; }
.card-header h4 { font-size: 5pt; opacity: 0.8; }
.gradient-line { height: 0.4mm; margin: 1mm auto 0; width: 60%; background: linear-gradient(90deg, transparent, #fbbf24, transparent); }
.card-content { display: flex; align-items: center; gap: 2mm; margin-top: 2mm; }
.avatar { width: 14mm; height: 14mm; border-radius: 50%; background: #fbbf24; color: #0f172a; font-size: 14pt; font-weight: bold; display: flex; align-items: center; justify-content: center; flex-shrink: 0; }
.info { flex: 1; min-width: 0; }
.name { font-size: 8pt; font-weight: bold; white-space: nowrap; overflow: hidden; text-overflow: ellipsis; }
.details { font-size: 5.5pt; font-family: ui-monospace, monospace; }
.label { opacity: 0.7; }
.status-badges { display: flex; gap: 1mm; margin-top: 1mm; }
.status-badge { font-size: 4.5pt; font-weight: bold; padding: 0.3mm 1mm; border-radius: 1mm; }
.status-badge.citizen { background: #059669; }
.status-badge.active { background: #2563eb; }
.qr-section { text-align: center; }
.qr-code { width: 14mm; height: 14mm; background: white; border-radius: 1mm; display: block; }
.qr-label { font-size: 4.5pt; margin-top: 0.5mm; }
.card-content-back { display: flex; gap: 2mm; margin-top: 2mm; }
.qr-section-large { text-align: center; }
.qr-code-large { width: 18mm; height: 18mm; background: white; border-radius: 1mm; display: block; }
.verify-title { font-size: 5pt; font-weight: bold; margin-top: 0.5mm; }
.auth-text { font-size: 4.5pt; opacity: 0.7; }
.info-section { flex: 1; display: flex; flex-direction: column; gap: 1mm; }
.info-box { background: rgba(255, 255, 255, 0.08); border-radius: 1mm; padding: 1mm; }
.info-box h5 { font-size: 4.5pt; color: #fbbf24; }
.guide-list, .card-details { font-size: 4pt; }
.card-footer { position: absolute; bottom: 1.5mm; left: 3mm; right: 3mm; display: flex; justify-content: space-between; font-size: 4.5pt; opacity: 0.8; font-family: ui-monospace, monospace; }
.instructions { margin-top: 10mm; padding: 5mm; border: 1px solid #ddd; border-radius: 2mm; }
.instructions h3 { font-size: 12pt; margin-bottom: 3mm; color: #000; }
.instructions ol { padding-left: 6mm; }
.instructions li { font-size: 10pt; margin-bottom: 2mm; line-height: 1.4; color: #333; }
@page { size: A4; margin: 0; }
@media print {
  body { margin: 0; padding: 10mm; -webkit-print-color-adjust: exact; print-color-adjust: exact; color-adjust: exact; }
  .print-container { max-width: none; }
  .card-section { page-break-inside: avoid; break-inside: avoid; }
  .instructions { page-break-before: auto; }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn john() -> PersonFields {
        PersonFields::new("John Doe", "P-001", "12/ABC(N)654321")
    }

    #[test]
    fn test_both_sides_contains_both_faces() {
        let doc = PrintDocument::build(&john(), true, &QrEndpoint::default(), None);
        let html = doc.as_str();
        assert_eq!(doc.faces(), &[CardFace::Front, CardFace::Back]);
        assert!(html.contains("FRONT SIDE"));
        assert!(html.contains("BACK SIDE"));
        assert!(html.contains("Serial: SC-P-001"));
        assert!(html.contains("MIDP-001"));
        assert!(html.contains("CUTTING AND ASSEMBLY INSTRUCTIONS"));
        assert_eq!(html.matches("class=\"cutting-guide\"").count(), 2);
    }

    #[test]
    fn test_front_only() {
        let doc = PrintDocument::build(&john(), false, &QrEndpoint::default(), None);
        let html = doc.as_str();
        assert_eq!(doc.faces(), &[CardFace::Front]);
        assert!(!html.contains("back-card\""));
        assert!(!html.contains("CUTTING AND ASSEMBLY"));
        assert_eq!(html.matches("class=\"cutting-guide\"").count(), 1);
    }

    #[test]
    fn test_physical_card_size_and_print_rules() {
        let html = PrintDocument::build(&john(), true, &QrEndpoint::default(), None).into_string();
        assert!(html.contains("width: 85.6mm; height: 54mm"));
        assert!(html.contains("border-radius: 3mm"));
        assert!(html.contains("page-break-inside: avoid"));
        assert!(html.contains("print-color-adjust: exact"));
        assert!(html.contains("@page { size: A4; margin: 0; }"));
    }

    #[test]
    fn test_fields_escaped() {
        let person = PersonFields::new("<script>x</script>", "1&2", "n");
        let html = PrintDocument::build(&person, false, &QrEndpoint::default(), None).into_string();
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("1&amp;2"));
    }

    #[test]
    fn test_auto_print_script() {
        let delay = Some(Duration::from_millis(1000));
        let with = PrintDocument::build(&john(), false, &QrEndpoint::default(), delay);
        assert!(with.as_str().contains("window.print()"));
        assert!(with.as_str().contains("1000"));

        let without = PrintDocument::build(&john(), false, &QrEndpoint::default(), None);
        assert!(!without.as_str().contains("window.print()"));
    }

    #[test]
    fn test_with_auto_print_inserts_before_body_end() {
        let html = with_auto_print("<html><body>x</body></html>", Duration::from_millis(5));
        let script = html.find("<script>").expect("script");
        assert!(script < html.find("</body>").expect("body end"));
        assert!(with_auto_print("bare", Duration::ZERO).starts_with("bare<script>"));
    }

    #[test]
    fn test_qr_image_points_at_endpoint() {
        let html = PrintDocument::build(&john(), true, &QrEndpoint::default(), None).into_string();
        assert!(html.contains("https://api.qrserver.com/v1/create-qr-code/?size=150x150"));
    }
}
