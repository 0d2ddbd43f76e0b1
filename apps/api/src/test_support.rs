//! Local stand-in for the remote file host, shared by fetcher and router tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Router};

pub struct FileHost {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl FileHost {
    pub fn base_url(&self) -> String {
        format!("http://{}/files/", self.addr)
    }

    /// Number of requests the host has served.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn count(hits: &AtomicUsize) {
    hits.fetch_add(1, Ordering::SeqCst);
}

/// Text placed on the single page of `/files/cv.pdf`.
pub const CV_TEXT: &str = "Java DOTNET .NET Python jane.doe@example.com (555) 123-4567";

/// Builds a one-page PDF showing `text` in Helvetica. An empty `text` gives a blank page.
pub fn one_page_pdf(text: &str) -> Vec<u8> {
    let content = if text.is_empty() {
        String::new()
    } else {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        format!("BT /F1 12 Tf 72 720 Td ({escaped}) Tj ET")
    };

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (idx, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", idx + 1));
    }

    let xref_at = pdf.len();
    pdf.push_str(&format!(
        "xref\n0 {}\n0000000000 65535 f \n",
        objects.len() + 1
    ));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));

    pdf.into_bytes()
}

/// Serves:
/// - `/files/cv.pdf` → 200 with a one-page PDF showing [`CV_TEXT`]
/// - `/files/blank.pdf` → 200 with a one-page PDF without text
/// - `/files/garbage.pdf` → 200 with non-PDF bytes
/// - `/files/accepted.pdf` → 202
/// - `/files/slow.pdf` → 200 after 2s
/// - anything else → 404
pub async fn spawn_file_host() -> FileHost {
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route(
            "/files/cv.pdf",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                count(&hits);
                one_page_pdf(CV_TEXT)
            }),
        )
        .route(
            "/files/blank.pdf",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                count(&hits);
                one_page_pdf("")
            }),
        )
        .route(
            "/files/garbage.pdf",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                count(&hits);
                "this is not a pdf"
            }),
        )
        .route(
            "/files/accepted.pdf",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                count(&hits);
                StatusCode::ACCEPTED
            }),
        )
        .route(
            "/files/slow.pdf",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                count(&hits);
                tokio::time::sleep(Duration::from_secs(2)).await;
                "too late"
            }),
        )
        .fallback(|State(hits): State<Arc<AtomicUsize>>| async move {
            count(&hits);
            StatusCode::NOT_FOUND
        })
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FileHost { addr, hits }
}
