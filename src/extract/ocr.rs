//! OCR via ocrmypdf followed by pdftotext.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use super::tools::run_tool;
use super::ExtractionError;

const OCRMYPDF_HINT: &str = "install ocrmypdf";
const PDFTOTEXT_HINT: &str = "install poppler-utils";

/// Resolution assumed for images without embedded DPI information.
const IMAGE_DPI: &str = "300";

/// Run ocrmypdf on a PDF or image and return the recognised text.
///
/// OCR is forced on every page, so PDFs that already carry a text layer are
/// re-recognised as well.
pub fn ocr_document(
    input: &Path,
    is_image: bool,
    language: Option<&str>,
) -> Result<String, ExtractionError> {
    let temp_dir = TempDir::new()?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    let output = temp_dir.path().join(format!("ocr_{}.pdf", file_name));

    let mut cmd = Command::new("ocrmypdf");
    cmd.arg("--force-ocr");
    if let Some(lang) = language {
        cmd.args(["-l", lang]);
    }
    if is_image {
        cmd.args(["--image-dpi", IMAGE_DPI]);
    }
    cmd.arg(input).arg(&output);
    run_tool(&mut cmd, "ocrmypdf", OCRMYPDF_HINT)?;

    if !output.exists() {
        return Err(ExtractionError::ToolFailed {
            tool: "ocrmypdf".to_string(),
            message: "no output PDF was written".to_string(),
        });
    }

    pdf_text(&output)
}

/// Extract the text layer of a PDF; pages are concatenated without breaks.
pub fn pdf_text(pdf: &Path) -> Result<String, ExtractionError> {
    let mut cmd = Command::new("pdftotext");
    cmd.args(["-enc", "UTF-8"]).arg(pdf).arg("-");
    let text = run_tool(&mut cmd, "pdftotext", PDFTOTEXT_HINT)?;
    Ok(strip_page_breaks(&text))
}

/// pdftotext ends every page with a form feed.
fn strip_page_breaks(text: &str) -> String {
    text.replace('\u{000c}', "")
}
