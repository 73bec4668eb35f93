//! PDF pages through the Poppler command-line tools.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tempfile::TempDir;

use super::tools::{check_cmd_status, handle_cmd_output, PDFINFO, PDFTOPPM, PDFTOTEXT};
use super::{BoundingBox, Document, DocumentError, PageInfo, Raster};

/// Points per inch; pdftotext measures crops in pixels at 72 dpi.
const POINTS_PER_INCH: f64 = 72.0;

static PAGE_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Page\s+(\d+)\s+size:\s+([\d.]+)\s+x\s+([\d.]+)")
        .expect("page size pattern should compile")
});

/// A PDF on disk, read with pdfinfo, pdftotext and pdftoppm.
#[derive(Debug, Clone)]
pub struct PopplerDocument {
    path: PathBuf,
    pages: Vec<PageInfo>,
}

impl PopplerDocument {
    /// Open a PDF and read its page geometry.
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let page_count = Self::read_page_count(path)?;
        let pages = if page_count == 0 {
            Vec::new()
        } else {
            Self::read_page_sizes(path, page_count)?
        };
        tracing::debug!("Opened {} ({} pages)", path.display(), pages.len());
        Ok(Self {
            path: path.to_path_buf(),
            pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_page_count(path: &Path) -> Result<usize, DocumentError> {
        let output = Command::new("pdfinfo").arg(path).output();
        let stdout = handle_cmd_output(output, PDFINFO, "pdfinfo failed")?;
        stdout
            .lines()
            .find(|line| line.starts_with("Pages:"))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|count| count.parse().ok())
            .ok_or_else(|| DocumentError::ExtractionFailed("pdfinfo reported no page count".into()))
    }

    fn read_page_sizes(path: &Path, page_count: usize) -> Result<Vec<PageInfo>, DocumentError> {
        let last = page_count.to_string();
        let output = Command::new("pdfinfo")
            .args(["-f", "1", "-l", &last])
            .arg(path)
            .output();
        let stdout = handle_cmd_output(output, PDFINFO, "pdfinfo failed")?;
        Ok(parse_page_sizes(&stdout, page_count))
    }

    fn page_number(&self, index: usize) -> Result<String, DocumentError> {
        if index >= self.pages.len() {
            return Err(DocumentError::PageOutOfRange(index));
        }
        Ok((index + 1).to_string())
    }
}

/// Parse `Page N size: W x H pts` lines; pages pdfinfo skipped default to US letter.
fn parse_page_sizes(pdfinfo_output: &str, page_count: usize) -> Vec<PageInfo> {
    let mut pages = vec![
        PageInfo {
            width: 612.0,
            height: 792.0,
        };
        page_count
    ];
    for caps in PAGE_SIZE.captures_iter(pdfinfo_output) {
        let number: usize = caps[1].parse().unwrap_or(0);
        let (Ok(width), Ok(height)) = (caps[2].parse::<f64>(), caps[3].parse::<f64>()) else {
            continue;
        };
        if (1..=page_count).contains(&number) {
            pages[number - 1] = PageInfo { width, height };
        }
    }
    pages
}

/// Crop arguments (`-x -y -W -H`) for a box on a page at the given scale.
fn crop_args(bbox: &BoundingBox, page: &PageInfo, scale: f64) -> Vec<String> {
    let (x, y, w, h) = bbox.scaled(page.width * scale, page.height * scale);
    vec![
        "-x".to_string(),
        (x.floor() as i64).to_string(),
        "-y".to_string(),
        (y.floor() as i64).to_string(),
        "-W".to_string(),
        (w.ceil() as i64).max(1).to_string(),
        "-H".to_string(),
        (h.ceil() as i64).max(1).to_string(),
    ]
}

/// Find the image file pdftoppm wrote for a page.
///
/// pdftoppm pads the page number to the width of the document's page count,
/// so page 3 may be page-3.png, page-03.png or page-003.png.
fn find_page_image(temp_path: &Path, page_num: &str) -> Option<PathBuf> {
    let number: usize = page_num.parse().ok()?;
    (1..=5)
        .map(|digits| temp_path.join(format!("page-{:0width$}.png", number, width = digits)))
        .find(|path| path.exists())
}

impl Document for PopplerDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<PageInfo, DocumentError> {
        self.pages
            .get(index)
            .copied()
            .ok_or(DocumentError::PageOutOfRange(index))
    }

    fn extract_text(
        &self,
        index: usize,
        bbox: Option<&BoundingBox>,
    ) -> Result<Option<String>, DocumentError> {
        let page_str = self.page_number(index)?;
        let page = self.pages[index];

        let mut cmd = Command::new("pdftotext");
        cmd.args(["-layout", "-enc", "UTF-8", "-f", &page_str, "-l", &page_str]);
        if let Some(bbox) = bbox {
            cmd.args(crop_args(bbox, &page, 1.0));
        }
        let output = cmd.arg(&self.path).arg("-").output();

        let text = handle_cmd_output(
            output,
            PDFTOTEXT,
            &format!("pdftotext failed on page {}", page_str),
        )?;
        let text = text.trim_end_matches(['\x0c', '\n', ' ']).to_string();
        Ok(if text.trim().is_empty() { None } else { Some(text) })
    }

    fn to_image(
        &self,
        index: usize,
        resolution: u32,
        bbox: Option<&BoundingBox>,
    ) -> Result<Raster, DocumentError> {
        let page_str = self.page_number(index)?;
        let page = self.pages[index];
        let scale = resolution as f64 / POINTS_PER_INCH;
        let region = bbox.copied().unwrap_or_else(BoundingBox::full);

        let temp_dir = TempDir::new()?;
        let output_prefix = temp_dir.path().join("page");
        let resolution_str = resolution.to_string();

        let mut cmd = Command::new("pdftoppm");
        cmd.args(["-png", "-r", &resolution_str, "-f", &page_str, "-l", &page_str]);
        if bbox.is_some() {
            cmd.args(crop_args(&region, &page, scale));
        }
        let status = cmd.arg(&self.path).arg(&output_prefix).status();
        check_cmd_status(
            status,
            PDFTOPPM,
            &format!("pdftoppm failed to convert page {}", page_str),
        )?;

        let image_path = find_page_image(temp_dir.path(), &page_str).ok_or_else(|| {
            DocumentError::ExtractionFailed(format!("No image generated for page {}", page_str))
        })?;
        let (_, _, w, h) = region.scaled(page.width * scale, page.height * scale);
        Ok(Raster::new(
            temp_dir,
            image_path,
            w.ceil() as u32,
            h.ceil() as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_sizes() {
        let output = "Title: roll\n\
                      Page    1 size: 595.276 x 841.89 pts (A4)\n\
                      Page    2 size: 612 x 792 pts (letter)\n\
                      Page    9 size: 10 x 10 pts\n";
        let pages = parse_page_sizes(output, 3);
        assert_eq!(pages.len(), 3);
        assert!((pages[0].width - 595.276).abs() < 1e-6);
        assert!((pages[1].height - 792.0).abs() < 1e-6);
        // Page 3 missing from output keeps the default
        assert!((pages[2].width - 612.0).abs() < 1e-6);
    }

    #[test]
    fn test_crop_args_scale_to_pixels() {
        let page = PageInfo {
            width: 720.0,
            height: 1440.0,
        };
        let bbox = BoundingBox::new(0.0, 0.1, 0.3, 0.9);
        let args = crop_args(&bbox, &page, 150.0 / 72.0);
        assert_eq!(args, ["-x", "0", "-y", "300", "-W", "450", "-H", "2400"]);
    }

    #[test]
    fn test_find_page_image_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(find_page_image(temp.path(), "1").is_none());
    }

    #[test]
    fn test_find_page_image_with_padding() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page-007.png");
        std::fs::write(&path, b"fake png").unwrap();
        assert_eq!(find_page_image(temp.path(), "7"), Some(path));
    }

    #[test]
    fn test_out_of_range_page() {
        let doc = PopplerDocument {
            path: PathBuf::from("/nonexistent.pdf"),
            pages: vec![],
        };
        assert!(matches!(
            doc.extract_text(0, None),
            Err(DocumentError::PageOutOfRange(0))
        ));
    }
}
