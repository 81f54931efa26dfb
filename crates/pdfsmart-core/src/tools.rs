//! Document tool endpoints (merge, split, conversions, ...).
//!
//! Each tool takes a multipart form and answers with a binary that goes through
//! the shared download convention.

use crate::backend::{Backend, BackendError};
use crate::download::{DownloadError, DownloadSink, DownloadedFile};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Tool errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid page order: {0}")]
    InvalidPageOrder(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Tool endpoints offered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Merge,
    Split,
    Organize,
    Rotate,
    PageNumbers,
    WordToPdf,
    ExcelToPdf,
    PptToPdf,
    ImgToPdf,
    HtmlToPdf,
    PdfToWord,
    PdfToExcel,
    PdfToPpt,
    PdfToJpg,
    PdfToPdfa,
}

impl Tool {
    pub const ALL: [Tool; 15] = [
        Tool::Merge,
        Tool::Split,
        Tool::Organize,
        Tool::Rotate,
        Tool::PageNumbers,
        Tool::WordToPdf,
        Tool::ExcelToPdf,
        Tool::PptToPdf,
        Tool::ImgToPdf,
        Tool::HtmlToPdf,
        Tool::PdfToWord,
        Tool::PdfToExcel,
        Tool::PdfToPpt,
        Tool::PdfToJpg,
        Tool::PdfToPdfa,
    ];

    /// Path segment under `/api/tools/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Tool::Merge => "merge",
            Tool::Split => "split",
            Tool::Organize => "organize",
            Tool::Rotate => "rotate",
            Tool::PageNumbers => "page-numbers",
            Tool::WordToPdf => "word-to-pdf",
            Tool::ExcelToPdf => "excel-to-pdf",
            Tool::PptToPdf => "ppt-to-pdf",
            Tool::ImgToPdf => "img-to-pdf",
            Tool::HtmlToPdf => "html-to-pdf",
            Tool::PdfToWord => "pdf-to-word",
            Tool::PdfToExcel => "pdf-to-excel",
            Tool::PdfToPpt => "pdf-to-ppt",
            Tool::PdfToJpg => "pdf-to-jpg",
            Tool::PdfToPdfa => "pdf-to-pdfa",
        }
    }

    /// Output name used when the response carries no file name.
    pub fn default_filename(self) -> &'static str {
        match self {
            Tool::Merge => "merged.pdf",
            Tool::Split => "split.zip",
            Tool::Organize => "organized.pdf",
            Tool::Rotate => "rotated.pdf",
            Tool::PageNumbers => "numbered.pdf",
            Tool::WordToPdf
            | Tool::ExcelToPdf
            | Tool::PptToPdf
            | Tool::ImgToPdf
            | Tool::HtmlToPdf => "converted.pdf",
            Tool::PdfToWord => "converted.docx",
            Tool::PdfToExcel => "converted.xlsx",
            Tool::PdfToPpt => "converted.pptx",
            Tool::PdfToJpg => "converted.zip",
            Tool::PdfToPdfa => "converted_pdfa.pdf",
        }
    }

    pub fn is_conversion(self) -> bool {
        !matches!(
            self,
            Tool::Merge | Tool::Split | Tool::Organize | Tool::Rotate | Tool::PageNumbers
        )
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Tool::Merge => "PDFs merged successfully!",
            Tool::Split => "PDF split successfully!",
            Tool::Organize => "PDF organized successfully!",
            Tool::Rotate => "PDF rotated successfully!",
            Tool::PageNumbers => "Page numbers added successfully!",
            _ => "Conversion successful!",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Tool::Merge => "Failed to merge PDFs.",
            Tool::Split => "Failed to split PDF.",
            Tool::Organize => "Failed to organize PDF.",
            Tool::Rotate => "Failed to rotate PDF.",
            Tool::PageNumbers => "Failed to add page numbers.",
            _ => "Conversion failed.",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl FromStr for Tool {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.endpoint() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// Rotation applied by the rotate tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}

impl FromStr for Rotation {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "90" => Ok(Rotation::Cw90),
            "180" => Ok(Rotation::Cw180),
            "270" => Ok(Rotation::Cw270),
            other => Err(ToolError::InvalidOption(format!(
                "rotation must be 90, 180 or 270, got {:?}",
                other
            ))),
        }
    }
}

/// Where the page-numbers tool stamps numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberPosition {
    #[default]
    BottomCenter,
    BottomRight,
    BottomLeft,
    TopCenter,
    TopRight,
    TopLeft,
}

impl NumberPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            NumberPosition::BottomCenter => "bottom-center",
            NumberPosition::BottomRight => "bottom-right",
            NumberPosition::BottomLeft => "bottom-left",
            NumberPosition::TopCenter => "top-center",
            NumberPosition::TopRight => "top-right",
            NumberPosition::TopLeft => "top-left",
        }
    }
}

impl FromStr for NumberPosition {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [NumberPosition; 6] = [
            NumberPosition::BottomCenter,
            NumberPosition::BottomRight,
            NumberPosition::BottomLeft,
            NumberPosition::TopCenter,
            NumberPosition::TopRight,
            NumberPosition::TopLeft,
        ];
        let s = s.trim();
        ALL.into_iter()
            .find(|position| position.as_str() == s)
            .ok_or_else(|| ToolError::InvalidOption(format!("unknown position {:?}", s)))
    }
}

/// A file attached to a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl FormFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// One multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: FormFile },
}

/// A multipart form for a tool endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolForm {
    parts: Vec<FormPart>,
}

impl ToolForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: FormFile) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file,
        });
        self
    }

    /// Several PDFs under `files`.
    pub fn merge(files: impl IntoIterator<Item = FormFile>) -> Self {
        files
            .into_iter()
            .fold(Self::new(), |form, file| form.file("files", file))
    }

    /// `page_ranges` is passed through as typed, e.g. `1-3,5,7-9`.
    pub fn split(file: FormFile, page_ranges: &str) -> Self {
        Self::new()
            .file("file", file)
            .text("page_ranges", page_ranges.trim())
    }

    /// `page_order` is a comma separated list, sent as a JSON array.
    pub fn organize(file: FormFile, page_order: &str) -> ToolResult<Self> {
        let order = parse_page_order(page_order)?;
        let json = serde_json::to_string(&order)
            .map_err(|e| ToolError::InvalidPageOrder(e.to_string()))?;
        Ok(Self::new().file("file", file).text("page_order", json))
    }

    pub fn rotate(file: FormFile, rotation: Rotation) -> Self {
        Self::new()
            .file("file", file)
            .text("rotation", rotation.degrees().to_string())
    }

    pub fn page_numbers(file: FormFile, position: NumberPosition) -> Self {
        Self::new()
            .file("file", file)
            .text("position", position.as_str())
    }

    /// Single-file conversion form.
    pub fn convert(file: FormFile) -> Self {
        Self::new().file("file", file)
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Parse `"3, 1,2"` into `[3, 1, 2]`.
pub fn parse_page_order(input: &str) -> ToolResult<Vec<u32>> {
    let order = input
        .split(',')
        .map(|item| {
            let item = item.trim();
            item.parse::<u32>()
                .map_err(|_| ToolError::InvalidPageOrder(format!("{:?} is not a page number", item)))
        })
        .collect::<ToolResult<Vec<u32>>>()?;
    if order.is_empty() {
        return Err(ToolError::InvalidPageOrder("empty".to_string()));
    }
    Ok(order)
}

/// Runs tool requests and delivers their output.
pub struct ToolRunner<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> ToolRunner<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Post `form` to `tool` and hand the named result to `sink`.
    pub async fn run(
        &self,
        tool: Tool,
        form: ToolForm,
        sink: &dyn DownloadSink,
    ) -> ToolResult<DownloadedFile> {
        log::info!("Running tool {}", tool);
        let response = match self.backend.run_tool(tool, form).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("{} ({})", tool.failure_message(), e);
                return Err(e.into());
            }
        };

        let file = DownloadedFile::from_response(response, tool.default_filename());
        sink.deliver(&file)?;
        log::info!("{} -> {}", tool.success_message(), file.filename);
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, BinaryResponse, RecordingBackend};
    use crate::download::MemorySink;

    fn pdf(name: &str) -> FormFile {
        FormFile::new(name, b"%PDF-1.4".to_vec())
    }

    #[test]
    fn test_endpoint_roundtrip() {
        for tool in Tool::ALL {
            assert_eq!(tool.endpoint().parse::<Tool>().unwrap(), tool);
        }
        assert!(matches!("compress".parse::<Tool>(), Err(ToolError::UnknownTool(_))));
    }

    #[test]
    fn test_default_filenames() {
        assert_eq!(Tool::Merge.default_filename(), "merged.pdf");
        assert_eq!(Tool::PdfToJpg.default_filename(), "converted.zip");
        assert_eq!(Tool::PdfToPdfa.default_filename(), "converted_pdfa.pdf");
        assert!(Tool::HtmlToPdf.is_conversion());
        assert!(!Tool::Rotate.is_conversion());
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!("180".parse::<Rotation>().unwrap(), Rotation::Cw180);
        assert!("45".parse::<Rotation>().is_err());
        assert_eq!(
            "top-right".parse::<NumberPosition>().unwrap(),
            NumberPosition::TopRight
        );
        assert!("middle".parse::<NumberPosition>().is_err());
    }

    #[test]
    fn test_parse_page_order() {
        assert_eq!(parse_page_order("3, 1,2").unwrap(), vec![3, 1, 2]);
        assert!(parse_page_order("1,,2").is_err());
        assert!(parse_page_order("a").is_err());
    }

    #[test]
    fn test_organize_sends_json_list() {
        let form = ToolForm::organize(pdf("in.pdf"), "2,1").unwrap();
        assert_eq!(
            form.parts()[1],
            FormPart::Text {
                name: "page_order".to_string(),
                value: "[2,1]".to_string()
            }
        );
    }

    #[test]
    fn test_form_builders() {
        let merge = ToolForm::merge([pdf("a.pdf"), pdf("b.pdf")]);
        assert_eq!(merge.len(), 2);
        assert!(
            merge
                .parts()
                .iter()
                .all(|p| matches!(p, FormPart::File { name, .. } if name == "files"))
        );

        let rotate = ToolForm::rotate(pdf("a.pdf"), Rotation::Cw270);
        assert!(rotate.parts().contains(&FormPart::Text {
            name: "rotation".to_string(),
            value: "270".to_string()
        }));

        let numbers = ToolForm::page_numbers(pdf("a.pdf"), NumberPosition::TopLeft);
        assert!(numbers.parts().contains(&FormPart::Text {
            name: "position".to_string(),
            value: "top-left".to_string()
        }));
    }

    #[test]
    fn test_runner_names_and_delivers_output() {
        let backend = Arc::new(RecordingBackend::new().with_tool_response(BinaryResponse {
            bytes: b"zip".to_vec(),
            content_disposition: None,
            content_type: Some("application/zip".to_string()),
        }));
        let sink = MemorySink::new();
        let runner = ToolRunner::new(backend.clone());

        let form = ToolForm::split(pdf("in.pdf"), "1-2");
        let file = pollster::block_on(runner.run(Tool::Split, form.clone(), &sink)).unwrap();

        assert_eq!(file.filename, "split.zip");
        assert_eq!(sink.last().unwrap().bytes, b"zip");
        assert_eq!(
            backend.calls(),
            vec![BackendCall::Tool {
                tool: Tool::Split,
                form
            }]
        );
    }

    #[test]
    fn test_runner_prefers_header_name() {
        let backend = Arc::new(RecordingBackend::new().with_tool_response(BinaryResponse {
            bytes: b"%PDF".to_vec(),
            content_disposition: Some("attachment; filename=\"report_merged.pdf\"".to_string()),
            content_type: None,
        }));
        let sink = MemorySink::new();
        let runner = ToolRunner::new(backend);

        let form = ToolForm::merge([pdf("a.pdf"), pdf("b.pdf")]);
        let file = pollster::block_on(runner.run(Tool::Merge, form, &sink)).unwrap();
        assert_eq!(file.filename, "report_merged.pdf");
    }
}
