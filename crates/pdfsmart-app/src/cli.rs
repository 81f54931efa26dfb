//! Headless command line front end.

use crate::shortcuts::ShortcutRegistry;
use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use pdfsmart_core::download::sanitize_filename;
use pdfsmart_core::tools::{FormFile, NumberPosition, Rotation, Tool, ToolForm, ToolRunner};
use pdfsmart_core::{DirectorySink, Editor, EditorConfig, ExportOutcome, HttpBackend, MemoryScene};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "pdfsmart",
    about = "Export edited documents and run PDF tools against a PDF Smart backend",
    version
)]
pub struct Cli {
    /// Backend base URL (overrides PDFSMART_API_BASE_URL).
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download the compiled document of an editing session.
    Export(ExportArgs),

    /// Run a tool endpoint on local files.
    Tool(ToolArgs),

    /// Print the editor keyboard shortcuts.
    Shortcuts,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Session identifier assigned at upload.
    #[arg(long)]
    pub session: String,

    /// Directory the document is written to.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct ToolArgs {
    /// Tool endpoint, e.g. `merge`, `rotate`, `pdf-to-word`.
    pub tool: Tool,

    /// Input file; repeat for merge.
    #[arg(long = "file", required = true)]
    pub files: Vec<PathBuf>,

    /// Form option as `key=value` (page_ranges, page_order, rotation, position).
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Directory the result is written to.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

impl ToolArgs {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn required_field(&self, name: &str) -> Result<&str> {
        self.field(name)
            .ok_or_else(|| anyhow!("{} needs --field {}=...", self.tool, name))
    }
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {:?}", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

fn read_form_file(path: &Path) -> Result<FormFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(FormFile::new(filename, bytes))
}

/// Build the multipart form a tool expects from the command line arguments.
pub fn build_form(args: &ToolArgs, mut files: Vec<FormFile>) -> Result<ToolForm> {
    if args.tool == Tool::Merge {
        if files.len() < 2 {
            bail!("merge needs at least two --file arguments");
        }
        return Ok(ToolForm::merge(files));
    }

    if files.len() != 1 {
        bail!("{} takes exactly one --file", args.tool);
    }
    let file = files.remove(0);

    let form = match args.tool {
        Tool::Split => ToolForm::split(file, args.required_field("page_ranges")?),
        Tool::Organize => ToolForm::organize(file, args.required_field("page_order")?)?,
        Tool::Rotate => {
            let rotation = match args.field("rotation") {
                Some(raw) => raw.parse::<Rotation>()?,
                None => Rotation::default(),
            };
            ToolForm::rotate(file, rotation)
        }
        Tool::PageNumbers => {
            let position = match args.field("position") {
                Some(raw) => raw.parse::<NumberPosition>()?,
                None => NumberPosition::default(),
            };
            ToolForm::page_numbers(file, position)
        }
        _ => ToolForm::convert(file),
    };
    Ok(form)
}

fn editor_config(cli: &Cli) -> EditorConfig {
    let config = EditorConfig::from_env();
    match &cli.api_base_url {
        Some(url) => config.with_api_base_url(url.as_str()),
        None => config,
    }
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = editor_config(&cli);
    match cli.command {
        Commands::Export(args) => run_export(config, args).await,
        Commands::Tool(args) => run_tool(config, args).await,
        Commands::Shortcuts => {
            ShortcutRegistry::print_all();
            Ok(())
        }
    }
}

async fn run_export(config: EditorConfig, args: ExportArgs) -> Result<()> {
    let backend = Arc::new(HttpBackend::new(&config)?);
    let sink = DirectorySink::new(&args.out)?;

    // No drawing surface here: the forced save is skipped and only the
    // compiled document is fetched.
    let mut editor: Editor<MemoryScene, _> = Editor::new(config, backend, Box::new(sink));
    editor.complete_upload(args.session.as_str(), 1);

    match editor.export_pdf().await? {
        ExportOutcome::Exported(filename) => {
            println!("{}", args.out.join(sanitize_filename(&filename)).display());
            Ok(())
        }
        ExportOutcome::NoSession => bail!("session identifier must not be empty"),
        ExportOutcome::Uploading => bail!("an upload is still in progress"),
    }
}

async fn run_tool(config: EditorConfig, args: ToolArgs) -> Result<()> {
    let files = args
        .files
        .iter()
        .map(|path| read_form_file(path))
        .collect::<Result<Vec<_>>>()?;
    let form = build_form(&args, files)?;

    let backend = Arc::new(HttpBackend::new(&config)?);
    let sink = DirectorySink::new(&args.out)?;
    let runner = ToolRunner::new(backend);

    let file = runner
        .run(args.tool, form, &sink)
        .await
        .with_context(|| args.tool.failure_message())?;
    println!("{}", args.tool.success_message());
    println!("{}", sink.path_for(&file.filename).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfsmart_core::tools::FormPart;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pdfsmart").chain(args.iter().copied())).unwrap()
    }

    fn tool_args(cli: Cli) -> ToolArgs {
        match cli.command {
            Commands::Tool(args) => args,
            other => panic!("expected tool command, got {:?}", other),
        }
    }

    fn pdf() -> FormFile {
        FormFile::new("in.pdf", b"%PDF".to_vec())
    }

    #[test]
    fn test_parse_export() {
        let cli = parse(&["export", "--session", "abc", "--out", "/tmp/out"]);
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.session, "abc");
                assert_eq!(args.out, PathBuf::from("/tmp/out"));
            }
            other => panic!("expected export command, got {:?}", other),
        }
    }

    #[test]
    fn test_global_base_url_overrides_config() {
        let cli = parse(&["shortcuts", "--api-base-url", "http://pdf.local:9000/"]);
        assert_eq!(editor_config(&cli).api_base_url, "http://pdf.local:9000");
    }

    #[test]
    fn test_parse_tool_with_fields() {
        let args = tool_args(parse(&[
            "tool",
            "rotate",
            "--file",
            "a.pdf",
            "--field",
            "rotation=180",
        ]));
        assert_eq!(args.tool, Tool::Rotate);
        assert_eq!(args.field("rotation"), Some("180"));

        let form = build_form(&args, vec![pdf()]).unwrap();
        assert!(form.parts().contains(&FormPart::Text {
            name: "rotation".to_string(),
            value: "180".to_string()
        }));
    }

    #[test]
    fn test_unknown_tool_rejected() {
        assert!(
            Cli::try_parse_from(["pdfsmart", "tool", "compress", "--file", "a.pdf"]).is_err()
        );
    }

    #[test]
    fn test_bad_field_rejected() {
        assert!(parse_field("rotation").is_err());
        assert!(parse_field("=90").is_err());
        assert_eq!(
            parse_field("page_ranges=1-3,5").unwrap(),
            ("page_ranges".to_string(), "1-3,5".to_string())
        );
    }

    #[test]
    fn test_merge_needs_two_files() {
        let args = tool_args(parse(&["tool", "merge", "--file", "a.pdf"]));
        assert!(build_form(&args, vec![pdf()]).is_err());
        assert_eq!(build_form(&args, vec![pdf(), pdf()]).unwrap().len(), 2);
    }

    #[test]
    fn test_split_requires_ranges() {
        let args = tool_args(parse(&["tool", "split", "--file", "a.pdf"]));
        assert!(build_form(&args, vec![pdf()]).is_err());
    }

    #[test]
    fn test_organize_validates_order() {
        let args = tool_args(parse(&[
            "tool",
            "organize",
            "--file",
            "a.pdf",
            "--field",
            "page_order=2,x",
        ]));
        assert!(build_form(&args, vec![pdf()]).is_err());
    }

    #[test]
    fn test_conversion_sends_single_file() {
        let args = tool_args(parse(&["tool", "pdf-to-word", "--file", "a.pdf"]));
        let form = build_form(&args, vec![pdf()]).unwrap();
        assert_eq!(form.len(), 1);
        assert!(matches!(&form.parts()[0], FormPart::File { name, .. } if name == "file"));
    }
}
