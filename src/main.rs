//! clipstyle - Main Entry Point
//!
//! Renders a Markdown or HTML file into a styled preview and copies it to
//! the clipboard as inline-styled HTML.

use clap::{Parser, ValueEnum};
use clipstyle::config::{get_templates_dir, load_config, save_config, CalloutMode, Settings};
use clipstyle::error::{Error, Result};
use clipstyle::export::options::fetch_timeout;
use clipstyle::export::{
    build_clipboard_payload, copy_to_clipboard, render_html, render_markdown, CopyOptions,
    DefaultFetcher, FetchBase, RenderOptions, SourceFormat, SystemClipboard,
};
use clipstyle::templates::TemplateRegistry;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Application name constant.
const APP_NAME: &str = "clipstyle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CalloutModeArg {
    Blockquote,
    StyledBox,
}

impl From<CalloutModeArg> for CalloutMode {
    fn from(arg: CalloutModeArg) -> Self {
        match arg {
            CalloutModeArg::Blockquote => CalloutMode::Blockquote,
            CalloutModeArg::StyledBox => CalloutMode::StyledBox,
        }
    }
}

/// Copy a styled article preview as self-contained HTML.
#[derive(Debug, Parser)]
#[command(name = APP_NAME, version, about)]
struct Cli {
    /// Markdown (.md, .markdown) or HTML file to copy
    #[arg(required_unless_present = "list_templates")]
    input: Option<PathBuf>,

    /// Visual preset to render with
    #[arg(short, long)]
    template: Option<String>,

    /// Extra stylesheet applied after the template (repeatable)
    #[arg(long = "css", value_name = "FILE")]
    css: Vec<PathBuf>,

    /// Directory or URL that relative image paths are resolved against
    #[arg(long, value_name = "DIR|URL")]
    base: Option<String>,

    /// Print the HTML payload instead of copying it
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Write the HTML payload to a file instead of copying it
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Leave image sources as they are
    #[arg(long)]
    no_images: bool,

    /// How callouts end up in the copied HTML
    #[arg(long, value_enum)]
    callout_mode: Option<CalloutModeArg>,

    /// List available templates and exit
    #[arg(long)]
    list_templates: bool,

    /// Store --template, --callout-mode and --no-images as the new defaults
    #[arg(long)]
    save_config: bool,
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut settings = load_config();
    apply_overrides(cli, &mut settings);
    if cli.save_config {
        save_config(&settings)?;
    }
    let registry = load_templates();

    if cli.list_templates {
        for template in registry.iter() {
            println!("{:<12} {:<12} {}", template.id, template.name, template.description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let input = cli
        .input
        .as_deref()
        .ok_or_else(|| Error::Application("No input file given".to_string()))?;
    let text = read_file(input)?;
    let extra_css = cli
        .css
        .iter()
        .map(|path| read_file(path))
        .collect::<Result<Vec<_>>>()?;

    let template = registry.resolve(&settings.template);
    info!("Rendering {} with template '{}'", input.display(), template.id);
    let render_options = RenderOptions {
        template,
        extra_css: &extra_css,
        section_class: &settings.content_section_class,
        callout_class: &settings.callout_class,
    };
    let rendered = match SourceFormat::from_path(input) {
        SourceFormat::Markdown => render_markdown(&text, &render_options),
        SourceFormat::Html => render_html(&text, &render_options),
    };

    let options = CopyOptions::from_settings(&settings);
    info!("Callout mode: {}", options.callout_mode.label());
    let base = match &cli.base {
        Some(base) => FetchBase::parse(base),
        None => FetchBase::Dir(
            input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        ),
    };
    let fetcher =
        DefaultFetcher::new(fetch_timeout(&settings), settings.max_image_bytes)?.with_base(base);

    if cli.stdout || cli.output.is_some() {
        let (payload, _) = build_clipboard_payload(
            &rendered.document,
            &rendered.styles,
            rendered.preview,
            &fetcher,
            &options,
        )?;
        match &cli.output {
            Some(path) => {
                fs::write(path, &payload.html).map_err(|e| Error::FileWrite {
                    path: path.clone(),
                    source: e,
                })?;
                info!("Wrote {}", path.display());
            }
            None => println!("{}", payload.html),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut clipboard = SystemClipboard::new();
    let outcome = copy_to_clipboard(
        &rendered.document,
        &rendered.styles,
        rendered.preview,
        &fetcher,
        &options,
        &mut clipboard,
    );
    println!("{}", outcome.message());
    Ok(if outcome.is_copied() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Built-in presets plus any user presets in the config directory.
fn load_templates() -> TemplateRegistry {
    let mut registry = TemplateRegistry::builtin();
    match get_templates_dir() {
        Ok(dir) if dir.is_dir() => {
            let loaded = registry.load_dir(&dir);
            info!("Loaded {} user template(s) from {}", loaded, dir.display());
        }
        Ok(_) => {}
        Err(e) => warn!("User templates unavailable: {}", e),
    }
    registry
}

/// Command-line flags take precedence over the stored settings.
fn apply_overrides(cli: &Cli, settings: &mut Settings) {
    if let Some(template) = &cli.template {
        settings.template = template.clone();
    }
    if let Some(mode) = cli.callout_mode {
        settings.callout_mode = mode.into();
    }
    if cli.no_images {
        settings.inline_images = false;
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}
