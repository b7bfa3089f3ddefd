//! # Meme Canvas CLI
//!
//! Command-line interface for composing memes.
//!
//! ## Usage
//!
//! ```bash
//! # List the template catalog
//! meme-canvas templates
//!
//! # Classic top/bottom captions on a catalog template
//! meme-canvas compose --template success-kid --top "WROTE A TEST" --bottom "IT PASSED" -o out.jpg
//!
//! # Caption your own image, extra centered text, PNG output
//! meme-canvas compose --image cat.heic --text "LOOK AT ME\nI AM THE CAPTION NOW" -o out.png
//!
//! # Everything from a JSON document
//! meme-canvas compose --spec meme.json -o out.jpg
//!
//! # Compose and share into a local directory
//! meme-canvas compose --template drake --top A --bottom B -o out.jpg \
//!     --publish-dir ./shared --title "Choices" --user me
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use meme_canvas::{
    CanvasError, Composition, Compositor, CompositorConfig, LoadOutcome,
    community::{DirectoryStorage, MemoryBackend, PublishError, Publisher},
    config::LabelSpec,
    label::{Align, BOTTOM_SLOT, CENTER_SLOT},
    render::Typeface,
    source::{ImageLoader, TEMPLATES, TemplateRef, TemplateRoot},
};

/// Meme Canvas - caption images from the command line
#[derive(Parser, Debug)]
#[command(name = "meme-canvas")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the template catalog
    Templates,

    /// Render a meme to a PNG or JPEG file
    Compose {
        /// Catalog name or index, image path, or URL
        #[arg(long, conflicts_with = "image")]
        template: Option<String>,

        /// Local image to caption (JPEG, PNG, GIF, WebP, HEIC with `heif`)
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,

        /// Directory or base URL of the template catalog
        #[arg(long, env = "MEME_TEMPLATE_ROOT", default_value = "templates")]
        template_root: String,

        /// JSON composition (template, image and labels)
        #[arg(long, value_name = "FILE")]
        spec: Option<PathBuf>,

        /// Top caption
        #[arg(long)]
        top: Option<String>,

        /// Bottom caption
        #[arg(long)]
        bottom: Option<String>,

        /// Extra centered caption (repeatable; "\n" breaks lines)
        #[arg(long)]
        text: Vec<String>,

        /// Font size for captions given on the command line
        #[arg(long)]
        font_size: Option<u32>,

        /// Alignment for captions given on the command line (left, center, right)
        #[arg(long)]
        align: Option<String>,

        /// TrueType/OpenType font to use instead of the built-in one
        #[arg(long, value_name = "FILE")]
        font: Option<PathBuf>,

        /// Output file (.png, .jpg or .jpeg)
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Share the result into this directory
        #[arg(long, value_name = "DIR", requires = "title")]
        publish_dir: Option<PathBuf>,

        /// Title of the shared post
        #[arg(long)]
        title: Option<String>,

        /// User id the post is shared as
        #[arg(long, env = "MEME_USER", default_value = "local")]
        user: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Usage(String),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Templates => {
            println!("Available templates:");
            for (index, template) in TEMPLATES.iter().enumerate() {
                println!("  {:>2}  {:<20} {}", index, template.slug(), template.file);
            }
            Ok(())
        }
        Commands::Compose {
            template,
            image,
            template_root,
            spec,
            top,
            bottom,
            text,
            font_size,
            align,
            font,
            output,
            publish_dir,
            title,
            user,
        } => {
            let mut composition = match &spec {
                Some(path) => Composition::from_file(path)?,
                None => Composition::default(),
            };
            if let Some(template) = template {
                composition.template = Some(template);
                composition.image = None;
            }
            if let Some(image) = image {
                composition.image = Some(image.display().to_string());
                composition.template = None;
            }

            let align = align
                .map(|name| {
                    Align::from_name(&name)
                        .ok_or_else(|| CliError::Usage(format!("Unknown alignment '{}'", name)))
                })
                .transpose()?;
            let flag_labels = labels_from_flags(top, bottom, text, font_size, align);
            if !flag_labels.is_empty() {
                composition.labels = flag_labels;
            }

            let runtime = tokio::runtime::Runtime::new()
                .map_err(|e| CliError::Usage(format!("Failed to start runtime: {}", e)))?;
            runtime.block_on(compose(
                composition,
                TemplateRoot::parse(&template_root),
                font.as_deref(),
                &output,
                publish_dir.zip(title).map(|(dir, title)| (dir, title, user)),
            ))
        }
    }
}

/// Turn `--top/--bottom/--text` into label specs in slot order.
fn labels_from_flags(
    top: Option<String>,
    bottom: Option<String>,
    text: Vec<String>,
    font_size: Option<u32>,
    align: Option<Align>,
) -> Vec<LabelSpec> {
    let spec = |text: String, slot: Option<(f32, f32)>| LabelSpec {
        text: text.replace("\\n", "\n"),
        x: slot.map(|(x, _)| x),
        y: slot.map(|(_, y)| y),
        font_size,
        align,
    };

    let mut labels = Vec::new();
    // The first label takes the top slot on its own
    if let Some(top) = top {
        labels.push(spec(top, None));
    }
    if let Some(bottom) = bottom {
        labels.push(spec(bottom, Some(BOTTOM_SLOT)));
    }
    labels.extend(text.into_iter().map(|t| spec(t, Some(CENTER_SLOT))));
    labels
}

async fn compose(
    composition: Composition,
    root: TemplateRoot,
    font: Option<&Path>,
    output: &Path,
    publish: Option<(PathBuf, String, String)>,
) -> Result<(), CliError> {
    let mut canvas = Compositor::new(CompositorConfig::default())?;
    if let Some(path) = font {
        canvas = canvas.with_typeface(Typeface::from_file(path)?);
    }

    let outcome = match (&composition.template, &composition.image) {
        (_, Some(image)) => {
            let bytes = tokio::fs::read(image).await.map_err(|e| {
                CanvasError::Fetch(format!("Failed to read {}: {}", image, e))
            })?;
            canvas.load_from_bytes(bytes).await?
        }
        (Some(template), None) => {
            let loader = ImageLoader::new(root)?;
            canvas
                .load_template(&loader, &TemplateRef::parse(template)?)
                .await?
        }
        (None, None) => {
            return Err(CliError::Usage(
                "No image to caption: pass --template, --image or a --spec with one".to_string(),
            ));
        }
    };
    if let LoadOutcome::Applied(info) = outcome {
        tracing::debug!(
            width = info.width,
            height = info.height,
            "canvas ready"
        );
    }

    canvas.apply_label_specs(&composition.labels);

    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let encoded = match extension.as_deref() {
        Some("png") => canvas.to_png()?,
        Some("jpg") | Some("jpeg") => canvas.to_encoded_blob()?,
        _ => {
            return Err(CliError::Usage(format!(
                "Unsupported output format for {} (use .png, .jpg or .jpeg)",
                output.display()
            )));
        }
    };
    let bytes = encoded.ok_or(PublishError::NothingToExport)?;
    tokio::fs::write(output, &bytes).await.map_err(CanvasError::from)?;

    let (width, height) = canvas.size();
    println!("Saved {}x{} meme to {}", width, height, output.display());

    if let Some((dir, title, user)) = publish {
        let backend = Arc::new(MemoryBackend::signed_in(user));
        let publisher = Publisher::new(
            backend.clone(),
            backend,
            Arc::new(DirectoryStorage::new(dir)),
        );

        let job = canvas.export_job();
        let post = publisher
            .publish(&title, move || async move {
                match job {
                    Some(job) => job.encode_jpeg_async().await.map(Some),
                    None => Ok(None),
                }
            })
            .await?;

        let json = serde_json::to_string_pretty(&post)
            .map_err(|e| CliError::Usage(format!("Failed to serialize post: {}", e)))?;
        println!("{}", json);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flag_labels_keep_slots() {
        let labels = labels_from_flags(
            None,
            Some("BOTTOM".to_string()),
            vec!["A\\nB".to_string()],
            Some(40),
            None,
        );
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].text, "BOTTOM");
        assert_eq!((labels[0].x, labels[0].y), (Some(0.5), Some(0.92)));
        assert_eq!(labels[1].text, "A\nB");
        assert_eq!(labels[1].font_size, Some(40));
    }

    #[test]
    fn test_no_flags_no_labels() {
        assert!(labels_from_flags(None, None, Vec::new(), None, None).is_empty());
    }

    #[test]
    fn test_cli_parses_compose() {
        let cli = Cli::try_parse_from([
            "meme-canvas",
            "compose",
            "--template",
            "drake",
            "--top",
            "NO",
            "-o",
            "out.jpg",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Compose { .. }));
    }

    #[test]
    fn test_cli_rejects_template_and_image() {
        let result = Cli::try_parse_from([
            "meme-canvas",
            "compose",
            "--template",
            "drake",
            "--image",
            "a.png",
            "-o",
            "out.jpg",
        ]);
        assert!(result.is_err());
    }
}
