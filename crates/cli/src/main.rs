//! SlideCraft command-line tool.

mod render;
mod shell;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use slidecraft_core::{Deck, Session, ThemeId, SAMPLE_TEXT};
use slidecraft_genai::gemini::{DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use slidecraft_genai::{ContentGenerator, GeminiClient, GeminiConfig};
use slidecraft_pptx::{PptxInspector, PptxWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Turn raw notes into themed PowerPoint decks with Gemini.
#[derive(Parser, Debug)]
#[command(name = "slidecraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    gemini: GeminiArgs,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GeminiArgs {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Model used to structure text into slides
    #[arg(long, env = "SLIDECRAFT_TEXT_MODEL", default_value = DEFAULT_TEXT_MODEL, global = true)]
    text_model: String,

    /// Model used for slide images (names starting with "imagen" use the predict API)
    #[arg(long, env = "SLIDECRAFT_IMAGE_MODEL", default_value = DEFAULT_IMAGE_MODEL, global = true)]
    image_model: String,
}

impl GeminiArgs {
    fn client(&self) -> Result<Arc<dyn ContentGenerator>> {
        let Some(api_key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            bail!("No API key. Pass --api-key or set GEMINI_API_KEY.");
        };
        let config = GeminiConfig::new(api_key)
            .with_base_url(&self.base_url)
            .with_text_model(&self.text_model)
            .with_image_model(&self.image_model);
        Ok(Arc::new(GeminiClient::new(config)?))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Structure raw text into a deck (JSON)
    Generate {
        /// Input text file ("-" or omitted reads stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Use the built-in sample text
        #[arg(long, conflicts_with = "input")]
        sample: bool,

        /// Output deck file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also generate an image for every slide
        #[arg(long)]
        images: bool,
    },

    /// Generate slide images for a deck file
    Image {
        /// Deck JSON file
        deck: PathBuf,

        /// Only this slide id (default: every slide without an image)
        #[arg(short, long)]
        slide: Option<String>,

        /// Output deck file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a deck file to .pptx
    Export {
        /// Deck JSON file
        deck: PathBuf,

        /// Theme: corporate, modern, minimal, elegant
        #[arg(short, long, default_value = "corporate")]
        theme: ThemeId,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize a .pptx file
    Inspect {
        /// Presentation file
        file: PathBuf,

        /// Print the full structure as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available themes
    Themes,

    /// Interactive shell
    Shell {
        /// Starting theme
        #[arg(short, long, default_value = "corporate")]
        theme: ThemeId,

        /// Deck JSON file to start from
        #[arg(long)]
        deck: Option<PathBuf>,

        /// Directory for exported files
        #[arg(short, long, default_value = ".")]
        export_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match cli.command {
        Command::Generate {
            input,
            sample,
            output,
            images,
        } => {
            let text = if sample {
                SAMPLE_TEXT.to_string()
            } else {
                read_input(input.as_deref())?
            };
            if text.trim().is_empty() {
                bail!("Input text is empty");
            }

            let generator = cli.gemini.client()?;
            eprintln!("Structuring your content...");
            let mut deck = generator.structurize(&text).await?;
            eprintln!("Built '{}' with {} slides", deck.title, deck.len());

            if images {
                generate_images(generator, &mut deck, None).await;
            }
            write_deck(&deck, output.as_deref())?;
        }
        Command::Image { deck, slide, output } => {
            let mut loaded = read_deck(&deck)?;
            if let Some(id) = slide.as_deref() {
                if loaded.slide(id).is_none() {
                    bail!("No slide with id '{}' in {}", id, deck.display());
                }
            }
            let generator = cli.gemini.client()?;
            let applied = generate_images(generator, &mut loaded, slide.as_deref()).await;
            eprintln!("{} image(s) attached", applied);
            write_deck(&loaded, Some(output.as_deref().unwrap_or(&deck)))?;
        }
        Command::Export { deck, theme, output } => {
            let loaded = read_deck(&deck)?;
            let dir = output.unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

            let artifact = PptxWriter::new().export(&loaded, theme.profile())?;
            let path = artifact.write_to_dir(&dir)?;
            println!("{}", path.display());
        }
        Command::Inspect { file, json } => inspect(&file, json)?,
        Command::Themes => print!("{}", render::render_themes(None)),
        Command::Shell {
            theme,
            deck,
            export_dir,
        } => {
            let generator = cli.gemini.client()?;
            let mut session = Session::new().with_theme(theme);
            if let Some(path) = deck {
                // Loaded decks enter through the same path as generated ones.
                session.finish_generation(Ok(read_deck(&path)?));
            }
            shell::Shell::new(session, generator, std::io::stdout())
                .with_export_dir(export_dir)
                .run()
                .await?;
        }
    }

    Ok(())
}

/// Request images for slides concurrently and attach them by id.
///
/// Failures are reported and skipped; returns the number of images attached.
async fn generate_images(
    generator: Arc<dyn ContentGenerator>,
    deck: &mut Deck,
    only: Option<&str>,
) -> usize {
    let mut tasks = JoinSet::new();
    for slide in &deck.slides {
        if only.map_or(slide.has_image(), |id| id != slide.id) {
            continue;
        }
        let Some(description) = slide.image_prompt() else {
            log::debug!("Slide '{}' has no image description", slide.id);
            continue;
        };

        let generator = Arc::clone(&generator);
        let id = slide.id.clone();
        let description = description.to_string();
        tasks.spawn(async move {
            let result = generator.synthesize_image(&description).await;
            (id, result)
        });
    }

    eprintln!("Generating {} image(s)...", tasks.len());

    let mut applied = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, Ok(image))) => {
                if deck.attach_image(&id, &image) {
                    applied += 1;
                }
            }
            Ok((id, Err(e))) => eprintln!("Image for slide '{}' failed: {}", id, e),
            Err(e) => log::warn!("Image task aborted: {}", e),
        }
    }
    applied
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let deck = PptxInspector::new()
        .inspect(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&deck)?);
        return Ok(());
    }

    println!(
        "{} ({} slides, {} media)",
        deck.title.as_deref().unwrap_or("(untitled)"),
        deck.slides.len(),
        deck.media.len()
    );
    for slide in &deck.slides {
        println!(
            "{:>3}. {} [bg #{}]{}",
            slide.number,
            slide.title().unwrap_or("(no title)"),
            slide.background.as_deref().unwrap_or("------"),
            if slide.picture().is_some() { " [img]" } else { "" }
        );
        for bullet in slide.bullets() {
            println!("       • {}", bullet);
        }
        if let Some(notes) = &slide.notes {
            println!("       notes: {}", notes.replace('\n', " / "));
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    let mut text = String::new();
    match path {
        Some(p) if p != Path::new("-") => {
            File::open(p)
                .with_context(|| format!("Failed to open {}", p.display()))?
                .read_to_string(&mut text)
                .with_context(|| format!("Failed to read {}", p.display()))?;
        }
        _ => {
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
        }
    }
    Ok(text)
}

fn read_deck(path: &Path) -> Result<Deck> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a deck file", path.display()))
}

fn write_deck(deck: &Deck, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, deck)?;
            writer
                .flush()
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(deck)?),
    }
    Ok(())
}
