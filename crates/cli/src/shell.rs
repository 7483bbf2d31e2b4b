//! Interactive shell.
//!
//! One event loop owns the [`Session`]. Structuring and image calls run as
//! tokio tasks and report back over a channel, so the loop is the only writer.

use crate::render::{render_notes, render_outline, render_slide, render_themes, ImageStatus};
use anyhow::{Context, Result};
use slidecraft_core::{Deck, ImagePayload, ImageTicket, ImageUpdate, Session, ThemeId};
use slidecraft_genai::ContentGenerator;
use slidecraft_pptx::PptxWriter;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

const PASTE_TERMINATOR: &str = ".";

const HELP: &str = "\
Commands:
  paste            enter source text, finish with a line containing only '.'
  sample           load the sample text
  generate         structure the current text into a deck
  show             show the active slide
  notes            show the active slide's speaker notes
  next | prev      move between slides
  goto N           jump to slide N
  list             list all slides
  theme [NAME]     list themes or select one
  image [all]      generate the image for the active slide (or every slide)
  export [DIR]     write the deck as .pptx (default: export directory)
  status           show pending work
  help             show this help
  quit             leave the shell
";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Paste,
    Sample,
    Generate,
    Show,
    Notes,
    Next,
    Prev,
    Goto(usize),
    List,
    Theme(Option<ThemeId>),
    Image { all: bool },
    Export(Option<PathBuf>),
    Status,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line.
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Self::Empty);
        };
        let rest: Vec<&str> = words.collect();

        let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("paste", []) => Self::Paste,
            ("sample", []) => Self::Sample,
            ("generate" | "gen", []) => Self::Generate,
            ("show", []) => Self::Show,
            ("notes", []) => Self::Notes,
            ("next" | "n", []) => Self::Next,
            ("prev" | "p", []) => Self::Prev,
            ("goto" | "g", [n]) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::Goto(n - 1),
                _ => return Err(format!("Not a slide number: {}", n)),
            },
            ("list" | "ls", []) => Self::List,
            ("theme", []) => Self::Theme(None),
            ("theme", [name]) => Self::Theme(Some(name.parse().map_err(|e| format!("{}", e))?)),
            ("image", []) => Self::Image { all: false },
            ("image", ["all"]) => Self::Image { all: true },
            ("export", []) => Self::Export(None),
            ("export", _) => Self::Export(Some(PathBuf::from(rest.join(" ")))),
            ("status", []) => Self::Status,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit" | "q", []) => Self::Quit,
            (other, _) => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };
        Ok(command)
    }
}

/// Results delivered by background tasks.
#[derive(Debug)]
pub enum ShellEvent {
    Structured(slidecraft_core::Result<Deck>),
    Image(ImageTicket, slidecraft_core::Result<ImagePayload>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

enum Mode {
    Command,
    Paste(Vec<String>),
}

/// Shell state: the session plus the channel its tasks report on.
pub struct Shell<W: Write> {
    session: Session,
    generator: Arc<dyn ContentGenerator>,
    writer: PptxWriter,
    export_dir: PathBuf,
    mode: Mode,
    events_tx: UnboundedSender<ShellEvent>,
    events_rx: UnboundedReceiver<ShellEvent>,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(session: Session, generator: Arc<dyn ContentGenerator>, out: W) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            session,
            generator,
            writer: PptxWriter::new(),
            export_dir: PathBuf::from("."),
            mode: Mode::Command,
            events_tx,
            events_rx,
            out,
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until `quit` or end of input.
    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        writeln!(self.out, "SlideCraft shell. Type 'help' for commands.")?;
        if self.session.deck().is_some() {
            self.show_active()?;
        }
        self.prompt()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        break;
                    };
                    if self.handle_line(&line)? == Flow::Quit {
                        break;
                    }
                    self.prompt()?;
                }
                Some(event) = self.events_rx.recv() => {
                    self.apply(event)?;
                    self.prompt()?;
                }
            }
        }

        if self.session.is_generating() || self.session.pending_image_count() > 0 {
            log::debug!("Leaving with work in flight; results are dropped");
        }
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        let prompt = match self.mode {
            Mode::Command => "slidecraft> ",
            Mode::Paste(_) => "... ",
        };
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        Ok(())
    }

    /// Handle one line of user input.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if let Mode::Paste(buffer) = &mut self.mode {
            if line.trim() == PASTE_TERMINATOR {
                let text = buffer.join("\n");
                self.mode = Mode::Command;
                self.session.set_input(text);
                writeln!(
                    self.out,
                    "Captured {} characters. Type 'generate' to build the deck.",
                    self.session.input().chars().count()
                )?;
            } else {
                buffer.push(line.to_string());
            }
            return Ok(Flow::Continue);
        }

        let command = match ShellCommand::parse(line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(self.out, "{}", message)?;
                return Ok(Flow::Continue);
            }
        };
        self.execute(command)
    }

    fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Paste => {
                self.mode = Mode::Paste(Vec::new());
                writeln!(self.out, "Paste your text. End with a line containing only '.'")?;
            }
            ShellCommand::Sample => {
                self.session.load_sample();
                writeln!(self.out, "Sample text loaded. Type 'generate' to build the deck.")?;
            }
            ShellCommand::Generate => self.start_generation()?,
            ShellCommand::Show => self.show_active()?,
            ShellCommand::Notes => match self.session.active_slide() {
                Some(slide) => write!(self.out, "{}", render_notes(slide))?,
                None => self.no_deck()?,
            },
            ShellCommand::Next => {
                self.session.next_slide();
                self.show_active()?;
            }
            ShellCommand::Prev => {
                self.session.previous_slide();
                self.show_active()?;
            }
            ShellCommand::Goto(index) => {
                if self.session.go_to(index) {
                    self.show_active()?;
                } else {
                    writeln!(self.out, "No slide {}", index + 1)?;
                }
            }
            ShellCommand::List => match self.session.deck() {
                Some(deck) => {
                    let session = &self.session;
                    let text = render_outline(deck, session.active_index(), |id| {
                        session.is_image_pending(id)
                    });
                    write!(self.out, "{}", text)?;
                }
                None => self.no_deck()?,
            },
            ShellCommand::Theme(None) => {
                write!(self.out, "{}", render_themes(Some(self.session.theme_id())))?;
            }
            ShellCommand::Theme(Some(theme)) => {
                self.session.select_theme(theme);
                writeln!(self.out, "Theme set to {}", theme)?;
            }
            ShellCommand::Image { all } => self.start_images(all)?,
            ShellCommand::Export(dir) => self.export(dir)?,
            ShellCommand::Status => {
                writeln!(
                    self.out,
                    "theme: {}, generating: {}, images pending: {}",
                    self.session.theme_id(),
                    if self.session.is_generating() { "yes" } else { "no" },
                    self.session.pending_image_count()
                )?;
            }
            ShellCommand::Help => write!(self.out, "{}", HELP)?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn no_deck(&mut self) -> Result<()> {
        writeln!(self.out, "No deck yet. Use 'paste' or 'sample', then 'generate'.")?;
        Ok(())
    }

    fn show_active(&mut self) -> Result<()> {
        let Some(deck) = self.session.deck() else {
            return self.no_deck();
        };
        let index = self.session.active_index();
        if let Some(slide) = deck.slides.get(index) {
            let status = ImageStatus::of(slide, self.session.is_image_pending(&slide.id));
            let text = render_slide(slide, index, deck.len(), status);
            write!(self.out, "{}", text)?;
        }
        Ok(())
    }

    fn start_generation(&mut self) -> Result<()> {
        if self.session.is_generating() {
            writeln!(self.out, "Already generating.")?;
            return Ok(());
        }
        let Some(text) = self.session.begin_generation() else {
            writeln!(self.out, "Nothing to structure. Use 'paste' or 'sample' first.")?;
            return Ok(());
        };

        writeln!(self.out, "Structuring your content...")?;
        let generator = Arc::clone(&self.generator);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = generator.structurize(&text).await;
            let _ = tx.send(ShellEvent::Structured(result));
        });
        Ok(())
    }

    fn start_images(&mut self, all: bool) -> Result<()> {
        let Some(deck) = self.session.deck() else {
            return self.no_deck();
        };
        let ids: Vec<String> = if all {
            deck.slides
                .iter()
                .filter(|s| !s.has_image())
                .map(|s| s.id.clone())
                .collect()
        } else {
            self.session.active_slide().map(|s| s.id.clone()).into_iter().collect()
        };

        let mut started = 0;
        for id in ids {
            let Some(ticket) = self.session.begin_image(&id) else {
                continue;
            };
            started += 1;
            let generator = Arc::clone(&self.generator);
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let result = generator.synthesize_image(&ticket.description).await;
                let _ = tx.send(ShellEvent::Image(ticket, result));
            });
        }

        if started == 0 {
            writeln!(self.out, "No image to generate (missing description or already pending).")?;
        } else {
            writeln!(self.out, "Generating {} image(s)...", started)?;
        }
        Ok(())
    }

    /// Apply a background result to the session.
    pub fn apply(&mut self, event: ShellEvent) -> Result<()> {
        match event {
            ShellEvent::Structured(result) => {
                self.session.finish_generation(result);
                if let Some(message) = self.session.error() {
                    writeln!(self.out, "Error: {}", message)?;
                    self.session.clear_error();
                } else if let Some(deck) = self.session.deck() {
                    writeln!(self.out, "Built '{}' with {} slides.", deck.title, deck.len())?;
                    self.show_active()?;
                }
            }
            ShellEvent::Image(ticket, result) => match self.session.finish_image(&ticket, result) {
                ImageUpdate::Applied => {
                    let number = self
                        .session
                        .deck()
                        .and_then(|d| d.position(&ticket.slide_id))
                        .map(|i| i + 1)
                        .unwrap_or(0);
                    writeln!(self.out, "Image ready for slide {}.", number)?;
                }
                ImageUpdate::Stale => {
                    log::debug!("Dropped stale image for '{}'", ticket.slide_id);
                }
                ImageUpdate::Failed => {
                    let message = self.session.error().unwrap_or_default().to_string();
                    writeln!(self.out, "Error: {}", message)?;
                    self.session.clear_error();
                }
            },
        }
        Ok(())
    }

    fn export(&mut self, dir: Option<PathBuf>) -> Result<()> {
        let Some(deck) = self.session.deck() else {
            return self.no_deck();
        };
        let dir = dir.unwrap_or_else(|| self.export_dir.clone());

        match self.write_export(deck, &dir) {
            Ok(path) => writeln!(self.out, "Exported {}", path.display())?,
            Err(e) => {
                let message = format!("{:#}", e);
                self.session.report_error(message.clone());
                writeln!(self.out, "Error: {}", message)?;
                self.session.clear_error();
            }
        }
        Ok(())
    }

    fn write_export(&self, deck: &Deck, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let artifact = self.writer.export(deck, self.session.theme())?;
        let path = artifact.write_to_dir(dir)?;
        Ok(path)
    }

    #[cfg(test)]
    async fn next_event(&mut self) -> Option<ShellEvent> {
        self.events_rx.recv().await
    }
}
