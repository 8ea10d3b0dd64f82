use clap::{Parser, Subcommand};
use slideset::client::{Client, LocalTransport};
use slideset::drag::{DragEvent, DragMachine, DropZone};
use slideset::index::{self, FileIndexSource, HostEvent, IndexCache, LinkedIndex};
use slideset::mutate::Mutator;
use slideset::output::{self, SlideSummary};
use slideset::router::{self, Router};
use slideset::config;
use slideset::store::DiskStore;
use std::io::{self, Read};
use std::path::PathBuf;

/// Where a command's slide content comes from.
#[derive(clap::Args, Clone)]
struct ContentArgs {
    /// Slide content given inline
    #[arg(long, conflicts_with = "file")]
    content: Option<String>,

    /// Read slide content from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl ContentArgs {
    /// Inline text, file contents, or `fallback()` when neither flag is set.
    fn resolve(&self, fallback: impl FnOnce() -> io::Result<String>) -> io::Result<String> {
        match (&self.content, &self.file) {
            (Some(content), _) => Ok(content.clone()),
            (None, Some(path)) => std::fs::read_to_string(path),
            (None, None) => fallback(),
        }
    }
}

fn version_string() -> &'static str {
    let on_tag = env!("SLIDESET_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("SLIDESET_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "slideset")]
#[command(about = "Reorder, insert and delete MDX slides in a Storybook deck")]
#[command(long_about = "\
Reorder, insert and delete MDX slides in a Storybook deck

Each slide is an MDX file holding one <Slide> block. Slides are moved by
moving their content between files; files are never renamed, so links to a
slide's page keep working.

Project structure:

  ./
  ├── slideset.toml                 # Optional config (see gen-config)
  ├── stories/slides/
  │   ├── 1.mdx                     # <Slide>...</Slide>
  │   ├── 2.mdx
  │   └── 7.mdx                     # Numbers need not be contiguous
  └── storybook-static/index.json   # Page index; deck order comes from here

Slides are addressed by page id, e.g. slides-slide-2--docs. A deck is every
page whose id differs only in the slide number.

'slideset serve' speaks the line-delimited JSON request protocol on
stdin/stdout; logs go to stderr (RUST_LOG, --verbose).

Run 'slideset gen-config' to generate a documented slideset.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root (the directory holding slideset.toml and the stories)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer slide requests on stdin/stdout until end of input
    Serve,
    /// Print a slide's content
    Show { story_id: String },
    /// Replace a slide's content (from --content, --file, or stdin)
    Save {
        story_id: String,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// List the deck a slide belongs to (the first deck when omitted)
    List { story_id: Option<String> },
    /// Show a slide's previous/next navigation targets
    Links { story_id: String },
    /// Swap a slide with the one before it
    MoveUp { story_id: String },
    /// Swap a slide with the one after it
    MoveDown { story_id: String },
    /// Delete a slide; later slides shift up
    Delete { story_id: String },
    /// Insert a slide into a deck at a 0-based position
    Insert {
        /// Any slide of the target deck
        story_id: String,
        #[arg(long)]
        at: usize,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Add a slide at the end of a deck
    Append {
        /// Any slide of the target deck
        story_id: String,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Drop a slide onto a drop zone (before-<id> or after-<id>)
    Reorder { story_id: String, zone: DropZone },
    /// Print a stock slideset.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.root)?;
    let index_source = FileIndexSource::new(cli.root.join(&config.index_path));
    let router = Router::new(DiskStore::new(&cli.root), config);

    let mut cache = IndexCache::new(index_source);
    let mut client = Client::new(LocalTransport::new(&router));

    match cli.command {
        Command::Serve => {
            tracing::info!(root = %cli.root.display(), "serving slide requests on stdin");
            let handled = router::serve(&router, io::stdin().lock(), io::stdout().lock())?;
            tracing::info!(handled, "request channel closed");
        }
        Command::Show { story_id } => {
            let index = cache.ensure()?;
            println!("{}", client.get_slide_content(index, &story_id)?);
        }
        Command::Save { story_id, content } => {
            let content = content.resolve(read_stdin)?;
            client.save_slide(cache.ensure()?, &story_id, &content)?;
            println!("Saved {story_id}");
        }
        Command::List { story_id } => {
            let index = cache.ensure()?;
            let story_id = match story_id {
                Some(id) => id,
                None => first_deck_member(index).ok_or("index has no slide decks")?,
            };
            print_deck(&router, index, &story_id)?;
        }
        Command::Links { story_id } => {
            cache.handle(HostEvent::CurrentStoryChanged(story_id))?;
            if let Some((id, links)) = cache.current() {
                output::print_links(id, links);
            }
        }
        Command::MoveUp { story_id } => {
            client.move_slide_up(cache.ensure()?, &story_id)?;
            println!("Moved {story_id} up");
        }
        Command::MoveDown { story_id } => {
            client.move_slide_down(cache.ensure()?, &story_id)?;
            println!("Moved {story_id} down");
        }
        Command::Delete { story_id } => {
            client.delete_slide(cache.ensure()?, &story_id)?;
            println!("Deleted {story_id}");
        }
        Command::Insert {
            story_id,
            at,
            content,
        } => {
            let content = content.resolve(|| Ok(String::new()))?;
            let new_path = client.insert_slide_at(cache.ensure()?, &story_id, at, &content)?;
            println!("{}", output::format_inserted(at, &new_path));
        }
        Command::Append { story_id, content } => {
            let content = content.resolve(|| Ok(String::new()))?;
            let index = cache.ensure()?;
            let position = index.siblings(&story_id)?.len();
            let new_path = client.append_slide(index, &story_id, &content)?;
            println!("{}", output::format_inserted(position, &new_path));
        }
        Command::Reorder { story_id, zone } => {
            let mut drag = DragMachine::new();
            drag.apply(DragEvent::Start {
                story_id,
                preview_element: None,
            });
            drag.apply(DragEvent::Over(Some(zone)));
            drag.apply(DragEvent::Drop);
            drag.apply(DragEvent::End);
            match drag.take_drop() {
                Some(intent) => {
                    let swaps = client.move_slide_to(cache.ensure()?, &intent)?;
                    println!("Moved {} to {} ({} swaps)", intent.dragged, intent.zone, swaps);
                }
                None => println!("Nothing to move"),
            }
        }
        Command::GenConfig => unreachable!("gen-config returns before the project is loaded"),
    }

    Ok(())
}

/// Log to stderr; stdout carries command output and the request protocol.
fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("slideset=debug")
        } else {
            EnvFilter::new("slideset=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_stdin() -> io::Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Id of the first index entry that belongs to a deck.
fn first_deck_member(index: &LinkedIndex) -> Option<String> {
    index
        .iter()
        .map(|entry| entry.data.id.as_str())
        .find(|id| index::in_deck(index::deck_prefix(id), id))
        .map(str::to_string)
}

fn print_deck(
    router: &Router<DiskStore>,
    index: &LinkedIndex,
    story_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let siblings = index.siblings(story_id)?;
    let mutator = Mutator::new(router.store(), router.config());
    let slides: Vec<SlideSummary> = siblings
        .iter()
        .map(|entry| SlideSummary {
            entry,
            content: mutator.read_content(&entry.import_path).ok(),
        })
        .collect();
    let deck_name = siblings
        .first()
        .and_then(|entry| entry.title.rsplit_once('/'))
        .map_or("Deck", |(group, _)| group);
    output::print_deck(deck_name, &slides, Some(story_id));
    Ok(())
}
