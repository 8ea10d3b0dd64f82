//! End-to-end deck editing over the fixture project.
//!
//! Drives the public API the way the sidebar and the `serve` command do:
//! page ids in, import-path requests over the wire, slide files rewritten on
//! disk, and the linked index used to find the deck.
//!
//! Run with: cargo test --test deck_workflow

use slideset::client::{Client, ClientError, LineTransport, LocalTransport};
use slideset::config::{self, DeckConfig};
use slideset::drag::{DragEvent, DragMachine, DropZone};
use slideset::index::{FileIndexSource, HostEvent, IndexCache};
use slideset::mutate::Mutator;
use slideset::protocol::{
    DeleteSlideRequest, GetSlideSourceRequest, MoveSlideDownRequest, RequestEnvelope,
    ResponseEnvelope,
};
use slideset::router::{self, Router};
use slideset::store::DiskStore;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let dst_path = dst.join(entry.file_name());
        if entry.path().is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&entry.path(), &dst_path)?;
        } else {
            std::fs::copy(entry.path(), &dst_path)?;
        }
    }
    Ok(())
}

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/deck");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn open(root: &Path) -> (Router<DiskStore>, IndexCache<FileIndexSource>) {
    let config = config::load_config(root).unwrap();
    let cache = IndexCache::new(FileIndexSource::new(root.join(&config.index_path)));
    (Router::new(DiskStore::new(root), config), cache)
}

fn first_lines(router: &Router<DiskStore>, paths: &[&str]) -> Vec<String> {
    let mutator = Mutator::new(router.store(), router.config());
    paths
        .iter()
        .map(|path| {
            let content = mutator.read_content(path).unwrap();
            content.lines().next().unwrap_or_default().to_string()
        })
        .collect()
}

const DECK: [&str; 3] = [
    "./stories/slides/1.mdx",
    "./stories/slides/2.mdx",
    "./stories/slides/3.mdx",
];

#[test]
fn edit_a_deck_through_the_client() {
    let tmp = project();
    let (router, mut cache) = open(tmp.path());
    let mut client = Client::new(LocalTransport::new(&router));

    let index = cache.ensure().unwrap();
    client.move_slide_down(index, "slides-slide-1--docs").unwrap();
    assert_eq!(first_lines(&router, &DECK), ["# Agenda", "# Welcome", "# Thanks"]);

    let new_path = client.append_slide(index, "slides-slide-1--docs", "# Appendix").unwrap();
    assert_eq!(new_path, "./stories/slides/4.mdx");
    assert_eq!(first_lines(&router, &[&new_path]), ["# Appendix"]);

    client.delete_slide(index, "slides-slide-2--docs").unwrap();
    assert_eq!(first_lines(&router, &DECK[..2]), ["# Agenda", "# Thanks"]);
    assert!(!tmp.path().join("stories/slides/3.mdx").exists());

    // Non-slide pages were never touched.
    let intro = std::fs::read_to_string(tmp.path().join("stories/Intro.mdx")).unwrap();
    let original = std::fs::read_to_string(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/deck/stories/Intro.mdx"),
    )
    .unwrap();
    assert_eq!(intro, original);
}

#[test]
fn moves_keep_everything_outside_the_block() {
    let tmp = project();
    let (router, mut cache) = open(tmp.path());
    let mut client = Client::new(LocalTransport::new(&router));
    let before = std::fs::read_to_string(tmp.path().join("stories/slides/3.mdx")).unwrap();

    let index = cache.ensure().unwrap();
    client.move_slide_up(index, "slides-slide-3--docs").unwrap();
    client.move_slide_down(index, "slides-slide-2--docs").unwrap();
    client.move_slide_down(index, "slides-slide-1--docs").unwrap();
    client.move_slide_up(index, "slides-slide-2--docs").unwrap();

    // Each swap was undone by the opposite move of its partner.
    let after = std::fs::read_to_string(tmp.path().join("stories/slides/3.mdx")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn drag_and_drop_reorders_the_deck() {
    let tmp = project();
    let (router, mut cache) = open(tmp.path());
    let mut client = Client::new(LocalTransport::new(&router));

    let mut drag = DragMachine::new();
    drag.apply(DragEvent::Start {
        story_id: "slides-slide-3--docs".into(),
        preview_element: Some("slide-preview".into()),
    });
    drag.apply(DragEvent::Over(Some("before-slides-slide-2--docs".parse().unwrap())));
    drag.apply(DragEvent::Drop);
    let intent = drag.take_drop().unwrap();
    assert_eq!(intent.zone, DropZone::before("slides-slide-2--docs"));

    let swaps = client.move_slide_to(cache.ensure().unwrap(), &intent).unwrap();
    assert_eq!(swaps, 1);
    assert_eq!(first_lines(&router, &DECK), ["# Welcome", "# Thanks", "# Agenda"]);
}

#[test]
fn navigation_links_skip_foreign_pages() {
    let tmp = project();
    let (_router, mut cache) = open(tmp.path());

    cache
        .handle(HostEvent::CurrentStoryChanged("slides-slide-3--docs".into()))
        .unwrap();
    let (_, links) = cache.current().unwrap();
    assert_eq!(links.prev_path.as_deref(), Some("?path=/docs/slides-slide-2--docs"));
    assert_eq!(links.next_path, None);
}

#[test]
fn serve_answers_line_delimited_requests() {
    let tmp = project();
    let (router, _cache) = open(tmp.path());

    let requests = [
        RequestEnvelope::new(
            "r1",
            &GetSlideSourceRequest {
                story_id: "slides-slide-1--docs".into(),
                import_path: DECK[0].into(),
            },
        )
        .unwrap(),
        RequestEnvelope::new(
            "r2",
            &MoveSlideDownRequest {
                story_import_path: DECK[0].into(),
                next_import_path: DECK[1].into(),
            },
        )
        .unwrap(),
        RequestEnvelope::new(
            "r3",
            &DeleteSlideRequest {
                target_import_path: "./stories/slides/99.mdx".into(),
                all_slide_import_paths: DECK.iter().map(|p| p.to_string()).collect(),
            },
        )
        .unwrap(),
    ];
    let input: String = requests
        .iter()
        .map(|r| serde_json::to_string(r).unwrap() + "\n")
        .collect();

    let mut output = Vec::new();
    assert_eq!(router::serve(&router, input.as_bytes(), &mut output).unwrap(), 3);

    let responses: Vec<ResponseEnvelope> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let ids: Vec<&str> = responses.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["r1", "r2", "r3"]);
    assert!(responses[0].payload.as_ref().unwrap()["content"]
        .as_str()
        .unwrap()
        .starts_with("# Welcome"));
    assert!(responses[1].success);
    assert!(!responses[2].success);
    assert!(responses[2].error.as_deref().unwrap().starts_with("NotFound: "));
    assert_eq!(first_lines(&router, &DECK[..2]), ["# Agenda", "# Welcome"]);
}

#[test]
fn line_client_reads_served_responses() {
    let tmp = project();
    let (router, mut cache) = open(tmp.path());

    // Serve a request the client is about to send, then replay the output.
    let request = RequestEnvelope::new(
        "slideset-1",
        &GetSlideSourceRequest {
            story_id: "slides-slide-2--docs".into(),
            import_path: DECK[1].into(),
        },
    )
    .unwrap();
    let mut served = Vec::new();
    let line = serde_json::to_string(&request).unwrap() + "\n";
    router::serve(&router, line.as_bytes(), &mut served).unwrap();

    let mut client = Client::new(LineTransport::new(Cursor::new(served), std::io::sink()));
    let content = client
        .get_slide_content(cache.ensure().unwrap(), "slides-slide-2--docs")
        .unwrap();
    assert!(content.starts_with("# Agenda"));

    // The channel is now exhausted.
    let err = client
        .get_slide_content(cache.ensure().unwrap(), "slides-slide-2--docs")
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[test]
fn custom_component_name_from_config() {
    let tmp = project();
    std::fs::write(
        tmp.path().join(config::CONFIG_FILENAME),
        "component = \"Page\"\n",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("stories/slides/1.mdx"),
        "<Page>\n# Paged\n</Page>\n",
    )
    .unwrap();

    let (router, mut cache) = open(tmp.path());
    assert_eq!(router.config().component, "Page");
    assert_ne!(router.config(), &DeckConfig::default());

    let mut client = Client::new(LocalTransport::new(&router));
    let index = cache.ensure().unwrap();
    assert_eq!(client.get_slide_content(index, "slides-slide-1--docs").unwrap(), "# Paged");

    // Files without the configured block are reported, not rewritten.
    let err = client.get_slide_content(index, "slides-slide-2--docs").unwrap_err();
    assert!(matches!(err, ClientError::Remote { ref message, .. } if message.starts_with("NotFound: ")));
}
