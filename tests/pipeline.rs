use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use post_assembly::parser::blocks::blocks_from_json;
use post_assembly::{
    assemble_roundup, assemble_single_document, AssemblyConfig, AssemblyError, CanonicalSection,
    ContentBlock, ContentMutator, FeaturedImageSetter, GenerationReply, GenerationRequest,
    HeadingReader, HeadingRef, ImagePlacer, ImageUploader, PlacementMode, PostId, RenderedDocument,
    RoundupSource, SectionCompleter, TextGenerator, UploadedImage, UploadedMedia,
};

struct ScriptedGenerator {
    replies: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn new(replies: &[&str]) -> Self {
        ScriptedGenerator {
            replies: RefCell::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationReply> {
        self.requests.borrow_mut().push(request.clone());
        let message = self
            .replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted reply left"))?;
        Ok(GenerationReply {
            error: String::new(),
            message,
        })
    }
}

#[derive(Default)]
struct CountingUploader(Mutex<Vec<PathBuf>>);

impl ImageUploader for CountingUploader {
    fn upload(&self, local_path: &Path, title: &str) -> anyhow::Result<UploadedMedia> {
        let mut calls = self.0.lock().unwrap();
        calls.push(local_path.to_path_buf());
        Ok(UploadedMedia {
            id: 100 + calls.len() as u64,
            source_url: format!("https://food.example/uploads/{title}.jpg"),
        })
    }
}

#[derive(Default)]
struct RecordingFeatured(RefCell<Vec<(PostId, PathBuf)>>);

impl FeaturedImageSetter for RecordingFeatured {
    fn set_featured(&self, post_id: PostId, media: &UploadedImage) -> anyhow::Result<()> {
        self.0.borrow_mut().push((post_id, media.local_path.clone()));
        Ok(())
    }
}

/// Stores one post body as markup, like the publishing platform would.
struct Site {
    markup: RefCell<String>,
}

impl Site {
    fn publish(doc: &RenderedDocument) -> Self {
        Site {
            markup: RefCell::new(doc.to_markup()),
        }
    }

    fn body(&self) -> RenderedDocument {
        RenderedDocument::from_markup("", &self.markup.borrow())
    }
}

impl HeadingReader for Site {
    fn h2_headings(&self, _post_id: PostId) -> anyhow::Result<Vec<HeadingRef>> {
        Ok(self.body().h2_headings())
    }
}

impl ContentMutator for Site {
    fn update_content(
        &self,
        post_id: PostId,
        mutation: &mut dyn FnMut(&mut RenderedDocument),
    ) -> anyhow::Result<String> {
        let mut doc = self.body();
        mutation(&mut doc);
        *self.markup.borrow_mut() = doc.to_markup();
        Ok(format!("https://food.example/?p={post_id}"))
    }
}

fn fixture(name: &str) -> Vec<ContentBlock> {
    let json = std::fs::read_to_string(format!("tests/fixtures/{}.json", name)).unwrap();
    blocks_from_json(&json).unwrap()
}

const LEMON_TART_REPLY: &str = r#"{
    "intro": "Lemon tart is bright. It is simple. Everyone loves it.",
    "equipment_must_haves": ["Tart pan", "Food processor"],
    "equipment_nice_to_haves": ["Pie weights"],
    "good_to_know": "It keeps three days in the fridge. Serve it cold.",
    "conclusion": "Bake it this weekend. You will not regret it."
}"#;

#[test]
fn single_document_end_to_end() {
    let generator = ScriptedGenerator::new(&[LEMON_TART_REPLY, "\"Sunny Lemon Tart\""]);
    let config = AssemblyConfig::default();
    let source = fixture("lemon_tart");

    let doc = assemble_single_document(&source, None, &generator, &config).unwrap();
    assert_eq!(doc.title, "Sunny Lemon Tart");
    assert_eq!(generator.requests.borrow().len(), 2);

    let markup = doc.to_markup();
    assert!(markup.starts_with("<!-- wp:paragraph --><p>Lemon tart is bright. It is simple.</p>"));
    assert!(markup.contains("<li>Pie weights</li>"));
    assert!(markup.contains("<h2 class=\"wp-block-heading\">Preparations</h2>"));
    assert!(markup.contains("<h3 class=\"wp-block-heading\">For the filling</h3>"));
    assert!(markup.contains("<h2 class=\"wp-block-heading\">Serving ideas</h2>"));
    assert!(markup.contains("<h2 class=\"wp-block-heading\">Good to Know</h2>"));
    assert!(!markup.contains("Draft:"));
    assert!(!markup.contains("What you need to know"));
    assert!(!markup.contains("Low FODMAP"));

    let site = Site::publish(&doc);
    let uploader = CountingUploader::default();
    let featured = RecordingFeatured::default();
    let placer = ImagePlacer {
        uploader: &uploader,
        featured: &featured,
        headings: &site,
        mutator: &site,
        config: &config,
    };
    let paths = [PathBuf::from("002_b.jpg"), PathBuf::from("001_a.jpg")];
    let placement = placer
        .place(9, Some(doc.title.as_str()), &paths, PlacementMode::SingleDocument)
        .unwrap()
        .unwrap();

    assert_eq!(
        *uploader.0.lock().unwrap(),
        vec![PathBuf::from("001_a.jpg"), PathBuf::from("002_b.jpg")]
    );
    assert_eq!(*featured.0.borrow(), vec![(9, PathBuf::from("002_b.jpg"))]);
    assert!(placement.warnings.is_empty());
    assert_eq!(placement.post_link, "https://food.example/?p=9");

    let body = site.body();
    let after_ingredients = body.find_heading(|t| t == "Ingredients").unwrap() + 1;
    assert!(body.fragments()[after_ingredients].markup.contains("alt=\"Sunny Lemon Tart - 001_a\""));
    let after_prep = body.find_heading(|t| t == "Preparations").unwrap() + 1;
    assert!(body.fragments()[after_prep].markup.contains("wp-image-102"));
}

#[test]
fn good_to_know_filled_and_low_fodmap_never_invented() {
    let generator = ScriptedGenerator::new(&[r#"{
        "intro": "Oats are great.",
        "equipment_must_haves": ["Pot"],
        "equipment_nice_to_haves": [],
        "instructions": ["Boil milk", "Stir in oats"],
        "good_to_know": "Use rolled oats.",
        "conclusion": "Enjoy."
    }"#]);
    let config = AssemblyConfig::default();
    let source = vec![
        ContentBlock::heading2("Ingredients"),
        ContentBlock::bullet("2 cups oats"),
    ];
    let parsed = post_assembly::parser::parse_source(&source);
    let completed = SectionCompleter::new(&generator, &config)
        .complete(&parsed.sections)
        .unwrap();

    assert!(completed.is_filled(CanonicalSection::GoodToKnow));
    assert!(!completed.contains(CanonicalSection::LowFodmap));
    assert_eq!(
        completed.get(CanonicalSection::Instructions).unwrap().items(),
        vec!["Boil milk", "Stir in oats"]
    );
    let schema = generator.requests.borrow()[0].response_schema.clone().unwrap();
    assert!(!schema.has("low_fodmap_portion"));
}

#[test]
fn low_fodmap_source_keeps_its_section() {
    let generator = ScriptedGenerator::new(&[r#"{
        "intro": "Overnight oats. So easy.",
        "equipment_must_haves": ["Jar"],
        "equipment_nice_to_haves": ["Scale"],
        "instructions": ["Mix", "Chill overnight"],
        "good_to_know": "Make ahead.",
        "low_fodmap_portion": "Half a cup of oats is low FODMAP.",
        "conclusion": "Enjoy."
    }"#]);
    let config = AssemblyConfig::default();
    let doc = assemble_single_document(&fixture("bare_ingredients"), Some("Oats"), &generator, &config)
        .unwrap();

    let headings: Vec<_> = doc.h2_headings().into_iter().map(|h| h.text).collect();
    assert_eq!(
        headings,
        vec![
            "Equipment",
            "Ingredients",
            "Instructions",
            "Low FODMAP Portion",
            "Good to Know",
            "Final Words"
        ]
    );
    assert!(doc
        .to_markup()
        .contains("<ol class=\"wp-block-list\"><li>Mix</li><li>Chill overnight</li></ol>"));
}

#[test]
fn missing_ingredients_stops_before_generation() {
    let generator = ScriptedGenerator::new(&[]);
    let source = vec![ContentBlock::heading2("Intro"), ContentBlock::paragraph("Hi.")];
    let err = assemble_single_document(&source, Some("T"), &generator, &AssemblyConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::MissingRequiredSection {
            section: CanonicalSection::Ingredients
        }
    ));
    assert!(generator.requests.borrow().is_empty());
}

fn roundup_sources() -> Vec<RoundupSource> {
    vec![
        RoundupSource {
            title: "Lemon Bars".into(),
            link_url: "https://food.example/lemon-bars".into(),
            notes: "Tangy and sweet.".into(),
        },
        RoundupSource {
            title: "Brownies".into(),
            link_url: "https://other.example/brownies".into(),
            notes: "Fudgy.".into(),
        },
        RoundupSource {
            title: "Blondies".into(),
            link_url: String::new(),
            notes: "Buttery.".into(),
        },
    ]
}

const ROUNDUP_REPLY: &str =
    r#"{"title": "Three Bars", "intro": "Bars are fun. Let's bake.", "conclusion": "Pick one."}"#;

#[test]
fn roundup_images_link_back_to_same_site_items() {
    let generator = ScriptedGenerator::new(&[ROUNDUP_REPLY]);
    let config = AssemblyConfig::default().with_site_base_url("https://food.example");
    let doc = assemble_roundup(&roundup_sources(), &generator, &config).unwrap();
    assert_eq!(doc.title, "Three Bars");

    let site = Site::publish(&doc);
    let uploader = CountingUploader::default();
    let featured = RecordingFeatured::default();
    let placer = ImagePlacer {
        uploader: &uploader,
        featured: &featured,
        headings: &site,
        mutator: &site,
        config: &config,
    };
    let paths = [PathBuf::from("2.jpg"), PathBuf::from("1.jpg")];
    let placement = placer
        .place(4, Some("Three Bars"), &paths, PlacementMode::Roundup)
        .unwrap()
        .unwrap();

    assert!(featured.0.borrow().is_empty());
    assert_eq!(
        placement.media[0].link_url.as_deref(),
        Some("https://food.example/lemon-bars")
    );
    assert_eq!(placement.media[1].link_url, None);

    let body = site.body();
    let lemon = body.find_heading(|t| t == "Lemon Bars").unwrap();
    assert!(body.fragments()[lemon + 1]
        .markup
        .contains("<a href=\"https://food.example/lemon-bars\"><img"));
    let brownies = body.find_heading(|t| t == "Brownies").unwrap();
    assert!(body.fragments()[brownies + 1].markup.contains("wp-image-102"));
}

#[test]
fn roundup_with_more_images_than_headings_is_rejected() {
    let mut doc = RenderedDocument::new("Bars");
    for title in ["A", "B", "C"] {
        doc.push(post_assembly::render::Fragment::heading(2, title));
    }
    let site = Site::publish(&doc);
    let before = site.markup.borrow().clone();
    let uploader = CountingUploader::default();
    let config = AssemblyConfig::default();
    let placer = ImagePlacer {
        uploader: &uploader,
        featured: &RecordingFeatured::default(),
        headings: &site,
        mutator: &site,
        config: &config,
    };
    let paths: Vec<_> = ["1.jpg", "2.jpg", "3.jpg", "4.jpg"].iter().map(PathBuf::from).collect();

    let err = placer.place(4, None, &paths, PlacementMode::Roundup).unwrap_err();
    assert!(err.to_string().contains("More images (4) than H2 headings (3)"));
    assert!(uploader.0.lock().unwrap().is_empty());
    assert_eq!(*site.markup.borrow(), before);
}

#[test]
fn empty_roundup_is_rejected() {
    let generator = ScriptedGenerator::new(&[ROUNDUP_REPLY]);
    let err = assemble_roundup(&[], &generator, &AssemblyConfig::default()).unwrap_err();
    assert!(matches!(err, AssemblyError::NoRoundupItems));
}

#[test]
fn collaborator_failures_propagate() {
    let generator = ScriptedGenerator::new(&[]);
    let err = assemble_roundup(&roundup_sources(), &generator, &AssemblyConfig::default())
        .unwrap_err();
    assert!(matches!(err, AssemblyError::Collaborator(_)));
    assert_eq!(err.to_string(), "no scripted reply left");
}
