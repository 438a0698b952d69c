//! In-place rewriting of a [`Collection`] into the shape of the combined
//! document.
//!
//! Heading levels are shifted to match where each file sits in the summary,
//! links between collected files are pointed at the new anchors, and TOC
//! entries are turned into links to the headings they produced.

use std::collections::HashMap;

use comrak::nodes::{AstNode, NodeLink, NodeValue};

use crate::{
  collect::{
    Collection,
    EmbedItem,
    FileItem,
    FileTarget,
    GroupItem,
    Heading,
    MarkdownItem,
    MarkdownSection,
  },
  markdown::{self, Arena, new_node},
  paths,
  rawhtml,
  reference::Reference,
  toc,
  tree,
};

/// Deepest heading level Markdown can express.
const MAX_HEADING_LEVEL: i32 = 6;

/// Rewrites collected sections in place.
pub struct Transformer<'a, 'f> {
  arena:          &'a Arena<'a>,
  files:          &'f HashMap<String, FileTarget>,
  /// Slash path from the output file's directory to the input directory.
  input_rel_path: String,
  /// Flat offset applied to every heading.
  offset:         i32,
  /// Offset of the section being transformed.
  section_offset: i32,
}

impl<'a, 'f> Transformer<'a, 'f> {
  #[must_use]
  pub fn new(arena: &'a Arena<'a>, files: &'f HashMap<String, FileTarget>) -> Self {
    Self {
      arena,
      files,
      input_rel_path: ".".to_owned(),
      offset: 0,
      section_offset: 0,
    }
  }

  #[must_use]
  pub const fn with_offset(mut self, offset: i32) -> Self {
    self.offset = offset;
    self
  }

  #[must_use]
  pub fn with_input_rel_path(mut self, path: impl Into<String>) -> Self {
    self.input_rel_path = path.into();
    self
  }

  /// Transforms every section in order.
  pub fn transform(&mut self, sections: &mut [MarkdownSection<'a>]) {
    for section in sections {
      self.transform_section(section);
    }
  }

  fn transform_section(&mut self, section: &mut MarkdownSection<'a>) {
    let mut offset = self.offset;
    if let Some(title) = &mut section.title {
      offset += i32::from(title.level);
      let level = clamp_level(offset);
      title.level = level;
      set_heading_level(title.ast, level);
    }
    self.section_offset = offset;

    let this = &*self;
    tree::visit_mut(&mut section.items, &mut |item| this.transform_item(item));
  }

  fn transform_item(&self, item: &mut MarkdownItem<'a>) {
    match item {
      MarkdownItem::File(file) => self.transform_file(file),
      MarkdownItem::Group(group) => self.transform_group(group),
      MarkdownItem::ExternalLink(_) => {},
      MarkdownItem::Embed(embed) => self.transform_embed(embed),
    }
  }

  fn transform_group(&self, group: &mut GroupItem<'a>) {
    self.transform_heading(&mut group.heading, group.item.depth);

    // "Foo" in the TOC becomes "[Foo](#foo)".
    let text = group.item.ast;
    let link = self.anchor_link(&group.heading.id);
    text.insert_before(link);
    link.append(text);
  }

  fn transform_file(&self, file: &mut FileItem<'a>) {
    let depth = file.item.depth;
    self.transform_heading(&mut file.title, depth);
    for heading in &mut file.headings {
      self.transform_heading(heading, depth);
    }

    self.rewrite_destination(&file.link_dir, file.item.ast);

    let from = paths::dirname(&file.path);
    for &node in file.links.iter().chain(&file.images) {
      self.rewrite_destination(&from, node);
    }

    let mut resolve = |url: &str| self.resolve_url(&from, url);
    for pair in &file.html.pairs {
      rawhtml::rewrite_pair(pair, &mut resolve);
    }
    for &node in &file.html.inline {
      rawhtml::rewrite_inline(node, &mut resolve);
    }
    for &node in &file.html.blocks {
      rawhtml::rewrite_block(node, &mut resolve);
    }

    if file.absorb && !file.headings.is_empty() {
      let li = toc_list_item(file.item.ast, &file.path);
      let style = match li.data.borrow().value {
        NodeValue::Item(style) => style,
        _ => Default::default(),
      };
      if let Some(list) = toc::render_list(self.arena, style, &file.toc) {
        li.append(list);
      }
    }

    file.document.root.prepend(file.title.node);
  }

  fn transform_embed(&self, embed: &mut EmbedItem<'a>) {
    let depth = embed.item.depth;
    Transformer {
      arena:          self.arena,
      files:          self.files,
      input_rel_path: self.input_rel_path.clone(),
      offset:         self.section_offset + to_level(depth) + 1,
      section_offset: 0,
    }
    .transform_section(&mut embed.section);

    self.transform_heading(&mut embed.heading, depth);

    // "![Foo](foo.md)" in the TOC becomes "[Foo](#foo)".
    let image = embed.item.ast;
    let link = self.anchor_link(&embed.heading.id);
    image.insert_before(link);
    while let Some(child) = image.first_child() {
      link.append(child);
    }
    image.detach();

    // The embedded summary's list nests under this entry.
    toc_list_item(link, &embed.path).append(embed.section.toc);
  }

  /// Moves `heading` to its final level. Headings deeper than Markdown
  /// allows become an anchor followed by bold text.
  fn transform_heading(&self, heading: &mut Heading<'a>, depth: usize) {
    heading.level = (heading.level + to_level(depth) + self.section_offset).max(1);
    if heading.level <= MAX_HEADING_LEVEL {
      set_heading_level(heading.node, clamp_level(heading.level));
      return;
    }

    let node = heading.node;
    let strong = new_node(self.arena, NodeValue::Strong);
    while let Some(child) = node.first_child() {
      strong.append(child);
    }
    node.data.borrow_mut().value = NodeValue::Paragraph;
    node.append(new_node(
      self.arena,
      NodeValue::HtmlInline(format!("<a id=\"{}\"></a> ", heading.id)),
    ));
    node.append(strong);
  }

  fn anchor_link(&self, id: &str) -> &'a AstNode<'a> {
    new_node(
      self.arena,
      NodeValue::Link(
        NodeLink {
          url:   format!("#{id}"),
          title: String::new(),
        }
        .into(),
      ),
    )
  }

  fn rewrite_destination(&self, from_dir: &str, node: &'a AstNode<'a>) {
    let mut ast = node.data.borrow_mut();
    if let NodeValue::Link(link) | NodeValue::Image(link) = &mut ast.value {
      link.url = self.resolve_url(from_dir, &link.url);
    }
  }

  /// Rewrites a destination found in a file under `from_dir`.
  ///
  /// Links to collected files turn into fragments: either the matching
  /// heading's new anchor or the file's title. Other relative paths are
  /// re-rooted at the output location. Absolute URLs and bare fragments are
  /// returned unchanged.
  fn resolve_url(&self, from_dir: &str, dest: &str) -> String {
    let Some(mut reference) = Reference::parse(dest) else {
      return dest.to_owned();
    };
    if reference.path.is_empty() {
      return dest.to_owned();
    }

    let target = paths::join(&[from_dir, &reference.path]);
    let Some(file) = self.files.get(&target) else {
      reference.path = paths::join(&[&self.input_rel_path, &target]);
      log::debug!("{dest:?} is outside the collection, rewritten to {reference}");
      return reference.to_string();
    };

    reference.path.clear();
    match reference.decoded_fragment().filter(|f| !f.is_empty()) {
      Some(fragment) => {
        match file.heading_ids.get(&fragment) {
          Some(id) => reference.fragment = Some(id.clone()),
          None => log::warn!("{dest:?}: no heading {fragment:?} in {target}"),
        }
      },
      None => reference.fragment = Some(file.title_id.clone()),
    }
    reference.to_string()
  }
}

/// Transforms every section of `collection` in place.
pub fn transform<'a>(
  arena: &'a Arena<'a>,
  collection: &mut Collection<'a>,
  offset: i32,
  input_rel_path: &str,
) {
  Transformer::new(arena, &collection.files_by_path)
    .with_offset(offset)
    .with_input_rel_path(input_rel_path)
    .transform(&mut collection.sections);
}

fn to_level(depth: usize) -> i32 {
  i32::try_from(depth).unwrap_or(i32::MAX)
}

fn clamp_level(level: i32) -> u8 {
  u8::try_from(level.clamp(1, MAX_HEADING_LEVEL)).unwrap_or(1)
}

fn set_heading_level<'a>(node: &'a AstNode<'a>, level: u8) {
  if let NodeValue::Heading(heading) = &mut node.data.borrow_mut().value {
    heading.level = level;
  }
}

/// The list item holding a TOC entry.
#[allow(clippy::panic, reason = "TOC entries are always parsed from list items")]
fn toc_list_item<'a>(entry: &'a AstNode<'a>, path: &str) -> &'a AstNode<'a> {
  markdown::ancestor(entry, |value| matches!(value, NodeValue::Item(_)))
    .unwrap_or_else(|| panic!("could not find parent list item for {path:?}"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    collect::collect,
    fs::MemoryReader,
    markdown::{CommonMarkRenderer, Document, Renderer},
    summary::parse_summary,
  };

  fn render<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    CommonMarkRenderer.render(&mut out, node).expect("render");
    out
  }

  fn run<'a>(
    arena: &'a Arena<'a>,
    reader: &MemoryReader,
    summary: &str,
    offset: i32,
  ) -> Collection<'a> {
    let doc = Document::parse(arena, "summary.md", summary);
    let parsed = parse_summary(&doc).expect("valid summary");
    let mut coll = collect(arena, reader, &doc, parsed, Vec::new()).expect("collect");
    transform(arena, &mut coll, offset, "..");
    coll
  }

  fn file<'c, 'a>(items: &'c tree::List<MarkdownItem<'a>>, idx: usize) -> &'c FileItem<'a> {
    match &items[idx].value {
      MarkdownItem::File(file) => file,
      other => panic!("expected a file item, got {other:?}"),
    }
  }

  fn headings<'a>(root: &'a AstNode<'a>) -> Vec<(u8, String)> {
    root
      .descendants()
      .filter_map(|node| {
        match node.data.borrow().value {
          NodeValue::Heading(h) => Some(h.level),
          _ => None,
        }
        .map(|level| (level, markdown::text_content(node)))
      })
      .collect()
  }

  #[test]
  fn levels_follow_title_and_depth() {
    let arena = Arena::new();
    let reader = MemoryReader::new()
      .with_file("a.md", "# A\n\n## Sub\n")
      .with_file("b.md", "# B\n\n## Deep\n");
    let coll = run(&arena, &reader, "# Guide\n\n- [A](a.md)\n    - [B](b.md)\n", 0);

    let section = &coll.sections[0];
    assert_eq!(section.title.as_ref().map(|t| t.level), Some(1));
    let a = file(&section.items, 0);
    assert_eq!(headings(a.document.root), [(2, "A".to_owned()), (3, "Sub".to_owned())]);
    let b = file(&section.items[0].children, 0);
    assert_eq!(headings(b.document.root), [(3, "B".to_owned()), (4, "Deep".to_owned())]);
  }

  #[test]
  fn negative_offset_clamps_to_one() {
    let arena = Arena::new();
    let reader = MemoryReader::new().with_file("a.md", "# A\n\n## Sub\n");
    let coll = run(&arena, &reader, "## Guide\n\n- [A](a.md)\n", -4);

    assert_eq!(coll.sections[0].title.as_ref().map(|t| t.level), Some(1));
    let a = file(&coll.sections[0].items, 0);
    assert_eq!(headings(a.document.root), [(1, "A".to_owned()), (1, "Sub".to_owned())]);
  }

  #[test]
  fn deep_headings_become_anchored_bold_text() {
    let arena = Arena::new();
    let reader = MemoryReader::new().with_file("a.md", "# A\n\n## B\n\n### C *em*\n");
    let coll = run(&arena, &reader, "- [A](a.md)\n", 4);

    let a = file(&coll.sections[0].items, 0);
    assert_eq!(a.headings[1].level, 7);
    let out = render(a.document.root);
    assert!(out.contains("##### A"), "{out}");
    assert!(out.contains("###### B"), "{out}");
    assert!(out.contains("<a id=\"c-em\"></a> **C *em***"), "{out}");
  }

  #[test]
  fn links_between_files_become_anchors() {
    let arena = Arena::new();
    let reader = MemoryReader::new()
      .with_file(
        "docs/a.md",
        "# A\n\n## Setup\n\n[b](b.md) [sec](b.md#setup) [gone](b.md#nope) [img](../img.png) [web](https://example.com/b.md)\n\n![pic](pic.png)\n",
      )
      .with_file("docs/b.md", "# B\n\n## Setup\n");
    let coll = run(&arena, &reader, "- [A](docs/a.md)\n- [B](docs/b.md)\n", 0);

    let out = render(file(&coll.sections[0].items, 0).document.root);
    assert!(out.contains("[b](#b)"), "{out}");
    assert!(out.contains("[sec](#setup-1)"), "{out}");
    assert!(out.contains("[gone](#nope)"), "{out}");
    assert!(out.contains("[img](../img.png)"), "{out}");
    assert!(out.contains("[web](https://example.com/b.md)"), "{out}");
    assert!(out.contains("![pic](../docs/pic.png)"), "{out}");

    let toc = render(coll.sections[0].toc);
    assert!(toc.contains("[A](#a)"), "{toc}");
    assert!(toc.contains("[B](#b)"), "{toc}");
  }

  #[test]
  fn bare_fragment_links_are_not_remapped() {
    let arena = Arena::new();
    let reader = MemoryReader::new()
      .with_file("a.md", "# A\n\n## Intro\n")
      .with_file("b.md", "# B\n\n## Intro\n\nsee [intro](#intro)\n");
    let coll = run(&arena, &reader, "- [A](a.md)\n- [B](b.md)\n", 0);

    let b = file(&coll.sections[0].items, 1);
    assert_eq!(b.headings[0].id, "intro-1");
    let out = render(b.document.root);
    assert!(out.contains("[intro](#intro)"), "{out}");
  }

  #[test]
  fn raw_html_links_are_rewritten() {
    let arena = Arena::new();
    let reader = MemoryReader::new()
      .with_file(
        "a.md",
        "# A\n\nsee <a href=\"b.md\">b</a> here\n\n<div>\n<img src=\"logo.png\">\n</div>\n",
      )
      .with_file("b.md", "# B\n");
    let coll = run(&arena, &reader, "- [A](a.md)\n- [B](b.md)\n", 0);

    let out = render(file(&coll.sections[0].items, 0).document.root);
    assert!(out.contains("<a href=\"#b\">b</a>"), "{out}");
    assert!(out.contains("src=\"../logo.png\""), "{out}");
  }

  #[test]
  fn group_entries_link_to_their_heading() {
    let arena = Arena::new();
    let reader = MemoryReader::new().with_file("foo.md", "# Foo\n\n## Bar\n");
    let coll = run(&arena, &reader, "- Section Label\n    - [foo](foo.md)\n", 0);

    let MarkdownItem::Group(group) = &coll.sections[0].items[0].value else {
      panic!("expected a group");
    };
    assert_eq!(render(group.heading.node), "# Section Label\n");
    let toc = render(coll.sections[0].toc);
    assert!(toc.contains("[Section Label](#section-label)"), "{toc}");

    let foo = file(&coll.sections[0].items[0].children, 0);
    assert_eq!(headings(foo.document.root), [(2, "Foo".to_owned()), (3, "Bar".to_owned())]);
  }

  #[test]
  fn absorbed_headings_join_the_toc() {
    let arena = Arena::new();
    let reader = MemoryReader::new().with_file(
      "a.md",
      "---\nabsorb: true\n---\n\n# A\n\n## One\n\n### Nested\n\n## Two\n",
    );
    let coll = run(&arena, &reader, "- [A](a.md)\n", 0);

    let toc = render(coll.sections[0].toc);
    let lines: Vec<_> = toc.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines, [
      "- [A](#a)",
      "  - [One](#one)",
      "    - [Nested](#nested)",
      "  - [Two](#two)",
    ]);
  }

  #[test]
  fn embeds_link_to_heading_and_nest_their_toc() {
    let arena = Arena::new();
    let reader = MemoryReader::new()
      .with_file("intro.md", "# Intro\n")
      .with_file("api/summary.md", "# API\n\n- [Client](client.md)\n")
      .with_file("api/client.md", "# Client\n\n## Usage\n");
    let coll = run(&arena, &reader, "- [Intro](intro.md)\n- ![API](api/summary.md)\n", 0);

    let MarkdownItem::Embed(embed) = &coll.sections[0].items[1].value else {
      panic!("expected an embed");
    };
    assert_eq!(render(embed.heading.node), "# API\n");
    let client = file(&embed.section.items, 0);
    assert_eq!(headings(client.document.root), [
      (2, "Client".to_owned()),
      (3, "Usage".to_owned()),
    ]);

    let toc = render(coll.sections[0].toc);
    assert!(toc.contains("- [API](#api)"), "{toc}");
    assert!(
      toc
        .lines()
        .any(|l| l.starts_with(' ') && l.trim_start() == "- [Client](#client)"),
      "{toc}"
    );
  }
}
