//! Loading and analysis of every file a summary refers to.
//!
//! The collector walks the items of a parsed [`Summary`], reads each linked
//! Markdown file, records the nodes the transformer will rewrite later
//! (links, images, headings and raw HTML), picks or synthesizes the file's
//! title, and recursively collects embedded summaries.

use std::collections::HashMap;

use comrak::nodes::{AstNode, NodeHeading, NodeValue};
use thiserror::Error;

use crate::{
  error::FsError,
  frontmatter::FrontMatter,
  fs::FileReader,
  header::IdGenerator,
  markdown::{self, Arena, Document, new_node},
  paths,
  pos::{Diagnostics, ErrorList, Position},
  rawhtml::{self, HtmlNodes},
  summary::{self, Item, Summary, parse_summary},
  toc::{self, OutlineHeading, TocItem},
  tree,
};

/// Everything collected for one summary.
#[derive(Debug)]
pub struct Collection<'a> {
  pub sections:      Vec<MarkdownSection<'a>>,
  /// Anchor information for every collected file, keyed by its path
  /// relative to the reader root. Includes files reached through embeds.
  pub files_by_path: HashMap<String, FileTarget>,
}

/// What other files need to know to link into a collected file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTarget {
  /// Final anchor of the file's title.
  pub title_id:    String,
  /// Final anchor for each heading, keyed by the anchor the heading would
  /// have if the file were rendered on its own.
  pub heading_ids: HashMap<String, String>,
}

/// A section of the summary with its items collected.
#[derive(Debug)]
pub struct MarkdownSection<'a> {
  pub title: Option<summary::SectionTitle<'a>>,
  /// The section's list in the summary document.
  pub toc:   &'a AstNode<'a>,
  pub items: tree::List<MarkdownItem<'a>>,
}

#[derive(Debug)]
pub enum MarkdownItem<'a> {
  File(Box<FileItem<'a>>),
  Group(GroupItem<'a>),
  ExternalLink(ExternalLinkItem<'a>),
  Embed(Box<EmbedItem<'a>>),
}

impl MarkdownItem<'_> {
  #[must_use]
  pub const fn depth(&self) -> usize {
    match self {
      Self::File(file) => file.item.depth,
      Self::Group(group) => group.item.depth,
      Self::ExternalLink(link) => link.item.depth,
      Self::Embed(embed) => embed.item.depth,
    }
  }
}

/// A heading tracked through transformation.
#[derive(Debug)]
pub struct Heading<'a> {
  pub node:   &'a AstNode<'a>,
  /// Anchor in the combined document.
  pub id:     String,
  /// Level before any offset is applied. Starts at 1 for titles.
  pub level:  i32,
  /// Anchor the heading has in its own file, if it came from one.
  pub old_id: Option<String>,
}

/// A Markdown file linked from the summary.
#[derive(Debug)]
pub struct FileItem<'a> {
  /// Path relative to the reader root.
  pub path:     String,
  /// Directory the summary link was written relative to.
  pub link_dir: String,
  pub item:     summary::LinkItem<'a>,
  pub document: Document<'a>,
  /// Existing level 1 heading hoisted out of the body, or one synthesized
  /// from the link text. Detached from the document until transformed.
  pub title:    Heading<'a>,
  /// Headings left in the body, in document order.
  pub headings: Vec<Heading<'a>>,
  pub links:    Vec<&'a AstNode<'a>>,
  pub images:   Vec<&'a AstNode<'a>>,
  pub html:     HtmlNodes<'a>,
  /// Splice the body's heading outline into the summary list.
  pub absorb:   bool,
  pub toc:      Vec<TocItem>,
}

/// A plain text summary entry, rendered as a heading.
#[derive(Debug)]
pub struct GroupItem<'a> {
  pub item:    summary::TextItem<'a>,
  pub heading: Heading<'a>,
}

/// A summary link to an absolute URL. Only rendered in the TOC.
#[derive(Debug)]
pub struct ExternalLinkItem<'a> {
  pub item: summary::LinkItem<'a>,
}

/// Another summary spliced in at this point.
#[derive(Debug)]
pub struct EmbedItem<'a> {
  pub item:     summary::EmbedItem<'a>,
  /// Path of the embedded summary relative to the reader root.
  pub path:     String,
  pub heading:  Heading<'a>,
  /// The embedded summary's only section. Its title, if any, became
  /// `heading`.
  pub section:  MarkdownSection<'a>,
  pub document: Document<'a>,
}

#[derive(Debug, Error)]
enum ItemError {
  #[error(transparent)]
  Read(#[from] FsError),

  #[error("bad frontmatter: {0}")]
  FrontMatter(#[from] serde_yaml::Error),

  #[error("external link cannot have children")]
  ExternalWithChildren,

  #[error("embed cycle: {}", .0.join(" -> "))]
  EmbedCycle(Vec<String>),

  #[error("{0}")]
  Nested(#[from] Diagnostics),

  #[error("no sections found")]
  NoSections,

  #[error("{0}:unexpected section; expected only one section")]
  ExtraSection(Position),
}

/// Collects every file referenced by `summary`.
///
/// `stack` lists summaries already being collected, normally just the path
/// of `doc` itself if it lives under the reader root; embeds that lead back
/// to any of them are reported as cycles.
///
/// # Errors
///
/// Returns all item errors, positioned in `doc` and sorted.
pub fn collect<'a>(
  arena: &'a Arena<'a>,
  reader: &dyn FileReader,
  doc: &Document<'a>,
  summary: Summary<'a>,
  stack: Vec<String>,
) -> Result<Collection<'a>, Diagnostics> {
  let mut ids = IdGenerator::new();
  let mut files = HashMap::new();
  let sections = Collector::new(arena, reader, &mut ids, &mut files)
    .with_stack(stack)
    .collect(doc, summary)?;

  Ok(Collection {
    sections,
    files_by_path: files,
  })
}

/// Collection state for one summary document. Embedded summaries get their
/// own collector sharing the ID generator and file map.
pub struct Collector<'a, 'c> {
  arena:  &'a Arena<'a>,
  reader: &'c dyn FileReader,
  ids:    &'c mut IdGenerator,
  files:  &'c mut HashMap<String, FileTarget>,
  /// Directory links in the summary are relative to.
  dir:    String,
  stack:  Vec<String>,
}

impl<'a, 'c> Collector<'a, 'c> {
  #[must_use]
  pub fn new(
    arena: &'a Arena<'a>,
    reader: &'c dyn FileReader,
    ids: &'c mut IdGenerator,
    files: &'c mut HashMap<String, FileTarget>,
  ) -> Self {
    Self {
      arena,
      reader,
      ids,
      files,
      dir: ".".to_owned(),
      stack: Vec::new(),
    }
  }

  /// Resolves summary links relative to `dir` instead of the reader root.
  #[must_use]
  pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
    self.dir = dir.into();
    self
  }

  #[must_use]
  pub fn with_stack(mut self, stack: Vec<String>) -> Self {
    self.stack = stack;
    self
  }

  /// Collects every section of `summary`, which was parsed from `doc`.
  ///
  /// # Errors
  ///
  /// Returns every item error, positioned in `doc`.
  pub fn collect(
    &mut self,
    doc: &Document<'a>,
    summary: Summary<'a>,
  ) -> Result<Vec<MarkdownSection<'a>>, Diagnostics> {
    let mut errs = ErrorList::new(&doc.info);
    let sections: Vec<_> = summary
      .sections
      .into_iter()
      .filter_map(|section| self.collect_section(doc, &mut errs, section))
      .collect();
    errs.into_result()?;
    Ok(sections)
  }

  fn collect_section(
    &mut self,
    doc: &Document<'a>,
    errs: &mut ErrorList<'_>,
    section: summary::Section<'a>,
  ) -> Option<MarkdownSection<'a>> {
    let items = tree::transform(&section.items, &mut |cursor| {
      let item = cursor.value();
      match self.collect_item(item, cursor.child_count()) {
        Ok(collected) => Some(collected),
        Err(err) => {
          errs.push(doc.offset_of(item.ast()), err);
          None
        },
      }
    });

    // Any hole was reported above.
    Some(MarkdownSection {
      title: section.title,
      toc:   section.ast,
      items: tree::transpose(items)?,
    })
  }

  fn collect_item(
    &mut self,
    item: &Item<'a>,
    child_count: usize,
  ) -> Result<MarkdownItem<'a>, ItemError> {
    match item {
      Item::Link(link) if is_external(&link.target) => {
        if child_count > 0 {
          return Err(ItemError::ExternalWithChildren);
        }
        Ok(MarkdownItem::ExternalLink(ExternalLinkItem { item: link.clone() }))
      },
      Item::Link(link) => {
        Ok(MarkdownItem::File(Box::new(self.collect_file(link)?)))
      },
      Item::Text(text) => Ok(MarkdownItem::Group(self.collect_group(text))),
      Item::Embed(embed) => {
        Ok(MarkdownItem::Embed(Box::new(self.collect_embed(embed)?)))
      },
    }
  }

  fn read(&self, path: &str) -> Result<String, FsError> {
    log::debug!("Collecting {path}");
    self.reader.read_file(path)
  }

  fn collect_file(
    &mut self,
    link: &summary::LinkItem<'a>,
  ) -> Result<FileItem<'a>, ItemError> {
    let path = paths::join(&[&self.dir, &link.target]);
    let source = self.read(&path)?;
    let document = Document::parse(self.arena, path.clone(), &source);

    let front_matter = match &document.front_matter {
      Some(raw) => FrontMatter::parse(raw)?,
      None => FrontMatter::default(),
    };

    let mut file_ids = IdGenerator::new();
    let mut links = Vec::new();
    let mut images = Vec::new();
    let mut headings = Vec::new();
    let mut heading_ids = HashMap::new();
    for node in document.root.descendants() {
      let level = match &node.data.borrow().value {
        NodeValue::Link(_) => {
          links.push(node);
          continue;
        },
        NodeValue::Image(_) => {
          images.push(node);
          continue;
        },
        NodeValue::Heading(heading) => heading.level,
        _ => continue,
      };

      let text = markdown::text_content(node);
      let (id, _) = self.ids.generate_id(&text);
      let (old_id, _) = file_ids.generate_id(&text);
      heading_ids.insert(old_id.clone(), id.clone());
      headings.push(Heading {
        node,
        id,
        level: i32::from(level),
        old_id: Some(old_id),
      });
    }

    let h1s: Vec<usize> = headings
      .iter()
      .enumerate()
      .filter(|(_, h)| h.level == 1)
      .map(|(idx, _)| idx)
      .collect();
    let first_child = document.root.first_child();
    let hoist = match h1s.as_slice() {
      [idx] => first_child.is_some_and(|first| std::ptr::eq(first, headings[*idx].node)),
      _ => false,
    };

    let title = if hoist {
      let title = headings.remove(h1s[0]);
      title.node.detach();
      title
    } else {
      // Make room for the synthesized title.
      if !h1s.is_empty() {
        for heading in &mut headings {
          heading.level += 1;
        }
      }
      let (id, _) = self.ids.generate_id(&link.text);
      Heading {
        node: self.synthesize_heading(&link.text),
        id,
        level: 1,
        old_id: None,
      }
    };

    let toc = if front_matter.absorb {
      let texts: Vec<String> = headings
        .iter()
        .map(|h| markdown::text_content(h.node))
        .collect();
      toc::inspect(headings.iter().zip(&texts).map(|(h, text)| {
        OutlineHeading {
          level: h.level,
          title: text,
          id:    &h.id,
        }
      }))
    } else {
      Vec::new()
    };

    self.files.insert(path.clone(), FileTarget {
      title_id: title.id.clone(),
      heading_ids,
    });

    let html = rawhtml::collect(document.root);
    Ok(FileItem {
      path,
      link_dir: self.dir.clone(),
      item: link.clone(),
      document,
      title,
      headings,
      links,
      images,
      html,
      absorb: front_matter.absorb,
      toc,
    })
  }

  fn synthesize_heading(&self, text: &str) -> &'a AstNode<'a> {
    let heading = new_node(
      self.arena,
      NodeValue::Heading(NodeHeading {
        level: 1,
        setext: false,
        ..Default::default()
      }),
    );
    heading.append(new_node(
      self.arena,
      NodeValue::Text(text.to_owned().into()),
    ));
    heading
  }

  fn collect_group(&mut self, text: &summary::TextItem<'a>) -> GroupItem<'a> {
    let (id, _) = self.ids.generate_id(&text.text);
    GroupItem {
      item:    text.clone(),
      heading: Heading {
        node: self.synthesize_heading(&text.text),
        id,
        level: 1,
        old_id: None,
      },
    }
  }

  fn collect_embed(
    &mut self,
    embed: &summary::EmbedItem<'a>,
  ) -> Result<EmbedItem<'a>, ItemError> {
    let path = paths::join(&[&self.dir, &embed.target]);
    if self.stack.contains(&path) {
      let mut chain = self.stack.clone();
      chain.push(path);
      return Err(ItemError::EmbedCycle(chain));
    }

    let source = self.read(&path)?;
    let document = Document::parse(self.arena, path.clone(), &source);
    let summary = parse_summary(&document)?;

    let mut stack = self.stack.clone();
    stack.push(path.clone());
    let mut sections = Collector::new(self.arena, self.reader, self.ids, self.files)
      .with_dir(paths::dirname(&path))
      .with_stack(stack)
      .collect(&document, summary)?
      .into_iter();

    // Every section is collected before the count is checked, so problems
    // inside the embedded files are reported first.
    let mut section = sections.next().ok_or(ItemError::NoSections)?;
    if let Some(extra) = sections.next() {
      let node = extra.title.as_ref().map_or(extra.toc, |title| title.ast);
      let position = document.info.position(document.offset_of(node));
      return Err(ItemError::ExtraSection(position));
    }

    // The embed's depth decides the heading level, not the summary's own
    // title level.
    let heading = match section.title.take() {
      Some(title) => {
        let (id, _) = self.ids.generate_id(&title.text);
        Heading {
          node: title.ast,
          id,
          level: 1,
          old_id: None,
        }
      },
      None => {
        let (id, _) = self.ids.generate_id(&embed.text);
        Heading {
          node: self.synthesize_heading(&embed.text),
          id,
          level: 1,
          old_id: None,
        }
      },
    };

    Ok(EmbedItem {
      item: embed.clone(),
      path,
      heading,
      section,
      document,
    })
  }
}

fn is_external(target: &str) -> bool {
  target.starts_with("//")
    || url::Url::parse(target).is_ok_and(|url| url.host().is_some())
}
