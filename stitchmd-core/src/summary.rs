//! Parser for the summary document: the table of contents that drives a
//! stitching run.
//!
//! A summary is one or more sections. Each section is an optional heading
//! followed by a bulleted list:
//!
//! ```markdown
//! # User Guide
//!
//! - [Getting Started](getting-started.md)
//!     - [Installation](installation.md)
//! - Options
//!     - [foo](foo.md)
//! - ![Reference](reference/summary.md)
//!
//! # Appendix
//!
//! - [FAQ](faq.md)
//! ```
//!
//! Links become [`LinkItem`]s, images become [`EmbedItem`]s that splice in
//! another summary, and plain text becomes a [`TextItem`] grouping label.

use comrak::nodes::{AstNode, NodeValue};

use crate::{
  markdown::{self, Document},
  paths,
  pos::{Diagnostics, ErrorList},
  tree,
};

/// A parsed summary document.
#[derive(Debug)]
pub struct Summary<'a> {
  pub sections: Vec<Section<'a>>,
}

/// One optional title plus list block of a summary.
#[derive(Debug)]
pub struct Section<'a> {
  pub title: Option<SectionTitle<'a>>,
  /// Items mirroring the nesting of the list.
  pub items: tree::List<Item<'a>>,
  /// The list this section was built from.
  pub ast:   &'a AstNode<'a>,
}

#[derive(Debug, Clone)]
pub struct SectionTitle<'a> {
  pub text:  String,
  pub level: u8,
  pub ast:   &'a AstNode<'a>,
}

/// A single entry of a section's list.
#[derive(Debug, Clone)]
pub enum Item<'a> {
  Link(LinkItem<'a>),
  Text(TextItem<'a>),
  Embed(EmbedItem<'a>),
}

impl<'a> Item<'a> {
  /// Nesting depth of the item, zero for top-level entries.
  #[must_use]
  pub const fn depth(&self) -> usize {
    match self {
      Self::Link(item) => item.depth,
      Self::Text(item) => item.depth,
      Self::Embed(item) => item.depth,
    }
  }

  /// Node the item was built from, for position reporting.
  #[must_use]
  pub const fn ast(&self) -> &'a AstNode<'a> {
    match self {
      Self::Link(item) => item.ast,
      Self::Text(item) => item.ast,
      Self::Embed(item) => item.ast,
    }
  }
}

/// `[Text](target)`
#[derive(Debug, Clone)]
pub struct LinkItem<'a> {
  pub text:   String,
  /// Link destination in slash form.
  pub target: String,
  pub depth:  usize,
  pub ast:    &'a AstNode<'a>,
}

/// A plain text label grouping the nested items under it.
#[derive(Debug, Clone)]
pub struct TextItem<'a> {
  pub text:  String,
  pub depth: usize,
  pub ast:   &'a AstNode<'a>,
}

/// `![Text](other-summary.md)`
#[derive(Debug, Clone)]
pub struct EmbedItem<'a> {
  pub text:   String,
  pub target: String,
  pub depth:  usize,
  pub ast:    &'a AstNode<'a>,
}

/// Parses the sections of a summary document.
///
/// Malformed entries are reported and skipped so that every problem in the
/// document surfaces in one run.
///
/// # Errors
///
/// Returns every structural problem found, sorted by position, including
/// `no sections found` for a document without any section.
pub fn parse_summary<'a>(doc: &Document<'a>) -> Result<Summary<'a>, Diagnostics> {
  let mut parser = SummaryParser {
    doc,
    errs: ErrorList::new(&doc.info),
  };

  let mut sections = Vec::new();
  let mut cur = doc.root.first_child();
  while let Some(node) = cur {
    let (section, next) = parser.parse_section(node);
    sections.extend(section);
    cur = next;
  }

  if sections.is_empty() && parser.errs.is_empty() {
    parser.errs.push(0, "no sections found");
  }
  parser.errs.into_result()?;
  Ok(Summary { sections })
}

struct SummaryParser<'d, 'a> {
  doc:  &'d Document<'a>,
  errs: ErrorList<'d>,
}

impl<'a> SummaryParser<'_, 'a> {
  fn parse_section(
    &mut self,
    node: &'a AstNode<'a>,
  ) -> (Option<Section<'a>>, Option<&'a AstNode<'a>>) {
    let title = self.parse_section_title(node);
    let node = if title.is_some() {
      match node.next_sibling() {
        Some(next) => next,
        None => {
          self
            .errs
            .push(self.doc.offset_of(node), "expected a list, got end of document");
          return (None, None);
        },
      }
    } else {
      node
    };

    if !matches!(node.data.borrow().value, NodeValue::List(_)) {
      let kind = markdown::kind_name(node);
      let offset = self.doc.offset_of(node);
      if title.is_some() {
        self.errs.push(offset, format!("expected a list, got {kind}"));
      } else {
        self
          .errs
          .push(offset, format!("expected a list or heading, got {kind}"));
      }
      return (None, node.next_sibling());
    }

    let items = ItemParser {
      doc:   self.doc,
      errs:  &mut self.errs,
      depth: 0,
    }
    .parse_list(node);

    (
      Some(Section {
        title,
        items,
        ast: node,
      }),
      node.next_sibling(),
    )
  }

  fn parse_section_title(&self, node: &'a AstNode<'a>) -> Option<SectionTitle<'a>> {
    let level = match node.data.borrow().value {
      NodeValue::Heading(heading) => heading.level,
      _ => return None,
    };
    Some(SectionTitle {
      text: markdown::text_content(node),
      level,
      ast: node,
    })
  }
}

/// Recursive-descent parser over one level of nested list items.
struct ItemParser<'p, 'd, 'a> {
  doc:   &'d Document<'a>,
  errs:  &'p mut ErrorList<'d>,
  depth: usize,
}

impl<'a> ItemParser<'_, '_, 'a> {
  fn parse_list(&mut self, list: &'a AstNode<'a>) -> tree::List<Item<'a>> {
    let mut items = Vec::new();
    for child in list.children() {
      if !matches!(child.data.borrow().value, NodeValue::Item(_)) {
        // Only hand-built trees can put anything else in a list.
        let kind = markdown::kind_name(child);
        self.push(child, format!("expected a list item, got {kind}"));
        continue;
      }
      items.extend(self.parse_item(child));
    }
    items
  }

  fn push(&mut self, node: &'a AstNode<'a>, msg: impl std::fmt::Display) {
    let offset = self.doc.offset_of(node);
    self.errs.push(offset, msg);
  }

  fn parse_item(&mut self, li: &'a AstNode<'a>) -> Option<tree::Node<Item<'a>>> {
    let children: Vec<_> = li.children().collect();
    let (block, sublist) = match children.as_slice() {
      [] => {
        self.push(li, "list item is empty");
        return None;
      },
      [block] => (*block, None),
      [block, sublist] => {
        if !matches!(sublist.data.borrow().value, NodeValue::List(_)) {
          let kind = markdown::kind_name(sublist);
          self.push(sublist, format!("expected a list, got {kind}"));
          return None;
        }
        (*block, Some(*sublist))
      },
      [first, ..] => {
        let kinds: Vec<_> = children.iter().map(|c| markdown::kind_name(c)).collect();
        self.push(
          first,
          format!(
            "list item has too many children ({}): [{}]",
            children.len(),
            kinds.join(" ")
          ),
        );
        return None;
      },
    };

    if !matches!(block.data.borrow().value, NodeValue::Paragraph) {
      let kind = markdown::kind_name(block);
      self.push(block, format!("expected text or paragraph, got {kind}"));
      return None;
    }

    markdown::combine_adjacent_texts(block);
    let inlines: Vec<_> = block.children().collect();
    let inline = match inlines.as_slice() {
      [] => {
        self.push(block, "list item is empty");
        return None;
      },
      [inline] => *inline,
      _ => {
        let kinds: Vec<_> = inlines.iter().map(|c| markdown::kind_name(c)).collect();
        self.push(
          block,
          format!(
            "text has too many children ({}): [{}]",
            inlines.len(),
            kinds.join(" ")
          ),
        );
        return None;
      },
    };

    let item = self.parse_inline(inline, sublist.is_some())?;
    let children = sublist.map_or_else(Vec::new, |list| {
      ItemParser {
        doc:   self.doc,
        errs:  &mut *self.errs,
        depth: self.depth + 1,
      }
      .parse_list(list)
    });
    Some(tree::Node::with_children(item, children))
  }

  fn parse_inline(
    &mut self,
    node: &'a AstNode<'a>,
    has_children: bool,
  ) -> Option<Item<'a>> {
    let value = node.data.borrow().value.clone();
    match value {
      NodeValue::Link(link) => {
        Some(Item::Link(LinkItem {
          text:   markdown::text_content(node),
          target: paths::to_slash(&link.url),
          depth:  self.depth,
          ast:    node,
        }))
      },
      NodeValue::Image(link) => {
        if has_children {
          self.push(node, "embed cannot have children");
          return None;
        }
        Some(Item::Embed(EmbedItem {
          text:   markdown::text_content(node),
          target: paths::to_slash(&link.url),
          depth:  self.depth,
          ast:    node,
        }))
      },
      NodeValue::Text(text) => {
        if !has_children {
          self.push(node, "text item must have children");
          return None;
        }
        Some(Item::Text(TextItem {
          text:  text.to_string(),
          depth: self.depth,
          ast:   node,
        }))
      },
      _ => {
        let kind = markdown::kind_name(node);
        self.push(node, format!("expected a link or text, got {kind}"));
        None
      },
    }
  }
}
