//! Rendering of transformed sections into the final Markdown text.

use comrak::nodes::AstNode;

use crate::{
  collect::{MarkdownItem, MarkdownSection},
  error::RenderError,
  markdown::Renderer,
  tree,
};

/// Writes sections as a sequence of blocks separated by one blank line.
pub struct Generator<'o, R> {
  renderer: R,
  out:      &'o mut String,
  no_toc:   bool,
  /// Blocks written so far.
  blocks:   usize,
}

impl<'o, R: Renderer> Generator<'o, R> {
  pub const fn new(renderer: R, out: &'o mut String) -> Self {
    Self {
      renderer,
      out,
      no_toc: false,
      blocks: 0,
    }
  }

  /// Skips the TOC list of every section.
  #[must_use]
  pub const fn no_toc(mut self, no_toc: bool) -> Self {
    self.no_toc = no_toc;
    self
  }

  /// Writes `preface` verbatim.
  pub fn preface(&mut self, preface: &str) {
    self.out.push_str(preface);
  }

  /// Renders every section in order.
  ///
  /// # Errors
  ///
  /// Returns the first error reported by the renderer.
  pub fn generate<'a>(&mut self, sections: &[MarkdownSection<'a>]) -> Result<(), RenderError> {
    for section in sections {
      self.section(section)?;
    }
    Ok(())
  }

  fn section<'a>(&mut self, section: &MarkdownSection<'a>) -> Result<(), RenderError> {
    if let Some(title) = &section.title {
      self.block(title.ast)?;
    }
    if !self.no_toc {
      self.block(section.toc)?;
    }
    self.items(&section.items)
  }

  fn items<'a>(&mut self, items: &[tree::Node<MarkdownItem<'a>>]) -> Result<(), RenderError> {
    tree::walk(items, &mut |item| self.item(item))
  }

  fn item<'a>(&mut self, item: &MarkdownItem<'a>) -> Result<(), RenderError> {
    match item {
      MarkdownItem::File(file) => self.block(file.document.root),
      MarkdownItem::Group(group) => self.block(group.heading.node),
      // Already part of the TOC.
      MarkdownItem::ExternalLink(_) => Ok(()),
      MarkdownItem::Embed(embed) => {
        self.block(embed.heading.node)?;
        self.items(&embed.section.items)
      },
    }
  }

  /// Renders one node, trimmed to end with a single newline. Nodes that
  /// render to nothing are skipped.
  fn block<'a>(&mut self, node: &'a AstNode<'a>) -> Result<(), RenderError> {
    let mut rendered = String::new();
    self.renderer.render(&mut rendered, node)?;
    let rendered = rendered.trim_end_matches('\n');
    if rendered.is_empty() {
      return Ok(());
    }

    if self.blocks > 0 {
      self.out.push('\n');
    }
    self.out.push_str(rendered);
    self.out.push('\n');
    self.blocks += 1;
    Ok(())
  }
}
