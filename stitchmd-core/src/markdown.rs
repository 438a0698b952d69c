//! comrak glue: parsing, node construction, text extraction and rendering.
//!
//! Every document of one stitching run is parsed into the same [`Arena`], so
//! nodes can be moved between documents with plain detach/append calls.

use std::cell::RefCell;

use comrak::{
  nodes::{Ast, AstNode, NodeValue},
  options::Options,
  parse_document,
};

use crate::{error::RenderError, pos::Info};

/// Arena holding every node parsed or synthesized during one run.
pub type Arena<'a> = comrak::Arena<'a>;

/// comrak options shared by parsing and rendering.
///
/// GitHub-flavored tables, strikethrough and task lists are enabled, along
/// with `---` delimited front matter. Autolinking of bare URLs stays off so
/// that they survive a round trip unchanged.
#[must_use]
pub fn options() -> Options<'static> {
  let mut options = Options::default();
  options.extension.table = true;
  options.extension.strikethrough = true;
  options.extension.tasklist = true;
  options.extension.front_matter_delimiter = Some("---".to_owned());
  options.render.r#unsafe = true;
  options
}

/// A parsed Markdown source.
#[derive(Debug)]
pub struct Document<'a> {
  /// Path used when reporting positions.
  pub path:         String,
  pub root:         &'a AstNode<'a>,
  pub info:         Info,
  /// Raw front matter block, removed from the AST.
  pub front_matter: Option<String>,
}

impl<'a> Document<'a> {
  /// Parses `source` into `arena`.
  ///
  /// A leading front matter block is detached from the tree so that it is
  /// never rendered back out.
  pub fn parse(arena: &'a Arena<'a>, path: impl Into<String>, source: &str) -> Self {
    let path = path.into();
    let root = parse_document(arena, source, &options());

    let mut front_matter = None;
    if let Some(first) = root.first_child() {
      let raw = match &first.data.borrow().value {
        NodeValue::FrontMatter(raw) => Some(raw.to_string()),
        _ => None,
      };
      if raw.is_some() {
        first.detach();
        front_matter = raw;
      }
    }

    Self {
      info: Info::from_content(path.clone(), source),
      path,
      root,
      front_matter,
    }
  }

  /// Byte offset at which `node` starts in this document.
  #[must_use]
  pub fn offset_of(&self, node: &'a AstNode<'a>) -> usize {
    let start = node.data.borrow().sourcepos.start;
    self.info.offset(start.line, start.column)
  }
}

/// Allocates a detached node holding `value`.
pub fn new_node<'a>(arena: &'a Arena<'a>, value: NodeValue) -> &'a AstNode<'a> {
  arena.alloc(AstNode::new(RefCell::new(Ast::new(value, (0, 0).into()))))
}

/// Plain text of an inline tree, as used for titles and slugs.
#[must_use]
pub fn text_content<'a>(node: &'a AstNode<'a>) -> String {
  let mut text = String::new();
  push_text(node, &mut text);
  text
}

fn push_text<'a>(node: &'a AstNode<'a>, text: &mut String) {
  for child in node.children() {
    match &child.data.borrow().value {
      NodeValue::Text(t) => text.push_str(t),
      NodeValue::Code(code) => text.push_str(&code.literal),
      NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
      NodeValue::HtmlInline(_) => {},
      _ => push_text(child, text),
    }
  }
}

/// Short name of a node's kind for diagnostics.
#[must_use]
pub fn kind_name<'a>(node: &'a AstNode<'a>) -> &'static str {
  match node.data.borrow().value {
    NodeValue::Document => "Document",
    NodeValue::FrontMatter(_) => "FrontMatter",
    NodeValue::BlockQuote => "Blockquote",
    NodeValue::List(_) => "List",
    NodeValue::Item(_) => "ListItem",
    NodeValue::CodeBlock(_) => "FencedCodeBlock",
    NodeValue::HtmlBlock(_) => "HTMLBlock",
    NodeValue::Paragraph => "Paragraph",
    NodeValue::Heading(_) => "Heading",
    NodeValue::ThematicBreak => "ThematicBreak",
    NodeValue::Table(_) => "Table",
    NodeValue::TableRow(_) => "TableRow",
    NodeValue::TableCell => "TableCell",
    NodeValue::Text(_) => "Text",
    NodeValue::SoftBreak | NodeValue::LineBreak => "Break",
    NodeValue::Code(_) => "CodeSpan",
    NodeValue::HtmlInline(_) => "RawHTML",
    NodeValue::Emph => "Emphasis",
    NodeValue::Strong => "Strong",
    NodeValue::Strikethrough => "Strikethrough",
    NodeValue::Link(_) => "Link",
    NodeValue::Image(_) => "Image",
    _ => "Node",
  }
}

/// Merges runs of adjacent text children of `node` into a single text node.
pub fn combine_adjacent_texts<'a>(node: &'a AstNode<'a>) {
  let mut cur = node.first_child();
  while let Some(child) = cur {
    let next = child.next_sibling();
    let Some(next) = next else { break };

    let next_text = match &next.data.borrow().value {
      NodeValue::Text(t) => Some(t.to_string()),
      _ => None,
    };
    let mut merged = false;
    if let Some(next_text) = next_text
      && let NodeValue::Text(t) = &mut child.data.borrow_mut().value
    {
      let mut joined = t.to_string();
      joined.push_str(&next_text);
      *t = joined.into();
      merged = true;
    }

    if merged {
      // Stay on `child`; it may absorb the following sibling too.
      next.detach();
    } else {
      cur = Some(next);
    }
  }
}

/// Nearest ancestor of `node` (excluding itself) matching `pred`.
pub fn ancestor<'a>(
  node: &'a AstNode<'a>,
  pred: impl Fn(&NodeValue) -> bool,
) -> Option<&'a AstNode<'a>> {
  node
    .ancestors()
    .skip(1)
    .find(|n| pred(&n.data.borrow().value))
}

/// Serializes AST nodes back to Markdown.
pub trait Renderer {
  /// Appends the Markdown for `node` to `out`.
  ///
  /// # Errors
  ///
  /// Returns an error if the underlying formatter fails.
  fn render<'a>(
    &self,
    out: &mut String,
    node: &'a AstNode<'a>,
  ) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for &R {
  fn render<'a>(
    &self,
    out: &mut String,
    node: &'a AstNode<'a>,
  ) -> Result<(), RenderError> {
    (**self).render(out, node)
  }
}

/// [`Renderer`] backed by comrak's CommonMark formatter.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMarkRenderer;

impl Renderer for CommonMarkRenderer {
  fn render<'a>(
    &self,
    out: &mut String,
    node: &'a AstNode<'a>,
  ) -> Result<(), RenderError> {
    comrak::format_commonmark(node, &options(), out)?;
    Ok(())
  }
}
