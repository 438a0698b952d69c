//! The full pipeline: summary in, one Markdown document out.

use std::io::Write;

use crate::{
  collect::collect,
  error::{RenderError, Result, StitchError},
  fs::FileReader,
  generate::Generator,
  markdown::{Arena, CommonMarkRenderer, Document, Renderer},
  summary::parse_summary,
  transform::transform,
};

/// Options for a stitching run.
#[derive(Debug, Clone)]
pub struct StitchOptions {
  /// Added to the level of every heading in the output.
  pub offset:         i32,
  /// Leave the summary's own TOC lists out of the output.
  pub no_toc:         bool,
  /// Written verbatim before everything else.
  pub preface:        Option<String>,
  /// Slash path from the output's directory to the reader root. Links to
  /// files outside the collection are rewritten through it.
  pub input_rel_path: String,
  /// Summaries already being stitched, by path relative to the reader
  /// root. Normally the root summary's own path, so that embeds pointing
  /// back at it are reported as cycles.
  pub embed_stack:    Vec<String>,
}

impl Default for StitchOptions {
  fn default() -> Self {
    Self {
      offset:         0,
      no_toc:         false,
      preface:        None,
      input_rel_path: ".".to_owned(),
      embed_stack:    Vec::new(),
    }
  }
}

/// Runs the stitching pipeline with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Stitcher<R = CommonMarkRenderer> {
  options:  StitchOptions,
  renderer: R,
}

impl Stitcher {
  #[must_use]
  pub fn new(options: StitchOptions) -> Self {
    Self {
      options,
      renderer: CommonMarkRenderer,
    }
  }
}

impl<R: Renderer> Stitcher<R> {
  /// Uses `renderer` to serialize the output.
  #[must_use]
  pub fn with_renderer<S: Renderer>(self, renderer: S) -> Stitcher<S> {
    Stitcher {
      options: self.options,
      renderer,
    }
  }

  #[must_use]
  pub const fn options(&self) -> &StitchOptions {
    &self.options
  }

  /// Stitches the summary `source`, read from `filename`, into a string.
  ///
  /// `filename` is only used in diagnostics. Files the summary links to are
  /// read through `reader`.
  ///
  /// # Errors
  ///
  /// Returns [`StitchError::Summary`] if the summary is malformed,
  /// [`StitchError::Collect`] if any referenced file can't be loaded, and
  /// [`StitchError::Render`] if rendering fails.
  pub fn stitch_to_string(
    &self,
    reader: &dyn FileReader,
    filename: &str,
    source: &str,
  ) -> Result<String> {
    let arena = Arena::new();
    let doc = Document::parse(&arena, filename, source);

    log::debug!("Parsing summary {filename}");
    let summary = parse_summary(&doc).map_err(StitchError::Summary)?;

    log::debug!("Collecting {} section(s)", summary.sections.len());
    let mut collection = collect(
      &arena,
      reader,
      &doc,
      summary,
      self.options.embed_stack.clone(),
    )
    .map_err(StitchError::Collect)?;
    log::debug!("Collected {} file(s)", collection.files_by_path.len());

    transform(
      &arena,
      &mut collection,
      self.options.offset,
      &self.options.input_rel_path,
    );

    let mut out = String::new();
    let mut generator = Generator::new(&self.renderer, &mut out).no_toc(self.options.no_toc);
    if let Some(preface) = &self.options.preface {
      generator.preface(preface);
    }
    generator.generate(&collection.sections)?;
    Ok(out)
  }

  /// Like [`stitch_to_string`](Self::stitch_to_string), but writes the
  /// result to `writer`. Nothing is written unless stitching succeeds.
  ///
  /// # Errors
  ///
  /// Same as [`stitch_to_string`](Self::stitch_to_string), plus
  /// [`RenderError::Io`] if writing fails.
  pub fn stitch(
    &self,
    reader: &dyn FileReader,
    filename: &str,
    source: &str,
    writer: &mut dyn Write,
  ) -> Result<()> {
    let out = self.stitch_to_string(reader, filename, source)?;
    writer
      .write_all(out.as_bytes())
      .map_err(|err| StitchError::Render(RenderError::Io(err)))?;
    Ok(())
  }
}

/// Stitches `source` with default options.
///
/// # Errors
///
/// See [`Stitcher::stitch`].
pub fn stitch(
  reader: &dyn FileReader,
  filename: &str,
  source: &str,
  writer: &mut dyn Write,
) -> Result<()> {
  Stitcher::new(StitchOptions::default()).stitch(reader, filename, source, writer)
}
