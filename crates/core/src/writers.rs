//! Reference content writers: text dumps of laid-out bands.
//!
//! These are not output formats. They exist so that the streaming path and
//! the full pipeline can be compared byte for byte. Positions are written
//! relative to the band, which makes the output independent of where a
//! band landed on a page.

use crate::error::ReportError;
use quire_layout::{BoxId, NodeKind, NodeMatcher, RenderTree};
use std::borrow::Cow;
use std::io::Write;

/// Consumes finished bands one at a time.
pub trait ContentWriter {
    fn write_band(&mut self, tree: &RenderTree, band: BoxId) -> Result<(), ReportError>;

    fn finish(&mut self) -> Result<(), ReportError>;
}

fn paragraphs(tree: &RenderTree, band: BoxId) -> Vec<BoxId> {
    NodeMatcher::kind(NodeKind::Paragraph).find_all(tree, band)
}

/// One CSV record per band, one field per paragraph.
pub struct CsvContentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvContentWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(true).from_writer(out),
        }
    }

    pub fn into_inner(self) -> Result<W, ReportError> {
        self.writer
            .into_inner()
            .map_err(|e| ReportError::Io(e.into_error()))
    }
}

impl<W: Write> ContentWriter for CsvContentWriter<W> {
    fn write_band(&mut self, tree: &RenderTree, band: BoxId) -> Result<(), ReportError> {
        let fields: Vec<String> = paragraphs(tree, band)
            .into_iter()
            .map(|p| tree.text_content(p))
            .collect();
        self.writer.write_record(&fields)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.writer.flush()?;
        Ok(())
    }
}

fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// A `div` per band with absolutely positioned paragraphs.
pub struct HtmlContentWriter<W: Write> {
    out: W,
    title: String,
    started: bool,
}

impl<W: Write> HtmlContentWriter<W> {
    pub fn new(out: W, title: &str) -> Self {
        Self {
            out,
            title: title.to_string(),
            started: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn start(&mut self) -> Result<(), ReportError> {
        if !self.started {
            self.started = true;
            writeln!(self.out, "<!DOCTYPE html>")?;
            writeln!(
                self.out,
                "<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
                escape_html(&self.title)
            )?;
        }
        Ok(())
    }
}

impl<W: Write> ContentWriter for HtmlContentWriter<W> {
    fn write_band(&mut self, tree: &RenderTree, band: BoxId) -> Result<(), ReportError> {
        self.start()?;
        let band_node = tree.node(band)?;
        let origin = band_node.rect;
        writeln!(
            self.out,
            "<div class=\"{}\" style=\"height:{}\">",
            band_node.kind.as_str(),
            origin.height
        )?;
        for p in paragraphs(tree, band) {
            let rect = tree.node(p)?.rect;
            let text = tree.text_content(p);
            writeln!(
                self.out,
                "  <p style=\"left:{};top:{};width:{};height:{}\">{}</p>",
                rect.x - origin.x,
                rect.y - origin.y,
                rect.width,
                rect.height,
                escape_html(&text).replace('\n', "<br>")
            )?;
        }
        writeln!(self.out, "</div>")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.start()?;
        writeln!(self.out, "</body></html>")?;
        self.out.flush()?;
        Ok(())
    }
}
