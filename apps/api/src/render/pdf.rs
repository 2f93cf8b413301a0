//! PDF surface backed by `lopdf`.
//!
//! Text is set in the three standard Type1 fonts with WinAnsiEncoding, so nothing
//! is embedded and glyph advances match the metric tables in `layout::font_metrics`.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::layout::font_metrics::FontFace;
use crate::layout::policy::A4_LANDSCAPE;
use crate::layout::Rect;
use crate::render::{ComposedBox, RenderError, Rgb, StyledLine, Surface, BORDER_WIDTH};

const FONTS: [FontFace; 3] = [FontFace::Helvetica, FontFace::HelveticaBold, FontFace::Courier];

fn resource_name(face: FontFace) -> &'static str {
    match face {
        FontFace::Helvetica => "F1",
        FontFace::HelveticaBold => "F2",
        FontFace::Courier => "F3",
    }
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Encodes text for a WinAnsiEncoding simple font. Characters outside the
/// encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u8,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2026}' => 0x85,
            '\u{20ac}' => 0x80,
            '\u{2122}' => 0x99,
            _ => b'?',
        })
        .collect()
}

struct PageBuffer {
    width: f64,
    height: f64,
    content: Content,
}

pub struct PdfSurface {
    document: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    current: Option<PageBuffer>,
}

impl PdfSurface {
    pub fn new(title: &str) -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for face in FONTS {
            let font_id = document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => face.postscript_name(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(resource_name(face), font_id);
        }
        let resources_id = document.add_object(dictionary! { "Font" => fonts });

        let info_id = document.add_object(dictionary! {
            "Title" => Object::String(encode_win_ansi(title), StringFormat::Literal),
            "Producer" => Object::string_literal("cheatsheet-api"),
        });
        document.trailer.set("Info", info_id);

        Self {
            document,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
            current: None,
        }
    }

    fn flush_page(&mut self) -> Result<(), RenderError> {
        let Some(page) = self.current.take() else {
            return Ok(());
        };
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! {}, page.content.encode()?));
        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(page.width), real(page.height)],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Operations of the open page. Drawing before `begin_page` opens an A4
    /// landscape page.
    fn ops(&mut self) -> &mut Vec<Operation> {
        &mut self
            .current
            .get_or_insert_with(|| PageBuffer {
                width: A4_LANDSCAPE.0,
                height: A4_LANDSCAPE.1,
                content: Content { operations: Vec::new() },
            })
            .content
            .operations
    }

    fn fill_rect(&mut self, rect: &Rect, color: Rgb) {
        let [r, g, b] = color.components();
        let ops = self.ops();
        ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        ops.push(Operation::new(
            "re",
            vec![real(rect.x), real(rect.bottom()), real(rect.width), real(rect.height)],
        ));
        ops.push(Operation::new("f", vec![]));
    }

    fn stroke_rect(&mut self, rect: &Rect, color: Rgb) {
        let [r, g, b] = color.components();
        let ops = self.ops();
        ops.push(Operation::new("RG", vec![r.into(), g.into(), b.into()]));
        ops.push(Operation::new("w", vec![real(BORDER_WIDTH)]));
        ops.push(Operation::new(
            "re",
            vec![real(rect.x), real(rect.bottom()), real(rect.width), real(rect.height)],
        ));
        ops.push(Operation::new("S", vec![]));
    }

    fn text_line(&mut self, line: &StyledLine, color: Rgb) {
        let [r, g, b] = color.components();
        let ops = self.ops();
        ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        for run in line.runs.iter().filter(|run| !run.text.is_empty()) {
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![
                    Object::Name(resource_name(run.font).as_bytes().to_vec()),
                    real(run.size),
                ],
            ));
            ops.push(Operation::new("Td", vec![real(run.x), real(line.baseline)]));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(&run.text), StringFormat::Literal)],
            ));
            ops.push(Operation::new("ET", vec![]));
        }
    }

    /// Finishes the document and returns the PDF bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        self.flush_page()?;

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        let count = self.page_ids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);
        self.document.compress();

        let mut bytes = Vec::new();
        self.document.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

impl Surface for PdfSurface {
    fn begin_page(&mut self, width: f64, height: f64) -> Result<(), RenderError> {
        self.flush_page()?;
        self.current = Some(PageBuffer {
            width,
            height,
            content: Content { operations: Vec::new() },
        });
        Ok(())
    }

    fn draw_box(&mut self, composed: &ComposedBox) -> Result<(), RenderError> {
        self.fill_rect(&composed.header_bar, composed.color);
        self.text_line(&composed.header, Rgb::WHITE);
        self.stroke_rect(&composed.frame, composed.color);
        for line in &composed.lines {
            self.text_line(line, Rgb::BLACK);
        }
        Ok(())
    }
}
