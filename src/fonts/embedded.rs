//! Extracted embedded-font wrapper.
//!
//! The fallback path prefers redrawing a span with the font program that
//! originally rendered it. This wrapper answers the questions that gate
//! and place that redraw: does the program cover the replacement text,
//! where is its baseline, and how wide will a line be.

use ttf_parser::Face;

/// An embedded font program (TrueType/OpenType) extracted from the
/// document.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    data: Vec<u8>,
}

impl EmbeddedFont {
    /// Wrap a font program, or `None` when the bytes do not parse.
    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        match Face::parse(&data, 0) {
            Ok(_) => Some(Self { data }),
            Err(e) => {
                log::debug!("extracted font program not parseable: {e}");
                None
            }
        }
    }

    /// Raw font program bytes, for handing back to the renderer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }

    /// True when the font has a glyph for `ch`.
    pub fn has_glyph(&self, ch: char) -> bool {
        self.face()
            .and_then(|f| f.glyph_index(ch))
            .is_some()
    }

    /// Whether the font covers enough of `text` to be usable: more than
    /// half of its unique printable non-whitespace characters must have
    /// glyphs. Subset fonts may miss a few glyphs; symbol and icon fonts
    /// miss nearly all of them and are rejected here.
    pub fn covers(&self, text: &str) -> bool {
        let mut unique: Vec<char> = text
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .collect();
        unique.sort_unstable();
        unique.dedup();
        if unique.is_empty() {
            return true;
        }
        let present = unique.iter().filter(|&&c| self.has_glyph(c)).count();
        present as f32 / unique.len() as f32 > 0.5
    }

    /// Ascender as a fraction of the em square. The baseline of a span
    /// whose bbox top is `y0` sits at `y0 + ascender_fraction() * size`.
    pub fn ascender_fraction(&self) -> f32 {
        let Some(face) = self.face() else {
            return 0.8;
        };
        let upem = face.units_per_em();
        if upem == 0 {
            return 0.8;
        }
        f32::from(face.ascender()) / f32::from(upem)
    }

    /// Measured width of one line at the given size. Characters without
    /// a glyph count half an em, the same rough guess renderers use for
    /// missing glyphs.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let upem = f32::from(face.units_per_em().max(1));
        let mut units = 0.0f32;
        for ch in text.chars() {
            let advance = face
                .glyph_index(ch)
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(f32::from)
                .unwrap_or(upem / 2.0);
            units += advance;
        }
        units / upem * size
    }
}
