use cursor::BinaryCursor;
use jpc::{decode_jpc, Codestream, Geometry, ImageAndTileSizeMarkerSegment, MARKER_SYMBOL_SOC};
use log::info;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::encode::{write_boxes, WriteContext};
use crate::{
    parse_boxes, BitsPerComponentBox, BoxHeader, ColourSpecificationBox, ContiguousCodestreamBox,
    Diagnostic, FileTypeBox, ImageHeaderBox, JBox, JP2Box, JP2Error, ParseContext, ParseOptions,
    SignatureBox, WriteOptions, BOX_TYPE_CONTIGUOUS_CODESTREAM, BOX_TYPE_SIGNATURE,
    ENUMERATED_COLOUR_SPACE_GREYSCALE, ENUMERATED_COLOUR_SPACE_SRGB, SIGNATURE_MAGIC,
};

/// An external JPEG 2000 decoder, handed the bytes of a codestream.
pub trait Codec {
    type Raster;

    fn decode(&mut self, codestream: &[u8], geometry: &Geometry) -> Result<Self::Raster, JP2Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A JP2 or JPX file.
    Jp2,
    /// A bare codestream, starting with SOC.
    Codestream,
}

/// A parsed JPEG 2000 file.
///
/// Codestreams are not copied into memory: writing or wrapping the file and
/// reading its image need the source it was decoded from.
#[derive(Debug)]
pub struct Jp2File {
    kind: FileKind,
    boxes: Vec<JP2Box>,
    diagnostics: Vec<Diagnostic>,
    codestream: Option<Codestream>,
}

// Top level order of a JP2 file, empty when conforming.
fn layout_problems(boxes: &[JP2Box]) -> Vec<String> {
    let mut problems = vec![];

    // The Signature box shall be the first box
    if !matches!(boxes.first(), Some(JP2Box::Signature(_))) {
        problems.push("the signature box is not the first box".to_owned());
    }

    // The File Type box shall immediately follow the Signature box
    if !matches!(boxes.get(1), Some(JP2Box::FileType(_))) {
        problems.push("the file type box does not follow the signature box".to_owned());
    }

    let first_codestream = boxes
        .iter()
        .position(|jbox| matches!(jbox, JP2Box::ContiguousCodestream(_)));
    let first_header = boxes
        .iter()
        .position(|jbox| matches!(jbox, JP2Box::Header(_)));
    match (first_header, first_codestream) {
        (_, None) => problems.push("no contiguous codestream box".to_owned()),
        (Some(header), Some(codestream)) if header < codestream => {}
        _ => problems
            .push("no JP2 header box before the first contiguous codestream box".to_owned()),
    }

    problems
}

// Raw Ssiz of a component, which shares its encoding with the BPC field.
fn component_depth(siz: &ImageAndTileSizeMarkerSegment, i: usize) -> u8 {
    let precision = siz.precision(i).unwrap_or(1);
    let signed = if siz.values_are_signed(i).unwrap_or(false) {
        0x80
    } else {
        0
    };
    (precision - 1) | signed
}

fn default_header(codestream: &Codestream) -> JP2Box {
    let siz = codestream.image_and_tile_size_marker_segment();
    let depths: Vec<u8> = (0..siz.components().len())
        .map(|i| component_depth(siz, i))
        .collect();

    let shared_depth = match depths.first() {
        Some(first) if depths.iter().all(|depth| depth == first) => Some(*first),
        _ => None,
    };

    let mut boxes = vec![JP2Box::ImageHeader(ImageHeaderBox::new(
        siz.reference_grid_height() - siz.image_vertical_offset(),
        siz.reference_grid_width() - siz.image_horizontal_offset(),
        siz.no_components(),
        shared_depth.unwrap_or(255),
    ))];
    if shared_depth.is_none() {
        boxes.push(JP2Box::BitsPerComponent(BitsPerComponentBox::new(depths)));
    }

    let colour_space = if siz.no_components() >= 3 {
        ENUMERATED_COLOUR_SPACE_SRGB
    } else {
        ENUMERATED_COLOUR_SPACE_GREYSCALE
    };
    boxes.push(JP2Box::ColourSpecification(
        ColourSpecificationBox::enumerated(colour_space),
    ));

    JP2Box::header(boxes)
}

impl Jp2File {
    /// Parse a JP2 file or a bare codestream from the current position of
    /// `reader` to its end.
    pub fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        options: ParseOptions,
    ) -> Result<Jp2File, JP2Error> {
        let mut cursor = BinaryCursor::new(reader);
        let start = cursor.tell()?;
        let end = cursor.length()?;

        let available = (end.saturating_sub(start)).min(12);
        let magic = cursor.read_bytes(available)?;
        cursor.seek(start)?;

        let mut signature = vec![0, 0, 0, 12];
        signature.extend_from_slice(&BOX_TYPE_SIGNATURE);
        signature.extend_from_slice(&SIGNATURE_MAGIC);

        let mut context = ParseContext::new(options);
        let (kind, boxes) = if magic == signature {
            info!("JP2 file at byte offset {}", start);
            let boxes = parse_boxes(&mut cursor, end, &mut context)?;
            for problem in layout_problems(&boxes) {
                context.diagnose(start, None, problem);
            }
            (FileKind::Jp2, boxes)
        } else if magic.len() >= 2 && magic[0..2] == MARKER_SYMBOL_SOC.to_be_bytes() {
            info!("codestream at byte offset {}", start);
            // The whole source is the content of one header-less box.
            let header = BoxHeader {
                box_type: BOX_TYPE_CONTIGUOUS_CODESTREAM,
                offset: start,
                length: end - start,
                header_length: 0,
            };
            let jbox = JP2Box::ContiguousCodestream(ContiguousCodestreamBox::from_source(&header));
            (FileKind::Codestream, vec![jbox])
        } else {
            return Err(JP2Error::NotJpeg2000 { magic });
        };

        let mut file = Jp2File {
            kind,
            boxes,
            diagnostics: vec![],
            codestream: None,
        };

        if options.scan_codestream {
            file.codestream = match file.first_codestream_box() {
                Some(jp2c) => Some(jp2c.codestream(cursor.get_mut())?),
                None => None,
            };
        }

        file.diagnostics = context.into_diagnostics();
        Ok(file)
    }

    /// Open and parse the file at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Jp2File, JP2Error> {
        let mut reader = io::BufReader::new(File::open(path)?);
        Jp2File::decode(&mut reader, ParseOptions::default())
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn boxes(&self) -> &[JP2Box] {
        &self.boxes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Main header of the first codestream, when it was scanned.
    pub fn codestream(&self) -> Option<&Codestream> {
        self.codestream.as_ref()
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.codestream.as_ref().map(Codestream::geometry)
    }

    pub fn header_box(&self) -> Option<&JP2Box> {
        self.boxes
            .iter()
            .find(|jbox| matches!(jbox, JP2Box::Header(_)))
    }

    pub fn first_codestream_box(&self) -> Option<&ContiguousCodestreamBox> {
        self.boxes.iter().find_map(|jbox| match jbox {
            JP2Box::ContiguousCodestream(jp2c) => Some(jp2c),
            _ => None,
        })
    }

    fn read_first_codestream<R: io::Read + io::Seek>(
        &self,
        source: &mut R,
    ) -> Result<Vec<u8>, JP2Error> {
        match self.first_codestream_box() {
            Some(jp2c) => jp2c.read_codestream(source),
            None => Err(JP2Error::MalformedBoxStructure {
                box_type: BOX_TYPE_CONTIGUOUS_CODESTREAM,
                offset: 0,
                reason: "no contiguous codestream box".to_owned(),
            }),
        }
    }

    /// Serialize the parsed tree to `writer`, copying codestreams from
    /// `source`. A bare codestream is copied unchanged.
    ///
    /// Nothing is written when the tree fails validation.
    pub fn write<R, W>(
        &self,
        writer: &mut W,
        source: &mut R,
        options: WriteOptions,
    ) -> Result<(), JP2Error>
    where
        R: io::Read + io::Seek,
        W: io::Write,
    {
        let mut cursor = BinaryCursor::new(writer);
        if self.kind == FileKind::Codestream {
            let codestream = self.read_first_codestream(source)?;
            cursor.write_bytes(&codestream)?;
            return Ok(());
        }

        if let Some(problem) = layout_problems(&self.boxes).into_iter().next() {
            return Err(JP2Error::InvalidBoxState {
                box_type: self.boxes.first().map(JBox::identifier).unwrap_or_default(),
                reason: problem,
            });
        }

        let mut context = WriteContext::with_source(options, source);
        write_boxes(&self.boxes, &mut cursor, &mut context)
    }

    /// Write a new JP2 file around the first codestream.
    ///
    /// `boxes` are the boxes preceding the codestream box. By default they
    /// are a signature box, a `jp2 ` file type box and a JP2 header derived
    /// from the codestream main header.
    pub fn wrap<R, W>(
        &self,
        source: &mut R,
        writer: &mut W,
        boxes: Option<Vec<JP2Box>>,
        options: WriteOptions,
    ) -> Result<(), JP2Error>
    where
        R: io::Read + io::Seek,
        W: io::Write,
    {
        let codestream_bytes = self.read_first_codestream(source)?;

        let mut boxes = match boxes {
            Some(boxes) => boxes,
            None => {
                let scanned;
                let codestream = match &self.codestream {
                    Some(codestream) => codestream,
                    None => {
                        scanned = decode_jpc(&mut io::Cursor::new(codestream_bytes.as_slice()))?;
                        &scanned
                    }
                };
                vec![
                    JP2Box::Signature(SignatureBox::new()),
                    JP2Box::FileType(FileTypeBox::jp2()),
                    default_header(codestream),
                ]
            }
        };
        boxes.push(JP2Box::ContiguousCodestream(ContiguousCodestreamBox::new(
            codestream_bytes,
        )));

        if let Some(problem) = layout_problems(&boxes).into_iter().next() {
            return Err(JP2Error::InvalidBoxState {
                box_type: boxes.first().map(JBox::identifier).unwrap_or_default(),
                reason: problem,
            });
        }

        info!("wrapping codestream in {} boxes", boxes.len());
        let mut cursor = BinaryCursor::new(writer);
        let mut context = WriteContext::new(options);
        write_boxes(&boxes, &mut cursor, &mut context)
    }

    /// Decode the image of the first codestream with an external codec.
    pub fn read_image<R, C>(&self, source: &mut R, codec: &mut C) -> Result<C::Raster, JP2Error>
    where
        R: io::Read + io::Seek,
        C: Codec,
    {
        let codestream_bytes = self.read_first_codestream(source)?;
        let geometry = match self.geometry() {
            Some(geometry) => geometry,
            None => decode_jpc(&mut io::Cursor::new(codestream_bytes.as_slice()))?.geometry(),
        };
        codec.decode(&codestream_bytes, &geometry)
    }
}
