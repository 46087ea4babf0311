use cursor::{BinaryCursor, CursorError};
use icc::ICCError;
use jpc::CodestreamError;
use log::{debug, info, warn};
use std::error;
use std::fmt;
use std::io;

mod boxes;
mod colour_specification;
mod encode;
mod file;

pub use boxes::*;
pub use colour_specification::*;
pub use encode::{encode_boxes, write_box, write_boxes, ReadSeek, WriteContext};
pub use file::{Codec, FileKind, Jp2File};

#[derive(Debug)]
pub enum JP2Error {
    /// A box header or box content that does not follow the box syntax.
    MalformedBoxStructure {
        box_type: BoxType,
        offset: u64,
        reason: String,
    },
    /// An in-memory box tree that cannot be written as a conforming file.
    InvalidBoxState { box_type: BoxType, reason: String },
    NotJpeg2000 { magic: Vec<u8> },
    Codestream { error: CodestreamError },
    Cursor { error: CursorError },
    ICC { error: ICCError },
    Io { error: io::Error },
}

impl JP2Error {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedBoxStructure { .. })
    }

    pub fn is_truncated(&self) -> bool {
        match self {
            Self::Cursor { error } => error.is_truncated(),
            Self::Codestream { error } => error.is_truncated(),
            _ => false,
        }
    }

    /// Errors callers should treat as a failed read or write of the file
    /// itself. An invalid box state is reported in this class.
    pub fn is_io_failure(&self) -> bool {
        match self {
            Self::Io { .. } | Self::InvalidBoxState { .. } => true,
            Self::Cursor { error } => matches!(error, CursorError::Io { .. }),
            _ => false,
        }
    }
}

impl error::Error for JP2Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Codestream { error } => Some(error),
            Self::Cursor { error } => Some(error),
            Self::ICC { error } => Some(error),
            Self::Io { error } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for JP2Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MalformedBoxStructure {
                box_type,
                offset,
                reason,
            } => {
                write!(
                    f,
                    "malformed box {:?} at byte offset {}: {}",
                    box_type_string(box_type),
                    offset,
                    reason
                )
            }
            Self::InvalidBoxState { box_type, reason } => {
                write!(
                    f,
                    "invalid box {:?}: {}",
                    box_type_string(box_type),
                    reason
                )
            }
            Self::NotJpeg2000 { magic } => {
                write!(
                    f,
                    "not a JP2 file or JPEG 2000 codestream (starts with {:02X?})",
                    magic
                )
            }
            Self::Codestream { error } => write!(f, "codestream error: {}", error),
            Self::Cursor { error } => write!(f, "{}", error),
            Self::ICC { error } => write!(f, "ICC profile error: {}", error),
            Self::Io { error } => write!(f, "io error {}", error),
        }
    }
}

impl From<CursorError> for JP2Error {
    fn from(error: CursorError) -> Self {
        JP2Error::Cursor { error }
    }
}

impl From<CodestreamError> for JP2Error {
    fn from(error: CodestreamError) -> Self {
        JP2Error::Codestream { error }
    }
}

impl From<ICCError> for JP2Error {
    fn from(error: ICCError) -> Self {
        JP2Error::ICC { error }
    }
}

impl From<io::Error> for JP2Error {
    fn from(error: io::Error) -> Self {
        JP2Error::Io { error }
    }
}

pub type BoxType = [u8; 4];

// jP\040\040 (0x6A50 2020)
pub const BOX_TYPE_SIGNATURE: BoxType = *b"jP  ";
pub const BOX_TYPE_FILE_TYPE: BoxType = *b"ftyp";
pub const BOX_TYPE_HEADER: BoxType = *b"jp2h";
pub const BOX_TYPE_IMAGE_HEADER: BoxType = *b"ihdr";
pub const BOX_TYPE_BITS_PER_COMPONENT: BoxType = *b"bpcc";
pub const BOX_TYPE_COLOUR_SPECIFICATION: BoxType = *b"colr";
pub const BOX_TYPE_PALETTE: BoxType = *b"pclr";
pub const BOX_TYPE_COMPONENT_MAPPING: BoxType = *b"cmap";
pub const BOX_TYPE_CHANNEL_DEFINITION: BoxType = *b"cdef";
pub const BOX_TYPE_RESOLUTION: BoxType = *b"res ";
pub const BOX_TYPE_CAPTURE_RESOLUTION: BoxType = *b"resc";
pub const BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION: BoxType = *b"resd";
pub const BOX_TYPE_CONTIGUOUS_CODESTREAM: BoxType = *b"jp2c";
pub const BOX_TYPE_INTELLECTUAL_PROPERTY: BoxType = *b"jp2i";
pub const BOX_TYPE_XML: BoxType = *b"xml ";
pub const BOX_TYPE_UUID: BoxType = *b"uuid";
pub const BOX_TYPE_UUID_INFO: BoxType = *b"uinf";
pub const BOX_TYPE_UUID_LIST: BoxType = *b"ulst";
pub const BOX_TYPE_DATA_ENTRY_URL: BoxType = *b"url ";
pub const BOX_TYPE_ASSOCIATION: BoxType = *b"asoc";
pub const BOX_TYPE_LABEL: BoxType = *b"lbl ";

// jp2\040
pub const BRAND_JP2: [u8; 4] = *b"jp2 ";

// jpx\040
pub const BRAND_JPX: [u8; 4] = *b"jpx ";

// <CR><LF><0x87><LF> (0x0D0A 870A).
pub const SIGNATURE_MAGIC: [u8; 4] = [13, 10, 135, 10];

/// Printable form of a box type, non ASCII bytes shown as `.`.
pub fn box_type_string(box_type: &BoxType) -> String {
    box_type
        .iter()
        .map(|b| {
            if b.is_ascii_graphic() || *b == b' ' {
                *b as char
            } else {
                '.'
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BoxTypes {
    Signature,
    FileType,
    Header,
    ImageHeader,
    BitsPerComponent,
    ColourSpecification,
    Palette,
    ComponentMapping,
    ChannelDefinition,
    Resolution,
    CaptureResolution,
    DefaultDisplayResolution,
    ContiguousCodestream,
    IntellectualProperty,
    Xml,
    Uuid,
    UUIDInfo,
    UUIDList,
    DataEntryURL,
    Association,
    Label,
    Unknown,
}

impl BoxTypes {
    fn new(value: BoxType) -> BoxTypes {
        match value {
            BOX_TYPE_SIGNATURE => BoxTypes::Signature,
            BOX_TYPE_FILE_TYPE => BoxTypes::FileType,
            BOX_TYPE_HEADER => BoxTypes::Header,
            BOX_TYPE_IMAGE_HEADER => BoxTypes::ImageHeader,
            BOX_TYPE_BITS_PER_COMPONENT => BoxTypes::BitsPerComponent,
            BOX_TYPE_COLOUR_SPECIFICATION => BoxTypes::ColourSpecification,
            BOX_TYPE_PALETTE => BoxTypes::Palette,
            BOX_TYPE_COMPONENT_MAPPING => BoxTypes::ComponentMapping,
            BOX_TYPE_CHANNEL_DEFINITION => BoxTypes::ChannelDefinition,

            BOX_TYPE_RESOLUTION => BoxTypes::Resolution,
            BOX_TYPE_CAPTURE_RESOLUTION => BoxTypes::CaptureResolution,
            BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION => BoxTypes::DefaultDisplayResolution,

            BOX_TYPE_CONTIGUOUS_CODESTREAM => BoxTypes::ContiguousCodestream,
            BOX_TYPE_INTELLECTUAL_PROPERTY => BoxTypes::IntellectualProperty,
            BOX_TYPE_XML => BoxTypes::Xml,

            BOX_TYPE_UUID => BoxTypes::Uuid,
            BOX_TYPE_UUID_INFO => BoxTypes::UUIDInfo,
            BOX_TYPE_UUID_LIST => BoxTypes::UUIDList,
            BOX_TYPE_DATA_ENTRY_URL => BoxTypes::DataEntryURL,

            BOX_TYPE_ASSOCIATION => BoxTypes::Association,
            BOX_TYPE_LABEL => BoxTypes::Label,
            _ => BoxTypes::Unknown,
        }
    }

    fn is_superbox(&self) -> bool {
        matches!(
            self,
            BoxTypes::Header | BoxTypes::Resolution | BoxTypes::UUIDInfo | BoxTypes::Association
        )
    }
}

/// Which file format rules a box tree is held to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Conformance {
    /// ISO/IEC 15444-1 Annex I, the strict default.
    #[default]
    Jp2,
    /// ISO/IEC 15444-2 Annex M, relaxing the colour specification rules.
    Jpx,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseOptions {
    pub conformance: Conformance,

    /// Scan the main header of the first codestream while opening a file.
    pub scan_codestream: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            conformance: Conformance::Jp2,
            scan_codestream: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WriteOptions {
    pub conformance: Conformance,
}

/// A recoverable problem found while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub offset: u64,
    pub box_type: Option<BoxType>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.box_type {
            Some(box_type) => write!(
                f,
                "{:?} box at byte offset {}: {}",
                box_type_string(box_type),
                self.offset,
                self.message
            ),
            None => write!(f, "byte offset {}: {}", self.offset, self.message),
        }
    }
}

/// Superboxes nested deeper than this are kept undecoded.
pub const MAX_SUPERBOX_DEPTH: usize = 32;

/// State shared by one parse of a box tree.
#[derive(Debug, Default)]
pub struct ParseContext {
    options: ParseOptions,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
}

impl ParseContext {
    pub fn new(options: ParseOptions) -> ParseContext {
        ParseContext {
            options,
            diagnostics: vec![],
            depth: 0,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn diagnose(&mut self, offset: u64, box_type: Option<BoxType>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            offset,
            box_type,
            message: message.into(),
        };
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// Location and extent of one box in its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxHeader {
    // Box Type
    //
    // This field specifies the type of information found in the DBox field.
    //
    // The value of this field is encoded as a 4-byte big endian unsigned
    // integer. However, boxes are generally referred to by an ISO 646
    // character string translation of the integer value.
    pub box_type: BoxType,

    pub offset: u64,

    // Total length including LBox, TBox and XLBox. A box declared with
    // length 0 records the length it spans to the end of its container.
    pub length: u64,

    // 8, or 16 when XLBox is present
    pub header_length: u64,
}

impl BoxHeader {
    pub fn content_offset(&self) -> u64 {
        self.offset + self.header_length
    }

    pub fn content_length(&self) -> u64 {
        self.length - self.header_length
    }

    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

impl fmt::Display for BoxHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:?} box at byte offset {} length {}",
            box_type_string(&self.box_type),
            self.offset,
            self.length
        )
    }
}

/// Read the header of the box starting at the cursor position.
pub fn decode_box_header<R: io::Read + io::Seek>(
    cursor: &mut BinaryCursor<R>,
    container_end: u64,
) -> Result<BoxHeader, JP2Error> {
    let offset = cursor.tell()?;

    // Box Length
    //
    // This field specifies the length of the box, stored as a 4-byte big
    // endian unsigned integer.
    let box_length = cursor.read_u32()?;
    let box_type = cursor.read_array::<4>()?;
    let malformed = |reason: String| JP2Error::MalformedBoxStructure {
        box_type,
        offset,
        reason,
    };

    let (length, header_length) = match box_length {
        // If the value of this field is 0, then the length of the box was not
        // known when the LBox field was written. In this case, this box
        // contains all bytes up to the end of its container.
        0 => (container_end.saturating_sub(offset), 8),
        // If the value of this field is 1, then the XLBox field shall exist
        // and the value of that field shall be the actual length of the box.
        1 => {
            if container_end.saturating_sub(offset) < 16 {
                return Err(malformed(
                    "no room for the extended length field".to_owned(),
                ));
            }
            let extended_length = cursor.read_u64()?;
            if extended_length < 16 {
                return Err(malformed(format!(
                    "extended length {} is shorter than the box header",
                    extended_length
                )));
            }
            (extended_length, 16)
        }
        // The values 2–7 are reserved for ISO use.
        2..=7 => {
            return Err(malformed(format!("reserved box length {}", box_length)));
        }
        length => (length as u64, 8),
    };

    let end = offset.saturating_add(length);
    if end > container_end {
        return Err(malformed(format!(
            "box length {} overruns its container by {} bytes",
            length,
            end - container_end
        )));
    }

    Ok(BoxHeader {
        box_type,
        offset,
        length,
        header_length,
    })
}

/// Leaf box content is decoded from an in-memory copy.
pub type ContentReader<'a> = BinaryCursor<io::Cursor<&'a [u8]>>;

/// Box content is encoded into a buffer before its header is known.
pub type ContentWriter = BinaryCursor<Vec<u8>>;

/// JPEG 2000 box trait.
///
/// The building-block of the JP2 file format is called a box.
///
/// All information contained within the JP2 file is encapsulated in boxes.
///
/// ISO/IEC 15444-1 / ITU T-800 defines several types of boxes;
/// the definition of each specific box type defines the kinds of information
/// that may be found within a box of that type. Some boxes will be defined to
/// contain other boxes.
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.4.
pub trait JBox {
    fn identifier(&self) -> BoxType;

    /// Length as found in the source, 0 for a box that was constructed
    /// rather than parsed.
    fn length(&self) -> u64;

    fn offset(&self) -> u64;

    /// Validate the box and write its content, without the box header.
    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        context: &mut WriteContext,
    ) -> Result<(), JP2Error>;
}

pub(crate) trait DecodeBox: Sized {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error>;
}

fn decode_content<B: DecodeBox>(header: &BoxHeader, content: &[u8]) -> Result<B, JP2Error> {
    let mut reader = BinaryCursor::new(io::Cursor::new(content));
    let decoded = match B::decode(header, &mut reader) {
        Ok(decoded) => decoded,
        // Running out of content is a fault of the box, not of the source.
        Err(JP2Error::Cursor { error }) => {
            return Err(JP2Error::MalformedBoxStructure {
                box_type: header.box_type,
                offset: header.offset,
                reason: error.to_string(),
            })
        }
        Err(error) => return Err(error),
    };

    let consumed = reader.tell()?;
    if consumed < content.len() as u64 {
        warn!(
            "{}: {} trailing content bytes ignored",
            header,
            content.len() as u64 - consumed
        );
    }
    Ok(decoded)
}

fn decode_leaf(kind: BoxTypes, header: &BoxHeader, content: &[u8]) -> Result<JP2Box, JP2Error> {
    let jbox = match kind {
        BoxTypes::Signature => JP2Box::Signature(decode_content(header, content)?),
        BoxTypes::FileType => JP2Box::FileType(decode_content(header, content)?),
        BoxTypes::ImageHeader => JP2Box::ImageHeader(decode_content(header, content)?),
        BoxTypes::BitsPerComponent => JP2Box::BitsPerComponent(decode_content(header, content)?),
        BoxTypes::ColourSpecification => {
            JP2Box::ColourSpecification(decode_content(header, content)?)
        }
        BoxTypes::Palette => JP2Box::Palette(decode_content(header, content)?),
        BoxTypes::ComponentMapping => JP2Box::ComponentMapping(decode_content(header, content)?),
        BoxTypes::ChannelDefinition => {
            JP2Box::ChannelDefinition(decode_content(header, content)?)
        }
        BoxTypes::CaptureResolution => {
            JP2Box::CaptureResolution(decode_content(header, content)?)
        }
        BoxTypes::DefaultDisplayResolution => {
            JP2Box::DefaultDisplayResolution(decode_content(header, content)?)
        }
        BoxTypes::IntellectualProperty => {
            JP2Box::IntellectualProperty(decode_content(header, content)?)
        }
        BoxTypes::Xml => JP2Box::Xml(decode_content(header, content)?),
        BoxTypes::Uuid => JP2Box::Uuid(decode_content(header, content)?),
        BoxTypes::UUIDList => JP2Box::UUIDList(decode_content(header, content)?),
        BoxTypes::DataEntryURL => JP2Box::DataEntryURL(decode_content(header, content)?),
        BoxTypes::Label => JP2Box::Label(decode_content(header, content)?),
        _ => JP2Box::Unknown(UnknownBox::from_content(header, content.to_vec())),
    };
    Ok(jbox)
}

fn decode_box<R: io::Read + io::Seek>(
    cursor: &mut BinaryCursor<R>,
    header: &BoxHeader,
    context: &mut ParseContext,
) -> Result<JP2Box, JP2Error> {
    let kind = BoxTypes::new(header.box_type);

    if kind.is_superbox() && context.depth >= MAX_SUPERBOX_DEPTH {
        context.diagnose(
            header.offset,
            Some(header.box_type),
            format!(
                "superboxes nested deeper than {}, keeping the box undecoded",
                MAX_SUPERBOX_DEPTH
            ),
        );
        let content = cursor.read_bytes(header.content_length())?;
        return Ok(JP2Box::Unknown(UnknownBox::from_content(header, content)));
    }

    if kind.is_superbox() {
        context.depth += 1;
        let children = parse_boxes(cursor, header.end(), context);
        context.depth -= 1;
        let superbox = SuperBox::from_children(header, children?);
        return Ok(match kind {
            BoxTypes::Header => JP2Box::Header(superbox),
            BoxTypes::Resolution => JP2Box::Resolution(superbox),
            BoxTypes::UUIDInfo => JP2Box::UUIDInfo(superbox),
            _ => JP2Box::Association(superbox),
        });
    }

    // The codestream stays in the source, only its location is recorded.
    if kind == BoxTypes::ContiguousCodestream {
        return Ok(JP2Box::ContiguousCodestream(
            ContiguousCodestreamBox::from_source(header),
        ));
    }

    let content = cursor.read_bytes(header.content_length())?;
    match decode_leaf(kind, header, &content) {
        Ok(jbox) => Ok(jbox),
        Err(error) if error.is_malformed() => {
            context.diagnose(
                header.offset,
                Some(header.box_type),
                format!("{}, keeping the box undecoded", error),
            );
            Ok(JP2Box::Unknown(UnknownBox::from_content(header, content)))
        }
        Err(error) => Err(error),
    }
}

// Read time checks. Problems are recorded, the tree is kept as found.
fn check_box(jbox: &JP2Box, context: &mut ParseContext) {
    let offset = jbox.offset();
    let box_type = Some(jbox.identifier());
    match jbox {
        JP2Box::Signature(signature_box) => {
            if signature_box.signature() != SIGNATURE_MAGIC {
                context.diagnose(
                    offset,
                    box_type,
                    format!(
                        "signature {:02X?} does not match {:02X?}",
                        signature_box.signature(),
                        SIGNATURE_MAGIC
                    ),
                );
            }
        }
        JP2Box::FileType(file_type_box) => {
            if file_type_box.brand_bytes() != BRAND_JP2 && file_type_box.brand_bytes() != BRAND_JPX
            {
                context.diagnose(
                    offset,
                    box_type,
                    format!("unexpected brand {:?}", file_type_box.brand()),
                );
            }
            if !file_type_box.is_compatible_with(BRAND_JP2) {
                context.diagnose(
                    offset,
                    box_type,
                    format!(
                        "'jp2 ' not found in compatibility list '{}'",
                        file_type_box.compatibility_list().join(", ")
                    ),
                );
            }
        }
        JP2Box::ColourSpecification(colr) => {
            if context.options.conformance == Conformance::Jp2
                && (colr.precedence() != 0 || colr.colourspace_approximation() != 0)
            {
                context.diagnose(
                    offset,
                    box_type,
                    format!(
                        "precedence {} and approximation {} should both be 0 in a JP2 file",
                        colr.precedence(),
                        colr.colourspace_approximation()
                    ),
                );
            }
        }
        JP2Box::Header(header_box) => {
            for problem in header_box.header_problems() {
                context.diagnose(offset, box_type, problem);
            }
        }
        _ => {}
    }
}

/// Parse the boxes between the cursor position and `container_end`.
///
/// A malformed box is recorded as a diagnostic and kept as an opaque box
/// spanning to the end of its container. The only malformed box that fails
/// the parse is the very first one of a file.
pub fn parse_boxes<R: io::Read + io::Seek>(
    cursor: &mut BinaryCursor<R>,
    container_end: u64,
    context: &mut ParseContext,
) -> Result<Vec<JP2Box>, JP2Error> {
    let mut boxes = vec![];

    loop {
        let offset = cursor.tell()?;
        if offset >= container_end {
            break;
        }
        if container_end - offset < 8 {
            context.diagnose(
                offset,
                None,
                format!(
                    "{} trailing bytes are too short to form a box header",
                    container_end - offset
                ),
            );
            cursor.seek(container_end)?;
            break;
        }

        let header = match decode_box_header(cursor, container_end) {
            Ok(header) => header,
            Err(error) if error.is_malformed() => {
                if context.depth == 0 && boxes.is_empty() {
                    return Err(error);
                }
                context.diagnose(offset, None, error.to_string());

                cursor.seek(offset + 4)?;
                let header = BoxHeader {
                    box_type: cursor.read_array::<4>()?,
                    offset,
                    length: container_end - offset,
                    header_length: 8,
                };
                let data = cursor.read_bytes(header.content_length())?;
                boxes.push(JP2Box::Unknown(UnknownBox::from_content(&header, data)));
                cursor.seek(container_end)?;
                break;
            }
            Err(error) => return Err(error),
        };

        info!("{} start", header);
        let jbox = decode_box(cursor, &header, context)?;
        check_box(&jbox, context);
        cursor.seek(header.end())?;
        debug!("{} finish", header);
        boxes.push(jbox);
    }

    Ok(boxes)
}
