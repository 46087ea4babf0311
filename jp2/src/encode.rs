use cursor::BinaryCursor;
use log::debug;
use std::io;

use crate::{box_type_string, JBox, JP2Box, JP2Error, WriteOptions};

/// A source the boxes of a tree were parsed from.
pub trait ReadSeek: io::Read + io::Seek {}

impl<T: io::Read + io::Seek> ReadSeek for T {}

/// State shared by one write of a box tree.
///
/// Contiguous codestream boxes parsed from a file keep their bytes in that
/// file, so writing them needs it as `source`.
pub struct WriteContext<'a> {
    options: WriteOptions,
    source: Option<&'a mut dyn ReadSeek>,
}

impl<'a> WriteContext<'a> {
    pub fn new(options: WriteOptions) -> WriteContext<'a> {
        WriteContext {
            options,
            source: None,
        }
    }

    pub fn with_source(options: WriteOptions, source: &'a mut dyn ReadSeek) -> WriteContext<'a> {
        WriteContext {
            options,
            source: Some(source),
        }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    pub fn source(&mut self) -> Option<&mut (dyn ReadSeek + 'a)> {
        self.source.as_deref_mut()
    }
}

/// Serialize one box, header included.
///
/// The box length is derived from the encoded content. The extended length
/// field is only used when the length does not fit in 32 bits.
pub fn write_box<W: io::Write>(
    jbox: &dyn JBox,
    cursor: &mut BinaryCursor<W>,
    context: &mut WriteContext,
) -> Result<(), JP2Error> {
    let mut content = BinaryCursor::new(Vec::new());
    jbox.encode_content(&mut content, context)?;
    let content = content.into_inner();

    let length = content.len() as u64 + 8;
    if length > u32::MAX as u64 {
        cursor.write_u32(1)?;
        cursor.write_bytes(&jbox.identifier())?;
        cursor.write_u64(length + 8)?;
    } else {
        cursor.write_u32(length as u32)?;
        cursor.write_bytes(&jbox.identifier())?;
    }
    cursor.write_bytes(&content)?;

    debug!(
        "{:?} box written with {} content bytes",
        box_type_string(&jbox.identifier()),
        content.len()
    );
    Ok(())
}

/// Serialize a sequence of boxes into a buffer.
pub fn encode_boxes(boxes: &[JP2Box], context: &mut WriteContext) -> Result<Vec<u8>, JP2Error> {
    let mut cursor = BinaryCursor::new(Vec::new());
    for jbox in boxes {
        write_box(jbox, &mut cursor, context)?;
    }
    Ok(cursor.into_inner())
}

/// Serialize a sequence of boxes to `cursor`.
///
/// Everything is encoded before the first byte is written, so a box that
/// fails to encode leaves the destination untouched.
pub fn write_boxes<W: io::Write>(
    boxes: &[JP2Box],
    cursor: &mut BinaryCursor<W>,
    context: &mut WriteContext,
) -> Result<(), JP2Error> {
    let encoded = encode_boxes(boxes, context)?;
    cursor.write_bytes(&encoded)?;
    Ok(())
}
