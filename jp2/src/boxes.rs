use cursor::{BinaryCursor, Window};
use jpc::{parse_main_header, Codestream};
use std::io;
use std::str;

use crate::encode::encode_boxes;
use crate::{
    BoxHeader, BoxType, ColourSpecificationBox, Conformance, ContentReader, ContentWriter,
    DecodeBox, JBox, JP2Error, WriteContext, BOX_TYPE_ASSOCIATION, BOX_TYPE_BITS_PER_COMPONENT,
    BOX_TYPE_CAPTURE_RESOLUTION, BOX_TYPE_CHANNEL_DEFINITION, BOX_TYPE_COMPONENT_MAPPING,
    BOX_TYPE_CONTIGUOUS_CODESTREAM, BOX_TYPE_DATA_ENTRY_URL, BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION,
    BOX_TYPE_FILE_TYPE, BOX_TYPE_HEADER, BOX_TYPE_IMAGE_HEADER, BOX_TYPE_INTELLECTUAL_PROPERTY,
    BOX_TYPE_LABEL, BOX_TYPE_PALETTE, BOX_TYPE_RESOLUTION, BOX_TYPE_SIGNATURE, BOX_TYPE_UUID,
    BOX_TYPE_UUID_INFO, BOX_TYPE_UUID_LIST, BOX_TYPE_XML, BRAND_JP2, BRAND_JPX, SIGNATURE_MAGIC,
};

fn invalid(box_type: BoxType, reason: impl Into<String>) -> JP2Error {
    JP2Error::InvalidBoxState {
        box_type,
        reason: reason.into(),
    }
}

fn remaining(reader: &mut ContentReader) -> Result<u64, JP2Error> {
    Ok(reader.length()? - reader.tell()?)
}

/// JPEG 2000 Signature box.
///
/// The Signature box identifies that the format of this file was defined by the
/// JPEG 2000 Recommendation | International Standard, as well as provides a
/// small amount of information which can help determine the validity of the rest
/// of the file.
///
/// The Signature box shall be the first box in the file, and all files shall
/// contain one and only one Signature box.
///
/// For file verification purposes, this box can be considered a fixed-length
/// 12-byte string which shall have the value: 0x0000 000C 6A50 2020 0D0A 870A.
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.5.1.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureBox {
    length: u64,
    offset: u64,
    signature: [u8; 4],
}

impl Default for SignatureBox {
    fn default() -> Self {
        SignatureBox {
            length: 0,
            offset: 0,
            signature: SIGNATURE_MAGIC,
        }
    }
}

impl SignatureBox {
    pub fn new() -> SignatureBox {
        SignatureBox::default()
    }

    pub fn signature(&self) -> [u8; 4] {
        self.signature
    }
}

impl JBox for SignatureBox {
    // The type of the JPEG 2000 Signature box shall be ‘jP\040\040’ (0x6A50 2020)
    fn identifier(&self) -> BoxType {
        BOX_TYPE_SIGNATURE
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        if self.signature != SIGNATURE_MAGIC {
            return Err(invalid(
                BOX_TYPE_SIGNATURE,
                format!(
                    "signature {:02X?} must be {:02X?}",
                    self.signature, SIGNATURE_MAGIC
                ),
            ));
        }
        writer.write_bytes(&self.signature)?;
        Ok(())
    }
}

impl DecodeBox for SignatureBox {
    // The contents of this box shall be the 4-byte character string ‘<CR><LF><0x87><LF>’ (0x0D0A 870A).
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        Ok(SignatureBox {
            length: header.length,
            offset: header.offset,
            signature: reader.read_array::<4>()?,
        })
    }
}

/// File Type box.
///
/// The File Type box completely defines all of the contents of this file, as
/// well as a separate list of readers with which this file is compatible, and
/// thus the file can be properly interpreted within the scope of that other
/// standard.
///
/// This box shall immediately follow the Signature box.
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.5.2.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileTypeBox {
    length: u64,
    offset: u64,
    brand: [u8; 4],
    minor_version: u32,
    compatibility_list: Vec<[u8; 4]>,
}

impl FileTypeBox {
    pub fn new(brand: [u8; 4], minor_version: u32, compatibility_list: Vec<[u8; 4]>) -> Self {
        FileTypeBox {
            brand,
            minor_version,
            compatibility_list,
            ..Default::default()
        }
    }

    /// Brand `jp2 ` with `jp2 ` as the only compatible reader.
    pub fn jp2() -> Self {
        Self::new(BRAND_JP2, 0, vec![BRAND_JP2])
    }

    /// Brand.
    ///
    /// This field specifies the Recommendation | International Standard which
    /// completely defines this file.
    //
    // If the value of the Brand field is not ‘jp2\040’, then a value of
    // ‘jp2\040’ in the Compatibility list indicates that a JP2 reader can
    // interpret the file in some manner as intended by the creator of the
    // file.
    pub fn brand(&self) -> String {
        String::from_utf8_lossy(&self.brand).into_owned()
    }

    pub fn brand_bytes(&self) -> [u8; 4] {
        self.brand
    }

    /// Minor version.
    ///
    /// The value of this field shall be zero. However, readers shall continue
    /// to parse and interpret this file even if the value of this field is
    /// not zero.
    pub fn minor_version(&self) -> u32 {
        self.minor_version
    }

    /// Compatibility list
    ///
    /// This field specifies a code representing the standard, or a profile of a
    /// standard, to which the file conforms.
    pub fn compatibility_list(&self) -> Vec<String> {
        self.compatibility_list
            .iter()
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect()
    }

    pub fn compatibility_list_bytes(&self) -> &[[u8; 4]] {
        &self.compatibility_list
    }

    pub fn is_compatible_with(&self, brand: [u8; 4]) -> bool {
        self.compatibility_list.contains(&brand)
    }

    pub fn validate(&self, conformance: Conformance) -> Result<(), JP2Error> {
        if self.brand != BRAND_JP2 && self.brand != BRAND_JPX {
            return Err(invalid(
                BOX_TYPE_FILE_TYPE,
                format!("brand must be 'jp2 ' or 'jpx ', not {:?}", self.brand()),
            ));
        }

        // A file shall have at least one CL field in the File Type box
        if self.compatibility_list.is_empty() {
            return Err(invalid(BOX_TYPE_FILE_TYPE, "empty compatibility list"));
        }

        // and shall contain the value ‘jp2\040’ in one of the CL fields.
        if conformance == Conformance::Jp2 && !self.is_compatible_with(BRAND_JP2) {
            return Err(invalid(
                BOX_TYPE_FILE_TYPE,
                format!(
                    "'jp2 ' not found in compatibility list '{}'",
                    self.compatibility_list().join(", ")
                ),
            ));
        }

        Ok(())
    }
}

impl JBox for FileTypeBox {
    // The type of the File Type Box shall be ‘ftyp’ (0x6674 7970).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_FILE_TYPE
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        self.validate(context.options().conformance)?;
        writer.write_bytes(&self.brand)?;
        writer.write_u32(self.minor_version)?;
        for brand in &self.compatibility_list {
            writer.write_bytes(brand)?;
        }
        Ok(())
    }
}

impl DecodeBox for FileTypeBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        let mut file_type_box = FileTypeBox {
            length: header.length,
            offset: header.offset,
            brand: reader.read_array::<4>()?,
            minor_version: reader.read_u32()?,
            compatibility_list: vec![],
        };

        // The number of CL fields is determined by the length of this box
        let mut size = remaining(reader)? / 4;
        while size > 0 {
            file_type_box
                .compatibility_list
                .push(reader.read_array::<4>()?);
            size -= 1;
        }

        Ok(file_type_box)
    }
}

const COMPRESSION_TYPE_WAVELET: u8 = 7;

// I.5.3.1
//
// Image Header box
//
// This box contains fixed length generic information about the image, such as
// the image size and number of components.
//
// The contents of the JP2 Header box shall start with an Image Header box.
//
// Much of the information within the Image Header box is redundant with
// information stored in the codestream itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageHeaderBox {
    length: u64,
    offset: u64,
    height: u32,
    width: u32,
    no_components: u16,
    bits_per_component: u8,
    compression_type: u8,
    colourspace_unknown: u8,
    intellectual_property: u8,
}

impl ImageHeaderBox {
    /// `bits_per_component` is the raw BPC field: bit depth minus one, high
    /// bit set for signed values, or 255 when the depths vary.
    pub fn new(height: u32, width: u32, no_components: u16, bits_per_component: u8) -> Self {
        ImageHeaderBox {
            height,
            width,
            no_components,
            bits_per_component,
            compression_type: COMPRESSION_TYPE_WAVELET,
            ..Default::default()
        }
    }

    pub fn with_colourspace_unknown(mut self, colourspace_unknown: u8) -> Self {
        self.colourspace_unknown = colourspace_unknown;
        self
    }

    pub fn with_intellectual_property(mut self, intellectual_property: u8) -> Self {
        self.intellectual_property = intellectual_property;
        self
    }

    // Image area height.
    //
    // The value of this field shall be Ysiz – YOsiz, where Ysiz and YOsiz are
    // the values of the respective fields in the SIZ marker in the codestream.
    pub fn height(&self) -> u32 {
        self.height
    }

    // Image area width.
    //
    // The value of this field shall be Xsiz – XOsiz.
    pub fn width(&self) -> u32 {
        self.width
    }

    // Number of components.
    //
    // The value of this field shall be equal to the value of the Csiz field in
    // the SIZ marker in the codestream.
    pub fn no_components(&self) -> u16 {
        self.no_components
    }

    pub fn bits_per_component_u8(&self) -> u8 {
        self.bits_per_component
    }

    /// Bit depth shared by all components, `None` when the components vary
    /// in bit depth and a Bits Per Component box carries them.
    pub fn bits_per_component(&self) -> Option<u8> {
        // 1111 1111 (255) Components vary in bit depth
        if self.bits_per_component == 255 {
            None
        } else {
            Some((self.bits_per_component & 0b0111_1111) + 1)
        }
    }

    /// Signedness of the values, false when it varies per component.
    pub fn values_are_signed(&self) -> bool {
        self.bits_per_component != 255 && (self.bits_per_component & 0x80) == 0x80
    }

    // The value of this field shall be 7.
    pub fn compression_type(&self) -> u8 {
        self.compression_type
    }

    // 0 if the colourspace of the image is known and correctly specified in
    // the Colourspace Specification boxes, 1 otherwise.
    pub fn colourspace_unknown(&self) -> u8 {
        self.colourspace_unknown
    }

    // 1 if the file contains an IPR box.
    pub fn intellectual_property(&self) -> u8 {
        self.intellectual_property
    }
}

impl JBox for ImageHeaderBox {
    // The type of the Image Header box shall be ‘ihdr’ (0x6968 6472)
    fn identifier(&self) -> BoxType {
        BOX_TYPE_IMAGE_HEADER
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        writer.write_u32(self.height)?;
        writer.write_u32(self.width)?;
        writer.write_u16(self.no_components)?;
        writer.write_u8(self.bits_per_component)?;
        writer.write_u8(self.compression_type)?;
        writer.write_u8(self.colourspace_unknown)?;
        writer.write_u8(self.intellectual_property)?;
        Ok(())
    }
}

impl DecodeBox for ImageHeaderBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        Ok(ImageHeaderBox {
            length: header.length,
            offset: header.offset,
            height: reader.read_u32()?,
            width: reader.read_u32()?,
            no_components: reader.read_u16()?,
            bits_per_component: reader.read_u8()?,
            compression_type: reader.read_u8()?,
            colourspace_unknown: reader.read_u8()?,
            intellectual_property: reader.read_u8()?,
        })
    }
}

// I.5.3.2
//
// Bits Per Component box
//
// Specifies the bit depth of each component, when the components do not all
// share one. One byte per component, encoded like the BPC field of the Image
// Header box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BitsPerComponentBox {
    length: u64,
    offset: u64,
    bits_per_component: Vec<u8>,
}

impl BitsPerComponentBox {
    pub fn new(bits_per_component: Vec<u8>) -> Self {
        BitsPerComponentBox {
            bits_per_component,
            ..Default::default()
        }
    }

    pub fn no_components(&self) -> usize {
        self.bits_per_component.len()
    }

    pub fn bits_per_component_u8(&self) -> &[u8] {
        &self.bits_per_component
    }

    pub fn bit_depth(&self, i: usize) -> Option<u8> {
        self.bits_per_component
            .get(i)
            .map(|value| (value & 0b0111_1111) + 1)
    }

    pub fn values_are_signed(&self, i: usize) -> Option<bool> {
        self.bits_per_component
            .get(i)
            .map(|value| (value & 0x80) == 0x80)
    }
}

impl JBox for BitsPerComponentBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_BITS_PER_COMPONENT
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        writer.write_bytes(&self.bits_per_component)?;
        Ok(())
    }
}

impl DecodeBox for BitsPerComponentBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        Ok(BitsPerComponentBox {
            length: header.length,
            offset: header.offset,
            bits_per_component: reader.read_bytes(header.content_length())?,
        })
    }
}

// Bytes used by one palette value of a generated component.
fn palette_value_width(bits: u8) -> usize {
    ((bits & 0b0111_1111) as usize + 1 + 7) / 8
}

// I.5.3.4
//
// Palette box
//
// This box defines the palette to be used to create multiple components from
// a single component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaletteBox {
    length: u64,
    offset: u64,

    // B^i: bit depth minus one of each generated component, high bit set for
    // signed values.
    generated_components: Vec<u8>,

    // C^ji: entries[j][i] is the value of generated component i for entry j.
    entries: Vec<Vec<i64>>,
}

const MAX_PALETTE_BIT_DEPTH: u8 = 38;

impl PaletteBox {
    pub fn new(generated_components: Vec<u8>, entries: Vec<Vec<i64>>) -> Self {
        PaletteBox {
            generated_components,
            entries,
            ..Default::default()
        }
    }

    pub fn no_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn no_generated_components(&self) -> usize {
        self.generated_components.len()
    }

    pub fn bit_depth(&self, i: usize) -> Option<u8> {
        self.generated_components
            .get(i)
            .map(|value| (value & 0b0111_1111) + 1)
    }

    pub fn values_are_signed(&self, i: usize) -> Option<bool> {
        self.generated_components
            .get(i)
            .map(|value| (value & 0x80) == 0x80)
    }

    pub fn entries(&self) -> &[Vec<i64>] {
        &self.entries
    }

    pub fn value(&self, entry: usize, component: usize) -> Option<i64> {
        self.entries.get(entry)?.get(component).copied()
    }

    fn validate(&self) -> Result<(), JP2Error> {
        // NE: 1 to 1024 entries, NPC: 1 to 255 components
        if self.entries.is_empty() || self.entries.len() > 1024 {
            return Err(invalid(
                BOX_TYPE_PALETTE,
                format!("{} entries, expected 1 to 1024", self.entries.len()),
            ));
        }
        if self.generated_components.is_empty() || self.generated_components.len() > 255 {
            return Err(invalid(
                BOX_TYPE_PALETTE,
                format!(
                    "{} generated components, expected 1 to 255",
                    self.generated_components.len()
                ),
            ));
        }

        // B^i: bit depths 1 to 38
        for (i, depth) in self.generated_components.iter().enumerate() {
            let bits = (depth & 0b0111_1111) + 1;
            if bits > MAX_PALETTE_BIT_DEPTH {
                return Err(invalid(
                    BOX_TYPE_PALETTE,
                    format!(
                        "generated component {} has bit depth {}, expected 1 to {}",
                        i, bits, MAX_PALETTE_BIT_DEPTH
                    ),
                ));
            }
        }

        for (j, entry) in self.entries.iter().enumerate() {
            if entry.len() != self.generated_components.len() {
                return Err(invalid(
                    BOX_TYPE_PALETTE,
                    format!(
                        "entry {} has {} values, expected {}",
                        j,
                        entry.len(),
                        self.generated_components.len()
                    ),
                ));
            }
            for (i, value) in entry.iter().enumerate() {
                let bits = (self.generated_components[i] & 0b0111_1111) as u32 + 1;
                let (min, max) = if self.generated_components[i] & 0x80 == 0x80 {
                    (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
                } else {
                    (0, (1i64 << bits) - 1)
                };
                if *value < min || *value > max {
                    return Err(invalid(
                        BOX_TYPE_PALETTE,
                        format!(
                            "entry {} component {} value {} does not fit in {} bits",
                            j, i, value, bits
                        ),
                    ));
                }
            }
        }

        Ok(())
    }
}

impl JBox for PaletteBox {
    // The type of the Palette box shall be ‘pclr’ (0x7063 6C72).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_PALETTE
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        self.validate()?;

        writer.write_u16(self.entries.len() as u16)?;
        writer.write_u8(self.generated_components.len() as u8)?;
        writer.write_bytes(&self.generated_components)?;
        for entry in &self.entries {
            for (value, bits) in entry.iter().zip(&self.generated_components) {
                let width = palette_value_width(*bits);
                let mask = if width == 8 {
                    u64::MAX
                } else {
                    (1u64 << (width * 8)) - 1
                };
                writer.write_uint(*value as u64 & mask, width)?;
            }
        }
        Ok(())
    }
}

impl DecodeBox for PaletteBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        let no_entries = reader.read_u16()?;
        let no_generated_components = reader.read_u8()?;
        let generated_components = reader.read_bytes(no_generated_components as u64)?;

        // Entries are stored entry by entry, each value in ceil(bits / 8) bytes.
        let mut entries = Vec::with_capacity(no_entries as usize);
        for _ in 0..no_entries {
            let mut entry = Vec::with_capacity(generated_components.len());
            for bits in &generated_components {
                let signed = bits & 0x80 == 0x80;
                let value = reader.read_fixed(palette_value_width(*bits), signed)?;
                entry.push(value as i64);
            }
            entries.push(entry);
        }

        Ok(PaletteBox {
            length: header.length,
            offset: header.offset,
            generated_components,
            entries,
        })
    }
}

const COMPONENT_MAP_TYPE_DIRECT: u8 = 0;
const COMPONENT_MAP_TYPE_PALETTE: u8 = 1;

#[derive(Debug, PartialEq)]
pub enum ComponentMapType {
    // Direct use.
    //
    // This channel is created directly from an actual component in the
    // codestream.
    Direct,

    // Palette mapping.
    //
    // This channel is created by applying the palette to an actual component
    // in the codestream. The column from the palette to use is specified in
    // the PCOLi field for this channel
    Palette,

    // Reserved for ISO use
    Reserved { value: u8 },
}

impl ComponentMapType {
    fn new(value: u8) -> ComponentMapType {
        match value {
            COMPONENT_MAP_TYPE_DIRECT => ComponentMapType::Direct,
            COMPONENT_MAP_TYPE_PALETTE => ComponentMapType::Palette,
            value => ComponentMapType::Reserved { value },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentMap {
    // CMP^i: index of the codestream component mapped to this channel.
    component: u16,

    // MTYP^i
    mapping_type: u8,

    // PCOL^i: palette column, 0 for direct use.
    palette_column: u8,
}

impl ComponentMap {
    pub fn new(component: u16, mapping_type: u8, palette_column: u8) -> Self {
        ComponentMap {
            component,
            mapping_type,
            palette_column,
        }
    }

    pub fn component(&self) -> u16 {
        self.component
    }

    pub fn mapping_type(&self) -> ComponentMapType {
        ComponentMapType::new(self.mapping_type)
    }

    pub fn palette_column(&self) -> u8 {
        self.palette_column
    }
}

// I.5.3.5
//
// Component Mapping box
//
// Defines how image channels are identified from the actual components
// decoded from the codestream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentMappingBox {
    length: u64,
    offset: u64,
    mappings: Vec<ComponentMap>,
}

impl ComponentMappingBox {
    pub fn new(mappings: Vec<ComponentMap>) -> Self {
        ComponentMappingBox {
            mappings,
            ..Default::default()
        }
    }

    pub fn mappings(&self) -> &[ComponentMap] {
        &self.mappings
    }
}

impl JBox for ComponentMappingBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_COMPONENT_MAPPING
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        for mapping in &self.mappings {
            writer.write_u16(mapping.component)?;
            writer.write_u8(mapping.mapping_type)?;
            writer.write_u8(mapping.palette_column)?;
        }
        Ok(())
    }
}

impl DecodeBox for ComponentMappingBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        // The number of channels is determined by the length of this box
        let mut mappings = vec![];
        while remaining(reader)? >= 4 {
            mappings.push(ComponentMap {
                component: reader.read_u16()?,
                mapping_type: reader.read_u8()?,
                palette_column: reader.read_u8()?,
            });
        }
        Ok(ComponentMappingBox {
            length: header.length,
            offset: header.offset,
            mappings,
        })
    }
}

const CHANNEL_TYPE_COLOUR_IMAGE_DATA: u16 = 0;
const CHANNEL_TYPE_OPACITY_DATA: u16 = 1;
const CHANNEL_TYPE_PREMULTIPLIED_OPACITY: u16 = 2;
const CHANNEL_TYPE_UNSPECIFIED: u16 = u16::MAX;

#[derive(Debug, PartialEq)]
pub enum ChannelTypes {
    ColourImageData,
    Opacity,
    PremultipliedOpacity,
    Reserved { value: u16 },
    Unspecified,
}

impl ChannelTypes {
    fn new(value: u16) -> ChannelTypes {
        match value {
            CHANNEL_TYPE_COLOUR_IMAGE_DATA => ChannelTypes::ColourImageData,
            CHANNEL_TYPE_OPACITY_DATA => ChannelTypes::Opacity,
            CHANNEL_TYPE_PREMULTIPLIED_OPACITY => ChannelTypes::PremultipliedOpacity,
            CHANNEL_TYPE_UNSPECIFIED => ChannelTypes::Unspecified,
            value => ChannelTypes::Reserved { value },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    // Cn^i: index of the channel for this description.
    channel_index: u16,

    // Typ^i: type of the channel.
    channel_type: u16,

    // Asoc^i: index of the colour this channel is associated with, 0 for the
    // whole image, 2^16 - 1 for no association.
    channel_association: u16,
}

impl Channel {
    pub fn new(channel_index: u16, channel_type: u16, channel_association: u16) -> Self {
        Channel {
            channel_index,
            channel_type,
            channel_association,
        }
    }

    pub fn channel_index(&self) -> u16 {
        self.channel_index
    }

    pub fn channel_type(&self) -> ChannelTypes {
        ChannelTypes::new(self.channel_type)
    }

    pub fn channel_type_u16(&self) -> u16 {
        self.channel_type
    }

    pub fn channel_association(&self) -> u16 {
        self.channel_association
    }
}

// I.5.3.6
//
// Channel Definition Box
//
// The Channel Definition box specifies the meaning of the samples in each
// channel in the image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelDefinitionBox {
    length: u64,
    offset: u64,
    channels: Vec<Channel>,
}

impl ChannelDefinitionBox {
    pub fn new(channels: Vec<Channel>) -> Self {
        ChannelDefinitionBox {
            channels,
            ..Default::default()
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

impl JBox for ChannelDefinitionBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_CHANNEL_DEFINITION
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        writer.write_u16(self.channels.len() as u16)?;
        for channel in &self.channels {
            writer.write_u16(channel.channel_index)?;
            writer.write_u16(channel.channel_type)?;
            writer.write_u16(channel.channel_association)?;
        }
        Ok(())
    }
}

impl DecodeBox for ChannelDefinitionBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        let no_channels = reader.read_u16()?;
        let mut channels = Vec::with_capacity(no_channels as usize);
        for _ in 0..no_channels {
            channels.push(Channel {
                channel_index: reader.read_u16()?,
                channel_type: reader.read_u16()?,
                channel_association: reader.read_u16()?,
            });
        }
        Ok(ChannelDefinitionBox {
            length: header.length,
            offset: header.offset,
            channels,
        })
    }
}

// I.5.3.7.1 and I.5.3.7.2
//
// Capture Resolution box and Default Display Resolution box
//
// Both carry a vertical and a horizontal grid resolution in points per metre,
// R = RN / RD * 10^RE.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionBox {
    box_type: BoxType,
    length: u64,
    offset: u64,
    vertical_numerator: u16,
    vertical_denominator: u16,
    horizontal_numerator: u16,
    horizontal_denominator: u16,
    vertical_exponent: i8,
    horizontal_exponent: i8,
}

impl ResolutionBox {
    /// Capture resolution, `(numerator, denominator, exponent)` per axis.
    pub fn capture(vertical: (u16, u16, i8), horizontal: (u16, u16, i8)) -> Self {
        Self::with_type(BOX_TYPE_CAPTURE_RESOLUTION, vertical, horizontal)
    }

    /// Default display resolution, `(numerator, denominator, exponent)` per axis.
    pub fn default_display(vertical: (u16, u16, i8), horizontal: (u16, u16, i8)) -> Self {
        Self::with_type(BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION, vertical, horizontal)
    }

    fn with_type(box_type: BoxType, vertical: (u16, u16, i8), horizontal: (u16, u16, i8)) -> Self {
        ResolutionBox {
            box_type,
            vertical_numerator: vertical.0,
            vertical_denominator: vertical.1,
            vertical_exponent: vertical.2,
            horizontal_numerator: horizontal.0,
            horizontal_denominator: horizontal.1,
            horizontal_exponent: horizontal.2,
            ..Default::default()
        }
    }

    pub fn vertical_numerator(&self) -> u16 {
        self.vertical_numerator
    }
    pub fn vertical_denominator(&self) -> u16 {
        self.vertical_denominator
    }
    pub fn vertical_exponent(&self) -> i8 {
        self.vertical_exponent
    }
    pub fn horizontal_numerator(&self) -> u16 {
        self.horizontal_numerator
    }
    pub fn horizontal_denominator(&self) -> u16 {
        self.horizontal_denominator
    }
    pub fn horizontal_exponent(&self) -> i8 {
        self.horizontal_exponent
    }

    // VR = VRN/VRD * 10^VRE, none for a zero denominator
    pub fn vertical_resolution(&self) -> Option<f64> {
        resolution(
            self.vertical_numerator,
            self.vertical_denominator,
            self.vertical_exponent,
        )
    }

    // HR = HRN/HRD * 10^HRE
    pub fn horizontal_resolution(&self) -> Option<f64> {
        resolution(
            self.horizontal_numerator,
            self.horizontal_denominator,
            self.horizontal_exponent,
        )
    }
}

fn resolution(numerator: u16, denominator: u16, exponent: i8) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64 * 10f64.powi(exponent as i32))
}

impl JBox for ResolutionBox {
    fn identifier(&self) -> BoxType {
        self.box_type
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        if self.vertical_denominator == 0 || self.horizontal_denominator == 0 {
            return Err(invalid(self.box_type, "resolution denominator is 0"));
        }
        writer.write_u16(self.vertical_numerator)?;
        writer.write_u16(self.vertical_denominator)?;
        writer.write_u16(self.horizontal_numerator)?;
        writer.write_u16(self.horizontal_denominator)?;
        writer.write_i8(self.vertical_exponent)?;
        writer.write_i8(self.horizontal_exponent)?;
        Ok(())
    }
}

impl DecodeBox for ResolutionBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        Ok(ResolutionBox {
            box_type: header.box_type,
            length: header.length,
            offset: header.offset,
            vertical_numerator: reader.read_u16()?,
            vertical_denominator: reader.read_u16()?,
            horizontal_numerator: reader.read_u16()?,
            horizontal_denominator: reader.read_u16()?,
            vertical_exponent: reader.read_i8()?,
            horizontal_exponent: reader.read_i8()?,
        })
    }
}

/// Intellectual Property box.
///
/// Intellectual property rights information, such as moral rights, copyrights
/// and exploitation information. The content is reserved to ISO in JP2 and is
/// well formed XML in JPX; it is kept as bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntellectualPropertyBox {
    length: u64,
    offset: u64,
    data: Vec<u8>,
}

impl IntellectualPropertyBox {
    pub fn new(data: Vec<u8>) -> Self {
        IntellectualPropertyBox {
            data,
            ..Default::default()
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl JBox for IntellectualPropertyBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_INTELLECTUAL_PROPERTY
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        writer.write_bytes(&self.data)?;
        Ok(())
    }
}

impl DecodeBox for IntellectualPropertyBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        Ok(IntellectualPropertyBox {
            length: header.length,
            offset: header.offset,
            data: reader.read_bytes(header.content_length())?,
        })
    }
}

/// XML box. The text is stored verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XMLBox {
    length: u64,
    offset: u64,
    xml: Vec<u8>,
}

impl XMLBox {
    pub fn new(xml: impl Into<Vec<u8>>) -> Self {
        XMLBox {
            xml: xml.into(),
            ..Default::default()
        }
    }

    pub fn xml(&self) -> &[u8] {
        &self.xml
    }

    pub fn format(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.xml)
    }
}

impl JBox for XMLBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_XML
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        writer.write_bytes(&self.xml)?;
        Ok(())
    }
}

impl DecodeBox for XMLBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        Ok(XMLBox {
            length: header.length,
            offset: header.offset,
            xml: reader.read_bytes(header.content_length())?,
        })
    }
}

/// UUID of the XMP packet box, BE7ACFCB-97A9-42E8-9C71-999491E3AFAC.
pub const UUID_XMP: [u8; 16] = [
    0xBE, 0x7A, 0xCF, 0xCB, 0x97, 0xA9, 0x42, 0xE8, 0x9C, 0x71, 0x99, 0x94, 0x91, 0xE3, 0xAF, 0xAC,
];

/// Formats a UUID as `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
pub fn uuid_string(uuid: &[u8; 16]) -> String {
    let hex: Vec<String> = uuid.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        hex[0..4].concat(),
        hex[4..6].concat(),
        hex[6..8].concat(),
        hex[8..10].concat(),
        hex[10..16].concat()
    )
}

/// UUID box.
///
/// Vendor specific data identified by a UUID. An XMP packet is a UUID box
/// with [`UUID_XMP`] whose data is UTF-8 XML.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UUIDBox {
    length: u64,
    offset: u64,
    uuid: [u8; 16],
    data: Vec<u8>,
}

impl UUIDBox {
    pub fn new(uuid: [u8; 16], data: Vec<u8>) -> Self {
        UUIDBox {
            uuid,
            data,
            ..Default::default()
        }
    }

    pub fn xmp(packet: impl Into<Vec<u8>>) -> Self {
        Self::new(UUID_XMP, packet.into())
    }

    pub fn uuid(&self) -> &[u8; 16] {
        &self.uuid
    }

    pub fn uuid_string(&self) -> String {
        uuid_string(&self.uuid)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_xmp(&self) -> bool {
        self.uuid == UUID_XMP
    }

    /// XMP packet text, for an XMP UUID box holding UTF-8.
    pub fn xmp_packet(&self) -> Option<&str> {
        if !self.is_xmp() {
            return None;
        }
        str::from_utf8(&self.data).ok()
    }
}

impl JBox for UUIDBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_UUID
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        writer.write_bytes(&self.uuid)?;
        writer.write_bytes(&self.data)?;
        Ok(())
    }
}

impl DecodeBox for UUIDBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        let uuid = reader.read_array::<16>()?;
        let data = reader.read_bytes(header.content_length() - 16)?;
        Ok(UUIDBox {
            length: header.length,
            offset: header.offset,
            uuid,
            data,
        })
    }
}

/// UUID List box, the UUIDs a UUID Info box refers to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UUIDListBox {
    length: u64,
    offset: u64,
    ids: Vec<[u8; 16]>,
}

impl UUIDListBox {
    pub fn new(ids: Vec<[u8; 16]>) -> Self {
        UUIDListBox {
            ids,
            ..Default::default()
        }
    }

    pub fn ids(&self) -> &[[u8; 16]] {
        &self.ids
    }
}

impl JBox for UUIDListBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_UUID_LIST
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        writer.write_u16(self.ids.len() as u16)?;
        for id in &self.ids {
            writer.write_bytes(id)?;
        }
        Ok(())
    }
}

impl DecodeBox for UUIDListBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        let no_ids = reader.read_u16()?;
        let mut ids = Vec::with_capacity(no_ids as usize);
        for _ in 0..no_ids {
            ids.push(reader.read_array::<16>()?);
        }
        Ok(UUIDListBox {
            length: header.length,
            offset: header.offset,
            ids,
        })
    }
}

/// Data Entry URL box, where to find more about the UUIDs of a UUID Info box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataEntryURLBox {
    length: u64,
    offset: u64,
    version: u8,

    // 24 bit flags
    flags: u32,

    // Null terminated in the file, stored without the terminator.
    location: Vec<u8>,
}

impl DataEntryURLBox {
    pub fn new(version: u8, flags: u32, location: impl Into<Vec<u8>>) -> Self {
        DataEntryURLBox {
            version,
            flags,
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn location(&self) -> String {
        String::from_utf8_lossy(&self.location).into_owned()
    }
}

impl JBox for DataEntryURLBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_DATA_ENTRY_URL
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        if self.location.contains(&0) {
            return Err(invalid(
                BOX_TYPE_DATA_ENTRY_URL,
                "location contains a null byte",
            ));
        }
        writer.write_u8(self.version)?;
        writer.write_uint(self.flags as u64, 3)?;
        writer.write_bytes(&self.location)?;
        writer.write_u8(0)?;
        Ok(())
    }
}

impl DecodeBox for DataEntryURLBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        let version = reader.read_u8()?;
        let flags = reader.read_uint(3)? as u32;
        let mut location = reader.read_bytes(header.content_length() - 4)?;
        if let Some(end) = location.iter().position(|b| *b == 0) {
            location.truncate(end);
        }
        Ok(DataEntryURLBox {
            length: header.length,
            offset: header.offset,
            version,
            flags,
            location,
        })
    }
}

/// Label box (JPX), a human readable label for its association.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelBox {
    length: u64,
    offset: u64,
    label: Vec<u8>,
}

impl LabelBox {
    pub fn new(label: impl Into<Vec<u8>>) -> Self {
        LabelBox {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn label(&self) -> String {
        String::from_utf8_lossy(&self.label).into_owned()
    }
}

impl JBox for LabelBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_LABEL
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        writer.write_bytes(&self.label)?;
        Ok(())
    }
}

impl DecodeBox for LabelBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        Ok(LabelBox {
            length: header.length,
            offset: header.offset,
            label: reader.read_bytes(header.content_length())?,
        })
    }
}

/// Where the bytes of a codestream live.
#[derive(Debug, Clone, PartialEq)]
pub enum CodestreamData {
    /// A byte range of the source the tree was parsed from.
    Source { offset: u64, length: u64 },
    Memory(Vec<u8>),
}

impl Default for CodestreamData {
    fn default() -> Self {
        CodestreamData::Memory(vec![])
    }
}

/// Contiguous Codestream box.
///
/// Holds one valid and complete JPEG 2000 codestream. Parsed boxes keep the
/// codestream in their source; its main header is only scanned on request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContiguousCodestreamBox {
    length: u64,
    offset: u64,
    data: CodestreamData,
}

impl ContiguousCodestreamBox {
    pub fn new(codestream: Vec<u8>) -> Self {
        ContiguousCodestreamBox {
            data: CodestreamData::Memory(codestream),
            ..Default::default()
        }
    }

    pub(crate) fn from_source(header: &BoxHeader) -> Self {
        ContiguousCodestreamBox {
            length: header.length,
            offset: header.offset,
            data: CodestreamData::Source {
                offset: header.content_offset(),
                length: header.content_length(),
            },
        }
    }

    pub fn data(&self) -> &CodestreamData {
        &self.data
    }

    /// Offset of the codestream in the source, for a parsed box.
    pub fn codestream_offset(&self) -> Option<u64> {
        match self.data {
            CodestreamData::Source { offset, .. } => Some(offset),
            CodestreamData::Memory(_) => None,
        }
    }

    pub fn codestream_length(&self) -> u64 {
        match &self.data {
            CodestreamData::Source { length, .. } => *length,
            CodestreamData::Memory(data) => data.len() as u64,
        }
    }

    /// Scan the main header of the codestream.
    ///
    /// `source` is only read for a box parsed from it, and only within the
    /// box.
    pub fn codestream<R: io::Read + io::Seek>(&self, source: &mut R) -> Result<Codestream, JP2Error> {
        match &self.data {
            CodestreamData::Source { offset, length } => {
                let window = Window::new(source, *offset, offset.saturating_add(*length))?;
                let mut cursor = BinaryCursor::new(window);
                Ok(parse_main_header(&mut cursor)?)
            }
            CodestreamData::Memory(data) => {
                let mut cursor = BinaryCursor::new(io::Cursor::new(data.as_slice()));
                Ok(parse_main_header(&mut cursor)?)
            }
        }
    }

    /// Copy the codestream bytes out of `source` (or out of memory).
    pub fn read_codestream<R: io::Read + io::Seek>(
        &self,
        source: &mut R,
    ) -> Result<Vec<u8>, JP2Error> {
        match &self.data {
            CodestreamData::Source { offset, length } => {
                let mut cursor = BinaryCursor::new(source);
                cursor.seek(*offset)?;
                Ok(cursor.read_bytes(*length)?)
            }
            CodestreamData::Memory(data) => Ok(data.clone()),
        }
    }
}

impl JBox for ContiguousCodestreamBox {
    // The type of a Contiguous Codestream box shall be ‘jp2c’ (0x6A70 3263)
    fn identifier(&self) -> BoxType {
        BOX_TYPE_CONTIGUOUS_CODESTREAM
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        match &self.data {
            CodestreamData::Memory(data) => {
                if data.is_empty() {
                    return Err(invalid(
                        BOX_TYPE_CONTIGUOUS_CODESTREAM,
                        "no codestream data",
                    ));
                }
                writer.write_bytes(data)?;
            }
            CodestreamData::Source { offset, length } => {
                let source = context.source().ok_or_else(|| {
                    invalid(
                        BOX_TYPE_CONTIGUOUS_CODESTREAM,
                        "no source to copy the codestream from",
                    )
                })?;
                let mut cursor = BinaryCursor::new(source);
                cursor.seek(*offset)?;
                writer.write_bytes(&cursor.read_bytes(*length)?)?;
            }
        }
        Ok(())
    }
}

/// A box kept as its raw content: unrecognized types, and recognized boxes
/// whose content could not be decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnknownBox {
    box_type: BoxType,
    length: u64,
    offset: u64,
    data: Vec<u8>,
}

impl UnknownBox {
    pub fn new(box_type: BoxType, data: Vec<u8>) -> Self {
        UnknownBox {
            box_type,
            data,
            ..Default::default()
        }
    }

    pub(crate) fn from_content(header: &BoxHeader, data: Vec<u8>) -> Self {
        UnknownBox {
            box_type: header.box_type,
            length: header.length,
            offset: header.offset,
            data,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl JBox for UnknownBox {
    fn identifier(&self) -> BoxType {
        self.box_type
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        _context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        writer.write_bytes(&self.data)?;
        Ok(())
    }
}

/// A box made of other boxes: JP2 Header, Resolution, UUID Info and
/// Association.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuperBox {
    box_type: BoxType,
    length: u64,
    offset: u64,
    boxes: Vec<JP2Box>,
}

impl SuperBox {
    fn new(box_type: BoxType, boxes: Vec<JP2Box>) -> Self {
        SuperBox {
            box_type,
            boxes,
            ..Default::default()
        }
    }

    pub(crate) fn from_children(header: &BoxHeader, boxes: Vec<JP2Box>) -> Self {
        SuperBox {
            box_type: header.box_type,
            length: header.length,
            offset: header.offset,
            boxes,
        }
    }

    pub fn boxes(&self) -> &[JP2Box] {
        &self.boxes
    }

    pub fn image_header_box(&self) -> Option<&ImageHeaderBox> {
        self.boxes.iter().find_map(|jbox| match jbox {
            JP2Box::ImageHeader(ihdr) => Some(ihdr),
            _ => None,
        })
    }

    pub fn bits_per_component_box(&self) -> Option<&BitsPerComponentBox> {
        self.boxes.iter().find_map(|jbox| match jbox {
            JP2Box::BitsPerComponent(bpcc) => Some(bpcc),
            _ => None,
        })
    }

    pub fn colour_specification_boxes(&self) -> Vec<&ColourSpecificationBox> {
        self.boxes
            .iter()
            .filter_map(|jbox| match jbox {
                JP2Box::ColourSpecification(colr) => Some(colr),
                _ => None,
            })
            .collect()
    }

    pub fn palette_box(&self) -> Option<&PaletteBox> {
        self.boxes.iter().find_map(|jbox| match jbox {
            JP2Box::Palette(pclr) => Some(pclr),
            _ => None,
        })
    }

    pub fn component_mapping_box(&self) -> Option<&ComponentMappingBox> {
        self.boxes.iter().find_map(|jbox| match jbox {
            JP2Box::ComponentMapping(cmap) => Some(cmap),
            _ => None,
        })
    }

    pub fn channel_definition_box(&self) -> Option<&ChannelDefinitionBox> {
        self.boxes.iter().find_map(|jbox| match jbox {
            JP2Box::ChannelDefinition(cdef) => Some(cdef),
            _ => None,
        })
    }

    pub fn resolution_box(&self) -> Option<&SuperBox> {
        self.boxes.iter().find_map(|jbox| match jbox {
            JP2Box::Resolution(res) => Some(res),
            _ => None,
        })
    }

    /// Ways this JP2 Header box breaks the JP2 Header rules, empty for a
    /// conforming one.
    pub fn header_problems(&self) -> Vec<String> {
        let mut problems = vec![];

        let image_header_boxes: Vec<&ImageHeaderBox> = self
            .boxes
            .iter()
            .filter_map(|jbox| match jbox {
                JP2Box::ImageHeader(ihdr) => Some(ihdr),
                _ => None,
            })
            .collect();

        // The contents of the JP2 Header box shall start with an Image Header box.
        match image_header_boxes.len() {
            0 => problems.push("no image header box".to_owned()),
            1 => {
                if !matches!(self.boxes.first(), Some(JP2Box::ImageHeader(_))) {
                    problems.push("the image header box is not the first box".to_owned());
                }
            }
            n => problems.push(format!("{} image header boxes, expected 1", n)),
        }

        // There shall be at least one Colour Specification box
        if self.colour_specification_boxes().is_empty() {
            problems.push("no colour specification box".to_owned());
        }

        if let Some(ihdr) = image_header_boxes.first() {
            match (ihdr.bits_per_component(), self.bits_per_component_box()) {
                (None, None) => problems.push(
                    "component bit depths vary but there is no bits per component box".to_owned(),
                ),
                (_, Some(bpcc)) if bpcc.no_components() != ihdr.no_components() as usize => {
                    problems.push(format!(
                        "bits per component box lists {} components, the image header {}",
                        bpcc.no_components(),
                        ihdr.no_components()
                    ))
                }
                _ => {}
            }
        }

        problems
    }
}

impl JBox for SuperBox {
    fn identifier(&self) -> BoxType {
        self.box_type
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        if self.box_type == BOX_TYPE_HEADER {
            if let Some(problem) = self.header_problems().into_iter().next() {
                return Err(invalid(BOX_TYPE_HEADER, problem));
            }
        }
        writer.write_bytes(&encode_boxes(&self.boxes, context)?)?;
        Ok(())
    }
}

/// Any box of a JP2 or JPX file.
#[derive(Debug, Clone, PartialEq)]
pub enum JP2Box {
    Signature(SignatureBox),
    FileType(FileTypeBox),
    Header(SuperBox),
    ImageHeader(ImageHeaderBox),
    BitsPerComponent(BitsPerComponentBox),
    ColourSpecification(ColourSpecificationBox),
    Palette(PaletteBox),
    ComponentMapping(ComponentMappingBox),
    ChannelDefinition(ChannelDefinitionBox),
    Resolution(SuperBox),
    CaptureResolution(ResolutionBox),
    DefaultDisplayResolution(ResolutionBox),
    ContiguousCodestream(ContiguousCodestreamBox),
    IntellectualProperty(IntellectualPropertyBox),
    Xml(XMLBox),
    Uuid(UUIDBox),
    UUIDInfo(SuperBox),
    UUIDList(UUIDListBox),
    DataEntryURL(DataEntryURLBox),
    Association(SuperBox),
    Label(LabelBox),
    Unknown(UnknownBox),
}

impl JP2Box {
    pub fn header(boxes: Vec<JP2Box>) -> JP2Box {
        JP2Box::Header(SuperBox::new(BOX_TYPE_HEADER, boxes))
    }

    pub fn resolution(boxes: Vec<JP2Box>) -> JP2Box {
        JP2Box::Resolution(SuperBox::new(BOX_TYPE_RESOLUTION, boxes))
    }

    pub fn uuid_info(boxes: Vec<JP2Box>) -> JP2Box {
        JP2Box::UUIDInfo(SuperBox::new(BOX_TYPE_UUID_INFO, boxes))
    }

    pub fn association(boxes: Vec<JP2Box>) -> JP2Box {
        JP2Box::Association(SuperBox::new(BOX_TYPE_ASSOCIATION, boxes))
    }

    fn as_jbox(&self) -> &dyn JBox {
        match self {
            JP2Box::Signature(jbox) => jbox,
            JP2Box::FileType(jbox) => jbox,
            JP2Box::Header(jbox) => jbox,
            JP2Box::ImageHeader(jbox) => jbox,
            JP2Box::BitsPerComponent(jbox) => jbox,
            JP2Box::ColourSpecification(jbox) => jbox,
            JP2Box::Palette(jbox) => jbox,
            JP2Box::ComponentMapping(jbox) => jbox,
            JP2Box::ChannelDefinition(jbox) => jbox,
            JP2Box::Resolution(jbox) => jbox,
            JP2Box::CaptureResolution(jbox) => jbox,
            JP2Box::DefaultDisplayResolution(jbox) => jbox,
            JP2Box::ContiguousCodestream(jbox) => jbox,
            JP2Box::IntellectualProperty(jbox) => jbox,
            JP2Box::Xml(jbox) => jbox,
            JP2Box::Uuid(jbox) => jbox,
            JP2Box::UUIDInfo(jbox) => jbox,
            JP2Box::UUIDList(jbox) => jbox,
            JP2Box::DataEntryURL(jbox) => jbox,
            JP2Box::Association(jbox) => jbox,
            JP2Box::Label(jbox) => jbox,
            JP2Box::Unknown(jbox) => jbox,
        }
    }

    /// Child boxes, for a superbox.
    pub fn children(&self) -> Option<&[JP2Box]> {
        match self {
            JP2Box::Header(superbox)
            | JP2Box::Resolution(superbox)
            | JP2Box::UUIDInfo(superbox)
            | JP2Box::Association(superbox) => Some(superbox.boxes()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JP2Box::Signature(_) => "JPEG 2000 Signature",
            JP2Box::FileType(_) => "File Type",
            JP2Box::Header(_) => "JP2 Header",
            JP2Box::ImageHeader(_) => "Image Header",
            JP2Box::BitsPerComponent(_) => "Bits Per Component",
            JP2Box::ColourSpecification(_) => "Colour Specification",
            JP2Box::Palette(_) => "Palette",
            JP2Box::ComponentMapping(_) => "Component Mapping",
            JP2Box::ChannelDefinition(_) => "Channel Definition",
            JP2Box::Resolution(_) => "Resolution",
            JP2Box::CaptureResolution(_) => "Capture Resolution",
            JP2Box::DefaultDisplayResolution(_) => "Default Display Resolution",
            JP2Box::ContiguousCodestream(_) => "Contiguous Codestream",
            JP2Box::IntellectualProperty(_) => "Intellectual Property",
            JP2Box::Xml(_) => "XML",
            JP2Box::Uuid(uuid) if uuid.is_xmp() => "UUID (XMP)",
            JP2Box::Uuid(_) => "UUID",
            JP2Box::UUIDInfo(_) => "UUID Info",
            JP2Box::UUIDList(_) => "UUID List",
            JP2Box::DataEntryURL(_) => "Data Entry URL",
            JP2Box::Association(_) => "Association",
            JP2Box::Label(_) => "Label",
            JP2Box::Unknown(_) => "Unknown",
        }
    }
}

impl JBox for JP2Box {
    fn identifier(&self) -> BoxType {
        self.as_jbox().identifier()
    }

    fn length(&self) -> u64 {
        self.as_jbox().length()
    }

    fn offset(&self) -> u64 {
        self.as_jbox().offset()
    }

    fn encode_content(
        &self,
        writer: &mut ContentWriter,
        context: &mut WriteContext,
    ) -> Result<(), JP2Error> {
        self.as_jbox().encode_content(writer, context)
    }
}
