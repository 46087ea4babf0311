use icc::{decode_header, ICCProfileHeader};
use log::debug;
use std::fmt;

use crate::{
    BoxHeader, BoxType, Conformance, ContentReader, ContentWriter, DecodeBox, JBox, JP2Error,
    WriteContext, BOX_TYPE_COLOUR_SPECIFICATION,
};

pub const METHOD_ENUMERATED_COLOUR_SPACE: u8 = 1;
pub const METHOD_RESTRICTED_ICC_PROFILE: u8 = 2;
pub const METHOD_ANY_ICC_PROFILE: u8 = 3;

#[derive(Debug, PartialEq)]
pub enum ColourSpecificationMethods {
    EnumeratedColourSpace,
    RestrictedICCProfile,
    AnyICCProfile,
    Reserved { value: u8 },
}

impl ColourSpecificationMethods {
    pub fn new(value: u8) -> ColourSpecificationMethods {
        match value {
            METHOD_ENUMERATED_COLOUR_SPACE => ColourSpecificationMethods::EnumeratedColourSpace,
            METHOD_RESTRICTED_ICC_PROFILE => ColourSpecificationMethods::RestrictedICCProfile,
            METHOD_ANY_ICC_PROFILE => ColourSpecificationMethods::AnyICCProfile,
            value => ColourSpecificationMethods::Reserved { value },
        }
    }
}

impl fmt::Display for ColourSpecificationMethods {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EnumeratedColourSpace => write!(f, "enumerated colourspace"),
            Self::RestrictedICCProfile => write!(f, "restricted ICC profile"),
            Self::AnyICCProfile => write!(f, "any ICC profile"),
            Self::Reserved { value } => write!(f, "reserved method {}", value),
        }
    }
}

pub const ENUMERATED_COLOUR_SPACE_BILEVEL: u32 = 0;
pub const ENUMERATED_COLOUR_SPACE_YCBCR1: u32 = 1;
pub const ENUMERATED_COLOUR_SPACE_YCBCR2: u32 = 3;
pub const ENUMERATED_COLOUR_SPACE_YCBCR3: u32 = 4;
pub const ENUMERATED_COLOUR_SPACE_PHOTO_YCC: u32 = 9;
pub const ENUMERATED_COLOUR_SPACE_CMY: u32 = 11;
pub const ENUMERATED_COLOUR_SPACE_CMYK: u32 = 12;
pub const ENUMERATED_COLOUR_SPACE_YCCK: u32 = 13;
pub const ENUMERATED_COLOUR_SPACE_CIELAB: u32 = 14;
pub const ENUMERATED_COLOUR_SPACE_BILEVEL2: u32 = 15;
pub const ENUMERATED_COLOUR_SPACE_SRGB: u32 = 16;
pub const ENUMERATED_COLOUR_SPACE_GREYSCALE: u32 = 17;
pub const ENUMERATED_COLOUR_SPACE_SYCC: u32 = 18;
pub const ENUMERATED_COLOUR_SPACE_CIEJAB: u32 = 19;
pub const ENUMERATED_COLOUR_SPACE_ESRGB: u32 = 20;
pub const ENUMERATED_COLOUR_SPACE_ROMM_RGB: u32 = 21;
pub const ENUMERATED_COLOUR_SPACE_YPBPR_1125_60: u32 = 22;
pub const ENUMERATED_COLOUR_SPACE_YPBPR_1250_50: u32 = 23;
pub const ENUMERATED_COLOUR_SPACE_ESYCC: u32 = 24;
pub const ENUMERATED_COLOUR_SPACE_SCRGB: u32 = 25;
pub const ENUMERATED_COLOUR_SPACE_SCRGB_GRAYSCALE: u32 = 26;

#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq)]
pub enum EnumeratedColourSpaces {
    BiLevel,
    YCbCr1,
    YCbCr2,
    YCbCr3,
    PhotoYCC,
    CMY,
    CMYK,
    YCCK,
    CIELab,
    BiLevel2,
    sRGB,
    Greyscale,
    sYCC,
    CIEJab,
    esRGB,
    ROMMRGB,
    YPbPr112560,
    YPbPr125050,
    esYCC,
    scRGB,
    scRGBGrayScale,
    Reserved { value: u32 },
}

impl EnumeratedColourSpaces {
    pub fn new(value: u32) -> EnumeratedColourSpaces {
        match value {
            ENUMERATED_COLOUR_SPACE_BILEVEL => EnumeratedColourSpaces::BiLevel,
            ENUMERATED_COLOUR_SPACE_YCBCR1 => EnumeratedColourSpaces::YCbCr1,
            ENUMERATED_COLOUR_SPACE_YCBCR2 => EnumeratedColourSpaces::YCbCr2,
            ENUMERATED_COLOUR_SPACE_YCBCR3 => EnumeratedColourSpaces::YCbCr3,
            ENUMERATED_COLOUR_SPACE_PHOTO_YCC => EnumeratedColourSpaces::PhotoYCC,
            ENUMERATED_COLOUR_SPACE_CMY => EnumeratedColourSpaces::CMY,
            ENUMERATED_COLOUR_SPACE_CMYK => EnumeratedColourSpaces::CMYK,
            ENUMERATED_COLOUR_SPACE_YCCK => EnumeratedColourSpaces::YCCK,
            ENUMERATED_COLOUR_SPACE_CIELAB => EnumeratedColourSpaces::CIELab,
            ENUMERATED_COLOUR_SPACE_BILEVEL2 => EnumeratedColourSpaces::BiLevel2,
            ENUMERATED_COLOUR_SPACE_SRGB => EnumeratedColourSpaces::sRGB,
            ENUMERATED_COLOUR_SPACE_GREYSCALE => EnumeratedColourSpaces::Greyscale,
            ENUMERATED_COLOUR_SPACE_SYCC => EnumeratedColourSpaces::sYCC,
            ENUMERATED_COLOUR_SPACE_CIEJAB => EnumeratedColourSpaces::CIEJab,
            ENUMERATED_COLOUR_SPACE_ESRGB => EnumeratedColourSpaces::esRGB,
            ENUMERATED_COLOUR_SPACE_ROMM_RGB => EnumeratedColourSpaces::ROMMRGB,
            ENUMERATED_COLOUR_SPACE_YPBPR_1125_60 => EnumeratedColourSpaces::YPbPr112560,
            ENUMERATED_COLOUR_SPACE_YPBPR_1250_50 => EnumeratedColourSpaces::YPbPr125050,
            ENUMERATED_COLOUR_SPACE_ESYCC => EnumeratedColourSpaces::esYCC,
            ENUMERATED_COLOUR_SPACE_SCRGB => EnumeratedColourSpaces::scRGB,
            ENUMERATED_COLOUR_SPACE_SCRGB_GRAYSCALE => EnumeratedColourSpaces::scRGBGrayScale,
            value => EnumeratedColourSpaces::Reserved { value },
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EnumeratedColourSpaces::Reserved { .. })
    }
}

impl fmt::Display for EnumeratedColourSpaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnumeratedColourSpaces::BiLevel => "Bi-level",
            EnumeratedColourSpaces::YCbCr1 => "YCbCr(1)",
            EnumeratedColourSpaces::YCbCr2 => "YCbCr(2)",
            EnumeratedColourSpaces::YCbCr3 => "YCbCr(3)",
            EnumeratedColourSpaces::PhotoYCC => "PhotoYCC",
            EnumeratedColourSpaces::CMY => "CMY",
            EnumeratedColourSpaces::CMYK => "CMYK",
            EnumeratedColourSpaces::YCCK => "YCCK",
            EnumeratedColourSpaces::CIELab => "CIELab",
            EnumeratedColourSpaces::BiLevel2 => "Bi-level(2)",
            EnumeratedColourSpaces::sRGB => "sRGB",
            EnumeratedColourSpaces::Greyscale => "greyscale",
            EnumeratedColourSpaces::sYCC => "sYCC",
            EnumeratedColourSpaces::CIEJab => "CIEJab",
            EnumeratedColourSpaces::esRGB => "e-sRGB",
            EnumeratedColourSpaces::ROMMRGB => "ROMM-RGB",
            EnumeratedColourSpaces::YPbPr112560 => "YPbPr(1125/60)",
            EnumeratedColourSpaces::YPbPr125050 => "YPbPr(1250/50)",
            EnumeratedColourSpaces::esYCC => "e-sYCC",
            EnumeratedColourSpaces::scRGB => "scRGB",
            EnumeratedColourSpaces::scRGBGrayScale => "scRGB gray scale",
            EnumeratedColourSpaces::Reserved { value } => {
                return write!(f, "reserved ({})", value);
            }
        };
        write!(f, "{}", name)
    }
}

/// Colour Specification box.
///
/// Each Colour Specification box defines one method by which an application
/// can interpret the colourspace of the decompressed image data. The method
/// decides which of the two representations is carried: an enumerated
/// colourspace code, or an ICC profile.
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.5.3.3.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColourSpecificationBox {
    length: u64,
    offset: u64,

    // METH
    method: u8,

    // PREC: Precedence, a signed byte. Reserved for ISO use and 0 in JP2 files.
    precedence: i8,

    // APPROX: Colourspace approximation. 0 in JP2 files.
    colourspace_approximation: u8,

    // EnumCS, only with the enumerated method.
    enumerated_colour_space: Option<u32>,

    // Enumerated colourspace parameters (JPX CIELab and CIEJab), kept verbatim.
    enumerated_parameters: Vec<u8>,

    // ICC profile bytes, only with the ICC methods.
    icc_profile: Option<Vec<u8>>,
}

impl ColourSpecificationBox {
    /// Construct a box directly from its fields.
    ///
    /// Nothing is checked here; an inconsistent combination is rejected when
    /// the box is written.
    pub fn new(
        method: u8,
        precedence: i8,
        colourspace_approximation: u8,
        enumerated_colour_space: Option<u32>,
        icc_profile: Option<Vec<u8>>,
    ) -> ColourSpecificationBox {
        ColourSpecificationBox {
            method,
            precedence,
            colourspace_approximation,
            enumerated_colour_space,
            icc_profile,
            ..Default::default()
        }
    }

    pub fn enumerated(colour_space: u32) -> ColourSpecificationBox {
        Self::new(
            METHOD_ENUMERATED_COLOUR_SPACE,
            0,
            0,
            Some(colour_space),
            None,
        )
    }

    /// Restricted ICC profile, the only ICC method a JP2 file may use.
    pub fn icc(profile: Vec<u8>) -> ColourSpecificationBox {
        Self::new(METHOD_RESTRICTED_ICC_PROFILE, 0, 0, None, Some(profile))
    }

    pub fn method(&self) -> ColourSpecificationMethods {
        ColourSpecificationMethods::new(self.method)
    }

    pub fn method_u8(&self) -> u8 {
        self.method
    }

    pub fn precedence(&self) -> i8 {
        self.precedence
    }

    pub fn colourspace_approximation(&self) -> u8 {
        self.colourspace_approximation
    }

    pub fn enumerated_colour_space(&self) -> Option<EnumeratedColourSpaces> {
        self.enumerated_colour_space.map(EnumeratedColourSpaces::new)
    }

    pub fn enumerated_colour_space_u32(&self) -> Option<u32> {
        self.enumerated_colour_space
    }

    pub fn enumerated_parameters(&self) -> &[u8] {
        &self.enumerated_parameters
    }

    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_deref()
    }

    /// Decoded header of the ICC profile, if this box carries one.
    ///
    /// The header is decoded again from the profile bytes on every call.
    pub fn icc_profile_header(&self) -> Option<Result<ICCProfileHeader, JP2Error>> {
        self.icc_profile
            .as_deref()
            .map(|profile| decode_header(profile).map_err(JP2Error::from))
    }

    fn invalid(&self, reason: impl Into<String>) -> JP2Error {
        JP2Error::InvalidBoxState {
            box_type: BOX_TYPE_COLOUR_SPECIFICATION,
            reason: reason.into(),
        }
    }

    pub fn validate(&self, conformance: Conformance) -> Result<(), JP2Error> {
        match self.method() {
            ColourSpecificationMethods::EnumeratedColourSpace => {
                let colour_space = match (self.enumerated_colour_space, &self.icc_profile) {
                    (Some(colour_space), None) => colour_space,
                    _ => {
                        return Err(self.invalid(
                            "an enumerated colourspace, and no ICC profile, is required by method 1",
                        ))
                    }
                };
                if !EnumeratedColourSpaces::new(colour_space).is_known() {
                    return Err(
                        self.invalid(format!("unrecognized colourspace {}", colour_space))
                    );
                }
            }
            ColourSpecificationMethods::RestrictedICCProfile
            | ColourSpecificationMethods::AnyICCProfile => {
                if self.icc_profile.is_none() || self.enumerated_colour_space.is_some() {
                    return Err(self.invalid(format!(
                        "an ICC profile, and no enumerated colourspace, is required by method {}",
                        self.method
                    )));
                }
            }
            ColourSpecificationMethods::Reserved { value } => {
                return Err(self.invalid(format!("invalid colour specification method {}", value)));
            }
        }

        if conformance == Conformance::Jp2 {
            if self.colourspace_approximation != 0 {
                return Err(self.invalid(format!(
                    "JP2 requires a colourspace approximation of 0, not {}",
                    self.colourspace_approximation
                )));
            }
            if self.precedence != 0 {
                return Err(self.invalid(format!(
                    "JP2 requires a precedence of 0, not {}",
                    self.precedence
                )));
            }
            if self.method() == ColourSpecificationMethods::AnyICCProfile {
                return Err(self.invalid("method 3 (any ICC profile) is only allowed in JPX"));
            }
        }

        Ok(())
    }
}

impl JBox for ColourSpecificationBox {
    // The type of a Colour Specification box shall be ‘colr’ (0x636F 6C72).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_COLOUR_SPECIFICATION
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

        writer.write_u8(self.method)?;
        writer.write_i8(self.precedence)?;
        writer.write_u8(self.colourspace_approximation)?;
        if let Some(colour_space) = self.enumerated_colour_space {
            writer.write_u32(colour_space)?;
            writer.write_bytes(&self.enumerated_parameters)?;
        }
        if let Some(profile) = &self.icc_profile {
            writer.write_bytes(profile)?;
        }
        Ok(())
    }
}

impl DecodeBox for ColourSpecificationBox {
    fn decode(header: &BoxHeader, reader: &mut ContentReader) -> Result<Self, JP2Error> {
        let mut colour_specification_box = ColourSpecificationBox {
            length: header.length,
            offset: header.offset,
            method: reader.read_u8()?,
            precedence: reader.read_i8()?,
            colourspace_approximation: reader.read_u8()?,
            ..Default::default()
        };

        let remaining = header.content_length() - 3;
        match colour_specification_box.method() {
            ColourSpecificationMethods::EnumeratedColourSpace => {
                let colour_space = reader.read_u32()?;
                debug!(
                    "colr enumerated colourspace {}",
                    EnumeratedColourSpaces::new(colour_space)
                );
                colour_specification_box.enumerated_colour_space = Some(colour_space);
                colour_specification_box.enumerated_parameters =
                    reader.read_bytes(remaining - 4)?;
            }
            ColourSpecificationMethods::RestrictedICCProfile
            | ColourSpecificationMethods::AnyICCProfile => {
                debug!("colr ICC profile of {} bytes", remaining);
                colour_specification_box.icc_profile = Some(reader.read_bytes(remaining)?);
            }
            ColourSpecificationMethods::Reserved { value } => {
                return Err(JP2Error::MalformedBoxStructure {
                    box_type: header.box_type,
                    offset: header.offset,
                    reason: format!("invalid colour specification method {}", value),
                });
            }
        }

        Ok(colour_specification_box)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerated_names() {
        assert_eq!(EnumeratedColourSpaces::new(16).to_string(), "sRGB");
        assert_eq!(EnumeratedColourSpaces::new(17).to_string(), "greyscale");
        assert_eq!(EnumeratedColourSpaces::new(18).to_string(), "sYCC");
        assert_eq!(EnumeratedColourSpaces::new(2).to_string(), "reserved (2)");
        assert!(!EnumeratedColourSpaces::new(u32::MAX).is_known());
    }

    #[test]
    fn enumerated_box_is_valid_jp2() {
        let colr = ColourSpecificationBox::enumerated(ENUMERATED_COLOUR_SPACE_SRGB);
        assert_eq!(colr.method(), ColourSpecificationMethods::EnumeratedColourSpace);
        assert_eq!(colr.precedence(), 0);
        assert_eq!(colr.colourspace_approximation(), 0);
        assert!(colr.icc_profile().is_none());
        assert!(colr.icc_profile_header().is_none());
        assert!(colr.validate(Conformance::Jp2).is_ok());
    }

    #[test]
    fn neither_representation_is_invalid() {
        let colr = ColourSpecificationBox::new(1, 0, 0, None, None);
        assert!(matches!(
            colr.validate(Conformance::Jp2),
            Err(JP2Error::InvalidBoxState { .. })
        ));
    }

    #[test]
    fn both_representations_are_invalid() {
        let colr = ColourSpecificationBox::new(2, 0, 0, Some(16), Some(vec![0; 128]));
        assert!(colr.validate(Conformance::Jpx).is_err());
    }

    #[test]
    fn unknown_colourspace_is_invalid() {
        let colr = ColourSpecificationBox::enumerated(u32::MAX);
        assert!(colr.validate(Conformance::Jpx).is_err());
    }

    #[test]
    fn unknown_method_is_invalid() {
        let colr = ColourSpecificationBox::new(5, 0, 0, Some(16), None);
        assert!(colr.validate(Conformance::Jpx).is_err());
    }

    #[test]
    fn approximation_depends_on_conformance() {
        let colr = ColourSpecificationBox::new(1, 0, 1, Some(16), None);
        assert!(colr.validate(Conformance::Jp2).is_err());
        assert!(colr.validate(Conformance::Jpx).is_ok());

        let colr = ColourSpecificationBox::new(1, -1, 0, Some(16), None);
        assert!(colr.validate(Conformance::Jp2).is_err());
        assert!(colr.validate(Conformance::Jpx).is_ok());
    }

    #[test]
    fn any_icc_is_jpx_only() {
        let colr = ColourSpecificationBox::new(3, 0, 0, None, Some(vec![0; 128]));
        assert!(colr.validate(Conformance::Jp2).is_err());
        assert!(colr.validate(Conformance::Jpx).is_ok());
    }
}
