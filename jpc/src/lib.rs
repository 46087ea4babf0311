use cursor::{BinaryCursor, CursorError};
use log::{debug, info, warn};
use std::error;
use std::fmt;
use std::io;
use std::str;

mod geometry;

pub use geometry::{ComponentGeometry, Geometry};

pub type MarkerSymbol = u16;

// Delimiting markers and marker segments
pub const MARKER_SYMBOL_SOC: MarkerSymbol = 0xFF4F; // Start of codestream
pub const MARKER_SYMBOL_SOT: MarkerSymbol = 0xFF90; // Start of tile-part
pub const MARKER_SYMBOL_SOD: MarkerSymbol = 0xFF93; // Start of data
pub const MARKER_SYMBOL_EOC: MarkerSymbol = 0xFFD9; // End of codestream

// Fixed information marker segments
pub const MARKER_SYMBOL_SIZ: MarkerSymbol = 0xFF51; // Image and tile size
pub const MARKER_SYMBOL_CAP: MarkerSymbol = 0xFF50; // Extended capabilities

// Functional marker segments
pub const MARKER_SYMBOL_COD: MarkerSymbol = 0xFF52; // Coding style default
pub const MARKER_SYMBOL_COC: MarkerSymbol = 0xFF53; // Coding style component
pub const MARKER_SYMBOL_RGN: MarkerSymbol = 0xFF5E; // Region-of-interest
pub const MARKER_SYMBOL_QCD: MarkerSymbol = 0xFF5C; // Quantization default
pub const MARKER_SYMBOL_QCC: MarkerSymbol = 0xFF5D; // Quantization component
pub const MARKER_SYMBOL_POC: MarkerSymbol = 0xFF5F; // Progression order change

// Pointer marker segments
pub const MARKER_SYMBOL_TLM: MarkerSymbol = 0xFF55; // Tile-part lengths
pub const MARKER_SYMBOL_PLM: MarkerSymbol = 0xFF57; // Packet length, main header
pub const MARKER_SYMBOL_PLT: MarkerSymbol = 0xFF58; // Packet length, tile-part header
pub const MARKER_SYMBOL_PPM: MarkerSymbol = 0xFF60; // Packed packet headers, main header
pub const MARKER_SYMBOL_PPT: MarkerSymbol = 0xFF61; // Packed packet headers, tile-part header

// In bit stream markers and marker segments
pub const MARKER_SYMBOL_SOP: MarkerSymbol = 0xFF91; // Start of packet
pub const MARKER_SYMBOL_EPH: MarkerSymbol = 0xFF92; // End of packet header

// Informational marker segments
pub const MARKER_SYMBOL_CRG: MarkerSymbol = 0xFF63; // Component registration
pub const MARKER_SYMBOL_COM: MarkerSymbol = 0xFF64; // Comment

#[derive(Debug)]
pub enum CodestreamError {
    MarkerError {
        marker: MarkerSymbol,
        error: String,
    },
    MarkerUnexpected {
        marker: MarkerSymbol,
        offset: u64,
    },
    MarkerDuplicate {
        marker: MarkerSymbol,
        offset: u64,
    },
    NoComponents {
        offset: u64,
    },
    InvalidSubsampling {
        component: u16,
        horizontal_separation: u8,
        vertical_separation: u8,
    },
    InvalidTileSize {
        reference_tile_width: u32,
        reference_tile_height: u32,
    },
    ImageOffsetOverflow {
        reference_grid_width: u32,
        reference_grid_height: u32,
        image_horizontal_offset: u32,
        image_vertical_offset: u32,
    },
    TileSizeOverflow {
        image_horizontal_offset: u32,
        image_vertical_offset: u32,
        tile_horizontal_offset: u32,
        tile_vertical_offset: u32,
        reference_tile_width: u32,
        reference_tile_height: u32,
    },
    TileGridOffsetOverflow {
        tile_horizontal_offset: u32,
        tile_vertical_offset: u32,
        image_horizontal_offset: u32,
        image_vertical_offset: u32,
    },
    Cursor {
        error: CursorError,
    },
}

impl CodestreamError {
    /// Whether the codestream itself is invalid, as opposed to the input
    /// ending early or failing to read.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::Cursor { .. })
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Cursor { error } if error.is_truncated())
    }
}

impl error::Error for CodestreamError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Cursor { error } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for CodestreamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MarkerError { marker, error } => {
                write!(f, "marker 0x{:04X} error {:?}", marker, error)
            }
            Self::MarkerUnexpected { marker, offset } => {
                write!(
                    f,
                    "unexpected marker 0x{:04X} at byte offset {}",
                    marker, offset
                )
            }
            Self::MarkerDuplicate { marker, offset } => {
                write!(
                    f,
                    "duplicate marker 0x{:04X} at byte offset {}",
                    marker, offset
                )
            }
            Self::NoComponents { offset } => {
                write!(f, "SIZ at byte offset {} declares no components", offset)
            }
            Self::InvalidSubsampling {
                component,
                horizontal_separation,
                vertical_separation,
            } => {
                write!(
                    f,
                    "component {} has invalid subsampling XRsiz = {}, YRsiz = {}",
                    component, horizontal_separation, vertical_separation
                )
            }
            Self::InvalidTileSize {
                reference_tile_width,
                reference_tile_height,
            } => {
                write!(
                    f,
                    "invalid tile size: XTsiz = {}, YTsiz = {}",
                    reference_tile_width, reference_tile_height
                )
            }
            Self::ImageOffsetOverflow {
                reference_grid_width,
                reference_grid_height,
                image_horizontal_offset,
                image_vertical_offset,
            } => {
                write!(
                    f,
                    "image offset outside reference grid: Xsiz = {}, Ysiz = {}, XOsiz = {}, YOsiz = {}",
                    reference_grid_width,
                    reference_grid_height,
                    image_horizontal_offset,
                    image_vertical_offset,
                )
            }
            Self::TileGridOffsetOverflow {
                image_horizontal_offset,
                image_vertical_offset,
                tile_horizontal_offset,
                tile_vertical_offset,
            } => {
                write!(
                    f,
                    "tile grid offset overflow: XOSiz = {:?}, YOsiz = {:?}, XTOsiz = {:?}, YTOsiz = {:?}",
                    image_horizontal_offset,
                    image_vertical_offset,
                    tile_horizontal_offset,
                    tile_vertical_offset,
                )
            }
            // XTsiz + XTOsiz > XOsiz
            // YTsiz + YTOsiz > YOsiz
            Self::TileSizeOverflow {
                image_horizontal_offset,
                image_vertical_offset,
                tile_horizontal_offset,
                tile_vertical_offset,
                reference_tile_width,
                reference_tile_height,
            } => {
                write!(
                    f,
                    "tile size overflow: XOSiz = {:?}, YOsiz = {:?}, XTOsiz = {:?}, YTOsiz = {:?}, XTsize = {:?}, YTsize = {:?}",
                    image_horizontal_offset,
                    image_vertical_offset,
                    tile_horizontal_offset,
                    tile_vertical_offset,
                    reference_tile_width,
                    reference_tile_height,
                )
            }
            Self::Cursor { error } => write!(f, "{}", error),
        }
    }
}

impl From<CursorError> for CodestreamError {
    fn from(error: CursorError) -> Self {
        CodestreamError::Cursor { error }
    }
}

/// Short name of a marker, e.g. `SIZ`.
pub fn marker_name(marker: MarkerSymbol) -> &'static str {
    match marker {
        MARKER_SYMBOL_SOC => "SOC",
        MARKER_SYMBOL_SOT => "SOT",
        MARKER_SYMBOL_SOD => "SOD",
        MARKER_SYMBOL_EOC => "EOC",
        MARKER_SYMBOL_SIZ => "SIZ",
        MARKER_SYMBOL_CAP => "CAP",
        MARKER_SYMBOL_COD => "COD",
        MARKER_SYMBOL_COC => "COC",
        MARKER_SYMBOL_RGN => "RGN",
        MARKER_SYMBOL_QCD => "QCD",
        MARKER_SYMBOL_QCC => "QCC",
        MARKER_SYMBOL_POC => "POC",
        MARKER_SYMBOL_TLM => "TLM",
        MARKER_SYMBOL_PLM => "PLM",
        MARKER_SYMBOL_PLT => "PLT",
        MARKER_SYMBOL_PPM => "PPM",
        MARKER_SYMBOL_PPT => "PPT",
        MARKER_SYMBOL_SOP => "SOP",
        MARKER_SYMBOL_EPH => "EPH",
        MARKER_SYMBOL_CRG => "CRG",
        MARKER_SYMBOL_COM => "COM",
        _ => "unknown",
    }
}

// Markers with no marker segment length or parameters.
fn has_payload(marker: MarkerSymbol) -> bool {
    !matches!(
        marker,
        MARKER_SYMBOL_SOC | MARKER_SYMBOL_SOD | MARKER_SYMBOL_EOC | MARKER_SYMBOL_EPH
    ) && !(0xFF30..=0xFF3F).contains(&marker)
}

#[derive(Debug, PartialEq)]
pub enum ProgressionOrder {
    // 0000 0000 Layer-resolution level-component-position progression
    LRLCPP,

    // 0000 0001 Resolution level-layer-component-position progression
    RLLCPP,

    // 0000 0010 Resolution level-position-component-layer progression
    RLPCLP,

    // 0000 0011 Position-component-resolution level-layer progression
    PCRLLP,

    // 0000 0100 Component-position-resolution level-layer progression
    CPRLLP,

    // All other values reserved
    Reserved { value: u8 },
}

impl ProgressionOrder {
    fn new(value: u8) -> ProgressionOrder {
        match value {
            0b0000_0000 => ProgressionOrder::LRLCPP,
            0b0000_0001 => ProgressionOrder::RLLCPP,
            0b0000_0010 => ProgressionOrder::RLPCLP,
            0b0000_0011 => ProgressionOrder::PCRLLP,
            0b0000_0100 => ProgressionOrder::CPRLLP,
            _ => ProgressionOrder::Reserved { value },
        }
    }
}

impl fmt::Display for ProgressionOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProgressionOrder::LRLCPP => write!(f, "LRCP"),
            ProgressionOrder::RLLCPP => write!(f, "RLCP"),
            ProgressionOrder::RLPCLP => write!(f, "RPCL"),
            ProgressionOrder::PCRLLP => write!(f, "PCRL"),
            ProgressionOrder::CPRLLP => write!(f, "CPRL"),
            ProgressionOrder::Reserved { value } => write!(f, "reserved ({})", value),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum CodingBlockStyle {
    // xxxx xxx1 - Selective arithmetic coding bypass
    SelectiveArithmeticCodingBypass,

    // xxxx xx1x - Reset context probabilities on coding pass boundaries
    ResetContextProbabilities,

    // xxxx x1xx - Termination on each coding pass
    TerminationOnEachCodingPass,

    // xxxx 1xxx - Vertically causal context
    VerticallyCausalContext,

    // xxx1 xxxx - Predictable termination
    PredictableTermination,

    // xx1x xxxx - Segmentation symbols are used
    SegmentationSymbolsAreUsed,
}

impl CodingBlockStyle {
    // Only the styles that are switched on are returned.
    fn new(value: u8) -> Vec<CodingBlockStyle> {
        let flags = [
            (0b_0000_0001, CodingBlockStyle::SelectiveArithmeticCodingBypass),
            (0b_0000_0010, CodingBlockStyle::ResetContextProbabilities),
            (0b_0000_0100, CodingBlockStyle::TerminationOnEachCodingPass),
            (0b_0000_1000, CodingBlockStyle::VerticallyCausalContext),
            (0b_0001_0000, CodingBlockStyle::PredictableTermination),
            (0b_0010_0000, CodingBlockStyle::SegmentationSymbolsAreUsed),
        ];
        flags
            .into_iter()
            .filter(|(bit, _)| value & bit != 0)
            .map(|(_, style)| style)
            .collect()
    }
}

const MULTIPLE_COMPONENT_TRANSFORMATION_NONE: u8 = 0b_0000_0000;
const MULTIPLE_COMPONENT_TRANSFORMATION_MULTIPLE: u8 = 0b_0000_0001;

#[derive(Debug, PartialEq)]
pub enum MultipleComponentTransformation {
    // No multiple component transformation specified.
    None,

    // Component transformation used on components 0, 1, 2 for coding efficiency.
    // Irreversible component transformation used with the 9-7 irreversible filter.
    // Reversible component transformation used with the 5-3 reversible filter.
    Multiple,

    // All other values reserved
    Reserved { value: u8 },
}

impl MultipleComponentTransformation {
    fn new(value: u8) -> MultipleComponentTransformation {
        match value {
            MULTIPLE_COMPONENT_TRANSFORMATION_NONE => MultipleComponentTransformation::None,
            MULTIPLE_COMPONENT_TRANSFORMATION_MULTIPLE => MultipleComponentTransformation::Multiple,
            _ => MultipleComponentTransformation::Reserved { value },
        }
    }
}

const TRANSFORMATION_FILTER_IRREVERSIBLE: u8 = 0;
const TRANSFORMATION_FILTER_REVERSIBLE: u8 = 1;

#[derive(Debug, PartialEq)]
pub enum TransformationFilter {
    // 9-7 irreversible filter
    Irreversible,
    // 5-3 reversible filter
    Reversible,

    // All other values reserved
    Reserved { value: u8 },
}

impl TransformationFilter {
    fn new(value: u8) -> TransformationFilter {
        match value {
            TRANSFORMATION_FILTER_IRREVERSIBLE => TransformationFilter::Irreversible,
            TRANSFORMATION_FILTER_REVERSIBLE => TransformationFilter::Reversible,
            _ => TransformationFilter::Reserved { value },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSize {
    // Ssiz: Precision (depth) in bits and sign of the component samples.
    //
    // The precision is the precision of the component samples before DC
    // level shifting is performed (i.e., the precision of the original
    // component samples before any processing is performed).
    precision: u8,

    // XRsiz: Horizontal separation of a sample of this component
    // with respect to the reference grid.
    horizontal_separation: u8,

    // YRsiz: Vertical separation of a sample of this component
    // with respect to the reference grid.
    vertical_separation: u8,
}

impl ComponentSize {
    /// Bit depth, ISO/IEC 15444-1 Table A.11: the low 7 bits plus one.
    pub fn precision(&self) -> u8 {
        (self.precision & 0x7f) + 1
    }

    pub fn values_are_signed(&self) -> bool {
        (self.precision & 0x80) == 0x80
    }

    pub fn horizontal_separation(&self) -> u8 {
        self.horizontal_separation
    }

    pub fn vertical_separation(&self) -> u8 {
        self.vertical_separation
    }
}

// A.5.1
//
// Image and tile size (SIZ)
//
// Function: Provides information about the uncompressed image such as the
// width and height of the reference grid, the width and height of the tiles,
// the number of components, component bit depth, and the separation of
// component samples with respect to the reference grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageAndTileSizeMarkerSegment {
    offset: u64,
    length: u16,

    // Rsiz: Denotes capabilities that a decoder needs to properly decode the
    // codestream.
    decoder_capabilities: u16,

    // XSiz: Width of the reference grid.
    reference_grid_width: u32,

    // YSiz: Height of the reference grid.
    reference_grid_height: u32,

    // XOsiz: Horizontal offset from the origin of the reference grid to the
    // left side of the image area.
    image_horizontal_offset: u32,

    // YOsiz: Vertical offset from the origin of the reference grid to the top
    // side of the image area.
    image_vertical_offset: u32,

    // XTsiz: Width of one reference tile with respect to the reference grid
    reference_tile_width: u32,

    // YTsiz: Height of one reference tile with respect to the reference grid.
    reference_tile_height: u32,

    // XTOsiz: Horizontal offset from the origin of the reference grid to the
    // left side of the first tile.
    tile_horizontal_offset: u32,

    // YTOsiz: Vertical offset from the origin of the reference grid to the
    // top side of the first tile.
    tile_vertical_offset: u32,

    // Csiz components, in component index order.
    components: Vec<ComponentSize>,
}

impl ImageAndTileSizeMarkerSegment {
    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn decoder_capabilities(&self) -> u16 {
        self.decoder_capabilities
    }

    pub fn reference_grid_width(&self) -> u32 {
        self.reference_grid_width
    }
    pub fn reference_grid_height(&self) -> u32 {
        self.reference_grid_height
    }

    pub fn image_horizontal_offset(&self) -> u32 {
        self.image_horizontal_offset
    }
    pub fn image_vertical_offset(&self) -> u32 {
        self.image_vertical_offset
    }

    pub fn reference_tile_width(&self) -> u32 {
        self.reference_tile_width
    }
    pub fn reference_tile_height(&self) -> u32 {
        self.reference_tile_height
    }

    pub fn tile_horizontal_offset(&self) -> u32 {
        self.tile_horizontal_offset
    }
    pub fn tile_vertical_offset(&self) -> u32 {
        self.tile_vertical_offset
    }

    pub fn no_components(&self) -> u16 {
        self.components.len() as u16
    }

    pub fn components(&self) -> &[ComponentSize] {
        &self.components
    }

    pub fn precision(&self, i: usize) -> Option<u8> {
        self.components.get(i).map(ComponentSize::precision)
    }

    pub fn values_are_signed(&self, i: usize) -> Option<bool> {
        self.components.get(i).map(ComponentSize::values_are_signed)
    }

    pub fn horizontal_separation(&self, i: usize) -> Option<u8> {
        self.components
            .get(i)
            .map(ComponentSize::horizontal_separation)
    }

    pub fn vertical_separation(&self, i: usize) -> Option<u8> {
        self.components.get(i).map(ComponentSize::vertical_separation)
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct CodingStyleParametersPrecinctSize {
    value: u8,
}

impl CodingStyleParametersPrecinctSize {
    // 4 LSBs are the precinct width exponent, PPx
    pub fn width_exponent(&self) -> u8 {
        self.value & 0x0f
    }

    // 4 MSBs are the precinct height exponent, PPy
    pub fn height_exponent(&self) -> u8 {
        self.value >> 4
    }
}

// A.12 – Coding style default parameter values
#[derive(Debug, Default, PartialEq)]
pub struct CodingStyleParameters {
    // Number of decomposition levels, N_L, Zero implies no transformation
    no_decomposition_levels: u8,

    // Code-block width exponent offset value, xcb
    code_block_width: u8,

    // Code-block height exponent offset value, ycb
    code_block_height: u8,

    // Style of the code-block coding passes
    code_block_style: u8,

    // Wavelet transformation used.
    transformation: u8,

    // Only present when the coding style signals user defined precincts, one
    // per resolution level.
    precinct_sizes: Vec<u8>,
}

impl CodingStyleParameters {
    pub fn no_decomposition_levels(&self) -> u8 {
        self.no_decomposition_levels
    }

    // A.18
    //
    // Code-block width and height exponent offset value xcb = value + 2 or
    // ycb = value + 2.
    pub fn code_block_width(&self) -> u32 {
        1 << ((self.code_block_width & 0b00001111) + 2)
    }

    pub fn code_block_height(&self) -> u32 {
        1 << ((self.code_block_height & 0b00001111) + 2)
    }

    pub fn code_block_style(&self) -> u8 {
        self.code_block_style
    }

    pub fn coding_block_styles(&self) -> Vec<CodingBlockStyle> {
        CodingBlockStyle::new(self.code_block_style)
    }

    pub fn transformation(&self) -> TransformationFilter {
        TransformationFilter::new(self.transformation)
    }

    /// Precinct sizes per resolution level, `PPx = PPy = 15` when the coding
    /// style does not define them.
    pub fn precinct_sizes(&self) -> Vec<CodingStyleParametersPrecinctSize> {
        if self.precinct_sizes.is_empty() {
            return vec![CodingStyleParametersPrecinctSize { value: 0xff }];
        }
        self.precinct_sizes
            .iter()
            .map(|value| CodingStyleParametersPrecinctSize { value: *value })
            .collect()
    }
}

// A.6.1
//
// Coding style default (COD)
//
// Function: Describes the coding style, number of decomposition levels,
// and layering that is the default used for compressing all components of
// an image (if in the main header) or a tile (if in the tile-part header).
//
// The parameter values can be overridden for an individual component by a
// COC marker segment in either the main or tile-part header.
#[derive(Debug, Default, PartialEq)]
pub struct CodingStyleMarkerSegment {
    coding_style: u8,
    progression_order: u8,
    no_layers: u16,
    multiple_component_transformation: u8,
    coding_style_parameters: CodingStyleParameters,
}

impl CodingStyleMarkerSegment {
    pub fn coding_style(&self) -> u8 {
        self.coding_style
    }

    // xxxx xxx1 Entropy coder with precincts defined below
    pub fn has_defined_precinct_size(&self) -> bool {
        self.coding_style & 0b0001 != 0
    }

    // xxxx xx1x SOP marker segments may be used
    pub fn uses_sop(&self) -> bool {
        self.coding_style & 0b0010 != 0
    }

    // xxxx x1xx EPH marker may be used
    pub fn uses_eph(&self) -> bool {
        self.coding_style & 0b0100 != 0
    }

    pub fn progression_order(&self) -> ProgressionOrder {
        ProgressionOrder::new(self.progression_order)
    }

    pub fn no_layers(&self) -> u16 {
        self.no_layers
    }

    pub fn multiple_component_transformation(&self) -> MultipleComponentTransformation {
        MultipleComponentTransformation::new(self.multiple_component_transformation)
    }

    pub fn coding_style_parameters(&self) -> &CodingStyleParameters {
        &self.coding_style_parameters
    }
}

// A.6.2
//
// Coding style component (COC)
//
// Function: Describes the coding style, number of decomposition levels, and
// layering used for compressing a particular component.
#[derive(Debug, Default, PartialEq)]
pub struct CodingStyleComponentSegment {
    // Ccoc: The index of the component to which this marker segment relates.
    component_index: u16,

    // Scoc: Coding style for this component
    coding_style: u8,

    // SPcoc: Parameters for coding style designated in Scoc.
    coding_style_parameters: CodingStyleParameters,
}

impl CodingStyleComponentSegment {
    pub fn component_index(&self) -> u16 {
        self.component_index
    }

    pub fn has_defined_precinct_size(&self) -> bool {
        self.coding_style & 0b0001 != 0
    }

    pub fn coding_style_parameters(&self) -> &CodingStyleParameters {
        &self.coding_style_parameters
    }
}

#[derive(Debug, PartialEq)]
pub enum QuantizationStyle {
    No,
    ScalarDerived,
    ScalarExpounded,
    Reserved { value: u8 },
}

impl QuantizationStyle {
    fn new(byte: u8) -> QuantizationStyle {
        match byte & 0b0001_1111 {
            // xxx0 0000
            0b0000_0000 => QuantizationStyle::No,
            // xxx0 0001
            0b0000_0001 => QuantizationStyle::ScalarDerived,
            // xxx0 0010
            0b0000_0010 => QuantizationStyle::ScalarExpounded,
            value => QuantizationStyle::Reserved { value },
        }
    }
}

// Sqcd/Sqcc followed by SPqcd/SPqcc, shared by QCD and QCC.
#[derive(Debug, Default, PartialEq)]
pub struct QuantizationParameters {
    style: u8,

    // One value per subband: 8 bit exponents without quantization, 16 bit
    // exponent/mantissa pairs otherwise.
    step_size_values: Vec<u16>,
}

impl QuantizationParameters {
    pub fn style(&self) -> QuantizationStyle {
        QuantizationStyle::new(self.style)
    }

    pub fn no_guard_bits(&self) -> u8 {
        self.style >> 5
    }

    pub fn step_size_values(&self) -> &[u16] {
        &self.step_size_values
    }

    pub fn exponents(&self) -> Vec<u8> {
        match self.style() {
            QuantizationStyle::No => self
                .step_size_values
                .iter()
                .map(|value| (*value >> 3) as u8)
                .collect(),
            _ => self
                .step_size_values
                .iter()
                .map(|value| (*value >> 11) as u8)
                .collect(),
        }
    }

    pub fn mantissas(&self) -> Vec<u16> {
        match self.style() {
            QuantizationStyle::No => vec![0; self.step_size_values.len()],
            _ => self
                .step_size_values
                .iter()
                .map(|value| *value & 0x07ff)
                .collect(),
        }
    }
}

// A.6.4
//
// Quantization default (QCD)
//
// Function: Describes the quantization default used for compressing all
// components not defined by a QCC marker segment.
#[derive(Debug, Default, PartialEq)]
pub struct QuantizationDefaultMarkerSegment {
    parameters: QuantizationParameters,
}

impl QuantizationDefaultMarkerSegment {
    pub fn parameters(&self) -> &QuantizationParameters {
        &self.parameters
    }
}

// A.6.5
//
// Quantization component (QCC)
#[derive(Debug, Default, PartialEq)]
pub struct QuantizationComponentSegment {
    component_index: u16,
    parameters: QuantizationParameters,
}

impl QuantizationComponentSegment {
    pub fn component_index(&self) -> u16 {
        self.component_index
    }

    pub fn parameters(&self) -> &QuantizationParameters {
        &self.parameters
    }
}

#[derive(Debug, PartialEq)]
pub enum RegionOfInterestStyle {
    ImplicitRegionOfInterest,
    Reserved { value: u8 },
}

impl RegionOfInterestStyle {
    fn new(value: u8) -> RegionOfInterestStyle {
        match value {
            0 => RegionOfInterestStyle::ImplicitRegionOfInterest,
            _ => RegionOfInterestStyle::Reserved { value },
        }
    }
}

// A.6.3
//
// Region of interest (RGN)
//
// Function: Signals the presence of an ROI in the codestream.
#[derive(Debug, Default, PartialEq)]
pub struct RegionOfInterestSegment {
    // Crgn
    component_index: u16,

    // Srgn
    style: u8,

    // SPrgn: binary shifting of the ROI coefficients above the background.
    shift: u8,
}

impl RegionOfInterestSegment {
    pub fn component_index(&self) -> u16 {
        self.component_index
    }

    pub fn style(&self) -> RegionOfInterestStyle {
        RegionOfInterestStyle::new(self.style)
    }

    pub fn shift(&self) -> u8 {
        self.shift
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Progression {
    // RSpoc: Resolution level index (inclusive) for the start of a progression.
    pub resolution_level_start: u8,

    // CSpoc: Component index (inclusive) for the start of a progression.
    pub component_start: u16,

    // LYEpoc: Layer index (exclusive) for the end of a progression.
    pub layer_end: u16,

    // REpoc: Resolution level index (exclusive) for the end of a progression.
    pub resolution_level_end: u8,

    // CEpoc: Component index (exclusive) for the end of a progression.
    pub component_end: u16,

    // Ppoc: Progression order.
    order: u8,
}

impl Progression {
    pub fn progression_order(&self) -> ProgressionOrder {
        ProgressionOrder::new(self.order)
    }
}

// A.6.6
//
// Progression order change (POC)
#[derive(Debug, Default, PartialEq)]
pub struct ProgressionOrderChangeSegment {
    progressions: Vec<Progression>,
}

impl ProgressionOrderChangeSegment {
    pub fn progressions(&self) -> &[Progression] {
        &self.progressions
    }
}

// A.9.1
//
// Component registration (CRG)
//
// Function: Allows specific registration of components with respect to each
// other, in units of 1/65536 of the horizontal and vertical separation.
#[derive(Debug, Default, PartialEq)]
pub struct ComponentRegistrationSegment {
    offsets: Vec<(u16, u16)>,
}

impl ComponentRegistrationSegment {
    pub fn offsets(&self) -> &[(u16, u16)] {
        &self.offsets
    }
}

#[derive(Debug, PartialEq)]
pub struct TilePartLength {
    // Ttlm, absent when tile-parts are in order with one tile-part per tile.
    pub tile_index: Option<u16>,

    // Ptlm
    pub length: u32,
}

// A.7.1
//
// Tile-part lengths (TLM)
#[derive(Debug, Default, PartialEq)]
pub struct TilePartLengthsSegment {
    // Ztlm
    index: u8,
    tile_part_lengths: Vec<TilePartLength>,
}

impl TilePartLengthsSegment {
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn tile_part_lengths(&self) -> &[TilePartLength] {
        &self.tile_part_lengths
    }
}

#[derive(Debug, PartialEq)]
pub enum CommentRegistrationValue {
    // General use (binary values)
    Binary,

    // General use (IS 8859-15:1999 (Latin) values)
    Latin,

    // All other values reserved
    Reserved { value: u16 },
}

impl CommentRegistrationValue {
    fn new(value: u16) -> CommentRegistrationValue {
        match value {
            0 => CommentRegistrationValue::Binary,
            1 => CommentRegistrationValue::Latin,
            value => CommentRegistrationValue::Reserved { value },
        }
    }
}

// A.9.2
//
// Comment (COM)
//
// Allows unstructured data in the main and tile-part header.
#[derive(Debug, Default, PartialEq)]
pub struct CommentMarkerSegment {
    // RCom: Registration value of the marker segment
    registration_value: u16,

    // Ccomi: Byte of unstructured data
    comment: Vec<u8>,
}

impl CommentMarkerSegment {
    pub fn registration_value(&self) -> CommentRegistrationValue {
        CommentRegistrationValue::new(self.registration_value)
    }

    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    pub fn comment_utf8(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.comment)
    }
}

#[derive(Debug, PartialEq)]
pub enum SegmentKind {
    StartOfCodestream,
    EndOfCodestream,
    ImageAndTileSize(ImageAndTileSizeMarkerSegment),
    CodingStyleDefault(CodingStyleMarkerSegment),
    CodingStyleComponent(CodingStyleComponentSegment),
    QuantizationDefault(QuantizationDefaultMarkerSegment),
    QuantizationComponent(QuantizationComponentSegment),
    RegionOfInterest(RegionOfInterestSegment),
    ProgressionOrderChange(ProgressionOrderChangeSegment),
    TilePartLengths(TilePartLengthsSegment),
    ComponentRegistration(ComponentRegistrationSegment),
    Comment(CommentMarkerSegment),

    /// A marker this scanner does not decode, or one whose payload was too
    /// short for its fields. The payload is kept verbatim.
    Unknown { payload: Vec<u8> },
}

/// One marker, or marker segment, of the main header.
#[derive(Debug, PartialEq)]
pub struct Segment {
    marker: MarkerSymbol,
    offset: u64,

    // Lxxx: Length of marker segment in bytes (not including the marker), 0
    // for markers without a segment.
    length: u16,

    kind: SegmentKind,
}

impl Segment {
    pub fn marker(&self) -> MarkerSymbol {
        self.marker
    }

    pub fn name(&self) -> &'static str {
        marker_name(self.marker)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }
}

/// Main header of a JPEG 2000 codestream.
///
/// The codestream is a linear stream of bytes made of marker segments. Only
/// the main header, from SOC up to the first SOT, is scanned here; the
/// entropy coded tile data that follows is left to a codec.
#[derive(Debug)]
pub struct Codestream {
    offset: u64,
    siz: ImageAndTileSizeMarkerSegment,
    segments: Vec<Segment>,
}

impl Codestream {
    /// Byte offset of the SOC marker in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Main header segments, in the order they appear.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn image_and_tile_size_marker_segment(&self) -> &ImageAndTileSizeMarkerSegment {
        &self.siz
    }

    pub fn coding_style_marker_segment(&self) -> Option<&CodingStyleMarkerSegment> {
        self.segments.iter().find_map(|segment| match &segment.kind {
            SegmentKind::CodingStyleDefault(cod) => Some(cod),
            _ => None,
        })
    }

    pub fn coding_style_component_segments(&self) -> Vec<&CodingStyleComponentSegment> {
        self.segments
            .iter()
            .filter_map(|segment| match &segment.kind {
                SegmentKind::CodingStyleComponent(coc) => Some(coc),
                _ => None,
            })
            .collect()
    }

    pub fn quantization_default_marker_segment(&self) -> Option<&QuantizationDefaultMarkerSegment> {
        self.segments.iter().find_map(|segment| match &segment.kind {
            SegmentKind::QuantizationDefault(qcd) => Some(qcd),
            _ => None,
        })
    }

    pub fn comment_marker_segments(&self) -> Vec<&CommentMarkerSegment> {
        self.segments
            .iter()
            .filter_map(|segment| match &segment.kind {
                SegmentKind::Comment(com) => Some(com),
                _ => None,
            })
            .collect()
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(&self.siz)
    }
}

type PayloadCursor<'a> = BinaryCursor<io::Cursor<&'a [u8]>>;

fn payload_cursor(payload: &[u8]) -> PayloadCursor<'_> {
    BinaryCursor::new(io::Cursor::new(payload))
}

fn remaining(cursor: &mut PayloadCursor) -> Result<u64, CursorError> {
    Ok(cursor.length()? - cursor.tell()?)
}

// Component indices are one byte when Csiz < 257, two bytes otherwise.
fn decode_component_index(
    cursor: &mut PayloadCursor,
    no_components: u16,
) -> Result<u16, CursorError> {
    if no_components < 257 {
        Ok(cursor.read_u8()? as u16)
    } else {
        cursor.read_u16()
    }
}

fn decode_siz(
    payload: &[u8],
    offset: u64,
    length: u16,
) -> Result<ImageAndTileSizeMarkerSegment, CodestreamError> {
    let mut cursor = payload_cursor(payload);
    let mut segment = ImageAndTileSizeMarkerSegment {
        offset,
        length,
        decoder_capabilities: cursor.read_u16()?,
        reference_grid_width: cursor.read_u32()?,
        reference_grid_height: cursor.read_u32()?,
        image_horizontal_offset: cursor.read_u32()?,
        image_vertical_offset: cursor.read_u32()?,
        reference_tile_width: cursor.read_u32()?,
        reference_tile_height: cursor.read_u32()?,
        tile_horizontal_offset: cursor.read_u32()?,
        tile_vertical_offset: cursor.read_u32()?,
        components: vec![],
    };

    let no_components = cursor.read_u16()?;
    if no_components == 0 {
        return Err(CodestreamError::NoComponents { offset });
    }

    for component in 0..no_components {
        let component_size = ComponentSize {
            precision: cursor.read_u8()?,
            horizontal_separation: cursor.read_u8()?,
            vertical_separation: cursor.read_u8()?,
        };
        if component_size.horizontal_separation == 0 || component_size.vertical_separation == 0
        {
            return Err(CodestreamError::InvalidSubsampling {
                component,
                horizontal_separation: component_size.horizontal_separation,
                vertical_separation: component_size.vertical_separation,
            });
        }
        segment.components.push(component_size);
    }

    if segment.reference_tile_width == 0 || segment.reference_tile_height == 0 {
        return Err(CodestreamError::InvalidTileSize {
            reference_tile_width: segment.reference_tile_width,
            reference_tile_height: segment.reference_tile_height,
        });
    }

    // The image area must be non-empty: XOsiz < Xsiz and YOsiz < Ysiz.
    if segment.image_horizontal_offset >= segment.reference_grid_width
        || segment.image_vertical_offset >= segment.reference_grid_height
    {
        return Err(CodestreamError::ImageOffsetOverflow {
            reference_grid_width: segment.reference_grid_width,
            reference_grid_height: segment.reference_grid_height,
            image_horizontal_offset: segment.image_horizontal_offset,
            image_vertical_offset: segment.image_vertical_offset,
        });
    }

    // The tile grid offsets (XTOsiz, YTOsiz) are constrained to be no
    // greater than the image area offsets. This is expressed by the
    // following ranges
    // 0 ≤ XTOsiz ≤ XOsiz
    // 0 ≤ YTOsiz ≤ YOsiz
    if segment.tile_horizontal_offset > segment.image_horizontal_offset
        || segment.tile_vertical_offset > segment.image_vertical_offset
    {
        return Err(CodestreamError::TileGridOffsetOverflow {
            tile_horizontal_offset: segment.tile_horizontal_offset,
            image_horizontal_offset: segment.image_horizontal_offset,
            tile_vertical_offset: segment.tile_vertical_offset,
            image_vertical_offset: segment.image_vertical_offset,
        });
    }

    // Also, the tile size plus the tile offset shall be greater than the image
    // area offset. This ensures that the first tile (tile 0) will contain at least
    // one reference grid point from the image area. This is expressed by the
    // following ranges
    //
    // XTsiz + XTOsiz > XOsiz
    // YTsiz + YTOsiz > YOsiz
    if (segment.reference_tile_width as u64 + segment.tile_horizontal_offset as u64)
        <= segment.image_horizontal_offset as u64
        || (segment.reference_tile_height as u64 + segment.tile_vertical_offset as u64)
            <= segment.image_vertical_offset as u64
    {
        return Err(CodestreamError::TileSizeOverflow {
            reference_tile_width: segment.reference_tile_width,
            tile_horizontal_offset: segment.tile_horizontal_offset,
            image_horizontal_offset: segment.image_horizontal_offset,
            reference_tile_height: segment.reference_tile_height,
            tile_vertical_offset: segment.tile_vertical_offset,
            image_vertical_offset: segment.image_vertical_offset,
        });
    }

    debug!(
        "SIZ grid {}x{} tile {}x{} components {}",
        segment.reference_grid_width,
        segment.reference_grid_height,
        segment.reference_tile_width,
        segment.reference_tile_height,
        no_components
    );

    Ok(segment)
}

// A.12 – Coding style default parameter values
fn decode_coding_style_parameters(
    cursor: &mut PayloadCursor,
    coding_style: u8,
) -> Result<CodingStyleParameters, CursorError> {
    let mut parameters = CodingStyleParameters {
        no_decomposition_levels: cursor.read_u8()?,
        code_block_width: cursor.read_u8()?,
        code_block_height: cursor.read_u8()?,
        code_block_style: cursor.read_u8()?,
        transformation: cursor.read_u8()?,
        precinct_sizes: vec![],
    };

    // One precinct size per resolution level, N_L + 1 of them.
    if coding_style & 0b0001 != 0 {
        let count = parameters.no_decomposition_levels as u64 + 1;
        parameters.precinct_sizes = cursor.read_bytes(count)?;
    }

    Ok(parameters)
}

fn decode_cod(payload: &[u8]) -> Result<CodingStyleMarkerSegment, CursorError> {
    let mut cursor = payload_cursor(payload);
    let coding_style = cursor.read_u8()?;
    Ok(CodingStyleMarkerSegment {
        coding_style,
        progression_order: cursor.read_u8()?,
        no_layers: cursor.read_u16()?,
        multiple_component_transformation: cursor.read_u8()?,
        coding_style_parameters: decode_coding_style_parameters(&mut cursor, coding_style)?,
    })
}

fn decode_coc(
    payload: &[u8],
    no_components: u16,
) -> Result<CodingStyleComponentSegment, CursorError> {
    let mut cursor = payload_cursor(payload);
    let component_index = decode_component_index(&mut cursor, no_components)?;
    let coding_style = cursor.read_u8()?;
    Ok(CodingStyleComponentSegment {
        component_index,
        coding_style,
        coding_style_parameters: decode_coding_style_parameters(&mut cursor, coding_style)?,
    })
}

fn decode_quantization_parameters(
    cursor: &mut PayloadCursor,
) -> Result<QuantizationParameters, CursorError> {
    let style = cursor.read_u8()?;
    let mut step_size_values = vec![];
    let width = match QuantizationStyle::new(style) {
        QuantizationStyle::No => 1,
        _ => 2,
    };
    while remaining(cursor)? >= width {
        step_size_values.push(cursor.read_uint(width as usize)? as u16);
    }
    Ok(QuantizationParameters {
        style,
        step_size_values,
    })
}

fn decode_qcd(payload: &[u8]) -> Result<QuantizationDefaultMarkerSegment, CursorError> {
    let mut cursor = payload_cursor(payload);
    Ok(QuantizationDefaultMarkerSegment {
        parameters: decode_quantization_parameters(&mut cursor)?,
    })
}

fn decode_qcc(
    payload: &[u8],
    no_components: u16,
) -> Result<QuantizationComponentSegment, CursorError> {
    let mut cursor = payload_cursor(payload);
    Ok(QuantizationComponentSegment {
        component_index: decode_component_index(&mut cursor, no_components)?,
        parameters: decode_quantization_parameters(&mut cursor)?,
    })
}

fn decode_rgn(payload: &[u8], no_components: u16) -> Result<RegionOfInterestSegment, CursorError> {
    let mut cursor = payload_cursor(payload);
    Ok(RegionOfInterestSegment {
        component_index: decode_component_index(&mut cursor, no_components)?,
        style: cursor.read_u8()?,
        shift: cursor.read_u8()?,
    })
}

fn decode_poc(
    payload: &[u8],
    no_components: u16,
) -> Result<ProgressionOrderChangeSegment, CursorError> {
    let mut cursor = payload_cursor(payload);
    let mut segment = ProgressionOrderChangeSegment::default();
    while remaining(&mut cursor)? > 0 {
        segment.progressions.push(Progression {
            resolution_level_start: cursor.read_u8()?,
            component_start: decode_component_index(&mut cursor, no_components)?,
            layer_end: cursor.read_u16()?,
            resolution_level_end: cursor.read_u8()?,
            component_end: decode_component_index(&mut cursor, no_components)?,
            order: cursor.read_u8()?,
        });
    }
    Ok(segment)
}

fn decode_crg(
    payload: &[u8],
    no_components: u16,
) -> Result<ComponentRegistrationSegment, CursorError> {
    let mut cursor = payload_cursor(payload);
    let mut segment = ComponentRegistrationSegment::default();
    for _ in 0..no_components {
        segment.offsets.push((cursor.read_u16()?, cursor.read_u16()?));
    }
    Ok(segment)
}

fn decode_tlm(payload: &[u8]) -> Result<TilePartLengthsSegment, CursorError> {
    let mut cursor = payload_cursor(payload);
    let index = cursor.read_u8()?;
    let parameter_sizes = cursor.read_u8()?;

    // Stlm: ST in bits 4-5 is the Ttlm size (0, 1 or 2 bytes), SP in bit 6
    // selects a 2 or 4 byte Ptlm.
    let tile_index_width = ((parameter_sizes >> 4) & 0b11) as usize;
    let length_width = if (parameter_sizes >> 6) & 1 == 1 { 4 } else { 2 };
    if tile_index_width == 3 {
        return Err(CursorError::UnsupportedWidth { width: 3 });
    }

    let mut segment = TilePartLengthsSegment {
        index,
        tile_part_lengths: vec![],
    };
    while remaining(&mut cursor)? > 0 {
        let tile_index = match tile_index_width {
            0 => None,
            width => Some(cursor.read_uint(width)? as u16),
        };
        let length = cursor.read_uint(length_width)? as u32;
        segment
            .tile_part_lengths
            .push(TilePartLength { tile_index, length });
    }
    Ok(segment)
}

fn decode_com(payload: &[u8]) -> Result<CommentMarkerSegment, CursorError> {
    let mut cursor = payload_cursor(payload);
    let registration_value = cursor.read_u16()?;
    let length = remaining(&mut cursor)?;
    Ok(CommentMarkerSegment {
        registration_value,
        comment: cursor.read_bytes(length)?,
    })
}

fn decode_segment_kind(
    marker: MarkerSymbol,
    payload: Vec<u8>,
    no_components: u16,
) -> SegmentKind {
    let result = match marker {
        MARKER_SYMBOL_COD => decode_cod(&payload).map(SegmentKind::CodingStyleDefault),
        MARKER_SYMBOL_COC => {
            decode_coc(&payload, no_components).map(SegmentKind::CodingStyleComponent)
        }
        MARKER_SYMBOL_QCD => decode_qcd(&payload).map(SegmentKind::QuantizationDefault),
        MARKER_SYMBOL_QCC => {
            decode_qcc(&payload, no_components).map(SegmentKind::QuantizationComponent)
        }
        MARKER_SYMBOL_RGN => decode_rgn(&payload, no_components).map(SegmentKind::RegionOfInterest),
        MARKER_SYMBOL_POC => {
            decode_poc(&payload, no_components).map(SegmentKind::ProgressionOrderChange)
        }
        MARKER_SYMBOL_CRG => {
            decode_crg(&payload, no_components).map(SegmentKind::ComponentRegistration)
        }
        MARKER_SYMBOL_TLM => decode_tlm(&payload).map(SegmentKind::TilePartLengths),
        MARKER_SYMBOL_COM => decode_com(&payload).map(SegmentKind::Comment),
        _ => {
            debug!("keeping marker 0x{:04X} undecoded", marker);
            return SegmentKind::Unknown { payload };
        }
    };

    match result {
        Ok(kind) => kind,
        Err(error) => {
            warn!(
                "{} segment could not be decoded ({}), keeping it undecoded",
                marker_name(marker),
                error
            );
            SegmentKind::Unknown { payload }
        }
    }
}

/// Scan the main header, from SOC up to the first SOT.
///
/// On success the cursor is left on the SOT marker (or just after EOC for a
/// codestream without tiles).
pub fn parse_main_header<R: io::Read + io::Seek>(
    cursor: &mut BinaryCursor<R>,
) -> Result<Codestream, CodestreamError> {
    let offset = cursor.tell()?;

    // SOC (Required as the first marker)
    let marker = cursor.read_u16()?;
    if marker != MARKER_SYMBOL_SOC {
        return Err(CodestreamError::MarkerUnexpected { marker, offset });
    }
    info!("SOC start at byte offset {}", offset);
    let mut segments = vec![Segment {
        marker,
        offset,
        length: 0,
        kind: SegmentKind::StartOfCodestream,
    }];

    // SIZ (Required as the second marker segment)
    let siz_offset = cursor.tell()?;
    let marker = cursor.read_u16()?;
    if marker != MARKER_SYMBOL_SIZ {
        return Err(CodestreamError::MarkerUnexpected {
            marker,
            offset: siz_offset,
        });
    }
    let length = cursor.read_u16()?;
    if length < 2 {
        return Err(CodestreamError::MarkerError {
            marker,
            error: format!("segment length {} is too short", length),
        });
    }
    let payload = cursor.read_bytes(length as u64 - 2)?;
    let siz = match decode_siz(&payload, siz_offset, length) {
        Ok(siz) => siz,
        Err(CodestreamError::Cursor { error }) => {
            return Err(CodestreamError::MarkerError {
                marker,
                error: error.to_string(),
            })
        }
        Err(error) => return Err(error),
    };
    info!("SIZ end at byte offset {}", cursor.tell()?);
    let no_components = siz.no_components();
    segments.push(Segment {
        marker,
        offset: siz_offset,
        length,
        kind: SegmentKind::ImageAndTileSize(siz.clone()),
    });

    loop {
        let offset = cursor.tell()?;
        let marker = cursor.read_u16()?;

        match marker {
            // Start of tile bit-stream
            MARKER_SYMBOL_SOT => {
                cursor.seek(offset)?;
                break;
            }
            MARKER_SYMBOL_EOC => {
                segments.push(Segment {
                    marker,
                    offset,
                    length: 0,
                    kind: SegmentKind::EndOfCodestream,
                });
                break;
            }
            MARKER_SYMBOL_SIZ => {
                return Err(CodestreamError::MarkerDuplicate { marker, offset });
            }
            marker if marker < 0xFF01 => {
                return Err(CodestreamError::MarkerUnexpected { marker, offset });
            }
            marker if !has_payload(marker) => {
                segments.push(Segment {
                    marker,
                    offset,
                    length: 0,
                    kind: SegmentKind::Unknown { payload: vec![] },
                });
            }
            marker => {
                let length = cursor.read_u16()?;
                if length < 2 {
                    return Err(CodestreamError::MarkerError {
                        marker,
                        error: format!("segment length {} is too short", length),
                    });
                }
                let payload = cursor.read_bytes(length as u64 - 2)?;
                info!(
                    "{} segment at byte offset {} length {}",
                    marker_name(marker),
                    offset,
                    length
                );
                segments.push(Segment {
                    marker,
                    offset,
                    length,
                    kind: decode_segment_kind(marker, payload, no_components),
                });
            }
        }
    }

    let codestream = Codestream {
        offset,
        siz,
        segments,
    };
    if codestream.coding_style_marker_segment().is_none() {
        warn!("codestream main header has no COD marker segment");
    }
    if codestream.quantization_default_marker_segment().is_none() {
        warn!("codestream main header has no QCD marker segment");
    }

    Ok(codestream)
}

/// Scan the main header of a codestream starting at the reader's position.
pub fn decode_jpc<R: io::Read + io::Seek>(reader: &mut R) -> Result<Codestream, CodestreamError> {
    let mut cursor = BinaryCursor::new(reader);
    parse_main_header(&mut cursor)
}
