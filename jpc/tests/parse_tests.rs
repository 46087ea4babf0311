use std::io::Cursor;

use cursor::BinaryCursor;
use jpc::{
    decode_jpc, parse_main_header, CodestreamError, CommentRegistrationValue,
    MultipleComponentTransformation, ProgressionOrder, QuantizationStyle, SegmentKind,
    TransformationFilter, MARKER_SYMBOL_CAP, MARKER_SYMBOL_COD, MARKER_SYMBOL_COM,
    MARKER_SYMBOL_EOC, MARKER_SYMBOL_QCD, MARKER_SYMBOL_SIZ, MARKER_SYMBOL_SOC,
    MARKER_SYMBOL_SOT,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn segment(marker: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = marker.to_be_bytes().to_vec();
    bytes.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

struct Siz {
    width: u32,
    height: u32,
    x_offset: u32,
    y_offset: u32,
    tile_width: u32,
    tile_height: u32,
    tile_x_offset: u32,
    tile_y_offset: u32,
    components: Vec<(u8, u8, u8)>,
}

impl Siz {
    fn rgb(width: u32, height: u32) -> Siz {
        Siz {
            width,
            height,
            x_offset: 0,
            y_offset: 0,
            tile_width: width,
            tile_height: height,
            tile_x_offset: 0,
            tile_y_offset: 0,
            components: vec![(7, 1, 1); 3],
        }
    }

    fn payload(&self) -> Vec<u8> {
        let mut payload = 0u16.to_be_bytes().to_vec();
        for value in [
            self.width,
            self.height,
            self.x_offset,
            self.y_offset,
            self.tile_width,
            self.tile_height,
            self.tile_x_offset,
            self.tile_y_offset,
        ] {
            payload.extend_from_slice(&value.to_be_bytes());
        }
        payload.extend_from_slice(&(self.components.len() as u16).to_be_bytes());
        for (ssiz, xrsiz, yrsiz) in &self.components {
            payload.extend_from_slice(&[*ssiz, *xrsiz, *yrsiz]);
        }
        payload
    }
}

// COD: no precincts, LRCP, 1 layer, MCT, 5 levels, 64x64 blocks, 5-3 filter
const COD_PAYLOAD: [u8; 10] = [0x00, 0x00, 0x00, 0x01, 0x01, 0x05, 0x04, 0x04, 0x00, 0x01];

// QCD: no quantization, 2 guard bits, 4 exponents
const QCD_PAYLOAD: [u8; 5] = [0x40, 0x40, 0x48, 0x48, 0x50];

fn main_header(siz: &Siz, rest: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = MARKER_SYMBOL_SOC.to_be_bytes().to_vec();
    bytes.extend(segment(MARKER_SYMBOL_SIZ, &siz.payload()));
    for part in rest {
        bytes.extend_from_slice(part);
    }
    bytes
}

fn sot() -> Vec<u8> {
    // Isot = 0, Psot = 0, TPsot = 0, TNsot = 1
    segment(MARKER_SYMBOL_SOT, &[0, 0, 0, 0, 0, 0, 0, 1])
}

#[test]
fn test_main_header_stops_at_sot() {
    init();
    let mut bytes = main_header(
        &Siz::rgb(128, 64),
        &[
            segment(MARKER_SYMBOL_COD, &COD_PAYLOAD),
            segment(MARKER_SYMBOL_QCD, &QCD_PAYLOAD),
            segment(MARKER_SYMBOL_COM, b"\x00\x01Created by OpenJPEG version 2.5.0"),
        ],
    );
    let sot_offset = bytes.len() as u64;
    bytes.extend(sot());
    bytes.extend_from_slice(&[0xFF, 0x93, 0xDE, 0xAD]);

    let mut cursor = BinaryCursor::new(Cursor::new(bytes));
    let codestream = parse_main_header(&mut cursor).expect("main header should parse");
    assert_eq!(cursor.tell().unwrap(), sot_offset);
    assert_eq!(codestream.offset(), 0);

    let names: Vec<&str> = codestream.segments().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["SOC", "SIZ", "COD", "QCD", "COM"]);

    let siz = codestream.image_and_tile_size_marker_segment();
    assert_eq!(siz.offset(), 2);
    assert_eq!(siz.length(), 47);
    assert_eq!(siz.reference_grid_width(), 128);
    assert_eq!(siz.reference_grid_height(), 64);
    assert_eq!(siz.no_components(), 3);
    assert_eq!(siz.precision(0), Some(8));
    assert_eq!(siz.values_are_signed(2), Some(false));
    assert_eq!(siz.precision(3), None);

    let cod = codestream
        .coding_style_marker_segment()
        .expect("COD should be present");
    assert_eq!(cod.progression_order(), ProgressionOrder::LRLCPP);
    assert_eq!(cod.no_layers(), 1);
    assert_eq!(
        cod.multiple_component_transformation(),
        MultipleComponentTransformation::Multiple
    );
    assert!(!cod.has_defined_precinct_size());
    let parameters = cod.coding_style_parameters();
    assert_eq!(parameters.no_decomposition_levels(), 5);
    assert_eq!(parameters.code_block_width(), 64);
    assert_eq!(parameters.code_block_height(), 64);
    assert!(parameters.coding_block_styles().is_empty());
    assert_eq!(parameters.transformation(), TransformationFilter::Reversible);
    assert_eq!(parameters.precinct_sizes().len(), 1);
    assert_eq!(parameters.precinct_sizes()[0].width_exponent(), 15);

    let qcd = codestream
        .quantization_default_marker_segment()
        .expect("QCD should be present");
    assert_eq!(qcd.parameters().style(), QuantizationStyle::No);
    assert_eq!(qcd.parameters().exponents(), vec![8, 9, 9, 10]);

    let comments = codestream.comment_marker_segments();
    assert_eq!(comments.len(), 1);
    assert_eq!(
        comments[0].registration_value(),
        CommentRegistrationValue::Latin
    );
    assert_eq!(
        comments[0].comment_utf8().unwrap(),
        "Created by OpenJPEG version 2.5.0"
    );
}

#[test]
fn test_geometry_with_subsampling() {
    init();
    let mut siz = Siz::rgb(65, 33);
    siz.components = vec![(7, 1, 1), (7, 2, 2), (7, 2, 2)];
    siz.tile_width = 32;
    siz.tile_height = 32;
    let mut bytes = main_header(&siz, &[]);
    bytes.extend(sot());

    let codestream = decode_jpc(&mut Cursor::new(bytes)).unwrap();
    let geometry = codestream.geometry();
    assert_eq!(geometry.image_width, 65);
    assert_eq!(geometry.image_height, 33);
    assert_eq!(geometry.no_tiles_x, 3);
    assert_eq!(geometry.no_tiles_y, 2);
    assert_eq!(geometry.no_tiles(), 6);
    assert_eq!(geometry.no_components(), 3);
    assert_eq!(geometry.components[0].width, 65);
    assert_eq!(geometry.components[0].height, 33);
    assert_eq!(geometry.components[1].width, 33);
    assert_eq!(geometry.components[1].height, 17);
    assert_eq!(geometry.components[2].horizontal_separation, 2);
}

#[test]
fn test_geometry_with_image_offset() {
    let mut siz = Siz::rgb(100, 50);
    siz.x_offset = 3;
    siz.y_offset = 1;
    siz.components = vec![(11, 2, 2)];
    let mut bytes = main_header(&siz, &[]);
    bytes.extend(sot());

    let geometry = decode_jpc(&mut Cursor::new(bytes)).unwrap().geometry();
    assert_eq!(geometry.image_width, 97);
    assert_eq!(geometry.image_height, 49);
    // ceil(100 / 2) - ceil(3 / 2), ceil(50 / 2) - ceil(1 / 2)
    assert_eq!(geometry.components[0].width, 48);
    assert_eq!(geometry.components[0].height, 24);
    assert_eq!(geometry.components[0].precision, 12);
}

#[test]
fn test_signed_component() {
    let mut siz = Siz::rgb(8, 8);
    siz.components = vec![(0x8F, 1, 1)];
    let bytes = main_header(&siz, &[sot()]);

    let codestream = decode_jpc(&mut Cursor::new(bytes)).unwrap();
    let geometry = codestream.geometry();
    assert!(geometry.components[0].signed);
    assert_eq!(geometry.components[0].precision, 16);
}

#[test]
fn test_unrecognized_marker_is_kept_verbatim() {
    let bytes = main_header(
        &Siz::rgb(8, 8),
        &[segment(MARKER_SYMBOL_CAP, &[0x00, 0x02, 0x00, 0x00, 0x00, 0x0A]), sot()],
    );
    let codestream = decode_jpc(&mut Cursor::new(bytes)).unwrap();
    let cap = &codestream.segments()[2];
    assert_eq!(cap.marker(), MARKER_SYMBOL_CAP);
    assert_eq!(cap.length(), 8);
    assert_eq!(
        cap.kind(),
        &SegmentKind::Unknown {
            payload: vec![0x00, 0x02, 0x00, 0x00, 0x00, 0x0A]
        }
    );
}

#[test]
fn test_short_cod_is_kept_verbatim() {
    let bytes = main_header(
        &Siz::rgb(8, 8),
        &[segment(MARKER_SYMBOL_COD, &[0x00, 0x00]), sot()],
    );
    let codestream = decode_jpc(&mut Cursor::new(bytes)).unwrap();
    assert!(codestream.coding_style_marker_segment().is_none());
    assert_eq!(
        codestream.segments()[2].kind(),
        &SegmentKind::Unknown {
            payload: vec![0x00, 0x00]
        }
    );
}

#[test]
fn test_code_block_sizes() {
    init();
    for (xcb, ycb, width, height) in [(0x02, 0x05, 16, 128), (0x0F, 0x0F, 131072, 131072)] {
        let mut payload = COD_PAYLOAD;
        payload[6] = xcb;
        payload[7] = ycb;
        let bytes = main_header(
            &Siz::rgb(8, 8),
            &[segment(MARKER_SYMBOL_COD, &payload), sot()],
        );
        let codestream = decode_jpc(&mut Cursor::new(bytes)).unwrap();
        let parameters = codestream
            .coding_style_marker_segment()
            .expect("COD should be present")
            .coding_style_parameters();
        assert_eq!(parameters.code_block_width(), width);
        assert_eq!(parameters.code_block_height(), height);
    }
}

#[test]
fn test_eoc_ends_header_without_tiles() {
    let mut eoc = MARKER_SYMBOL_EOC.to_be_bytes().to_vec();
    eoc.extend_from_slice(b"trailing");
    let bytes = main_header(&Siz::rgb(8, 8), &[eoc]);
    let codestream = decode_jpc(&mut Cursor::new(bytes)).unwrap();
    let last = codestream.segments().last().unwrap();
    assert_eq!(last.kind(), &SegmentKind::EndOfCodestream);
}

#[test]
fn test_missing_soc() {
    let mut bytes = main_header(&Siz::rgb(8, 8), &[sot()]);
    bytes[1] = 0x4E;
    match decode_jpc(&mut Cursor::new(bytes)) {
        Err(CodestreamError::MarkerUnexpected { marker, offset }) => {
            assert_eq!(marker, 0xFF4E);
            assert_eq!(offset, 0);
        }
        other => panic!("expected unexpected marker, got {:?}", other),
    }
}

#[test]
fn test_siz_must_follow_soc() {
    let mut bytes = MARKER_SYMBOL_SOC.to_be_bytes().to_vec();
    bytes.extend(segment(MARKER_SYMBOL_COD, &COD_PAYLOAD));
    bytes.extend(segment(MARKER_SYMBOL_SIZ, &Siz::rgb(8, 8).payload()));
    let error = decode_jpc(&mut Cursor::new(bytes)).unwrap_err();
    assert!(error.is_malformed());
    assert!(matches!(
        error,
        CodestreamError::MarkerUnexpected {
            marker: MARKER_SYMBOL_COD,
            offset: 2
        }
    ));
}

#[test]
fn test_duplicate_siz() {
    let siz = Siz::rgb(8, 8);
    let bytes = main_header(&siz, &[segment(MARKER_SYMBOL_SIZ, &siz.payload()), sot()]);
    let error = decode_jpc(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(error, CodestreamError::MarkerDuplicate { .. }));
}

#[test]
fn test_zero_components() {
    let mut siz = Siz::rgb(8, 8);
    siz.components.clear();
    let bytes = main_header(&siz, &[sot()]);
    let error = decode_jpc(&mut Cursor::new(bytes)).unwrap_err();
    assert!(error.is_malformed());
    assert!(matches!(error, CodestreamError::NoComponents { offset: 2 }));
}

#[test]
fn test_zero_subsampling() {
    let mut siz = Siz::rgb(8, 8);
    siz.components[1] = (7, 0, 1);
    let bytes = main_header(&siz, &[sot()]);
    let error = decode_jpc(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(
        error,
        CodestreamError::InvalidSubsampling { component: 1, .. }
    ));
}

#[test]
fn test_zero_tile_size() {
    let mut siz = Siz::rgb(8, 8);
    siz.tile_height = 0;
    let bytes = main_header(&siz, &[sot()]);
    let error = decode_jpc(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(error, CodestreamError::InvalidTileSize { .. }));
}

#[test]
fn test_tile_grid_offset_overflow() {
    let mut siz = Siz::rgb(8, 8);
    siz.tile_x_offset = 1;
    let bytes = main_header(&siz, &[sot()]);
    let error = decode_jpc(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(
        error,
        CodestreamError::TileGridOffsetOverflow { .. }
    ));
}

#[test]
fn test_truncated_siz_is_malformed() {
    let mut bytes = MARKER_SYMBOL_SOC.to_be_bytes().to_vec();
    bytes.extend(segment(MARKER_SYMBOL_SIZ, &Siz::rgb(8, 8).payload()[..20]));
    bytes.extend(sot());
    let error = decode_jpc(&mut Cursor::new(bytes)).unwrap_err();
    assert!(error.is_malformed());
    assert!(matches!(
        error,
        CodestreamError::MarkerError {
            marker: MARKER_SYMBOL_SIZ,
            ..
        }
    ));
}

#[test]
fn test_truncated_source() {
    let bytes = main_header(&Siz::rgb(8, 8), &[segment(MARKER_SYMBOL_COD, &COD_PAYLOAD)]);
    let cut = bytes.len() - 3;
    let error = decode_jpc(&mut Cursor::new(&bytes[..cut])).unwrap_err();
    assert!(error.is_truncated());
    assert!(!error.is_malformed());
}

#[test]
fn test_component_index_width_follows_component_count() {
    // 300 components: QCC component indices are two bytes wide.
    let mut siz = Siz::rgb(8, 8);
    siz.components = vec![(7, 1, 1); 300];
    let qcc = segment(jpc::MARKER_SYMBOL_QCC, &[0x01, 0x02, 0x40, 0x40, 0x48]);
    let bytes = main_header(&siz, &[qcc, sot()]);

    let codestream = decode_jpc(&mut Cursor::new(bytes)).unwrap();
    match codestream.segments()[2].kind() {
        SegmentKind::QuantizationComponent(qcc) => {
            assert_eq!(qcc.component_index(), 258);
            assert_eq!(qcc.parameters().exponents(), vec![8, 9]);
        }
        other => panic!("expected QCC, got {:?}", other),
    }
}
