use std::io::Cursor;

use cursor::BinaryCursor;
use jp2::{
    parse_boxes, ColourSpecificationMethods, EnumeratedColourSpaces, FileKind, JBox, JP2Box,
    JP2Error, Jp2File, ParseContext, ParseOptions, BOX_TYPE_ASSOCIATION,
    BOX_TYPE_COLOUR_SPECIFICATION, BOX_TYPE_IMAGE_HEADER, MAX_SUPERBOX_DEPTH,
};

mod shared;
use shared::*;

fn decode(bytes: &[u8]) -> Jp2File {
    Jp2File::decode(&mut Cursor::new(bytes), ParseOptions::default())
        .expect("file should parse")
}

fn parse(bytes: Vec<u8>) -> (Result<Vec<JP2Box>, JP2Error>, ParseContext) {
    let end = bytes.len() as u64;
    let mut cursor = BinaryCursor::new(Cursor::new(bytes));
    let mut context = ParseContext::new(ParseOptions::default());
    let result = parse_boxes(&mut cursor, end, &mut context);
    (result, context)
}

fn header_children(file: &Jp2File) -> &[JP2Box] {
    file.header_box()
        .and_then(JP2Box::children)
        .expect("file should have a JP2 header box")
}

#[test]
fn test_conformant_file() {
    init();
    let bytes = conformant_jp2();
    let file = decode(&bytes);

    assert_eq!(file.kind(), FileKind::Jp2);
    assert!(file.diagnostics().is_empty(), "{:?}", file.diagnostics());

    let names: Vec<&str> = file.boxes().iter().map(JP2Box::name).collect();
    assert_eq!(
        names,
        vec![
            "JPEG 2000 Signature",
            "File Type",
            "JP2 Header",
            "Contiguous Codestream"
        ]
    );
    assert_eq!(file.boxes()[0].offset(), 0);
    assert_eq!(file.boxes()[1].offset(), 12);
    assert_eq!(file.boxes()[3].length() as usize, rgb_codestream().len() + 8);

    let JP2Box::FileType(file_type) = &file.boxes()[1] else {
        panic!("second box should be the file type box");
    };
    assert_eq!(file_type.brand(), "jp2 ");
    assert_eq!(file_type.minor_version(), 0);
    assert_eq!(file_type.compatibility_list(), vec!["jp2 "]);

    let children = header_children(&file);
    let JP2Box::ImageHeader(ihdr) = &children[0] else {
        panic!("image header box should come first");
    };
    assert_eq!(ihdr.height(), 33);
    assert_eq!(ihdr.width(), 65);
    assert_eq!(ihdr.no_components(), 3);
    assert_eq!(ihdr.bits_per_component(), Some(8));
    assert_eq!(ihdr.compression_type(), 7);

    let JP2Box::ColourSpecification(colr) = &children[1] else {
        panic!("colour specification box should follow");
    };
    assert_eq!(
        colr.method(),
        ColourSpecificationMethods::EnumeratedColourSpace
    );
    assert_eq!(
        colr.enumerated_colour_space(),
        Some(EnumeratedColourSpaces::sRGB)
    );
    assert!(colr.icc_profile_header().is_none());

    let codestream = file.codestream().expect("codestream should be scanned");
    assert_eq!(codestream.offset(), bytes.len() as u64 - rgb_codestream().len() as u64);
    let segments: Vec<&str> = codestream.segments().iter().map(|s| s.name()).collect();
    assert_eq!(segments, vec!["SOC", "SIZ", "COD", "QCD"]);
}

#[test]
fn test_geometry_with_subsampling() {
    init();
    let file = decode(&conformant_jp2());
    let geometry = file.geometry().expect("geometry should be known");

    assert_eq!(geometry.image_width, 65);
    assert_eq!(geometry.image_height, 33);
    assert_eq!(geometry.no_tiles(), 1);
    assert_eq!(geometry.no_components(), 3);
    assert_eq!(
        (geometry.components[0].width, geometry.components[0].height),
        (65, 33)
    );
    assert_eq!(
        (geometry.components[1].width, geometry.components[1].height),
        (33, 17)
    );
    assert_eq!(geometry.components[2].precision, 8);
}

#[test]
fn test_codestream_scan_is_optional() {
    init();
    let options = ParseOptions {
        scan_codestream: false,
        ..Default::default()
    };
    let file = Jp2File::decode(&mut Cursor::new(conformant_jp2()), options)
        .expect("file should parse");
    assert!(file.codestream().is_none());
    assert!(file.geometry().is_none());
    assert_eq!(file.boxes().len(), 4);
}

#[test]
fn test_codestream_scan_stops_at_box_end() {
    init();
    // Cut inside the COD segment, with an XML box after the codestream box
    let codestream = &rgb_codestream()[..58];
    let mut bytes = jp2_file(&[image_header(33, 65, 3, 7), colr_enumerated(16)], codestream);
    bytes.extend(jbox(b"xml ", b"<x>padding beyond the codestream</x>"));

    let error = Jp2File::decode(&mut Cursor::new(bytes.as_slice()), ParseOptions::default())
        .expect_err("truncated codestream should fail the scan");
    assert!(error.is_truncated());

    let options = ParseOptions {
        scan_codestream: false,
        ..Default::default()
    };
    let file = Jp2File::decode(&mut Cursor::new(bytes.as_slice()), options)
        .expect("file should parse without the scan");
    assert_eq!(file.boxes().len(), 5);
}

#[test]
fn test_raw_codestream() {
    init();
    let bytes = rgb_codestream();
    let file = decode(&bytes);

    assert_eq!(file.kind(), FileKind::Codestream);
    assert_eq!(file.boxes().len(), 1);
    let jp2c = file.first_codestream_box().expect("codestream box");
    assert_eq!(jp2c.codestream_offset(), Some(0));
    assert_eq!(jp2c.codestream_length(), bytes.len() as u64);
    assert_eq!(file.geometry().map(|g| g.image_width), Some(65));
}

#[test]
fn test_not_jpeg2000() {
    init();
    let result = Jp2File::decode(
        &mut Cursor::new(b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec()),
        ParseOptions::default(),
    );
    match result {
        Err(JP2Error::NotJpeg2000 { magic }) => assert_eq!(magic.len(), 12),
        other => panic!("expected NotJpeg2000, got {:?}", other),
    }

    let result = Jp2File::decode(&mut Cursor::new(vec![0xFF]), ParseOptions::default());
    assert!(matches!(result, Err(JP2Error::NotJpeg2000 { .. })));
}

#[test]
fn test_icc_profile_version_2() {
    init();
    let bytes = jp2_file(
        &[image_header(33, 65, 3, 7), colr_icc(&icc_profile(2))],
        &rgb_codestream(),
    );
    let file = decode(&bytes);
    assert!(file.diagnostics().is_empty(), "{:?}", file.diagnostics());

    let JP2Box::ColourSpecification(colr) = &header_children(&file)[1] else {
        panic!("colour specification box should follow the image header");
    };
    assert_eq!(colr.method(), ColourSpecificationMethods::RestrictedICCProfile);
    assert_eq!(colr.icc_profile().map(<[u8]>::len), Some(132));

    let header = colr
        .icc_profile_header()
        .expect("box should carry a profile")
        .expect("profile header should decode");
    assert_eq!(header.version(), "2.2.0");
    assert_eq!(header.field("Device Class").as_deref(), Some("display device profile"));
    assert_eq!(header.field("Color Space").as_deref(), Some("RGB"));
    assert_eq!(header.field("Rendering Intent").as_deref(), Some("perceptual"));
    assert!(header.field("Datetime").is_some());
    assert!(header.field("Profile Id").is_none());
}

#[test]
fn test_icc_profile_version_4() {
    init();
    let bytes = jp2_file(
        &[image_header(33, 65, 3, 7), colr_icc(&icc_profile(4))],
        &rgb_codestream(),
    );
    let file = decode(&bytes);
    let JP2Box::ColourSpecification(colr) = &header_children(&file)[1] else {
        panic!("colour specification box should follow the image header");
    };
    let header = colr
        .icc_profile_header()
        .expect("box should carry a profile")
        .expect("profile header should decode");
    assert_eq!(
        header.field("Profile Id").as_deref(),
        Some("0102030405060708090a0b0c0d0e0f10")
    );
}

#[test]
fn test_truncated_icc_profile() {
    init();
    let bytes = jp2_file(
        &[image_header(33, 65, 3, 7), colr_icc(&[0u8; 20])],
        &rgb_codestream(),
    );
    let file = decode(&bytes);
    let JP2Box::ColourSpecification(colr) = &header_children(&file)[1] else {
        panic!("colour specification box should follow the image header");
    };
    assert!(matches!(
        colr.icc_profile_header(),
        Some(Err(JP2Error::ICC { .. }))
    ));
}

#[test]
fn test_unknown_colour_method_is_kept_opaque() {
    init();
    let bad_colr = jbox(b"colr", &[9, 0, 0, 0, 0, 0, 16]);
    let bytes = jp2_file(
        &[image_header(33, 65, 3, 7), bad_colr.clone()],
        &rgb_codestream(),
    );
    let file = decode(&bytes);

    let children = header_children(&file);
    assert_eq!(children.len(), 2);
    let JP2Box::Unknown(unknown) = &children[1] else {
        panic!("colour specification box should be kept undecoded");
    };
    assert_eq!(unknown.identifier(), BOX_TYPE_COLOUR_SPECIFICATION);
    assert_eq!(unknown.data(), &bad_colr[8..]);
    assert!(file
        .diagnostics()
        .iter()
        .any(|d| d.box_type == Some(BOX_TYPE_COLOUR_SPECIFICATION)
            && d.message.contains("method 9")));
}

#[test]
fn test_short_image_header_is_kept_opaque() {
    init();
    let short_ihdr = jbox(b"ihdr", &[0, 0, 0, 33, 0, 0]);
    let bytes = jp2_file(&[short_ihdr, colr_enumerated(16)], &rgb_codestream());
    let file = decode(&bytes);

    let children = header_children(&file);
    assert!(matches!(&children[0], JP2Box::Unknown(_)));
    assert_eq!(children[0].identifier(), BOX_TYPE_IMAGE_HEADER);
    assert!(file
        .diagnostics()
        .iter()
        .any(|d| d.box_type == Some(BOX_TYPE_IMAGE_HEADER)));
}

#[test]
fn test_header_without_image_header() {
    init();
    let bytes = jp2_file(&[colr_enumerated(17)], &rgb_codestream());
    let file = decode(&bytes);

    assert_eq!(header_children(&file).len(), 1);
    let messages: Vec<&str> = file
        .diagnostics()
        .iter()
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(messages, vec!["no image header box"]);
}

#[test]
fn test_nonzero_precedence_is_diagnosed() {
    init();
    let colr = jbox(b"colr", &[1, 1, 2, 0, 0, 0, 16]);
    let bytes = jp2_file(&[image_header(33, 65, 3, 7), colr], &rgb_codestream());
    let file = decode(&bytes);

    let JP2Box::ColourSpecification(colr) = &header_children(&file)[1] else {
        panic!("colour specification box should still be decoded");
    };
    assert_eq!(colr.precedence(), 1);
    assert_eq!(colr.colourspace_approximation(), 2);
    assert_eq!(file.diagnostics().len(), 1);
}

#[test]
fn test_extended_length_header() {
    init();
    let xml = b"<x>extended</x>";
    let mut bytes = conformant_jp2();
    let xml_offset = bytes.len() as u64;
    bytes.extend(xl_box(b"xml ", xml));
    let file = decode(&bytes);

    assert!(file.diagnostics().is_empty(), "{:?}", file.diagnostics());
    let JP2Box::Xml(xml_box) = &file.boxes()[4] else {
        panic!("last box should be the XML box");
    };
    assert_eq!(xml_box.offset(), xml_offset);
    assert_eq!(xml_box.length(), xml.len() as u64 + 16);
    assert_eq!(xml_box.format(), Ok("<x>extended</x>"));
}

#[test]
fn test_zero_length_codestream_box() {
    init();
    let mut bytes = [
        signature(),
        file_type(),
        superbox(b"jp2h", &[image_header(33, 65, 3, 7), colr_enumerated(16)]),
    ]
    .concat();
    let jp2c_offset = bytes.len() as u64;
    let codestream = rgb_codestream();
    bytes.extend(jbox(b"jp2c", &codestream));
    // Length 0: the box runs to the end of the file
    bytes[jp2c_offset as usize..jp2c_offset as usize + 4].copy_from_slice(&[0, 0, 0, 0]);

    let file = decode(&bytes);
    assert!(file.diagnostics().is_empty(), "{:?}", file.diagnostics());
    let jp2c = file.first_codestream_box().expect("codestream box");
    assert_eq!(jp2c.length(), codestream.len() as u64 + 8);
    assert_eq!(jp2c.codestream_offset(), Some(jp2c_offset + 8));
    assert!(file.codestream().is_some());
}

#[test]
fn test_reserved_length_is_recovered() {
    init();
    let bad = [0u8, 0, 0, 3, b'b', b'a', b'd', b'!', 1, 2, 3];
    let jp2h = superbox(
        b"jp2h",
        &[image_header(33, 65, 3, 7), colr_enumerated(16), bad.to_vec()],
    );
    let bytes = [signature(), file_type(), jp2h, jbox(b"jp2c", &rgb_codestream())].concat();
    let file = decode(&bytes);

    let children = header_children(&file);
    assert_eq!(children.len(), 3);
    let JP2Box::Unknown(unknown) = &children[2] else {
        panic!("malformed box should be kept opaque");
    };
    assert_eq!(unknown.identifier(), *b"bad!");
    assert_eq!(unknown.data(), &[1, 2, 3]);
    assert_eq!(file.diagnostics().len(), 1);
    assert!(file.diagnostics()[0].message.contains("reserved box length 3"));

    // The codestream after the JP2 header is unaffected
    assert_eq!(file.boxes().len(), 4);
    assert!(file.codestream().is_some());
}

#[test]
fn test_overrunning_box_is_recovered() {
    init();
    let mut bytes = conformant_jp2();
    // A box claiming 100 bytes where 12 remain
    bytes.extend_from_slice(&[0, 0, 0, 100, b'x', b'm', b'l', b' ', b'<', b'x', b'/', b'>']);
    let file = decode(&bytes);

    assert_eq!(file.boxes().len(), 5);
    let JP2Box::Unknown(unknown) = &file.boxes()[4] else {
        panic!("overrunning box should be kept opaque");
    };
    assert_eq!(unknown.data(), b"<x/>");
    assert!(file.diagnostics()[0].message.contains("overruns"));
}

#[test]
fn test_malformed_first_box_is_fatal() {
    init();
    let (result, _) = parse(vec![0, 0, 0, 2, b'j', b'P', b' ', b' ', 0, 0, 0, 0]);
    match result {
        Err(error) => assert!(error.is_malformed()),
        Ok(boxes) => panic!("expected a malformed box error, got {:?}", boxes),
    }
}

#[test]
fn test_trailing_bytes() {
    init();
    let mut bytes = conformant_jp2();
    bytes.extend_from_slice(&[0, 0, 0, 0, 0]);
    let file = decode(&bytes);

    assert_eq!(file.boxes().len(), 4);
    assert_eq!(file.diagnostics().len(), 1);
    assert!(file.diagnostics()[0].box_type.is_none());
    assert!(file.diagnostics()[0]
        .message
        .contains("too short to form a box header"));
}

#[test]
fn test_deeply_nested_superboxes() {
    init();
    // Association boxes with LBox 0, each one running to the end of its parent
    let bytes = [0u8, 0, 0, 0, b'a', b's', b'o', b'c'].repeat(200_000);
    let (result, context) = parse(bytes);
    let boxes = result.expect("nesting should not fail the parse");

    let mut jbox = &boxes[0];
    for _ in 0..MAX_SUPERBOX_DEPTH {
        assert!(matches!(jbox, JP2Box::Association(_)));
        jbox = &jbox.children().expect("association box")[0];
    }
    let JP2Box::Unknown(unknown) = jbox else {
        panic!("box past the nesting limit should be kept opaque");
    };
    assert_eq!(unknown.identifier(), BOX_TYPE_ASSOCIATION);
    assert_eq!(unknown.data().len(), (200_000 - MAX_SUPERBOX_DEPTH - 1) * 8);

    assert_eq!(context.diagnostics().len(), 1);
    assert!(context.diagnostics()[0].message.contains("nested deeper than 32"));
}

#[test]
fn test_truncated_source_is_fatal() {
    init();
    let mut bytes = conformant_jp2();
    // An XML box declaring 64 content bytes, of which the source holds none
    bytes.extend_from_slice(&72u32.to_be_bytes());
    bytes.extend_from_slice(b"xml ");
    let end = bytes.len() as u64 + 64;

    let mut cursor = BinaryCursor::new(Cursor::new(bytes));
    let mut context = ParseContext::new(ParseOptions::default());
    match parse_boxes(&mut cursor, end, &mut context) {
        Err(error) => assert!(error.is_truncated(), "{}", error),
        Ok(boxes) => panic!("expected truncation, got {} boxes", boxes.len()),
    }
}

#[test]
fn test_resolution_superbox() {
    init();
    let resc = jbox(b"resc", &[0, 3, 0, 1, 0, 3, 0, 1, 2, 2]);
    let resd = jbox(b"resd", &[0, 1, 0, 2, 0, 1, 0, 2, 0, 0]);
    let res = superbox(b"res ", &[resc, resd]);
    let bytes = jp2_file(
        &[image_header(33, 65, 3, 7), colr_enumerated(16), res],
        &rgb_codestream(),
    );
    let file = decode(&bytes);
    assert!(file.diagnostics().is_empty(), "{:?}", file.diagnostics());

    let JP2Box::Resolution(res) = &header_children(&file)[2] else {
        panic!("resolution box should be the third child");
    };
    let JP2Box::CaptureResolution(resc) = &res.boxes()[0] else {
        panic!("capture resolution box should come first");
    };
    assert_eq!(resc.vertical_resolution(), Some(300.0));
    assert_eq!(resc.horizontal_resolution(), Some(300.0));
    let JP2Box::DefaultDisplayResolution(resd) = &res.boxes()[1] else {
        panic!("default display resolution box should follow");
    };
    assert_eq!(resd.vertical_resolution(), Some(0.5));
}

#[test]
fn test_palette_and_component_mapping() {
    init();
    // Two entries, an unsigned 8 bit and a signed 12 bit component
    let pclr = jbox(
        b"pclr",
        &[0, 2, 2, 0x07, 0x8B, 0x10, 0xFF, 0xFB, 0xFF, 0x07, 0xFF],
    );
    let cmap = jbox(b"cmap", &[0, 0, 1, 0, 0, 0, 1, 1]);
    let cdef = jbox(b"cdef", &[0, 1, 0, 0, 0, 0, 0, 0]);
    let bytes = jp2_file(
        &[
            image_header(33, 65, 1, 7),
            colr_enumerated(16),
            pclr,
            cmap,
            cdef,
        ],
        &codestream(65, 33, &[(7, 1, 1)]),
    );
    let file = decode(&bytes);
    assert!(file.diagnostics().is_empty(), "{:?}", file.diagnostics());

    let JP2Box::Header(header) = file.header_box().expect("header box") else {
        panic!("expected a JP2 header box");
    };
    let pclr = header.palette_box().expect("palette box");
    assert_eq!(pclr.no_entries(), 2);
    assert_eq!(pclr.no_generated_components(), 2);
    assert_eq!(pclr.bit_depth(1), Some(12));
    assert_eq!(pclr.values_are_signed(1), Some(true));
    assert_eq!(pclr.entries(), &[vec![0x10i64, -5], vec![0xFF, 0x7FF]]);

    let cmap = header.component_mapping_box().expect("component mapping box");
    assert_eq!(cmap.mappings().len(), 2);
    assert_eq!(cmap.mappings()[1].palette_column(), 1);

    let cdef = header.channel_definition_box().expect("channel definition box");
    assert_eq!(cdef.channels().len(), 1);
    assert_eq!(cdef.channels()[0].channel_association(), 0);
}

#[test]
fn test_xmp_and_uuid_info() {
    init();
    let mut xmp_content = vec![
        0xBE, 0x7A, 0xCF, 0xCB, 0x97, 0xA9, 0x42, 0xE8, 0x9C, 0x71, 0x99, 0x94, 0x91, 0xE3, 0xAF,
        0xAC,
    ];
    xmp_content.extend_from_slice(b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"/>");

    let mut ulst = vec![0, 1];
    ulst.extend_from_slice(&[7u8; 16]);
    let uinf = superbox(
        b"uinf",
        &[jbox(b"ulst", &ulst), jbox(b"url ", b"\x00\x00\x00\x00http://a/\x00")],
    );

    let mut bytes = conformant_jp2();
    bytes.extend(jbox(b"uuid", &xmp_content));
    bytes.extend(uinf);
    let file = decode(&bytes);
    assert!(file.diagnostics().is_empty(), "{:?}", file.diagnostics());

    let JP2Box::Uuid(uuid) = &file.boxes()[4] else {
        panic!("expected a UUID box");
    };
    assert!(uuid.is_xmp());
    assert_eq!(uuid.uuid_string(), "be7acfcb-97a9-42e8-9c71-999491e3afac");
    assert_eq!(
        uuid.xmp_packet(),
        Some("<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"/>")
    );
    assert_eq!(file.boxes()[4].name(), "UUID (XMP)");

    let children = file.boxes()[5].children().expect("UUID info superbox");
    let JP2Box::UUIDList(list) = &children[0] else {
        panic!("expected a UUID list box");
    };
    assert_eq!(list.ids(), &[[7u8; 16]]);
    let JP2Box::DataEntryURL(url) = &children[1] else {
        panic!("expected a data entry URL box");
    };
    assert_eq!(url.version(), 0);
    assert_eq!(url.location(), "http://a/");
}

#[test]
fn test_unknown_box_and_association() {
    init();
    let asoc = superbox(b"asoc", &[jbox(b"lbl ", b"roi"), jbox(b"xml ", b"<a/>")]);
    let mut bytes = conformant_jp2();
    bytes.extend(jbox(b"free", &[1, 2, 3, 4]));
    bytes.extend(asoc);
    let file = decode(&bytes);
    assert!(file.diagnostics().is_empty(), "{:?}", file.diagnostics());

    let JP2Box::Unknown(free) = &file.boxes()[4] else {
        panic!("expected an unknown box");
    };
    assert_eq!(free.identifier(), *b"free");
    assert_eq!(free.data(), &[1, 2, 3, 4]);

    let children = file.boxes()[5].children().expect("association superbox");
    let JP2Box::Label(label) = &children[0] else {
        panic!("expected a label box");
    };
    assert_eq!(label.label(), "roi");
}
