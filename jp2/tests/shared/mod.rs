#![allow(dead_code)]

// In-memory JP2 fixtures.

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A box with an 8 byte header.
pub fn jbox(box_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut bytes = (content.len() as u32 + 8).to_be_bytes().to_vec();
    bytes.extend_from_slice(box_type);
    bytes.extend_from_slice(content);
    bytes
}

/// A box with a 16 byte header using the extended length field.
pub fn xl_box(box_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut bytes = 1u32.to_be_bytes().to_vec();
    bytes.extend_from_slice(box_type);
    bytes.extend_from_slice(&(content.len() as u64 + 16).to_be_bytes());
    bytes.extend_from_slice(content);
    bytes
}

pub fn superbox(box_type: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    jbox(box_type, &children.concat())
}

pub fn signature() -> Vec<u8> {
    jbox(b"jP  ", &[0x0D, 0x0A, 0x87, 0x0A])
}

pub fn file_type() -> Vec<u8> {
    jbox(b"ftyp", b"jp2 \x00\x00\x00\x00jp2 ")
}

pub fn image_header(height: u32, width: u32, no_components: u16, bpc: u8) -> Vec<u8> {
    let mut content = height.to_be_bytes().to_vec();
    content.extend_from_slice(&width.to_be_bytes());
    content.extend_from_slice(&no_components.to_be_bytes());
    content.extend_from_slice(&[bpc, 7, 0, 0]);
    jbox(b"ihdr", &content)
}

pub fn colr_enumerated(colour_space: u32) -> Vec<u8> {
    let mut content = vec![1, 0, 0];
    content.extend_from_slice(&colour_space.to_be_bytes());
    jbox(b"colr", &content)
}

pub fn colr_icc(profile: &[u8]) -> Vec<u8> {
    let mut content = vec![2, 0, 0];
    content.extend_from_slice(profile);
    jbox(b"colr", &content)
}

fn segment(marker: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = marker.to_be_bytes().to_vec();
    bytes.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// A codestream with SOC, SIZ, COD, QCD, one empty tile part and EOC.
///
/// `components` holds (Ssiz, XRsiz, YRsiz) per component.
pub fn codestream(width: u32, height: u32, components: &[(u8, u8, u8)]) -> Vec<u8> {
    let mut siz = 0u16.to_be_bytes().to_vec();
    for value in [width, height, 0, 0, width, height, 0, 0] {
        siz.extend_from_slice(&value.to_be_bytes());
    }
    siz.extend_from_slice(&(components.len() as u16).to_be_bytes());
    for (ssiz, xrsiz, yrsiz) in components {
        siz.extend_from_slice(&[*ssiz, *xrsiz, *yrsiz]);
    }

    let mut bytes = vec![0xFF, 0x4F];
    bytes.extend(segment(0xFF51, &siz));
    bytes.extend(segment(
        0xFF52,
        &[0x00, 0x00, 0x00, 0x01, 0x01, 0x05, 0x04, 0x04, 0x00, 0x01],
    ));
    bytes.extend(segment(0xFF5C, &[0x40, 0x40, 0x48, 0x48, 0x50]));
    // SOT: Isot 0, Psot 14, TPsot 0, TNsot 1, then SOD
    bytes.extend(segment(0xFF90, &[0, 0, 0, 0, 0, 14, 0, 1]));
    bytes.extend_from_slice(&[0xFF, 0x93]);
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

pub fn rgb_codestream() -> Vec<u8> {
    codestream(65, 33, &[(7, 1, 1), (7, 2, 2), (7, 2, 2)])
}

/// Signature, file type, a JP2 header with `header_children` and a
/// contiguous codestream.
pub fn jp2_file(header_children: &[Vec<u8>], codestream: &[u8]) -> Vec<u8> {
    [
        signature(),
        file_type(),
        superbox(b"jp2h", header_children),
        jbox(b"jp2c", codestream),
    ]
    .concat()
}

pub fn conformant_jp2() -> Vec<u8> {
    jp2_file(
        &[image_header(33, 65, 3, 7), colr_enumerated(16)],
        &rgb_codestream(),
    )
}

/// A 132 byte ICC profile: the header and an empty tag table.
pub fn icc_profile(major_version: u8) -> Vec<u8> {
    let mut profile = vec![0u8; 132];
    profile[0..4].copy_from_slice(&132u32.to_be_bytes());
    profile[4..8].copy_from_slice(b"lcms");
    profile[8] = major_version;
    profile[9] = 0x20;
    profile[12..16].copy_from_slice(b"mntr");
    profile[16..20].copy_from_slice(b"RGB ");
    profile[20..24].copy_from_slice(b"XYZ ");
    // 2020-03-04 05:06:07
    for (i, value) in [2020u16, 3, 4, 5, 6, 7].iter().enumerate() {
        profile[24 + i * 2..26 + i * 2].copy_from_slice(&value.to_be_bytes());
    }
    profile[36..40].copy_from_slice(b"acsp");
    profile[40..44].copy_from_slice(b"APPL");
    // Rendering intent: perceptual
    profile[64..68].copy_from_slice(&0u32.to_be_bytes());
    // D50 illuminant
    profile[68..72].copy_from_slice(&0x0000F6D6u32.to_be_bytes());
    profile[72..76].copy_from_slice(&0x00010000u32.to_be_bytes());
    profile[76..80].copy_from_slice(&0x0000D32Du32.to_be_bytes());
    profile[80..84].copy_from_slice(b"lcms");
    for (i, byte) in profile[84..100].iter_mut().enumerate() {
        *byte = i as u8 + 1;
    }
    profile
}
