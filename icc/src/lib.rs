use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};
use std::error;
use std::fmt;

/// Length of the fixed ICC profile header.
pub const HEADER_LENGTH: usize = 128;

#[derive(Debug, PartialEq)]
pub enum ICCError {
    Truncated { length: usize },
}

impl error::Error for ICCError {}
impl fmt::Display for ICCError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Truncated { length } => {
                write!(
                    f,
                    "ICC profile of {} bytes is shorter than the {} byte header",
                    length, HEADER_LENGTH
                )
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum DeviceClass {
    Input,
    Display,
    Output,
    DeviceLink,
    ColorSpaceConversion,
    Abstract,
    NamedColor,
    Other { signature: [u8; 4] },
}

impl DeviceClass {
    fn new(signature: [u8; 4]) -> DeviceClass {
        match &signature {
            b"scnr" => DeviceClass::Input,
            b"mntr" => DeviceClass::Display,
            b"prtr" => DeviceClass::Output,
            b"link" => DeviceClass::DeviceLink,
            b"spac" => DeviceClass::ColorSpaceConversion,
            b"abst" => DeviceClass::Abstract,
            b"nmcl" => DeviceClass::NamedColor,
            _ => DeviceClass::Other { signature },
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceClass::Input => write!(f, "input device profile"),
            DeviceClass::Display => write!(f, "display device profile"),
            DeviceClass::Output => write!(f, "output device profile"),
            DeviceClass::DeviceLink => write!(f, "devicelink profile"),
            DeviceClass::ColorSpaceConversion => write!(f, "colorspace conversion profile"),
            DeviceClass::Abstract => write!(f, "abstract profile"),
            DeviceClass::NamedColor => write!(f, "name colour profile"),
            DeviceClass::Other { signature } => write!(f, "{}", signature_text(signature)),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum RenderingIntent {
    Perceptual,
    MediaRelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
    Unknown { value: u32 },
}

impl RenderingIntent {
    fn new(value: u32) -> RenderingIntent {
        match value {
            0 => RenderingIntent::Perceptual,
            1 => RenderingIntent::MediaRelativeColorimetric,
            2 => RenderingIntent::Saturation,
            3 => RenderingIntent::AbsoluteColorimetric,
            value => RenderingIntent::Unknown { value },
        }
    }
}

impl fmt::Display for RenderingIntent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderingIntent::Perceptual => write!(f, "perceptual"),
            RenderingIntent::MediaRelativeColorimetric => {
                write!(f, "media-relative colorimetric")
            }
            RenderingIntent::Saturation => write!(f, "saturation"),
            RenderingIntent::AbsoluteColorimetric => write!(f, "ICC-absolute colorimetric"),
            RenderingIntent::Unknown { .. } => write!(f, "unknown"),
        }
    }
}

/// Profile creation date and time (dateTimeNumber).
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct DateTime {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl DateTime {
    // All zero means the creator did not record a date. Anything that is not a
    // real calendar date is treated the same way.
    fn new(bytes: &[u8]) -> Option<DateTime> {
        let mut values = [0u16; 6];
        BigEndian::read_u16_into(&bytes[..12], &mut values);
        if values.iter().all(|value| *value == 0) {
            return None;
        }

        let datetime = DateTime {
            year: values[0],
            month: values[1],
            day: values[2],
            hour: values[3],
            minute: values[4],
            second: values[5],
        };
        if !datetime.is_valid() {
            warn!("ICC profile creation datetime {:?} is invalid", values);
            return None;
        }
        Some(datetime)
    }

    fn is_valid(&self) -> bool {
        let leap = (self.year % 4 == 0 && self.year % 100 != 0) || self.year % 400 == 0;
        let days_in_month = match self.month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if leap => 29,
            2 => 28,
            _ => return false,
        };
        self.day >= 1
            && self.day <= days_in_month
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn signature_text(signature: &[u8]) -> String {
    String::from_utf8_lossy(signature)
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_owned()
}

// Display names of the data colour space signatures, ICC.1:2010 Table 19.
fn colour_space_text(signature: &[u8; 4]) -> String {
    let name = match signature {
        b"XYZ " => "XYZ",
        b"Lab " => "Lab",
        b"Luv " => "Luv",
        b"YCbr" => "YCbCr",
        b"Yxy " => "Yxy",
        b"RGB " => "RGB",
        b"GRAY" => "gray",
        b"HSV " => "hsv",
        b"HLS " => "hls",
        b"CMYK" => "CMYK",
        b"CMY " => "cmy",
        b"2CLR" => "2colour",
        b"3CLR" => "3colour",
        b"4CLR" => "4colour",
        b"5CLR" => "5colour",
        b"6CLR" => "6colour",
        b"7CLR" => "7colour",
        b"8CLR" => "8colour",
        b"9CLR" => "9colour",
        b"ACLR" => "10colour",
        b"BCLR" => "11colour",
        b"CCLR" => "12colour",
        b"DCLR" => "13colour",
        b"ECLR" => "14colour",
        b"FCLR" => "15colour",
        _ => return signature_text(signature),
    };
    name.to_owned()
}

/// ICC profile header.
///
/// The first 128 bytes of every ICC profile. Only the header is decoded; the
/// tag table that follows it is left untouched.
///
/// See ICC.1:2010 Section 7.2.
#[derive(Debug)]
pub struct ICCProfileHeader {
    size: u32,
    preferred_cmm_type: u32,
    version: [u8; 2],
    device_class: [u8; 4],
    colour_space: [u8; 4],
    connection_space: [u8; 4],
    datetime: Option<DateTime>,
    file_signature: [u8; 4],
    platform: [u8; 4],
    flags: u32,
    device_manufacturer: [u8; 4],
    device_model: [u8; 4],
    device_attributes: u64,
    rendering_intent: u32,
    illuminant: [i32; 3],
    creator: [u8; 4],
    profile_id: Option<[u8; 16]>,
}

impl ICCProfileHeader {
    /// Profile size in bytes, as declared by the header.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn preferred_cmm_type(&self) -> u32 {
        self.preferred_cmm_type
    }

    pub fn major_version(&self) -> u8 {
        self.version[0]
    }

    /// Version as `"major.minor.bugfix"`.
    //
    // Byte 8 is the major revision, byte 9 holds the minor revision in its
    // high nibble and the bug fix revision in its low nibble.
    pub fn version(&self) -> String {
        format!(
            "{}.{}.{}",
            self.version[0],
            self.version[1] >> 4,
            self.version[1] & 0x0f
        )
    }

    pub fn device_class(&self) -> DeviceClass {
        DeviceClass::new(self.device_class)
    }

    /// Data colour space, e.g. `RGB` or `gray`.
    pub fn colour_space(&self) -> String {
        colour_space_text(&self.colour_space)
    }

    /// Profile connection space, `XYZ` or `Lab`.
    pub fn connection_space(&self) -> String {
        colour_space_text(&self.connection_space)
    }

    pub fn datetime(&self) -> Option<DateTime> {
        self.datetime
    }

    /// Should always be `acsp`.
    pub fn file_signature(&self) -> String {
        signature_text(&self.file_signature)
    }

    pub fn platform(&self) -> String {
        signature_text(&self.platform)
    }

    pub fn flags_u32(&self) -> u32 {
        self.flags
    }

    pub fn flags(&self) -> String {
        let embedded = if self.flags & 0x01 != 0 {
            "embedded"
        } else {
            "not embedded"
        };
        let independent = if self.flags & 0x02 != 0 {
            "cannot be used independently"
        } else {
            "can be used independently"
        };
        format!("{}, {}", embedded, independent)
    }

    pub fn device_manufacturer(&self) -> String {
        signature_text(&self.device_manufacturer)
    }

    pub fn device_model(&self) -> String {
        signature_text(&self.device_model)
    }

    pub fn device_attributes_u64(&self) -> u64 {
        self.device_attributes
    }

    pub fn device_attributes(&self) -> String {
        let attributes = [
            (0x01u64, "transparency", "reflective"),
            (0x02, "matte", "glossy"),
            (0x04, "negative media polarity", "positive media polarity"),
            (0x08, "black and white media", "color media"),
        ];
        attributes
            .iter()
            .map(|(bit, set, unset)| {
                if self.device_attributes & *bit != 0 {
                    *set
                } else {
                    *unset
                }
            })
            .collect::<Vec<&str>>()
            .join(", ")
    }

    pub fn rendering_intent(&self) -> RenderingIntent {
        RenderingIntent::new(self.rendering_intent)
    }

    /// PCS illuminant as CIE XYZ, decoded from s15Fixed16Number values.
    pub fn illuminant(&self) -> [f64; 3] {
        [
            self.illuminant[0] as f64 / 65536.0,
            self.illuminant[1] as f64 / 65536.0,
            self.illuminant[2] as f64 / 65536.0,
        ]
    }

    pub fn creator(&self) -> String {
        signature_text(&self.creator)
    }

    /// MD5 profile identifier, only defined from version 4 onwards.
    pub fn profile_id(&self) -> Option<&[u8; 16]> {
        self.profile_id.as_ref()
    }

    /// Header fields in header order, keyed by their descriptive names.
    ///
    /// `Datetime` is left out when the profile does not record one and
    /// `Profile Id` is only present for version 4 profiles.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("Size", self.size().to_string()),
            ("Preferred CMM Type", self.preferred_cmm_type().to_string()),
            ("Version", self.version()),
            ("Device Class", self.device_class().to_string()),
            ("Color Space", self.colour_space()),
            ("Connection Space", self.connection_space()),
        ];
        if let Some(datetime) = self.datetime() {
            fields.push(("Datetime", datetime.to_string()));
        }
        let illuminant = self.illuminant();
        fields.extend(vec![
            ("File Signature", self.file_signature()),
            ("Platform", self.platform()),
            ("Flags", self.flags()),
            ("Device Manufacturer", self.device_manufacturer()),
            ("Device Model", self.device_model()),
            ("Device Attributes", self.device_attributes()),
            ("Rendering Intent", self.rendering_intent().to_string()),
            (
                "Illuminant",
                format!(
                    "{:.6}, {:.6}, {:.6}",
                    illuminant[0], illuminant[1], illuminant[2]
                ),
            ),
            ("Creator", self.creator()),
        ]);
        if let Some(profile_id) = self.profile_id() {
            let hex: String = profile_id.iter().map(|b| format!("{:02x}", b)).collect();
            fields.push(("Profile Id", hex));
        }
        fields
    }

    pub fn field(&self, name: &str) -> Option<String> {
        self.fields()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

fn array4(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

/// Decode the 128 byte header at the start of an ICC profile.
pub fn decode_header(profile: &[u8]) -> Result<ICCProfileHeader, ICCError> {
    if profile.len() < HEADER_LENGTH {
        return Err(ICCError::Truncated {
            length: profile.len(),
        });
    }
    let header = &profile[..HEADER_LENGTH];

    let version = [header[8], header[9]];
    let profile_id = if version[0] >= 4 {
        let mut profile_id = [0u8; 16];
        profile_id.copy_from_slice(&header[84..100]);
        Some(profile_id)
    } else {
        None
    };

    let mut illuminant = [0i32; 3];
    BigEndian::read_i32_into(&header[68..80], &mut illuminant);

    let result = ICCProfileHeader {
        size: BigEndian::read_u32(&header[0..4]),
        preferred_cmm_type: BigEndian::read_u32(&header[4..8]),
        version,
        device_class: array4(&header[12..16]),
        colour_space: array4(&header[16..20]),
        connection_space: array4(&header[20..24]),
        datetime: DateTime::new(&header[24..36]),
        file_signature: array4(&header[36..40]),
        platform: array4(&header[40..44]),
        flags: BigEndian::read_u32(&header[44..48]),
        device_manufacturer: array4(&header[48..52]),
        device_model: array4(&header[52..56]),
        device_attributes: BigEndian::read_u64(&header[56..64]),
        rendering_intent: BigEndian::read_u32(&header[64..68]),
        illuminant,
        creator: array4(&header[80..84]),
        profile_id,
    };

    if result.file_signature != *b"acsp" {
        warn!(
            "ICC profile signature {:?} is not 'acsp'",
            result.file_signature()
        );
    }
    debug!(
        "ICC profile version {} colour space {:?}",
        result.version(),
        result.colour_space()
    );

    Ok(result)
}

/// Number of entries in the tag table that follows the header, if present.
pub fn tag_count(profile: &[u8]) -> Option<u32> {
    profile
        .get(HEADER_LENGTH..HEADER_LENGTH + 4)
        .map(BigEndian::read_u32)
}
