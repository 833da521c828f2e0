use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Address field rewrites applied before the checksum is recomputed.
///
/// u-center does not recognize the native BeiDou talker for these sentences.
const CONSTELLATION_REWRITES: [(&str, &str); 2] = [("BDGSA", "GBGSA"), ("BDGSV", "GBGSV")];

#[derive(Error, Clone, Debug, PartialEq, Eq)]
/// Errors raised while re-encoding an NMEA sentence
pub enum NmeaError {
    #[error("Sentence too short: {0:?}")]
    TooShort(String),
    #[error("Sentence does not start with '$': {0:?}")]
    MissingStart(String),
    #[error("Sentence has no '*' checksum delimiter: {0:?}")]
    MissingChecksum(String),
    #[error("Checksum self-test failed for {body:?}: expected {expected}, got {actual}")]
    SelfTest {
        body: &'static str,
        expected: &'static str,
        actual: String,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
/// Source constellation of a sentence, from its talker ID
pub enum Talker {
    /// GPS (`GP`)
    Gps,
    /// GLONASS (`GL`)
    Glonass,
    /// Galileo (`GA`)
    Galileo,
    /// BeiDou, as u-center expects it (`GB`)
    Beidou,
    /// BeiDou, as the device emits it (`BD`)
    BeidouNative,
    /// QZSS (`GQ`)
    Qzss,
    /// Combined GNSS solution (`GN`)
    Combined,
    /// Anything else, including proprietary sentences
    Other,
}

impl Talker {
    pub fn from_nmea(id: &[u8]) -> Self {
        match id {
            b"GP" => Self::Gps,
            b"GL" => Self::Glonass,
            b"GA" => Self::Galileo,
            b"GB" => Self::Beidou,
            b"BD" => Self::BeidouNative,
            b"GQ" => Self::Qzss,
            b"GN" => Self::Combined,
            _ => Self::Other,
        }
    }
}

impl Display for Talker {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Gps => write!(f, "GPS"),
            Self::Glonass => write!(f, "GLONASS"),
            Self::Galileo => write!(f, "Galileo"),
            Self::Beidou | Self::BeidouNative => write!(f, "BeiDou"),
            Self::Qzss => write!(f, "QZSS"),
            Self::Combined => write!(f, "GNSS"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// XOR of every byte between `$` and `*`.
pub fn checksum(body: &str) -> u8 {
    body.as_bytes().iter().fold(0, |acc, &x| acc ^ x)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An NMEA-0183 sentence body, without the `$` start and the checksum suffix
pub struct NmeaSentence {
    body: String,
}

impl NmeaSentence {
    /// Create a sentence from a body such as `GPGSV,1,1,00`.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Extract the body from a complete `$...*HH` line as emitted by the device.
    ///
    /// The device's checksum digits are dropped without being checked.
    pub fn from_device_line(line: &str) -> Result<Self, NmeaError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.len() < 4 {
            return Err(NmeaError::TooShort(line.into()));
        }
        let rest = line
            .strip_prefix('$')
            .ok_or_else(|| NmeaError::MissingStart(line.into()))?;
        let star = rest.len() - 3;
        if rest.as_bytes()[star] != b'*' {
            return Err(NmeaError::MissingChecksum(line.into()));
        }
        Ok(Self::new(&rest[..star]))
    }

    /// Sentence body, between `$` and `*`
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Talker ID and sentence kind, if the address field is a standard one
    pub fn address(&self) -> Option<([u8; 2], [u8; 3])> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^(?P<id>[A-Z]{2})(?P<kind>[A-Z]{3})(,|$)")
                .expect("Failed to compile regex");
        }
        let caps = RE.captures(&self.body)?;
        let id = caps["id"].as_bytes().try_into().ok()?;
        let kind = caps["kind"].as_bytes().try_into().ok()?;
        Some((id, kind))
    }

    /// Source constellation of this sentence
    pub fn talker(&self) -> Talker {
        self.address()
            .map(|(id, _)| Talker::from_nmea(&id))
            .unwrap_or(Talker::Other)
    }

    /// Replace the BeiDou talker on GSA and GSV sentences with the one u-center recognizes.
    ///
    /// Only a standard address field is rewritten; anything else passes through.
    pub fn rewrite_constellation(mut self) -> Self {
        let Some((id, kind)) = self.address() else {
            return self;
        };
        if let Some((from, to)) = CONSTELLATION_REWRITES
            .iter()
            .find(|(from, _)| from.as_bytes()[..2] == id && from.as_bytes()[2..] == kind)
        {
            self.body.replace_range(..from.len(), to);
        }
        self
    }

    /// Checksum over the current body
    pub fn checksum(&self) -> u8 {
        checksum(&self.body)
    }

    /// CRLF-terminated sentence ready for the TCP client.
    pub fn to_wire(&self) -> String {
        format!("{self}\r\n")
    }
}

impl Display for NmeaSentence {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "${}*{:02X}", self.body, self.checksum())
    }
}

/// Check the checksum routine against known sentences before serving any client.
pub fn self_test() -> Result<(), NmeaError> {
    const VECTORS: [(&str, &str); 3] = [
        ("GPGSV,1,1,04,10,,,41,18,,,31,27,,,36,32,,,42", "75"),
        ("GBGSV,1,1,01,41,43,210,08", "53"),
        ("GPTXT,01,01,02,A", "0C"),
    ];
    for (body, expected) in VECTORS {
        let actual = format!("{:02X}", checksum(body));
        if actual != expected {
            return Err(NmeaError::SelfTest {
                body,
                expected,
                actual,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn checksum_matches_reference_sentence() {
        assert_eq!(
            checksum("GPGSV,1,1,04,10,,,41,18,,,31,27,,,36,32,,,42"),
            0x75
        );
        let sentence = NmeaSentence::new("GPGSV,1,1,04,10,,,41,18,,,31,27,,,36,32,,,42");
        assert_eq!(
            sentence.to_wire(),
            "$GPGSV,1,1,04,10,,,41,18,,,31,27,,,36,32,,,42*75\r\n"
        );
    }

    #[test]
    fn low_checksum_is_zero_padded() {
        let sentence = NmeaSentence::new("GPTXT,01,01,02,A");
        assert_eq!(sentence.checksum(), 0x0C);
        assert_eq!(sentence.to_string(), "$GPTXT,01,01,02,A*0C");
    }

    #[test]
    fn checksum_is_xor_fold() {
        for body in ["A", "AB", "GPGGA,,,,,,0,00,99.99,,,,,,", "GQGSV,1,1,00,0"] {
            let expected = body.bytes().fold(0u8, |acc, b| acc ^ b);
            let rendered = NmeaSentence::new(body).to_string();
            assert_eq!(checksum(body), expected);
            assert_eq!(&rendered[rendered.len() - 2..], format!("{expected:02X}"));
        }
    }

    #[test]
    fn device_line_checksum_is_not_trusted() {
        let sentence = NmeaSentence::from_device_line("$GPGSV,1,1,00*FF").unwrap();
        assert_eq!(sentence.body(), "GPGSV,1,1,00");
        assert_eq!(sentence.to_string(), "$GPGSV,1,1,00*79");
    }

    #[test]
    fn malformed_device_lines() {
        assert_eq!(
            NmeaSentence::from_device_line("$*1"),
            Err(NmeaError::TooShort("$*1".into()))
        );
        assert!(matches!(
            NmeaSentence::from_device_line("GPGSV,1,1,00*79"),
            Err(NmeaError::MissingStart(_))
        ));
        assert!(matches!(
            NmeaSentence::from_device_line("$GPGSV,1,1,00"),
            Err(NmeaError::MissingChecksum(_))
        ));
        let empty = NmeaSentence::from_device_line("$*00").unwrap();
        assert_eq!(empty.body(), "");
        assert_eq!(empty.to_string(), "$*00");
    }

    #[test]
    fn beidou_talker_rewrite() {
        let gsa = NmeaSentence::from_device_line("$BDGSA,A,3,23,25,32,,,,,,,,,,1.83,1.04,1.51*1E")
            .unwrap()
            .rewrite_constellation();
        assert_eq!(gsa.to_string(), "$GBGSA,A,3,23,25,32,,,,,,,,,,1.83,1.04,1.51*1D");
        assert_eq!(gsa.talker(), Talker::Beidou);

        let gsv = NmeaSentence::new("BDGSV,1,1,01,41,43,210,08").rewrite_constellation();
        assert_eq!(gsv.to_string(), "$GBGSV,1,1,01,41,43,210,08*53");

        // only GSA and GSV are rewritten
        let gga = NmeaSentence::new("BDGGA,,,,,,0,00,99.99,,,,,,").rewrite_constellation();
        assert_eq!(gga.body(), "BDGGA,,,,,,0,00,99.99,,,,,,");
        assert_eq!(gga.talker(), Talker::BeidouNative);
    }

    #[test]
    fn rewrite_needs_standard_address() {
        let odd = NmeaSentence::new("BDGSAX,1").rewrite_constellation();
        assert_eq!(odd.body(), "BDGSAX,1");
        assert_eq!(odd.address(), None);
        let bare = NmeaSentence::new("BDGSV").rewrite_constellation();
        assert_eq!(bare.body(), "GBGSV");
    }

    #[test]
    fn address_field() {
        let sentence = NmeaSentence::new("GNGLL,4238.96342,N,07118.97943,W,221515.00,A,D");
        assert_eq!(sentence.address(), Some((*b"GN", *b"GLL")));
        assert_eq!(sentence.talker(), Talker::Combined);
        assert_eq!(NmeaSentence::new("PUBX,00").address(), None);
        assert_eq!(NmeaSentence::new("PUBX,00").talker(), Talker::Other);
    }

    #[test]
    fn accepted_by_nmea_decoder() {
        let mut parser = nmea_parser::NmeaParser::new();
        let gsv = NmeaSentence::from_device_line("$GPGSV,1,1,04,10,,,41,18,,,31,27,,,36,32,,,42*00")
            .unwrap()
            .to_string();
        assert!(matches!(
            parser.parse_sentence(&gsv),
            Ok(nmea_parser::ParsedMessage::Gsv(_))
        ));
    }

    #[test]
    fn self_test_passes() {
        assert_eq!(self_test(), Ok(()));
    }
}
