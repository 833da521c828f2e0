//! # NMEA to TCP bridge
//! Lets u-center use a GPS device in JSON API mode as if it were a u-blox receiver.
//!
//! NMEA sentences are unwrapped from the device's `GPS_LINE` records, re-checksummed
//! (with BeiDou GSA/GSV moved to the `GB` talker) and served to a TCP client.
//! UBX-CFG-RST hot, warm and cold restarts from the client are turned into the
//! device's `REQ_GPS_RESET` command.
mod bridge;
mod config;
mod device;
mod nmea;
mod read_until;
mod ubx;

pub use bridge::{
    hang_up, translate_line, BridgeError, CommandTranslator, SentenceTranslator, Translation,
    TranslatorStats, UBX_READ_SIZE,
};
pub use config::{BridgeCfg, DEFAULT_TCP_PORT};
pub use device::{DeviceCommand, DeviceError, DeviceRecord};
pub use nmea::{checksum, self_test, NmeaError, NmeaSentence, Talker};
pub use ubx::{fletcher, ResetKind, CFG_RST_LEN};
