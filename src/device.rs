//! The device's JSON line protocol ("API mode").
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{nmea::NmeaError, ubx::ResetKind};

#[derive(Error, Debug)]
/// Reasons a serial line could not be used
pub enum DeviceError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record has no \"type\" field")]
    MissingType,
    #[error("GPS_LINE record has no \"line\" field")]
    MissingLine,
    #[error("Malformed GPS line: {0}")]
    Sentence(#[from] NmeaError),
}

#[derive(Debug, Clone, PartialEq)]
/// A decoded record from the serial stream
pub enum DeviceRecord {
    /// `GPS_LINE`: one NMEA sentence from the receiver
    GpsLine(String),
    /// `TEMP`: sent while the receiver is not tracking properly
    Temp(Value),
    /// Any other record type
    Other(String),
}

impl DeviceRecord {
    /// Decode one line of device output.
    pub fn parse(line: &str) -> Result<Self, DeviceError> {
        let value: Value = serde_json::from_str(line)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DeviceError::MissingType)?;
        match kind {
            "GPS_LINE" => value
                .get("line")
                .and_then(Value::as_str)
                .map(|line| Self::GpsLine(line.to_string()))
                .ok_or(DeviceError::MissingLine),
            "TEMP" => Ok(Self::Temp(value)),
            other => Ok(Self::Other(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
/// A command written to the device
pub enum DeviceCommand {
    /// Restart the GPS receiver
    #[serde(rename = "REQ_GPS_RESET")]
    GpsReset {
        /// Restart temperature
        temp: ResetKind,
    },
}

impl DeviceCommand {
    /// Newline-terminated JSON text for the serial port.
    pub fn to_line(&self) -> Result<String, DeviceError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

impl From<ResetKind> for DeviceCommand {
    fn from(temp: ResetKind) -> Self {
        Self::GpsReset { temp }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_gps_line() {
        let record =
            DeviceRecord::parse(r#"{"type":"GPS_LINE","line":"$BDGSV,1,1,01,41,43,210,08*50"}"#)
                .unwrap();
        assert_eq!(
            record,
            DeviceRecord::GpsLine("$BDGSV,1,1,01,41,43,210,08*50".into())
        );
    }

    #[test]
    fn parse_temp() {
        let record = DeviceRecord::parse(r#"{"type":"TEMP","tempC":31,"tempF":87}"#).unwrap();
        match record {
            DeviceRecord::Temp(value) => assert_eq!(value["tempC"], 31),
            other => panic!("Unexpected record {other:?}"),
        }
    }

    #[test]
    fn parse_other_types() {
        assert_eq!(
            DeviceRecord::parse(r#"{"type":"GPS_TIME","time":"12:00:00"}"#).unwrap(),
            DeviceRecord::Other("GPS_TIME".into())
        );
    }

    #[test]
    fn parse_failures() {
        assert!(matches!(
            DeviceRecord::parse(r#"PS_LINE","line":"$GPGSV,1,1,00*79"}"#),
            Err(DeviceError::Json(_))
        ));
        assert!(matches!(
            DeviceRecord::parse(r#"{"line":"$GPGSV,1,1,00*79"}"#),
            Err(DeviceError::MissingType)
        ));
        assert!(matches!(
            DeviceRecord::parse(r#"{"type":5}"#),
            Err(DeviceError::MissingType)
        ));
        assert!(matches!(
            DeviceRecord::parse(r#"{"type":"GPS_LINE"}"#),
            Err(DeviceError::MissingLine)
        ));
        assert_eq!(
            DeviceRecord::parse(r#"{"type":"GPS_LINE","line":""}"#).unwrap(),
            DeviceRecord::GpsLine(String::new())
        );
    }

    #[test]
    fn reset_commands() {
        assert_eq!(
            DeviceCommand::from(ResetKind::Hot).to_line().unwrap(),
            "{\"type\":\"REQ_GPS_RESET\",\"temp\":\"hot\"}\n"
        );
        assert_eq!(
            DeviceCommand::from(ResetKind::Warm).to_line().unwrap(),
            "{\"type\":\"REQ_GPS_RESET\",\"temp\":\"warm\"}\n"
        );
        assert_eq!(
            DeviceCommand::from(ResetKind::Cold).to_line().unwrap(),
            "{\"type\":\"REQ_GPS_RESET\",\"temp\":\"cold\"}\n"
        );
    }
}
