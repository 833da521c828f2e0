use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use argh::FromArgs;
use serialport::SerialPortBuilder;

/// Port u-center is pointed at by default
pub const DEFAULT_TCP_PORT: u16 = 54321;

#[derive(FromArgs, Debug, Clone, PartialEq, Eq)]
/// Serve NMEA from a device in API mode to u-center over TCP, and pass
/// u-center's hot/warm/cold restarts back to the device.
pub struct BridgeCfg {
    /// serial device of the GPS receiver
    #[argh(positional)]
    pub serial_port: String,
    /// baud rate
    #[argh(option, default = "9600")]
    pub baud_rate: u32,
    /// serial read timeout in milliseconds
    #[argh(option, default = "100")]
    pub timeout: u64,
    /// TCP port to listen on
    #[argh(option, default = "DEFAULT_TCP_PORT")]
    pub port: u16,
    /// address to listen on
    #[argh(option, default = "IpAddr::V4(Ipv4Addr::UNSPECIFIED)")]
    pub bind: IpAddr,
}

impl BridgeCfg {
    /// Serial port settings, ready to open
    pub fn serial(&self) -> SerialPortBuilder {
        serialport::new(&self.serial_port, self.baud_rate)
            .timeout(Duration::from_millis(self.timeout))
    }

    /// Address the TCP listener binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
