use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

const SYNC: [u8; 2] = [0xb5, 0x62];
const CLASS_CFG: u8 = 0x06;
const ID_CFG_RST: u8 = 0x04;
/// Controlled software reset, GNSS only
const RESET_MODE_GNSS: u8 = 0x02;

/// Length of a UBX-CFG-RST frame: sync, class, id, length, 4 byte payload, checksum
pub const CFG_RST_LEN: usize = 12;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Receiver restart requested by UBX-CFG-RST
pub enum ResetKind {
    /// Keep all battery-backed data
    Hot,
    /// Clear the ephemeris
    Warm,
    /// Clear all battery-backed data
    Cold,
}

impl ResetKind {
    /// Every reset u-center can request.
    pub const ALL: [ResetKind; 3] = [ResetKind::Hot, ResetKind::Warm, ResetKind::Cold];

    /// `navBbrMask` field: which battery-backed RAM sections to clear
    pub const fn nav_bbr_mask(self) -> u16 {
        match self {
            ResetKind::Hot => 0x0000,
            ResetKind::Warm => 0x0001,
            ResetKind::Cold => 0xffff,
        }
    }

    /// Complete UBX-CFG-RST frame as u-center sends it.
    pub const fn frame(self) -> [u8; CFG_RST_LEN] {
        let [mask_lo, mask_hi] = self.nav_bbr_mask().to_le_bytes();
        let mut frame = [
            SYNC[0],
            SYNC[1],
            CLASS_CFG,
            ID_CFG_RST,
            0x04,
            0x00,
            mask_lo,
            mask_hi,
            RESET_MODE_GNSS,
            0x00,
            0x00,
            0x00,
        ];
        let (ck_a, ck_b) = fletcher(&frame, 2, CFG_RST_LEN - 2);
        frame[CFG_RST_LEN - 2] = ck_a;
        frame[CFG_RST_LEN - 1] = ck_b;
        frame
    }

    /// Match a received chunk against the known reset frames.
    ///
    /// The whole chunk has to be one frame; anything else is not a reset.
    pub fn from_frame(data: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.frame() == data)
    }
}

impl Display for ResetKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ResetKind::Hot => write!(f, "HOT"),
            ResetKind::Warm => write!(f, "WARM"),
            ResetKind::Cold => write!(f, "COLD"),
        }
    }
}

/// 8-bit Fletcher checksum over `data[start..end]` (class through payload).
pub const fn fletcher(data: &[u8], start: usize, end: usize) -> (u8, u8) {
    let mut ck_a: u8 = 0;
    let mut ck_b: u8 = 0;
    let mut i = start;
    while i < end {
        ck_a = ck_a.wrapping_add(data[i]);
        ck_b = ck_b.wrapping_add(ck_a);
        i += 1;
    }
    (ck_a, ck_b)
}
