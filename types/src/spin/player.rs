use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};

/// Per-player rate-limit state and lifetime statistics. Absent records read
/// as all-zero.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PlayerRecord {
    /// Timestamp of the last admitted spin; drives the cooldown. Never
    /// decreases.
    pub last_spin: u64,
    /// Spins resolved, cumulative.
    pub spins: u64,
    /// Base units won, cumulative. Credited only when the payout transfer
    /// succeeds.
    pub winnings: u64,
}

impl Write for PlayerRecord {
    fn write(&self, writer: &mut impl BufMut) {
        self.last_spin.write(writer);
        self.spins.write(writer);
        self.winnings.write(writer);
    }
}

impl Read for PlayerRecord {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            last_spin: u64::read(reader)?,
            spins: u64::read(reader)?,
            winnings: u64::read(reader)?,
        })
    }
}

impl FixedSize for PlayerRecord {
    const SIZE: usize = u64::SIZE * 3;
}
