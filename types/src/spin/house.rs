use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};

/// Singleton house record: the pooled bankroll and its lifetime counters.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct House {
    /// Base units available for payouts. Never exceeds bank custody.
    pub balance: u64,
    /// Entropy counter, advanced on every commit and every quick-spin. A
    /// uniqueness input only, never a security boundary.
    pub nonce: u64,
    /// While set, spin admission is refused and emergency withdrawal is
    /// armed.
    pub paused: bool,
    /// Spins resolved, cumulative.
    pub total_spins: u64,
    /// Base units wagered, cumulative.
    pub total_wagered: u64,
    /// Base units paid out, cumulative.
    pub total_paid_out: u64,
}

impl Write for House {
    fn write(&self, writer: &mut impl BufMut) {
        self.balance.write(writer);
        self.nonce.write(writer);
        self.paused.write(writer);
        self.total_spins.write(writer);
        self.total_wagered.write(writer);
        self.total_paid_out.write(writer);
    }
}

impl Read for House {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            balance: u64::read(reader)?,
            nonce: u64::read(reader)?,
            paused: bool::read(reader)?,
            total_spins: u64::read(reader)?,
            total_wagered: u64::read(reader)?,
            total_paid_out: u64::read(reader)?,
        })
    }
}

impl FixedSize for House {
    const SIZE: usize = u64::SIZE * 5 + bool::SIZE;
}
