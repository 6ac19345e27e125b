use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// The DG16 register file. The discriminant is the register address, so the
/// declaration order below is the register table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    EnumIter,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum Reg {
    #[default]
    #[strum(serialize = "$zero")]
    Zero,
    #[strum(serialize = "$s0")]
    S0,
    #[strum(serialize = "$s1")]
    S1,
    #[strum(serialize = "$s2")]
    S2,
    #[strum(serialize = "$s3")]
    S3,
    #[strum(serialize = "$s4")]
    S4,
    #[strum(serialize = "$s5")]
    S5,
    #[strum(serialize = "$s6")]
    S6,
}

impl Reg {
    /// All registers, in table order.
    pub fn all() -> impl Iterator<Item = Reg> {
        use strum::IntoEnumIterator;
        Self::iter()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn addr(self) -> u16 {
        u8::from(self) as u16
    }
}
