macro_rules! bitpos {
    ($idx:expr) => {{
        let idx = $idx as usize;
        (idx >> 6, idx & 63)
    }};
}

/// Splits a value into its chunk key and the low 16 bits stored in the
/// container.
macro_rules! split {
    ($val:expr) => {{
        let val: u32 = $val;
        ((val >> 16) as u16, val as u16)
    }};
}

macro_rules! join {
    ($key:expr, $low:expr) => {
        (u32::from($key) << 16) | u32::from($low)
    };
}

pub(crate) use bitpos;
pub(crate) use join;
pub(crate) use split;
