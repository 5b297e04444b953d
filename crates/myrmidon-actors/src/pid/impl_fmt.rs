use std::fmt;
use std::str::FromStr;

use super::Pid;

const FMT_SEPARATOR: char = '.';

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}{FMT_SEPARATOR}{}>", self.node(), self.slot())
    }
}

impl FromStr for Pid {
    type Err = &'static str;

    /// Accepts either the displayed form `<node.slot>` (angle brackets optional), or the raw
    /// 64-bit value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('<').and_then(|s| s.strip_suffix('>')).unwrap_or(s);

        let mut parts = s.split(FMT_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(raw), None, None) =>
                raw.parse::<u64>().map(Self::from_raw).map_err(|_| "parse-int error"),
            (Some(node), Some(slot), None) => {
                let node = node.parse::<u32>().map_err(|_| "parse-int error")?;
                let slot = slot.parse::<u32>().map_err(|_| "parse-int error")?;
                Ok(Self::new(node, slot))
            },
            (_, _, Some(_)) => Err("extra part"),
            _ => Err("Pid should be in form of <u32>.<u32> or <u64>"),
        }
    }
}
