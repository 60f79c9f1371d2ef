//! Compiled banned-list (§3 "BannedList", §4.10), grounded exactly on the
//! original `makeFastBannedList` algorithm: each line of the banned-list
//! file normalises to a `(network, mask)` pair, inferring the bit width
//! from the number of non-zero quads when no explicit `/bits` is given.

use parking_lot::RwLock;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BannedEntry {
    network: u32,
    mask: u32,
}

#[derive(Default)]
pub struct BannedList {
    /// Raw, uncompiled specs as configured, kept alongside the compiled
    /// entries so the admin surface can list and edit them (§10.5 `/banned`).
    specs: RwLock<Vec<String>>,
    entries: RwLock<Vec<BannedEntry>>,
}

impl BannedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: &[String]) -> Self {
        let list = Self::new();
        list.rebuild(specs);
        list
    }

    /// Recompiles the list from scratch (§4.10: "on mutation, rebuild").
    pub fn rebuild(&self, specs: &[String]) {
        let entries = specs.iter().filter_map(|spec| parse_spec(spec)).collect();
        *self.entries.write() = entries;
        *self.specs.write() = specs.to_vec();
    }

    pub fn specs(&self) -> Vec<String> {
        self.specs.read().clone()
    }

    /// Appends a spec and recompiles, unless it's already present (§10.5
    /// `/ban-add`).
    pub fn add(&self, spec: String) {
        let mut specs = self.specs.read().clone();
        if !specs.contains(&spec) {
            specs.push(spec);
            self.rebuild(&specs);
        }
    }

    /// Removes a spec and recompiles (§10.5 `/ban-remove`).
    pub fn remove(&self, spec: &str) {
        let mut specs = self.specs.read().clone();
        specs.retain(|existing| existing != spec);
        self.rebuild(&specs);
    }

    pub fn is_banned(&self, ip: Ipv4Addr) -> bool {
        let ip = u32::from(ip);
        self.entries
            .read()
            .iter()
            .any(|entry| (ip & entry.mask) == (entry.network & entry.mask))
    }
}

/// Parses one banned-list line into `(network, mask)`.
///
/// A spec may carry an explicit `net/bits` suffix; otherwise the bit width
/// is inferred as 8 times the number of non-zero dotted quads (so `"75.120.4"`
/// implies `/24`, matching the original's "implicit /24 per non-zero quad"
/// behaviour).
fn parse_spec(spec: &str) -> Option<BannedEntry> {
    let spec = spec.trim();
    if spec.is_empty() {
        return None;
    }

    let (net_part, explicit_bits) = match spec.split_once('/') {
        Some((net, bits)) => {
            let bits: u32 = bits.parse().ok()?;
            if bits == 0 {
                return None;
            }
            (net, Some(bits))
        }
        None => (spec, None),
    };

    let mut quads = [0u8; 4];
    let mut non_zero_quads = 0u32;
    for (index, part) in net_part.split('.').enumerate() {
        if index >= 4 || part.is_empty() {
            continue;
        }
        let value: u8 = part.parse().ok()?;
        quads[index] = value;
        if value != 0 {
            non_zero_quads += 1;
        }
    }

    let network = u32::from_be_bytes(quads);
    let bits = explicit_bits.unwrap_or(non_zero_quads * 8);
    if bits == 0 || bits > 32 {
        return None;
    }

    let mask = (u64::MAX << (32 - bits)) as u32;
    Some(BannedEntry { network, mask })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn explicit_bits_respected() {
        let list = BannedList::from_specs(&["10.0.0.0/8".to_string()]);
        assert!(list.is_banned(Ipv4Addr::new(10, 1, 2, 3)));
        assert!(!list.is_banned(Ipv4Addr::new(11, 0, 0, 1)));
    }

    #[test]
    fn implicit_bits_inferred_from_quad_count() {
        let list = BannedList::from_specs(&["75.120.4".to_string()]);
        // Three non-zero quads ⇒ /24.
        assert!(list.is_banned(Ipv4Addr::new(75, 120, 4, 200)));
        assert!(!list.is_banned(Ipv4Addr::new(75, 120, 5, 0)));
    }

    #[test]
    fn single_host_spec() {
        let list = BannedList::from_specs(&["192.168.1.1".to_string()]);
        assert!(list.is_banned(Ipv4Addr::new(192, 168, 1, 1)));
        assert!(!list.is_banned(Ipv4Addr::new(192, 168, 1, 2)));
    }

    #[test]
    fn malformed_spec_is_skipped() {
        let list = BannedList::from_specs(&["not-an-ip".to_string()]);
        assert!(!list.is_banned(Ipv4Addr::new(1, 2, 3, 4)));
    }
}
