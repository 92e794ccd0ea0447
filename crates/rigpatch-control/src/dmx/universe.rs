//! Universe buffers

/// Channels in one DMX512 universe
pub const DMX_UNIVERSE_SIZE: usize = 512;

/// One universe of channel data
pub type Universe = [u8; DMX_UNIVERSE_SIZE];

/// Zero-initialized universe buffers indexed by universe number
///
/// The bank only grows. Growing never moves data between universe numbers,
/// so an index handed out once stays valid for the lifetime of the bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniverseBank {
    universes: Vec<Universe>,
}

impl UniverseBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated universes
    pub fn len(&self) -> usize {
        self.universes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universes.is_empty()
    }

    pub fn contains(&self, universe: u32) -> bool {
        (universe as usize) < self.universes.len()
    }

    /// Grow the bank so `universe` is addressable
    ///
    /// Returns true if new buffers were allocated.
    pub fn ensure(&mut self, universe: u32) -> bool {
        let needed = universe as usize + 1;
        if needed <= self.universes.len() {
            return false;
        }
        self.universes.resize(needed, [0u8; DMX_UNIVERSE_SIZE]);
        true
    }

    pub fn get(&self, universe: u32) -> Option<&Universe> {
        self.universes.get(universe as usize)
    }

    pub fn get_mut(&mut self, universe: u32) -> Option<&mut Universe> {
        self.universes.get_mut(universe as usize)
    }

    /// Overwrite an allocated universe. Returns false if it is not allocated.
    pub fn replace(&mut self, universe: u32, data: &Universe) -> bool {
        match self.get_mut(universe) {
            Some(buffer) => {
                buffer.copy_from_slice(data);
                true
            }
            None => false,
        }
    }

    /// Zero every channel of every universe
    pub fn blackout(&mut self) {
        for buffer in &mut self.universes {
            buffer.fill(0);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Universe)> {
        self.universes
            .iter()
            .enumerate()
            .map(|(i, buffer)| (i as u32, buffer))
    }
}

/// Render a universe as rows of 16 hex bytes, skipping all-zero rows
pub fn describe_universe(universe: u32, data: &Universe) -> String {
    let mut out = format!("Universe {}\n", universe);
    for (row, chunk) in data.chunks(16).enumerate() {
        if chunk.iter().all(|b| *b == 0) {
            continue;
        }
        let bytes: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        out.push_str(&format!("{:03}: {}\n", row * 16, bytes.join(" ")));
    }
    out
}
