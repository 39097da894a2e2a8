// bucketed spatial hash over a uniform grid, rebuilt from scratch every step
use bytemuck::{Pod, Zeroable};
use glam::{IVec2, Vec2};
use rayon::prelude::*;

const HASH_K1: u32 = 73_856_093;
const HASH_K2: u32 = 19_349_663;

// covering a 3 x 3 surrounding cells
const CELL_OFFSETS: [IVec2; 9] = [
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
    IVec2::new(-1, 0),
    IVec2::new(0, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
];

#[inline]
pub fn cell_coord(pos: Vec2, cell_size: f32) -> IVec2 {
    (pos / cell_size).floor().as_ivec2()
}

/// Wrapping sum of the scaled coordinates. No two cells of a 3x3
/// neighbourhood share a hash, so no cell is ever visited twice.
#[inline]
pub fn hash_cell(cell: IVec2) -> u32 {
    (cell.x as u32)
        .wrapping_mul(HASH_K1)
        .wrapping_add((cell.y as u32).wrapping_mul(HASH_K2))
}

#[inline]
pub fn key_from_hash(hash: u32, table_size: u32) -> u32 {
    hash % table_size
}

/// One row of the hash table. Same layout as the GPU-side entry buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SpatialEntry {
    pub particle_index: u32,
    pub hash: u32,
    pub key: u32,
}

/// CSR-like table: `entries` sorted by key, `offsets[key]` the first slot of
/// that key's run (or `len()` when the bucket is empty).
#[derive(Clone, Debug)]
pub struct SpatialHash {
    cell_size: f32,
    len: usize,
    entries: Vec<SpatialEntry>,
    offsets: Vec<u32>,
    // scratch for the counting sort
    counts: Vec<u32>,
    scattered: Vec<SpatialEntry>,
}

impl SpatialHash {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cell_size: 1.0,
            len: 0,
            entries: vec![SpatialEntry::default(); capacity],
            offsets: vec![capacity as u32; capacity],
            counts: vec![0; capacity],
            scattered: vec![SpatialEntry::default(); capacity],
        }
    }

    /// Number of hashed particles (also the bucket count and the empty sentinel).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn entries(&self) -> &[SpatialEntry] {
        &self.entries[..self.len]
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets[..self.len]
    }

    /// Emits one `(particle, hash, key)` triple per position.
    ///
    /// # Panics
    ///
    /// Panics if `positions` holds more particles than the table was
    /// allocated for with [`SpatialHash::with_capacity`].
    pub fn build(&mut self, positions: &[Vec2], cell_size: f32) {
        let n = positions.len();
        assert!(
            n <= self.entries.len(),
            "spatial hash holds {} entries, {} requested",
            self.entries.len(),
            n
        );
        self.len = n;
        self.cell_size = cell_size;

        let table_size = n as u32;
        self.entries[..n]
            .par_iter_mut()
            .zip(positions.par_iter())
            .enumerate()
            .for_each(|(i, (entry, &pos))| {
                let hash = hash_cell(cell_coord(pos, cell_size));
                *entry = SpatialEntry {
                    particle_index: i as u32,
                    hash,
                    key: key_from_hash(hash, table_size),
                };
            });
    }

    /// Counting sort by key followed by offset table construction.
    pub fn sort(&mut self) {
        let n = self.len;
        let sentinel = n as u32;

        // histogram
        let counts = &mut self.counts[..n];
        counts.fill(0);
        for entry in &self.entries[..n] {
            counts[entry.key as usize] += 1;
        }

        // exclusive scan: counts -> starts, offsets get the sentinel for empty keys
        let offsets = &mut self.offsets[..n];
        let mut running = 0u32;
        for (count, offset) in counts.iter_mut().zip(offsets.iter_mut()) {
            let c = *count;
            *offset = if c == 0 { sentinel } else { running };
            *count = running; // now the scatter cursor
            running += c;
        }

        // scatter
        for entry in &self.entries[..n] {
            let cursor = &mut counts[entry.key as usize];
            self.scattered[*cursor as usize] = *entry;
            *cursor += 1;
        }
        std::mem::swap(&mut self.entries, &mut self.scattered);
    }

    /// Calls `f(particle_index, sqr_dst)` for every particle within
    /// `cell_size` of `origin`. `positions` must be the slice the table was
    /// built from.
    pub fn for_each_neighbor<F>(&self, origin: Vec2, positions: &[Vec2], mut f: F)
    where
        F: FnMut(usize, f32),
    {
        let n = self.len;
        if n == 0 {
            return;
        }
        let table_size = n as u32;
        let sqr_radius = self.cell_size * self.cell_size;
        let origin_cell = cell_coord(origin, self.cell_size);

        for offset in CELL_OFFSETS {
            let hash = hash_cell(origin_cell.wrapping_add(offset));
            let key = key_from_hash(hash, table_size);
            let mut slot = self.offsets[key as usize] as usize;

            while slot < n {
                let entry = self.entries[slot];
                if entry.key != key {
                    break;
                }
                slot += 1;
                // same bucket, different cell
                if entry.hash != hash {
                    continue;
                }
                let j = entry.particle_index as usize;
                let sqr_dst = (positions[j] - origin).length_squared();
                if sqr_dst <= sqr_radius {
                    f(j, sqr_dst);
                }
            }
        }
    }
}
