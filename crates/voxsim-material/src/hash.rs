//! Deterministic spatial hash for dither materials.
//!
//! A combined Tausworthe generator seeded from the bit patterns of the
//! voxel's coordinates. The same `(x, y, z, k)` always yields the same value
//! in `[0, 1]`; no global RNG state is involved.

const MASK32: u64 = 0xffff_ffff;

fn lcg_seed(x: u64) -> u64 {
    1_664_525u64.wrapping_mul(x).wrapping_add(1_013_904_223) & 0x7fff_ffff
}

struct Taus {
    s1: u64,
    s2: u64,
    s3: u64,
}

impl Taus {
    fn next(&mut self) -> u64 {
        let b = (((self.s1 << 13) & MASK32) ^ self.s1) >> 19;
        self.s1 = (((self.s1 & 0xffff_fffe) << 12) & MASK32) ^ b;
        let b = (((self.s2 << 2) & MASK32) ^ self.s2) >> 25;
        self.s2 = (((self.s2 & 0xffff_fff8) << 4) & MASK32) ^ b;
        let b = (((self.s3 << 3) & MASK32) ^ self.s3) >> 11;
        self.s3 = (((self.s3 & 0xffff_fff0) << 17) & MASK32) ^ b;
        self.s1 ^ self.s2 ^ self.s3
    }
}

/// Pseudo-random value in `[0, 1]` for integer coordinates and stream `k`.
pub fn spatial_hash(x: i64, y: i64, z: i64, k: u32) -> f64 {
    let ts1 = (x as f32).to_bits() as u64;
    let ts2 = (y as f32).to_bits() as u64;
    let ts3 = (z as f32).to_bits() as u64;

    let mut st = Taus {
        s1: lcg_seed(ts1),
        s2: lcg_seed(ts2),
        s3: lcg_seed(ts3),
    };
    for _ in 0..2 {
        st.s1 = lcg_seed(st.s1 ^ st.s3);
        st.s2 = lcg_seed(st.s2 ^ st.s1);
        st.s3 = lcg_seed(st.s3 ^ st.s2);
    }

    // warm up, then draw the k-th number
    for _ in 0..k + 9 {
        st.next();
    }
    st.next() as f64 / u32::MAX as f64
}
