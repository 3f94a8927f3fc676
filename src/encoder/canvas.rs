use crate::models::{BitMatrix, ECLevel, MaskPattern, Version};

/// Module grid under construction.
///
/// Tracks which modules belong to function patterns (finders, separators, timing,
/// alignment, format/version info, dark module) so that codeword placement and
/// masking only touch data modules.
#[derive(Debug, Clone)]
pub struct Canvas {
    version: Version,
    modules: BitMatrix,
    function: BitMatrix,
}

impl Canvas {
    /// Canvas with every function pattern drawn and format bits reserved
    pub fn new(version: Version) -> Self {
        let size = version.size();
        let mut canvas = Self {
            version,
            modules: BitMatrix::square(size),
            function: BitMatrix::square(size),
        };
        canvas.draw_function_patterns();
        canvas
    }

    /// Side length in modules
    pub fn size(&self) -> usize {
        self.modules.width()
    }

    /// Symbol version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Current module grid
    pub fn modules(&self) -> &BitMatrix {
        &self.modules
    }

    /// Finished module grid
    pub fn into_modules(self) -> BitMatrix {
        self.modules
    }

    /// Whether `(x, y)` belongs to a function pattern
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.function.get(x, y)
    }

    /// Function-module map (true = function pattern)
    pub fn function_map(&self) -> &BitMatrix {
        &self.function
    }

    fn set_function(&mut self, x: usize, y: usize, dark: bool) {
        self.modules.set(x, y, dark);
        self.function.set(x, y, true);
    }

    fn draw_function_patterns(&mut self) {
        let size = self.size();

        // Timing patterns (row 6 and column 6)
        for i in 0..size {
            self.set_function(6, i, i % 2 == 0);
            self.set_function(i, 6, i % 2 == 0);
        }

        // Finder patterns with separators, clipped at the symbol edge
        self.draw_finder(3, 3);
        self.draw_finder(size - 4, 3);
        self.draw_finder(3, size - 4);

        let align = alignment_pattern_positions(self.version);
        let last = align.len().saturating_sub(1);
        for (i, &cx) in align.iter().enumerate() {
            for (j, &cy) in align.iter().enumerate() {
                // Skip the three finder corners
                let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if !corner {
                    self.draw_alignment(cx, cy);
                }
            }
        }

        // Placeholder so the area counts as function; overwritten after masking
        self.draw_format_bits(ECLevel::M, MaskPattern::Pattern0);
        self.draw_version_bits();
    }

    fn draw_finder(&mut self, cx: usize, cy: usize) {
        let size = self.size() as i32;
        for dy in -4i32..=4 {
            for dx in -4i32..=4 {
                let x = cx as i32 + dx;
                let y = cy as i32 + dy;
                if (0..size).contains(&x) && (0..size).contains(&y) {
                    let dist = dx.abs().max(dy.abs());
                    self.set_function(x as usize, y as usize, dist != 2 && dist != 4);
                }
            }
        }
    }

    fn draw_alignment(&mut self, cx: usize, cy: usize) {
        for dy in 0..5 {
            for dx in 0..5 {
                let ring = (dx as i32 - 2).abs().max((dy as i32 - 2).abs());
                self.set_function(cx - 2 + dx, cy - 2 + dy, ring != 1);
            }
        }
    }

    /// Write both copies of the format information plus the dark module
    pub fn draw_format_bits(&mut self, ec_level: ECLevel, mask: MaskPattern) {
        let bits = format_bits(ec_level, mask);
        let bit = |i: usize| (bits >> i) & 1 == 1;
        let size = self.size();

        // First copy, around the top-left finder
        for i in 0..=5 {
            self.set_function(8, i, bit(i));
        }
        self.set_function(8, 7, bit(6));
        self.set_function(8, 8, bit(7));
        self.set_function(7, 8, bit(8));
        for i in 9..15 {
            self.set_function(14 - i, 8, bit(i));
        }

        // Second copy, split between the other two finders
        for i in 0..8 {
            self.set_function(size - 1 - i, 8, bit(i));
        }
        for i in 8..15 {
            self.set_function(8, size - 15 + i, bit(i));
        }
        self.set_function(8, size - 8, true);
    }

    fn draw_version_bits(&mut self) {
        if self.version.number() < 7 {
            return;
        }
        let bits = version_bits(self.version);
        let size = self.size();
        for i in 0..18 {
            let dark = (bits >> i) & 1 == 1;
            let a = size - 11 + i % 3;
            let b = i / 3;
            self.set_function(a, b, dark);
            self.set_function(b, a, dark);
        }
    }

    /// Place codewords along the zigzag path; leftover remainder modules stay light
    pub fn draw_codewords(&mut self, codewords: &[u8]) {
        let positions = data_module_positions(self.size(), &self.function);
        debug_assert!(positions.len() >= codewords.len() * 8);
        for (i, &(x, y)) in positions.iter().take(codewords.len() * 8).enumerate() {
            let dark = (codewords[i / 8] >> (7 - i % 8)) & 1 == 1;
            self.modules.set(x, y, dark);
        }
    }

    /// XOR the mask over every data module; applying twice restores the grid
    pub fn apply_mask(&mut self, mask: MaskPattern) {
        let size = self.size();
        for y in 0..size {
            for x in 0..size {
                if !self.function.get(x, y) && mask.is_masked(y, x) {
                    self.modules.toggle(x, y);
                }
            }
        }
    }
}

/// Data module coordinates in placement order.
///
/// Column pairs are walked right to left, alternating upward and downward, and
/// the vertical timing column is skipped.
pub fn data_module_positions(size: usize, function: &BitMatrix) -> Vec<(usize, usize)> {
    let mut positions = Vec::with_capacity(size * size);
    let mut right = size as i32 - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        let upward = ((right + 1) & 2) == 0;
        for vert in 0..size {
            let y = if upward { size - 1 - vert } else { vert };
            for col in [right, right - 1] {
                let x = col as usize;
                if !function.get(x, y) {
                    positions.push((x, y));
                }
            }
        }
        right -= 2;
    }
    positions
}

/// Alignment pattern centers for a given version
pub fn alignment_pattern_positions(version: Version) -> Vec<usize> {
    let v = version.number() as usize;
    if v == 1 {
        return Vec::new();
    }
    let num_align = v / 7 + 2;
    let size = version.size();
    let step = if v == 32 {
        26
    } else {
        (v * 4 + num_align * 2 + 1) / (num_align * 2 - 2) * 2
    };

    let mut positions = vec![6usize; num_align];
    let mut pos = size - 7;
    for slot in positions.iter_mut().skip(1).rev() {
        *slot = pos;
        pos = pos.saturating_sub(step);
    }
    positions
}

/// 15-bit format information: level and mask protected by BCH(15,5), then XOR-masked
pub fn format_bits(ec_level: ECLevel, mask: MaskPattern) -> u16 {
    let data = u32::from(ec_level.format_bits() << 3 | mask.bits());
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    (((data << 10) | rem) ^ 0x5412) as u16
}

/// 18-bit version information protected by BCH(18,6)
pub fn version_bits(version: Version) -> u32 {
    let data = u32::from(version.number());
    let mut rem = data;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
    }
    (data << 12) | rem
}
