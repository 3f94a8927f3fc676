//! Mask penalty scoring (ISO/IEC 18004 section 7.8.3)

use crate::models::BitMatrix;

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

/// Total penalty of a finished, masked module grid. Lower is more readable.
pub fn penalty_score(modules: &BitMatrix) -> u32 {
    let size = modules.width();
    let mut result = 0;

    // Runs and finder-like patterns, rows then columns
    for y in 0..size {
        result += line_penalty(size, |x| modules.get(x, y));
    }
    for x in 0..size {
        result += line_penalty(size, |y| modules.get(x, y));
    }

    // 2x2 blocks of one color
    for y in 0..size.saturating_sub(1) {
        for x in 0..size - 1 {
            let c = modules.get(x, y);
            if c == modules.get(x + 1, y)
                && c == modules.get(x, y + 1)
                && c == modules.get(x + 1, y + 1)
            {
                result += PENALTY_N2;
            }
        }
    }

    // Dark/light balance, in 5% steps away from 50%
    let dark = modules.count_dark() as i64;
    let total = (size * size) as i64;
    if total > 0 {
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result += k.max(0) as u32 * PENALTY_N4;
    }
    result
}

fn line_penalty(size: usize, module: impl Fn(usize) -> bool) -> u32 {
    let mut result = 0;
    let mut run_color = false;
    let mut run_len = 0usize;
    let mut history = RunHistory::new(size);
    for i in 0..size {
        if module(i) == run_color {
            run_len += 1;
            if run_len == 5 {
                result += PENALTY_N1;
            } else if run_len > 5 {
                result += 1;
            }
        } else {
            history.push(run_len);
            if !run_color {
                result += history.count_finder_like() * PENALTY_N3;
            }
            run_color = module(i);
            run_len = 1;
        }
    }
    result + history.terminate(run_color, run_len) * PENALTY_N3
}

/// Lengths of the last seven runs, newest first, for 1:1:3:1:1 detection.
///
/// The light border outside the symbol counts as part of the first and last runs.
struct RunHistory {
    size: usize,
    runs: [usize; 7],
}

impl RunHistory {
    fn new(size: usize) -> Self {
        Self { size, runs: [0; 7] }
    }

    fn push(&mut self, mut run_len: usize) {
        if self.runs[0] == 0 {
            run_len += self.size;
        }
        self.runs.copy_within(0..6, 1);
        self.runs[0] = run_len;
    }

    fn count_finder_like(&self) -> u32 {
        let h = &self.runs;
        let n = h[1];
        let core = n > 0 && h[2] == n && h[3] == n * 3 && h[4] == n && h[5] == n;
        u32::from(core && h[0] >= n * 4 && h[6] >= n) + u32::from(core && h[6] >= n * 4 && h[0] >= n)
    }

    fn terminate(&mut self, run_color: bool, mut run_len: usize) -> u32 {
        if run_color {
            self.push(run_len);
            run_len = 0;
        }
        run_len += self.size;
        self.push(run_len);
        self.count_finder_like()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_grid_is_heavily_penalized() {
        let dark = {
            let mut m = BitMatrix::square(21);
            for y in 0..21 {
                for x in 0..21 {
                    m.set(x, y, true);
                }
            }
            m
        };
        let checker = {
            let mut m = BitMatrix::square(21);
            for y in 0..21 {
                for x in 0..21 {
                    m.set(x, y, (x + y) % 2 == 0);
                }
            }
            m
        };
        assert!(penalty_score(&dark) > penalty_score(&checker));
        // A checkerboard has no runs, no blocks and near-perfect balance
        assert_eq!(penalty_score(&checker), 0);
    }

    #[test]
    fn test_finder_like_run_detected() {
        // light border, then 1:1:3:1:1 dark/light/dark/light/dark, then 4+ light
        let row = [
            true, false, true, true, true, false, true, false, false, false, false,
        ];
        let size = row.len();
        let score = line_penalty(size, |i| row[i]);
        assert!(score >= PENALTY_N3);
    }
}
