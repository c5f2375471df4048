pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub const FRAMEBUFFER_SIZE: usize = WIDTH * HEIGHT / 8;

const ROW_BYTES: usize = WIDTH / 8;

// byte offset into the framebuffer and the bit mask for pixel (x, y), MSB first
fn locate(x: usize, y: usize) -> (usize, u8) {
    (y * ROW_BYTES + x / 8, 0x80 >> (x % 8))
}

pub fn is_set(fb: &[u8], x: usize, y: usize) -> bool {
    if x >= WIDTH || y >= HEIGHT {
        return false;
    }
    let (byte, mask) = locate(x, y);
    fb[byte] & mask != 0
}

pub fn clear(fb: &mut [u8]) {
    for b in fb.iter_mut() {
        *b = 0;
    }
}

/// XOR `rows` onto the screen with the top-left corner at (x, y). Pixels that
/// fall off the right or bottom edge are dropped. Returns true if any lit
/// pixel was turned off.
pub fn draw_sprite(fb: &mut [u8], x: usize, y: usize, rows: &[u8]) -> bool {
    let mut collision = false;
    for (row, &bits) in rows.iter().enumerate() {
        let py = y + row;
        if py >= HEIGHT {
            break;
        }
        for col in 0..8 {
            let px = x + col;
            if px >= WIDTH {
                break;
            }
            if bits & (0x80 >> col) == 0 {
                continue;
            }
            let (byte, mask) = locate(px, py);
            // sample before flipping
            if fb[byte] & mask != 0 {
                collision = true;
            }
            fb[byte] ^= mask;
        }
    }
    collision
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    bits: [u8; FRAMEBUFFER_SIZE],
}

impl Framebuffer {
    pub(crate) fn from_slice(fb: &[u8]) -> Self {
        let mut bits = [0; FRAMEBUFFER_SIZE];
        bits.copy_from_slice(&fb[..FRAMEBUFFER_SIZE]);
        Self { bits }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        is_set(&self.bits, x, y)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        (0..WIDTH * HEIGHT).map(move |p| {
            let (x, y) = (p % WIDTH, p / WIDTH);
            (x, y, self.is_set(x, y))
        })
    }

    pub fn lit_count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }
}
