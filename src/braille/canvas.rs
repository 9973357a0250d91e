/// Braille Unicode canvas for terminal graphics.
/// Each character cell holds a 2x4 dot grid, so a canvas of `width` x `height`
/// cells addresses `width*2` x `height*4` dots.
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<u8>, // One bit pattern per character, row-major
}

/// First codepoint of the Braille Patterns block (no dots raised)
const BRAILLE_BLANK: u32 = 0x2800;

/// Bit for a dot at (x % 2, y % 4) inside a cell.
/// ```text
/// (0,0) (1,0)   bits: 0x01 0x08
/// (0,1) (1,1)   bits: 0x02 0x10
/// (0,2) (1,2)   bits: 0x04 0x20
/// (0,3) (1,3)   bits: 0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

impl BrailleCanvas {
    /// Create a canvas with the given character dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Width in dots
    pub fn dot_width(&self) -> usize {
        self.width * 2
    }

    /// Height in dots
    pub fn dot_height(&self) -> usize {
        self.height * 4
    }

    /// Raise the dot at (x, y). Dots outside the canvas are ignored.
    pub fn set_dot(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[x % 2][y % 4];
    }

    /// Whether the dot at (x, y) is raised
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return false;
        }
        self.cells[cy * self.width + cx] & DOT_BITS[x % 2][y % 4] != 0
    }

    /// Raw dot pattern of one character cell (0 when out of range)
    pub fn bits(&self, col: usize, row: usize) -> u8 {
        if col >= self.width || row >= self.height {
            return 0;
        }
        self.cells[row * self.width + col]
    }

    /// Iterate over non-empty cells as (col, row, bits)
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(idx, &bits)| {
            (bits != 0).then(|| (idx % self.width, idx / self.width, bits))
        })
    }

    /// Render the whole canvas as newline-separated Braille text
    #[cfg(test)]
    pub fn to_text(&self) -> String {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|&b| braille_char(b)).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Map a dot pattern to its Braille character
pub fn braille_char(bits: u8) -> char {
    char::from_u32(BRAILLE_BLANK + bits as u32).unwrap_or(' ')
}
