//! Connected component analysis
//!
//! This module provides functions for finding and labeling connected components
//! in binary images. It uses a Union-Find (disjoint set) data structure over a
//! two-pass raster scan.
//!
//! Labels are numbered from 1 in raster order of each component's first
//! pixel (top row first, then leftmost), so the label order is stable and
//! independent of how provisional labels were merged.

use crate::error::{RegionError, RegionResult};
use digitread_core::{Box, Pix, PixMut, PixelDepth};

/// Connectivity type for component analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// 4-way connectivity (up, down, left, right)
    FourWay,
    /// 8-way connectivity (includes diagonals)
    #[default]
    EightWay,
}

/// A connected component in an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedComponent {
    /// Unique label for this component
    pub label: u32,
    /// Number of pixels in this component
    pub pixel_count: u32,
    /// Bounding box of this component
    pub bounds: Box,
}

impl ConnectedComponent {
    /// Create a new connected component
    pub fn new(label: u32, pixel_count: u32, bounds: Box) -> Self {
        Self {
            label,
            pixel_count,
            bounds,
        }
    }
}

/// Disjoint set over provisional labels
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        // Slot 0 is the background and never merged
        Self { parent: vec![0] }
    }

    fn make_set(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            // Path halving
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) -> u32 {
        let ra = self.find(a);
        let rb = self.find(b);
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi as usize] = lo;
        lo
    }
}

/// Result of the labeling passes: final label per pixel plus one entry per
/// component in label order.
struct Labeling {
    labels: Vec<u32>,
    components: Vec<ConnectedComponent>,
}

fn check_binary(pix: &Pix) -> RegionResult<()> {
    if pix.depth() != PixelDepth::Bit1 {
        return Err(RegionError::UnsupportedDepth {
            expected: "1-bit",
            actual: pix.depth().bits(),
        });
    }
    Ok(())
}

fn label_pixels(pix: &Pix, connectivity: ConnectivityType) -> Labeling {
    let w = pix.width() as usize;
    let h = pix.height() as usize;
    let mut labels = vec![0u32; w * h];
    let mut uf = UnionFind::new();

    // First pass: provisional labels from already-visited neighbors
    for y in 0..h {
        let row = pix.row_data(y as u32);
        for x in 0..w {
            if digitread_core::pix::get_data_bit(row, x as u32) == 0 {
                continue;
            }
            let mut current = 0u32;
            let mut visit = |n: u32, current: &mut u32| {
                if n == 0 {
                    return;
                }
                *current = if *current == 0 {
                    uf.find(n)
                } else {
                    uf.union(*current, n)
                };
            };

            if x > 0 {
                visit(labels[y * w + x - 1], &mut current);
            }
            if y > 0 {
                let up = (y - 1) * w;
                visit(labels[up + x], &mut current);
                if connectivity == ConnectivityType::EightWay {
                    if x > 0 {
                        visit(labels[up + x - 1], &mut current);
                    }
                    if x + 1 < w {
                        visit(labels[up + x + 1], &mut current);
                    }
                }
            }

            labels[y * w + x] = if current == 0 {
                uf.make_set()
            } else {
                current
            };
        }
    }

    // Second pass: renumber roots in raster order and gather statistics
    let mut final_of_root = vec![0u32; uf.parent.len()];
    let mut extents: Vec<(u32, i32, i32, i32, i32)> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            if labels[idx] == 0 {
                continue;
            }
            let root = uf.find(labels[idx]) as usize;
            if final_of_root[root] == 0 {
                extents.push((0, x as i32, y as i32, x as i32, y as i32));
                final_of_root[root] = extents.len() as u32;
            }
            let label = final_of_root[root];
            labels[idx] = label;

            let e = &mut extents[label as usize - 1];
            e.0 += 1;
            e.1 = e.1.min(x as i32);
            e.2 = e.2.min(y as i32);
            e.3 = e.3.max(x as i32);
            e.4 = e.4.max(y as i32);
        }
    }

    let components = extents
        .into_iter()
        .enumerate()
        .map(|(i, (count, min_x, min_y, max_x, max_y))| {
            ConnectedComponent::new(
                i as u32 + 1,
                count,
                Box::from_extents(min_x, min_y, max_x, max_y),
            )
        })
        .collect();

    Labeling { labels, components }
}

/// Find all connected components in a binary image
///
/// Returns the components in label order, each with its label, pixel count
/// and bounding box. An image without foreground gives an empty vector.
///
/// # Errors
///
/// Returns [`RegionError::UnsupportedDepth`] unless the image is 1 bpp.
pub fn find_connected_components(
    pix: &Pix,
    connectivity: ConnectivityType,
) -> RegionResult<Vec<ConnectedComponent>> {
    check_binary(pix)?;
    Ok(label_pixels(pix, connectivity).components)
}

/// Label all connected components in a binary image
///
/// Returns a 32-bit image where each pixel contains the label of its
/// component, or 0 for background.
pub fn label_connected_components(pix: &Pix, connectivity: ConnectivityType) -> RegionResult<Pix> {
    check_binary(pix)?;
    let labeling = label_pixels(pix, connectivity);

    let mut out = PixMut::new(pix.width(), pix.height(), PixelDepth::Bit32)?;
    let w = pix.width() as usize;
    for (idx, &label) in labeling.labels.iter().enumerate() {
        if label != 0 {
            out.set_pixel_unchecked((idx % w) as u32, (idx / w) as u32, label);
        }
    }
    Ok(out.into())
}
