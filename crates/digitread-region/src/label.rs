//! Component selection helpers
//!
//! High-level queries over the output of
//! [`find_connected_components`](crate::conncomp::find_connected_components).

use crate::conncomp::{ConnectedComponent, ConnectivityType, find_connected_components};
use crate::error::RegionResult;
use digitread_core::Pix;

/// Count the number of connected components
///
/// # Arguments
///
/// * `pix` - Input binary image (1-bit)
/// * `connectivity` - Connectivity type
pub fn pix_count_components(pix: &Pix, connectivity: ConnectivityType) -> RegionResult<u32> {
    Ok(find_connected_components(pix, connectivity)?.len() as u32)
}

/// Pick the component with the most pixels.
///
/// Ties go to the lowest label, i.e. the component whose first pixel comes
/// first in raster order. Returns `None` for an empty slice.
pub fn largest_component(components: &[ConnectedComponent]) -> Option<&ConnectedComponent> {
    components.iter().fold(None, |best, c| match best {
        Some(b) if b.pixel_count >= c.pixel_count => Some(b),
        _ => Some(c),
    })
}

/// Find the largest foreground component of a binary image.
///
/// Returns `Ok(None)` when the image has no foreground pixels.
pub fn pix_largest_component(
    pix: &Pix,
    connectivity: ConnectivityType,
) -> RegionResult<Option<ConnectedComponent>> {
    let components = find_connected_components(pix, connectivity)?;
    Ok(largest_component(&components).cloned())
}
