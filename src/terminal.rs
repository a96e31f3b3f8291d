//! Terminal preview of connection state
//!
//! Draws one grid with box-drawing characters, one cell per tile, so the
//! result of a replay can be eyeballed without a sprite renderer.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::grid::GridId;
use crate::world::GridWorld;

/// Largest width or height, in tiles, that [`render_grid`] will draw.
pub const MAX_RENDER_SPAN: u64 = 512;

/// Why a grid could not be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("nothing placed on {grid}")]
    Empty { grid: GridId },
    #[error("{grid} spans {width}x{height} tiles, more than {max} per side", max = MAX_RENDER_SPAN)]
    TooLarge { grid: GridId, width: u64, height: u64 },
}

/// Box-drawing glyph for a connection mask (N=1, E=2, S=4, W=8).
///
/// # Examples
///
/// ```
/// use spritelink::terminal::glyph;
///
/// assert_eq!(glyph(0b0101), '│');
/// assert_eq!(glyph(0b1010), '─');
/// assert_eq!(glyph(0b1111), '┼');
/// ```
pub fn glyph(mask: u8) -> char {
    const GLYPHS: [char; 16] = [
        '■', '╵', '╶', '└', '╷', '│', '┌', '├', '╴', '┘', '─', '┴', '┐', '┤', '┬', '┼',
    ];
    GLYPHS[usize::from(mask & 0x0F)]
}

/// Render the objects of `grid` as rows of glyphs, +Y at the top.
///
/// Tiles are addressed in snap units. Empty tiles are shown as `.`; when a
/// tile holds several objects the lowest id is drawn. Fails when no object is
/// placed on the grid or the occupied area exceeds [`MAX_RENDER_SPAN`].
pub fn render_grid(world: &GridWorld, grid: GridId) -> Result<String, RenderError> {
    let empty = RenderError::Empty { grid };
    let snap = i64::from(world.snap_of(grid).ok_or(empty.clone())?.max(1));
    let mut cells: BTreeMap<(i64, i64), char> = BTreeMap::new();
    for (id, tile) in world.objects_on(grid) {
        let mask = world.connections(id).map(|c| c.mask()).unwrap_or(0);
        cells.entry((tile.x.div_euclid(snap), tile.y.div_euclid(snap))).or_insert(glyph(mask));
    }

    let min_x = cells.keys().map(|(x, _)| *x).min().ok_or(empty.clone())?;
    let max_x = cells.keys().map(|(x, _)| *x).max().ok_or(empty.clone())?;
    let min_y = cells.keys().map(|(_, y)| *y).min().ok_or(empty.clone())?;
    let max_y = cells.keys().map(|(_, y)| *y).max().ok_or(empty)?;

    let width = max_x.abs_diff(min_x).saturating_add(1);
    let height = max_y.abs_diff(min_y).saturating_add(1);
    if width > MAX_RENDER_SPAN || height > MAX_RENDER_SPAN {
        return Err(RenderError::TooLarge { grid, width, height });
    }

    let mut out = String::new();
    for y in (min_y..=max_y).rev() {
        for x in min_x..=max_x {
            out.push(cells.get(&(x, y)).copied().unwrap_or('.'));
        }
        out.push('\n');
    }
    Ok(out)
}
