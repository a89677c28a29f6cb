//! PNG tile renderer.
//!
//! Writes one PNG per tile below an output directory. A tile's path follows
//! its digits: `1-2-4` is stored at `1/2/4.png` and the root at `base.png`.
//! Leaves are painted from their grid position; parents are built by
//! downscaling each present child into its quadrant.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tilepyramid::render::{RenderError, TileRenderer};
use tilepyramid::tile::{TileAddress, TileTree};
use tracing::trace;

/// File name used for the root tile.
pub const ROOT_FILE: &str = "base.png";

/// Renders tiles to PNG files.
pub struct PngTileRenderer {
    root: PathBuf,
    tile_size: u32,
    /// Leaf grid edge length, used to color leaves by position.
    grid_size: u64,
}

impl PngTileRenderer {
    pub fn new(root: impl Into<PathBuf>, tile_size: u32, tree: &dyn TileTree) -> Self {
        Self {
            root: root.into(),
            tile_size,
            grid_size: 1u64 << tree.max_depth(),
        }
    }

    /// Output path for `tile`.
    pub fn tile_path(&self, tile: &TileAddress) -> PathBuf {
        tile_path(&self.root, tile)
    }

    fn leaf_color(&self, tile: &TileAddress) -> [u8; 3] {
        let (x, y) = tile.position();
        let scale = |v: u64| ((v * 255) / self.grid_size.saturating_sub(1).max(1)) as u8;
        [scale(x), scale(y), 160]
    }

    fn save(&self, tile: &TileAddress, img: &RgbaImage) -> Result<(), RenderError> {
        let path = self.tile_path(tile);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        img.save(&path)
            .map_err(|e| RenderError::Image(format!("{}: {}", path.display(), e)))
    }

    fn load_child(&self, tile: &TileAddress, child: TileAddress) -> Result<RgbaImage, RenderError> {
        let path = self.tile_path(&child);
        if !path.exists() {
            return Err(RenderError::MissingChild { tile: *tile, child });
        }
        let img = image::open(&path)
            .map_err(|e| RenderError::Image(format!("{}: {}", path.display(), e)))?;
        Ok(img.to_rgba8())
    }
}

impl TileRenderer for PngTileRenderer {
    fn render_leaf(&self, tile: &TileAddress) -> Result<(), RenderError> {
        let [r, g, b] = self.leaf_color(tile);
        let size = self.tile_size;
        let img = RgbaImage::from_fn(size, size, |px, py| {
            // Thin border so tile edges stay visible when zoomed in
            if px == 0 || py == 0 || px + 1 == size || py + 1 == size {
                Rgba([r / 2, g / 2, b / 2, 255])
            } else {
                Rgba([r, g, b, 255])
            }
        });
        trace!(tile = %tile, "Rendered leaf");
        self.save(tile, &img)
    }

    fn composite_parent(
        &self,
        tile: &TileAddress,
        skip_children: &BTreeSet<TileAddress>,
    ) -> Result<(), RenderError> {
        let size = self.tile_size;
        let half = size / 2;
        let mut canvas = RgbaImage::new(size, size);

        for (index, child) in tile.children().into_iter().enumerate() {
            if skip_children.contains(&child) {
                continue;
            }
            let img = self.load_child(tile, child)?;
            let small = imageops::resize(&img, half, half, FilterType::Triangle);
            let x = i64::from(half) * ((index & 1) as i64);
            let y = i64::from(half) * ((index >> 1) as i64);
            imageops::overlay(&mut canvas, &small, x, y);
        }

        trace!(tile = %tile, skipped = skip_children.len(), "Composited parent");
        self.save(tile, &canvas)
    }
}

/// Output path for `tile` below `root`.
pub fn tile_path(root: &Path, tile: &TileAddress) -> PathBuf {
    let digits: Vec<u8> = tile.digits().collect();
    match digits.split_last() {
        None => root.join(ROOT_FILE),
        Some((last, dirs)) => {
            let mut path = root.to_path_buf();
            for digit in dirs {
                path.push(digit.to_string());
            }
            path.push(format!("{}.png", last));
            path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tilepyramid::tile::SparseTileTree;

    fn addr(s: &str) -> TileAddress {
        s.parse().unwrap()
    }

    fn setup(tile_size: u32) -> (TempDir, PngTileRenderer) {
        let dir = TempDir::new().unwrap();
        let tree = SparseTileTree::from_positions(1, [(0, 0), (1, 1)]).unwrap();
        let renderer = PngTileRenderer::new(dir.path(), tile_size, &tree);
        (dir, renderer)
    }

    #[test]
    fn test_tile_path_layout() {
        let root = Path::new("/out");
        assert_eq!(tile_path(root, &TileAddress::ROOT), root.join("base.png"));
        assert_eq!(tile_path(root, &addr("3")), root.join("3.png"));
        assert_eq!(tile_path(root, &addr("1-2-4")), root.join("1/2/4.png"));
    }

    #[test]
    fn test_leaf_writes_png_of_tile_size() {
        let (_dir, renderer) = setup(8);
        renderer.render_leaf(&addr("1")).unwrap();

        let img = image::open(renderer.tile_path(&addr("1"))).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
    }

    #[test]
    fn test_composite_places_children_in_quadrants() {
        let (_dir, renderer) = setup(8);
        renderer.render_leaf(&addr("1")).unwrap();
        renderer.render_leaf(&addr("4")).unwrap();

        let skip: BTreeSet<_> = [addr("2"), addr("3")].into_iter().collect();
        renderer.composite_parent(&TileAddress::ROOT, &skip).unwrap();

        let img = image::open(renderer.tile_path(&TileAddress::ROOT))
            .unwrap()
            .to_rgba8();
        // Present quadrants are opaque, skipped ones stay transparent
        assert_eq!(img.get_pixel(1, 1)[3], 255);
        assert_eq!(img.get_pixel(5, 5)[3], 255);
        assert_eq!(img.get_pixel(5, 1)[3], 0);
        assert_eq!(img.get_pixel(1, 5)[3], 0);
    }

    #[test]
    fn test_composite_missing_child_fails() {
        let (_dir, renderer) = setup(8);
        renderer.render_leaf(&addr("1")).unwrap();

        let skip: BTreeSet<_> = [addr("2"), addr("3")].into_iter().collect();
        let err = renderer
            .composite_parent(&TileAddress::ROOT, &skip)
            .unwrap_err();
        match err {
            RenderError::MissingChild { tile, child } => {
                assert_eq!(tile, TileAddress::ROOT);
                assert_eq!(child, addr("4"));
            }
            other => panic!("expected MissingChild, got {:?}", other),
        }
    }
}
