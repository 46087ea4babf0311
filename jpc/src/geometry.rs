use crate::ImageAndTileSizeMarkerSegment;

fn ceil_div(numerator: u32, denominator: u32) -> u32 {
    let denominator = denominator.max(1) as u64;
    ((numerator as u64 + denominator - 1) / denominator) as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentGeometry {
    pub width: u32,
    pub height: u32,
    pub precision: u8,
    pub signed: bool,
    pub horizontal_separation: u8,
    pub vertical_separation: u8,
}

/// Image dimensions derived from the SIZ marker segment (ISO/IEC 15444-1
/// B.2 and B.3).
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub image_width: u32,
    pub image_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub no_tiles_x: u32,
    pub no_tiles_y: u32,
    pub components: Vec<ComponentGeometry>,
}

impl Geometry {
    pub fn new(siz: &ImageAndTileSizeMarkerSegment) -> Geometry {
        let components = siz
            .components()
            .iter()
            .map(|component| {
                let dx = component.horizontal_separation() as u32;
                let dy = component.vertical_separation() as u32;
                ComponentGeometry {
                    // ceil(Xsiz / XRsiz) - ceil(XOsiz / XRsiz)
                    width: ceil_div(siz.reference_grid_width(), dx)
                        - ceil_div(siz.image_horizontal_offset(), dx),
                    height: ceil_div(siz.reference_grid_height(), dy)
                        - ceil_div(siz.image_vertical_offset(), dy),
                    precision: component.precision(),
                    signed: component.values_are_signed(),
                    horizontal_separation: component.horizontal_separation(),
                    vertical_separation: component.vertical_separation(),
                }
            })
            .collect();

        Geometry {
            image_width: siz.reference_grid_width() - siz.image_horizontal_offset(),
            image_height: siz.reference_grid_height() - siz.image_vertical_offset(),
            tile_width: siz.reference_tile_width(),
            tile_height: siz.reference_tile_height(),
            // numXtiles = ceil((Xsiz - XTOsiz) / XTsiz)
            no_tiles_x: ceil_div(
                siz.reference_grid_width() - siz.tile_horizontal_offset(),
                siz.reference_tile_width(),
            ),
            no_tiles_y: ceil_div(
                siz.reference_grid_height() - siz.tile_vertical_offset(),
                siz.reference_tile_height(),
            ),
            components,
        }
    }

    pub fn no_tiles(&self) -> u64 {
        self.no_tiles_x as u64 * self.no_tiles_y as u64
    }

    pub fn no_components(&self) -> usize {
        self.components.len()
    }
}

#[cfg(test)]
mod tests {
    use super::ceil_div;

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(65, 2), 33);
        assert_eq!(ceil_div(64, 2), 32);
        assert_eq!(ceil_div(0, 3), 0);
        assert_eq!(ceil_div(u32::MAX, 1), u32::MAX);
    }
}
