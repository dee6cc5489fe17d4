/// Built-in choices offered by the view form: projections, layers and
/// height colour schemes understood by the backend.
use crate::backend::types::HeightColors;

pub const PROJECTIONS: [&str; 8] = [
    "mollweide",
    "equirectangular",
    "azimuthal",
    "double azimuthal",
    "orthographic",
    "double orthographic",
    "mercator",
    "pseudocylindrical",
];

pub const LAYERS: [&str; 14] = [
    "Satellite",
    "Climate",
    "Relief Shadow",
    "Plates",
    "Annual Precipitation",
    "Rivers",
    "Temperature",
    "Continentality",
    "Contour",
    "Mountains",
    "Trees",
    "Rhumb Lines",
    "Parallels and Meridians",
    "Paper Texture",
];

/// Layers switched on by choosing a colour rather than a checkbox
pub const COLOUR_DRIVEN_LAYERS: [&str; 2] = ["Contour", "Parallels and Meridians"];

/// Backend identifier for a layer label ("Relief Shadow" -> "relief_shadow")
pub fn layer_id(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}

pub const COLOR_SCHEME_NAMES: [&str; 8] = [
    "None",
    "Atlas",
    "Atlas2",
    "Atlas Dark Water",
    "Bright",
    "Colorful",
    "Green Blue Black",
    "Grayscale",
];

const ATLAS: &[(i32, &str)] = &[
    (-1000, "#ff5a96ff"),
    (-300, "#ff6eb4ff"),
    (0, "#ff6eb4ff"),
    (1, "#ff32c832"),
    (200, "#ff32c832"),
    (201, "#ff4be64b"),
    (500, "#ff4be64b"),
    (501, "#ff96ff64"),
    (1500, "#ff96ff64"),
    (1501, "#ffc8c864"),
    (3000, "#ffc8c864"),
    (3001, "#ff99805a"),
    (5000, "#ff99805a"),
    (5001, "#ffffffff"),
];

const ATLAS2: &[(i32, &str)] = &[
    (-1000, "#ff5a96ff"),
    (-300, "#ff6eb4ff"),
    (0, "#ff6eb4ff"),
    (1, "#ff32c832"),
    (100, "#ff32c832"),
    (101, "#ff32d832"),
    (200, "#ff32d832"),
    (201, "#ff4be64b"),
    (400, "#ff4be64b"),
    (401, "#ff7bef5b"),
    (700, "#ff7bef5b"),
    (701, "#ff96ff64"),
    (1300, "#ff96ff64"),
    (1301, "#ffc8c864"),
    (2000, "#ffc8c864"),
    (2001, "#ffb8a860"),
    (3000, "#ffb8a860"),
    (3001, "#ff99805a"),
    (5000, "#ff99805a"),
    (5001, "#ffffffff"),
];

const ATLAS_DARK_WATER: &[(i32, &str)] = &[
    (-1000, "#ff1a449a"),
    (-300, "#ff2a54aa"),
    (0, "#ff4e64bb"),
    (1, "#ff32c832"),
    (100, "#ff32c832"),
    (101, "#ff32d832"),
    (200, "#ff32d832"),
    (201, "#ff4be64b"),
    (400, "#ff4be64b"),
    (401, "#ff7bef5b"),
    (700, "#ff7bef5b"),
    (701, "#ff96ff64"),
    (1300, "#ff96ff64"),
    (1301, "#ffc8c864"),
    (2000, "#ffc8c864"),
    (2001, "#ffb8a860"),
    (3000, "#ffb8a860"),
    (3001, "#ff99805a"),
    (5000, "#ff99805a"),
    (5001, "#ffffffff"),
];

const BRIGHT: &[(i32, &str)] = &[
    (-1000, "#ff5a96ff"),
    (-300, "#ff6eb4ff"),
    (0, "#ff6eb4ff"),
    (1, "#ff32c832"),
    (100, "#ff32c832"),
    (200, "#ff32d832"),
    (400, "#ff4be64b"),
    (700, "#ff7bef5b"),
    (1300, "#ff96ff64"),
    (2000, "#ffc8c864"),
    (3000, "#ffb8a860"),
    (5000, "#ff99805a"),
    (6000, "#ffffffff"),
];

const COLORFUL: &[(i32, &str)] = &[
    (-5000, "#ff000032"),
    (0, "#ff0000ff"),
    (1, "#ff006400"),
    (1000, "#ff00ff00"),
    (2000, "#ffffff00"),
    (5000, "#ffff0000"),
    (8000, "#ffffffff"),
];

const GREEN_BLUE_BLACK: &[(i32, &str)] = &[
    (-5000, "#ff000001"),
    (0, "#ff0000ff"),
    (1, "#ff000100"),
    (6400, "#ff00ff00"),
];

const GRAYSCALE: &[(i32, &str)] = &[(-5000, "#ff000000"), (6400, "#ffffffff")];

/// Look up a built-in height colour scheme. "None" and unknown names
/// yield None, which tells the backend to skip the height layer.
pub fn color_scheme(name: &str) -> Option<HeightColors> {
    let points = match name {
        "Atlas" => ATLAS,
        "Atlas2" => ATLAS2,
        "Atlas Dark Water" => ATLAS_DARK_WATER,
        "Bright" => BRIGHT,
        "Colorful" => COLORFUL,
        "Green Blue Black" => GREEN_BLUE_BLACK,
        "Grayscale" => GRAYSCALE,
        _ => return None,
    };
    Some(HeightColors {
        points: points
            .iter()
            .map(|(height, colour)| (*height, colour.to_string()))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_named_scheme_resolves() {
        for name in COLOR_SCHEME_NAMES {
            assert_eq!(color_scheme(name).is_some(), name != "None", "{}", name);
        }
    }

    #[test]
    fn test_scheme_heights_ascend() {
        for name in COLOR_SCHEME_NAMES.iter().skip(1) {
            let scheme = color_scheme(name).unwrap();
            assert!(scheme.points.windows(2).all(|w| w[0].0 < w[1].0), "{}", name);
            assert!(scheme.points.iter().all(|(_, c)| c.len() == 9));
        }
    }

    #[test]
    fn test_layer_ids() {
        assert_eq!(layer_id("Parallels and Meridians"), "parallels_and_meridians");
        assert_eq!(layer_id("Climate"), "climate");
    }
}
