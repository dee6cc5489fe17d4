/// Request and response bodies exchanged with the generator backend
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topology of the generated world
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Globe,
    Cylinder,
    Flat,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Globe, Shape::Cylinder, Shape::Flat];
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Globe => "Globe",
            Shape::Cylinder => "Cylinder",
            Shape::Flat => "Flat",
        };
        f.write_str(name)
    }
}

/// Body of `generate`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub shape: Shape,
    pub seed: u32,
    pub height_pixels: u32,
    pub width_pixels: u32,
    pub number_of_plates: u32,
    pub water_percentage: f32,
    pub land_height_percentiles: Vec<(f32, i32)>,
    pub ocean_depth_percentiles: Vec<(f32, i32)>,
    pub precipitation_percentiles: Vec<(f32, i32)>,
    pub number_of_rivers: u32,
    pub islands: f32,
    pub supercontinent: bool,
    pub make_climate: bool,
    pub erosion_iterations: u32,
    pub hotspots: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            shape: Shape::Globe,
            seed: 1,
            height_pixels: 500,
            width_pixels: 1000,
            number_of_plates: 15,
            water_percentage: 71.0,
            land_height_percentiles: vec![
                (0.0, 0),
                (50.0, 250),
                (75.0, 500),
                (89.0, 1000),
                (93.0, 1500),
                (98.0, 2000),
                (99.0, 3500),
                (100.0, 6500),
            ],
            ocean_depth_percentiles: vec![
                (0.0, -10000),
                (5.0, -4000),
                (60.0, -2000),
                (80.0, -200),
                (100.0, 0),
            ],
            precipitation_percentiles: vec![
                (5.0, 0),
                (15.0, 20),
                (25.0, 35),
                (35.0, 50),
                (65.0, 70),
                (88.0, 150),
                (100.0, 250),
            ],
            number_of_rivers: 80,
            islands: 1.0,
            supercontinent: false,
            make_climate: false,
            erosion_iterations: 0,
            hotspots: 0.0,
        }
    }
}

/// Body of `load` and `generate_from_image`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub world_name: String,
    pub file: String,
    pub shape: Shape,
}

/// Body of `save`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub world_name: String,
    pub path: String,
}

/// Height -> colour gradient, colours as `#AARRGGBB`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HeightColors {
    pub points: Vec<(i32, String)>,
}

/// Body of `draw` and `get_image`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// [width, height] in pixels
    pub resolution: [u32; 2],
    /// [latitude, longitude] of the projection centre
    pub center: [f32; 2],
    pub rotation: f32,
    pub land_color: String,
    pub water_color: String,
    pub contour_color: String,
    pub layers: Vec<String>,
    pub projection: String,
    pub output_path: String,
    pub rotation_frames: u32,
    pub parallels_interval: f32,
    pub parallels_color: String,
    pub height_colors: Option<HeightColors>,
}

impl ViewConfig {
    /// Same view, centred on another longitude (one spin frame)
    pub fn at_longitude(&self, longitude: f64) -> Self {
        let mut config = self.clone();
        config.center[1] = longitude as f32;
        config
    }
}

/// Body of `adjust_water_percentage`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WaterLevelRequest {
    pub percentage: f32,
}

/// Body of `resize`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ResizeRequest {
    pub factor: f32,
}

/// Body of `calculate_climate`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ClimateRequest {
    pub pole_temperature: f32,
    pub equator_temperature: f32,
    pub humidity: f32,
}

/// Generic `{"message": ...}` reply
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackendMessage {
    pub message: String,
}

/// Reply of `get_size`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldSize {
    pub width: u32,
    pub height: u32,
}

/// Reply of `get_layers`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LayerList {
    pub layers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_config_wire_shape() {
        let value = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert_eq!(value["shape"], "Globe");
        assert_eq!(value["land_height_percentiles"][1], json!([50.0, 250]));
        assert_eq!(value["ocean_depth_percentiles"][0], json!([0.0, -10000]));
        assert_eq!(value["number_of_rivers"], 80);
    }

    #[test]
    fn test_view_config_at_longitude_only_moves_longitude() {
        let config = ViewConfig {
            resolution: [1000, 500],
            center: [12.0, 0.0],
            rotation: 5.0,
            land_color: "#00000000".into(),
            water_color: "#00000000".into(),
            contour_color: "#00000000".into(),
            layers: vec!["climate".into()],
            projection: "mollweide".into(),
            output_path: "out/earth".into(),
            rotation_frames: 30,
            parallels_interval: 30.0,
            parallels_color: "#00000000".into(),
            height_colors: Some(HeightColors {
                points: vec![(0, "#ff0000ff".into())],
            }),
        };
        let frame = config.at_longitude(-96.0);
        assert_eq!(frame.center, [12.0, -96.0]);
        assert_eq!(frame.layers, config.layers);

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["height_colors"]["points"][0], json!([0, "#ff0000ff"]));
    }
}
