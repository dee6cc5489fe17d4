/// Form models behind the dialogs
///
/// Each form holds what the user typed and knows how to turn it into the
/// request body the backend expects. Ranges and defaults match the
/// widgets in the UI.
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::backend::types::{
    ClimateRequest, GenerationConfig, ResizeRequest, Shape, ViewConfig, WaterLevelRequest,
};
use crate::catalog::{self, COLOUR_DRIVEN_LAYERS, LAYERS};

/// Colour as sent to the backend, `#AARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Argb {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Argb {
    pub const TRANSPARENT: Argb = Argb { a: 0, r: 0, g: 0, b: 0 };

    /// Parse `#AARRGGBB` (or `#RRGGBB`, taken as opaque)
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text.trim().strip_prefix('#')?;
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            8 => Some(Argb {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            6 => Some(Argb {
                a: 255,
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
            }),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.a, self.r, self.g, self.b)
    }

    pub fn is_transparent(self) -> bool {
        self == Self::TRANSPARENT
    }
}

/// "Create New World" dialog
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationForm {
    pub seed: String,
    pub shape: Shape,
    /// 0..=100
    pub water_percentage: f32,
    /// 1..=50
    pub plates: u32,
    /// 0..=10
    pub islands: f32,
    /// 10..=5000
    pub width: u32,
    /// 10..=2500
    pub height: u32,
    pub erosion_iterations: u32,
    pub supercontinent: bool,
    pub climate: bool,
    pub hotspots: bool,
}

impl Default for GenerationForm {
    fn default() -> Self {
        Self {
            seed: String::new(),
            shape: Shape::Globe,
            water_percentage: 71.0,
            plates: 25,
            islands: 1.0,
            width: 1000,
            height: 500,
            erosion_iterations: 0,
            supercontinent: false,
            climate: false,
            hotspots: false,
        }
    }
}

impl GenerationForm {
    /// Numeric seeds are used as-is, anything else is hashed to 32 bits.
    pub fn seed_value(&self) -> u32 {
        let text = self.seed.trim();
        if let Ok(seed) = text.parse::<u32>() {
            return seed;
        }
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        (hasher.finish() & 0xffff_ffff) as u32
    }

    pub fn to_config(&self) -> GenerationConfig {
        GenerationConfig {
            shape: self.shape,
            seed: self.seed_value(),
            height_pixels: self.height.clamp(10, 2500),
            width_pixels: self.width.clamp(10, 5000),
            number_of_plates: self.plates.clamp(1, 50),
            water_percentage: self.water_percentage.clamp(0.0, 100.0),
            islands: self.islands.clamp(0.0, 10.0),
            supercontinent: self.supercontinent,
            make_climate: self.climate,
            erosion_iterations: self.erosion_iterations,
            hotspots: if self.hotspots { 50.0 } else { 0.0 },
            ..GenerationConfig::default()
        }
    }
}

/// "Create New View" dialog
#[derive(Debug, Clone, PartialEq)]
pub struct NewViewForm {
    pub name: String,
    pub projection: String,
    /// 10..=10000
    pub width: u32,
    /// 10..=5000
    pub height: u32,
    /// 0..=360
    pub parallels_interval: u32,
    /// 1..=120
    pub rotation_frames: u32,
    /// -90..=90
    pub center_latitude: f32,
    /// -180..=180
    pub rotation: f32,
    pub land_color: Argb,
    pub water_color: Argb,
    pub contour_color: Argb,
    pub parallels_color: Argb,
    pub color_scheme: String,
    /// Checkbox layers that are ticked, by label
    pub layers: BTreeSet<String>,
    /// Ask the backend to write frames to disk instead of streaming them
    pub render_to_disk: bool,
}

impl Default for NewViewForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            projection: catalog::PROJECTIONS[0].to_string(),
            width: 1000,
            height: 500,
            parallels_interval: 30,
            rotation_frames: 30,
            center_latitude: 0.0,
            rotation: 0.0,
            land_color: Argb::TRANSPARENT,
            water_color: Argb::TRANSPARENT,
            contour_color: Argb::TRANSPARENT,
            parallels_color: Argb::TRANSPARENT,
            color_scheme: catalog::COLOR_SCHEME_NAMES[0].to_string(),
            layers: BTreeSet::new(),
            render_to_disk: false,
        }
    }
}

impl NewViewForm {
    /// Layers offered as checkboxes (the others follow their colour)
    pub fn checkbox_layers() -> impl Iterator<Item = &'static str> {
        LAYERS
            .into_iter()
            .filter(|label| !COLOUR_DRIVEN_LAYERS.contains(label))
    }

    pub fn toggle_layer(&mut self, label: &str, enabled: bool) {
        if enabled {
            self.layers.insert(label.to_string());
        } else {
            self.layers.remove(label);
        }
    }

    /// Backend layer ids, in catalogue order
    pub fn layer_ids(&self) -> Vec<String> {
        LAYERS
            .iter()
            .filter(|label| match **label {
                "Contour" => !self.contour_color.is_transparent(),
                "Parallels and Meridians" => !self.parallels_color.is_transparent(),
                other => self.layers.contains(other),
            })
            .map(|label| catalog::layer_id(label))
            .collect()
    }

    /// View name, falling back to the projection when left blank
    pub fn view_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            self.projection.clone()
        } else {
            name.to_string()
        }
    }

    pub fn to_config(&self, output_dir: &Path) -> ViewConfig {
        ViewConfig {
            resolution: [self.width.clamp(10, 10_000), self.height.clamp(10, 5000)],
            center: [self.center_latitude.clamp(-90.0, 90.0), 0.0],
            rotation: self.rotation.clamp(-180.0, 180.0),
            land_color: self.land_color.to_hex(),
            water_color: self.water_color.to_hex(),
            contour_color: self.contour_color.to_hex(),
            layers: self.layer_ids(),
            projection: self.projection.clone(),
            output_path: output_dir
                .join(self.view_name())
                .to_string_lossy()
                .replace('\\', "/"),
            rotation_frames: self.rotation_frames.clamp(1, 120),
            parallels_interval: self.parallels_interval.min(360) as f32,
            parallels_color: self.parallels_color.to_hex(),
            height_colors: catalog::color_scheme(&self.color_scheme),
        }
    }
}

/// Single-value edit operations with a parameter dialog
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationForm {
    WaterLevel { percentage: f32 },
    Resize { factor: f32 },
    Climate {
        pole_temperature: f32,
        equator_temperature: f32,
        humidity: f32,
    },
}

impl OperationForm {
    pub fn water_level() -> Self {
        OperationForm::WaterLevel { percentage: 71.0 }
    }

    pub fn resize() -> Self {
        OperationForm::Resize { factor: 2.0 }
    }

    pub fn climate() -> Self {
        OperationForm::Climate {
            pole_temperature: -35.0,
            equator_temperature: 25.0,
            humidity: 1.0,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            OperationForm::WaterLevel { .. } => "Change Sea Level",
            OperationForm::Resize { .. } => "Resize",
            OperationForm::Climate { .. } => "Define Climate",
        }
    }

    /// (label, value, min, max) of each field, in display order
    pub fn fields(&self) -> Vec<(&'static str, f32, f32, f32)> {
        match *self {
            OperationForm::WaterLevel { percentage } => {
                vec![("Percentage", percentage, 0.0, 100.0)]
            }
            OperationForm::Resize { factor } => vec![("Factor", factor, 0.0, 10.0)],
            OperationForm::Climate {
                pole_temperature,
                equator_temperature,
                humidity,
            } => vec![
                ("Pole Temperature", pole_temperature, -100.0, 100.0),
                ("Equator Temperature", equator_temperature, -100.0, 100.0),
                ("Humidity", humidity, 0.0, 10.0),
            ],
        }
    }

    /// Set field `index` (as listed by `fields`), clamped to its range
    pub fn set_field(&mut self, index: usize, value: f32) {
        let Some((_, _, min, max)) = self.fields().get(index).copied() else {
            return;
        };
        let value = value.clamp(min, max);
        match (self, index) {
            (OperationForm::WaterLevel { percentage }, 0) => *percentage = value,
            (OperationForm::Resize { factor }, 0) => *factor = value,
            (OperationForm::Climate { pole_temperature, .. }, 0) => *pole_temperature = value,
            (OperationForm::Climate { equator_temperature, .. }, 1) => {
                *equator_temperature = value
            }
            (OperationForm::Climate { humidity, .. }, 2) => *humidity = value,
            _ => {}
        }
    }
}

/// Request body of a filled-in operation form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationRequest {
    WaterLevel(WaterLevelRequest),
    Resize(ResizeRequest),
    Climate(ClimateRequest),
}

impl From<OperationForm> for OperationRequest {
    fn from(form: OperationForm) -> Self {
        match form {
            OperationForm::WaterLevel { percentage } => {
                OperationRequest::WaterLevel(WaterLevelRequest { percentage })
            }
            OperationForm::Resize { factor } => OperationRequest::Resize(ResizeRequest { factor }),
            OperationForm::Climate {
                pole_temperature,
                equator_temperature,
                humidity,
            } => OperationRequest::Climate(ClimateRequest {
                pole_temperature,
                equator_temperature,
                humidity,
            }),
        }
    }
}
