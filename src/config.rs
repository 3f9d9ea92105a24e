//! Runtime configuration.
//!
//! Everything has a default; environment variables override the store
//! connection, asset paths and the label seed. Natively the variables are read
//! when the app starts. Browser builds have no environment, so the values seen
//! by the compiler are baked in instead.

use std::str::FromStr;

use instant::Duration;

pub const STORE_URL: &str = "NAME_TREE_STORE_URL";
pub const STORE_KEY: &str = "NAME_TREE_STORE_KEY";
pub const TABLE: &str = "NAME_TREE_TABLE";
pub const COLUMN: &str = "NAME_TREE_COLUMN";
pub const MODEL: &str = "NAME_TREE_MODEL";
pub const AUDIO: &str = "NAME_TREE_AUDIO";
pub const FONT: &str = "NAME_TREE_FONT";
pub const SEED: &str = "NAME_TREE_SEED";
pub const HTTP_TIMEOUT_SECS: &str = "NAME_TREE_HTTP_TIMEOUT_SECS";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub store: StoreConfig,
    pub assets: AssetPaths,
    /// Fixed seed for label placement; random when unset.
    pub seed: Option<u64>,
    pub scene: SceneSettings,
    pub label: LabelStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Base URL of the PostgREST/Supabase project, e.g. `https://xyz.supabase.co`.
    pub url: Option<String>,
    /// Anon/public API key sent as `apikey` and bearer token.
    pub key: Option<String>,
    pub table: String,
    pub column: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssetPaths {
    pub model: String,
    pub audio: String,
    pub font: String,
}

/// Fixed parameters of the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneSettings {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub eye: [f32; 3],
    /// Height the model is scaled to; the orbit target sits at half of it.
    pub target_height: f32,
    /// Group rotation about Y per rendered frame, in radians.
    pub rotation_per_frame: f32,
    pub damping_factor: f32,
    pub ambient_intensity: f32,
    pub light_intensity: f32,
    pub light_position: [f32; 3],
    /// sRGB background colour.
    pub background: [u8; 3],
    pub audio_volume: f64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            z_near: 0.1,
            z_far: 100.0,
            eye: [0.0, 3.0, 10.0],
            target_height: 4.0,
            rotation_per_frame: 0.002,
            damping_factor: 0.05,
            ambient_intensity: 1.2,
            light_intensity: 2.0,
            light_position: [5.0, 10.0, 5.0],
            background: [0x02, 0x1B, 0x14],
            audio_volume: 0.3,
        }
    }
}

/// How names are painted and where their sprites may land.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelStyle {
    pub canvas_size: [u32; 2],
    /// Horizontal center and baseline of the text on the canvas.
    pub anchor: [f32; 2],
    pub font_family: String,
    pub font_size: f32,
    pub color: [u8; 4],
    pub sprite_size: [f32; 2],
    /// Width (x) and depth (z) of the placement box, centered on the Y axis,
    /// as multiples of the model's target height.
    pub spread: [f32; 2],
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            canvas_size: [256, 64],
            anchor: [128.0, 40.0],
            font_family: "JetBrains Mono".to_string(),
            font_size: 18.0,
            color: [255, 255, 0, 255],
            sprite_size: [2.0, 0.5],
            spread: [1.25, 1.75],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                url: None,
                key: None,
                table: "nombres_navidad".to_string(),
                column: "nombres".to_string(),
                timeout: Duration::from_secs(20),
            },
            assets: AssetPaths {
                model: "modelo_3d.glb".to_string(),
                audio: "audio/navidad.mp3".to_string(),
                font: "fonts/JetBrainsMono-Regular.ttf".to_string(),
            },
            seed: None,
            scene: SceneSettings::default(),
            label: LabelStyle::default(),
        }
    }
}

impl Config {
    /// Read overrides from the process environment (natively) or from the
    /// values baked in at compile time (browser).
    pub fn from_env() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::from_lookup(|name| std::env::var(name).ok())
        }
        #[cfg(target_arch = "wasm32")]
        {
            Self::from_lookup(baked)
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        config.store.url = non_empty(STORE_URL).map(|url| url.trim_end_matches('/').to_string());
        config.store.key = non_empty(STORE_KEY);
        if let Some(table) = non_empty(TABLE) {
            config.store.table = table;
        }
        if let Some(column) = non_empty(COLUMN) {
            config.store.column = column;
        }
        if let Some(secs) = parse_or_warn::<u64>(HTTP_TIMEOUT_SECS, non_empty(HTTP_TIMEOUT_SECS)) {
            config.store.timeout = Duration::from_secs(secs);
        }
        if let Some(model) = non_empty(MODEL) {
            config.assets.model = model;
        }
        if let Some(audio) = non_empty(AUDIO) {
            config.assets.audio = audio;
        }
        if let Some(font) = non_empty(FONT) {
            config.assets.font = font;
        }
        config.seed = parse_or_warn(SEED, non_empty(SEED));
        config
    }
}

fn parse_or_warn<T: FromStr>(name: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("ignoring {name}={value:?}: not a valid number");
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn baked(name: &str) -> Option<String> {
    let value = match name {
        STORE_URL => option_env!("NAME_TREE_STORE_URL"),
        STORE_KEY => option_env!("NAME_TREE_STORE_KEY"),
        TABLE => option_env!("NAME_TREE_TABLE"),
        COLUMN => option_env!("NAME_TREE_COLUMN"),
        MODEL => option_env!("NAME_TREE_MODEL"),
        AUDIO => option_env!("NAME_TREE_AUDIO"),
        FONT => option_env!("NAME_TREE_FONT"),
        SEED => option_env!("NAME_TREE_SEED"),
        _ => None,
    };
    value.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_the_scene() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.store.table, "nombres_navidad");
        assert_eq!(config.store.column, "nombres");
        assert_eq!(config.store.url, None);
        assert_eq!(config.assets.model, "modelo_3d.glb");
        assert_eq!(config.scene.target_height, 4.0);
        assert_eq!(config.label.canvas_size, [256, 64]);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup(&[
            (STORE_URL, "https://example.supabase.co/"),
            (STORE_KEY, "anon"),
            (TABLE, "guests"),
            (SEED, " 42 "),
            (HTTP_TIMEOUT_SECS, "5"),
        ]));
        assert_eq!(config.store.url.as_deref(), Some("https://example.supabase.co"));
        assert_eq!(config.store.key.as_deref(), Some("anon"));
        assert_eq!(config.store.table, "guests");
        assert_eq!(config.store.column, "nombres");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.store.timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = Config::from_lookup(lookup(&[(SEED, "forty-two"), (HTTP_TIMEOUT_SECS, "-1")]));
        assert_eq!(config.seed, None);
        assert_eq!(config.store.timeout, Duration::from_secs(20));
    }

    #[test]
    fn blank_values_are_unset() {
        let config = Config::from_lookup(lookup(&[(STORE_URL, "  "), (TABLE, "")]));
        assert_eq!(config.store.url, None);
        assert_eq!(config.store.table, "nombres_navidad");
    }
}
