use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

// Browser builds read these through `option_env!`, so a change must rebuild the crate.
const CONFIG_VARS: [&str; 8] = [
    "NAME_TREE_STORE_URL",
    "NAME_TREE_STORE_KEY",
    "NAME_TREE_TABLE",
    "NAME_TREE_COLUMN",
    "NAME_TREE_MODEL",
    "NAME_TREE_AUDIO",
    "NAME_TREE_FONT",
    "NAME_TREE_SEED",
];

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/*");
    for var in CONFIG_VARS {
        println!("cargo:rerun-if-env-changed={var}");
    }

    // The model, font and audio files are served next to the binary / wasm bundle.
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if assets_src.exists() {
        let out_dir = env::var("OUT_DIR")?;
        let mut copy_options = CopyOptions::new();
        copy_options.overwrite = true;
        copy_items(&[assets_src], out_dir, &copy_options)?;
    }

    Ok(())
}
