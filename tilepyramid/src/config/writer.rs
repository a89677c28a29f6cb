//! INI serialization: produces the commented text written to `config.ini`.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let threads = config
        .render
        .threads
        .map(|t| t.to_string())
        .unwrap_or_else(|| "auto".to_string());

    format!(
        r#"[render]
; Worker threads rendering tiles in parallel ("auto" = one per CPU core)
threads = {}
; Levels rendered inside one seeded work item (0 = one leaf tile per item)
batch_depth = {}

[output]
; Directory rendered tiles are written to
directory = {}
; Tile edge length in pixels (even number)
tile_size = {}

[logging]
; Directory and file name for the log
directory = {}
file = {}
"#,
        threads,
        config.render.batch_depth,
        config.output.directory.display(),
        config.output.tile_size,
        config.logging.directory.display(),
        config.logging.file,
    )
}
