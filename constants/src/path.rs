/// Directory under `assets/` holding the editor manifest.
pub const RELATIVE_MANIFEST_PATH: &str = "maps/demo";

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Suffix appended to the source map name when saving edits.
pub const EDITED_MAP_SUFFIX: &str = "_edited";
