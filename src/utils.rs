use std::path::{Path, PathBuf};

use crate::settings::CONFIG_FILE_NAME;

/// Returns the cross-platform directory for application data
pub fn get_app_data_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let mut path = PathBuf::from(home_dir);
        path.push("Library");
        path.push("Application Support");
        path.push("TravelMap");
        path
    } else if cfg!(target_os = "windows") {
        // %APPDATA%/TravelMap, or the current directory as a fallback
        if let Ok(appdata) = std::env::var("APPDATA") {
            let mut path = PathBuf::from(appdata);
            path.push("TravelMap");
            path
        } else {
            PathBuf::from(".").join("TravelMap")
        }
    } else if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let mut path = PathBuf::from(xdg_config_home);
        path.push("travelmap");
        path
    } else {
        let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let mut path = PathBuf::from(home_dir);
        path.push(".config");
        path.push("travelmap");
        path
    }
}

/// Ensures the directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<(), std::io::Error> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Returns the path to the application configuration file
pub fn get_config_path() -> PathBuf {
    let mut config_dir = get_app_data_dir();
    config_dir.push(CONFIG_FILE_NAME);
    config_dir
}

/// Relative path with every component lowercased and the extension replaced.
pub fn lowercase_output_path(relative: &Path, extension: &str) -> PathBuf {
    let lowered = PathBuf::from(relative.to_string_lossy().to_lowercase());
    lowered.with_extension(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_output_path() {
        assert_eq!(
            lowercase_output_path(Path::new("Trip/IMG_4126.HEIC"), "jpg"),
            PathBuf::from("trip/img_4126.jpg")
        );
        assert_eq!(
            lowercase_output_path(Path::new("IMG_3927.JPEG"), "jpg"),
            PathBuf::from("img_3927.jpg")
        );
    }

    #[test]
    fn test_ensure_directory_exists_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());
        // second call is a no-op
        ensure_directory_exists(&nested).unwrap();
    }
}
