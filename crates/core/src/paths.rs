use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".ecourts-tester"))
            .unwrap_or_else(|| PathBuf::from(".ecourts-tester"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_under_base() {
        let paths = Paths::with_base(PathBuf::from("/tmp/ecourts-base"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/ecourts-base/config.json"));
    }
}
