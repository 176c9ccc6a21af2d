//! Environment variables recognized by the proxy (§6).

use std::path::PathBuf;

/// Snapshot of the environment read once at startup.
#[derive(Debug, Clone)]
pub struct Env {
    /// `ORG_VER` — host version, governs version-dependent translators.
    pub org_version: f64,
    /// `ORGDIR_EXE` — host install directory.
    pub orgdir_exe: Option<PathBuf>,
    /// `ORGDIR_UFF` — fallback user-files directory.
    pub orgdir_uff: Option<PathBuf>,
    /// `ORGDIR_USER_APPDATA` — per-user application-data directory.
    pub orgdir_user_appdata: Option<PathBuf>,
    /// `OCLSP_CONFIG_JSON_PATH` — machine-wide configuration JSON path.
    pub machine_config_path: Option<PathBuf>,
    pub log_enabled: bool,
    pub trace_enabled: bool,
    pub cpptools_trace_enabled: bool,
}

fn env_bool(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

impl Env {
    pub fn from_process() -> Self {
        Self {
            org_version: std::env::var("ORG_VER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10.0),
            orgdir_exe: std::env::var("ORGDIR_EXE").ok().map(PathBuf::from),
            orgdir_uff: std::env::var("ORGDIR_UFF").ok().map(PathBuf::from),
            orgdir_user_appdata: std::env::var("ORGDIR_USER_APPDATA").ok().map(PathBuf::from),
            machine_config_path: std::env::var("OCLSP_CONFIG_JSON_PATH").ok().map(PathBuf::from),
            log_enabled: env_bool("OCLSP_LOG"),
            trace_enabled: env_bool("OCLSP_TRACE"),
            cpptools_trace_enabled: env_bool("OCLSP_CPPTOOLS_TRACE"),
        }
    }

    /// Directory used for log files and cpptools storage subdirectories:
    /// the per-user app-data directory if it exists on disk, else the
    /// fallback user-files directory.
    pub fn data_storage_dir(&self) -> Option<PathBuf> {
        match &self.orgdir_user_appdata {
            Some(dir) if dir.exists() => Some(dir.clone()),
            _ => self.orgdir_uff.clone(),
        }
    }

    /// Per-user versioned OCLSP config, stored alongside the log files.
    pub fn user_config_path(&self) -> Option<PathBuf> {
        self.data_storage_dir()
            .map(|dir| dir.join("OCLSP").join("OCLSP_User.json"))
    }

    pub fn origin_c_dir(&self) -> Option<PathBuf> {
        self.orgdir_exe.as_ref().map(|dir| dir.join("OriginC"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_accepts_case_insensitive_true() {
        // SAFETY: tests run single-threaded in this process for env var access.
        unsafe {
            std::env::set_var("OCLSP_TEST_BOOL", "True");
        }
        assert!(env_bool("OCLSP_TEST_BOOL"));
        unsafe {
            std::env::remove_var("OCLSP_TEST_BOOL");
        }
    }

    #[test]
    fn env_bool_defaults_to_false_when_unset() {
        assert!(!env_bool("OCLSP_TEST_BOOL_UNSET_XYZ"));
    }

    #[test]
    fn data_storage_dir_prefers_user_appdata_when_it_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let env = Env {
            org_version: 10.0,
            orgdir_exe: None,
            orgdir_uff: Some(PathBuf::from("/nonexistent-uff")),
            orgdir_user_appdata: Some(tmp.path().to_path_buf()),
            machine_config_path: None,
            log_enabled: false,
            trace_enabled: false,
            cpptools_trace_enabled: false,
        };
        assert_eq!(env.data_storage_dir(), Some(tmp.path().to_path_buf()));
    }

    #[test]
    fn data_storage_dir_falls_back_to_uff_when_appdata_missing() {
        let env = Env {
            org_version: 10.0,
            orgdir_exe: None,
            orgdir_uff: Some(PathBuf::from("/fallback")),
            orgdir_user_appdata: Some(PathBuf::from("/does-not-exist-xyz")),
            machine_config_path: None,
            log_enabled: false,
            trace_enabled: false,
            cpptools_trace_enabled: false,
        };
        assert_eq!(env.data_storage_dir(), Some(PathBuf::from("/fallback")));
    }
}
