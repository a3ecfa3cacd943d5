use std::env;
use std::path::PathBuf;

use imgvote_cache::{BlobLayout, SheetConfig, PROFILE_SHEET_RANGE, TEAM_SHEET_RANGE};

use crate::error::StartupError;

/// Where images, likes and sheets live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Cloud Storage + PostgreSQL + Google Sheets
    Gcp(GcpConfig),
    /// Everything in process memory, for local runs
    Memory,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Gcp(_) => "gcp",
            Backend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpConfig {
    pub bucket: String,
    pub database_url: String,
    /// Static bearer token; the metadata server is used when absent
    pub access_token: Option<String>,
}

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend: Backend,
    pub layout: BlobLayout,
    pub cache_dir: PathBuf,
    pub profile_sheet: SheetConfig,
    pub team_sheet: SheetConfig,
    pub cors_origins: Vec<String>,
    pub static_dir: Option<PathBuf>,
    /// Seeded into the credential store at startup when set
    pub student_password: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| StartupError::Config(format!("{key} environment variable is required")))
        };

        let port = var("PORT").and_then(|p| p.parse().ok()).unwrap_or(5000);

        let backend_name = var("IMGVOTE_BACKEND").unwrap_or_else(|| "gcp".to_string());
        let backend = match backend_name.as_str() {
            "gcp" => Backend::Gcp(GcpConfig {
                bucket: required("GCS_BUCKET_NAME")?,
                database_url: required("DATABASE_URL")?,
                access_token: var("GOOGLE_ACCESS_TOKEN"),
            }),
            "memory" => Backend::Memory,
            other => {
                return Err(StartupError::Config(format!(
                    "unknown IMGVOTE_BACKEND {other:?} (expected \"gcp\" or \"memory\")"
                )))
            }
        };

        let (profile_sheet_id, team_sheet_id) = match &backend {
            Backend::Gcp(_) => (required("GOOGLE_SHEETS_ID")?, required("TEAM_SHEETS_ID")?),
            Backend::Memory => (
                var("GOOGLE_SHEETS_ID").unwrap_or_else(|| "profiles".to_string()),
                var("TEAM_SHEETS_ID").unwrap_or_else(|| "teams".to_string()),
            ),
        };

        let defaults = BlobLayout::default();
        let layout = BlobLayout::new(
            &var("GCS_ORIGINAL_FOLDER").unwrap_or(defaults.original_folder),
            &var("GCS_CACHED_FOLDER").unwrap_or(defaults.cached_folder),
        );

        let cache_dir = var("LOCAL_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp/cached"));

        let profile_sheet = SheetConfig::new(
            &profile_sheet_id,
            &var("PROFILE_SHEET_RANGE").unwrap_or_else(|| PROFILE_SHEET_RANGE.to_string()),
        );
        let team_sheet = SheetConfig::new(
            &team_sheet_id,
            &var("TEAM_SHEET_RANGE").unwrap_or_else(|| TEAM_SHEET_RANGE.to_string()),
        );

        let cors_origins = var("CORS_ORIGINS")
            .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or_else(|| vec!["*".to_string()]);

        Ok(Self {
            port,
            backend,
            layout,
            cache_dir,
            profile_sheet,
            team_sheet,
            cors_origins,
            static_dir: var("STATIC_DIR").map(PathBuf::from),
            student_password: var("STUDENT_PASSWORD"),
            admin_password: var("ADMIN_PASSWORD"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_memory_defaults() {
        let config = Config::from_lookup(lookup(&[("IMGVOTE_BACKEND", "memory")])).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.backend.name(), "memory");
        assert_eq!(config.layout, BlobLayout::default());
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cached"));
        assert_eq!(config.profile_sheet.range, "Form Responses 1!A1:I999");
        assert_eq!(config.team_sheet.range, "A2:Z999");
        assert_eq!(config.cors_origins, vec!["*"]);
        assert!(config.static_dir.is_none());
        assert!(config.student_password.is_none());
    }

    #[test]
    fn test_gcp_requires_bucket() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/imgvote"),
            ("GOOGLE_SHEETS_ID", "p"),
            ("TEAM_SHEETS_ID", "t"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("GCS_BUCKET_NAME"));
    }

    #[test]
    fn test_gcp_requires_sheet_ids() {
        let err = Config::from_lookup(lookup(&[
            ("GCS_BUCKET_NAME", "bucket"),
            ("DATABASE_URL", "postgres://localhost/imgvote"),
            ("GOOGLE_SHEETS_ID", "p"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("TEAM_SHEETS_ID"));
    }

    #[test]
    fn test_gcp_full() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("GCS_BUCKET_NAME", "bucket"),
            ("DATABASE_URL", "postgres://localhost/imgvote"),
            ("GOOGLE_SHEETS_ID", "profile-sheet"),
            ("TEAM_SHEETS_ID", "team-sheet"),
            ("GCS_ORIGINAL_FOLDER", "2026/"),
            ("GCS_CACHED_FOLDER", "2026_cached"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("ADMIN_PASSWORD", "root"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.backend,
            Backend::Gcp(GcpConfig {
                bucket: "bucket".to_string(),
                database_url: "postgres://localhost/imgvote".to_string(),
                access_token: None,
            })
        );
        assert_eq!(config.layout.original_prefix(), "2026/");
        assert_eq!(config.profile_sheet.sheet_id, "profile-sheet");
        assert_eq!(config.team_sheet.sheet_id, "team-sheet");
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.admin_password.as_deref(), Some("root"));
    }

    #[test]
    fn test_unknown_backend() {
        let err = Config::from_lookup(lookup(&[("IMGVOTE_BACKEND", "s3")])).unwrap_err();
        assert!(err.to_string().contains("s3"));
    }
}
