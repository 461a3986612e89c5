use chrono::{SecondsFormat, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use crate::error::EngineError;
use crate::profile::model::PlayerProfile;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where profiles live. Saves always carry the whole document.
pub trait ProfileStore: Send + Sync + 'static {
    fn load_profile(&self, id: &str) -> impl Future<Output = Result<PlayerProfile, EngineError>> + Send;

    fn save_profile(&self, profile: &PlayerProfile) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn list_profiles(&self) -> impl Future<Output = Result<Vec<PlayerProfile>, EngineError>> + Send;
}

fn not_found(id: &str) -> EngineError {
    EngineError::new("Profile not found", "not_found").with_profile(id)
}

fn validate_new_profile(name: &str, character: &str) -> Result<(), EngineError> {
    if name.trim().is_empty() || character.trim().is_empty() {
        return Err(EngineError::new("Name and character are required", "validation"));
    }
    Ok(())
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilesDocument {
    #[serde(default)]
    profiles: Vec<PlayerProfile>,
    #[serde(default)]
    current_profile_id: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// All profiles in one pretty-printed JSON file, `{ profiles, currentProfileId }`.
pub struct FileProfileStore {
    path: PathBuf,
    // serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl FileProfileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileProfileStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_context(&self) -> String {
        format!("path: {:?}", self.path)
    }

    async fn read_document(&self) -> Result<ProfilesDocument, EngineError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "No profiles file yet, starting empty");
                return Ok(ProfilesDocument::default());
            }
            Err(e) => return Err(EngineError::from(e).with_context(self.path_context())),
        };
        serde_json::from_str(&content).map_err(|e| EngineError::from(e).with_context(self.path_context()))
    }

    async fn write_document(&self, doc: &ProfilesDocument) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| EngineError::from(e).with_context(format!("path: {:?}", parent)))?;
            }
        }

        let json = serde_json::to_string_pretty(doc).map_err(|e| {
            EngineError::new(format!("Failed to serialize profiles: {}", e), "json_serialize")
        })?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| EngineError::from(e).with_context(self.path_context()))
    }

    /// Create and persist a profile. Ids are millisecond timestamps, bumped
    /// past any id already taken.
    pub async fn create_profile(&self, name: &str, character: &str) -> Result<PlayerProfile, EngineError> {
        validate_new_profile(name, character)?;

        let _guard = self.lock.lock().await;
        let mut doc = self.read_document().await?;

        let now = Utc::now();
        let mut id = now.timestamp_millis();
        while doc.profiles.iter().any(|p| p.id == id.to_string()) {
            id += 1;
        }

        let profile = PlayerProfile::new(
            id.to_string(),
            name.trim().to_string(),
            character.trim().to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        doc.profiles.push(profile.clone());
        self.write_document(&doc).await?;

        tracing::info!(profile_id = %profile.id, "Created profile");
        Ok(profile)
    }

    /// Remove a profile, clearing the current selection if it pointed there.
    pub async fn delete_profile(&self, id: &str) -> Result<(), EngineError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_document().await?;

        let index = doc.profiles.iter().position(|p| p.id == id).ok_or_else(|| not_found(id))?;
        doc.profiles.remove(index);
        if doc.current_profile_id.as_deref() == Some(id) {
            doc.current_profile_id = None;
        }
        self.write_document(&doc).await?;

        tracing::info!(profile_id = %id, "Deleted profile");
        Ok(())
    }

    /// The selected profile, if one is selected and still exists.
    pub async fn current_profile(&self) -> Result<Option<PlayerProfile>, EngineError> {
        let doc = self.read_document().await?;
        let Some(current) = doc.current_profile_id.as_deref() else {
            return Ok(None);
        };
        Ok(doc.profiles.into_iter().find(|p| p.id == current))
    }

    /// Select a profile by id, or clear the selection with `None`.
    pub async fn set_current_profile(&self, id: Option<&str>) -> Result<(), EngineError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_document().await?;

        if let Some(id) = id {
            if !doc.profiles.iter().any(|p| p.id == id) {
                return Err(not_found(id));
            }
        }
        doc.current_profile_id = id.map(str::to_string);
        self.write_document(&doc).await
    }
}

impl ProfileStore for FileProfileStore {
    async fn load_profile(&self, id: &str) -> Result<PlayerProfile, EngineError> {
        let doc = self.read_document().await?;
        doc.profiles.into_iter().find(|p| p.id == id).ok_or_else(|| not_found(id))
    }

    async fn save_profile(&self, profile: &PlayerProfile) -> Result<(), EngineError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_document().await?;

        let slot = doc
            .profiles
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or_else(|| not_found(&profile.id))?;
        *slot = profile.clone();

        self.write_document(&doc).await?;
        tracing::debug!(profile_id = %profile.id, "Saved profile");
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<PlayerProfile>, EngineError> {
        Ok(self.read_document().await?.profiles)
    }
}

/// Client for the profile REST API rooted at `base_url` (e.g. `http://localhost:8081/api`).
pub struct HttpProfileStore {
    client: Client,
    base_url: String,
}

impl HttpProfileStore {
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client<S: Into<String>>(client: Client, base_url: S) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpProfileStore { client, base_url }
    }

    fn profiles_url(&self) -> String {
        format!("{}/profiles", self.base_url)
    }

    fn profile_url(&self, id: &str) -> String {
        format!("{}/profiles/{}", self.base_url, id)
    }

    pub async fn create_profile(&self, name: &str, character: &str) -> Result<PlayerProfile, EngineError> {
        validate_new_profile(name, character)?;
        let response = self
            .client
            .post(self.profiles_url())
            .json(&json!({ "name": name, "character": character }))
            .send()
            .await?;
        Ok(check_status(response, None).await?.json().await?)
    }

    pub async fn delete_profile(&self, id: &str) -> Result<(), EngineError> {
        let response = self.client.delete(self.profile_url(id)).send().await?;
        check_status(response, Some(id)).await?;
        Ok(())
    }

    pub async fn current_profile(&self) -> Result<Option<PlayerProfile>, EngineError> {
        let response = self
            .client
            .get(format!("{}/current-profile", self.base_url))
            .send()
            .await?;
        Ok(check_status(response, None).await?.json().await?)
    }

    pub async fn set_current_profile(&self, id: Option<&str>) -> Result<(), EngineError> {
        let response = self
            .client
            .post(format!("{}/current-profile", self.base_url))
            .json(&json!({ "profileId": id }))
            .send()
            .await?;
        check_status(response, id).await?;
        Ok(())
    }
}

impl ProfileStore for HttpProfileStore {
    async fn load_profile(&self, id: &str) -> Result<PlayerProfile, EngineError> {
        let response = self.client.get(self.profile_url(id)).send().await?;
        Ok(check_status(response, Some(id)).await?.json().await?)
    }

    async fn save_profile(&self, profile: &PlayerProfile) -> Result<(), EngineError> {
        let response = self
            .client
            .put(self.profile_url(&profile.id))
            .json(profile)
            .send()
            .await?;
        check_status(response, Some(&profile.id)).await?;
        tracing::debug!(profile_id = %profile.id, "Saved profile over HTTP");
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<PlayerProfile>, EngineError> {
        let response = self.client.get(self.profiles_url()).send().await?;
        Ok(check_status(response, None).await?.json().await?)
    }
}

/// Turn a non-2xx response into an error, keeping the server's `error` message.
async fn check_status(response: Response, id: Option<&str>) -> Result<Response, EngineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status));

    let stage = match status {
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::BAD_REQUEST => "validation",
        _ => "http",
    };
    let mut err = EngineError::new(message, stage).with_context(format!("status: {}", status.as_u16()));
    if let Some(id) = id {
        err = err.with_profile(id);
    }
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_load_save_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path().join("data").join("profiles.json"));

        assert!(store.list_profiles().await.unwrap().is_empty());

        let created = store.create_profile("Маша", "fox").await.unwrap();
        assert_eq!(created.name, "Маша");
        assert!(created.progress.islands["1"].unlocked);

        let mut loaded = store.load_profile(&created.id).await.unwrap();
        assert_eq!(loaded, created);

        loaded.stars = 9;
        store.save_profile(&loaded).await.unwrap();
        assert_eq!(store.load_profile(&created.id).await.unwrap().stars, 9);

        let second = store.create_profile("Ваня", "bear").await.unwrap();
        assert_ne!(second.id, created.id);
        assert_eq!(store.list_profiles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path().join("profiles.json"));

        let err = store.load_profile("nope").await.unwrap_err();
        assert!(err.is_not_found());

        let ghost = PlayerProfile::new("ghost", "x", "y", "now");
        assert!(store.save_profile(&ghost).await.unwrap_err().is_not_found());
        assert!(store.delete_profile("ghost").await.unwrap_err().is_not_found());
        assert!(store.set_current_profile(Some("ghost")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_requires_name_and_character() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path().join("profiles.json"));
        let err = store.create_profile("  ", "fox").await.unwrap_err();
        assert_eq!(err.stage, "validation");
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_current_profile_cleared_on_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path().join("profiles.json"));
        let p = store.create_profile("Маша", "fox").await.unwrap();

        assert_eq!(store.current_profile().await.unwrap(), None);
        store.set_current_profile(Some(&p.id)).await.unwrap();
        assert_eq!(store.current_profile().await.unwrap().map(|p| p.id), Some(p.id.clone()));

        store.delete_profile(&p.id).await.unwrap();
        assert_eq!(store.current_profile().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_document_fields_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        tokio::fs::write(
            &path,
            r#"{"profiles":[{"id":"1","name":"A","character":"cat","gameProgress":{"x":1}}],"currentProfileId":null,"version":2}"#,
        )
        .await
        .unwrap();

        let store = FileProfileStore::new(&path);
        let mut p = store.load_profile("1").await.unwrap();
        p.stars = 3;
        store.save_profile(&p).await.unwrap();

        let raw: Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(raw["version"], 2);
        assert_eq!(raw["profiles"][0]["gameProgress"]["x"], 1);
        assert_eq!(raw["profiles"][0]["stars"], 3);
    }

    #[tokio::test]
    async fn test_undated_review_record_survives_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        tokio::fs::write(
            &path,
            r#"{"profiles":[{"id":"1","name":"A","character":"cat","progress":{"islands":{"1":{"unlocked":true,"reviewData":{"Б":{"masteryLevel":3,"reviewCount":3,"successCount":3,"totalAttempts":4}}}}}}],"currentProfileId":null}"#,
        )
        .await
        .unwrap();

        let store = FileProfileStore::new(&path);
        let p = store.load_profile("1").await.unwrap();
        assert_eq!(p.progress.islands["1"].review_data.len(), 1);
        store.save_profile(&p).await.unwrap();

        let again = store.load_profile("1").await.unwrap();
        let b = &again.progress.islands["1"].review_data["Б"];
        assert_eq!(b.mastery_level, 3);
        assert_eq!(b.total_attempts, 4);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        let store = FileProfileStore::new(&path);
        assert_eq!(store.list_profiles().await.unwrap_err().stage, "json_parse");
    }

    #[tokio::test]
    async fn test_unreadable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let store = FileProfileStore::new(dir.path());
        let err = store.list_profiles().await.unwrap_err();
        assert_eq!(err.stage, "io");
        assert_eq!(err.source.as_deref(), Some("std::io"));
        assert!(err.context.unwrap().contains("path"));
    }

    #[test]
    fn test_http_urls() {
        let store = HttpProfileStore::with_client(Client::new(), "http://localhost:8081/api/");
        assert_eq!(store.profiles_url(), "http://localhost:8081/api/profiles");
        assert_eq!(store.profile_url("42"), "http://localhost:8081/api/profiles/42");
    }
}
