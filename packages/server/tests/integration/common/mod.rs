use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use common::hook::HookRegistry;
use common::media::MemoryMediaRepository;
use common::permissions::{self, render};
use common::settings::Settings;
use common::store::MemoryStore;
use imagekit::{
    Credentials, FileDetails, ImageKit, ImageKitError, MediaCdn, UploadRequest, UploadResponse,
    UrlOptions,
};
use reqwest::Client;
use serde_json::{Value, json};
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig, UploadConfig,
};
use server::services::ClientAccessor;
use server::state::AppState;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";
pub const ENDPOINT: &str = "https://ik.example.io/e";

pub mod routes {
    pub const SETTINGS: &str = "/api/v1/imagekit/settings";
    pub const SETTINGS_RESTORE: &str = "/api/v1/imagekit/settings/restore";
    pub const WEBHOOK: &str = "/api/v1/imagekit/webhook";
    pub const FILES: &str = "/api/v1/upload/files";

    pub fn file(id: i64) -> String {
        format!("/api/v1/upload/files/{id}")
    }
}

/// In-process ImageKit stand-in. Uploads and deletes are recorded; every id
/// not yet deleted exists. URLs are built by the real builder against
/// [`ENDPOINT`].
pub struct RecordingCdn {
    builder: ImageKit,
    uploads: Mutex<Vec<UploadRequestSeen>>,
    deleted: Mutex<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct UploadRequestSeen {
    pub file_id: String,
    pub file_name: String,
    pub folder: Option<String>,
    pub tags: Vec<String>,
}

impl RecordingCdn {
    fn new() -> Self {
        Self {
            builder: ImageKit::new(Credentials {
                public_key: "public_test".into(),
                private_key: "private_test".into(),
                url_endpoint: ENDPOINT.into(),
            }),
            uploads: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> Vec<UploadRequestSeen> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaCdn for RecordingCdn {
    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, ImageKitError> {
        let mut uploads = self.uploads.lock().unwrap();
        let file_id = format!("ik{:06}", uploads.len() + 1);
        uploads.push(UploadRequestSeen {
            file_id: file_id.clone(),
            file_name: request.file_name.clone(),
            folder: request.folder.clone(),
            tags: request.tags.clone(),
        });
        Ok(UploadResponse {
            file_id,
            name: request.file_name,
            ..Default::default()
        })
    }

    async fn get_file_details(&self, file_id: &str) -> Result<FileDetails, ImageKitError> {
        if self.deleted.lock().unwrap().iter().any(|id| id == file_id) {
            return Err(ImageKitError::NotFound(file_id.to_string()));
        }
        let name = self
            .uploads
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.file_id == file_id)
            .map_or_else(|| format!("{file_id}.jpg"), |u| u.file_name.clone());
        Ok(FileDetails {
            file_id: file_id.to_string(),
            url: format!("{ENDPOINT}/{name}"),
            name,
            ..Default::default()
        })
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), ImageKitError> {
        self.deleted.lock().unwrap().push(file_id.to_string());
        Ok(())
    }

    fn url(&self, options: &UrlOptions) -> Result<String, ImageKitError> {
        self.builder.url(options)
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub cdn: Arc<RecordingCdn>,
    pub media: Arc<MemoryMediaRepository>,
    pub store: Arc<MemoryStore>,
    pub public_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

impl TestApp {
    /// Server with no static ImageKit configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with(Settings::default()).await
    }

    pub async fn spawn_with(imagekit: Settings) -> Self {
        let public_dir = tempfile::tempdir().expect("Failed to create public dir");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig::default(),
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
            },
            storage: StorageConfig {
                public_dir: public_dir.path().to_path_buf(),
                max_upload_size: 10 * 1024 * 1024,
            },
            upload: UploadConfig {
                breakpoints: BTreeMap::from([
                    ("large".to_string(), 1000),
                    ("medium".to_string(), 750),
                    ("small".to_string(), 500),
                ]),
            },
            imagekit,
        };

        let cdn = Arc::new(RecordingCdn::new());
        let factory_cdn = cdn.clone();
        let accessor = ClientAccessor::with_factory(Arc::new(move |_: Credentials| {
            factory_cdn.clone() as Arc<dyn MediaCdn>
        }));

        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(MemoryMediaRepository::new());
        let state = AppState::build(
            config,
            store.clone(),
            media.clone(),
            HookRegistry::new(),
            accessor,
        )
        .await
        .expect("Failed to build app state");

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            cdn,
            media,
            store,
            public_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Token carrying every permission the plugin and media routes check.
    pub fn admin_token(&self) -> String {
        self.token(&[
            &render(permissions::settings::READ),
            &render(permissions::settings::CHANGE),
            permissions::upload::READ,
            permissions::upload::CREATE,
            permissions::upload::DELETE,
        ])
    }

    pub fn token(&self, permissions: &[&str]) -> String {
        server::utils::jwt::sign(
            JWT_SECRET,
            1,
            "admin",
            permissions.iter().map(|p| p.to_string()).collect(),
        )
        .expect("Failed to sign token")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let res = req.send().await.expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn put_raw_with_token(&self, path: &str, body: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        self.post_raw(path, &body.to_string()).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn upload_with_token(
        &self,
        file_name: &str,
        file_bytes: Vec<u8>,
        folder_path: Option<&str>,
        token: &str,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(folder_path) = folder_path {
            form = form.text("folderPath", folder_path.to_string());
        }

        let res = self
            .client
            .post(self.url(routes::FILES))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Persist settings through the API and assert they were accepted.
    pub async fn configure(&self, settings: Value) {
        let res = self
            .put_with_token(routes::SETTINGS, &settings, &self.admin_token())
            .await;
        assert_eq!(res.status, 200, "Settings update failed: {}", res.text);
    }
}

/// A complete, valid settings object; override fields with `json!` merges.
pub fn settings(overrides: Value) -> Value {
    let mut base = json!({
        "enabled": false,
        "publicKey": "public_test",
        "privateKey": "private_test",
        "urlEndpoint": ENDPOINT,
        "useSignedUrls": false,
        "expiry": 0,
        "uploadEnabled": false,
        "uploadOptions": {
            "tags": [],
            "folder": "",
            "overwriteTags": false,
            "overwriteCustomMetadata": false,
            "checks": "",
            "isPrivateFile": false
        },
        "useTransformUrls": false
    });
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}
