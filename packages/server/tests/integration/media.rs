use common::media::{MediaRepository, NewMediaFile};
use serde_json::json;

use crate::common::{ENDPOINT, TestApp, routes, settings};

fn stored_file(url: &str, formats: serde_json::Value) -> NewMediaFile {
    NewMediaFile {
        document_id: None,
        name: "36950.jpg".into(),
        alternative_text: None,
        caption: None,
        width: Some(1200),
        height: Some(750),
        formats,
        hash: "36950".into(),
        ext: Some(".jpg".into()),
        mime: "image/jpeg".into(),
        size: 120.5,
        url: url.into(),
        preview_url: None,
        provider: "local".into(),
        provider_metadata: None,
        folder_path: "/".into(),
        is_url_signed: false,
    }
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn stays_local_when_forwarding_is_off() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_with_token("photo.jpg", b"JPEG".to_vec(), None, &app.admin_token())
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["provider"], "local");
        assert_eq!(res.body["mime"], "image/jpeg");
        let url = res.body["url"].as_str().unwrap();
        assert!(url.starts_with("/uploads/photo_"), "{url}");

        let on_disk = app.public_dir.path().join(url.trim_start_matches('/'));
        assert_eq!(std::fs::read(on_disk).unwrap(), b"JPEG");
        assert!(app.cdn.uploads().is_empty());
    }

    #[tokio::test]
    async fn forwards_to_imagekit_when_enabled() {
        let app = TestApp::spawn().await;
        app.configure(settings(json!({
            "uploadEnabled": true,
            "uploadOptions": { "tags": ["cms"], "folder": "site" }
        })))
        .await;

        let res = app
            .upload_with_token("photo.jpg", b"JPEG".to_vec(), Some("/2/7"), &app.admin_token())
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["provider"], "imagekit");
        assert_eq!(res.body["folderPath"], "/2/7");

        let uploads = app.cdn.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].folder.as_deref(), Some("site/2/7"));
        assert_eq!(uploads[0].tags, vec!["cms".to_string()]);
        assert_eq!(res.body["provider_metadata"]["fileId"], uploads[0].file_id);
        assert_eq!(
            res.body["url"],
            format!("{ENDPOINT}/{}", uploads[0].file_name)
        );
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new().text("caption", "no file");

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::FILES))
            .header("Authorization", format!("Bearer {}", app.admin_token()))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn requires_create_permission() {
        let app = TestApp::spawn().await;
        let token = app.token(&["plugin::upload.read"]);

        let res = app
            .upload_with_token("photo.jpg", b"JPEG".to_vec(), None, &token)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn urls_are_untouched_when_rewriting_is_off() {
        let app = TestApp::spawn().await;
        app.configure(settings(json!({ "enabled": false }))).await;
        let file = app
            .media
            .create(stored_file("/uploads/36950.jpg", json!({})))
            .await
            .unwrap();

        let res = app
            .get(&routes::file(file.id.into()), Some(&app.admin_token()))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["url"], "/uploads/36950.jpg");
    }

    #[tokio::test]
    async fn urls_point_at_endpoint_when_rewriting_is_on() {
        let app = TestApp::spawn().await;
        app.configure(settings(json!({ "enabled": true }))).await;
        let file = app
            .media
            .create(stored_file(
                "/uploads/36950.jpg",
                json!({
                    "thumbnail": {
                        "name": "thumbnail_36950.jpg",
                        "url": "/uploads/thumbnail_36950.jpg",
                        "width": 245,
                        "height": 153
                    }
                }),
            ))
            .await
            .unwrap();

        let res = app
            .get(&routes::file(file.id.into()), Some(&app.admin_token()))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["url"], "https://ik.example.io/e/uploads/36950.jpg");
        assert_eq!(
            res.body["formats"]["thumbnail"]["url"],
            "https://ik.example.io/e/uploads/thumbnail_36950.jpg"
        );

        let stored = app.media.find(file.id).await.unwrap().unwrap();
        assert_eq!(stored.url, "/uploads/36950.jpg");
    }

    #[tokio::test]
    async fn list_is_rewritten_too() {
        let app = TestApp::spawn().await;
        app.configure(settings(json!({ "enabled": true, "useTransformUrls": true })))
            .await;
        app.media
            .create(stored_file(
                "/uploads/36950.jpg",
                json!({
                    "small": { "url": "/uploads/small_36950.jpg", "width": 500, "height": 313 }
                }),
            ))
            .await
            .unwrap();

        let res = app.get(routes::FILES, Some(&app.admin_token())).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 1);
        assert_eq!(
            res.body["data"][0]["formats"]["small"]["url"],
            "https://ik.example.io/e/tr:w-500,h-313/uploads/36950.jpg"
        );
    }

    #[tokio::test]
    async fn padded_endpoint_still_signs_cdn_urls() {
        let app = TestApp::spawn().await;
        app.configure(settings(json!({
            "enabled": true,
            "useSignedUrls": true,
            "urlEndpoint": format!("{ENDPOINT} ")
        })))
        .await;
        let file = app
            .media
            .create(stored_file(&format!("{ENDPOINT}/photo.jpg"), json!({})))
            .await
            .unwrap();

        let res = app
            .get(&routes::file(file.id.into()), Some(&app.admin_token()))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let url = res.body["url"].as_str().unwrap();
        assert!(url.starts_with("https://ik.example.io/e/photo.jpg?ik-s="), "{url}");
    }

    #[tokio::test]
    async fn unknown_file_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::file(999), Some(&app.admin_token())).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn imagekit_file_and_variants_are_removed() {
        let app = TestApp::spawn().await;
        app.configure(settings(json!({ "uploadEnabled": true }))).await;
        let mut file = stored_file(
            &format!("{ENDPOINT}/photo.jpg"),
            json!({
                "thumbnail": {
                    "hash": "thumbnail_photo_65a1b2c3",
                    "ext": ".jpg",
                    "url": format!("{ENDPOINT}/thumbnail_photo.jpg"),
                    "provider_metadata": { "fileId": "thumb01" }
                }
            }),
        );
        file.provider = "imagekit".into();
        file.provider_metadata = Some(json!({ "fileId": "main01" }));
        let file = app.media.create(file).await.unwrap();

        let res = app
            .delete_with_token(&routes::file(file.id.into()), &app.admin_token())
            .await;

        assert_eq!(res.status, 204, "{}", res.text);
        assert_eq!(app.cdn.deleted(), vec!["thumb01".to_string(), "main01".to_string()]);
        assert!(app.media.find(file.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn local_file_is_removed_from_disk() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let res = app
            .upload_with_token("notes.txt", b"hello".to_vec(), None, &token)
            .await;
        assert_eq!(res.status, 201);
        let id = res.body["id"].as_i64().unwrap();
        let on_disk = app
            .public_dir
            .path()
            .join(res.body["url"].as_str().unwrap().trim_start_matches('/'));
        assert!(on_disk.exists());

        let res = app.delete_with_token(&routes::file(id), &token).await;

        assert_eq!(res.status, 204);
        assert!(!on_disk.exists());
    }
}
