use common::media::MediaRepository;
use serde_json::{Value, json};

use crate::common::{ENDPOINT, TestApp, routes};

fn item(name: &str, file_id: &str) -> Value {
    json!({
        "fileId": file_id,
        "name": name,
        "url": format!("{ENDPOINT}/{name}"),
        "thumbnail": format!("{ENDPOINT}/tr:n-ik_ml_thumbnail/{name}"),
        "mime": "image/jpeg",
        "width": 800,
        "height": 600,
        "size": 20480,
        "filePath": format!("/{name}"),
        "type": "file"
    })
}

mod rejection {
    use super::*;

    #[tokio::test]
    async fn non_json_body_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.post_raw(routes::WEBHOOK, "nope").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["status"], "error");
        assert_eq!(res.body["message"], "Invalid webhook payload");
    }

    #[tokio::test]
    async fn data_must_be_an_array() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::WEBHOOK, &json!({ "eventType": "INSERT", "data": {} }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Invalid webhook payload");
    }

    #[tokio::test]
    async fn empty_data_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::WEBHOOK, &json!({ "eventType": "INSERT", "data": [] }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["status"], "error");
        assert_eq!(res.body["message"], "No files to import");
    }
}

mod import {
    use super::*;

    #[tokio::test]
    async fn variant_is_attached_to_its_original() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::WEBHOOK,
                &json!({
                    "eventType": "INSERT",
                    "data": [
                        item("thumbnail_photo.jpg", "65a1b2c3d4e5f6a7"),
                        item("photo.jpg", "75b2c3d4e5f6a7b8")
                    ]
                }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "success");
        assert_eq!(res.body["message"], "Imported 1 file(s) successfully");
        assert_eq!(
            res.body["stats"],
            json!({ "total": 2, "successful": 1, "failed": 1 })
        );

        let imported = res.body["imported"].as_array().unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0]["name"], "photo.jpg");
        assert_eq!(imported[0]["provider"], "imagekit");
        assert_eq!(imported[0]["provider_metadata"]["fileId"], "75b2c3d4e5f6a7b8");
        assert_eq!(
            imported[0]["formats"]["thumbnail"]["url"],
            format!("{ENDPOINT}/thumbnail_photo.jpg")
        );

        let stored = app.media.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].hash, "photo_75b2c3d4");
    }

    #[tokio::test]
    async fn other_events_import_nothing() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::WEBHOOK,
                &json!({ "eventType": "DELETE", "data": [item("photo.jpg", "75b2c3d4")] }),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "warning");
        assert_eq!(res.body["imported"], json!([]));
        assert!(app.media.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_item_does_not_block_the_batch() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::WEBHOOK,
                &json!({
                    "eventType": "INSERT",
                    "data": [{ "name": "no-id.jpg" }, item("cat.png", "85c3d4e5")]
                }),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["stats"]["successful"], 1);
        assert_eq!(res.body["stats"]["failed"], 1);
    }
}
