use common::settings::Settings;
use common::store::KeyValueStore;
use serde_json::json;

use crate::common::{ENDPOINT, TestApp, routes, settings};

mod access {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::SETTINGS, None).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::SETTINGS, Some("not-a-jwt")).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn read_permission_does_not_allow_change() {
        let app = TestApp::spawn().await;
        let token = app.token(&["plugin::imagekit.settings.read"]);

        let read = app.get(routes::SETTINGS, Some(&token)).await;
        assert_eq!(read.status, 200);

        let write = app
            .put_with_token(routes::SETTINGS, &settings(json!({})), &token)
            .await;
        assert_eq!(write.status, 403);
        assert_eq!(write.body["code"], "PERMISSION_DENIED");
    }
}

mod resolution {
    use super::*;

    #[tokio::test]
    async fn defaults_when_nothing_is_configured() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::SETTINGS, Some(&app.admin_token())).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["enabled"], false);
        assert_eq!(res.body["publicKey"], "");
        assert_eq!(res.body["urlEndpoint"], "");
        assert_eq!(res.body["expiry"], 0);
        assert_eq!(res.body["uploadOptions"]["tags"], json!([]));
    }

    #[tokio::test]
    async fn static_config_is_used_when_store_is_empty() {
        let app = TestApp::spawn_with(Settings {
            enabled: true,
            public_key: "public_static".into(),
            private_key: "private_static".into(),
            url_endpoint: ENDPOINT.into(),
            ..Default::default()
        })
        .await;

        let res = app.get(routes::SETTINGS, Some(&app.admin_token())).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["enabled"], true);
        assert_eq!(res.body["publicKey"], "public_static");
        assert_eq!(res.body["urlEndpoint"], ENDPOINT);
    }

    #[tokio::test]
    async fn stored_record_without_credentials_is_skipped() {
        let app = TestApp::spawn_with(Settings {
            enabled: true,
            public_key: "public_static".into(),
            private_key: "private_static".into(),
            url_endpoint: ENDPOINT.into(),
            ..Default::default()
        })
        .await;
        app.store
            .set("config", json!({ "uploadEnabled": false }))
            .await
            .unwrap();

        let res = app.get(routes::SETTINGS, Some(&app.admin_token())).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["enabled"], true);
        assert_eq!(res.body["publicKey"], "public_static");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn valid_settings_are_persisted() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();

        let res = app
            .put_with_token(
                routes::SETTINGS,
                &settings(json!({ "enabled": true, "useSignedUrls": true, "expiry": 600 })),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["useSignedUrls"], true);

        let res = app.get(routes::SETTINGS, Some(&token)).await;
        assert_eq!(res.body["enabled"], true);
        assert_eq!(res.body["expiry"], 600);
    }

    #[tokio::test]
    async fn invalid_settings_report_every_field() {
        let app = TestApp::spawn().await;

        let res = app
            .put_with_token(
                routes::SETTINGS,
                &json!({
                    "enabled": true,
                    "uploadEnabled": true,
                    "publicKey": "wrong_prefix",
                    "urlEndpoint": ""
                }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let paths: Vec<&str> = res.body["details"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|d| d["path"].as_str())
            .collect();
        assert!(paths.contains(&"publicKey"));
        assert!(paths.contains(&"privateKey"));
        assert!(paths.contains(&"urlEndpoint"));
    }

    #[tokio::test]
    async fn rejected_settings_leave_store_untouched() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        app.configure(settings(json!({ "enabled": true }))).await;

        let res = app
            .put_with_token(routes::SETTINGS, &json!({ "enabled": "yes" }), &token)
            .await;
        assert_eq!(res.status, 400);

        let res = app.get(routes::SETTINGS, Some(&token)).await;
        assert_eq!(res.body["enabled"], true);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .put_raw_with_token(routes::SETTINGS, "{ not json", &app.admin_token())
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod restore {
    use super::*;

    #[tokio::test]
    async fn restore_replaces_stored_settings_with_static_config() {
        let app = TestApp::spawn_with(Settings {
            public_key: "public_static".into(),
            private_key: "private_static".into(),
            url_endpoint: "https://ik.example.io/static".into(),
            ..Default::default()
        })
        .await;
        let token = app.admin_token();
        app.configure(settings(json!({ "enabled": true }))).await;

        let res = app
            .put_with_token(routes::SETTINGS_RESTORE, &json!({}), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["urlEndpoint"], "https://ik.example.io/static");

        let res = app.get(routes::SETTINGS, Some(&token)).await;
        assert_eq!(res.body["enabled"], false);
        assert_eq!(res.body["publicKey"], "public_static");
    }
}
